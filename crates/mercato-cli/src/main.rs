// Transfer market analysis entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file)
// 2. Load config (copying defaults on first run)
// 3. Load input tables
// 4. Run the pipeline
// 5. Write output tables and summary

use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use mercato_core::config;
use mercato_core::data;
use mercato_core::export;
use mercato_core::pipeline;

fn main() -> anyhow::Result<()> {
    // Optional first argument: project directory holding config/, defaults/
    // and the data paths. Defaults to the working directory.
    let base_dir = match std::env::args_os().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("failed to read working directory")?,
    };

    // 1. Initialize tracing
    init_tracing(&base_dir)?;
    info!("mercato starting up in {}", base_dir.display());

    // 2. Load config
    let config = config::load_config(&base_dir).context("failed to load configuration")?;
    let calendar = config.calendar();
    info!(
        "Config loaded: {} seasons ({}..{}), output dir {}",
        calendar.len(),
        config.seasons.first,
        config.seasons.last,
        config.output.dir
    );

    // 3. Load input tables
    let datasets = data::load_datasets(&base_dir, &config.data_paths)
        .context("failed to load transfer data")?;
    info!("Loaded {} transfers", datasets.transfers.len());

    // 4. Run the pipeline
    let report = pipeline::run(&config, &datasets).context("pipeline failed")?;

    // 5. Write outputs
    let out_dir = base_dir.join(&config.output.dir);
    let written = export::write_report(&out_dir, &report)
        .with_context(|| format!("failed to write report to {}", out_dir.display()))?;

    info!(
        "Wrote {} files to {}; {} analyses skipped",
        written.len(),
        out_dir.display(),
        report.skipped.len()
    );
    for skipped in &report.skipped {
        info!("skipped {}: {}", skipped.analysis, skipped.reason);
    }
    if let Some(c) = &report.correlations.spend_volume {
        info!(
            "Spend vs volume: r={:.3} p={:.4} ({}, {})",
            c.r, c.p_value, c.strength, c.significance
        );
    }
    info!(
        "Spend growth {}..{}: {:.1}%",
        report.growth.start_year, report.growth.end_year, report.growth.growth_percent
    );

    println!("Report written to {}", out_dir.display());
    Ok(())
}

/// Initialize tracing to log to `logs/mercato.log` under the project directory.
fn init_tracing(base_dir: &std::path::Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("mercato.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mercato_core=info,mercato_cli=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
