// Price/value efficiency: how far spend ran above squad market value, and
// how spend moved with transfer volume.

use tracing::{debug, info};

use crate::data::records::TransferRecord;
use crate::market::aggregate::{aggregate_by_season, sort_by_calendar, AggregationOptions, SeasonMetrics};
use crate::season::SeasonCalendar;
use crate::stats::correlation::{correlation_matrix, pearson, Correlation, CorrelationMatrix, StatsError};

/// Paid transfers only, per calendar season, with delta and premium filled.
///
/// `premium_percent` is `None` when the season's market value is zero.
pub fn analyze_efficiency(rows: &[TransferRecord], calendar: &SeasonCalendar) -> Vec<SeasonMetrics> {
    let paid: Vec<TransferRecord> = rows
        .iter()
        .filter(|t| t.fee() > 0.0 && calendar.contains(&t.transfer_season))
        .cloned()
        .collect();
    debug!(
        paid = paid.len(),
        total = rows.len(),
        "restricted efficiency scope to paid transfers"
    );

    let metrics = aggregate_by_season(&paid, &AggregationOptions::all(), calendar);
    with_premium(&metrics)
}

/// Copy of `metrics` with `delta_billion` and `premium_percent` set.
pub fn with_premium(metrics: &[SeasonMetrics]) -> Vec<SeasonMetrics> {
    metrics
        .iter()
        .map(|m| {
            let mut out = m.clone();
            out.delta_billion = m.value_billion.map(|v| m.spend_billion - v);
            out.premium_percent = match (out.delta_billion, m.value_billion) {
                (Some(delta), Some(value)) if value != 0.0 => Some(delta / value * 100.0),
                _ => None,
            };
            out
        })
        .collect()
}

/// The rows of `metrics` whose season is in `seasons`, ordered by that list.
pub fn focus_window(metrics: &[SeasonMetrics], seasons: &[String]) -> Vec<SeasonMetrics> {
    let window = SeasonCalendar::from_labels(seasons.iter().cloned());
    let mut rows: Vec<SeasonMetrics> = metrics
        .iter()
        .filter(|m| window.contains(&m.season))
        .cloned()
        .collect();
    sort_by_calendar(&mut rows, &window);
    rows
}

/// Correlation between per-season spend and transfer volume.
pub fn spend_volume_correlation(metrics: &[SeasonMetrics]) -> Result<Correlation, StatsError> {
    let spend: Vec<f64> = metrics.iter().map(|m| m.spend_billion).collect();
    let volume: Vec<f64> = metrics.iter().map(|m| m.transfer_count as f64).collect();
    let c = pearson(&spend, &volume)?;
    info!(
        r = c.r,
        p = c.p_value,
        strength = c.strength().label(),
        "spend vs volume correlation"
    );
    Ok(c)
}

/// Correlation between spend and market value across the efficiency seasons.
pub fn spend_value_correlation(metrics: &[SeasonMetrics]) -> Result<Correlation, StatsError> {
    let (spend, value): (Vec<f64>, Vec<f64>) = metrics
        .iter()
        .filter_map(|m| m.value_billion.map(|v| (m.spend_billion, v)))
        .unzip();
    pearson(&spend, &value)
}

/// Spend, volume and average fee against each other. Seasons without an
/// average fee are left out of every series.
pub fn season_correlation_matrix(metrics: &[SeasonMetrics]) -> CorrelationMatrix {
    let mut spend = Vec::new();
    let mut volume = Vec::new();
    let mut avg = Vec::new();
    for m in metrics {
        if let Some(a) = m.avg_fee {
            spend.push(m.spend_billion);
            volume.push(m.transfer_count as f64);
            avg.push(a);
        }
    }
    correlation_matrix(&[
        ("spend_billion", &spend[..]),
        ("transfer_count", &volume[..]),
        ("avg_fee", &avg[..]),
    ])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(season: &str, fee: f64, value: f64) -> TransferRecord {
        TransferRecord {
            player_id: Some(1),
            player_name: "P".into(),
            transfer_season: season.into(),
            transfer_date: None,
            transfer_fee: Some(fee),
            market_value_in_eur: Some(value),
            from_club_id: None,
            to_club_id: None,
            from_club_name: String::new(),
            to_club_name: String::new(),
        }
    }

    fn calendar() -> SeasonCalendar {
        SeasonCalendar::between("18/19", "22/23").unwrap()
    }

    #[test]
    fn premium_over_paid_transfers() {
        let rows = vec![
            transfer("18/19", 3e9, 2e9),
            transfer("18/19", 0.0, 5e9),
            transfer("19/20", 1e9, 1e9),
        ];
        let metrics = analyze_efficiency(&rows, &calendar());
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].season, "18/19");
        assert_eq!(metrics[0].value_billion, Some(2.0));
        assert_eq!(metrics[0].delta_billion, Some(1.0));
        assert_eq!(metrics[0].premium_percent, Some(50.0));
        assert_eq!(metrics[1].premium_percent, Some(0.0));
    }

    #[test]
    fn premium_undefined_for_zero_value() {
        let rows = vec![transfer("20/21", 1e9, 0.0)];
        let metrics = analyze_efficiency(&rows, &calendar());
        assert_eq!(metrics[0].delta_billion, Some(1.0));
        assert_eq!(metrics[0].premium_percent, None);
    }

    #[test]
    fn seasons_outside_calendar_are_excluded() {
        let rows = vec![transfer("10/11", 1e9, 1e9), transfer("21/22", 1e9, 1e9)];
        let metrics = analyze_efficiency(&rows, &calendar());
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].season, "21/22");
    }

    #[test]
    fn focus_window_uses_its_own_order() {
        let rows = vec![
            transfer("18/19", 1e9, 1e9),
            transfer("20/21", 1e9, 1e9),
            transfer("22/23", 1e9, 1e9),
        ];
        let metrics = analyze_efficiency(&rows, &calendar());
        let window = focus_window(&metrics, &["22/23".to_string(), "20/21".to_string()]);
        let seasons: Vec<&str> = window.iter().map(|m| m.season.as_str()).collect();
        assert_eq!(seasons, vec!["22/23", "20/21"]);
    }

    #[test]
    fn spend_tracks_volume() {
        let mut rows = Vec::new();
        for (i, season) in ["18/19", "19/20", "20/21", "21/22"].iter().enumerate() {
            for _ in 0..=i {
                rows.push(transfer(season, 1e9, 1e9));
            }
        }
        let metrics = analyze_efficiency(&rows, &calendar());
        let c = spend_volume_correlation(&metrics).unwrap();
        assert!((c.r - 1.0).abs() < 1e-12);
        assert_eq!(c.strength().label(), "Perfect");

        let matrix = season_correlation_matrix(&metrics);
        assert!((matrix.get("spend_billion", "transfer_count").unwrap() - 1.0).abs() < 1e-12);
        // Every season averages 1e9, so avg_fee has zero variance.
        assert_eq!(matrix.get("avg_fee", "spend_billion"), None);
    }
}
