// Transfer table cleaning: missing fees and market values become zero.

use crate::data::records::TransferRecord;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Return a cleaned copy of the transfer table.
///
/// A missing `transfer_fee` (free transfer, loan return) and a missing
/// `market_value_in_eur` are both set to `0.0`. Negative fees cannot occur in
/// the source data but are clamped to zero so the `fee >= 0` invariant holds
/// for everything downstream. The input is never modified.
///
/// An empty table is rejected: every later stage assumes populated input.
pub fn clean_transfers(rows: &[TransferRecord]) -> Result<Vec<TransferRecord>, CleanError> {
    if rows.is_empty() {
        return Err(CleanError::InvalidInput(
            "transfers table is empty".into(),
        ));
    }

    let mut filled_fees = 0usize;
    let mut filled_values = 0usize;
    let cleaned: Vec<TransferRecord> = rows
        .iter()
        .map(|row| {
            let mut out = row.clone();
            if out.transfer_fee.is_none() {
                filled_fees += 1;
            }
            if out.market_value_in_eur.is_none() {
                filled_values += 1;
            }
            out.transfer_fee = Some(row.fee().max(0.0));
            out.market_value_in_eur = Some(row.market_value());
            out
        })
        .collect();

    debug!(
        rows = cleaned.len(),
        filled_fees, filled_values, "cleaned transfers table"
    );
    Ok(cleaned)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
