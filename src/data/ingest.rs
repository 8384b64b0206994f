use crate::data::types::BetRecord;
use tracing::debug;

/// Parse a decimal number that may use a comma as decimal separator.
pub fn parse_decimal(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse::<f64>().ok()
}

/// Validate a single raw row. Missing trailing cells read as empty. Rows
/// missing a sport or result, or whose odds do not parse to a finite positive
/// number, yield `None`.
pub fn parse_row<S: AsRef<str>>(row: &[S]) -> Option<BetRecord> {
    let cell = |i: usize| row.get(i).map(|c| c.as_ref().trim()).unwrap_or("");

    let sport = cell(0);
    let result = cell(7);
    if sport.is_empty() || result.is_empty() {
        return None;
    }

    let odds = parse_decimal(cell(5))?;
    if !odds.is_finite() || odds <= 0.0 {
        return None;
    }

    Some(BetRecord {
        sport: sport.to_string(),
        tournament: cell(1).to_string(),
        matchup: cell(2).to_string(),
        bet: cell(3).to_string(),
        live_status: cell(4).to_string(),
        odds,
        result: result.to_string(),
    })
}

/// Convert raw sheet rows into records, keeping source order.
pub fn parse_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Vec<BetRecord> {
    let records: Vec<BetRecord> = rows
        .iter()
        .filter_map(|row| parse_row(row))
        .collect();

    let skipped = rows.len() - records.len();
    if skipped > 0 {
        debug!("Skipped {} of {} rows (missing sport/result or bad odds)", skipped, rows.len());
    }

    records
}
