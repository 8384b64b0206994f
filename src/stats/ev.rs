//! Expected value of a decimal-odds bet given an observed win rate.

pub const NOT_AVAILABLE: &str = "N/A";

/// `EV = win_rate * odds - 1`, the profit per unit staked.
pub fn expected_value(win_rate: Option<f64>, odds: Option<f64>) -> Option<f64> {
    Some(win_rate? * odds? - 1.0)
}

/// Expected value plus its display string ("N/A" when unknown).
pub fn format_ev(win_rate: Option<f64>, odds: Option<f64>) -> (String, Option<f64>) {
    let ev = expected_value(win_rate, odds);
    (format_percent(ev), ev)
}

pub fn format_win_rate(win_rate: Option<f64>) -> String {
    format_percent(win_rate)
}

pub fn format_count(count: Option<u32>) -> String {
    count.map_or_else(|| NOT_AVAILABLE.to_string(), |c| c.to_string())
}

fn format_percent(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{:.2}%", r * 100.0),
        None => NOT_AVAILABLE.to_string(),
    }
}
