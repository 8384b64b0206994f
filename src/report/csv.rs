use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::data::types::BetType;
use crate::stats::ev::expected_value;
use crate::stats::odds_table::SportCache;

const HEADER: &str = "sport,odds,live_wr,prematch_wr,live_count,prematch_count,bet_type,ev";

/// Write one sport's odds table as CSV, replacing any existing file.
/// Absent values are left as empty fields.
pub fn export_odds_table(path: &Path, sport: &str, cache: &SportCache, bet_type: BetType) -> Result<usize> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("Failed to open export file: {}", path.display()))?;

    writeln!(file, "{}", HEADER)?;

    for row in cache.rows() {
        let s = row.summary;
        let ev = expected_value(s.win_rate(bet_type), Some(row.odds()));

        writeln!(
            file,
            "{},{:.4},{},{},{},{},{},{}",
            csv_field(sport),
            row.odds(),
            opt_ratio(s.live_wr),
            opt_ratio(s.prematch_wr),
            opt_count(s.live_count),
            opt_count(s.prematch_count),
            bet_type,
            opt_ratio(ev)
        )?;
    }

    Ok(cache.rows().len())
}

fn opt_ratio(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_default()
}

fn opt_count(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::BetRecord;
    use crate::stats::odds_table::build_sport_caches;

    fn bet(odds: f64, status: &str, result: &str) -> BetRecord {
        BetRecord {
            sport: "CS2".to_string(),
            tournament: "Major".to_string(),
            matchup: "A vs B".to_string(),
            bet: "ML".to_string(),
            live_status: status.to_string(),
            odds,
            result: result.to_string(),
        }
    }

    #[test]
    fn test_export_writes_rows() {
        let caches = build_sport_caches(&[
            bet(1.85, "Live", "Win"),
            bet(1.85, "Live", "Loss"),
            bet(2.5, "Prematch", "Win"),
        ]);
        let path = std::env::temp_dir().join(format!("matchbet-export-{}.csv", std::process::id()));

        let written = export_odds_table(&path, "CS2", &caches["CS2"], BetType::Live).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(written, 2);
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "CS2,1.8500,0.5000,,2,,Live,-0.0750");
        assert_eq!(lines[2], "CS2,2.5000,,1.0000,,1,Live,");
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("CS2"), "CS2");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
