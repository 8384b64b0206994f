use std::fmt::Write;

use crate::data::types::BetType;
use crate::session::snapshot::Snapshot;
use crate::stats::ev::{format_ev, format_win_rate};
use crate::stats::odds_table::{SportCache, TableSort};
use crate::stats::tournament_stats::TournamentTree;

/// Sports busiest first, with their bet counts.
pub fn render_sports(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for name in &snapshot.sport_order {
        let total = snapshot.sport(name).map_or(0, SportCache::total_bets);
        let _ = writeln!(out, "  {:<24} {:>6}", name, total);
    }
    if out.is_empty() {
        out.push_str("  (no sports)\n");
    }
    out
}

/// Odds table with EV for the selected bet type.
pub fn render_odds_table(sport: &str, cache: &SportCache, bet_type: BetType, sort: TableSort) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} - {}", sport, bet_type);
    let _ = writeln!(
        out,
        "  {:>8} {:>12} {:>14} {:>10}",
        "Odds", "Live WR %", "Prematch WR %", "EV %"
    );

    for row in cache.sorted_rows(sort, bet_type) {
        let s = row.summary;
        let (ev, _) = format_ev(s.win_rate(bet_type), Some(row.odds()));
        let _ = writeln!(
            out,
            "  {:>8.2} {:>12} {:>14} {:>10}",
            row.odds(),
            format_win_rate(s.live_wr),
            format_win_rate(s.prematch_wr),
            ev
        );
    }
    out
}

/// Sport → tournament tree with bet counts and win rates.
pub fn render_tournament_tree(tree: &TournamentTree) -> String {
    let mut out = String::new();
    if tree.is_empty() {
        return "  (no tournament data)\n".to_string();
    }
    let _ = writeln!(out, "  {:<40} {:>9} {:>10}", "Sport / Tournament", "Bet Count", "Winrate %");

    for sport in &tree.sports {
        let _ = writeln!(
            out,
            "  {:<40} {:>9} {:>9.1}%",
            sport.sport,
            sport.counts.total,
            sport.counts.win_rate() * 100.0
        );
        for t in &sport.tournaments {
            let _ = writeln!(
                out,
                "    {:<38} {:>9} {:>9.1}%",
                t.name,
                t.counts.total,
                t.counts.win_rate() * 100.0
            );
        }
    }

    let _ = writeln!(out, "  Total bets: {}", tree.total_bets());
    out
}

pub fn render_status(snapshot: &Snapshot) -> String {
    let loaded = snapshot.loaded_at.format("%Y-%m-%d %H:%M:%S UTC");
    match snapshot.fetch_error() {
        Some(reason) => format!("Fetch failed at {}: {}", loaded, reason),
        None => format!(
            "{} bets across {} sports, loaded {}",
            snapshot.records.len(),
            snapshot.sports.len(),
            loaded
        ),
    }
}
