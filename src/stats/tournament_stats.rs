use std::cmp::Reverse;
use std::collections::HashMap;

use crate::data::types::BetRecord;
use crate::stats::tournament::normalize_tournament_name;

/// Alternate sport spellings found in the sheet.
const SPORT_ALIASES: &[(&str, &str)] = &[("CStwo", "CS2")];

fn canonical_sport(sport: &str) -> &str {
    SPORT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == sport)
        .map_or(sport, |&(_, canonical)| canonical)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WinCount {
    pub wins: u32,
    pub total: u32,
}

impl WinCount {
    pub fn add(&mut self, win: bool) {
        self.total += 1;
        if win {
            self.wins += 1;
        }
    }

    /// Zero when there are no bets; nodes in the tree always have some.
    pub fn win_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.wins as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TournamentNode {
    pub name: String,
    pub counts: WinCount,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SportNode {
    pub sport: String,
    pub counts: WinCount,
    pub tournaments: Vec<TournamentNode>,
}

/// Sport → normalized tournament → win/total, busiest first at both levels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TournamentTree {
    pub sports: Vec<SportNode>,
}

impl TournamentTree {
    pub fn total_bets(&self) -> u32 {
        self.sports.iter().map(|s| s.counts.total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sports.is_empty()
    }
}

pub fn build_tournament_tree(records: &[BetRecord]) -> TournamentTree {
    let mut stats: HashMap<&str, HashMap<String, WinCount>> = HashMap::new();

    for record in records {
        if record.sport.is_empty() || record.tournament.is_empty() {
            continue;
        }
        let name = normalize_tournament_name(&record.tournament);
        if name.is_empty() {
            continue;
        }
        stats
            .entry(canonical_sport(&record.sport))
            .or_default()
            .entry(name)
            .or_default()
            .add(record.is_win());
    }

    let mut sports: Vec<SportNode> = stats
        .into_iter()
        .map(|(sport, tourneys)| {
            let mut tournaments: Vec<TournamentNode> = tourneys
                .into_iter()
                .map(|(name, counts)| TournamentNode { name, counts })
                .collect();
            tournaments.sort_by(|a, b| {
                Reverse(a.counts.total)
                    .cmp(&Reverse(b.counts.total))
                    .then_with(|| a.name.cmp(&b.name))
            });

            let counts = tournaments.iter().fold(WinCount::default(), |acc, t| WinCount {
                wins: acc.wins + t.counts.wins,
                total: acc.total + t.counts.total,
            });

            SportNode {
                sport: sport.to_string(),
                counts,
                tournaments,
            }
        })
        .collect();

    sports.sort_by(|a, b| {
        Reverse(a.counts.total)
            .cmp(&Reverse(b.counts.total))
            .then_with(|| a.sport.cmp(&b.sport))
    });

    TournamentTree { sports }
}
