use std::fmt;

use crate::data::ingest::parse_decimal;
use crate::data::types::BetType;
use crate::stats::ev::{expected_value, format_count};
use crate::stats::odds_table::SportCache;

/// One side of a comparison that exists in the odds table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Side {
    /// Odds as entered by the user, not the rounded key.
    pub odds: f64,
    pub win_rate: Option<f64>,
    pub count: Option<u32>,
}

impl Side {
    pub fn ev(&self) -> Option<f64> {
        expected_value(self.win_rate, Some(self.odds))
    }

    /// `win_rate * odds`, i.e. EV + 1. Orders sides the same way EV does.
    pub fn score(&self) -> Option<f64> {
        self.win_rate.map(|wr| wr * self.odds)
    }

    fn describe(&self) -> String {
        match (self.win_rate, self.ev()) {
            (Some(wr), Some(ev)) => format!(
                "Bet {:.2} EV: {:.2}% (WR: {:.2}%, Count: {})",
                self.odds,
                ev * 100.0,
                wr * 100.0,
                format_count(self.count)
            ),
            _ => format!("Bet {:.2} EV: N/A", self.odds),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    FirstBetter,
    SecondBetter,
    Equal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    BothNotFound { odds_a: f64, odds_b: f64 },
    /// `present.win_rate` is `None` when the found side has no data for the bet type.
    OneNotFound { missing: f64, present: Side },
    BothMissingWinRate { odds_a: f64, odds_b: f64 },
    OneMissingWinRate { missing: f64, present: Side },
    Compared { a: Side, b: Side, verdict: Verdict },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub sport: String,
    pub bet_type: BetType,
    pub outcome: Outcome,
}

/// Parse both free-form inputs and compare them. Input that does not parse
/// means there is nothing to show yet.
pub fn compare_inputs(
    sport: &str,
    cache: &SportCache,
    input_a: &str,
    input_b: &str,
    bet_type: BetType,
) -> Option<Comparison> {
    let odds_a = parse_decimal(input_a)?;
    let odds_b = parse_decimal(input_b)?;
    Some(compare_odds(sport, cache, odds_a, odds_b, bet_type))
}

pub fn compare_odds(
    sport: &str,
    cache: &SportCache,
    odds_a: f64,
    odds_b: f64,
    bet_type: BetType,
) -> Comparison {
    let side = |odds: f64| {
        cache.lookup(odds).map(|summary| Side {
            odds,
            win_rate: summary.win_rate(bet_type),
            count: summary.count(bet_type),
        })
    };

    let outcome = match (side(odds_a), side(odds_b)) {
        (None, None) => Outcome::BothNotFound { odds_a, odds_b },
        (None, Some(present)) => Outcome::OneNotFound { missing: odds_a, present },
        (Some(present), None) => Outcome::OneNotFound { missing: odds_b, present },
        (Some(a), Some(b)) => match (a.score(), b.score()) {
            (None, None) => Outcome::BothMissingWinRate { odds_a, odds_b },
            (None, Some(_)) => Outcome::OneMissingWinRate { missing: odds_a, present: b },
            (Some(_), None) => Outcome::OneMissingWinRate { missing: odds_b, present: a },
            (Some(score_a), Some(score_b)) => {
                let verdict = if score_a > score_b {
                    Verdict::FirstBetter
                } else if score_b > score_a {
                    Verdict::SecondBetter
                } else {
                    Verdict::Equal
                };
                Outcome::Compared { a, b, verdict }
            }
        },
    };

    Comparison {
        sport: sport.to_string(),
        bet_type,
        outcome,
    }
}

impl Comparison {
    /// Warnings for sides backed by a single bet.
    pub fn notes(&self) -> Vec<String> {
        match &self.outcome {
            Outcome::Compared { a, b, .. } => [a, b]
                .iter()
                .filter(|s| s.count == Some(1))
                .map(|s| format!("Note: Odds {:.2} has only 1 count.", s.odds))
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bet_type = self.bet_type;
        match &self.outcome {
            Outcome::BothNotFound { odds_a, odds_b } => {
                write!(f, "Both odds not found in data: {:.2} and {:.2}.", odds_a, odds_b)
            }
            Outcome::OneNotFound { missing, present } => {
                if present.win_rate.is_some() {
                    write!(f, "Odd {:.2} not found.\n\n{}", missing, present.describe())
                } else {
                    write!(
                        f,
                        "Odd {:.2} not found. Odds {:.2} is in data but missing {} WR.",
                        missing, present.odds, bet_type
                    )
                }
            }
            Outcome::BothMissingWinRate { odds_a, odds_b } => write!(
                f,
                "Both odds are missing {} WR data: {:.2} and {:.2}.",
                bet_type, odds_a, odds_b
            ),
            Outcome::OneMissingWinRate { missing, present } => write!(
                f,
                "Odds {:.2} is missing {} WR.\n\n{}",
                missing,
                bet_type,
                present.describe()
            ),
            Outcome::Compared { a, b, verdict } => {
                let better = match verdict {
                    Verdict::FirstBetter => format!("Bet {:.2} is better", a.odds),
                    Verdict::SecondBetter => format!("Bet {:.2} is better", b.odds),
                    Verdict::Equal => "Both bets are equal".to_string(),
                };
                write!(
                    f,
                    "{} ({} - {})\n\n{}\n{}",
                    better,
                    bet_type,
                    self.sport,
                    a.describe(),
                    b.describe()
                )?;
                let notes = self.notes();
                if !notes.is_empty() {
                    write!(f, "\n\n{}", notes.join(" "))?;
                }
                Ok(())
            }
        }
    }
}
