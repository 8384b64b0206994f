use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use crate::data::types::{BetRecord, BetType, OddsKey};
use crate::stats::ev::expected_value;

/// Raw tallies for one (sport, odds) bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OddsStats {
    pub live_wins: u32,
    pub live_total: u32,
    pub prematch_wins: u32,
    pub prematch_total: u32,
}

impl OddsStats {
    pub fn record(&mut self, live: bool, win: bool) {
        let (wins, total) = if live {
            (&mut self.live_wins, &mut self.live_total)
        } else {
            (&mut self.prematch_wins, &mut self.prematch_total)
        };
        *total += 1;
        if win {
            *wins += 1;
        }
    }

    pub fn live_win_rate(&self) -> Option<f64> {
        win_rate(self.live_wins, self.live_total)
    }

    pub fn prematch_win_rate(&self) -> Option<f64> {
        win_rate(self.prematch_wins, self.prematch_total)
    }

    pub fn summary(&self) -> OddsSummary {
        OddsSummary {
            live_wr: self.live_win_rate(),
            prematch_wr: self.prematch_win_rate(),
            live_count: non_zero(self.live_total),
            prematch_count: non_zero(self.prematch_total),
        }
    }
}

fn win_rate(wins: u32, total: u32) -> Option<f64> {
    (total > 0).then(|| wins as f64 / total as f64)
}

fn non_zero(count: u32) -> Option<u32> {
    (count > 0).then_some(count)
}

/// Win rates and counts for one odds value. A side with no bets is `None`,
/// never zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OddsSummary {
    pub live_wr: Option<f64>,
    pub prematch_wr: Option<f64>,
    pub live_count: Option<u32>,
    pub prematch_count: Option<u32>,
}

impl OddsSummary {
    pub fn win_rate(&self, bet_type: BetType) -> Option<f64> {
        match bet_type {
            BetType::Live => self.live_wr,
            BetType::Prematch => self.prematch_wr,
        }
    }

    pub fn count(&self, bet_type: BetType) -> Option<u32> {
        match bet_type {
            BetType::Live => self.live_count,
            BetType::Prematch => self.prematch_count,
        }
    }

    pub fn total(&self) -> u32 {
        self.live_count.unwrap_or(0) + self.prematch_count.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OddsRow {
    pub key: OddsKey,
    pub summary: OddsSummary,
}

impl OddsRow {
    pub fn odds(&self) -> f64 {
        self.key.value()
    }

    /// Missing win rates and EVs sort below every real value.
    fn sort_value(&self, column: SortColumn, bet_type: BetType) -> f64 {
        let value = match column {
            SortColumn::Odds => Some(self.odds()),
            SortColumn::LiveWr => self.summary.live_wr,
            SortColumn::PrematchWr => self.summary.prematch_wr,
            SortColumn::Ev => expected_value(self.summary.win_rate(bet_type), Some(self.odds())),
        };
        value.unwrap_or(f64::NEG_INFINITY)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortColumn {
    #[default]
    Odds,
    LiveWr,
    PrematchWr,
    Ev,
}

impl SortColumn {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "odds" => Some(SortColumn::Odds),
            "live" => Some(SortColumn::LiveWr),
            "prematch" | "pre" => Some(SortColumn::PrematchWr),
            "ev" => Some(SortColumn::Ev),
            _ => None,
        }
    }
}

/// Display order of an odds table. Defaults to odds ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableSort {
    pub column: SortColumn,
    pub descending: bool,
}

/// Per-sport odds table: rows ascending by odds plus a point lookup. Both are
/// built from the same tallies and are read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SportCache {
    rows: Vec<OddsRow>,
    index: HashMap<OddsKey, OddsSummary>,
}

impl SportCache {
    pub fn from_stats(stats: BTreeMap<OddsKey, OddsStats>) -> Self {
        let rows: Vec<OddsRow> = stats
            .into_iter()
            .map(|(key, s)| OddsRow { key, summary: s.summary() })
            .collect();
        let index = rows.iter().map(|r| (r.key, r.summary)).collect();
        Self { rows, index }
    }

    pub fn rows(&self) -> &[OddsRow] {
        &self.rows
    }

    /// Rows reordered for display. Ties keep ascending odds order.
    pub fn sorted_rows(&self, sort: TableSort, bet_type: BetType) -> Vec<OddsRow> {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            let order = a
                .sort_value(sort.column, bet_type)
                .total_cmp(&b.sort_value(sort.column, bet_type));
            if sort.descending {
                order.reverse()
            } else {
                order
            }
        });
        rows
    }

    pub fn get(&self, key: OddsKey) -> Option<&OddsSummary> {
        self.index.get(&key)
    }

    pub fn lookup(&self, odds: f64) -> Option<&OddsSummary> {
        OddsKey::from_odds(odds).and_then(|k| self.get(k))
    }

    pub fn total_bets(&self) -> u32 {
        self.rows.iter().map(|r| r.summary.total()).sum()
    }
}

/// Group records by sport and rounded odds and compute win rates per bucket.
pub fn build_sport_caches(records: &[BetRecord]) -> HashMap<String, SportCache> {
    let mut agg: HashMap<&str, BTreeMap<OddsKey, OddsStats>> = HashMap::new();

    for record in records {
        let by_odds = agg.entry(record.sport.as_str()).or_default();
        let Some(key) = OddsKey::from_odds(record.odds) else {
            continue;
        };
        by_odds
            .entry(key)
            .or_default()
            .record(record.is_live(), record.is_win());
    }

    agg.into_iter()
        .map(|(sport, stats)| (sport.to_string(), SportCache::from_stats(stats)))
        .collect()
}

/// Sport names by total bet count, busiest first (ties by name).
pub fn sorted_sports(caches: &HashMap<String, SportCache>) -> Vec<String> {
    let mut sports: Vec<(&String, u32)> = caches
        .iter()
        .map(|(name, cache)| (name, cache.total_bets()))
        .collect();
    sports.sort_by(|a, b| Reverse(a.1).cmp(&Reverse(b.1)).then_with(|| a.0.cmp(b.0)));
    sports.into_iter().map(|(name, _)| name.clone()).collect()
}
