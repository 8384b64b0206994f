use serde::Deserialize;
use std::fmt;

/// One validated wager row from the sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct BetRecord {
    pub sport: String,
    pub tournament: String,
    pub matchup: String,
    pub bet: String,
    pub live_status: String,
    pub odds: f64,
    pub result: String,
}

impl BetRecord {
    /// Substring heuristic on the status column: "NOT" overrides "LIVE".
    pub fn is_live(&self) -> bool {
        let status = self.live_status.to_uppercase();
        status.contains("LIVE") && !status.contains("NOT")
    }

    pub fn is_win(&self) -> bool {
        self.result.to_lowercase() == "win"
    }
}

/// Odds rounded to 4 decimal places, stored as ten-thousandths so it can be
/// hashed and ordered. Rounding works on the exact stored value, so
/// 1.00105 (stored just below the tie) buckets with 1.0010.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OddsKey(i64);

impl OddsKey {
    const SCALE: f64 = 10_000.0;

    pub fn from_odds(odds: f64) -> Option<Self> {
        if !odds.is_finite() {
            return None;
        }
        let rounded: f64 = format!("{:.4}", odds).parse().ok()?;
        let scaled = (rounded * Self::SCALE).round();
        if scaled.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Self(scaled as i64))
    }

    pub fn value(&self) -> f64 {
        self.0 as f64 / Self::SCALE
    }
}

impl fmt::Display for OddsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.value())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum BetType {
    #[default]
    Live,
    Prematch,
}

impl BetType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "live" | "l" => Some(BetType::Live),
            "prematch" | "pre" | "p" => Some(BetType::Prematch),
            _ => None,
        }
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetType::Live => write!(f, "Live"),
            BetType::Prematch => write!(f, "Prematch"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(live_status: &str, result: &str) -> BetRecord {
        BetRecord {
            sport: "CS2".to_string(),
            tournament: String::new(),
            matchup: String::new(),
            bet: String::new(),
            live_status: live_status.to_string(),
            odds: 1.5,
            result: result.to_string(),
        }
    }

    #[test]
    fn test_live_heuristic() {
        assert!(record("Live", "Win").is_live());
        assert!(record("live bet", "Win").is_live());
        assert!(!record("Not Live", "Win").is_live());
        assert!(!record("LIVE - NOTED", "Win").is_live());
        assert!(!record("Prematch", "Win").is_live());
        assert!(!record("", "Win").is_live());
    }

    #[test]
    fn test_win_is_exact() {
        assert!(record("", "Win").is_win());
        assert!(record("", "WIN").is_win());
        assert!(!record("", "Won").is_win());
        assert!(!record("", "Loss").is_win());
        assert!(!record("", "push").is_win());
    }

    #[test]
    fn test_odds_key_rounding() {
        assert_eq!(OddsKey::from_odds(1.85), OddsKey::from_odds(1.850_04));
        assert_ne!(OddsKey::from_odds(1.85), OddsKey::from_odds(1.8501));
        assert_eq!(OddsKey::from_odds(0.1 + 0.2), OddsKey::from_odds(0.3));
        assert_eq!(OddsKey::from_odds(1.85).unwrap().to_string(), "1.8500");
        assert!((OddsKey::from_odds(2.1).unwrap().value() - 2.1).abs() < 1e-12);
    }

    #[test]
    fn test_odds_key_rounds_the_stored_value() {
        // Neither literal is an exact tie in binary; both sit just below it
        assert_eq!(OddsKey::from_odds(1.00105).unwrap().to_string(), "1.0010");
        assert_eq!(OddsKey::from_odds(2.00005).unwrap().to_string(), "2.0000");
        assert_eq!(OddsKey::from_odds(2.00005), OddsKey::from_odds(2.0));
        assert_eq!(OddsKey::from_odds(1.23456).unwrap().to_string(), "1.2346");
    }

    #[test]
    fn test_odds_key_rejects_non_finite() {
        assert_eq!(OddsKey::from_odds(f64::NAN), None);
        assert_eq!(OddsKey::from_odds(f64::INFINITY), None);
        assert_eq!(OddsKey::from_odds(1e300), None);
    }

    #[test]
    fn test_odds_key_orders_numerically() {
        let mut keys: Vec<OddsKey> = [2.1, 1.05, 10.0, 1.85]
            .iter()
            .filter_map(|o| OddsKey::from_odds(*o))
            .collect();
        keys.sort();
        let values: Vec<f64> = keys.iter().map(|k| k.value()).collect();
        assert_eq!(values, vec![1.05, 1.85, 2.1, 10.0]);
    }

    #[test]
    fn test_bet_type_parse() {
        assert_eq!(BetType::parse("Live"), Some(BetType::Live));
        assert_eq!(BetType::parse(" prematch "), Some(BetType::Prematch));
        assert_eq!(BetType::parse("later"), None);
    }
}
