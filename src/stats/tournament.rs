//! Tournament title normalization.
//!
//! Recurring events are published under many titles ("ESL Pro League Season 19",
//! "BLAST Premier Spring 2024 Groups", ...). Stripping edition, year, stage and
//! region qualifiers yields a stable key that groups them together. Rules run
//! in a fixed order; later rules rely on earlier ones having shortened the text.

use regex::Regex;
use std::sync::LazyLock;

/// Extra condition a match must satisfy before it is removed. The `regex`
/// crate has no look-behind, so these stand in for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guard {
    Always,
    /// Keep the token when it opens the title.
    NotAtStart,
    /// Keep the token when it opens the title or directly follows "IEM ".
    NotAtStartOrAfterIem,
}

struct Rule {
    pattern: Regex,
    guard: Guard,
}

impl Rule {
    fn new(pattern: &str, guard: Guard) -> Self {
        Self {
            pattern: Regex::new(&format!("(?i){}", pattern)).expect("invalid tournament rule"),
            guard,
        }
    }

    fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for m in self.pattern.find_iter(text) {
            if !self.allows(text, m.start()) {
                continue;
            }
            out.push_str(&text[last..m.start()]);
            last = m.end();
        }
        out.push_str(&text[last..]);
        out
    }

    fn allows(&self, text: &str, start: usize) -> bool {
        match self.guard {
            Guard::Always => true,
            Guard::NotAtStart => start > 0,
            Guard::NotAtStartOrAfterIem => start > 0 && !follows_iem(&text[..start]),
        }
    }
}

/// True when `before` ends with the word "IEM" plus one whitespace character.
fn follows_iem(before: &str) -> bool {
    let mut chars = before.chars();
    if !chars.next_back().is_some_and(char::is_whitespace) {
        return false;
    }
    let rest = chars.as_str();
    if rest.len() < 3 || !rest.is_char_boundary(rest.len() - 3) {
        return false;
    }
    let (head, word) = rest.split_at(rest.len() - 3);
    word.eq_ignore_ascii_case("iem")
        && !head.chars().next_back().is_some_and(|c| c.is_alphanumeric() || c == '_')
}

const ABBREVIATIONS: &[(&str, &str)] = &[("StarLadder SS", "StarLadder StarSeries")];

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("invalid year pattern"));
static RESIDUAL_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{1,3}\b").expect("invalid number pattern"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace pattern"));

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    use Guard::*;
    vec![
        Rule::new(r"\bSeason\s+\d+\b", Always),
        Rule::new(r"\bSeries\s+\d+\b", Always),
        Rule::new(r"\bVol\.?\s*\d+\b", Always),
        Rule::new(r"\bPart\s+\d+\b", Always),
        Rule::new(r"\bStage\s+\d+\b", Always),
        Rule::new(r"\bPhase\s+\d+\b", Always),
        Rule::new(r"\bSplit\s+\d+\b", Always),
        Rule::new(r"\bGroup\s+[A-Za-z0-9]+\b", Always),
        Rule::new(r"#\d+", Always),
        Rule::new(r"\bOS\b", Always),
        Rule::new(r"\b(Asia|Americas|Europe)\s+RMR(\s+[A-Z])?\b", Always),
        Rule::new(r"\bRMR\b", Always),
        Rule::new(r"\bS\d+\b", Always),
        Rule::new(
            r"\b(Europe|EU|NA|SA|Asia|Americas|Oceania|CIS|European|South American|North American|Pacific|APAC)\b",
            NotAtStart,
        ),
        Rule::new(r"\bLCQ\b", Always),
        Rule::new(r"\b(Play-In|Global Finals|Contenders|CQ|Finals?|Groups?|Playoffs?)\b", Always),
        Rule::new(r"\b\d+(?:st|nd|rd|th)?\s+Division\b", Always),
        Rule::new(r"\bDivision\s+\d+\b", Always),
        Rule::new(r"\bSeries\b", Always),
        Rule::new(r"\b(Atlanta|Katowice|Bangkok|Raleigh|Lisbon)\b", NotAtStartOrAfterIem),
        Rule::new(r"\b(Spring|Summer|Fall|Winter)\b", Always),
        Rule::new(r"\b(I|II|III|IV|V|VI|VII|VIII|IX|X)\b", Always),
    ]
});

/// Reduce a tournament title to its grouping key. Empty input gives empty output.
pub fn normalize_tournament_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let mut name = name.to_string();
    for (short, full) in ABBREVIATIONS {
        name = name.replace(short, full);
    }

    // Sub-phase qualifiers follow "//" or ": "
    if let Some(i) = name.find("//") {
        name.truncate(i);
    }
    if let Some(i) = name.find(": ") {
        name.truncate(i);
    }

    let mut name = YEAR.replace_all(&name, "").into_owned();
    for rule in RULES.iter() {
        name = rule.apply(&name);
    }
    let name = RESIDUAL_NUMBER.replace_all(&name, "");
    let name = WHITESPACE.replace_all(&name, " ");

    name.trim_matches(|c| c == ' ' || c == '-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[(&str, &str)] = &[
        ("BLAST Premier Spring 2024 Groups", "BLAST Premier"),
        ("ESL Pro League Season 19", "ESL Pro League"),
        ("ESL Pro League 21", "ESL Pro League"),
        ("UFC 302", "UFC"),
        ("StarLadder SS Season 2", "StarLadder StarSeries"),
        ("BLAST: CQ", "BLAST"),
        ("Galaxy Battle // Phase 4", "Galaxy Battle"),
        ("IEM Katowice 2024", "IEM Katowice"),
        ("PGL Major Copenhagen 2024 Europe RMR A", "PGL Major Copenhagen"),
        ("Europe Masters 2023", "Europe Masters"),
        ("Katowice Cup", "Katowice Cup"),
        ("BLAST Premier Fall Final 2023", "BLAST Premier"),
        ("CCT Season 2 Europe Series 7", "CCT"),
        ("VCT 2024: Americas Stage 1", "VCT"),
        ("LCK Summer Playoffs", "LCK"),
        ("ESEA Advanced Division 4", "ESEA Advanced"),
        ("Thunderpick World Championship 2nd Division", "Thunderpick World Championship"),
        ("Perfect World Major Shanghai 2024 Asia RMR", "Perfect World Major Shanghai"),
        ("Dota 2 Elite League Play-In", "Dota Elite League"),
        ("CS Asia Championships II", "CS Championships"),
        ("Skyesports #12", "Skyesports"),
        ("Rainbow Six Invitational S3 - LCQ", "Rainbow Six Invitational"),
        ("Global Finals", ""),
    ];

    #[test]
    fn test_samples() {
        for (input, expected) in SAMPLES {
            assert_eq!(normalize_tournament_name(input), *expected, "input: {:?}", input);
        }
    }

    #[test]
    fn test_idempotent() {
        for (input, _) in SAMPLES {
            let once = normalize_tournament_name(input);
            assert_eq!(normalize_tournament_name(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(normalize_tournament_name(""), "");
        assert_eq!(normalize_tournament_name("   "), "");
        assert_eq!(normalize_tournament_name("2024"), "");
    }

    #[test]
    fn test_year_removed_before_short_numbers() {
        // "2024" must disappear whole, not leave a 3-digit tail
        assert_eq!(normalize_tournament_name("Cup 2024"), "Cup");
        // Years outside 1900-2099 are just numbers; four digits survive
        assert_eq!(normalize_tournament_name("Cup 2150"), "Cup 2150");
    }

    #[test]
    fn test_region_kept_at_start_only() {
        assert_eq!(normalize_tournament_name("NA Challengers"), "NA Challengers");
        assert_eq!(normalize_tournament_name("Challengers NA"), "Challengers");
    }

    #[test]
    fn test_follows_iem() {
        assert!(follows_iem("IEM "));
        assert!(follows_iem("Intel iem "));
        assert!(!follows_iem("IEM"));
        assert!(!follows_iem("XIEM "));
        assert!(!follows_iem("Major "));
        assert!(!follows_iem(""));
    }
}
