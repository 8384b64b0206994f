use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::data::types::BetType;
use crate::report::csv::export_odds_table;
use crate::report::text::{render_odds_table, render_sports, render_status, render_tournament_tree};
use crate::session::loader::Session;
use crate::stats::compare::compare_inputs;
use crate::stats::odds_table::{SortColumn, TableSort};

const HELP: &str = "\
Commands:
  sports                     list sports, busiest first
  sport <name>               select a sport and show its odds table
  type live|prematch         switch bet type
  table [column] [asc|desc]  show the odds table; column is odds, live, prematch or ev
  compare <odds_a> <odds_b>  compare two odds for the selected sport and bet type
  stats                      win rates by sport and tournament
  refresh                    reload everything from the sheet
  status                     show what is loaded
  export <path>              write the odds table to a CSV file
  help                       show this text
  quit                       exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Sports,
    Sport(String),
    Type(BetType),
    /// `None` keeps the current ordering.
    Table(Option<TableSort>),
    Compare(String, String),
    Stats,
    Refresh,
    Status,
    Export(PathBuf),
    Quit,
}

/// `Ok(None)` for a blank line; `Err` carries a message for the user.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "sports" => Command::Sports,
        "sport" if !rest.is_empty() => Command::Sport(rest.to_string()),
        "sport" => return Err("Usage: sport <name>".to_string()),
        "type" => match BetType::parse(rest) {
            Some(bet_type) => Command::Type(bet_type),
            None => return Err("Usage: type live|prematch".to_string()),
        },
        "table" => Command::Table(parse_sort(rest)?),
        "compare" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(a), Some(b), None) => Command::Compare(a.to_string(), b.to_string()),
                _ => return Err("Usage: compare <odds_a> <odds_b>".to_string()),
            }
        }
        "stats" => Command::Stats,
        "refresh" => Command::Refresh,
        "status" => Command::Status,
        "export" if !rest.is_empty() => Command::Export(PathBuf::from(rest)),
        "export" => return Err("Usage: export <path>".to_string()),
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("Unknown command: {} (try 'help')", other)),
    };

    Ok(Some(command))
}

/// `odds` sorts ascending by default, the other columns descending.
fn parse_sort(args: &str) -> Result<Option<TableSort>, String> {
    const USAGE: &str = "Usage: table [odds|live|prematch|ev] [asc|desc]";

    let mut parts = args.split_whitespace();
    let Some(column) = parts.next() else {
        return Ok(None);
    };
    let column = SortColumn::parse(column).ok_or(USAGE)?;
    let descending = match parts.next().map(str::to_lowercase).as_deref() {
        None => column != SortColumn::Odds,
        Some("asc") => false,
        Some("desc") => true,
        Some(_) => return Err(USAGE.to_string()),
    };
    if parts.next().is_some() {
        return Err(USAGE.to_string());
    }

    Ok(Some(TableSort { column, descending }))
}

/// Line-oriented front-end over a loaded [`Session`].
pub struct Console {
    session: Session,
    sport: Option<String>,
    bet_type: BetType,
    sort: TableSort,
    last_compare: Option<(String, String)>,
}

impl Console {
    pub fn new(session: Session, bet_type: BetType) -> Self {
        let sport = session.snapshot().top_sport().map(str::to_string);
        Self {
            session,
            sport,
            bet_type,
            sort: TableSort::default(),
            last_compare: None,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("{}", HELP);
        println!("{}", render_status(&self.session.snapshot()));
        if self.sport.is_some() {
            println!("{}", self.table());
        }

        loop {
            print!("{} [{}]> ", self.sport.as_deref().unwrap_or("-"), self.bet_type);
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match parse_command(&line) {
                Ok(None) => continue,
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    let output = self.execute(command).await;
                    if !output.is_empty() {
                        println!("{}", output.trim_end());
                    }
                }
                Err(message) => println!("{}", message),
            }
        }

        info!("Console closed");
        Ok(())
    }

    pub async fn execute(&mut self, command: Command) -> String {
        match command {
            Command::Help => HELP.to_string(),
            Command::Sports => render_sports(&self.session.snapshot()),
            Command::Sport(name) => self.select_sport(&name),
            Command::Type(bet_type) => {
                self.bet_type = bet_type;
                self.with_comparison(self.table())
            }
            Command::Table(sort) => {
                if let Some(sort) = sort {
                    self.sort = sort;
                }
                self.table()
            }
            Command::Compare(a, b) => {
                self.last_compare = Some((a, b));
                self.comparison().unwrap_or_default()
            }
            Command::Stats => render_tournament_tree(&self.session.snapshot().tournaments),
            Command::Refresh => self.refresh().await,
            Command::Status => render_status(&self.session.snapshot()),
            Command::Export(path) => self.export(path),
            Command::Quit => String::new(),
        }
    }

    fn select_sport(&mut self, name: &str) -> String {
        let snapshot = self.session.snapshot();
        let found = snapshot
            .sport_order
            .iter()
            .find(|s| s.as_str() == name)
            .or_else(|| snapshot.sport_order.iter().find(|s| s.eq_ignore_ascii_case(name)));

        match found {
            Some(sport) => {
                self.sport = Some(sport.clone());
                self.with_comparison(self.table())
            }
            None => format!("Unknown sport: {}", name),
        }
    }

    async fn refresh(&mut self) -> String {
        println!("Refreshing all data...");
        let snapshot = match self.session.refresh().await {
            Ok(snapshot) => snapshot,
            Err(e) => return format!("Failed to load data: {}", e),
        };

        let keep = self.sport.as_deref().is_some_and(|s| snapshot.sport(s).is_some());
        if !keep {
            self.sport = snapshot.top_sport().map(str::to_string);
        }

        let mut out = match snapshot.fetch_error() {
            Some(reason) => format!("Failed to load data: {}\n", reason),
            None => format!("{}\n", render_status(&snapshot)),
        };
        if self.sport.is_some() {
            out.push_str(&self.with_comparison(self.table()));
        }
        out
    }

    fn table(&self) -> String {
        let snapshot = self.session.snapshot();
        match self.sport.as_deref().and_then(|s| snapshot.sport(s).map(|c| (s, c))) {
            Some((sport, cache)) => render_odds_table(sport, cache, self.bet_type, self.sort),
            None => "No sport selected".to_string(),
        }
    }

    /// Re-run the last comparison against the current sport and bet type.
    fn comparison(&self) -> Option<String> {
        let (a, b) = self.last_compare.as_ref()?;
        let sport = self.sport.as_deref()?;
        let snapshot = self.session.snapshot();
        let cache = snapshot.sport(sport)?;
        compare_inputs(sport, cache, a, b, self.bet_type).map(|c| c.to_string())
    }

    fn with_comparison(&self, mut out: String) -> String {
        if let Some(cmp) = self.comparison() {
            out.push('\n');
            out.push_str(&cmp);
        }
        out
    }

    fn export(&self, path: PathBuf) -> String {
        let snapshot = self.session.snapshot();
        let Some((sport, cache)) = self
            .sport
            .as_deref()
            .and_then(|s| snapshot.sport(s).map(|c| (s, c)))
        else {
            return "No sport selected".to_string();
        };

        match export_odds_table(&path, sport, cache, self.bet_type) {
            Ok(rows) => format!("Exported {} rows to {}", rows, path.display()),
            Err(e) => format!("Export failed: {:#}", e),
        }
    }
}
