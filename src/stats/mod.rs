pub mod compare;
pub mod ev;
pub mod odds_table;
pub mod tournament;
pub mod tournament_stats;
