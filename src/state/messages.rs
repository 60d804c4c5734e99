use crate::state::hot::ScoredMatch;
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    /// Fetch the feed for a day (today when `None`) and rank it.
    LoadFeed { date: Option<NaiveDate> },
    /// Re-rank the most recently loaded day.
    RefreshFeed,
}

#[derive(Debug)]
pub enum NetworkResponse {
    HotMatchesRanked {
        date: Option<NaiveDate>,
        total_matches: usize,
        hot: Vec<ScoredMatch>,
    },
    Error { message: String },
}
