//! Console and JSON rendering for the hot list and poller events.

use crate::state::hot::ScoredMatch;
use crate::state::notify::MatchEvent;
use chrono::NaiveDate;
use matchday_api::{MatchRecord, MatchStatus};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Serialize)]
struct HotReport<'a> {
    date: Option<NaiveDate>,
    total_matches: usize,
    hot: &'a [ScoredMatch],
}

pub fn hot_list_json(date: Option<NaiveDate>, total_matches: usize, hot: &[ScoredMatch]) -> serde_json::Result<String> {
    serde_json::to_string(&HotReport { date, total_matches, hot })
}

pub fn event_json(event: &MatchEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

pub fn hot_list_text(date: Option<NaiveDate>, total_matches: usize, hot: &[ScoredMatch]) -> String {
    let day = date.map_or_else(|| "today".to_owned(), |d| d.format("%a %d %b %Y").to_string());
    let mut out = format!("Hot matches for {day} ({} of {total_matches})\n", hot.len());
    if hot.is_empty() {
        out.push_str("  nothing worth watching yet\n");
        return out;
    }
    for (rank, m) in hot.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {:<12} {}  [{}, {}]  votes {}  score {:.0}",
            rank + 1,
            badge(&m.record),
            m.record.title(),
            m.record.league_name,
            m.record.country_name,
            m.total_votes,
            m.hot_score,
        );
    }
    out
}

fn badge(record: &MatchRecord) -> String {
    let score = record.score.map(|(h, a)| format!(" {h}-{a}"));
    match &record.status {
        MatchStatus::InPlay => format!("LIVE{}", score.unwrap_or_default()),
        MatchStatus::Paused => format!("HT{}", score.unwrap_or_default()),
        MatchStatus::Finished => format!("FT{}", score.unwrap_or_default()),
        status if status.is_terminal() => status.label().to_owned(),
        _ => match record.kickoff {
            Some(kickoff) => kickoff.format("%H:%M UTC").to_string(),
            None => "time TBD".to_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use matchday_api::MatchId;

    fn scored(id: &str, status: MatchStatus, score: Option<(u16, u16)>) -> ScoredMatch {
        ScoredMatch {
            record: MatchRecord {
                id: MatchId::from(id),
                home_team: "Arsenal".into(),
                away_team: "Chelsea".into(),
                status,
                kickoff: Some(Utc.with_ymd_and_hms(2026, 6, 11, 19, 45, 0).unwrap()),
                league_name: "Premier League".into(),
                country_name: "England".into(),
                score,
                ..Default::default()
            },
            hot_score: 1010.0,
            total_votes: 1,
            is_live: false,
        }
    }

    #[test]
    fn text_lists_ranked_matches() {
        let hot = vec![
            scored("1", MatchStatus::InPlay, Some((1, 0))),
            scored("2", MatchStatus::Timed, None),
        ];
        let text = hot_list_text(NaiveDate::from_ymd_opt(2026, 6, 11), 12, &hot);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Hot matches for Thu 11 Jun 2026 (2 of 12)");
        assert!(lines[1].starts_with("  1. LIVE 1-0"));
        assert!(lines[1].contains("Arsenal vs Chelsea  [Premier League, England]"));
        assert!(lines[2].contains("19:45 UTC"));
    }

    #[test]
    fn empty_list_says_so() {
        let text = hot_list_text(None, 0, &[]);
        assert!(text.starts_with("Hot matches for today (0 of 0)"));
        assert!(text.contains("nothing worth watching"));
    }

    #[test]
    fn json_report_shape() {
        let hot = vec![scored("7", MatchStatus::Finished, Some((2, 1)))];
        let json: serde_json::Value =
            serde_json::from_str(&hot_list_json(NaiveDate::from_ymd_opt(2026, 6, 11), 4, &hot).unwrap()).unwrap();
        assert_eq!(json["date"], "2026-06-11");
        assert_eq!(json["total_matches"], 4);
        assert_eq!(json["hot"][0]["record"]["id"], "7");
        assert_eq!(json["hot"][0]["record"]["status"], "FINISHED");
        assert_eq!(json["hot"][0]["record"]["score"], serde_json::json!([2, 1]));
    }
}
