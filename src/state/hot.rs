//! Hot-match ranking.
//!
//! A pure function of (records, tallies, now, config). Tiers, highest first:
//! live, upcoming with votes, finished with enough votes, upcoming without
//! votes. Finished matches without enough votes score 0 and are dropped.
//! The weights are tuning defaults; only that ordering is relied on.

use chrono::{DateTime, Duration, Utc};
use matchday_api::{MatchId, MatchRecord, VoteTally};
use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_POPULAR_TEAMS: &[&str] = &[
    "Real Madrid",
    "Barcelona",
    "Manchester United",
    "Manchester City",
    "Liverpool",
    "Arsenal",
    "Chelsea",
    "Bayern",
    "Juventus",
    "Paris Saint-Germain",
    "PSG",
    "Inter",
    "Milan",
    "Atlético",
];

#[derive(Debug, Clone, PartialEq)]
pub struct HotConfig {
    /// How many matches make the hot list.
    pub count: usize,
    /// Finished matches need at least this many votes to be shown.
    pub finished_vote_threshold: u32,
    /// Unvoted upcoming matches kicking off within this window get a bonus.
    pub kickoff_horizon: Duration,
    pub popular_teams: Vec<String>,
    pub live_base: f64,
    pub upcoming_with_votes_base: f64,
    pub finished_base: f64,
    pub vote_weight: f64,
    pub unvoted_base: f64,
    pub proximity_bonus: f64,
    pub popularity_bonus: f64,
}

impl Default for HotConfig {
    fn default() -> Self {
        Self {
            count: 3,
            finished_vote_threshold: 3,
            kickoff_horizon: Duration::hours(2),
            popular_teams: DEFAULT_POPULAR_TEAMS.iter().map(|t| t.to_string()).collect(),
            live_base: 1000.0,
            upcoming_with_votes_base: 100.0,
            finished_base: 50.0,
            vote_weight: 10.0,
            unvoted_base: 1.0,
            proximity_bonus: 20.0,
            popularity_bonus: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMatch {
    pub record: MatchRecord,
    pub hot_score: f64,
    pub total_votes: u32,
    pub is_live: bool,
}

/// Score every record, drop zero scores, order by tier then score, keep the
/// top `config.count`.
pub fn rank_hot_matches(
    records: &[MatchRecord],
    tallies: &HashMap<MatchId, VoteTally>,
    now: DateTime<Utc>,
    config: &HotConfig,
) -> Vec<ScoredMatch> {
    let mut ranked = rank_all(records, tallies, now, config);
    ranked.truncate(config.count);
    ranked
}

/// Like `rank_hot_matches` without the cut-off.
pub fn rank_all(
    records: &[MatchRecord],
    tallies: &HashMap<MatchId, VoteTally>,
    now: DateTime<Utc>,
    config: &HotConfig,
) -> Vec<ScoredMatch> {
    let mut scored: Vec<ScoredMatch> = records
        .iter()
        .map(|record| {
            let total_votes = tallies.get(&record.id).map(VoteTally::total).unwrap_or(0);
            ScoredMatch {
                hot_score: hot_score(record, total_votes, now, config),
                total_votes,
                is_live: record.is_live(),
                record: record.clone(),
            }
        })
        .filter(|m| m.hot_score > 0.0)
        .collect();

    // sort_by is stable, so equal scores keep feed order.
    scored.sort_by(|a, b| {
        b.is_live
            .cmp(&a.is_live)
            .then_with(|| b.hot_score.total_cmp(&a.hot_score))
    });
    scored
}

pub fn hot_score(record: &MatchRecord, total_votes: u32, now: DateTime<Utc>, config: &HotConfig) -> f64 {
    let votes = f64::from(total_votes) * config.vote_weight;

    if record.is_live() {
        return config.live_base + votes;
    }

    // Cancelled, postponed and awarded matches rank like finished ones.
    let finished = record.status.is_terminal();

    if total_votes > 0 {
        if finished {
            if total_votes < config.finished_vote_threshold {
                return 0.0;
            }
            return config.finished_base + votes;
        }
        return config.upcoming_with_votes_base + votes;
    }

    if finished {
        return 0.0;
    }

    let mut score = config.unvoted_base;
    if kicks_off_soon(record, now, config.kickoff_horizon) {
        score += config.proximity_bonus;
    }
    if involves_popular_team(record, &config.popular_teams) {
        score += config.popularity_bonus;
    }
    score
}

fn kicks_off_soon(record: &MatchRecord, now: DateTime<Utc>, horizon: Duration) -> bool {
    record
        .kickoff
        .map(|kickoff| kickoff >= now && kickoff - now <= horizon)
        .unwrap_or(false)
}

/// Case-insensitive containment, so "Arsenal FC" matches "Arsenal".
fn involves_popular_team(record: &MatchRecord, popular: &[String]) -> bool {
    let home = record.home_team.to_lowercase();
    let away = record.away_team.to_lowercase();
    popular
        .iter()
        .map(|team| team.trim().to_lowercase())
        .filter(|team| !team.is_empty())
        .any(|team| home.contains(&team) || away.contains(&team))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use matchday_api::MatchStatus;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 11, 18, 0, 0).unwrap()
    }

    fn record(id: &str, status: MatchStatus) -> MatchRecord {
        MatchRecord {
            id: MatchId::from(id),
            home_team: format!("Home {id}"),
            away_team: format!("Away {id}"),
            status,
            league_name: "League".into(),
            country_name: "Country".into(),
            ..Default::default()
        }
    }

    fn votes(entries: &[(&str, u32)]) -> HashMap<MatchId, VoteTally> {
        entries
            .iter()
            .map(|(id, n)| (MatchId::from(*id), VoteTally { home: *n, draw: 0, away: 0 }))
            .collect()
    }

    fn ids(ranked: &[ScoredMatch]) -> Vec<&str> {
        ranked.iter().map(|m| m.record.id.as_str()).collect()
    }

    #[test]
    fn live_then_voted_upcoming_then_voted_finished() {
        let a = record("A", MatchStatus::InPlay);
        let mut b = record("B", MatchStatus::Scheduled);
        b.kickoff = Some(now() + Duration::hours(1));
        let c = record("C", MatchStatus::Finished);

        let ranked = rank_hot_matches(&[a, b, c], &votes(&[("B", 10), ("C", 5)]), now(), &HotConfig::default());
        assert_eq!(ids(&ranked), vec!["A", "B", "C"]);
        assert!(ranked[0].is_live);
        assert_eq!(ranked[1].total_votes, 10);
    }

    #[test]
    fn lone_finished_match_below_threshold_is_empty() {
        let c = record("C", MatchStatus::Finished);
        let ranked = rank_hot_matches(&[c], &votes(&[("C", 1)]), now(), &HotConfig::default());
        assert!(ranked.is_empty());
    }

    #[test]
    fn live_beats_any_vote_count() {
        let live = record("L", MatchStatus::Paused);
        let upcoming = record("U", MatchStatus::Timed);
        let finished = record("F", MatchStatus::Finished);
        let ranked = rank_all(
            &[upcoming, finished, live],
            &votes(&[("U", 1_000_000), ("F", 1_000_000)]),
            now(),
            &HotConfig::default(),
        );
        assert_eq!(ids(&ranked)[0], "L");
    }

    #[test]
    fn finished_scores_below_upcoming_with_same_votes() {
        let config = HotConfig::default();
        let upcoming = record("U", MatchStatus::Scheduled);
        let finished = record("F", MatchStatus::Finished);
        for n in [3, 4, 50, 999] {
            assert!(hot_score(&finished, n, now(), &config) < hot_score(&upcoming, n, now(), &config));
        }
    }

    #[test]
    fn finished_without_votes_is_excluded() {
        let config = HotConfig::default();
        assert_eq!(hot_score(&record("F", MatchStatus::Finished), 0, now(), &config), 0.0);
        assert_eq!(hot_score(&record("X", MatchStatus::Cancelled), 2, now(), &config), 0.0);
    }

    #[test]
    fn ties_keep_feed_order() {
        let records: Vec<MatchRecord> = ["m1", "m2", "m3", "m4"]
            .iter()
            .map(|id| record(id, MatchStatus::Scheduled))
            .collect();
        let config = HotConfig { count: 10, ..Default::default() };
        let ranked = rank_hot_matches(&records, &HashMap::new(), now(), &config);
        assert_eq!(ids(&ranked), vec!["m1", "m2", "m3", "m4"]);

        let tallies = votes(&[("m2", 4), ("m4", 4)]);
        let ranked = rank_hot_matches(&records, &tallies, now(), &config);
        assert_eq!(ids(&ranked), vec!["m2", "m4", "m1", "m3"]);
    }

    #[test]
    fn output_length_is_min_of_count_and_positive_scores() {
        let records = vec![
            record("a", MatchStatus::Scheduled),
            record("b", MatchStatus::Finished),
            record("c", MatchStatus::InPlay),
            record("d", MatchStatus::Finished),
        ];
        let tallies = votes(&[("d", 3)]);
        for count in 0..6 {
            let config = HotConfig { count, ..Default::default() };
            let ranked = rank_hot_matches(&records, &tallies, now(), &config);
            assert_eq!(ranked.len(), count.min(3), "count = {count}");
        }
    }

    #[test]
    fn proximity_and_popularity_bonuses() {
        let config = HotConfig::default();

        let mut soon = record("soon", MatchStatus::Timed);
        soon.kickoff = Some(now() + Duration::minutes(90));
        let mut later = record("later", MatchStatus::Timed);
        later.kickoff = Some(now() + Duration::hours(5));
        let mut past = record("past", MatchStatus::Timed);
        past.kickoff = Some(now() - Duration::minutes(5));
        let unknown = record("unknown", MatchStatus::Timed);

        assert_eq!(hot_score(&soon, 0, now(), &config), config.unvoted_base + config.proximity_bonus);
        assert_eq!(hot_score(&later, 0, now(), &config), config.unvoted_base);
        assert_eq!(hot_score(&past, 0, now(), &config), config.unvoted_base);
        assert_eq!(hot_score(&unknown, 0, now(), &config), config.unvoted_base);

        let mut big = record("big", MatchStatus::Scheduled);
        big.home_team = "Arsenal FC".into();
        assert_eq!(hot_score(&big, 0, now(), &config), config.unvoted_base + config.popularity_bonus);
    }

    #[test]
    fn popular_list_is_configurable() {
        let mut m = record("x", MatchStatus::Scheduled);
        m.away_team = "Wrexham".into();
        let plain = HotConfig { popular_teams: vec![], ..Default::default() };
        let fans = HotConfig { popular_teams: vec!["wrexham".into(), "  ".into()], ..Default::default() };
        assert!(hot_score(&m, 0, now(), &fans) > hot_score(&m, 0, now(), &plain));
    }

    #[test]
    fn empty_input_ranks_to_empty() {
        assert!(rank_hot_matches(&[], &HashMap::new(), now(), &HotConfig::default()).is_empty());
    }
}
