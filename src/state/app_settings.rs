use crate::state::hot::HotConfig;
use crate::state::poller::PollerConfig;
use chrono::Duration as ChronoDuration;
use log::warn;
use matchday_api::client::{DEFAULT_API_URL, FootballApi};
use matchday_api::votes::{DEFAULT_COLLECTION, DEFAULT_VOTES_URL, VoteStore};
use matchday_api::MatchId;
use std::str::FromStr;
use std::time::Duration;

const MIN_POLL_MS: u64 = 1_000;
const MIN_FEED_REFRESH_SECS: u64 = 10;
const MIN_REQUEST_TIMEOUT_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub api_url: String,
    pub api_token: Option<String>,
    pub votes_url: String,
    pub votes_collection: String,
    pub poll_interval: Duration,
    pub idle_poll_interval: Duration,
    pub feed_refresh: Duration,
    pub request_timeout: Duration,
    pub hot: HotConfig,
    /// Match ids tracked from startup.
    pub track: Vec<MatchId>,
    /// Also track every live match that makes the hot list.
    pub follow_hot: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppSettings {
    /// Read settings from the process environment (after `.env`, if any).
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Bad values are logged and replaced
    /// by defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let defaults = HotConfig::default();
        let poller = PollerConfig::default();

        let hot = HotConfig {
            count: number(&text, "MATCHDAY_HOT_COUNT", defaults.count, 0),
            finished_vote_threshold: number(
                &text,
                "MATCHDAY_FINISHED_VOTE_THRESHOLD",
                defaults.finished_vote_threshold,
                1,
            ),
            kickoff_horizon: ChronoDuration::minutes(number(
                &text,
                "MATCHDAY_KICKOFF_HORIZON_MINS",
                defaults.kickoff_horizon.num_minutes(),
                0,
            )),
            popular_teams: text("MATCHDAY_POPULAR_TEAMS").map(|v| list(&v)).unwrap_or(defaults.popular_teams.clone()),
            ..defaults
        };

        Self {
            api_url: text("MATCHDAY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned()),
            api_token: text("MATCHDAY_API_TOKEN"),
            votes_url: text("MATCHDAY_VOTES_URL").unwrap_or_else(|| DEFAULT_VOTES_URL.to_owned()),
            votes_collection: text("MATCHDAY_VOTES_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.to_owned()),
            poll_interval: millis(&text, "MATCHDAY_POLL_INTERVAL_MS", poller.interval, MIN_POLL_MS),
            idle_poll_interval: millis(&text, "MATCHDAY_IDLE_POLL_INTERVAL_MS", poller.idle_interval, MIN_POLL_MS),
            feed_refresh: Duration::from_secs(number(&text, "MATCHDAY_FEED_REFRESH_SECS", 300, MIN_FEED_REFRESH_SECS)),
            request_timeout: millis(&text, "MATCHDAY_REQUEST_TIMEOUT_MS", poller.request_timeout, MIN_REQUEST_TIMEOUT_MS),
            hot,
            track: text("MATCHDAY_TRACK").map(|v| list(&v).into_iter().map(MatchId::from).collect()).unwrap_or_default(),
            follow_hot: text("MATCHDAY_FOLLOW_HOT").map(|v| flag("MATCHDAY_FOLLOW_HOT", &v)).unwrap_or(false),
        }
    }

    pub fn football_api(&self) -> FootballApi {
        FootballApi::new(&self.api_url)
            .with_token(self.api_token.clone())
            .with_timeout(self.request_timeout)
    }

    pub fn vote_store(&self) -> VoteStore {
        VoteStore::new(&self.votes_url, &self.votes_collection).with_timeout(self.request_timeout)
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: self.poll_interval,
            idle_interval: self.idle_poll_interval.max(self.poll_interval),
            request_timeout: self.request_timeout,
            ..PollerConfig::default()
        }
    }
}

fn number<T, F>(text: &F, key: &str, default: T, min: T) -> T
where
    T: FromStr + Ord + Copy + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = text(key) else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(value) if value < min => {
            warn!("{key}={value} is below the minimum, using {min}");
            min
        }
        Ok(value) => value,
        Err(_) => {
            warn!("ignoring invalid {key}={raw:?}, using {default}");
            default
        }
    }
}

fn millis<F>(text: &F, key: &str, default: Duration, min_ms: u64) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(number(text, key, default_ms, min_ms))
}

fn flag(key: &str, raw: &str) -> bool {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!("ignoring invalid {key}={raw:?}");
            false
        }
    }
}

fn list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned).collect()
}
