use crate::feed::{FeedCountry, FeedLeague, FeedMatch, FeedMatchDetail};
use crate::kickoff::parse_kickoff;
use crate::{MatchId, MatchRecord, MatchSnapshot, MatchStatus};
use chrono::{NaiveDate, Utc};
use log::debug;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
pub const USER_AGENT: &str = "matchday/0.1 (match dashboard engine)";

pub const LEAGUE_PLACEHOLDER: &str = "League TBD";
pub const COUNTRY_PLACEHOLDER: &str = "International";
pub const TEAM_PLACEHOLDER: &str = "TBD";

/// Client for the match feed and match-detail endpoints.
#[derive(Debug, Clone)]
pub struct FootballApi {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl Default for FootballApi {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    NotFound(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Network(e, _) | ApiError::Api(e, _) | ApiError::Parsing(e, _) => Some(e),
            ApiError::NotFound(_) | ApiError::Other(_) => None,
        }
    }
}

pub(crate) fn http_client() -> Client {
    Client::builder().user_agent(USER_AGENT).build().unwrap_or_default()
}

impl FootballApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Sent as `X-Auth-Token` on every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the day's fixtures, flattened. With no date the backend picks
    /// "today" and so do we when anchoring bare clock times.
    pub async fn fetch_matches(&self, date: Option<NaiveDate>) -> ApiResult<Vec<MatchRecord>> {
        let mut url = endpoint(&self.base_url, &["matches"])?;
        if let Some(d) = date {
            url.query_pairs_mut().append_pair("date", &d.format("%Y-%m-%d").to_string());
        }
        let raw: Value = self.get(url).await?;
        let reference_date = date.unwrap_or_else(|| Utc::now().date_naive());
        Ok(normalize_feed(&raw, reference_date))
    }

    /// Fetch the current status and score for one match.
    pub async fn fetch_match_status(&self, match_id: &MatchId) -> ApiResult<MatchSnapshot> {
        let url = endpoint(&self.base_url, &["matches", match_id.as_str()])?;
        let raw: Value = self.get(url).await?;
        map_match_detail(match_id, raw)
            .ok_or_else(|| ApiError::NotFound(format!("no status for match {match_id}")))
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        let mut request = self.client.get(url.clone()).timeout(self.timeout);
        if let Some(token) = &self.token {
            request = request.header("X-Auth-Token", token);
        }
        get_json(request, url.as_str()).await
    }
}

/// Join `segments` onto `base`, percent-encoding each one, so an opaque id
/// can never escape its path segment.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> ApiResult<Url> {
    let mut url = Url::parse(base).map_err(|e| ApiError::Other(format!("invalid base URL {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::Other(format!("base URL {base} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn send(request: reqwest::RequestBuilder, url: &str) -> ApiResult<reqwest::Response> {
    request
        .send()
        .await
        .map_err(|e| ApiError::Network(e, url.to_owned()))
}

/// Send a prepared request and decode the JSON body. 404 is `NotFound`; any
/// other non-2xx status is an `Api` error.
pub(crate) async fn get_json<T: DeserializeOwned>(request: reqwest::RequestBuilder, url: &str) -> ApiResult<T> {
    let response = send(request, url).await?;
    if response.status() == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(url.to_owned()));
    }
    response
        .error_for_status()
        .map_err(|e| ApiError::Api(e, url.to_owned()))?
        .json::<T>()
        .await
        .map_err(|e| ApiError::Parsing(e, url.to_owned()))
}

/// Like `get_json`, but client errors (4xx) decode to `T::default()` so a
/// missing document reads as "no data".
pub(crate) async fn get_json_or_default<T: Default + DeserializeOwned>(
    request: reqwest::RequestBuilder,
    url: &str,
) -> ApiResult<T> {
    let response = send(request, url).await?;

    match response.error_for_status() {
        Ok(res) => res
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parsing(e, url.to_owned())),
        Err(e) => {
            if e.status().map(|s| s.is_client_error()).unwrap_or(false) {
                Ok(T::default())
            } else {
                Err(ApiError::Api(e, url.to_owned()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Normalizer: nested feed wire types → flat MatchRecord list
// ---------------------------------------------------------------------------

/// Flatten `[{country, leagues: [{league, matches: [...]}]}]` into match
/// records in feed order. Empty groups contribute nothing. Entries that fail
/// to decode, lack an id, or repeat an id already seen are skipped.
pub fn normalize_feed(raw: &Value, reference_date: NaiveDate) -> Vec<MatchRecord> {
    let groups: &[Value] = match raw {
        Value::Array(groups) => groups.as_slice(),
        Value::Object(obj) => match obj.get("countries") {
            Some(Value::Array(groups)) => groups.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    let mut seen: HashSet<MatchId> = HashSet::new();
    let mut records = Vec::new();

    for country in decode_each::<FeedCountry>(groups, "country") {
        let country_name = country
            .country
            .and_then(|n| n.into_name())
            .unwrap_or_else(|| COUNTRY_PLACEHOLDER.to_owned());

        for league in decode_each::<FeedLeague>(country.leagues.as_deref().unwrap_or_default(), "league") {
            let league_name = league
                .league
                .and_then(|n| n.into_name())
                .unwrap_or_else(|| LEAGUE_PLACEHOLDER.to_owned());

            for feed_match in decode_each::<FeedMatch>(league.matches.as_deref().unwrap_or_default(), "match") {
                let Some(record) = map_feed_match(feed_match, &league_name, &country_name, reference_date) else {
                    debug!("skipping match without id in {league_name}");
                    continue;
                };
                if !seen.insert(record.id.clone()) {
                    debug!("skipping duplicate match id {}", record.id);
                    continue;
                }
                records.push(record);
            }
        }
    }

    records
}

fn decode_each<'a, T: DeserializeOwned + 'a>(
    values: &'a [Value],
    what: &'static str,
) -> impl Iterator<Item = T> + 'a {
    values.iter().filter_map(move |value| match T::deserialize(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            debug!("skipping malformed {what} entry: {e}");
            None
        }
    })
}

fn map_feed_match(
    m: FeedMatch,
    league_name: &str,
    country_name: &str,
    reference_date: NaiveDate,
) -> Option<MatchRecord> {
    let id = m.id.as_ref().and_then(MatchId::from_json)?;
    let kickoff_raw = m.kickoff_candidate();
    let kickoff = kickoff_raw.as_deref().and_then(|raw| parse_kickoff(raw, reference_date));
    let team = |name: Option<crate::feed::FeedName>| {
        name.and_then(|n| n.into_name()).unwrap_or_else(|| TEAM_PLACEHOLDER.to_owned())
    };

    Some(MatchRecord {
        id,
        home_team: team(m.home_team),
        away_team: team(m.away_team),
        status: m.status.as_deref().map(MatchStatus::parse).unwrap_or_default(),
        kickoff,
        kickoff_raw,
        league_name: league_name.to_owned(),
        country_name: country_name.to_owned(),
        score: m.score.as_ref().and_then(|s| s.to_pair()),
    })
}

/// Map a match-detail payload (optionally wrapped in `{"match": ...}`) to a
/// snapshot. Returns None when the payload carries no status at all.
fn map_match_detail(requested: &MatchId, raw: Value) -> Option<MatchSnapshot> {
    let body = match raw {
        Value::Object(mut obj) => match obj.remove("match") {
            Some(inner @ Value::Object(_)) => inner,
            _ => Value::Object(obj),
        },
        _ => return None,
    };
    let detail = FeedMatchDetail::deserialize(&body).ok()?;
    let status = MatchStatus::parse(detail.status.as_deref()?);
    let id = detail
        .id
        .as_ref()
        .and_then(MatchId::from_json)
        .unwrap_or_else(|| requested.clone());

    Some(MatchSnapshot {
        id,
        status,
        score: detail.score.as_ref().and_then(|s| s.to_pair()),
    })
}
