pub mod client;
pub mod feed;
pub mod kickoff;
pub mod votes;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Domain types: clean model, independent of the feed wire format
// ---------------------------------------------------------------------------

/// Opaque fixture identifier. Feeds send either strings or integers; both end
/// up here as text and are never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Read an id from a raw JSON value. Blank strings, nulls and anything
    /// that isn't a string or integer count as missing.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_owned())),
            serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MatchId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for MatchId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Timed,
    InPlay,
    Paused,
    Finished,
    Postponed,
    Suspended,
    Cancelled,
    Awarded,
    /// Anything the feed sends that we don't recognise, kept verbatim.
    Other(String),
}

impl MatchStatus {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "SCHEDULED" | "NS" | "NOT_STARTED" => MatchStatus::Scheduled,
            "TIMED" => MatchStatus::Timed,
            "IN_PLAY" | "LIVE" | "1H" | "2H" | "ET" => MatchStatus::InPlay,
            "PAUSED" | "HALFTIME" | "HALF_TIME" | "HT" => MatchStatus::Paused,
            "FINISHED" | "FT" | "AET" | "PEN" | "FULL_TIME" => MatchStatus::Finished,
            "POSTPONED" | "PST" => MatchStatus::Postponed,
            "SUSPENDED" => MatchStatus::Suspended,
            "CANCELLED" | "CANCELED" | "CANC" => MatchStatus::Cancelled,
            "AWARDED" => MatchStatus::Awarded,
            _ => MatchStatus::Other(raw.trim().to_owned()),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, MatchStatus::InPlay | MatchStatus::Paused)
    }

    /// No further state changes are expected once a match gets here.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MatchStatus::Finished
                | MatchStatus::Postponed
                | MatchStatus::Suspended
                | MatchStatus::Cancelled
                | MatchStatus::Awarded
        )
    }

    pub fn label(&self) -> &str {
        match self {
            MatchStatus::Scheduled => "SCHEDULED",
            MatchStatus::Timed => "TIMED",
            MatchStatus::InPlay => "IN_PLAY",
            MatchStatus::Paused => "PAUSED",
            MatchStatus::Finished => "FINISHED",
            MatchStatus::Postponed => "POSTPONED",
            MatchStatus::Suspended => "SUSPENDED",
            MatchStatus::Cancelled => "CANCELLED",
            MatchStatus::Awarded => "AWARDED",
            MatchStatus::Other(raw) => raw,
        }
    }
}

impl From<&str> for MatchStatus {
    fn from(raw: &str) -> Self {
        MatchStatus::parse(raw)
    }
}

impl Serialize for MatchStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One fixture from the flattened feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub home_team: String,
    pub away_team: String,
    pub status: MatchStatus,
    /// None = time unknown (no kickoff strategy could read the feed value).
    pub kickoff: Option<DateTime<Utc>>,
    pub kickoff_raw: Option<String>,
    pub league_name: String,
    pub country_name: String,
    pub score: Option<(u16, u16)>, // (home, away)
}

impl MatchRecord {
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    pub fn title(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }
}

/// Aggregate fan votes for one match. The zero tally stands in for "no data".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub home: u32,
    pub draw: u32,
    pub away: u32,
}

impl VoteTally {
    pub fn total(&self) -> u32 {
        self.home.saturating_add(self.draw).saturating_add(self.away)
    }
}

/// Authoritative status + score for one match, as returned by the detail endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchSnapshot {
    pub id: MatchId,
    pub status: MatchStatus,
    pub score: Option<(u16, u16)>,
}
