/// Match feed raw wire types: serde shapes for the country → league → match
/// feed and the per-match detail endpoint. These map to the clean domain types
/// in client.rs.
///
/// Groups carry their children as raw JSON values so each child can be decoded
/// on its own; one malformed entry must not take the rest of the feed with it.
use serde::Deserialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Nested match feed
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct FeedCountry {
    pub country: Option<FeedName>,
    pub leagues: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct FeedLeague {
    pub league: Option<FeedName>,
    pub matches: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FeedMatch {
    pub id: Option<Value>,
    pub home_team: Option<FeedName>,
    pub away_team: Option<FeedName>,
    pub status: Option<String>,
    /// Kickoff arrives under a handful of names depending on the upstream
    /// provider. See `kickoff_candidate` for the precedence.
    pub kickoff_time: Option<Value>,
    pub utc_date: Option<Value>,
    pub date: Option<Value>,
    pub time: Option<Value>,
    pub score: Option<FeedScore>,
}

impl FeedMatch {
    /// The raw kickoff string to hand to the kickoff parser, if any.
    pub fn kickoff_candidate(&self) -> Option<String> {
        let text = |v: &Option<Value>| v.as_ref().and_then(value_to_text);

        text(&self.kickoff_time)
            .or_else(|| text(&self.utc_date))
            .or_else(|| match (text(&self.date), text(&self.time)) {
                (Some(date), Some(time)) => Some(format!("{date} {time}")),
                (date, time) => time.or(date),
            })
    }
}

/// Team, league and country names come either as a bare string or as an
/// object with a `name` field.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum FeedName {
    Text(String),
    Named { name: Option<String> },
}

impl FeedName {
    pub fn into_name(self) -> Option<String> {
        let name = match self {
            FeedName::Text(s) => s,
            FeedName::Named { name } => name?,
        };
        let trimmed = name.trim();
        if trimmed.is_empty() { None } else { Some(trimmed.to_owned()) }
    }
}

/// Scores come in three flavours: `{"home": 1, "away": 0}`, the nested
/// `{"fullTime": {"home": 1, "away": 0}}`, or a `"1-0"` string.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum FeedScore {
    FullTime {
        #[serde(rename = "fullTime")]
        full_time: FeedScorePair,
    },
    Pair(FeedScorePair),
    Text(String),
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct FeedScorePair {
    pub home: Option<i64>,
    pub away: Option<i64>,
}

impl FeedScore {
    pub fn to_pair(&self) -> Option<(u16, u16)> {
        match self {
            FeedScore::FullTime { full_time } => full_time.to_pair(),
            FeedScore::Pair(pair) => pair.to_pair(),
            FeedScore::Text(s) => {
                let (home, away) = s.split_once(['-', ':'])?;
                Some((home.trim().parse().ok()?, away.trim().parse().ok()?))
            }
        }
    }
}

impl FeedScorePair {
    fn to_pair(&self) -> Option<(u16, u16)> {
        let home = u16::try_from(self.home?).ok()?;
        let away = u16::try_from(self.away?).ok()?;
        Some((home, away))
    }
}

// ---------------------------------------------------------------------------
// Match detail (status source)
// ---------------------------------------------------------------------------

/// The subset of the match-detail payload the poller cares about. Some
/// backends wrap it as `{"match": {...}}`; client.rs unwraps that first.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct FeedMatchDetail {
    pub id: Option<Value>,
    pub status: Option<String>,
    pub score: Option<FeedScore>,
}

pub(crate) fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn score_shapes_all_decode() {
        let nested: FeedScore = serde_json::from_value(json!({"fullTime": {"home": 2, "away": 1}, "winner": "HOME_TEAM"})).unwrap();
        assert_eq!(nested.to_pair(), Some((2, 1)));

        let flat: FeedScore = serde_json::from_value(json!({"home": 0, "away": 3})).unwrap();
        assert_eq!(flat.to_pair(), Some((0, 3)));

        let text: FeedScore = serde_json::from_value(json!("4 - 4")).unwrap();
        assert_eq!(text.to_pair(), Some((4, 4)));
    }

    #[test]
    fn pre_match_score_is_unknown() {
        let nested: FeedScore = serde_json::from_value(json!({"fullTime": {"home": null, "away": null}})).unwrap();
        assert_eq!(nested.to_pair(), None);

        let negative: FeedScore = serde_json::from_value(json!({"home": -1, "away": 0})).unwrap();
        assert_eq!(negative.to_pair(), None);
    }

    #[test]
    fn names_accept_strings_and_objects() {
        let plain: FeedName = serde_json::from_value(json!("  Arsenal ")).unwrap();
        assert_eq!(plain.into_name().as_deref(), Some("Arsenal"));

        let named: FeedName = serde_json::from_value(json!({"name": "Chelsea", "crest": "x.png"})).unwrap();
        assert_eq!(named.into_name().as_deref(), Some("Chelsea"));

        let blank: FeedName = serde_json::from_value(json!("")).unwrap();
        assert_eq!(blank.into_name(), None);
    }

    #[test]
    fn kickoff_candidate_precedence() {
        let m: FeedMatch = serde_json::from_value(json!({
            "utcDate": "2026-06-11T19:00:00Z",
            "time": "21:00"
        }))
        .unwrap();
        assert_eq!(m.kickoff_candidate().as_deref(), Some("2026-06-11T19:00:00Z"));

        let m: FeedMatch = serde_json::from_value(json!({"date": "2026-06-11", "time": "21:00"})).unwrap();
        assert_eq!(m.kickoff_candidate().as_deref(), Some("2026-06-11 21:00"));

        let m: FeedMatch = serde_json::from_value(json!({"kickoffTime": 1781204400})).unwrap();
        assert_eq!(m.kickoff_candidate().as_deref(), Some("1781204400"));

        let m: FeedMatch = serde_json::from_value(json!({})).unwrap();
        assert_eq!(m.kickoff_candidate(), None);
    }
}
