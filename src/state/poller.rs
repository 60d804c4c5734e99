//! Live-status poller.
//!
//! Keeps the last known status and score for a working set of tracked matches,
//! re-fetches them on a timer and turns differences into goal / kick-off /
//! full-time events. Each poller owns its own state; nothing is global.

use crate::state::notify::{EventKind, MatchEvent, NotificationSink, Side};
use async_trait::async_trait;
use futures_util::future::join_all;
use log::{debug, info, warn};
use matchday_api::client::{ApiResult, FootballApi};
use matchday_api::{MatchId, MatchRecord, MatchSnapshot, MatchStatus};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};

const MIN_TICK: Duration = Duration::from_millis(10);

/// Authoritative status source for a single match.
#[async_trait]
pub trait StatusSource: Send + Sync + 'static {
    async fn fetch_status(&self, match_id: &MatchId) -> ApiResult<MatchSnapshot>;
}

#[async_trait]
impl StatusSource for FootballApi {
    async fn fetch_status(&self, match_id: &MatchId) -> ApiResult<MatchSnapshot> {
        self.fetch_match_status(match_id).await
    }
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Tick period; live and never-observed matches are fetched every tick.
    pub interval: Duration,
    /// Matches that aren't live are fetched at most this often.
    pub idle_interval: Duration,
    pub request_timeout: Duration,
    /// How long a finished/cancelled match stays tracked before it is purged.
    pub terminal_retention: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            idle_interval: Duration::from_secs(120),
            request_timeout: Duration::from_secs(10),
            terminal_retention: Duration::from_secs(600),
        }
    }
}

/// What the poller last saw for one match. `last_known_status == None` means
/// the match hasn't been observed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedMatchState {
    pub match_id: MatchId,
    pub last_known_score: Option<(u16, u16)>,
    pub last_known_status: Option<MatchStatus>,
}

impl TrackedMatchState {
    fn unobserved(match_id: MatchId) -> Self {
        Self { match_id, last_known_score: None, last_known_status: None }
    }

    pub fn is_observed(&self) -> bool {
        self.last_known_status.is_some()
    }

    pub fn is_live(&self) -> bool {
        self.last_known_status.as_ref().is_some_and(MatchStatus::is_live)
    }

    pub fn is_terminal(&self) -> bool {
        self.last_known_status.as_ref().is_some_and(MatchStatus::is_terminal)
    }
}

#[derive(Debug, Clone)]
struct Teams {
    home: String,
    away: String,
}

impl Default for Teams {
    fn default() -> Self {
        Self { home: "Home".into(), away: "Away".into() }
    }
}

#[derive(Debug)]
struct TrackedEntry {
    state: TrackedMatchState,
    teams: Teams,
    last_attempt: Option<Instant>,
    terminal_since: Option<Instant>,
}

impl TrackedEntry {
    fn new(match_id: MatchId, teams: Teams) -> Self {
        Self {
            state: TrackedMatchState::unobserved(match_id),
            teams,
            last_attempt: None,
            terminal_since: None,
        }
    }

    fn is_due(&self, now: Instant, idle_interval: Duration) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        match self.last_attempt {
            None => true,
            Some(_) if !self.state.is_observed() || self.state.is_live() => true,
            Some(at) => now.duration_since(at) >= idle_interval,
        }
    }
}

#[derive(Debug, Default)]
struct PollerState {
    tracked: BTreeMap<MatchId, TrackedEntry>,
    in_flight: HashSet<MatchId>,
}

/// Outcome of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    pub polled: usize,
    pub failed: usize,
    pub events: usize,
    pub purged: usize,
}

pub struct LivePoller<S, N> {
    source: S,
    sink: N,
    config: PollerConfig,
    state: Mutex<PollerState>,
}

impl<S: StatusSource, N: NotificationSink> LivePoller<S, N> {
    pub fn new(source: S, sink: N, config: PollerConfig) -> Self {
        Self { source, sink, config, state: Mutex::new(PollerState::default()) }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Start tracking a match. Returns false if it was already tracked.
    pub fn track(&self, match_id: MatchId) -> bool {
        self.insert(match_id, Teams::default())
    }

    /// Track a match from the feed, keeping its team names for messages.
    pub fn track_match(&self, record: &MatchRecord) -> bool {
        let teams = Teams { home: record.home_team.clone(), away: record.away_team.clone() };
        self.insert(record.id.clone(), teams)
    }

    fn insert(&self, match_id: MatchId, teams: Teams) -> bool {
        let mut state = self.lock();
        if state.tracked.contains_key(&match_id) {
            return false;
        }
        debug!("tracking match {match_id}");
        state.tracked.insert(match_id.clone(), TrackedEntry::new(match_id, teams));
        true
    }

    /// Stop tracking a match. A fetch already in flight for it is discarded.
    pub fn untrack(&self, match_id: &MatchId) -> bool {
        self.lock().tracked.remove(match_id).is_some()
    }

    pub fn tracked_ids(&self) -> Vec<MatchId> {
        self.lock().tracked.keys().cloned().collect()
    }

    pub fn state_of(&self, match_id: &MatchId) -> Option<TrackedMatchState> {
        self.lock().tracked.get(match_id).map(|e| e.state.clone())
    }

    /// Forget every tracked match.
    pub fn reset(&self) {
        self.lock().tracked.clear();
    }

    fn lock(&self) -> MutexGuard<'_, PollerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one polling pass over every due match. Fetches run concurrently,
    /// each bounded by the request timeout; results are applied only to
    /// matches that are still tracked when the fetch completes.
    pub async fn poll_once(&self) -> PollReport {
        let now = Instant::now();
        let (due, purged) = self.begin_tick(now);
        let mut report = PollReport { purged, ..Default::default() };
        if due.is_empty() {
            return report;
        }

        let guard = InFlightGuard { poller_state: &self.state, ids: &due };
        let timeout = self.config.request_timeout;
        let fetches = due.iter().map(|id| async move {
            match tokio::time::timeout(timeout, self.source.fetch_status(id)).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err(format!("timed out after {timeout:?}")),
            }
        });
        let results = join_all(fetches).await;

        let mut state = self.lock();
        for (id, result) in due.iter().zip(results) {
            state.in_flight.remove(id);
            report.polled += 1;
            let snapshot = match result {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    report.failed += 1;
                    warn!("status poll for match {id} failed: {e}");
                    continue;
                }
            };
            let Some(entry) = state.tracked.get_mut(id) else {
                debug!("match {id} untracked while polling; dropping result");
                continue;
            };
            let events = detect_changes(&entry.state, &snapshot, &entry.teams);
            entry.state.last_known_status = Some(snapshot.status);
            if snapshot.score.is_some() {
                entry.state.last_known_score = snapshot.score;
            }
            if entry.state.is_terminal() && entry.terminal_since.is_none() {
                entry.terminal_since = Some(Instant::now());
            }
            report.events += events.len();
            for event in events {
                info!("{event}");
                self.sink.notify(event);
            }
        }
        drop(state);
        drop(guard);

        report
    }

    /// Purge expired terminal entries and claim the due ones.
    fn begin_tick(&self, now: Instant) -> (Vec<MatchId>, usize) {
        let retention = self.config.terminal_retention;
        let idle = self.config.idle_interval;
        let mut state = self.lock();

        let before = state.tracked.len();
        state.tracked.retain(|id, entry| match entry.terminal_since {
            Some(since) if now.duration_since(since) >= retention => {
                debug!("purging finished match {id}");
                false
            }
            _ => true,
        });
        let purged = before - state.tracked.len();

        let PollerState { tracked, in_flight } = &mut *state;
        let mut due = Vec::new();
        for (id, entry) in tracked.iter_mut() {
            if in_flight.contains(id) || !entry.is_due(now, idle) {
                continue;
            }
            entry.last_attempt = Some(now);
            in_flight.insert(id.clone());
            due.push(id.clone());
        }
        (due, purged)
    }
}

impl<S: StatusSource, N: NotificationSink> LivePoller<S, N> {
    /// Spawn the polling loop. The first pass runs immediately; later passes
    /// wait for the interval and never overlap. Restarting after `stop` gets
    /// a fresh timer.
    pub fn start_polling(self: &Arc<Self>) -> PollingHandle {
        let poller = Arc::clone(self);
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stopped);

        let task = tokio::spawn(async move {
            let mut ticker = interval(poller.config.interval.max(MIN_TICK));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                let report = poller.poll_once().await;
                if report.polled > 0 || report.purged > 0 {
                    debug!(
                        "poll tick: {} polled, {} failed, {} events, {} purged",
                        report.polled, report.failed, report.events, report.purged
                    );
                }
            }
        });

        PollingHandle { task, stopped }
    }
}

/// Running polling loop. `stop` is synchronous and idempotent; dropping the
/// handle stops the loop too.
#[derive(Debug)]
pub struct PollingHandle {
    task: JoinHandle<()>,
    stopped: Arc<AtomicBool>,
}

impl PollingHandle {
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.task.abort();
            debug!("live poller stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst) && !self.task.is_finished()
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Releases in-flight claims if a tick is cancelled mid-fetch.
struct InFlightGuard<'a> {
    poller_state: &'a Mutex<PollerState>,
    ids: &'a [MatchId],
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.poller_state.lock().unwrap_or_else(PoisonError::into_inner);
        for id in self.ids {
            state.in_flight.remove(id);
        }
    }
}

/// Compare a fresh snapshot with the stored state. The first observation of a
/// match is a baseline and produces nothing.
fn detect_changes(previous: &TrackedMatchState, snapshot: &MatchSnapshot, teams: &Teams) -> Vec<MatchEvent> {
    let Some(prev_status) = &previous.last_known_status else {
        return Vec::new();
    };
    let id = &previous.match_id;
    let mut events = Vec::new();

    if !prev_status.is_live() && snapshot.status == MatchStatus::InPlay {
        events.push(MatchEvent {
            kind: EventKind::Started,
            match_id: id.clone(),
            message: format!("Kick-off: {} vs {}", teams.home, teams.away),
        });
    }

    if let Some((home, away)) = snapshot.score {
        let (prev_home, prev_away) = previous.last_known_score.unwrap_or((0, 0));
        for (side, after, before, scorer) in [
            (Side::Home, home, prev_home, &teams.home),
            (Side::Away, away, prev_away, &teams.away),
        ] {
            if after > before {
                events.push(MatchEvent {
                    kind: EventKind::Goal(side),
                    match_id: id.clone(),
                    message: format!("GOAL for {scorer}! {} {home}-{away} {}", teams.home, teams.away),
                });
            }
        }
    }

    if snapshot.status == MatchStatus::Finished && *prev_status != MatchStatus::Finished {
        if let Some((home, away)) = snapshot.score {
            events.push(MatchEvent {
                kind: EventKind::Final,
                match_id: id.clone(),
                message: format!("Full time: {} {home}-{away} {}", teams.home, teams.away),
            });
        }
    }

    events
}
