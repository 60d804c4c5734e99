mod report;
mod state;

use crate::state::app_settings::AppSettings;
use crate::state::messages::{NetworkRequest, NetworkResponse};
use crate::state::network::NetworkWorker;
use crate::state::notify::{ChannelSink, MatchEvent};
use crate::state::poller::{LivePoller, PollingHandle};
use crate::state::refresher::PeriodicRefresher;
use anyhow::{Context, anyhow, bail};
use chrono::NaiveDate;
use log::{error, info, warn};
use matchday_api::MatchId;
use matchday_api::client::FootballApi;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_LOG_FILTER: &str = "matchday=info,matchday_api=warn";

type Poller = LivePoller<FootballApi, ChannelSink>;

#[derive(Debug, Default)]
struct CliOptions {
    once: bool,
    all: bool,
    json: bool,
    date: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(options) = handle_cli_args() else {
        return Ok(());
    };

    better_panic::install();
    dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!(e))
        .context("failed to install logger")?;

    let mut settings = AppSettings::load();
    if options.all {
        settings.hot.count = usize::MAX;
    }
    info!("match feed at {}, votes at {}", settings.api_url, settings.votes_url);

    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, mut network_resp_rx) = mpsc::channel::<NetworkResponse>(100);

    // Network thread
    let network_worker = NetworkWorker::new(&settings, network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    network_req_tx
        .send(NetworkRequest::LoadFeed { date: options.date })
        .await
        .context("network worker exited before the first load")?;

    if options.once {
        let result = match network_resp_rx.recv().await {
            Some(NetworkResponse::HotMatchesRanked { date, total_matches, hot }) => {
                print_hot_list(&options, date, total_matches, &hot)
            }
            Some(NetworkResponse::Error { message }) => Err(anyhow!(message)).context("failed to load match feed"),
            None => Err(anyhow!("network worker exited without a response")),
        };
        network_task.abort();
        return result;
    }

    // Live poller
    let (event_tx, event_rx) = mpsc::unbounded_channel::<MatchEvent>();
    let poller: Arc<Poller> = Arc::new(LivePoller::new(
        settings.football_api(),
        ChannelSink::new(event_tx),
        settings.poller_config(),
    ));
    for id in &settings.track {
        poller.track(id.clone());
    }
    let polling = poller.start_polling();
    info!(
        "polling {} tracked matches every {:?}",
        settings.track.len(),
        poller.config().interval
    );

    // Periodic feed refresh thread
    let periodic_updater = PeriodicRefresher::new(network_req_tx.clone(), settings.feed_refresh);
    let periodic_task = tokio::spawn(periodic_updater.run());

    let result = main_loop(&options, &settings, &poller, &polling, network_resp_rx, event_rx).await;

    polling.stop();
    poller.reset();
    network_task.abort();
    periodic_task.abort();
    info!("stopped");

    result
}

/// Parse arguments. `None` means the process should exit successfully
/// without running (help / version).
fn handle_cli_args() -> Option<CliOptions> {
    match parse_args(std::env::args().skip(1)) {
        Ok(CliAction::Run(options)) => Some(options),
        Ok(CliAction::Help) => {
            println!("{}", usage_text());
            None
        }
        Ok(CliAction::Version) => {
            println!("matchday {}", env!("CARGO_PKG_VERSION"));
            None
        }
        Err(message) => {
            eprintln!("{message}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

#[derive(Debug)]
enum CliAction {
    Run(CliOptions),
    Help,
    Version,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliAction, String> {
    let mut options = CliOptions::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliAction::Help),
            "-V" | "--version" => return Ok(CliAction::Version),
            "--once" => options.once = true,
            "--all" => options.all = true,
            "--json" => options.json = true,
            "--date" => {
                let value = args.next().ok_or("--date needs a value (YYYY-MM-DD)")?;
                let date = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                    .map_err(|_| format!("Invalid date: {value} (expected YYYY-MM-DD)"))?;
                options.date = Some(date);
            }
            _ => return Err(format!("Unknown argument: {arg}")),
        }
    }
    Ok(CliAction::Run(options))
}

fn usage_text() -> &'static str {
    "matchday - hot football matches and live score alerts

Usage:
  matchday [--once] [--all] [--json] [--date YYYY-MM-DD]
  matchday --help
  matchday --version

Options:
  --once       Print the ranking once and exit
  --all        Rank every match instead of the top few
  --json       Print JSON lines instead of text
  --date       Load fixtures for this day instead of today

Environment (also read from .env):
  MATCHDAY_API_URL                  Match feed base URL (default http://127.0.0.1:8000/api)
  MATCHDAY_API_TOKEN                Sent as X-Auth-Token
  MATCHDAY_VOTES_URL                Vote store base URL (default http://127.0.0.1:8080/v1/documents)
  MATCHDAY_VOTES_COLLECTION         Vote collection name (default votes)
  MATCHDAY_POLL_INTERVAL_MS         Live poll interval (default 30000)
  MATCHDAY_IDLE_POLL_INTERVAL_MS    Poll interval for matches not in play (default 120000)
  MATCHDAY_REQUEST_TIMEOUT_MS       Per-request timeout (default 10000)
  MATCHDAY_FEED_REFRESH_SECS        Feed re-rank interval (default 300)
  MATCHDAY_HOT_COUNT                Size of the hot list (default 3)
  MATCHDAY_FINISHED_VOTE_THRESHOLD  Votes a finished match needs to stay listed (default 3)
  MATCHDAY_KICKOFF_HORIZON_MINS     Kick-off window for the proximity bonus (default 120)
  MATCHDAY_POPULAR_TEAMS            Comma-separated team names that get a bonus
  MATCHDAY_TRACK                    Comma-separated match ids to watch live
  MATCHDAY_FOLLOW_HOT               1 to also watch every live hot match
  RUST_LOG                          Log filter (default matchday=info,matchday_api=warn)"
}

async fn main_loop(
    options: &CliOptions,
    settings: &AppSettings,
    poller: &Arc<Poller>,
    polling: &PollingHandle,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
    mut events: mpsc::UnboundedReceiver<MatchEvent>,
) -> anyhow::Result<()> {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut followed = HashSet::new();

    loop {
        tokio::select! {
            Some(response) = network_responses.recv() => {
                if !polling.is_running() {
                    bail!("live poller exited unexpectedly");
                }
                handle_network_response(response, options, settings, poller, &mut followed)?;
            }

            Some(event) = events.recv() => {
                if options.json {
                    println!("{}", report::event_json(&event)?);
                } else {
                    println!("{event}");
                }
            }

            signal = &mut shutdown => {
                signal.context("failed to listen for Ctrl-C")?;
                break;
            }

            else => bail!("all workers exited"),
        }
    }
    Ok(())
}

fn handle_network_response(
    response: NetworkResponse,
    options: &CliOptions,
    settings: &AppSettings,
    poller: &Arc<Poller>,
    followed: &mut HashSet<MatchId>,
) -> anyhow::Result<()> {
    match response {
        NetworkResponse::HotMatchesRanked { date, total_matches, hot } => {
            print_hot_list(options, date, total_matches, &hot)?;
            if settings.follow_hot {
                let live_hot: Vec<&state::hot::ScoredMatch> = hot.iter().filter(|m| m.is_live).collect();
                unfollow_stale(poller, followed, &live_hot);
                for m in live_hot {
                    if poller.track_match(&m.record) {
                        info!("following {} ({})", m.record.title(), m.record.id);
                        followed.insert(m.record.id.clone());
                    }
                }
            }
        }
        NetworkResponse::Error { message } => {
            error!("Network error: {message}");
            if poller.tracked_ids().is_empty() {
                warn!("no matches tracked; will retry on the next refresh");
            }
        }
    }
    Ok(())
}

/// Drop followed matches that left the live part of the hot list, unless the
/// poller still sees them in play. Ids from `MATCHDAY_TRACK` are never in
/// `followed`, so they stay tracked.
fn unfollow_stale(poller: &Poller, followed: &mut HashSet<MatchId>, live_hot: &[&state::hot::ScoredMatch]) {
    followed.retain(|id| {
        if live_hot.iter().any(|m| &m.record.id == id) {
            return true;
        }
        if poller.state_of(id).is_some_and(|s| s.is_live()) {
            return true;
        }
        if poller.untrack(id) {
            info!("no longer following match {id}");
        }
        false
    });
}

fn print_hot_list(
    options: &CliOptions,
    date: Option<NaiveDate>,
    total_matches: usize,
    hot: &[state::hot::ScoredMatch],
) -> anyhow::Result<()> {
    if options.json {
        println!("{}", report::hot_list_json(date, total_matches, hot)?);
    } else {
        print!("{}", report::hot_list_text(date, total_matches, hot));
    }
    Ok(())
}
