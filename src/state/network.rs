use crate::state::app_settings::AppSettings;
use crate::state::hot::{HotConfig, rank_hot_matches};
use crate::state::messages::{NetworkRequest, NetworkResponse};
use crate::state::votes::fetch_tallies;
use chrono::{NaiveDate, Utc};
use log::{debug, error, info};
use matchday_api::MatchId;
use matchday_api::client::{ApiError, FootballApi};
use matchday_api::votes::VoteStore;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct NetworkWorker {
    client: FootballApi,
    votes: VoteStore,
    hot: HotConfig,
    vote_timeout: Duration,
    /// Day of the last successful load; `RefreshFeed` re-ranks it.
    date: Option<NaiveDate>,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
}

impl NetworkWorker {
    pub fn new(
        settings: &AppSettings,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            client: settings.football_api(),
            votes: settings.vote_store(),
            hot: settings.hot.clone(),
            vote_timeout: settings.request_timeout,
            date: None,
            requests,
            responses,
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let result = match request {
                NetworkRequest::LoadFeed { date } => self.handle_load_feed(date).await,
                NetworkRequest::RefreshFeed => self.handle_load_feed(self.date).await,
            };

            debug!("network request complete");

            let response = result.unwrap_or_else(|err| NetworkResponse::Error {
                message: err.to_string(),
            });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    /// Feed, then every tally concurrently, then rank.
    async fn handle_load_feed(&mut self, date: Option<NaiveDate>) -> Result<NetworkResponse, ApiError> {
        debug!("loading match feed for {}", date.map_or("today".to_owned(), |d| d.to_string()));
        let records = self.client.fetch_matches(date).await?;
        self.date = date;

        let ids: Vec<MatchId> = records.iter().map(|r| r.id.clone()).collect();
        let tallies = fetch_tallies(&self.votes, &ids, self.vote_timeout).await;
        let hot = rank_hot_matches(&records, &tallies, Utc::now(), &self.hot);
        info!("ranked {} matches, {} hot", records.len(), hot.len());

        Ok(NetworkResponse::HotMatchesRanked { date, total_matches: records.len(), hot })
    }
}
