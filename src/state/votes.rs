use async_trait::async_trait;
use futures_util::future::join_all;
use log::{debug, warn};
use matchday_api::client::ApiResult;
use matchday_api::votes::VoteStore;
use matchday_api::{MatchId, VoteTally};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Anything that can look up a vote tally by match id.
#[async_trait]
pub trait VoteSource: Send + Sync {
    async fn fetch_tally(&self, match_id: &MatchId) -> ApiResult<VoteTally>;
}

#[async_trait]
impl VoteSource for VoteStore {
    async fn fetch_tally(&self, match_id: &MatchId) -> ApiResult<VoteTally> {
        VoteStore::fetch_tally(self, match_id).await
    }
}

/// Fetch tallies for every id concurrently and wait for all of them. A lookup
/// that fails or runs past `timeout` resolves to the zero tally; it never
/// stops the others. Every requested id is present in the result.
pub async fn fetch_tallies<S>(source: &S, ids: &[MatchId], timeout: Duration) -> HashMap<MatchId, VoteTally>
where
    S: VoteSource + ?Sized,
{
    let mut seen = HashSet::new();
    let unique: Vec<&MatchId> = ids.iter().filter(|id| seen.insert(*id)).collect();

    let lookups = unique.into_iter().map(|id| async move {
        let tally = match tokio::time::timeout(timeout, source.fetch_tally(id)).await {
            Ok(Ok(tally)) => tally,
            Ok(Err(e)) => {
                debug!("vote lookup for {id} failed: {e}");
                VoteTally::default()
            }
            Err(_) => {
                warn!("vote lookup for {id} timed out after {timeout:?}");
                VoteTally::default()
            }
        };
        (id.clone(), tally)
    });

    join_all(lookups).await.into_iter().collect()
}
