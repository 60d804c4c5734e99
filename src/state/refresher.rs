use crate::state::messages::NetworkRequest;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Re-ranks the feed on a fixed period. The initial load is sent by the
/// front end, so the refresher only ever sends `RefreshFeed`.
pub struct PeriodicRefresher {
    network_requests: mpsc::Sender<NetworkRequest>,
    period: Duration,
}

impl PeriodicRefresher {
    pub fn new(network_requests: mpsc::Sender<NetworkRequest>, period: Duration) -> Self {
        Self { network_requests, period }
    }

    pub async fn run(self) {
        let mut feed_interval = interval(self.period);
        // Skip the immediate first tick so startup loading isn't double-triggered.
        feed_interval.tick().await;

        loop {
            feed_interval.tick().await;
            if self.network_requests.send(NetworkRequest::RefreshFeed).await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_refresh_waits_one_period() {
        let (tx, mut rx) = mpsc::channel(4);
        let task = tokio::spawn(PeriodicRefresher::new(tx, Duration::from_secs(300)).run());

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(matches!(rx.try_recv(), Ok(NetworkRequest::RefreshFeed)));

        drop(rx);
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(task.is_finished());
    }
}
