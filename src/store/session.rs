use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::client::{Client, ErrorCode};
use crate::metrics::Metrics;

/// Liveness of the backend session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Expired,
}

/// Polls the session endpoint on a fixed cadence, independent of the event
/// stream's state.
///
/// Only a definitive 401 expires the session; transient failures are logged
/// and polling continues. Once expired, the monitor stops: there is no way
/// back without re-authentication.
pub struct SessionMonitor {
    client: Client,
    interval: Duration,
    metrics: Arc<Metrics>,
    state: watch::Sender<SessionState>,
}

impl SessionMonitor {
    pub fn new(
        client: Client,
        interval: Duration,
        metrics: Arc<Metrics>,
    ) -> (Self, watch::Receiver<SessionState>) {
        let (state, receiver) = watch::channel(SessionState::Active);
        (
            Self {
                client,
                interval,
                metrics,
                state,
            },
            receiver,
        )
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = ticker.tick() => {}
            }
            self.metrics.session_checks.inc();
            match self.client.check_session().promise().await {
                Ok(()) => {}
                Err(error) if error.code == ErrorCode::Unauthorized => {
                    warn!("backend session expired");
                    self.metrics.session_expired.inc();
                    let _ = self.state.send(SessionState::Expired);
                    return;
                }
                Err(error) => warn!(%error, "session check failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn monitor_for(
        server: &MockServer,
        interval: Duration,
    ) -> (SessionMonitor, watch::Receiver<SessionState>, Arc<Metrics>) {
        let client = Client::new(Url::parse(&server.uri()).unwrap(), None).unwrap();
        let metrics = Arc::new(Metrics::new().unwrap());
        let (monitor, state) = SessionMonitor::new(client, interval, metrics.clone());
        (monitor, state, metrics)
    }

    #[tokio::test]
    async fn expiry_flips_the_state_and_stops() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/authenticated"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let (monitor, mut state, metrics) =
            monitor_for(&server, Duration::from_millis(10)).await;
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::time::timeout(Duration::from_secs(5), monitor.run(shutdown_rx))
            .await
            .expect("monitor should stop after expiry");

        state.changed().await.unwrap();
        assert_eq!(*state.borrow(), SessionState::Expired);
        assert_eq!(metrics.session_expired.get(), 1);
    }

    #[tokio::test]
    async fn transient_failures_keep_polling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/authenticated"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (monitor, state, metrics) = monitor_for(&server, Duration::from_millis(10)).await;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(monitor.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("monitor should honor shutdown")
            .unwrap();

        assert_eq!(*state.borrow(), SessionState::Active);
        assert!(metrics.session_checks.get() >= 2);
    }

    #[tokio::test]
    async fn healthy_session_stays_active() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/authenticated"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let (monitor, state, _) = monitor_for(&server, Duration::from_millis(10)).await;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(monitor.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(*state.borrow(), SessionState::Active);
    }
}
