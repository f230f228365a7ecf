//! Polling queries for resources the event stream does not carry.
//!
//! A [`Query`] owns one fetch closure and republishes its latest outcome
//! through a watch channel. Every fetch supersedes the one before it: the
//! previous request is aborted and its result, should it still arrive, is
//! discarded. Dropping the query tears down the poller and any in-flight
//! request, so callers that change their inputs simply build a new query.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::AbortHandle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::client::{ErrorCode, Request, ResourceError};

/// Latest outcome of a query.
///
/// `loading` is raised exactly once, at construction, and cleared by the
/// first settle. Refreshes and poll ticks keep the previous data visible
/// while the replacement is in flight; a fetch that fails drops it.
pub struct QueryState<T> {
    pub data: Option<Arc<Vec<T>>>,
    pub error: Option<ResourceError>,
    pub loading: bool,
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            loading: self.loading,
        }
    }
}

struct QueryInner<T> {
    fetch: Box<dyn Fn() -> Request<Vec<T>> + Send + Sync>,
    state: watch::Sender<QueryState<T>>,
    cache: Option<Arc<QueryCache<T>>>,
    /// Monotonic fetch counter; a settle only lands if no newer fetch started.
    generation: AtomicU64,
    in_flight: Mutex<Option<AbortHandle>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

pub struct Query<T> {
    inner: Arc<QueryInner<T>>,
}

impl<T: Send + Sync + 'static> Query<T> {
    /// Starts a query and issues its first fetch immediately.
    pub fn new(fetch: impl Fn() -> Request<Vec<T>> + Send + Sync + 'static) -> Self {
        Self::build(Box::new(fetch), None)
    }

    /// Starts a query backed by a shared cache. A fresh cache entry serves as
    /// the initial data while the first fetch runs; every successful fetch
    /// writes back through the cache.
    pub fn cached(
        cache: Arc<QueryCache<T>>,
        fetch: impl Fn() -> Request<Vec<T>> + Send + Sync + 'static,
    ) -> Self {
        Self::build(Box::new(fetch), Some(cache))
    }

    /// Query over a single resource, normalized to a one-element list.
    pub fn single(fetch: impl Fn() -> Request<T> + Send + Sync + 'static) -> Self {
        Self::new(move || {
            let request = fetch();
            Request::new(async move { request.promise().await.map(|item| vec![item]) })
        })
    }

    fn build(
        fetch: Box<dyn Fn() -> Request<Vec<T>> + Send + Sync>,
        cache: Option<Arc<QueryCache<T>>>,
    ) -> Self {
        let seed = cache.as_ref().and_then(|cache| cache.get());
        let (state, _) = watch::channel(QueryState {
            loading: seed.is_none(),
            data: seed,
            error: None,
        });
        let inner = Arc::new(QueryInner {
            fetch,
            state,
            cache,
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
            poller: Mutex::new(None),
        });
        Self::dispatch(&inner);
        Self { inner }
    }

    pub fn state(&self) -> watch::Receiver<QueryState<T>> {
        self.inner.state.subscribe()
    }

    pub fn current(&self) -> QueryState<T> {
        self.inner.state.borrow().clone()
    }

    /// Fetches again, superseding any request still in flight.
    pub fn refresh(&self) {
        Self::dispatch(&self.inner);
    }

    /// Refetches on a fixed cadence. Calling this again replaces the
    /// running poller instead of stacking a second one.
    pub fn start_polling(&self, every: Duration) {
        let weak = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + every, every);
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(inner) => Self::dispatch(&inner),
                    None => return,
                }
            }
        });
        if let Some(previous) = lock(&self.inner.poller).replace(handle) {
            previous.abort();
        }
    }

    pub fn stop_polling(&self) {
        if let Some(poller) = lock(&self.inner.poller).take() {
            poller.abort();
        }
    }

    fn dispatch(inner: &Arc<QueryInner<T>>) {
        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let request = (inner.fetch)();
        if let Some(previous) = lock(&inner.in_flight).replace(request.abort_handle()) {
            previous.abort();
        }
        let inner = inner.clone();
        tokio::spawn(async move {
            let result = request.promise().await;
            if inner.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            match result {
                Err(error) if error.code == ErrorCode::Aborted => {}
                Ok(items) => {
                    let items = Arc::new(items);
                    if let Some(cache) = &inner.cache {
                        cache.put(items.clone());
                    }
                    inner.state.send_modify(|state| {
                        state.data = Some(items);
                        state.error = None;
                        state.loading = false;
                    });
                }
                Err(error) => inner.state.send_modify(|state| {
                    state.data = None;
                    state.error = Some(error);
                    state.loading = false;
                }),
            }
        });
    }
}

impl<T> Drop for Query<T> {
    fn drop(&mut self) {
        if let Some(poller) = lock(&self.inner.poller).take() {
            poller.abort();
        }
        if let Some(in_flight) = lock(&self.inner.in_flight).take() {
            in_flight.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Time-bounded result cache, handed to callers explicitly.
///
/// Pages that remount faster than their data goes stale can seed a fresh
/// [`Query`] from the cached value instead of blocking on the network.
pub struct QueryCache<T> {
    ttl: Duration,
    slot: Mutex<Option<(Instant, Arc<Vec<T>>)>>,
}

impl<T> QueryCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Returns the cached value unless it has outlived the TTL.
    pub fn get(&self) -> Option<Arc<Vec<T>>> {
        let mut slot = lock(&self.slot);
        match slot.as_ref() {
            Some((stored_at, value)) if stored_at.elapsed() <= self.ttl => Some(value.clone()),
            Some(_) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    pub fn put(&self, value: Arc<Vec<T>>) {
        *lock(&self.slot) = Some((Instant::now(), value));
    }

    pub fn invalidate(&self) {
        *lock(&self.slot) = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::discovered_cluster::DiscoveredCluster;
    use crate::client::{Client, ListOptions};

    use super::*;

    fn counting_fetch() -> (Arc<AtomicU32>, impl Fn() -> Request<Vec<u32>> + Send + Sync) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let fetch = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Request::new(async move { Ok(vec![n]) })
        };
        (calls, fetch)
    }

    async fn next<T: Clone>(rx: &mut watch::Receiver<QueryState<T>>) -> QueryState<T> {
        rx.changed().await.unwrap();
        rx.borrow_and_update().clone()
    }

    #[tokio::test]
    async fn first_fetch_clears_loading_and_sets_data() {
        let query = Query::new(|| Request::new(async { Ok(vec![1, 2, 3]) }));
        let mut rx = query.state();
        assert!(rx.borrow_and_update().loading);

        let state = next(&mut rx).await;
        assert!(!state.loading);
        assert_eq!(state.data.as_deref(), Some(&vec![1, 2, 3]));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_the_error() {
        let query: Query<u32> = Query::new(|| {
            Request::new(async { Err(ResourceError::new(ErrorCode::Forbidden, "denied")) })
        });
        let mut rx = query.state();

        let state = next(&mut rx).await;
        assert!(!state.loading);
        assert!(state.data.is_none());
        assert_eq!(state.error.unwrap().code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn refresh_replaces_data_and_clears_a_previous_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let query = Query::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Request::new(async move {
                if n == 1 {
                    Err(ResourceError::new(ErrorCode::ServiceUnavailable, "down"))
                } else {
                    Ok(vec![n])
                }
            })
        });
        let mut rx = query.state();

        let state = next(&mut rx).await;
        assert!(state.error.is_some());

        query.refresh();
        let state = next(&mut rx).await;
        assert_eq!(state.data.as_deref(), Some(&vec![2]));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn superseded_fetch_does_not_clobber_the_replacement() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let query = Query::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Request::new(async move {
                if n == 1 {
                    // First fetch stalls until aborted by the refresh.
                    futures::future::pending::<()>().await;
                }
                Ok(vec![n])
            })
        });
        let mut rx = query.state();

        query.refresh();
        let state = next(&mut rx).await;
        assert_eq!(state.data.as_deref(), Some(&vec![2]));

        tokio::task::yield_now().await;
        assert!(!rx.has_changed().unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn a_failed_refresh_drops_stale_data() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let query = Query::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Request::new(async move {
                if n == 1 {
                    Ok(vec![n])
                } else {
                    Err(ResourceError::new(ErrorCode::ServiceUnavailable, "down"))
                }
            })
        });
        let mut rx = query.state();

        let state = next(&mut rx).await;
        assert_eq!(state.data.as_deref(), Some(&vec![1]));

        query.refresh();
        let state = next(&mut rx).await;
        assert!(state.data.is_none());
        assert_eq!(state.error.unwrap().code, ErrorCode::ServiceUnavailable);
    }

    #[tokio::test]
    async fn single_normalizes_to_a_one_element_list() {
        let query = Query::single(|| Request::new(async { Ok(42u32) }));
        let mut rx = query.state();

        let state = next(&mut rx).await;
        assert_eq!(state.data.as_deref(), Some(&vec![42]));
    }

    #[tokio::test(start_paused = true)]
    async fn polling_refetches_on_the_interval() {
        let (_, fetch) = counting_fetch();
        let query = Query::new(fetch);
        let mut rx = query.state();

        let state = next(&mut rx).await;
        assert_eq!(state.data.as_deref(), Some(&vec![1]));

        query.start_polling(Duration::from_secs(30));
        let state = next(&mut rx).await;
        assert_eq!(state.data.as_deref(), Some(&vec![2]));
        let state = next(&mut rx).await;
        assert_eq!(state.data.as_deref(), Some(&vec![3]));
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_the_poller_replaces_the_old_cadence() {
        let (_, fetch) = counting_fetch();
        let query = Query::new(fetch);
        let mut rx = query.state();
        next(&mut rx).await;

        query.start_polling(Duration::from_secs(30));
        next(&mut rx).await;

        // A slower cadence takes over; the 30s ticker must be gone.
        query.start_polling(Duration::from_secs(3600));
        rx.borrow_and_update();
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_polling_halts_refetches() {
        let (_, fetch) = counting_fetch();
        let query = Query::new(fetch);
        let mut rx = query.state();
        next(&mut rx).await;

        query.start_polling(Duration::from_secs(30));
        next(&mut rx).await;
        query.stop_polling();

        rx.borrow_and_update();
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn cached_query_serves_stored_data_until_the_fetch_lands() {
        let cache = Arc::new(QueryCache::new(Duration::from_secs(60)));
        cache.put(Arc::new(vec![9]));

        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let release_rx = Arc::new(Mutex::new(Some(release_rx)));
        let query = Query::cached(cache.clone(), move || {
            let release_rx = lock(&release_rx).take();
            Request::new(async move {
                if let Some(release_rx) = release_rx {
                    let _ = release_rx.await;
                }
                Ok(vec![1])
            })
        });

        // Cache hit renders immediately, no loading gate.
        let state = query.current();
        assert!(!state.loading);
        assert_eq!(state.data.as_deref(), Some(&vec![9]));

        let mut rx = query.state();
        rx.borrow_and_update();
        release_tx.send(()).unwrap();
        let state = next(&mut rx).await;
        assert_eq!(state.data.as_deref(), Some(&vec![1]));
        assert_eq!(cache.get().as_deref(), Some(&vec![1]));
    }

    #[tokio::test(start_paused = true)]
    async fn cache_expires_after_its_ttl() {
        let cache = QueryCache::new(Duration::from_secs(60));
        assert!(cache.get().is_none());

        cache.put(Arc::new(vec![1, 2]));
        assert_eq!(cache.get().as_deref(), Some(&vec![1, 2]));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(cache.get().is_none());
    }

    #[tokio::test]
    async fn cache_invalidate_drops_the_value() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.put(Arc::new(vec![7]));
        cache.invalidate();
        assert!(cache.get().is_none());
    }

    #[tokio::test]
    async fn lists_discovered_clusters_through_the_client() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/proxy/apis/discovery.open-cluster-management.io/v1alpha1/discoveredclusters",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{
                    "metadata": { "name": "dc-gcp-1" },
                    "spec": { "displayName": "telco-east", "cloudProvider": "gcp" },
                }],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(Url::parse(&server.uri()).unwrap(), None).unwrap();
        let query = Query::new(move || client.list::<DiscoveredCluster>(ListOptions::default()));
        let mut rx = query.state();

        let state = next(&mut rx).await;
        let discovered = state.data.unwrap();
        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].spec.display_name.as_deref(), Some("telco-east"));
        assert_eq!(discovered[0].spec.cloud_provider.as_deref(), Some("gcp"));
    }
}
