use crate::core::error::RateError;
use crate::core::parser;
use crate::core::rates::{RateSource, RateTable};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};

pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

struct CacheEntry {
    table: Arc<RateTable>,
    fetched_at: Instant,
}

/// Shared, time-limited cache of the current rate table.
///
/// At most one fetch runs at a time. Readers see either the previous table or
/// the fully parsed new one.
pub struct RateCache {
    source: Arc<dyn RateSource>,
    ttl: Duration,
    entry: RwLock<Option<CacheEntry>>,
    refresh: Mutex<()>,
}

impl RateCache {
    pub fn new(source: Arc<dyn RateSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entry: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Returns the cached table without fetching, fresh or not.
    pub async fn cached(&self) -> Option<Arc<RateTable>> {
        self.entry
            .read()
            .await
            .as_ref()
            .map(|entry| Arc::clone(&entry.table))
    }

    async fn fresh(&self) -> Option<Arc<RateTable>> {
        self.entry
            .read()
            .await
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.table))
    }

    /// Returns the current rate table, fetching it when missing, expired or
    /// when `force_refresh` is set.
    ///
    /// A failed refresh is returned to the caller that started it and leaves
    /// the cached table and its fetch time as they were.
    pub async fn get_table(&self, force_refresh: bool) -> Result<Arc<RateTable>, RateError> {
        if !force_refresh {
            if let Some(table) = self.fresh().await {
                debug!("Rate cache HIT");
                return Ok(table);
            }
        }

        let _guard = self.refresh.lock().await;
        if !force_refresh {
            if let Some(table) = self.fresh().await {
                debug!("Rate cache filled while waiting for refresh");
                return Ok(table);
            }
        }

        debug!(force_refresh, "Rate cache MISS, fetching");
        self.refresh_table().await
    }

    async fn refresh_table(&self) -> Result<Arc<RateTable>, RateError> {
        let raw = self.source.fetch().await?;
        let table = Arc::new(parser::parse(&raw)?);

        *self.entry.write().await = Some(CacheEntry {
            table: Arc::clone(&table),
            fetched_at: Instant::now(),
        });
        info!(date = %table.date(), currencies = table.len(), "Rate table refreshed");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn feed(date: &str, usd: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ValCurs Date="{date}" name="Foreign Currency Market">
    <Valute ID="R01235"><CharCode>USD</CharCode><Nominal>1</Nominal><Name>Доллар США</Name><Value>{usd}</Value></Valute>
</ValCurs>"#
        )
    }

    struct MockSource {
        feed: std::sync::Mutex<String>,
        fail: AtomicBool,
        delay: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockSource {
        fn new(feed: String) -> Self {
            Self::with_delay(feed, Duration::ZERO)
        }

        fn with_delay(feed: String, delay: Duration) -> Self {
            Self {
                feed: std::sync::Mutex::new(feed),
                fail: AtomicBool::new(false),
                delay,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn set_feed(&self, feed: String) {
            *self.feed.lock().unwrap() = feed;
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateSource for MockSource {
        async fn fetch(&self) -> Result<Vec<u8>, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail.load(Ordering::SeqCst) {
                return Err(RateError::Network {
                    url: "mock".to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            Ok(self.feed.lock().unwrap().clone().into_bytes())
        }
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_is_cached() {
        let source = Arc::new(MockSource::new(feed("18.10.2025", "81,00")));
        let cache = RateCache::new(source.clone(), DEFAULT_TTL);

        let first = cache.get_table(false).await.unwrap();
        let second = cache.get_table(false).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.rate("USD"), Some(81.0));
    }

    #[tokio::test]
    async fn test_forced_refresh_always_fetches() {
        let source = Arc::new(MockSource::new(feed("18.10.2025", "81,00")));
        let cache = RateCache::new(source.clone(), DEFAULT_TTL);

        cache.get_table(false).await.unwrap();
        source.set_feed(feed("19.10.2025", "82,50"));
        let forced = cache.get_table(true).await.unwrap();
        cache.get_table(true).await.unwrap();

        assert_eq!(source.calls(), 3);
        assert_eq!(forced.rate("USD"), Some(82.5));
        let cached = cache.get_table(false).await.unwrap();
        assert_eq!(
            cached.date(),
            NaiveDate::from_ymd_opt(2025, 10, 19).unwrap()
        );
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_table_is_refetched() {
        let source = Arc::new(MockSource::new(feed("18.10.2025", "81,00")));
        let cache = RateCache::new(source.clone(), DEFAULT_TTL);

        cache.get_table(false).await.unwrap();
        tokio::time::advance(Duration::from_secs(599)).await;
        cache.get_table(false).await.unwrap();
        assert_eq!(source.calls(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        cache.get_table(false).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_table() {
        let source = Arc::new(MockSource::new(feed("18.10.2025", "81,00")));
        let cache = RateCache::new(source.clone(), DEFAULT_TTL);
        cache.get_table(false).await.unwrap();

        source.set_feed(feed("19.10.2025", "82,00").replace(r#"Date="19.10.2025" "#, ""));
        let result = cache.get_table(true).await;
        assert!(matches!(result, Err(RateError::Format(_))));

        let cached = cache.get_table(false).await.unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(cached.rate("USD"), Some(81.0));
    }

    #[tokio::test]
    async fn test_first_fetch_failure_is_returned() {
        let source = Arc::new(MockSource::new(feed("18.10.2025", "81,00")));
        source.fail.store(true, Ordering::SeqCst);
        let cache = RateCache::new(source.clone(), DEFAULT_TTL);

        let result = cache.get_table(false).await;
        assert!(matches!(result, Err(RateError::Network { .. })));
        assert!(cache.cached().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_refresh_failure_is_returned() {
        let source = Arc::new(MockSource::new(feed("18.10.2025", "81,00")));
        let cache = RateCache::new(source.clone(), DEFAULT_TTL);
        let previous = cache.get_table(false).await.unwrap();

        tokio::time::advance(DEFAULT_TTL).await;
        source.set_feed(feed("19.10.2025", "82,00").replace(r#"Date="19.10.2025" "#, ""));

        let result = cache.get_table(false).await;
        assert!(matches!(result, Err(RateError::Format(_))));
        assert!(Arc::ptr_eq(&cache.cached().await.unwrap(), &previous));

        source.fail.store(true, Ordering::SeqCst);
        let result = cache.get_table(false).await;
        assert!(matches!(result, Err(RateError::Network { .. })));
        assert_eq!(source.calls(), 3);

        source.fail.store(false, Ordering::SeqCst);
        source.set_feed(feed("19.10.2025", "82,00"));
        let refreshed = cache.get_table(false).await.unwrap();
        assert_eq!(refreshed.rate("USD"), Some(82.0));
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_fetch() {
        let source = Arc::new(MockSource::with_delay(
            feed("18.10.2025", "81,00"),
            Duration::from_millis(50),
        ));
        let cache = Arc::new(RateCache::new(source.clone(), DEFAULT_TTL));

        let tasks = (0..10).map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_table(false).await })
        });
        for result in join_all(tasks).await {
            assert!(result.unwrap().is_ok());
        }

        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_forced_refreshes_never_overlap() {
        let source = Arc::new(MockSource::with_delay(
            feed("18.10.2025", "81,00"),
            Duration::from_millis(20),
        ));
        let cache = Arc::new(RateCache::new(source.clone(), DEFAULT_TTL));

        let tasks = (0..5).map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_table(true).await })
        });
        for result in join_all(tasks).await {
            assert!(result.unwrap().is_ok());
        }

        assert_eq!(source.calls(), 5);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
    }
}
