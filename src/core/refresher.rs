use crate::config::DEFAULT_REFRESH_INTERVAL_SECS;
use crate::core::cache::AvailabilityCache;
use crate::domain::model::ServiceType;
use crate::domain::ports::AvailabilitySource;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 週期性以來源資料整批取代快取內容
pub struct CacheRefresher {
    cache: Arc<AvailabilityCache>,
    source: Arc<dyn AvailabilitySource>,
    services: Vec<ServiceType>,
    interval: Duration,
}

impl CacheRefresher {
    pub fn new(
        cache: Arc<AvailabilityCache>,
        source: Arc<dyn AvailabilitySource>,
        services: Vec<ServiceType>,
        interval: Duration,
    ) -> Self {
        // tokio 的 interval 不接受零週期
        let interval = if interval.is_zero() {
            tracing::warn!(
                "⚠️ Refresh interval is zero, using {}s",
                DEFAULT_REFRESH_INTERVAL_SECS
            );
            Duration::from_secs_f64(DEFAULT_REFRESH_INTERVAL_SECS)
        } else {
            interval
        };
        Self {
            cache,
            source,
            services,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Refreshes every configured service once and returns how many were replaced.
    ///
    /// A failed fetch leaves that service untouched. Cancellation is checked
    /// between services and while a fetch is in flight; a `replace` that has
    /// started always completes.
    pub async fn refresh_once(&self, shutdown: &CancellationToken) -> usize {
        let mut refreshed = 0;
        for &service in &self.services {
            let fetched = tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    tracing::debug!("Refresh cancelled before {}", service);
                    break;
                }

                fetched = self.source.fetch_availability(service) => fetched,
            };

            match fetched {
                Ok(records) => {
                    tracing::debug!("🔄 {}: {} location(s) refreshed", service, records.len());
                    self.cache.replace(service, records);
                    refreshed += 1;
                }
                Err(e) => {
                    tracing::warn!("⚠️ Availability for {} unavailable, keeping cached data: {}", service, e);
                }
            }
        }
        refreshed
    }

    /// 執行直到 `shutdown` 被取消
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            "🔄 Cache refresher starting ({} service(s), every {:?})",
            self.services.len(),
            self.interval
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // 第一次 tick 立即完成；呼叫端已先做過一次 refresh
        interval.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    tracing::info!("🛑 Cache refresher shutting down");
                    break;
                }

                _ = interval.tick() => {
                    self.refresh_once(&shutdown).await;
                }
            }
        }
    }
}
