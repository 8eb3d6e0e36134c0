use crate::core::allocator::GreedyAllocator;
use crate::core::cache::AvailabilityCache;
use crate::core::locations::LocationIndex;
use crate::core::processor::CallProcessor;
use crate::core::refresher::CacheRefresher;
use crate::domain::model::{EmergencyCall, RunSummary};
use crate::domain::ports::{
    AvailabilitySource, ConfigProvider, DispatchGateway, IncidentSource, LocationDirectory,
    SimulationControl, SimulationSettings,
};
use crate::utils::error::Result;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// 模擬世界需要提供的所有外部介面
pub trait World:
    LocationDirectory + AvailabilitySource + DispatchGateway + IncidentSource + SimulationControl + 'static
{
}

impl<T> World for T where
    T: LocationDirectory + AvailabilitySource + DispatchGateway + IncidentSource + SimulationControl + 'static
{
}

pub struct SimulationEngine<W: World, C: ConfigProvider> {
    world: Arc<W>,
    config: C,
}

impl<W: World, C: ConfigProvider> SimulationEngine<W, C> {
    pub fn new(world: Arc<W>, config: C) -> Self {
        Self { world, config }
    }

    fn settings(&self) -> SimulationSettings {
        SimulationSettings {
            seed: self.config.seed().to_string(),
            target_dispatches: self.config.target_dispatches(),
            max_active_calls: self.config.max_active_calls(),
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let settings = self.settings();
        tracing::info!(
            "🚀 Resetting simulation (seed '{}', target {}, max active {})",
            settings.seed,
            settings.target_dispatches,
            settings.max_active_calls
        );
        self.world.reset(&settings).await?;

        let index = Arc::new(LocationIndex::load(self.world.as_ref()).await?);
        let cache = Arc::new(AvailabilityCache::new());

        let source: Arc<dyn AvailabilitySource> = self.world.clone();
        let refresher = CacheRefresher::new(
            Arc::clone(&cache),
            source,
            self.config.services(),
            self.config.refresh_interval(),
        );
        let shutdown = CancellationToken::new();
        let primed = refresher.refresh_once(&shutdown).await;
        tracing::info!("📦 Availability cache primed for {} service(s)", primed);
        let refresher_handle = tokio::spawn(refresher.run(shutdown.clone()));

        let gateway: Arc<dyn DispatchGateway> = self.world.clone();
        let processor = CallProcessor::new(GreedyAllocator::new(Arc::clone(&cache), index, gateway));

        let summary = self.process_incidents(&processor).await;

        shutdown.cancel();
        if let Err(e) = refresher_handle.await {
            tracing::error!("❌ Cache refresher task failed: {}", e);
        }

        let mut summary = summary;
        summary.final_score = self.world.stop().await;
        tracing::info!(
            "🏁 Simulation finished: {} call(s) processed, {} resolved, {} unresolved, {} unit(s) dispatched",
            summary.calls_processed,
            summary.calls_resolved,
            summary.calls_unresolved,
            summary.units_dispatched
        );
        Ok(summary)
    }

    async fn process_incidents(&self, processor: &CallProcessor) -> RunSummary {
        let mut summary = RunSummary::default();
        let permits = self.config.max_active_calls().clamp(1, Semaphore::MAX_PERMITS);
        let limiter = Arc::new(Semaphore::new(permits));
        let mut empty_polls = 0u32;

        while summary.calls_resolved < self.config.target_dispatches() {
            let calls = match self.next_batch().await {
                Some(calls) => {
                    empty_polls = 0;
                    calls
                }
                None => {
                    empty_polls += 1;
                    tracing::info!("📭 No calls available ({} consecutive empty poll(s))", empty_polls);
                    if empty_polls >= self.config.max_empty_polls() {
                        break;
                    }
                    continue;
                }
            };

            tracing::info!("📥 Processing batch of {} call(s)", calls.len());
            let mut tasks = JoinSet::new();
            for call in calls {
                let Ok(permit) = Arc::clone(&limiter).acquire_owned().await else {
                    break;
                };
                let processor = processor.clone();
                tasks.spawn(async move {
                    let outcome = processor.process(&call).await;
                    drop(permit);
                    outcome
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(outcome) => summary.record(&outcome),
                    Err(e) => tracing::error!("❌ Call processing task failed: {}", e),
                }
            }
        }

        summary
    }

    /// 先取佇列；佇列為空時再請求下一通，受 poll timeout 限制
    async fn next_batch(&self) -> Option<Vec<EmergencyCall>> {
        let calls = self.world.poll_calls(self.config.max_active_calls()).await;
        if !calls.is_empty() {
            return Some(calls);
        }

        match tokio::time::timeout(self.config.poll_timeout(), self.world.next_call()).await {
            Ok(Some(call)) => Some(vec![call]),
            Ok(None) => None,
            Err(_) => {
                tracing::debug!("Timed out waiting for next call");
                None
            }
        }
    }
}
