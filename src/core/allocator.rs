use crate::core::cache::AvailabilityCache;
use crate::core::locations::LocationIndex;
use crate::core::ranker::rank_candidates;
use crate::domain::model::{AllocationResult, DispatchOrder, ServiceType};
use crate::domain::ports::DispatchGateway;
use std::sync::Arc;

/// 貪婪分配器：由近到遠從候選地點扣減，直到滿足或候選耗盡
#[derive(Clone)]
pub struct GreedyAllocator {
    cache: Arc<AvailabilityCache>,
    index: Arc<LocationIndex>,
    gateway: Arc<dyn DispatchGateway>,
}

impl GreedyAllocator {
    pub fn new(
        cache: Arc<AvailabilityCache>,
        index: Arc<LocationIndex>,
        gateway: Arc<dyn DispatchGateway>,
    ) -> Self {
        Self {
            cache,
            index,
            gateway,
        }
    }

    pub fn index(&self) -> &LocationIndex {
        &self.index
    }

    pub async fn allocate(&self, service: ServiceType, target_id: &str, quantity: u32) -> AllocationResult {
        let mut result = AllocationResult::unfulfilled(service.label(), quantity);
        let Some(target) = self.index.get(target_id) else {
            return result;
        };
        if quantity == 0 {
            return result;
        }

        let snapshot = self.cache.snapshot(service);
        let candidates = rank_candidates(&snapshot, target, &self.index);

        for candidate in candidates {
            if result.remaining == 0 {
                break;
            }

            // 只相信 try_take 的回傳值，快照數量可能已過期
            let taken = self
                .cache
                .try_take(service, &candidate.location_id, result.remaining);
            if taken == 0 {
                continue;
            }
            result.remaining -= taken;
            result.fulfilled += taken;

            let order = DispatchOrder {
                service,
                source: candidate.location_id.clone(),
                target: target.id.clone(),
                quantity: taken,
            };
            tracing::debug!(
                "🚑 {} x{} {} -> {} (distance {:.3})",
                service,
                taken,
                order.source,
                order.target,
                candidate.distance
            );

            // 扣減已提交；gateway 失敗不回滾
            if let Some(source) = self.index.get(&candidate.location_id) {
                if let Err(e) = self.gateway.dispatch(&order, source, target).await {
                    tracing::warn!(
                        "⚠️ Dispatch of {} {} unit(s) from {} to {} not acknowledged: {}",
                        order.quantity,
                        service,
                        order.source,
                        order.target,
                        e
                    );
                }
            }
            result.orders.push(order);
        }

        if result.remaining > 0 {
            tracing::warn!(
                "⚠️ Unable to dispatch {} {} unit(s) for {}",
                result.remaining,
                service,
                target.id
            );
        }
        result
    }
}
