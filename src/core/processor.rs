use crate::core::allocator::GreedyAllocator;
use crate::domain::model::{AllocationResult, CallOutcome, CallStatus, EmergencyCall};

/// 處理單一事件：每個服務請求各自交給分配器，沒有重試
#[derive(Clone)]
pub struct CallProcessor {
    allocator: GreedyAllocator,
}

impl CallProcessor {
    pub fn new(allocator: GreedyAllocator) -> Self {
        Self { allocator }
    }

    pub async fn process(&self, call: &EmergencyCall) -> CallOutcome {
        if !self.allocator.index().contains(&call.target) {
            tracing::warn!(
                "❓ Call {} targets unknown location '{}', skipping",
                call.display_id(),
                call.target
            );
            return CallOutcome {
                call_id: call.id.clone(),
                target: call.target.clone(),
                status: CallStatus::UnknownTarget,
                results: Vec::new(),
            };
        }

        if call.requests.is_empty() {
            tracing::warn!("Call {} at {} has no service requests", call.display_id(), call.target);
            return CallOutcome {
                call_id: call.id.clone(),
                target: call.target.clone(),
                status: CallStatus::NoRequests,
                results: Vec::new(),
            };
        }

        let mut results = Vec::with_capacity(call.requests.len());
        for request in &call.requests {
            // 非正數量直接忽略
            let Ok(quantity) = u32::try_from(request.quantity) else {
                if request.quantity > 0 {
                    tracing::warn!("Quantity {} out of range, ignored", request.quantity);
                }
                continue;
            };
            if quantity == 0 {
                continue;
            }

            let result = match request.service_type() {
                Some(service) => self.allocator.allocate(service, &call.target, quantity).await,
                None => {
                    tracing::warn!(
                        "❓ Call {} requests unknown service '{}'",
                        call.display_id(),
                        request.service
                    );
                    AllocationResult::unfulfilled(request.service.clone(), quantity)
                }
            };
            results.push(result);
        }

        let status = if results.iter().all(AllocationResult::is_fulfilled) {
            CallStatus::Resolved
        } else {
            CallStatus::Unfulfilled
        };
        tracing::debug!("Call {} at {}: {:?}", call.display_id(), call.target, status);

        CallOutcome {
            call_id: call.id.clone(),
            target: call.target.clone(),
            status,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::AvailabilityCache;
    use crate::core::locations::LocationIndex;
    use crate::domain::model::{
        AvailabilityRecord, DispatchOrder, Location, ServiceRequest, ServiceType,
    };
    use crate::domain::ports::DispatchGateway;
    use crate::utils::error::Result;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NullGateway;

    #[async_trait]
    impl DispatchGateway for NullGateway {
        async fn dispatch(&self, _order: &DispatchOrder, _source: &Location, _target: &Location) -> Result<()> {
            Ok(())
        }
    }

    fn processor() -> (CallProcessor, Arc<AvailabilityCache>) {
        let index = Arc::new(LocationIndex::new(vec![
            Location::new("T", "Center", 0.0, 0.0),
            Location::new("A", "Center", 1.0, 0.0),
            Location::new("B", "East", 0.0, 2.0),
        ]));
        let cache = Arc::new(AvailabilityCache::new());
        cache.replace(
            ServiceType::Medical,
            vec![AvailabilityRecord::new("A", 5), AvailabilityRecord::new("B", 3)],
        );
        cache.replace(ServiceType::Fire, vec![AvailabilityRecord::new("B", 2)]);
        let allocator = GreedyAllocator::new(Arc::clone(&cache), index, Arc::new(NullGateway));
        (CallProcessor::new(allocator), cache)
    }

    #[tokio::test]
    async fn test_call_resolved_when_every_request_fulfilled() {
        let (processor, _cache) = processor();
        let call = EmergencyCall::new(
            "T",
            vec![ServiceRequest::new("Medical", 6), ServiceRequest::new("Fire", 2)],
        )
        .with_id("c-1");

        let outcome = processor.process(&call).await;

        assert!(outcome.is_successful());
        assert_eq!(outcome.call_id.as_deref(), Some("c-1"));
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.units_dispatched(), 8);
    }

    #[tokio::test]
    async fn test_call_unfulfilled_when_any_request_short() {
        let (processor, _cache) = processor();
        let call = EmergencyCall::new(
            "T",
            vec![ServiceRequest::new("Medical", 10), ServiceRequest::new("Fire", 1)],
        );

        let outcome = processor.process(&call).await;

        assert_eq!(outcome.status, CallStatus::Unfulfilled);
        assert_eq!(outcome.results[0].remaining, 2);
        assert!(outcome.results[1].is_fulfilled());
    }

    #[tokio::test]
    async fn test_non_positive_quantities_are_ignored() {
        let (processor, cache) = processor();
        let call = EmergencyCall::new(
            "T",
            vec![ServiceRequest::new("Medical", 0), ServiceRequest::new("Fire", -3)],
        );

        let outcome = processor.process(&call).await;

        assert!(outcome.is_successful());
        assert!(outcome.results.is_empty());
        assert_eq!(cache.total_available(ServiceType::Medical), 8);
    }

    #[tokio::test]
    async fn test_call_without_requests_is_not_resolved() {
        let (processor, cache) = processor();
        let call = EmergencyCall::new("T", vec![]);

        let outcome = processor.process(&call).await;

        assert_eq!(outcome.status, CallStatus::NoRequests);
        assert!(!outcome.is_successful());
        assert_eq!(outcome.units_dispatched(), 0);
        assert_eq!(cache.total_available(ServiceType::Medical), 8);
    }

    #[tokio::test]
    async fn test_unknown_service_label_is_unfulfilled() {
        let (processor, _cache) = processor();
        let call = EmergencyCall::new("T", vec![ServiceRequest::new("Hazmat", 3)]);

        let outcome = processor.process(&call).await;

        assert_eq!(outcome.status, CallStatus::Unfulfilled);
        assert_eq!(outcome.results[0].remaining, 3);
        assert!(outcome.results[0].orders.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_target_processes_nothing() {
        let (processor, cache) = processor();
        let call = EmergencyCall::new("Atlantis", vec![ServiceRequest::new("Medical", 2)]);

        let outcome = processor.process(&call).await;

        assert_eq!(outcome.status, CallStatus::UnknownTarget);
        assert!(outcome.results.is_empty());
        assert!(!outcome.is_successful());
        assert_eq!(cache.total_available(ServiceType::Medical), 8);
    }
}
