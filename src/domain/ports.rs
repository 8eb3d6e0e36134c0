use crate::domain::model::{
    AvailabilityRecord, DispatchOrder, EmergencyCall, Location, ServiceType,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn seed(&self) -> &str;
    fn target_dispatches(&self) -> u64;
    fn max_active_calls(&self) -> usize;
    fn refresh_interval(&self) -> Duration;
    fn poll_timeout(&self) -> Duration;
    fn max_empty_polls(&self) -> u32;
    fn request_timeout(&self) -> Duration;
    fn services(&self) -> Vec<ServiceType>;
}

/// 地點目錄，每次執行只讀取一次；失敗即終止執行
#[async_trait]
pub trait LocationDirectory: Send + Sync {
    async fn fetch_locations(&self) -> Result<Vec<Location>>;
}

/// 單一服務的可用數量來源。
///
/// `Err` 代表來源暫時不可用，快取保持不變；
/// 空陣列代表目前沒有可用單位。
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn fetch_availability(&self, service: ServiceType) -> Result<Vec<AvailabilityRecord>>;
}

/// 派遣 gateway。回傳結果僅供記錄，不影響快取狀態。
#[async_trait]
pub trait DispatchGateway: Send + Sync {
    async fn dispatch(&self, order: &DispatchOrder, source: &Location, target: &Location)
        -> Result<()>;
}

/// 事件來源；空結果表示目前沒有事件，不是錯誤
#[async_trait]
pub trait IncidentSource: Send + Sync {
    async fn poll_calls(&self, limit: usize) -> Vec<EmergencyCall>;
    async fn next_call(&self) -> Option<EmergencyCall>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSettings {
    pub seed: String,
    pub target_dispatches: u64,
    pub max_active_calls: usize,
}

#[async_trait]
pub trait SimulationControl: Send + Sync {
    async fn reset(&self, settings: &SimulationSettings) -> Result<()>;
    async fn stop(&self) -> Option<serde_json::Value>;
}
