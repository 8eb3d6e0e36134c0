use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 地點識別碼（模擬世界中的城市名稱）
pub type LocationId = String;

/// 地點：識別碼、行政區與座標，載入後不可變
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(id: impl Into<String>, region: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            region: region.into(),
            latitude,
            longitude,
        }
    }

    /// 兩地之間的直線（歐幾里得）距離
    pub fn distance_to(&self, other: &Location) -> f64 {
        (self.latitude - other.latitude).hypot(self.longitude - other.longitude)
    }
}

/// 緊急服務類別。新增服務只需加上新的 tag。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServiceType {
    Medical,
    Fire,
    Police,
    Rescue,
    Utility,
}

impl ServiceType {
    pub const ALL: [ServiceType; 5] = [
        ServiceType::Medical,
        ServiceType::Fire,
        ServiceType::Police,
        ServiceType::Rescue,
        ServiceType::Utility,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ServiceType::Medical => "Medical",
            ServiceType::Fire => "Fire",
            ServiceType::Police => "Police",
            ServiceType::Rescue => "Rescue",
            ServiceType::Utility => "Utility",
        }
    }

    /// URL 路徑片段，例如 `/medical/search`
    pub fn path_segment(&self) -> &'static str {
        match self {
            ServiceType::Medical => "medical",
            ServiceType::Fire => "fire",
            ServiceType::Police => "police",
            ServiceType::Rescue => "rescue",
            ServiceType::Utility => "utility",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown service type '{0}'")]
pub struct UnknownServiceType(pub String);

impl FromStr for ServiceType {
    type Err = UnknownServiceType;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ServiceType::ALL
            .into_iter()
            .find(|service| service.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownServiceType(s.to_string()))
    }
}

/// 來源端回報的單筆可用數量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityRecord {
    pub location_id: LocationId,
    pub available: u32,
}

impl AvailabilityRecord {
    pub fn new(location_id: impl Into<String>, available: u32) -> Self {
        Self {
            location_id: location_id.into(),
            available,
        }
    }
}

/// 事件中的單一服務請求。
///
/// `service` 保留原始標籤，未知的服務類別在分配時才解析，
/// 結果是零候選、完整剩餘量，而不是解碼錯誤。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub service: String,
    pub quantity: i64,
}

impl ServiceRequest {
    pub fn new(service: impl Into<String>, quantity: i64) -> Self {
        Self {
            service: service.into(),
            quantity,
        }
    }

    pub fn service_type(&self) -> Option<ServiceType> {
        self.service.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergencyCall {
    pub id: Option<String>,
    pub target: LocationId,
    pub requests: Vec<ServiceRequest>,
}

impl EmergencyCall {
    pub fn new(target: impl Into<String>, requests: Vec<ServiceRequest>) -> Self {
        Self {
            id: None,
            target: target.into(),
            requests,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("-")
    }
}

/// 派遣指令：產生後不再變動，交由外部 gateway 消費
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOrder {
    pub service: ServiceType,
    pub source: LocationId,
    pub target: LocationId,
    pub quantity: u32,
}

/// 單一服務請求的分配結果
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationResult {
    pub service: String,
    pub requested: u32,
    pub fulfilled: u32,
    pub remaining: u32,
    pub orders: Vec<DispatchOrder>,
}

impl AllocationResult {
    pub fn unfulfilled(service: impl Into<String>, requested: u32) -> Self {
        Self {
            service: service.into(),
            requested,
            fulfilled: 0,
            remaining: requested,
            orders: Vec::new(),
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        self.remaining == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallStatus {
    /// 所有請求皆已滿足
    Resolved,
    /// 至少一個請求仍有剩餘量
    Unfulfilled,
    /// 目標地點不在索引中，沒有處理任何請求
    UnknownTarget,
    /// 事件沒有帶任何服務請求
    NoRequests,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    pub call_id: Option<String>,
    pub target: LocationId,
    pub status: CallStatus,
    pub results: Vec<AllocationResult>,
}

impl CallOutcome {
    pub fn is_successful(&self) -> bool {
        self.status == CallStatus::Resolved
    }

    pub fn units_dispatched(&self) -> u64 {
        self.results.iter().map(|r| u64::from(r.fulfilled)).sum()
    }
}

/// 一次模擬執行的彙總
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub calls_processed: u64,
    pub calls_resolved: u64,
    pub calls_unresolved: u64,
    pub units_dispatched: u64,
    pub final_score: Option<serde_json::Value>,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &CallOutcome) {
        self.calls_processed += 1;
        if outcome.is_successful() {
            self.calls_resolved += 1;
        } else {
            self.calls_unresolved += 1;
        }
        self.units_dispatched += outcome.units_dispatched();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_parsing_is_case_insensitive() {
        assert_eq!("Medical".parse::<ServiceType>(), Ok(ServiceType::Medical));
        assert_eq!("fire".parse::<ServiceType>(), Ok(ServiceType::Fire));
        assert_eq!(" POLICE ".parse::<ServiceType>(), Ok(ServiceType::Police));
        assert!("Hazmat".parse::<ServiceType>().is_err());
    }

    #[test]
    fn test_unknown_service_type_message() {
        let err = "Hazmat".parse::<ServiceType>().unwrap_err();
        assert_eq!(err, UnknownServiceType("Hazmat".to_string()));
        assert_eq!(err.to_string(), "unknown service type 'Hazmat'");
    }

    #[test]
    fn test_distance_is_euclidean() {
        let a = Location::new("A", "North", 0.0, 0.0);
        let b = Location::new("B", "North", 3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }

    #[test]
    fn test_run_summary_counts_outcomes() {
        let mut summary = RunSummary::default();
        let resolved = CallOutcome {
            call_id: None,
            target: "A".to_string(),
            status: CallStatus::Resolved,
            results: vec![AllocationResult {
                service: "Medical".to_string(),
                requested: 3,
                fulfilled: 3,
                remaining: 0,
                orders: vec![],
            }],
        };
        let unknown = CallOutcome {
            call_id: None,
            target: "Nowhere".to_string(),
            status: CallStatus::UnknownTarget,
            results: vec![],
        };

        summary.record(&resolved);
        summary.record(&unknown);

        assert_eq!(summary.calls_processed, 2);
        assert_eq!(summary.calls_resolved, 1);
        assert_eq!(summary.calls_unresolved, 1);
        assert_eq!(summary.units_dispatched, 3);
    }
}
