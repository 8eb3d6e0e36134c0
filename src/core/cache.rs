//! Availability cache shared by every call processor and the refresher.
//!
//! Each service type owns one ledger stored in a `DashMap` shard. `try_take`
//! holds the shard write lock only for the read/compare/subtract, and
//! `replace` builds the new ledger outside the lock and swaps it in, so the two
//! never interleave on the same service. Callers only ever see copies.

use crate::domain::model::{AvailabilityRecord, LocationId, ServiceType};
use dashmap::DashMap;
use std::collections::HashMap;

/// 某服務在某一時刻的可用數量，保留來源順序
pub type AvailabilitySnapshot = Vec<(LocationId, u32)>;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct ServiceLedger {
    entries: Vec<(LocationId, u32)>,
    positions: HashMap<LocationId, usize>,
}

impl ServiceLedger {
    fn from_records(records: impl IntoIterator<Item = AvailabilityRecord>) -> Self {
        let mut ledger = Self::default();
        for record in records {
            // 重複的地點以最後一筆為準，位置維持第一次出現的順序
            match ledger.positions.get(&record.location_id) {
                Some(&pos) => ledger.entries[pos].1 = record.available,
                None => {
                    ledger
                        .positions
                        .insert(record.location_id.clone(), ledger.entries.len());
                    ledger.entries.push((record.location_id, record.available));
                }
            }
        }
        ledger
    }

    fn take(&mut self, location: &str, requested: u32) -> u32 {
        let Some(&pos) = self.positions.get(location) else {
            return 0;
        };
        let count = &mut self.entries[pos].1;
        let taken = (*count).min(requested);
        *count -= taken;
        taken
    }

    fn count(&self, location: &str) -> Option<u32> {
        self.positions.get(location).map(|&pos| self.entries[pos].1)
    }
}

#[derive(Debug, Default)]
pub struct AvailabilityCache {
    services: DashMap<ServiceType, ServiceLedger>,
}

impl AvailabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得某服務的唯讀副本；未登錄的服務回傳空快照
    pub fn snapshot(&self, service: ServiceType) -> AvailabilitySnapshot {
        self.services
            .get(&service)
            .map(|ledger| ledger.entries.clone())
            .unwrap_or_default()
    }

    /// Atomically takes `min(current, requested)` units and returns the amount taken.
    ///
    /// Unknown services or locations yield 0. The returned amount is the only
    /// authoritative figure; snapshot counts may already be stale.
    pub fn try_take(&self, service: ServiceType, location: &str, requested: u32) -> u32 {
        if requested == 0 {
            return 0;
        }
        match self.services.get_mut(&service) {
            Some(mut ledger) => ledger.take(location, requested),
            None => 0,
        }
    }

    /// Replaces the whole mapping for one service.
    ///
    /// Not a merge: decrements applied since the source produced `records`
    /// are overwritten.
    pub fn replace(&self, service: ServiceType, records: impl IntoIterator<Item = AvailabilityRecord>) {
        let ledger = ServiceLedger::from_records(records);
        self.services.insert(service, ledger);
    }

    pub fn count(&self, service: ServiceType, location: &str) -> Option<u32> {
        self.services
            .get(&service)
            .and_then(|ledger| ledger.count(location))
    }

    pub fn is_registered(&self, service: ServiceType) -> bool {
        self.services.contains_key(&service)
    }

    /// 某服務目前的總可用數量
    pub fn total_available(&self, service: ServiceType) -> u64 {
        self.services
            .get(&service)
            .map(|ledger| ledger.entries.iter().map(|(_, c)| u64::from(*c)).sum())
            .unwrap_or(0)
    }
}
