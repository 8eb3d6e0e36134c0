use crate::domain::model::Location;
use crate::domain::ports::LocationDirectory;
use crate::utils::error::{DispatchError, Result};
use std::collections::HashMap;

/// 地點索引：每次執行建立一次，之後唯讀
#[derive(Debug, Clone, Default)]
pub struct LocationIndex {
    locations: HashMap<String, Location>,
}

impl LocationIndex {
    pub fn new(locations: impl IntoIterator<Item = Location>) -> Self {
        Self {
            locations: locations
                .into_iter()
                .map(|location| (location.id.clone(), location))
                .collect(),
        }
    }

    /// 從目錄載入；目錄失敗或資料為空都是致命錯誤
    pub async fn load<D: LocationDirectory + ?Sized>(directory: &D) -> Result<Self> {
        let locations = directory.fetch_locations().await?;
        if locations.is_empty() {
            return Err(DispatchError::LocationDirectoryError {
                message: "directory returned no locations".to_string(),
            });
        }

        let index = Self::new(locations);
        tracing::info!("📍 Loaded {} locations", index.len());
        Ok(index)
    }

    pub fn get(&self, id: &str) -> Option<&Location> {
        self.locations.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.locations.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
