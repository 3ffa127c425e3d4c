use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AssetRepository, PriceHistoryRepository};
use crate::errors::CoreError;
use crate::models::asset::Asset;
use crate::models::price::PriceHistoryRecord;

/// In-memory asset store for tests and embedding.
///
/// Keeps insertion order so listings are stable.
#[derive(Default)]
pub struct MemoryAssetRepository {
    assets: RwLock<Vec<Asset>>,
}

impl MemoryAssetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assets(assets: Vec<Asset>) -> Self {
        Self {
            assets: RwLock::new(assets),
        }
    }

    /// Add an asset, assigning the next numeric id when it has none.
    pub async fn insert(&self, mut asset: Asset) -> Asset {
        let mut assets = self.assets.write().await;
        if asset.id == 0 {
            asset.id = assets.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        }
        assets.push(asset.clone());
        asset
    }
}

#[async_trait]
impl AssetRepository for MemoryAssetRepository {
    async fn get_by_uuid(&self, uuid: Uuid, user_id: i64) -> Result<Option<Asset>, CoreError> {
        let assets = self.assets.read().await;
        Ok(assets
            .iter()
            .find(|a| a.uuid == uuid && a.user_id == user_id)
            .cloned())
    }

    async fn list_by_user_id(&self, user_id: i64) -> Result<Vec<Asset>, CoreError> {
        let assets = self.assets.read().await;
        Ok(assets
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update(&self, asset: &Asset) -> Result<(), CoreError> {
        let mut assets = self.assets.write().await;
        let slot = assets
            .iter_mut()
            .find(|a| a.uuid == asset.uuid && a.user_id == asset.user_id)
            .ok_or_else(|| CoreError::NotFound(format!("asset {}", asset.uuid)))?;
        *slot = asset.clone();
        Ok(())
    }
}

/// In-memory price history, keyed by asset id.
#[derive(Default)]
pub struct MemoryPriceHistoryRepository {
    records: RwLock<HashMap<i64, Vec<PriceHistoryRecord>>>,
}

impl MemoryPriceHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PriceHistoryRepository for MemoryPriceHistoryRepository {
    async fn get_latest_by_asset_id(
        &self,
        asset_id: i64,
    ) -> Result<Option<PriceHistoryRecord>, CoreError> {
        let records = self.records.read().await;
        Ok(records
            .get(&asset_id)
            .and_then(|list| list.iter().max_by_key(|r| (r.recorded_at, r.id)))
            .cloned())
    }

    async fn create(&self, mut record: PriceHistoryRecord) -> Result<PriceHistoryRecord, CoreError> {
        record.validate()?;
        let mut records = self.records.write().await;
        let next_id = records
            .values()
            .flatten()
            .map(|r| r.id)
            .max()
            .unwrap_or(0)
            + 1;
        record.id = next_id;
        records.entry(record.asset_id).or_default().push(record.clone());
        Ok(record)
    }

    async fn list_by_asset_id(&self, asset_id: i64) -> Result<Vec<PriceHistoryRecord>, CoreError> {
        let records = self.records.read().await;
        let mut list = records.get(&asset_id).cloned().unwrap_or_default();
        list.sort_by(|a, b| (b.recorded_at, b.id).cmp(&(a.recorded_at, a.id)));
        Ok(list)
    }
}
