//! Persistence capabilities the engine consumes. Storage itself lives
//! outside this crate; [`memory`] provides in-process implementations.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::asset::Asset;
use crate::models::price::PriceHistoryRecord;

pub use memory::{MemoryAssetRepository, MemoryPriceHistoryRepository};

/// Read access to users' assets, plus whole-record updates.
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// The asset with `uuid` if it belongs to `user_id`.
    async fn get_by_uuid(&self, uuid: Uuid, user_id: i64) -> Result<Option<Asset>, CoreError>;

    /// Every asset owned by `user_id`, in a stable order.
    async fn list_by_user_id(&self, user_id: i64) -> Result<Vec<Asset>, CoreError>;

    /// Replace the stored record with the same UUID. `NotFound` if absent.
    async fn update(&self, asset: &Asset) -> Result<(), CoreError>;
}

/// Manually recorded prices per asset.
#[async_trait]
pub trait PriceHistoryRepository: Send + Sync {
    /// The most recent record for `asset_id`.
    async fn get_latest_by_asset_id(
        &self,
        asset_id: i64,
    ) -> Result<Option<PriceHistoryRecord>, CoreError>;

    /// Store a validated record and return it with its assigned id.
    async fn create(&self, record: PriceHistoryRecord) -> Result<PriceHistoryRecord, CoreError>;

    /// All records for `asset_id`, newest first.
    async fn list_by_asset_id(&self, asset_id: i64) -> Result<Vec<PriceHistoryRecord>, CoreError>;
}
