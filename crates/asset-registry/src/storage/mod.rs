//! Record store for asset documents
//!
//! [`RecordStore`] is a thin pass-through to a document collection. It does no
//! business validation and surfaces store failures unmodified.

mod memory;
mod redis_store;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

use crate::models::{Asset, AssetFields};
use anyhow::Result as AnyResult;
use asset_common::{DocumentId, IdCodec, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Selects documents from the collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetFilter {
    /// Every document
    All,

    /// The document with this identifier
    Id(DocumentId),

    /// Documents whose `asset_tag` equals this value exactly
    AssetTag(String),

    /// Documents whose tag, host name, make or model contain this lowercase
    /// text
    Search(String),
}

impl AssetFilter {
    /// Case-insensitive search filter; empty text selects everything
    pub fn search(text: &str) -> Self {
        if text.is_empty() {
            AssetFilter::All
        } else {
            AssetFilter::Search(text.to_lowercase())
        }
    }

    pub fn matches(&self, asset: &Asset) -> bool {
        match self {
            AssetFilter::All => true,
            AssetFilter::Id(id) => asset.id == id.as_str(),
            AssetFilter::AssetTag(tag) => asset.fields.asset_tag == *tag,
            AssetFilter::Search(needle) => asset.fields.matches_search(needle),
        }
    }
}

/// Collection-level operations over asset documents
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Identifier codec native to this store
    fn id_codec(&self) -> &dyn IdCodec;

    /// First document matching `filter`
    async fn find_one(&self, filter: &AssetFilter) -> Result<Option<Asset>>;

    /// Matching documents in insertion order, after skipping `skip`, at most
    /// `limit` of them (`0` means no limit)
    async fn find_many(&self, filter: &AssetFilter, skip: u64, limit: u64) -> Result<Vec<Asset>>;

    /// Store a new document and return its freshly assigned identifier
    ///
    /// Fails with `Error::DuplicateKey` if another document already claims the
    /// same `asset_tag`.
    async fn insert_one(&self, fields: &AssetFields) -> Result<DocumentId>;

    /// Replace every mutable field of a document; returns the matched count
    async fn update_one(&self, id: &DocumentId, fields: &AssetFields) -> Result<u64>;

    /// Remove a document; returns the deleted count
    async fn delete_one(&self, id: &DocumentId) -> Result<u64>;
}

/// Open the store named by a connection string
///
/// `memory://` selects the in-process store; anything else is handed to Redis.
pub async fn connect(store_url: &str, db_name: &str) -> AnyResult<Arc<dyn RecordStore>> {
    if store_url.starts_with("memory://") {
        info!("Using in-memory record store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = RedisStore::new(store_url, db_name).await?;
    Ok(Arc::new(store))
}

/// Apply skip then limit to an ordered sequence
pub(crate) fn paginate<T>(items: impl IntoIterator<Item = T>, skip: u64, limit: u64) -> Vec<T> {
    let skip = usize::try_from(skip).unwrap_or(usize::MAX);
    let rest = items.into_iter().skip(skip);

    if limit == 0 {
        rest.collect()
    } else {
        rest.take(usize::try_from(limit).unwrap_or(usize::MAX)).collect()
    }
}
