//! In-process record store

use super::{paginate, AssetFilter, RecordStore};
use crate::models::{Asset, AssetFields};
use asset_common::{DocumentId, Error, IdCodec, ObjectIdCodec, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

/// Record store holding documents in memory, in insertion order
pub struct MemoryStore {
    codec: Box<dyn IdCodec>,
    docs: Mutex<Vec<Asset>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_codec(Box::new(ObjectIdCodec::new()))
    }

    pub fn with_codec(codec: Box<dyn IdCodec>) -> Self {
        Self {
            codec,
            docs: Mutex::new(Vec::new()),
        }
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.docs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn id_codec(&self) -> &dyn IdCodec {
        self.codec.as_ref()
    }

    async fn find_one(&self, filter: &AssetFilter) -> Result<Option<Asset>> {
        let docs = self.docs.lock().await;
        Ok(docs.iter().find(|doc| filter.matches(doc)).cloned())
    }

    async fn find_many(&self, filter: &AssetFilter, skip: u64, limit: u64) -> Result<Vec<Asset>> {
        let docs = self.docs.lock().await;
        let matching = docs.iter().filter(|doc| filter.matches(doc)).cloned();
        Ok(paginate(matching, skip, limit))
    }

    async fn insert_one(&self, fields: &AssetFields) -> Result<DocumentId> {
        let mut docs = self.docs.lock().await;

        if docs.iter().any(|doc| doc.fields.asset_tag == fields.asset_tag) {
            return Err(Error::DuplicateKey(fields.asset_tag.clone()));
        }

        let id = self.codec.generate();
        docs.push(Asset::new(self.codec.encode(&id), fields.clone()));

        debug!("Inserted asset document: {}", id);
        Ok(id)
    }

    async fn update_one(&self, id: &DocumentId, fields: &AssetFields) -> Result<u64> {
        let mut docs = self.docs.lock().await;

        match docs.iter_mut().find(|doc| doc.id == id.as_str()) {
            Some(doc) => {
                doc.fields = fields.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, id: &DocumentId) -> Result<u64> {
        let mut docs = self.docs.lock().await;
        let before = docs.len();
        docs.retain(|doc| doc.id != id.as_str());
        Ok((before - docs.len()) as u64)
    }
}
