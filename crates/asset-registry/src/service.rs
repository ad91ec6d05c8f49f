//! Asset operations: validation, uniqueness and existence checks

use crate::models::{Asset, AssetFields, ListParams};
use crate::storage::{AssetFilter, RecordStore};
use asset_common::{DocumentId, Error, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const INVALID_ID: &str = "Invalid asset ID";
pub const NOT_FOUND: &str = "Asset not found";
pub const TAG_EXISTS: &str = "Asset with this tag already exists";

/// Asset service over an injected record store
#[derive(Clone)]
pub struct AssetService {
    store: Arc<dyn RecordStore>,
}

impl AssetService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    fn parse_id(&self, raw: &str) -> Result<DocumentId> {
        self.store
            .id_codec()
            .decode(raw)
            .map_err(|_| Error::InvalidArgument(INVALID_ID.to_string()))
    }

    async fn fetch(&self, id: &DocumentId) -> Result<Asset> {
        self.store
            .find_one(&AssetFilter::Id(id.clone()))
            .await?
            .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))
    }

    /// Create a new asset
    ///
    /// Fails with `Conflict` when another asset already carries the tag.
    pub async fn create(&self, fields: AssetFields) -> Result<Asset> {
        fields.validate()?;

        let existing = self
            .store
            .find_one(&AssetFilter::AssetTag(fields.asset_tag.clone()))
            .await?;
        if existing.is_some() {
            debug!("Rejecting duplicate asset tag: {}", fields.asset_tag);
            return Err(Error::Conflict(TAG_EXISTS.to_string()));
        }

        let id = match self.store.insert_one(&fields).await {
            Ok(id) => id,
            Err(Error::DuplicateKey(tag)) => {
                debug!("Lost insert race for asset tag: {}", tag);
                return Err(Error::Conflict(TAG_EXISTS.to_string()));
            }
            Err(e) => return Err(e),
        };

        info!("Created asset {} ({})", id, fields.asset_tag);
        self.fetch(&id).await
    }

    /// Get an asset by identifier
    pub async fn get(&self, raw_id: &str) -> Result<Asset> {
        let id = self.parse_id(raw_id)?;
        self.fetch(&id).await
    }

    /// List assets, optionally filtered by search text
    pub async fn list(&self, params: &ListParams) -> Result<Vec<Asset>> {
        let filter = match params.q.as_deref() {
            Some(q) => AssetFilter::search(q),
            None => AssetFilter::All,
        };

        debug!(
            "Listing assets: filter={:?} skip={} limit={}",
            filter, params.skip, params.limit
        );
        self.store
            .find_many(&filter, params.skip, params.limit)
            .await
    }

    /// Replace every mutable field of an asset
    ///
    /// Tag uniqueness is not enforced here; a tag already used by another
    /// asset is logged and accepted.
    pub async fn update(&self, raw_id: &str, fields: AssetFields) -> Result<Asset> {
        let id = self.parse_id(raw_id)?;
        fields.validate()?;

        let existing = self.fetch(&id).await?;

        if existing.fields.asset_tag != fields.asset_tag {
            let holder = self
                .store
                .find_one(&AssetFilter::AssetTag(fields.asset_tag.clone()))
                .await?;
            if let Some(other) = holder.filter(|other| other.id != existing.id) {
                warn!(
                    "Asset {} now shares tag {} with asset {}",
                    id, fields.asset_tag, other.id
                );
            }
        }

        if self.store.update_one(&id, &fields).await? == 0 {
            return Err(Error::NotFound(NOT_FOUND.to_string()));
        }

        info!("Updated asset {}", id);
        self.fetch(&id).await
    }

    /// Delete an asset
    pub async fn delete(&self, raw_id: &str) -> Result<()> {
        let id = self.parse_id(raw_id)?;

        if self.store.delete_one(&id).await? == 0 {
            return Err(Error::NotFound(NOT_FOUND.to_string()));
        }

        info!("Deleted asset {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use asset_common::IdCodec;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service() -> AssetService {
        AssetService::new(Arc::new(MemoryStore::new()))
    }

    /// Store wrapper counting every collection operation
    struct CountingStore {
        inner: MemoryStore,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn bump(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl RecordStore for CountingStore {
        fn id_codec(&self) -> &dyn IdCodec {
            self.inner.id_codec()
        }

        async fn find_one(&self, filter: &AssetFilter) -> Result<Option<Asset>> {
            self.bump();
            self.inner.find_one(filter).await
        }

        async fn find_many(&self, filter: &AssetFilter, skip: u64, limit: u64) -> Result<Vec<Asset>> {
            self.bump();
            self.inner.find_many(filter, skip, limit).await
        }

        async fn insert_one(&self, fields: &AssetFields) -> Result<DocumentId> {
            self.bump();
            self.inner.insert_one(fields).await
        }

        async fn update_one(&self, id: &DocumentId, fields: &AssetFields) -> Result<u64> {
            self.bump();
            self.inner.update_one(id, fields).await
        }

        async fn delete_one(&self, id: &DocumentId) -> Result<u64> {
            self.bump();
            self.inner.delete_one(id).await
        }
    }

    /// Store that reports a free tag on lookup but refuses the insert,
    /// as a concurrent creator winning the race would
    struct RacingStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl RecordStore for RacingStore {
        fn id_codec(&self) -> &dyn IdCodec {
            self.inner.id_codec()
        }

        async fn find_one(&self, filter: &AssetFilter) -> Result<Option<Asset>> {
            match filter {
                AssetFilter::AssetTag(_) => Ok(None),
                _ => self.inner.find_one(filter).await,
            }
        }

        async fn find_many(&self, filter: &AssetFilter, skip: u64, limit: u64) -> Result<Vec<Asset>> {
            self.inner.find_many(filter, skip, limit).await
        }

        async fn insert_one(&self, fields: &AssetFields) -> Result<DocumentId> {
            self.inner.insert_one(fields).await
        }

        async fn update_one(&self, id: &DocumentId, fields: &AssetFields) -> Result<u64> {
            self.inner.update_one(id, fields).await
        }

        async fn delete_one(&self, id: &DocumentId) -> Result<u64> {
            self.inner.delete_one(id).await
        }
    }

    #[tokio::test]
    async fn test_create_assigns_identifier() {
        let service = service();
        let mut fields = AssetFields::new("A-001", "ws1");
        fields.make = Some("Dell".into());

        let created = service.create(fields.clone()).await.unwrap();
        assert!(service.store().id_codec().is_valid(&created.id));
        assert_eq!(created.fields, fields);
    }

    #[tokio::test]
    async fn test_create_duplicate_tag_conflicts() {
        let service = service();
        service.create(AssetFields::new("A-001", "ws1")).await.unwrap();

        let result = service.create(AssetFields::new("A-001", "ws2")).await;
        assert!(matches!(result, Err(Error::Conflict(msg)) if msg == TAG_EXISTS));

        let params = ListParams {
            q: Some("A-001".into()),
            ..Default::default()
        };
        assert_eq!(service.list(&params).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_lost_race_conflicts() {
        let store = RacingStore {
            inner: MemoryStore::new(),
        };
        store.inner.insert_one(&AssetFields::new("A-001", "ws1")).await.unwrap();
        let service = AssetService::new(Arc::new(store));

        let result = service.create(AssetFields::new("A-001", "ws2")).await;
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_required_fields() {
        let service = service();
        let result = service.create(AssetFields::new("", "ws1")).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_empty_required_fields() {
        let service = service();
        let created = service.create(AssetFields::new("A-001", "ws1")).await.unwrap();

        for fields in [AssetFields::new("", "ws3"), AssetFields::new("A-001", "")] {
            let result = service.update(&created.id, fields).await;
            assert!(matches!(result, Err(Error::Validation(_))));
        }

        // Rejected updates leave the record untouched
        let fetched = service.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_malformed_id_never_reaches_store() {
        let store = Arc::new(CountingStore::new());
        let service = AssetService::new(store.clone());

        for raw in ["", "123", "not-an-object-id", "507f1f77bcf86cd79943901z"] {
            assert!(matches!(service.get(raw).await, Err(Error::InvalidArgument(_))));
            assert!(matches!(
                service.update(raw, AssetFields::new("A-001", "ws1")).await,
                Err(Error::InvalidArgument(_))
            ));
            assert!(matches!(service.delete(raw).await, Err(Error::InvalidArgument(_))));
        }

        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_id_not_found() {
        let service = service();
        let missing = "507f1f77bcf86cd799439011";

        assert!(matches!(service.get(missing).await, Err(Error::NotFound(_))));
        assert!(matches!(
            service.update(missing, AssetFields::new("A-001", "ws1")).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(service.delete(missing).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_then_get_returns_new_fields() {
        let service = service();
        let mut fields = AssetFields::new("A-001", "ws1");
        fields.remark = Some("spare".into());
        let created = service.create(fields).await.unwrap();

        let updated = service
            .update(&created.id, AssetFields::new("A-001", "ws3"))
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.fields.host_name, "ws3");
        // Full replace: fields absent from the update are cleared
        assert!(updated.fields.remark.is_none());

        let fetched = service.get(&created.id).await.unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_update_accepts_duplicate_tag() {
        let service = service();
        service.create(AssetFields::new("A-001", "ws1")).await.unwrap();
        let second = service.create(AssetFields::new("A-002", "ws2")).await.unwrap();

        let updated = service
            .update(&second.id, AssetFields::new("A-001", "ws2"))
            .await
            .unwrap();
        assert_eq!(updated.fields.asset_tag, "A-001");
    }

    #[tokio::test]
    async fn test_delete_then_get_not_found() {
        let service = service();
        let created = service.create(AssetFields::new("A-001", "ws1")).await.unwrap();

        service.delete(&created.id).await.unwrap();
        assert!(matches!(service.get(&created.id).await, Err(Error::NotFound(_))));
        assert!(matches!(service.delete(&created.id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_search_is_case_insensitive() {
        let service = service();

        let mut dell = AssetFields::new("A-001", "ws1");
        dell.make = Some("Dell".into());
        service.create(dell).await.unwrap();

        let mut hp = AssetFields::new("A-002", "ws2");
        hp.make = Some("HP".into());
        service.create(hp).await.unwrap();

        service
            .create(AssetFields::new("A-003", "dell-lab-01"))
            .await
            .unwrap();

        let mut serial_only = AssetFields::new("A-004", "ws4");
        serial_only.serial_no = Some("DELL123".into());
        service.create(serial_only).await.unwrap();

        let params = ListParams {
            q: Some("DELL".into()),
            ..Default::default()
        };
        let hits = service.list(&params).await.unwrap();
        let tags: Vec<_> = hits.iter().map(|a| a.fields.asset_tag.as_str()).collect();
        assert_eq!(tags, vec!["A-001", "A-003"]);
    }

    #[tokio::test]
    async fn test_list_skip_and_limit() {
        let service = service();
        for i in 0..30 {
            service
                .create(AssetFields::new(format!("A-{i:03}"), format!("ws{i}")))
                .await
                .unwrap();
        }

        let first = service.list(&ListParams::default()).await.unwrap();
        assert_eq!(first.len(), 25);

        let params = ListParams {
            q: None,
            skip: 28,
            limit: 25,
        };
        let rest = service.list(&params).await.unwrap();
        let tags: Vec<_> = rest.iter().map(|a| a.fields.asset_tag.as_str()).collect();
        assert_eq!(tags, vec!["A-028", "A-029"]);

        let empty_query = ListParams {
            q: Some(String::new()),
            skip: 0,
            limit: 5,
        };
        assert_eq!(service.list(&empty_query).await.unwrap().len(), 5);
    }
}
