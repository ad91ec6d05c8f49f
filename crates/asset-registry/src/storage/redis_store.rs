//! Redis storage for asset documents
//!
//! Layout, under a `{db_name}:assets` prefix:
//! - `:docs` hash of identifier -> JSON document
//! - `:order` list of identifiers in insertion order
//! - `:tag:{asset_tag}` identifier of the document holding that tag
//!
//! Every mutation runs as one Lua script, so the hash, the order list and the
//! tag lookups change together or not at all.

use super::{paginate, AssetFilter, RecordStore};
use crate::models::{Asset, AssetFields};
use anyhow::Context;
use asset_common::{DocumentId, Error, IdCodec, ObjectIdCodec, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

fn redis_error(err: redis::RedisError) -> Error {
    Error::Redis(err.to_string())
}

/// KEYS: tag key, docs, order. ARGV: id, document, asset_tag.
///
/// A lookup whose holder is gone or no longer carries the tag is reclaimed.
const INSERT_SCRIPT: &str = r#"
local holder = redis.call('GET', KEYS[1])
if holder then
  local doc = redis.call('HGET', KEYS[2], holder)
  if doc and cjson.decode(doc)['asset_tag'] == ARGV[3] then
    return 0
  end
end
redis.call('SET', KEYS[1], ARGV[1])
redis.call('HSET', KEYS[2], ARGV[1], ARGV[2])
redis.call('RPUSH', KEYS[3], ARGV[1])
return 1
"#;

/// KEYS: docs. ARGV: id, document, new asset_tag, tag key prefix.
const UPDATE_SCRIPT: &str = r#"
local old = redis.call('HGET', KEYS[1], ARGV[1])
if not old then
  return 0
end
local old_tag = cjson.decode(old)['asset_tag']
if old_tag ~= ARGV[3] then
  local old_key = ARGV[4] .. old_tag
  if redis.call('GET', old_key) == ARGV[1] then
    redis.call('DEL', old_key)
  end
  redis.call('SET', ARGV[4] .. ARGV[3], ARGV[1])
end
redis.call('HSET', KEYS[1], ARGV[1], ARGV[2])
return 1
"#;

/// KEYS: docs, order. ARGV: id, tag key prefix.
const DELETE_SCRIPT: &str = r#"
local doc = redis.call('HGET', KEYS[1], ARGV[1])
if not doc then
  return 0
end
redis.call('HDEL', KEYS[1], ARGV[1])
redis.call('LREM', KEYS[2], 0, ARGV[1])
local tag_key = ARGV[2] .. cjson.decode(doc)['asset_tag']
if redis.call('GET', tag_key) == ARGV[1] then
  redis.call('DEL', tag_key)
end
return 1
"#;

/// Record store backed by Redis
pub struct RedisStore {
    conn: ConnectionManager,
    codec: ObjectIdCodec,
    prefix: String,
    insert_script: redis::Script,
    update_script: redis::Script,
    delete_script: redis::Script,
}

impl RedisStore {
    /// Connect to Redis and scope all keys to `db_name`
    pub async fn new(redis_url: &str, db_name: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)
            .context("Failed to create Redis client")?;

        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        info!("Connected to Redis at {} (database: {})", redis_url, db_name);

        Ok(Self {
            conn,
            codec: ObjectIdCodec::new(),
            prefix: format!("{}:assets", db_name),
            insert_script: redis::Script::new(INSERT_SCRIPT),
            update_script: redis::Script::new(UPDATE_SCRIPT),
            delete_script: redis::Script::new(DELETE_SCRIPT),
        })
    }

    fn docs_key(&self) -> String {
        format!("{}:docs", self.prefix)
    }

    fn order_key(&self) -> String {
        format!("{}:order", self.prefix)
    }

    fn tag_prefix(&self) -> String {
        format!("{}:tag:", self.prefix)
    }

    fn tag_key(&self, asset_tag: &str) -> String {
        format!("{}{}", self.tag_prefix(), asset_tag)
    }

    async fn get_document(&self, id: &str) -> Result<Option<Asset>> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn.hget(self.docs_key(), id).await.map_err(redis_error)?;

        match json {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    /// Load documents for `ids`, skipping identifiers with no document
    async fn get_documents(&self, ids: &[String]) -> Result<Vec<Asset>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let docs: Vec<Option<String>> = redis::cmd("HMGET")
            .arg(self.docs_key())
            .arg(ids)
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;

        docs.into_iter()
            .flatten()
            .map(|data| serde_json::from_str(&data).map_err(Error::from))
            .collect()
    }

    /// Identifiers in insertion order, between `start` and `stop` inclusive
    async fn ordered_ids(&self, start: isize, stop: isize) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        conn.lrange(self.order_key(), start, stop)
            .await
            .map_err(redis_error)
    }
}

#[async_trait]
impl RecordStore for RedisStore {
    fn id_codec(&self) -> &dyn IdCodec {
        &self.codec
    }

    async fn find_one(&self, filter: &AssetFilter) -> Result<Option<Asset>> {
        match filter {
            AssetFilter::Id(id) => self.get_document(id.as_str()).await,
            AssetFilter::AssetTag(tag) => {
                let mut conn = self.conn.clone();
                let holder: Option<String> =
                    conn.get(self.tag_key(tag)).await.map_err(redis_error)?;

                if let Some(id) = holder {
                    if let Some(asset) = self.get_document(&id).await? {
                        if filter.matches(&asset) {
                            return Ok(Some(asset));
                        }
                    }
                }

                // Lookup may be stale after an update moved the tag
                Ok(self.find_many(filter, 0, 1).await?.into_iter().next())
            }
            _ => Ok(self.find_many(filter, 0, 1).await?.into_iter().next()),
        }
    }

    async fn find_many(&self, filter: &AssetFilter, skip: u64, limit: u64) -> Result<Vec<Asset>> {
        match filter {
            AssetFilter::All => {
                let start = isize::try_from(skip).unwrap_or(isize::MAX);
                let stop = if limit == 0 {
                    -1
                } else {
                    start.saturating_add(isize::try_from(limit).unwrap_or(isize::MAX) - 1)
                };

                let ids = self.ordered_ids(start, stop).await?;
                self.get_documents(&ids).await
            }
            AssetFilter::Id(id) => {
                let found = self.get_document(id.as_str()).await?;
                Ok(paginate(found, skip, limit))
            }
            AssetFilter::AssetTag(_) | AssetFilter::Search(_) => {
                let ids = self.ordered_ids(0, -1).await?;
                let docs = self.get_documents(&ids).await?;
                debug!("Scanned {} asset documents for {:?}", docs.len(), filter);

                Ok(paginate(
                    docs.into_iter().filter(|doc| filter.matches(doc)),
                    skip,
                    limit,
                ))
            }
        }
    }

    async fn insert_one(&self, fields: &AssetFields) -> Result<DocumentId> {
        let mut conn = self.conn.clone();
        let id = self.codec.generate();
        let json = serde_json::to_string(&Asset::new(self.codec.encode(&id), fields.clone()))?;

        let inserted: u64 = self
            .insert_script
            .key(self.tag_key(&fields.asset_tag))
            .key(self.docs_key())
            .key(self.order_key())
            .arg(id.as_str())
            .arg(json)
            .arg(&fields.asset_tag)
            .invoke_async(&mut conn)
            .await
            .map_err(redis_error)?;

        if inserted == 0 {
            debug!("Asset tag already claimed: {}", fields.asset_tag);
            return Err(Error::DuplicateKey(fields.asset_tag.clone()));
        }

        info!("Inserted asset {} with tag {}", id, fields.asset_tag);
        Ok(id)
    }

    async fn update_one(&self, id: &DocumentId, fields: &AssetFields) -> Result<u64> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(&Asset::new(self.codec.encode(id), fields.clone()))?;

        let updated: u64 = self
            .update_script
            .key(self.docs_key())
            .arg(id.as_str())
            .arg(json)
            .arg(&fields.asset_tag)
            .arg(self.tag_prefix())
            .invoke_async(&mut conn)
            .await
            .map_err(redis_error)?;

        if updated == 0 {
            debug!("Asset not found for update: {}", id);
        } else {
            info!("Updated asset {}", id);
        }
        Ok(updated)
    }

    async fn delete_one(&self, id: &DocumentId) -> Result<u64> {
        let mut conn = self.conn.clone();

        let deleted: u64 = self
            .delete_script
            .key(self.docs_key())
            .key(self.order_key())
            .arg(id.as_str())
            .arg(self.tag_prefix())
            .invoke_async(&mut conn)
            .await
            .map_err(redis_error)?;

        if deleted > 0 {
            info!("Deleted asset {}", id);
        }
        Ok(deleted)
    }
}
