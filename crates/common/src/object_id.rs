//! Document identifiers and the codecs that mint and parse them

use crate::{Error, Result};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Store-assigned document identifier in its canonical string form
///
/// Opaque to the service layer; only an [`IdCodec`] knows how to produce or
/// validate one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mints, encodes and validates the identifiers of one document store
pub trait IdCodec: Send + Sync {
    /// Produce a fresh identifier
    fn generate(&self) -> DocumentId;

    /// Parse a raw identifier, returning its canonical form
    fn decode(&self, raw: &str) -> Result<DocumentId>;

    /// Wire form of an identifier
    fn encode(&self, id: &DocumentId) -> String {
        id.as_str().to_string()
    }

    fn is_valid(&self, raw: &str) -> bool {
        self.decode(raw).is_ok()
    }
}

/// 12-byte object identifier: 4-byte big-endian seconds, 5 process-random
/// bytes, 3-byte big-endian counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// Seconds since the Unix epoch at which the identifier was minted
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Convert to a 24-character lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from a 24-character hex string (either case)
    pub fn from_hex(s: &str) -> std::result::Result<Self, hex::FromHexError> {
        if s.len() != 24 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let bytes = hex::decode(s)?;
        let mut arr = [0u8; 12];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// [`IdCodec`] for 24-hex object identifiers
pub struct ObjectIdCodec {
    process_unique: [u8; 5],
    counter: AtomicU32,
}

impl ObjectIdCodec {
    pub fn new() -> Self {
        let seed = uuid::Uuid::new_v4();
        let bytes = seed.as_bytes();

        let mut process_unique = [0u8; 5];
        process_unique.copy_from_slice(&bytes[..5]);
        let counter = u32::from_be_bytes([0, bytes[5], bytes[6], bytes[7]]);

        Self {
            process_unique,
            counter: AtomicU32::new(counter),
        }
    }

    /// Mint the next object identifier
    pub fn next_object_id(&self) -> ObjectId {
        let secs = chrono::Utc::now().timestamp() as u32;
        let count = self.counter.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.process_unique);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        ObjectId(bytes)
    }
}

impl Default for ObjectIdCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl IdCodec for ObjectIdCodec {
    fn generate(&self) -> DocumentId {
        DocumentId(self.next_object_id().to_hex())
    }

    fn decode(&self, raw: &str) -> Result<DocumentId> {
        ObjectId::from_hex(raw)
            .map(|oid| DocumentId(oid.to_hex()))
            .map_err(|e| Error::InvalidId(format!("{raw:?}: {e}")))
    }
}
