//! 12-byte object identifiers
//!
//! Layout follows the usual document-store convention:
//! - 4 bytes: seconds since the Unix epoch (big-endian)
//! - 5 bytes: per-process random value
//! - 3 bytes: counter seeded randomly (big-endian)
//!
//! Identifiers are rendered as 24 lowercase hex characters and travel inside
//! documents as Extended JSON: `{"$oid": "..."}`.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use thiserror::Error;

/// Extended JSON key carrying an object id.
pub const OID_KEY: &str = "$oid";

const COUNTER_MASK: u32 = 0x00FF_FFFF;

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

/// Error returned when parsing a malformed object id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid ObjectId '{0}': expected 24 hexadecimal characters")]
pub struct ObjectIdError(pub String);

/// Opaque unique document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Generates a fresh identifier.
    pub fn new() -> Self {
        Self::with_timestamp(Utc::now())
    }

    /// Generates an identifier whose leading bytes encode `at`.
    pub fn with_timestamp(at: DateTime<Utc>) -> Self {
        let secs = at.timestamp().clamp(0, u32::MAX as i64) as u32;
        let process = PROCESS_UNIQUE.get_or_init(rand::random::<[u8; 5]>);
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::random::<u32>() & COUNTER_MASK))
            .fetch_add(1, Ordering::Relaxed)
            & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(process);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);
        Self(bytes)
    }

    /// Wraps raw bytes.
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Parses a 24 character hex string.
    pub fn parse_str(s: &str) -> Result<Self, ObjectIdError> {
        if s.len() != 24 || !s.is_ascii() {
            return Err(ObjectIdError(s.to_string()));
        }

        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| ObjectIdError(s.to_string()))?;
        }
        Ok(Self(bytes))
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Creation time encoded in the identifier (second precision).
    pub fn timestamp(&self) -> DateTime<Utc> {
        let secs = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        Utc.timestamp_opt(secs as i64, 0)
            .single()
            .unwrap_or_default()
    }

    /// Extended JSON form: `{"$oid": "<hex>"}`.
    pub fn to_json(&self) -> Value {
        json!({ OID_KEY: self.to_hex() })
    }

    /// Reads an identifier from its Extended JSON form.
    ///
    /// Returns `None` unless the value is an object with exactly one `$oid`
    /// key holding a valid hex string.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        if obj.len() != 1 {
            return None;
        }
        let hex = obj.get(OID_KEY)?.as_str()?;
        Self::parse_str(hex).ok()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}
