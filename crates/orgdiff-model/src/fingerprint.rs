//! Content fingerprints for records.
//!
//! A fingerprint is a SHA-256 digest over a canonical encoding of
//! `(field, value)` pairs in field-name order. The comparison engine uses it
//! as the hashable composite key of a record; duplicate resolution uses it to
//! check that the record at a recorded position is still the one a reviewer
//! chose.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::value::{FieldValue, Record};

const UNIT_SEPARATOR: u8 = 0x1f;
const RECORD_SEPARATOR: u8 = 0x1e;

/// SHA-256 digest of a record's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Hex representation (64 lowercase characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Incremental builder so callers can prefix identity components.
#[derive(Default)]
pub struct FingerprintBuilder {
    hasher: Sha256,
}

impl FingerprintBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mix a raw identity component (object type, key value).
    pub fn component(&mut self, value: &str) -> &mut Self {
        self.hasher.update(value.as_bytes());
        self.hasher.update([RECORD_SEPARATOR]);
        self
    }

    /// Mix one field. Callers must feed fields in a stable order.
    pub fn field(&mut self, name: &str, value: &FieldValue) -> &mut Self {
        self.hasher.update(name.as_bytes());
        self.hasher.update([UNIT_SEPARATOR]);
        self.hasher.update(value.canonical().as_bytes());
        self.hasher.update([RECORD_SEPARATOR]);
        self
    }

    pub fn finish(self) -> Fingerprint {
        Fingerprint(self.hasher.finalize().into())
    }
}

/// Fingerprint of a record's full content (every field, blank values included).
pub fn record_fingerprint(record: &Record) -> Fingerprint {
    let mut builder = FingerprintBuilder::new();
    for (name, value) in &record.fields {
        builder.field(name, value);
    }
    builder.finish()
}
