//! Field codec: JSON values to and from stored bytes.
//!
//! Every hash field, index-set member and message-list entry is stored as
//! compact JSON. A null field is never written as bytes: [`encode`] maps it
//! to `None`, which a hash write turns into a field deletion. On the way back,
//! [`decode`] zips field names with the raw values an `HMGET` returned and
//! passes missing values through as `null`.
//!
//! Timestamps use the [`timestamp`] serde helpers so records written here
//! and records written by the legacy writer share one layout.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::{Result, StoreError};

/// A raw stored value; `None` when the field or key is absent.
pub type RawValue = Option<Vec<u8>>;

/// Encode a single value.
pub fn encode_value<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(StoreError::Encode)
}

/// Decode a single stored value. `context` names the key or field for errors.
pub fn decode_value<T: DeserializeOwned>(context: &str, raw: &[u8]) -> Result<T> {
    serde_json::from_slice(raw).map_err(|e| StoreError::decode(context, e))
}

/// Encode every field of a record; null fields become `None`.
pub fn encode(fields: &Map<String, Value>) -> Result<Vec<(String, RawValue)>> {
    fields
        .iter()
        .map(|(name, value)| {
            let raw = if value.is_null() {
                None
            } else {
                Some(encode_value(value)?)
            };
            Ok((name.clone(), raw))
        })
        .collect()
}

/// Decode raw values positionally against `names`.
///
/// `None` decodes to `null`. A length mismatch means the reply does not
/// belong to the request and is reported as [`StoreError::FieldCount`].
pub fn decode(names: &[&str], raw: Vec<RawValue>) -> Result<Map<String, Value>> {
    if names.len() != raw.len() {
        return Err(StoreError::FieldCount {
            expected: names.len(),
            actual: raw.len(),
        });
    }
    names
        .iter()
        .zip(raw)
        .map(|(name, value)| {
            let decoded = match value {
                Some(bytes) => decode_value(name, &bytes)?,
                None => Value::Null,
            };
            Ok(((*name).to_string(), decoded))
        })
        .collect()
}

/// Serde helpers for `updated_at` timestamps.
///
/// Written as naive UTC ISO-8601 with microseconds
/// (`2024-01-02T03:04:05.123456`), fraction omitted when zero. Read back
/// from that layout or from RFC 3339 with any offset.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Format a timestamp in the stored layout.
    pub fn format(dt: &DateTime<Utc>) -> String {
        if dt.nanosecond() / 1_000 == 0 {
            dt.format("%Y-%m-%dT%H:%M:%S").to_string()
        } else {
            dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
        }
    }

    /// Parse a stored timestamp.
    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        s.parse::<NaiveDateTime>().ok().map(|n| n.and_utc())
    }

    /// Serialize a timestamp.
    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(dt))
    }

    /// Deserialize a timestamp.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}")))
    }

    /// The same helpers for `Option<DateTime<Utc>>`.
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        /// Serialize an optional timestamp (`None` as null).
        #[allow(clippy::ref_option)]
        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => serializer.serialize_str(&super::format(dt)),
                None => serializer.serialize_none(),
            }
        }

        /// Deserialize an optional timestamp.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let Some(s) = Option::<String>::deserialize(deserializer)? else {
                return Ok(None);
            };
            super::parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}")))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
