//! Deserialization support for partial-update bodies.
//!
//! Update inputs model most fields as `Option<T>` where `None` means "leave
//! unchanged". That representation cannot express clearing a nullable column,
//! because serde maps both an absent field and an explicit `null` to `None`.
//! Nullable fields use `Option<Option<T>>` instead, deserialized with
//! [double_option]: the outer `Option` is `None` when the field was absent,
//! `Some(None)` when the client sent `null`, and `Some(Some(value))`
//! otherwise.

use serde::{Deserialize, Deserializer};

/// Deserialize a field into `Option<Option<T>>`, distinguishing an absent
/// field from an explicit `null`.
///
/// Must be combined with `#[serde(default)]` so missing fields become the
/// outer `None`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
