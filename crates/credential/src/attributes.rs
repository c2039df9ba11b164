//! Attribute normalization
//!
//! Credential stores report attributes as native scalars while declared state
//! is a flat string map. Conversion is deterministic and idempotent, so that
//! refreshing a credential twice never manufactures drift.

use crate::types::AttributeValue;
use std::collections::BTreeMap;

/// Render a single attribute value in the store's string convention.
///
/// Floats are rendered fixed-point with no fractional digits, rounding half
/// to even. Non-finite values render as `+Inf`, `-Inf` and `NaN`.
pub fn stringify(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Bool(b) => b.to_string(),
        AttributeValue::Int(i) => i.to_string(),
        AttributeValue::Float(f) => stringify_float(*f),
        AttributeValue::String(s) => s.clone(),
    }
}

fn stringify_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        let inf = if f.is_sign_positive() { "+Inf" } else { "-Inf" };
        inf.to_string()
    } else {
        format!("{f:.0}")
    }
}

/// Convert a raw attribute mapping into its canonical string form
pub fn to_external(raw: &BTreeMap<String, AttributeValue>) -> BTreeMap<String, String> {
    raw.iter()
        .map(|(key, value)| (key.clone(), stringify(value)))
        .collect()
}

/// Lift an already-declared string map into raw values and normalize it.
///
/// Equivalent to `to_external` on an all-string mapping, which is the
/// identity.
pub fn normalize_declared(declared: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let raw: BTreeMap<String, AttributeValue> = declared
        .iter()
        .map(|(k, v)| (k.clone(), AttributeValue::from(v.as_str())))
        .collect();
    to_external(&raw)
}

/// Fold remotely reported values into the declared attribute set.
///
/// The result has exactly the declared keys. Remote keys that were never
/// declared are ignored; declared keys missing remotely keep their declared
/// value.
pub fn merge(
    declared: &BTreeMap<String, String>,
    remote: &BTreeMap<String, AttributeValue>,
) -> BTreeMap<String, String> {
    declared
        .iter()
        .map(|(key, declared_value)| {
            let value = remote
                .get(key)
                .map_or_else(|| declared_value.clone(), stringify);
            (key.clone(), value)
        })
        .collect()
}
