//! The alarm record flowing through the pipeline
//!
//! An [`Alarm`] is an open record: the semantic fields the pipeline renders
//! are typed, and any additional keys from the source are carried verbatim
//! in `extra`. Alarms are value objects — two alarms with the same field
//! sets and values are the same event regardless of key order, and the
//! content digest is their only identity.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// A structured event record describing a network condition to be notified.
///
/// Semantic fields are optional so that "key absent" and "key present but
/// empty" stay distinct through serialization; the digest depends on the
/// exact field set. Providers normalize `timestamp` and `suggested_action`
/// before alarms enter the pipeline, so both are present in practice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    /// Event time as an ISO-8601 string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Alarm classification (e.g. "LinkDown")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_type: Option<String>,

    /// Severity label (e.g. "Critical")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    /// The network element the alarm concerns (e.g. "OLT-12")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_element: Option<String>,

    /// Operator guidance, empty when the source provides none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,

    /// Source fields outside the semantic set, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Alarm {
    /// Compute the deterministic content digest identifying this alarm.
    ///
    /// The canonical form is the JSON serialization of the alarm with all
    /// keys sorted: `serde_json`'s map type is ordered by key (the
    /// `preserve_order` feature is not enabled in this workspace), so
    /// serializing through [`serde_json::to_value`] yields a stable,
    /// key-sorted text encoding. The digest is the lowercase hex SHA-256 of
    /// that encoding. Pure function, no I/O.
    pub fn digest(&self) -> Result<String> {
        let canonical = serde_json::to_string(&serde_json::to_value(self)?)?;
        Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Alarm {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn digest_ignores_key_order() {
        let a = parse(r#"{"alarm_type":"LinkDown","severity":"Critical","network_element":"OLT-12","site":"HQ"}"#);
        let b = parse(r#"{"site":"HQ","network_element":"OLT-12","severity":"Critical","alarm_type":"LinkDown"}"#);
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
    }

    #[test]
    fn digest_differs_on_value_change() {
        let a = parse(r#"{"alarm_type":"LinkDown","severity":"Critical","network_element":"OLT-12"}"#);
        let b = parse(r#"{"alarm_type":"LinkDown","severity":"Major","network_element":"OLT-12"}"#);
        let c = parse(r#"{"alarm_type":"LinkDown","severity":"Critical","network_element":"OLT-13"}"#);
        assert_ne!(a.digest().unwrap(), b.digest().unwrap());
        assert_ne!(a.digest().unwrap(), c.digest().unwrap());
        assert_ne!(b.digest().unwrap(), c.digest().unwrap());
    }

    #[test]
    fn digest_distinguishes_absent_from_empty_field() {
        let absent = parse(r#"{"alarm_type":"LinkDown"}"#);
        let empty = parse(r#"{"alarm_type":"LinkDown","severity":""}"#);
        assert_ne!(absent.digest().unwrap(), empty.digest().unwrap());
    }

    #[test]
    fn digest_is_fixed_length_hex() {
        let digest = parse(r#"{"alarm_type":"LinkDown"}"#).digest().unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn extra_fields_survive_roundtrip() {
        let alarm = parse(
            r#"{"alarm_type":"LinkDown","severity":"Critical","site":"HQ","port":7,"nested":{"a":1}}"#,
        );
        assert_eq!(alarm.extra.get("site"), Some(&Value::from("HQ")));
        assert_eq!(alarm.extra.get("port"), Some(&Value::from(7)));

        let back: Alarm = serde_json::from_str(&serde_json::to_string(&alarm).unwrap()).unwrap();
        assert_eq!(back, alarm);
        assert_eq!(back.digest().unwrap(), alarm.digest().unwrap());
    }
}
