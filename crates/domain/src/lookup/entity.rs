use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An observable supplied by the caller for alert search: an IP, domain,
/// hash or any other value the vendor's query endpoint accepts.
///
/// Unknown fields ride along in `extra` and are echoed back unchanged in
/// lookup responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    pub value: String,
    #[serde(default, rename = "isIP")]
    pub is_ip: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_with_is_ip_wire_name() {
        let ind: Indicator =
            serde_json::from_value(json!({"value": "1.2.3.4", "isIP": true})).unwrap();
        assert!(ind.is_ip);
        assert_eq!(ind.value, "1.2.3.4");
    }

    #[test]
    fn unknown_fields_are_preserved() {
        let ind: Indicator = serde_json::from_value(
            json!({"value": "evil.example", "isIP": false, "source": "intake-7"}),
        )
        .unwrap();
        let out = serde_json::to_value(&ind).unwrap();
        assert_eq!(out["source"], "intake-7");
    }
}
