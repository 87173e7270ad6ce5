use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Classification attached to every vendor alert (free-form name,
/// compared case-insensitively throughout).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertType {
    #[serde(default)]
    pub name: String,
}

/// Immutable alert record as received from the vendor feed.
///
/// Only `alert_id`, `alert_timestamp` and `alert_type.name` are interpreted
/// by the core (identity, ordering, admission). Every other field is an
/// opaque payload preserved for the renderer and the browser UI, so they are
/// kept as raw JSON values and round-tripped untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(default)]
    pub alert_id: String,
    /// Vendor-supplied, millisecond resolution.
    #[serde(default)]
    pub alert_timestamp: i64,
    #[serde(default)]
    pub alert_type: AlertType,
    #[serde(default)]
    pub headline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_headline: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_post: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_brief: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intel_agents: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_alerts: Option<Value>,
    /// Subscription lists the alert matched. Populated on list-endpoint
    /// fetches; may be absent on single-alert responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lists_matched: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_reference_terms: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataminr_alert_url: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_event_location: Option<Value>,
}

impl Alert {
    /// Type name lowered for case-insensitive comparison.
    pub fn type_name_lower(&self) -> String {
        self.alert_type.name.to_lowercase()
    }

    /// Ids of the lists this alert matched, read out of the opaque
    /// `listsMatched` array. Absent or malformed entries yield nothing.
    pub fn matched_list_ids(&self) -> Vec<String> {
        let Some(Value::Array(lists)) = &self.lists_matched else {
            return Vec::new();
        };
        lists
            .iter()
            .filter_map(|entry| match entry.get("id") {
                Some(Value::String(id)) => Some(id.clone()),
                Some(Value::Number(id)) => Some(id.to_string()),
                _ => None,
            })
            .collect()
    }
}

/// A vendor-side subscription group, cached as-is for UI selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchList {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_wire_alert() -> Value {
        json!({
            "alertId": "alert-123",
            "alertTimestamp": 1_700_000_000_000_i64,
            "alertType": {"name": "Flash"},
            "headline": "Power outage reported",
            "listsMatched": [
                {"id": "77", "name": "Infrastructure"},
                {"id": 42, "name": "Energy"},
                {"name": "no id here"}
            ],
            "dataminrAlertUrl": "https://app.example.com/alerts/alert-123",
            "publicPost": {"text": "original post", "link": "https://t.example/x"}
        })
    }

    #[test]
    fn deserializes_vendor_wire_names() {
        let alert: Alert = serde_json::from_value(sample_wire_alert()).unwrap();
        assert_eq!(alert.alert_id, "alert-123");
        assert_eq!(alert.alert_timestamp, 1_700_000_000_000);
        assert_eq!(alert.alert_type.name, "Flash");
        assert_eq!(alert.type_name_lower(), "flash");
        assert!(alert.public_post.is_some());
    }

    #[test]
    fn serializes_back_to_camel_case() {
        let alert: Alert = serde_json::from_value(sample_wire_alert()).unwrap();
        let out = serde_json::to_value(&alert).unwrap();
        assert_eq!(out["alertId"], "alert-123");
        assert_eq!(out["alertType"]["name"], "Flash");
        assert_eq!(
            out["dataminrAlertUrl"],
            "https://app.example.com/alerts/alert-123"
        );
    }

    #[test]
    fn opaque_payload_round_trips_untouched() {
        let wire = sample_wire_alert();
        let alert: Alert = serde_json::from_value(wire.clone()).unwrap();
        let out = serde_json::to_value(&alert).unwrap();
        assert_eq!(out["publicPost"], wire["publicPost"]);
        assert_eq!(out["listsMatched"], wire["listsMatched"]);
    }

    #[test]
    fn matched_list_ids_handles_strings_numbers_and_gaps() {
        let alert: Alert = serde_json::from_value(sample_wire_alert()).unwrap();
        assert_eq!(alert.matched_list_ids(), vec!["77", "42"]);
    }

    #[test]
    fn matched_list_ids_absent_array_yields_empty() {
        let alert: Alert = serde_json::from_value(json!({"alertId": "a"})).unwrap();
        assert!(alert.matched_list_ids().is_empty());
    }

    #[test]
    fn missing_fields_default() {
        let alert: Alert = serde_json::from_value(json!({})).unwrap();
        assert!(alert.alert_id.is_empty());
        assert_eq!(alert.alert_timestamp, 0);
        assert!(alert.alert_type.name.is_empty());
        assert!(alert.lists_matched.is_none());
    }
}
