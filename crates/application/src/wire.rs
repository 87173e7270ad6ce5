//! Decoding of vendor response bodies into domain types.
//!
//! Lives in the application layer so the wire tolerance rules (two
//! single-alert shapes, malformed entries skipped, category-keyed lists
//! catalog) stay out of the domain crate.

use serde_json::Value;

use domain::alert::entity::{Alert, WatchList};
use domain::polling::cursor::cursor_from_page_url;

/// Vendor route for the alerts collection (search, pagination, by-id).
pub const ALERTS_ROUTE: &str = "/api/v1/alerts";
/// Vendor route for the lists catalog.
pub const LISTS_ROUTE: &str = "/api/v1/lists";
/// Vendor token endpoint.
pub const TOKEN_ROUTE: &str = "/auth/v1/token";

/// One decoded page of the alerts feed.
#[derive(Debug, Default)]
pub struct AlertsPage {
    pub alerts: Vec<Alert>,
    /// Cursor extracted from the `nextPage` URL, when present.
    pub next_cursor: Option<String>,
}

/// Decode `{alerts: [...], nextPage?, previousPage?}`. Malformed array
/// entries are logged and skipped; a missing array yields an empty page.
pub fn parse_alerts_page(body: &Value) -> AlertsPage {
    let alerts = match body.get("alerts") {
        Some(Value::Array(entries)) => decode_alerts(entries),
        _ => Vec::new(),
    };
    let next_cursor = body
        .get("nextPage")
        .and_then(Value::as_str)
        .and_then(cursor_from_page_url);
    AlertsPage {
        alerts,
        next_cursor,
    }
}

/// Decode a single-alert response. The vendor answers this route with
/// either `{alerts: [alert]}` or a bare alert object; both are tolerated.
pub fn parse_single_alert(body: &Value) -> Option<Alert> {
    if let Some(Value::Array(entries)) = body.get("alerts") {
        return decode_alerts(entries).into_iter().next();
    }
    serde_json::from_value::<Alert>(body.clone())
        .ok()
        .filter(|alert| !alert.alert_id.is_empty())
}

/// Flatten `{lists: {CATEGORY_NAME: [{id, name, ...}, ...]}}` into a single
/// catalog. Entries without an id or name are skipped.
pub fn parse_lists_catalog(body: &Value) -> Vec<WatchList> {
    let Some(Value::Object(categories)) = body.get("lists") else {
        return Vec::new();
    };
    let mut catalog = Vec::new();
    for entries in categories.values() {
        let Value::Array(entries) = entries else {
            continue;
        };
        for entry in entries {
            let id = match entry.get("id") {
                Some(Value::String(id)) => id.clone(),
                Some(Value::Number(id)) => id.to_string(),
                _ => continue,
            };
            let Some(name) = entry.get("name").and_then(Value::as_str) else {
                continue;
            };
            catalog.push(WatchList {
                id,
                name: name.to_string(),
            });
        }
    }
    catalog
}

fn decode_alerts(entries: &[Value]) -> Vec<Alert> {
    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value::<Alert>(entry.clone()) {
            Ok(alert) => Some(alert),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed alert entry");
                None
            }
        })
        .collect()
}
