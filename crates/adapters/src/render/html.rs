use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use domain::alert::entity::Alert;
use domain::alert::error::RenderError;
use ports::secondary::alert_renderer::AlertRenderer;

/// Default renderer: a compact HTML fragment assembled from the alert
/// record. Deployments with a full template engine plug their own
/// [`AlertRenderer`] in; this one keeps the detail and notification actions
/// functional out of the box.
pub struct HtmlRenderer;

impl HtmlRenderer {
    fn format_timestamp(timestamp_ms: i64, timezone: Option<&str>) -> Result<String, RenderError> {
        let utc: DateTime<Utc> = DateTime::from_timestamp_millis(timestamp_ms)
            .ok_or_else(|| RenderError::Template(format!("bad timestamp {timestamp_ms}")))?;
        match timezone {
            Some(name) => {
                let tz: Tz = name
                    .parse()
                    .map_err(|_| RenderError::InvalidTimezone(name.to_string()))?;
                Ok(utc.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S %Z").to_string())
            }
            None => Ok(utc.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        }
    }
}

impl AlertRenderer for HtmlRenderer {
    fn render_detail(&self, alert: &Alert, timezone: Option<&str>) -> Result<String, RenderError> {
        let when = Self::format_timestamp(alert.alert_timestamp, timezone)?;
        let mut html = format!(
            "<div class=\"alert-detail\">\
             <h2>{}</h2>\
             <p class=\"alert-meta\"><span class=\"alert-type\">{}</span> · {when}</p>",
            escape(&alert.headline),
            escape(&alert.alert_type.name),
        );
        if let Some(sub) = alert.sub_headline.as_ref().and_then(|v| v.as_str()) {
            html.push_str(&format!("<p class=\"alert-sub\">{}</p>", escape(sub)));
        }
        if let Some(url) = alert.dataminr_alert_url.as_ref().and_then(|v| v.as_str()) {
            html.push_str(&format!(
                "<p><a href=\"{}\" target=\"_blank\">Open in vendor console</a></p>",
                escape(url)
            ));
        }
        html.push_str("</div>");
        Ok(html)
    }

    fn render_notification(&self, name: &str) -> Result<String, RenderError> {
        Ok(format!(
            "<div class=\"alert-notification\">New alerts for <strong>{}</strong></div>",
            escape(name)
        ))
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn alert() -> Alert {
        Alert {
            alert_id: "a-1".to_string(),
            alert_timestamp: 1_700_000_000_000,
            headline: "Fire at <plant> & refinery".to_string(),
            dataminr_alert_url: Some(json!("https://console.example/a-1")),
            ..Alert::default()
        }
    }

    #[test]
    fn detail_escapes_and_links() {
        let html = HtmlRenderer.render_detail(&alert(), None).unwrap();
        assert!(html.contains("Fire at &lt;plant&gt; &amp; refinery"));
        assert!(html.contains("https://console.example/a-1"));
        assert!(!html.contains("<plant>"));
    }

    #[test]
    fn detail_formats_timestamp_in_requested_timezone() {
        // 2023-11-14 22:13:20 UTC == 17:13:20 EST.
        let html = HtmlRenderer
            .render_detail(&alert(), Some("America/New_York"))
            .unwrap();
        assert!(html.contains("17:13:20"), "got: {html}");

        let utc = HtmlRenderer.render_detail(&alert(), None).unwrap();
        assert!(utc.contains("22:13:20 UTC"));
    }

    #[test]
    fn invalid_timezone_is_an_error() {
        let err = HtmlRenderer
            .render_detail(&alert(), Some("Mars/Olympus"))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidTimezone(_)));
    }

    #[test]
    fn notification_escapes_name() {
        let html = HtmlRenderer.render_notification("<Ops>").unwrap();
        assert!(html.contains("&lt;Ops&gt;"));
    }
}
