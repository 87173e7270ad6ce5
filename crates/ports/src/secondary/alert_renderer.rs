use domain::alert::entity::Alert;
use domain::alert::error::RenderError;

/// Secondary port for the external template renderer.
///
/// The core assembles the data record; the renderer turns it into HTML for
/// the browser UI. Implementations must not mutate or reinterpret opaque
/// alert payload fields.
pub trait AlertRenderer: Send + Sync {
    /// Render the alert detail view. `timezone` is an IANA name hint for
    /// timestamp formatting; `None` falls back to UTC.
    fn render_detail(&self, alert: &Alert, timezone: Option<&str>) -> Result<String, RenderError>;

    /// Render a notification snippet for the given display name.
    fn render_notification(&self, name: &str) -> Result<String, RenderError>;
}
