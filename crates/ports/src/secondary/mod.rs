pub mod alert_renderer;
pub mod bulk_feed;
pub mod metrics_port;
pub mod vendor_gateway;
