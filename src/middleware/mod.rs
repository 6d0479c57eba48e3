pub mod logging;
pub mod metrics;
pub mod safety_net;

pub use logging::RequestLogging;
pub use metrics::MetricsMiddleware;
pub use safety_net::SafetyNet;
