mod aggregation;
mod alert_dispatcher;
mod analytics_service;
mod dashboard_service;
mod ingestion_service;
mod outdoor_conditions;
mod settings_service;

pub use aggregation::*;
pub use alert_dispatcher::*;
pub use analytics_service::*;
pub use dashboard_service::*;
pub use ingestion_service::*;
pub use outdoor_conditions::*;
pub use settings_service::*;
