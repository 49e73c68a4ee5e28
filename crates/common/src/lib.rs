pub mod domain;
pub mod postgres;
pub mod telemetry;
pub mod validation;
pub mod webhook;

pub use domain::*;
pub use postgres::*;
pub use telemetry::*;
pub use validation::*;
pub use webhook::*;
