pub mod desk_api;
pub mod domain;
pub mod http;

pub use desk_api::*;
pub use domain::*;
pub use http::*;
