mod client;
mod event_repository;
mod settings_repository;

pub use client::*;
pub use event_repository::*;
pub use settings_repository::*;
