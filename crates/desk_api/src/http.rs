mod cors;
mod error;
mod handlers;
mod router;
mod server;

pub use cors::*;
pub use error::*;
pub use handlers::*;
pub use router::*;
pub use server::*;
