mod alert;
mod event;
mod outdoor;
mod result;
mod settings;

pub use alert::*;
pub use event::*;
pub use outdoor::*;
pub use result::*;
pub use settings::*;
