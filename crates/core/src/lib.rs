pub mod config;
pub mod error;
pub mod event;
pub mod variant;

pub use config::Config;
pub use error::*;
pub use event::*;
pub use variant::*;
