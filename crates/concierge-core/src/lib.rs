pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::ConciergeConfig;
pub use error::{ConciergeError, Result};
pub use events::ChatEvent;
pub use types::*;
