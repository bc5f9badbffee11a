//! Core types, policies, and validation for the SitePulse analytics core.

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod limits;
pub mod retention;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::*;
pub use error::{Error, Result};
pub use events::*;
pub use retention::*;
