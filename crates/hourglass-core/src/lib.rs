pub mod constants;
pub mod error;
pub mod record;
pub mod types;

pub use constants::*;
pub use error::ProtocolError;
pub use record::{Reveal, TimeLockRecord};
pub use types::*;
