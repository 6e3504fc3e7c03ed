#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod session_clock;
pub mod time;

pub use error::Error;
pub use session_clock::{append_attempt, complete_session, complete_session_scored, evaluate_status};
pub use time::Clock;
