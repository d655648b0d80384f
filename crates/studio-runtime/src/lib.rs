// Live (wall-clock) driving of the studio engine

mod error;
mod scheduler;
mod session;

pub use error::{Error, Result};
pub use scheduler::{Fired, TokioScheduler};
pub use session::Session;
