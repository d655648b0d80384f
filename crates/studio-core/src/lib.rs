pub mod agent;
pub mod config;
pub mod conversation;
pub mod credential;
pub mod error;
pub mod preview;
pub mod profile;
pub mod scheduler;
pub mod studio;
pub mod task;

pub use error::{Error, Result};
pub use studio::{Action, AppState, Outcome, Studio};
