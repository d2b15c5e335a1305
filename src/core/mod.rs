pub mod error;
pub mod identity;
pub mod money;
pub mod timezone;

pub use error::{AppError, Result};
pub use identity::{AgentRole, CallerContext};
