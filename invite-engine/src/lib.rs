pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod session;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use session::SessionContext;
