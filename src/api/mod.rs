pub mod analyze;
pub mod error;
pub mod health;
pub mod openapi;
pub mod session;

pub use error::ApiError;
