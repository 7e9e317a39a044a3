pub mod app;
pub mod auth;

pub use app::*;
pub use auth::*;
