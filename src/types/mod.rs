pub mod tier;
pub mod rank;
pub mod auth;

pub use tier::*;
pub use rank::*;
pub use auth::*;
