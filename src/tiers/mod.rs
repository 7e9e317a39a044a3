pub mod resolver;
pub mod validation;
pub mod badge;
pub mod feed;

pub use resolver::*;
pub use validation::*;
pub use badge::*;
pub use feed::*;
