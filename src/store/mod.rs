pub mod error;
pub mod history;
pub mod pin;

pub use error::*;
pub use history::*;
pub use pin::*;
