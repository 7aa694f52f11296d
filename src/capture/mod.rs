pub mod capture;
pub mod compositor;
pub mod crop;
pub mod error;
pub mod monitor;
pub mod region;
pub mod session;
pub mod utils;

pub use capture::*;
pub use error::*;
pub use monitor::*;
pub use region::*;
pub use session::*;
