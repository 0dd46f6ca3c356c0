//! Request handlers.

pub mod frames;
pub mod health;
pub mod upload;

pub use frames::*;
pub use health::*;
pub use upload::*;
