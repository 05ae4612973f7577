//! textly — typewriter-style playback of lightly marked-up text.

pub mod cancel;
pub mod config;
pub mod dsl;
pub mod error;
pub mod vm;

pub use error::Error;
