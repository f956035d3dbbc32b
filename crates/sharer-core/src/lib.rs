pub mod config;
pub mod error;
pub mod types;

pub use error::{SharerError, SharerResult};
pub use types::{Half, Halves};
