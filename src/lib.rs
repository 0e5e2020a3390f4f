//! Patchwire — reassembles patch-oriented conversation event streams

mod error;

pub use error::{Error, Result};

pub mod config;
pub mod request;
pub mod stream;
