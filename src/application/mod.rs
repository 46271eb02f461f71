// Application layer: configuration, the accounting API client and the
// submission workflow that ties them to a counting session.

pub mod client;
pub mod config;
pub mod error;
pub mod workflow;

pub use client::*;
pub use config::*;
pub use error::*;
pub use workflow::*;
