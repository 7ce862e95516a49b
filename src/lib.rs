pub mod agent;
pub mod batch;
pub mod coerce;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod provision;
pub mod rpc;
pub mod session;
pub mod tools;

#[cfg(test)]
mod testing;

pub use error::MrpError;
pub use gateway::{RecordStore, SharedStore};
