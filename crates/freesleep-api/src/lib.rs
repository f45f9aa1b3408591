// freesleep-api: Async Rust client for the free-sleep pod server

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

mod device;
mod metrics;
mod settings;
mod system;

pub use client::FreeSleepClient;
pub use error::Error;
pub use models::PatchTarget;
pub use transport::TransportConfig;
