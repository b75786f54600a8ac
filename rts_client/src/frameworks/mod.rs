// Frameworks layer: runtime bootstrap and configuration.

pub mod client;
pub mod config;
