//! Node Module
//!
//! Hosting several games on one trusted node.

pub mod config;
pub mod registry;

pub use config::NodeConfig;
pub use registry::{GameRegistry, GameHandle, GameSummary};
