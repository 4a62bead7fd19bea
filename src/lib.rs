pub mod artifacts;
pub mod browser;
pub mod core;
pub mod matcher;
pub mod monitor;
pub mod notify;
pub mod portal;
pub mod server;

// --- Primary exports ---
pub use core::config::MonitorConfig;
pub use core::error::{LoginFailure, LoginFailureKind, MonitorError};
pub use core::status::{MonitorState, MonitorStatus, StatusStore};
pub use matcher::TargetProgramSet;
pub use monitor::Monitor;
pub use notify::Notifier;
