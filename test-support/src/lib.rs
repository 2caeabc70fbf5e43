pub mod fake_server;
pub mod scripted;
pub mod timeouts;

// Re-export commonly used items
pub use fake_server::{frame, FakeServer};
pub use scripted::ScriptedServer;

/// Check if running in CI environment.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
}
