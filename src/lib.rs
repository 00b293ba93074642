// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod config;
pub mod emphasis;
pub mod platform;
pub mod runtime;
pub mod session;
pub mod share;
pub mod ui;
