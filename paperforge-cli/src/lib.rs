// All core functionality is in paperforge-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod logging;
pub mod server;
pub mod stages;

// Re-export core types for convenience
pub use paperforge_core::*;

pub use logging::init_tracing;
pub use server::{router, AppState};
pub use stages::save_stages;
