// Build identity reported by GET /version and the startup log line

/// Crate version, from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name, from Cargo.toml (the binary name).
pub const NAME: &str = env!("CARGO_PKG_NAME");
