//! flat64 core - archive flattening for constrained filesystems
//!
//! This crate contains all conversion logic with zero CLI dependencies.
//! It walks a source tree, unwraps nested containers through external
//! tools, and produces a flat, normalized copy fit for a 16+3 filename
//! filesystem.

pub mod classify;
pub mod config;
pub mod logging;
pub mod naming;
pub mod pipeline;
pub mod tools;
pub mod util;
pub mod workspace;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
