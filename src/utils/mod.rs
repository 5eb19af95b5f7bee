//! Utilities for touchjoy.
//!
//! Submodules:
//! - `paths`: config file location and working-directory handling.

pub mod paths;
