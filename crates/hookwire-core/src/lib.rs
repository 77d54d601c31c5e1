//! # hookwire-core
//!
//! Core crate for Hookwire. Contains the configuration schemas and the
//! unified error system shared by the hook and shortcode crates.
//!
//! This crate has **no** internal dependencies on other Hookwire crates.

pub mod config;
pub mod error;
pub mod result;

pub use config::HookwireConfig;
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
