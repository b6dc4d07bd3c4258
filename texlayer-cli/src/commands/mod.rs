//! CLI command implementations.

pub mod animate;
pub mod common;
pub mod config;
pub mod mipmaps;
