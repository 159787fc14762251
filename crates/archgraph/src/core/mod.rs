//! Core building blocks for diagram rendering
//!
//! Types, configuration and errors shared by the builder, plus the DOT
//! writer and the rendering backends it hands off to.

pub mod backend;
mod config;
pub mod dot;
mod error;
pub mod logging;
mod types;

pub use backend::{write_atomically, GraphvizBackend, RenderBackend, DOT_PATH_ENV};
pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;
