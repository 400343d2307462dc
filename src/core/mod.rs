//! Core types shared by every helper: the error taxonomy and its display layer.

pub mod error;

pub use error::{ErrorContext, ToolError, install_hint, user_friendly_error};
