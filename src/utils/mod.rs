//! Cross-cutting helpers: external commands, file writes, platform lookups.

pub mod command;
pub mod fs;
pub mod platform;
pub mod progress;

pub use command::{CommandOutput, ProbeOutput, ToolCommand};
pub use fs::{atomic_write, ensure_dir, remove_if_exists, safe_write, set_owner_only};
pub use platform::{command_exists, get_home_dir, is_windows, require_command};
