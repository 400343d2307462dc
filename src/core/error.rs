//! Error handling for tutils
//!
//! Two layers, as in most of the crate:
//! 1. [`ToolError`] - strongly-typed failures that code can match on
//! 2. [`ErrorContext`] - the same error wrapped with a suggestion and details
//!    for display in the terminal
//!
//! Commands return `anyhow::Result` and attach context with `.context()`.
//! `main` converts whatever bubbles up with [`user_friendly_error`] and prints
//! it with [`ErrorContext::display`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use terminal_utils::core::{ToolError, user_friendly_error};
//!
//! let err = anyhow::Error::from(ToolError::ToolNotFound {
//!     tool: "gh".to_string(),
//! });
//! user_friendly_error(err).display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Failure cases shared by every helper.
#[derive(Error, Debug, Clone)]
pub enum ToolError {
    /// An external program is not on `PATH`.
    #[error("'{tool}' is not installed or not found in PATH")]
    ToolNotFound {
        /// Executable name, e.g. `gh` or `npm`
        tool: String,
    },

    /// An external program ran but exited unsuccessfully.
    ///
    /// `output` holds whatever the program printed, shown to the user verbatim.
    #[error("'{command}' failed")]
    CommandFailed {
        /// The command line that failed
        command: String,
        /// Captured stderr (or stdout when stderr was empty)
        output: String,
    },

    /// Neither `pyproject.toml` nor `package.json` was found.
    #[error("No package.json or pyproject.toml found in {dir}")]
    ManifestNotFound {
        /// Directory that was searched
        dir: String,
    },

    /// The manifest exists but has no usable version field.
    #[error("Could not find a version in {file}")]
    VersionFieldMissing {
        /// Manifest file name
        file: String,
    },

    /// A version string does not start with `MAJOR.MINOR.PATCH`.
    #[error("Invalid version format: {version}")]
    InvalidVersion {
        /// The offending input
        version: String,
    },

    /// A config or data file could not be parsed.
    #[error("Invalid file syntax in {file}")]
    ParseError {
        /// File that failed to parse
        file: String,
        /// Parser message
        reason: String,
    },

    /// The working tree has uncommitted changes.
    #[error("Git working tree contains uncommitted changes")]
    DirtyWorkingTree,

    /// The current directory has no usable `origin` remote.
    #[error("Not a git repository or remote 'origin' is not configured")]
    NoGitRemote,

    /// A network request failed.
    #[error("Network error: {operation}")]
    NetworkError {
        /// What was being fetched
        operation: String,
        /// Underlying reason
        reason: String,
    },

    /// The release has no asset the installer can use.
    #[error("Release {tag} has no .zip asset")]
    NoReleaseAsset {
        /// Release tag
        tag: String,
    },

    /// Downloaded archive does not match its published checksum.
    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Asset name
        file: String,
        /// Published checksum
        expected: String,
        /// Computed checksum
        actual: String,
    },

    /// User-supplied value that cannot be stored or used.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// What is wrong with it
        reason: String,
    },

    /// Home directory could not be determined.
    #[error("Could not determine home directory")]
    NoHomeDirectory,

    /// Anything else, carrying a full message.
    #[error("{message}")]
    Other {
        /// Message shown to the user
        message: String,
    },
}

/// A [`ToolError`] plus optional hints for the user.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ToolError,
    /// What the user can do about it
    pub suggestion: Option<String>,
    /// Why it happened
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: ToolError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add an actionable suggestion, shown in green.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add explanatory details, shown in yellow.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Install instructions for the external tools the helpers rely on.
#[must_use]
pub fn install_hint(tool: &str) -> &'static str {
    match tool {
        "gh" => "Install the GitHub CLI from https://cli.github.com/ and run 'gh auth login'",
        "git" => "Install git from https://git-scm.com/ or your package manager (e.g. 'apt install git')",
        "npm" => "Install Node.js from https://nodejs.org/ so that npm is available",
        "ssh" | "ssh-keygen" => {
            "Install an OpenSSH client (e.g. 'apt install openssh-client' or the Windows OpenSSH feature)"
        }
        "sshpass" => "Install sshpass (e.g. 'apt install sshpass' or 'brew install sshpass')",
        "plink" => "Install PuTTY, which ships plink.exe",
        _ => "Install the tool and make sure it is available in your PATH",
    }
}

/// Convert any error into an [`ErrorContext`] with helpful hints.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(ctx) = error.downcast_ref::<ErrorContext>() {
        return ErrorContext {
            error: ctx.error.clone(),
            suggestion: ctx.suggestion.clone(),
            details: ctx.details.clone(),
        };
    }

    if let Some(tool_error) = error.downcast_ref::<ToolError>() {
        return create_error_context(tool_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(ToolError::Other {
                    message: format!("Permission denied: {io_error}"),
                })
                .with_suggestion("Check the ownership and permissions of the tutils data directory");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(ToolError::Other {
                    message: format!("File not found: {io_error}"),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(json_error) = error.downcast_ref::<serde_json::Error>() {
        return ErrorContext::new(ToolError::ParseError {
            file: "JSON file".to_string(),
            reason: json_error.to_string(),
        })
        .with_suggestion("Check the JSON syntax: quotes, commas and brackets");
    }

    // Generic error - include the full chain
    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ToolError::Other {
        message,
    })
}

fn create_error_context(error: ToolError) -> ErrorContext {
    match &error {
        ToolError::ToolNotFound { tool } => {
            let hint = install_hint(tool);
            ErrorContext::new(error).with_suggestion(hint)
        }

        ToolError::CommandFailed { output, .. } => {
            let details = output.trim().to_string();
            let ctx = ErrorContext::new(error);
            if details.is_empty() {
                ctx
            } else {
                ctx.with_details(details)
            }
        }

        ToolError::ManifestNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Run this command from a project root that contains pyproject.toml or package.json"),

        ToolError::VersionFieldMissing { .. } => ErrorContext::new(error).with_suggestion(
            "Add a version under [project] or [tool.poetry] in pyproject.toml, or a \"version\" key in package.json",
        ),

        ToolError::InvalidVersion { .. } => ErrorContext::new(error)
            .with_suggestion("Use a semantic version such as 1.2.3"),

        ToolError::ParseError { reason, .. } => {
            let reason = reason.clone();
            ErrorContext::new(error)
                .with_details(reason)
                .with_suggestion("Fix the file by hand or delete it to start over")
        }

        ToolError::DirtyWorkingTree => ErrorContext::new(error)
            .with_suggestion("Commit or discard changes before bumping the version"),

        ToolError::NoGitRemote => ErrorContext::new(error)
            .with_suggestion("Run from inside a clone, or add a remote with 'git remote add origin <url>'"),

        ToolError::NetworkError { reason, .. } => {
            let reason = reason.clone();
            ErrorContext::new(error)
                .with_details(reason)
                .with_suggestion("Check your internet connection and try again")
        }

        ToolError::ChecksumMismatch { .. } => ErrorContext::new(error)
            .with_suggestion("The download may be corrupted. Run the installer again"),

        ToolError::NoHomeDirectory => ErrorContext::new(error).with_suggestion(if cfg!(windows) {
            "Check that the USERPROFILE environment variable is set"
        } else {
            "Check that the HOME environment variable is set"
        }),

        ToolError::NoReleaseAsset { .. }
        | ToolError::InvalidInput { .. }
        | ToolError::Other { .. } => ErrorContext::new(error),
    }
}
