//! Application error type.
//!
//! Every fallible operation in the crate returns `AppError`. The exit code is
//! carried alongside the message so the binary can map failures to a process
//! status without inspecting strings:
//!
//! - `2`: invalid input or configuration
//! - `3`: no usable data
//! - `4`: upstream, network or I/O failure

#[derive(Clone, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Invalid request or configuration (exit code 2).
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Upstream or I/O failure (exit code 4).
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}
