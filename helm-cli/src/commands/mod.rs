//! Command implementations for the helm CLI

use std::fmt;

pub mod dm;

pub use dm::run_dm;

/// A failed command. `main` maps every failure to exit code 1.
///
/// A failure without a message exits quietly.
#[derive(Debug)]
pub struct CommandFailure {
    message: Option<String>,
}

impl CommandFailure {
    pub fn reported(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    pub fn silent() -> Self {
        Self { message: None }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message().unwrap_or("command failed"))
    }
}

impl From<anyhow::Error> for CommandFailure {
    fn from(err: anyhow::Error) -> Self {
        Self::reported(format!("{:#}", err))
    }
}
