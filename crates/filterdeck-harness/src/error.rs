use std::path::PathBuf;

use filterdeck_drag::DragError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Drag(#[from] DragError),

    #[error("script error: {message}")]
    Script { message: String },

    #[error("logging setup failed: {message}")]
    Logging { message: String },

    /// Run finished but an `expect` step did not hold.
    #[error("{failed} expectation(s) failed")]
    Expectations { failed: usize },
}

impl HarnessError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Expectations { .. } => 3,
            Self::Script { .. } | Self::Json(_) | Self::Drag(DragError::Config { .. }) => 2,
            _ => 1,
        }
    }

    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HarnessError;
    use filterdeck_drag::DragError;

    #[test]
    fn exit_codes_separate_bad_input_from_failed_runs() {
        assert_eq!(HarnessError::script("no zones").exit_code(), 2);
        assert_eq!(HarnessError::from(DragError::config("tick_hz")).exit_code(), 2);
        assert_eq!(HarnessError::Expectations { failed: 1 }.exit_code(), 3);
        let io = HarnessError::io("a.json", std::io::Error::other("gone"));
        assert_eq!(io.exit_code(), 1);
        assert!(io.to_string().contains("a.json"));
    }
}
