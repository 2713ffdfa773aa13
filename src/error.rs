use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The child process could not be launched or its pipes could not be created.
    #[error("Could not run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A pipe broke while a child was still writing to it.
    #[error("Channel error: {0}")]
    Channel(String),

    /// Structured output from the VCS tool could not be read.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Another action process already owns the action slot.
    #[error("Another command is still running")]
    ActionBusy,

    /// A blocking helper ran but the tool reported failure.
    #[error("`{command}` failed ({status})")]
    ToolFailed { command: String, status: String },

    /// Configuration or persisted state could not be read.
    #[error("Config error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.to_string().contains("file not found"));
    }

    #[test]
    fn terminal_error_display() {
        let err = AppError::Terminal("failed to enter raw mode".into());
        assert_eq!(err.to_string(), "Terminal error: failed to enter raw mode");
    }

    #[test]
    fn spawn_error_names_command() {
        let err = AppError::Spawn {
            command: "svn status".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.to_string(), "Could not run `svn status`: no such file");
    }

    #[test]
    fn tool_failed_display() {
        let err = AppError::ToolFailed {
            command: "svn move a b".into(),
            status: "exit status: 1".into(),
        };
        assert_eq!(err.to_string(), "`svn move a b` failed (exit status: 1)");
    }

    #[test]
    fn action_busy_display() {
        assert_eq!(
            AppError::ActionBusy.to_string(),
            "Another command is still running"
        );
    }
}
