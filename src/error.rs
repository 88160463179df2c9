use std::path::PathBuf;

use thiserror::Error;

const EXIT_EXPECTED: i32 = 1;

/// Failures caused by the inputs rather than by the tool itself.
///
/// Anything else reaching `main` is treated as an internal error and exits
/// with a different status so automation can tell the two apart.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("need at least 2 matched chapters to compute Pearson (matched={matched})")]
    InsufficientData { matched: usize },

    #[error("failed to write report to {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn exit_code(&self) -> i32 {
        EXIT_EXPECTED
    }
}

#[cfg(test)]
mod tests {
    use super::ToolError;

    #[test]
    fn insufficient_data_message_cites_matched_count() {
        let err = ToolError::InsufficientData { matched: 1 };
        assert_eq!(
            err.to_string(),
            "need at least 2 matched chapters to compute Pearson (matched=1)"
        );
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn anyhow_context_keeps_tool_error_downcastable() {
        let err = anyhow::Error::new(ToolError::invalid("labels file has no records"))
            .context("calibration aborted");
        assert!(err.downcast_ref::<ToolError>().is_some());
    }
}
