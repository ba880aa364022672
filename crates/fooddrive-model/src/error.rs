use fooddrive_core::StageLayout;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model file not found: {0}")]
    NotFound(std::path::PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model file is not a valid artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("malformed artifact: {0}")]
    Malformed(String),

    #[error("artifact layout is {found}, schema expects {expected}")]
    LayoutMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl ModelLoadError {
    pub fn layout_mismatch(expected: StageLayout, found: StageLayout) -> Self {
        Self::LayoutMismatch {
            expected: expected.as_str(),
            found: found.as_str(),
        }
    }
}
