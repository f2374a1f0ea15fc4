use std::path::{Path, PathBuf};

/// Default directory holding one `<database>.json` file per database.
pub const DEFAULT_DATA_DIRECTORY: &str = "databases";

/// What row construction does with a literal that does not parse as the
/// column's numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiteralPolicy {
    /// Fail the statement with `DbError::InvalidLiteral`.
    #[default]
    Reject,
    /// Store the type's sentinel (`114514` / `114.514`) and log a warning.
    Substitute,
}

/// Engine-wide settings shared by the executor, storage and CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub data_directory: PathBuf,
    pub literal_policy: LiteralPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from(DEFAULT_DATA_DIRECTORY),
            literal_policy: LiteralPolicy::Reject,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_directory(mut self, directory: impl AsRef<Path>) -> Self {
        self.data_directory = directory.as_ref().to_path_buf();
        self
    }

    pub fn with_literal_policy(mut self, policy: LiteralPolicy) -> Self {
        self.literal_policy = policy;
        self
    }
}
