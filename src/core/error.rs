use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cartridge header is incomplete in {path:?}: expected {expected} bytes, got {actual}")]
    HeaderTruncated {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error(
        "Unsupported cartridge format based on magic bytes: {}",
        format_magic(.magic)
    )]
    UnsupportedCartridgeFormat { magic: [u8; 4] },

    #[error("Save data in {path:?} is not a multiple of 4 bytes (length {length})")]
    MisalignedSaveData { path: PathBuf, length: u64 },

    #[error("Save file {path:?} is empty")]
    EmptySourceFile { path: PathBuf },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Boundary checks applied to input and output paths before any conversion work
#[derive(Error, Debug)]
pub enum ValidationFailure {
    #[error("'{path:?}' is not a valid file path")]
    NotAFile { path: PathBuf },

    #[error("{role} file {path:?} is too large ({size} bytes, max {max})")]
    TooLarge {
        path: PathBuf,
        role: FileRole,
        size: u64,
        max: u64,
    },

    #[error("Unsupported {role} file extension '{extension}' for {path:?}")]
    UnsupportedExtension {
        path: PathBuf,
        role: FileRole,
        extension: String,
    },

    #[error("Output file {path:?} already exists")]
    DestinationExists { path: PathBuf },
}

/// Which input a validation failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Save,
    Cartridge,
}

impl std::fmt::Display for FileRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileRole::Save => write!(f, "save"),
            FileRole::Cartridge => write!(f, "cartridge"),
        }
    }
}

impl ConvertError {
    /// Attach a path to a bare I/O error
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}

fn format_magic(magic: &[u8; 4]) -> String {
    magic
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

pub type Result<T> = std::result::Result<T, ConvertError>;
