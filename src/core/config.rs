//! Converter limits and policies
//!
//! All fields have defaults, so an empty TOML document is a valid configuration:
//!
//! ```toml
//! max_save_size = 262144
//! max_cartridge_size = 67108864
//! chunk_size = 65536
//! overwrite_existing = true
//! ```

use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest save file accepted as input (256 KiB)
pub const DEFAULT_MAX_SAVE_SIZE: u64 = 256 * 1024;

/// Largest cartridge image accepted as input (64 MiB)
pub const DEFAULT_MAX_CARTRIDGE_SIZE: u64 = 64 * 1024 * 1024;

/// Buffer size for streamed hashing, swapping and copying
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Maximum save file size in bytes
    pub max_save_size: u64,

    /// Maximum cartridge image size in bytes
    pub max_cartridge_size: u64,

    /// Streaming buffer size in bytes (non-zero multiple of 4)
    pub chunk_size: usize,

    /// Replace an existing output file instead of refusing
    pub overwrite_existing: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            max_save_size: DEFAULT_MAX_SAVE_SIZE,
            max_cartridge_size: DEFAULT_MAX_CARTRIDGE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            overwrite_existing: true,
        }
    }
}

impl ConverterConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: ConverterConfig =
            toml::from_str(source).map_err(|e| ConvertError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
        Self::from_toml_str(&source)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| ConvertError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size % 4 != 0 {
            return Err(ConvertError::Config(format!(
                "chunk_size must be a non-zero multiple of 4, got {}",
                self.chunk_size
            )));
        }

        if self.max_save_size == 0 {
            return Err(ConvertError::Config(
                "max_save_size must be greater than zero".to_string(),
            ));
        }

        if self.max_cartridge_size == 0 {
            return Err(ConvertError::Config(
                "max_cartridge_size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
