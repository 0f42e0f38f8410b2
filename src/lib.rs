//! # N64 Save Converter
//!
//! Converts Nintendo 64 emulator save files into the layout another
//! emulator expects, and names the result after the cartridge it belongs to:
//!
//! - **Cartridge identification**: detects `.z64`/`.n64`/`.v64` byte order
//!   from the header magic, extracts the internal title and hashes the image
//! - **Save transformation**: 32-bit word swapping for SRAM and FlashRAM,
//!   controller pak expansion to four ports, plain copies for EEPROM
//! - **Safe output**: nothing is left on disk when a conversion fails
//!
//! Output files are named `<title>-<SHA256><ext>`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use n64_save_converter::{Result, SaveConverter};
//!
//! # fn main() -> Result<()> {
//! let converter = SaveConverter::new();
//! let conversion = converter.convert("Mario.sra", "Mario.z64", ".")?;
//! println!("wrote {}", conversion.output_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Limits
//!
//! ```rust,no_run
//! use n64_save_converter::{ConverterBuilder, Result};
//!
//! # fn main() -> Result<()> {
//! let converter = ConverterBuilder::new()
//!     .max_cartridge_size(128 * 1024 * 1024)
//!     .overwrite_existing(false)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

pub mod core;

// Re-export core modules internally so crate:: paths in core still work
#[allow(unused_imports)]
pub(crate) use crate::core::{config, error, header, identify, io, registry, transform, validation};

pub use crate::core::{
    config::ConverterConfig,
    error::{ConvertError, FileRole, Result, ValidationFailure},
    header::{ByteOrderMode, CartridgeHeader, HEADER_SIZE},
    identify::CartridgeIdentity,
    registry::{Normalization, SaveFormat, SaveKind},
    transform::{TransformPath, TransformReport},
};

use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Output file name for a save belonging to `identity`
///
/// `extension` is expected to carry its leading dot.
///
/// # Examples
///
/// ```
/// use n64_save_converter::{output_file_name, ByteOrderMode, CartridgeIdentity};
///
/// let identity = CartridgeIdentity {
///     clean_title: "SUPER MARIO 64".to_string(),
///     content_hash: "ABCD".to_string(),
///     byte_order: ByteOrderMode::Native,
/// };
/// assert_eq!(output_file_name(&identity, ".eep"), "SUPER MARIO 64-ABCD.eep");
/// ```
pub fn output_file_name(identity: &CartridgeIdentity, extension: &str) -> String {
    format!(
        "{}-{}{}",
        identity.clean_title, identity.content_hash, extension
    )
}

/// Result of one save conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub identity: CartridgeIdentity,
    pub save_kind: SaveKind,
    pub output_path: PathBuf,
    pub transform: TransformReport,
}

/// High-level converter
///
/// Validates both inputs, identifies the cartridge and converts the save
/// into the output directory under its derived name.
#[derive(Debug, Clone, Default)]
pub struct SaveConverter {
    config: ConverterConfig,
}

impl SaveConverter {
    /// Converter with default limits
    pub fn new() -> Self {
        SaveConverter {
            config: ConverterConfig::default(),
        }
    }

    /// Converter with a validated configuration
    pub fn with_config(config: ConverterConfig) -> Result<Self> {
        config.validate()?;
        Ok(SaveConverter { config })
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Identify a cartridge image without converting anything
    pub fn identify<P: AsRef<Path>>(&self, cartridge: P) -> Result<CartridgeIdentity> {
        let cartridge = cartridge.as_ref();
        validation::check_cartridge(cartridge, &self.config)?;
        identify::identify(cartridge, &self.config)
    }

    /// Compute the output path for a save/cartridge pair without writing
    pub fn output_path<P: AsRef<Path>, Q: AsRef<Path>, D: AsRef<Path>>(
        &self,
        save: P,
        cartridge: Q,
        output_dir: D,
    ) -> Result<PathBuf> {
        let (_, format) = validation::check_save(save.as_ref(), &self.config)?;
        let identity = self.identify(cartridge)?;
        Ok(output_dir
            .as_ref()
            .join(output_file_name(&identity, format.output_extension)))
    }

    /// Convert `save` for the cartridge at `cartridge` into `output_dir`
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use n64_save_converter::SaveConverter;
    ///
    /// let conversion = SaveConverter::new().convert("Zelda.fla", "Zelda.n64", "saves")?;
    /// println!("{} -> {}", conversion.save_kind, conversion.output_path.display());
    /// # Ok::<(), n64_save_converter::ConvertError>(())
    /// ```
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>, D: AsRef<Path>>(
        &self,
        save: P,
        cartridge: Q,
        output_dir: D,
    ) -> Result<Conversion> {
        let save = save.as_ref();
        let cartridge = cartridge.as_ref();

        let (_, format) = validation::check_save(save, &self.config)?;
        let identity = self.identify(cartridge)?;

        let output_path = output_dir
            .as_ref()
            .join(output_file_name(&identity, format.output_extension));
        validation::check_destination(&output_path, &self.config)?;
        if output_path.exists() {
            warn!("Replacing existing file {:?}", output_path);
        }

        let transform =
            transform::transform_file(save, &output_path, format.kind, &self.config)?;

        info!("File converted successfully: {:?}", output_path);
        Ok(Conversion {
            identity,
            save_kind: format.kind,
            output_path,
            transform,
        })
    }

    /// Convert an in-memory save payload for `kind`
    pub fn transform_bytes(&self, payload: &[u8], kind: SaveKind) -> Result<Vec<u8>> {
        if payload.len() as u64 > self.config.max_save_size {
            return Err(ValidationFailure::TooLarge {
                path: PathBuf::new(),
                role: FileRole::Save,
                size: payload.len() as u64,
                max: self.config.max_save_size,
            }
            .into());
        }
        transform::transform_bytes(payload, kind)
    }
}

/// Builder for [`SaveConverter`]
///
/// # Examples
///
/// ```
/// use n64_save_converter::ConverterBuilder;
///
/// let converter = ConverterBuilder::new()
///     .chunk_size(4096)
///     .build()
///     .unwrap();
/// assert_eq!(converter.config().chunk_size, 4096);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConverterBuilder {
    config: ConverterConfig,
}

impl ConverterBuilder {
    pub fn new() -> Self {
        ConverterBuilder {
            config: ConverterConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn config(mut self, config: ConverterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_save_size(mut self, bytes: u64) -> Self {
        self.config.max_save_size = bytes;
        self
    }

    pub fn max_cartridge_size(mut self, bytes: u64) -> Self {
        self.config.max_cartridge_size = bytes;
        self
    }

    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.config.chunk_size = bytes;
        self
    }

    pub fn overwrite_existing(mut self, overwrite: bool) -> Self {
        self.config.overwrite_existing = overwrite;
        self
    }

    /// Validate the configuration and build the converter
    pub fn build(self) -> Result<SaveConverter> {
        SaveConverter::with_config(self.config)
    }
}
