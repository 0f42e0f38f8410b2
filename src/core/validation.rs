//! Boundary checks for input and output paths
//!
//! Inputs must exist, be regular files, stay under the configured size
//! ceiling, and carry an extension the registry recognizes for their role.

use crate::config::ConverterConfig;
use crate::error::{ConvertError, FileRole, Result, ValidationFailure};
use crate::registry::{self, SaveFormat};
use std::path::{Path, PathBuf};

/// An input path that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedInput {
    pub path: PathBuf,
    /// Dotted, lowercased extension
    pub extension: String,
    pub size: u64,
}

/// Validate a save file and resolve its registry entry
pub fn check_save(path: &Path, config: &ConverterConfig) -> Result<(CheckedInput, SaveFormat)> {
    let input = check_input(path, FileRole::Save, config.max_save_size)?;
    let format = registry::save_format(&input.extension)
        .copied()
        .ok_or_else(|| unsupported_extension(path, FileRole::Save, &input.extension))?;
    Ok((input, format))
}

/// Validate a cartridge image
pub fn check_cartridge(path: &Path, config: &ConverterConfig) -> Result<CheckedInput> {
    let input = check_input(path, FileRole::Cartridge, config.max_cartridge_size)?;
    if !registry::is_cartridge_extension(&input.extension) {
        return Err(unsupported_extension(
            path,
            FileRole::Cartridge,
            &input.extension,
        ));
    }
    Ok(input)
}

/// Apply the collision policy to an output path
pub fn check_destination(path: &Path, config: &ConverterConfig) -> Result<()> {
    if path.is_dir() {
        return Err(ValidationFailure::NotAFile {
            path: path.to_path_buf(),
        }
        .into());
    }
    if !config.overwrite_existing && path.exists() {
        return Err(ValidationFailure::DestinationExists {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(())
}

fn check_input(path: &Path, role: FileRole, max: u64) -> Result<CheckedInput> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => {
            return Err(ValidationFailure::NotAFile {
                path: path.to_path_buf(),
            }
            .into())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ValidationFailure::NotAFile {
                path: path.to_path_buf(),
            }
            .into())
        }
        Err(e) => return Err(ConvertError::io(path, e)),
    };

    let size = metadata.len();
    if size > max {
        return Err(ValidationFailure::TooLarge {
            path: path.to_path_buf(),
            role,
            size,
            max,
        }
        .into());
    }

    let extension = registry::extension_of(path).unwrap_or_default();

    Ok(CheckedInput {
        path: path.to_path_buf(),
        extension,
        size,
    })
}

fn unsupported_extension(path: &Path, role: FileRole, extension: &str) -> ConvertError {
    ValidationFailure::UnsupportedExtension {
        path: path.to_path_buf(),
        role,
        extension: extension.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SaveKind;

    #[test]
    fn test_check_save_resolves_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Game.SRA");
        std::fs::write(&path, [0u8; 16]).unwrap();

        let (input, format) = check_save(&path, &ConverterConfig::default()).unwrap();
        assert_eq!(input.extension, ".sra");
        assert_eq!(input.size, 16);
        assert_eq!(format.kind, SaveKind::Sram);
    }

    #[test]
    fn test_check_save_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.sav");
        std::fs::write(&path, [0u8; 16]).unwrap();

        let err = check_save(&path, &ConverterConfig::default()).unwrap_err();
        match err {
            ConvertError::Validation(ValidationFailure::UnsupportedExtension {
                role,
                extension,
                ..
            }) => {
                assert_eq!(role, FileRole::Save);
                assert_eq!(extension, ".sav");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_check_save_rejects_oversized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.eep");
        std::fs::write(&path, vec![0u8; 300]).unwrap();

        let config = ConverterConfig {
            max_save_size: 256,
            ..ConverterConfig::default()
        };
        assert!(matches!(
            check_save(&path, &config),
            Err(ConvertError::Validation(ValidationFailure::TooLarge { size: 300, .. }))
        ));
    }

    #[test]
    fn test_missing_and_directory_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConverterConfig::default();

        assert!(matches!(
            check_cartridge(&dir.path().join("missing.z64"), &config),
            Err(ConvertError::Validation(ValidationFailure::NotAFile { .. }))
        ));

        let subdir = dir.path().join("roms.z64");
        std::fs::create_dir(&subdir).unwrap();
        assert!(matches!(
            check_cartridge(&subdir, &config),
            Err(ConvertError::Validation(ValidationFailure::NotAFile { .. }))
        ));
    }

    #[test]
    fn test_check_cartridge_extension_gate() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConverterConfig::default();

        let rom = dir.path().join("game.v64");
        std::fs::write(&rom, [0u8; 64]).unwrap();
        assert_eq!(check_cartridge(&rom, &config).unwrap().extension, ".v64");

        let other = dir.path().join("game.bin");
        std::fs::write(&other, [0u8; 64]).unwrap();
        assert!(matches!(
            check_cartridge(&other, &config),
            Err(ConvertError::Validation(ValidationFailure::UnsupportedExtension {
                role: FileRole::Cartridge,
                ..
            }))
        ));
    }

    #[test]
    fn test_check_destination_policy() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.sra");

        let strict = ConverterConfig {
            overwrite_existing: false,
            ..ConverterConfig::default()
        };
        assert!(check_destination(&dest, &strict).is_ok());

        std::fs::write(&dest, b"old").unwrap();
        assert!(matches!(
            check_destination(&dest, &strict),
            Err(ConvertError::Validation(ValidationFailure::DestinationExists { .. }))
        ));
        assert!(check_destination(&dest, &ConverterConfig::default()).is_ok());
        assert!(check_destination(dir.path(), &ConverterConfig::default()).is_err());
    }
}
