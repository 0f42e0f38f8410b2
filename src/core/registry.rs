//! Static format tables
//!
//! Maps file extensions to save kinds and cartridge magic bytes to byte
//! orders. Extensions are matched case-insensitively and may be given with
//! or without the leading dot.

use crate::header::ByteOrderMode;
use std::path::Path;

/// Size of one controller pak image
pub const CONTROLLER_PAK_SIZE: usize = 32 * 1024;

/// Four controller paks, one per controller port
pub const CONTROLLER_PAK_CONTAINER_SIZE: usize = 4 * CONTROLLER_PAK_SIZE;

/// Cartridge header magic and the byte order it identifies
pub static MAGIC_TABLE: [([u8; 4], ByteOrderMode); 3] = [
    ([0x80, 0x37, 0x12, 0x40], ByteOrderMode::Native),
    ([0x40, 0x12, 0x37, 0x80], ByteOrderMode::WordSwapped),
    ([0x37, 0x80, 0x40, 0x12], ByteOrderMode::HalfwordSwapped),
];

/// Extensions accepted for cartridge images
pub static CARTRIDGE_EXTENSIONS: [&str; 3] = [".z64", ".n64", ".v64"];

/// Save media kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveKind {
    /// Battery-backed SRAM, stored word-swapped by the source emulator
    Sram,
    /// FlashRAM, stored word-swapped by the source emulator
    FlashRam,
    /// EEPROM, byte-identical between emulators
    Eeprom,
    /// Controller pak; a single pak image is expanded to all four ports
    ControllerPak,
}

/// Size normalization rule for a save kind
///
/// Payloads longer than `max_unit` are truncated and payloads no longer than
/// `min_unit` are zero-padded to it. A padded `min_unit` image is tiled into
/// the `container`-byte output; any larger payload is kept as-is and the
/// rest of the container is zero-filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalization {
    pub min_unit: usize,
    pub max_unit: usize,
    pub container: usize,
}

impl SaveKind {
    pub fn requires_byte_swap(&self) -> bool {
        matches!(self, SaveKind::Sram | SaveKind::FlashRam)
    }

    pub fn normalization(&self) -> Option<Normalization> {
        match self {
            SaveKind::ControllerPak => Some(Normalization {
                min_unit: CONTROLLER_PAK_SIZE,
                max_unit: CONTROLLER_PAK_CONTAINER_SIZE,
                container: CONTROLLER_PAK_CONTAINER_SIZE,
            }),
            SaveKind::Sram | SaveKind::FlashRam | SaveKind::Eeprom => None,
        }
    }

    /// Output size in bytes, 0 when the kind is not size-normalized
    pub fn target_container_size(&self) -> usize {
        self.normalization().map_or(0, |n| n.container)
    }

    /// Extension written for this kind
    pub fn canonical_extension(&self) -> &'static str {
        match self {
            SaveKind::Sram => ".sra",
            SaveKind::FlashRam => ".fla",
            SaveKind::Eeprom => ".eep",
            SaveKind::ControllerPak => ".mpk",
        }
    }
}

impl std::fmt::Display for SaveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SaveKind::Sram => "SRAM",
            SaveKind::FlashRam => "FlashRAM",
            SaveKind::Eeprom => "EEPROM",
            SaveKind::ControllerPak => "Controller Pak",
        };
        write!(f, "{}", name)
    }
}

/// A recognized save file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveFormat {
    pub extension: &'static str,
    pub kind: SaveKind,
    pub output_extension: &'static str,
}

/// Recognized save extensions. Legacy long-form names are written out under
/// the canonical short extension.
pub static SAVE_FORMATS: [SaveFormat; 8] = [
    SaveFormat {
        extension: ".sra",
        kind: SaveKind::Sram,
        output_extension: ".sra",
    },
    SaveFormat {
        extension: ".fla",
        kind: SaveKind::FlashRam,
        output_extension: ".fla",
    },
    SaveFormat {
        extension: ".eep",
        kind: SaveKind::Eeprom,
        output_extension: ".eep",
    },
    SaveFormat {
        extension: ".mpk",
        kind: SaveKind::ControllerPak,
        output_extension: ".mpk",
    },
    SaveFormat {
        extension: ".sram",
        kind: SaveKind::Sram,
        output_extension: ".sra",
    },
    SaveFormat {
        extension: ".flashram",
        kind: SaveKind::FlashRam,
        output_extension: ".fla",
    },
    SaveFormat {
        extension: ".eeprom",
        kind: SaveKind::Eeprom,
        output_extension: ".eep",
    },
    SaveFormat {
        extension: ".mempak",
        kind: SaveKind::ControllerPak,
        output_extension: ".mpk",
    },
];

/// Lowercase an extension and make sure it carries a leading dot
fn canonicalize(extension: &str) -> String {
    let lower = extension.to_ascii_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

/// Dotted, lowercased extension of a path
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(canonicalize)
}

pub fn save_format(extension: &str) -> Option<&'static SaveFormat> {
    let ext = canonicalize(extension);
    SAVE_FORMATS.iter().find(|f| f.extension == ext)
}

pub fn is_save_extension(extension: &str) -> bool {
    save_format(extension).is_some()
}

pub fn is_cartridge_extension(extension: &str) -> bool {
    let ext = canonicalize(extension);
    CARTRIDGE_EXTENSIONS.contains(&ext.as_str())
}

pub fn save_kind(extension: &str) -> Option<SaveKind> {
    save_format(extension).map(|f| f.kind)
}

pub fn output_extension(extension: &str) -> Option<&'static str> {
    save_format(extension).map(|f| f.output_extension)
}

pub fn byte_order_for_magic(magic: &[u8; 4]) -> Option<ByteOrderMode> {
    MAGIC_TABLE
        .iter()
        .find(|(pattern, _)| pattern == magic)
        .map(|(_, mode)| *mode)
}
