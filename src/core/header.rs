use crate::error::{ConvertError, Result};
use crate::registry;
use std::io::Read;
use std::path::Path;

/// Bytes read from the start of a cartridge image
pub const HEADER_SIZE: usize = 0x40;

/// Offset of the internal title in a big-endian header
pub const TITLE_OFFSET: usize = 0x20;

/// Length of the internal title field
pub const TITLE_LENGTH: usize = 20;

/// Byte order of a cartridge image
///
/// Big-endian is the console's native layout (`.z64`). Dumps from some
/// tools reverse every 32-bit word (`.n64`) or every 16-bit halfword (`.v64`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrderMode {
    Native,
    WordSwapped,
    HalfwordSwapped,
}

impl ByteOrderMode {
    /// Size of the group whose bytes are reversed, 1 for native order
    pub fn group_size(&self) -> usize {
        match self {
            ByteOrderMode::Native => 1,
            ByteOrderMode::WordSwapped => 4,
            ByteOrderMode::HalfwordSwapped => 2,
        }
    }

    /// Rewrite `bytes` into big-endian order in place
    ///
    /// Each transform is its own inverse. A trailing partial group is left
    /// untouched.
    pub fn to_big_endian(&self, bytes: &mut [u8]) {
        let group = self.group_size();
        if group == 1 {
            return;
        }
        for chunk in bytes.chunks_exact_mut(group) {
            chunk.reverse();
        }
    }
}

impl std::fmt::Display for ByteOrderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteOrderMode::Native => write!(f, "big-endian (z64)"),
            ByteOrderMode::WordSwapped => write!(f, "little-endian (n64)"),
            ByteOrderMode::HalfwordSwapped => write!(f, "byte-swapped (v64)"),
        }
    }
}

/// The first 64 bytes of a cartridge image, in whatever order they were stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartridgeHeader {
    bytes: [u8; HEADER_SIZE],
}

impl CartridgeHeader {
    pub fn new(bytes: [u8; HEADER_SIZE]) -> Self {
        CartridgeHeader { bytes }
    }

    /// Read exactly `HEADER_SIZE` bytes from `reader`
    ///
    /// `path` is only used for error context.
    pub fn read_from<R: Read>(reader: &mut R, path: &Path) -> Result<Self> {
        let mut buffer = Vec::with_capacity(HEADER_SIZE);
        reader
            .take(HEADER_SIZE as u64)
            .read_to_end(&mut buffer)
            .map_err(|e| ConvertError::io(path, e))?;

        if buffer.len() < HEADER_SIZE {
            return Err(ConvertError::HeaderTruncated {
                path: path.to_path_buf(),
                expected: HEADER_SIZE,
                actual: buffer.len(),
            });
        }

        let mut bytes = [0u8; HEADER_SIZE];
        bytes.copy_from_slice(&buffer);
        Ok(CartridgeHeader { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.bytes
    }

    pub fn magic(&self) -> [u8; 4] {
        [self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]]
    }

    /// Detect the byte order from the magic bytes
    pub fn byte_order(&self) -> Result<ByteOrderMode> {
        let magic = self.magic();
        registry::byte_order_for_magic(&magic)
            .ok_or(ConvertError::UnsupportedCartridgeFormat { magic })
    }

    /// Apply `mode`'s transform to a copy of this header
    pub fn normalized(&self, mode: ByteOrderMode) -> CartridgeHeader {
        let mut bytes = self.bytes;
        mode.to_big_endian(&mut bytes);
        CartridgeHeader { bytes }
    }

    /// Detect the byte order and return the big-endian header
    pub fn to_canonical(&self) -> Result<(ByteOrderMode, CartridgeHeader)> {
        let mode = self.byte_order()?;
        Ok((mode, self.normalized(mode)))
    }

    /// Raw title bytes; only meaningful on a canonical header
    pub fn title_field(&self) -> &[u8] {
        &self.bytes[TITLE_OFFSET..TITLE_OFFSET + TITLE_LENGTH]
    }

    /// Sanitized title; only meaningful on a canonical header
    pub fn clean_title(&self) -> String {
        clean_title(self.title_field())
    }
}

/// Strip trailing spaces, then keep only ASCII letters, digits and spaces
pub fn clean_title(field: &[u8]) -> String {
    let end = field
        .iter()
        .rposition(|&b| b != b' ')
        .map_or(0, |pos| pos + 1);

    field[..end]
        .iter()
        .filter(|b| b.is_ascii_alphanumeric() || **b == b' ')
        .map(|&b| b as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_with_title(title: &[u8]) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&[0x80, 0x37, 0x12, 0x40]);
        let field = &mut bytes[TITLE_OFFSET..TITLE_OFFSET + TITLE_LENGTH];
        field.fill(b' ');
        field[..title.len()].copy_from_slice(title);
        bytes
    }

    fn swap_groups(bytes: &[u8; HEADER_SIZE], group: usize) -> [u8; HEADER_SIZE] {
        let mut out = *bytes;
        for chunk in out.chunks_exact_mut(group) {
            chunk.reverse();
        }
        out
    }

    #[test]
    fn test_detect_all_magic_patterns() {
        let native = header_with_title(b"TEST");
        assert_eq!(
            CartridgeHeader::new(native).byte_order().unwrap(),
            ByteOrderMode::Native
        );
        assert_eq!(
            CartridgeHeader::new(swap_groups(&native, 4))
                .byte_order()
                .unwrap(),
            ByteOrderMode::WordSwapped
        );
        assert_eq!(
            CartridgeHeader::new(swap_groups(&native, 2))
                .byte_order()
                .unwrap(),
            ByteOrderMode::HalfwordSwapped
        );
    }

    #[test]
    fn test_unknown_magic_rejected() {
        let header = CartridgeHeader::new([0u8; HEADER_SIZE]);
        assert!(matches!(
            header.byte_order(),
            Err(ConvertError::UnsupportedCartridgeFormat { magic: [0, 0, 0, 0] })
        ));
    }

    #[test]
    fn test_native_normalization_is_identity() {
        let header = CartridgeHeader::new(header_with_title(b"ZELDA"));
        let (mode, canonical) = header.to_canonical().unwrap();
        assert_eq!(mode, ByteOrderMode::Native);
        assert_eq!(canonical, header);
    }

    #[test]
    fn test_swapped_headers_normalize_to_native() {
        let native = header_with_title(b"MARIO KART 64");
        for group in [2, 4] {
            let swapped = CartridgeHeader::new(swap_groups(&native, group));
            let (_, canonical) = swapped.to_canonical().unwrap();
            assert_eq!(canonical.as_bytes(), &native);
            assert_eq!(canonical.clean_title(), "MARIO KART 64");
        }
    }

    #[test]
    fn test_normalization_twice_restores_input() {
        let native = header_with_title(b"F ZERO X");
        for mode in [ByteOrderMode::WordSwapped, ByteOrderMode::HalfwordSwapped] {
            let header = CartridgeHeader::new(native);
            assert_eq!(header.normalized(mode).normalized(mode), header);
        }
    }

    #[test]
    fn test_clean_title_strips_specials_and_padding() {
        let header = CartridgeHeader::new(header_with_title(b"SUPER GAME!!  "));
        assert_eq!(header.clean_title(), "SUPER GAME");
    }

    #[test]
    fn test_clean_title_edge_cases() {
        assert_eq!(clean_title(b"                    "), "");
        assert_eq!(clean_title(b""), "");
        assert_eq!(clean_title(b"  LEADING"), "  LEADING");
        assert_eq!(clean_title(b"A-B_C.D"), "ABCD");
        assert_eq!(clean_title(&[b'P', 0xE9, b'K', b' ']), "PK");
        // Only trailing spaces are stripped before filtering
        assert_eq!(clean_title(b"GAME  \0\0"), "GAME  ");
    }

    #[test]
    fn test_read_from_short_input() {
        let data = [0x80u8, 0x37, 0x12, 0x40, 0, 0];
        let err = CartridgeHeader::read_from(&mut &data[..], Path::new("short.z64")).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::HeaderTruncated {
                expected: HEADER_SIZE,
                actual: 6,
                ..
            }
        ));
    }

    #[test]
    fn test_read_from_reads_only_header() {
        let mut data = header_with_title(b"LONG").to_vec();
        data.extend_from_slice(&[0xAA; 100]);
        let mut reader = &data[..];
        let header = CartridgeHeader::read_from(&mut reader, Path::new("rom.z64")).unwrap();
        assert_eq!(header.as_bytes(), &data[..HEADER_SIZE]);
        assert_eq!(reader.len(), 100);
    }
}
