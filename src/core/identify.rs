//! Cartridge identification
//!
//! A cartridge is identified by its sanitized internal title and the
//! SHA-256 of the complete, unmodified image file.

use crate::config::ConverterConfig;
use crate::error::{ConvertError, FileRole, Result, ValidationFailure};
use crate::header::{ByteOrderMode, CartridgeHeader};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::{debug, info};

/// Identity of one cartridge image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeIdentity {
    /// ASCII letters, digits and spaces only, at most 20 characters
    pub clean_title: String,
    /// Uppercase hex SHA-256 of the whole file (64 characters)
    pub content_hash: String,
    /// Byte order the image was stored in
    pub byte_order: ByteOrderMode,
}

/// Read the header and hash the image at `path`
///
/// Files larger than `config.max_cartridge_size` are rejected before any
/// content is read.
pub fn identify<P: AsRef<Path>>(path: P, config: &ConverterConfig) -> Result<CartridgeIdentity> {
    let path = path.as_ref();
    info!("Identifying cartridge {:?}", path);

    let size = std::fs::metadata(path)
        .map_err(|e| ConvertError::io(path, e))?
        .len();
    if size > config.max_cartridge_size {
        return Err(ValidationFailure::TooLarge {
            path: path.to_path_buf(),
            role: FileRole::Cartridge,
            size,
            max: config.max_cartridge_size,
        }
        .into());
    }

    let header = {
        let mut file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
        CartridgeHeader::read_from(&mut file, path)?
    };

    let (byte_order, canonical) = header.to_canonical()?;
    let clean_title = canonical.clean_title();
    debug!("Detected {} image, title '{}'", byte_order, clean_title);

    // Hashed from a fresh handle so the digest covers the raw file
    let content_hash = hash_file(path, config.chunk_size)?;
    debug!("Cartridge SHA-256 {}", content_hash);

    Ok(CartridgeIdentity {
        clean_title,
        content_hash,
        byte_order,
    })
}

/// SHA-256 of a file as uppercase hex, read `chunk_size` bytes at a time
pub fn hash_file<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<String> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
    hash_reader(&mut file, chunk_size).map_err(|e| ConvertError::io(path, e))
}

/// SHA-256 of everything `reader` yields, as uppercase hex
pub fn hash_reader<R: Read>(reader: &mut R, chunk_size: usize) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
        total += n as u64;
    }

    debug!("Hashed {} bytes", total);
    Ok(format!("{:X}", hasher.finalize()))
}
