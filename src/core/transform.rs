//! Save data transformation
//!
//! Three paths, chosen from the save kind:
//!
//! - **ByteSwap**: reverse every 32-bit word, streamed in bounded chunks.
//!   The payload length must be a multiple of 4.
//! - **Normalize**: load the payload and fit it into a fixed-size container,
//!   tiling it when it holds a single unit.
//! - **DirectCopy**: byte-for-byte stream copy.
//!
//! File-based conversions write through [`StagedFile`], so a failed
//! conversion never leaves a partial destination behind.

use crate::config::ConverterConfig;
use crate::error::{ConvertError, FileRole, Result, ValidationFailure};
use crate::io::StagedFile;
use crate::registry::{Normalization, SaveKind};
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Which transformation a save kind goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformPath {
    ByteSwap,
    Normalize,
    DirectCopy,
}

impl TransformPath {
    pub fn for_kind(kind: SaveKind) -> Self {
        if kind.normalization().is_some() {
            TransformPath::Normalize
        } else if kind.requires_byte_swap() {
            TransformPath::ByteSwap
        } else {
            TransformPath::DirectCopy
        }
    }
}

impl std::fmt::Display for TransformPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformPath::ByteSwap => write!(f, "byte swap"),
            TransformPath::Normalize => write!(f, "size normalization"),
            TransformPath::DirectCopy => write!(f, "direct copy"),
        }
    }
}

/// Outcome of a file conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformReport {
    pub path: TransformPath,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

/// Reverse the byte order of every 32-bit word in place
pub fn swap_words(bytes: &mut [u8]) -> Result<()> {
    if bytes.len() % 4 != 0 {
        return Err(ConvertError::MisalignedSaveData {
            path: PathBuf::new(),
            length: bytes.len() as u64,
        });
    }
    for word in bytes.chunks_exact_mut(4) {
        word.reverse();
    }
    Ok(())
}

/// Fit `payload` into the container
///
/// The payload is truncated to `max_unit`. A payload no longer than
/// `min_unit` is zero-padded to it and that unit is repeated while whole
/// copies fit. A longer payload is already a multi-unit image and is kept
/// once. Any remaining tail is zero-filled, so the result is always exactly
/// `container` bytes.
pub fn normalize(payload: &[u8], rule: &Normalization) -> Vec<u8> {
    let mut unit = payload[..payload.len().min(rule.max_unit)].to_vec();
    let tile = unit.len() <= rule.min_unit;
    if tile {
        debug!("Padding {} byte unit to {}", unit.len(), rule.min_unit);
        unit.resize(rule.min_unit, 0);
    }

    let mut out = Vec::with_capacity(rule.container);
    if !tile || unit.is_empty() || unit.len() >= rule.container {
        out.extend_from_slice(&unit[..unit.len().min(rule.container)]);
    } else {
        while out.len() + unit.len() <= rule.container {
            out.extend_from_slice(&unit);
        }
    }
    out.resize(rule.container, 0);

    debug!(
        "Normalized {} byte payload into {} byte container (unit {}, tiled {})",
        payload.len(),
        rule.container,
        unit.len(),
        tile
    );
    out
}

/// Convert an in-memory payload for `kind`
///
/// Errors carry an empty path since there is no backing file.
pub fn transform_bytes(payload: &[u8], kind: SaveKind) -> Result<Vec<u8>> {
    transform_payload(payload, kind, Path::new(""))
}

fn transform_payload(payload: &[u8], kind: SaveKind, source: &Path) -> Result<Vec<u8>> {
    let mut out = match kind.normalization() {
        Some(rule) => {
            if payload.is_empty() {
                return Err(ConvertError::EmptySourceFile {
                    path: source.to_path_buf(),
                });
            }
            normalize(payload, &rule)
        }
        None => payload.to_vec(),
    };

    if kind.requires_byte_swap() {
        swap_words(&mut out).map_err(|e| match e {
            ConvertError::MisalignedSaveData { length, .. } => ConvertError::MisalignedSaveData {
                path: source.to_path_buf(),
                length,
            },
            other => other,
        })?;
    }

    Ok(out)
}

/// Stream `reader` to `writer`, reversing every 32-bit word
///
/// Returns the number of bytes written. Fails with `MisalignedSaveData` if
/// the input ends part-way through a word.
pub fn swap_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
    source: &Path,
    destination: &Path,
) -> Result<u64> {
    let mut buffer = vec![0u8; chunk_size.max(4) / 4 * 4];
    let mut pending = 0usize;
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buffer[pending..]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ConvertError::io(source, e)),
        };

        let filled = pending + n;
        let aligned = filled - filled % 4;
        for word in buffer[..aligned].chunks_exact_mut(4) {
            word.reverse();
        }
        writer
            .write_all(&buffer[..aligned])
            .map_err(|e| ConvertError::io(destination, e))?;

        buffer.copy_within(aligned..filled, 0);
        pending = filled - aligned;
        total += aligned as u64;
    }

    if pending != 0 {
        return Err(ConvertError::MisalignedSaveData {
            path: source.to_path_buf(),
            length: total + pending as u64,
        });
    }

    Ok(total)
}

/// Convert the save at `source` for `kind` and write it to `destination`
///
/// An existing destination is replaced only when `overwrite_existing` is
/// set; otherwise a destination present at commit time fails the conversion
/// with [`ValidationFailure::DestinationExists`]. The destination only
/// appears once the conversion has succeeded.
pub fn transform_file<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    destination: Q,
    kind: SaveKind,
    config: &ConverterConfig,
) -> Result<TransformReport> {
    let source = source.as_ref();
    let destination = destination.as_ref();
    let path = TransformPath::for_kind(kind);
    info!(
        "Converting {} save {:?} -> {:?} ({})",
        kind, source, destination, path
    );

    let size = std::fs::metadata(source)
        .map_err(|e| ConvertError::io(source, e))?
        .len();
    if size > config.max_save_size {
        return Err(too_large(source, size, config.max_save_size));
    }

    let mut input = File::open(source).map_err(|e| ConvertError::io(source, e))?;
    let stage = || -> Result<StagedFile> {
        Ok(StagedFile::create(destination, config.chunk_size)?
            .overwrite(config.overwrite_existing))
    };

    let (bytes_read, mut staged) = match path {
        TransformPath::Normalize => {
            let payload = read_bounded(&mut input, source, config.max_save_size)?;
            let out = transform_payload(&payload, kind, source)?;
            let mut staged = stage()?;
            staged.write_chunk(&out)?;
            (payload.len() as u64, staged)
        }
        TransformPath::ByteSwap => {
            let mut staged = stage()?;
            let n = swap_stream(
                &mut input,
                &mut staged,
                config.chunk_size,
                source,
                destination,
            )?;
            (n, staged)
        }
        TransformPath::DirectCopy => {
            let mut staged = stage()?;
            let n = copy_stream(&mut input, &mut staged, config.chunk_size, source, destination)?;
            (n, staged)
        }
    };

    staged
        .flush()
        .map_err(|e| ConvertError::io(destination, e))?;
    let bytes_written = staged.commit()?;

    debug!("Read {} bytes, wrote {} bytes", bytes_read, bytes_written);
    Ok(TransformReport {
        path,
        bytes_read,
        bytes_written,
    })
}

fn copy_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
    source: &Path,
    destination: &Path,
) -> Result<u64> {
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ConvertError::io(source, e)),
        };
        writer
            .write_all(&buffer[..n])
            .map_err(|e| ConvertError::io(destination, e))?;
        total += n as u64;
    }

    Ok(total)
}

/// Read the whole input, refusing to go past `max` bytes
fn read_bounded<R: Read>(reader: &mut R, source: &Path, max: u64) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    reader
        .take(max + 1)
        .read_to_end(&mut payload)
        .map_err(|e| ConvertError::io(source, e))?;

    if payload.len() as u64 > max {
        return Err(too_large(source, payload.len() as u64, max));
    }
    Ok(payload)
}

fn too_large(source: &Path, size: u64, max: u64) -> ConvertError {
    ValidationFailure::TooLarge {
        path: source.to_path_buf(),
        role: FileRole::Save,
        size,
        max,
    }
    .into()
}
