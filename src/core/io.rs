//! Output file staging
//!
//! Converted saves are written to a hidden sibling file and renamed over the
//! destination only after every byte has been written and synced. If a
//! conversion fails, the partial file is removed when the `StagedFile` is
//! dropped and the destination is left as it was.
//!
//! A staged file that must not replace an existing destination is promoted
//! with a hard link instead of a rename, so a file that appeared while the
//! conversion ran is reported rather than overwritten.

use crate::error::{ConvertError, Result, ValidationFailure};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct StagedFile {
    writer: Option<BufWriter<File>>,
    partial: PathBuf,
    destination: PathBuf,
    overwrite: bool,
    written: u64,
}

impl StagedFile {
    /// Create (or truncate) the partial file for `destination`
    pub fn create<P: AsRef<Path>>(destination: P, capacity: usize) -> Result<Self> {
        let destination = destination.as_ref().to_path_buf();
        let partial = partial_path(&destination)?;

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&partial)
            .map_err(|e| ConvertError::io(&partial, e))?;

        debug!("Staging output for {:?} in {:?}", destination, partial);

        Ok(StagedFile {
            writer: Some(BufWriter::with_capacity(capacity.max(1), file)),
            partial,
            destination,
            overwrite: true,
            written: 0,
        })
    }

    /// Whether commit may replace an existing destination (default: true)
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Write all of `data`, mapping failures to the destination path
    pub fn write_chunk(&mut self, data: &[u8]) -> Result<()> {
        self.write_all(data)
            .map_err(|e| ConvertError::io(&self.destination, e))
    }

    pub fn partial_path(&self) -> &Path {
        &self.partial
    }

    /// Flush, sync and move the partial file to the destination
    ///
    /// Without overwrite, an existing destination fails the commit with
    /// [`ValidationFailure::DestinationExists`] and is left untouched.
    pub fn commit(mut self) -> Result<u64> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => return Ok(self.written),
        };

        if let Err(e) = finish(writer, &self.partial, &self.destination, self.overwrite) {
            let _ = std::fs::remove_file(&self.partial);
            return Err(e);
        }

        debug!("Wrote {} bytes to {:?}", self.written, self.destination);
        Ok(self.written)
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "staged file already committed")
        })?;
        let n = writer.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        // Uncommitted: discard what was written
        if let Some(writer) = self.writer.take() {
            drop(writer);
            if let Err(e) = std::fs::remove_file(&self.partial) {
                debug!("Could not remove partial file {:?}: {}", self.partial, e);
            } else {
                debug!("Discarded partial output {:?}", self.partial);
            }
        }
    }
}

fn finish(
    writer: BufWriter<File>,
    partial: &Path,
    destination: &Path,
    overwrite: bool,
) -> Result<()> {
    let file = writer
        .into_inner()
        .map_err(|e| ConvertError::io(partial, e.into_error()))?;
    file.sync_all().map_err(|e| ConvertError::io(partial, e))?;
    drop(file);

    if overwrite {
        return std::fs::rename(partial, destination)
            .map_err(|e| ConvertError::io(destination, e));
    }

    match std::fs::hard_link(partial, destination) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(exists(destination)),
        Err(e) => {
            debug!("Hard link to {:?} failed ({}), copying instead", destination, e);
            copy_new(partial, destination)?;
        }
    }
    if let Err(e) = std::fs::remove_file(partial) {
        debug!("Could not remove partial file {:?}: {}", partial, e);
    }
    Ok(())
}

/// Copy `partial` into a destination that must not exist yet
fn copy_new(partial: &Path, destination: &Path) -> Result<()> {
    let mut target = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => exists(destination),
            _ => ConvertError::io(destination, e),
        })?;

    let copied = File::open(partial)
        .and_then(|mut source| std::io::copy(&mut source, &mut target))
        .and_then(|_| target.sync_all());
    if let Err(e) = copied {
        drop(target);
        let _ = std::fs::remove_file(destination);
        return Err(ConvertError::io(destination, e));
    }
    Ok(())
}

fn exists(destination: &Path) -> ConvertError {
    ValidationFailure::DestinationExists {
        path: destination.to_path_buf(),
    }
    .into()
}

/// `dir/.name.partial` for `dir/name`
fn partial_path(destination: &Path) -> Result<PathBuf> {
    let name = destination.file_name().ok_or_else(|| {
        ConvertError::io(
            destination,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "destination has no file name",
            ),
        )
    })?;

    let mut partial_name = std::ffi::OsString::from(".");
    partial_name.push(name);
    partial_name.push(".partial");

    Ok(destination.with_file_name(partial_name))
}
