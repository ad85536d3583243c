//! Loading files into buffers and writing buffers back to disk.
//!
//! Content is split on `\r\n` or `\n` when loaded and joined with `\n` when
//! saved. The file's encoding is detected on load and carried in the
//! buffer's [`SourceFile`] so a save writes the same encoding back.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::buffer::Buffer;
use crate::encoding::TextEncoding;

/// Where a buffer came from, and how to write it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub encoding: TextEncoding,
}

impl SourceFile {
    /// A UTF-8 source at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encoding: TextEncoding::default(),
        }
    }
}

/// Splits content into lines on `\r\n` or `\n`.
///
/// A trailing terminator produces a trailing empty line, and empty content
/// is a single empty line. A `\r` not followed by `\n` is line content.
pub fn split_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text
        .split_inclusive('\n')
        .map(|line| {
            line.strip_suffix("\r\n")
                .or_else(|| line.strip_suffix('\n'))
                .unwrap_or(line)
                .to_owned()
        })
        .collect();
    if text.is_empty() || text.ends_with('\n') {
        lines.push(String::new());
    }
    lines
}

/// Joins lines with a single `\n`.
pub fn join_lines(lines: &[String]) -> String {
    lines.join("\n")
}

/// Reads a file into a new buffer with the cursor on the first line.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded. Read failures
/// keep the underlying [`std::io::Error`] as the error source.
pub fn load(path: &Path) -> Result<Buffer> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read file: {}", path.display()))?;

    let encoding = TextEncoding::detect(&bytes);
    let text = encoding
        .decode(&bytes)
        .with_context(|| format!("failed to decode file: {}", path.display()))?;
    let lines = split_lines(&text);
    tracing::debug!(
        "Loaded {} ({encoding}, {} lines)",
        path.display(),
        lines.len()
    );

    let source = SourceFile {
        path: path.to_path_buf(),
        encoding,
    };
    Ok(Buffer::from_lines(lines, Some(source)))
}

/// Writes the buffer back to the file it was loaded from.
///
/// # Errors
///
/// Returns an error if the buffer has no source or the write fails.
pub fn save(buffer: &Buffer) -> Result<()> {
    let source = buffer
        .source()
        .context("no file path set for this buffer")?;
    write_encoded(buffer, &source.path, source.encoding)
}

/// Writes the buffer to `path`, using the source encoding if there is one.
///
/// # Errors
///
/// Returns an error if the content cannot be encoded or written.
pub fn save_to(buffer: &Buffer, path: &Path) -> Result<()> {
    let encoding = buffer
        .source()
        .map(|source| source.encoding)
        .unwrap_or_default();
    write_encoded(buffer, path, encoding)
}

/// Like [`save`], but first copies the existing file to `<path>.bak`.
///
/// # Errors
///
/// Returns an error if the backup copy or the write fails.
pub fn save_with_backup(buffer: &Buffer) -> Result<PathBuf> {
    let source = buffer
        .source()
        .context("no file path set for this buffer")?;
    let backup = backup_path(&source.path);
    if source.path.exists() {
        std::fs::copy(&source.path, &backup)
            .with_context(|| format!("failed to write backup: {}", backup.display()))?;
    }
    write_encoded(buffer, &source.path, source.encoding)?;
    Ok(backup)
}

/// `notes.txt` becomes `notes.txt.bak`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

fn write_encoded(buffer: &Buffer, path: &Path, encoding: TextEncoding) -> Result<()> {
    let bytes = encoding
        .encode(&join_lines(buffer.lines()))
        .context("failed to encode buffer for saving")?;
    std::fs::write(path, &bytes)
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    tracing::debug!("Saved {} ({encoding}, {} bytes)", path.display(), bytes.len());
    Ok(())
}
