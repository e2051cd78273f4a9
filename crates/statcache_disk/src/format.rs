// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Pluggable on-disk encodings.
//!
//! A [`FileFormat`] turns values into bytes and back. The plain formats ([`JsonFormat`],
//! [`BincodeFormat`]) can be wrapped by [`Compressed`] to shrink files and by [`Locked`] to
//! guard each file with an advisory lock. When both are used, [`Locked`] goes outermost:
//! it owns the file handle and hands the locked file to the formats it wraps.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Error raised by a [`FileFormat`] while reading or writing a cache file.
#[ohno::error]
#[display("failed to {action} cache file")]
pub struct FormatError {
    action: &'static str,
}

impl FormatError {
    /// Creates an error for a failed `action` ("parse", "write", ...) caused by `error`.
    ///
    /// Lets formats defined outside this crate report their failures.
    pub fn failed(action: &'static str, error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(action, error)
    }
}

/// Encodes and decodes values of type `T`.
///
/// Implementations must be deterministic and round-trip-safe: parsing what `format`
/// produced yields an equal value.
pub trait FileFormat<T>: Send + Sync {
    /// Decodes a value from `reader`.
    ///
    /// # Errors
    ///
    /// Returns an error when the bytes cannot be read or do not decode.
    fn parse(&self, reader: &mut dyn Read) -> Result<T, FormatError>;

    /// Encodes `value` into `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error when the value cannot be encoded or written.
    fn format(&self, value: &T, writer: &mut dyn Write) -> Result<(), FormatError>;

    /// File extension, including the leading dot.
    fn extension(&self) -> String;

    /// Decodes the file at `path`, or returns `None` when there is no such file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be opened or decoded.
    fn parse_path(&self, path: &Path) -> Result<Option<T>, FormatError> {
        let Some(file) = open_existing(path)? else {
            return Ok(None);
        };
        self.parse(&mut BufReader::new(file)).map(Some)
    }

    /// Encodes `value` into the file at `path`, replacing its content.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be created or written.
    fn format_path(&self, value: &T, path: &Path) -> Result<(), FormatError> {
        let file = File::create(path).map_err(|e| FormatError::caused_by("create", e))?;
        let mut writer = BufWriter::new(file);
        self.format(value, &mut writer)?;
        writer.flush().map_err(|e| FormatError::caused_by("write", e))
    }

    /// Deletes the file at `path` if the value it holds is `stale`.
    ///
    /// The file is decoded again right before the delete, so a value rewritten since the
    /// caller last read it survives. Returns `true` when the file was deleted. A missing file
    /// is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read, decoded or deleted.
    fn remove_path_if(&self, path: &Path, stale: &dyn Fn(&T) -> bool) -> Result<bool, FormatError> {
        match self.parse_path(path)? {
            Some(value) if stale(&value) => remove_existing(path),
            _ => Ok(false),
        }
    }
}

impl<T, F> FileFormat<T> for Box<F>
where
    F: FileFormat<T> + ?Sized,
{
    fn parse(&self, reader: &mut dyn Read) -> Result<T, FormatError> {
        (**self).parse(reader)
    }

    fn format(&self, value: &T, writer: &mut dyn Write) -> Result<(), FormatError> {
        (**self).format(value, writer)
    }

    fn extension(&self) -> String {
        (**self).extension()
    }

    fn parse_path(&self, path: &Path) -> Result<Option<T>, FormatError> {
        (**self).parse_path(path)
    }

    fn format_path(&self, value: &T, path: &Path) -> Result<(), FormatError> {
        (**self).format_path(value, path)
    }

    fn remove_path_if(&self, path: &Path, stale: &dyn Fn(&T) -> bool) -> Result<bool, FormatError> {
        (**self).remove_path_if(path, stale)
    }
}

fn remove_existing(path: &Path) -> Result<bool, FormatError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(FormatError::caused_by("delete", e)),
    }
}

fn open_existing(path: &Path) -> Result<Option<File>, FormatError> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FormatError::caused_by("open", e)),
    }
}

/// Human-readable JSON encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonFormat;

impl<T> FileFormat<T> for JsonFormat
where
    T: Serialize + DeserializeOwned,
{
    fn parse(&self, reader: &mut dyn Read) -> Result<T, FormatError> {
        serde_json::from_reader(reader).map_err(|e| FormatError::caused_by("parse", e))
    }

    fn format(&self, value: &T, writer: &mut dyn Write) -> Result<(), FormatError> {
        serde_json::to_writer(writer, value).map_err(|e| FormatError::caused_by("format", e))
    }

    fn extension(&self) -> String {
        ".json".to_string()
    }
}

/// Compact binary encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BincodeFormat;

impl<T> FileFormat<T> for BincodeFormat
where
    T: Serialize + DeserializeOwned,
{
    fn parse(&self, reader: &mut dyn Read) -> Result<T, FormatError> {
        bincode::deserialize_from(reader).map_err(|e| FormatError::caused_by("parse", e))
    }

    fn format(&self, value: &T, writer: &mut dyn Write) -> Result<(), FormatError> {
        bincode::serialize_into(writer, value).map_err(|e| FormatError::caused_by("format", e))
    }

    fn extension(&self) -> String {
        ".bin".to_string()
    }
}

/// Wraps a format with zstd compression.
///
/// Appends `.zst` to the inner format's extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Compressed<F> {
    inner: F,
    level: i32,
}

impl<F> Compressed<F> {
    /// Compresses `inner` at zstd's default level.
    pub fn new(inner: F) -> Self {
        Self::with_level(inner, zstd::DEFAULT_COMPRESSION_LEVEL)
    }

    /// Compresses `inner` at the given zstd level.
    pub fn with_level(inner: F, level: i32) -> Self {
        Self { inner, level }
    }
}

impl<T, F> FileFormat<T> for Compressed<F>
where
    F: FileFormat<T>,
{
    fn parse(&self, reader: &mut dyn Read) -> Result<T, FormatError> {
        let mut decoder = zstd::Decoder::new(reader).map_err(|e| FormatError::caused_by("decompress", e))?;
        self.inner.parse(&mut decoder)
    }

    fn format(&self, value: &T, writer: &mut dyn Write) -> Result<(), FormatError> {
        let mut encoder = zstd::Encoder::new(writer, self.level).map_err(|e| FormatError::caused_by("compress", e))?;
        self.inner.format(value, &mut encoder)?;
        encoder
            .finish()
            .map(drop)
            .map_err(|e| FormatError::caused_by("compress", e))
    }

    fn extension(&self) -> String {
        format!("{}.zst", self.inner.extension())
    }
}

/// Wraps a format with advisory file locking.
///
/// Reads hold a shared lock and writes an exclusive one for the whole duration of the
/// transfer, so concurrent processes sharing a cache directory never observe a partially
/// written file. Locks are released when the file handle closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Locked<F> {
    inner: F,
}

impl<F> Locked<F> {
    /// Locks every file accessed through `inner`.
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<T, F> FileFormat<T> for Locked<F>
where
    F: FileFormat<T>,
{
    fn parse(&self, reader: &mut dyn Read) -> Result<T, FormatError> {
        self.inner.parse(reader)
    }

    fn format(&self, value: &T, writer: &mut dyn Write) -> Result<(), FormatError> {
        self.inner.format(value, writer)
    }

    fn extension(&self) -> String {
        self.inner.extension()
    }

    fn parse_path(&self, path: &Path) -> Result<Option<T>, FormatError> {
        let Some(file) = open_existing(path)? else {
            return Ok(None);
        };
        file.lock_shared().map_err(|e| FormatError::caused_by("lock", e))?;
        self.inner.parse(&mut BufReader::new(&file)).map(Some)
    }

    fn format_path(&self, value: &T, path: &Path) -> Result<(), FormatError> {
        // Truncating before the lock is held would clobber a concurrent reader.
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| FormatError::caused_by("create", e))?;
        file.lock().map_err(|e| FormatError::caused_by("lock", e))?;
        file.set_len(0).map_err(|e| FormatError::caused_by("truncate", e))?;

        let mut writer = BufWriter::new(&file);
        self.inner.format(value, &mut writer)?;
        writer.flush().map_err(|e| FormatError::caused_by("write", e))
    }

    fn remove_path_if(&self, path: &Path, stale: &dyn Fn(&T) -> bool) -> Result<bool, FormatError> {
        let Some(file) = open_existing(path)? else {
            return Ok(false);
        };
        // Held until the delete, so no writer can slip a fresh value in after the check.
        file.lock().map_err(|e| FormatError::caused_by("lock", e))?;
        let value = self.inner.parse(&mut BufReader::new(&file))?;

        if stale(&value) {
            remove_existing(path)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use ohno::ErrorExt;

    use super::*;

    fn round_trip<F: FileFormat<Vec<String>>>(format: &F) -> Vec<String> {
        let value = vec!["ECB".to_string(), "EXR".to_string()];
        let mut bytes = Vec::new();
        format.format(&value, &mut bytes).expect("format");
        format.parse(&mut Cursor::new(bytes)).expect("parse")
    }

    #[test]
    fn formats_decode_what_they_encode() {
        let expected = vec!["ECB".to_string(), "EXR".to_string()];
        assert_eq!(round_trip(&JsonFormat), expected);
        assert_eq!(round_trip(&BincodeFormat), expected);
        assert_eq!(round_trip(&Compressed::new(JsonFormat)), expected);
        assert_eq!(round_trip(&Locked::new(Compressed::new(BincodeFormat))), expected);
    }

    #[test]
    fn extensions_compose() {
        assert_eq!(FileFormat::<u8>::extension(&JsonFormat), ".json");
        assert_eq!(FileFormat::<u8>::extension(&Compressed::new(BincodeFormat)), ".bin.zst");
        assert_eq!(FileFormat::<u8>::extension(&Locked::new(Compressed::new(JsonFormat))), ".json.zst");
    }

    #[test]
    fn compressed_output_is_not_plain_json() {
        let mut bytes = Vec::new();
        Compressed::new(JsonFormat)
            .format(&"a".repeat(1_000), &mut bytes)
            .expect("format");
        assert!(bytes.len() < 1_000);
        assert!(serde_json::from_slice::<String>(&bytes).is_err());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = FileFormat::<Vec<u32>>::parse(&JsonFormat, &mut Cursor::new(b"{not json".to_vec())).unwrap_err();
        assert!(err.message().starts_with("failed to parse cache file"), "{}", err.message());
    }

    #[test]
    fn missing_file_parses_to_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        assert!(FileFormat::<u32>::parse_path(&Locked::new(JsonFormat), &path).expect("parse").is_none());
        assert!(FileFormat::<u32>::parse_path(&JsonFormat, &path).expect("parse").is_none());
    }

    #[test]
    fn locked_rewrite_replaces_longer_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("entry.json");
        let format = Locked::new(JsonFormat);

        format.format_path(&"a much longer first value".to_string(), &path).expect("first write");
        format.format_path(&"short".to_string(), &path).expect("second write");

        let back: Option<String> = format.parse_path(&path).expect("parse");
        assert_eq!(back.as_deref(), Some("short"));
    }

    #[test]
    fn removal_rechecks_the_current_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stale = |value: &String| value == "old";

        let formats: [Box<dyn FileFormat<String>>; 2] = [Box::new(Locked::new(JsonFormat)), Box::new(JsonFormat)];
        for format in formats {
            let path = dir.path().join("entry.json");
            format.format_path(&"old".to_string(), &path).expect("first write");
            format.format_path(&"new".to_string(), &path).expect("rewrite");

            assert!(!format.remove_path_if(&path, &stale).expect("remove"));
            assert!(path.exists());

            format.format_path(&"old".to_string(), &path).expect("stale write");
            assert!(format.remove_path_if(&path, &stale).expect("remove"));
            assert!(!path.exists());
            assert!(!format.remove_path_if(&path, &stale).expect("missing file"));
        }
    }
}
