use std::{
    collections::HashSet,
    fmt,
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use serde::{de::DeserializeOwned, Serialize};
use zip::{result::ZipError, write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

use super::{
    header::{Codec, EntryHeader, SIZE_HEADER},
    CacheKey,
};
use crate::{error::CacheError, Result};

/// File extension of cache entries
pub const ENTRY_EXTENSION: &str = "sqc";

/// zstd compression level for entry payloads
const LEVEL: i32 = 3;

/// On-disk storage for cache entries: one file per key in a single directory
///
/// Entries are laid out as `<dir>/<hex-digest>.sqc`. The store performs no locking
/// and never deletes entries on its own; see [`CacheStore::clear`] for housekeeping.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
    codec: Codec,
}
impl CacheStore {
    /// Opens a store rooted at `dir`, creating the directory if it is missing
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            fs::create_dir_all(&dir).map_err(|source| CacheError::CreateDir {
                path: dir.clone(),
                source,
            })?;
            log::debug!("Created cache directory {}", dir.display());
        }
        Ok(Self {
            dir,
            codec: Codec::default(),
        })
    }

    /// Sets the payload codec for entries written from now on
    #[must_use]
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry file for `key`
    #[must_use]
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.path_for(key).is_file()
    }

    /// Loads the value stored under `key`
    ///
    /// Returns `Ok(None)` if no entry exists. A present but unreadable or damaged
    /// entry is returned as an error so the caller can decide how to treat it.
    pub fn load<V: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<V>> {
        let path = self.path_for(key);
        let buffer = match fs::read(&path) {
            Ok(buffer) => buffer,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Read { path, source }.into()),
        };
        decode_entry(&buffer).map(Some)
    }

    /// Persists `value` under `key`, replacing any existing entry
    pub fn save<V: Serialize>(&self, key: &CacheKey, value: &V) -> Result<()> {
        let buffer = encode_entry(value, self.codec)?;
        let path = self.path_for(key);
        fs::write(&path, &buffer).map_err(|source| CacheError::Write { path, source })?;
        Ok(())
    }

    /// Removes the entry for `key`, returning whether one existed
    pub fn remove(&self, key: &CacheKey) -> Result<bool> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Lists the keys of all entries currently in the directory
    ///
    /// Files that are not cache entries are ignored.
    pub fn keys(&self) -> Result<Vec<CacheKey>> {
        let mut keys = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            if let Some(key) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(CacheKey::from_hex)
            {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Deletes every entry in the directory and returns how many were removed
    ///
    /// Other files in the directory are left untouched.
    pub fn clear(&self) -> Result<usize> {
        let keys = self.keys()?;
        let mut removed = 0;
        for key in &keys {
            if self.remove(key)? {
                removed += 1;
            }
        }
        log::info!(
            "Removed {removed} cache entries from {}",
            self.dir.display()
        );
        Ok(removed)
    }

    /// Moves every entry last modified at least `age` ago into the zip archive at `zip_path`
    ///
    /// An existing archive is appended to, and entries it already holds are not written
    /// twice. Archived entries are removed from the store. Returns the number of entries
    /// moved; no archive is created when nothing is old enough.
    pub fn archive_older_than<P: AsRef<Path>>(&self, age: Duration, zip_path: P) -> Result<usize> {
        let zip_path = zip_path.as_ref();
        let now = SystemTime::now();
        let mut aged = Vec::new();
        for key in self.keys()? {
            let path = self.path_for(&key);
            let modified = fs::metadata(&path)?.modified()?;
            // entries stamped in the future count as fresh
            if now.duration_since(modified).unwrap_or_default() >= age {
                aged.push((key, path));
            }
        }
        if aged.is_empty() {
            log::debug!("No cache entries in {} to archive", self.dir.display());
            return Ok(0);
        }

        let archive_error = |source: ZipError| CacheError::Archive {
            path: zip_path.to_path_buf(),
            source,
        };
        let (mut writer, archived) = if zip_path.is_file() {
            let handle = OpenOptions::new().read(true).write(true).open(zip_path)?;
            let archived: HashSet<String> = ZipArchive::new(&handle)
                .map_err(archive_error)?
                .file_names()
                .map(str::to_string)
                .collect();
            (ZipWriter::new_append(handle).map_err(archive_error)?, archived)
        } else {
            (ZipWriter::new(fs::File::create(zip_path)?), HashSet::new())
        };

        // payloads are already compressed
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (key, path) in &aged {
            let name = format!("{key}.{ENTRY_EXTENSION}");
            if archived.contains(&name) {
                continue;
            }
            writer
                .start_file(name.as_str(), options)
                .map_err(archive_error)?;
            writer.write_all(&fs::read(path)?)?;
        }
        writer.finish().map_err(archive_error)?;

        for (key, _) in &aged {
            self.remove(key)?;
        }
        log::info!(
            "Archived {} cache entries from {} into {}",
            aged.len(),
            self.dir.display(),
            zip_path.display()
        );
        Ok(aged.len())
    }
}

fn encode_error(e: impl fmt::Display) -> CacheError {
    CacheError::Encode(e.to_string())
}

fn decode_error(e: impl fmt::Display) -> CacheError {
    CacheError::Decode(e.to_string())
}

fn encode_entry<V: Serialize>(value: &V, codec: Codec) -> Result<Vec<u8>> {
    let payload = match codec {
        Codec::Json => serde_json::to_vec(value).map_err(encode_error)?,
        Codec::ZstdJson => {
            let json = serde_json::to_vec(value).map_err(encode_error)?;
            zstd::encode_all(json.as_slice(), LEVEL).map_err(encode_error)?
        }
        Codec::ZstdBincode => {
            let raw = bincode::serialize(value).map_err(encode_error)?;
            zstd::encode_all(raw.as_slice(), LEVEL).map_err(encode_error)?
        }
    };
    let mut buffer = Vec::with_capacity(SIZE_HEADER + payload.len());
    EntryHeader::new(codec, payload.len() as u64).write_bytes(&mut buffer)?;
    buffer.extend_from_slice(&payload);
    Ok(buffer)
}

fn decode_entry<V: DeserializeOwned>(buffer: &[u8]) -> Result<V> {
    let header = EntryHeader::from_buffer(buffer)?;
    let payload = &buffer[SIZE_HEADER..];
    let expected = usize::try_from(header.payload_len)
        .map_err(|_| CacheError::Decode(format!("payload length {}", header.payload_len)))?;
    if payload.len() < expected {
        return Err(CacheError::Truncated(payload.len(), expected).into());
    }
    let payload = &payload[..expected];
    let value = match header.codec {
        Codec::Json => serde_json::from_slice(payload).map_err(decode_error)?,
        Codec::ZstdJson => {
            let json = zstd::decode_all(payload).map_err(decode_error)?;
            serde_json::from_slice(&json).map_err(decode_error)?
        }
        Codec::ZstdBincode => {
            let raw = zstd::decode_all(payload).map_err(decode_error)?;
            bincode::deserialize(&raw).map_err(decode_error)?
        }
    };
    Ok(value)
}
