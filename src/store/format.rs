//! Store file codec
//!
//! Encoding, validation and atomic replacement of store files.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{NovelError, Result};

/// Magic bytes at the start of every store file
pub const MAGIC: &[u8; 4] = b"NVST";

/// Current on-disk format version
pub const VERSION: u16 = 1;

/// Header size: magic (4) + version (2) + body length (4)
pub const HEADER_SIZE: usize = 10;

/// Footer size: CRC32 of the body
const FOOTER_SIZE: usize = 4;

/// All regions of a store: region → (key → value bytes)
pub type Regions = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// Encode regions into a complete store file image
pub fn encode(regions: &Regions) -> Result<Vec<u8>> {
    let body = bincode::serialize(regions)?;

    let mut out = Vec::with_capacity(HEADER_SIZE + body.len() + FOOTER_SIZE);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_be_bytes());
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
    out.extend_from_slice(&crc32fast::hash(&body).to_be_bytes());

    Ok(out)
}

/// Decode and validate a store file image
///
/// `path` is only used to label corruption errors.
pub fn decode(path: &Path, bytes: &[u8]) -> Result<Regions> {
    let corrupt = |reason: String| NovelError::Corruption {
        path: path.to_path_buf(),
        reason,
    };

    if bytes.len() < HEADER_SIZE + FOOTER_SIZE {
        return Err(corrupt(format!(
            "file too short: {} bytes",
            bytes.len()
        )));
    }

    if &bytes[0..4] != MAGIC {
        return Err(corrupt(format!(
            "bad magic: {:02x}{:02x}{:02x}{:02x}",
            bytes[0], bytes[1], bytes[2], bytes[3]
        )));
    }

    let version = u16::from_be_bytes([bytes[4], bytes[5]]);
    if version != VERSION {
        return Err(corrupt(format!("unsupported version {}", version)));
    }

    let body_len = u32::from_be_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
    let expected = HEADER_SIZE + body_len + FOOTER_SIZE;
    if bytes.len() != expected {
        return Err(corrupt(format!(
            "length mismatch: expected {} bytes, got {}",
            expected,
            bytes.len()
        )));
    }

    let body = &bytes[HEADER_SIZE..HEADER_SIZE + body_len];
    let stored = &bytes[HEADER_SIZE + body_len..];
    let stored_crc = u32::from_be_bytes([stored[0], stored[1], stored[2], stored[3]]);
    let actual_crc = crc32fast::hash(body);
    if stored_crc != actual_crc {
        return Err(corrupt(format!(
            "checksum mismatch: expected 0x{:08x}, got 0x{:08x}",
            stored_crc, actual_crc
        )));
    }

    Ok(bincode::deserialize(body)?)
}

/// Read a store file; a missing file is an empty store
pub fn read_file(path: &Path) -> Result<Regions> {
    match fs::read(path) {
        Ok(bytes) => decode(path, &bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Regions::new()),
        Err(e) => Err(e.into()),
    }
}

/// Encode and atomically replace a store file
pub fn write_file(path: &Path, regions: &Regions) -> Result<()> {
    let bytes = encode(regions)?;
    write_atomic(path, &bytes)
}

/// Replace `path` with `bytes` so that readers see either the old or the
/// new content, never a partial write
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    sync_parent(path);
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Persist the rename itself (directory entry)
#[cfg(unix)]
fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}

/// Directories cannot be opened for syncing off unix
#[cfg(not(unix))]
fn sync_parent(_path: &Path) {}
