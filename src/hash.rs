//! BLAKE3 digests of built archives

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use blake3::Hasher;

use crate::error::{Result, fs as fs_error};

/// Prefix of every rendered digest
pub const HASH_PREFIX: &str = "blake3:";

/// Calculate the BLAKE3 digest of a file
pub fn hash_file(path: &Path) -> Result<String> {
    let read_failed = |e: std::io::Error| fs_error::read_failed(path.display().to_string(), e.to_string());
    let file = File::open(path).map_err(read_failed)?;

    let mut reader = BufReader::new(file);
    let mut hasher = Hasher::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(read_failed)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{}{}", HASH_PREFIX, hasher.finalize().to_hex()))
}
