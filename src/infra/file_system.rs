use std::fs;
use std::io;
use std::path::Path;

use log::debug;

/// Decodes bytes as Latin-1. Every byte value is a valid Latin-1 code point,
/// so this conversion cannot fail.
fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Reads a file as text: UTF-8 first, Latin-1 as the best-effort fallback.
/// Only actual I/O failures surface as errors; decoding always succeeds.
pub fn read_text_file(path: &Path) -> io::Result<String> {
    debug!("Reading file contents: {}", path.display());
    let bytes = fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            debug!("Not valid UTF-8, falling back to Latin-1: {}", path.display());
            Ok(latin1_to_string(err.as_bytes()))
        }
    }
}

/// Converts a path to a forward-slash string, the portable form used for
/// snapshot headers and archive entry names.
pub fn to_unix_path(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}
