use std::path::Path;

/// Read a file and convert it to UTF-8 if needed.
///
/// Bank exports are often Windows-1252 / Latin-1; those bytes are decoded
/// instead of rejected. A UTF-8 BOM is left for the CSV reader to drop.
pub(crate) fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    Ok(decode_bytes(bytes))
}

fn decode_bytes(bytes: Vec<u8>) -> String {
    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}
