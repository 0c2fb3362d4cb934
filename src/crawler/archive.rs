//! Archive download and text extraction
//!
//! Works are published as zip archives holding a single Shift_JIS encoded
//! text file alongside optional extras (images, metadata).

use super::fetcher::Fetcher;
use crate::CollectorError;
use encoding_rs::SHIFT_JIS;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Largest text member accepted, declared or actual
const MAX_TEXT_BYTES: u64 = 64 * 1024 * 1024;

/// Extracts and decodes the first `.txt` member of a zip archive
///
/// # Returns
///
/// * `Ok(String)` - The decoded text
/// * `Err(CollectorError::ArchiveCorrupt)` - The bytes are not a readable zip,
///   or the member is larger than `MAX_TEXT_BYTES`
/// * `Err(CollectorError::MemberNotFound)` - No member name ends in `.txt`
/// * `Err(CollectorError::EncodingError)` - The member is not valid Shift_JIS
pub fn extract_text(bytes: &[u8]) -> Result<String, CollectorError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| CollectorError::ArchiveCorrupt(e.to_string()))?;

    let mut member = None;
    for i in 0..archive.len() {
        let file = archive
            .by_index_raw(i)
            .map_err(|e| CollectorError::ArchiveCorrupt(e.to_string()))?;
        if !file.is_dir() && file.name().ends_with(".txt") {
            member = Some(i);
            break;
        }
    }
    let index = member.ok_or(CollectorError::MemberNotFound)?;

    let mut file = archive
        .by_index(index)
        .map_err(|e| CollectorError::ArchiveCorrupt(e.to_string()))?;
    let name = file.name().to_string();
    if file.size() > MAX_TEXT_BYTES {
        return Err(CollectorError::ArchiveCorrupt(format!(
            "{} declares {} bytes, limit is {}",
            name,
            file.size(),
            MAX_TEXT_BYTES
        )));
    }

    // Bounded independently of the declared size
    let mut raw = Vec::new();
    file.by_ref()
        .take(MAX_TEXT_BYTES + 1)
        .read_to_end(&mut raw)
        .map_err(|e| CollectorError::ArchiveCorrupt(format!("{}: {}", name, e)))?;
    if raw.len() as u64 > MAX_TEXT_BYTES {
        return Err(CollectorError::ArchiveCorrupt(format!(
            "{} exceeds {} bytes",
            name, MAX_TEXT_BYTES
        )));
    }

    decode_shift_jis(&raw)
}

/// Strictly decodes Shift_JIS bytes; any malformed sequence is an error
pub fn decode_shift_jis(bytes: &[u8]) -> Result<String, CollectorError> {
    SHIFT_JIS
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            CollectorError::EncodingError(format!(
                "{} bytes contain a malformed Shift_JIS sequence",
                bytes.len()
            ))
        })
}

/// Downloads an archive and extracts its text
pub async fn fetch_and_extract(fetcher: &Fetcher, zip_url: &str) -> Result<String, CollectorError> {
    let bytes = fetcher.fetch_bytes(zip_url).await?;
    tracing::debug!("Downloaded {} bytes from {}", bytes.len(), zip_url);
    extract_text(&bytes)
}
