use crate::error::{FibresemError, Result};
use crate::types::{MetadataBlock, RawTagMap};
use log::{debug, warn};

use super::tags::ZEISS_SEM_METADATA;

/// Parses the vendor's embedded metadata block out of the tag map
///
/// # Algorithm
///
/// 1. Look up tag 34119; absent → empty block
/// 2. Decode as text and strip NUL characters
/// 3. Split into lines on CRLF (bare LF tolerated)
/// 4. Split each line on the first `=`, trimming key and value;
///    lines without `=` are ignored
///
/// # Errors
///
/// Returns [`FibresemError::MetadataParse`] if the tag holds a numeric value
/// that cannot be read as text.
pub fn parse_metadata_block(tags: &RawTagMap) -> Result<MetadataBlock> {
    let Some(value) = tags.get(ZEISS_SEM_METADATA) else {
        debug!("Tag {} not present, no metadata block", ZEISS_SEM_METADATA);
        return Ok(MetadataBlock::new());
    };

    let text = value.as_text().ok_or_else(|| {
        FibresemError::MetadataParse(format!(
            "tag {} holds {} data, expected text",
            ZEISS_SEM_METADATA,
            value.type_name()
        ))
    })?;

    let block = parse_block_text(&text);
    debug!("Parsed {} metadata entries", block.len());
    Ok(block)
}

/// Like [`parse_metadata_block`], converting a parse failure into an empty block
pub fn metadata_block_or_empty(tags: &RawTagMap) -> MetadataBlock {
    parse_metadata_block(tags).unwrap_or_else(|e| {
        warn!("{}; continuing without metadata", e);
        MetadataBlock::new()
    })
}

/// Splits vendor text into key/value pairs
pub fn parse_block_text(text: &str) -> MetadataBlock {
    text.replace('\0', "")
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect()
}
