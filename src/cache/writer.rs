//! Cache file writer.

use super::format::*;
use crate::index::IndexedRules;
use crate::{Error, Result};

/// Serializes an [`IndexedRules`] into the cache format.
pub struct CacheWriter {
    buffer: Vec<u8>,
    compress: bool,
}

impl CacheWriter {
    /// Create a new writer.
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(64 * 1024),
            compress: false,
        }
    }

    /// Compress the payload with LZ4.
    ///
    /// Ignored unless the `compression` feature is enabled.
    pub fn compressed(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Write rules and index to the cache format.
    pub fn write(&mut self, indexed: &IndexedRules) -> Result<Vec<u8>> {
        self.buffer.clear();
        self.write_rules(indexed)?;
        self.write_keywords(indexed)?;

        let raw_payload_size = checked_u32(self.buffer.len(), "payload")?;
        let (payload, flags) = self.finish_payload();

        let header = CacheHeader {
            magic: MAGIC,
            version: FORMAT_VERSION,
            flags: flags.bits(),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs() as i64,
            rule_count: checked_u32(indexed.rules.len(), "rule count")?,
            keyword_count: checked_u32(indexed.index.len(), "keyword count")?,
            posting_count: checked_u32(indexed.index.posting_count(), "posting count")?,
            payload_size: checked_u32(payload.len(), "payload")?,
            raw_payload_size,
            checksum: payload_checksum(&payload),
            reserved: [0; 4],
        };

        let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    fn write_rules(&mut self, indexed: &IndexedRules) -> Result<()> {
        for entry in &indexed.rules {
            let mut flags = RuleFlags::empty();
            if entry.is_valid() {
                flags |= RuleFlags::VALID;
            }
            self.buffer.push(flags.bits());
            self.write_str(entry.rule().pattern())?;
            self.write_str(entry.rule().replacement())?;
        }
        Ok(())
    }

    fn write_keywords(&mut self, indexed: &IndexedRules) -> Result<()> {
        // Sorted so identical input produces identical bytes.
        for (keyword, ids) in indexed.index.sorted() {
            self.write_str(keyword)?;
            self.write_u32(checked_u32(ids.len(), "posting list")?);
            for &id in ids {
                self.write_u32(id);
            }
        }
        Ok(())
    }

    #[cfg(feature = "compression")]
    fn finish_payload(&mut self) -> (Vec<u8>, FormatFlags) {
        let raw = std::mem::take(&mut self.buffer);
        if self.compress {
            (lz4_flex::compress(&raw), FormatFlags::PAYLOAD_COMPRESSED)
        } else {
            (raw, FormatFlags::empty())
        }
    }

    #[cfg(not(feature = "compression"))]
    fn finish_payload(&mut self) -> (Vec<u8>, FormatFlags) {
        if self.compress {
            log::debug!("Cache compression requested but the compression feature is disabled");
        }
        (std::mem::take(&mut self.buffer), FormatFlags::empty())
    }

    fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_u32(checked_u32(s.len(), "string")?);
        self.buffer.extend_from_slice(s.as_bytes());
        Ok(())
    }

    fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }
}

impl Default for CacheWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn checked_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::Config(format!("{} too large for cache format: {}", what, value)))
}
