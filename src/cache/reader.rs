//! Cache file reader.

use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

use super::format::*;
use crate::index::{IndexedRules, KeywordIndex};
use crate::rule::{Rule, RuleEntry, RuleSet};
use crate::{Error, Result};

/// Decodes cache files back into an [`IndexedRules`].
///
/// Every structural problem is reported as an error; callers that treat the
/// cache as optional turn those into a miss.
pub struct CacheReader;

impl CacheReader {
    /// Open and decode a cache file.
    pub fn open(path: &Path) -> Result<IndexedRules> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_bytes(&mmap)
    }

    /// Decode a cache image.
    pub fn from_bytes(data: &[u8]) -> Result<IndexedRules> {
        let header = CacheHeader::from_bytes(data)?;
        header.validate()?;

        let stored = &data[HEADER_SIZE..];
        if stored.len() != header.payload_size as usize {
            return Err(Error::Corrupt(format!(
                "payload size {} does not match header {}",
                stored.len(),
                header.payload_size
            )));
        }
        if payload_checksum(stored) != header.checksum {
            return Err(Error::ChecksumMismatch);
        }

        let payload = decompress(&header, stored)?;
        if payload.len() != header.raw_payload_size as usize {
            return Err(Error::Corrupt("raw payload size mismatch".to_string()));
        }

        let mut cursor = Cursor::new(&payload);
        let rules = read_rules(&mut cursor, header.rule_count)?;
        let index = read_keywords(&mut cursor, &header, rules.len())?;

        if !cursor.is_empty() {
            return Err(Error::Corrupt(format!(
                "{} trailing bytes after keyword section",
                cursor.remaining()
            )));
        }

        Ok(IndexedRules { rules, index })
    }

    /// Read only the header of a cache file.
    pub fn header(path: &Path) -> Result<CacheHeader> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let header = CacheHeader::from_bytes(&mmap)?;
        header.validate()?;
        Ok(header)
    }
}

#[cfg(feature = "compression")]
fn decompress<'a>(header: &CacheHeader, stored: &'a [u8]) -> Result<std::borrow::Cow<'a, [u8]>> {
    if header.format_flags().contains(FormatFlags::PAYLOAD_COMPRESSED) {
        lz4_flex::decompress(stored, header.raw_payload_size as usize)
            .map(std::borrow::Cow::Owned)
            .map_err(|e| Error::Corrupt(format!("LZ4 decompression failed: {}", e)))
    } else {
        Ok(std::borrow::Cow::Borrowed(stored))
    }
}

#[cfg(not(feature = "compression"))]
fn decompress<'a>(_header: &CacheHeader, stored: &'a [u8]) -> Result<std::borrow::Cow<'a, [u8]>> {
    // validate() already rejected compressed payloads
    Ok(std::borrow::Cow::Borrowed(stored))
}

fn read_rules(cursor: &mut Cursor<'_>, count: u32) -> Result<RuleSet> {
    let mut entries = Vec::with_capacity((count as usize).min(cursor.remaining()));
    for _ in 0..count {
        let flags = RuleFlags::from_bits(cursor.u8()?)
            .ok_or_else(|| Error::Corrupt("unknown rule flags".to_string()))?;
        let pattern = cursor.string()?;
        let replacement = cursor.string()?;
        entries.push(RuleEntry::with_validity(
            Rule::new(pattern, replacement),
            flags.contains(RuleFlags::VALID),
        ));
    }
    Ok(RuleSet::from_entries(entries))
}

fn read_keywords(cursor: &mut Cursor<'_>, header: &CacheHeader, rule_count: usize) -> Result<KeywordIndex> {
    let mut index = KeywordIndex::new();
    let mut postings = 0usize;

    for _ in 0..header.keyword_count {
        let keyword = cursor.string()?;
        let len = cursor.u32()? as usize;
        if len > cursor.remaining() / 4 {
            return Err(Error::Corrupt(format!("posting list for {:?} overruns payload", keyword)));
        }

        let mut ids = Vec::with_capacity(len);
        for _ in 0..len {
            let id = cursor.u32()?;
            if id as usize >= rule_count {
                return Err(Error::Corrupt(format!("rule id {} out of range", id)));
            }
            if ids.last().is_some_and(|&prev| prev >= id) {
                return Err(Error::Corrupt(format!("posting list for {:?} not ascending", keyword)));
            }
            ids.push(id);
        }

        postings += ids.len();
        index.insert_postings(keyword, ids);
    }

    if index.len() != header.keyword_count as usize {
        return Err(Error::Corrupt("duplicate keywords".to_string()));
    }
    if postings != header.posting_count as usize {
        return Err(Error::Corrupt("posting count mismatch".to_string()));
    }

    Ok(index)
}

/// Bounds-checked little-endian reader over the payload.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::Corrupt(format!(
                "truncated payload at offset {}: need {} bytes, have {}",
                self.pos,
                len,
                self.remaining()
            )));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn string(&mut self) -> Result<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| Error::Corrupt("invalid UTF-8 in string".to_string()))
    }
}
