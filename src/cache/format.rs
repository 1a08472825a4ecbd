//! Cache format constants and header.

use bitflags::bitflags;

use crate::{Error, Result};

/// Magic bytes for identifying phraserule cache files.
pub const MAGIC: [u8; 8] = *b"PHRULE\x00\x01";

/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 64;

/// Bytes of the payload SHA-256 kept in the header.
pub const CHECKSUM_SIZE: usize = 16;

bitflags! {
    /// Format flags for cache files.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FormatFlags: u32 {
        /// Payload is LZ4 compressed.
        const PAYLOAD_COMPRESSED = 0b00000001;
    }
}

bitflags! {
    /// Per-rule flags stored in the rule section.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RuleFlags: u8 {
        /// Pattern compiled as a regex at build time.
        const VALID = 0b00000001;
    }
}

/// Cache file header (64 bytes, little endian).
///
/// ```text
/// 0x00  magic            [u8; 8]
/// 0x08  version          u32
/// 0x0C  flags            u32
/// 0x10  timestamp        i64
/// 0x18  rule_count       u32
/// 0x1C  keyword_count    u32
/// 0x20  posting_count    u32
/// 0x24  payload_size     u32   (as stored)
/// 0x28  raw_payload_size u32   (after decompression)
/// 0x2C  checksum         [u8; 16]  (SHA-256 of stored payload, truncated)
/// 0x3C  reserved         [u8; 4]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheHeader {
    pub magic: [u8; 8],
    pub version: u32,
    pub flags: u32,
    /// Unix timestamp when the cache was written
    pub timestamp: i64,
    pub rule_count: u32,
    pub keyword_count: u32,
    pub posting_count: u32,
    pub payload_size: u32,
    pub raw_payload_size: u32,
    pub checksum: [u8; CHECKSUM_SIZE],
    pub reserved: [u8; 4],
}

impl CacheHeader {
    /// Create a new header with default values.
    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
            flags: 0,
            timestamp: 0,
            rule_count: 0,
            keyword_count: 0,
            posting_count: 0,
            payload_size: 0,
            raw_payload_size: 0,
            checksum: [0; CHECKSUM_SIZE],
            reserved: [0; 4],
        }
    }

    /// Validate magic, version and flags.
    ///
    /// Anything this build cannot read fails closed.
    pub fn validate(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(Error::InvalidMagic);
        }
        if self.version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion(self.version));
        }
        let flags = FormatFlags::from_bits(self.flags).ok_or(Error::UnsupportedFlags(self.flags))?;
        if flags.contains(FormatFlags::PAYLOAD_COMPRESSED) && !cfg!(feature = "compression") {
            return Err(Error::UnsupportedFlags(self.flags));
        }
        Ok(())
    }

    /// Get format flags.
    pub fn format_flags(&self) -> FormatFlags {
        FormatFlags::from_bits_truncate(self.flags)
    }

    /// Serialize to the on-disk layout.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0x00..0x08].copy_from_slice(&self.magic);
        out[0x08..0x0C].copy_from_slice(&self.version.to_le_bytes());
        out[0x0C..0x10].copy_from_slice(&self.flags.to_le_bytes());
        out[0x10..0x18].copy_from_slice(&self.timestamp.to_le_bytes());
        out[0x18..0x1C].copy_from_slice(&self.rule_count.to_le_bytes());
        out[0x1C..0x20].copy_from_slice(&self.keyword_count.to_le_bytes());
        out[0x20..0x24].copy_from_slice(&self.posting_count.to_le_bytes());
        out[0x24..0x28].copy_from_slice(&self.payload_size.to_le_bytes());
        out[0x28..0x2C].copy_from_slice(&self.raw_payload_size.to_le_bytes());
        out[0x2C..0x3C].copy_from_slice(&self.checksum);
        out[0x3C..0x40].copy_from_slice(&self.reserved);
        out
    }

    /// Parse the on-disk layout. Does not validate.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::InvalidHeaderSize {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }

        let u32_at = |at: usize| u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);

        let mut magic = [0u8; 8];
        magic.copy_from_slice(&data[0x00..0x08]);
        let mut timestamp = [0u8; 8];
        timestamp.copy_from_slice(&data[0x10..0x18]);
        let mut checksum = [0u8; CHECKSUM_SIZE];
        checksum.copy_from_slice(&data[0x2C..0x3C]);
        let mut reserved = [0u8; 4];
        reserved.copy_from_slice(&data[0x3C..0x40]);

        Ok(Self {
            magic,
            version: u32_at(0x08),
            flags: u32_at(0x0C),
            timestamp: i64::from_le_bytes(timestamp),
            rule_count: u32_at(0x18),
            keyword_count: u32_at(0x1C),
            posting_count: u32_at(0x20),
            payload_size: u32_at(0x24),
            raw_payload_size: u32_at(0x28),
            checksum,
            reserved,
        })
    }
}

impl Default for CacheHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA-256 of `payload`, truncated to the header checksum width.
pub fn payload_checksum(payload: &[u8]) -> [u8; CHECKSUM_SIZE] {
    use sha2::{Digest, Sha256};

    let digest = Sha256::digest(payload);
    let mut out = [0u8; CHECKSUM_SIZE];
    out.copy_from_slice(&digest[..CHECKSUM_SIZE]);
    out
}
