//! Binary cache for a built rule index.
//!
//! Rebuilding the index means re-reading and re-sorting the whole rule file,
//! so the result is persisted next to it and reused while the rule file is
//! unchanged.
//!
//! # File Structure
//!
//! ```text
//! +------------------+
//! |     HEADER       |  64 bytes (fixed)
//! +------------------+
//! |   RULE SECTION   |  flags, pattern, replacement per rule (priority order)
//! +------------------+
//! | KEYWORD SECTION  |  keyword, posting count, rule ids (sorted by keyword)
//! +------------------+
//! ```
//!
//! The two sections form the payload, which may be LZ4 compressed. The header
//! carries magic, version, counts and a payload checksum; a file that fails
//! any check is treated as a cache miss.

mod format;
mod reader;
mod store;
mod writer;


pub use format::*;
pub use reader::CacheReader;
pub use store::{is_fresh, load, save};
pub use writer::CacheWriter;
