//! Part size selection for multipart uploads.

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// Smallest part size S3 accepts; anything below means "choose for me"
pub const MIN_PART_SIZE: u64 = 5 * MIB;

/// Part size for files under 10 GiB
pub const SMALL_TIER_PART_SIZE: u64 = 64 * MIB;

/// Part size for files under 100 GiB
pub const MEDIUM_TIER_PART_SIZE: u64 = 100 * MIB;

/// Part size for everything larger
pub const LARGE_TIER_PART_SIZE: u64 = 250 * MIB;

const SMALL_TIER_LIMIT: u64 = 10 * GIB;
const MEDIUM_TIER_LIMIT: u64 = 100 * GIB;

/// Hard limit on parts per multipart upload
pub const MAX_PARTS: u64 = 10_000;

/// Ranged GET size for downloads, independent of object size
pub const DOWNLOAD_CHUNK_SIZE: u64 = 64 * MIB;

/// Normalise a user supplied part size: values below the minimum mean automatic
pub fn normalize_part_size(configured: u64) -> u64 {
    if configured < MIN_PART_SIZE {
        0
    } else {
        configured
    }
}

/// Pick the part size for an upload of `file_size` bytes.
///
/// An explicit size wins over the tiers, but either is raised when the file
/// would otherwise need more than [`MAX_PARTS`] parts.
pub fn select_part_size(configured: u64, file_size: u64) -> u64 {
    let chosen = if configured >= MIN_PART_SIZE {
        configured
    } else if file_size < SMALL_TIER_LIMIT {
        SMALL_TIER_PART_SIZE
    } else if file_size < MEDIUM_TIER_LIMIT {
        MEDIUM_TIER_PART_SIZE
    } else {
        LARGE_TIER_PART_SIZE
    };
    chosen.max(file_size.div_ceil(MAX_PARTS))
}
