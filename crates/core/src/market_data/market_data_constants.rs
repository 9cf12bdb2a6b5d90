/// Historical series buckets requested when the caller does not say.
pub const DEFAULT_INTERVAL_COUNT: u32 = 400;

/// Upper bound accepted for the historical series bucket count.
pub const MAX_INTERVAL_COUNT: u32 = 1000;

/// Existence checks allowed in flight per record type during one sync.
pub const EXISTENCE_CHECK_CONCURRENCY: usize = 16;

/// Variants synced at once by `sync_all`.
pub const SYNC_ALL_CONCURRENCY: usize = 4;
