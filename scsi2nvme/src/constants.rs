//! Crate-wide compile-time knobs. The engine takes no runtime configuration.

/// Maximum number of NVMe commands a single SCSI command can translate into.
pub const MAX_COMMAND_RATIO: usize = 2;

/// NVMe page size the allocator gateway requests in.
pub const PAGE_SIZE: usize = 4096;
