//! SCSI-to-NVMe command and completion translation engine.
//!
//! This crate owns no device I/O and no heap: it translates SCSI command
//! descriptor blocks into NVMe submission entries, and NVMe completion
//! entries back into SCSI status/sense data. The embedder (a virtual SCSI
//! target, a USB mass-storage gadget, a test harness) drives one
//! [`pipeline::Pipeline`] per in-flight command through `begin` →
//! (submit the returned NVMe commands) → `complete`.
//!
//! Module map:
//! - [`scsi`] / [`nvme`]: wire-format command, response, and enum types (C1).
//! - [`byteio`]: endianness-safe byte/struct conversions (C2).
//! - [`runtime`]: the install-once page allocator gateway (C3).
//! - [`status`]: NVMe completion status to SCSI status/sense mapping (C4).
//! - [`codec`]: one `to_nvme`/`to_scsi` pair per supported SCSI opcode (C5).
//! - [`pipeline`]: the per-command state machine tying C1-C5 together (C6).
//! - [`error`]: the two error taxonomies (`TranslationError`, `PipelineError`).
//! - [`logsink`]: forwards `log` records to an embedder-supplied sink.
//! - [`constants`]: compile-time capacity knobs.

#![no_std]

extern crate alloc;

pub mod byteio;
pub mod codec;
pub mod constants;
pub mod error;
pub mod logsink;
pub mod nvme;
pub mod pipeline;
pub mod runtime;
pub mod scsi;
pub mod status;

pub use error::{PipelineError, TranslationError};
pub use logsink::set_debug_callback;
pub use pipeline::{BeginStatus, CompleteResult, Pipeline};
pub use runtime::set_alloc_callbacks;
