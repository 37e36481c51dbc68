//! Debug sink boundary: installs a [`log::Log`] implementation that
//! forwards formatted records to a caller-supplied `fn(*const u8)` taking a
//! null-terminated C string, so every `log::debug!`/`log::warn!` call site
//! in the engine reaches the embedder's existing log transport uniformly.

use alloc::format;
use alloc::string::String;
use log::{Level, LevelFilter, Log, Metadata, Record};

type DebugFn = fn(message: *const u8);

struct CallbackLogger {
    sink: DebugFn,
}

// SAFETY: `sink` is a plain function pointer installed once at startup and
// never mutated; sharing it across threads is sound.
unsafe impl Sync for CallbackLogger {}
unsafe impl Send for CallbackLogger {}

impl Log for CallbackLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut line: String = format!("[{}] {}", record.level(), record.args());
        line.push('\0');
        (self.sink)(line.as_ptr());
    }

    fn flush(&self) {}
}

static mut LOGGER: CallbackLogger = CallbackLogger {
    sink: |_msg| {},
};

/// Installs the debug sink. Must be called at most once; subsequent calls
/// are ignored, matching the install-once discipline of the allocator
/// callbacks in [`crate::runtime`].
pub fn set_debug_callback(sink: DebugFn) {
    // SAFETY: this function is documented as install-once and called from
    // a single initialization thread per the engine's concurrency model
    // (§5): no internal synchronization is required.
    unsafe {
        LOGGER.sink = sink;
        let _ = log::set_logger(&*core::ptr::addr_of!(LOGGER));
    }
    log::set_max_level(LevelFilter::Debug);
}
