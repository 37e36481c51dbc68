//! Allocator gateway (C3) and the process-wide callback slots it, and the
//! debug sink, are installed into.
//!
//! The engine owns no heap. It calls out to two capabilities supplied once
//! at startup by the embedder: page allocation and deallocation. Both are
//! held in a [`spin::Once`] rather than a raw `static mut`, since the slot
//! is genuinely write-once and read-many from then on.

use crate::error::TranslationError;
use spin::Once;

type AllocFn = fn(count: u32) -> u64;
type DeallocFn = fn(address: u64, count: u32);

struct Runtime {
    alloc_fn: AllocFn,
    dealloc_fn: DeallocFn,
}

static RUNTIME: Once<Runtime> = Once::new();

fn runtime() -> &'static Runtime {
    RUNTIME
        .get()
        .expect("set_alloc_callbacks must be called before translating any command")
}

/// Installs the allocator capability. Must be called exactly once, before
/// the first pipeline is used.
pub fn set_alloc_callbacks(alloc_fn: AllocFn, dealloc_fn: DeallocFn) {
    RUNTIME.call_once(|| Runtime {
        alloc_fn,
        dealloc_fn,
    });
}

fn alloc_pages(count: u32) -> u64 {
    (runtime().alloc_fn)(count)
}

fn dealloc_pages(address: u64, count: u32) {
    (runtime().dealloc_fn)(address, count)
}

/// One or two page-backed regions (data + optional metadata) owned for the
/// duration of a single Begin/Complete cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Allocation {
    pub data_addr: u64,
    data_count: u32,
    pub mdata_addr: u64,
    mdata_count: u32,
}

impl Allocation {
    pub const fn new() -> Self {
        Allocation {
            data_addr: 0,
            data_count: 0,
            mdata_addr: 0,
            mdata_count: 0,
        }
    }

    /// Performs zero, one, or two allocator calls depending on whether
    /// `data_count`/`mdata_count` are non-zero. Fails if either base is
    /// already non-zero (no re-entrant allocation on one `Allocation`).
    /// On a failed second call, the first allocation is released before
    /// returning `Failure`.
    pub fn set_pages(&mut self, data_count: u32, mdata_count: u32) -> Result<(), TranslationError> {
        if self.data_addr != 0 || self.mdata_addr != 0 {
            return Err(TranslationError::Failure);
        }

        if data_count > 0 {
            let addr = alloc_pages(data_count);
            if addr == 0 {
                log::debug!("alloc_pages({data_count}) returned 0");
                return Err(TranslationError::Failure);
            }
            self.data_addr = addr;
            self.data_count = data_count;
        }

        if mdata_count > 0 {
            let addr = alloc_pages(mdata_count);
            if addr == 0 {
                log::debug!("alloc_pages({mdata_count}) returned 0 for metadata");
                self.release();
                return Err(TranslationError::Failure);
            }
            self.mdata_addr = addr;
            self.mdata_count = mdata_count;
        }

        Ok(())
    }

    /// Borrows the data page(s) as bytes. Empty if no data page was
    /// allocated. The caller (the shim, between `GetNvmeWrappers` and
    /// `Complete`) is responsible for having written the device's
    /// response into this address before `Complete` is called.
    pub fn data(&self) -> &[u8] {
        if self.data_addr == 0 {
            return &[];
        }
        let len = self.data_count as usize * crate::constants::PAGE_SIZE;
        // SAFETY: `data_addr` was handed back by the embedder's allocator
        // for exactly `data_count` pages of `PAGE_SIZE` bytes each, and is
        // expected to remain valid and exclusively ours until `release`.
        unsafe { core::slice::from_raw_parts(self.data_addr as *const u8, len) }
    }

    /// Same as `data`, mutable: used to write host-originated payloads
    /// (e.g. UNMAP's DSM ranges) into the allocation before the command
    /// is submitted.
    pub fn data_mut(&mut self) -> &mut [u8] {
        if self.data_addr == 0 {
            return &mut [];
        }
        let len = self.data_count as usize * crate::constants::PAGE_SIZE;
        // SAFETY: see `data` above; `&mut self` ensures no other borrow of
        // this allocation's bytes is outstanding.
        unsafe { core::slice::from_raw_parts_mut(self.data_addr as *mut u8, len) }
    }

    /// Releases every non-zero base exactly once. Idempotent.
    pub fn release(&mut self) {
        if self.data_addr != 0 {
            dealloc_pages(self.data_addr, self.data_count);
            self.data_addr = 0;
            self.data_count = 0;
        }
        if self.mdata_addr != 0 {
            dealloc_pages(self.mdata_addr, self.mdata_count);
            self.mdata_addr = 0;
            self.mdata_count = 0;
        }
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU64, Ordering};

    static NEXT_ADDR: AtomicU64 = AtomicU64::new(0x1000);
    static RELEASED: AtomicU64 = AtomicU64::new(0);

    fn test_alloc(count: u32) -> u64 {
        if count == 0 {
            return 0;
        }
        NEXT_ADDR.fetch_add(0x1000, Ordering::SeqCst)
    }

    fn test_dealloc(address: u64, _count: u32) {
        RELEASED.store(address, Ordering::SeqCst);
    }

    fn ensure_runtime() {
        set_alloc_callbacks(test_alloc, test_dealloc);
    }

    #[test]
    fn set_pages_allocates_and_releases() {
        ensure_runtime();
        let mut allocation = Allocation::new();
        allocation.set_pages(1, 0).unwrap();
        assert_ne!(allocation.data_addr, 0);
        assert_eq!(allocation.mdata_addr, 0);
        let addr = allocation.data_addr;
        allocation.release();
        assert_eq!(allocation.data_addr, 0);
        assert_eq!(RELEASED.load(Ordering::SeqCst), addr);
    }

    #[test]
    fn set_pages_rejects_reentrant_call() {
        ensure_runtime();
        let mut allocation = Allocation::new();
        allocation.set_pages(1, 0).unwrap();
        assert!(allocation.set_pages(1, 0).is_err());
        allocation.release();
    }

    #[test]
    fn drop_releases_allocation() {
        ensure_runtime();
        let addr;
        {
            let mut allocation = Allocation::new();
            allocation.set_pages(1, 1).unwrap();
            addr = allocation.mdata_addr;
        }
        assert_eq!(RELEASED.load(Ordering::SeqCst), addr);
    }
}
