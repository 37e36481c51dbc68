//! Translation pipeline (C6): the state machine a caller drives through
//! one `Begin` / `GetNvmeWrappers` / `Complete` (or `Abort`) cycle per SCSI
//! command.
//!
//! The pipeline owns no device I/O. `Begin` parses the CDB and asks a C5
//! codec to build the NVMe command(s); this module then allocates the
//! pages those commands need through C3 and patches the PRPs in before
//! handing the wrapper list back. `Complete` reads the allocation(s) back,
//! asks the codec to build the SCSI response, and maps the worst
//! completion status through C4.

use crate::codec::{self, CmdList, CodecContext, NvmeCmdWrapper};
use crate::error::{PipelineError, TranslationError};
use crate::nvme::GenericQueueEntryCpl;
use crate::runtime::Allocation;
use crate::scsi::{self, OpCode, Status};
use crate::status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Uninitialized,
    Building,
    Ready,
    Failed,
}

/// Result of [`Pipeline::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginStatus {
    /// The CDB translated; call `nvme_wrappers()` for the command(s) to
    /// submit, then `complete()` once they finish. `alloc_len` is the
    /// CDB's own allocation length field (0 for CDBs that don't carry
    /// one, e.g. Read/Write/Unmap).
    Ready { alloc_len: u32 },
    /// The CDB was legal but needed no NVMe command at all (e.g. a stubbed
    /// RequestSense). `complete()` still must be called to read the
    /// result. `alloc_len` as above.
    NoTranslation { alloc_len: u32 },
    /// The CDB itself was rejected; no NVMe command was built and the
    /// pipeline did not leave `Uninitialized`.
    InvalidInput,
}

/// Result of [`Pipeline::complete`].
#[derive(Debug, Clone, Copy)]
pub struct CompleteResult {
    pub status: Status,
    pub sense_key: scsi::SenseKey,
    pub asc: scsi::AdditionalSenseCode,
    pub ascq: scsi::AdditionalSenseCodeQualifier,
    /// Bytes of `in_buffer`/`sense_buffer` this call actually wrote.
    pub data_len: usize,
}

fn worst_of(a: Option<CompleteResult>, b: CompleteResult) -> CompleteResult {
    match a {
        None => b,
        Some(a) if a.status == Status::Good => b,
        Some(a) => a,
    }
}

/// Per-command translation state. One instance is reused across many
/// Begin/Complete cycles; `Abort` (or a successful `Complete`) returns it
/// to `Uninitialized`.
pub struct Pipeline {
    state: State,
    opcode: Option<u8>,
    cdb: [u8; 16],
    nsid: u32,
    page_size: u32,
    ready: bool,
    alloc_len: u32,
    wrappers: CmdList,
    allocations: [Allocation; crate::constants::MAX_COMMAND_RATIO],
    /// Scratch space for UNMAP's DSM range records, built in `build_nvme`
    /// and copied into the real allocation once `allocate_and_patch` has
    /// given it a page to live in.
    unmap_scratch: [u8; 16 * 256],
}

impl Pipeline {
    pub const fn new(nsid: u32, page_size: u32) -> Self {
        Pipeline {
            state: State::Uninitialized,
            opcode: None,
            cdb: [0u8; 16],
            nsid,
            page_size,
            ready: true,
            alloc_len: 0,
            wrappers: CmdList::new(),
            allocations: [Allocation::new(); crate::constants::MAX_COMMAND_RATIO],
            unmap_scratch: [0u8; 16 * 256],
        }
    }

    /// The caller's last known unit-readiness state, consulted by
    /// TestUnitReady. Has no other effect on translation.
    pub fn set_device_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    fn ctx(&self) -> CodecContext {
        CodecContext {
            nsid: self.nsid,
            page_size: self.page_size,
        }
    }

    fn release_allocations(&mut self) {
        for allocation in self.allocations.iter_mut() {
            allocation.release();
        }
    }

    /// Idempotent. Releases any held allocations and returns to
    /// `Uninitialized` regardless of current state.
    pub fn abort(&mut self) {
        self.release_allocations();
        self.wrappers = CmdList::new();
        self.opcode = None;
        self.state = State::Uninitialized;
    }

    /// Begins translating one CDB. `data_buffer` is the host-supplied SCSI
    /// data-out payload for commands that carry one (only UNMAP, today).
    /// Fails with `PipelineError::NotReady` if a previous cycle's
    /// `complete`/`abort` hasn't happened yet.
    pub fn begin(&mut self, cdb_bytes: &[u8], data_buffer: &[u8]) -> Result<BeginStatus, PipelineError> {
        if self.state != State::Uninitialized {
            return Err(PipelineError::NotReady);
        }
        if cdb_bytes.is_empty() {
            return Ok(BeginStatus::InvalidInput);
        }

        self.state = State::Building;
        self.cdb = [0u8; 16];
        let n = cdb_bytes.len().min(16);
        self.cdb[..n].copy_from_slice(&cdb_bytes[..n]);
        self.opcode = Some(cdb_bytes[0]);
        self.alloc_len = 0;
        let is_unmap = cdb_bytes[0] == OpCode::Unmap as u8;

        let result = self.build_nvme(cdb_bytes, data_buffer);
        match result {
            Ok(list) => {
                if list.is_empty() {
                    self.wrappers = list;
                    self.state = State::Ready;
                    return Ok(BeginStatus::NoTranslation {
                        alloc_len: self.alloc_len,
                    });
                }
                let unmap_len = if is_unmap {
                    list.as_slice().first().map(|w| w.buffer_len as usize).unwrap_or(0)
                } else {
                    0
                };
                if let Err(_) = self.allocate_and_patch(list) {
                    self.abort();
                    return Ok(BeginStatus::InvalidInput);
                }
                if unmap_len > 0 {
                    let scratch = self.unmap_scratch;
                    self.allocations[0].data_mut()[..unmap_len].copy_from_slice(&scratch[..unmap_len]);
                }
                self.state = State::Ready;
                Ok(BeginStatus::Ready {
                    alloc_len: self.alloc_len,
                })
            }
            Err(TranslationError::NoTranslation) => {
                self.wrappers = CmdList::new();
                self.state = State::Ready;
                Ok(BeginStatus::NoTranslation {
                    alloc_len: self.alloc_len,
                })
            }
            Err(_) => {
                self.state = State::Failed;
                self.abort();
                Ok(BeginStatus::InvalidInput)
            }
        }
    }

    fn allocate_and_patch(&mut self, mut list: CmdList) -> Result<(), TranslationError> {
        let page_count = |buffer_len: u32| -> u32 {
            if buffer_len == 0 {
                0
            } else {
                (buffer_len + self.page_size - 1) / self.page_size
            }
        };

        for (i, wrapper) in list.as_mut_slice().iter_mut().enumerate() {
            if wrapper.buffer_len == 0 {
                continue;
            }
            let count = page_count(wrapper.buffer_len);
            self.allocations[i].set_pages(count, 0)?;
            wrapper.cmd.set_prp1(self.allocations[i].data_addr);
        }
        self.wrappers = list;
        Ok(())
    }

    fn build_nvme(&mut self, cdb_bytes: &[u8], data_buffer: &[u8]) -> Result<CmdList, TranslationError> {
        use crate::scsi::*;
        use codec::*;
        let ctx = self.ctx();
        let opcode = cdb_bytes[0];

        if opcode == OpCode::TestUnitReady as u8 {
            let cdb = TestUnitReadyCommand::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            return test_unit_ready::to_nvme(&cdb);
        }
        if opcode == OpCode::RequestSense as u8 {
            let cdb = RequestSenseCommand::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            self.alloc_len = cdb.allocation_length() as u32;
            return request_sense::to_nvme(&cdb);
        }
        if opcode == OpCode::Inquiry as u8 {
            let cdb = InquiryCommand::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            self.alloc_len = cdb.allocation_length() as u32;
            return inquiry::to_nvme(&ctx, &cdb);
        }
        if opcode == OpCode::ReadCapacity10 as u8 {
            return read_capacity::to_nvme(&ctx);
        }
        if opcode == OpCode::Read6 as u8 {
            let cdb = Read6Command::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            return read_write::read6_to_nvme(&ctx, &cdb);
        }
        if opcode == OpCode::Write6 as u8 {
            let cdb = Write6Command::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            return read_write::write6_to_nvme(&ctx, &cdb);
        }
        if opcode == OpCode::Read10 as u8 {
            let cdb = Read10Command::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            return read_write::read10_to_nvme(&ctx, &cdb);
        }
        if opcode == OpCode::Write10 as u8 {
            let cdb = Write10Command::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            return read_write::write10_to_nvme(&ctx, &cdb);
        }
        if opcode == OpCode::Read12 as u8 {
            let cdb = Read12Command::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            return read_write::read12_to_nvme(&ctx, &cdb);
        }
        if opcode == OpCode::Write12 as u8 {
            let cdb = Write12Command::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            return read_write::write12_to_nvme(&ctx, &cdb);
        }
        if opcode == OpCode::Read16 as u8 {
            let cdb = Read16Command::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            return read_write::read16_to_nvme(&ctx, &cdb);
        }
        if opcode == OpCode::Write16 as u8 {
            let cdb = Write16Command::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            return read_write::write16_to_nvme(&ctx, &cdb);
        }
        if opcode == OpCode::Verify10 as u8 {
            let cdb = Verify10Command::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            return verify::verify10_to_nvme(&ctx, &cdb);
        }
        if opcode == OpCode::Verify12 as u8 {
            let cdb = Verify12Command::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            return verify::verify12_to_nvme(&ctx, &cdb);
        }
        if opcode == OpCode::Verify16 as u8 {
            let cdb = Verify16Command::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            return verify::verify16_to_nvme(&ctx, &cdb);
        }
        if opcode == OpCode::Sync10 as u8 {
            let cdb = SynchronizeCache10Command::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            return sync_cache::sync10_to_nvme(&ctx, &cdb);
        }
        if opcode == OpCode::Sync16 as u8 {
            let cdb = SynchronizeCache16Command::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            return sync_cache::sync16_to_nvme(&ctx, &cdb);
        }
        if opcode == OpCode::ModeSense6 as u8 {
            let cdb = ModeSense6Command::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            self.alloc_len = cdb.allocation_length() as u32;
            return mode_sense::to_nvme(&ctx, cdb.page_code(), cdb.pc(), cdb.dbd());
        }
        if opcode == OpCode::ModeSense10 as u8 {
            let cdb = ModeSense10Command::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            self.alloc_len = cdb.allocation_length() as u32;
            return mode_sense::to_nvme(&ctx, cdb.page_code(), cdb.pc(), cdb.dbd());
        }
        if opcode == OpCode::ReportLuns as u8 {
            let cdb = ReportLunsCommand::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            self.alloc_len = cdb.allocation_length();
            return report_luns::to_nvme(&ctx);
        }
        if opcode == OpCode::Unmap as u8 {
            let _cdb = UnmapCommand::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            return unmap::to_nvme(&ctx, data_buffer, &mut self.unmap_scratch);
        }
        if opcode == OpCode::MaintenanceIn as u8 {
            // ReportSupportedOpCodes builds no NVMe command; handled at
            // completion time from the cached CDB.
            let cdb = ReportOpCodesCommand::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            self.alloc_len = cdb.allocation_length();
            return Ok(CmdList::new());
        }
        if opcode == OpCode::LogSense as u8 {
            let cdb = LogSenseCommand::from_bytes(cdb_bytes).ok_or(TranslationError::InvalidInput)?;
            self.alloc_len = cdb.allocation_length() as u32;
            log_sense::to_nvme(&cdb)?;
            return Ok(CmdList::new());
        }
        Err(TranslationError::InvalidInput)
    }

    /// The NVMe commands built by `begin`, ready to submit. Empty when
    /// `begin` returned `NoTranslation`.
    pub fn nvme_wrappers(&self) -> &[NvmeCmdWrapper] {
        self.wrappers.as_slice()
    }

    /// Consumes the completion entries for every wrapper returned by
    /// `nvme_wrappers` (same order, same length) and produces the SCSI
    /// result. `in_buffer` receives any SCSI response payload (Inquiry
    /// data, mode pages, ...); `sense_buffer` receives sense data when the
    /// worst completion status was not success.
    pub fn complete(
        &mut self,
        completions: &[GenericQueueEntryCpl],
        in_buffer: &mut [u8],
        sense_buffer: &mut [u8],
    ) -> Result<CompleteResult, PipelineError> {
        if self.state != State::Ready {
            return Err(PipelineError::NotReady);
        }
        if completions.len() != self.wrappers.len() {
            self.abort();
            return Ok(CompleteResult {
                status: Status::CheckCondition,
                sense_key: scsi::SenseKey::HardwareError,
                asc: scsi::AdditionalSenseCode::InternalTargetFailure,
                ascq: scsi::AdditionalSenseCodeQualifier::InternalTargetFailure,
                data_len: 0,
            });
        }

        let mut worst: Option<CompleteResult> = None;
        for cpl in completions {
            let cpl_status = cpl.cpl_status();
            if cpl_status.status_code() != 0 || cpl_status.status_code_type() != 0 {
                let quad = status::to_scsi_status(cpl_status.status_code_type(), cpl_status.status_code());
                worst = Some(worst_of(
                    worst,
                    CompleteResult {
                        status: quad.status,
                        sense_key: quad.sense_key,
                        asc: quad.asc,
                        ascq: quad.ascq,
                        data_len: 0,
                    },
                ));
            }
        }

        if let Some(failure) = worst {
            let len = self.write_request_sense_like(failure, sense_buffer);
            self.abort();
            return Ok(CompleteResult {
                data_len: len,
                ..failure
            });
        }

        let result = self.build_scsi(completions, in_buffer);
        self.abort();
        match result {
            Ok(len) => Ok(CompleteResult {
                status: Status::Good,
                sense_key: scsi::SenseKey::NoSense,
                asc: scsi::AdditionalSenseCode::NoAdditionalSenseInfo,
                ascq: scsi::AdditionalSenseCodeQualifier::NoAdditionalSenseInfo,
                data_len: len,
            }),
            Err(TranslationError::NoTranslation) => Ok(CompleteResult {
                status: Status::Good,
                sense_key: scsi::SenseKey::NoSense,
                asc: scsi::AdditionalSenseCode::NoAdditionalSenseInfo,
                ascq: scsi::AdditionalSenseCodeQualifier::NoAdditionalSenseInfo,
                data_len: 0,
            }),
            Err(_) => Ok(CompleteResult {
                status: Status::CheckCondition,
                sense_key: scsi::SenseKey::IllegalRequest,
                asc: scsi::AdditionalSenseCode::InvalidFieldInCdb,
                ascq: scsi::AdditionalSenseCodeQualifier::InvalidFieldInCdb,
                data_len: 0,
            }),
        }
    }

    fn write_request_sense_like(&self, failure: CompleteResult, sense_buffer: &mut [u8]) -> usize {
        use crate::scsi::FixedFormatSenseData;
        if sense_buffer.len() < FixedFormatSenseData::SIZE {
            return 0;
        }
        let mut data = FixedFormatSenseData::new();
        data.set_response_code(0x70);
        data.set_sense_key(failure.sense_key as u8);
        data.set_additional_sense_code(failure.asc as u8);
        data.set_additional_sense_code_qualifier(failure.ascq as u8);
        sense_buffer[..FixedFormatSenseData::SIZE].copy_from_slice(data.as_bytes());
        FixedFormatSenseData::SIZE
    }

    fn build_scsi(&self, completions: &[GenericQueueEntryCpl], out: &mut [u8]) -> Result<usize, TranslationError> {
        use crate::scsi::*;
        let opcode = self.opcode.ok_or(TranslationError::Failure)?;
        let cdb_bytes = &self.cdb[..];

        if opcode == OpCode::TestUnitReady as u8 {
            let status = codec::test_unit_ready::to_scsi(self.ready);
            return if status == Status::Good {
                Ok(0)
            } else {
                Err(TranslationError::Failure)
            };
        }
        if opcode == OpCode::RequestSense as u8 {
            let cdb = RequestSenseCommand::from_bytes(cdb_bytes).ok_or(TranslationError::Failure)?;
            return codec::request_sense::to_scsi(&cdb, out);
        }
        if opcode == OpCode::Inquiry as u8 {
            let cdb = InquiryCommand::from_bytes(cdb_bytes).ok_or(TranslationError::Failure)?;
            let ctrl = self.allocations[0].data();
            let ns = self.allocations[1].data();
            return codec::inquiry::to_scsi(&cdb, ctrl, ns, self.nsid, out);
        }
        if opcode == OpCode::ReadCapacity10 as u8 {
            let page = self.allocations[0].data();
            return codec::read_capacity::to_scsi(page, out);
        }
        let no_response_payload = opcode == OpCode::Read6 as u8
            || opcode == OpCode::Write6 as u8
            || opcode == OpCode::Read10 as u8
            || opcode == OpCode::Write10 as u8
            || opcode == OpCode::Read12 as u8
            || opcode == OpCode::Write12 as u8
            || opcode == OpCode::Read16 as u8
            || opcode == OpCode::Write16 as u8
            || opcode == OpCode::Verify10 as u8
            || opcode == OpCode::Verify12 as u8
            || opcode == OpCode::Verify16 as u8
            || opcode == OpCode::Sync10 as u8
            || opcode == OpCode::Sync16 as u8
            || opcode == OpCode::Unmap as u8;
        if no_response_payload {
            return Ok(0);
        }
        if opcode == OpCode::ModeSense6 as u8 {
            let cdb = ModeSense6Command::from_bytes(cdb_bytes).ok_or(TranslationError::Failure)?;
            return self.mode_sense_to_scsi(completions, cdb.page_code(), false, cdb.dbd(), false, out);
        }
        if opcode == OpCode::ModeSense10 as u8 {
            let cdb = ModeSense10Command::from_bytes(cdb_bytes).ok_or(TranslationError::Failure)?;
            return self.mode_sense_to_scsi(completions, cdb.page_code(), cdb.llbaa(), cdb.dbd(), true, out);
        }
        if opcode == OpCode::ReportLuns as u8 {
            let page = self.allocations[0].data();
            return codec::report_luns::to_scsi(page, out);
        }
        if opcode == OpCode::MaintenanceIn as u8 {
            let cdb = ReportOpCodesCommand::from_bytes(cdb_bytes).ok_or(TranslationError::Failure)?;
            return codec::report_supported_opcodes::to_scsi(&cdb, out);
        }
        if opcode == OpCode::LogSense as u8 {
            let cdb = LogSenseCommand::from_bytes(cdb_bytes).ok_or(TranslationError::Failure)?;
            return codec::log_sense::to_scsi(&cdb, out);
        }
        Err(TranslationError::Failure)
    }

    fn mode_sense_to_scsi(
        &self,
        completions: &[GenericQueueEntryCpl],
        page_code: u8,
        llbaa: bool,
        dbd: bool,
        use_10_byte_header: bool,
        out: &mut [u8],
    ) -> Result<usize, TranslationError> {
        let mut slot = 0;
        let namespace_page = if !dbd {
            let page = self.allocations[slot].data();
            slot += 1;
            Some(page)
        } else {
            None
        };
        let wants_cache = page_code == crate::scsi::ModePageCode::CacheMode as u8
            || page_code == crate::scsi::ModePageCode::AllSupportedModes as u8;
        // WCE lives in the GetFeatures completion's DWORD0, bit 0 — this
        // command carries no data page, so there is no allocation to read.
        let wce = if wants_cache {
            completions.get(slot).map(|cpl| cpl.cdw0 & 0x1 != 0)
        } else {
            None
        };
        codec::mode_sense::to_scsi(page_code, llbaa, dbd, namespace_page, wce, use_10_byte_header, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU64, Ordering};

    static NEXT_PAGE: AtomicU64 = AtomicU64::new(0);
    static mut BACKING: [u8; 4096 * 16] = [0u8; 4096 * 16];

    fn test_alloc(count: u32) -> u64 {
        if count == 0 {
            return 0;
        }
        let page = NEXT_PAGE.fetch_add(count as u64, Ordering::SeqCst);
        // SAFETY: each call claims a disjoint page range via the atomic
        // counter; tests never read past what they themselves allocated.
        unsafe { BACKING.as_mut_ptr().add((page * 4096) as usize) as u64 }
    }

    fn test_dealloc(_address: u64, _count: u32) {}

    fn ensure_runtime() {
        crate::runtime::set_alloc_callbacks(test_alloc, test_dealloc);
    }

    #[test]
    fn test_unit_ready_round_trip_needs_no_allocation() {
        ensure_runtime();
        let mut pipeline = Pipeline::new(1, 4096);
        pipeline.set_device_ready(true);
        let cdb = [0u8; 6];
        let begin = pipeline.begin(&cdb, &[]).unwrap();
        assert_eq!(begin, BeginStatus::NoTranslation { alloc_len: 0 });
        assert!(pipeline.nvme_wrappers().is_empty());
        let mut out = [0u8; 16];
        let mut sense = [0u8; 18];
        let result = pipeline.complete(&[], &mut out, &mut sense).unwrap();
        assert_eq!(result.status, Status::Good);
    }

    #[test]
    fn test_unit_ready_not_ready_reports_check_condition() {
        ensure_runtime();
        let mut pipeline = Pipeline::new(1, 4096);
        pipeline.set_device_ready(false);
        let cdb = [0u8; 6];
        pipeline.begin(&cdb, &[]).unwrap();
        let mut out = [0u8; 16];
        let mut sense = [0u8; 18];
        let result = pipeline.complete(&[], &mut out, &mut sense).unwrap();
        assert_eq!(result.status, Status::CheckCondition);
    }

    #[test]
    fn begin_twice_without_complete_is_not_ready() {
        ensure_runtime();
        let mut pipeline = Pipeline::new(1, 4096);
        let cdb = [0u8; 6];
        pipeline.begin(&cdb, &[]).unwrap();
        assert_eq!(pipeline.begin(&cdb, &[]).unwrap_err(), PipelineError::NotReady);
    }

    #[test]
    fn abort_returns_to_uninitialized() {
        ensure_runtime();
        let mut pipeline = Pipeline::new(1, 4096);
        let cdb = [0u8; 6];
        pipeline.begin(&cdb, &[]).unwrap();
        pipeline.abort();
        assert!(pipeline.begin(&cdb, &[]).is_ok());
    }

    #[test]
    fn read10_builds_one_wrapper_with_prp_set() {
        ensure_runtime();
        let mut pipeline = Pipeline::new(1, 4096);
        let mut cdb = [0u8; 10];
        cdb[0] = OpCode::Read10 as u8;
        cdb[7..9].copy_from_slice(&1u16.to_be_bytes());
        let begin = pipeline.begin(&cdb, &[]).unwrap();
        assert_eq!(begin, BeginStatus::Ready { alloc_len: 0 });
        assert_eq!(pipeline.nvme_wrappers().len(), 1);
        // Read/Write commands carry no admin payload; PRP is filled in by
        // the caller's own I/O queue plumbing, not by this pipeline.
        assert_eq!(pipeline.nvme_wrappers()[0].buffer_len, 0);
    }

    #[test]
    fn unsupported_opcode_is_invalid_input() {
        ensure_runtime();
        let mut pipeline = Pipeline::new(1, 4096);
        let cdb = [0xffu8; 16];
        let begin = pipeline.begin(&cdb, &[]).unwrap();
        assert_eq!(begin, BeginStatus::InvalidInput);
    }

    #[test]
    fn unmap_materializes_dsm_ranges_into_the_allocation() {
        ensure_runtime();
        let mut pipeline = Pipeline::new(1, 4096);
        let mut cdb = [0u8; 10];
        cdb[0] = OpCode::Unmap as u8;

        let mut param = [0u8; scsi::UnmapParamList::SIZE + 16];
        param[2..4].copy_from_slice(&16u16.to_be_bytes());
        param[8..16].copy_from_slice(&5u64.to_be_bytes()); // LBA
        param[16..20].copy_from_slice(&3u32.to_be_bytes()); // block count

        let begin = pipeline.begin(&cdb, &param).unwrap();
        assert_eq!(begin, BeginStatus::Ready { alloc_len: 0 });

        let page = pipeline.allocations[0].data();
        let lb_count = u32::from_le_bytes([page[4], page[5], page[6], page[7]]);
        let lba = u64::from_le_bytes([
            page[8], page[9], page[10], page[11], page[12], page[13], page[14], page[15],
        ]);
        assert_eq!(lb_count, 3);
        assert_eq!(lba, 5);
    }

    #[test]
    fn mode_sense_cache_page_reflects_getfeatures_completion() {
        ensure_runtime();
        let mut pipeline = Pipeline::new(1, 4096);
        let mut cdb = [0u8; 6];
        cdb[0] = OpCode::ModeSense6 as u8;
        cdb[1] = crate::scsi::ModePageCode::CacheMode as u8; // dbd=0
        cdb[3] = 64;

        let begin = pipeline.begin(&cdb, &[]).unwrap();
        assert_eq!(begin, BeginStatus::Ready { alloc_len: 64 });
        assert_eq!(pipeline.nvme_wrappers().len(), 2);

        let identify_cpl = GenericQueueEntryCpl::default();
        let mut getfeatures_cpl = GenericQueueEntryCpl::default();
        getfeatures_cpl.cdw0 = 0x1; // WCE set

        let mut out = [0u8; 64];
        let mut sense = [0u8; 18];
        let result = pipeline
            .complete(&[identify_cpl, getfeatures_cpl], &mut out, &mut sense)
            .unwrap();
        assert_eq!(result.status, Status::Good);

        // header (4) + short block descriptor (8) precede the cache page;
        // WCE is bit 2 of the cache page's third byte.
        let cache_page_start = 4 + 8;
        assert_ne!(out[cache_page_start + 2] & 0x04, 0);
    }

    #[test]
    fn inquiry_surfaces_its_allocation_length() {
        ensure_runtime();
        let mut pipeline = Pipeline::new(1, 4096);
        let mut cdb = [0u8; 6];
        cdb[0] = OpCode::Inquiry as u8;
        cdb[3..5].copy_from_slice(&96u16.to_be_bytes());
        let begin = pipeline.begin(&cdb, &[]).unwrap();
        assert_eq!(begin, BeginStatus::Ready { alloc_len: 96 });
    }
}
