//! Per-command codecs (C5): one `to_nvme`/`to_scsi` pair per supported
//! SCSI opcode, dispatched by [`crate::pipeline`].

pub mod inquiry;
pub mod log_sense;
pub mod mode_sense;
pub mod read_write;
pub mod read_capacity;
pub mod report_luns;
pub mod report_supported_opcodes;
pub mod request_sense;
pub mod sync_cache;
pub mod test_unit_ready;
pub mod unmap;
pub mod verify;

use crate::error::TranslationError;
use crate::nvme::GenericQueueEntryCmd;

/// Parameters shared by every codec, supplied by the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct CodecContext {
    pub nsid: u32,
    pub page_size: u32,
}

/// One NVMe command plus the queue it's destined for and the length of
/// the data buffer its PRP points at.
#[derive(Debug, Clone, Copy)]
pub struct NvmeCmdWrapper {
    pub cmd: GenericQueueEntryCmd,
    pub is_admin: bool,
    pub buffer_len: u32,
}

impl NvmeCmdWrapper {
    pub const fn new(cmd: GenericQueueEntryCmd, is_admin: bool, buffer_len: u32) -> Self {
        NvmeCmdWrapper {
            cmd,
            is_admin,
            buffer_len,
        }
    }
}

/// Fixed-capacity list of the NVMe commands one codec invocation produces.
/// Never grows past [`crate::constants::MAX_COMMAND_RATIO`].
#[derive(Debug, Clone, Copy)]
pub struct CmdList {
    items: [NvmeCmdWrapper; crate::constants::MAX_COMMAND_RATIO],
    len: usize,
}

impl CmdList {
    pub const fn new() -> Self {
        let empty = NvmeCmdWrapper {
            cmd: GenericQueueEntryCmd::new(),
            is_admin: false,
            buffer_len: 0,
        };
        CmdList {
            items: [empty; crate::constants::MAX_COMMAND_RATIO],
            len: 0,
        }
    }

    pub fn push(&mut self, wrapper: NvmeCmdWrapper) -> Result<(), TranslationError> {
        if self.len >= self.items.len() {
            return Err(TranslationError::Failure);
        }
        self.items[self.len] = wrapper;
        self.len += 1;
        Ok(())
    }

    pub fn as_slice(&self) -> &[NvmeCmdWrapper] {
        &self.items[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [NvmeCmdWrapper] {
        &mut self.items[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for CmdList {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the 4-bit PRINFO field from a 3-bit RDPROTECT/WRPROTECT/VRPROTECT
/// value. `force_pract` ORs PRACT on unconditionally, matching Verify's
/// variance on the otherwise-shared Read/Write table.
pub fn build_prinfo(protect: u8, force_pract: bool) -> Result<u8, TranslationError> {
    let (pract, prchk) = match protect {
        0b000 => (1u8, 0b111u8),
        0b001 | 0b101 => (0u8, 0b111u8),
        0b010 => (0u8, 0b011u8),
        0b011 => (0u8, 0b000u8),
        0b100 => (0u8, 0b100u8),
        _ => return Err(TranslationError::InvalidInput),
    };
    let pract = if force_pract { 1 } else { pract };
    Ok((pract << 3) | prchk)
}

/// Verify's BYTCHK-branched variant of the PRINFO table: PRCHK comes from
/// RDPROTECT only when BYTCHK=0; when BYTCHK=1, only VRPROTECT=0 yields a
/// non-zero PRCHK. PRACT is always forced to 1.
pub fn build_prinfo_verify(protect: u8, bytchk: u8) -> Result<u8, TranslationError> {
    if bytchk == 0 {
        build_prinfo(protect, true)
    } else {
        let prchk = if protect == 0 { 0b111 } else { 0 };
        Ok((1 << 3) | prchk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prinfo_table_matches_spec() {
        assert_eq!(build_prinfo(0b000, false).unwrap(), (1 << 3) | 0b111);
        assert_eq!(build_prinfo(0b001, false).unwrap(), 0b111);
        assert_eq!(build_prinfo(0b101, false).unwrap(), 0b111);
        assert_eq!(build_prinfo(0b010, false).unwrap(), 0b011);
        assert_eq!(build_prinfo(0b011, false).unwrap(), 0b000);
        assert_eq!(build_prinfo(0b100, false).unwrap(), 0b100);
        assert!(build_prinfo(0b110, false).is_err());
        assert!(build_prinfo(0b111, false).is_err());
    }

    #[test]
    fn prinfo_verify_forces_pract() {
        assert_eq!(build_prinfo_verify(0b000, 0).unwrap(), (1 << 3) | 0b111);
        assert_eq!(build_prinfo_verify(0b000, 1).unwrap(), (1 << 3) | 0b111);
        assert_eq!(build_prinfo_verify(0b001, 1).unwrap(), 1 << 3);
    }

    #[test]
    fn cmd_list_rejects_overflow() {
        let mut list = CmdList::new();
        for _ in 0..crate::constants::MAX_COMMAND_RATIO {
            list.push(NvmeCmdWrapper::new(GenericQueueEntryCmd::new(), true, 0))
                .unwrap();
        }
        assert!(list
            .push(NvmeCmdWrapper::new(GenericQueueEntryCmd::new(), true, 0))
            .is_err());
    }
}
