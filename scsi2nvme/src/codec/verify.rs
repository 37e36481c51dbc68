//! Verify(10/12/16): one NVM I/O command, opcode=Compare. PRINFO branches
//! on BYTCHK rather than following the plain Read/Write table directly.

use super::{build_prinfo_verify, CmdList, CodecContext, NvmeCmdWrapper};
use crate::error::TranslationError;
use crate::nvme::{GenericQueueEntryCmd, NvmOpcode};
use crate::scsi::{Verify10Command, Verify12Command, Verify16Command};

fn build(
    ctx: &CodecContext,
    lba: u64,
    nlb_minus_one: u32,
    protect: u8,
    bytchk: u8,
) -> Result<CmdList, TranslationError> {
    let prinfo = build_prinfo_verify(protect, bytchk)?;
    let mut cmd = GenericQueueEntryCmd::new();
    cmd.set_opcode(NvmOpcode::Compare as u8);
    cmd.nsid = ctx.nsid;
    cmd.cdw10 = lba as u32;
    cmd.cdw11 = (lba >> 32) as u32;
    cmd.cdw12 = nlb_minus_one | ((prinfo as u32) << 26);

    let mut list = CmdList::new();
    list.push(NvmeCmdWrapper::new(cmd, false, 0))?;
    Ok(list)
}

pub fn verify10_to_nvme(ctx: &CodecContext, cdb: &Verify10Command) -> Result<CmdList, TranslationError> {
    if cdb.control_byte().naca() {
        return Err(TranslationError::InvalidInput);
    }
    let length = cdb.verification_length();
    if length == 0 {
        return Err(TranslationError::NoTranslation);
    }
    build(ctx, cdb.logical_block_address() as u64, length as u32 - 1, cdb.protect(), cdb.bytchk())
}

pub fn verify12_to_nvme(ctx: &CodecContext, cdb: &Verify12Command) -> Result<CmdList, TranslationError> {
    if cdb.control_byte().naca() {
        return Err(TranslationError::InvalidInput);
    }
    let length = cdb.verification_length();
    if length == 0 {
        return Err(TranslationError::NoTranslation);
    }
    build(ctx, cdb.logical_block_address() as u64, length - 1, cdb.protect(), cdb.bytchk())
}

pub fn verify16_to_nvme(ctx: &CodecContext, cdb: &Verify16Command) -> Result<CmdList, TranslationError> {
    if cdb.control_byte().naca() {
        return Err(TranslationError::InvalidInput);
    }
    let length = cdb.verification_length();
    if length == 0 {
        return Err(TranslationError::NoTranslation);
    }
    build(ctx, cdb.logical_block_address(), length - 1, cdb.protect(), cdb.bytchk())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> CodecContext {
        CodecContext {
            nsid: 1,
            page_size: 4096,
        }
    }

    #[test]
    fn zero_length_is_no_translation() {
        let cdb = Verify10Command::new();
        assert_eq!(
            verify10_to_nvme(&ctx(), &cdb).unwrap_err(),
            TranslationError::NoTranslation
        );
    }

    #[test]
    fn bytchk_one_forces_prchk_from_vrprotect_zero_only() {
        let mut bytes = [0u8; 9];
        bytes[0] = 0b0000_0010; // bytchk = 1
        bytes[6..8].copy_from_slice(&1u16.to_be_bytes());
        let cdb = Verify10Command::from_bytes(&bytes).unwrap();
        let list = verify10_to_nvme(&ctx(), &cdb).unwrap();
        let prinfo = (list.as_slice()[0].cmd.cdw12 >> 26) as u8;
        assert_eq!(prinfo, (1 << 3) | 0b111);
    }
}
