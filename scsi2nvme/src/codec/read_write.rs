//! Read(6/10/12/16) and Write(6/10/12/16): one NVM I/O command each, the
//! two families being mirror images of each other differing only in
//! opcode and the protect field's name (RDPROTECT vs. WRPROTECT).

use super::{build_prinfo, CmdList, CodecContext, NvmeCmdWrapper};
use crate::error::TranslationError;
use crate::nvme::{GenericQueueEntryCmd, NvmOpcode};
use crate::scsi::{Read10Command, Read12Command, Read16Command, Read6Command};
use crate::scsi::{Write10Command, Write12Command, Write16Command, Write6Command};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

fn opcode(direction: Direction) -> u8 {
    match direction {
        Direction::Read => NvmOpcode::Read as u8,
        Direction::Write => NvmOpcode::Write as u8,
    }
}

/// Read6/Write6 carry neither a protection field nor FUA; `cdw12` is NLB
/// alone, matching the original `GenericRead`'s 6-byte path.
fn build_plain(
    ctx: &CodecContext,
    direction: Direction,
    lba: u64,
    nlb_minus_one: u32,
) -> Result<CmdList, TranslationError> {
    let mut cmd = GenericQueueEntryCmd::new();
    cmd.set_opcode(opcode(direction));
    cmd.nsid = ctx.nsid;
    cmd.cdw10 = lba as u32;
    cmd.cdw11 = (lba >> 32) as u32;
    cmd.cdw12 = nlb_minus_one;

    let mut list = CmdList::new();
    list.push(NvmeCmdWrapper::new(cmd, false, 0))?;
    Ok(list)
}

fn build(
    ctx: &CodecContext,
    direction: Direction,
    lba: u64,
    nlb_minus_one: u32,
    protect: u8,
    fua: bool,
) -> Result<CmdList, TranslationError> {
    let prinfo = build_prinfo(protect, false)?;
    let mut cmd = GenericQueueEntryCmd::new();
    cmd.set_opcode(opcode(direction));
    cmd.nsid = ctx.nsid;
    cmd.cdw10 = lba as u32;
    cmd.cdw11 = (lba >> 32) as u32;
    cmd.cdw12 = nlb_minus_one | ((prinfo as u32) << 26) | ((fua as u32) << 30);

    let mut list = CmdList::new();
    list.push(NvmeCmdWrapper::new(cmd, false, 0))?;
    Ok(list)
}

pub fn to_nvme_6(
    ctx: &CodecContext,
    direction: Direction,
    lba: u32,
    transfer_length: u8,
    control_byte_naca: bool,
) -> Result<CmdList, TranslationError> {
    if control_byte_naca {
        return Err(TranslationError::InvalidInput);
    }
    let blocks = if transfer_length == 0 {
        256
    } else {
        transfer_length as u32
    };
    build_plain(ctx, direction, lba as u64, blocks - 1)
}

pub fn to_nvme_10(
    ctx: &CodecContext,
    direction: Direction,
    lba: u32,
    transfer_length: u16,
    protect: u8,
    fua: bool,
    control_byte_naca: bool,
) -> Result<CmdList, TranslationError> {
    if control_byte_naca {
        return Err(TranslationError::InvalidInput);
    }
    if transfer_length == 0 {
        return Err(TranslationError::NoTranslation);
    }
    build(ctx, direction, lba as u64, transfer_length as u32 - 1, protect, fua)
}

pub fn to_nvme_12(
    ctx: &CodecContext,
    direction: Direction,
    lba: u32,
    transfer_length: u32,
    protect: u8,
    fua: bool,
    control_byte_naca: bool,
) -> Result<CmdList, TranslationError> {
    if control_byte_naca {
        return Err(TranslationError::InvalidInput);
    }
    if transfer_length == 0 {
        return Err(TranslationError::NoTranslation);
    }
    if transfer_length > 0xffff {
        return Err(TranslationError::InvalidInput);
    }
    build(ctx, direction, lba as u64, transfer_length - 1, protect, fua)
}

pub fn to_nvme_16(
    ctx: &CodecContext,
    direction: Direction,
    lba: u64,
    transfer_length: u32,
    protect: u8,
    fua: bool,
    control_byte_naca: bool,
) -> Result<CmdList, TranslationError> {
    if control_byte_naca {
        return Err(TranslationError::InvalidInput);
    }
    if transfer_length == 0 {
        return Err(TranslationError::NoTranslation);
    }
    if transfer_length > 0xffff {
        return Err(TranslationError::InvalidInput);
    }
    build(ctx, direction, lba, transfer_length - 1, protect, fua)
}

pub fn read6_to_nvme(ctx: &CodecContext, cdb: &Read6Command) -> Result<CmdList, TranslationError> {
    to_nvme_6(
        ctx,
        Direction::Read,
        cdb.logical_block_address(),
        cdb.transfer_length(),
        cdb.control_byte().naca(),
    )
}

pub fn write6_to_nvme(ctx: &CodecContext, cdb: &Write6Command) -> Result<CmdList, TranslationError> {
    to_nvme_6(
        ctx,
        Direction::Write,
        cdb.logical_block_address(),
        cdb.transfer_length(),
        cdb.control_byte().naca(),
    )
}

pub fn read10_to_nvme(ctx: &CodecContext, cdb: &Read10Command) -> Result<CmdList, TranslationError> {
    to_nvme_10(
        ctx,
        Direction::Read,
        cdb.logical_block_address(),
        cdb.transfer_length(),
        cdb.protect(),
        cdb.fua(),
        cdb.control_byte().naca(),
    )
}

pub fn write10_to_nvme(ctx: &CodecContext, cdb: &Write10Command) -> Result<CmdList, TranslationError> {
    to_nvme_10(
        ctx,
        Direction::Write,
        cdb.logical_block_address(),
        cdb.transfer_length(),
        cdb.protect(),
        cdb.fua(),
        cdb.control_byte().naca(),
    )
}

pub fn read12_to_nvme(ctx: &CodecContext, cdb: &Read12Command) -> Result<CmdList, TranslationError> {
    to_nvme_12(
        ctx,
        Direction::Read,
        cdb.logical_block_address(),
        cdb.transfer_length(),
        cdb.protect(),
        cdb.fua(),
        cdb.control_byte().naca(),
    )
}

pub fn write12_to_nvme(ctx: &CodecContext, cdb: &Write12Command) -> Result<CmdList, TranslationError> {
    to_nvme_12(
        ctx,
        Direction::Write,
        cdb.logical_block_address(),
        cdb.transfer_length(),
        cdb.protect(),
        cdb.fua(),
        cdb.control_byte().naca(),
    )
}

pub fn read16_to_nvme(ctx: &CodecContext, cdb: &Read16Command) -> Result<CmdList, TranslationError> {
    to_nvme_16(
        ctx,
        Direction::Read,
        cdb.logical_block_address(),
        cdb.transfer_length(),
        cdb.protect(),
        cdb.fua(),
        cdb.control_byte().naca(),
    )
}

pub fn write16_to_nvme(ctx: &CodecContext, cdb: &Write16Command) -> Result<CmdList, TranslationError> {
    to_nvme_16(
        ctx,
        Direction::Write,
        cdb.logical_block_address(),
        cdb.transfer_length(),
        cdb.protect(),
        cdb.fua(),
        cdb.control_byte().naca(),
    )
}

/// Read/Write produce no response payload beyond the data transferred by
/// the NVMe command itself; `to_scsi` is a pass-through returning Good
/// whenever the pipeline's status mapper saw no error completion.
pub fn to_scsi() {}

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
    fn read6_zero_length_means_256_blocks() {
        let list = to_nvme_6(&ctx(), Direction::Read, 0, 0, false).unwrap();
        assert_eq!(list.as_slice()[0].cmd.cdw12 & 0xffff, 255);
    }

    #[test]
    fn read10_zero_length_is_no_translation() {
        let err = to_nvme_10(&ctx(), Direction::Read, 0, 0, 0, false, false).unwrap_err();
        assert_eq!(err, TranslationError::NoTranslation);
    }

    #[test]
    fn read12_over_16_bit_length_is_invalid() {
        let err = to_nvme_12(&ctx(), Direction::Read, 0, 0x1_0000, 0, false, false).unwrap_err();
        assert_eq!(err, TranslationError::InvalidInput);
    }

    #[test]
    fn read16_splits_lba_across_two_dwords() {
        let list = to_nvme_16(&ctx(), Direction::Read, 0x1_0000_0002, 1, 0, false, false).unwrap();
        let cmd = &list.as_slice()[0].cmd;
        assert_eq!(cmd.cdw10, 2);
        assert_eq!(cmd.cdw11, 1);
    }

    #[test]
    fn fua_sets_bit_30_of_cdw12() {
        let list = to_nvme_10(&ctx(), Direction::Write, 0, 1, 0, true, false).unwrap();
        assert_ne!(list.as_slice()[0].cmd.cdw12 & (1 << 30), 0);
    }

    #[test]
    fn read6_sets_no_prinfo_or_fua() {
        let list = to_nvme_6(&ctx(), Direction::Read, 0, 1, false).unwrap();
        assert_eq!(list.as_slice()[0].cmd.cdw12, 0);
    }

    #[test]
    fn naca_rejected_across_all_variants() {
        assert!(to_nvme_6(&ctx(), Direction::Read, 0, 1, true).is_err());
        assert!(to_nvme_10(&ctx(), Direction::Read, 0, 1, 0, false, true).is_err());
        assert!(to_nvme_12(&ctx(), Direction::Read, 0, 1, 0, false, true).is_err());
        assert!(to_nvme_16(&ctx(), Direction::Read, 0, 1, 0, false, true).is_err());
    }
}
