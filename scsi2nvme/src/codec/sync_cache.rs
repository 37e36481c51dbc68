//! SynchronizeCache10/16: one NVM I/O command, opcode=Flush. No data
//! transfer and no response payload.

use super::{CmdList, CodecContext, NvmeCmdWrapper};
use crate::error::TranslationError;
use crate::nvme::{GenericQueueEntryCmd, NvmOpcode};
use crate::scsi::{SynchronizeCache10Command, SynchronizeCache16Command};

fn build(ctx: &CodecContext) -> Result<CmdList, TranslationError> {
    let mut cmd = GenericQueueEntryCmd::new();
    cmd.set_opcode(NvmOpcode::Flush as u8);
    cmd.nsid = ctx.nsid;

    let mut list = CmdList::new();
    list.push(NvmeCmdWrapper::new(cmd, false, 0))?;
    Ok(list)
}

pub fn sync10_to_nvme(
    ctx: &CodecContext,
    cdb: &SynchronizeCache10Command,
) -> Result<CmdList, TranslationError> {
    if cdb.control_byte().naca() {
        return Err(TranslationError::InvalidInput);
    }
    build(ctx)
}

pub fn sync16_to_nvme(
    ctx: &CodecContext,
    cdb: &SynchronizeCache16Command,
) -> Result<CmdList, TranslationError> {
    if cdb.control_byte().naca() {
        return Err(TranslationError::InvalidInput);
    }
    build(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_single_flush_command() {
        let ctx = CodecContext {
            nsid: 3,
            page_size: 4096,
        };
        let cdb = SynchronizeCache10Command::new();
        let list = sync10_to_nvme(&ctx, &cdb).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.as_slice()[0].cmd.cdw0 & 0xff, NvmOpcode::Flush as u32);
        assert_eq!(list.as_slice()[0].cmd.nsid, 3);
    }
}
