//! ReadCapacity10: one Admin Identify-Namespace command.

use super::{CmdList, CodecContext, NvmeCmdWrapper};
use crate::error::TranslationError;
use crate::nvme::{AdminOpcode, GenericQueueEntryCmd, IdentifyNamespace};
use crate::scsi::ReadCapacity10Data;

const CNS_NAMESPACE: u32 = 0x0;

pub fn to_nvme(ctx: &CodecContext) -> Result<CmdList, TranslationError> {
    let mut cmd = GenericQueueEntryCmd::new();
    cmd.set_opcode(AdminOpcode::Identify as u8);
    cmd.nsid = ctx.nsid;
    cmd.cdw10 = CNS_NAMESPACE;

    let mut list = CmdList::new();
    list.push(NvmeCmdWrapper::new(cmd, true, ctx.page_size))?;
    Ok(list)
}

pub fn to_scsi(page: &[u8], out: &mut [u8]) -> Result<usize, TranslationError> {
    if page.len() < IdentifyNamespace::SIZE || out.len() < ReadCapacity10Data::SIZE {
        return Err(TranslationError::Failure);
    }
    let mut ns_bytes = [0u8; IdentifyNamespace::SIZE];
    ns_bytes.copy_from_slice(&page[..IdentifyNamespace::SIZE]);
    let ns = IdentifyNamespace(ns_bytes);

    let lbads = ns.lbaf(ns.flbas_format() as usize).lbads();
    if !(9..=31).contains(&lbads) {
        log::debug!("lbads={lbads} out of plausible block-size range");
        return Err(TranslationError::Failure);
    }
    let block_length = 1u32 << lbads;

    let returned_lba = if ns.nsze() > u32::MAX as u64 {
        u32::MAX
    } else {
        ns.nsze() as u32
    };

    let mut data = ReadCapacity10Data::new();
    data.set_returned_logical_block_address(returned_lba);
    data.set_block_length(block_length);
    out[..ReadCapacity10Data::SIZE].copy_from_slice(data.as_bytes());
    Ok(ReadCapacity10Data::SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespace_page(nsze: u64, lbads: u8) -> [u8; IdentifyNamespace::SIZE] {
        let mut page = [0u8; IdentifyNamespace::SIZE];
        page[0..8].copy_from_slice(&nsze.to_le_bytes());
        page[26] = 0;
        page[128..132].copy_from_slice(&((lbads as u32) << 16).to_le_bytes());
        page
    }

    #[test]
    fn small_namespace_reports_exact_block_count() {
        let page = namespace_page(1_000_000, 9);
        let mut out = [0u8; ReadCapacity10Data::SIZE];
        to_scsi(&page, &mut out).unwrap();
        assert_eq!(u32::from_be_bytes(out[0..4].try_into().unwrap()), 1_000_000);
        assert_eq!(u32::from_be_bytes(out[4..8].try_into().unwrap()), 512);
    }

    #[test]
    fn huge_namespace_caps_without_subtracting_one() {
        let page = namespace_page(u64::MAX, 9);
        let mut out = [0u8; ReadCapacity10Data::SIZE];
        to_scsi(&page, &mut out).unwrap();
        assert_eq!(u32::from_be_bytes(out[0..4].try_into().unwrap()), u32::MAX);
    }
}
