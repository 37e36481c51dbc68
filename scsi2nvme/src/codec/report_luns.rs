//! ReportLuns: one Admin Identify command, CNS=2 (namespace ID list).

use super::{CmdList, CodecContext, NvmeCmdWrapper};
use crate::error::TranslationError;
use crate::nvme::{AdminOpcode, GenericQueueEntryCmd, IdentifyNamespaceList};
use crate::scsi::ReportLunsParamData;

const CNS_NAMESPACE_LIST: u32 = 0x2;
const MAX_IDS: usize = 1024;

pub fn to_nvme(ctx: &CodecContext) -> Result<CmdList, TranslationError> {
    let mut cmd = GenericQueueEntryCmd::new();
    cmd.set_opcode(AdminOpcode::Identify as u8);
    cmd.cdw10 = CNS_NAMESPACE_LIST;

    let mut list = CmdList::new();
    list.push(NvmeCmdWrapper::new(cmd, true, ctx.page_size))?;
    Ok(list)
}

pub fn to_scsi(page: &[u8], out: &mut [u8]) -> Result<usize, TranslationError> {
    if page.len() < IdentifyNamespaceList::SIZE {
        return Err(TranslationError::Failure);
    }
    let mut bytes = [0u8; IdentifyNamespaceList::SIZE];
    bytes.copy_from_slice(&page[..IdentifyNamespaceList::SIZE]);
    let list = IdentifyNamespaceList(bytes);

    let mut count = 0usize;
    while count < MAX_IDS && list.id(count) != 0 {
        count += 1;
    }

    let header_len = ReportLunsParamData::SIZE;
    let available = out.len().saturating_sub(header_len) / 8;
    let emitted = count.min(available);

    let mut header = ReportLunsParamData::new();
    header.set_list_byte_length((emitted * 8) as u32);
    out[..header_len].copy_from_slice(header.as_bytes());

    for i in 0..emitted {
        let lun = list.id(i) - 1;
        let offset = header_len + i * 8;
        out[offset..offset + 8].copy_from_slice(&(lun as u64).to_be_bytes());
    }

    Ok(header_len + emitted * 8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_nsid_minus_one_as_lun() {
        let mut page = [0u8; IdentifyNamespaceList::SIZE];
        page[0..4].copy_from_slice(&1u32.to_le_bytes());
        page[4..8].copy_from_slice(&2u32.to_le_bytes());
        let mut out = [0u8; ReportLunsParamData::SIZE + 16];
        let len = to_scsi(&page, &mut out).unwrap();
        assert_eq!(len, ReportLunsParamData::SIZE + 16);
        assert_eq!(u32::from_be_bytes(out[0..4].try_into().unwrap()), 16);
        assert_eq!(u64::from_be_bytes(out[8..16].try_into().unwrap()), 0);
        assert_eq!(u64::from_be_bytes(out[16..24].try_into().unwrap()), 1);
    }
}
