//! Unmap: one Admin Dataset-Management command built from a SCSI UNMAP
//! block descriptor list.

use super::{CmdList, CodecContext, NvmeCmdWrapper};
use crate::error::TranslationError;
use crate::nvme::{DatasetManagementRange, GenericQueueEntryCmd};
use crate::scsi::{UnmapBlockDescriptor, UnmapParamList};

const MAX_DESCRIPTORS: usize = 256;
const DSM_ATTRIBUTE_DEALLOCATE: u32 = 1 << 2;

pub fn to_nvme(
    ctx: &CodecContext,
    param_list: &[u8],
    scratch: &mut [u8],
) -> Result<CmdList, TranslationError> {
    if param_list.len() < UnmapParamList::SIZE {
        return Err(TranslationError::InvalidInput);
    }
    let mut header_bytes = [0u8; UnmapParamList::SIZE];
    header_bytes.copy_from_slice(&param_list[..UnmapParamList::SIZE]);
    let header = UnmapParamList(header_bytes);

    let block_desc_len = header.block_desc_data_length() as usize;
    if block_desc_len == 0 || block_desc_len % 16 != 0 {
        return Err(TranslationError::InvalidInput);
    }
    let count = block_desc_len / 16;
    if count > MAX_DESCRIPTORS {
        return Err(TranslationError::InvalidInput);
    }

    let descriptors_offset = UnmapParamList::SIZE;
    let descriptors_end = descriptors_offset + block_desc_len;
    if param_list.len() < descriptors_end {
        return Err(TranslationError::InvalidInput);
    }
    if scratch.len() < count * core::mem::size_of::<DatasetManagementRange>() {
        return Err(TranslationError::Failure);
    }

    for i in 0..count {
        let offset = descriptors_offset + i * 16;
        let mut bytes = [0u8; UnmapBlockDescriptor::SIZE];
        bytes.copy_from_slice(&param_list[offset..offset + 16]);
        let descriptor = UnmapBlockDescriptor(bytes);

        let range = DatasetManagementRange {
            context_attributes: 0,
            lb_count: descriptor.logical_block_count(),
            lba: descriptor.logical_block_address(),
        };
        let dst = &mut scratch[i * 16..i * 16 + 16];
        dst[0..4].copy_from_slice(&range.context_attributes.to_le_bytes());
        dst[4..8].copy_from_slice(&range.lb_count.to_le_bytes());
        dst[8..16].copy_from_slice(&range.lba.to_le_bytes());
    }

    let mut cmd = GenericQueueEntryCmd::new();
    cmd.set_opcode(crate::nvme::NvmOpcode::DatasetManagement as u8);
    cmd.nsid = ctx.nsid;
    cmd.cdw10 = count as u32 - 1;
    cmd.cdw11 = DSM_ATTRIBUTE_DEALLOCATE;

    let mut list = CmdList::new();
    list.push(NvmeCmdWrapper::new(cmd, true, (count * 16) as u32))?;
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_one_dsm_command_per_descriptor_count() {
        let ctx = CodecContext {
            nsid: 1,
            page_size: 4096,
        };
        let mut param = [0u8; UnmapParamList::SIZE + 16];
        param[2..4].copy_from_slice(&16u16.to_be_bytes());
        let mut scratch = [0u8; 16];
        let list = to_nvme(&ctx, &param, &mut scratch).unwrap();
        assert_eq!(list.as_slice()[0].cmd.cdw10, 0);
        assert_eq!(list.as_slice()[0].cmd.cdw11, DSM_ATTRIBUTE_DEALLOCATE);
    }

    #[test]
    fn rejects_non_multiple_of_16() {
        let ctx = CodecContext {
            nsid: 1,
            page_size: 4096,
        };
        let mut param = [0u8; UnmapParamList::SIZE + 8];
        param[2..4].copy_from_slice(&8u16.to_be_bytes());
        let mut scratch = [0u8; 16];
        assert!(to_nvme(&ctx, &param, &mut scratch).is_err());
    }
}
