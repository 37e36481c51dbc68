//! ModeSense6/10: composed translation. Emits up to two Admin commands
//! (Identify-Namespace for the block descriptor, GetFeatures for the
//! cache page's WCE bit) and assembles a header, optional block
//! descriptor, and one or more mode pages.

use super::{CmdList, CodecContext, NvmeCmdWrapper};
use crate::error::TranslationError;
use crate::nvme::{AdminOpcode, FeatureSelect, FeatureType, GenericQueueEntryCmd, IdentifyNamespace};
use crate::scsi::{
    CachingModePage, ControlModePage, ModeParameter10Header, ModeParameter6Header, ModePageCode,
    PageControl, PowerConditionModePage, ShortLbaBlockDescriptor,
};

const CNS_NAMESPACE: u32 = 0x0;

fn select_to_fid_sel(pc: u8) -> Result<u8, TranslationError> {
    match pc {
        x if x == PageControl::Current as u8 => Ok(FeatureSelect::Current as u8),
        x if x == PageControl::Changeable as u8 => Ok(FeatureSelect::Saved as u8),
        x if x == PageControl::Default as u8 => Ok(FeatureSelect::Default as u8),
        _ => Err(TranslationError::Failure),
    }
}

fn wants_cache_page(page_code: u8) -> bool {
    page_code == ModePageCode::CacheMode as u8 || page_code == ModePageCode::AllSupportedModes as u8
}

pub fn to_nvme(
    ctx: &CodecContext,
    page_code: u8,
    pc: u8,
    dbd: bool,
) -> Result<CmdList, TranslationError> {
    let supported = page_code == ModePageCode::CacheMode as u8
        || page_code == ModePageCode::ControlMode as u8
        || page_code == ModePageCode::PowerConditionMode as u8
        || page_code == ModePageCode::AllSupportedModes as u8;
    if !supported {
        return Err(TranslationError::Failure);
    }

    let mut list = CmdList::new();

    if !dbd {
        let mut cmd = GenericQueueEntryCmd::new();
        cmd.set_opcode(AdminOpcode::Identify as u8);
        cmd.nsid = ctx.nsid;
        cmd.cdw10 = CNS_NAMESPACE;
        list.push(NvmeCmdWrapper::new(cmd, true, ctx.page_size))?;
    }

    if wants_cache_page(page_code) {
        let sel = select_to_fid_sel(pc)?;
        let mut cmd = GenericQueueEntryCmd::new();
        cmd.set_opcode(AdminOpcode::GetFeatures as u8);
        cmd.nsid = ctx.nsid;
        cmd.cdw10 = (FeatureType::VolatileWriteCache as u32) | ((sel as u32) << 8);
        list.push(NvmeCmdWrapper::new(cmd, true, 0))?;
    }

    Ok(list)
}

fn cache_page_template(wce: bool) -> CachingModePage {
    let mut page = CachingModePage::new();
    page.set_page_code(ModePageCode::CacheMode as u8, 18);
    page.set_wce(wce);
    page.set_rcd(false);
    page
}

fn control_page_template() -> ControlModePage {
    let mut page = ControlModePage::new();
    page.set_page_code(ModePageCode::ControlMode as u8, 10);
    page.set_d_sense(false);
    page
}

fn power_condition_page_template() -> PowerConditionModePage {
    let mut page = PowerConditionModePage::new();
    page.set_page_code(ModePageCode::PowerConditionMode as u8, 38);
    page
}

/// Builds the ToScsi response. `wce` is the bit-0 result of the
/// GetFeatures completion (absent when the page didn't need one).
pub fn to_scsi(
    page_code: u8,
    llbaa: bool,
    dbd: bool,
    namespace_page: Option<&[u8]>,
    wce: Option<bool>,
    use_10_byte_header: bool,
    out: &mut [u8],
) -> Result<usize, TranslationError> {
    let descriptor_len = if llbaa {
        crate::scsi::LongLbaBlockDescriptor::SIZE
    } else {
        ShortLbaBlockDescriptor::SIZE
    };

    let mut pages_len = 0usize;
    if page_code == ModePageCode::CacheMode as u8 || page_code == ModePageCode::AllSupportedModes as u8 {
        pages_len += CachingModePage::SIZE;
    }
    if page_code == ModePageCode::ControlMode as u8 || page_code == ModePageCode::AllSupportedModes as u8 {
        pages_len += ControlModePage::SIZE;
    }
    if page_code == ModePageCode::PowerConditionMode as u8 || page_code == ModePageCode::AllSupportedModes as u8 {
        pages_len += PowerConditionModePage::SIZE;
    }

    let header_len = if use_10_byte_header {
        ModeParameter10Header::SIZE
    } else {
        ModeParameter6Header::SIZE
    };
    let bdl = if dbd { 0 } else { descriptor_len };
    let total = header_len + bdl + pages_len;
    if out.len() < total {
        return Err(TranslationError::Failure);
    }

    let mut pos = header_len;
    if !dbd {
        let ns = namespace_page.and_then(to_ns).ok_or(TranslationError::Failure)?;
        let lbads = ns.lbaf(ns.flbas_format() as usize).lbads();
        let block_length = 1u32 << lbads;
        if llbaa {
            let mut desc = crate::scsi::LongLbaBlockDescriptor::new();
            desc.set_number_of_blocks(ns.ncap());
            desc.set_logical_block_length(block_length);
            out[pos..pos + descriptor_len].copy_from_slice(desc.as_bytes());
        } else {
            let mut desc = ShortLbaBlockDescriptor::new();
            desc.set_number_of_blocks(ns.ncap() as u32);
            desc.set_logical_block_length(block_length);
            out[pos..pos + descriptor_len].copy_from_slice(desc.as_bytes());
        }
        pos += descriptor_len;
    }

    if page_code == ModePageCode::CacheMode as u8 || page_code == ModePageCode::AllSupportedModes as u8 {
        let page = cache_page_template(wce.unwrap_or(false));
        out[pos..pos + CachingModePage::SIZE].copy_from_slice(page.as_bytes());
        pos += CachingModePage::SIZE;
    }
    if page_code == ModePageCode::ControlMode as u8 || page_code == ModePageCode::AllSupportedModes as u8 {
        let page = control_page_template();
        out[pos..pos + ControlModePage::SIZE].copy_from_slice(page.as_bytes());
        pos += ControlModePage::SIZE;
    }
    if page_code == ModePageCode::PowerConditionMode as u8 || page_code == ModePageCode::AllSupportedModes as u8 {
        let page = power_condition_page_template();
        out[pos..pos + PowerConditionModePage::SIZE].copy_from_slice(page.as_bytes());
        pos += PowerConditionModePage::SIZE;
    }

    if use_10_byte_header {
        let mut header = ModeParameter10Header::new();
        header.set_mode_data_length((total - 2) as u16);
        header.set_longlba(llbaa);
        header.set_block_descriptor_length(bdl as u16);
        out[..header_len].copy_from_slice(header.as_bytes());
    } else {
        let mut header = ModeParameter6Header::new();
        header.set_mode_data_length((total - 1) as u8);
        header.set_block_descriptor_length(bdl as u8);
        out[..header_len].copy_from_slice(header.as_bytes());
    }

    Ok(pos)
}

fn to_ns(page: &[u8]) -> Option<IdentifyNamespace> {
    if page.len() < IdentifyNamespace::SIZE {
        return None;
    }
    let mut bytes = [0u8; IdentifyNamespace::SIZE];
    bytes.copy_from_slice(&page[..IdentifyNamespace::SIZE]);
    Some(IdentifyNamespace(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_page_rejected() {
        let ctx = CodecContext {
            nsid: 1,
            page_size: 4096,
        };
        let err = to_nvme(&ctx, 0x1c, 0, true).unwrap_err();
        assert_eq!(err, TranslationError::Failure);
    }

    #[test]
    fn dbd_set_skips_identify_and_cache_page_adds_getfeatures() {
        let ctx = CodecContext {
            nsid: 1,
            page_size: 4096,
        };
        let list = to_nvme(&ctx, ModePageCode::CacheMode as u8, PageControl::Current as u8, true).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.as_slice()[0].cmd.cdw0 & 0xff, AdminOpcode::GetFeatures as u32);
    }

    #[test]
    fn control_page_alone_needs_no_getfeatures() {
        let ctx = CodecContext {
            nsid: 1,
            page_size: 4096,
        };
        let list = to_nvme(&ctx, ModePageCode::ControlMode as u8, 0, true).unwrap();
        assert!(list.is_empty());
    }
}
