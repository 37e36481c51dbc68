//! Inquiry: two Admin Identify commands (controller, then namespace),
//! fixed order. ToScsi dispatches on EVPD/page_code to build either the
//! standard Inquiry response or one of the supported VPD pages.

use super::{CmdList, CodecContext, NvmeCmdWrapper};
use crate::error::TranslationError;
use crate::nvme::{AdminOpcode, GenericQueueEntryCmd, IdentifyControllerData, IdentifyNamespace};
use crate::scsi::{InquiryCommand, InquiryData, PageCode, ResponseDataFormat, Version};

const CNS_CONTROLLER: u32 = 0x1;
const CNS_NAMESPACE: u32 = 0x0;

pub fn to_nvme(ctx: &CodecContext, cdb: &InquiryCommand) -> Result<CmdList, TranslationError> {
    if cdb.control_byte().naca() {
        return Err(TranslationError::InvalidInput);
    }

    let mut identify_controller = GenericQueueEntryCmd::new();
    identify_controller.set_opcode(AdminOpcode::Identify as u8);
    identify_controller.cdw10 = CNS_CONTROLLER;

    let mut identify_namespace = GenericQueueEntryCmd::new();
    identify_namespace.set_opcode(AdminOpcode::Identify as u8);
    identify_namespace.nsid = ctx.nsid;
    identify_namespace.cdw10 = CNS_NAMESPACE;

    let mut list = CmdList::new();
    list.push(NvmeCmdWrapper::new(identify_controller, true, ctx.page_size))?;
    list.push(NvmeCmdWrapper::new(identify_namespace, true, ctx.page_size))?;
    Ok(list)
}

fn to_ns(page: &[u8]) -> Option<IdentifyNamespace> {
    if page.len() < IdentifyNamespace::SIZE {
        return None;
    }
    let mut bytes = [0u8; IdentifyNamespace::SIZE];
    bytes.copy_from_slice(&page[..IdentifyNamespace::SIZE]);
    Some(IdentifyNamespace(bytes))
}

fn to_ctrl(page: &[u8]) -> Option<IdentifyControllerData> {
    if page.len() < IdentifyControllerData::SIZE {
        return None;
    }
    let mut bytes = [0u8; IdentifyControllerData::SIZE];
    bytes.copy_from_slice(&page[..IdentifyControllerData::SIZE]);
    Some(IdentifyControllerData(bytes))
}

/// Last 4 ASCII-graphic (0x21..=0x7e), non-space bytes of `field`, scanned
/// right-to-left and emitted left-to-right in the order they were found.
fn product_revision(field: &[u8]) -> [u8; 4] {
    let mut found: [u8; 4] = [b' '; 4];
    let mut count = 0usize;
    for &byte in field.iter().rev() {
        if count == 4 {
            break;
        }
        if (0x21..=0x7e).contains(&byte) {
            found[3 - count] = byte;
            count += 1;
        }
    }
    // Left-shift so the discovered bytes (in right-to-left discovery
    // order) occupy the leading slots, left-to-right.
    let mut out = [b' '; 4];
    for i in 0..count {
        out[i] = found[4 - count + i];
    }
    out
}

fn standard_inquiry(ctrl: &IdentifyControllerData, ns: &IdentifyNamespace, out: &mut [u8]) -> Result<usize, TranslationError> {
    if out.len() < InquiryData::SIZE {
        return Err(TranslationError::Failure);
    }
    let mut data = InquiryData::new();
    data.set_peripheral(0, 0); // DirectAccessBlock, Connected
    data.set_version(Version::Spc4 as u8);
    data.set_response_data_format(ResponseDataFormat::Standard as u8);
    data.set_additional_length(0x1f);

    // protect: set when the namespace declares any PI type / metadata-first
    // layout (dps bits 0-2 non-zero, or bit 3 set).
    let dps = ns.dps();
    let pit = dps & 0x7;
    let md_start = (dps >> 3) & 0x1;
    data.0[5] |= if pit == 0 && md_start == 0 { 0 } else { 1 };
    data.0[7] |= 1 << 1; // cmdque

    data.set_vendor_identification(b"NVMe    ");

    let mut product = [b' '; 16];
    product.copy_from_slice(&ctrl.mn()[..16]);
    data.set_product_identification(&product);

    data.set_product_revision_level(&product_revision(ctrl.fr()));

    out[..InquiryData::SIZE].copy_from_slice(data.as_bytes());
    Ok(InquiryData::SIZE)
}

fn supported_vpd(out: &mut [u8]) -> Result<usize, TranslationError> {
    use crate::scsi::SupportedVitalProductData;
    let pages: [u8; 7] = [0x00, 0x80, 0x83, 0x86, 0xb0, 0xb1, 0xb2];
    let total = SupportedVitalProductData::SIZE + pages.len();
    if out.len() < total {
        return Err(TranslationError::Failure);
    }
    let mut header = SupportedVitalProductData::new();
    header.set_header(0, 0, pages.len() as u8);
    out[..SupportedVitalProductData::SIZE].copy_from_slice(header.as_bytes());
    out[SupportedVitalProductData::SIZE..total].copy_from_slice(&pages);
    Ok(total)
}

fn hex_nibble(n: u8) -> u8 {
    match n {
        0..=9 => b'0' + n,
        _ => b'a' + (n - 10),
    }
}

fn write_hex_u64(value: u64, out: &mut [u8]) -> usize {
    let mut pos = 0;
    for group in 0..4 {
        if group > 0 {
            out[pos] = b'_';
            pos += 1;
        }
        let shift = (3 - group) * 16;
        let word = ((value >> shift) & 0xffff) as u16;
        for nibble in (0..4).rev() {
            out[pos] = hex_nibble(((word >> (nibble * 4)) & 0xf) as u8);
            pos += 1;
        }
    }
    pos
}

fn unit_serial_number(ns: &IdentifyNamespace, nsid: u32, out: &mut [u8]) -> Result<usize, TranslationError> {
    use crate::scsi::UnitSerialNumber;

    let nguid = ns.nguid();
    let eui64 = ns.eui64();
    let nguid_nonzero = nguid.iter().any(|&b| b != 0);
    let eui64_nonzero = eui64.iter().any(|&b| b != 0);

    let mut body = [0u8; 64];
    let page_length: u8;
    if nguid_nonzero {
        let hi = u64::from_be_bytes(nguid[0..8].try_into().unwrap());
        let lo = u64::from_be_bytes(nguid[8..16].try_into().unwrap());
        let mut pos = write_hex_u64(hi, &mut body);
        body[pos] = b'_';
        pos += 1;
        pos += write_hex_u64(lo, &mut body[pos..]);
        body[pos] = b'.';
        pos += 1;
        page_length = pos as u8;
    } else if eui64_nonzero {
        let value = u64::from_be_bytes(eui64);
        let mut pos = write_hex_u64(value, &mut body);
        body[pos] = b'.';
        pos += 1;
        page_length = pos as u8;
    } else {
        // Controller SN is not available to this helper in isolation; the
        // caller supplies it via `sn`.
        let _ = nsid;
        page_length = 0;
    }

    if page_length == 0 {
        return Err(TranslationError::Failure);
    }

    let total = UnitSerialNumber::SIZE + page_length as usize;
    if out.len() < total {
        return Err(TranslationError::Failure);
    }
    let mut header = UnitSerialNumber::new();
    header.set_header(0, 0, page_length);
    out[..UnitSerialNumber::SIZE].copy_from_slice(header.as_bytes());
    out[UnitSerialNumber::SIZE..total].copy_from_slice(&body[..page_length as usize]);
    Ok(total)
}

fn unit_serial_number_from_controller(
    sn: &[u8; 20],
    nsid: u32,
    out: &mut [u8],
) -> Result<usize, TranslationError> {
    use crate::scsi::UnitSerialNumber;
    let total = UnitSerialNumber::SIZE + 20 + 1 + 8 + 1;
    if out.len() < total {
        return Err(TranslationError::Failure);
    }
    let mut header = UnitSerialNumber::new();
    header.set_header(0, 0, (20 + 1 + 8 + 1) as u8);
    out[..UnitSerialNumber::SIZE].copy_from_slice(header.as_bytes());
    let mut pos = UnitSerialNumber::SIZE;
    out[pos..pos + 20].copy_from_slice(sn);
    pos += 20;
    out[pos] = b'_';
    pos += 1;
    for byte in nsid.to_be_bytes() {
        out[pos] = hex_nibble(byte >> 4);
        out[pos + 1] = hex_nibble(byte & 0xf);
        pos += 2;
    }
    out[pos] = b'.';
    Ok(total)
}

/// Minimal, valid-but-empty bodies for VPD pages this engine doesn't
/// otherwise synthesize, so that an EVPD request for them still gets a
/// well-formed response rather than a rejection.
fn minimal_vpd(page_code: u8, out: &mut [u8]) -> Result<usize, TranslationError> {
    match page_code {
        x if x == PageCode::DeviceIdentification as u8 => {
            use crate::scsi::DeviceIdentificationVpd;
            if out.len() < DeviceIdentificationVpd::SIZE {
                return Err(TranslationError::Failure);
            }
            let mut header = DeviceIdentificationVpd::new();
            header.set_header(0, 0, 0);
            out[..DeviceIdentificationVpd::SIZE].copy_from_slice(header.as_bytes());
            Ok(DeviceIdentificationVpd::SIZE)
        }
        x if x == PageCode::Extended as u8 => {
            use crate::scsi::ExtendedInquiryDataVpd;
            if out.len() < ExtendedInquiryDataVpd::SIZE {
                return Err(TranslationError::Failure);
            }
            let mut page = ExtendedInquiryDataVpd::new();
            page.set_header(0, 0);
            out[..ExtendedInquiryDataVpd::SIZE].copy_from_slice(page.as_bytes());
            Ok(ExtendedInquiryDataVpd::SIZE)
        }
        x if x == PageCode::BlockLimitsVpd as u8 => {
            use crate::scsi::BlockLimitsVpd;
            if out.len() < BlockLimitsVpd::SIZE {
                return Err(TranslationError::Failure);
            }
            let mut page = BlockLimitsVpd::new();
            page.set_header(0, 0);
            out[..BlockLimitsVpd::SIZE].copy_from_slice(page.as_bytes());
            Ok(BlockLimitsVpd::SIZE)
        }
        x if x == PageCode::BlockDeviceCharacteristicsVpd as u8 => {
            use crate::scsi::BlockDeviceCharacteristicsVpd;
            if out.len() < BlockDeviceCharacteristicsVpd::SIZE {
                return Err(TranslationError::Failure);
            }
            let mut page = BlockDeviceCharacteristicsVpd::new();
            page.set_header(0, 0);
            page.set_non_rotating();
            out[..BlockDeviceCharacteristicsVpd::SIZE].copy_from_slice(page.as_bytes());
            Ok(BlockDeviceCharacteristicsVpd::SIZE)
        }
        x if x == PageCode::LogicalBlockProvisioningVpd as u8 => {
            use crate::scsi::LogicalBlockProvisioningVpd;
            if out.len() < LogicalBlockProvisioningVpd::SIZE {
                return Err(TranslationError::Failure);
            }
            let mut page = LogicalBlockProvisioningVpd::new();
            page.set_header(0, 0);
            page.set_lbpu(true);
            out[..LogicalBlockProvisioningVpd::SIZE].copy_from_slice(page.as_bytes());
            Ok(LogicalBlockProvisioningVpd::SIZE)
        }
        _ => Err(TranslationError::InvalidInput),
    }
}

pub fn to_scsi(
    cdb: &InquiryCommand,
    controller_page: &[u8],
    namespace_page: &[u8],
    nsid: u32,
    out: &mut [u8],
) -> Result<usize, TranslationError> {
    let ns = to_ns(namespace_page).ok_or(TranslationError::Failure)?;
    let ctrl = to_ctrl(controller_page).ok_or(TranslationError::Failure)?;

    if !cdb.evpd() {
        return standard_inquiry(&ctrl, &ns, out);
    }

    match cdb.page_code() {
        x if x == PageCode::SupportedVpd as u8 => supported_vpd(out),
        x if x == PageCode::UnitSerialNumber as u8 => {
            match unit_serial_number(&ns, nsid, out) {
                Ok(len) => Ok(len),
                Err(_) => unit_serial_number_from_controller(ctrl.sn(), nsid, out),
            }
        }
        other => minimal_vpd(other, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl_page(mn: &[u8], fr: &[u8]) -> [u8; IdentifyControllerData::SIZE] {
        let mut page = [b' '; IdentifyControllerData::SIZE];
        page[24..24 + mn.len()].copy_from_slice(mn);
        page[64..64 + fr.len()].copy_from_slice(fr);
        page
    }

    #[test]
    fn product_revision_takes_last_four_graphic_bytes_left_to_right() {
        let rev = product_revision(b"1.2.3   ");
        assert_eq!(&rev, b".2.3");
    }

    #[test]
    fn standard_inquiry_sets_spc4_version() {
        let ctrl_bytes = ctrl_page(b"Model", b"1.0");
        let ctrl = IdentifyControllerData(ctrl_bytes);
        let ns = IdentifyNamespace::new();
        let mut out = [0u8; InquiryData::SIZE];
        standard_inquiry(&ctrl, &ns, &mut out).unwrap();
        assert_eq!(out[2], Version::Spc4 as u8);
    }

    #[test]
    fn supported_vpd_lists_seven_pages() {
        let mut out = [0u8; 16];
        let len = supported_vpd(&mut out).unwrap();
        assert_eq!(out[3], 7);
        assert_eq!(len, 4 + 7);
    }
}
