//! RequestSense: no NVMe command. ToScsi always reports "no sense" in
//! whichever format the CDB requests, since the engine has no sense-data
//! history of its own to replay.

use crate::error::TranslationError;
use crate::scsi::{
    AdditionalSenseCode, DescriptorFormatSenseData, FixedFormatSenseData, RequestSenseCommand,
};
use super::CmdList;

pub fn to_nvme(cdb: &RequestSenseCommand) -> Result<CmdList, TranslationError> {
    if cdb.control_byte().naca() {
        return Err(TranslationError::InvalidInput);
    }
    Ok(CmdList::new())
}

pub fn to_scsi(cdb: &RequestSenseCommand, out: &mut [u8]) -> Result<usize, TranslationError> {
    if cdb.desc() {
        if out.len() < DescriptorFormatSenseData::SIZE {
            return Err(TranslationError::Failure);
        }
        let mut data = DescriptorFormatSenseData::new();
        data.set_response_code(0x72);
        data.set_additional_sense_code(AdditionalSenseCode::NoAdditionalSenseInfo as u8);
        data.set_additional_sense_code_qualifier(0);
        out[..DescriptorFormatSenseData::SIZE].copy_from_slice(data.as_bytes());
        Ok(DescriptorFormatSenseData::SIZE)
    } else {
        if out.len() < FixedFormatSenseData::SIZE {
            return Err(TranslationError::Failure);
        }
        let mut data = FixedFormatSenseData::new();
        data.set_response_code(0x70);
        data.0[7] = 0;
        data.set_additional_sense_code(AdditionalSenseCode::NoAdditionalSenseInfo as u8);
        data.set_additional_sense_code_qualifier(0);
        out[..FixedFormatSenseData::SIZE].copy_from_slice(data.as_bytes());
        Ok(FixedFormatSenseData::SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_format_reports_no_sense() {
        let cdb = RequestSenseCommand::new();
        let mut out = [0u8; FixedFormatSenseData::SIZE];
        let len = to_scsi(&cdb, &mut out).unwrap();
        assert_eq!(len, FixedFormatSenseData::SIZE);
        assert_eq!(out[0] & 0x7f, 0x70);
    }

    #[test]
    fn descriptor_format_selected_by_desc_bit() {
        let mut cdb = RequestSenseCommand::new();
        cdb.0[0] = 0x01;
        let mut out = [0u8; DescriptorFormatSenseData::SIZE];
        let len = to_scsi(&cdb, &mut out).unwrap();
        assert_eq!(len, DescriptorFormatSenseData::SIZE);
        assert_eq!(out[0] & 0x7f, 0x72);
    }
}
