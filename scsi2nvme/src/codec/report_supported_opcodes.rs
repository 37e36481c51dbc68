//! ReportSupportedOpCodes (MaintenanceIn, service action 0x0c): no NVMe
//! command. This engine supports exactly one query shape and always
//! answers "not supported".

use crate::error::TranslationError;
use crate::scsi::{OneCommandParamData, ReportOpCodesCommand};

const SERVICE_ACTION_REPORT_SUPPORTED_OPERATION_CODES: u8 = 0x0c;
const REPORTING_OPTION_ONE_COMMAND: u8 = 0b001;
const WRITE_SAME_16: u8 = 0x93;

pub fn to_scsi(cdb: &ReportOpCodesCommand, out: &mut [u8]) -> Result<usize, TranslationError> {
    if cdb.service_action() != SERVICE_ACTION_REPORT_SUPPORTED_OPERATION_CODES
        || cdb.reporting_options() != REPORTING_OPTION_ONE_COMMAND
        || cdb.requested_op_code() != WRITE_SAME_16
    {
        return Err(TranslationError::InvalidInput);
    }

    if out.len() < OneCommandParamData::SIZE {
        return Err(TranslationError::Failure);
    }
    let mut data = OneCommandParamData::new();
    data.set_support(0b001);
    out[..OneCommandParamData::SIZE].copy_from_slice(data.as_bytes());
    Ok(OneCommandParamData::SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_write_same_16_query_is_accepted() {
        let mut bytes = [0u8; 11];
        bytes[0] = SERVICE_ACTION_REPORT_SUPPORTED_OPERATION_CODES;
        bytes[1] = REPORTING_OPTION_ONE_COMMAND;
        bytes[2] = WRITE_SAME_16;
        let cdb = ReportOpCodesCommand::from_bytes(&bytes).unwrap();
        let mut out = [0u8; OneCommandParamData::SIZE];
        let len = to_scsi(&cdb, &mut out).unwrap();
        assert_eq!(len, OneCommandParamData::SIZE);
        assert_eq!(out[1] & 0x07, 0b001);
    }

    #[test]
    fn other_opcodes_are_rejected() {
        let mut bytes = [0u8; 11];
        bytes[0] = SERVICE_ACTION_REPORT_SUPPORTED_OPERATION_CODES;
        bytes[1] = REPORTING_OPTION_ONE_COMMAND;
        bytes[2] = 0x28; // Read10
        let cdb = ReportOpCodesCommand::from_bytes(&bytes).unwrap();
        let mut out = [0u8; OneCommandParamData::SIZE];
        assert!(to_scsi(&cdb, &mut out).is_err());
    }
}
