//! Status mapper (C4): NVMe completion status to SCSI status/sense quadruple.

use crate::nvme::{CommandSpecificStatusCode, GenericCommandStatusCode, MediaErrorStatusCode, StatusCodeType};
use crate::scsi::{AdditionalSenseCode, AdditionalSenseCodeQualifier, SenseKey, Status};

/// SCSI status, sense key, additional sense code and qualifier produced
/// for a single NVMe completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScsiStatusQuadruple {
    pub status: Status,
    pub sense_key: SenseKey,
    pub asc: AdditionalSenseCode,
    pub ascq: AdditionalSenseCodeQualifier,
}

const fn quad(
    status: Status,
    sense_key: SenseKey,
    asc: AdditionalSenseCode,
    ascq: AdditionalSenseCodeQualifier,
) -> ScsiStatusQuadruple {
    ScsiStatusQuadruple {
        status,
        sense_key,
        asc,
        ascq,
    }
}

const DEFAULT: ScsiStatusQuadruple = quad(
    Status::CheckCondition,
    SenseKey::NoSense,
    AdditionalSenseCode::NoAdditionalSenseInfo,
    AdditionalSenseCodeQualifier::NoAdditionalSenseInfo,
);

/// Maps an NVMe completion's status-code-type and status-code into a SCSI
/// quadruple. Total: every (sct, sc) pair maps to something, falling back
/// to `DEFAULT` (and a debug notice) when no table entry matches.
pub fn to_scsi_status(status_code_type: u8, status_code: u8) -> ScsiStatusQuadruple {
    match status_code_type {
        t if t == StatusCodeType::Generic as u8 => generic(status_code),
        t if t == StatusCodeType::CommandSpecific as u8 => command_specific(status_code),
        t if t == StatusCodeType::MediaAndDataIntegrity as u8 => media(status_code),
        _ => {
            log::debug!(
                "unmapped NVMe status sct={status_code_type:#x} sc={status_code:#x}, using default quadruple"
            );
            DEFAULT
        }
    }
}

fn generic(sc: u8) -> ScsiStatusQuadruple {
    use AdditionalSenseCode as Asc;
    use AdditionalSenseCodeQualifier as Ascq;
    use GenericCommandStatusCode as G;

    match sc {
        x if x == G::Success as u8 => quad(
            Status::Good,
            SenseKey::NoSense,
            Asc::NoAdditionalSenseInfo,
            Ascq::NoAdditionalSenseInfo,
        ),
        x if x == G::InvalidOpcode as u8 => quad(
            Status::CheckCondition,
            SenseKey::IllegalRequest,
            Asc::InvalidCommandOpCode,
            Ascq::InvalidCommandOpCode,
        ),
        x if x == G::InvalidField as u8 => quad(
            Status::CheckCondition,
            SenseKey::IllegalRequest,
            Asc::InvalidFieldInCdb,
            Ascq::InvalidFieldInCdb,
        ),
        x if x == G::DataTransferError as u8 => quad(
            Status::CheckCondition,
            SenseKey::MediumError,
            Asc::NoAdditionalSenseInfo,
            Ascq::NoAdditionalSenseInfo,
        ),
        x if x == G::AbortedPowerLoss as u8 => quad(
            Status::TaskAborted,
            SenseKey::AbortedCommand,
            Asc::WarningPowerLossExpected,
            Ascq::WarningPowerLossExpected,
        ),
        x if x == G::InternalDeviceError as u8 => quad(
            Status::CheckCondition,
            SenseKey::HardwareError,
            Asc::InternalTargetFailure,
            Ascq::InternalTargetFailure,
        ),
        x if x == G::AbortedByRequest as u8
            || x == G::AbortedSqDeletion as u8
            || x == G::AbortedFailedFused as u8
            || x == G::AbortedMissingFused as u8 =>
        {
            quad(
                Status::TaskAborted,
                SenseKey::AbortedCommand,
                Asc::NoAdditionalSenseInfo,
                Ascq::NoAdditionalSenseInfo,
            )
        }
        x if x == G::InvalidNamespaceOrFormat as u8 => quad(
            Status::CheckCondition,
            SenseKey::IllegalRequest,
            Asc::AccessDeniedInvalidLuIdentifier,
            Ascq::AccessDeniedInvalidLuIdentifier,
        ),
        x if x == G::LbaOutOfRange as u8 => quad(
            Status::CheckCondition,
            SenseKey::IllegalRequest,
            Asc::LbaOutOfRange,
            Ascq::LbaOutOfRange,
        ),
        x if x == G::NamespaceNotReady as u8 => quad(
            Status::CheckCondition,
            SenseKey::NotReady,
            Asc::LogicalUnitNotReadyCauseNotReportable,
            Ascq::LogicalUnitNotReadyCauseNotReportable,
        ),
        _ => {
            log::debug!("unmapped generic NVMe status code sc={sc:#x}, using default quadruple");
            DEFAULT
        }
    }
}

fn command_specific(sc: u8) -> ScsiStatusQuadruple {
    use AdditionalSenseCode as Asc;
    use AdditionalSenseCodeQualifier as Ascq;
    use CommandSpecificStatusCode as C;

    match sc {
        x if x == C::CompletionQueueInvalid as u8 => quad(
            Status::CheckCondition,
            SenseKey::IllegalRequest,
            Asc::NoAdditionalSenseInfo,
            Ascq::NoAdditionalSenseInfo,
        ),
        x if x == C::InvalidFormat as u8 => quad(
            Status::CheckCondition,
            SenseKey::IllegalRequest,
            Asc::FormatCommandFailed,
            Ascq::FormatCommandFailed,
        ),
        x if x == C::ConflictingAttributes as u8 => quad(
            Status::CheckCondition,
            SenseKey::IllegalRequest,
            Asc::InvalidFieldInCdb,
            Ascq::InvalidFieldInCdb,
        ),
        _ => {
            log::debug!("unmapped command-specific NVMe status code sc={sc:#x}, using default quadruple");
            DEFAULT
        }
    }
}

fn media(sc: u8) -> ScsiStatusQuadruple {
    use AdditionalSenseCode as Asc;
    use AdditionalSenseCodeQualifier as Ascq;
    use MediaErrorStatusCode as M;

    match sc {
        x if x == M::WriteFault as u8 => quad(
            Status::CheckCondition,
            SenseKey::MediumError,
            Asc::PeripheralDeviceWriteFault,
            Ascq::PeripheralDeviceWriteFault,
        ),
        x if x == M::UnrecoveredReadError as u8 => quad(
            Status::CheckCondition,
            SenseKey::MediumError,
            Asc::UnrecoveredReadError,
            Ascq::UnrecoveredReadError,
        ),
        x if x == M::GuardCheckError as u8 => quad(
            Status::CheckCondition,
            SenseKey::MediumError,
            Asc::LogicalBlockGuardCheckFailed,
            Ascq::LogicalBlockGuardCheckFailed,
        ),
        x if x == M::ApplicationTagCheckError as u8 => quad(
            Status::CheckCondition,
            SenseKey::MediumError,
            Asc::LogicalBlockApplicationTagCheckFailed,
            Ascq::LogicalBlockApplicationTagCheckFailed,
        ),
        x if x == M::ReferenceTagCheckError as u8 => quad(
            Status::CheckCondition,
            SenseKey::MediumError,
            Asc::LogicalBlockReferenceTagCheckFailed,
            Ascq::LogicalBlockReferenceTagCheckFailed,
        ),
        x if x == M::CompareFailure as u8 => quad(
            Status::CheckCondition,
            SenseKey::Miscompare,
            Asc::MiscompareDuringVerifyOp,
            Ascq::MiscompareDuringVerifyOp,
        ),
        x if x == M::AccessDenied as u8 => quad(
            Status::CheckCondition,
            SenseKey::IllegalRequest,
            Asc::AccessDeniedInvalidLuIdentifier,
            Ascq::AccessDeniedInvalidLuIdentifier,
        ),
        _ => {
            log::debug!("unmapped media NVMe status code sc={sc:#x}, using default quadruple");
            DEFAULT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_maps_to_good() {
        let q = to_scsi_status(StatusCodeType::Generic as u8, GenericCommandStatusCode::Success as u8);
        assert_eq!(q.status, Status::Good);
        assert_eq!(q.sense_key, SenseKey::NoSense);
    }

    #[test]
    fn unmapped_path_status_falls_back_to_default() {
        let q = to_scsi_status(StatusCodeType::PathRelated as u8, 0x01);
        assert_eq!(q, DEFAULT);
    }

    #[test]
    fn invalid_field_maps_to_illegal_request() {
        let q = to_scsi_status(
            StatusCodeType::Generic as u8,
            GenericCommandStatusCode::InvalidField as u8,
        );
        assert_eq!(q.sense_key, SenseKey::IllegalRequest);
        assert_eq!(q.asc, AdditionalSenseCode::InvalidFieldInCdb);
    }
}
