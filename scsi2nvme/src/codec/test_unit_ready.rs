//! TestUnitReady: no NVMe command. Readiness is supplied by the shim at
//! `Begin` time, since the engine holds no device state of its own.

use crate::error::TranslationError;
use crate::scsi::{TestUnitReadyCommand, Status};
use super::CmdList;

pub fn to_nvme(cdb: &TestUnitReadyCommand) -> Result<CmdList, TranslationError> {
    if cdb.control_byte().naca() {
        return Err(TranslationError::InvalidInput);
    }
    Ok(CmdList::new())
}

pub fn to_scsi(ready: bool) -> Status {
    if ready {
        Status::Good
    } else {
        Status::CheckCondition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_device_returns_good() {
        assert_eq!(to_scsi(true), Status::Good);
    }

    #[test]
    fn not_ready_device_returns_check_condition() {
        assert_eq!(to_scsi(false), Status::CheckCondition);
    }

    #[test]
    fn naca_is_rejected() {
        let mut cdb = TestUnitReadyCommand::new();
        cdb.0[4] = 0b0000_0100;
        assert_eq!(to_nvme(&cdb).unwrap_err(), TranslationError::InvalidInput);
    }
}
