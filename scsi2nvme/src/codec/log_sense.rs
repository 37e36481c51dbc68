//! LogSense: no NVMe command. This engine only answers the Supported Log
//! Pages page, grounded in the reference translator's own stub (every
//! other page it accepted was left unimplemented there too).

use crate::error::TranslationError;
use crate::scsi::{LogSenseCommand, PageCode, SupportedLogPages};

pub fn to_nvme(cdb: &LogSenseCommand) -> Result<(), TranslationError> {
    if cdb.sp() || cdb.pc() == 1 || cdb.control_byte().naca() {
        return Err(TranslationError::InvalidInput);
    }
    Ok(())
}

pub fn to_scsi(cdb: &LogSenseCommand, out: &mut [u8]) -> Result<usize, TranslationError> {
    if cdb.page_code() != PageCode::SupportedLogPages as u8 {
        // Matches the reference translator: other recognized log pages
        // (Temperature, SolidStateMedia, InformationalExceptions) are
        // listed as supported but have no handler of their own.
        return Err(TranslationError::NoTranslation);
    }

    let pages: [u8; 4] = [
        PageCode::SupportedLogPages as u8,
        PageCode::Temperature as u8,
        PageCode::SolidStateMedia as u8,
        PageCode::InformationalExceptions as u8,
    ];
    let total = SupportedLogPages::SIZE + pages.len();
    if out.len() < total {
        return Err(TranslationError::Failure);
    }
    let mut header = SupportedLogPages::new();
    header.set_page_length(pages.len() as u8);
    out[..SupportedLogPages::SIZE].copy_from_slice(header.as_bytes());
    out[SupportedLogPages::SIZE..total].copy_from_slice(&pages);
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_log_pages_lists_four_codes() {
        let cdb = LogSenseCommand::new();
        let mut out = [0u8; 6];
        let len = to_scsi(&cdb, &mut out).unwrap();
        assert_eq!(len, 6);
        assert_eq!(out[1], 4);
    }
}
