//! SCSI response / parameter data structures.
//!
//! Like [`crate::scsi::command`], every structure is a fixed-size byte
//! array with named setter/getter methods computing byte and bit offsets
//! directly, so there is no reliance on a bit-field ABI.

macro_rules! byte_struct {
    ($name:ident, $size:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(C)]
        pub struct $name(pub [u8; $size]);

        impl $name {
            pub const SIZE: usize = $size;

            pub const fn new() -> Self {
                Self([0u8; $size])
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

byte_struct!(InquiryData, 96);
impl InquiryData {
    pub fn set_peripheral(&mut self, device_type: u8, qualifier: u8) {
        self.0[0] = (device_type & 0x1f) | ((qualifier & 0x7) << 5);
    }
    pub fn set_version(&mut self, version: u8) {
        self.0[2] = version;
    }
    pub fn set_response_data_format(&mut self, rdf: u8) {
        self.0[3] = (self.0[3] & !0x0f) | (rdf & 0x0f);
    }
    pub fn set_additional_length(&mut self, len: u8) {
        self.0[4] = len;
    }
    pub fn set_vendor_identification(&mut self, bytes: &[u8; 8]) {
        self.0[8..16].copy_from_slice(bytes);
    }
    pub fn set_product_identification(&mut self, bytes: &[u8; 16]) {
        self.0[16..32].copy_from_slice(bytes);
    }
    pub fn set_product_revision_level(&mut self, bytes: &[u8; 4]) {
        self.0[32..36].copy_from_slice(bytes);
    }
}

byte_struct!(ReadCapacity10Data, 8);
impl ReadCapacity10Data {
    pub fn set_returned_logical_block_address(&mut self, lba: u32) {
        self.0[0..4].copy_from_slice(&lba.to_be_bytes());
    }
    pub fn set_block_length(&mut self, len: u32) {
        self.0[4..8].copy_from_slice(&len.to_be_bytes());
    }
}

byte_struct!(FixedFormatSenseData, 18);
impl FixedFormatSenseData {
    pub fn set_response_code(&mut self, code: u8) {
        self.0[0] = (code & 0x7f) | (self.0[0] & 0x80);
    }
    pub fn set_sense_key(&mut self, key: u8) {
        self.0[2] = key & 0x0f;
    }
    pub fn set_additional_sense_length(&mut self) {
        self.0[7] = 10;
    }
    pub fn set_additional_sense_code(&mut self, asc: u8) {
        self.0[12] = asc;
    }
    pub fn set_additional_sense_code_qualifier(&mut self, ascq: u8) {
        self.0[13] = ascq;
    }
}

byte_struct!(DescriptorFormatSenseData, 8);
impl DescriptorFormatSenseData {
    pub fn set_response_code(&mut self, code: u8) {
        self.0[0] = code & 0x7f;
    }
    pub fn set_sense_key(&mut self, key: u8) {
        self.0[1] = key & 0x0f;
    }
    pub fn set_additional_sense_code(&mut self, asc: u8) {
        self.0[2] = asc;
    }
    pub fn set_additional_sense_code_qualifier(&mut self, ascq: u8) {
        self.0[3] = ascq;
    }
}

byte_struct!(ReportLunsParamData, 8);
impl ReportLunsParamData {
    pub fn set_list_byte_length(&mut self, len: u32) {
        self.0[0..4].copy_from_slice(&len.to_be_bytes());
    }
}

byte_struct!(SupportedVitalProductData, 4);
impl SupportedVitalProductData {
    pub fn set_header(&mut self, device_type: u8, qualifier: u8, page_length: u8) {
        self.0[0] = (device_type & 0x1f) | ((qualifier & 0x7) << 5);
        self.0[1] = 0x00;
        self.0[3] = page_length;
    }
}

byte_struct!(UnitSerialNumber, 4);
impl UnitSerialNumber {
    pub fn set_header(&mut self, device_type: u8, qualifier: u8, page_length: u8) {
        self.0[0] = (device_type & 0x1f) | ((qualifier & 0x7) << 5);
        self.0[1] = 0x80;
        self.0[3] = page_length;
    }
}

byte_struct!(IdentificationDescriptor, 4);
impl IdentificationDescriptor {
    pub fn set_header(&mut self, code_set: u8, id_type: u8, identifier_length: u8) {
        self.0[0] = code_set & 0x0f;
        self.0[1] = id_type & 0x0f;
        self.0[3] = identifier_length;
    }
}

byte_struct!(DeviceIdentificationVpd, 3);
impl DeviceIdentificationVpd {
    pub fn set_header(&mut self, device_type: u8, qualifier: u8, page_length: u8) {
        self.0[0] = (device_type & 0x1f) | ((qualifier & 0x7) << 5);
        self.0[1] = 0x83;
        self.0[2] = page_length;
    }
}

byte_struct!(ExtendedInquiryDataVpd, 14);
impl ExtendedInquiryDataVpd {
    pub fn set_header(&mut self, device_type: u8, qualifier: u8) {
        self.0[0] = (device_type & 0x1f) | ((qualifier & 0x7) << 5);
        self.0[1] = 0x86;
        self.0[2..4].copy_from_slice(&10u16.to_be_bytes());
    }
}

byte_struct!(BlockDeviceCharacteristicsVpd, 9);
impl BlockDeviceCharacteristicsVpd {
    pub fn set_header(&mut self, device_type: u8, qualifier: u8) {
        self.0[0] = (device_type & 0x1f) | ((qualifier & 0x7) << 5);
        self.0[1] = 0xb1;
        self.0[2..4].copy_from_slice(&5u16.to_be_bytes());
    }
    pub fn set_non_rotating(&mut self) {
        self.0[4..6].copy_from_slice(&1u16.to_be_bytes());
    }
}

byte_struct!(LogicalBlockProvisioningVpd, 64);
impl LogicalBlockProvisioningVpd {
    pub fn set_header(&mut self, device_type: u8, qualifier: u8) {
        self.0[0] = (device_type & 0x1f) | ((qualifier & 0x7) << 5);
        self.0[1] = 0xb2;
        self.0[2..4].copy_from_slice(&60u16.to_be_bytes());
    }
    pub fn set_lbpu(&mut self, lbpu: bool) {
        self.0[5] = (self.0[5] & !0x80) | ((lbpu as u8) << 7);
    }
}

byte_struct!(BlockLimitsVpd, 64);
impl BlockLimitsVpd {
    pub fn set_header(&mut self, device_type: u8, qualifier: u8) {
        self.0[0] = (device_type & 0x1f) | ((qualifier & 0x7) << 5);
        self.0[1] = 0xb0;
        self.0[2..4].copy_from_slice(&60u16.to_be_bytes());
    }
    pub fn set_max_unmap_lba_count(&mut self, count: u32) {
        self.0[20..24].copy_from_slice(&count.to_be_bytes());
    }
    pub fn set_max_unmap_block_descriptor_count(&mut self, count: u32) {
        self.0[24..28].copy_from_slice(&count.to_be_bytes());
    }
}

byte_struct!(ModeParameter6Header, 4);
impl ModeParameter6Header {
    pub fn set_mode_data_length(&mut self, len: u8) {
        self.0[0] = len;
    }
    pub fn set_block_descriptor_length(&mut self, len: u8) {
        self.0[3] = len;
    }
}

byte_struct!(ModeParameter10Header, 8);
impl ModeParameter10Header {
    pub fn set_mode_data_length(&mut self, len: u16) {
        self.0[0..2].copy_from_slice(&len.to_be_bytes());
    }
    pub fn set_longlba(&mut self, longlba: bool) {
        self.0[4] = (self.0[4] & !0x01) | (longlba as u8);
    }
    pub fn set_block_descriptor_length(&mut self, len: u16) {
        self.0[6..8].copy_from_slice(&len.to_be_bytes());
    }
}

byte_struct!(ShortLbaBlockDescriptor, 8);
impl ShortLbaBlockDescriptor {
    pub fn set_number_of_blocks(&mut self, n: u32) {
        self.0[0..4].copy_from_slice(&n.to_be_bytes());
    }
    /// Lower three bytes of `length`; the top byte is discarded, matching
    /// the 24-bit on-wire field.
    pub fn set_logical_block_length(&mut self, length: u32) {
        let be = length.to_be_bytes();
        self.0[5..8].copy_from_slice(&be[1..4]);
    }
}

byte_struct!(LongLbaBlockDescriptor, 16);
impl LongLbaBlockDescriptor {
    pub fn set_number_of_blocks(&mut self, n: u64) {
        self.0[0..8].copy_from_slice(&n.to_be_bytes());
    }
    pub fn set_logical_block_length(&mut self, length: u32) {
        self.0[12..16].copy_from_slice(&length.to_be_bytes());
    }
}

byte_struct!(CachingModePage, 20);
impl CachingModePage {
    pub fn set_page_code(&mut self, page_code: u8, page_length: u8) {
        self.0[0] = page_code & 0x3f;
        self.0[1] = page_length;
    }
    pub fn set_wce(&mut self, wce: bool) {
        self.0[2] = (self.0[2] & !0x04) | ((wce as u8) << 2);
    }
    pub fn set_rcd(&mut self, rcd: bool) {
        self.0[2] = (self.0[2] & !0x01) | (rcd as u8);
    }
}

byte_struct!(ControlModePage, 12);
impl ControlModePage {
    pub fn set_page_code(&mut self, page_code: u8, page_length: u8) {
        self.0[0] = page_code & 0x3f;
        self.0[1] = page_length;
    }
    pub fn set_d_sense(&mut self, d_sense: bool) {
        self.0[2] = (self.0[2] & !0x04) | ((d_sense as u8) << 2);
    }
}

byte_struct!(PowerConditionModePage, 40);
impl PowerConditionModePage {
    pub fn set_page_code(&mut self, page_code: u8, page_length: u8) {
        self.0[0] = page_code & 0x3f;
        self.0[1] = page_length;
    }
}

byte_struct!(OneCommandParamData, 4);
impl OneCommandParamData {
    pub fn set_support(&mut self, support: u8) {
        self.0[1] = support & 0x07;
    }
    pub fn set_cdb_size(&mut self, size: u16) {
        self.0[2..4].copy_from_slice(&size.to_be_bytes());
    }
}

byte_struct!(UnmapParamList, 8);
impl UnmapParamList {
    pub fn data_length(&self) -> u16 {
        u16::from_be_bytes([self.0[0], self.0[1]])
    }
    pub fn block_desc_data_length(&self) -> u16 {
        u16::from_be_bytes([self.0[2], self.0[3]])
    }
}

byte_struct!(UnmapBlockDescriptor, 16);
impl UnmapBlockDescriptor {
    pub fn logical_block_address(&self) -> u64 {
        u64::from_be_bytes([
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5], self.0[6], self.0[7],
        ])
    }
    pub fn logical_block_count(&self) -> u32 {
        u32::from_be_bytes([self.0[8], self.0[9], self.0[10], self.0[11]])
    }
}

byte_struct!(SupportedLogPages, 2);
impl SupportedLogPages {
    pub fn set_page_length(&mut self, len: u8) {
        self.0[1] = len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_capacity_10_data_round_trips() {
        let mut data = ReadCapacity10Data::new();
        data.set_returned_logical_block_address(0xdead_beef);
        data.set_block_length(512);
        assert_eq!(&data.0[0..4], &0xdead_beefu32.to_be_bytes());
        assert_eq!(&data.0[4..8], &512u32.to_be_bytes());
    }

    #[test]
    fn short_lba_block_descriptor_truncates_to_24_bits() {
        let mut desc = ShortLbaBlockDescriptor::new();
        desc.set_logical_block_length(512);
        assert_eq!(&desc.0[5..8], &[0x00, 0x02, 0x00]);
    }
}
