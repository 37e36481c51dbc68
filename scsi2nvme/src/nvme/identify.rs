//! NVMe Identify data structures (4096-byte admin command response
//! buffers). Only the fields the codecs actually read or write are
//! exposed; the remainder of each buffer is reserved/vendor-specific
//! space that is zeroed and left untouched.

/// A single LBA format descriptor inside [`IdentifyNamespace`]'s `lbaf`
/// table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LbaFormat(pub u32);

impl LbaFormat {
    pub fn metadata_size(&self) -> u16 {
        (self.0 & 0xffff) as u16
    }
    /// LBA data size as `log2(bytes)`; the actual block length is
    /// `1 << lbads`, never the raw exponent.
    pub fn lbads(&self) -> u8 {
        ((self.0 >> 16) & 0xff) as u8
    }
    pub fn relative_performance(&self) -> u8 {
        ((self.0 >> 24) & 0x3) as u8
    }
}

/// 4096-byte Identify Namespace data structure (CNS 0x00).
#[derive(Clone, Copy)]
#[repr(C)]
pub struct IdentifyNamespace(pub [u8; 4096]);

impl IdentifyNamespace {
    pub const SIZE: usize = 4096;

    pub const fn new() -> Self {
        Self([0u8; 4096])
    }

    pub fn nsze(&self) -> u64 {
        u64::from_le_bytes(self.0[0..8].try_into().unwrap())
    }
    pub fn ncap(&self) -> u64 {
        u64::from_le_bytes(self.0[8..16].try_into().unwrap())
    }
    pub fn nuse(&self) -> u64 {
        u64::from_le_bytes(self.0[16..24].try_into().unwrap())
    }
    pub fn nsfeat(&self) -> u8 {
        self.0[24]
    }
    pub fn nlbaf(&self) -> u8 {
        self.0[25]
    }
    /// `flbas` bits 0-3: index into `lbaf` of the in-use format.
    pub fn flbas_format(&self) -> u8 {
        self.0[26] & 0x0f
    }
    pub fn dps(&self) -> u8 {
        self.0[29]
    }
    pub fn nguid(&self) -> [u8; 16] {
        self.0[104..120].try_into().unwrap()
    }
    pub fn eui64(&self) -> [u8; 8] {
        self.0[120..128].try_into().unwrap()
    }
    pub fn lbaf(&self, index: usize) -> LbaFormat {
        let offset = 128 + index * 4;
        LbaFormat(u32::from_le_bytes(
            self.0[offset..offset + 4].try_into().unwrap(),
        ))
    }
}

impl Default for IdentifyNamespace {
    fn default() -> Self {
        Self::new()
    }
}

/// 4096-byte Identify Namespace List (CNS 0x02): up to 1024 little-endian
/// namespace identifiers, zero-terminated.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct IdentifyNamespaceList(pub [u8; 4096]);

impl IdentifyNamespaceList {
    pub const SIZE: usize = 4096;

    pub const fn new() -> Self {
        Self([0u8; 4096])
    }

    pub fn id(&self, index: usize) -> u32 {
        let offset = index * 4;
        u32::from_le_bytes(self.0[offset..offset + 4].try_into().unwrap())
    }
}

impl Default for IdentifyNamespaceList {
    fn default() -> Self {
        Self::new()
    }
}

/// 4096-byte Identify Controller data structure (CNS 0x01). Only the
/// serial number, model number and firmware revision fields are exposed;
/// both are read by the Inquiry codec to populate vendor/product strings.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct IdentifyControllerData(pub [u8; 4096]);

impl IdentifyControllerData {
    pub const SIZE: usize = 4096;

    pub const fn new() -> Self {
        Self([0u8; 4096])
    }

    /// Serial number (ASCII, space-padded, 20 bytes).
    pub fn sn(&self) -> &[u8; 20] {
        self.0[4..24].try_into().unwrap()
    }
    /// Model number (ASCII, space-padded, 40 bytes).
    pub fn mn(&self) -> &[u8; 40] {
        self.0[24..64].try_into().unwrap()
    }
    /// Firmware revision (ASCII, space-padded, 8 bytes).
    pub fn fr(&self) -> &[u8; 8] {
        self.0[64..72].try_into().unwrap()
    }
}

impl Default for IdentifyControllerData {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lbaf_reports_log2_block_size_not_linear() {
        // lbads = 9 means 1 << 9 == 512-byte blocks; the field itself is
        // the exponent, not the byte count.
        let lbaf = LbaFormat(9 << 16);
        assert_eq!(lbaf.lbads(), 9);
        assert_eq!(1u32 << lbaf.lbads(), 512);
    }

    #[test]
    fn identify_namespace_reads_nsze_little_endian() {
        let mut ns = IdentifyNamespace::new();
        ns.0[0..8].copy_from_slice(&42u64.to_le_bytes());
        assert_eq!(ns.nsze(), 42);
    }
}
