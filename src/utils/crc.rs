/// CRC-32/MPEG-2 as used by PSI sections (ISO/IEC 13818-1 Annex A).
/// Polynomial 0x04C11DB7, initial value 0xFFFFFFFF, no reflection, no final xor.
const CRC32_MPEG2: u32 = 0x04C11DB7;

/// MPEG-2 CRC32 calculator used for PAT/PMT section validation.
///
/// A section is intact when the CRC over everything from `table_id` up to
/// (not including) the trailing `CRC_32` field equals that field, or
/// equivalently when the CRC over the whole section including the field is 0.
pub struct Crc32Mpeg2 {
    table: [u32; 256],
}

impl Crc32Mpeg2 {
    /// Creates a calculator with its lookup table built.
    pub fn new() -> Self {
        let mut table = [0u32; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut crc = (i as u32) << 24;
            for _ in 0..8 {
                crc = if (crc & 0x80000000) != 0 {
                    (crc << 1) ^ CRC32_MPEG2
                } else {
                    crc << 1
                };
            }
            *entry = crc;
        }
        Self { table }
    }

    /// Calculates the CRC32 checksum for the given data.
    ///
    /// ```
    /// use tslive::utils::Crc32Mpeg2;
    ///
    /// let crc = Crc32Mpeg2::new();
    /// assert_eq!(crc.calculate(&[0x01, 0x01]), 0xD66FB816);
    /// ```
    pub fn calculate(&self, data: &[u8]) -> u32 {
        self.calculate_parts(&[data])
    }

    /// Calculates the checksum of several slices as if they were one contiguous buffer.
    pub fn calculate_parts(&self, parts: &[&[u8]]) -> u32 {
        let mut crc = 0xFFFFFFFF;
        for part in parts {
            for &byte in part.iter() {
                let index = ((crc >> 24) ^ (byte as u32)) & 0xFF;
                crc = (crc << 8) ^ self.table[index as usize];
            }
        }
        crc
    }
}

impl Default for Crc32Mpeg2 {
    fn default() -> Self {
        Self::new()
    }
}
