//! CRC32 checksums (IEEE 802.3, reflected)
//!
//! Table-driven CRC32 used to decide whether stored records are current.
//! Checksums are always taken over a record's canonical byte encoding
//! (see [`crate::config::Record`]), never over in-memory struct layout.

/// Reflected IEEE 802.3 polynomial
pub const POLYNOMIAL: u32 = 0xEDB8_8320;

/// Number of entries in a lookup table
pub const TABLE_SIZE: usize = 256;

/// Lookup table built at compile time
pub static TABLE: [u32; TABLE_SIZE] = build_table();

/// Build the 256-entry lookup table for [`POLYNOMIAL`]
pub const fn build_table() -> [u32; TABLE_SIZE] {
    let mut table = [0u32; TABLE_SIZE];
    let mut i = 0;
    while i < TABLE_SIZE {
        let mut c = i as u32;
        let mut bit = 0;
        while bit < 8 {
            c = if c & 1 != 0 {
                POLYNOMIAL ^ (c >> 1)
            } else {
                c >> 1
            };
            bit += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

/// Continue a CRC32 from `initial` over `bytes`
///
/// `initial` is 0 for a fresh checksum, or the result of a previous call to
/// extend it. Feeding data one byte at a time gives the same result as one
/// call over the whole block.
pub fn update(table: &[u32; TABLE_SIZE], initial: u32, bytes: &[u8]) -> u32 {
    let mut c = initial ^ 0xFFFF_FFFF;
    for &byte in bytes {
        c = table[((c ^ byte as u32) & 0xFF) as usize] ^ (c >> 8);
    }
    c ^ 0xFFFF_FFFF
}

/// CRC32 of `bytes`
pub fn checksum(bytes: &[u8]) -> u32 {
    update(&TABLE, 0, bytes)
}

/// Streaming CRC32 for data assembled from several parts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc32 {
    value: u32,
}

impl Crc32 {
    /// Start a new checksum
    pub const fn new() -> Self {
        Self { value: 0 }
    }

    /// Feed more bytes
    pub fn update(&mut self, bytes: &[u8]) {
        self.value = update(&TABLE, self.value, bytes);
    }

    /// Checksum of everything fed so far
    pub const fn finish(&self) -> u32 {
        self.value
    }
}
