//! # Name Hashes
//!
//! The wire carries no type or property names, only their checksums. Both
//! endpoints must therefore compute bit-identical hashes.
//!
//! ## Type hash: CRC-32/ISO-HDLC
//!
//! | Parameter | Value |
//! |-----------|-------|
//! | Polynomial | 0x04C11DB7 (reflected 0xEDB88320) |
//! | Init | 0xFFFFFFFF |
//! | RefIn / RefOut | true / true |
//! | XorOut | 0xFFFFFFFF |
//! | Check ("123456789") | 0xCBF43926 |
//!
//! ## Property hash: CRC-16/CCITT-FALSE
//!
//! | Parameter | Value |
//! |-----------|-------|
//! | Polynomial | 0x1021 |
//! | Init | 0xFFFF |
//! | RefIn / RefOut | false / false |
//! | XorOut | 0x0000 |
//! | Check ("123456789") | 0x29B1 |
//!
//! Both are computed over the UTF-8 bytes of the name.
//!
//! ```
//! use tagwire::core::hash::{hash_property, hash_type};
//!
//! assert_eq!(hash_type("123456789"), 0xCBF4_3926);
//! assert_eq!(hash_property("123456789"), 0x29B1);
//! ```

const CRC16_POLY: u16 = 0x1021;
const CRC16_INIT: u16 = 0xFFFF;

const CRC16_TABLE: [u16; 256] = {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut j = 0;
        while j < 8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// 32-bit wire identifier of a fully-qualified type name.
#[inline]
#[must_use]
pub fn hash_type(name: &str) -> u32 {
    crc32fast::hash(name.as_bytes())
}

/// 16-bit wire identifier of a property name.
#[inline]
#[must_use]
pub fn hash_property(name: &str) -> u16 {
    name.as_bytes().iter().fold(CRC16_INIT, |crc, &byte| {
        let index = ((crc >> 8) ^ u16::from(byte)) as usize;
        (crc << 8) ^ CRC16_TABLE[index]
    })
}
