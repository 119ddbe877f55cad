//! Morse element packing and the character table.
//!
//! A [`PackedSign`] stores an ordered run of dots and dashes in a `u32`. Each dot appends
//! `0b01` and each dash appends `0b0111`, so every element starts with a zero bit and the
//! most significant set bit marks where the sequence begins:
//!
//! | Sign | Bits            | Value  |
//! |------|-----------------|--------|
//! | `.`  | `01`            | `0x01` |
//! | `-`  | `0111`          | `0x07` |
//! | `.-` | `01 0111`       | `0x17` |
//! | `-.` | `0111 01`       | `0x1d` |
//!
//! Decoding walks down from bit `32 - leading_zeros`. A group whose three bits below the
//! leading zero are all set is a dash, anything else is a dot.
//!
//! The table maps ITU letters, digits and common punctuation. Lowercase letters fold to
//! uppercase. Any other byte is rejected with [`CodecError::UnknownCharacter`] instead of
//! being played as garbage.

use crate::consts::{DASH_UNITS, SIGN_BYTES};
use thiserror::Error;

/// Failures reported by the codec.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum CodecError {
    /// The byte has no entry in the Morse table.
    #[error("no Morse code for byte {0:#04x}")]
    UnknownCharacter(u8),
    /// The element does not fit in the remaining bits of the sign.
    #[error("packed sign is full")]
    Overflow,
}

/// One Morse signal element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Element {
    /// Short element, one unit keyed.
    Dot,
    /// Long element, three units keyed.
    Dash,
}

impl Element {
    /// Keyed duration in units.
    pub const fn units(self) -> u16 {
        match self {
            Element::Dot => 1,
            Element::Dash => DASH_UNITS,
        }
    }

    const fn width(self) -> u32 {
        match self {
            Element::Dot => 2,
            Element::Dash => 4,
        }
    }

    const fn pattern(self) -> u32 {
        match self {
            Element::Dot => 0b01,
            Element::Dash => 0b0111,
        }
    }
}

/// Bit-packed sequence of elements with a length sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct PackedSign(u32);

impl PackedSign {
    /// The sign with no elements.
    pub const EMPTY: Self = Self(0);

    /// Wraps a raw packed value.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw packed value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Builds a sign from little-endian bytes, least significant first. Host custom
    /// codes arrive in this order.
    pub const fn from_le_bytes(bytes: [u8; SIGN_BYTES]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }

    /// Builds a sign from big-endian wire bytes.
    pub const fn from_be_bytes(bytes: [u8; SIGN_BYTES]) -> Self {
        Self(u32::from_be_bytes(bytes))
    }

    /// The big-endian wire bytes, most significant first.
    pub const fn to_be_bytes(self) -> [u8; SIGN_BYTES] {
        self.0.to_be_bytes()
    }

    /// Whether the sign holds no elements.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Bits in use, counting the leading zero of the first element.
    const fn used_bits(self) -> u32 {
        if self.0 == 0 { 0 } else { 33 - self.0.leading_zeros() }
    }

    /// Appends `element` after the existing ones.
    pub fn push(&mut self, element: Element) -> Result<(), CodecError> {
        if self.used_bits() + element.width() > u32::BITS {
            return Err(CodecError::Overflow);
        }
        self.0 = (self.0 << element.width()) | element.pattern();
        Ok(())
    }

    /// Iterates the elements in keying order.
    pub fn elements(self) -> Elements {
        Elements {
            sign: self.0,
            cursor: self.used_bits(),
        }
    }

    /// Number of elements.
    pub fn len(self) -> usize {
        self.elements().count()
    }
}

impl From<&[Element]> for PackedSign {
    /// Packs as many leading elements as fit.
    fn from(elements: &[Element]) -> Self {
        let mut sign = Self::EMPTY;
        for &element in elements {
            if sign.push(element).is_err() {
                break;
            }
        }
        sign
    }
}

/// Iterator over the elements of a [`PackedSign`], first keyed first.
#[derive(Debug, Clone)]
pub struct Elements {
    sign: u32,
    cursor: u32,
}

impl Iterator for Elements {
    type Item = Element;

    fn next(&mut self) -> Option<Element> {
        if self.cursor < 2 {
            return None;
        }
        let sign = self.sign;
        let bit = |n: u32| (sign >> n) & 1 == 1;
        if self.cursor >= 4 && bit(self.cursor - 2) && bit(self.cursor - 3) && bit(self.cursor - 4)
        {
            self.cursor -= 4;
            Some(Element::Dash)
        } else {
            self.cursor -= 2;
            Some(Element::Dot)
        }
    }
}

const fn pack(pattern: &str) -> u32 {
    let bytes = pattern.as_bytes();
    let mut sign = 0u32;
    let mut i = 0;
    while i < bytes.len() {
        sign = match bytes[i] {
            b'-' => (sign << 4) | 0b0111,
            _ => (sign << 2) | 0b01,
        };
        i += 1;
    }
    sign
}

const CODES: &[(u8, &str)] = &[
    (b'A', ".-"),
    (b'B', "-..."),
    (b'C', "-.-."),
    (b'D', "-.."),
    (b'E', "."),
    (b'F', "..-."),
    (b'G', "--."),
    (b'H', "...."),
    (b'I', ".."),
    (b'J', ".---"),
    (b'K', "-.-"),
    (b'L', ".-.."),
    (b'M', "--"),
    (b'N', "-."),
    (b'O', "---"),
    (b'P', ".--."),
    (b'Q', "--.-"),
    (b'R', ".-."),
    (b'S', "..."),
    (b'T', "-"),
    (b'U', "..-"),
    (b'V', "...-"),
    (b'W', ".--"),
    (b'X', "-..-"),
    (b'Y', "-.--"),
    (b'Z', "--.."),
    (b'0', "-----"),
    (b'1', ".----"),
    (b'2', "..---"),
    (b'3', "...--"),
    (b'4', "....-"),
    (b'5', "....."),
    (b'6', "-...."),
    (b'7', "--..."),
    (b'8', "---.."),
    (b'9', "----."),
    (b'.', ".-.-.-"),
    (b',', "--..--"),
    (b'?', "..--.."),
    (b'\'', ".----."),
    (b'!', "-.-.--"),
    (b'/', "-..-."),
    (b'(', "-.--."),
    (b')', "-.--.-"),
    (b'&', ".-..."),
    (b':', "---..."),
    (b';', "-.-.-."),
    (b'=', "-...-"),
    (b'+', ".-.-."),
    (b'-', "-....-"),
    (b'_', "..--.-"),
    (b'"', ".-..-."),
    (b'$', "...-..-"),
    (b'@', ".--.-."),
];

const fn build_table() -> [u32; 128] {
    let mut table = [0u32; 128];
    let mut i = 0;
    while i < CODES.len() {
        let (ch, pattern) = CODES[i];
        table[ch as usize] = pack(pattern);
        i += 1;
    }
    table
}

static MORSE_TABLE: [u32; 128] = build_table();

/// Looks up the sign for `character`.
pub fn encode(character: u8) -> Result<PackedSign, CodecError> {
    let upper = character.to_ascii_uppercase();
    match MORSE_TABLE.get(upper as usize) {
        Some(&raw) if raw != 0 => Ok(PackedSign(raw)),
        _ => Err(CodecError::UnknownCharacter(character)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;
    use Element::{Dash, Dot};

    #[test]
    fn test_push_layout() {
        let mut sign = PackedSign::EMPTY;
        sign.push(Dot).unwrap();
        assert_eq!(sign.raw(), 0b01);
        sign.push(Dash).unwrap();
        assert_eq!(sign.raw(), 0b01_0111);
        assert_eq!(sign.to_be_bytes(), [0x00, 0x00, 0x00, 0x17]);
    }

    #[test]
    fn test_single_dot_is_one() {
        assert_eq!(PackedSign::from(&[Dot][..]).to_be_bytes(), [0, 0, 0, 1]);
    }

    fn round_trip_all(prefix: &mut Vec<Element>, sign: PackedSign) -> usize {
        let mut count = 0;
        for element in [Dot, Dash] {
            let mut next = sign;
            if next.push(element).is_err() {
                continue;
            }
            prefix.push(element);
            assert_eq!(next.len(), prefix.len());
            assert!(next.elements().eq(prefix.iter().copied()), "{prefix:?}");
            assert_eq!(PackedSign::from(&prefix[..]), next);
            count += 1 + round_trip_all(prefix, next);
            let _ = prefix.pop();
        }
        count
    }

    #[test]
    fn test_every_fitting_sequence_round_trips() {
        // Sequences of 2-bit dots and 4-bit dashes totalling at most 32 bits.
        let count = round_trip_all(&mut Vec::new(), PackedSign::EMPTY);
        assert_eq!(count, 4_179);
    }

    #[test]
    fn test_elements_round_trip() {
        let cases: &[&[Element]] = &[
            &[Dot],
            &[Dash],
            &[Dot, Dash],
            &[Dash, Dot],
            &[Dash, Dash, Dot, Dot],
            &[Dot, Dot, Dash, Dash, Dot, Dash, Dot],
            &[Dash; 8],
            &[Dot; 16],
            &[Dash, Dot, Dot, Dot, Dot, Dot, Dot, Dot, Dot, Dot, Dot, Dot, Dot, Dash],
        ];
        for &elements in cases {
            let sign = PackedSign::from(elements);
            assert_eq!(sign.len(), elements.len());
            assert!(sign.elements().eq(elements.iter().copied()));
        }
    }

    #[test]
    fn test_push_overflow() {
        let mut sign = PackedSign::from(&[Dot; 16][..]);
        assert_eq!(sign.push(Dot), Err(CodecError::Overflow));
        let mut sign = PackedSign::from(&[Dash; 7][..]);
        assert_eq!(sign.push(Dash), Ok(()));
        assert_eq!(sign.push(Dot), Err(CodecError::Overflow));
        assert_eq!(sign.len(), 8);
    }

    #[test]
    fn test_empty_sign_has_no_elements() {
        assert_eq!(PackedSign::EMPTY.elements().next(), None);
        assert!(PackedSign::EMPTY.is_empty());
    }

    #[test]
    fn test_encode_table() {
        assert_eq!(encode(b'A'), Ok(PackedSign::from(&[Dot, Dash][..])));
        assert_eq!(encode(b'a'), encode(b'A'));
        assert_eq!(encode(b'0'), Ok(PackedSign::from(&[Dash; 5][..])));
        assert!(encode(b'?').unwrap().elements().eq([Dot, Dot, Dash, Dash, Dot, Dot]));
    }

    #[test]
    fn test_every_table_entry_decodes_to_its_pattern() {
        for &(ch, pattern) in CODES {
            let sign = encode(ch).unwrap();
            let expected = pattern.bytes().map(|b| if b == b'-' { Dash } else { Dot });
            assert!(sign.elements().eq(expected), "{}", ch as char);
        }
    }

    #[test]
    fn test_encode_unknown() {
        assert_eq!(encode(b'#'), Err(CodecError::UnknownCharacter(b'#')));
        assert_eq!(encode(0x80), Err(CodecError::UnknownCharacter(0x80)));
        assert_eq!(encode(b' '), Err(CodecError::UnknownCharacter(b' ')));
    }

    #[test]
    fn test_be_bytes_round_trip() {
        let sign = encode(b'$').unwrap();
        assert_eq!(PackedSign::from_be_bytes(sign.to_be_bytes()), sign);
    }

    #[test]
    fn test_le_bytes_put_low_byte_first() {
        let sign = PackedSign::from_le_bytes([0x17, 0x00, 0x00, 0x00]);
        assert_eq!(sign, PackedSign::from_raw(0x17));
        assert!(sign.elements().eq([Dot, Dash]));
        assert_eq!(PackedSign::from_le_bytes([0x00, 0x01, 0x00, 0x00]).raw(), 0x0100);
    }
}
