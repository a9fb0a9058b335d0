//! Text encoding used for names and chat.
//!
//! Clients render text with the IBM code page 437 font, so the wire carries
//! CP437 bytes. The lower half is plain ASCII.

use crate::error::{ProtocolError, ProtocolResult};

/// Converts between Rust strings and wire bytes.
pub trait TextEncoding: Send + Sync {
    /// Encodes text to wire bytes.
    ///
    /// # Errors
    ///
    /// Fails with [`ProtocolError::Unencodable`] on the first character the
    /// encoding cannot represent.
    fn encode(&self, text: &str) -> ProtocolResult<Vec<u8>>;

    /// Decodes wire bytes. Every byte sequence is valid.
    fn decode(&self, bytes: &[u8]) -> String;
}

/// IBM code page 437.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cp437;

/// Characters for bytes `0x80..=0xFF`.
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
];

impl TextEncoding for Cp437 {
    #[allow(clippy::cast_possible_truncation)]
    fn encode(&self, text: &str) -> ProtocolResult<Vec<u8>> {
        text.chars()
            .map(|c| {
                if c.is_ascii() {
                    return Ok(c as u8);
                }
                CP437_HIGH
                    .iter()
                    .position(|&h| h == c)
                    .map(|i| 0x80 + i as u8)
                    .ok_or(ProtocolError::Unencodable(c))
            })
            .collect()
    }

    fn decode(&self, bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|&b| {
                if b < 0x80 {
                    char::from(b)
                } else {
                    CP437_HIGH[usize::from(b - 0x80)]
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(Cp437.encode("hello").unwrap(), b"hello");
        assert_eq!(Cp437.decode(b"hello"), "hello");
    }

    #[test]
    fn test_high_half() {
        assert_eq!(Cp437.encode("é░").unwrap(), vec![0x82, 0xB0]);
        assert_eq!(Cp437.decode(&[0x82, 0xB0]), "é░");
    }

    #[test]
    fn test_every_byte_roundtrips() {
        let all: Vec<u8> = (0..=255).collect();
        let text = Cp437.decode(&all);
        assert_eq!(Cp437.encode(&text).unwrap(), all);
    }

    #[test]
    fn test_unencodable() {
        assert_eq!(Cp437.encode("日"), Err(ProtocolError::Unencodable('日')));
    }
}
