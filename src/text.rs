// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text decoding helpers shared by every tag format.
//!
//! Every container squirrels tag text away in a slightly different encoding. Rather than
//! let each format module hand-roll its own decoding, the conversions live here and formats
//! just pick an [`Encoding`] and call [`decode`].

use std::char;

/// The text encodings a parser might encounter inside a frame, comment, or chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// ISO-8859-1 (Latin-1), one byte per character.
    Latin1,
    /// UTF-8.
    Utf8,
    /// UTF-16 with a byte-order-mark; assumes big-endian if the BOM is missing.
    Utf16Bom,
    /// UTF-16 big-endian without a byte-order-mark.
    Utf16Be,
    /// UTF-16 little-endian without a byte-order-mark.
    Utf16Le,
    /// Shift-JIS, as used by a handful of Japanese-tagged MP3s.
    ShiftJis,
}

impl Encoding {
    /// Maps an ID3v2 text-encoding byte (0-3) to an [`Encoding`].
    pub fn from_id3v2_byte(byte: u8) -> Option<Encoding> {
        match byte {
            0 => Some(Encoding::Latin1),
            1 => Some(Encoding::Utf16Bom),
            2 => Some(Encoding::Utf16Le),
            3 => Some(Encoding::Utf8),
            _ => None,
        }
    }
}

/// Decodes `buf` as ISO-8859-1, replacing the control codes ID3v2 forbids (every C0/C1 code
/// except line-feed) with the Unicode replacement character.
pub fn decode_latin1(buf: &[u8]) -> String {
    buf.iter()
        .map(|&c| match c {
            0x00..=0x09 | 0x0b..=0x1f | 0x80..=0x9f => char::REPLACEMENT_CHARACTER,
            _ => char::from(c),
        })
        .collect()
}

/// Decodes `buf` as UTF-8, substituting the replacement character for invalid sequences.
pub fn decode_utf8_lossy(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf).into_owned()
}

/// Decodes `buf` as big-endian UTF-16 (no BOM), substituting the replacement character for
/// unpaired surrogates.
pub fn decode_utf16be_lossy(buf: &[u8]) -> String {
    decode_utf16_lossy(buf, false)
}

/// Decodes `buf` as little-endian UTF-16, substituting the replacement character for unpaired
/// surrogates.
pub fn decode_utf16le_lossy(buf: &[u8]) -> String {
    decode_utf16_lossy(buf, true)
}

/// Decodes `buf` as UTF-16, sniffing a leading byte-order-mark to pick endianness. Falls back
/// to big-endian when no BOM is present, per the ID3v2 default. Tolerates a second, spurious
/// BOM immediately following the first, which some encoders emit.
pub fn decode_utf16_bom_lossy(buf: &[u8]) -> String {
    let (little_endian, rest) = match buf {
        [0xff, 0xfe, tail @ ..] => (true, tail),
        [0xfe, 0xff, tail @ ..] => (false, tail),
        _ => (false, buf),
    };

    // Some writers double up the BOM (e.g. "\0\0\xff\xfe..."); strip a second one if present.
    let rest = match rest {
        [0xff, 0xfe, tail @ ..] if little_endian => tail,
        [0xfe, 0xff, tail @ ..] if !little_endian => tail,
        _ => rest,
    };

    decode_utf16_lossy(rest, little_endian)
}

fn decode_utf16_lossy(buf: &[u8], little_endian: bool) -> String {
    let units = buf.chunks_exact(2).map(|pair| {
        let pair = [pair[0], pair[1]];
        if little_endian {
            u16::from_le_bytes(pair)
        } else {
            u16::from_be_bytes(pair)
        }
    });

    char::decode_utf16(units).map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)).collect()
}

/// Decodes `buf` as Shift-JIS, substituting the replacement character for invalid sequences.
pub fn decode_shift_jis(buf: &[u8]) -> String {
    let (text, _, _) = encoding_rs::SHIFT_JIS.decode(buf);
    text.into_owned()
}

/// Decodes `buf` per the given [`Encoding`].
pub fn decode(buf: &[u8], encoding: Encoding) -> String {
    match encoding {
        Encoding::Latin1 => decode_latin1(buf),
        Encoding::Utf8 => decode_utf8_lossy(buf),
        Encoding::Utf16Bom => decode_utf16_bom_lossy(buf),
        Encoding::Utf16Be => decode_utf16be_lossy(buf),
        Encoding::Utf16Le => decode_utf16le_lossy(buf),
        Encoding::ShiftJis => decode_shift_jis(buf),
    }
}

/// Strips one trailing NUL-terminator appropriate to `encoding` (one byte for byte-aligned
/// encodings, two for UTF-16 variants) from a raw frame buffer before decoding.
pub fn trim_terminator<'a>(buf: &'a [u8], encoding: Encoding) -> &'a [u8] {
    match encoding {
        Encoding::Latin1 | Encoding::Utf8 | Encoding::ShiftJis => match buf.last() {
            Some(0) => &buf[..buf.len() - 1],
            _ => buf,
        },
        Encoding::Utf16Bom | Encoding::Utf16Be | Encoding::Utf16Le => {
            if buf.len() >= 2 && buf[buf.len() - 2..] == [0, 0] {
                &buf[..buf.len() - 2]
            } else {
                buf
            }
        }
    }
}

/// Strips every trailing NUL character a decoded string may still carry (e.g. from a fixed
/// width field), leaving embedded NULs alone so callers can still split on them.
pub fn strip_trailing_nuls(s: &str) -> &str {
    s.trim_end_matches('\0')
}

/// Splits a decoded string on embedded NUL characters, the separator ID3v1 and some ID3v2
/// writers use to cram several values into one field (e.g. "Artist One\0Artist Two").
/// Empty segments are dropped.
pub fn split_nul(s: &str) -> Vec<String> {
    s.split('\0').map(str::trim).filter(|part| !part.is_empty()).map(str::to_string).collect()
}

/// Strips a leading 3-byte ISO-639-2 language code from a `COMM`/`USLT` frame body, returning
/// the remaining bytes. The language code itself is always stored as 3 raw bytes regardless of
/// the frame's text encoding, so this must run before the encoding-specific decode.
pub fn strip_id3_language_prefix(buf: &[u8]) -> &[u8] {
    if buf.len() >= 3 {
        &buf[3..]
    } else {
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_replaces_control_codes_but_keeps_linefeed() {
        let decoded = decode_latin1(&[b'A', 0x0a, 0x01, 0xe9]);
        assert_eq!(decoded, "A\n\u{fffd}\u{e9}");
    }

    #[test]
    fn utf16_bom_sniffs_endianness() {
        // "AB" little-endian with BOM.
        let le = [0xff, 0xfe, b'A', 0x00, b'B', 0x00];
        assert_eq!(decode_utf16_bom_lossy(&le), "AB");

        // "AB" big-endian with BOM.
        let be = [0xfe, 0xff, 0x00, b'A', 0x00, b'B'];
        assert_eq!(decode_utf16_bom_lossy(&be), "AB");
    }

    #[test]
    fn utf16_bom_defaults_to_big_endian_when_missing() {
        let no_bom = [0x00, b'A', 0x00, b'B'];
        assert_eq!(decode_utf16_bom_lossy(&no_bom), "AB");
    }

    #[test]
    fn utf16_bom_tolerates_duplicated_bom() {
        let doubled = [0xff, 0xfe, 0xff, 0xfe, b'A', 0x00];
        assert_eq!(decode_utf16_bom_lossy(&doubled), "A");
    }

    #[test]
    fn split_nul_drops_empty_segments() {
        assert_eq!(split_nul("Alice\0Bob\0"), vec!["Alice", "Bob"]);
        assert_eq!(split_nul("Solo"), vec!["Solo"]);
        assert_eq!(split_nul(""), Vec::<String>::new());
    }

    #[test]
    fn trim_terminator_handles_wide_and_narrow_nuls() {
        assert_eq!(trim_terminator(b"hello\0", Encoding::Utf8), b"hello");
        assert_eq!(trim_terminator(b"h\x00e\x00\x00\x00", Encoding::Utf16Be), b"h\x00e\x00");
    }

    #[test]
    fn strip_id3_language_prefix_removes_three_bytes() {
        assert_eq!(strip_id3_language_prefix(b"enghello"), b"hello");
        assert_eq!(strip_id3_language_prefix(b"en"), b"en");
    }
}
