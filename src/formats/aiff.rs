// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! AIFF/AIFC: the IFF chunk format Apple used before QuickTime. `COMM` carries the audio
//! properties, including a sample rate encoded as an 80-bit IEEE extended-precision float.

use std::io::SeekFrom;

use crate::error::{parse_error, Result};
use crate::formats::{id3, GetOptions};
use crate::io::ByteReader;
use crate::tag::{Field, Tag};
use crate::text::decode_utf8_lossy;

pub fn parse(reader: &mut ByteReader, opts: &GetOptions, tag: &mut Tag) -> Result<()> {
    if reader.read_vec(4)? != b"FORM" {
        return parse_error("missing FORM magic");
    }
    let _form_size = reader.read_u32be()?;
    let form_type = reader.read_vec(4)?;
    if form_type != b"AIFF" && form_type != b"AIFC" {
        return parse_error("not an AIFF/AIFC file");
    }

    let mut samplerate = 0u32;
    let mut num_sample_frames = 0u64;

    while reader.pos()? + 8 <= reader.len() {
        let chunk_id = reader.read_vec(4)?;
        let chunk_size = reader.read_u32be()? as u64;
        let chunk_start = reader.pos()?;

        match &chunk_id[..] {
            b"COMM" if opts.duration => {
                let channels = reader.read_u16be()?;
                num_sample_frames = u64::from(reader.read_u32be()?);
                let bitdepth = reader.read_u16be()?;
                let rate_bytes = reader.read_vec(10)?;
                samplerate = decode_extended_float(&rate_bytes).unwrap_or(0.0) as u32;

                tag.channels = Some(u32::from(channels));
                tag.bitdepth = Some(u32::from(bitdepth));
                tag.samplerate = Some(samplerate);
            }
            b"NAME" if opts.tags => {
                set_text(tag, Field::Title, reader, chunk_size)?;
            }
            b"AUTH" if opts.tags => {
                set_text(tag, Field::Artist, reader, chunk_size)?;
            }
            b"ANNO" if opts.tags => {
                set_text(tag, Field::Comment, reader, chunk_size)?;
            }
            b"(c) " if opts.tags => {
                let raw = reader.read_vec(chunk_size as usize)?;
                let text = decode_utf8_lossy(&raw).trim().to_string();
                if !text.is_empty() {
                    tag.push_other("copyright", text);
                }
            }
            b"id3 " | b"ID3 " if opts.tags => {
                id3::parse_id3v2(reader, opts, tag)?;
            }
            _ => {}
        }

        let padded = chunk_size + (chunk_size & 1);
        reader.seek(SeekFrom::Start(chunk_start + padded))?;
    }

    if opts.duration && samplerate > 0 {
        let duration = num_sample_frames as f64 / f64::from(samplerate);
        tag.duration = Some(duration);
        if duration > 0.0 {
            let bitdepth = tag.bitdepth.unwrap_or(0);
            let channels = tag.channels.unwrap_or(0);
            tag.bitrate =
                Some(f64::from(samplerate) * f64::from(channels) * f64::from(bitdepth) / 1000.0);
        }
    }

    Ok(())
}

fn set_text(tag: &mut Tag, field: Field, reader: &mut ByteReader, size: u64) -> Result<()> {
    let raw = reader.read_vec(size as usize)?;
    let text = decode_utf8_lossy(&raw).trim().to_string();
    if !text.is_empty() {
        tag.set_field(field, &text);
    }
    Ok(())
}

/// Decodes an 80-bit IEEE 754 extended-precision float (the format AIFF's `COMM` chunk uses for
/// the sample rate). Returns `None` on an exponent that would overflow `f64`.
fn decode_extended_float(bytes: &[u8]) -> Option<f64> {
    if bytes.len() < 10 {
        return None;
    }

    let sign = if bytes[0] & 0x80 != 0 { -1.0 } else { 1.0 };
    let exponent = (u16::from(bytes[0] & 0x7f) << 8 | u16::from(bytes[1])) as i32;
    let mantissa = u64::from_be_bytes(bytes[2..10].try_into().unwrap());

    if exponent == 0 && mantissa == 0 {
        return Some(0.0);
    }

    let power = exponent - 0x3fff - 63;
    if !(-1100..=1100).contains(&power) {
        return None;
    }

    Some(sign * mantissa as f64 * 2f64.powi(power))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_extended_float(value: f64) -> [u8; 10] {
        // Minimal encoder matching the layout decode_extended_float expects, sufficient for the
        // sample rates AIFF files actually carry (e.g. 44100, 48000).
        let mut exponent = 0x3fff + 63;
        let mut mantissa = value as u64;
        while mantissa < (1u64 << 63) && mantissa != 0 {
            mantissa <<= 1;
            exponent -= 1;
        }
        let mut bytes = [0u8; 10];
        bytes[0] = (exponent >> 8) as u8;
        bytes[1] = (exponent & 0xff) as u8;
        bytes[2..10].copy_from_slice(&mantissa.to_be_bytes());
        bytes
    }

    #[test]
    fn decodes_extended_float_roundtrip() {
        let bytes = encode_extended_float(44100.0);
        let decoded = decode_extended_float(&bytes).unwrap();
        assert!((decoded - 44100.0).abs() < 1.0);
    }

    #[test]
    fn rejects_missing_form_magic() {
        let mut reader = ByteReader::from_bytes(b"NOPE".to_vec());
        let mut tag = Tag::new(4);
        let opts = GetOptions::default();
        assert!(parse(&mut reader, &opts, &mut tag).is_err());
    }
}
