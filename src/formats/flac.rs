// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Native FLAC: an optional leading ID3v2 tag, the `fLaC` magic, then a chain of metadata
//! blocks. STREAMINFO carries the audio properties; VORBIS_COMMENT and PICTURE carry metadata.

use crate::error::{parse_error, Result};
use crate::formats::vorbis_comment;
use crate::formats::{id3, GetOptions};
use crate::io::ByteReader;
use crate::tag::{Image, Tag};

const STREAMINFO: u8 = 0;
const VORBIS_COMMENT: u8 = 4;
const PICTURE: u8 = 6;

pub fn parse(reader: &mut ByteReader, opts: &GetOptions, tag: &mut Tag) -> Result<()> {
    let mut leading_id3 = None;

    if reader.peek(3)? == b"ID3" {
        let mut id3_tag = Tag::new(tag.filesize);
        id3::parse_id3v2(reader, opts, &mut id3_tag)?;
        leading_id3 = Some(id3_tag);
    }

    if reader.read_vec(4)? != b"fLaC" {
        return parse_error("missing fLaC magic");
    }

    loop {
        let header = reader.read_vec(4)?;
        let block_type = header[0] & 0x7f;
        let is_last = header[0] & 0x80 != 0;
        let size = u32::from_be_bytes([0, header[1], header[2], header[3]]) as u64;

        match block_type {
            STREAMINFO if opts.duration => parse_streaminfo(reader, tag, size)?,
            VORBIS_COMMENT if opts.tags => {
                let body = reader.read_vec(size as usize)?;
                let mut body_reader = ByteReader::from_bytes(body);
                vorbis_comment::parse(&mut body_reader, opts, tag, true)?;
            }
            PICTURE if opts.tags && opts.image => {
                let body = reader.read_vec(size as usize)?;
                let mut body_reader = ByteReader::from_bytes(body);
                parse_picture(&mut body_reader, tag)?;
            }
            t if t >= 127 => {
                log::warn!("invalid flac metadata block type {t}");
                return parse_error("invalid flac block type");
            }
            _ => reader.skip(size)?,
        }

        if is_last {
            break;
        }
    }

    if let Some(id3_tag) = leading_id3 {
        merge_id3_fallback(tag, id3_tag);
    }

    Ok(())
}

fn parse_streaminfo(reader: &mut ByteReader, tag: &mut Tag, size: u64) -> Result<()> {
    if size < 34 {
        return parse_error("truncated STREAMINFO block");
    }

    let body = reader.read_vec(size as usize)?;

    let samplerate = (u32::from(body[10]) << 12) | (u32::from(body[11]) << 4) | (u32::from(body[12]) >> 4);
    let channels = ((body[12] >> 1) & 0x07) + 1;
    let bitdepth = ((body[12] & 1) << 4) | (body[13] >> 4);
    let bitdepth = bitdepth + 1;

    let total_samples = (u64::from(body[13] & 0x0f) << 32)
        | (u64::from(body[14]) << 24)
        | (u64::from(body[15]) << 16)
        | (u64::from(body[16]) << 8)
        | u64::from(body[17]);

    tag.samplerate = Some(samplerate);
    tag.channels = Some(u32::from(channels));
    tag.bitdepth = Some(u32::from(bitdepth));

    if samplerate > 0 {
        let duration = total_samples as f64 / samplerate as f64;
        tag.duration = Some(duration);
        if duration > 0.0 {
            tag.bitrate = Some(tag.filesize as f64 / duration * 8.0 / 1000.0);
        }
    }

    Ok(())
}

/// Parses a `METADATA_BLOCK_PICTURE` payload (also the format Vorbis comments base64-encode
/// under the `metadata_block_picture` key).
pub fn parse_picture(reader: &mut ByteReader, tag: &mut Tag) -> Result<()> {
    let pic_type = reader.read_u32be()?;
    let mime_len = reader.read_u32be()? as usize;
    let mime_type = crate::text::decode_utf8_lossy(&reader.read_vec(mime_len)?);

    let desc_len = reader.read_u32be()? as usize;
    let description = crate::text::decode_utf8_lossy(&reader.read_vec(desc_len)?);

    let _width = reader.read_u32be()?;
    let _height = reader.read_u32be()?;
    let _depth = reader.read_u32be()?;
    let _colors = reader.read_u32be()?;

    let data_len = reader.read_u32be()? as usize;
    let data = reader.read_vec(data_len)?;

    let name = id3::picture_type_slot(pic_type);
    let description = if description.is_empty() { None } else { Some(description) };

    tag.images.set(Image { name: name.to_string(), data, mime_type, description });

    Ok(())
}

/// ID3 fields apply only where the Vorbis comment block left them unset, so this merge runs
/// after the metadata blocks rather than before.
fn merge_id3_fallback(tag: &mut Tag, id3_tag: Tag) {
    macro_rules! fallback {
        ($field:ident) => {
            if tag.$field.is_none() {
                tag.$field = id3_tag.$field;
            }
        };
    }

    fallback!(artist);
    fallback!(albumartist);
    fallback!(composer);
    fallback!(album);
    fallback!(title);
    fallback!(genre);
    fallback!(comment);
    fallback!(year);
    fallback!(disc);
    fallback!(disc_total);
    fallback!(track);
    fallback!(track_total);

    for (key, values) in id3_tag.other {
        for value in values {
            tag.push_other(&key, value);
        }
    }

    if tag.images.any().is_none() {
        tag.images = id3_tag.images;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::GetOptions;

    fn streaminfo_bytes(samplerate: u32, channels: u8, bitdepth: u8, total_samples: u64) -> Vec<u8> {
        let mut body = vec![0u8; 34];
        // min/max block size, min/max frame size: unused by our parser.
        let sr_ch_bd_samples: u64 = (u64::from(samplerate) << 44)
            | (u64::from(channels - 1) << 41)
            | (u64::from(bitdepth - 1) << 36)
            | total_samples;
        let bytes = sr_ch_bd_samples.to_be_bytes();
        body[10..18].copy_from_slice(&bytes);
        body
    }

    #[test]
    fn parses_streaminfo_duration_and_bitrate() {
        let body = streaminfo_bytes(44100, 2, 16, 44100 * 10);

        let mut bytes = vec![];
        bytes.extend_from_slice(b"fLaC");
        bytes.push(0x80); // STREAMINFO, last block
        bytes.extend_from_slice(&[0, 0, 34]);
        bytes.extend_from_slice(&body);

        let mut reader = ByteReader::from_bytes(bytes);
        let mut tag = Tag::new(1_000_000);
        let opts = GetOptions::default();
        parse(&mut reader, &opts, &mut tag).unwrap();

        assert_eq!(tag.samplerate, Some(44100));
        assert_eq!(tag.channels, Some(2));
        assert_eq!(tag.bitdepth, Some(16));
        assert!((tag.duration.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_missing_magic() {
        let mut reader = ByteReader::from_bytes(b"NOPE".to_vec());
        let mut tag = Tag::new(4);
        let opts = GetOptions::default();
        assert!(parse(&mut reader, &opts, &mut tag).is_err());
    }
}
