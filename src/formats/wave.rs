// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RIFF WAVE: a flat chunk list. Audio properties live in `fmt `, sample count in `data`, and
//! metadata in either an `INFO` list or an embedded ID3v2 tag under `id3 `/`ID3 `.

use crate::error::{parse_error, Result};
use crate::formats::{id3, GetOptions};
use crate::io::ByteReader;
use crate::tag::{Field, Tag};
use crate::text::decode_latin1;

pub fn parse(reader: &mut ByteReader, opts: &GetOptions, tag: &mut Tag) -> Result<()> {
    if reader.read_vec(4)? != b"RIFF" {
        return parse_error("missing RIFF magic");
    }
    let _riff_size = reader.read_u32le()?;
    if reader.read_vec(4)? != b"WAVE" {
        return parse_error("missing WAVE magic");
    }

    let mut samplerate = 0u32;
    let mut channels = 0u32;
    let mut bitdepth = 0u32;
    let mut data_size = 0u64;

    while reader.pos()? + 8 <= reader.len() {
        let chunk_id = reader.read_vec(4)?;
        let chunk_size = reader.read_u32le()? as u64;
        let chunk_start = reader.pos()?;

        match &chunk_id[..] {
            b"fmt " if opts.duration => {
                let _format_tag = reader.read_u16le()?;
                channels = u32::from(reader.read_u16le()?);
                samplerate = reader.read_u32le()?;
                let _byte_rate = reader.read_u32le()?;
                let _block_align = reader.read_u16le()?;
                bitdepth = u32::from(reader.read_u16le()?).max(1);

                tag.channels = Some(channels);
                tag.samplerate = Some(samplerate);
                tag.bitdepth = Some(bitdepth);
                if samplerate > 0 && channels > 0 {
                    tag.bitrate = Some(samplerate as f64 * channels as f64 * bitdepth as f64 / 1000.0);
                }
            }
            b"data" => {
                data_size = chunk_size;
            }
            b"LIST" | b"list" if opts.tags => {
                parse_info_list(reader, tag, chunk_size)?;
            }
            b"id3 " | b"ID3 " if opts.tags => {
                id3::parse_id3v2(reader, opts, tag)?;
            }
            _ => {}
        }

        let padded_size = chunk_size + (chunk_size & 1);
        reader.seek(std::io::SeekFrom::Start(chunk_start + padded_size))?;
    }

    if opts.duration && samplerate > 0 && channels > 0 && bitdepth > 0 {
        let bytes_per_sample = bitdepth as f64 / 8.0;
        tag.duration = Some(data_size as f64 / channels as f64 / samplerate as f64 / bytes_per_sample);
    }

    Ok(())
}

const RIFF_INFO_MAPPING: &[(&[u8; 4], Field)] = &[
    (b"INAM", Field::Title),
    (b"TITL", Field::Title),
    (b"IPRD", Field::Album),
    (b"IART", Field::Artist),
    (b"ICMT", Field::Comment),
    (b"ICRD", Field::Year),
    (b"YEAR", Field::Year),
    (b"IGNR", Field::Genre),
];

fn parse_info_list(reader: &mut ByteReader, tag: &mut Tag, chunk_size: u64) -> Result<()> {
    let start = reader.pos()?;
    if reader.read_vec(4)? != b"INFO" {
        reader.seek(std::io::SeekFrom::Start(start))?;
        return Ok(());
    }

    let end = start + chunk_size;
    while reader.pos()? + 8 <= end {
        let sub_id = reader.read_vec(4)?;
        let sub_size = reader.read_u32le()? as u64;
        let sub_start = reader.pos()?;
        let raw = reader.read_vec(sub_size as usize)?;
        let value = decode_latin1(&raw).trim_end_matches('\0').trim().to_string();

        if !value.is_empty() {
            let id: &[u8; 4] = &sub_id.clone().try_into().unwrap_or(*b"\0\0\0\0");
            if let Some((_, field)) = RIFF_INFO_MAPPING.iter().find(|(name, _)| *name == id) {
                tag.set_field(*field, &value);
            } else if matches!(&sub_id[..], b"IPRT" | b"ITRK" | b"TRCK" | b"PRT1") {
                if let Ok(n) = value.parse() {
                    Tag::set_int_if_unset(&mut tag.track, n);
                }
            }
        }

        let padded = sub_size + (sub_size & 1);
        reader.seek(std::io::SeekFrom::Start(sub_start + padded))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut bytes = id.to_vec();
        bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
        bytes.extend_from_slice(body);
        if body.len() % 2 == 1 {
            bytes.push(0);
        }
        bytes
    }

    fn build_wave(fmt: Vec<u8>, data_len: usize, extra: Vec<u8>) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(b"WAVE");
        body.extend_from_slice(&chunk(b"fmt ", &fmt));
        body.extend_from_slice(&chunk(b"data", &vec![0u8; data_len]));
        body.extend_from_slice(&extra);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&body);
        bytes
    }

    fn fmt_chunk(channels: u16, samplerate: u32, bitdepth: u16) -> Vec<u8> {
        let byte_rate = samplerate * u32::from(channels) * u32::from(bitdepth) / 8;
        let block_align = channels * bitdepth / 8;
        let mut body = Vec::new();
        body.extend_from_slice(&1u16.to_le_bytes()); // PCM
        body.extend_from_slice(&channels.to_le_bytes());
        body.extend_from_slice(&samplerate.to_le_bytes());
        body.extend_from_slice(&byte_rate.to_le_bytes());
        body.extend_from_slice(&block_align.to_le_bytes());
        body.extend_from_slice(&bitdepth.to_le_bytes());
        body
    }

    #[test]
    fn computes_duration_from_data_size() {
        let fmt = fmt_chunk(2, 44100, 16);
        let data_len = 44100 * 2 * 2; // one second of stereo 16-bit audio
        let bytes = build_wave(fmt, data_len, Vec::new());

        let mut reader = ByteReader::from_bytes(bytes);
        let mut tag = Tag::new(reader.len());
        let opts = GetOptions::default();
        parse(&mut reader, &opts, &mut tag).unwrap();

        assert_eq!(tag.samplerate, Some(44100));
        assert_eq!(tag.channels, Some(2));
        assert!((tag.duration.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn parses_info_list_title() {
        let fmt = fmt_chunk(1, 22050, 8);
        let mut info_body = Vec::new();
        info_body.extend_from_slice(b"INFO");
        info_body.extend_from_slice(&chunk(b"INAM", b"Track Title"));
        let extra = chunk(b"LIST", &info_body);
        let bytes = build_wave(fmt, 100, extra);

        let mut reader = ByteReader::from_bytes(bytes);
        let mut tag = Tag::new(reader.len());
        let opts = GetOptions::default();
        parse(&mut reader, &opts, &mut tag).unwrap();

        assert_eq!(tag.title.as_deref(), Some("Track Title"));
    }
}
