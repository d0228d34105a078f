// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ASF/WMA: a flat sequence of 128-bit-GUID-tagged objects inside one top-level Header Object.
//! Metadata splits across two objects (Content Description for the handful of "classic" fields,
//! Extended Content Description for everything else as `WM/Name` key/value pairs); audio
//! properties come from the File Properties and Stream Properties objects.

use std::io::SeekFrom;

use crate::error::{parse_error, Result};
use crate::formats::GetOptions;
use crate::io::ByteReader;
use crate::tag::{Field, Tag};
use crate::text::decode_utf16le_lossy;

/// The ASF Header Object GUID, exposed for the dispatcher's magic-byte sniffing.
pub const HEADER_OBJECT_GUID: [u8; 16] = [
    0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];
const CONTENT_DESCRIPTION_GUID: [u8; 16] = [
    0x33, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];
const EXTENDED_CONTENT_DESCRIPTION_GUID: [u8; 16] = [
    0x40, 0xA4, 0xD0, 0xD2, 0x07, 0xE3, 0xD2, 0x11, 0x97, 0xF0, 0x00, 0xA0, 0xC9, 0x5E, 0xA8, 0x50,
];
const FILE_PROPERTIES_GUID: [u8; 16] = [
    0xA1, 0xDC, 0xAB, 0x8C, 0x47, 0xA9, 0xCF, 0x11, 0x8E, 0xE4, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65,
];
const STREAM_PROPERTIES_GUID: [u8; 16] = [
    0x91, 0x07, 0xDC, 0xB7, 0xB7, 0xA9, 0xCF, 0x11, 0x8E, 0xE6, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65,
];
const STREAM_TYPE_AUDIO_GUID: [u8; 16] = [
    0x40, 0x9E, 0x69, 0xF8, 0x4D, 0x5B, 0xCF, 0x11, 0xA8, 0xFD, 0x00, 0x80, 0x5F, 0x5C, 0x44, 0x2B,
];

pub fn parse(reader: &mut ByteReader, opts: &GetOptions, tag: &mut Tag) -> Result<()> {
    let guid = reader.read_vec(16)?;
    if guid != HEADER_OBJECT_GUID {
        return parse_error("missing ASF header object GUID");
    }
    let _header_size = reader.read_u64le()?;
    let _object_count = reader.read_u32le()?;
    let _reserved = reader.read_vec(2)?;

    loop {
        if reader.pos()? + 24 > reader.len() {
            break;
        }
        let object_guid = reader.read_vec(16)?;
        let object_size = reader.read_u64le()?;
        let object_start = reader.pos()?;
        let object_end = object_start + (object_size - 24);

        if object_guid == CONTENT_DESCRIPTION_GUID {
            if opts.tags {
                parse_content_description(reader, tag)?;
            }
        } else if object_guid == EXTENDED_CONTENT_DESCRIPTION_GUID {
            if opts.tags {
                parse_extended_content_description(reader, tag)?;
            }
        } else if object_guid == FILE_PROPERTIES_GUID {
            if opts.duration {
                parse_file_properties(reader, tag)?;
            }
        } else if object_guid == STREAM_PROPERTIES_GUID {
            if opts.duration {
                parse_stream_properties(reader, object_end, tag)?;
            }
        }

        reader.seek(SeekFrom::Start(object_end))?;
    }

    Ok(())
}

fn parse_content_description(reader: &mut ByteReader, tag: &mut Tag) -> Result<()> {
    let title_len = reader.read_u16le()? as usize;
    let author_len = reader.read_u16le()? as usize;
    let copyright_len = reader.read_u16le()? as usize;
    let comment_len = reader.read_u16le()? as usize;
    let rating_len = reader.read_u16le()? as usize;

    let title = decode_utf16le_lossy(&reader.read_vec(title_len)?);
    let author = decode_utf16le_lossy(&reader.read_vec(author_len)?);
    let _copyright = reader.read_vec(copyright_len)?;
    let comment = decode_utf16le_lossy(&reader.read_vec(comment_len)?);
    let _rating = reader.read_vec(rating_len)?;

    let title = title.trim_end_matches('\0').to_string();
    let author = author.trim_end_matches('\0').to_string();
    let comment = comment.trim_end_matches('\0').to_string();

    if !title.is_empty() {
        tag.set_field(Field::Title, &title);
    }
    if !author.is_empty() {
        tag.set_field(Field::Artist, &author);
    }
    if !comment.is_empty() {
        tag.set_field(Field::Comment, &comment);
    }

    Ok(())
}

fn parse_extended_content_description(reader: &mut ByteReader, tag: &mut Tag) -> Result<()> {
    let count = reader.read_u16le()?;

    for _ in 0..count {
        let name_len = reader.read_u16le()? as usize;
        let name_raw = reader.read_vec(name_len)?;
        let name = decode_utf16le_lossy(&name_raw).trim_end_matches('\0').to_string();

        let value_type = reader.read_u16le()?;
        let value_len = reader.read_u16le()? as usize;
        let value_raw = reader.read_vec(value_len)?;

        let value = match value_type {
            0 => Some(decode_utf16le_lossy(&value_raw).trim_end_matches('\0').to_string()),
            1 => None, // byte array, not a text field we expose
            2 => Some(if value_raw == [1, 0, 0, 0] { "1" } else { "0" }.to_string()), // bool
            3 if value_raw.len() >= 4 => Some(u32::from_le_bytes(value_raw[..4].try_into().unwrap()).to_string()),
            4 if value_raw.len() >= 8 => Some(u64::from_le_bytes(value_raw[..8].try_into().unwrap()).to_string()),
            5 if value_raw.len() >= 2 => Some(u16::from_le_bytes(value_raw[..2].try_into().unwrap()).to_string()),
            _ => None,
        };

        let Some(value) = value else { continue };
        if value.is_empty() {
            continue;
        }

        apply_wm_field(tag, &name, &value);
    }

    Ok(())
}

fn apply_wm_field(tag: &mut Tag, name: &str, value: &str) {
    match name {
        "WM/TrackNumber" => {
            if let Ok(n) = value.parse() {
                Tag::set_int_if_unset(&mut tag.track, n);
            }
        }
        "WM/PartOfSet" => {
            let (disc, total) = match value.split_once('/') {
                Some((d, t)) => (d, Some(t)),
                None => (value, None),
            };
            if let Ok(n) = disc.parse() {
                Tag::set_int_if_unset(&mut tag.disc, n);
            }
            if let Some(t) = total {
                if let Ok(n) = t.parse() {
                    Tag::set_int_if_unset(&mut tag.disc_total, n);
                }
            }
        }
        "WM/AlbumTitle" => tag.set_field(Field::Album, value),
        "WM/AlbumArtist" => tag.set_field(Field::AlbumArtist, value),
        "WM/Genre" => tag.set_field(Field::Genre, value),
        "WM/Year" => tag.set_field(Field::Year, value),
        "WM/Composer" => tag.set_field(Field::Composer, value),
        "WM/Lyrics" => tag.push_other("lyrics", value),
        other if other.starts_with("WM/") => {
            tag.push_other(&other[3..].to_ascii_lowercase(), value);
        }
        other => tag.push_other(&other.to_ascii_lowercase(), value),
    }
}

fn parse_file_properties(reader: &mut ByteReader, tag: &mut Tag) -> Result<()> {
    reader.skip(40)?; // file id, file size, creation date, data packet count
    let play_duration = reader.read_u64le()?; // 100ns units
    reader.skip(8)?; // send duration
    let preroll = reader.read_u64le()?; // milliseconds

    let duration = (play_duration as f64 / 1.0e7) - (preroll as f64 / 1000.0);
    Tag::set_f64_if_unset(&mut tag.duration, duration.max(0.0));

    Ok(())
}

fn parse_stream_properties(reader: &mut ByteReader, object_end: u64, tag: &mut Tag) -> Result<()> {
    let stream_type = reader.read_vec(16)?;
    let _error_correction_type = reader.read_vec(16)?;
    reader.skip(8)?; // time offset
    reader.skip(4)?; // type-specific data length
    reader.skip(4)?; // error correction data length
    reader.skip(2)?; // flags
    reader.skip(4)?; // reserved

    if stream_type != STREAM_TYPE_AUDIO_GUID {
        return Ok(());
    }
    if reader.pos()? + 16 > object_end {
        return Ok(());
    }

    let codec_tag = reader.read_u16le()?;
    let channels = reader.read_u16le()?;
    let samplerate = reader.read_u32le()?;
    let avg_bytes_per_sec = reader.read_u32le()?;
    reader.skip(2)?; // block alignment
    let bits_per_sample = reader.read_u16le()?;

    tag.channels = Some(u32::from(channels));
    tag.samplerate = Some(samplerate);
    Tag::set_f64_if_unset(&mut tag.bitrate, f64::from(avg_bytes_per_sec) * 8.0 / 1000.0);

    // WMA Lossless reports a meaningful bit depth; lossy codecs typically report 16 regardless
    // of the source material, which isn't worth surfacing.
    if codec_tag == 355 {
        tag.bitdepth = Some(u32::from(bits_per_sample));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_header(objects: &[Vec<u8>]) -> Vec<u8> {
        let mut body = Vec::new();
        for obj in objects {
            body.extend_from_slice(obj);
        }
        let mut bytes = HEADER_OBJECT_GUID.to_vec();
        let total_size = 30 + body.len() as u64;
        bytes.extend_from_slice(&total_size.to_le_bytes());
        bytes.extend_from_slice(&(objects.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&[1, 2]);
        bytes.extend_from_slice(&body);
        bytes
    }

    fn content_description_object(title: &str, author: &str) -> Vec<u8> {
        let title_bytes: Vec<u8> = title.encode_utf16().flat_map(|u| u.to_le_bytes()).chain([0, 0]).collect();
        let author_bytes: Vec<u8> = author.encode_utf16().flat_map(|u| u.to_le_bytes()).chain([0, 0]).collect();

        let mut body = Vec::new();
        body.extend_from_slice(&(title_bytes.len() as u16).to_le_bytes());
        body.extend_from_slice(&(author_bytes.len() as u16).to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&title_bytes);
        body.extend_from_slice(&author_bytes);

        let mut object = CONTENT_DESCRIPTION_GUID.to_vec();
        object.extend_from_slice(&(24 + body.len() as u64).to_le_bytes());
        object.extend_from_slice(&body);
        object
    }

    #[test]
    fn parses_content_description_title_and_author() {
        let bytes = build_header(&[content_description_object("Song", "Artist Name")]);
        let mut reader = ByteReader::from_bytes(bytes);
        let mut tag = Tag::new(reader.len());
        let opts = GetOptions::default();
        parse(&mut reader, &opts, &mut tag).unwrap();

        assert_eq!(tag.title.as_deref(), Some("Song"));
        assert_eq!(tag.artist.as_deref(), Some("Artist Name"));
    }
}
