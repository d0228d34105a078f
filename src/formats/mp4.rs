// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MP4/ISO-BMFF: a tree of length-prefixed atoms. Metadata lives under `moov/udta/meta/ilst`;
//! audio properties come from `moov/mvhd` (duration) and the sample entry inside
//! `moov/.../stsd` (`mp4a` for AAC, `alac` for Apple Lossless).

use std::io::SeekFrom;

use crate::error::Result;
use crate::formats::GetOptions;
use crate::genres;
use crate::io::ByteReader;
use crate::tag::{Image, Tag};
use crate::text::{decode_shift_jis, decode_utf16be_lossy, decode_utf8_lossy};

pub fn parse(reader: &mut ByteReader, opts: &GetOptions, tag: &mut Tag) -> Result<()> {
    let end = reader.len();
    walk_atoms(reader, end, opts, tag)
}

fn walk_atoms(reader: &mut ByteReader, end: u64, opts: &GetOptions, tag: &mut Tag) -> Result<()> {
    while reader.pos()? + 8 <= end {
        let atom_start = reader.pos()?;
        let mut size = u64::from(reader.read_u32be()?);
        let name = reader.read_vec(4)?;

        if size == 1 {
            size = reader.read_u64be()?;
        } else if size == 0 {
            size = end - atom_start;
        }
        if size < 8 {
            break;
        }
        let body_end = (atom_start + size).min(end);

        match &name[..] {
            b"moov" | b"trak" | b"mdia" | b"minf" | b"stbl" | b"udta" => {
                walk_atoms(reader, body_end, opts, tag)?;
            }
            b"meta" => {
                reader.skip(4)?; // version + flags
                walk_atoms(reader, body_end, opts, tag)?;
            }
            b"stsd" => {
                reader.skip(8)?; // version + flags, entry count
                walk_atoms(reader, body_end, opts, tag)?;
            }
            b"ilst" if opts.tags => {
                walk_ilst(reader, body_end, tag)?;
            }
            b"mvhd" if opts.duration => {
                parse_mvhd(reader, tag)?;
            }
            b"mp4a" if opts.duration => {
                parse_mp4a(reader, body_end, tag)?;
            }
            b"alac" if opts.duration => {
                parse_alac(reader, tag)?;
            }
            _ => {}
        }

        reader.seek(SeekFrom::Start(body_end))?;
    }
    Ok(())
}

fn parse_mvhd(reader: &mut ByteReader, tag: &mut Tag) -> Result<()> {
    let version = reader.read_u8()?;
    reader.skip(3)?; // flags

    let (timescale, duration_units) = if version == 1 {
        reader.skip(16)?; // creation + modification time, 64-bit each
        let timescale = reader.read_u32be()?;
        let duration = reader.read_u64be()?;
        (timescale, duration as f64)
    } else {
        reader.skip(8)?; // creation + modification time, 32-bit each
        let timescale = reader.read_u32be()?;
        let duration = reader.read_u32be()?;
        (timescale, f64::from(duration))
    };

    if timescale > 0 {
        Tag::set_f64_if_unset(&mut tag.duration, duration_units / f64::from(timescale));
    }
    Ok(())
}

fn parse_mp4a(reader: &mut ByteReader, body_end: u64, tag: &mut Tag) -> Result<()> {
    reader.skip(16)?; // reserved, data reference index, version, revision, vendor
    let channels = reader.read_u16be()?;
    reader.skip(6)?; // sample size, predefined, reserved
    let samplerate = reader.read_u32be()? >> 16;

    tag.channels = Some(u32::from(channels));
    tag.samplerate = Some(samplerate);

    // Look for a child `esds` atom carrying the average bitrate.
    while reader.pos()? + 8 <= body_end {
        let start = reader.pos()?;
        let size = u64::from(reader.read_u32be()?);
        let name = reader.read_vec(4)?;
        let this_end = start + size;
        if &name[..] == b"esds" {
            parse_esds(reader, this_end, tag)?;
        }
        reader.seek(SeekFrom::Start(this_end.min(body_end)))?;
    }

    Ok(())
}

fn parse_esds(reader: &mut ByteReader, end: u64, tag: &mut Tag) -> Result<()> {
    reader.skip(4)?; // version + flags
    reader.skip(1)?; // ES descriptor tag
    skip_extended_descriptor_length(reader)?;
    reader.skip(4)?; // ES id (2) + flags (1) + decoder config descriptor tag (1)
    skip_extended_descriptor_length(reader)?;
    if reader.pos()? + 9 > end {
        return Ok(());
    }
    reader.skip(9)?; // object type, stream type+flags, buffer size
    let avg_bitrate = reader.read_u32be()?;
    if avg_bitrate > 0 {
        Tag::set_f64_if_unset(&mut tag.bitrate, f64::from(avg_bitrate) / 1000.0);
    }
    Ok(())
}

fn skip_extended_descriptor_length(reader: &mut ByteReader) -> Result<()> {
    for _ in 0..4 {
        let b = reader.read_u8()?;
        if b & 0x80 == 0 {
            break;
        }
    }
    Ok(())
}

fn parse_alac(reader: &mut ByteReader, tag: &mut Tag) -> Result<()> {
    reader.skip(9)?; // size, "alac" magic cookie version+flags inside sample entry wrapper
    let bitdepth = reader.read_i8()?;
    reader.skip(3)?;
    let channels = reader.read_i8()?;
    reader.skip(6)?;
    let avg_bitrate = reader.read_u32be()?;
    let samplerate = reader.read_u32be()?;

    tag.bitdepth = Some(bitdepth.max(0) as u32);
    tag.channels = Some(channels.max(0) as u32);
    tag.samplerate = Some(samplerate);
    if avg_bitrate > 0 {
        Tag::set_f64_if_unset(&mut tag.bitrate, f64::from(avg_bitrate) / 1000.0);
    }
    Ok(())
}

// ---------------------------------------------------------------------------------------------
// ilst metadata items
// ---------------------------------------------------------------------------------------------

fn walk_ilst(reader: &mut ByteReader, end: u64, tag: &mut Tag) -> Result<()> {
    while reader.pos()? + 8 <= end {
        let start = reader.pos()?;
        let size = u64::from(reader.read_u32be()?);
        let name = reader.read_vec(4)?;
        let item_end = (start + size).min(end);

        if &name[..] == b"----" {
            apply_custom_item(reader, item_end, tag)?;
        } else if let Some((type_code, payload)) = read_data_atom(reader, item_end)? {
            apply_known_item(tag, &name, type_code, &payload);
        }

        reader.seek(SeekFrom::Start(item_end))?;
    }
    Ok(())
}

fn read_data_atom(reader: &mut ByteReader, end: u64) -> Result<Option<(u32, Vec<u8>)>> {
    while reader.pos()? + 8 <= end {
        let start = reader.pos()?;
        let size = u64::from(reader.read_u32be()?);
        let name = reader.read_vec(4)?;
        let this_end = (start + size).min(end);

        if &name[..] == b"data" && this_end >= start + 16 {
            let type_code = reader.read_u32be()?;
            reader.skip(4)?; // locale
            let payload_len = (this_end - reader.pos()?) as usize;
            let payload = reader.read_vec(payload_len)?;
            return Ok(Some((type_code, payload)));
        }

        reader.seek(SeekFrom::Start(this_end))?;
    }
    Ok(None)
}

fn decode_item_text(type_code: u32, payload: &[u8]) -> String {
    match type_code {
        2 => decode_utf16be_lossy(payload),
        3 => decode_shift_jis(payload),
        _ => decode_utf8_lossy(payload),
    }
}

fn apply_known_item(tag: &mut Tag, name: &[u8], type_code: u32, payload: &[u8]) {
    match name {
        b"\xa9nam" => tag.set_field(crate::tag::Field::Title, &decode_item_text(type_code, payload)),
        b"\xa9ART" => tag.set_field(crate::tag::Field::Artist, &decode_item_text(type_code, payload)),
        b"aART" => tag.set_field(crate::tag::Field::AlbumArtist, &decode_item_text(type_code, payload)),
        b"\xa9alb" => tag.set_field(crate::tag::Field::Album, &decode_item_text(type_code, payload)),
        b"\xa9wrt" => tag.set_field(crate::tag::Field::Composer, &decode_item_text(type_code, payload)),
        b"\xa9day" => tag.set_field(crate::tag::Field::Year, &decode_item_text(type_code, payload)),
        b"\xa9cmt" => tag.set_field(crate::tag::Field::Comment, &decode_item_text(type_code, payload)),
        b"\xa9gen" => tag.set_field(crate::tag::Field::Genre, &decode_item_text(type_code, payload)),
        b"cprt" => {
            let text = decode_item_text(type_code, payload);
            if !text.is_empty() {
                tag.push_other("copyright", text);
            }
        }
        b"gnre" if payload.len() >= 2 => {
            let index = u16::from_be_bytes([payload[0], payload[1]]);
            // The `gnre` atom stores the ID3v1 index offset by one (0 is "no genre").
            if let Some(id) = index.checked_sub(1) {
                if let Some(name) = genres::lookup(id as u8) {
                    tag.set_field(crate::tag::Field::Genre, name);
                }
            }
        }
        b"trkn" if payload.len() >= 6 => {
            let track = u16::from_be_bytes([payload[2], payload[3]]);
            let total = u16::from_be_bytes([payload[4], payload[5]]);
            if track > 0 {
                Tag::set_int_if_unset(&mut tag.track, u32::from(track));
            }
            if total > 0 {
                Tag::set_int_if_unset(&mut tag.track_total, u32::from(total));
            }
        }
        b"disk" if payload.len() >= 6 => {
            let disc = u16::from_be_bytes([payload[2], payload[3]]);
            let total = u16::from_be_bytes([payload[4], payload[5]]);
            if disc > 0 {
                Tag::set_int_if_unset(&mut tag.disc, u32::from(disc));
            }
            if total > 0 {
                Tag::set_int_if_unset(&mut tag.disc_total, u32::from(total));
            }
        }
        b"covr" => {
            if !payload.is_empty() {
                let mime_type = match type_code {
                    14 => "image/png",
                    _ => "image/jpeg",
                }
                .to_string();
                tag.images.set(Image {
                    name: "front_cover".to_string(),
                    data: payload.to_vec(),
                    mime_type,
                    description: None,
                });
            }
        }
        _ => {}
    }
}

fn apply_custom_item(reader: &mut ByteReader, end: u64, tag: &mut Tag) -> Result<()> {
    let mut field_name = None;
    let mut value = None;

    while reader.pos()? + 8 <= end {
        let start = reader.pos()?;
        let size = u64::from(reader.read_u32be()?);
        let name = reader.read_vec(4)?;
        let this_end = (start + size).min(end);

        match &name[..] {
            b"name" if this_end >= start + 12 => {
                reader.skip(4)?; // version + flags
                let text_len = (this_end - reader.pos()?) as usize;
                let text = reader.read_vec(text_len)?;
                field_name = Some(decode_utf8_lossy(&text).to_ascii_lowercase());
            }
            b"data" if this_end >= start + 16 => {
                let _type_code = reader.read_u32be()?;
                reader.skip(4)?; // locale
                let payload_len = (this_end - reader.pos()?) as usize;
                let payload = reader.read_vec(payload_len)?;
                value = Some(decode_utf8_lossy(&payload));
            }
            _ => {}
        }

        reader.seek(SeekFrom::Start(this_end))?;
    }

    if let (Some(name), Some(value)) = (field_name, value) {
        if !value.is_empty() {
            tag.push_other(&name, value);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(name: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut bytes = (8 + body.len() as u32).to_be_bytes().to_vec();
        bytes.extend_from_slice(name);
        bytes.extend_from_slice(body);
        bytes
    }

    fn data_atom(type_code: u32, payload: &[u8]) -> Vec<u8> {
        let mut body = type_code.to_be_bytes().to_vec();
        body.extend_from_slice(&0u32.to_be_bytes());
        body.extend_from_slice(payload);
        atom(b"data", &body)
    }

    #[test]
    fn parses_title_from_ilst() {
        let nam_item = atom(b"\xa9nam", &data_atom(1, b"Song Name"));
        let ilst = atom(b"ilst", &nam_item);
        let meta_body = {
            let mut b = vec![0, 0, 0, 0];
            b.extend_from_slice(&ilst);
            b
        };
        let meta = atom(b"meta", &meta_body);
        let udta = atom(b"udta", &meta);
        let moov = atom(b"moov", &udta);

        let mut reader = ByteReader::from_bytes(moov);
        let mut tag = Tag::new(reader.len());
        let opts = GetOptions::default();
        parse(&mut reader, &opts, &mut tag).unwrap();

        assert_eq!(tag.title.as_deref(), Some("Song Name"));
    }

    #[test]
    fn parses_mvhd_duration() {
        let mut body = vec![0, 0, 0, 0]; // version + flags
        body.extend_from_slice(&0u32.to_be_bytes()); // creation
        body.extend_from_slice(&0u32.to_be_bytes()); // modification
        body.extend_from_slice(&1000u32.to_be_bytes()); // timescale
        body.extend_from_slice(&5000u32.to_be_bytes()); // duration

        let mvhd = atom(b"mvhd", &body);
        let moov = atom(b"moov", &mvhd);

        let mut reader = ByteReader::from_bytes(moov);
        let mut tag = Tag::new(reader.len());
        let opts = GetOptions::default();
        parse(&mut reader, &opts, &mut tag).unwrap();

        assert!((tag.duration.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn parses_track_number_tuple() {
        let payload = [0u8, 0, 0, 3, 0, 12];
        let trkn_item = atom(b"trkn", &data_atom(0, &payload));
        let ilst = atom(b"ilst", &trkn_item);
        let mut meta_body = vec![0, 0, 0, 0];
        meta_body.extend_from_slice(&ilst);
        let meta = atom(b"meta", &meta_body);
        let udta = atom(b"udta", &meta);
        let moov = atom(b"moov", &udta);

        let mut reader = ByteReader::from_bytes(moov);
        let mut tag = Tag::new(reader.len());
        let opts = GetOptions::default();
        parse(&mut reader, &opts, &mut tag).unwrap();

        assert_eq!(tag.track, Some(3));
        assert_eq!(tag.track_total, Some(12));
    }
}
