// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The Vorbis comment format: a vendor string followed by a list of `key=value` pairs. Shared
//! verbatim by Ogg Vorbis/Opus/Speex and native FLAC, since all four embed the same block.

use crate::base64;
use crate::error::Result;
use crate::formats::flac;
use crate::formats::GetOptions;
use crate::io::ByteReader;
use crate::tag::{Field, Tag};
use crate::text::decode_utf8_lossy;

/// Parses a Vorbis comment block from `reader` and writes it into `tag`.
///
/// When `contains_vendor` is true (the common case) a 4-byte length-prefixed vendor string
/// precedes the comment list; Speex's second header omits it.
pub fn parse(reader: &mut ByteReader, opts: &GetOptions, tag: &mut Tag, contains_vendor: bool) -> Result<()> {
    if contains_vendor {
        let vendor_len = reader.read_u32le()? as u64;
        reader.skip(vendor_len)?;
    }

    let count = reader.read_u32le()?;

    for _ in 0..count {
        let len = reader.read_u32le()? as usize;
        let raw = reader.read_vec(len)?;

        let Ok(text) = String::from_utf8(raw) else { continue };

        let Some((key, value)) = text.split_once('=') else { continue };
        let key_lower = key.to_ascii_lowercase();

        if key_lower == "metadata_block_picture" {
            if opts.image {
                if let Some(bytes) = base64::decode(value) {
                    let mut picture_reader = ByteReader::from_bytes(bytes);
                    let _ = flac::parse_picture(&mut picture_reader, tag);
                }
            }
            continue;
        }

        apply_comment(tag, &key_lower, value);
    }

    Ok(())
}

fn apply_comment(tag: &mut Tag, key: &str, value: &str) {
    match key {
        "album" => tag.set_field(Field::Album, value),
        "albumartist" => tag.set_field(Field::AlbumArtist, value),
        "title" => tag.set_field(Field::Title, value),
        "artist" | "author" => tag.set_field(Field::Artist, value),
        "date" => tag.set_field(Field::Year, value),
        "genre" => tag.set_field(Field::Genre, value),
        "description" | "comment" | "comments" => tag.set_field(Field::Comment, value),
        "composer" => tag.set_field(Field::Composer, value),
        "tracknumber" => set_number_with_total(value, &mut tag.track, &mut tag.track_total),
        "tracktotal" | "totaltracks" => set_total(value, &mut tag.track_total),
        "discnumber" => set_number_with_total(value, &mut tag.disc, &mut tag.disc_total),
        "disctotal" | "totaldiscs" => set_total(value, &mut tag.disc_total),
        "bpm" => tag.push_other("bpm", value),
        "copyright" => tag.push_other("copyright", value),
        "originalyear" => tag.push_other("original_year", value),
        "isrc" => tag.push_other("isrc", value),
        "lyrics" => tag.push_other("lyrics", value),
        "publisher" => tag.push_other("publisher", value),
        "language" => tag.push_other("language", value),
        "director" => tag.push_other("director", value),
        "website" => tag.push_other("url", value),
        other => tag.push_other(other, value),
    }
}

fn set_number_with_total(value: &str, number: &mut Option<u32>, total: &mut Option<u32>) {
    let (value, maybe_total) = match value.split_once('/') {
        Some((num, tot)) => (num, Some(tot)),
        None => (value, None),
    };

    if let Ok(n) = value.parse() {
        Tag::set_int_if_unset(number, n);
    }
    if let Some(tot) = maybe_total {
        set_total(tot, total);
    }
}

fn set_total(value: &str, total: &mut Option<u32>) {
    if let Ok(n) = value.parse() {
        Tag::set_int_if_unset(total, n);
    }
}

/// Decodes a raw byte buffer as UTF-8 for the Speex leading comment string, which is read
/// outside the `key=value` loop.
pub fn decode_leading_comment(bytes: &[u8]) -> String {
    decode_utf8_lossy(bytes)
}
