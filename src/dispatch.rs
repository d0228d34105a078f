// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Public entry points: figuring out which of the seven container parsers applies to a given
//! file, by extension first and by magic bytes as a fallback, then running it.

use std::fs::File;
use std::path::Path;

use crate::error::{Error, Result};
use crate::formats::{self, GetOptions};
use crate::io::{ByteReader, MediaSource};
use crate::tag::{FormatId, Tag};

/// Returns the [`FormatId`] a file extension maps to, case-insensitively, or `None` if the
/// extension isn't one of the recognized container types.
pub fn format_from_extension(extension: &str) -> Option<FormatId> {
    match extension.to_ascii_lowercase().as_str() {
        "mp1" | "mp2" | "mp3" => Some(FormatId::Id3),
        "ogg" | "oga" | "opus" | "spx" => Some(FormatId::Ogg),
        "flac" => Some(FormatId::Flac),
        "wav" => Some(FormatId::Wave),
        "wma" => Some(FormatId::Wma),
        "m4a" | "mp4" | "aax" | "aaxc" => Some(FormatId::Mp4),
        "aiff" | "aifc" | "aif" | "afc" => Some(FormatId::Aiff),
        _ => None,
    }
}

/// Returns the [`FormatId`] a file's magic bytes identify, or `None` if nothing matches.
pub fn format_from_magic(header: &[u8]) -> Option<FormatId> {
    if header.starts_with(b"ID3") || header.starts_with(b"\xff\xfb") || header.starts_with(b"\xff\xf3") {
        return Some(FormatId::Id3);
    }
    if header.starts_with(b"OggS") {
        return Some(FormatId::Ogg);
    }
    if header.starts_with(b"fLaC") {
        return Some(FormatId::Flac);
    }
    if header.len() >= 12 && &header[0..4] == b"RIFF" && &header[8..12] == b"WAVE" {
        return Some(FormatId::Wave);
    }
    if header.len() >= 12 && &header[0..4] == b"FORM" && (&header[8..12] == b"AIFF" || &header[8..12] == b"AIFC") {
        return Some(FormatId::Aiff);
    }
    if header.len() >= 16 && header[0..16] == crate::formats::asf::HEADER_OBJECT_GUID {
        return Some(FormatId::Wma);
    }
    if header.len() >= 12 && &header[4..8] == b"ftyp" {
        let brand = &header[8..12];
        if brand == b"M4A " || brand == b"aax " || brand == b"aaxc" {
            return Some(FormatId::Mp4);
        }
    }
    if header.starts_with(b"\xff\xf1") || header.starts_with(b"\xff\xf9") {
        return Some(FormatId::Mp4);
    }
    None
}

/// Parses the tag for a file at `path`, selecting the format by extension and falling back to
/// magic-byte sniffing when the extension is missing or unrecognized.
pub fn get(path: impl AsRef<Path>, opts: &GetOptions) -> Result<Tag> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let filesize = file.metadata()?.len();

    let extension_format = path.extension().and_then(|e| e.to_str()).and_then(format_from_extension);

    get_from_source(Box::new(file), filesize, extension_format, opts)
}

/// Parses the tag for an already-open source, such as an in-memory buffer or a reader over a
/// non-filesystem byte stream. `format` may be supplied directly when the caller already knows
/// it (e.g. from a file extension it tracks separately); otherwise magic-byte sniffing is used.
pub fn get_as(source: Box<dyn MediaSource>, filesize: u64, format: FormatId, opts: &GetOptions) -> Result<Tag> {
    get_from_source(source, filesize, Some(format), opts)
}

fn get_from_source(
    source: Box<dyn MediaSource>,
    filesize: u64,
    hinted_format: Option<FormatId>,
    opts: &GetOptions,
) -> Result<Tag> {
    let mut reader = ByteReader::new(source)?;
    let mut tag = Tag::new(filesize);

    if filesize == 0 {
        return Ok(tag);
    }

    let format = match hinted_format {
        Some(format) => format,
        None => {
            let header = reader.peek(16)?;
            let format = format_from_magic(&header);
            reader.seek(std::io::SeekFrom::Start(0))?;
            format.ok_or_else(|| {
                log::warn!("no extension or magic-byte match for a {filesize}-byte source");
                Error::Unsupported("no parser recognizes this file")
            })?
        }
    };

    log::debug!("parsing {filesize}-byte source as {format:?}");
    formats::parse(format, &mut reader, opts, &mut tag)?;
    Ok(tag)
}

/// Returns whether `extension` names one of the seven supported container formats.
pub fn is_supported(extension: &str) -> bool {
    format_from_extension(extension).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(format_from_extension("MP3"), Some(FormatId::Id3));
        assert_eq!(format_from_extension("Flac"), Some(FormatId::Flac));
        assert_eq!(format_from_extension("xyz"), None);
    }

    #[test]
    fn magic_bytes_identify_flac_and_ogg() {
        assert_eq!(format_from_magic(b"fLaC\x00\x00"), Some(FormatId::Flac));
        assert_eq!(format_from_magic(b"OggS\x00\x00"), Some(FormatId::Ogg));
        assert_eq!(format_from_magic(b"garbage!"), None);
    }

    #[test]
    fn magic_bytes_identify_raw_adts_stream() {
        assert_eq!(format_from_magic(b"\xff\xf1\x00\x00"), Some(FormatId::Mp4));
        assert_eq!(format_from_magic(b"\xff\xf9\x00\x00"), Some(FormatId::Mp4));
    }

    #[test]
    fn empty_file_returns_empty_tag() {
        let opts = GetOptions::default();
        let tag = get_from_source(Box::new(std::io::Cursor::new(Vec::new())), 0, Some(FormatId::Flac), &opts).unwrap();
        assert_eq!(tag.filesize, 0);
        assert_eq!(tag.title, None);
    }
}
