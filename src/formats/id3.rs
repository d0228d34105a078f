// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MPEG audio (MP1/MP2/MP3) wrapped in ID3v2/ID3v1 tags. Three independent passes over the
//! same byte source: an optional leading ID3v2 tag, the MPEG frame stream for duration and
//! bitrate, and an optional trailing 128-byte ID3v1 tag.

use std::io::SeekFrom;

use crate::error::{parse_error, Result};
use crate::formats::GetOptions;
use crate::genres;
use crate::io::ByteReader;
use crate::tag::{Field, Image, Tag};
use crate::text::{self, Encoding};

const CBR_DETECTION_FRAME_COUNT: usize = 5;

pub fn parse(reader: &mut ByteReader, opts: &GetOptions, tag: &mut Tag) -> Result<()> {
    if reader.peek(3)? == b"ID3" {
        parse_id3v2(reader, opts, tag)?;
    }

    let audio_start = reader.pos()?;

    if opts.duration {
        determine_duration(reader, opts, tag, audio_start)?;
    }

    if opts.tags {
        parse_id3v1_trailer(reader, tag)?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------------------------
// ID3v2
// ---------------------------------------------------------------------------------------------

/// Parses a single ID3v2 tag starting at the reader's current position. Exposed so FLAC and
/// WAVE/AIFF, which may carry a leading or embedded ID3v2 tag of their own, can reuse it.
pub fn parse_id3v2(reader: &mut ByteReader, opts: &GetOptions, tag: &mut Tag) -> Result<()> {
    if reader.read_vec(3)? != b"ID3" {
        return parse_error("missing ID3 magic");
    }

    let major = reader.read_u8()?;
    let _minor = reader.read_u8()?;
    let flags = reader.read_u8()?;
    let size = read_syncsafe_u32(reader)?;

    let has_extended_header = flags & 0x40 != 0;

    // The unsynchronization flag (bit 7) is read but not acted on: real-world taggers
    // disagree on whether 0xff 0x00 pairs need unescaping, and the source this crate
    // tracks never strips them either.
    let body = reader.read_vec(size as usize)?;
    let mut body_reader = ByteReader::from_bytes(body);

    if has_extended_header {
        let ext_size = if major >= 4 {
            read_syncsafe_u32(&mut body_reader)?
        } else {
            body_reader.read_u32be()?
        };
        body_reader.skip(u64::from(ext_size.saturating_sub(4)))?;
    }

    if !opts.tags {
        return Ok(());
    }

    while body_reader.pos()? + 4 < body_reader.len() {
        let id_len = if major == 2 { 3 } else { 4 };
        let id = body_reader.peek(id_len)?;
        if id.iter().all(|&b| b == 0) {
            break; // padding
        }

        let size = if major == 2 {
            parse_frame_v2(&mut body_reader, opts, tag)?
        } else {
            parse_frame_v34(&mut body_reader, major, opts, tag)?
        };

        // A declared frame size of 0 ends the tag, matching the original reader: its frame
        // parser returns 0 for such a frame and the caller's size-accumulating loop stops.
        if size == 0 {
            break;
        }
    }

    Ok(())
}

fn read_syncsafe_u32(reader: &mut ByteReader) -> Result<u32> {
    let b = reader.read_vec(4)?;
    Ok((u32::from(b[0]) << 21) | (u32::from(b[1]) << 14) | (u32::from(b[2]) << 7) | u32::from(b[3]))
}

fn parse_frame_v2(reader: &mut ByteReader, opts: &GetOptions, tag: &mut Tag) -> Result<usize> {
    let id = reader.read_vec(3)?;
    let size = reader.read_u24be()? as usize;
    let body = reader.read_vec(size)?;
    apply_frame(tag, opts, &String::from_utf8_lossy(&id), &body);
    Ok(size)
}

fn parse_frame_v34(reader: &mut ByteReader, major: u8, opts: &GetOptions, tag: &mut Tag) -> Result<usize> {
    let id = reader.read_vec(4)?;
    let size = if major >= 4 { read_syncsafe_u32(reader)? } else { reader.read_u32be()? } as usize;
    let _flags = reader.read_u16be()?;
    let body = reader.read_vec(size)?;
    apply_frame(tag, opts, &String::from_utf8_lossy(&id), &body);
    Ok(size)
}

fn apply_frame(tag: &mut Tag, opts: &GetOptions, id: &str, body: &[u8]) {
    match id {
        "TIT2" | "TT2" => set_text_field(tag, opts, Field::Title, body),
        "TPE1" | "TP1" => set_text_field(tag, opts, Field::Artist, body),
        "TPE2" | "TP2" => set_text_field(tag, opts, Field::AlbumArtist, body),
        "TCOM" | "TCM" => set_text_field(tag, opts, Field::Composer, body),
        "TALB" | "TAL" => set_text_field(tag, opts, Field::Album, body),
        "TYER" | "TYE" | "TDRC" => set_text_field(tag, opts, Field::Year, body),
        "TRCK" | "TRK" => set_number_with_total(&decode_text_frame(opts, body), &mut tag.track, &mut tag.track_total),
        "TPOS" | "TPA" => set_number_with_total(&decode_text_frame(opts, body), &mut tag.disc, &mut tag.disc_total),
        "TCON" | "TCO" => set_genre(tag, opts, body),
        "COMM" | "COM" => set_comm_frame(tag, opts, body),
        "USLT" | "ULT" => set_lyrics_frame(tag, opts, body),
        "APIC" => {
            if opts.image {
                set_apic_frame(tag, body);
            }
        }
        "PIC" => {
            if opts.image {
                set_pic_frame(tag, body);
            }
        }
        "TXXX" | "TXX" => set_txxx_frame(tag, opts, body),
        "PRIV" | "RGAD" | "GEOB" => {}
        _ => {
            let text = decode_text_frame(opts, body);
            if !text.is_empty() {
                tag.push_other(&id.to_ascii_lowercase(), text);
            } else {
                log::trace!("unhandled id3 frame {id}, {} bytes", body.len());
            }
        }
    }
}

fn decode_text_frame(opts: &GetOptions, body: &[u8]) -> String {
    let Some(&enc_byte) = body.first() else { return String::new() };
    let encoding = opts.encoding.or_else(|| Encoding::from_id3v2_byte(enc_byte)).unwrap_or(Encoding::Latin1);
    let rest = &body[1..];
    let trimmed = text::trim_terminator(rest, encoding);
    text::strip_trailing_nuls(&text::decode(trimmed, encoding)).to_string()
}

fn set_text_field(tag: &mut Tag, opts: &GetOptions, field: Field, body: &[u8]) {
    let text = decode_text_frame(opts, body);
    if !text.is_empty() {
        tag.set_field(field, &text);
    }
}

fn set_number_with_total(value: &str, number: &mut Option<u32>, total: &mut Option<u32>) {
    let (num, maybe_total) = match value.split_once('/') {
        Some((n, t)) => (n, Some(t)),
        None => (value, None),
    };
    if let Ok(n) = num.trim().parse() {
        Tag::set_int_if_unset(number, n);
    }
    if let Some(t) = maybe_total {
        if let Ok(n) = t.trim().parse() {
            Tag::set_int_if_unset(total, n);
        }
    }
}

/// `TCON` may hold a plain genre name, a bare ID3v1 index, or an index wrapped in parens (older
/// convention), optionally followed by a refinement string.
fn set_genre(tag: &mut Tag, opts: &GetOptions, body: &[u8]) {
    let text = decode_text_frame(opts, body);
    if text.is_empty() {
        return;
    }

    // Only the whole string wrapped in parens with a digits-only interior counts as numeric
    // (e.g. "(17)"); a leading "(17)Rock"-style refinement keeps the literal text instead.
    let parenthesized = text
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .filter(|inner| !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()));

    let resolved = match parenthesized.or(Some(text.as_str())).and_then(|c| c.parse::<u8>().ok()) {
        Some(id) => genres::lookup(id).map(str::to_string).unwrap_or_else(|| text.clone()),
        None => text.clone(),
    };

    tag.set_field(Field::Genre, &resolved);
}

fn set_comm_frame(tag: &mut Tag, opts: &GetOptions, body: &[u8]) {
    let Some(&enc_byte) = body.first() else { return };
    let encoding = opts.encoding.or_else(|| Encoding::from_id3v2_byte(enc_byte)).unwrap_or(Encoding::Latin1);
    if body.len() < 4 {
        return;
    }
    let rest = text::strip_id3_language_prefix(&body[1..]);

    let Some((desc_raw, text_raw)) = split_terminated(rest, encoding) else { return };

    let description = text::strip_trailing_nuls(&text::decode(desc_raw, encoding)).to_string();
    let decoded = text::decode(text::trim_terminator(text_raw, encoding), encoding);
    let value = text::strip_trailing_nuls(&decoded);

    if value.is_empty() {
        return;
    }

    if description.is_empty() || description.eq_ignore_ascii_case("comment") {
        tag.set_field(Field::Comment, value);
    } else {
        tag.push_other(&description.to_ascii_lowercase(), value);
    }
}

fn set_lyrics_frame(tag: &mut Tag, opts: &GetOptions, body: &[u8]) {
    let Some(&enc_byte) = body.first() else { return };
    let encoding = opts.encoding.or_else(|| Encoding::from_id3v2_byte(enc_byte)).unwrap_or(Encoding::Latin1);
    if body.len() < 4 {
        return;
    }
    let rest = text::strip_id3_language_prefix(&body[1..]);

    let Some((_desc, text_raw)) = split_terminated(rest, encoding) else { return };
    let decoded = text::decode(text::trim_terminator(text_raw, encoding), encoding);
    let value = text::strip_trailing_nuls(&decoded);
    if !value.is_empty() {
        tag.push_other("lyrics", value);
    }
}

fn set_txxx_frame(tag: &mut Tag, opts: &GetOptions, body: &[u8]) {
    let Some(&enc_byte) = body.first() else { return };
    let encoding = opts.encoding.or_else(|| Encoding::from_id3v2_byte(enc_byte)).unwrap_or(Encoding::Latin1);
    if body.is_empty() {
        return;
    }
    let Some((desc_raw, value_raw)) = split_terminated(&body[1..], encoding) else { return };

    let description = text::strip_trailing_nuls(&text::decode(desc_raw, encoding)).to_string();
    let decoded = text::decode(text::trim_terminator(value_raw, encoding), encoding);
    let value = text::strip_trailing_nuls(&decoded);

    if value.is_empty() {
        return;
    }

    let key = if description.is_empty() { "txxx".to_string() } else { description.to_ascii_lowercase() };
    tag.push_other(&key, value);
}

/// Splits `buf` at the first encoding-aware terminator, returning `(before, after)` with the
/// terminator itself excluded from `before` but kept in `after` for the caller's own trim.
fn split_terminated(buf: &[u8], encoding: Encoding) -> Option<(&[u8], &[u8])> {
    match encoding {
        Encoding::Latin1 | Encoding::Utf8 | Encoding::ShiftJis => {
            let pos = buf.iter().position(|&b| b == 0)?;
            Some((&buf[..pos], &buf[pos..]))
        }
        Encoding::Utf16Bom | Encoding::Utf16Be | Encoding::Utf16Le => {
            let mut pos = 0;
            while pos + 1 < buf.len() {
                if buf[pos] == 0 && buf[pos + 1] == 0 {
                    return Some((&buf[..pos], &buf[pos..]));
                }
                pos += 2;
            }
            None
        }
    }
}

/// Maps an APIC/PIC picture-type byte to the named slot it fills, per the ID3v2 picture-type
/// table. Also reused by the FLAC `PICTURE` block, which shares the same type values.
pub fn picture_type_slot(picture_type: u32) -> &'static str {
    match picture_type {
        3 => "front_cover",
        4 => "back_cover",
        6 => "media",
        _ => "other",
    }
}

fn set_apic_frame(tag: &mut Tag, body: &[u8]) {
    let Some(&enc_byte) = body.first() else { return };
    let encoding = Encoding::from_id3v2_byte(enc_byte).unwrap_or(Encoding::Latin1);
    let Some(rest) = body.get(1..) else { return };

    let Some(mime_end) = rest.iter().position(|&b| b == 0) else { return };
    let mime_type = text::decode_latin1(&rest[..mime_end]);
    let Some(rest) = rest.get(mime_end + 1..) else { return };

    let Some(&picture_type) = rest.first() else { return };
    let Some(rest) = rest.get(1..) else { return };

    let Some((desc_raw, tail)) = split_terminated(rest, encoding) else { return };
    let description = text::strip_trailing_nuls(&text::decode(desc_raw, encoding)).to_string();
    let data_start = tail.len().min(terminator_len(encoding));
    let data = tail.get(data_start..).unwrap_or(&[]).to_vec();

    let name = picture_type_slot(u32::from(picture_type)).to_string();
    let description = if description.is_empty() { None } else { Some(description) };
    tag.images.set(Image { name, data, mime_type, description });
}

fn set_pic_frame(tag: &mut Tag, body: &[u8]) {
    let Some(&enc_byte) = body.first() else { return };
    let encoding = Encoding::from_id3v2_byte(enc_byte).unwrap_or(Encoding::Latin1);
    if body.len() < 5 {
        return;
    }
    let image_format = text::decode_latin1(&body[1..4]);
    let mime_type = match image_format.to_ascii_uppercase().as_str() {
        "PNG" => "image/png".to_string(),
        "JPG" | "JPEG" => "image/jpeg".to_string(),
        other => format!("image/{}", other.to_ascii_lowercase()),
    };

    let picture_type = body[4];
    let rest = &body[5..];
    let Some((desc_raw, tail)) = split_terminated(rest, encoding) else { return };
    let description = text::strip_trailing_nuls(&text::decode(desc_raw, encoding)).to_string();
    let data_start = tail.len().min(terminator_len(encoding));
    let data = tail.get(data_start..).unwrap_or(&[]).to_vec();

    let name = picture_type_slot(u32::from(picture_type)).to_string();
    let description = if description.is_empty() { None } else { Some(description) };
    tag.images.set(Image { name, data, mime_type, description });
}

fn terminator_len(encoding: Encoding) -> usize {
    match encoding {
        Encoding::Latin1 | Encoding::Utf8 | Encoding::ShiftJis => 1,
        Encoding::Utf16Bom | Encoding::Utf16Be | Encoding::Utf16Le => 2,
    }
}

// ---------------------------------------------------------------------------------------------
// ID3v1
// ---------------------------------------------------------------------------------------------

fn parse_id3v1_trailer(reader: &mut ByteReader, tag: &mut Tag) -> Result<()> {
    if reader.len() < 128 {
        return Ok(());
    }

    reader.seek(SeekFrom::Start(reader.len() - 128))?;
    let block = reader.read_vec(128)?;

    if &block[0..3] != b"TAG" {
        return Ok(());
    }

    let title = latin1_field(&block[3..33]);
    let artist = latin1_field(&block[33..63]);
    let album = latin1_field(&block[63..93]);
    let year = latin1_field(&block[93..97]);
    let comment_raw = &block[97..127];
    let genre_id = block[127];

    if !title.is_empty() {
        tag.set_field(Field::Title, &title);
    }
    if !artist.is_empty() {
        tag.set_field(Field::Artist, &artist);
    }
    if !album.is_empty() {
        tag.set_field(Field::Album, &album);
    }
    if !year.is_empty() {
        tag.set_field(Field::Year, &year);
    }
    if let Some(name) = genres::lookup(genre_id) {
        tag.set_field(Field::Genre, name);
    }

    // ID3v1.1: a zero byte followed by a non-zero byte in the last two comment bytes stores a
    // track number instead of comment text.
    if comment_raw[28] == 0 && comment_raw[29] != 0 {
        Tag::set_int_if_unset(&mut tag.track, u32::from(comment_raw[29]));
        let comment = latin1_field(&comment_raw[..28]);
        if !comment.is_empty() {
            tag.set_field(Field::Comment, &comment);
        }
    } else {
        let comment = latin1_field(comment_raw);
        if !comment.is_empty() {
            tag.set_field(Field::Comment, &comment);
        }
    }

    Ok(())
}

fn latin1_field(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    text::decode_latin1(&buf[..end]).trim().to_string()
}

// ---------------------------------------------------------------------------------------------
// MPEG frame stream: duration and bitrate
// ---------------------------------------------------------------------------------------------

const SAMPLERATES: [[u32; 3]; 4] = [
    [11025, 12000, 8000], // MPEG2.5
    [0, 0, 0],            // reserved
    [22050, 24000, 16000], // MPEG2
    [44100, 48000, 32000], // MPEG1
];

const BITRATES_V1_L1: [u32; 16] = [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0];
const BITRATES_V1_L2: [u32; 16] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0];
const BITRATES_V1_L3: [u32; 16] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0];
const BITRATES_V2_L1: [u32; 16] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0];
const BITRATES_V2_L23: [u32; 16] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0];

struct FrameHeader {
    samplerate: u32,
    channels: u32,
    bitrate_kbps: u32,
    frame_len: u64,
    samples_per_frame: u32,
}

fn parse_frame_header(word: u32) -> Option<FrameHeader> {
    if word & 0xffe0_0000 != 0xffe0_0000 {
        return None;
    }

    let version_id = (word >> 19) & 0x3;
    let layer_id = (word >> 17) & 0x3;
    let bitrate_id = ((word >> 12) & 0xf) as usize;
    let samplerate_id = ((word >> 10) & 0x3) as usize;
    let padding = (word >> 9) & 0x1;
    let channel_mode = (word >> 6) & 0x3;

    if version_id == 1 || layer_id == 0 || samplerate_id == 3 {
        return None;
    }

    let samplerate = SAMPLERATES[version_id as usize][samplerate_id];
    if samplerate == 0 {
        return None;
    }

    let bitrate_kbps = match (version_id, layer_id) {
        (3, 3) => BITRATES_V1_L1[bitrate_id],
        (3, 2) => BITRATES_V1_L2[bitrate_id],
        (3, 1) => BITRATES_V1_L3[bitrate_id],
        (_, 3) => BITRATES_V2_L1[bitrate_id],
        (_, _) => BITRATES_V2_L23[bitrate_id],
    };
    if bitrate_kbps == 0 {
        return None;
    }

    let channels = if channel_mode == 3 { 1 } else { 2 };

    let is_layer1 = layer_id == 3;
    let frame_len = if is_layer1 {
        (12 * bitrate_kbps * 1000 / samplerate + padding) * 4
    } else {
        144 * bitrate_kbps * 1000 / samplerate + padding
    };

    let samples_per_frame = if version_id != 3 && layer_id == 1 { 576 } else { 1152 };

    Some(FrameHeader { samplerate, channels, bitrate_kbps, frame_len: u64::from(frame_len), samples_per_frame })
}

fn find_next_frame(reader: &mut ByteReader) -> Result<Option<(u64, FrameHeader)>> {
    loop {
        let pos = reader.pos()?;
        if pos + 4 > reader.len() {
            return Ok(None);
        }
        let bytes = reader.read_vec(4)?;
        let word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if let Some(header) = parse_frame_header(word) {
            reader.seek(SeekFrom::Start(pos))?;
            return Ok(Some((pos, header)));
        }
        reader.seek(SeekFrom::Start(pos + 1))?;
    }
}

fn determine_duration(reader: &mut ByteReader, opts: &GetOptions, tag: &mut Tag, audio_start: u64) -> Result<()> {
    let Some((frame_pos, first)) = find_next_frame(reader)? else { return Ok(()) };

    tag.samplerate = Some(first.samplerate);
    tag.channels = Some(first.channels);

    if let Some(duration) = try_xing_header(reader, frame_pos, &first)? {
        tag.duration = Some(duration);
        if duration > 0.0 {
            let audio_bytes = reader.len().saturating_sub(frame_pos);
            tag.bitrate = Some(audio_bytes as f64 * 8.0 / duration / 1000.0);
        }
        return Ok(());
    }

    reader.seek(SeekFrom::Start(frame_pos))?;
    walk_frames(reader, opts, tag, frame_pos, audio_start)
}

/// Looks for a `Xing`/`Info` VBR header in the side-info slot of the first frame, which encodes
/// the exact frame and byte counts and avoids walking the whole stream.
fn try_xing_header(reader: &mut ByteReader, frame_pos: u64, header: &FrameHeader) -> Result<Option<f64>> {
    let side_info_len: u64 = match (header.channels, header.samplerate) {
        (1, _) => 9,
        _ => 17,
    };

    reader.seek(SeekFrom::Start(frame_pos + 4 + side_info_len))?;
    let marker = reader.peek(4)?;
    if marker != b"Xing" && marker != b"Info" {
        return Ok(None);
    }
    reader.skip(4)?;

    let flags = reader.read_u32be()?;
    let mut num_frames = None;
    let mut num_bytes = None;

    if flags & 0x1 != 0 {
        num_frames = Some(reader.read_u32be()?);
    }
    if flags & 0x2 != 0 {
        num_bytes = Some(reader.read_u32be()?);
    }

    let Some(frames) = num_frames else { return Ok(None) };
    let _ = num_bytes;

    if header.samplerate == 0 {
        return Ok(None);
    }

    Ok(Some(f64::from(frames) * f64::from(header.samples_per_frame) / f64::from(header.samplerate)))
}

/// Walks frames from `frame_pos`, detecting constant bitrate in the first handful of frames and
/// otherwise extrapolating from a bounded sample of the stream (`opts.mp3_estimation_seconds`
/// worth of audio) rather than scanning a potentially huge file to the end.
fn walk_frames(reader: &mut ByteReader, opts: &GetOptions, tag: &mut Tag, frame_pos: u64, audio_start: u64) -> Result<()> {
    let mut bitrates = Vec::new();
    let mut samples_covered: u64 = 0;
    let mut bytes_scanned: u64 = 0;
    let mut samplerate = 0u32;
    let mut pos = frame_pos;
    let mut reached_eof = true;

    loop {
        if pos + 4 > reader.len() {
            break;
        }
        reader.seek(SeekFrom::Start(pos))?;
        let bytes = reader.read_vec(4)?;
        let word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let Some(header) = parse_frame_header(word) else { break };

        samplerate = header.samplerate;
        bitrates.push(header.bitrate_kbps);
        samples_covered += u64::from(header.samples_per_frame);
        bytes_scanned += header.frame_len;
        pos += header.frame_len;

        if bitrates.len() >= CBR_DETECTION_FRAME_COUNT
            && bitrates[..CBR_DETECTION_FRAME_COUNT].iter().all(|&b| b == bitrates[0])
        {
            // Confirmed CBR: no need to keep walking.
            let audio_bytes = reader.len().saturating_sub(frame_pos);
            let duration = audio_bytes as f64 * 8.0 / (f64::from(bitrates[0]) * 1000.0);
            tag.duration = Some(duration);
            tag.bitrate = Some(f64::from(bitrates[0]));
            return Ok(());
        }

        if samplerate > 0 && samples_covered / u64::from(samplerate) >= u64::from(opts.mp3_estimation_seconds) {
            reached_eof = false;
            break;
        }
    }

    if samplerate == 0 || samples_covered == 0 {
        return Ok(());
    }

    let sampled_duration = samples_covered as f64 / f64::from(samplerate);

    let duration = if reached_eof {
        sampled_duration
    } else {
        let total_audio_bytes = reader.len().saturating_sub(audio_start) as f64;
        let scanned_bytes = bytes_scanned as f64;
        if scanned_bytes > 0.0 {
            sampled_duration * (total_audio_bytes / scanned_bytes)
        } else {
            sampled_duration
        }
    };

    tag.duration = Some(duration);
    if duration > 0.0 {
        let audio_bytes = reader.len().saturating_sub(frame_pos);
        tag.bitrate = Some(audio_bytes as f64 * 8.0 / duration / 1000.0);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mpeg1_layer3_header(bitrate_id: u32, samplerate_id: u32, channel_mode: u32, padding: u32) -> u32 {
        0xffe0_0000
            | (3 << 19) // MPEG1
            | (1 << 17) // Layer III
            | (1 << 16) // no protection (bit set = no CRC)
            | (bitrate_id << 12)
            | (samplerate_id << 10)
            | (padding << 9)
            | (channel_mode << 6)
    }

    #[test]
    fn parses_valid_mpeg1_layer3_header() {
        let word = mpeg1_layer3_header(9, 0, 3, 0); // bitrate idx 9 = 128kbps, 44100, mono
        let header = parse_frame_header(word).unwrap();
        assert_eq!(header.samplerate, 44100);
        assert_eq!(header.channels, 1);
        assert_eq!(header.bitrate_kbps, 128);
        assert_eq!(header.samples_per_frame, 1152);
    }

    #[test]
    fn rejects_non_sync_word() {
        assert!(parse_frame_header(0x0000_0000).is_none());
    }

    #[test]
    fn id3v1_genre_lookup_roundtrips() {
        assert_eq!(genres::lookup(0), Some("Blues"));
    }

    #[test]
    fn cbr_stream_detected_from_identical_frame_bitrates() {
        let word = mpeg1_layer3_header(9, 0, 3, 0);
        let header = parse_frame_header(word).unwrap();
        let mut bytes = Vec::new();
        for _ in 0..CBR_DETECTION_FRAME_COUNT + 1 {
            bytes.extend_from_slice(&word.to_be_bytes());
            bytes.resize(bytes.len() + (header.frame_len as usize - 4), 0);
        }

        let mut reader = ByteReader::from_bytes(bytes);
        let mut tag = Tag::new(reader.len());
        let opts = GetOptions::default();
        determine_duration(&mut reader, &opts, &mut tag, 0).unwrap();

        assert_eq!(tag.bitrate, Some(128.0));
        assert!(tag.duration.unwrap() > 0.0);
    }
}
