// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ogg container: a page/segment framing layer shared by Vorbis, Opus, FLAC-in-Ogg, and Speex.
//! Codec identification happens by sniffing the first packet of the first page; duration comes
//! from the granule position on the last page, not from counting samples.

use std::io::SeekFrom;

use crate::error::Result;
use crate::formats::{vorbis_comment, GetOptions};
use crate::io::ByteReader;
use crate::tag::Tag;

const OPUS_GRANULE_RATE: u32 = 48_000;

/// How far back from EOF to look for the last page header when recovering the final granule
/// position. Large enough to comfortably clear one audio page's worth of lacing segments.
const TRAILING_SCAN_WINDOW: u64 = 65_536;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Codec {
    Vorbis,
    Opus,
    FlacInOgg,
    Speex,
}

struct Page {
    granule_position: u64,
    packets: Vec<Vec<u8>>,
}

pub fn parse(reader: &mut ByteReader, opts: &GetOptions, tag: &mut Tag) -> Result<()> {
    let mut codec = None;
    let mut saw_flac_metadata_header = false;
    let mut speex_header_count = 0u32;
    let mut saw_comment_header = false;
    let mut pending = Vec::new();

    loop {
        let Some(page) = read_page(reader, &mut pending)? else { break };

        for packet in &page.packets {
            if codec.is_none() {
                codec = identify_codec(packet);
                if let Some(c) = codec {
                    if opts.tags || opts.duration {
                        parse_identification_packet(c, packet, tag)?;
                    }
                    continue;
                }
            }

            match codec {
                Some(Codec::Vorbis) if packet.starts_with(b"\x03vorbis") => {
                    saw_comment_header = true;
                    if opts.tags {
                        let mut body = ByteReader::from_bytes(packet[7..].to_vec());
                        vorbis_comment::parse(&mut body, opts, tag, true)?;
                    }
                }
                Some(Codec::Opus) if packet.starts_with(b"OpusTags") => {
                    saw_comment_header = true;
                    if opts.tags {
                        let mut body = ByteReader::from_bytes(packet[8..].to_vec());
                        vorbis_comment::parse(&mut body, opts, tag, true)?;
                    }
                }
                Some(Codec::FlacInOgg) if !saw_flac_metadata_header => {
                    saw_flac_metadata_header = true;
                    if opts.tags && packet.len() > 4 && packet[0] & 0x7f == 4 {
                        let size = u32::from_be_bytes([0, packet[1], packet[2], packet[3]]) as usize;
                        let body = packet.get(4..4 + size).unwrap_or(&[]);
                        let mut body_reader = ByteReader::from_bytes(body.to_vec());
                        vorbis_comment::parse(&mut body_reader, opts, tag, true)?;
                    }
                }
                Some(Codec::Speex) if speex_header_count == 0 => {
                    speex_header_count += 1;
                    if opts.tags && packet.len() >= 4 {
                        let mut body_reader = ByteReader::from_bytes(packet.clone());
                        vorbis_comment::parse(&mut body_reader, opts, tag, true)?;
                    }
                }
                _ => {}
            }
        }

        let headers_done = match codec {
            None => false,
            Some(Codec::Vorbis) | Some(Codec::Opus) => !opts.tags || saw_comment_header,
            Some(Codec::FlacInOgg) => !opts.tags || saw_flac_metadata_header,
            Some(Codec::Speex) => !opts.tags || speex_header_count > 0,
        };

        if headers_done {
            break;
        }
    }

    if opts.duration {
        if let (Some(samplerate), Some(granule)) = (tag.samplerate, scan_trailing_granule(reader)?) {
            let granule_rate = if codec == Some(Codec::Opus) { OPUS_GRANULE_RATE } else { samplerate };
            if granule_rate > 0 {
                tag.duration = Some(granule as f64 / f64::from(granule_rate));
            }
        }
    }

    Ok(())
}

/// Seeks near EOF and scans forward for the last page header in that window, returning its
/// granule position. Avoids decoding every audio page in the file just to learn its duration.
fn scan_trailing_granule(reader: &mut ByteReader) -> Result<Option<u64>> {
    let len = reader.len();
    let window = TRAILING_SCAN_WINDOW.min(len);
    let start = len - window;

    reader.seek(SeekFrom::Start(start))?;
    let buf = reader.read_vec(window as usize)?;

    let mut last_granule = None;
    let mut i = 0;
    while i + 27 <= buf.len() {
        if &buf[i..i + 4] != b"OggS" {
            i += 1;
            continue;
        }

        let granule = u64::from_le_bytes(buf[i + 6..i + 14].try_into().unwrap());
        let segment_count = buf[i + 26] as usize;
        let header_len = 27 + segment_count;
        if i + header_len > buf.len() {
            break;
        }
        let page_len: usize = buf[i + 27..i + header_len].iter().map(|&b| b as usize).sum();

        last_granule = Some(granule);
        i += header_len + page_len;
    }

    Ok(last_granule)
}

fn identify_codec(packet: &[u8]) -> Option<Codec> {
    if packet.starts_with(b"\x01vorbis") {
        Some(Codec::Vorbis)
    } else if packet.starts_with(b"OpusHead") {
        Some(Codec::Opus)
    } else if packet.starts_with(b"\x7fFLAC") {
        Some(Codec::FlacInOgg)
    } else if packet.starts_with(b"Speex   ") {
        Some(Codec::Speex)
    } else {
        None
    }
}

fn parse_identification_packet(codec: Codec, packet: &[u8], tag: &mut Tag) -> Result<()> {
    match codec {
        Codec::Vorbis => {
            if packet.len() < 7 + 23 {
                return Ok(());
            }
            let body = &packet[7..];
            tag.channels = Some(u32::from(body[0]));
            tag.samplerate = Some(u32::from_le_bytes([body[1], body[2], body[3], body[4]]));
        }
        Codec::Opus => {
            if packet.len() < 19 {
                return Ok(());
            }
            tag.channels = Some(u32::from(packet[9]));
            tag.samplerate = Some(OPUS_GRANULE_RATE);
        }
        Codec::FlacInOgg => {
            // Packet layout: 1 marker byte, "FLAC", major, minor, n_header_packets[2BE],
            // "fLaC", then the STREAMINFO metadata block header + body.
            if packet.len() < 13 + 4 {
                return Ok(());
            }
            let streaminfo = &packet[13..];
            if streaminfo.len() >= 4 + 18 {
                let body = &streaminfo[4..];
                let samplerate =
                    (u32::from(body[10]) << 12) | (u32::from(body[11]) << 4) | (u32::from(body[12]) >> 4);
                let channels = ((body[12] >> 1) & 0x07) + 1;
                let bitdepth = (((body[12] & 1) << 4) | (body[13] >> 4)) + 1;
                tag.samplerate = Some(samplerate);
                tag.channels = Some(u32::from(channels));
                tag.bitdepth = Some(u32::from(bitdepth));
            }
        }
        Codec::Speex => {
            // Fixed layout: 8-byte magic, 20-byte version string, version_id[4], header_size[4],
            // rate[4], mode[4], mode_bitstream_version[4], channels[4], ...
            if packet.len() < 8 + 20 + 4 + 4 + 4 + 4 + 4 + 4 {
                return Ok(());
            }
            let base = 8 + 20 + 4 + 4;
            let rate = u32::from_le_bytes(packet[base..base + 4].try_into().unwrap());
            let channels = u32::from_le_bytes(packet[base + 8..base + 12].try_into().unwrap());
            tag.samplerate = Some(rate);
            tag.channels = Some(channels);
        }
    }
    Ok(())
}

/// Reads one Ogg page, reassembling packets split across the page's lacing table (a packet
/// continues across segments wherever a lacing value of 255 appears) and across page boundaries
/// via `pending`, which carries a packet still open at the end of the previous page forward
/// (the continuation flag in the header type byte says whether this page's first packet picks
/// up where the last one left off).
fn read_page(reader: &mut ByteReader, pending: &mut Vec<u8>) -> Result<Option<Page>> {
    if reader.pos()? + 27 > reader.len() {
        return Ok(None);
    }
    if reader.peek(4)? != b"OggS" {
        return Ok(None);
    }
    reader.skip(4)?;
    let _version = reader.read_u8()?;
    let header_type = reader.read_u8()?;
    let granule_position = reader.read_u64le()?;
    let _serial = reader.read_u32le()?;
    let _page_seq = reader.read_u32le()?;
    let _crc = reader.read_u32le()?;
    let segment_count = reader.read_u8()? as usize;
    let lacing = reader.read_vec(segment_count)?;

    let continued = header_type & 0x01 != 0;
    let mut current = std::mem::take(pending);
    if !continued {
        current.clear();
    }

    let mut packets = Vec::new();
    for &lace in &lacing {
        let chunk = reader.read_vec(lace as usize)?;
        current.extend_from_slice(&chunk);
        if lace < 255 {
            packets.push(std::mem::take(&mut current));
        }
    }

    if lacing.last() == Some(&255) {
        *pending = current;
    }

    Ok(Some(Page { granule_position, packets }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_page(granule: u64, packet: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"OggS");
        bytes.push(0); // version
        bytes.push(0x04); // flags: end of stream
        bytes.extend_from_slice(&granule.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes()); // serial
        bytes.extend_from_slice(&0u32.to_le_bytes()); // page seq
        bytes.extend_from_slice(&0u32.to_le_bytes()); // crc

        let mut lacing = Vec::new();
        let mut remaining = packet.len();
        while remaining >= 255 {
            lacing.push(255);
            remaining -= 255;
        }
        lacing.push(remaining as u8);

        bytes.push(lacing.len() as u8);
        bytes.extend_from_slice(&lacing);
        bytes.extend_from_slice(packet);
        bytes
    }

    #[test]
    fn identifies_vorbis_identification_packet() {
        let mut ident = b"\x01vorbis".to_vec();
        ident.push(2); // channels
        ident.extend_from_slice(&44100u32.to_le_bytes());
        ident.extend_from_slice(&0i32.to_le_bytes());
        ident.extend_from_slice(&128_000i32.to_le_bytes());
        ident.extend_from_slice(&0i32.to_le_bytes());
        ident.push(0);

        let bytes = build_page(0, &ident);
        let mut reader = ByteReader::from_bytes(bytes);
        let mut tag = Tag::new(reader.len());
        let opts = GetOptions::default();
        parse(&mut reader, &opts, &mut tag).unwrap();

        assert_eq!(tag.channels, Some(2));
        assert_eq!(tag.samplerate, Some(44100));
    }

    #[test]
    fn identifies_opus_identification_packet_and_fixed_samplerate() {
        let mut ident = b"OpusHead".to_vec();
        ident.push(1); // version
        ident.push(2); // channels
        ident.extend_from_slice(&312u16.to_le_bytes()); // pre-skip
        ident.extend_from_slice(&48000u32.to_le_bytes()); // input sample rate (informational)

        let bytes = build_page(48_000 * 5, &ident);
        let mut reader = ByteReader::from_bytes(bytes);
        let mut tag = Tag::new(reader.len());
        let opts = GetOptions::default();
        parse(&mut reader, &opts, &mut tag).unwrap();

        assert_eq!(tag.samplerate, Some(48_000));
        assert_eq!(tag.channels, Some(2));
        assert!((tag.duration.unwrap() - 5.0).abs() < 1e-9);
    }
}
