// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end checks through the public `get_as` entry point, using synthetic in-memory
//! containers rather than checked-in fixture files.

use std::io::Cursor;

use audiotag::{FormatId, GetOptions};

/// Installs the `log` facade's default subscriber once, so the `log::debug!`/`log::warn!` calls
/// in the dispatcher and format parsers are exercised end-to-end rather than going nowhere.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn flac_bytes(artist: &str, title: &str) -> Vec<u8> {
    let mut streaminfo_body = vec![0u8; 34];
    let sr_ch_bd_samples: u64 = (44100u64 << 44) | (1u64 << 41) | (15u64 << 36) | (44100 * 3);
    let bytes = sr_ch_bd_samples.to_be_bytes();
    streaminfo_body[10..18].copy_from_slice(&bytes);

    let mut comments = Vec::new();
    let vendor = b"audiotag-tests";
    comments.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    comments.extend_from_slice(vendor);
    let fields = [format!("ARTIST={artist}"), format!("TITLE={title}")];
    comments.extend_from_slice(&(fields.len() as u32).to_le_bytes());
    for field in &fields {
        comments.extend_from_slice(&(field.len() as u32).to_le_bytes());
        comments.extend_from_slice(field.as_bytes());
    }

    let mut bytes_out = Vec::new();
    bytes_out.extend_from_slice(b"fLaC");
    bytes_out.push(0x00); // STREAMINFO, not last
    bytes_out.extend_from_slice(&[0, 0, 34]);
    bytes_out.extend_from_slice(&streaminfo_body);
    bytes_out.push(0x84); // VORBIS_COMMENT, last block
    let comment_len = comments.len() as u32;
    bytes_out.extend_from_slice(&comment_len.to_be_bytes()[1..]);
    bytes_out.extend_from_slice(&comments);

    bytes_out
}

#[test]
fn flac_roundtrips_artist_title_and_duration() {
    init_logging();
    let bytes = flac_bytes("Test Artist", "Test Title");
    let len = bytes.len() as u64;
    let opts = GetOptions::default();

    let tag = audiotag::get_as(Box::new(Cursor::new(bytes)), len, FormatId::Flac, &opts).unwrap();

    assert_eq!(tag.artist.as_deref(), Some("Test Artist"));
    assert_eq!(tag.title.as_deref(), Some("Test Title"));
    assert_eq!(tag.samplerate, Some(44100));
    assert_eq!(tag.channels, Some(2));
    assert_eq!(tag.bitdepth, Some(16));
    assert!((tag.duration.unwrap() - 3.0).abs() < 1e-6);
}

#[test]
fn empty_source_returns_empty_tag_without_error() {
    let opts = GetOptions::default();
    let tag = audiotag::get_as(Box::new(Cursor::new(Vec::new())), 0, FormatId::Wave, &opts).unwrap();
    assert_eq!(tag.filesize, 0);
    assert!(tag.title.is_none());
}

#[test]
fn is_supported_matches_known_extensions_only() {
    assert!(audiotag::is_supported("mp3"));
    assert!(audiotag::is_supported("FLAC"));
    assert!(!audiotag::is_supported("txt"));
}
