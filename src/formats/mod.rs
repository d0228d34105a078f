// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The eight container parsers, modeled as a closed set of variants sharing one operation set:
//! `parse_tag` and `determine_duration`. Parsers that compose (Ogg delegating to FLAC, WAVE/AIFF
//! delegating to ID3) call the other variant's functions directly on the same byte source.

pub mod aiff;
pub mod asf;
pub mod flac;
pub mod id3;
pub mod mp4;
pub mod ogg;
pub mod vorbis_comment;
pub mod wave;

use crate::error::Result;
use crate::io::ByteReader;
use crate::tag::{FormatId, Tag};

/// Options threaded through every parser call.
#[derive(Clone, Copy, Debug)]
pub struct GetOptions {
    pub tags: bool,
    pub duration: bool,
    pub image: bool,
    pub encoding: Option<crate::text::Encoding>,
    /// Upper bound on how much audio the MPEG frame walker scans before extrapolating, in
    /// seconds. Replaces the teacher lineage's process-wide mutable `_MAX_ESTIMATION_SEC`.
    pub mp3_estimation_seconds: u32,
}

impl Default for GetOptions {
    fn default() -> Self {
        GetOptions {
            tags: true,
            duration: true,
            image: false,
            encoding: None,
            mp3_estimation_seconds: 30,
        }
    }
}

/// Runs the parser selected for `format` over `reader`, producing a populated [`Tag`].
pub fn parse(format: FormatId, reader: &mut ByteReader, opts: &GetOptions, tag: &mut Tag) -> Result<()> {
    tag.format = Some(format);
    match format {
        FormatId::Id3 => id3::parse(reader, opts, tag),
        FormatId::Ogg => ogg::parse(reader, opts, tag),
        FormatId::Flac => flac::parse(reader, opts, tag),
        FormatId::Wave => wave::parse(reader, opts, tag),
        FormatId::Aiff => aiff::parse(reader, opts, tag),
        FormatId::Mp4 => mp4::parse(reader, opts, tag),
        FormatId::Wma => asf::parse(reader, opts, tag),
    }
}
