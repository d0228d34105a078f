// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reads artist/title/album/etc. metadata and audio properties (duration, bitrate, channels,
//! sample rate, bit depth) out of MP3, Ogg (Vorbis/Opus/Speex/FLAC), native FLAC, WAVE, AIFF,
//! MP4, and WMA files without decoding any audio.
//!
//! ```no_run
//! let tag = audiotag::get("song.mp3", &audiotag::GetOptions::default())?;
//! println!("{} - {}", tag.artist.unwrap_or_default(), tag.title.unwrap_or_default());
//! # Ok::<(), audiotag::Error>(())
//! ```

mod base64;
pub mod dispatch;
pub mod error;
pub mod formats;
pub mod genres;
pub mod io;
pub mod tag;
pub mod text;

pub use dispatch::{format_from_extension, format_from_magic, get, get_as, is_supported};
pub use error::{Error, Result};
pub use formats::GetOptions;
pub use io::{ByteReader, MediaSource};
pub use tag::{Field, FormatId, Image, Images, Tag};
