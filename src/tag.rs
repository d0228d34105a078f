// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The result aggregate every parser builds up and the merge rules that keep it consistent
//! regardless of which format wrote into it.

use std::collections::HashMap;

use crate::text::split_nul;

/// Which parser family produced a [`Tag`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormatId {
    Id3,
    Ogg,
    Flac,
    Wave,
    Aiff,
    Mp4,
    Wma,
}

/// An embedded image, as attached to a track via APIC/PIC, a Vorbis comment picture block, a
/// FLAC `PICTURE` block, or an MP4 `covr` atom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    /// Lowercase picture-type name, e.g. `"front_cover"`, `"media"`, `"other"`.
    pub name: String,
    pub data: Vec<u8>,
    pub mime_type: String,
    pub description: Option<String>,
}

/// Named image slots plus an overflow map for categories with no dedicated slot (or a second
/// image of a category that already has one).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Images {
    pub front_cover: Option<Image>,
    pub back_cover: Option<Image>,
    pub media: Option<Image>,
    pub other: HashMap<String, Vec<Image>>,
}

impl Images {
    /// Returns the first available image, checking the named slots in declared order before
    /// falling back to `other`.
    pub fn any(&self) -> Option<&Image> {
        self.front_cover
            .as_ref()
            .or(self.back_cover.as_ref())
            .or(self.media.as_ref())
            .or_else(|| self.other.values().flat_map(|v| v.first()).next())
    }

    /// Places an image in its named slot if the slot is free and the name matches one of the
    /// three core slots; otherwise appends it to `other`.
    pub fn set(&mut self, image: Image) {
        let slot = match image.name.as_str() {
            "front_cover" => Some(&mut self.front_cover),
            "back_cover" => Some(&mut self.back_cover),
            "media" => Some(&mut self.media),
            _ => None,
        };

        if let Some(slot) = slot {
            if slot.is_none() {
                *slot = Some(image);
                return;
            }
        }

        self.other.entry(image.name.clone()).or_default().push(image);
    }
}

/// Which core scalar field a parser is writing into. Used to drive the collision and
/// NUL-splitting rules in [`Tag::set_field`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Artist,
    AlbumArtist,
    Composer,
    Album,
    Title,
    Genre,
    Comment,
    Year,
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Field::Artist => "artist",
            Field::AlbumArtist => "albumartist",
            Field::Composer => "composer",
            Field::Album => "album",
            Field::Title => "title",
            Field::Genre => "genre",
            Field::Comment => "comment",
            Field::Year => "year",
        }
    }
}

/// The result aggregate returned to callers. Built up incrementally by a single parser (and
/// whatever it delegates to); immutable once returned.
#[derive(Clone, Debug, Default)]
pub struct Tag {
    pub format: Option<FormatId>,
    pub filename: Option<String>,
    pub filesize: u64,
    pub duration: Option<f64>,
    pub channels: Option<u32>,
    pub samplerate: Option<u32>,
    pub bitdepth: Option<u32>,
    pub bitrate: Option<f64>,
    pub artist: Option<String>,
    pub albumartist: Option<String>,
    pub composer: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub comment: Option<String>,
    pub year: Option<String>,
    pub disc: Option<u32>,
    pub disc_total: Option<u32>,
    pub track: Option<u32>,
    pub track_total: Option<u32>,
    pub other: HashMap<String, Vec<String>>,
    pub images: Images,
}

impl Tag {
    pub fn new(filesize: u64) -> Self {
        Tag { filesize, ..Default::default() }
    }

    /// Writes a scalar string into a core field, applying the NUL-split and collision rules.
    ///
    /// Empty strings are dropped outright (scalar fields are never set to `""`). A value
    /// containing embedded NULs is split: the first non-empty segment fills `field` if it is
    /// still unset, and every remaining segment (plus the first, if `field` was already set) is
    /// appended to `other[field.name()]`.
    pub fn set_field(&mut self, field: Field, value: &str) {
        let segments = split_nul(value);
        let mut segments = segments.into_iter();

        let Some(first) = segments.next() else { return };

        let slot = self.scalar_slot(field);
        if slot.is_none() {
            *slot = Some(first);
        } else {
            self.push_other(field.name(), first);
        }

        for rest in segments {
            self.push_other(field.name(), rest);
        }
    }

    fn scalar_slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Artist => &mut self.artist,
            Field::AlbumArtist => &mut self.albumartist,
            Field::Composer => &mut self.composer,
            Field::Album => &mut self.album,
            Field::Title => &mut self.title,
            Field::Genre => &mut self.genre,
            Field::Comment => &mut self.comment,
            Field::Year => &mut self.year,
        }
    }

    /// Appends a value to `other[key]`, de-duplicating within the key and disambiguating keys
    /// that collide with a core field name by prefixing them with `_`.
    pub fn push_other(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }

        let key = if is_core_field_name(key) { format!("_{key}") } else { key.to_string() };

        let list = self.other.entry(key).or_default();
        if !list.contains(&value) {
            list.push(value);
        }
    }

    /// Sets an integer field unless a non-zero value is already present there.
    pub fn set_int_if_unset(slot: &mut Option<u32>, value: u32) {
        if slot.map_or(true, |existing| existing == 0) {
            *slot = Some(value);
        }
    }

    /// Sets a floating point field (duration, bitrate) unless already populated.
    pub fn set_f64_if_unset(slot: &mut Option<f64>, value: f64) {
        if slot.is_none() {
            *slot = Some(value);
        }
    }
}

fn is_core_field_name(key: &str) -> bool {
    matches!(
        key,
        "artist"
            | "albumartist"
            | "composer"
            | "album"
            | "title"
            | "genre"
            | "comment"
            | "year"
            | "disc"
            | "disc_total"
            | "track"
            | "track_total"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_field_ignores_empty_strings() {
        let mut tag = Tag::new(0);
        tag.set_field(Field::Title, "");
        assert_eq!(tag.title, None);
    }

    #[test]
    fn set_field_fills_unset_scalar() {
        let mut tag = Tag::new(0);
        tag.set_field(Field::Artist, "Alice");
        assert_eq!(tag.artist.as_deref(), Some("Alice"));
    }

    #[test]
    fn set_field_routes_second_value_to_other() {
        let mut tag = Tag::new(0);
        tag.set_field(Field::Artist, "Alice");
        tag.set_field(Field::Artist, "Bob");
        assert_eq!(tag.artist.as_deref(), Some("Alice"));
        assert_eq!(tag.other.get("artist"), Some(&vec!["Bob".to_string()]));
    }

    #[test]
    fn set_field_splits_embedded_nul() {
        let mut tag = Tag::new(0);
        tag.set_field(Field::Artist, "Alice\0Bob\0Carol");
        assert_eq!(tag.artist.as_deref(), Some("Alice"));
        assert_eq!(
            tag.other.get("artist"),
            Some(&vec!["Bob".to_string(), "Carol".to_string()])
        );
    }

    #[test]
    fn push_other_prefixes_core_field_collisions() {
        let mut tag = Tag::new(0);
        tag.push_other("title", "Custom Title Frame");
        assert!(tag.other.contains_key("_title"));
        assert!(!tag.other.contains_key("title"));
    }

    #[test]
    fn push_other_deduplicates() {
        let mut tag = Tag::new(0);
        tag.push_other("lyrics", "La la la");
        tag.push_other("lyrics", "La la la");
        assert_eq!(tag.other.get("lyrics").unwrap().len(), 1);
    }

    #[test]
    fn int_field_non_zero_never_overwritten() {
        let mut year = Some(5);
        Tag::set_int_if_unset(&mut year, 9);
        assert_eq!(year, Some(5));

        let mut unset = None;
        Tag::set_int_if_unset(&mut unset, 9);
        assert_eq!(unset, Some(9));

        let mut zero = Some(0);
        Tag::set_int_if_unset(&mut zero, 9);
        assert_eq!(zero, Some(9));
    }

    #[test]
    fn images_any_checks_slots_before_other() {
        let mut images = Images::default();
        assert!(images.any().is_none());

        images.set(Image {
            name: "other".into(),
            data: vec![1],
            mime_type: "image/jpeg".into(),
            description: None,
        });
        assert!(images.any().is_some());

        images.set(Image {
            name: "front_cover".into(),
            data: vec![2],
            mime_type: "image/png".into(),
            description: None,
        });
        assert_eq!(images.any().unwrap().name, "front_cover");
    }

    #[test]
    fn images_overflow_second_of_same_slot_to_other() {
        let mut images = Images::default();
        images.set(Image {
            name: "media".into(),
            data: vec![1],
            mime_type: "image/png".into(),
            description: None,
        });
        images.set(Image {
            name: "media".into(),
            data: vec![2],
            mime_type: "image/png".into(),
            description: None,
        });
        assert!(images.media.is_some());
        assert_eq!(images.other.get("media").unwrap().len(), 1);
    }
}
