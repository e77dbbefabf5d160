//! Tile filename identity for road-mapper training images.
//!
//! Training tiles encode their geographic identity in the filename stem:
//!
//! ```text
//!   X40.7128_-74.0060_3_0.png
//!   ^\______/ \______/ ^ ^
//!   |   lat     long   | rotation (degrees)
//!   |                  offset
//!   one-character type/class prefix; extension is "." + 3 chars
//! ```
//!
//! Stripping the 1-character prefix and the 4-character extension leaves the
//! stem, which splits on `_` into exactly four fields:
//! `latitude`, `longitude`, `offset`, `rotation`.
//!
//! Latitude, longitude and offset are carried verbatim as the substrings
//! found in the filename; they are never renormalized, so `-74.0060` stays
//! `-74.0060`. Only the rotation is parsed numerically, because callers
//! filter on "rotation is exactly zero" (the canonical, unrotated tile of a
//! rotation-augmented training set).

use std::num::ParseFloatError;
use thiserror::Error;

/// Length of the type/class prefix, in characters.
pub const PREFIX_LEN: usize = 1;
/// Length of the extension suffix (dot + 3 characters).
pub const SUFFIX_LEN: usize = 4;
/// Number of `_`-delimited fields in a well-formed stem.
pub const STEM_FIELDS: usize = 4;

#[derive(Debug, Error)]
pub enum ParseError {
    /// Filename has fewer characters than prefix + extension combined.
    #[error("filename is {len} characters, shorter than its fixed prefix and extension")]
    TooShort { len: usize },

    /// Stem did not split into exactly [`STEM_FIELDS`] fields.
    #[error("stem has {found} underscore-delimited fields, expected {STEM_FIELDS}")]
    FieldCount { found: usize },

    /// Rotation field is present but not a decimal number.
    #[error("rotation field {text:?} is not a decimal number")]
    Rotation {
        text: String,
        source: ParseFloatError,
    },
}

/// The identity encoded in one tile filename.
#[derive(Debug, Clone, PartialEq)]
pub struct TileName {
    pub latitude: String,
    pub longitude: String,
    pub offset: String,
    pub rotation: f64,
}

impl TileName {
    /// Parse a bare filename (no directory part) into its encoded identity.
    ///
    /// The prefix and suffix are stripped by character count, not byte
    /// count, so multi-byte UTF-8 in the name cannot split a code point.
    pub fn parse(filename: &str) -> Result<Self, ParseError> {
        let len = filename.chars().count();
        if len < PREFIX_LEN + SUFFIX_LEN {
            return Err(ParseError::TooShort { len });
        }

        let stem: String = filename
            .chars()
            .skip(PREFIX_LEN)
            .take(len - PREFIX_LEN - SUFFIX_LEN)
            .collect();

        let fields: Vec<&str> = stem.split('_').collect();
        if fields.len() != STEM_FIELDS {
            return Err(ParseError::FieldCount {
                found: fields.len(),
            });
        }

        let rotation = fields[3].parse::<f64>().map_err(|source| ParseError::Rotation {
            text: fields[3].to_owned(),
            source,
        })?;

        Ok(TileName {
            latitude: fields[0].to_owned(),
            longitude: fields[1].to_owned(),
            offset: fields[2].to_owned(),
            rotation,
        })
    }

    /// True for the unrotated tile of an augmentation group.
    ///
    /// Exact floating-point comparison on purpose: the encoded value is a
    /// literal like `0`, `0.0` or `-0`, all of which parse to zero.
    #[inline]
    pub fn is_canonical(&self) -> bool {
        self.rotation == 0.0
    }
}
