//! Page rotation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PageMergeError, Result};

/// Clockwise page rotation in quarter turns.
///
/// A rotation is always absolute: it is the turn applied to the page's
/// upright content, not an increment on top of whatever the source declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "i64")]
pub enum Rotation {
    /// No rotation.
    #[default]
    None,
    /// Rotate 90 degrees clockwise.
    Clockwise90,
    /// Rotate 180 degrees.
    Rotate180,
    /// Rotate 270 degrees clockwise (90 counter-clockwise).
    Clockwise270,
}

impl Rotation {
    /// Normalize any multiple of 90 into a rotation.
    ///
    /// Negative values and values beyond a full turn are folded into
    /// `[0, 360)`, so `-90` becomes [`Rotation::Clockwise270`].
    ///
    /// # Errors
    ///
    /// Returns [`PageMergeError::InvalidRotation`] for values that are not
    /// a multiple of 90.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagemerge::pages::Rotation;
    ///
    /// assert_eq!(Rotation::from_degrees(-90).unwrap(), Rotation::Clockwise270);
    /// assert_eq!(Rotation::from_degrees(450).unwrap(), Rotation::Clockwise90);
    /// assert!(Rotation::from_degrees(45).is_err());
    /// ```
    pub fn from_degrees(degrees: i64) -> Result<Self> {
        if degrees % 90 != 0 {
            return Err(PageMergeError::InvalidRotation { degrees });
        }

        Ok(match degrees.rem_euclid(360) {
            0 => Self::None,
            90 => Self::Clockwise90,
            180 => Self::Rotate180,
            _ => Self::Clockwise270,
        })
    }

    /// Rotation as degrees in `[0, 360)`.
    pub fn as_degrees(&self) -> u16 {
        match self {
            Self::None => 0,
            Self::Clockwise90 => 90,
            Self::Rotate180 => 180,
            Self::Clockwise270 => 270,
        }
    }

    /// Add `delta` degrees to this rotation.
    ///
    /// # Errors
    ///
    /// Returns [`PageMergeError::InvalidRotation`] if `delta` is not a
    /// multiple of 90.
    pub fn rotated_by(self, delta: i64) -> Result<Self> {
        Self::from_degrees(i64::from(self.as_degrees()) + delta.rem_euclid(360))
            .map_err(|_| PageMergeError::InvalidRotation { degrees: delta })
    }

    /// Read a `/Rotate` value as stored in a PDF.
    ///
    /// Malformed values (not a multiple of 90) are treated as no rotation,
    /// which is what viewers do.
    pub fn from_pdf_value(value: i64) -> Self {
        Self::from_degrees(value).unwrap_or_default()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.as_degrees())
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.as_degrees()
    }
}

impl From<Rotation> for i64 {
    fn from(rotation: Rotation) -> Self {
        i64::from(rotation.as_degrees())
    }
}

impl TryFrom<i64> for Rotation {
    type Error = PageMergeError;

    fn try_from(degrees: i64) -> Result<Self> {
        Self::from_degrees(degrees)
    }
}
