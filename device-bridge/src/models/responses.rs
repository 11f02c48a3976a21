use serde::Serialize;

use crate::hierarchy::Attributes;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Single-value payload (`{"value": ...}`)
#[derive(Debug, Serialize)]
pub struct ValueResponse<T> {
    pub value: T,
}

impl<T> ValueResponse<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

/// Display size in density-independent pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplaySizeDp {
    pub x: i32,
    pub y: i32,
}

/// Display rotation, serialized as degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayRotation {
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl DisplayRotation {
    /// From a surface rotation index (0..=3)
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::Rotation0),
            1 => Some(Self::Rotation90),
            2 => Some(Self::Rotation180),
            3 => Some(Self::Rotation270),
            _ => None,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Self::Rotation0 => 0,
            Self::Rotation90 => 90,
            Self::Rotation180 => 180,
            Self::Rotation270 => 270,
        }
    }

    /// True for portrait/landscape swaps (90 and 270)
    pub fn is_sideways(self) -> bool {
        matches!(self, Self::Rotation90 | Self::Rotation270)
    }
}

impl Serialize for DisplayRotation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.degrees())
    }
}

/// Reference to an element located by `findObject`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectRef {
    /// Canonical form of the selector that matched
    pub selector: String,
    /// Child indices from the root down to the element
    pub path: Vec<usize>,
    pub depth: usize,
    pub tag: String,
    pub attributes: Attributes,
}
