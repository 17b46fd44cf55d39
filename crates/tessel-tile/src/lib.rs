//! Packed per-cell tile descriptor for chunk grids.
#![forbid(unsafe_code)]

use std::error::Error;
use std::fmt;

use serde::Deserialize;

/* Backing word layout, least significant bit first:
 *
 *   bits  0..12  prototype id
 *   bit  12      flip x
 *   bit  13      flip y
 *   bit  14      collision / solid
 *   bits 15..17  rotation (quarter turns clockwise)
 *   bits 17..32  reserved
 */

/// Width of the prototype id field.
pub const ID_BITS: u32 = 12;
/// Largest id the packed field can hold.
pub const ID_MAX: u32 = (1 << ID_BITS) - 1;

const ID_MASK: u32 = ID_MAX;
const FLIP_X_BIT: u32 = 1 << 12;
const FLIP_Y_BIT: u32 = 1 << 13;
const COLLISION_BIT: u32 = 1 << 14;
const ROT_SHIFT: u32 = 15;
const ROT_MASK: u32 = 0x3;

/// Quarter-turn rotation applied to a tile's prototype, clockwise seen from above.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TileRotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl TileRotation {
    pub const ALL: [TileRotation; 4] = [
        TileRotation::None,
        TileRotation::Cw90,
        TileRotation::Cw180,
        TileRotation::Cw270,
    ];

    /// Number of clockwise quarter turns, 0..4.
    #[inline]
    pub fn quarter_turns(self) -> u32 {
        self as u32
    }

    #[inline]
    fn from_bits(bits: u32) -> TileRotation {
        Self::ALL[(bits & ROT_MASK) as usize]
    }
}

impl fmt::Display for TileRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} deg", self.quarter_turns() * 90)
    }
}

/// What to do with a prototype id that does not fit the packed field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdRangePolicy {
    /// Reject the assignment and leave the tile unchanged.
    #[default]
    Strict,
    /// Keep the low [`ID_BITS`] bits silently.
    Truncate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileError {
    IdOutOfRange { id: u32, max: u32 },
}

impl fmt::Display for TileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileError::IdOutOfRange { id, max } => {
                write!(f, "tile id {} out of range (max {})", id, max)
            }
        }
    }
}

impl Error for TileError {}

/// One grid cell: prototype id, rotation, and flags packed into 32 bits.
///
/// Copyable value type; every accessor touches only its own bits of the
/// backing word.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Tile {
    raw: u32,
}

impl Tile {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Tile { raw }
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.raw
    }

    #[inline]
    pub fn id(self) -> u32 {
        self.raw & ID_MASK
    }

    /// Replaces the id field. Fails when `id` exceeds [`ID_MAX`]; the tile is
    /// left unchanged on failure.
    #[inline]
    pub fn set_id(&mut self, id: u32) -> Result<(), TileError> {
        if id > ID_MAX {
            return Err(TileError::IdOutOfRange { id, max: ID_MAX });
        }
        self.raw = (self.raw & !ID_MASK) | id;
        Ok(())
    }

    /// Replaces the id field, keeping only the low [`ID_BITS`] bits of `id`.
    #[inline]
    pub fn set_id_truncated(&mut self, id: u32) {
        self.raw = (self.raw & !ID_MASK) | (id & ID_MASK);
    }

    #[inline]
    pub fn set_id_with(&mut self, id: u32, policy: IdRangePolicy) -> Result<(), TileError> {
        match policy {
            IdRangePolicy::Strict => self.set_id(id),
            IdRangePolicy::Truncate => {
                self.set_id_truncated(id);
                Ok(())
            }
        }
    }

    #[inline]
    pub fn rotation(self) -> TileRotation {
        TileRotation::from_bits(self.raw >> ROT_SHIFT)
    }

    #[inline]
    pub fn set_rotation(&mut self, rot: TileRotation) {
        self.raw &= !(ROT_MASK << ROT_SHIFT);
        self.raw |= rot.quarter_turns() << ROT_SHIFT;
    }

    #[inline]
    pub fn flip_x(self) -> bool {
        self.flag(FLIP_X_BIT)
    }

    #[inline]
    pub fn set_flip_x(&mut self, on: bool) {
        self.set_flag(FLIP_X_BIT, on);
    }

    #[inline]
    pub fn flip_y(self) -> bool {
        self.flag(FLIP_Y_BIT)
    }

    #[inline]
    pub fn set_flip_y(&mut self, on: bool) {
        self.set_flag(FLIP_Y_BIT, on);
    }

    #[inline]
    pub fn collision(self) -> bool {
        self.flag(COLLISION_BIT)
    }

    #[inline]
    pub fn set_collision(&mut self, on: bool) {
        self.set_flag(COLLISION_BIT, on);
    }

    #[inline]
    fn flag(self, mask: u32) -> bool {
        self.raw & mask != 0
    }

    #[inline]
    fn set_flag(&mut self, mask: u32, on: bool) {
        if on {
            self.raw |= mask;
        } else {
            self.raw &= !mask;
        }
    }

    /// All 32 bits most significant first, with a separator between packed
    /// fields: reserved, rotation, collision, flip y, flip x, id.
    pub fn bit_string(self) -> String {
        let mut out = String::with_capacity(37);
        for i in (0..32u32).rev() {
            out.push(if self.raw >> i & 1 == 1 { '1' } else { '0' });
            if matches!(i, 17 | 15 | 14 | 13 | 12) {
                out.push(' ');
            }
        }
        out
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tile")
            .field("id", &self.id())
            .field("rotation", &self.rotation())
            .field("flip_x", &self.flip_x())
            .field("flip_y", &self.flip_y())
            .field("collision", &self.collision())
            .finish()
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id={} rot={} flip_x={} flip_y={} collision={} bits={}",
            self.id(),
            self.rotation(),
            self.flip_x(),
            self.flip_y(),
            self.collision(),
            self.bit_string()
        )
    }
}
