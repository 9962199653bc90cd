//! Collision geometry, single source of truth.
//!
//! ## Coordinates
//!
//! World space is continuous pixels: x grows right, y grows DOWN.
//! Every solid thing in the game (platforms, hazards, enemies, the
//! player, the finish zone) is an axis-aligned `Rect` in this space.
//!
//! ## Overlap Semantics
//!
//! `overlaps` is touching-inclusive: two rects that share only an edge
//! still count as overlapping. Only strict separation on an axis fails
//! the test. The player resolver leaves a `SKIN`-sized gap after every
//! snap, so a resting body sits just clear of the surface below it and
//! re-contacts it on the next tick.
//!
//! ## First-Match Policy
//!
//! `first_hit` scans platforms in authored order and returns the first
//! overlap. Not nearest-match: when a probe spans the seam between two
//! platforms, the earlier one wins. Level geometry is authored with
//! this in mind; changing the tie-break changes observable physics.

/// Gap left between a snapped body and the surface it hit.
pub const SKIN: f32 = 0.1;

/// Axis-aligned box in world pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Touching-inclusive AABB overlap test. Pure, total.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.right() < other.x
            || self.x > other.right()
            || self.bottom() < other.y
            || self.y > other.bottom())
    }
}

/// First platform in authored order that `probe` overlaps, if any.
///
/// First-match, not closest-match. A probe straddling two platforms
/// resolves against whichever was authored earlier.
#[inline]
pub fn first_hit<'a>(probe: &Rect, platforms: &'a [Rect]) -> Option<&'a Rect> {
    platforms.iter().find(|p| probe.overlaps(p))
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
