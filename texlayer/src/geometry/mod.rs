//! Pixel coordinates and point sets.
//!
//! A [`Point`] is an unsigned pixel coordinate that packs into a single
//! `u64`. A [`Rect`] describes an upload region. An [`Area`] is an
//! ordered set of distinct points; transforms are applied over areas and large areas are split with [`Area::partition`]
//! for parallel processing.

use std::collections::HashSet;
use std::fmt;

/// An unsigned pixel coordinate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Pack into a `u64` with `x` in the high half.
    pub const fn pack(self) -> u64 {
        (self.x as u64) << 32 | self.y as u64
    }

    /// Inverse of [`Point::pack`].
    pub const fn unpack(packed: u64) -> Self {
        Self {
            x: (packed >> 32) as u32,
            y: packed as u32,
        }
    }

    /// The same point at a lower mipmap level.
    pub const fn shifted(self, level: u8) -> Self {
        Self {
            x: self.x >> level,
            y: self.y >> level,
        }
    }

    /// Offset by another point, failing on overflow.
    pub fn checked_add(self, other: Point) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(other.x)?,
            y: self.y.checked_add(other.y)?,
        })
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(u32, u32)> for Point {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle with its top-left corner at `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle at the origin.
    pub const fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Every coordinate and dimension shifted right by `level`.
    pub const fn shifted(self, level: u8) -> Self {
        Self {
            x: self.x >> level,
            y: self.y >> level,
            width: self.width >> level,
            height: self.height >> level,
        }
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether this rectangle lies inside a `width`×`height` image.
    pub fn fits_within(self, width: u32, height: u32) -> bool {
        self.x.checked_add(self.width).is_some_and(|right| right <= width)
            && self
                .y
                .checked_add(self.height)
                .is_some_and(|bottom| bottom <= height)
    }
}

/// An ordered collection of distinct points.
///
/// Duplicates are dropped on construction, keeping the first occurrence,
/// so a transform never runs twice on the same pixel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Area {
    points: Vec<Point>,
}

impl Area {
    /// An area with no points.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single point.
    pub fn single(point: Point) -> Self {
        Self {
            points: vec![point],
        }
    }

    /// Every point of the rectangle at `(x, y)` with the given size, row by
    /// row. Points whose coordinates would overflow `u32` are skipped.
    pub fn rect(x: u32, y: u32, width: u32, height: u32) -> Self {
        // Sizes are not trusted for preallocation; only reachable points
        // take memory.
        let mut points = Vec::new();
        for dy in 0..height {
            let Some(row) = y.checked_add(dy) else { break };
            for dx in 0..width {
                let Some(column) = x.checked_add(dx) else { break };
                points.push(Point::new(column, row));
            }
        }
        Self { points }
    }

    /// An area made of the given points.
    pub fn of(points: impl IntoIterator<Item = Point>) -> Self {
        let mut seen = HashSet::new();
        let points = points
            .into_iter()
            .filter(|point| seen.insert(*point))
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.iter().copied()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Split into disjoint chunks of at most `size` points.
    ///
    /// A `size` of zero is treated as one.
    pub fn partition(&self, size: usize) -> std::slice::Chunks<'_, Point> {
        self.points.chunks(size.max(1))
    }
}

impl FromIterator<Point> for Area {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Area::of(iter)
    }
}

impl<'a> IntoIterator for &'a Area {
    type Item = Point;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Point>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_pack_layout() {
        let point = Point::new(3, 7);
        assert_eq!(point.pack(), (3u64 << 32) | 7);
        assert_eq!(Point::unpack(point.pack()), point);
        assert_eq!(Point::unpack(u64::MAX), Point::new(u32::MAX, u32::MAX));
    }

    #[test]
    fn test_point_shifted() {
        assert_eq!(Point::new(13, 6).shifted(0), Point::new(13, 6));
        assert_eq!(Point::new(13, 6).shifted(2), Point::new(3, 1));
    }

    #[test]
    fn test_point_checked_add() {
        assert_eq!(
            Point::new(1, 2).checked_add(Point::new(10, 20)),
            Some(Point::new(11, 22))
        );
        assert_eq!(Point::new(u32::MAX, 0).checked_add(Point::new(1, 0)), None);
    }

    #[test]
    fn test_rect_shifted_rounds_down() {
        let rect = Rect::new(5, 3, 7, 9).shifted(1);
        assert_eq!(rect, Rect::new(2, 1, 3, 4));
        assert!(Rect::new(0, 0, 1, 8).shifted(1).is_empty());
    }

    #[test]
    fn test_rect_fits_within() {
        assert!(Rect::sized(4, 4).fits_within(4, 4));
        assert!(!Rect::new(1, 0, 4, 4).fits_within(4, 4));
        assert!(!Rect::new(u32::MAX, 0, 1, 1).fits_within(4, 4));
    }

    #[test]
    fn test_area_rect_row_major() {
        let area = Area::rect(1, 2, 2, 2);
        assert_eq!(
            area.points(),
            &[
                Point::new(1, 2),
                Point::new(2, 2),
                Point::new(1, 3),
                Point::new(2, 3)
            ]
        );
    }

    #[test]
    fn test_area_rect_zero_size_is_empty() {
        assert!(Area::rect(0, 0, 0, 10).is_empty());
        assert!(Area::rect(0, 0, 10, 0).is_empty());
    }

    #[test]
    fn test_area_rect_oversized_near_edge() {
        let edge = u32::MAX - 1;
        let area = Area::rect(edge, edge, u32::MAX, u32::MAX);
        assert_eq!(area.len(), 4);
        assert!(area.iter().all(|point| point.x >= edge && point.y >= edge));
    }

    #[test]
    fn test_of_removes_duplicates_in_order() {
        let area = Area::of([Point::new(1, 1), Point::new(0, 0), Point::new(1, 1)]);
        assert_eq!(area.points(), &[Point::new(1, 1), Point::new(0, 0)]);
    }

    #[test]
    fn test_partition_covers_all_points_once() {
        let area = Area::rect(0, 0, 10, 7);
        let chunks: Vec<_> = area.partition(16).collect();
        assert_eq!(chunks.len(), 5);
        assert!(chunks.iter().all(|chunk| chunk.len() <= 16));
        let total: usize = chunks.iter().map(|chunk| chunk.len()).sum();
        assert_eq!(total, 70);
        assert_eq!(area.partition(0).count(), 70);
    }
}
