//! Screen-space geometry in pixel units.
//!
//! Coordinates are signed so that regions on secondary monitors left of or
//! above the primary one can be expressed; sizes are unsigned.

/// A pixel coordinate in screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translates the point by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Chebyshev distance to another point.
    pub fn chebyshev(self, other: Point) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx.max(dy)
    }
}

/// Width and height of a region in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Area in pixels.
    pub fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Builds a rectangle from inclusive-exclusive corner coordinates.
    ///
    /// Returns `None` if the corners are inverted.
    pub fn from_corners(left: i32, top: i32, right: i32, bottom: i32) -> Option<Self> {
        if right < left || bottom < top {
            return None;
        }
        Some(Self::new(
            left,
            top,
            right.abs_diff(left),
            bottom.abs_diff(top),
        ))
    }

    pub fn left(&self) -> i32 {
        self.origin.x
    }

    pub fn top(&self) -> i32 {
        self.origin.y
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.origin.x.saturating_add_unsigned(self.size.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.origin.y.saturating_add_unsigned(self.size.height)
    }

    pub fn area(&self) -> u64 {
        self.size.area()
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    /// Center point, rounded toward the top-left for even sizes.
    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x.saturating_add_unsigned(self.size.width / 2),
            self.origin.y.saturating_add_unsigned(self.size.height / 2),
        )
    }

    /// Point at fractional offsets inside the rectangle, clamped to `[0, 1]`.
    pub fn relative_point(&self, x_ratio: f32, y_ratio: f32) -> Point {
        let fx = x_ratio.clamp(0.0, 1.0) as f64;
        let fy = y_ratio.clamp(0.0, 1.0) as f64;
        let max_dx = self.size.width.saturating_sub(1) as f64;
        let max_dy = self.size.height.saturating_sub(1) as f64;
        let dx = (self.size.width as f64 * fx).floor().min(max_dx) as i32;
        let dy = (self.size.height as f64 * fy).floor().min(max_dy) as i32;
        self.origin.offset(dx, dy)
    }

    /// Returns true if `p` lies inside the rectangle.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }

    /// Overlapping part of two rectangles, or `None` if they are disjoint.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Rect::from_corners(left, top, right, bottom)
    }

    /// Intersection area divided by the area of the smaller rectangle.
    ///
    /// Zero when either rectangle is empty or they do not overlap.
    pub fn overlap_of_smaller(&self, other: &Rect) -> f32 {
        let smaller = self.area().min(other.area());
        if smaller == 0 {
            return 0.0;
        }
        match self.intersection(other) {
            Some(inter) => (inter.area() as f64 / smaller as f64) as f32,
            None => 0.0,
        }
    }

    /// Scales origin and size by `factor` (DPI normalization).
    pub fn scaled(&self, factor: f32) -> Rect {
        let f = factor as f64;
        Rect::new(
            (self.origin.x as f64 * f).round() as i32,
            (self.origin.y as f64 * f).round() as i32,
            (self.size.width as f64 * f).round() as u32,
            (self.size.height as f64 * f).round() as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Point, Rect};

    #[test]
    fn center_rounds_toward_origin() {
        let r = Rect::new(10, 20, 5, 4);
        assert_eq!(r.center(), Point::new(12, 22));
    }

    #[test]
    fn intersection_of_disjoint_rects_is_none() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 10, 10);
        assert!(a.intersection(&b).is_none());
        assert_eq!(a.overlap_of_smaller(&b), 0.0);
    }

    #[test]
    fn overlap_uses_smaller_area() {
        let big = Rect::new(0, 0, 100, 100);
        let small = Rect::new(90, 90, 20, 20);
        // 10x10 of the 20x20 box overlaps.
        assert!((big.overlap_of_smaller(&small) - 0.25).abs() < 1e-6);
        let inside = Rect::new(10, 10, 5, 5);
        assert!((big.overlap_of_smaller(&inside) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn relative_point_stays_inside() {
        let r = Rect::new(100, 50, 200, 100);
        assert_eq!(r.relative_point(0.5, 0.5), Point::new(200, 100));
        assert_eq!(r.relative_point(1.0, 1.0), Point::new(299, 149));
        assert_eq!(r.relative_point(-3.0, 0.0), Point::new(100, 50));
        assert!(r.contains(r.relative_point(1.0, 1.0)));
    }

    #[test]
    fn scaled_rounds_components() {
        let r = Rect::new(10, 10, 101, 51);
        assert_eq!(r.scaled(1.5), Rect::new(15, 15, 152, 77));
    }
}
