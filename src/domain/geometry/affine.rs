//! 2D points, sizes, rectangles and affine transforms

use std::fmt;

/// Values closer to zero than this are treated as zero when classifying
/// transform coefficients.
const EPSILON: f64 = 1e-9;

/// A point in a 2D coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero, negative or NaN
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Width divided by height, or `None` for degenerate sizes
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.is_degenerate() {
            None
        } else {
            Some(self.width / self.height)
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Rectangle at the origin covering `size`
    pub const fn from_size(size: Size) -> Self {
        Self {
            origin: Point::ZERO,
            size,
        }
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    /// Corners in order: min/min, max/min, max/max, min/max
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x(), self.min_y()),
            Point::new(self.max_x(), self.min_y()),
            Point::new(self.max_x(), self.max_y()),
            Point::new(self.min_x(), self.max_y()),
        ]
    }

    /// Smallest rectangle with integral edges that contains this one
    pub fn integral(&self) -> Self {
        let min_x = self.min_x().floor();
        let min_y = self.min_y().floor();
        let max_x = self.max_x().ceil();
        let max_y = self.max_y().ceil();
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Intersection with `bounds`, collapsing to an empty rectangle when disjoint
    pub fn clamped_to(&self, bounds: &Rect) -> Self {
        let min_x = self.min_x().max(bounds.min_x());
        let min_y = self.min_y().max(bounds.min_y());
        let max_x = self.max_x().min(bounds.max_x()).max(min_x);
        let max_y = self.max_y().min(bounds.max_y()).max(min_y);
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Bounding rectangle of a set of points
    pub fn bounding(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// 2D affine transform.
///
/// Uses row-vector conventions:
///
/// ```text
/// x' = a·x + c·y + tx
/// y' = b·x + d·y + ty
/// ```
///
/// Composition is explicit and ordered: `t1.then(&t2)` applies `t1` first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl AffineTransform {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub const fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Mirror across the vertical axis (x ↦ −x)
    pub const fn mirror_horizontal() -> Self {
        Self::scale(-1.0, 1.0)
    }

    /// Exact rotation by `turns` quarter turns, clockwise in a y-down
    /// pixel space. Negative values rotate counter-clockwise.
    pub const fn quarter_turns_clockwise(turns: i32) -> Self {
        match turns.rem_euclid(4) {
            0 => Self::IDENTITY,
            1 => Self::new(0.0, 1.0, -1.0, 0.0, 0.0, 0.0),
            2 => Self::new(-1.0, 0.0, 0.0, -1.0, 0.0, 0.0),
            _ => Self::new(0.0, -1.0, 1.0, 0.0, 0.0, 0.0),
        }
    }

    /// Rotation from a clockwise angle in degrees.
    ///
    /// Multiples of 90° produce exact coefficients.
    pub fn rotation_degrees(degrees: f64) -> Self {
        let quarter = degrees / 90.0;
        if (quarter - quarter.round()).abs() < EPSILON {
            return Self::quarter_turns_clockwise(quarter.round() as i32);
        }
        let radians = degrees.to_radians();
        let (sin, cos) = radians.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Concatenate: apply `self`, then `next`
    pub fn then(&self, next: &Self) -> Self {
        Self {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            tx: self.tx * next.a + self.ty * next.c + next.tx,
            ty: self.tx * next.b + self.ty * next.d + next.ty,
        }
    }

    /// Rotation/scale/mirror component with the translation dropped
    pub fn linear(&self) -> Self {
        Self::new(self.a, self.b, self.c, self.d, 0.0, 0.0)
    }

    pub fn is_identity(&self) -> bool {
        let id = Self::IDENTITY;
        [
            self.a - id.a,
            self.b - id.b,
            self.c - id.c,
            self.d - id.d,
            self.tx,
            self.ty,
        ]
        .iter()
        .all(|v| v.abs() < EPSILON)
    }

    pub fn apply_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    /// Bounding box of `rect` after transformation
    pub fn bounding_box(&self, rect: &Rect) -> Rect {
        let corners = rect.corners().map(|p| self.apply_point(p));
        Rect::bounding(&corners)
    }

    /// Absolute extent of a size after the linear part is applied.
    ///
    /// A 90° rotation swaps width and height; mirrors leave them unchanged.
    pub fn effective_size(&self, size: Size) -> Size {
        let bbox = self.linear().bounding_box(&Rect::from_size(size));
        Size::new(bbox.size.width.abs(), bbox.size.height.abs())
    }

    /// Whether the linear part maps the x axis mostly onto the y axis, as
    /// quarter-turn rotations do
    pub fn swaps_axes(&self) -> bool {
        self.a.abs() < self.b.abs()
    }

    /// Net sign contribution of the transform along the output x axis
    pub fn horizontal_sign(&self) -> f64 {
        self.a + self.c
    }

    /// Net sign contribution of the transform along the output y axis
    pub fn vertical_sign(&self) -> f64 {
        self.b + self.d
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_eq(actual: Point, expected: Point) {
        assert!(
            (actual.x - expected.x).abs() < 1e-9 && (actual.y - expected.y).abs() < 1e-9,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn identity_leaves_points_unchanged() {
        let p = Point::new(3.0, -4.5);
        assert_point_eq(AffineTransform::IDENTITY.apply_point(p), p);
        assert!(AffineTransform::default().is_identity());
    }

    #[test]
    fn then_applies_in_order() {
        // Translate then scale differs from scale then translate
        let t = AffineTransform::translation(10.0, 0.0);
        let s = AffineTransform::scale(2.0, 2.0);
        let p = Point::new(1.0, 1.0);

        assert_point_eq(t.then(&s).apply_point(p), Point::new(22.0, 2.0));
        assert_point_eq(s.then(&t).apply_point(p), Point::new(12.0, 2.0));
    }

    #[test]
    fn quarter_turn_clockwise_in_pixel_space() {
        let r = AffineTransform::quarter_turns_clockwise(1);
        // +x axis maps to +y (downwards) in a y-down space
        assert_point_eq(r.apply_point(Point::new(1.0, 0.0)), Point::new(0.0, 1.0));
        assert_point_eq(r.apply_point(Point::new(0.0, 1.0)), Point::new(-1.0, 0.0));
    }

    #[test]
    fn four_quarter_turns_is_identity() {
        let r = AffineTransform::quarter_turns_clockwise(1);
        let full = r.then(&r).then(&r).then(&r);
        assert!(full.is_identity());
        assert_eq!(
            AffineTransform::quarter_turns_clockwise(-1),
            AffineTransform::quarter_turns_clockwise(3)
        );
    }

    #[test]
    fn rotation_degrees_is_exact_for_quarter_turns() {
        assert_eq!(
            AffineTransform::rotation_degrees(90.0),
            AffineTransform::quarter_turns_clockwise(1)
        );
        assert_eq!(
            AffineTransform::rotation_degrees(-90.0),
            AffineTransform::quarter_turns_clockwise(3)
        );
        assert_eq!(
            AffineTransform::rotation_degrees(540.0),
            AffineTransform::quarter_turns_clockwise(2)
        );
    }

    #[test]
    fn effective_size_swaps_on_rotation() {
        let size = Size::new(1920.0, 1080.0);
        let rotated = AffineTransform::quarter_turns_clockwise(1).effective_size(size);
        assert_eq!(rotated, Size::new(1080.0, 1920.0));

        let mirrored = AffineTransform::mirror_horizontal().effective_size(size);
        assert_eq!(mirrored, size);
    }

    #[test]
    fn swaps_axes_for_odd_quarter_turns() {
        assert!(!AffineTransform::IDENTITY.swaps_axes());
        assert!(AffineTransform::quarter_turns_clockwise(1).swaps_axes());
        assert!(!AffineTransform::quarter_turns_clockwise(2).swaps_axes());
        assert!(AffineTransform::quarter_turns_clockwise(3).swaps_axes());
        assert!(!AffineTransform::mirror_horizontal().swaps_axes());
    }

    #[test]
    fn effective_size_ignores_translation() {
        let t = AffineTransform::new(0.0, 1.0, -1.0, 0.0, 1080.0, 0.0);
        assert_eq!(
            t.effective_size(Size::new(100.0, 50.0)),
            Size::new(50.0, 100.0)
        );
    }

    #[test]
    fn bounding_box_of_mirrored_rect() {
        let rect = Rect::new(0.0, 0.0, 10.0, 5.0);
        let bbox = AffineTransform::mirror_horizontal().bounding_box(&rect);
        assert_eq!(bbox, Rect::new(-10.0, 0.0, 10.0, 5.0));
    }

    #[test]
    fn integral_rounds_outward() {
        let r = Rect::new(0.5, 1.25, 10.0, 3.5).integral();
        assert_eq!(r, Rect::new(0.0, 1.0, 11.0, 4.0));
    }

    #[test]
    fn clamped_to_bounds() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 50.0);
        let r = Rect::new(-2.0, 10.0, 110.0, 10.0).clamped_to(&bounds);
        assert_eq!(r, Rect::new(0.0, 10.0, 100.0, 10.0));
    }

    #[test]
    fn degenerate_sizes() {
        assert!(Size::new(0.0, 10.0).is_degenerate());
        assert!(Size::new(10.0, -1.0).is_degenerate());
        assert!(Size::new(f64::NAN, 10.0).is_degenerate());
        assert!(!Size::new(1.0, 1.0).is_degenerate());
        assert_eq!(Size::new(0.0, 1.0).aspect_ratio(), None);
    }

    #[test]
    fn axis_signs() {
        assert!(AffineTransform::mirror_horizontal().horizontal_sign() < 0.0);
        assert!(AffineTransform::IDENTITY.horizontal_sign() > 0.0);
        // 90° clockwise sends +y to −x
        assert!(AffineTransform::quarter_turns_clockwise(1).horizontal_sign() < 0.0);
        assert!(AffineTransform::quarter_turns_clockwise(1).vertical_sign() > 0.0);
    }
}
