//! 2D points and the 3×3 affine matrix used to position the viewed image.
//!
//! Matrices are stored row-major with the translation in the last column, so
//! `[a, b, tx, c, d, ty, 0, 0, 1]`. Elementary operations compose on the
//! right: `translate(m, dx, dy)` is `m × T(dx, dy)`. Only uniform scale and
//! axis-aligned translation are ever produced.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Default tolerance for floating-point comparisons of transforms.
pub const EPSILON: f32 = 1e-4;

/// A point or displacement in logical pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length of the point treated as a vector.
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Size of the viewed element in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(390.0, 844.0)
    }
}

/// A 3×3 affine matrix over `f32`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    m: [f32; 9],
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform {
        m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Pure translation matrix.
    pub fn translation(dx: f32, dy: f32) -> Self {
        Self {
            m: [1.0, 0.0, dx, 0.0, 1.0, dy, 0.0, 0.0, 1.0],
        }
    }

    /// Pure uniform scale matrix.
    pub fn scaling(factor: f32) -> Self {
        Self {
            m: [factor, 0.0, 0.0, 0.0, factor, 0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Raw row-major elements.
    pub fn elements(&self) -> [f32; 9] {
        self.m
    }

    pub fn translate_x(&self) -> f32 {
        self.m[2]
    }

    pub fn translate_y(&self) -> f32 {
        self.m[5]
    }

    pub fn scale_x(&self) -> f32 {
        self.m[0]
    }

    pub fn scale_y(&self) -> f32 {
        self.m[4]
    }

    /// Matrix product `self × rhs`.
    pub fn multiply(&self, rhs: &AffineTransform) -> AffineTransform {
        let a = &self.m;
        let b = &rhs.m;
        let mut out = [0.0; 9];
        for row in 0..3 {
            for col in 0..3 {
                out[row * 3 + col] = a[row * 3] * b[col]
                    + a[row * 3 + 1] * b[3 + col]
                    + a[row * 3 + 2] * b[6 + col];
            }
        }
        AffineTransform { m: out }
    }

    /// Map a point through the matrix.
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.m[0] * p.x + self.m[1] * p.y + self.m[2],
            self.m[3] * p.x + self.m[4] * p.y + self.m[5],
        )
    }

    /// Multiply both scale components by `factor`, leaving translation alone.
    ///
    /// This is how the sheet-driven shrink is applied on top of the composed
    /// matrix; it is not a matrix product.
    pub fn with_scale_factor(&self, factor: f32) -> AffineTransform {
        let mut m = self.m;
        m[0] *= factor;
        m[4] *= factor;
        AffineTransform { m }
    }

    /// Clamp both scale components into `[min, max]`.
    pub fn with_clamped_scale(&self, min: f32, max: f32) -> AffineTransform {
        let mut m = self.m;
        m[0] = m[0].clamp(min, max);
        m[4] = m[4].clamp(min, max);
        AffineTransform { m }
    }

    pub fn approx_eq(&self, other: &AffineTransform, epsilon: f32) -> bool {
        self.m
            .iter()
            .zip(other.m.iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }

    pub fn is_identity(&self) -> bool {
        self.approx_eq(&Self::IDENTITY, EPSILON)
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for AffineTransform {
    type Output = AffineTransform;

    fn mul(self, rhs: AffineTransform) -> AffineTransform {
        self.multiply(&rhs)
    }
}

/// Compose `m` with a translation by `(dx, dy)` on the right.
pub fn translate(m: &AffineTransform, dx: f32, dy: f32) -> AffineTransform {
    m.multiply(&AffineTransform::translation(dx, dy))
}

/// Compose `m` with a uniform scale by `factor` on the right.
pub fn scale(m: &AffineTransform, factor: f32) -> AffineTransform {
    m.multiply(&AffineTransform::scaling(factor))
}

/// Compose `m` with a uniform scale about `origin`:
/// translate to origin, scale, translate back.
pub fn scale_about(m: &AffineTransform, origin: Point, factor: f32) -> AffineTransform {
    let m = translate(m, origin.x, origin.y);
    let m = scale(&m, factor);
    translate(&m, -origin.x, -origin.y)
}
