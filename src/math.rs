use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub};

/// Degrees-to-radians factor for the camera FOV and preset transforms.
pub const TO_RADIANS: f32 = std::f32::consts::PI / 180.0;

// ─── Vec3 ───────────────────────────────────────────────────────────────────

/// A 3-component single-precision vector used for positions, directions, and
/// surface normals throughout the ray tracer.
///
/// All arithmetic is implemented via operator overloading; the geometric
/// helpers (dot, cross, reflect, axis indexing) are the ones the intersection
/// kernels and the BVH builder lean on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

pub type Point3 = Vec3;

impl Vec3 {
    #[inline(always)]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline(always)]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[inline(always)]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    #[inline(always)]
    pub const fn unit_x() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    #[inline(always)]
    pub const fn unit_y() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    #[inline(always)]
    pub const fn unit_z() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    /// Squared Euclidean length — avoids the sqrt on hot paths such as the
    /// point-light falloff and the sphere kernel.
    #[inline(always)]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline(always)]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Normalizes in place and returns the length the vector had before.
    /// A zero vector is left untouched and reports length 0, so callers can
    /// branch on degenerate input instead of spreading NaNs.
    #[inline]
    pub fn normalize(&mut self) -> f32 {
        let len = self.length();
        if len > 0.0 {
            let inv = 1.0 / len;
            self.x *= inv;
            self.y *= inv;
            self.z *= inv;
        }
        len
    }

    /// Returns the unit vector without touching `self`. Same zero-vector
    /// contract as [`Vec3::normalize`].
    #[inline(always)]
    pub fn normalized(self) -> Self {
        let mut v = self;
        v.normalize();
        v
    }

    /// The standard Euclidean inner product, fundamental to every geometric
    /// query in the tracer (projection, culling, Lambert's cosine law).
    #[inline(always)]
    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Cross product — used for face normals, the Möller–Trumbore kernel, and
    /// the camera's orthonormal basis.
    #[inline(always)]
    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    /// Mirror reflection of `self` about the surface normal `n`:
    /// `r = i - 2·dot(n, i)·n`.
    #[inline(always)]
    pub fn reflect(self, normal: Self) -> Self {
        self - normal * (2.0 * self.dot(normal))
    }

    /// Component-wise minimum — grows AABBs during BVH construction.
    #[inline(always)]
    pub fn min(self, rhs: Self) -> Self {
        Self::new(self.x.min(rhs.x), self.y.min(rhs.y), self.z.min(rhs.z))
    }

    /// Component-wise maximum.
    #[inline(always)]
    pub fn max(self, rhs: Self) -> Self {
        Self::new(self.x.max(rhs.x), self.y.max(rhs.y), self.z.max(rhs.z))
    }

    /// Reciprocal of every component. Zeros map to ±∞, which is exactly what
    /// the slab test wants from an axis-aligned ray direction.
    #[inline(always)]
    pub fn recip(self) -> Self {
        Self::new(1.0 / self.x, 1.0 / self.y, 1.0 / self.z)
    }

    #[inline(always)]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, t: f32) -> Self {
        Self::new(self.x * t, self.y * t, self.z * t)
    }
}

impl Mul<Vec3> for f32 {
    type Output = Vec3;
    #[inline(always)]
    fn mul(self, v: Vec3) -> Vec3 {
        v * self
    }
}

impl MulAssign<f32> for Vec3 {
    #[inline(always)]
    fn mul_assign(&mut self, t: f32) {
        self.x *= t;
        self.y *= t;
        self.z *= t;
    }
}

impl Div<f32> for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn div(self, t: f32) -> Self {
        let inv = 1.0 / t;
        Self::new(self.x * inv, self.y * inv, self.z * inv)
    }
}

impl DivAssign<f32> for Vec3 {
    #[inline(always)]
    fn div_assign(&mut self, t: f32) {
        let inv = 1.0 / t;
        self.x *= inv;
        self.y *= inv;
        self.z *= inv;
    }
}

impl Index<usize> for Vec3 {
    type Output = f32;
    #[inline(always)]
    fn index(&self, axis: usize) -> &f32 {
        match axis {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec3 axis out of bounds: {axis}"),
        }
    }
}

impl IndexMut<usize> for Vec3 {
    #[inline(always)]
    fn index_mut(&mut self, axis: usize) -> &mut f32 {
        match axis {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("Vec3 axis out of bounds: {axis}"),
        }
    }
}

// ─── ColorRGB ───────────────────────────────────────────────────────────────

/// A linear-light RGB triple. Lighting accumulates unbounded values here;
/// [`ColorRGB::max_to_one`] rescales and [`ColorRGB::to_rgb8`] quantizes for
/// the 32-bit framebuffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRGB {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ColorRGB {
    pub const BLACK: ColorRGB = ColorRGB::new(0.0, 0.0, 0.0);
    pub const WHITE: ColorRGB = ColorRGB::new(1.0, 1.0, 1.0);

    #[inline(always)]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// A gray value — the observed-area debug mode renders cosine terms
    /// through this.
    #[inline(always)]
    pub const fn gray(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Rescales so the brightest channel becomes 1 when any channel exceeds
    /// it. Preserves hue where a plain clamp would shift it.
    #[inline]
    pub fn max_to_one(self) -> Self {
        let max = self.r.max(self.g).max(self.b);
        if max > 1.0 {
            self / max
        } else {
            self
        }
    }

    /// Clamps each channel to [0, 1] and rounds to 8-bit storage. No gamma
    /// curve is applied; the framebuffer stores linear light.
    #[inline]
    pub fn to_rgb8(self) -> (u8, u8, u8) {
        (
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
        )
    }
}

impl Add for ColorRGB {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl AddAssign for ColorRGB {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        self.r += rhs.r;
        self.g += rhs.g;
        self.b += rhs.b;
    }
}

impl Sub for ColorRGB {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.r - rhs.r, self.g - rhs.g, self.b - rhs.b)
    }
}

impl Mul for ColorRGB {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}

impl Mul<f32> for ColorRGB {
    type Output = Self;
    #[inline(always)]
    fn mul(self, t: f32) -> Self {
        Self::new(self.r * t, self.g * t, self.b * t)
    }
}

impl Mul<ColorRGB> for f32 {
    type Output = ColorRGB;
    #[inline(always)]
    fn mul(self, c: ColorRGB) -> ColorRGB {
        c * self
    }
}

impl MulAssign for ColorRGB {
    #[inline(always)]
    fn mul_assign(&mut self, rhs: Self) {
        self.r *= rhs.r;
        self.g *= rhs.g;
        self.b *= rhs.b;
    }
}

impl Div<f32> for ColorRGB {
    type Output = Self;
    #[inline(always)]
    fn div(self, t: f32) -> Self {
        let inv = 1.0 / t;
        Self::new(self.r * inv, self.g * inv, self.b * inv)
    }
}

// ─── Mat4 ───────────────────────────────────────────────────────────────────

/// A row-major affine transform. Rows 0..3 hold the right/up/forward basis,
/// row 3 the translation; vectors multiply from the left (`v' = v · M`), so
/// `a * b` applies `a` first.
///
/// The camera-to-world matrix and every mesh TRS transform are built from
/// these factories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub rows: [[f32; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Builds a transform from an explicit basis plus origin, e.g. the
    /// camera-to-world matrix `[right | up | forward | origin]`.
    pub fn from_axes(right: Vec3, up: Vec3, forward: Vec3, origin: Point3) -> Self {
        Self {
            rows: [
                [right.x, right.y, right.z, 0.0],
                [up.x, up.y, up.z, 0.0],
                [forward.x, forward.y, forward.z, 0.0],
                [origin.x, origin.y, origin.z, 1.0],
            ],
        }
    }

    pub fn translation(t: Vec3) -> Self {
        let mut m = Mat4::IDENTITY;
        m.rows[3] = [t.x, t.y, t.z, 1.0];
        m
    }

    pub fn rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            rows: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, c, s, 0.0],
                [0.0, -s, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            rows: [
                [c, 0.0, -s, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [s, 0.0, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            rows: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn scaling(s: Vec3) -> Self {
        Self {
            rows: [
                [s.x, 0.0, 0.0, 0.0],
                [0.0, s.y, 0.0, 0.0],
                [0.0, 0.0, s.z, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn uniform_scaling(s: f32) -> Self {
        Self::scaling(Vec3::splat(s))
    }

    /// Transforms a position: translation row included.
    #[inline]
    pub fn transform_point(&self, p: Point3) -> Point3 {
        let r = &self.rows;
        Point3::new(
            p.x * r[0][0] + p.y * r[1][0] + p.z * r[2][0] + r[3][0],
            p.x * r[0][1] + p.y * r[1][1] + p.z * r[2][1] + r[3][1],
            p.x * r[0][2] + p.y * r[1][2] + p.z * r[2][2] + r[3][2],
        )
    }

    /// Transforms a direction: the translation row is skipped.
    #[inline]
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        let r = &self.rows;
        Vec3::new(
            v.x * r[0][0] + v.y * r[1][0] + v.z * r[2][0],
            v.x * r[0][1] + v.y * r[1][1] + v.z * r[2][1],
            v.x * r[0][2] + v.y * r[1][2] + v.z * r[2][2],
        )
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    /// Composition under the row-vector convention: `(a * b)` transforms by
    /// `a`, then by `b`.
    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for (i, row) in self.rows.iter().enumerate() {
            for j in 0..4 {
                out[i][j] = row[0] * rhs.rows[0][j]
                    + row[1] * rhs.rows[1][j]
                    + row[2] * rhs.rows[2][j]
                    + row[3] * rhs.rows[3][j];
            }
        }
        Mat4 { rows: out }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
