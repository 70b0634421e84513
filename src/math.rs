// Copyright 2022 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use bytemuck::{Pod, Zeroable};
use peniko::kurbo;

/// Two-component float vector, laid out as a `float2` on the GPU.
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (determinant of the two vectors).
    pub fn cross(self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Unit vector in the same direction, or zero for a zero-length vector.
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > 0.0 { self / len } else { Self::ZERO }
    }

    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    pub fn mix(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    /// Counter-clockwise perpendicular.
    pub fn rot90(self) -> Self {
        Self::new(-self.y, self.x)
    }

    pub fn mul_elem(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y)
    }

    pub fn div_elem(self, other: Self) -> Self {
        Self::new(self.x / other.x, self.y / other.y)
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;

    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<[f32; 2]> for Vec2 {
    fn from(v: [f32; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<kurbo::Point> for Vec2 {
    fn from(point: kurbo::Point) -> Self {
        Self::new(point.x as f32, point.y as f32)
    }
}

/// Axis-aligned bounding box.
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BBox {
    pub min: Vec2,
    pub max: Vec2,
}

impl BBox {
    /// An inverted box that any `union_point` call will replace.
    pub const EMPTY: Self = Self {
        min: Vec2::splat(f32::MAX),
        max: Vec2::splat(f32::MIN),
    };

    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[Vec2]) -> Self {
        points
            .iter()
            .fold(Self::EMPTY, |b, &p| b.union_point(p))
    }

    pub fn union_point(self, p: Vec2) -> Self {
        Self::new(self.min.min(p), self.max.max(p))
    }

    pub fn union(self, other: Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Shrinks the box by `d` on every side. Negative values grow it.
    pub fn inset(self, d: f32) -> Self {
        Self::new(self.min + Vec2::splat(d), self.max - Vec2::splat(d))
    }

    pub fn size(self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn is_empty(self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn contains(self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn translate(self, offset: Vec2) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }
}

/// Oriented bounding box: `origin` plus the two edge vectors `u` and `v`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Obb {
    pub origin: Vec2,
    pub u: Vec2,
    pub v: Vec2,
}

impl Obb {
    pub fn inset(self, d: f32) -> Self {
        let un = self.u.normalize();
        let vn = self.v.normalize();
        Self {
            origin: self.origin + (un + vn) * d,
            u: self.u - un * (2.0 * d),
            v: self.v - vn * (2.0 * d),
        }
    }

    pub fn corners(self) -> [Vec2; 4] {
        [
            self.origin,
            self.origin + self.u,
            self.origin + self.u + self.v,
            self.origin + self.v,
        ]
    }
}

/// Affine transformation matrix.
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Transform {
    /// 2x2 matrix, column major.
    pub matrix: [f32; 4],
    /// Translation.
    pub translation: [f32; 2],
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        matrix: [1.0, 0.0, 0.0, 1.0],
        translation: [0.0; 2],
    };

    pub fn translation(t: Vec2) -> Self {
        Self {
            matrix: [1.0, 0.0, 0.0, 1.0],
            translation: [t.x, t.y],
        }
    }

    pub fn scaling(s: Vec2) -> Self {
        Self {
            matrix: [s.x, 0.0, 0.0, s.y],
            translation: [0.0; 2],
        }
    }

    /// Counter-clockwise rotation by `angle` radians.
    pub fn rotation(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            matrix: [c, s, -s, c],
            translation: [0.0; 2],
        }
    }

    /// Builds a transform from its column vectors and translation.
    pub fn from_cols(x_axis: Vec2, y_axis: Vec2, translation: Vec2) -> Self {
        Self {
            matrix: [x_axis.x, x_axis.y, y_axis.x, y_axis.y],
            translation: [translation.x, translation.y],
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        let m = &self.matrix;
        Vec2::new(
            m[0] * p.x + m[2] * p.y + self.translation[0],
            m[1] * p.x + m[3] * p.y + self.translation[1],
        )
    }

    pub fn transform_vector(&self, v: Vec2) -> Vec2 {
        let m = &self.matrix;
        Vec2::new(m[0] * v.x + m[2] * v.y, m[1] * v.x + m[3] * v.y)
    }

    pub fn determinant(&self) -> f32 {
        self.matrix[0] * self.matrix[3] - self.matrix[2] * self.matrix[1]
    }

    /// Inverse transform, or `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < 1.0e-12 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        let m = &self.matrix;
        let matrix = [
            m[3] * inv_det,
            -m[1] * inv_det,
            -m[2] * inv_det,
            m[0] * inv_det,
        ];
        let t = self.translation;
        let translation = [
            -(matrix[0] * t[0] + matrix[2] * t[1]),
            -(matrix[1] * t[0] + matrix[3] * t[1]),
        ];
        Some(Self {
            matrix,
            translation,
        })
    }

    /// Creates a transform from a kurbo affine matrix.
    pub fn from_kurbo(transform: &kurbo::Affine) -> Self {
        let c = transform.as_coeffs().map(|x| x as f32);
        Self {
            matrix: [c[0], c[1], c[2], c[3]],
            translation: [c[4], c[5]],
        }
    }

    /// Converts the transform to a kurbo affine matrix.
    pub fn to_kurbo(&self) -> kurbo::Affine {
        kurbo::Affine::new(
            [
                self.matrix[0],
                self.matrix[1],
                self.matrix[2],
                self.matrix[3],
                self.translation[0],
                self.translation[1],
            ]
            .map(|x| x as f64),
        )
    }
}

impl Mul for Transform {
    type Output = Self;

    #[inline]
    fn mul(self, other: Self) -> Self {
        Self {
            matrix: [
                self.matrix[0] * other.matrix[0] + self.matrix[2] * other.matrix[1],
                self.matrix[1] * other.matrix[0] + self.matrix[3] * other.matrix[1],
                self.matrix[0] * other.matrix[2] + self.matrix[2] * other.matrix[3],
                self.matrix[1] * other.matrix[2] + self.matrix[3] * other.matrix[3],
            ],
            translation: [
                self.matrix[0] * other.translation[0]
                    + self.matrix[2] * other.translation[1]
                    + self.translation[0],
                self.matrix[1] * other.translation[0]
                    + self.matrix[3] * other.translation[1]
                    + self.translation[1],
            ],
        }
    }
}
