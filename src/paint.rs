// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use bytemuck::{Pod, Zeroable};

use crate::{ImageIndex, Transform, Vec2};

/// Linear RGBA color, laid out as a `float4`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn mix(self, other: Self, t: f32) -> Self {
        let s = 1.0 - t;
        Self::new(
            self.r * s + other.r * t,
            self.g * s + other.g * t,
            self.b * s + other.b * t,
            self.a * s + other.a * t,
        )
    }

    /// Component-wise product.
    pub fn tint(self, other: Self) -> Self {
        Self::new(
            self.r * other.r,
            self.g * other.g,
            self.b * other.b,
            self.a * other.a,
        )
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

impl From<peniko::Color> for Color {
    fn from(color: peniko::Color) -> Self {
        color.components.into()
    }
}

/// Source of texels for image patterns. Textures live with the rendering
/// backend; CPU-side evaluation goes through this trait.
pub trait TextureSampler {
    fn sample(&self, image: ImageIndex, uv: Vec2) -> Color;
}

/// Sampler for scenes without images. Every texel is transparent.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoTextures;

impl TextureSampler for NoTextures {
    fn sample(&self, _image: ImageIndex, _uv: Vec2) -> Color {
        Color::TRANSPARENT
    }
}

/// A shading rule mapping local-space points to colors.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Paint {
    /// Blends `inner_color` at `start` to `outer_color` at `end`, constant
    /// beyond either end.
    LinearGradient {
        start: Vec2,
        end: Vec2,
        inner_color: Color,
        outer_color: Color,
        glow: bool,
    },
    /// Blends between the two radii around `center`.
    RadialGradient {
        center: Vec2,
        inner_radius: f32,
        outer_radius: f32,
        inner_color: Color,
        outer_color: Color,
        glow: bool,
    },
    /// Image placed at `origin` with extent `size`, rotated by `angle`.
    ImagePattern {
        origin: Vec2,
        size: Vec2,
        angle: f32,
        image: ImageIndex,
        alpha: f32,
        flip_y: bool,
        glow: bool,
    },
}

impl Paint {
    /// A constant color.
    pub fn solid(color: Color) -> Self {
        Self::LinearGradient {
            start: Vec2::ZERO,
            end: Vec2::ZERO,
            inner_color: color,
            outer_color: color,
            glow: false,
        }
    }

    pub fn encode(&self) -> PaintRecord {
        match *self {
            Self::LinearGradient {
                start,
                end,
                inner_color,
                outer_color,
                glow,
            } => {
                let mut d = end - start;
                if d.length() < 1.0e-4 {
                    d = Vec2::new(0.0, 1.0);
                }
                // Maps start to x = 0 and end to x = 1.
                let to_gradient = Transform::from_cols(d, d.rot90(), start)
                    .inverse()
                    .unwrap_or(Transform::IDENTITY);
                PaintRecord {
                    xform: to_gradient,
                    inner_color,
                    outer_color,
                    kind: PaintKind::Linear as u32,
                    glow: glow as u32,
                    ..Default::default()
                }
            }
            Self::RadialGradient {
                center,
                inner_radius,
                outer_radius,
                inner_color,
                outer_color,
                glow,
            } => PaintRecord {
                xform: Transform::translation(-center),
                inner_color,
                outer_color,
                radii: [inner_radius, outer_radius],
                kind: PaintKind::Radial as u32,
                glow: glow as u32,
                ..Default::default()
            },
            Self::ImagePattern {
                origin,
                size,
                angle,
                image,
                alpha,
                flip_y,
                glow,
            } => {
                let to_world = Transform::translation(origin)
                    * Transform::rotation(angle)
                    * Transform::scaling(size);
                let to_uv = to_world.inverse().unwrap_or_else(|| {
                    tracing::warn!(?size, "degenerate image pattern size");
                    Transform::translation(-origin)
                });
                PaintRecord {
                    xform: to_uv,
                    inner_color: Color::new(1.0, 1.0, 1.0, alpha),
                    outer_color: Color::new(1.0, 1.0, 1.0, alpha),
                    kind: PaintKind::Image as u32,
                    glow: glow as u32,
                    image: image.0,
                    flip_y: flip_y as u32,
                    ..Default::default()
                }
            }
        }
    }
}

/// Paint type tag stored in [`PaintRecord::kind`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum PaintKind {
    Linear = 0,
    Radial = 1,
    Image = 2,
}

/// Paint as laid out in a scene's paint buffer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PaintRecord {
    /// Maps local space into gradient or pattern space.
    pub xform: Transform,
    pub inner_color: Color,
    pub outer_color: Color,
    /// Inner and outer radius of radial gradients.
    pub radii: [f32; 2],
    pub kind: u32,
    /// Non-zero when the paint renders into the glow layer.
    pub glow: u32,
    pub image: u32,
    pub flip_y: u32,
}

impl PaintRecord {
    pub fn is_glow(&self) -> bool {
        self.glow != 0
    }

    /// Color of the paint at local-space point `p`.
    pub fn apply<S: TextureSampler + ?Sized>(&self, p: Vec2, textures: &S) -> Color {
        let q = self.xform.transform_point(p);
        match self.kind {
            k if k == PaintKind::Radial as u32 => {
                let [inner, outer] = self.radii;
                let r = q.length();
                let t = if outer > inner {
                    ((r - inner) / (outer - inner)).clamp(0.0, 1.0)
                } else if r < inner {
                    0.0
                } else {
                    1.0
                };
                self.inner_color.mix(self.outer_color, t)
            }
            k if k == PaintKind::Image as u32 => {
                let uv = if self.flip_y != 0 {
                    Vec2::new(q.x, 1.0 - q.y)
                } else {
                    q
                };
                textures
                    .sample(ImageIndex(self.image), uv)
                    .tint(self.inner_color)
            }
            _ => {
                let t = q.x.clamp(0.0, 1.0);
                self.inner_color.mix(self.outer_color, t)
            }
        }
    }
}
