// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive descriptors and their fixed-size GPU records.

use bytemuck::{Pod, Zeroable};

use crate::{BBox, Vec2};

/// Index of a paint in the current scene slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PaintIndex(pub u32);

/// Index of an image known to the backend's texture manager.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImageIndex(pub u32);

/// Geometry of a primitive. Coordinates are in the primitive's local space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shape {
    /// Filled circle.
    Circle { center: Vec2, radius: f32 },
    /// Stroked arc. `rotation` and `aperture` hold `(sin, cos)` of the arc's
    /// orientation and of its half-aperture.
    Arc {
        center: Vec2,
        rotation: Vec2,
        aperture: Vec2,
        radius: f32,
        width: f32,
    },
    /// Filled rounded rectangle.
    Rect { min: Vec2, max: Vec2, radius: f32 },
    /// Stroked rounded rectangle.
    RectStroke {
        min: Vec2,
        max: Vec2,
        radius: f32,
        width: f32,
    },
    /// Single quadratic bezier stroke.
    Bezier { cvs: [Vec2; 3], width: f32 },
    /// Line segment stroke with round caps.
    Segment { a: Vec2, b: Vec2, width: f32 },
    /// Multi-segment quadratic stroke over `2 * count + 1` shared control
    /// vertices starting at `start`.
    Curve { start: u32, count: u32, width: f32 },
    /// Connector wire between two points.
    Wire { a: Vec2, b: Vec2, width: f32 },
    /// Glyph image quad sampled from the atlas.
    Glyph {
        min: Vec2,
        max: Vec2,
        region: u32,
        tex_bounds: BBox,
    },
    /// Path fill over `count` independent spans of three control vertices
    /// starting at `start`. `bounds` is the area the fill covers.
    PathFill { start: u32, count: u32, bounds: BBox },
}

impl Shape {
    pub fn kind(&self) -> PrimKind {
        match self {
            Self::Circle { .. } => PrimKind::Circle,
            Self::Arc { .. } => PrimKind::Arc,
            Self::Rect { .. } => PrimKind::Rect,
            Self::RectStroke { .. } => PrimKind::RectStroke,
            Self::Bezier { .. } => PrimKind::Bezier,
            Self::Segment { .. } => PrimKind::Segment,
            Self::Curve { .. } => PrimKind::Curve,
            Self::Wire { .. } => PrimKind::Wire,
            Self::Glyph { .. } => PrimKind::Glyph,
            Self::PathFill { .. } => PrimKind::PathFill,
        }
    }

    /// Range of shared control vertices this shape reads, if any.
    pub fn cv_range(&self) -> Option<std::ops::Range<usize>> {
        match *self {
            Self::Curve { start, count, .. } => {
                let start = start as usize;
                let len = if count == 0 { 0 } else { 2 * count as usize + 1 };
                Some(start..start + len)
            }
            Self::PathFill { start, count, .. } => {
                let start = start as usize;
                Some(start..start + 3 * count as usize)
            }
            _ => None,
        }
    }

    /// Moves a shape that reads shared control vertices so it reads them
    /// `offset` entries further along the buffer.
    pub(crate) fn offset_cvs(&mut self, offset: u32) {
        match self {
            Self::Curve { start, .. } | Self::PathFill { start, .. } => *start += offset,
            _ => {}
        }
    }

    fn clear_cvs(&mut self) {
        match self {
            Self::Curve { start, count, .. } | Self::PathFill { start, count, .. } => {
                *start = 0;
                *count = 0;
            }
            _ => {}
        }
    }
}

/// A drawable primitive: geometry plus the paint and transform it uses.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Prim {
    pub shape: Shape,
    pub paint: PaintIndex,
    pub xform: u32,
}

impl Prim {
    pub fn new(shape: Shape, paint: PaintIndex, xform: u32) -> Self {
        Self {
            shape,
            paint,
            xform,
        }
    }

    /// Checks the record invariants against the current buffer lengths.
    ///
    /// Invalid references are a caller bug: debug builds assert, release
    /// builds clamp them to index 0 (or to an empty control-vertex range).
    pub(crate) fn sanitize(&mut self, paint_count: usize, xform_count: usize, cv_count: usize) {
        debug_assert!(
            (self.paint.0 as usize) < paint_count,
            "paint index {} out of range {paint_count}",
            self.paint.0
        );
        debug_assert!(
            (self.xform as usize) < xform_count,
            "transform index {} out of range {xform_count}",
            self.xform
        );
        if self.paint.0 as usize >= paint_count {
            tracing::warn!(paint = self.paint.0, paint_count, "clamping invalid paint index");
            self.paint = PaintIndex(0);
        }
        if self.xform as usize >= xform_count {
            tracing::warn!(xform = self.xform, xform_count, "clamping invalid transform index");
            self.xform = 0;
        }
        if let Some(range) = self.shape.cv_range() {
            debug_assert!(
                range.end <= cv_count,
                "control vertices {range:?} out of range {cv_count}"
            );
            if range.end > cv_count {
                tracing::warn!(?range, cv_count, "dropping invalid control-vertex range");
                self.shape.clear_cvs();
            }
        }
    }
}

/// Primitive type tag stored in [`PrimRecord::kind`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PrimKind {
    Circle = 0,
    Arc = 1,
    Rect = 2,
    RectStroke = 3,
    Bezier = 4,
    Segment = 5,
    Curve = 6,
    Wire = 7,
    Glyph = 8,
    PathFill = 9,
}

impl PrimKind {
    pub fn from_u32(tag: u32) -> Option<Self> {
        Some(match tag {
            0 => Self::Circle,
            1 => Self::Arc,
            2 => Self::Rect,
            3 => Self::RectStroke,
            4 => Self::Bezier,
            5 => Self::Segment,
            6 => Self::Curve,
            7 => Self::Wire,
            8 => Self::Glyph,
            9 => Self::PathFill,
            _ => return None,
        })
    }
}

/// Fixed-size primitive record as laid out in a scene's primitive buffers.
///
/// Fields that a kind does not use are zero.
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PrimRecord {
    pub kind: u32,
    /// Stroke width.
    pub width: f32,
    /// Circle, arc or corner radius.
    pub radius: f32,
    /// Start of the shared control vertices.
    pub start: u32,
    /// Inline control vertices.
    pub cvs: [Vec2; 3],
    /// Number of spans for curves and path fills.
    pub count: u32,
    pub paint: u32,
    /// Glyph atlas region.
    pub glyph: u32,
    pub xform: u32,
    /// Area covered by the rasterized quad, in local space.
    pub quad_bounds: BBox,
    /// Atlas texels for glyphs.
    pub tex_bounds: BBox,
}

impl PrimRecord {
    pub fn encode(prim: &Prim, quad_bounds: BBox) -> Self {
        let mut record = Self {
            kind: prim.shape.kind() as u32,
            paint: prim.paint.0,
            xform: prim.xform,
            quad_bounds,
            ..Default::default()
        };
        match prim.shape {
            Shape::Circle { center, radius } => {
                record.cvs[0] = center;
                record.radius = radius;
            }
            Shape::Arc {
                center,
                rotation,
                aperture,
                radius,
                width,
            } => {
                record.cvs = [center, rotation, aperture];
                record.radius = radius;
                record.width = width;
            }
            Shape::Rect { min, max, radius } => {
                record.cvs[0] = min;
                record.cvs[1] = max;
                record.radius = radius;
            }
            Shape::RectStroke {
                min,
                max,
                radius,
                width,
            } => {
                record.cvs[0] = min;
                record.cvs[1] = max;
                record.radius = radius;
                record.width = width;
            }
            Shape::Bezier { cvs, width } => {
                record.cvs = cvs;
                record.width = width;
            }
            Shape::Segment { a, b, width } | Shape::Wire { a, b, width } => {
                record.cvs[0] = a;
                record.cvs[1] = b;
                record.width = width;
            }
            Shape::Curve {
                start,
                count,
                width,
            } => {
                record.start = start;
                record.count = count;
                record.width = width;
            }
            Shape::Glyph {
                min,
                max,
                region,
                tex_bounds,
            } => {
                record.cvs[0] = min;
                record.cvs[1] = max;
                record.glyph = region;
                record.tex_bounds = tex_bounds;
            }
            Shape::PathFill { start, count, .. } => {
                record.start = start;
                record.count = count;
            }
        }
        record
    }

    /// Rebuilds the primitive, or `None` for an unknown tag.
    pub fn decode(&self) -> Option<Prim> {
        let [c0, c1, c2] = self.cvs;
        let shape = match PrimKind::from_u32(self.kind)? {
            PrimKind::Circle => Shape::Circle {
                center: c0,
                radius: self.radius,
            },
            PrimKind::Arc => Shape::Arc {
                center: c0,
                rotation: c1,
                aperture: c2,
                radius: self.radius,
                width: self.width,
            },
            PrimKind::Rect => Shape::Rect {
                min: c0,
                max: c1,
                radius: self.radius,
            },
            PrimKind::RectStroke => Shape::RectStroke {
                min: c0,
                max: c1,
                radius: self.radius,
                width: self.width,
            },
            PrimKind::Bezier => Shape::Bezier {
                cvs: self.cvs,
                width: self.width,
            },
            PrimKind::Segment => Shape::Segment {
                a: c0,
                b: c1,
                width: self.width,
            },
            PrimKind::Curve => Shape::Curve {
                start: self.start,
                count: self.count,
                width: self.width,
            },
            PrimKind::Wire => Shape::Wire {
                a: c0,
                b: c1,
                width: self.width,
            },
            PrimKind::Glyph => Shape::Glyph {
                min: c0,
                max: c1,
                region: self.glyph,
                tex_bounds: self.tex_bounds,
            },
            PrimKind::PathFill => Shape::PathFill {
                start: self.start,
                count: self.count,
                bounds: self.quad_bounds,
            },
        };
        Some(Prim::new(shape, PaintIndex(self.paint), self.xform))
    }
}
