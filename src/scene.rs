// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::paint::TextureSampler;
use crate::{
    BufferSizes, Color, GpuVec, Paint, PaintIndex, PaintRecord, Prim, PrimRecord, Transform, Vec2,
    sdf,
};

/// One frame's worth of drawing commands.
///
/// Primitives go into one of several layers; control vertices, transforms
/// and paints are shared by all layers and referenced by index. Every scene
/// starts with transform 0 set to the identity and paint 0 set to a
/// transparent color.
pub struct Scene {
    layers: Vec<GpuVec<PrimRecord>>,
    cvs: GpuVec<Vec2>,
    xforms: GpuVec<Transform>,
    paints: GpuVec<PaintRecord>,
}

impl Scene {
    pub fn new(layer_count: usize, sizes: &BufferSizes) -> Self {
        let mut scene = Self {
            layers: (0..layer_count.max(1))
                .map(|_| GpuVec::new("prims", sizes.prims, sizes.max_bytes))
                .collect(),
            cvs: GpuVec::new("cvs", sizes.cvs, sizes.max_bytes),
            xforms: GpuVec::new("xforms", sizes.xforms, sizes.max_bytes),
            paints: GpuVec::new("paints", sizes.paints, sizes.max_bytes),
        };
        scene.reset();
        scene
    }

    /// Empties every buffer, keeping capacity, and re-adds the reserved
    /// transform and paint.
    pub fn reset(&mut self) {
        for layer in &mut self.layers {
            layer.clear();
        }
        self.cvs.clear();
        self.xforms.clear();
        self.paints.clear();
        self.xforms.push(Transform::IDENTITY);
        self.paints.push(Paint::solid(Color::TRANSPARENT).encode());
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Appends `prim` to `layer`, returning its index within the layer.
    ///
    /// Out-of-range references are clamped (see [`Prim`]); `None` means the
    /// layer buffer is saturated and the primitive was dropped.
    pub fn push_prim(&mut self, layer: usize, mut prim: Prim) -> Option<u32> {
        prim.sanitize(self.paints.len(), self.xforms.len(), self.cvs.len());
        let quad_bounds = sdf::bounds(&prim.shape, self.cvs.as_slice());
        let record = PrimRecord::encode(&prim, quad_bounds);
        let layer = layer.min(self.layers.len() - 1);
        self.layers[layer].push(record)
    }

    /// Appends control vertices, returning the index of the first one.
    pub fn push_cvs(&mut self, cvs: &[Vec2]) -> Option<u32> {
        self.cvs.extend_from_slice(cvs)
    }

    pub fn push_xform(&mut self, xform: Transform) -> Option<u32> {
        self.xforms.push(xform)
    }

    pub fn push_paint(&mut self, paint: &Paint) -> Option<PaintIndex> {
        self.paints.push(paint.encode()).map(PaintIndex)
    }

    pub fn prims(&self, layer: usize) -> &[PrimRecord] {
        self.layers.get(layer).map_or(&[], |l| l.as_slice())
    }

    /// Primitive buffer of `layer`, for upload.
    pub fn layer(&self, layer: usize) -> Option<&GpuVec<PrimRecord>> {
        self.layers.get(layer)
    }

    pub fn cvs(&self) -> &GpuVec<Vec2> {
        &self.cvs
    }

    pub fn xforms(&self) -> &GpuVec<Transform> {
        &self.xforms
    }

    pub fn paints(&self) -> &GpuVec<PaintRecord> {
        &self.paints
    }

    /// Decoded primitive `index` of `layer`.
    pub fn prim(&self, layer: usize, index: usize) -> Option<Prim> {
        self.layers.get(layer)?.get(index)?.decode()
    }

    /// Maps a point into the local space of a primitive.
    fn to_local(&self, prim: &Prim, p: Vec2) -> Option<Vec2> {
        let xform = self.xforms.get(prim.xform as usize)?;
        Some(xform.inverse()?.transform_point(p))
    }

    /// Signed distance from scene-space point `p` to primitive `index` of
    /// `layer`.
    pub fn distance(&self, layer: usize, index: usize, p: Vec2) -> Option<f32> {
        let prim = self.prim(layer, index)?;
        let local = self.to_local(&prim, p)?;
        Some(sdf::distance(&prim.shape, self.cvs.as_slice(), local))
    }

    /// Paint color of primitive `index` of `layer` at scene-space point `p`,
    /// ignoring coverage.
    pub fn color(
        &self,
        layer: usize,
        index: usize,
        p: Vec2,
        textures: &impl TextureSampler,
    ) -> Option<Color> {
        let prim = self.prim(layer, index)?;
        let local = self.to_local(&prim, p)?;
        let paint = self.paints.get(prim.paint.0 as usize)?;
        Some(paint.apply(local, textures))
    }
}
