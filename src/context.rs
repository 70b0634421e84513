// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::glyph_cache::GlyphPathCache;
use crate::text::{TextLayoutCache, TextLayoutKey, run_bounds};
use crate::{
    Align, BBox, Color, Error, GlyphAtlas, GlyphId, ImageIndex, Paint, PaintIndex, PathBuilder,
    PathScanner, Prim, RenderConfig, Scene, Shape, TextShaper, Transform, Vec2,
};

/// A completed scene handed to the rendering backend.
#[derive(Clone, Copy)]
pub struct Frame<'a> {
    pub scene: &'a Scene,
    pub window_size: Vec2,
    pub device_px_ratio: f32,
    /// Frame counter value the scene was built in.
    pub index: u64,
}

#[derive(Copy, Clone, Debug)]
struct TransformState {
    xform: Transform,
    /// Index of `xform` in the current scene, once appended.
    index: Option<u32>,
}

impl TransformState {
    const IDENTITY: Self = Self {
        xform: Transform::IDENTITY,
        index: Some(0),
    };
}

/// Drawing context owning a ring of scene slots.
///
/// Each frame is bracketed by [`begin`](Self::begin) and
/// [`submit`](Self::submit). Drawing calls between them append to the
/// current slot; `submit` hands that slot to the caller and moves on to the
/// next one. A slot is cleared when the ring comes back around to it, so the
/// backend must be done with a frame within `slot_count - 1` frames.
pub struct Context {
    slots: Vec<Scene>,
    current: usize,
    frame: u64,
    in_frame: bool,
    window_size: Vec2,
    device_px_ratio: f32,
    layer: usize,
    transform: TransformState,
    saved: Vec<TransformState>,
    path: PathBuilder,
    scanner: PathScanner,
    scratch_cvs: Vec<Vec2>,
    scratch_fills: Vec<Shape>,
    text_cache: TextLayoutCache,
    glyph_paths: GlyphPathCache,
    atlas: GlyphAtlas,
}

impl Default for Context {
    fn default() -> Self {
        Self::with_config(&RenderConfig::default())
    }
}

impl Context {
    pub fn new(config: &RenderConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: &RenderConfig) -> Self {
        Self {
            slots: (0..config.slot_count.max(1))
                .map(|_| Scene::new(config.layer_count, &config.buffer_sizes))
                .collect(),
            current: 0,
            frame: 1,
            in_frame: false,
            window_size: Vec2::ZERO,
            device_px_ratio: 1.0,
            layer: 0,
            transform: TransformState::IDENTITY,
            saved: Vec::new(),
            path: PathBuilder::new(),
            scanner: PathScanner::new(),
            scratch_cvs: Vec::new(),
            scratch_fills: Vec::new(),
            text_cache: TextLayoutCache::new(),
            glyph_paths: GlyphPathCache::new(),
            atlas: GlyphAtlas::new(config.atlas_size, config.glyph_padding),
        }
    }

    /// Starts a frame, clearing the current slot.
    pub fn begin(&mut self, window_width: f32, window_height: f32, device_px_ratio: f32) {
        if self.in_frame {
            tracing::warn!(frame = self.frame, "begin called twice without submit");
        }
        if device_px_ratio != self.device_px_ratio {
            // Cached layouts reference atlas regions sized for the old ratio.
            self.text_cache.clear();
            self.atlas.clear();
        }
        self.window_size = Vec2::new(window_width, window_height);
        self.device_px_ratio = device_px_ratio;
        self.slots[self.current].reset();
        self.transform = TransformState::IDENTITY;
        self.saved.clear();
        self.layer = 0;
        self.path.clear();
        self.in_frame = true;
        tracing::debug!(frame = self.frame, slot = self.current, "begin frame");
    }

    /// Ends the frame. Drops cached text layouts not used during it and
    /// advances to the next slot.
    pub fn submit(&mut self) -> Frame<'_> {
        if !self.in_frame {
            tracing::warn!(frame = self.frame, "submit called without begin");
        }
        if !self.saved.is_empty() {
            tracing::warn!(depth = self.saved.len(), "unbalanced save at end of frame");
        }
        self.text_cache.prune(self.frame);
        let slot = self.current;
        let index = self.frame;
        self.current = (self.current + 1) % self.slots.len();
        self.frame += 1;
        self.in_frame = false;
        tracing::debug!(frame = index, slot, "submit frame");
        Frame {
            scene: &self.slots[slot],
            window_size: self.window_size,
            device_px_ratio: self.device_px_ratio,
            index,
        }
    }

    /// The slot being written.
    pub fn scene(&self) -> &Scene {
        &self.slots[self.current]
    }

    /// Index of the frame being built. Starts at 1.
    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    pub fn current_slot(&self) -> usize {
        self.current
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn text_cache(&self) -> &TextLayoutCache {
        &self.text_cache
    }

    pub fn glyph_path_cache(&self) -> &GlyphPathCache {
        &self.glyph_paths
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    /// Selects the layer subsequent primitives go to.
    pub fn set_layer(&mut self, layer: usize) {
        let count = self.slots[self.current].layer_count();
        debug_assert!(layer < count, "layer {layer} out of range {count}");
        self.layer = layer.min(count - 1);
    }

    pub fn layer(&self) -> usize {
        self.layer
    }

    // Transforms

    pub fn save(&mut self) {
        self.saved.push(self.transform);
    }

    pub fn restore(&mut self) {
        match self.saved.pop() {
            Some(state) => self.transform = state,
            None => tracing::warn!("restore without matching save"),
        }
    }

    pub fn translate(&mut self, t: Vec2) {
        self.concat(Transform::translation(t));
    }

    pub fn scale(&mut self, s: Vec2) {
        self.concat(Transform::scaling(s));
    }

    /// Rotates counter-clockwise by `angle` radians.
    pub fn rotate(&mut self, angle: f32) {
        self.concat(Transform::rotation(angle));
    }

    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        self.transform.xform.transform_point(p)
    }

    pub fn current_transform(&self) -> Transform {
        self.transform.xform
    }

    fn concat(&mut self, xform: Transform) {
        self.transform = TransformState {
            xform: self.transform.xform * xform,
            index: None,
        };
    }

    /// Scene index of the current transform, appending it on first use.
    fn xform_index(&mut self) -> u32 {
        if let Some(index) = self.transform.index {
            return index;
        }
        let index = self.slots[self.current]
            .push_xform(self.transform.xform)
            .unwrap_or(0);
        self.transform.index = Some(index);
        index
    }

    // Paints

    fn push_paint(&mut self, paint: Paint) -> PaintIndex {
        self.slots[self.current]
            .push_paint(&paint)
            .unwrap_or_default()
    }

    pub fn color_paint(&mut self, color: impl Into<Color>) -> PaintIndex {
        self.push_paint(Paint::solid(color.into()))
    }

    pub fn linear_gradient(
        &mut self,
        start: Vec2,
        end: Vec2,
        inner_color: Color,
        outer_color: Color,
        glow: bool,
    ) -> PaintIndex {
        self.push_paint(Paint::LinearGradient {
            start,
            end,
            inner_color,
            outer_color,
            glow,
        })
    }

    pub fn radial_gradient(
        &mut self,
        center: Vec2,
        inner_radius: f32,
        outer_radius: f32,
        inner_color: Color,
        outer_color: Color,
        glow: bool,
    ) -> PaintIndex {
        self.push_paint(Paint::RadialGradient {
            center,
            inner_radius,
            outer_radius,
            inner_color,
            outer_color,
            glow,
        })
    }

    pub fn image_pattern(
        &mut self,
        origin: Vec2,
        size: Vec2,
        angle: f32,
        image: ImageIndex,
        alpha: f32,
        flip_y: bool,
    ) -> PaintIndex {
        self.push_paint(Paint::ImagePattern {
            origin,
            size,
            angle,
            image,
            alpha,
            flip_y,
            glow: false,
        })
    }

    // Primitives

    fn push_shape(&mut self, shape: Shape, paint: PaintIndex) {
        let xform = self.xform_index();
        let layer = self.layer;
        self.slots[self.current].push_prim(layer, Prim::new(shape, paint, xform));
    }

    pub fn fill_circle(&mut self, center: Vec2, radius: f32, paint: PaintIndex) {
        self.push_shape(Shape::Circle { center, radius }, paint);
    }

    /// Strokes the arc of `radius` around `center` whose middle points in
    /// direction `rotation` and which spans `aperture` radians to either
    /// side.
    pub fn stroke_arc(
        &mut self,
        center: Vec2,
        radius: f32,
        width: f32,
        rotation: f32,
        aperture: f32,
        paint: PaintIndex,
    ) {
        let (rs, rc) = rotation.sin_cos();
        let (as_, ac) = aperture.sin_cos();
        self.push_shape(
            Shape::Arc {
                center,
                rotation: Vec2::new(rs, rc),
                aperture: Vec2::new(as_, ac),
                radius,
                width,
            },
            paint,
        );
    }

    pub fn fill_rect(&mut self, min: Vec2, max: Vec2, radius: f32, paint: PaintIndex) {
        self.push_shape(Shape::Rect { min, max, radius }, paint);
    }

    pub fn stroke_rect(&mut self, min: Vec2, max: Vec2, radius: f32, width: f32, paint: PaintIndex) {
        self.push_shape(
            Shape::RectStroke {
                min,
                max,
                radius,
                width,
            },
            paint,
        );
    }

    pub fn stroke_bezier(&mut self, a: Vec2, b: Vec2, c: Vec2, width: f32, paint: PaintIndex) {
        self.push_shape(
            Shape::Bezier {
                cvs: [a, b, c],
                width,
            },
            paint,
        );
    }

    pub fn stroke_segment(&mut self, a: Vec2, b: Vec2, width: f32, paint: PaintIndex) {
        self.push_shape(Shape::Segment { a, b, width }, paint);
    }

    pub fn stroke_wire(&mut self, a: Vec2, b: Vec2, width: f32, paint: PaintIndex) {
        self.push_shape(Shape::Wire { a, b, width }, paint);
    }

    /// Strokes consecutive quadratics sharing end points: `cvs` holds
    /// `2 * n + 1` vertices for `n` spans. A trailing unpaired vertex is
    /// ignored.
    pub fn stroke_curve(&mut self, cvs: &[Vec2], width: f32, paint: PaintIndex) {
        let count = cvs.len().saturating_sub(1) / 2;
        if count == 0 {
            return;
        }
        let Some(start) = self.slots[self.current].push_cvs(&cvs[..2 * count + 1]) else {
            return;
        };
        self.push_shape(
            Shape::Curve {
                start,
                count: count as u32,
                width,
            },
            paint,
        );
    }

    // Paths

    pub fn move_to(&mut self, p: Vec2) {
        self.path.move_to(p);
    }

    pub fn line_to(&mut self, p: Vec2) {
        self.path.line_to(p);
    }

    pub fn quad_to(&mut self, b: Vec2, c: Vec2) {
        self.path.quad_to(b, c);
    }

    pub fn cubic_approx_to(&mut self, b: Vec2, c: Vec2, d: Vec2) {
        self.path.cubic_approx_to(b, c, d);
    }

    pub fn close_path(&mut self) {
        self.path.close_path();
    }

    /// Fills the current path with the even-odd rule and clears it.
    ///
    /// The path is split into horizontal bands, each drawn as a separate
    /// path-fill primitive over only the spans crossing it.
    pub fn fill(&mut self, paint: PaintIndex) {
        self.path.close_all();
        self.scanner.begin(self.path.contours());
        self.scratch_cvs.clear();
        self.scratch_fills.clear();
        self.scanner
            .fill_bands(&mut self.scratch_cvs, &mut self.scratch_fills);
        self.path.clear();
        self.flush_fills(paint);
    }

    /// Appends the band fills collected in the scratch buffers.
    fn flush_fills(&mut self, paint: PaintIndex) {
        let fills = std::mem::take(&mut self.scratch_fills);
        let cvs = std::mem::take(&mut self.scratch_cvs);
        self.push_fills(&cvs, &fills, paint);
        self.scratch_cvs = cvs;
        self.scratch_fills = fills;
    }

    fn push_fills(&mut self, cvs: &[Vec2], fills: &[Shape], paint: PaintIndex) {
        if fills.is_empty() {
            return;
        }
        let Some(base) = self.slots[self.current].push_cvs(cvs) else {
            return;
        };
        for &fill in fills {
            let mut shape = fill;
            shape.offset_cvs(base);
            self.push_shape(shape, paint);
        }
    }

    // Text

    /// Draws a single line of text at the origin of the current transform.
    pub fn text<S: TextShaper + ?Sized>(
        &mut self,
        shaper: &S,
        text: &str,
        size: f32,
        align: Align,
        paint: PaintIndex,
    ) {
        self.render_text(shaper, text, size, align, None, paint);
    }

    /// Draws text wrapped at `wrap_width`.
    pub fn text_box<S: TextShaper + ?Sized>(
        &mut self,
        shaper: &S,
        text: &str,
        size: f32,
        wrap_width: f32,
        align: Align,
        paint: PaintIndex,
    ) {
        self.render_text(shaper, text, size, align, Some(wrap_width), paint);
    }

    /// Ink bounds of `text` as [`text`](Self::text) would draw it, in local
    /// coordinates.
    pub fn text_bounds<S: TextShaper + ?Sized>(
        &self,
        shaper: &S,
        text: &str,
        size: f32,
        align: Align,
    ) -> BBox {
        run_bounds(&shaper.shape(text, size, align, None))
    }

    pub fn text_box_bounds<S: TextShaper + ?Sized>(
        &self,
        shaper: &S,
        text: &str,
        size: f32,
        wrap_width: f32,
        align: Align,
    ) -> BBox {
        run_bounds(&shaper.shape(text, size, align, Some(wrap_width)))
    }

    fn render_text<S: TextShaper + ?Sized>(
        &mut self,
        shaper: &S,
        text: &str,
        size: f32,
        align: Align,
        wrap_width: Option<f32>,
        paint: PaintIndex,
    ) {
        let xform = self.xform_index();
        let px_ratio = self.device_px_ratio;
        let atlas = &mut self.atlas;
        let key = TextLayoutKey::new(shaper.font_id(), text, size, align, wrap_width);
        let prims = self.text_cache.get_or_layout(key, self.frame, || {
            layout_glyphs(shaper, atlas, text, size, align, wrap_width, px_ratio)
        });
        let scene = &mut self.slots[self.current];
        for prim in prims.iter() {
            // Cached layouts carry no paint or transform of their own.
            scene.push_prim(
                self.layer,
                Prim {
                    paint,
                    xform,
                    ..*prim
                },
            );
        }
    }

    /// Fills `glyph` as a path at `size` pixels per em with its origin at
    /// `position`.
    pub fn render_glyph_path<S: TextShaper + ?Sized>(
        &mut self,
        shaper: &S,
        glyph: GlyphId,
        size: f32,
        position: Vec2,
        paint: PaintIndex,
    ) {
        let path = self.glyph_paths.get(shaper, glyph);
        self.scratch_cvs.clear();
        self.scratch_fills.clear();
        path.fill_bands(
            size,
            position,
            &mut self.scanner,
            &mut self.scratch_cvs,
            &mut self.scratch_fills,
        );
        self.flush_fills(paint);
    }
}

/// Shapes text and places each inked glyph in the atlas.
fn layout_glyphs<S: TextShaper + ?Sized>(
    shaper: &S,
    atlas: &mut GlyphAtlas,
    text: &str,
    size: f32,
    align: Align,
    wrap_width: Option<f32>,
    px_ratio: f32,
) -> Vec<Prim> {
    let px_size = (size * px_ratio).round().max(1.0) as u32;
    let font = shaper.font_id();
    shaper
        .shape(text, size, align, wrap_width)
        .into_iter()
        .filter(|glyph| !glyph.bounds.is_empty())
        .filter_map(|glyph| {
            let region = atlas.region(font, glyph.id, px_size, glyph.bounds.size() * px_ratio)?;
            let ink = glyph.bounds.translate(glyph.position);
            let shape = Shape::Glyph {
                min: ink.min,
                max: ink.max,
                region: region.handle,
                tex_bounds: region.texels,
            };
            Some(Prim::new(shape, PaintIndex(0), 0))
        })
        .collect()
}
