// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph outlines and the glyph path cache.
//!
//! Filling a glyph as a path needs its outline decomposed into closed
//! quadratic contours. Glyph shapes never change within a session, so the
//! decomposition is computed once per glyph and kept.

use std::sync::Arc;

use dashmap::DashMap;

use crate::text::{CacheStats, StatCounters};
use crate::{GlyphId, PathBuilder, PathScanner, Shape, TextShaper, Vec2};

/// Command for vector outline construction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OutlineCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo(Vec2, Vec2),
    CubicTo(Vec2, Vec2, Vec2),
    Close,
}

/// A glyph outline as a list of commands.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphOutline {
    pub commands: Vec<OutlineCommand>,
}

impl GlyphOutline {
    /// Replays the outline scaled by `scale` into `path`, closing every
    /// contour.
    pub fn build_path(&self, scale: f32, path: &mut PathBuilder) {
        for command in &self.commands {
            match *command {
                OutlineCommand::MoveTo(p) => path.move_to(p * scale),
                OutlineCommand::LineTo(p) => path.line_to(p * scale),
                OutlineCommand::QuadTo(b, c) => path.quad_to(b * scale, c * scale),
                OutlineCommand::CubicTo(b, c, d) => {
                    path.cubic_approx_to(b * scale, c * scale, d * scale)
                }
                OutlineCommand::Close => path.close_path(),
            }
        }
        path.close_all();
    }
}

/// Collector that captures `ttf-parser` outline callbacks as commands,
/// scaling font units by `scale`.
pub(crate) struct OutlineCommandCollector<'a> {
    scale: f32,
    commands: &'a mut Vec<OutlineCommand>,
}

impl<'a> OutlineCommandCollector<'a> {
    pub(crate) fn new(scale: f32, commands: &'a mut Vec<OutlineCommand>) -> Self {
        Self { scale, commands }
    }

    fn point(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(x * self.scale, y * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for OutlineCommandCollector<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.commands.push(OutlineCommand::MoveTo(p));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.commands.push(OutlineCommand::LineTo(p));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (b, c) = (self.point(x1, y1), self.point(x, y));
        self.commands.push(OutlineCommand::QuadTo(b, c));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (b, c, d) = (self.point(x1, y1), self.point(x2, y2), self.point(x, y));
        self.commands.push(OutlineCommand::CubicTo(b, c, d));
    }

    fn close(&mut self) {
        self.commands.push(OutlineCommand::Close);
    }
}

/// A glyph outline flattened to closed quadratic contours, one unit per em.
///
/// Band splitting depends on the draw size, since spans are padded by
/// [`BAND_FATTEN`](crate::BAND_FATTEN) pixels, so the scan happens when the
/// glyph is placed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphPath {
    pub cvs: Vec<Vec2>,
    /// End (exclusive) of every contour in `cvs`.
    pub ends: Vec<usize>,
}

impl GlyphPath {
    fn from_outline(outline: &GlyphOutline) -> Self {
        let mut path = PathBuilder::new();
        outline.build_path(1.0, &mut path);
        let mut cvs = Vec::new();
        let mut ends = Vec::new();
        for contour in path.contours() {
            cvs.extend_from_slice(contour);
            ends.push(cvs.len());
        }
        Self { cvs, ends }
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Scans the glyph drawn at `size` pixels per em with its origin at
    /// `position`, appending band spans to `cvs` and one path fill per band
    /// to `fills`.
    pub fn fill_bands(
        &self,
        size: f32,
        position: Vec2,
        scanner: &mut PathScanner,
        cvs: &mut Vec<Vec2>,
        fills: &mut Vec<Shape>,
    ) {
        let placed: Vec<Vec2> = self.cvs.iter().map(|&v| v * size + position).collect();
        let placed = placed.as_slice();
        let mut start = 0;
        scanner.begin(self.ends.iter().map(move |&end| {
            let contour = &placed[start..end];
            start = end;
            contour
        }));
        scanner.fill_bands(cvs, fills);
    }
}

/// Glyph paths keyed by font and glyph id. Entries are never evicted.
#[derive(Default)]
pub struct GlyphPathCache {
    paths: DashMap<(u64, GlyphId), Arc<GlyphPath>>,
    stats: StatCounters,
}

impl GlyphPathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path for `glyph` of the shaper's font, built from its outline on
    /// first use. Glyphs without an outline get an empty path.
    pub fn get<S: TextShaper + ?Sized>(&self, shaper: &S, glyph: GlyphId) -> Arc<GlyphPath> {
        let key = (shaper.font_id(), glyph);
        if let Some(path) = self.paths.get(&key) {
            self.stats.hit();
            return path.clone();
        }
        self.stats.miss();
        let path = Arc::new(
            shaper
                .outline(glyph)
                .map(|outline| GlyphPath::from_outline(&outline))
                .unwrap_or_default(),
        );
        tracing::debug!(
            font = key.0,
            glyph = glyph.0,
            contours = path.ends.len(),
            cvs = path.cvs.len(),
            "built glyph path"
        );
        self.paths.entry(key).or_insert(path).clone()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}
