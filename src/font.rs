// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use dashmap::DashMap;
use peniko::{Blob, Font};
use ttf_parser::Face;

use crate::glyph_cache::{GlyphOutline, OutlineCommandCollector};
use crate::text::{Align, GlyphId, ShapedGlyph, TextShaper, align_offset};
use crate::{BBox, Error, Vec2};

/// A [`TextShaper`] over a TrueType/OpenType font.
///
/// Layout is simple: one glyph per character from the `cmap`, horizontal
/// advances without kerning, greedy wrapping at spaces and explicit line
/// breaks at `\n`. Coordinates are y up with the first baseline at zero.
///
/// Per-character cmap and metric lookups are kept after first use, so the
/// face is only parsed again for characters not seen before.
#[derive(Clone)]
pub struct TtfFont {
    font: Font,
    id: u64,
    units_per_em: f32,
    ascender: f32,
    descender: f32,
    line_gap: f32,
    glyphs: Arc<DashMap<char, GlyphMetrics>>,
}

/// Cmap and metrics of one character, in font units.
#[derive(Copy, Clone, Debug)]
struct GlyphMetrics {
    id: GlyphId,
    advance: f32,
    bounds: BBox,
}

impl std::fmt::Debug for TtfFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtfFont")
            .field("id", &self.id)
            .field("index", &self.font.index)
            .field("units_per_em", &self.units_per_em)
            .finish_non_exhaustive()
    }
}

/// Hash of the font bytes and collection index.
fn font_hash(font: &Font) -> u64 {
    let mut hasher = DefaultHasher::new();
    font.data.as_ref().hash(&mut hasher);
    font.index.hash(&mut hasher);
    hasher.finish()
}

struct Line {
    glyphs: Vec<ShapedGlyph>,
    width: f32,
}

impl TtfFont {
    pub fn new(font: Font) -> Result<Self, Error> {
        let face = Face::parse(font.data.as_ref(), font.index)?;
        Ok(Self {
            id: font_hash(&font),
            units_per_em: f32::from(face.units_per_em()).max(1.0),
            ascender: f32::from(face.ascender()),
            descender: f32::from(face.descender()),
            line_gap: f32::from(face.line_gap()),
            glyphs: Arc::default(),
            font,
        })
    }

    pub fn from_bytes(data: Vec<u8>, index: u32) -> Result<Self, Error> {
        Self::new(Font::new(Blob::from(data), index))
    }

    /// Distance between consecutive baselines at `size` pixels per em.
    pub fn line_height(&self, size: f32) -> f32 {
        (self.ascender - self.descender + self.line_gap) * size / self.units_per_em
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(self.font.data.as_ref(), self.font.index).ok()
    }

    /// Looks up `ch`, parsing the face into `face` on the first miss.
    fn metrics<'a>(&'a self, face: &mut Option<Face<'a>>, ch: char) -> Option<GlyphMetrics> {
        if let Some(metrics) = self.glyphs.get(&ch) {
            return Some(*metrics);
        }
        if face.is_none() {
            *face = self.face();
        }
        let face = face.as_ref()?;
        let id = face.glyph_index(ch).unwrap_or(ttf_parser::GlyphId(0));
        let metrics = GlyphMetrics {
            id: GlyphId(id.0),
            advance: f32::from(face.glyph_hor_advance(id).unwrap_or(0)),
            bounds: face.glyph_bounding_box(id).map_or(BBox::EMPTY, |r| {
                BBox::new(
                    Vec2::new(f32::from(r.x_min), f32::from(r.y_min)),
                    Vec2::new(f32::from(r.x_max), f32::from(r.y_max)),
                )
            }),
        };
        self.glyphs.insert(ch, metrics);
        Some(metrics)
    }

    /// Glyphs of `word` starting at x = 0, plus the total advance.
    fn run<'a>(
        &'a self,
        face: &mut Option<Face<'a>>,
        word: &str,
        scale: f32,
    ) -> (Vec<ShapedGlyph>, f32) {
        let mut pen = 0.0;
        let mut glyphs = Vec::with_capacity(word.len());
        for ch in word.chars() {
            let Some(m) = self.metrics(face, ch) else {
                continue;
            };
            let bounds = if m.bounds.is_empty() {
                BBox::EMPTY
            } else {
                BBox::new(m.bounds.min * scale, m.bounds.max * scale)
            };
            glyphs.push(ShapedGlyph {
                id: m.id,
                position: Vec2::new(pen, 0.0),
                advance: m.advance * scale,
                bounds,
            });
            pen += m.advance * scale;
        }
        (glyphs, pen)
    }

    fn break_lines<'a>(
        &'a self,
        face: &mut Option<Face<'a>>,
        text: &str,
        scale: f32,
        wrap_width: Option<f32>,
    ) -> Vec<Line> {
        let (space, space_width) = self.run(face, " ", scale);
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let mut line = Line {
                glyphs: Vec::new(),
                width: 0.0,
            };
            for (i, word) in paragraph.split(' ').enumerate() {
                let (glyphs, width) = self.run(face, word, scale);
                let overflows = wrap_width
                    .is_some_and(|w| !line.glyphs.is_empty() && line.width + space_width + width > w);
                if overflows {
                    lines.push(std::mem::replace(
                        &mut line,
                        Line {
                            glyphs: Vec::new(),
                            width: 0.0,
                        },
                    ));
                } else if i > 0 {
                    line.glyphs.extend(space.iter().map(|g| ShapedGlyph {
                        position: g.position + Vec2::new(line.width, 0.0),
                        ..*g
                    }));
                    line.width += space_width;
                }
                let offset = Vec2::new(line.width, 0.0);
                line.glyphs.extend(glyphs.into_iter().map(|g| ShapedGlyph {
                    position: g.position + offset,
                    ..g
                }));
                line.width += width;
            }
            lines.push(line);
        }
        lines
    }
}

impl TextShaper for TtfFont {
    fn font_id(&self) -> u64 {
        self.id
    }

    fn shape(
        &self,
        text: &str,
        size: f32,
        align: Align,
        wrap_width: Option<f32>,
    ) -> Vec<ShapedGlyph> {
        let mut face = None;
        let scale = size / self.units_per_em;
        let lines = self.break_lines(&mut face, text, scale, wrap_width);
        let line_height = self.line_height(size);

        let last_baseline = -line_height * lines.len().saturating_sub(1) as f32;
        let widest = lines.iter().map(|l| l.width).fold(0.0, f32::max);
        let block = BBox::new(
            Vec2::new(0.0, last_baseline + self.descender * scale),
            Vec2::new(widest, self.ascender * scale),
        );
        let vertical = align & (Align::TOP | Align::MIDDLE | Align::BOTTOM | Align::BASELINE);
        let dy = align_offset(block, vertical).y;

        let mut out = Vec::new();
        for (row, line) in lines.into_iter().enumerate() {
            // Wrapped lines align within the wrap width, single lines around
            // the origin.
            let extent = wrap_width.unwrap_or(0.0);
            let dx = if align.contains(Align::CENTER) {
                (extent - line.width) * 0.5
            } else if align.contains(Align::RIGHT) {
                extent - line.width
            } else {
                0.0
            };
            let offset = Vec2::new(dx, dy - line_height * row as f32);
            out.extend(line.glyphs.into_iter().map(|g| ShapedGlyph {
                position: g.position + offset,
                ..g
            }));
        }
        out
    }

    fn outline(&self, glyph: GlyphId) -> Option<GlyphOutline> {
        let face = self.face()?;
        let mut commands = Vec::new();
        let mut collector = OutlineCommandCollector::new(1.0 / self.units_per_em, &mut commands);
        face.outline_glyph(ttf_parser::GlyphId(glyph.0), &mut collector)?;
        Some(GlyphOutline { commands })
    }
}
