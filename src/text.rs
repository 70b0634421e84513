// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text shaping interface and the frame-keyed layout cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::glyph_cache::GlyphOutline;
use crate::{BBox, Prim, Vec2};

bitflags! {
    /// Anchor of a text layout relative to its origin.
    ///
    /// At most one horizontal and one vertical flag is meaningful; left and
    /// baseline apply when none is given.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Align: u32 {
        const LEFT = 1 << 0;
        const CENTER = 1 << 1;
        const RIGHT = 1 << 2;
        const TOP = 1 << 3;
        const MIDDLE = 1 << 4;
        const BOTTOM = 1 << 5;
        const BASELINE = 1 << 6;
    }
}

/// Offset that moves a layout with `bounds` (relative to its origin, y up)
/// so the origin sits at the anchor selected by `align`.
pub fn align_offset(bounds: BBox, align: Align) -> Vec2 {
    if bounds.is_empty() {
        return Vec2::ZERO;
    }
    let x = if align.contains(Align::CENTER) {
        -(bounds.min.x + bounds.max.x) * 0.5
    } else if align.contains(Align::RIGHT) {
        -bounds.max.x
    } else {
        0.0
    };
    let y = if align.contains(Align::TOP) {
        -bounds.max.y
    } else if align.contains(Align::MIDDLE) {
        -(bounds.min.y + bounds.max.y) * 0.5
    } else if align.contains(Align::BOTTOM) {
        -bounds.min.y
    } else {
        0.0
    };
    Vec2::new(x, y)
}

/// Font-specific glyph identifier.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphId(pub u16);

/// One positioned glyph of a shaped run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShapedGlyph {
    pub id: GlyphId,
    /// Pen position of the glyph origin, alignment applied.
    pub position: Vec2,
    pub advance: f32,
    /// Ink bounds relative to `position`. Empty for blank glyphs.
    pub bounds: BBox,
}

/// Text shaping and font outline service.
pub trait TextShaper {
    /// Identity of the font behind this shaper. Caches keep layouts, glyph
    /// paths and atlas regions apart per font, so two shapers must report
    /// the same id only if they produce the same glyphs.
    fn font_id(&self) -> u64;

    /// Lays out `text` at `size` pixels per em. With a `wrap_width`, lines
    /// break at word boundaries so no line exceeds it where possible; each
    /// line is aligned horizontally within the wrap width.
    fn shape(&self, text: &str, size: f32, align: Align, wrap_width: Option<f32>)
    -> Vec<ShapedGlyph>;

    /// Outline of `glyph` scaled to a one unit em, y up.
    fn outline(&self, glyph: GlyphId) -> Option<GlyphOutline>;
}

/// Union of the ink bounds of a shaped run.
pub fn run_bounds(glyphs: &[ShapedGlyph]) -> BBox {
    glyphs
        .iter()
        .filter(|g| !g.bounds.is_empty())
        .fold(BBox::EMPTY, |b, g| b.union(g.bounds.translate(g.position)))
}

/// Identity of a laid out string. Floats are compared bit for bit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextLayoutKey {
    font: u64,
    text: String,
    size: u32,
    align: Align,
    wrap_width: Option<u32>,
}

impl TextLayoutKey {
    pub fn new(
        font: u64,
        text: &str,
        size: f32,
        align: Align,
        wrap_width: Option<f32>,
    ) -> Self {
        Self {
            font,
            text: text.to_owned(),
            size: size.to_bits(),
            align,
            wrap_width: wrap_width.map(f32::to_bits),
        }
    }

    pub fn font(&self) -> u64 {
        self.font
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn size(&self) -> f32 {
        f32::from_bits(self.size)
    }
}

/// Lifecycle state of a cache entry relative to the current frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryState {
    Absent,
    /// Used in the current frame.
    Fresh,
    /// Not used since an earlier frame; removed by the next prune.
    Stale,
}

struct CachedLayout {
    prims: Arc<[Prim]>,
    last_frame: u64,
}

/// Hit and miss counters of a cache.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl StatCounters {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Laid out text keyed by [`TextLayoutKey`].
///
/// Entries remember the last frame they were used in. [`prune`] drops every
/// entry not used in the given frame, so text that stops being drawn is
/// forgotten one frame later.
///
/// [`prune`]: TextLayoutCache::prune
#[derive(Default)]
pub struct TextLayoutCache {
    entries: DashMap<TextLayoutKey, CachedLayout>,
    stats: StatCounters,
}

impl TextLayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached primitives for `key`, calling `layout` only when
    /// there are none. Either way the entry is marked as used in `frame`.
    pub fn get_or_layout(
        &self,
        key: TextLayoutKey,
        frame: u64,
        layout: impl FnOnce() -> Vec<Prim>,
    ) -> Arc<[Prim]> {
        match self.entries.entry(key) {
            Entry::Occupied(mut entry) => {
                self.stats.hit();
                let cached = entry.get_mut();
                cached.last_frame = cached.last_frame.max(frame);
                cached.prims.clone()
            }
            Entry::Vacant(entry) => {
                self.stats.miss();
                let prims: Arc<[Prim]> = layout().into();
                tracing::debug!(
                    font = entry.key().font(),
                    text = entry.key().text(),
                    prims = prims.len(),
                    frame,
                    "text layout cache miss"
                );
                entry.insert(CachedLayout {
                    prims: prims.clone(),
                    last_frame: frame,
                });
                prims
            }
        }
    }

    pub fn state(&self, key: &TextLayoutKey, frame: u64) -> EntryState {
        match self.entries.get(key) {
            None => EntryState::Absent,
            Some(entry) if entry.last_frame >= frame => EntryState::Fresh,
            Some(_) => EntryState::Stale,
        }
    }

    /// Frame in which `key` was last used.
    pub fn last_used(&self, key: &TextLayoutKey) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.last_frame)
    }

    /// Removes every entry not used in `frame`. Returns the number removed.
    pub fn prune(&self, frame: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.last_frame >= frame);
        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            tracing::debug!(evicted, frame, "pruned text layout cache");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PaintIndex, Shape};
    use std::cell::Cell;

    fn layout_one() -> Vec<Prim> {
        vec![Prim::new(
            Shape::Circle {
                center: Vec2::ZERO,
                radius: 1.0,
            },
            PaintIndex(0),
            0,
        )]
    }

    #[test]
    fn same_frame_hits_share_the_list() {
        let cache = TextLayoutCache::new();
        let calls = Cell::new(0);
        let key = TextLayoutKey::new(1, "hello", 12.0, Align::LEFT, None);
        let layout = || {
            calls.set(calls.get() + 1);
            layout_one()
        };
        let a = cache.get_or_layout(key.clone(), 1, layout);
        let b = cache.get_or_layout(key.clone(), 1, || unreachable!());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn key_distinguishes_every_field() {
        let base = TextLayoutKey::new(1, "a", 12.0, Align::LEFT, None);
        assert_ne!(base, TextLayoutKey::new(1, "b", 12.0, Align::LEFT, None));
        assert_ne!(base, TextLayoutKey::new(1, "a", 13.0, Align::LEFT, None));
        assert_ne!(base, TextLayoutKey::new(1, "a", 12.0, Align::CENTER, None));
        assert_ne!(base, TextLayoutKey::new(1, "a", 12.0, Align::LEFT, Some(100.0)));
        assert_ne!(base, TextLayoutKey::new(2, "a", 12.0, Align::LEFT, None));
        assert_eq!(base, TextLayoutKey::new(1, "a", 12.0, Align::LEFT, None));
    }

    #[test]
    fn entries_go_stale_then_get_pruned() {
        let cache = TextLayoutCache::new();
        let key = TextLayoutKey::new(1, "x", 10.0, Align::default(), None);
        assert_eq!(cache.state(&key, 1), EntryState::Absent);
        cache.get_or_layout(key.clone(), 1, layout_one);
        assert_eq!(cache.state(&key, 1), EntryState::Fresh);
        assert_eq!(cache.prune(1), 0);
        assert_eq!(cache.state(&key, 2), EntryState::Stale);
        assert_eq!(cache.prune(2), 1);
        assert_eq!(cache.state(&key, 2), EntryState::Absent);
        assert!(cache.is_empty());
    }

    #[test]
    fn hit_refreshes_timestamp() {
        let cache = TextLayoutCache::new();
        let key = TextLayoutKey::new(1, "x", 10.0, Align::default(), Some(50.0));
        cache.get_or_layout(key.clone(), 1, layout_one);
        cache.get_or_layout(key.clone(), 2, layout_one);
        assert_eq!(cache.last_used(&key), Some(2));
        assert_eq!(cache.prune(2), 0);
    }

    #[test]
    fn alignment_offsets() {
        let b = BBox::new(Vec2::new(0.0, -2.0), Vec2::new(10.0, 8.0));
        assert_eq!(align_offset(b, Align::LEFT | Align::BASELINE), Vec2::ZERO);
        assert_eq!(align_offset(b, Align::CENTER | Align::MIDDLE), Vec2::new(-5.0, -3.0));
        assert_eq!(align_offset(b, Align::RIGHT | Align::TOP), Vec2::new(-10.0, -8.0));
        assert_eq!(align_offset(b, Align::BOTTOM), Vec2::new(0.0, 2.0));
        assert_eq!(align_offset(BBox::EMPTY, Align::CENTER), Vec2::ZERO);
    }
}
