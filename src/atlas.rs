// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::collections::HashMap;

use guillotiere::{AtlasAllocator, Size};

use crate::{BBox, GlyphId, Vec2};

/// Region of the glyph atlas holding one glyph image.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AtlasRegion {
    /// Stable handle of the region for as long as the atlas is not cleared.
    pub handle: u32,
    /// Texels covered by the glyph image, padding excluded.
    pub texels: BBox,
}

/// Packs glyph images into one square texture.
///
/// Regions are keyed by font, glyph and pixel size, so the same glyph drawn
/// at two sizes gets two regions. Rasterizing into the regions is the
/// backend's job.
pub struct GlyphAtlas {
    allocator: AtlasAllocator,
    regions: HashMap<(u64, GlyphId, u32), AtlasRegion>,
    padding: u32,
    size: u32,
    next_handle: u32,
}

impl GlyphAtlas {
    pub fn new(size: u32, padding: u32) -> Self {
        Self {
            allocator: AtlasAllocator::new(Size::new(size as i32, size as i32)),
            regions: HashMap::new(),
            padding,
            size,
            next_handle: 0,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Region for `glyph` of `font` rendered at `px_size` pixels per em with
    /// an image of `extent` pixels. Returns `None` when the atlas has no room
    /// left.
    pub fn region(
        &mut self,
        font: u64,
        glyph: GlyphId,
        px_size: u32,
        extent: Vec2,
    ) -> Option<AtlasRegion> {
        let key = (font, glyph, px_size);
        if let Some(region) = self.regions.get(&key) {
            return Some(*region);
        }
        let w = extent.x.ceil().max(1.0) as i32;
        let h = extent.y.ceil().max(1.0) as i32;
        let pad = self.padding as i32;
        let Some(allocation) = self.allocator.allocate(Size::new(w + 2 * pad, h + 2 * pad)) else {
            tracing::warn!(font, glyph = glyph.0, px_size, "glyph atlas full, dropping glyph");
            return None;
        };
        let min = allocation.rectangle.min;
        let origin = Vec2::new((min.x + pad) as f32, (min.y + pad) as f32);
        let region = AtlasRegion {
            handle: self.next_handle,
            texels: BBox::new(origin, origin + Vec2::new(w as f32, h as f32)),
        };
        self.next_handle += 1;
        self.regions.insert(key, region);
        Some(region)
    }

    /// Releases every region. Handles from before the call are invalid.
    pub fn clear(&mut self) {
        self.allocator.clear();
        self.regions.clear();
        self.next_handle = 0;
    }
}
