// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use serde::{Deserialize, Serialize};

use crate::{Error, PaintRecord, PrimRecord, Transform, Vec2};

/// Initial element capacities of each scene buffer, plus the hard byte
/// ceiling no buffer may grow past.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferSizes {
    pub prims: usize,
    pub cvs: usize,
    pub xforms: usize,
    pub paints: usize,
    pub max_bytes: usize,
}

impl Default for BufferSizes {
    fn default() -> Self {
        Self {
            prims: 1024,
            cvs: 4096,
            xforms: 256,
            paints: 256,
            max_bytes: 64 << 20,
        }
    }
}

impl BufferSizes {
    fn validate(&self) -> Result<(), Error> {
        if self.prims == 0 || self.cvs == 0 || self.xforms == 0 || self.paints == 0 {
            return Err(Error::InvalidConfig("buffer capacities must be non-zero"));
        }
        let largest = size_of::<PrimRecord>()
            .max(size_of::<PaintRecord>())
            .max(size_of::<Transform>())
            .max(size_of::<Vec2>());
        if self.max_bytes < largest {
            return Err(Error::InvalidConfig(
                "max_bytes is smaller than a single buffer element",
            ));
        }
        Ok(())
    }
}

/// Top-level configuration of a [`Context`](crate::Context).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Number of scene slots in the ring. Must be at least the number of
    /// frames the backend lags behind plus one.
    pub slot_count: usize,
    /// Primitive layers per scene.
    pub layer_count: usize,
    pub buffer_sizes: BufferSizes,
    /// Side length of the square glyph atlas, in pixels.
    pub atlas_size: u32,
    /// Empty pixels kept around each glyph image in the atlas.
    pub glyph_padding: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            slot_count: 3,
            layer_count: 4,
            buffer_sizes: BufferSizes::default(),
            atlas_size: 1024,
            glyph_padding: 1,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.slot_count == 0 {
            return Err(Error::InvalidConfig("slot_count must be at least 1"));
        }
        if self.layer_count == 0 {
            return Err(Error::InvalidConfig("layer_count must be at least 1"));
        }
        if self.atlas_size == 0 || self.atlas_size > i32::MAX as u32 {
            return Err(Error::InvalidConfig("atlas_size is out of range"));
        }
        self.buffer_sizes.validate()
    }
}
