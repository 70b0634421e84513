// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene construction for a signed-distance-field vector renderer.
//!
//! Drawing calls on a [`Context`] turn circles, rounded rectangles, strokes,
//! filled paths and text into fixed-size primitive records, appended to the
//! buffers of one [`Scene`] per frame. A rendering backend uploads those
//! buffers and evaluates the distance functions in [`sdf`] per pixel; the
//! same functions are available here for CPU-side queries.

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
// The following lints are part of the Linebender standard set,
// but resolving them has been deferred for now.
// Feel free to send a PR that solves one or more of these.
#![allow(missing_docs, reason = "We have many as-yet undocumented items.")]
#![expect(
    missing_debug_implementations,
    clippy::cast_possible_truncation,
    clippy::missing_assert_message,
    reason = "Deferred"
)]
#![allow(
    unnameable_types,
    clippy::shadow_unrelated,
    reason = "Deferred, only apply in some feature sets so not expect"
)]

mod atlas;
mod config;
mod context;
mod error;
mod font;
mod glyph_cache;
mod gpu_vec;
mod interval;
pub mod math;
mod paint;
mod path;
mod prim;
mod scanner;
mod scene;
pub mod sdf;
mod text;
pub mod winding;

pub use atlas::{AtlasRegion, GlyphAtlas};
pub use config::{BufferSizes, RenderConfig};
pub use context::{Context, Frame};
pub use error::Error;
pub use font::TtfFont;
pub use glyph_cache::{GlyphOutline, GlyphPath, GlyphPathCache, OutlineCommand};
pub use gpu_vec::GpuVec;
pub use interval::Interval;
pub use math::{BBox, Obb, Transform, Vec2};
pub use paint::{Color, NoTextures, Paint, PaintKind, PaintRecord, TextureSampler};
pub use path::PathBuilder;
pub use prim::{ImageIndex, PaintIndex, Prim, PrimKind, PrimRecord, Shape};
pub use scanner::{ActiveIter, BAND_FATTEN, PathScanner, Segment};
pub use scene::Scene;
pub use text::{
    Align, CacheStats, EntryState, GlyphId, ShapedGlyph, TextLayoutCache, TextLayoutKey,
    TextShaper, align_offset, run_bounds,
};
