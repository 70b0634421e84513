// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end scenarios against the public drawing API.

use std::cell::Cell;

use sdf_scene::{
    Align, BBox, BufferSizes, Color, Context, EntryState, GlyphId, GlyphOutline, OutlineCommand,
    PaintIndex, PrimKind, RenderConfig, Shape, ShapedGlyph, TextLayoutKey, TextShaper, Vec2,
    align_offset, run_bounds,
};

/// Monospaced shaper: every character is a box half an em wide and 0.75 em
/// tall, except spaces which have no ink. Counts how often it is asked to
/// do work.
#[derive(Default)]
struct BoxShaper {
    font: u64,
    shapes: Cell<usize>,
    outlines: Cell<usize>,
}

impl BoxShaper {
    fn with_font(font: u64) -> Self {
        Self {
            font,
            ..Default::default()
        }
    }
}

impl TextShaper for BoxShaper {
    fn font_id(&self) -> u64 {
        self.font
    }

    fn shape(
        &self,
        text: &str,
        size: f32,
        align: Align,
        _wrap_width: Option<f32>,
    ) -> Vec<ShapedGlyph> {
        self.shapes.set(self.shapes.get() + 1);
        let advance = size * 0.5;
        let mut glyphs: Vec<ShapedGlyph> = text
            .chars()
            .enumerate()
            .map(|(i, ch)| ShapedGlyph {
                id: GlyphId(ch as u16),
                position: Vec2::new(i as f32 * advance, 0.0),
                advance,
                bounds: if ch == ' ' {
                    BBox::EMPTY
                } else {
                    BBox::new(Vec2::ZERO, Vec2::new(advance, size * 0.75))
                },
            })
            .collect();
        let offset = align_offset(run_bounds(&glyphs), align);
        for glyph in &mut glyphs {
            glyph.position += offset;
        }
        glyphs
    }

    fn outline(&self, _glyph: GlyphId) -> Option<GlyphOutline> {
        self.outlines.set(self.outlines.get() + 1);
        Some(GlyphOutline {
            commands: vec![
                OutlineCommand::MoveTo(Vec2::new(0.1, 0.0)),
                OutlineCommand::LineTo(Vec2::new(0.4, 0.0)),
                OutlineCommand::LineTo(Vec2::new(0.4, 0.7)),
                OutlineCommand::LineTo(Vec2::new(0.1, 0.7)),
                OutlineCommand::Close,
            ],
        })
    }
}

fn white(cx: &mut Context) -> PaintIndex {
    cx.color_paint(Color::WHITE)
}

#[test]
fn rounded_rect_distance() {
    let mut cx = Context::default();
    cx.begin(200.0, 100.0, 1.0);
    let paint = white(&mut cx);
    cx.fill_rect(Vec2::new(0.0, 0.0), Vec2::new(100.0, 40.0), 8.0, paint);
    let frame = cx.submit();
    let scene = frame.scene;
    assert_eq!(scene.prims(0).len(), 1);
    assert_eq!(scene.prims(0)[0].kind, PrimKind::Rect as u32);

    // The center is half the short side away from the nearest edge.
    let center = scene.distance(0, 0, Vec2::new(50.0, 20.0)).unwrap();
    assert!((center + 20.0).abs() < 1.0e-3, "{center}");
    let edge = scene.distance(0, 0, Vec2::new(100.0, 20.0)).unwrap();
    assert!(edge.abs() < 1.0e-3, "{edge}");
    // Past the rounded corner.
    let corner = scene.distance(0, 0, Vec2::new(100.0, 40.0)).unwrap();
    assert!((corner - (8.0 * 2.0f32.sqrt() - 8.0)).abs() < 1.0e-3);
}

#[test]
fn text_layout_reused_across_frames() {
    let shaper = BoxShaper::default();
    let mut cx = Context::default();
    let key = TextLayoutKey::new(0, "hello", 16.0, Align::LEFT, None);

    cx.begin(100.0, 100.0, 1.0);
    let paint = white(&mut cx);
    cx.text(&shaper, "hello", 16.0, Align::LEFT, paint);
    let first: Vec<_> = cx.scene().prims(0).to_vec();
    assert_eq!(cx.submit().index, 1);
    assert_eq!(cx.text_cache().last_used(&key), Some(1));

    cx.begin(100.0, 100.0, 1.0);
    let paint = white(&mut cx);
    cx.text(&shaper, "hello", 16.0, Align::LEFT, paint);
    assert_eq!(shaper.shapes.get(), 1);
    assert_eq!(cx.scene().prims(0), &first[..]);
    assert_eq!(cx.text_cache().last_used(&key), Some(2));
    assert_eq!(cx.text_cache().stats().hits, 1);
    assert_eq!(cx.submit().index, 2);
    assert_eq!(cx.text_cache().state(&key, 2), EntryState::Fresh);
}

#[test]
fn glyphs_become_atlas_prims() {
    let shaper = BoxShaper::default();
    let mut cx = Context::default();
    cx.begin(100.0, 100.0, 2.0);
    let paint = white(&mut cx);
    cx.text(&shaper, "ab a", 20.0, Align::LEFT, paint);
    let prims: Vec<_> = (0..cx.scene().prims(0).len())
        .map(|i| cx.scene().prim(0, i).unwrap())
        .collect();
    // The space has no ink.
    assert_eq!(prims.len(), 3);
    let regions: Vec<u32> = prims
        .iter()
        .map(|prim| match prim.shape {
            Shape::Glyph { region, tex_bounds, .. } => {
                // Glyph images are rasterized at device pixel size.
                assert_eq!(tex_bounds.size(), Vec2::new(20.0, 30.0));
                region
            }
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(regions[0], regions[2]);
    assert_ne!(regions[0], regions[1]);
    assert_eq!(cx.atlas().len(), 2);
}

#[test]
fn cached_text_takes_callers_paint_and_transform() {
    let shaper = BoxShaper::default();
    let mut cx = Context::default();
    cx.begin(100.0, 100.0, 1.0);
    let red = cx.color_paint(Color::new(1.0, 0.0, 0.0, 1.0));
    let blue = cx.color_paint(Color::new(0.0, 0.0, 1.0, 1.0));
    cx.text(&shaper, "x", 10.0, Align::CENTER, red);
    cx.translate(Vec2::new(0.0, 30.0));
    cx.text(&shaper, "x", 10.0, Align::CENTER, blue);
    assert_eq!(shaper.shapes.get(), 1);
    let scene = cx.scene();
    let records = scene.prims(0);
    assert_eq!(records.len(), 2);
    assert_eq!((records[0].paint, records[0].xform), (red.0, 0));
    assert_eq!((records[1].paint, records[1].xform), (blue.0, 1));
    // Centered: the glyph straddles x = 0.
    let d = scene.distance(0, 1, Vec2::new(0.0, 31.0)).unwrap();
    assert!(d < 0.0);
}

#[test]
fn untouched_text_is_evicted() {
    let shaper = BoxShaper::default();
    let mut cx = Context::default();
    let key = TextLayoutKey::new(0, "gone", 12.0, Align::LEFT, None);

    cx.begin(100.0, 100.0, 1.0);
    let paint = white(&mut cx);
    cx.text(&shaper, "gone", 12.0, Align::LEFT, paint);
    cx.submit();
    assert_eq!(cx.text_cache().state(&key, 2), EntryState::Stale);

    cx.begin(100.0, 100.0, 1.0);
    cx.submit();
    assert_eq!(cx.text_cache().state(&key, 3), EntryState::Absent);
    assert!(cx.text_cache().is_empty());

    cx.begin(100.0, 100.0, 1.0);
    let paint = white(&mut cx);
    cx.text(&shaper, "gone", 12.0, Align::LEFT, paint);
    assert_eq!(shaper.shapes.get(), 2);
}

#[test]
fn glyph_paths_are_built_once() {
    let shaper = BoxShaper::default();
    let mut cx = Context::default();
    for frame in 0..3 {
        cx.begin(100.0, 100.0, 1.0);
        let paint = white(&mut cx);
        cx.render_glyph_path(&shaper, GlyphId(7), 100.0, Vec2::new(10.0, 10.0), paint);
        let scene = cx.scene();
        let prims = scene.prims(0);
        assert!(!prims.is_empty(), "frame {frame}");
        assert!(prims.iter().all(|r| r.kind == PrimKind::PathFill as u32));
        // (35, 45) is inside the placed outline, (5, 45) is left of it.
        let inside = (0..prims.len())
            .filter_map(|i| scene.distance(0, i, Vec2::new(35.0, 45.0)))
            .fold(f32::MAX, f32::min);
        assert!(inside < 0.0);
        let outside = (0..prims.len())
            .filter_map(|i| scene.distance(0, i, Vec2::new(5.0, 45.0)))
            .fold(f32::MAX, f32::min);
        assert!(outside > 0.0);
        cx.submit();
    }
    assert_eq!(shaper.outlines.get(), 1);
    assert_eq!(cx.glyph_path_cache().len(), 1);
}

#[test]
fn fonts_keep_separate_layouts_and_glyphs() {
    let (a, b) = (BoxShaper::with_font(1), BoxShaper::with_font(2));
    let mut cx = Context::default();
    cx.begin(100.0, 100.0, 1.0);
    let paint = white(&mut cx);
    cx.text(&a, "hi", 12.0, Align::LEFT, paint);
    cx.text(&b, "hi", 12.0, Align::LEFT, paint);
    assert_eq!((a.shapes.get(), b.shapes.get()), (1, 1));
    assert_eq!(cx.text_cache().len(), 2);
    let regions: Vec<u32> = (0..cx.scene().prims(0).len())
        .map(|i| match cx.scene().prim(0, i).unwrap().shape {
            Shape::Glyph { region, .. } => region,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(regions, vec![0, 1, 2, 3]);

    cx.render_glyph_path(&a, GlyphId(7), 20.0, Vec2::ZERO, paint);
    cx.render_glyph_path(&b, GlyphId(7), 20.0, Vec2::ZERO, paint);
    assert_eq!((a.outlines.get(), b.outlines.get()), (1, 1));
    assert_eq!(cx.glyph_path_cache().len(), 2);
}

#[test]
fn small_glyph_edges_stay_in_their_band() {
    let shaper = BoxShaper::default();
    let mut cx = Context::default();
    cx.begin(100.0, 100.0, 1.0);
    let paint = white(&mut cx);
    // The glyph box spans x 1.6..6.4 and y 0..11.2 at 16 px per em.
    cx.render_glyph_path(&shaper, GlyphId(1), 16.0, Vec2::ZERO, paint);
    let scene = cx.scene();
    let p = Vec2::new(4.0, 0.5);
    let covering: Vec<usize> = (0..scene.prims(0).len())
        .filter(|&i| {
            let b = scene.prims(0)[i].quad_bounds;
            p.y >= b.min.y && p.y < b.max.y
        })
        .collect();
    assert_eq!(covering.len(), 1);
    // Half a pixel above the bottom edge, not the 2.4 px to the sides.
    let d = scene.distance(0, covering[0], p).unwrap();
    assert!((d + 0.5).abs() < 1.0e-3, "{d}");
}

#[test]
fn saturated_buffers_truncate_content() {
    let config = RenderConfig {
        buffer_sizes: BufferSizes {
            prims: 4,
            max_bytes: 8 * size_of::<sdf_scene::PrimRecord>(),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut cx = Context::new(&config).unwrap();
    cx.begin(100.0, 100.0, 1.0);
    let paint = white(&mut cx);
    for i in 0..20 {
        cx.fill_circle(Vec2::new(i as f32, 0.0), 1.0, paint);
    }
    let frame = cx.submit();
    let layer = frame.scene.layer(0).unwrap();
    assert_eq!(layer.len(), 8);
    assert!(layer.is_saturated());
    assert_eq!(layer.reallocations(), 1);
    // What was kept is intact.
    for i in 0..8 {
        match frame.scene.prim(0, i).unwrap().shape {
            Shape::Circle { center, .. } => assert_eq!(center, Vec2::new(i as f32, 0.0)),
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[test]
fn config_from_json() {
    let config: RenderConfig =
        serde_json::from_str(r#"{ "slot_count": 2, "layer_count": 1 }"#).unwrap();
    let mut cx = Context::new(&config).unwrap();
    assert_eq!(cx.slot_count(), 2);
    for expected in [0, 1, 0] {
        cx.begin(1.0, 1.0, 1.0);
        assert_eq!(cx.current_slot(), expected);
        cx.submit();
    }
}
