// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Active-edge scan over quadratic spans.
//!
//! The scanner sweeps the spans of one or more contours from top to bottom
//! and reports horizontal bands together with the spans whose (fattened)
//! vertical extent overlaps each band. Path fills use it to split a path
//! into per-band primitives that only carry the spans relevant to them.

use crate::{BBox, Interval, Shape, Vec2};

/// Vertical padding added to every span's extent so that a curve extremum
/// sitting exactly on a band boundary still lands in both bands.
pub const BAND_FATTEN: f32 = 1.0;

const NIL: usize = usize::MAX;

/// One quadratic span of a contour.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Segment {
    pub cvs: [Vec2; 3],
    /// Fattened vertical extent.
    pub y: Interval,
    /// Neighbouring spans of the same contour.
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

impl Segment {
    fn new(a: Vec2, b: Vec2, c: Vec2) -> Self {
        Self {
            cvs: [a, b, c],
            y: Interval::of3(a.y, b.y, c.y).fatten(BAND_FATTEN),
            prev: None,
            next: None,
        }
    }

    fn is_finite(&self) -> bool {
        self.cvs.iter().all(|v| v.x.is_finite() && v.y.is_finite())
    }

    /// Horizontal extent of the control triangle.
    pub fn x_interval(&self) -> Interval {
        let [a, b, c] = self.cvs;
        Interval::of3(a.x, b.x, c.x)
    }
}

#[derive(Copy, Clone, Debug)]
struct Event {
    y: f32,
    segment: usize,
    end: bool,
}

/// Band-by-band sweep of a set of contours.
///
/// ```ignore
/// scanner.begin([&cvs[..]]);
/// while scanner.next() {
///     for segment in scanner.active() { /* ... */ }
/// }
/// ```
pub struct PathScanner {
    pub segments: Vec<Segment>,
    /// Band reported by the last successful `next`, half-open.
    pub interval: Interval,
    events: Vec<Event>,
    cursor: usize,
    // Active set as an intrusive doubly linked list over segment indices.
    head: usize,
    next_active: Vec<usize>,
    prev_active: Vec<usize>,
    active_count: usize,
}

impl Default for PathScanner {
    fn default() -> Self {
        Self {
            segments: Vec::new(),
            interval: Interval::default(),
            events: Vec::new(),
            cursor: 0,
            head: NIL,
            next_active: Vec::new(),
            prev_active: Vec::new(),
            active_count: 0,
        }
    }
}

impl PathScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a scan over `contours`, each a run of control vertices with
    /// stride 2 (consecutive spans share their end points). A contour whose
    /// last vertex equals its first links its last span back to its first.
    pub fn begin<'a>(&mut self, contours: impl IntoIterator<Item = &'a [Vec2]>) {
        self.segments.clear();
        let mut skipped = 0;
        for cvs in contours {
            let first = self.segments.len();
            let mut prev = None;
            let mut broken = false;
            for span in cvs.windows(3).step_by(2) {
                let mut segment = Segment::new(span[0], span[1], span[2]);
                if !segment.is_finite() {
                    skipped += 1;
                    prev = None;
                    broken = true;
                    continue;
                }
                let index = self.segments.len();
                if let Some(p) = prev {
                    segment.prev = Some(p);
                    self.segments[p].next = Some(index);
                }
                self.segments.push(segment);
                prev = Some(index);
            }
            let last = self.segments.len();
            if !broken && last - first > 1 && cvs.first() == cvs.last() {
                self.segments[first].prev = Some(last - 1);
                self.segments[last - 1].next = Some(first);
            }
        }
        if skipped > 0 {
            tracing::warn!(skipped, "skipping path spans with non-finite coordinates");
        }

        self.events.clear();
        for (segment, s) in self.segments.iter().enumerate() {
            self.events.push(Event {
                y: s.y.a,
                segment,
                end: false,
            });
            self.events.push(Event {
                y: s.y.b,
                segment,
                end: true,
            });
        }
        // Stable: equal keys keep insertion order.
        self.events
            .sort_by(|a, b| a.y.total_cmp(&b.y).then(a.end.cmp(&b.end)));

        let n = self.segments.len();
        self.next_active.clear();
        self.next_active.resize(n, NIL);
        self.prev_active.clear();
        self.prev_active.resize(n, NIL);
        self.head = NIL;
        self.active_count = 0;
        self.cursor = 0;
        self.interval = Interval::default();
    }

    /// Scans a single contour.
    pub fn begin_cvs(&mut self, cvs: &[Vec2]) {
        self.begin([cvs]);
    }

    /// Advances to the next band containing at least one active span.
    /// Returns `false` once the sweep is complete.
    pub fn next(&mut self) -> bool {
        loop {
            let Some(&Event { y, .. }) = self.events.get(self.cursor) else {
                return false;
            };
            while let Some(&event) = self.events.get(self.cursor) {
                if event.y != y {
                    break;
                }
                if event.end {
                    self.deactivate(event.segment);
                } else {
                    self.activate(event.segment);
                }
                self.cursor += 1;
            }
            let Some(next) = self.events.get(self.cursor) else {
                return false;
            };
            if self.active_count > 0 {
                self.interval = Interval::new(y, next.y);
                return true;
            }
        }
    }

    /// Number of spans active in the current band.
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Indices of the spans active in the current band, in no particular
    /// order.
    pub fn active_indices(&self) -> ActiveIter<'_> {
        ActiveIter {
            scanner: self,
            current: self.head,
        }
    }

    pub fn active(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.active_indices().map(|i| &self.segments[i])
    }

    /// Runs the scan to completion, appending the spans active in each band
    /// to `cvs` (three control vertices per span) and one path-fill shape
    /// per band to `fills`. Shape starts index into `cvs`. Band bounds span
    /// the band vertically and the spans' x extent widened by
    /// [`BAND_FATTEN`] on both sides.
    pub fn fill_bands(&mut self, cvs: &mut Vec<Vec2>, fills: &mut Vec<Shape>) {
        while self.next() {
            let start = cvs.len() as u32;
            let mut x = Interval::new(f32::MAX, f32::MIN);
            for segment in self.active() {
                cvs.extend_from_slice(&segment.cvs);
                let sx = segment.x_interval();
                x = Interval::new(x.a.min(sx.a), x.b.max(sx.b));
            }
            let x = x.fatten(BAND_FATTEN);
            let y = self.interval;
            fills.push(Shape::PathFill {
                start,
                count: self.active_count as u32,
                bounds: BBox::new(Vec2::new(x.a, y.a), Vec2::new(x.b, y.b)),
            });
        }
    }

    fn activate(&mut self, i: usize) {
        self.prev_active[i] = NIL;
        self.next_active[i] = self.head;
        if self.head != NIL {
            self.prev_active[self.head] = i;
        }
        self.head = i;
        self.active_count += 1;
    }

    fn deactivate(&mut self, i: usize) {
        let (p, n) = (self.prev_active[i], self.next_active[i]);
        if p != NIL {
            self.next_active[p] = n;
        } else {
            self.head = n;
        }
        if n != NIL {
            self.prev_active[n] = p;
        }
        self.prev_active[i] = NIL;
        self.next_active[i] = NIL;
        self.active_count -= 1;
    }
}

pub struct ActiveIter<'a> {
    scanner: &'a PathScanner,
    current: usize,
}

impl Iterator for ActiveIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.current == NIL {
            return None;
        }
        let i = self.current;
        self.current = self.scanner.next_active[i];
        Some(i)
    }
}
