// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{BBox, Vec2};

/// Accumulates contours of quadratic spans.
///
/// Control vertices are stored flat with stride 2, so every span shares its
/// first vertex with the previous span's last.
#[derive(Clone, Debug, Default)]
pub struct PathBuilder {
    cvs: Vec<Vec2>,
    /// End (exclusive) of every finished contour in `cvs`.
    ends: Vec<usize>,
    /// Start of the open contour, if any.
    open: Option<usize>,
    pen: Vec2,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.cvs.clear();
        self.ends.clear();
        self.open = None;
        self.pen = Vec2::ZERO;
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty() && self.open.is_none()
    }

    /// Ends the current contour (without closing it) and starts a new one.
    pub fn move_to(&mut self, p: Vec2) {
        self.finish();
        self.pen = p;
    }

    /// Straight line, stored as a quadratic with its control point at the
    /// midpoint.
    pub fn line_to(&mut self, b: Vec2) {
        let a = self.pen;
        self.quad_to(a.mix(b, 0.5), b);
    }

    pub fn quad_to(&mut self, b: Vec2, c: Vec2) {
        if self.open.is_none() {
            self.open = Some(self.cvs.len());
            self.cvs.push(self.pen);
        }
        self.cvs.push(b);
        self.cvs.push(c);
        self.pen = c;
    }

    /// Approximates the cubic from the pen through `b` and `c` to `d` with
    /// two quadratics.
    pub fn cubic_approx_to(&mut self, b: Vec2, c: Vec2, d: Vec2) {
        let a = self.pen;
        let q1 = a.mix(b, 0.75);
        let q2 = d.mix(c, 0.75);
        let mid = q1.mix(q2, 0.5);
        self.quad_to(q1, mid);
        self.quad_to(q2, d);
    }

    /// Closes the current contour with a line back to its start.
    pub fn close_path(&mut self) {
        if let Some(start) = self.open {
            let first = self.cvs[start];
            if self.pen != first {
                self.line_to(first);
            }
        }
        self.finish();
    }

    /// Closes every open contour. Finished contours that were left open by
    /// `move_to` are closed as well.
    pub fn close_all(&mut self) {
        self.close_path();
        let mut start = 0;
        let mut closed = Vec::with_capacity(self.cvs.len() + 2 * self.ends.len());
        let mut ends = Vec::with_capacity(self.ends.len());
        for &end in &self.ends {
            let contour = &self.cvs[start..end];
            closed.extend_from_slice(contour);
            if let (Some(&first), Some(&last)) = (contour.first(), contour.last()) {
                if first != last {
                    closed.push(last.mix(first, 0.5));
                    closed.push(first);
                }
            }
            ends.push(closed.len());
            start = end;
        }
        self.cvs = closed;
        self.ends = ends;
    }

    /// Finished contours, each `2 * spans + 1` control vertices long.
    pub fn contours(&self) -> impl Iterator<Item = &[Vec2]> + '_ {
        let mut start = 0;
        self.ends.iter().map(move |&end| {
            let contour = &self.cvs[start..end];
            start = end;
            contour
        })
    }

    pub fn bounds(&self) -> BBox {
        BBox::from_points(&self.cvs)
    }

    fn finish(&mut self) {
        if let Some(start) = self.open.take() {
            if self.cvs.len() - start >= 3 {
                self.ends.push(self.cvs.len());
            } else {
                self.cvs.truncate(start);
            }
        }
    }
}
