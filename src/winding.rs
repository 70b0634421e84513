// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inside/outside tests for path fills.
//!
//! A closed contour of quadratic spans encloses the polygon formed by the
//! span chords, adjusted by the lens between each span and its chord. Each
//! test below toggles the fill parity once, so the even-odd rule falls out of
//! XOR-ing both tests over every span.

use crate::Vec2;

/// Does a ray cast from `p` towards +X cross the chord `a`-`b`?
pub fn ray_crosses_chord(p: Vec2, a: Vec2, b: Vec2) -> bool {
    // Half-open in y so a ray through a shared vertex counts once.
    if (a.y <= p.y) == (b.y <= p.y) {
        return false;
    }
    let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
    p.x < x
}

/// Is `p` inside the region bounded by the quadratic `a`,`b`,`c` and its
/// chord `a`-`c`?
///
/// The control triangle maps onto the canonical parabola `v = u^2`, with
/// `a -> (0, 0)`, `b -> (1/2, 0)` and `c -> (1, 1)`. Points in the triangle
/// above the parabola lie between the curve and the chord.
pub fn between_curve_and_chord(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let det = v0.cross(v1);
    if det.abs() < 1.0e-6 {
        // Flat span: no area between curve and chord.
        return false;
    }
    let s = v2.cross(v1) / det;
    let t = v0.cross(v2) / det;
    if s < 0.0 || t < 0.0 || 1.0 - s - t < 0.0 {
        return false;
    }
    let u = s * 0.5 + t;
    let v = t;
    u * u < v
}

/// Fill parity of `p` against a list of independent spans (three control
/// vertices each).
pub fn inside_spans(p: Vec2, cvs: &[Vec2]) -> bool {
    let mut inside = false;
    for span in cvs.chunks_exact(3) {
        let (a, b, c) = (span[0], span[1], span[2]);
        if ray_crosses_chord(p, a, c) {
            inside = !inside;
        }
        if between_curve_and_chord(p, a, b, c) {
            inside = !inside;
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(a: Vec2, b: Vec2) -> [Vec2; 3] {
        [a, a.mix(b, 0.5), b]
    }

    fn square() -> Vec<Vec2> {
        let p = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        (0..4).flat_map(|i| line(p[i], p[(i + 1) % 4])).collect()
    }

    #[test]
    fn square_parity() {
        let cvs = square();
        assert!(inside_spans(Vec2::new(5.0, 5.0), &cvs));
        assert!(inside_spans(Vec2::new(0.5, 9.5), &cvs));
        assert!(!inside_spans(Vec2::new(-1.0, 5.0), &cvs));
        assert!(!inside_spans(Vec2::new(11.0, 5.0), &cvs));
        assert!(!inside_spans(Vec2::new(5.0, 12.0), &cvs));
    }

    #[test]
    fn ray_through_vertex_counts_once() {
        let cvs = square();
        // y == 0 passes exactly through two corners on the left and right.
        assert!(inside_spans(Vec2::new(5.0, 0.0), &cvs));
        assert!(!inside_spans(Vec2::new(-5.0, 0.0), &cvs));
    }

    #[test]
    fn bulging_span_extends_fill() {
        // Chord from (0,0) to (10,0) bulging down to y = -5 at the middle,
        // closed by a straight line back along y = 10.
        let mut cvs = vec![Vec2::new(0.0, 0.0), Vec2::new(5.0, -10.0), Vec2::new(10.0, 0.0)];
        cvs.extend(line(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)));
        cvs.extend(line(Vec2::new(10.0, 10.0), Vec2::new(0.0, 10.0)));
        cvs.extend(line(Vec2::new(0.0, 10.0), Vec2::new(0.0, 0.0)));
        // Below the chord but above the curve's apex.
        assert!(inside_spans(Vec2::new(5.0, -4.0), &cvs));
        // Below the apex.
        assert!(!inside_spans(Vec2::new(5.0, -6.0), &cvs));
        // Inside the control triangle but outside the curve.
        assert!(!inside_spans(Vec2::new(2.0, -3.5), &cvs));
    }

    #[test]
    fn lens_test_matches_parabola() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(0.5, 0.0);
        let c = Vec2::new(1.0, 1.0);
        // In canonical space the test reduces to u^2 < v.
        assert!(between_curve_and_chord(Vec2::new(0.5, 0.3), a, b, c));
        assert!(!between_curve_and_chord(Vec2::new(0.5, 0.2), a, b, c));
        assert!(!between_curve_and_chord(Vec2::new(0.2, 0.5), a, b, c));
    }
}
