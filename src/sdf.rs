// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Signed distance functions for every primitive kind.
//!
//! Distances are negative inside, positive outside and zero on the boundary.
//! All queries take points in the primitive's local space; applying the
//! primitive's transform is up to the caller.

use crate::winding::inside_spans;
use crate::{BBox, Obb, Shape, Vec2};

/// Below this control-triangle area (times four) a quadratic is treated as
/// its chord.
pub const BEZIER_COLLINEAR_EPSILON: f32 = 0.005;

/// Horizontal steepness of the wire's tanh profile.
const WIRE_STEEPNESS: f32 = 5.0;

pub fn sd_circle(p: Vec2, r: f32) -> f32 {
    p.length() - r
}

/// Rounded box centered at the origin with half extents `b` and corner
/// radius `r`.
pub fn sd_box(p: Vec2, b: Vec2, r: f32) -> f32 {
    let d = p.abs() - b + Vec2::splat(r);
    d.max(Vec2::ZERO).length() + d.x.max(d.y).min(0.0) - r
}

/// Unsigned distance to the segment `a`-`b`.
pub fn sd_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let pa = p - a;
    let ba = b - a;
    let len2 = ba.length_squared();
    let h = if len2 > 0.0 {
        (pa.dot(ba) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (pa - ba * h).length()
}

/// Arc of radius `ra` and half-thickness `rb`. `sca` is `(sin, cos)` of the
/// arc's orientation and `scb` is `(sin, cos)` of its half aperture.
pub fn sd_arc(p: Vec2, sca: Vec2, scb: Vec2, ra: f32, rb: f32) -> f32 {
    let mut p = Vec2::new(p.x * sca.x + p.y * sca.y, -p.x * sca.y + p.y * sca.x);
    p.x = p.x.abs();
    let k = if scb.y * p.x > scb.x * p.y {
        p.dot(scb)
    } else {
        p.length()
    };
    (p.dot(p) + ra * ra - 2.0 * ra * k).max(0.0).sqrt() - rb
}

fn closest_point_in_segment(a: Vec2, b: Vec2) -> Vec2 {
    let ba = b - a;
    let len2 = ba.length_squared();
    if len2 == 0.0 {
        return a;
    }
    a + ba * (-a.dot(ba) / len2).clamp(0.0, 1.0)
}

/// Vector from the origin to the approximate closest point of the quadratic
/// `b0`,`b1`,`b2`.
///
/// From Hoppe et al., "Random-Access Rendering of General Vector Graphics":
/// the foot of the perpendicular is found by projecting onto the implicit
/// form built from the control triangle's signed areas.
fn bezier_distance_vector(b0: Vec2, b1: Vec2, b2: Vec2) -> Vec2 {
    let a = b0.cross(b2);
    let b = 2.0 * b1.cross(b0);
    let d = 2.0 * b2.cross(b1);
    let area4 = 2.0 * a + b + d;
    if area4.abs() < BEZIER_COLLINEAR_EPSILON {
        return closest_point_in_segment(b0, b2);
    }

    let f = b * d - a * a;
    let d21 = b2 - b1;
    let d10 = b1 - b0;
    let d20 = b2 - b0;
    let gf = (d21 * b + d10 * d + d20 * a) * 2.0;
    let gf = Vec2::new(gf.y, -gf.x);
    if gf.dot(gf) == 0.0 {
        return closest_point_in_segment(b0, b2);
    }
    let pp = gf * (-f / gf.dot(gf));
    let d0p = b0 - pp;
    let ap = d0p.cross(d20);
    let bp = 2.0 * d10.cross(d0p);
    let t = ((ap + bp) / area4).clamp(0.0, 1.0);
    b0.mix(b1, t).mix(b1.mix(b2, t), t)
}

/// Approximate unsigned distance to a quadratic bezier. Accurate near the
/// curve, which is where antialiasing needs it.
pub fn sd_bezier_approx(p: Vec2, b0: Vec2, b1: Vec2, b2: Vec2) -> f32 {
    bezier_distance_vector(b0 - p, b1 - p, b2 - p).length()
}

/// Exact unsigned distance to a quadratic bezier, by solving the cubic for
/// the closest parameter.
pub fn sd_bezier(pos: Vec2, a0: Vec2, b0: Vec2, c0: Vec2) -> f32 {
    let a = b0 - a0;
    let b = a0 - b0 * 2.0 + c0;
    let bb = b.dot(b);
    if bb < 1.0e-10 {
        // Control point on the chord's midpoint: a straight line.
        return sd_segment(pos, a0, c0);
    }
    let c = a * 2.0;
    let d = a0 - pos;
    let kk = 1.0 / bb;
    let kx = kk * a.dot(b);
    let ky = kk * (2.0 * a.dot(a) + d.dot(b)) / 3.0;
    let kz = kk * d.dot(a);
    let p = ky - kx * kx;
    let p3 = p * p * p;
    let q = kx * (2.0 * kx * kx - 3.0 * ky) + kz;
    let h = q * q + 4.0 * p3;
    let at = |t: f32| (d + (c + b * t) * t).length_squared();
    let res = if h >= 0.0 {
        let h = h.sqrt();
        let x0 = (h - q) / 2.0;
        let x1 = (-h - q) / 2.0;
        let t = (x0.cbrt() + x1.cbrt() - kx).clamp(0.0, 1.0);
        at(t)
    } else {
        let z = (-p).sqrt();
        let v = (q / (p * z * 2.0)).clamp(-1.0, 1.0).acos() / 3.0;
        let m = v.cos();
        let n = v.sin() * 1.732_050_8;
        let t0 = ((m + m) * z - kx).clamp(0.0, 1.0);
        let t1 = ((-n - m) * z - kx).clamp(0.0, 1.0);
        // The third root is never the closest.
        at(t0).min(at(t1))
    };
    res.sqrt()
}

/// Distance to a connector wire: a tanh step from `a` to `b`.
///
/// The vertical deviation from the curve is divided by the local slope
/// factor so stroke width stays even where the wire is steep.
pub fn sd_wire(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let sz = b - a;
    if sz.x.abs() < 1.0e-4 || sz.y.abs() < 1.0e-4 {
        return sd_segment(p, a, b);
    }
    let x = (p.x - a.x) / sz.x - 0.5;
    let y = a.y + sz.y * 0.5 * ((WIRE_STEEPNESS * x).tanh() + 1.0);
    let c = (WIRE_STEEPNESS * x).cosh();
    let dydx = 0.5 * WIRE_STEEPNESS / (c * c) * sz.y / sz.x;
    (p.y - y).abs() / (1.0 + dydx * dydx).sqrt()
}

fn span_cvs<'a>(shape: &Shape, cvs: &'a [Vec2]) -> &'a [Vec2] {
    shape
        .cv_range()
        .and_then(|range| cvs.get(range))
        .unwrap_or(&[])
}

/// Signed distance from `p` to `shape`. `cvs` is the scene's shared
/// control-vertex buffer.
pub fn distance(shape: &Shape, cvs: &[Vec2], p: Vec2) -> f32 {
    match *shape {
        Shape::Circle { center, radius } => sd_circle(p - center, radius),
        Shape::Arc {
            center,
            rotation,
            aperture,
            radius,
            width,
        } => sd_arc(p - center, rotation, aperture, radius, width * 0.5),
        Shape::Rect { min, max, radius } => {
            sd_box(p - (min + max) * 0.5, (max - min) * 0.5, radius)
        }
        Shape::Glyph { min, max, .. } => sd_box(p - (min + max) * 0.5, (max - min) * 0.5, 0.0),
        Shape::RectStroke {
            min,
            max,
            radius,
            width,
        } => {
            let center = (min + max) * 0.5;
            sd_box(p - center, (max - min) * 0.5, radius).abs() - width * 0.5
        }
        Shape::Bezier { cvs: [a, b, c], width } => sd_bezier_approx(p, a, b, c) - width * 0.5,
        Shape::Segment { a, b, width } => sd_segment(p, a, b) - width * 0.5,
        Shape::Curve { width, .. } => {
            let cvs = span_cvs(shape, cvs);
            let mut d = f32::MAX;
            let mut i = 0;
            while i + 2 < cvs.len() {
                d = d.min(sd_bezier_approx(p, cvs[i], cvs[i + 1], cvs[i + 2]));
                i += 2;
            }
            d - width * 0.5
        }
        Shape::Wire { a, b, width } => sd_wire(p, a, b) - width * 0.5,
        Shape::PathFill { .. } => {
            let cvs = span_cvs(shape, cvs);
            let d = cvs
                .chunks_exact(3)
                .map(|s| sd_bezier_approx(p, s[0], s[1], s[2]))
                .fold(f32::MAX, f32::min);
            if inside_spans(p, cvs) { -d } else { d }
        }
    }
}

fn stroke_width(shape: &Shape) -> f32 {
    match *shape {
        Shape::Arc { width, .. }
        | Shape::RectStroke { width, .. }
        | Shape::Bezier { width, .. }
        | Shape::Segment { width, .. }
        | Shape::Curve { width, .. }
        | Shape::Wire { width, .. } => width,
        _ => 0.0,
    }
}

/// Axis-aligned bounds of everything `distance` can report as inside,
/// padded by the stroke width.
pub fn bounds(shape: &Shape, cvs: &[Vec2]) -> BBox {
    let b = match *shape {
        Shape::Circle { center, radius } | Shape::Arc { center, radius, .. } => {
            BBox::new(center - Vec2::splat(radius), center + Vec2::splat(radius))
        }
        Shape::Rect { min, max, .. }
        | Shape::RectStroke { min, max, .. }
        | Shape::Glyph { min, max, .. } => BBox::new(min.min(max), min.max(max)),
        Shape::Bezier { cvs, .. } => BBox::from_points(&cvs),
        Shape::Segment { a, b, .. } | Shape::Wire { a, b, .. } => BBox::new(a.min(b), a.max(b)),
        Shape::Curve { .. } => BBox::from_points(span_cvs(shape, cvs)),
        Shape::PathFill { bounds, .. } => bounds,
    };
    b.inset(-stroke_width(shape))
}

/// Oriented bounds, tighter than [`bounds`] for rotated strokes.
pub fn oriented_bounds(shape: &Shape, cvs: &[Vec2]) -> Obb {
    let obb = match *shape {
        Shape::Bezier { cvs: [a, b, c], .. } => {
            let u = c - a;
            let w = b - a;
            let len2 = u.length_squared();
            let v = if len2 > 0.0 {
                w - u * (u.dot(w) / len2)
            } else {
                w
            };
            Obb { origin: a, u, v }
        }
        Shape::Segment { a, b, .. } => {
            let u = b - a;
            Obb {
                origin: a,
                u,
                v: u.rot90() * 0.001,
            }
        }
        _ => {
            let b = bounds(shape, cvs).inset(stroke_width(shape));
            let sz = b.size();
            Obb {
                origin: b.min,
                u: Vec2::new(sz.x, 0.0),
                v: Vec2::new(0.0, sz.y),
            }
        }
    };
    obb.inset(-stroke_width(shape))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPS: f32 = 1.0e-3;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn circle_sign() {
        let shape = Shape::Circle {
            center: Vec2::new(10.0, 10.0),
            radius: 5.0,
        };
        for i in 0..16 {
            let a = i as f32 * PI / 8.0;
            let dir = Vec2::new(a.cos(), a.sin());
            let on = Vec2::new(10.0, 10.0) + dir * 5.0;
            assert!(close(distance(&shape, &[], on), 0.0));
            assert!(distance(&shape, &[], on - dir) < 0.0);
            assert!(distance(&shape, &[], on + dir) > 0.0);
        }
    }

    #[test]
    fn rounded_box_with_zero_radius_is_plain_box() {
        let plain = |p: Vec2, b: Vec2| {
            let d = p.abs() - b;
            d.max(Vec2::ZERO).length() + d.x.max(d.y).min(0.0)
        };
        let half = Vec2::new(7.0, 3.0);
        for &(x, y) in &[(0.0, 0.0), (7.0, 1.0), (9.0, 5.0), (-3.0, 2.5), (20.0, -1.0), (-8.0, -4.0)] {
            let p = Vec2::new(x, y);
            assert!(close(sd_box(p, half, 0.0), plain(p, half)));
        }
    }

    #[test]
    fn rounded_rect_scenario() {
        let rect = Shape::Rect {
            min: Vec2::new(0.0, 0.0),
            max: Vec2::new(100.0, 40.0),
            radius: 8.0,
        };
        assert!(close(distance(&rect, &[], Vec2::new(50.0, 20.0)), -20.0));
        assert!(close(distance(&rect, &[], Vec2::new(100.0, 20.0)), 0.0));
        // Corner is rounded: the sharp corner lies outside.
        let corner = distance(&rect, &[], Vec2::new(100.0, 40.0));
        assert!(close(corner, 8.0 * 2f32.sqrt() - 8.0));
    }

    #[test]
    fn stroked_rect_is_a_ring() {
        let shape = Shape::RectStroke {
            min: Vec2::new(0.0, 0.0),
            max: Vec2::new(10.0, 10.0),
            radius: 0.0,
            width: 2.0,
        };
        assert!(close(distance(&shape, &[], Vec2::new(10.0, 5.0)), -1.0));
        assert!(close(distance(&shape, &[], Vec2::new(5.0, 5.0)), 4.0));
        assert!(close(distance(&shape, &[], Vec2::new(12.0, 5.0)), 1.0));
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let shape = Shape::Segment {
            a: Vec2::new(0.0, 0.0),
            b: Vec2::new(10.0, 0.0),
            width: 2.0,
        };
        assert!(close(distance(&shape, &[], Vec2::new(5.0, 3.0)), 2.0));
        assert!(close(distance(&shape, &[], Vec2::new(13.0, 4.0)), 4.0));
        assert!(close(distance(&shape, &[], Vec2::new(5.0, 0.0)), -1.0));
    }

    #[test]
    fn arc_band_and_endpoint() {
        let half_circle = Shape::Arc {
            center: Vec2::ZERO,
            rotation: Vec2::new(0.0, 1.0),
            aperture: Vec2::new(FRAC_PI_2.sin(), FRAC_PI_2.cos()),
            radius: 10.0,
            width: 2.0,
        };
        // On the arc.
        assert!(close(distance(&half_circle, &[], Vec2::new(-10.0, 0.0)), -1.0));
        // Opposite the arc: nearest is an endpoint at distance sqrt(200).
        assert!(close(
            distance(&half_circle, &[], Vec2::new(10.0, 0.0)),
            200f32.sqrt() - 1.0
        ));
        let full = Shape::Arc {
            center: Vec2::ZERO,
            rotation: Vec2::new(0.0, 1.0),
            aperture: Vec2::new(PI.sin(), PI.cos()),
            radius: 10.0,
            width: 2.0,
        };
        assert!(close(distance(&full, &[], Vec2::new(10.0, 0.0)), -1.0));
    }

    #[test]
    fn exact_bezier_matches_brute_force() {
        let (a, b, c) = (Vec2::new(0.0, 0.0), Vec2::new(50.0, 80.0), Vec2::new(100.0, 0.0));
        let brute = |p: Vec2| {
            (0..=20_000)
                .map(|i| {
                    let t = i as f32 / 20_000.0;
                    (a.mix(b, t).mix(b.mix(c, t), t) - p).length()
                })
                .fold(f32::MAX, f32::min)
        };
        for &(x, y) in &[(50.0, 20.0), (50.0, 60.0), (-10.0, 5.0), (120.0, 40.0), (30.0, 35.0)] {
            let p = Vec2::new(x, y);
            assert!((sd_bezier(p, a, b, c) - brute(p)).abs() < 0.05, "{p:?}");
        }
    }

    #[test]
    fn approx_bezier_is_accurate_near_curve() {
        let (a, b, c) = (Vec2::new(0.0, 0.0), Vec2::new(50.0, 80.0), Vec2::new(100.0, 0.0));
        for i in 1..10 {
            let t = i as f32 / 10.0;
            let on = a.mix(b, t).mix(b.mix(c, t), t);
            let tangent = (b.mix(c, t) - a.mix(b, t)).normalize();
            let p = on + tangent.rot90() * 0.5;
            let exact = sd_bezier(p, a, b, c);
            assert!((sd_bezier_approx(p, a, b, c) - exact).abs() < 0.1, "t = {t}");
        }
    }

    #[test]
    fn flat_bezier_falls_back_to_chord() {
        let (a, b, c) = (Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0), Vec2::new(10.0, 0.0));
        assert!(close(sd_bezier_approx(Vec2::new(5.0, 3.0), a, b, c), 3.0));
        assert!(close(sd_bezier(Vec2::new(5.0, 3.0), a, b, c), 3.0));
    }

    #[test]
    fn curve_takes_min_over_spans() {
        let cvs = [
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 5.0),
            Vec2::new(10.0, 10.0),
        ];
        let shape = Shape::Curve {
            start: 0,
            count: 2,
            width: 0.0,
        };
        assert!(close(distance(&shape, &cvs, Vec2::new(12.0, 8.0)), 2.0));
        assert!(close(distance(&shape, &cvs, Vec2::new(3.0, -1.0)), 1.0));
    }

    #[test]
    fn wire_centerline_and_degenerate() {
        let shape = Shape::Wire {
            a: Vec2::new(0.0, 0.0),
            b: Vec2::new(100.0, 50.0),
            width: 2.0,
        };
        assert!(close(distance(&shape, &[], Vec2::new(50.0, 25.0)), -1.0));
        let steep = distance(&shape, &[], Vec2::new(50.0, 35.0));
        // Slope 1.25 at the midpoint shrinks the vertical offset of 10.
        assert!(close(steep, 10.0 / (1.0f32 + 1.5625).sqrt() - 1.0));
        let flat = Shape::Wire {
            a: Vec2::new(0.0, 0.0),
            b: Vec2::new(100.0, 0.0),
            width: 0.0,
        };
        assert!(close(distance(&flat, &[], Vec2::new(50.0, 4.0)), 4.0));
    }

    #[test]
    fn path_fill_is_negative_inside() {
        let line = |a: Vec2, b: Vec2| [a, a.mix(b, 0.5), b];
        let p = [
            Vec2::new(0.0, 0.0),
            Vec2::new(20.0, 0.0),
            Vec2::new(20.0, 20.0),
            Vec2::new(0.0, 20.0),
        ];
        let cvs: Vec<Vec2> = (0..4).flat_map(|i| line(p[i], p[(i + 1) % 4])).collect();
        let shape = Shape::PathFill {
            start: 0,
            count: 4,
            bounds: BBox::new(p[0], p[2]),
        };
        assert!(close(distance(&shape, &cvs, Vec2::new(10.0, 5.0)), -5.0));
        assert!(close(distance(&shape, &cvs, Vec2::new(25.0, 10.0)), 5.0));
    }

    #[test]
    fn bounds_include_stroke() {
        let shape = Shape::Segment {
            a: Vec2::new(0.0, 0.0),
            b: Vec2::new(10.0, 5.0),
            width: 2.0,
        };
        let b = bounds(&shape, &[]);
        assert_eq!(b, BBox::new(Vec2::new(-2.0, -2.0), Vec2::new(12.0, 7.0)));
        let obb = oriented_bounds(&shape, &[]);
        for corner in obb.corners() {
            assert!(b.inset(-1.0).contains(corner));
        }
    }

    #[test]
    fn curve_with_missing_cvs_is_far_away() {
        let shape = Shape::Curve {
            start: 10,
            count: 2,
            width: 1.0,
        };
        assert!(distance(&shape, &[], Vec2::ZERO) > 1.0e30);
    }
}
