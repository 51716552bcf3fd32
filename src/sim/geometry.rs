//! Swept circle-circle intersection
//!
//! A moving circle travels from `p0` to `p1` during one tick. We solve
//! `|f + t·d|² = R²` with `d = p1 - p0`, `f = p0 - c` and `R` the combined
//! radius, and report the first parametric time `t ∈ [0, 1]` at which the two
//! circles touch. Circles already overlapping at the start report `t = 0`.

use glam::Vec2;

/// First time of contact along the motion segment, if any
///
/// - `p0`, `p1`: start and end center of the moving circle
/// - `r_moving`: radius of the moving circle
/// - `c`, `r_static`: center and radius of the stationary circle
pub fn swept_circle_circle(p0: Vec2, p1: Vec2, r_moving: f32, c: Vec2, r_static: f32) -> Option<f32> {
    let d = p1 - p0;
    let f = p0 - c;
    let r = r_moving + r_static;

    let a = d.dot(d);
    let b = 2.0 * f.dot(d);
    let c_term = f.dot(f) - r * r;

    // Zero-length motion: the quadratic degenerates, only a static overlap can count
    if a <= f32::EPSILON {
        return (c_term < 0.0).then_some(0.0);
    }

    let discriminant = b * b - 4.0 * a * c_term;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);

    if (0.0..=1.0).contains(&t1) {
        return Some(t1);
    }
    // Started inside: the entry root lies behind us. An exit root inside the
    // step still reports contact at t = 0, where the bodies already touch.
    if t1 < 0.0 && t2 >= 0.0 {
        return Some(0.0);
    }
    if (0.0..=1.0).contains(&t2) {
        return Some(t2);
    }
    None
}

/// Plain overlap test for bodies that didn't move this tick
#[inline]
pub fn circles_overlap(a: Vec2, r_a: f32, b: Vec2, r_b: f32) -> bool {
    a.distance(b) < r_a + r_b
}

/// Point reached after travelling fraction `t` of the segment
#[inline]
pub fn point_at(p0: Vec2, p1: Vec2, t: f32) -> Vec2 {
    p0 + (p1 - p0) * t
}
