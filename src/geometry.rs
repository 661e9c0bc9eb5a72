//! Point, vector and box helpers shared by the physics, layout and interaction code.
//!
//! World positions are [`Pos2`], displacements and velocities are [`Vec2`], group boxes are
//! [`Rect`]s.

use std::f32::consts::TAU;

use eframe::egui::{Pos2, Rect, Vec2, pos2};
use rand::Rng;

pub const COINCIDENT_EPSILON: f32 = 1e-4;

pub fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    Vec2::angled(rng.gen_range(0.0..TAU))
}

/// Unit direction from `to` towards `from`, or a random one when the points coincide.
pub fn separation_direction<R: Rng + ?Sized>(from: Pos2, to: Pos2, rng: &mut R) -> (Vec2, f32) {
    let delta = from - to;
    let distance = delta.length();
    if distance > COINCIDENT_EPSILON && distance.is_finite() {
        (delta / distance, distance)
    } else {
        (random_unit(rng), 0.0)
    }
}

pub fn bounds_of(points: impl IntoIterator<Item = Pos2>) -> Option<Rect> {
    let mut bounds = Rect::NOTHING;
    let mut any = false;
    for point in points {
        if !point.x.is_finite() || !point.y.is_finite() {
            continue;
        }
        bounds.extend_with(point);
        any = true;
    }
    any.then_some(bounds)
}

pub fn bounds_of_circles(circles: impl IntoIterator<Item = (Pos2, f32)>) -> Option<Rect> {
    let mut bounds: Option<Rect> = None;
    for (center, radius) in circles {
        if !center.x.is_finite() || !center.y.is_finite() {
            continue;
        }
        let circle = Rect::from_center_size(center, Vec2::splat(radius.max(0.0) * 2.0));
        bounds = Some(bounds.map_or(circle, |rect| rect.union(circle)));
    }
    bounds
}

/// Penetration depth of two boxes along each axis once both are grown by `margin`.
///
/// Returns `None` when the padded boxes do not overlap.
pub fn aabb_overlap(a: Rect, b: Rect, margin: f32) -> Option<Vec2> {
    let delta = b.center() - a.center();
    let overlap_x = (a.width() + b.width()) * 0.5 + margin - delta.x.abs();
    let overlap_y = (a.height() + b.height()) * 0.5 + margin - delta.y.abs();
    (overlap_x > 0.0 && overlap_y > 0.0).then(|| Vec2::new(overlap_x, overlap_y))
}

pub fn centroid(points: impl IntoIterator<Item = Pos2>) -> Option<Pos2> {
    let mut sum = Vec2::ZERO;
    let mut count = 0usize;
    for point in points {
        sum += point.to_vec2();
        count += 1;
    }
    (count > 0).then(|| (sum / count as f32).to_pos2())
}

pub fn is_finite(point: Pos2) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

pub fn curved_edge_points(start: Pos2, end: Pos2, bend: f32, segments: usize) -> Vec<Pos2> {
    let delta = end - start;
    let length = delta.length();
    if length <= COINCIDENT_EPSILON {
        return vec![start, end];
    }

    let normal = Vec2::new(-delta.y, delta.x) / length;
    let control = start + delta * 0.5 + normal * (length * bend);
    let segments = segments.max(2);
    (0..=segments)
        .map(|step| {
            let t = step as f32 / segments as f32;
            let inverse = 1.0 - t;
            pos2(
                inverse * inverse * start.x + 2.0 * inverse * t * control.x + t * t * end.x,
                inverse * inverse * start.y + 2.0 * inverse * t * control.y + t * t * end.y,
            )
        })
        .collect()
}
