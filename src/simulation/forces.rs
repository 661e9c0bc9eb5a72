use eframe::egui::{Pos2, Vec2};
use rand::Rng;

use crate::context::Link;
use crate::geometry::{COINCIDENT_EPSILON, random_unit};
use crate::util::stable_pair;

use super::ForceParams;

pub(super) fn accumulate_springs(
    links: &[Link],
    ids: &[&str],
    positions: &[Pos2],
    params: &ForceParams,
    deltas: &mut [Vec2],
) {
    let node_count = positions.len();
    for link in links {
        if link.is_self_loop() || link.source >= node_count || link.target >= node_count {
            continue;
        }

        let delta = positions[link.target] - positions[link.source];
        let distance = delta.length();
        if distance <= COINCIDENT_EPSILON || !distance.is_finite() {
            continue;
        }

        let ideal = ideal_length(ids[link.source], ids[link.target], params);
        let force = (distance - ideal) * params.spring_strength;
        let pull = delta / distance * (force * 0.5);
        deltas[link.source] += pull;
        deltas[link.target] -= pull;
    }
}

fn ideal_length(source: &str, target: &str, params: &ForceParams) -> f32 {
    if params.spring_jitter <= 0.0 {
        return params.ideal_distance;
    }
    let (jitter, _) = stable_pair(&(source, target));
    params.ideal_distance * (1.0 + jitter * params.spring_jitter)
}

/// Pairwise repulsion with a strong inner band and a weak outer band.
///
/// Exactly coincident pairs are pushed apart in `positions` right away along a random
/// direction; pinned nodes never move.
pub(super) fn accumulate_repulsion<R: Rng + ?Sized>(
    positions: &mut [Pos2],
    pinned: &[bool],
    params: &ForceParams,
    rng: &mut R,
    deltas: &mut [Vec2],
) -> usize {
    let node_count = positions.len();
    let nudge = (params.min_distance * 0.05).max(0.5);
    let mut displaced = 0usize;

    for i in 0..node_count {
        for j in (i + 1)..node_count {
            let delta = positions[i] - positions[j];
            let distance = delta.length();

            if distance <= COINCIDENT_EPSILON {
                if separate_coincident(positions, pinned, i, j, nudge, rng) {
                    displaced += 1;
                }
                continue;
            }

            let magnitude = if distance < params.min_distance {
                params.strong_repulsion * (params.min_distance - distance)
            } else if distance < params.repulsion_distance {
                params.weak_repulsion * (params.repulsion_distance - distance)
            } else {
                continue;
            };

            let push = delta / distance * magnitude;
            deltas[i] += push;
            deltas[j] -= push;
        }
    }

    displaced
}

fn separate_coincident<R: Rng + ?Sized>(
    positions: &mut [Pos2],
    pinned: &[bool],
    i: usize,
    j: usize,
    nudge: f32,
    rng: &mut R,
) -> bool {
    let direction = random_unit(rng);
    match (pinned[i], pinned[j]) {
        (true, true) => false,
        (false, true) => {
            positions[i] += direction * (nudge * 2.0);
            true
        }
        (true, false) => {
            positions[j] -= direction * (nudge * 2.0);
            true
        }
        (false, false) => {
            positions[i] += direction * nudge;
            positions[j] -= direction * nudge;
            true
        }
    }
}

pub(super) fn accumulate_centering(
    positions: &[Pos2],
    center: Pos2,
    center_force: f32,
    deltas: &mut [Vec2],
) {
    for (position, delta) in positions.iter().zip(deltas.iter_mut()) {
        *delta += (center - *position) * center_force;
    }
}
