use eframe::egui::Pos2;
use rand::Rng;
use tracing::debug;

use crate::geometry::{COINCIDENT_EPSILON, aabb_overlap, centroid, random_unit};

use super::Group;

pub const MAX_OVERLAP_PASSES: usize = 30;
pub const MAX_COLLISION_PASSES: usize = 25;
pub const GROUP_MARGIN: f32 = 24.0;

const OVERLAP_SLACK: f32 = 0.5;
const CENTERING_NUDGE: f32 = 0.35;
const MIN_PUSH_ALIGNMENT: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub passes: usize,
    pub converged: bool,
}

/// Pushes apart members of one group that sit closer than `radius_a + radius_b + min_gap`,
/// then nudges the group's centroid back towards `target_center`.
pub fn resolve_member_overlaps<R: Rng + ?Sized>(
    positions: &mut [Pos2],
    radii: &[f32],
    members: &[usize],
    min_gap: f32,
    target_center: Pos2,
    rng: &mut R,
) -> Resolution {
    let mut resolution = Resolution {
        passes: 0,
        converged: members.len() < 2,
    };

    while !resolution.converged && resolution.passes < MAX_OVERLAP_PASSES {
        resolution.passes += 1;
        let mut violations = 0usize;

        for (offset, &a) in members.iter().enumerate() {
            for &b in &members[offset + 1..] {
                let required = radius(radii, a) + radius(radii, b) + min_gap;
                let delta = positions[a] - positions[b];
                let distance = delta.length();
                if distance >= required {
                    continue;
                }

                violations += 1;
                let direction = if distance > COINCIDENT_EPSILON {
                    delta / distance
                } else {
                    random_unit(rng)
                };
                let push = direction * ((required - distance + OVERLAP_SLACK) * 0.5);
                positions[a] += push;
                positions[b] -= push;
            }
        }

        resolution.converged = violations == 0;
    }

    if let Some(current) = centroid(members.iter().map(|&index| positions[index])) {
        let nudge = (target_center - current) * CENTERING_NUDGE;
        for &index in members {
            positions[index] += nudge;
        }
    }

    resolution
}

fn radius(radii: &[f32], index: usize) -> f32 {
    radii.get(index).copied().unwrap_or(0.0)
}

pub fn resolve_group_collisions<R: Rng + ?Sized>(
    groups: &mut [Group],
    positions: &mut [Pos2],
    margin: f32,
    rng: &mut R,
) -> Resolution {
    let mut resolution = Resolution {
        passes: 0,
        converged: groups.len() < 2,
    };

    while !resolution.converged && resolution.passes < MAX_COLLISION_PASSES {
        resolution.passes += 1;
        let mut collisions = 0usize;

        for i in 0..groups.len() {
            for j in (i + 1)..groups.len() {
                let Some(overlap) = aabb_overlap(groups[i].bounds, groups[j].bounds, margin)
                else {
                    continue;
                };
                collisions += 1;

                let delta = groups[j].bounds.center() - groups[i].bounds.center();
                let distance = delta.length();
                if distance <= COINCIDENT_EPSILON {
                    let kick = random_unit(rng) * (overlap.min_elem() * 0.5 + 1.0);
                    groups[j].translate(kick, positions);
                    continue;
                }

                let direction = delta / distance;
                let (depth, alignment) = if overlap.x < overlap.y {
                    (overlap.x, direction.x.abs())
                } else {
                    (overlap.y, direction.y.abs())
                };
                let amount = (depth + 1.0) / alignment.max(MIN_PUSH_ALIGNMENT);
                let push = direction * (amount * 0.5);
                groups[i].translate(-push, positions);
                groups[j].translate(push, positions);
            }
        }

        resolution.converged = collisions == 0;
    }

    debug!(
        groups = groups.len(),
        passes = resolution.passes,
        converged = resolution.converged,
        "group collision resolution finished"
    );
    resolution
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Pos2, Rect, pos2};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::{GROUP_MARGIN, resolve_group_collisions, resolve_member_overlaps};
    use crate::grouping::Group;

    fn group(key: &str, members: Vec<usize>, center: Pos2, size: f32) -> Group {
        Group {
            key: key.to_owned(),
            label: key.to_owned(),
            members,
            bounds: Rect::from_center_size(center, eframe::egui::Vec2::splat(size)),
        }
    }

    #[test]
    fn member_overlaps_are_pushed_to_required_spacing() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut positions = vec![
            pos2(0.0, 0.0),
            pos2(5.0, 0.0),
            pos2(5.0, 5.0),
            pos2(0.0, 0.0),
        ];
        let radii = vec![10.0; 4];
        let members = vec![0, 1, 2, 3];

        let resolution =
            resolve_member_overlaps(&mut positions, &radii, &members, 12.0, pos2(0.0, 0.0), &mut rng);
        assert!(resolution.converged, "{resolution:?}");

        for a in 0..4 {
            for b in (a + 1)..4 {
                let distance = positions[a].distance(positions[b]);
                assert!(distance >= 32.0 - 0.01, "{a}-{b} at {distance}");
            }
        }
    }

    #[test]
    fn single_member_needs_no_passes() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut positions = vec![pos2(10.0, 10.0)];
        let resolution =
            resolve_member_overlaps(&mut positions, &[5.0], &[0], 4.0, pos2(10.0, 10.0), &mut rng);
        assert_eq!(resolution.passes, 0);
        assert_eq!(positions[0], pos2(10.0, 10.0));
    }

    #[test]
    fn overlapping_boxes_separate_and_carry_members() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut positions = vec![pos2(0.0, 0.0), pos2(40.0, 10.0), pos2(80.0, 30.0)];
        let mut groups = vec![
            group("a", vec![0], pos2(0.0, 0.0), 100.0),
            group("b", vec![1], pos2(40.0, 10.0), 100.0),
            group("c", vec![2], pos2(80.0, 30.0), 100.0),
        ];

        let resolution = resolve_group_collisions(&mut groups, &mut positions, GROUP_MARGIN, &mut rng);
        assert!(resolution.converged, "{resolution:?}");

        for a in 0..groups.len() {
            for b in (a + 1)..groups.len() {
                assert!(!groups[a].bounds.intersects(groups[b].bounds));
            }
            let center = groups[a].bounds.center();
            assert!(center.distance(positions[groups[a].members[0]]) < 1e-3);
        }
    }

    #[test]
    fn exactly_stacked_boxes_are_kicked_apart() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut positions = vec![pos2(0.0, 0.0), pos2(0.0, 0.0)];
        let mut groups = vec![
            group("a", vec![0], pos2(0.0, 0.0), 80.0),
            group("b", vec![1], pos2(0.0, 0.0), 80.0),
        ];

        let resolution = resolve_group_collisions(&mut groups, &mut positions, GROUP_MARGIN, &mut rng);
        assert!(resolution.converged, "{resolution:?}");
        assert!(!groups[0].bounds.intersects(groups[1].bounds));
        assert!(positions[0].distance(positions[1]) > 0.0);
    }
}
