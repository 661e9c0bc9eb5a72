use std::cmp::Reverse;

use eframe::egui::{Pos2, Vec2, vec2};
use rand::Rng;
use tracing::debug;

use crate::context::SimulationContext;
use crate::geometry::bounds_of_circles;
use crate::grouping::{
    GROUP_HEADER_HEIGHT, GROUP_MARGIN, GROUP_PADDING, Group, GroupingMode, member_bounds,
    partition, resolve_group_collisions, resolve_member_overlaps,
};

use super::{LayoutOutcome, MIN_NODE_GAP, max_radius};

const INTERIOR_SPACING_FACTOR: f32 = 0.6;
const CELL_GAP_FACTOR: f32 = 0.5;
const SMALL_GROUP_LIMIT: usize = 6;

/// Groups tiled on a near-square grid, each interior laid out as a small tree, then
/// member overlaps and box collisions resolved.
pub fn grouped<R: Rng + ?Sized>(
    context: &SimulationContext,
    grouping: GroupingMode,
    spacing: f32,
    center: Pos2,
    rng: &mut R,
) -> LayoutOutcome {
    let count = context.len();
    if count == 0 {
        return LayoutOutcome::default();
    }

    let mode = match grouping {
        GroupingMode::None => GroupingMode::ByFile,
        other => other,
    };
    let partitions = partition(context, mode);
    let radii = context
        .nodes()
        .iter()
        .map(|node| node.radius)
        .collect::<Vec<_>>();
    let interior_spacing =
        (spacing * INTERIOR_SPACING_FACTOR).max(max_radius(context) * 2.0 + MIN_NODE_GAP);

    let interiors = partitions
        .iter()
        .map(|(_, _, members)| {
            let ordered = rank_members(context, members);
            let offsets = interior_offsets(ordered.len(), interior_spacing);
            ordered.into_iter().zip(offsets).collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut cell = Vec2::ZERO;
    for interior in &interiors {
        let extent = bounds_of_circles(
            interior
                .iter()
                .map(|(index, offset)| (offset.to_pos2(), radii[*index])),
        )
        .map(|rect| rect.size())
        .unwrap_or(Vec2::ZERO);
        cell = cell.max(extent);
    }
    let gap = spacing * CELL_GAP_FACTOR + GROUP_PADDING * 2.0 + GROUP_MARGIN;
    cell += vec2(gap, gap + GROUP_HEADER_HEIGHT);

    let group_count = interiors.len();
    let columns = (group_count as f32).sqrt().ceil().max(1.0) as usize;
    let rows = group_count.div_ceil(columns);
    let mut positions = vec![center; count];
    let mut group_centers = Vec::with_capacity(group_count);
    for (slot, interior) in interiors.iter().enumerate() {
        let column = slot % columns;
        let row = slot / columns;
        let group_center = center
            + vec2(
                (column as f32 - (columns - 1) as f32 * 0.5) * cell.x,
                (row as f32 - (rows - 1) as f32 * 0.5) * cell.y,
            );
        for (index, offset) in interior {
            positions[*index] = group_center + *offset;
        }
        group_centers.push(group_center);
    }

    for ((_, _, members), group_center) in partitions.iter().zip(&group_centers) {
        resolve_member_overlaps(
            &mut positions,
            &radii,
            members,
            MIN_NODE_GAP,
            *group_center,
            rng,
        );
    }

    let mut groups = partitions
        .into_iter()
        .map(|(key, label, members)| Group {
            bounds: member_bounds(&positions, &radii, &members),
            key,
            label,
            members,
        })
        .collect::<Vec<_>>();
    let resolution = resolve_group_collisions(&mut groups, &mut positions, GROUP_MARGIN, rng);

    debug!(
        groups = groups.len(),
        columns,
        collision_passes = resolution.passes,
        "grouped layout placed"
    );
    LayoutOutcome { positions, groups }
}

fn rank_members(context: &SimulationContext, members: &[usize]) -> Vec<usize> {
    let mut ranked = members
        .iter()
        .map(|&index| {
            let internal = context
                .neighbors(index)
                .filter(|neighbor| members.contains(neighbor))
                .count();
            let total = context.node(index).map_or(0, |node| node.connections);
            (index, internal, total)
        })
        .collect::<Vec<_>>();
    ranked.sort_by_key(|&(index, internal, total)| (Reverse(internal), Reverse(total), index));
    ranked.into_iter().map(|(index, _, _)| index).collect()
}

/// Offsets from the group center, sized to the member count:
/// one node centered, two side by side, up to six as root over one row of children, more as
/// root over a middle row over wrapped leaf rows.
fn interior_offsets(count: usize, spacing: f32) -> Vec<Vec2> {
    match count {
        0 => Vec::new(),
        1 => vec![Vec2::ZERO],
        2 => vec![vec2(-spacing * 0.5, 0.0), vec2(spacing * 0.5, 0.0)],
        n if n <= SMALL_GROUP_LIMIT => {
            let mut offsets = vec![vec2(0.0, -spacing * 0.5)];
            offsets.extend(row(n - 1, spacing, spacing * 0.5));
            offsets
        }
        n => {
            let middle = ((n - 1) as f32).sqrt().ceil().max(2.0) as usize;
            let middle = middle.min(n - 1);
            let leaves = n - 1 - middle;
            let per_row = (middle * 2).max(4);

            let mut offsets = vec![vec2(0.0, -spacing)];
            offsets.extend(row(middle, spacing, 0.0));
            let mut placed = 0;
            let mut depth = 1.0;
            while placed < leaves {
                let in_row = per_row.min(leaves - placed);
                offsets.extend(row(in_row, spacing, spacing * depth));
                placed += in_row;
                depth += 1.0;
            }
            offsets
        }
    }
}

fn row(count: usize, spacing: f32, y: f32) -> impl Iterator<Item = Vec2> {
    let middle = count.saturating_sub(1) as f32 * 0.5;
    (0..count).map(move |slot| vec2((slot as f32 - middle) * spacing, y))
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::{grouped, interior_offsets};
    use crate::context::SimulationContext;
    use crate::grouping::{GROUP_MARGIN, GroupingMode};
    use crate::layout::MIN_NODE_GAP;
    use crate::model::{EdgeKind, EdgeRecord, GraphData, NodeKind, NodeRecord};

    fn multi_file_graph() -> SimulationContext {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        for (file, size) in [("src/a.rs", 1), ("src/b.rs", 2), ("src/c.rs", 5), ("src/d.rs", 11)] {
            for member in 0..size {
                let id = format!("{file}#{member}");
                nodes.push(
                    NodeRecord::new(id.clone(), format!("m{member}"), NodeKind::Function)
                        .with_file_path(file),
                );
                if member > 0 {
                    edges.push(EdgeRecord::new(format!("{file}#0"), id, EdgeKind::Calls));
                }
            }
        }
        edges.push(EdgeRecord::new("src/a.rs#0", "src/d.rs#3", EdgeKind::Imports));
        SimulationContext::from_data(&GraphData { nodes, edges }, 10.0)
    }

    #[test]
    fn interior_shapes_follow_member_count() {
        assert_eq!(interior_offsets(1, 50.0), vec![pos2(0.0, 0.0).to_vec2()]);

        let pair = interior_offsets(2, 50.0);
        assert_eq!(pair[0].y, pair[1].y);
        assert!(pair[0].x < pair[1].x);

        let small = interior_offsets(5, 50.0);
        assert!(small[1..].iter().all(|offset| offset.y > small[0].y));

        let large = interior_offsets(12, 50.0);
        assert_eq!(large.len(), 12);
        let distinct_rows = {
            let mut rows = large.iter().map(|offset| offset.y as i32).collect::<Vec<_>>();
            rows.sort_unstable();
            rows.dedup();
            rows.len()
        };
        assert!(distinct_rows >= 3);
    }

    #[test]
    fn grouped_layout_keeps_members_apart_and_boxes_disjoint() {
        let context = multi_file_graph();
        let mut rng = StdRng::seed_from_u64(13);
        let outcome = grouped(&context, GroupingMode::ByFile, 150.0, pos2(0.0, 0.0), &mut rng);

        assert_eq!(outcome.groups.len(), 4);
        for group in &outcome.groups {
            for (offset, &a) in group.members.iter().enumerate() {
                for &b in &group.members[offset + 1..] {
                    let required = context.nodes()[a].radius + context.nodes()[b].radius + MIN_NODE_GAP;
                    let distance = outcome.positions[a].distance(outcome.positions[b]);
                    assert!(distance >= required - 0.5, "{} {a}-{b}", group.key);
                }
            }
        }

        for (offset, a) in outcome.groups.iter().enumerate() {
            for b in &outcome.groups[offset + 1..] {
                assert!(
                    !a.bounds
                        .expand(GROUP_MARGIN * 0.45)
                        .intersects(b.bounds.expand(GROUP_MARGIN * 0.45)),
                    "{} overlaps {}",
                    a.key,
                    b.key
                );
            }
        }
    }

    #[test]
    fn group_boxes_contain_their_members() {
        let context = multi_file_graph();
        let mut rng = StdRng::seed_from_u64(13);
        let outcome = grouped(&context, GroupingMode::ByFile, 150.0, pos2(0.0, 0.0), &mut rng);
        for group in &outcome.groups {
            for &member in &group.members {
                assert!(group.bounds.contains(outcome.positions[member]));
            }
        }
    }

    #[test]
    fn ungrouped_request_falls_back_to_files() {
        let context = multi_file_graph();
        let mut rng = StdRng::seed_from_u64(13);
        let outcome = grouped(&context, GroupingMode::None, 150.0, pos2(0.0, 0.0), &mut rng);
        assert_eq!(outcome.groups.len(), 4);
    }
}
