use eframe::egui::Pos2;

use crate::context::SimulationContext;
use crate::grouping::Group;
use crate::viewport::screen_radius;

use super::Visibility;

pub const HIT_BUFFER: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hit {
    Node(usize),
    Group { index: usize, header: bool },
    Empty,
}

/// Resolves what lies under `world`. Nodes win over group boxes, which win over the canvas.
/// Hidden nodes, and groups with no visible member, cannot be hit.
pub fn hit_test(
    context: &SimulationContext,
    groups: &[Group],
    visibility: &Visibility,
    world: Pos2,
    scale: f32,
) -> Hit {
    let scale = scale.max(f32::EPSILON);
    let node = context
        .nodes()
        .iter()
        .enumerate()
        .filter(|(index, _)| visibility.is_node_visible(*index))
        .filter_map(|(index, node)| {
            let distance = node.position.distance(world);
            (distance * scale <= screen_radius(node.radius, scale) + HIT_BUFFER)
                .then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((index, _)) = node {
        return Hit::Node(index);
    }

    // Later groups draw on top, so they are tested first.
    for (index, group) in groups.iter().enumerate().rev() {
        if !group
            .members
            .iter()
            .any(|&member| visibility.is_node_visible(member))
        {
            continue;
        }
        if group.header_rect().contains(world) {
            return Hit::Group {
                index,
                header: true,
            };
        }
        if group.bounds.contains(world) {
            return Hit::Group {
                index,
                header: false,
            };
        }
    }

    Hit::Empty
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Rect, pos2};

    use super::{Hit, hit_test};
    use crate::context::SimulationContext;
    use crate::grouping::Group;
    use crate::interaction::Visibility;
    use crate::model::{GraphData, NodeKind, NodeRecord};

    fn scene() -> (SimulationContext, Vec<Group>) {
        let data = GraphData {
            nodes: vec![
                NodeRecord::new("a", "a", NodeKind::Class),
                NodeRecord::new("b", "b", NodeKind::Class),
            ],
            edges: Vec::new(),
        };
        let mut context = SimulationContext::from_data(&data, 10.0);
        context.apply_positions(&[pos2(100.0, 100.0), pos2(400.0, 400.0)], true);
        let groups = vec![Group {
            key: "file".to_owned(),
            label: "file".to_owned(),
            members: vec![0],
            bounds: Rect::from_min_max(pos2(50.0, 50.0), pos2(200.0, 200.0)),
        }];
        (context, groups)
    }

    #[test]
    fn node_inside_group_box_wins() {
        let (context, groups) = scene();
        let hit = hit_test(&context, &groups, &Visibility::all(), pos2(104.0, 101.0), 1.0);
        assert_eq!(hit, Hit::Node(0));
    }

    #[test]
    fn box_outside_node_radius_hits_group() {
        let (context, groups) = scene();
        assert_eq!(
            hit_test(&context, &groups, &Visibility::all(), pos2(180.0, 180.0), 1.0),
            Hit::Group {
                index: 0,
                header: false
            }
        );
        assert_eq!(
            hit_test(&context, &groups, &Visibility::all(), pos2(60.0, 55.0), 1.0),
            Hit::Group {
                index: 0,
                header: true
            }
        );
        assert_eq!(
            hit_test(&context, &groups, &Visibility::all(), pos2(300.0, 100.0), 1.0),
            Hit::Empty
        );
    }

    #[test]
    fn buffer_is_measured_in_screen_pixels() {
        let (context, groups) = scene();
        let radius = context.nodes()[1].radius;
        let probe = pos2(400.0 + radius + 3.0, 400.0);
        assert_eq!(
            hit_test(&context, &groups, &Visibility::all(), probe, 1.0),
            Hit::Node(1)
        );
        assert_eq!(
            hit_test(&context, &groups, &Visibility::all(), probe, 0.5),
            Hit::Node(1)
        );
        assert_eq!(
            hit_test(&context, &groups, &Visibility::all(), probe, 4.0),
            Hit::Empty
        );
    }

    #[test]
    fn hit_area_follows_the_clamped_drawn_radius() {
        let data = GraphData {
            nodes: vec![NodeRecord::new("big", "big", NodeKind::Class)],
            edges: Vec::new(),
        };
        let mut context = SimulationContext::from_data(&data, 24.0);
        context.apply_positions(&[pos2(0.0, 0.0)], true);

        // 24 world units at scale 5 would be 120 px, but the circle is drawn at 60 px.
        let clear = pos2(14.0, 0.0);
        assert_eq!(hit_test(&context, &[], &Visibility::all(), clear, 5.0), Hit::Empty);
        let inside = pos2(12.0, 0.0);
        assert_eq!(hit_test(&context, &[], &Visibility::all(), inside, 5.0), Hit::Node(0));
    }

    #[test]
    fn hidden_nodes_are_not_hit() {
        let (context, groups) = scene();
        let visibility = Visibility::only([1]);
        assert_eq!(
            hit_test(&context, &groups, &visibility, pos2(100.0, 100.0), 1.0),
            Hit::Empty
        );
    }
}
