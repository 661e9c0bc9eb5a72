mod forces;

use eframe::egui::{Pos2, Vec2};
use rand::Rng;

use crate::context::SimulationContext;
use crate::layout::LayoutMode;
use forces::{accumulate_centering, accumulate_repulsion, accumulate_springs};

const MIN_SLEEP_SPEED_SQ: f32 = 0.01 * 0.01;
const MIN_SLEEP_FORCE_SQ: f32 = 0.02 * 0.02;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceParams {
    pub spring_strength: f32,
    pub ideal_distance: f32,
    /// Relative spread applied per link to the ideal distance, `0.2` means ±20%.
    pub spring_jitter: f32,
    pub min_distance: f32,
    pub repulsion_distance: f32,
    pub strong_repulsion: f32,
    pub weak_repulsion: f32,
    pub center_force: f32,
    pub damping: f32,
    pub max_speed: f32,
}

impl ForceParams {
    pub fn for_mode(mode: LayoutMode, node_spacing: f32) -> Self {
        let spacing = node_spacing.max(1.0);
        let free = Self {
            spring_strength: 0.01,
            ideal_distance: spacing,
            spring_jitter: 0.2,
            min_distance: spacing * 0.5,
            repulsion_distance: spacing * 2.0,
            strong_repulsion: 0.08,
            weak_repulsion: 0.003,
            center_force: 0.0015,
            damping: 0.85,
            max_speed: 30.0,
        };

        match mode {
            LayoutMode::Force => free,
            LayoutMode::Hierarchical | LayoutMode::Circular | LayoutMode::Grouped => Self {
                spring_strength: 0.004,
                strong_repulsion: free.strong_repulsion * 0.5,
                weak_repulsion: free.weak_repulsion * 0.5,
                center_force: 0.0005,
                damping: 0.7,
                max_speed: 12.0,
                ..free
            },
        }
    }
}

/// Advances every unpinned node by one tick. Returns whether anything is still moving.
pub fn step<R: Rng + ?Sized>(
    context: &mut SimulationContext,
    params: &ForceParams,
    center: Pos2,
    rng: &mut R,
) -> bool {
    let node_count = context.len();
    if node_count == 0 {
        return false;
    }

    let mut positions = context.positions();
    let pinned = context
        .nodes()
        .iter()
        .map(|node| node.is_pinned())
        .collect::<Vec<_>>();
    let mut deltas = vec![Vec2::ZERO; node_count];

    accumulate_repulsion(&mut positions, &pinned, params, rng, &mut deltas);
    {
        let ids = context
            .nodes()
            .iter()
            .map(|node| node.id.as_str())
            .collect::<Vec<_>>();
        accumulate_springs(context.links(), &ids, &positions, params, &mut deltas);
    }
    accumulate_centering(&positions, center, params.center_force, &mut deltas);

    let damping = params.damping.clamp(0.0, 0.999);
    let max_speed_sq = params.max_speed * params.max_speed;
    let mut any_motion = false;
    for ((node, position), delta) in context
        .nodes_mut()
        .iter_mut()
        .zip(positions)
        .zip(deltas)
    {
        if let Some(pin) = node.pinned {
            node.position = pin;
            node.velocity = Vec2::ZERO;
            continue;
        }

        let delta = if delta.x.is_finite() && delta.y.is_finite() {
            delta
        } else {
            Vec2::ZERO
        };
        let mut velocity = (node.velocity + delta) * damping;
        let speed_sq = velocity.length_sq();
        if speed_sq > max_speed_sq {
            velocity *= params.max_speed / speed_sq.sqrt();
        }
        if velocity.length_sq() < MIN_SLEEP_SPEED_SQ && delta.length_sq() < MIN_SLEEP_FORCE_SQ {
            velocity = Vec2::ZERO;
        }

        node.velocity = velocity;
        node.position = position + velocity;
        if velocity != Vec2::ZERO || node.position != position {
            any_motion = true;
        }
    }

    any_motion
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::{ForceParams, step};
    use crate::context::SimulationContext;
    use crate::layout::LayoutMode;
    use crate::model::{EdgeKind, EdgeRecord, GraphData, NodeKind, NodeRecord};

    fn pair(linked: bool) -> SimulationContext {
        let data = GraphData {
            nodes: vec![
                NodeRecord::new("a", "a", NodeKind::Class),
                NodeRecord::new("b", "b", NodeKind::Class),
            ],
            edges: if linked {
                vec![EdgeRecord::new("a", "b", EdgeKind::Uses)]
            } else {
                Vec::new()
            },
        };
        SimulationContext::from_data(&data, 10.0)
    }

    #[test]
    fn coincident_nodes_separate_after_one_tick() {
        let mut context = pair(false);
        for node in context.nodes_mut() {
            node.position = pos2(100.0, 100.0);
        }
        let params = ForceParams::for_mode(LayoutMode::Force, 150.0);
        let mut rng = StdRng::seed_from_u64(11);

        step(&mut context, &params, pos2(100.0, 100.0), &mut rng);

        let nodes = context.nodes();
        assert!(nodes[0].position.distance(nodes[1].position) > 0.0);
    }

    #[test]
    fn pinned_node_holds_while_neighbor_is_pulled() {
        let mut context = pair(true);
        if let Some(node) = context.node_mut(0) {
            node.pin(pos2(0.0, 0.0));
        }
        if let Some(node) = context.node_mut(1) {
            node.position = pos2(600.0, 0.0);
        }
        let params = ForceParams::for_mode(LayoutMode::Force, 150.0);
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..5 {
            step(&mut context, &params, pos2(0.0, 0.0), &mut rng);
        }

        assert_eq!(context.nodes()[0].position, pos2(0.0, 0.0));
        assert!(context.nodes()[1].position.x < 600.0);
    }

    #[test]
    fn linked_pair_settles_near_the_ideal_distance() {
        let mut context = pair(true);
        if let Some(node) = context.node_mut(0) {
            node.position = pos2(-400.0, 30.0);
        }
        if let Some(node) = context.node_mut(1) {
            node.position = pos2(420.0, -10.0);
        }
        let params = ForceParams::for_mode(LayoutMode::Force, 150.0);
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..600 {
            step(&mut context, &params, pos2(0.0, 0.0), &mut rng);
        }

        let nodes = context.nodes();
        let distance = nodes[0].position.distance(nodes[1].position);
        assert!(distance.is_finite());
        assert!(distance > 0.3 * 150.0 && distance < 2.0 * 150.0, "distance {distance}");
        assert!(nodes[0].velocity.length() < 0.5);
    }

    #[test]
    fn damping_is_always_below_one() {
        for mode in [
            LayoutMode::Force,
            LayoutMode::Hierarchical,
            LayoutMode::Circular,
            LayoutMode::Grouped,
        ] {
            let params = ForceParams::for_mode(mode, 150.0);
            assert!(params.damping < 1.0);
        }
        let free = ForceParams::for_mode(LayoutMode::Force, 150.0);
        let gentle = ForceParams::for_mode(LayoutMode::Grouped, 150.0);
        assert!(gentle.spring_strength < free.spring_strength);
        assert!(gentle.center_force < free.center_force);
    }

    #[test]
    fn empty_context_is_a_no_op() {
        let mut context = SimulationContext::default();
        let params = ForceParams::for_mode(LayoutMode::Force, 150.0);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(!step(&mut context, &params, pos2(0.0, 0.0), &mut rng));
    }
}
