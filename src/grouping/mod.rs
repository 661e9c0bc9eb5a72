//! Partitioning of nodes into named groups and the boxes drawn around them.

mod collision;

use std::collections::BTreeMap;

use eframe::egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::context::{NodeState, SimulationContext};
use crate::geometry::bounds_of_circles;
use crate::model::EdgeKind;
use crate::util::short_path_label;

pub use collision::{
    GROUP_MARGIN, MAX_COLLISION_PASSES, MAX_OVERLAP_PASSES, Resolution, resolve_group_collisions,
    resolve_member_overlaps,
};

pub const ROOT_GROUP_KEY: &str = "root";
const PARENT_KEY_PREFIX: &str = "parent:";
pub const GROUP_PADDING: f32 = 30.0;
pub const GROUP_HEADER_HEIGHT: f32 = 22.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    #[default]
    None,
    ByFile,
    ByParent,
}

impl GroupingMode {
    pub const ALL: [Self; 3] = [Self::None, Self::ByFile, Self::ByParent];

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::ByFile => "By file",
            Self::ByParent => "By parent",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub key: String,
    pub label: String,
    pub members: Vec<usize>,
    pub bounds: Rect,
}

impl Group {
    pub fn header_rect(&self) -> Rect {
        Rect::from_min_max(
            self.bounds.min,
            Pos2::new(
                self.bounds.max.x,
                (self.bounds.min.y + GROUP_HEADER_HEIGHT).min(self.bounds.max.y),
            ),
        )
    }

    pub fn member_ids(&self, context: &SimulationContext) -> Vec<String> {
        self.members
            .iter()
            .filter_map(|&index| context.node(index).map(|node| node.id.clone()))
            .collect()
    }

    pub fn contains_member(&self, index: usize) -> bool {
        self.members.contains(&index)
    }

    pub(crate) fn translate(&mut self, delta: Vec2, positions: &mut [Pos2]) {
        self.bounds = self.bounds.translate(delta);
        for &member in &self.members {
            if let Some(position) = positions.get_mut(member) {
                *position += delta;
            }
        }
    }
}

pub fn file_group_key(node: &NodeState) -> String {
    node.file_path
        .as_deref()
        .map(short_path_label)
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| format!("Unknown ({})", node.kind.label()))
}

/// Key of the group holding the children of `parent`. Prefixed so a node whose id is `root`
/// cannot merge with the parentless bucket.
pub fn parent_group_key(parent: &NodeState) -> String {
    format!("{PARENT_KEY_PREFIX}{}", parent.id)
}

/// Immediate container of every node according to `contains` links; first link wins.
pub fn parent_indices(context: &SimulationContext) -> Vec<Option<usize>> {
    let mut parents = vec![None; context.len()];
    for link in context.links() {
        if link.kind != EdgeKind::Contains || link.is_self_loop() {
            continue;
        }
        if parents[link.target].is_none() {
            parents[link.target] = Some(link.source);
        }
    }
    parents
}

/// `(key, label, members)` triples ordered by key. Every node lands in exactly one entry.
pub fn partition(context: &SimulationContext, mode: GroupingMode) -> Vec<(String, String, Vec<usize>)> {
    let mut buckets: BTreeMap<String, (String, Vec<usize>)> = BTreeMap::new();
    match mode {
        GroupingMode::None => return Vec::new(),
        GroupingMode::ByFile => {
            for (index, node) in context.nodes().iter().enumerate() {
                let key = file_group_key(node);
                buckets
                    .entry(key.clone())
                    .or_insert_with(|| (key, Vec::new()))
                    .1
                    .push(index);
            }
        }
        GroupingMode::ByParent => {
            let parents = parent_indices(context);
            for (index, parent) in parents.into_iter().enumerate() {
                let (key, label) = match parent.and_then(|parent| context.node(parent)) {
                    Some(parent) => (parent_group_key(parent), parent.name.clone()),
                    None => (ROOT_GROUP_KEY.to_owned(), ROOT_GROUP_KEY.to_owned()),
                };
                buckets
                    .entry(key)
                    .or_insert_with(|| (label, Vec::new()))
                    .1
                    .push(index);
            }
        }
    }

    buckets
        .into_iter()
        .map(|(key, (label, members))| (key, label, members))
        .collect()
}

pub fn member_bounds(positions: &[Pos2], radii: &[f32], members: &[usize]) -> Rect {
    let circles = members.iter().filter_map(|&index| {
        Some((*positions.get(index)?, radii.get(index).copied().unwrap_or(0.0)))
    });
    let Some(bounds) = bounds_of_circles(circles) else {
        return Rect::NOTHING;
    };
    let mut bounds = bounds.expand(GROUP_PADDING);
    bounds.min.y -= GROUP_HEADER_HEIGHT;
    bounds
}

pub fn build_groups(context: &SimulationContext, mode: GroupingMode) -> Vec<Group> {
    let positions = context.positions();
    let radii = context
        .nodes()
        .iter()
        .map(|node| node.radius)
        .collect::<Vec<_>>();
    partition(context, mode)
        .into_iter()
        .map(|(key, label, members)| Group {
            bounds: member_bounds(&positions, &radii, &members),
            key,
            label,
            members,
        })
        .collect()
}

pub fn refresh_bounds(groups: &mut [Group], context: &SimulationContext) {
    let positions = context.positions();
    let radii = context
        .nodes()
        .iter()
        .map(|node| node.radius)
        .collect::<Vec<_>>();
    for group in groups {
        group.members.retain(|&index| index < positions.len());
        group.bounds = member_bounds(&positions, &radii, &group.members);
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::{GROUP_HEADER_HEIGHT, GROUP_PADDING, GroupingMode, ROOT_GROUP_KEY, build_groups, partition};
    use crate::context::SimulationContext;
    use crate::model::{EdgeKind, EdgeRecord, GraphData, NodeKind, NodeRecord};

    fn sample() -> SimulationContext {
        let data = GraphData {
            nodes: vec![
                NodeRecord::new("app", "App", NodeKind::Component).with_file_path("src/App.tsx"),
                NodeRecord::new("render", "render", NodeKind::Method).with_file_path("src/App.tsx"),
                NodeRecord::new("util", "util", NodeKind::Function).with_file_path("./src/lib/util.ts"),
                NodeRecord::new("ghost", "ghost", NodeKind::Class),
            ],
            edges: vec![
                EdgeRecord::new("app", "render", EdgeKind::Contains),
                EdgeRecord::new("util", "render", EdgeKind::Contains),
                EdgeRecord::new("app", "util", EdgeKind::Uses),
                EdgeRecord::new("ghost", "ghost", EdgeKind::Contains),
            ],
        };
        SimulationContext::from_data(&data, 10.0)
    }

    #[test]
    fn by_file_groups_use_short_labels_and_type_fallback() {
        let groups = partition(&sample(), GroupingMode::ByFile);
        let keys = groups.iter().map(|(key, _, _)| key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, ["App", "Unknown (class)", "util"]);
        assert_eq!(groups[0].2, vec![0, 1]);
    }

    #[test]
    fn by_parent_uses_first_contains_edge_and_root_fallback() {
        let groups = partition(&sample(), GroupingMode::ByParent);
        let app = groups
            .iter()
            .find(|(key, _, _)| key == "parent:app")
            .expect("app contains render");
        assert_eq!(app.1, "App");
        assert_eq!(app.2, vec![1]);

        let root = groups
            .iter()
            .find(|(key, _, _)| key == ROOT_GROUP_KEY)
            .expect("root group exists");
        assert_eq!(root.2, vec![0, 2, 3]);

        let total = groups.iter().map(|(_, _, members)| members.len()).sum::<usize>();
        assert_eq!(total, 4);
    }

    #[test]
    fn container_named_root_stays_apart_from_parentless_nodes() {
        let data = GraphData {
            nodes: vec![
                NodeRecord::new("root", "Root", NodeKind::Component),
                NodeRecord::new("child", "Child", NodeKind::Function),
                NodeRecord::new("loose", "Loose", NodeKind::Function),
            ],
            edges: vec![EdgeRecord::new("root", "child", EdgeKind::Contains)],
        };
        let context = SimulationContext::from_data(&data, 10.0);
        let groups = partition(&context, GroupingMode::ByParent);

        let keys = groups.iter().map(|(key, _, _)| key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, ["parent:root", ROOT_GROUP_KEY]);
        assert_eq!(groups[0].2, vec![1]);
        assert_eq!(groups[1].2, vec![0, 2]);
    }

    #[test]
    fn no_grouping_yields_no_groups() {
        assert!(partition(&sample(), GroupingMode::None).is_empty());
    }

    #[test]
    fn group_bounds_cover_members_with_padding_and_header() {
        let mut context = sample();
        for (index, node) in context.nodes_mut().iter_mut().enumerate() {
            node.position = pos2(index as f32 * 100.0, 0.0);
        }
        let groups = build_groups(&context, GroupingMode::ByFile);
        let app = &groups[0];
        let radius = context.nodes()[0].radius;
        assert!((app.bounds.min.x - (0.0 - radius - GROUP_PADDING)).abs() < 1e-3);
        assert!(
            (app.bounds.min.y - (0.0 - context.nodes()[0].radius.max(context.nodes()[1].radius)
                - GROUP_PADDING
                - GROUP_HEADER_HEIGHT))
                .abs()
                < 1e-3
        );
        assert!(app.header_rect().height() <= GROUP_HEADER_HEIGHT + 1e-3);
    }
}
