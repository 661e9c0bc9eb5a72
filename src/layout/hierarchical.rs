use std::collections::VecDeque;

use eframe::egui::{Pos2, pos2};

use crate::context::SimulationContext;

use super::{MIN_NODE_GAP, max_radius};

const LEVEL_SPACING_FACTOR: f32 = 1.5;
const ROW_SPACING_FACTOR: f32 = 0.8;

/// BFS levels along link direction.
///
/// Nodes without incoming links seed level 0 and a node takes its parent's level plus one on
/// first visit. Nodes only reachable through cycles are seeded at level 1, so level 0 stays
/// exactly the in-degree-0 set.
pub fn levels(context: &SimulationContext) -> Vec<usize> {
    let count = context.len();
    let mut level = vec![usize::MAX; count];
    let mut queue = VecDeque::new();

    for (index, slot) in level.iter_mut().enumerate() {
        if context.incoming(index).is_empty() {
            *slot = 0;
            queue.push_back(index);
        }
    }
    visit(context, &mut level, &mut queue);

    for start in 0..count {
        if level[start] != usize::MAX {
            continue;
        }
        level[start] = 1;
        queue.push_back(start);
        visit(context, &mut level, &mut queue);
    }

    level
}

fn visit(context: &SimulationContext, level: &mut [usize], queue: &mut VecDeque<usize>) {
    while let Some(node) = queue.pop_front() {
        let next_level = level[node] + 1;
        for &next in context.outgoing(node) {
            if level[next] == usize::MAX {
                level[next] = next_level;
                queue.push_back(next);
            }
        }
    }
}

/// Columns by level, left to right; each column spread vertically around `center.y`.
pub fn hierarchical(context: &SimulationContext, spacing: f32, center: Pos2) -> Vec<Pos2> {
    let count = context.len();
    if count == 0 {
        return Vec::new();
    }

    let levels = levels(context);
    let max_level = levels.iter().copied().max().unwrap_or(0);
    let mut columns = vec![Vec::new(); max_level + 1];
    for (index, &level) in levels.iter().enumerate() {
        columns[level].push(index);
    }

    let level_spacing = spacing * LEVEL_SPACING_FACTOR;
    let row_spacing = (spacing * ROW_SPACING_FACTOR).max(max_radius(context) * 2.0 + MIN_NODE_GAP);
    let base_x = center.x - (max_level as f32 * level_spacing) * 0.5;

    let mut positions = vec![center; count];
    for (level, column) in columns.iter().enumerate() {
        let x = base_x + level as f32 * level_spacing;
        let middle = (column.len().saturating_sub(1)) as f32 * 0.5;
        for (row, &index) in column.iter().enumerate() {
            positions[index] = pos2(x, center.y + (row as f32 - middle) * row_spacing);
        }
    }
    positions
}
