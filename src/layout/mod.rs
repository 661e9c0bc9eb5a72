//! Deterministic placement algorithms.
//!
//! Every algorithm is total: it returns one finite position per node for any input, including
//! empty, single-node, disconnected and cyclic graphs.

mod circular;
mod grouped;
mod hierarchical;

use eframe::egui::Pos2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::SimulationContext;
use crate::grouping::{Group, GroupingMode};

pub use circular::{circle_radius, circular};
pub use grouped::grouped;
pub use hierarchical::{hierarchical, levels};

pub const MIN_NODE_GAP: f32 = 12.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    #[default]
    Force,
    Hierarchical,
    Circular,
    Grouped,
}

impl LayoutMode {
    pub const ALL: [Self; 4] = [Self::Force, Self::Hierarchical, Self::Circular, Self::Grouped];

    pub fn label(self) -> &'static str {
        match self {
            Self::Force => "Force",
            Self::Hierarchical => "Hierarchical",
            Self::Circular => "Circular",
            Self::Grouped => "Grouped",
        }
    }

    /// Deterministic modes pin their output so the simulation leaves it alone.
    pub fn pins_positions(self) -> bool {
        !matches!(self, Self::Force)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutSettings {
    pub node_spacing: f32,
    pub center: Pos2,
    pub grouping: GroupingMode,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutOutcome {
    pub positions: Vec<Pos2>,
    pub groups: Vec<Group>,
}

/// Target positions for `mode`. Force mode gets a circular seed to relax from.
pub fn compute<R: Rng + ?Sized>(
    mode: LayoutMode,
    context: &SimulationContext,
    settings: &LayoutSettings,
    rng: &mut R,
) -> LayoutOutcome {
    let spacing = if settings.node_spacing.is_finite() && settings.node_spacing > 0.0 {
        settings.node_spacing
    } else {
        crate::config::DEFAULT_NODE_SPACING
    };

    let outcome = match mode {
        LayoutMode::Force | LayoutMode::Circular => LayoutOutcome {
            positions: circular(context.len(), spacing, settings.center),
            groups: Vec::new(),
        },
        LayoutMode::Hierarchical => LayoutOutcome {
            positions: hierarchical(context, spacing, settings.center),
            groups: Vec::new(),
        },
        LayoutMode::Grouped => grouped(context, settings.grouping, spacing, settings.center, rng),
    };

    debug!(
        mode = mode.label(),
        nodes = outcome.positions.len(),
        groups = outcome.groups.len(),
        "layout computed"
    );
    outcome
}

fn max_radius(context: &SimulationContext) -> f32 {
    context
        .nodes()
        .iter()
        .map(|node| node.radius)
        .fold(0.0, f32::max)
}
