//! Pointer lifecycle, menus, selection and search/focus filtering.
//!
//! Handlers run synchronously on the host's UI thread and return the callbacks they produced
//! as [`InteractionEvent`]s, in the order they happened.

mod hit;
mod scheduler;
mod search;

use std::collections::HashSet;

use eframe::egui::{PointerButton, Pos2, Vec2};
use tracing::debug;

use crate::context::SimulationContext;
use crate::grouping::Group;
use crate::layout::LayoutMode;
use crate::viewport::Viewport;

pub use hit::{HIT_BUFFER, Hit, hit_test};
pub use scheduler::{DelayedActions, ScheduledAction};
pub use search::{
    Focus, SearchMode, Visibility, compute_visibility, expand_one_hop, search_matches,
};

pub const DRAG_THRESHOLD: f32 = 4.0;

#[derive(Clone, Debug, PartialEq)]
pub enum InteractionEvent {
    NodeClicked(String),
    GroupClicked { key: String, members: Vec<String> },
    SelectionChanged(Option<String>),
    FocusChanged(Option<Focus>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuTarget {
    Node(String),
    Group(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContextMenu {
    pub target: MenuTarget,
    pub anchor: Pos2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PointerState {
    #[default]
    Idle,
    Pressed {
        origin: Pos2,
        button: PointerButton,
        hit: Hit,
    },
    DraggingNode {
        index: usize,
        grab_offset: Vec2,
    },
    DraggingGroup {
        index: usize,
        last_world: Pos2,
    },
    Panning {
        last: Pos2,
    },
}

pub struct Scene<'a> {
    pub context: &'a mut SimulationContext,
    pub groups: &'a mut [Group],
    pub viewport: &'a mut Viewport,
    pub timers: &'a mut DelayedActions,
    pub visibility: &'a Visibility,
    pub layout_mode: LayoutMode,
    pub release_cooldown_secs: f64,
}

#[derive(Clone, Debug, Default)]
pub struct InteractionState {
    pub selected_node: Option<String>,
    pub hovered_node: Option<String>,
    pub dragged_node: Option<String>,
    pub dragged_group: Option<String>,
    pub node_menu: Option<String>,
    pub group_menu: Option<String>,
    pub context_menu: Option<ContextMenu>,
    pub focus: Option<Focus>,
    pub search_term: String,
    pub search_mode: SearchMode,
    pub search_results: Vec<String>,
    pub pointer: PointerState,
    pub drag_pins: Vec<String>,
}

impl InteractionState {
    pub fn is_dragging(&self) -> bool {
        matches!(
            self.pointer,
            PointerState::DraggingNode { .. }
                | PointerState::DraggingGroup { .. }
                | PointerState::Panning { .. }
        )
    }

    pub fn pointer_down(&mut self, scene: &mut Scene<'_>, screen: Pos2, button: PointerButton) {
        self.context_menu = None;
        let world = scene.viewport.screen_to_world(screen);
        let hit = hit_test(
            scene.context,
            scene.groups,
            scene.visibility,
            world,
            scene.viewport.scale(),
        );
        self.pointer = PointerState::Pressed {
            origin: screen,
            button,
            hit,
        };
    }

    pub fn pointer_move(&mut self, scene: &mut Scene<'_>, screen: Pos2) {
        let world = scene.viewport.screen_to_world(screen);
        match self.pointer {
            PointerState::Idle => {
                let hit = hit_test(
                    scene.context,
                    scene.groups,
                    scene.visibility,
                    world,
                    scene.viewport.scale(),
                );
                self.hovered_node = match hit {
                    Hit::Node(index) => scene.context.node(index).map(|node| node.id.clone()),
                    _ => None,
                };
            }
            PointerState::Pressed {
                origin,
                button,
                hit,
            } => {
                if origin.distance(screen) < DRAG_THRESHOLD {
                    return;
                }
                self.begin_drag(scene, origin, button, hit);
                self.pointer_move(scene, screen);
            }
            PointerState::DraggingNode { index, grab_offset } => {
                if let Some(node) = scene.context.node_mut(index) {
                    node.pin(world + grab_offset);
                }
            }
            PointerState::DraggingGroup { index, last_world } => {
                let delta = world - last_world;
                if let Some(group) = scene.groups.get_mut(index) {
                    group.bounds = group.bounds.translate(delta);
                    for &member in &group.members {
                        if let Some(node) = scene.context.node_mut(member) {
                            let target = node.position + delta;
                            node.pin(target);
                        }
                    }
                }
                self.pointer = PointerState::DraggingGroup {
                    index,
                    last_world: world,
                };
            }
            PointerState::Panning { last } => {
                scene.viewport.pan(screen - last);
                self.pointer = PointerState::Panning { last: screen };
            }
        }
    }

    fn begin_drag(&mut self, scene: &mut Scene<'_>, origin: Pos2, button: PointerButton, hit: Hit) {
        let origin_world = scene.viewport.screen_to_world(origin);
        self.hovered_node = None;
        self.pointer = match (button, hit) {
            (PointerButton::Primary, Hit::Node(index)) => match scene.context.node_mut(index) {
                Some(node) => {
                    scene.timers.cancel(&ScheduledAction::Unpin(node.id.clone()));
                    let grab_offset = node.position - origin_world;
                    let at = node.position;
                    node.pin(at);
                    self.dragged_node = Some(node.id.clone());
                    self.drag_pins = vec![node.id.clone()];
                    debug!(node = %node.id, "node drag started");
                    PointerState::DraggingNode { index, grab_offset }
                }
                None => PointerState::Panning { last: origin },
            },
            (
                PointerButton::Primary,
                Hit::Group {
                    index,
                    header: true,
                },
            ) => match scene.groups.get(index) {
                Some(group) => {
                    self.drag_pins.clear();
                    for &member in &group.members {
                        if let Some(node) = scene.context.node_mut(member) {
                            scene.timers.cancel(&ScheduledAction::Unpin(node.id.clone()));
                            let at = node.position;
                            node.pin(at);
                            self.drag_pins.push(node.id.clone());
                        }
                    }
                    self.dragged_group = Some(group.key.clone());
                    debug!(group = %group.key, "group drag started");
                    PointerState::DraggingGroup {
                        index,
                        last_world: origin_world,
                    }
                }
                None => PointerState::Panning { last: origin },
            },
            _ => PointerState::Panning { last: origin },
        };
    }

    pub fn pointer_up(&mut self, scene: &mut Scene<'_>, screen: Pos2, now: f64) -> Vec<InteractionEvent> {
        let pointer = std::mem::take(&mut self.pointer);
        match pointer {
            PointerState::Pressed { button, hit, .. } => match button {
                PointerButton::Primary => self.click(scene, hit),
                PointerButton::Secondary => {
                    self.open_context_menu(scene, hit, screen);
                    Vec::new()
                }
                _ => Vec::new(),
            },
            PointerState::DraggingNode { .. } => {
                if let Some(id) = self.dragged_node.take() {
                    debug!(node = %id, "node drag released");
                }
                self.release(scene, now);
                Vec::new()
            }
            PointerState::DraggingGroup { .. } => {
                if let Some(key) = self.dragged_group.take() {
                    debug!(group = %key, "group drag released");
                }
                self.release(scene, now);
                Vec::new()
            }
            PointerState::Panning { .. } | PointerState::Idle => Vec::new(),
        }
    }

    /// Dropped nodes stay where they were left. Under force layout they go back to the
    /// simulation once the cooldown passes.
    fn release(&mut self, scene: &mut Scene<'_>, now: f64) {
        let pins = std::mem::take(&mut self.drag_pins);
        if scene.layout_mode.pins_positions() {
            return;
        }
        let due_at = now + scene.release_cooldown_secs;
        for id in pins {
            if scene.context.index_of(&id).is_some() {
                scene.timers.arm(ScheduledAction::Unpin(id), due_at);
            }
        }
    }

    /// Ends a drag cut short by a data or layout refresh. Under force layout the nodes it pinned
    /// go straight back to the simulation, looked up by id since indices may have shifted.
    pub fn abandon_gesture(&mut self, context: &mut SimulationContext, layout_mode: LayoutMode) {
        if matches!(self.pointer, PointerState::Idle) && self.drag_pins.is_empty() {
            return;
        }
        self.pointer = PointerState::Idle;
        self.dragged_node = None;
        self.dragged_group = None;

        let pins = std::mem::take(&mut self.drag_pins);
        if layout_mode.pins_positions() {
            return;
        }
        let mut released = 0;
        for id in &pins {
            if let Some(index) = context.index_of(id)
                && let Some(node) = context.node_mut(index)
            {
                node.unpin();
                released += 1;
            }
        }
        debug!(released, "drag abandoned by refresh");
    }

    fn click(&mut self, scene: &mut Scene<'_>, hit: Hit) -> Vec<InteractionEvent> {
        let mut events = Vec::new();
        match hit {
            Hit::Node(index) => {
                let Some(id) = scene.context.node(index).map(|node| node.id.clone()) else {
                    return events;
                };
                self.group_menu = None;
                self.node_menu = if self.node_menu.as_deref() == Some(id.as_str()) {
                    None
                } else {
                    Some(id.clone())
                };
                events.push(InteractionEvent::NodeClicked(id.clone()));
                if let Some(changed) = self.select(Some(id)) {
                    events.push(changed);
                }
            }
            Hit::Group { index, .. } => {
                let Some(group) = scene.groups.get(index) else {
                    return events;
                };
                self.node_menu = None;
                self.group_menu = if self.group_menu.as_deref() == Some(group.key.as_str()) {
                    None
                } else {
                    Some(group.key.clone())
                };
                events.push(InteractionEvent::GroupClicked {
                    key: group.key.clone(),
                    members: group.member_ids(scene.context),
                });
            }
            Hit::Empty => {
                self.close_menus();
                if let Some(changed) = self.select(None) {
                    events.push(changed);
                }
            }
        }
        events
    }

    fn open_context_menu(&mut self, scene: &Scene<'_>, hit: Hit, anchor: Pos2) {
        let target = match hit {
            Hit::Node(index) => scene
                .context
                .node(index)
                .map(|node| MenuTarget::Node(node.id.clone())),
            Hit::Group { index, .. } => scene
                .groups
                .get(index)
                .map(|group| MenuTarget::Group(group.key.clone())),
            Hit::Empty => None,
        };
        self.context_menu = target.map(|target| ContextMenu { target, anchor });
    }

    pub fn select(&mut self, id: Option<String>) -> Option<InteractionEvent> {
        if self.selected_node == id {
            return None;
        }
        self.selected_node = id.clone();
        Some(InteractionEvent::SelectionChanged(id))
    }

    pub fn set_focus(&mut self, focus: Option<Focus>) -> Option<InteractionEvent> {
        if self.focus == focus {
            return None;
        }
        self.focus = focus.clone();
        self.close_menus();
        Some(InteractionEvent::FocusChanged(focus))
    }

    pub fn close_menus(&mut self) {
        self.node_menu = None;
        self.group_menu = None;
        self.context_menu = None;
    }

    /// Node whose neighbourhood is highlighted: the selection, else the hovered node.
    pub fn highlight_anchor(&self, context: &SimulationContext) -> Option<usize> {
        self.selected_node
            .as_deref()
            .or(self.hovered_node.as_deref())
            .and_then(|id| context.index_of(id))
    }

    pub fn prune(&mut self, context: &SimulationContext, groups: &[Group]) {
        let node_exists = |id: &Option<String>| id.as_deref().is_some_and(|id| context.index_of(id).is_some());
        let group_exists =
            |key: &Option<String>| key.as_deref().is_some_and(|key| groups.iter().any(|group| group.key == key));

        if !node_exists(&self.selected_node) {
            self.selected_node = None;
        }
        if !node_exists(&self.hovered_node) {
            self.hovered_node = None;
        }
        if !node_exists(&self.node_menu) {
            self.node_menu = None;
        }
        if !group_exists(&self.group_menu) {
            self.group_menu = None;
        }
        if let Some(menu) = &self.context_menu {
            let alive = match &menu.target {
                MenuTarget::Node(id) => context.index_of(id).is_some(),
                MenuTarget::Group(key) => groups.iter().any(|group| &group.key == key),
            };
            if !alive {
                self.context_menu = None;
            }
        }
        let focus_alive = match &self.focus {
            None => true,
            Some(Focus::Node(id)) => context.index_of(id).is_some(),
            Some(Focus::Group(key)) => groups.iter().any(|group| &group.key == key),
        };
        if !focus_alive {
            self.focus = None;
        }

        let ids = context
            .nodes()
            .iter()
            .map(|node| node.id.as_str())
            .collect::<HashSet<_>>();
        self.search_results.retain(|id| ids.contains(id.as_str()));
    }
}

/// Unpins nodes whose release cooldown has elapsed. Nodes being dragged again are skipped.
pub fn fire_due_actions(
    timers: &mut DelayedActions,
    context: &mut SimulationContext,
    state: &InteractionState,
    now: f64,
) -> usize {
    let mut fired = 0;
    for action in timers.drain_due(now) {
        match &action {
            ScheduledAction::Unpin(id) => {
                if state.dragged_node.as_deref() == Some(id.as_str()) {
                    continue;
                }
                if let Some(index) = context.index_of(id)
                    && let Some(node) = context.node_mut(index)
                {
                    node.unpin();
                    fired += 1;
                }
            }
        }
    }
    fired
}
