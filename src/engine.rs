//! The facade a host talks to: data refreshes, configuration changes, pointer input, keyboard
//! actions and frames all go through [`GraphEngine`].

use eframe::egui::{PointerButton, Pos2, Vec2, vec2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::config::{EdgeStyle, GraphConfig};
use crate::context::{RefreshSummary, SimulationContext};
use crate::grouping::{Group, GroupingMode, build_groups, refresh_bounds};
use crate::interaction::{
    DelayedActions, Focus, InteractionEvent, InteractionState, ScheduledAction, Scene, SearchMode,
    Visibility, compute_visibility, fire_due_actions, search_matches,
};
use crate::layout::{self, LayoutMode, LayoutSettings};
use crate::model::GraphData;
use crate::render::{self, DrawStats, DrawSurface, FrameView, RenderLoop};
use crate::simulation::{self, ForceParams};
use crate::viewport::{Viewport, ZOOM_STEP};

const DEFAULT_SURFACE_SIZE: Vec2 = vec2(1280.0, 800.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EngineAction {
    ResetView,
    FitView,
    ZoomIn,
    ZoomOut,
    AutoLayout,
    CloseMenus,
}

impl EngineAction {
    pub const ALL: [Self; 6] = [
        Self::ResetView,
        Self::FitView,
        Self::ZoomIn,
        Self::ZoomOut,
        Self::AutoLayout,
        Self::CloseMenus,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::ResetView => "Reset view",
            Self::FitView => "Fit view",
            Self::ZoomIn => "Zoom in",
            Self::ZoomOut => "Zoom out",
            Self::AutoLayout => "Auto layout",
            Self::CloseMenus => "Close menus",
        }
    }
}

pub struct GraphEngine {
    config: GraphConfig,
    context: SimulationContext,
    groups: Vec<Group>,
    viewport: Viewport,
    interaction: InteractionState,
    timers: DelayedActions,
    visibility: Visibility,
    render_loop: RenderLoop,
    params: ForceParams,
    surface_size: Vec2,
    rng: StdRng,
    loaded: bool,
}

impl GraphEngine {
    pub fn new(config: GraphConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_seed(config: GraphConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GraphConfig, rng: StdRng) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(error) => {
                warn!(%error, "invalid graph configuration, using defaults");
                GraphConfig::default()
            }
        };
        let mut interaction = InteractionState::default();
        interaction.search_mode = config.search_mode;
        let mut render_loop = RenderLoop::default();
        render_loop.start();

        Self {
            params: ForceParams::for_mode(config.layout_mode, config.node_spacing),
            config,
            context: SimulationContext::default(),
            groups: Vec::new(),
            viewport: Viewport::default(),
            interaction,
            timers: DelayedActions::default(),
            visibility: Visibility::all(),
            render_loop,
            surface_size: DEFAULT_SURFACE_SIZE,
            rng,
            loaded: false,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    pub fn surface_size(&self) -> Vec2 {
        self.surface_size
    }

    pub fn set_surface_size(&mut self, size: Vec2) {
        if size.x.is_finite() && size.y.is_finite() && size.min_elem() > 0.0 {
            self.surface_size = size;
        }
    }

    /// World point the centering force pulls towards and layouts are centred on.
    pub fn layout_center(&self) -> Pos2 {
        (self.surface_size * 0.5).to_pos2()
    }

    pub fn set_data(&mut self, data: &GraphData) -> RefreshSummary {
        let first_load = !self.loaded;
        let spawn_at = self.viewport.world_center(self.surface_size);
        let summary = self.context.replace(data, spawn_at, self.config.node_size);

        if self.config.layout_mode == LayoutMode::Force && !first_load {
            self.regroup();
        } else {
            self.run_layout();
        }

        self.timers
            .retain(|action| self.context.index_of(action.node_id()).is_some());
        self.interaction.prune(&self.context, &self.groups);
        self.refresh_search();
        if first_load {
            self.fit_view();
        }
        self.loaded = true;
        self.render_loop.wake();

        debug!(
            mode = self.config.layout_mode.label(),
            groups = self.groups.len(),
            first_load,
            "graph data applied"
        );
        summary
    }

    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        if self.config.layout_mode == mode {
            return;
        }
        info!(from = self.config.layout_mode.label(), to = mode.label(), "layout mode changed");
        self.config.layout_mode = mode;
        self.params = ForceParams::for_mode(mode, self.config.node_spacing);
        self.timers.clear();
        if mode == LayoutMode::Force {
            self.context.unpin_all();
            self.regroup();
        } else {
            self.run_layout();
        }
        self.render_loop.wake();
    }

    pub fn set_grouping_mode(&mut self, mode: GroupingMode) {
        if self.config.grouping_mode == mode {
            return;
        }
        info!(from = self.config.grouping_mode.label(), to = mode.label(), "grouping mode changed");
        self.config.grouping_mode = mode;
        if self.config.layout_mode == LayoutMode::Grouped {
            self.run_layout();
        } else {
            self.regroup();
        }
    }

    pub fn set_node_spacing(&mut self, spacing: f32) {
        if !spacing.is_finite() || spacing <= 0.0 {
            warn!(spacing, "ignoring invalid node spacing");
            return;
        }
        self.config.node_spacing = spacing;
        self.params = ForceParams::for_mode(self.config.layout_mode, spacing);
        if self.config.layout_mode.pins_positions() {
            self.run_layout();
        }
        self.render_loop.wake();
    }

    pub fn set_node_size(&mut self, size: f32) {
        if !size.is_finite() || size <= 0.0 {
            warn!(size, "ignoring invalid node size");
            return;
        }
        self.config.node_size = size;
        self.context.set_node_size(size);
        refresh_bounds(&mut self.groups, &self.context);
    }

    pub fn set_edge_style(&mut self, style: EdgeStyle) {
        self.config.edge_style = style;
    }

    pub fn set_animation_enabled(&mut self, enabled: bool) {
        if self.config.animation_enabled != enabled {
            info!(enabled, "animation toggled");
        }
        self.config.animation_enabled = enabled;
        self.render_loop.wake();
    }

    pub fn set_search_term(&mut self, term: &str) {
        if self.interaction.search_term == term {
            return;
        }
        self.interaction.search_term = term.to_owned();
        self.refresh_search();
    }

    pub fn set_search_mode(&mut self, mode: SearchMode) {
        self.config.search_mode = mode;
        self.interaction.search_mode = mode;
        self.refresh_search();
    }

    pub fn set_focus(&mut self, focus: Option<Focus>) -> Option<InteractionEvent> {
        let event = self.interaction.set_focus(focus);
        self.refresh_visibility();
        event
    }

    pub fn select_node(&mut self, id: Option<&str>) -> Option<InteractionEvent> {
        let id = id.filter(|id| self.context.index_of(id).is_some());
        self.interaction.select(id.map(str::to_owned))
    }

    /// Centres the node on screen at a fixed zoom. Returns false for unknown ids.
    pub fn zoom_to_node(&mut self, id: &str) -> bool {
        let Some(node) = self.context.node_by_id(id) else {
            return false;
        };
        self.viewport.zoom_to(node.position, self.surface_size);
        true
    }

    pub fn perform(&mut self, action: EngineAction) {
        debug!(action = action.label(), "engine action");
        let center = (self.surface_size * 0.5).to_pos2();
        match action {
            EngineAction::ResetView => self.viewport.reset(),
            EngineAction::FitView => self.fit_view(),
            EngineAction::ZoomIn => self.viewport.zoom_by(center, ZOOM_STEP),
            EngineAction::ZoomOut => self.viewport.zoom_by(center, 1.0 / ZOOM_STEP),
            EngineAction::AutoLayout => {
                self.timers.clear();
                self.run_layout();
                self.render_loop.wake();
            }
            EngineAction::CloseMenus => self.interaction.close_menus(),
        }
    }

    pub fn pointer_down(&mut self, screen: Pos2, button: PointerButton) {
        let mut scene = Scene {
            context: &mut self.context,
            groups: &mut self.groups,
            viewport: &mut self.viewport,
            timers: &mut self.timers,
            visibility: &self.visibility,
            layout_mode: self.config.layout_mode,
            release_cooldown_secs: self.config.release_cooldown_secs(),
        };
        self.interaction.pointer_down(&mut scene, screen, button);
    }

    pub fn pointer_move(&mut self, screen: Pos2) {
        let mut scene = Scene {
            context: &mut self.context,
            groups: &mut self.groups,
            viewport: &mut self.viewport,
            timers: &mut self.timers,
            visibility: &self.visibility,
            layout_mode: self.config.layout_mode,
            release_cooldown_secs: self.config.release_cooldown_secs(),
        };
        self.interaction.pointer_move(&mut scene, screen);
        if self.interaction.is_dragging() {
            self.render_loop.wake();
        }
    }

    /// `now` is the host clock in seconds, used to time the release cooldown.
    pub fn pointer_up(&mut self, screen: Pos2, now: f64) -> Vec<InteractionEvent> {
        let mut scene = Scene {
            context: &mut self.context,
            groups: &mut self.groups,
            viewport: &mut self.viewport,
            timers: &mut self.timers,
            visibility: &self.visibility,
            layout_mode: self.config.layout_mode,
            release_cooldown_secs: self.config.release_cooldown_secs(),
        };
        self.interaction.pointer_up(&mut scene, screen, now)
    }

    pub fn wheel(&mut self, cursor: Pos2, scroll: f32) {
        self.viewport.wheel_zoom(cursor, scroll);
    }

    pub fn tick(&mut self) -> bool {
        let center = self.layout_center();
        let moving = simulation::step(&mut self.context, &self.params, center, &mut self.rng);
        refresh_bounds(&mut self.groups, &self.context);
        moving
    }

    /// Runs due timers, advances physics when the loop allows it, then draws once.
    /// Returns `None` while the loop is stopped.
    pub fn frame(&mut self, surface: &mut dyn DrawSurface, now: f64) -> Option<DrawStats> {
        if !self.render_loop.is_running() {
            return None;
        }
        self.set_surface_size(surface.size());

        let unpinned = fire_due_actions(&mut self.timers, &mut self.context, &self.interaction, now);
        if unpinned > 0 {
            self.render_loop.wake();
        }

        let ticked = self.render_loop.should_tick(&self.config);
        let moving = ticked && self.tick();
        if !ticked {
            refresh_bounds(&mut self.groups, &self.context);
        }
        self.render_loop.record_frame(ticked, moving);

        let view = FrameView {
            context: &self.context,
            groups: &self.groups,
            viewport: &self.viewport,
            visibility: &self.visibility,
            config: &self.config,
            selected: self
                .interaction
                .selected_node
                .as_deref()
                .and_then(|id| self.context.index_of(id)),
            highlight: self.interaction.highlight_anchor(&self.context),
        };
        Some(render::draw(surface, &view))
    }

    pub fn start(&mut self) {
        self.render_loop.start();
    }

    pub fn stop(&mut self) {
        self.render_loop.stop();
    }

    pub fn wants_continuous_frames(&self) -> bool {
        self.render_loop.wants_continuous_frames(&self.config) || !self.timers.is_empty()
    }

    pub fn is_unpin_pending(&self, id: &str) -> bool {
        self.timers.is_armed(&ScheduledAction::Unpin(id.to_owned()))
    }

    fn fit_view(&mut self) {
        let points = self
            .visibility
            .visible_nodes(self.context.len())
            .into_iter()
            .filter_map(|index| self.context.node(index).map(|node| node.position))
            .collect::<Vec<_>>();
        self.viewport.fit(points, self.surface_size);
    }

    /// Recomputes positions for the active mode. Force mode gets a fresh unpinned seed.
    fn run_layout(&mut self) {
        let mode = self.config.layout_mode;
        let settings = LayoutSettings {
            node_spacing: self.config.node_spacing,
            center: self.layout_center(),
            grouping: self.config.grouping_mode,
        };
        let outcome = layout::compute(mode, &self.context, &settings, &mut self.rng);
        self.context
            .apply_positions(&outcome.positions, mode.pins_positions());
        if outcome.groups.is_empty() {
            self.regroup();
        } else {
            self.groups = outcome.groups;
            self.after_regroup();
        }
    }

    fn regroup(&mut self) {
        self.groups = build_groups(&self.context, self.config.grouping_mode);
        self.after_regroup();
    }

    fn after_regroup(&mut self) {
        self.interaction
            .abandon_gesture(&mut self.context, self.config.layout_mode);
        self.interaction.prune(&self.context, &self.groups);
        self.refresh_visibility();
    }

    fn refresh_search(&mut self) {
        self.interaction.search_results = search_matches(&self.context, &self.interaction.search_term)
            .into_iter()
            .filter_map(|index| self.context.node(index).map(|node| node.id.clone()))
            .collect();
        self.refresh_visibility();
    }

    fn refresh_visibility(&mut self) {
        self.visibility = compute_visibility(
            &self.context,
            &self.groups,
            &self.interaction.search_term,
            self.interaction.search_mode,
            self.interaction.focus.as_ref(),
        );
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{PointerButton, pos2, vec2};

    use super::{EngineAction, GraphEngine};
    use crate::config::GraphConfig;
    use crate::grouping::GroupingMode;
    use crate::interaction::{Focus, InteractionEvent};
    use crate::layout::LayoutMode;
    use crate::model::{EdgeKind, EdgeRecord, GraphData, NodeKind, NodeRecord};

    fn data(ids: &[&str], edges: &[(&str, &str)]) -> GraphData {
        GraphData {
            nodes: ids
                .iter()
                .map(|id| NodeRecord::new(*id, *id, NodeKind::Function).with_file_path(format!("src/{id}.rs")))
                .collect(),
            edges: edges
                .iter()
                .map(|(source, target)| EdgeRecord::new(*source, *target, EdgeKind::Calls))
                .collect(),
        }
    }

    fn engine(mode: LayoutMode) -> GraphEngine {
        let config = GraphConfig {
            layout_mode: mode,
            ..GraphConfig::default()
        };
        let mut engine = GraphEngine::with_seed(config, 7);
        engine.set_surface_size(vec2(800.0, 600.0));
        engine
    }

    #[test]
    fn force_mode_keeps_positions_across_refreshes() {
        let mut engine = engine(LayoutMode::Force);
        engine.set_data(&data(&["a", "b"], &[("a", "b")]));
        for _ in 0..20 {
            engine.tick();
        }
        let before = engine.context().node_by_id("a").map(|node| node.position);

        let summary = engine.set_data(&data(&["a", "b", "c"], &[("a", "b"), ("b", "c")]));
        assert_eq!(summary.new_nodes, 1);
        assert_eq!(engine.context().node_by_id("a").map(|node| node.position), before);

        let spawn = engine.viewport().world_center(engine.surface_size());
        let c = engine.context().node_by_id("c").map(|node| (node.position, node.velocity));
        assert_eq!(c, Some((spawn, vec2(0.0, 0.0))));
    }

    #[test]
    fn deterministic_modes_pin_every_node() {
        for mode in [LayoutMode::Hierarchical, LayoutMode::Circular, LayoutMode::Grouped] {
            let mut engine = engine(mode);
            engine.set_data(&data(&["a", "b", "c"], &[("a", "b")]));
            assert!(engine.context().nodes().iter().all(|node| node.is_pinned()), "{mode:?}");
        }
    }

    #[test]
    fn switching_to_force_releases_pins() {
        let mut engine = engine(LayoutMode::Circular);
        engine.set_data(&data(&["a", "b"], &[("a", "b")]));
        engine.set_layout_mode(LayoutMode::Force);
        assert!(engine.context().nodes().iter().all(|node| !node.is_pinned()));
        assert_eq!(engine.config().layout_mode, LayoutMode::Force);
    }

    #[test]
    fn grouped_mode_produces_one_group_per_file() {
        let mut engine = engine(LayoutMode::Grouped);
        engine.set_data(&data(&["a", "b", "c"], &[]));
        assert_eq!(engine.groups().len(), 3);

        engine.set_grouping_mode(GroupingMode::ByParent);
        assert_eq!(engine.groups().len(), 1);
    }

    #[test]
    fn refresh_prunes_selection_of_removed_nodes() {
        let mut engine = engine(LayoutMode::Circular);
        engine.set_data(&data(&["a", "b"], &[]));
        assert!(engine.select_node(Some("b")).is_some());
        engine.set_focus(Some(Focus::Node("b".to_owned())));

        engine.set_data(&data(&["a"], &[]));
        assert_eq!(engine.interaction().selected_node, None);
        assert_eq!(engine.interaction().focus, None);
        assert!(!engine.visibility().is_filtered());
    }

    #[test]
    fn click_through_engine_reports_node() {
        let mut engine = engine(LayoutMode::Circular);
        engine.set_data(&data(&["a", "b"], &[]));
        let target = engine
            .context()
            .node_by_id("a")
            .map(|node| engine.viewport().world_to_screen(node.position))
            .unwrap_or(pos2(-1.0, -1.0));

        engine.pointer_down(target, PointerButton::Primary);
        let events = engine.pointer_up(target, 0.0);
        assert_eq!(events[0], InteractionEvent::NodeClicked("a".to_owned()));
    }

    fn drag_node_a(engine: &mut GraphEngine) {
        let start = engine
            .context()
            .node_by_id("a")
            .map(|node| engine.viewport().world_to_screen(node.position))
            .unwrap_or(pos2(-1.0, -1.0));
        engine.pointer_down(start, PointerButton::Primary);
        engine.pointer_move(start + vec2(40.0, 0.0));
        assert_eq!(engine.interaction().dragged_node.as_deref(), Some("a"));
        assert_eq!(engine.context().node_by_id("a").map(|node| node.is_pinned()), Some(true));
    }

    #[test]
    fn refresh_during_force_drag_hands_node_back_to_simulation() {
        let graph = data(&["a", "b"], &[("a", "b")]);
        let mut engine = engine(LayoutMode::Force);
        engine.set_data(&graph);
        drag_node_a(&mut engine);

        engine.set_data(&graph);
        assert_eq!(engine.interaction().dragged_node, None);
        assert_eq!(engine.context().node_by_id("a").map(|node| node.is_pinned()), Some(false));

        let events = engine.pointer_up(pos2(0.0, 0.0), 1.0);
        assert!(events.is_empty());
        assert!(!engine.is_unpin_pending("a"));
        for _ in 0..10 {
            engine.tick();
        }
        assert!(engine.context().nodes().iter().all(|node| !node.is_pinned()));
    }

    #[test]
    fn regroup_during_force_drag_hands_node_back_to_simulation() {
        let mut engine = engine(LayoutMode::Force);
        engine.set_data(&data(&["a", "b"], &[("a", "b")]));
        drag_node_a(&mut engine);

        engine.set_grouping_mode(GroupingMode::ByFile);
        assert_eq!(engine.context().node_by_id("a").map(|node| node.is_pinned()), Some(false));
        assert!(!engine.interaction().is_dragging());
    }

    #[test]
    fn refresh_during_pinned_layout_drag_keeps_layout_pins() {
        let mut engine = engine(LayoutMode::Circular);
        let graph = data(&["a", "b"], &[("a", "b")]);
        engine.set_data(&graph);
        drag_node_a(&mut engine);

        engine.set_data(&graph);
        assert_eq!(engine.interaction().dragged_node, None);
        assert!(engine.context().nodes().iter().all(|node| node.is_pinned()));
    }

    #[test]
    fn actions_are_callable_without_input() {
        let mut engine = engine(LayoutMode::Hierarchical);
        engine.set_data(&data(&["a", "b", "c"], &[("a", "b"), ("b", "c")]));

        engine.perform(EngineAction::ZoomIn);
        let zoomed = engine.viewport().scale();
        engine.perform(EngineAction::ZoomOut);
        assert!(engine.viewport().scale() < zoomed);

        engine.perform(EngineAction::ResetView);
        assert_eq!(engine.viewport().scale(), 1.0);

        engine.perform(EngineAction::FitView);
        for node in engine.context().nodes() {
            let screen = engine.viewport().world_to_screen(node.position);
            assert!(screen.x >= 0.0 && screen.x <= 800.0 && screen.y >= 0.0 && screen.y <= 600.0);
        }

        let before = engine.context().positions();
        engine.perform(EngineAction::AutoLayout);
        assert_eq!(engine.context().positions(), before);
    }

    #[test]
    fn stopped_loop_draws_nothing() {
        struct Null;
        impl crate::render::DrawSurface for Null {
            fn size(&self) -> eframe::egui::Vec2 {
                vec2(800.0, 600.0)
            }
            fn rect(&mut self, _: eframe::egui::Rect, _: eframe::egui::Color32, _: eframe::egui::Stroke) {}
            fn circle(&mut self, _: eframe::egui::Pos2, _: f32, _: eframe::egui::Color32, _: eframe::egui::Stroke) {}
            fn polyline(&mut self, _: &[eframe::egui::Pos2], _: eframe::egui::Stroke, _: Option<crate::render::Dash>) {}
            fn text(&mut self, _: eframe::egui::Pos2, _: eframe::egui::Align2, _: &str, _: f32, _: eframe::egui::Color32) {}
        }

        let mut engine = engine(LayoutMode::Force);
        engine.set_data(&data(&["a", "b"], &[("a", "b")]));
        assert!(engine.frame(&mut Null, 0.0).is_some());
        assert_eq!(engine.render_loop().ticks(), 1);

        engine.stop();
        assert!(engine.frame(&mut Null, 0.1).is_none());
        engine.start();
        assert!(engine.frame(&mut Null, 0.2).is_some());
        assert_eq!(engine.render_loop().frames(), 2);
    }
}
