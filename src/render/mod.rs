//! Per-frame drawing and the loop that decides when the simulation advances.

mod style;

use std::collections::HashSet;

use eframe::egui::{Align2, Color32, Pos2, Rect, Stroke, Vec2, pos2};
use tracing::debug;

use crate::config::{EdgeStyle, GraphConfig};
use crate::context::SimulationContext;
use crate::geometry::{COINCIDENT_EPSILON, curved_edge_points};
use crate::grouping::Group;
use crate::interaction::Visibility;
use crate::layout::LayoutMode;
use crate::viewport::{Viewport, screen_radius};

pub use style::{
    BACKGROUND, Dash, GRID_LINE, GROUP_FILL, GROUP_HEADER, GROUP_STROKE, LABEL, LinkStyle,
    NodeStyle, SELECTION, dim_color, link_style, node_style,
};

const CURVE_BEND: f32 = 0.18;
const CURVE_SEGMENTS: usize = 14;
const LABEL_MIN_SCALE: f32 = 0.55;
const ARROW_LENGTH: f32 = 8.0;
const DIM_FACTOR: f32 = 0.35;

/// Anything that can receive the primitives of one frame. Coordinates are surface-local.
pub trait DrawSurface {
    fn size(&self) -> Vec2;
    fn rect(&mut self, rect: Rect, fill: Color32, stroke: Stroke);
    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke);
    fn polyline(&mut self, points: &[Pos2], stroke: Stroke, dash: Option<Dash>);
    fn text(&mut self, position: Pos2, anchor: Align2, text: &str, size: f32, color: Color32);
}

pub struct FrameView<'a> {
    pub context: &'a SimulationContext,
    pub groups: &'a [Group],
    pub viewport: &'a Viewport,
    pub visibility: &'a Visibility,
    pub config: &'a GraphConfig,
    pub selected: Option<usize>,
    /// Node whose one-hop neighbourhood is emphasised.
    pub highlight: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub nodes: usize,
    pub links: usize,
    pub groups: usize,
}

#[derive(Clone, Debug, Default)]
pub struct RenderLoop {
    running: bool,
    settled: bool,
    frames: u64,
    ticks: u64,
}

impl RenderLoop {
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.settled = false;
            debug!("render loop started");
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            debug!(frames = self.frames, ticks = self.ticks, "render loop stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Physics runs only under force layout with animation on.
    pub fn should_tick(&self, config: &GraphConfig) -> bool {
        self.running && config.animation_enabled && config.layout_mode == LayoutMode::Force
    }

    pub fn wake(&mut self) {
        self.settled = false;
    }

    pub fn wants_continuous_frames(&self, config: &GraphConfig) -> bool {
        self.should_tick(config) && !self.settled
    }

    pub(crate) fn record_frame(&mut self, ticked: bool, still_moving: bool) {
        self.frames += 1;
        if ticked {
            self.ticks += 1;
            self.settled = !still_moving;
        }
    }
}

pub fn draw(surface: &mut dyn DrawSurface, view: &FrameView<'_>) -> DrawStats {
    let screen = Rect::from_min_size(Pos2::ZERO, surface.size());
    draw_background(surface, screen, view.viewport);

    let mut stats = DrawStats::default();
    let scale = view.viewport.scale();
    let context = view.context;
    let nodes = context.nodes();
    let screen_positions = nodes
        .iter()
        .map(|node| view.viewport.world_to_screen(node.position))
        .collect::<Vec<_>>();
    let screen_radii = nodes
        .iter()
        .map(|node| screen_radius(node.radius, scale))
        .collect::<Vec<_>>();
    let related = view.highlight.map(|anchor| {
        let mut related = context.neighbors(anchor).collect::<HashSet<_>>();
        related.insert(anchor);
        related
    });

    for group in view.groups {
        if !group
            .members
            .iter()
            .any(|&member| view.visibility.is_node_visible(member))
        {
            continue;
        }
        let bounds = Rect::from_two_pos(
            view.viewport.world_to_screen(group.bounds.min),
            view.viewport.world_to_screen(group.bounds.max),
        );
        if !bounds.intersects(screen) {
            continue;
        }
        let header = Rect::from_two_pos(
            view.viewport.world_to_screen(group.header_rect().min),
            view.viewport.world_to_screen(group.header_rect().max),
        );
        surface.rect(bounds, GROUP_FILL, Stroke::new(1.0, GROUP_STROKE));
        surface.rect(header, GROUP_HEADER, Stroke::NONE);
        surface.text(
            pos2(header.left() + 6.0, header.center().y),
            Align2::LEFT_CENTER,
            &format!("{} ({})", group.label, group.members.len()),
            (12.0 * scale.sqrt()).clamp(9.0, 16.0),
            LABEL,
        );
        stats.groups += 1;
    }

    for link in context.links() {
        if link.is_self_loop() || !view.visibility.is_link_visible(link) {
            continue;
        }
        let start_center = screen_positions[link.source];
        let end_center = screen_positions[link.target];
        let delta = end_center - start_center;
        let length = delta.length();
        let (start_radius, end_radius) = (screen_radii[link.source], screen_radii[link.target]);
        if length <= start_radius + end_radius + COINCIDENT_EPSILON {
            continue;
        }
        let direction = delta / length;
        let start = start_center + direction * start_radius;
        let end = end_center - direction * end_radius;
        if !edge_visible(screen, start, end, 2.5) {
            continue;
        }

        let style = link_style(link.kind);
        let touches_anchor = view
            .highlight
            .is_some_and(|anchor| link.source == anchor || link.target == anchor);
        let color = match view.highlight {
            Some(_) if touches_anchor => style.color,
            Some(_) => dim_color(style.color, DIM_FACTOR),
            None => style.color,
        };
        let width = (0.8 + link.weight.clamp(0.25, 4.0) * 0.6) * scale.sqrt().clamp(0.6, 1.4)
            + if touches_anchor { 1.0 } else { 0.0 };
        let stroke = Stroke::new(width, color);

        let points = match view.config.edge_style {
            EdgeStyle::Straight => vec![start, end],
            EdgeStyle::Curved => curved_edge_points(start, end, CURVE_BEND, CURVE_SEGMENTS),
        };
        surface.polyline(&points, stroke, style.dash);
        if style.arrow
            && let [.., before, tip] = points.as_slice()
        {
            draw_arrow_head(surface, *before, *tip, stroke);
        }
        stats.links += 1;
    }

    let show_labels = scale >= LABEL_MIN_SCALE;
    for (index, node) in nodes.iter().enumerate() {
        if !view.visibility.is_node_visible(index) {
            continue;
        }
        let center = screen_positions[index];
        let radius = screen_radii[index];
        if !circle_visible(screen, center, radius) {
            continue;
        }

        let style = node_style(node.kind);
        let dimmed = related
            .as_ref()
            .is_some_and(|related| !related.contains(&index));
        let (fill, outline) = if dimmed {
            (dim_color(style.fill, DIM_FACTOR), dim_color(style.outline, DIM_FACTOR))
        } else {
            (style.fill, style.outline)
        };
        let stroke = if view.selected == Some(index) {
            Stroke::new(3.0, SELECTION)
        } else {
            Stroke::new(1.2, outline)
        };
        surface.circle(center, radius, fill, stroke);

        if radius >= 7.0 {
            surface.text(center, Align2::CENTER_CENTER, style.glyph, radius * 0.9, BACKGROUND);
        }
        if show_labels || view.highlight == Some(index) {
            let color = if dimmed { dim_color(LABEL, DIM_FACTOR) } else { LABEL };
            surface.text(
                center + Vec2::new(0.0, radius + 4.0),
                Align2::CENTER_TOP,
                &node.name,
                (11.0 * scale.sqrt()).clamp(9.0, 15.0),
                color,
            );
        }
        stats.nodes += 1;
    }

    stats
}

fn draw_arrow_head(surface: &mut dyn DrawSurface, from: Pos2, tip: Pos2, stroke: Stroke) {
    let delta = tip - from;
    let length = delta.length();
    if length <= COINCIDENT_EPSILON {
        return;
    }
    let back = -delta / length * ARROW_LENGTH;
    let side = Vec2::new(-back.y, back.x) * 0.45;
    surface.polyline(&[tip + back + side, tip, tip + back - side], stroke, None);
}

pub fn draw_background(surface: &mut dyn DrawSurface, screen: Rect, viewport: &Viewport) {
    surface.rect(screen, BACKGROUND, Stroke::NONE);

    let step = (56.0 * viewport.scale().clamp(0.6, 1.8)).max(20.0);
    let origin = viewport.offset();
    let stroke = Stroke::new(1.0, GRID_LINE);

    let mut x = origin.x.rem_euclid(step);
    while x < screen.right() {
        surface.polyline(&[pos2(x, screen.top()), pos2(x, screen.bottom())], stroke, None);
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < screen.bottom() {
        surface.polyline(&[pos2(screen.left(), y), pos2(screen.right(), y)], stroke, None);
        y += step;
    }
}

pub fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    if max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom() {
        return false;
    }

    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    segments_intersect(start, end, rect.left_top(), rect.right_top())
        || segments_intersect(start, end, rect.right_top(), rect.right_bottom())
        || segments_intersect(start, end, rect.right_bottom(), rect.left_bottom())
        || segments_intersect(start, end, rect.left_bottom(), rect.left_top())
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);

    (c1 <= 0.0 && c2 >= 0.0 || c1 >= 0.0 && c2 <= 0.0)
        && (c3 <= 0.0 && c4 >= 0.0 || c3 >= 0.0 && c4 <= 0.0)
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Align2, Color32, Pos2, Rect, Stroke, Vec2, pos2, vec2};

    use super::{Dash, DrawSurface, FrameView, RenderLoop, circle_visible, draw, edge_visible};
    use crate::config::GraphConfig;
    use crate::context::SimulationContext;
    use crate::interaction::Visibility;
    use crate::layout::LayoutMode;
    use crate::model::{EdgeKind, EdgeRecord, GraphData, NodeKind, NodeRecord};
    use crate::viewport::Viewport;

    #[derive(Default)]
    struct Recorder {
        circles: Vec<Pos2>,
        polylines: usize,
        labels: Vec<String>,
    }

    impl DrawSurface for Recorder {
        fn size(&self) -> Vec2 {
            vec2(800.0, 600.0)
        }

        fn rect(&mut self, _rect: Rect, _fill: Color32, _stroke: Stroke) {}

        fn circle(&mut self, center: Pos2, _radius: f32, _fill: Color32, _stroke: Stroke) {
            self.circles.push(center);
        }

        fn polyline(&mut self, _points: &[Pos2], _stroke: Stroke, _dash: Option<Dash>) {
            self.polylines += 1;
        }

        fn text(&mut self, _position: Pos2, _anchor: Align2, text: &str, _size: f32, _color: Color32) {
            self.labels.push(text.to_owned());
        }
    }

    fn context(positions: &[Pos2]) -> SimulationContext {
        let data = GraphData {
            nodes: (0..positions.len())
                .map(|index| NodeRecord::new(format!("n{index}"), format!("node {index}"), NodeKind::Class))
                .collect(),
            edges: vec![
                EdgeRecord::new("n0", "n1", EdgeKind::Contains),
                EdgeRecord::new("n0", "ghost", EdgeKind::Uses),
            ],
        };
        let mut context = SimulationContext::from_data(&data, 10.0);
        context.apply_positions(positions, true);
        context
    }

    fn render(context: &SimulationContext, visibility: &Visibility) -> (Recorder, super::DrawStats) {
        let config = GraphConfig::default();
        let viewport = Viewport::default();
        let view = FrameView {
            context,
            groups: &[],
            viewport: &viewport,
            visibility,
            config: &config,
            selected: None,
            highlight: None,
        };
        let mut recorder = Recorder::default();
        let stats = draw(&mut recorder, &view);
        (recorder, stats)
    }

    #[test]
    fn off_screen_nodes_are_culled() {
        let context = context(&[pos2(100.0, 100.0), pos2(300.0, 100.0), pos2(5000.0, 5000.0)]);
        let (recorder, stats) = render(&context, &Visibility::all());
        assert_eq!(stats.nodes, 2);
        assert_eq!(recorder.circles, vec![pos2(100.0, 100.0), pos2(300.0, 100.0)]);
        assert_eq!(stats.links, 1);
        assert!(recorder.labels.contains(&"node 0".to_owned()));
    }

    #[test]
    fn coincident_endpoints_draw_no_link() {
        let context = context(&[pos2(100.0, 100.0), pos2(100.0, 100.0)]);
        let (_, stats) = render(&context, &Visibility::all());
        assert_eq!(stats.nodes, 2);
        assert_eq!(stats.links, 0);
    }

    #[test]
    fn hidden_endpoint_hides_link() {
        let context = context(&[pos2(100.0, 100.0), pos2(300.0, 100.0)]);
        let (_, stats) = render(&context, &Visibility::only([0]));
        assert_eq!(stats.nodes, 1);
        assert_eq!(stats.links, 0);
    }

    #[test]
    fn culling_helpers_match_geometry() {
        let screen = Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0));
        assert!(circle_visible(screen, pos2(-5.0, 50.0), 6.0));
        assert!(!circle_visible(screen, pos2(-10.0, 50.0), 6.0));
        assert!(edge_visible(screen, pos2(-50.0, 50.0), pos2(150.0, 50.0), 0.0));
        assert!(!edge_visible(screen, pos2(-50.0, -50.0), pos2(-10.0, 150.0), 0.0));
    }

    #[test]
    fn loop_ticks_only_for_animated_force_layout() {
        let mut render_loop = RenderLoop::default();
        let mut config = GraphConfig::default();
        assert!(!render_loop.should_tick(&config));

        render_loop.start();
        assert!(render_loop.should_tick(&config));
        config.layout_mode = LayoutMode::Hierarchical;
        assert!(!render_loop.should_tick(&config));
        config.layout_mode = LayoutMode::Force;
        config.animation_enabled = false;
        assert!(!render_loop.should_tick(&config));

        config.animation_enabled = true;
        render_loop.record_frame(true, false);
        assert!(!render_loop.wants_continuous_frames(&config));
        render_loop.wake();
        assert!(render_loop.wants_continuous_frames(&config));

        render_loop.stop();
        assert!(!render_loop.should_tick(&config));
        assert_eq!((render_loop.frames(), render_loop.ticks()), (1, 1));
    }
}
