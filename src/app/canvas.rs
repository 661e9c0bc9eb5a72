use code_atlas::EngineAction;
use code_atlas::interaction::InteractionEvent;
use code_atlas::render::{Dash, DrawSurface};
use eframe::egui::{
    self, Align2, Color32, FontId, Key, Painter, Pos2, Rect, Sense, Shape, Stroke, StrokeKind, Ui,
    Vec2,
};
use tracing::info;

use super::ViewModel;

/// Paints engine primitives with an egui painter. Engine coordinates are relative to `origin`.
struct EguiSurface<'a> {
    painter: &'a Painter,
    origin: Pos2,
    size: Vec2,
}

impl EguiSurface<'_> {
    fn at(&self, local: Pos2) -> Pos2 {
        self.origin + local.to_vec2()
    }
}

impl DrawSurface for EguiSurface<'_> {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn rect(&mut self, rect: Rect, fill: Color32, stroke: Stroke) {
        let rect = rect.translate(self.origin.to_vec2());
        self.painter.rect(rect, 4.0, fill, stroke, StrokeKind::Inside);
    }

    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke) {
        self.painter.circle(self.at(center), radius, fill, stroke);
    }

    fn polyline(&mut self, points: &[Pos2], stroke: Stroke, dash: Option<Dash>) {
        let points = points.iter().map(|point| self.at(*point)).collect::<Vec<_>>();
        match dash {
            Some(dash) => {
                self.painter
                    .extend(Shape::dashed_line(&points, stroke, dash.length, dash.gap));
            }
            None if points.len() == 2 => {
                self.painter.line_segment([points[0], points[1]], stroke);
            }
            None => {
                self.painter.add(Shape::line(points, stroke));
            }
        }
    }

    fn text(&mut self, position: Pos2, anchor: Align2, text: &str, size: f32, color: Color32) {
        self.painter
            .text(self.at(position), anchor, text, FontId::proportional(size), color);
    }
}

impl ViewModel {
    pub(super) fn draw_canvas(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        self.engine.set_surface_size(rect.size());

        self.handle_pointer(ui, rect, &response);
        self.handle_wheel(ui, rect, &response);
        self.handle_keys(ui);

        let now = ui.input(|input| input.time);
        let mut surface = EguiSurface {
            painter: &painter,
            origin: rect.min,
            size: rect.size(),
        };
        if let Some(stats) = self.engine.frame(&mut surface, now) {
            self.last_stats = stats;
        }

        if self.engine.interaction().hovered_node.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }
        if self.engine.wants_continuous_frames() || self.engine.interaction().is_dragging() {
            ui.ctx().request_repaint();
        }
    }

    /// Forwards raw pointer events in order so press, drag and release keep their sequence.
    fn handle_pointer(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        let events = ui.input(|input| input.events.clone());
        let now = ui.input(|input| input.time);
        let over_canvas = response.contains_pointer();

        for event in events {
            match event {
                egui::Event::PointerMoved(position) => {
                    if self.pointer_captured || over_canvas {
                        self.engine.pointer_move(local(rect, position));
                    }
                }
                egui::Event::PointerButton {
                    pos,
                    button,
                    pressed: true,
                    ..
                } if over_canvas && rect.contains(pos) => {
                    self.pointer_captured = true;
                    self.engine.pointer_down(local(rect, pos), button);
                }
                egui::Event::PointerButton {
                    pos,
                    pressed: false,
                    ..
                } if self.pointer_captured => {
                    self.pointer_captured = false;
                    let callbacks = self.engine.pointer_up(local(rect, pos), now);
                    self.record_callbacks(callbacks);
                }
                _ => {}
            }
        }
    }

    fn handle_wheel(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        self.engine.wheel(local(rect, pointer), scroll);
    }

    fn handle_keys(&mut self, ui: &Ui) {
        if ui.ctx().wants_keyboard_input() {
            return;
        }

        let bindings = [
            (Key::R, EngineAction::ResetView),
            (Key::F, EngineAction::FitView),
            (Key::Plus, EngineAction::ZoomIn),
            (Key::Equals, EngineAction::ZoomIn),
            (Key::Minus, EngineAction::ZoomOut),
            (Key::L, EngineAction::AutoLayout),
            (Key::Escape, EngineAction::CloseMenus),
        ];
        for (key, action) in bindings {
            if ui.input(|input| input.key_pressed(key)) {
                self.engine.perform(action);
            }
        }
    }

    pub(super) fn record_callbacks(&mut self, callbacks: Vec<InteractionEvent>) {
        for callback in callbacks {
            let line = match &callback {
                InteractionEvent::NodeClicked(id) => format!("node clicked: {id}"),
                InteractionEvent::GroupClicked { key, members } => {
                    format!("group clicked: {key} ({} members)", members.len())
                }
                InteractionEvent::SelectionChanged(Some(id)) => format!("selected: {id}"),
                InteractionEvent::SelectionChanged(None) => "selection cleared".to_owned(),
                InteractionEvent::FocusChanged(Some(focus)) => format!("focus: {focus:?}"),
                InteractionEvent::FocusChanged(None) => "focus cleared".to_owned(),
            };
            info!("{line}");
            self.log_event(line);
        }
    }
}

fn local(rect: Rect, position: Pos2) -> Pos2 {
    (position - rect.min).to_pos2()
}
