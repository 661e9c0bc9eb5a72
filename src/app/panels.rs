use std::path::Path;

use code_atlas::EngineAction;
use code_atlas::config::EdgeStyle;
use code_atlas::grouping::GroupingMode;
use code_atlas::interaction::{Focus, MenuTarget, SearchMode};
use code_atlas::layout::LayoutMode;
use eframe::egui::{self, Align, Context, Layout, Pos2, Ui};

use super::ViewModel;

enum MenuCommand {
    Focus(Focus),
    ClearFocus,
    ZoomTo(String),
    Select(String),
    Close,
}

impl ViewModel {
    pub(super) fn show(
        &mut self,
        ctx: &Context,
        input: &Path,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("code-atlas");
                    ui.separator();
                    ui.label(format!("file: {}", input.display()));
                    ui.label(format!("nodes: {}", self.engine.context().len()));
                    ui.label(format!("links: {}", self.engine.context().links().len()));
                    let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.fps_text());
                    });
                });
            });

        egui::TopBottomPanel::bottom("status_line")
            .resizable(false)
            .show(ctx, |ui| ui.label(self.status_text()));

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        let mut canvas_rect = egui::Rect::NOTHING;
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                canvas_rect = ui.max_rect();
                self.draw_canvas(ui);
            });

        self.draw_menus(ctx, canvas_rect.min);
    }

    fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search (name or type)")
            .on_hover_text("Fuzzy match on node names, exact match on component/class/function/method.");
        if ui.text_edit_singleline(&mut self.search).changed() {
            self.engine.set_search_term(&self.search);
        }
        ui.horizontal(|ui| {
            for mode in [SearchMode::NodeOnly, SearchMode::WithConnections] {
                let active = self.engine.interaction().search_mode == mode;
                if ui.selectable_label(active, mode.label()).clicked() {
                    self.engine.set_search_mode(mode);
                }
            }
        });

        ui.separator();
        ui.label("Layout");
        ui.horizontal_wrapped(|ui| {
            for mode in LayoutMode::ALL {
                let active = self.engine.config().layout_mode == mode;
                if ui.selectable_label(active, mode.label()).clicked() {
                    self.engine.set_layout_mode(mode);
                }
            }
        });

        ui.label("Grouping");
        ui.horizontal_wrapped(|ui| {
            for mode in GroupingMode::ALL {
                let active = self.engine.config().grouping_mode == mode;
                if ui.selectable_label(active, mode.label()).clicked() {
                    self.engine.set_grouping_mode(mode);
                }
            }
        });

        ui.separator();
        let mut spacing = self.engine.config().node_spacing;
        if ui
            .add(egui::Slider::new(&mut spacing, 50.0..=400.0).step_by(5.0).text("Node spacing"))
            .changed()
        {
            self.engine.set_node_spacing(spacing);
        }
        let mut node_size = self.engine.config().node_size;
        if ui
            .add(egui::Slider::new(&mut node_size, 4.0..=30.0).text("Node size"))
            .changed()
        {
            self.engine.set_node_size(node_size);
        }

        ui.horizontal(|ui| {
            for (style, label) in [(EdgeStyle::Straight, "Straight"), (EdgeStyle::Curved, "Curved")] {
                let active = self.engine.config().edge_style == style;
                if ui.selectable_label(active, label).clicked() {
                    self.engine.set_edge_style(style);
                }
            }
        });

        let mut animated = self.engine.config().animation_enabled;
        if ui
            .checkbox(&mut animated, "Animate force layout")
            .on_hover_text("Pause the simulation without leaving force mode.")
            .changed()
        {
            self.engine.set_animation_enabled(animated);
        }

        ui.separator();
        ui.label("Actions  (R, F, +, -, L, Esc)");
        ui.horizontal_wrapped(|ui| {
            for action in EngineAction::ALL {
                if ui.button(action.label()).clicked() {
                    self.engine.perform(action);
                }
            }
        });

        if self.engine.interaction().focus.is_some() && ui.button("Clear focus").clicked() {
            let event = self.engine.set_focus(None);
            self.record_callbacks(event.into_iter().collect());
        }
    }

    fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Details");
        ui.separator();

        let mut command = None;
        let selected = self
            .engine
            .interaction()
            .selected_node
            .as_deref()
            .and_then(|id| self.engine.context().index_of(id));
        match selected.and_then(|index| self.engine.context().node(index).map(|node| (index, node))) {
            Some((index, node)) => {
                ui.strong(&node.name);
                ui.label(format!("id: {}", node.id));
                ui.label(format!("type: {}", node.kind.label()));
                ui.label(format!("file: {}", node.file_path.as_deref().unwrap_or("unknown")));
                ui.label(format!("connections: {}", node.connections));
                ui.add_space(6.0);
                ui.label("Neighbours");
                egui::ScrollArea::vertical()
                    .id_salt("neighbours")
                    .max_height(200.0)
                    .show(ui, |ui| {
                        for neighbour in self.engine.context().neighbors(index) {
                            if let Some(other) = self.engine.context().node(neighbour)
                                && ui.link(&other.name).clicked()
                            {
                                command = Some(MenuCommand::Select(other.id.clone()));
                            }
                        }
                    });
            }
            None => {
                ui.label("Click a node to inspect it.");
            }
        }

        let results = &self.engine.interaction().search_results;
        if !results.is_empty() {
            ui.separator();
            ui.label(format!("Search results ({})", results.len()));
            egui::ScrollArea::vertical()
                .id_salt("search_results")
                .max_height(180.0)
                .show(ui, |ui| {
                    for id in results {
                        let name = self
                            .engine
                            .context()
                            .node_by_id(id)
                            .map_or(id.as_str(), |node| node.name.as_str());
                        if ui.link(name).clicked() {
                            command = Some(MenuCommand::Select(id.clone()));
                        }
                    }
                });
        }

        ui.separator();
        ui.label("Events");
        egui::ScrollArea::vertical()
            .id_salt("events")
            .show(ui, |ui| {
                for line in &self.event_log {
                    ui.small(line);
                }
            });

        if let Some(command) = command {
            self.apply_menu_command(command);
        }
    }

    fn draw_menus(&mut self, ctx: &Context, canvas_origin: Pos2) {
        let interaction = self.engine.interaction();
        let viewport = *self.engine.viewport();
        let mut command = None;

        if let Some(id) = interaction.node_menu.clone()
            && let Some(node) = self.engine.context().node_by_id(&id)
        {
            let anchor = canvas_origin
                + viewport.world_to_screen(node.position).to_vec2()
                + egui::vec2(node.radius * viewport.scale() + 8.0, 0.0);
            egui::Area::new(egui::Id::new("node_menu"))
                .fixed_pos(anchor)
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.strong(&node.name);
                        if ui.button("Focus neighbourhood").clicked() {
                            command = Some(MenuCommand::Focus(Focus::Node(id.clone())));
                        }
                        if ui.button("Zoom to node").clicked() {
                            command = Some(MenuCommand::ZoomTo(id.clone()));
                        }
                        if ui.button("Close").clicked() {
                            command = Some(MenuCommand::Close);
                        }
                    });
                });
        }

        if let Some(key) = interaction.group_menu.clone()
            && let Some(group) = self.engine.groups().iter().find(|group| group.key == key)
        {
            let anchor = canvas_origin + viewport.world_to_screen(group.bounds.left_top()).to_vec2();
            egui::Area::new(egui::Id::new("group_menu"))
                .fixed_pos(anchor - egui::vec2(0.0, 8.0))
                .pivot(egui::Align2::LEFT_BOTTOM)
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.strong(format!("{} ({} members)", group.label, group.members.len()));
                        if ui.button("Focus group").clicked() {
                            command = Some(MenuCommand::Focus(Focus::Group(key.clone())));
                        }
                        if ui.button("Close").clicked() {
                            command = Some(MenuCommand::Close);
                        }
                    });
                });
        }

        if let Some(menu) = interaction.context_menu.clone() {
            egui::Area::new(egui::Id::new("context_menu"))
                .fixed_pos(canvas_origin + menu.anchor.to_vec2())
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        match &menu.target {
                            MenuTarget::Node(id) => {
                                if ui.button("Select").clicked() {
                                    command = Some(MenuCommand::Select(id.clone()));
                                }
                                if ui.button("Focus neighbourhood").clicked() {
                                    command = Some(MenuCommand::Focus(Focus::Node(id.clone())));
                                }
                                if ui.button("Zoom to node").clicked() {
                                    command = Some(MenuCommand::ZoomTo(id.clone()));
                                }
                            }
                            MenuTarget::Group(key) => {
                                if ui.button("Focus group").clicked() {
                                    command = Some(MenuCommand::Focus(Focus::Group(key.clone())));
                                }
                            }
                        }
                        if ui.button("Clear focus").clicked() {
                            command = Some(MenuCommand::ClearFocus);
                        }
                    });
                });
        }

        if let Some(command) = command {
            self.apply_menu_command(command);
        }
    }

    fn apply_menu_command(&mut self, command: MenuCommand) {
        let events = match command {
            MenuCommand::Focus(focus) => self.engine.set_focus(Some(focus)).into_iter().collect(),
            MenuCommand::ClearFocus => self.engine.set_focus(None).into_iter().collect(),
            MenuCommand::ZoomTo(id) => {
                self.engine.zoom_to_node(&id);
                Vec::new()
            }
            MenuCommand::Select(id) => {
                self.engine.zoom_to_node(&id);
                self.engine.select_node(Some(&id)).into_iter().collect()
            }
            MenuCommand::Close => Vec::new(),
        };
        self.engine.perform(EngineAction::CloseMenus);
        self.record_callbacks(events);
    }

    fn status_text(&self) -> String {
        let interaction = self.engine.interaction();
        let mut parts = vec![
            format!(
                "showing {} nodes / {} links / {} groups",
                self.last_stats.nodes, self.last_stats.links, self.last_stats.groups
            ),
            format!("zoom {:.0}%", self.engine.viewport().scale() * 100.0),
            format!("layout {}", self.engine.config().layout_mode.label()),
        ];
        if let Some(hovered) = &interaction.hovered_node {
            parts.push(format!("hover: {hovered}"));
        }
        if let Some(selected) = &interaction.selected_node {
            parts.push(format!("selected: {selected}"));
        }
        if let Some(focus) = &interaction.focus {
            parts.push(match focus {
                Focus::Node(id) => format!("focus: {id}"),
                Focus::Group(key) => format!("focus group: {key}"),
            });
        }
        parts.join(" | ")
    }
}
