use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use code_atlas::render::DrawStats;
use code_atlas::{GraphConfig, GraphData, GraphEngine};
use eframe::egui::{self, Context};
use tracing::{info, warn};

mod canvas;
mod panels;

type LoadResult = Result<GraphData, String>;

pub struct CodeAtlasApp {
    input: PathBuf,
    config: GraphConfig,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    engine: GraphEngine,
    search: String,
    event_log: VecDeque<String>,
    last_stats: DrawStats,
    pointer_captured: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

impl ViewModel {
    const EVENT_LOG_LIMIT: usize = 40;

    fn new(config: GraphConfig, data: &GraphData) -> Self {
        let mut engine = GraphEngine::new(config);
        let summary = engine.set_data(data);
        info!(nodes = summary.nodes, links = summary.links, "graph loaded");
        Self {
            engine,
            search: String::new(),
            event_log: VecDeque::new(),
            last_stats: DrawStats::default(),
            pointer_captured: false,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    fn log_event(&mut self, line: String) {
        self.event_log.push_front(line);
        self.event_log.truncate(Self::EVENT_LOG_LIMIT);
    }

    fn update_fps_counter(&mut self, ctx: &Context) {
        const FPS_SAMPLE_WINDOW: usize = 180;

        let dt = ctx.input(|input| input.stable_dt);
        if dt <= f32::EPSILON {
            return;
        }

        self.fps_current = (1.0 / dt).clamp(0.0, 1000.0);
        self.fps_samples.push_back(self.fps_current);
        while self.fps_samples.len() > FPS_SAMPLE_WINDOW {
            self.fps_samples.pop_front();
        }
    }

    fn fps_text(&self) -> String {
        let average = if self.fps_samples.is_empty() {
            self.fps_current
        } else {
            self.fps_samples.iter().sum::<f32>() / self.fps_samples.len() as f32
        };
        format!("FPS {:.0} | avg {:.1}", self.fps_current, average)
    }
}

impl CodeAtlasApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, input: PathBuf, config: GraphConfig) -> Self {
        let state = Self::start_load(input.clone());
        Self {
            input,
            config,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(input: PathBuf) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = GraphData::load(&input).map_err(|error| error.to_string());
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(input: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(input),
        }
    }
}

impl eframe::App for CodeAtlasApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(data) => AppState::Ready(Box::new(ViewModel::new(self.config.clone(), &data))),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading code graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load code graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.input.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.input, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.input.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        // A reload refreshes the running engine so force layouts keep their positions.
                        Ok(Ok(data)) => {
                            let summary = model.engine.set_data(&data);
                            model.log_event(format!(
                                "reloaded: {} nodes, {} new, {} dangling edges",
                                summary.nodes, summary.new_nodes, summary.dangling_edges
                            ));
                        }
                        Ok(Err(error)) => {
                            warn!(%error, "reload failed");
                            transition = Some(AppState::Error(error));
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            if let AppState::Ready(model) = &mut self.state {
                model.engine.stop();
            }
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
