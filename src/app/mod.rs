use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use eframe::egui::{self, Context};
use tracing::error;

use h5view::correlate::Correlation;
use h5view::{ChangeEvent, JsonFileStore, NodeId, ViewRequest, Workspace};

mod ui;

const ACTIVITY_LIMIT: usize = 40;

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub file: PathBuf,
    pub watch_interval: Duration,
    pub show_attributes: bool,
    pub show_junk: bool,
}

pub struct ViewerApp {
    config: ViewerConfig,
    state: AppState,
}

enum AppState {
    Ready(Box<ViewModel>),
    Error(String),
}

enum Status {
    Info(String),
    Error(String),
}

enum RowAction {
    Toggle(NodeId),
    Select { id: NodeId, additive: bool },
    Activate(NodeId),
}

struct ViewModel {
    workspace: Workspace<JsonFileStore>,
    search: String,
    attrs_visible: bool,
    junk_visible: bool,
    expanded: HashSet<NodeId>,
    selection: Vec<NodeId>,
    primary: Option<NodeId>,
    rename_buffer: String,
    value_buffer: String,
    axis_filter: String,
    axis_label: String,
    views: Vec<ViewRequest>,
    key_filter: String,
    correlate_x: String,
    correlate_y: String,
    correlation: Option<Result<Correlation, String>>,
    status: Option<Status>,
    activity: Rc<RefCell<VecDeque<String>>>,
    last_watch_secs: f64,
}

fn load_workspace(path: &Path) -> Result<Workspace<JsonFileStore>> {
    let store = JsonFileStore::open(path)
        .with_context(|| format!("failed to open data file {}", path.display()))?;
    Workspace::open(store).with_context(|| format!("failed to read hierarchy of {}", path.display()))
}

fn summarize(event: &ChangeEvent) -> String {
    match event {
        ChangeEvent::Renamed { old_path, .. } => format!("renamed {old_path}"),
        ChangeEvent::AttributeRenamed { old_key, .. } => format!("renamed attribute {old_key}"),
        ChangeEvent::AttributeValueChanged { .. } => "changed attribute value".to_owned(),
        ChangeEvent::JunkChanged { nodes, junk: true } => format!("marked {} as junk", nodes.len()),
        ChangeEvent::JunkChanged { nodes, junk: false } => {
            format!("unmarked {} junk", nodes.len())
        }
        ChangeEvent::AxisAttached { .. } => "attached axis".to_owned(),
        ChangeEvent::ViewOpened { .. } => "opened view".to_owned(),
        ChangeEvent::ViewClosed { .. } => "closed view".to_owned(),
        ChangeEvent::Reloaded => "reloaded from disk".to_owned(),
    }
}

impl ViewerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: ViewerConfig) -> Self {
        let state = Self::start_load(&config);
        Self { config, state }
    }

    fn start_load(config: &ViewerConfig) -> AppState {
        match load_workspace(&config.file) {
            Ok(workspace) => AppState::Ready(Box::new(ViewModel::new(workspace, config))),
            Err(load_error) => {
                error!(error = %format!("{load_error:#}"), "load failed");
                AppState::Error(format!("{load_error:#}"))
            }
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Error(message) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load data file");
                    ui.add_space(6.0);
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(&self.config));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                model.show(ctx, &mut reload_requested);

                let now = ctx.input(|input| input.time);
                let watch_due =
                    now - model.last_watch_secs >= self.config.watch_interval.as_secs_f64();
                if reload_requested {
                    model.reload();
                } else if watch_due {
                    model.last_watch_secs = now;
                    model.reload_if_changed();
                }
                ctx.request_repaint_after(self.config.watch_interval);
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}
