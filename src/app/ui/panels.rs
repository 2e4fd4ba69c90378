use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use eframe::egui::{self, Align, Color32, Context, Layout, RichText};
use h5view::store::Store;
use h5view::{JsonFileStore, NodeId, Workspace};

use super::super::{ACTIVITY_LIMIT, Status, ViewModel, ViewerConfig, summarize};

impl ViewModel {
    pub(in crate::app) fn new(mut workspace: Workspace<JsonFileStore>, config: &ViewerConfig) -> Self {
        let activity = Rc::new(RefCell::new(VecDeque::new()));
        let log = Rc::clone(&activity);
        workspace.subscribe(move |event| {
            let mut log = log.borrow_mut();
            log.push_front(summarize(event));
            log.truncate(ACTIVITY_LIMIT);
        });
        workspace.set_attrs_visible(config.show_attributes);
        workspace.set_junk_visible(config.show_junk);

        Self {
            workspace,
            search: String::new(),
            attrs_visible: config.show_attributes,
            junk_visible: config.show_junk,
            expanded: HashSet::new(),
            selection: Vec::new(),
            primary: None,
            rename_buffer: String::new(),
            value_buffer: String::new(),
            axis_filter: String::new(),
            axis_label: String::new(),
            views: Vec::new(),
            key_filter: String::new(),
            correlate_x: String::new(),
            correlate_y: String::new(),
            correlation: None,
            status: None,
            activity,
            last_watch_secs: 0.0,
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, reload_requested: &mut bool) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("h5view");
                    ui.separator();
                    ui.label(format!("file: {}", self.workspace.store().location()));
                    ui.label(format!("nodes: {}", self.workspace.tree().len().saturating_sub(1)));
                    ui.label(format!(
                        "matching: {}",
                        self.workspace.filter().matching_items().len()
                    ));
                    if ui.button("Refresh").clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!("open views: {}", self.views.len()));
                    });
                });
            });

        egui::TopBottomPanel::bottom("status_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    match &self.status {
                        Some(Status::Error(message)) => {
                            ui.label(RichText::new(message).color(Color32::from_rgb(220, 80, 70)));
                        }
                        Some(Status::Info(message)) => {
                            ui.label(message.as_str());
                        }
                        None => {
                            ui.weak("Ready");
                        }
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(latest) = self.activity.borrow().front() {
                            ui.weak(latest.as_str());
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(420.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_views(ui));
    }

    pub(in crate::app) fn set_primary(&mut self, primary: Option<NodeId>) {
        if self.primary == primary {
            return;
        }
        self.primary = primary;
        self.axis_filter.clear();
        self.axis_label.clear();

        let node = primary.and_then(|id| self.workspace.tree().get(id));
        self.rename_buffer = node.map(|node| node.name.clone()).unwrap_or_default();
        self.value_buffer = node
            .and_then(|node| node.attribute_value())
            .map(ToString::to_string)
            .unwrap_or_default();
    }

    pub(in crate::app) fn report<E: std::fmt::Display>(&mut self, result: Result<(), E>, done: &str) {
        self.status = Some(match result {
            Ok(()) => Status::Info(done.to_owned()),
            Err(error) => Status::Error(error.to_string()),
        });
    }

    /// A failed reload keeps the current tree and only reports the error.
    pub(in crate::app) fn reload(&mut self) {
        let (expanded, selection) = self.remembered_paths();
        match self.workspace.reload() {
            Ok(()) => self.restore_after_reload(&expanded, &selection),
            Err(error) => self.status = Some(Status::Error(format!("reload failed: {error}"))),
        }
    }

    pub(in crate::app) fn reload_if_changed(&mut self) {
        let (expanded, selection) = self.remembered_paths();
        match self.workspace.reload_if_changed() {
            Ok(true) => self.restore_after_reload(&expanded, &selection),
            Ok(false) => {}
            Err(error) => self.status = Some(Status::Error(format!("reload failed: {error}"))),
        }
    }

    fn remembered_paths(&self) -> (Vec<String>, Vec<String>) {
        (
            self.paths_of(self.expanded.iter().copied()),
            self.paths_of(self.selection.iter().copied()),
        )
    }

    fn restore_after_reload(&mut self, expanded: &[String], selection: &[String]) {
        // Handles from before the reload no longer point at anything.
        self.views.clear();
        self.correlation = None;
        self.expanded = self.ids_of(expanded).into_iter().collect();
        self.selection = self.ids_of(selection);
        self.primary = None;
        self.rename_buffer.clear();
        self.value_buffer.clear();
        self.set_primary(self.selection.first().copied());
        self.status = Some(Status::Info("Reloaded from disk".to_owned()));
    }

    fn paths_of(&self, ids: impl Iterator<Item = NodeId>) -> Vec<String> {
        let tree = self.workspace.tree();
        ids.filter(|id| tree.get(*id).is_some_and(|node| !node.is_attribute()))
            .filter_map(|id| tree.path_of(id).map(str::to_owned))
            .collect()
    }

    fn ids_of(&self, paths: &[String]) -> Vec<NodeId> {
        paths
            .iter()
            .filter_map(|path| self.workspace.tree().find_by_path(path))
            .collect()
    }
}
