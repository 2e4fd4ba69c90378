use eframe::egui::{self, Color32, RichText, Ui};
use h5view::present::{Highlight, expandable_nodes, visible_rows};

use super::super::{RowAction, ViewModel};

const ROW_HEIGHT: f32 = 20.0;
const INDENT: f32 = 14.0;
const OPEN_VIEW_BG: Color32 = Color32::from_rgb(40, 90, 60);
const ATTRIBUTE_BG: Color32 = Color32::from_rgb(45, 55, 85);

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Hierarchy");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search paths")
            .on_hover_text("Whitespace-separated terms; every term must appear in the path.");
        if ui.text_edit_singleline(&mut self.search).changed() {
            self.workspace.set_query(&self.search);
        }

        ui.horizontal_wrapped(|ui| {
            if ui
                .checkbox(&mut self.attrs_visible, "Attributes")
                .on_hover_text("Show attribute rows under their owners.")
                .changed()
            {
                self.workspace.set_attrs_visible(self.attrs_visible);
            }
            if ui
                .checkbox(&mut self.junk_visible, "Junk")
                .on_hover_text("Show entries marked as junk.")
                .changed()
            {
                self.workspace.set_junk_visible(self.junk_visible);
            }
            ui.separator();
            if ui.small_button("Expand all").clicked() {
                self.expanded = expandable_nodes(self.workspace.tree());
            }
            if ui.small_button("Collapse all").clicked() {
                self.expanded.clear();
            }
        });

        ui.separator();
        self.draw_rows(ui);
    }

    fn draw_rows(&mut self, ui: &mut Ui) {
        let rows = visible_rows(
            self.workspace.tree(),
            self.workspace.filter(),
            &self.expanded,
        );
        if rows.is_empty() {
            ui.label("Nothing matches the current search.");
            return;
        }

        let mut action = None;
        egui::ScrollArea::vertical()
            .id_salt("hierarchy_rows")
            .auto_shrink([false, false])
            .show_rows(ui, ROW_HEIGHT, rows.len(), |ui, row_range| {
                for row in &rows[row_range] {
                    ui.horizontal(|ui| {
                        ui.add_space(row.depth as f32 * INDENT);
                        if row.has_children {
                            let arrow = if row.expanded { "▾" } else { "▸" };
                            if ui.small_button(arrow).clicked() {
                                action = Some(RowAction::Toggle(row.id));
                            }
                        } else {
                            ui.add_space(INDENT + 4.0);
                        }

                        let mut text = RichText::new(row.label.as_str());
                        text = match row.highlight {
                            Highlight::OpenView => text.background_color(OPEN_VIEW_BG),
                            Highlight::Attribute => text.background_color(ATTRIBUTE_BG),
                            Highlight::None => text,
                        };
                        if row.junk {
                            text = text.italics().weak();
                        }

                        let selected = self.selection.contains(&row.id);
                        let response = ui.selectable_label(selected, text);
                        if !row.detail.is_empty() {
                            ui.weak(row.detail.as_str());
                        }

                        if response.double_clicked() {
                            action = Some(RowAction::Activate(row.id));
                        } else if response.clicked() {
                            let additive =
                                ui.input(|input| input.modifiers.command || input.modifiers.shift);
                            action = Some(RowAction::Select {
                                id: row.id,
                                additive,
                            });
                        }
                    });
                }
            });

        if let Some(action) = action {
            self.apply_row_action(action);
        }
    }

    fn apply_row_action(&mut self, action: RowAction) {
        match action {
            RowAction::Toggle(id) => {
                if !self.expanded.remove(&id) {
                    self.expanded.insert(id);
                }
            }
            RowAction::Select { id, additive } => {
                if !additive {
                    self.selection.clear();
                }
                if let Some(position) = self.selection.iter().position(|selected| *selected == id) {
                    self.selection.remove(position);
                } else {
                    self.selection.push(id);
                }
                self.set_primary(self.selection.last().copied());
            }
            RowAction::Activate(id) => {
                self.selection = vec![id];
                self.set_primary(Some(id));
                let is_dataset = self
                    .workspace
                    .tree()
                    .get(id)
                    .is_some_and(|node| node.is_dataset());
                if is_dataset {
                    self.open_view(id);
                }
            }
        }
    }
}
