use eframe::egui::{self, RichText, Ui};
use h5view::util::{format_shape, fuzzy_rank};
use h5view::{NodeId, NodeKind, find_axis_candidates};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(id) = self.primary else {
            ui.label("Select an entry in the hierarchy. Ctrl-click selects several.");
            return;
        };
        let Some(node) = self.workspace.tree().get(id) else {
            ui.label("Selected entry no longer exists.");
            return;
        };

        let path = node.path.clone();
        let is_attribute = node.is_attribute();
        let junk = self.workspace.tree().is_junk(id);
        ui.label(RichText::new(node.name.as_str()).strong());
        ui.small(path.as_str());
        ui.add_space(6.0);

        match &node.kind {
            NodeKind::Group => {
                ui.label("Group");
            }
            NodeKind::Dataset(dataset) => {
                ui.label(format!("Dataset {}", format_shape(&dataset.shape)));
                for link in &dataset.axes {
                    let axis_path = self.workspace.tree().path_of(link.dataset).unwrap_or("?");
                    ui.label(format!("Axis {}: {} ({axis_path})", link.dim, link.label));
                }
            }
            NodeKind::Attribute(value) => {
                ui.label(format!("Attribute ({})", value.type_label()));
            }
        }
        if junk {
            ui.label(RichText::new("Marked as junk").italics());
        }

        ui.separator();
        let rename_label = if is_attribute { "Key" } else { "Name" };
        ui.horizontal(|ui| {
            ui.label(rename_label);
            ui.text_edit_singleline(&mut self.rename_buffer);
        });
        if ui.button("Rename").clicked() {
            let result = self.workspace.rename(id, &self.rename_buffer);
            self.report(result, "Renamed");
        }

        if is_attribute {
            ui.horizontal(|ui| {
                ui.label("Value");
                ui.text_edit_singleline(&mut self.value_buffer);
            });
            if ui
                .button("Set value")
                .on_hover_text("Integers and decimals are stored as numbers, anything else as text.")
                .clicked()
            {
                let result = self.workspace.set_attribute_value(id, &self.value_buffer);
                self.report(result, "Value updated");
            }
            return;
        }

        ui.separator();
        self.draw_junk_controls(ui);

        if self.workspace.tree().get(id).is_some_and(|node| node.is_dataset()) {
            ui.separator();
            if ui.button("Open view").clicked() {
                self.open_view(id);
            }
            ui.separator();
            self.draw_axis_picker(ui, id);
        }
    }

    fn draw_junk_controls(&mut self, ui: &mut Ui) {
        let targets = self
            .selection
            .iter()
            .copied()
            .filter(|id| {
                self.workspace
                    .tree()
                    .get(*id)
                    .is_some_and(|node| !node.is_attribute())
            })
            .collect::<Vec<_>>();

        ui.label(format!("{} entries selected", targets.len()));
        ui.horizontal(|ui| {
            if ui.button("Mark as junk").clicked() {
                let result = self.workspace.mark_junk(&targets);
                self.report(result, "Marked as junk");
            }
            if ui.button("Unmark junk").clicked() {
                let result = self.workspace.unmark_junk(&targets);
                self.report(result, "Junk marker removed");
            }
        });
    }

    fn draw_axis_picker(&mut self, ui: &mut Ui, target: NodeId) {
        ui.label(RichText::new("Attach axis").strong());
        let tree = self.workspace.tree();
        let candidates = find_axis_candidates(tree, target)
            .into_iter()
            .filter_map(|id| Some((id, tree.path_of(id)?.to_owned())))
            .collect::<Vec<_>>();
        if candidates.is_empty() {
            ui.label("No dataset has the same shape.");
            return;
        }

        ui.horizontal(|ui| {
            ui.label("Filter");
            ui.text_edit_singleline(&mut self.axis_filter);
        });
        ui.horizontal(|ui| {
            ui.label("Label");
            ui.text_edit_singleline(&mut self.axis_label)
                .on_hover_text("Defaults to the axis dataset's name.");
        });

        let ranked = fuzzy_rank(candidates.iter(), &self.axis_filter, |(_, path)| path.as_str());
        let mut chosen = None;
        egui::ScrollArea::vertical()
            .id_salt("axis_candidates")
            .max_height(160.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for (id, path) in ranked {
                    if ui.button(path.as_str()).clicked() {
                        chosen = Some(*id);
                    }
                }
            });

        if let Some(axis) = chosen {
            let label = match self.axis_label.trim() {
                "" => self
                    .workspace
                    .tree()
                    .get(axis)
                    .map(|node| node.name.clone())
                    .unwrap_or_default(),
                label => label.to_owned(),
            };
            let result = self.workspace.attach_axis(target, axis, &label);
            self.report(result, "Axis attached");
        }
    }
}
