use eframe::egui::{self, Color32, Pos2, Rect, RichText, Sense, Stroke, Ui, Vec2, pos2, vec2};
use h5view::correlate::Correlation;
use h5view::store::ArrayData;
use h5view::util::{format_shape, fuzzy_rank};
use h5view::{NodeId, PlotKind, ViewRequest};

use super::super::{Status, ViewModel};

const PREVIEW_HEIGHT: f32 = 140.0;
const MAX_PREVIEW_CELLS: usize = 64;

fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .fold(None, |range, value| match range {
            None => Some((value, value)),
            Some((low, high)) => Some((low.min(value), high.max(value))),
        })
}

fn normalize(value: f64, low: f64, high: f64) -> f32 {
    if high > low {
        ((value - low) / (high - low)) as f32
    } else {
        0.5
    }
}

fn draw_line(ui: &mut Ui, values: &[f64], xs: Option<&[f64]>) {
    let (response, painter) =
        ui.allocate_painter(vec2(ui.available_width(), PREVIEW_HEIGHT), Sense::hover());
    let rect = response.rect;
    painter.rect_filled(rect, 2.0, Color32::from_gray(24));

    let Some((low, high)) = value_range(values) else {
        return;
    };
    let xs = xs.filter(|xs| xs.len() == values.len());
    let (x_low, x_high) = match xs.and_then(value_range) {
        Some(range) => range,
        None => (0.0, values.len().saturating_sub(1) as f64),
    };

    let points = values
        .iter()
        .enumerate()
        .filter(|(_, value)| value.is_finite())
        .map(|(index, value)| {
            let x = xs.map_or(index as f64, |xs| xs[index]);
            pos2(
                rect.left() + normalize(x, x_low, x_high) * rect.width(),
                rect.bottom() - normalize(*value, low, high) * rect.height(),
            )
        })
        .collect::<Vec<Pos2>>();
    painter.add(egui::Shape::line(
        points,
        Stroke::new(1.5, Color32::from_rgb(120, 190, 255)),
    ));
}

fn draw_image(ui: &mut Ui, rows: usize, cols: usize, values: &[f64]) {
    let side = PREVIEW_HEIGHT.min(ui.available_width());
    let (response, painter) = ui.allocate_painter(Vec2::splat(side), Sense::hover());
    let rect = response.rect;
    let Some((low, high)) = value_range(values) else {
        return;
    };

    let cells_y = rows.clamp(1, MAX_PREVIEW_CELLS);
    let cells_x = cols.clamp(1, MAX_PREVIEW_CELLS);
    let cell = vec2(rect.width() / cells_x as f32, rect.height() / cells_y as f32);
    for cy in 0..cells_y {
        for cx in 0..cells_x {
            let row = cy * rows / cells_y;
            let col = cx * cols / cells_x;
            let Some(value) = values.get(row * cols + col) else {
                continue;
            };
            let shade = (normalize(*value, low, high) * 255.0) as u8;
            let min = rect.min + vec2(cx as f32 * cell.x, cy as f32 * cell.y);
            painter.rect_filled(Rect::from_min_size(min, cell), 0.0, Color32::from_gray(shade));
        }
    }
}

fn draw_preview(ui: &mut Ui, view: &ViewRequest) {
    let data: &ArrayData = &view.data;
    match (view.kind, data.shape.as_slice()) {
        (PlotKind::Line, _) => {
            let xs = view.axis.as_ref().map(|axis| axis.data.values.as_slice());
            draw_line(ui, &data.values, xs);
        }
        (PlotKind::Image, &[rows, cols]) => draw_image(ui, rows, cols, &data.values),
        (PlotKind::Movie, &[_, rows, cols]) => {
            ui.weak("first frame");
            let frame = data.values.get(..rows * cols).unwrap_or_default();
            draw_image(ui, rows, cols, frame);
        }
        _ => {}
    }
}

impl ViewModel {
    pub(in crate::app) fn open_view(&mut self, id: NodeId) {
        match self.workspace.open_view(id) {
            Ok(Some(view)) => {
                self.status = Some(Status::Info(format!("Opened {}", view.title)));
                self.views.push(view);
            }
            Ok(None) => {
                self.status = Some(Status::Info("A view of this dataset is already open".to_owned()));
            }
            Err(error) => self.status = Some(Status::Error(error.to_string())),
        }
    }

    pub(in crate::app) fn draw_views(&mut self, ui: &mut Ui) {
        egui::ScrollArea::vertical()
            .id_salt("views")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading("Open Views");
                ui.add_space(4.0);
                self.draw_open_views(ui);

                ui.separator();
                ui.heading("Property Correlation");
                ui.add_space(4.0);
                self.draw_correlation(ui);
            });
    }

    fn draw_open_views(&mut self, ui: &mut Ui) {
        if self.views.is_empty() {
            ui.label("Double-click a dataset to open a view.");
            return;
        }

        let mut closed = None;
        for (index, view) in self.views.iter().enumerate() {
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(view.title.as_str()).strong());
                    ui.label(format!(
                        "{} {}",
                        view.kind.label(),
                        format_shape(&view.data.shape)
                    ));
                    if let Some(axis) = &view.axis {
                        ui.weak(format!("x: {}", axis.label));
                    }
                    if ui.small_button("Close").clicked() {
                        closed = Some(index);
                    }
                });
                if let Some((low, high)) = value_range(&view.data.values) {
                    ui.weak(format!("range {low:.4} .. {high:.4}"));
                }
                draw_preview(ui, view);
            });
        }

        if let Some(index) = closed {
            let view = self.views.remove(index);
            self.workspace.close_view(view.handle);
        }
    }

    fn draw_correlation(&mut self, ui: &mut Ui) {
        let index = self.workspace.property_index();
        if index.is_empty() {
            ui.label("No dataset carries numeric attributes.");
            return;
        }

        ui.horizontal(|ui| {
            ui.label("Filter keys");
            ui.text_edit_singleline(&mut self.key_filter);
        });
        let keys = fuzzy_rank(index.keys(), &self.key_filter, |key| *key);

        ui.horizontal(|ui| {
            for (id, selected) in [("x", &mut self.correlate_x), ("y", &mut self.correlate_y)] {
                egui::ComboBox::from_label(id)
                    .selected_text(selected.as_str())
                    .show_ui(ui, |ui| {
                        for key in &keys {
                            let label = format!("{key} ({})", index.count(key));
                            ui.selectable_value(selected, (*key).to_owned(), label);
                        }
                    });
            }
        });

        let ready = !self.correlate_x.is_empty() && !self.correlate_y.is_empty();
        if ui.add_enabled(ready, egui::Button::new("Correlate")).clicked() {
            self.correlation = Some(
                self.workspace
                    .correlate(&self.correlate_x, &self.correlate_y)
                    .map_err(|error| error.to_string()),
            );
        }

        let mut drill_down = None;
        match &self.correlation {
            None => {}
            Some(Err(message)) => {
                ui.label(RichText::new(message.as_str()).color(Color32::from_rgb(220, 80, 70)));
            }
            Some(Ok(Correlation::NoSharedProperties)) => {
                ui.label("No dataset carries both properties.");
            }
            Some(Ok(Correlation::Points(points))) => {
                egui::Grid::new("correlation_points")
                    .striped(true)
                    .num_columns(3)
                    .show(ui, |ui| {
                        ui.strong("dataset");
                        ui.strong(self.correlate_x.as_str());
                        ui.strong(self.correlate_y.as_str());
                        ui.end_row();
                        for point in points {
                            let path = self.workspace.tree().path_of(point.dataset).unwrap_or("?");
                            if ui.link(path).clicked() {
                                drill_down = Some(point.dataset);
                            }
                            ui.label(format!("{}", point.x));
                            ui.label(format!("{}", point.y));
                            ui.end_row();
                        }
                    });
            }
        }

        if let Some(id) = drill_down {
            self.selection = vec![id];
            self.set_primary(Some(id));
            self.open_view(id);
        }
    }
}
