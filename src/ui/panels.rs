use egui::{Color32, Context, RichText, ScrollArea, Ui};

use crate::mesh::MODELS;
use crate::occluder::{GenerationStats, Parameter, ParameterLimits};
use crate::ui::state::UiState;
use crate::ui::theme::*;

/// What the user asked for this frame. Applied by the caller.
#[derive(Debug, Default)]
pub struct UiActions {
    pub select_model: Option<usize>,
    pub generate: bool,
    pub parameters: Vec<Parameter>,
}

/// Read-only figures shown in the panel.
pub struct PanelInfo<'a> {
    pub limits: &'a ParameterLimits,
    pub vertex_count: u32,
    pub index_count: u32,
    pub stats: Option<&'a GenerationStats>,
}

pub fn draw_side_panel(ctx: &Context, state: &mut UiState, info: &PanelInfo<'_>) -> UiActions {
    let mut actions = UiActions::default();

    egui::SidePanel::right("control_panel")
        .min_width(280.0)
        .max_width(380.0)
        .default_width(300.0)
        .frame(egui::Frame::default().fill(BG_PANEL).inner_margin(16.0))
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.heading(RichText::new("Occluder").strong());
                ui.add_space(4.0);
                ui.label(RichText::new("Voxel occluder generation").color(TEXT_MUTED).size(11.0));
                ui.add_space(16.0);

                section_header(ui, "MODEL");
                let current = state.selected_model;
                egui::ComboBox::from_id_salt("models")
                    .selected_text(MODELS.get(current).map_or("?", |m| m.id))
                    .width(ui.available_width())
                    .show_ui(ui, |ui| {
                        for (i, model) in MODELS.iter().enumerate() {
                            if ui.selectable_label(current == i, model.id).clicked() && current != i {
                                actions.select_model = Some(i);
                            }
                        }
                    });
                if let Some(model) = MODELS.get(current) {
                    ui.add_space(4.0);
                    ui.label(RichText::new(model.description).color(TEXT_MUTED).size(11.0).italics());
                }
                ui.add_space(16.0);

                section_header(ui, "PARAMETERS");
                generation_controls(ui, state, info.limits, &mut actions);
                ui.add_space(12.0);

                section_header(ui, "BOX TYPES");
                box_type_controls(ui, state, &mut actions);
                ui.add_space(12.0);

                section_header(ui, "DEBUG");
                debug_controls(ui, state, &mut actions);
                ui.add_space(12.0);

                if ui.add(egui::Button::new(RichText::new("Generate").color(BG_PURE_BLACK))
                    .fill(ACCENT_RED).min_size(egui::vec2(ui.available_width(), 32.0))).clicked() {
                    actions.generate = true;
                }
                ui.add_space(16.0);

                ui.separator();
                ui.add_space(12.0);

                section_header(ui, "VIEW");
                ui.horizontal(|ui| {
                    ui.checkbox(&mut state.depth_test, "Depth test");
                    ui.checkbox(&mut state.show_stats, "Stats");
                });
                ui.add_space(16.0);

                if state.show_stats {
                    stats_panel(ui, info);
                }

                if let Some(err) = &state.last_error {
                    error_box(ui, err);
                }
            });
        });

    actions
}

fn section_header(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).color(TEXT_MUTED).size(11.0).strong());
    ui.add_space(4.0);
}

fn generation_controls(ui: &mut Ui, state: &mut UiState, limits: &ParameterLimits, actions: &mut UiActions) {
    egui::Grid::new("generation").num_columns(2).spacing([12.0, 6.0]).show(ui, |ui| {
        ui.label("Voxel size");
        let voxel = egui::DragValue::new(&mut state.voxel_size)
            .speed(0.005)
            .range(limits.voxel_size_min..=limits.voxel_size_max)
            .fixed_decimals(3);
        if ui.add(voxel).changed() {
            actions.parameters.push(Parameter::VoxelSize(state.voxel_size));
        }
        ui.end_row();

        ui.label("Fill");
        let fill = egui::Slider::new(&mut state.fill_percentage, 0.0..=1.0).fixed_decimals(2);
        if ui.add(fill).changed() {
            actions.parameters.push(Parameter::FillPercentage(state.fill_percentage));
        }
        ui.end_row();
    });
}

fn box_type_controls(ui: &mut Ui, state: &mut UiState, actions: &mut UiActions) {
    let mut changed = false;
    ui.add_enabled_ui(!state.regular, |ui| {
        ui.horizontal(|ui| {
            changed |= ui.checkbox(&mut state.diagonals, "Diagonals").changed();
            changed |= ui.checkbox(&mut state.sides, "Sides").changed();
        });
        ui.horizontal(|ui| {
            changed |= ui.checkbox(&mut state.top, "Top").changed();
            changed |= ui.checkbox(&mut state.bottom, "Bottom").changed();
        });
    });
    changed |= ui.checkbox(&mut state.regular, "Regular (all faces)").changed();

    if changed {
        actions.parameters.push(Parameter::BoxTypes(state.box_types()));
    }
    if state.box_types().is_empty() {
        ui.label(RichText::new("No box type selected").color(ACCENT_ORANGE).size(11.0));
    }
}

fn debug_controls(ui: &mut Ui, state: &mut UiState, actions: &mut UiActions) {
    let mut changed = false;
    ui.horizontal(|ui| {
        changed |= ui.checkbox(&mut state.show_result, "Result").changed();
        changed |= ui.checkbox(&mut state.show_inner, "Inner").changed();
        changed |= ui.checkbox(&mut state.show_surface, "Surface").changed();
    });
    if changed {
        actions.parameters.push(Parameter::DebugFlags(state.debug_flags()));
    }
}

fn stats_panel(ui: &mut Ui, info: &PanelInfo<'_>) {
    section_header(ui, "STATISTICS");
    egui::Frame::default()
        .fill(BG_WIDGET)
        .stroke(egui::Stroke::new(1.0, BORDER_SUBTLE))
        .rounding(6.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.style_mut().override_font_id = Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));

            egui::Grid::new("stats").num_columns(2).spacing([20.0, 4.0]).show(ui, |ui| {
                stat_row(ui, "Mesh verts", fmt_num(info.vertex_count as usize), TEXT_PRIMARY);
                stat_row(ui, "Occl. idx", fmt_num(info.index_count as usize), TEXT_PRIMARY);

                if let Some(stats) = info.stats {
                    let [x, y, z] = stats.grid_dims;
                    stat_row(ui, "Grid", format!("{}x{}x{}", x, y, z), TEXT_PRIMARY);
                    stat_row(ui, "Surface", fmt_num(stats.surface_voxels), TEXT_PRIMARY);
                    stat_row(ui, "Inner", fmt_num(stats.inner_voxels), TEXT_PRIMARY);
                    stat_row(
                        ui,
                        "Boxes",
                        format!("{} / {}", stats.boxes_used, stats.boxes_total),
                        TEXT_BRIGHT,
                    );

                    let coverage_color = if stats.coverage >= 0.99 { ACCENT_GREEN } else { ACCENT_ORANGE };
                    stat_row(ui, "Coverage", format!("{:.1}%", stats.coverage * 100.0), coverage_color);
                }
            });

            if info.stats.is_some_and(|s| s.truncated) {
                ui.add_space(6.0);
                ui.label(RichText::new("Debug mesh truncated").color(ACCENT_ORANGE));
            }
        });
}

fn stat_row(ui: &mut Ui, label: &str, value: String, color: Color32) {
    ui.label(RichText::new(label).color(TEXT_MUTED));
    ui.label(RichText::new(value).color(color));
    ui.end_row();
}

fn error_box(ui: &mut Ui, err: &str) {
    ui.add_space(6.0);
    egui::Frame::default()
        .fill(Color32::from_rgb(60, 20, 25))
        .stroke(egui::Stroke::new(1.0, ACCENT_RED))
        .rounding(4.0)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.label(RichText::new(err).color(TEXT_BRIGHT).size(11.0));
        });
}

fn fmt_num(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        format!("{}", n)
    }
}
