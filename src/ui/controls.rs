use chrono::NaiveDate;
use eframe::egui::{self, RichText, Ui};
use egui_extras::DatePickerButton;

use crate::data::model::CellValue;
use crate::filter::control::{ControlKey, ControlPresenter, ControlSpec, ControlValue};

// ---------------------------------------------------------------------------
// egui presenter – draws one filter control per chosen column
// ---------------------------------------------------------------------------

/// Renders controls into a `Ui` and reads back what the user set this frame.
pub struct EguiPresenter<'a> {
    ui: &'a mut Ui,
}

impl<'a> EguiPresenter<'a> {
    pub fn new(ui: &'a mut Ui) -> Self {
        Self { ui }
    }
}

impl ControlPresenter for EguiPresenter<'_> {
    fn present(
        &mut self,
        key: &ControlKey,
        spec: &ControlSpec,
        current: Option<&ControlValue>,
    ) -> ControlValue {
        let mut value = current.cloned().unwrap_or_else(|| spec.default_value());
        let column = key.column.as_str();

        self.ui.push_id(key.to_string(), |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                ui.label("↳");
                ui.vertical(|ui: &mut Ui| match (spec, &mut value) {
                    (ControlSpec::MultiSelect { options }, ControlValue::Selection(selected)) => {
                        multi_select(ui, column, options, selected);
                    }
                    (ControlSpec::RangeSlider { min, max, step }, ControlValue::Range(lo, hi)) => {
                        range_slider(ui, column, (*min, *max, *step), lo, hi);
                    }
                    (ControlSpec::DateRange { min, max }, ControlValue::Dates(dates)) => {
                        date_range(ui, key, (*min, *max), dates);
                    }
                    (ControlSpec::TextPattern, ControlValue::Pattern(pattern)) => {
                        ui.label(format!("Substring or regex in {column}"));
                        ui.text_edit_singleline(pattern);
                    }
                    _ => {
                        ui.label(RichText::new("unsupported control").weak());
                    }
                });
            });
        });

        value
    }
}

fn multi_select(ui: &mut Ui, column: &str, options: &[CellValue], selected: &mut Vec<CellValue>) {
    let header = format!("Values for {column}  ({}/{})", selected.len(), options.len());
    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt("values")
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    *selected = options.to_vec();
                }
                if ui.small_button("None").clicked() {
                    selected.clear();
                }
            });

            for option in options {
                let mut checked = selected.contains(option);
                if ui.checkbox(&mut checked, cell_label(option)).changed() {
                    if checked {
                        selected.push(option.clone());
                    } else {
                        selected.retain(|v| v != option);
                    }
                }
            }
        });
}

fn range_slider(
    ui: &mut Ui,
    column: &str,
    (min, max, step): (f64, f64, f64),
    lo: &mut f64,
    hi: &mut f64,
) {
    ui.label(format!("Values for {column}"));
    ui.add(egui::Slider::new(lo, min..=max).step_by(step).text("from"));
    ui.add(egui::Slider::new(hi, min..=max).step_by(step).text("to"));
    if *lo > *hi {
        *hi = *lo;
    }
}

fn date_range(
    ui: &mut Ui,
    key: &ControlKey,
    (min, max): (Option<NaiveDate>, Option<NaiveDate>),
    dates: &mut Vec<NaiveDate>,
) {
    let today = chrono::Local::now().date_naive();
    let mut use_start = !dates.is_empty();
    let mut use_end = dates.len() >= 2;
    let mut start = dates.first().copied().or(min).unwrap_or(today);
    let mut end = dates.get(1).copied().or(max).unwrap_or(today);
    let start_id = format!("{key}_start");
    let end_id = format!("{key}_end");

    ui.label(format!("Values for {}", key.column));
    ui.horizontal(|ui: &mut Ui| {
        ui.checkbox(&mut use_start, "from");
        ui.add_enabled(use_start, DatePickerButton::new(&mut start).id_salt(&start_id));
        ui.checkbox(&mut use_end, "to");
        ui.add_enabled(use_end, DatePickerButton::new(&mut end).id_salt(&end_id));
    });

    *dates = [(use_start, start), (use_end, end)]
        .into_iter()
        .filter_map(|(used, d)| used.then_some(d))
        .collect();
}

/// Text shown for a value in lists and tables.
pub fn cell_label(value: &CellValue) -> String {
    match value {
        CellValue::Null => "<missing>".to_string(),
        other => other.to_string(),
    }
}
