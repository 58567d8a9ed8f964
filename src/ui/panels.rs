use std::path::Path;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::loader::SUPPORTED_EXTENSIONS;
use crate::state::{AppState, EntryMode, Pane, Status};
use crate::ui::controls::EguiPresenter;
use crate::ui::table::data_table;

// ---------------------------------------------------------------------------
// Pane – one file: sheet picker, filters, table, annexure form
// ---------------------------------------------------------------------------

/// Render one file's pane.
pub fn pane(ui: &mut Ui, pane: &mut Pane, output_dir: &Path) {
    let scope = pane.session.scope().to_string();

    let Some(source) = &pane.source else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Upload your file  (File → Open…)");
        });
        show_status(ui, pane.status.as_ref());
        return;
    };

    ui.heading(source.file_name());

    // ---- Sheet selector (spreadsheets only) ----
    let mut picked_sheet: Option<String> = None;
    if !source.sheets.is_empty() {
        let current = source.selected_sheet.clone().unwrap_or_default();
        ui.label("Select a sheet to display");
        egui::ComboBox::from_id_salt(format!("{scope}_sheet"))
            .selected_text(&current)
            .show_ui(ui, |ui: &mut Ui| {
                for sheet in &source.sheets {
                    if ui.selectable_label(current == *sheet, sheet).clicked() {
                        picked_sheet = Some(sheet.clone());
                    }
                }
            });
    }
    if let Some(sheet) = picked_sheet {
        pane.select_sheet(&sheet);
    }

    let Some(dataset) = &pane.dataset else {
        show_status(ui, pane.status.as_ref());
        return;
    };

    // ---- Filters ----
    ui.checkbox(&mut pane.session.enabled, "Add filters");
    if pane.session.enabled {
        let columns: Vec<String> = dataset.column_names().map(str::to_string).collect();
        let header = format!(
            "Filter dataframe on  ({}/{})",
            pane.session.columns().len(),
            columns.len()
        );
        egui::CollapsingHeader::new(RichText::new(header).strong())
            .id_salt(format!("{scope}_columns"))
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                for col in &columns {
                    let mut chosen = pane.session.is_chosen(col);
                    if ui.checkbox(&mut chosen, col).changed() {
                        if chosen {
                            pane.session.choose(col);
                        } else {
                            pane.session.unchoose(col);
                        }
                    }
                }
            });
    }

    let result = pane.session.apply(dataset, &mut EguiPresenter::new(ui));
    let total = dataset.len();
    ui.separator();

    let filtered = match result {
        Ok(filtered) => filtered,
        Err(e) => {
            ui.label(RichText::new(format!("Filtering failed: {e}")).color(Color32::RED));
            show_status(ui, pane.status.as_ref());
            return;
        }
    };

    ui.label(format!("{} of {total} rows", filtered.len()));
    data_table(ui, &format!("{scope}_table"), &filtered);
    ui.separator();

    // ---- Annexure form ----
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Enter a name for the Annexure");
        ui.text_edit_singleline(&mut pane.annexure_name);
    });
    if ui.button("Create Annexure").clicked() {
        pane.export(&filtered, output_dir);
    }
    show_status(ui, pane.status.as_ref());
}

fn show_status(ui: &mut Ui, status: Option<&Status>) {
    match status {
        Some(Status::Success(msg)) => {
            ui.label(RichText::new(msg).color(Color32::DARK_GREEN));
        }
        Some(Status::Warning(msg)) => {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
        None => {}
    }
}

/// Render the pane(s) of the current mode into the central panel.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    let output_dir = &state.settings.output_dir;
    match state.mode {
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Choose a data entry point to begin");
            });
        }
        Some(EntryMode::Single) => {
            if let Some(p) = state.panes.first_mut() {
                ScrollArea::vertical()
                    .id_salt("pane_cb1")
                    .auto_shrink([false, false])
                    .show(ui, |ui: &mut Ui| pane(ui, p, output_dir));
            }
        }
        Some(EntryMode::Dual) => {
            ui.columns(state.panes.len(), |columns: &mut [Ui]| {
                for (ui, p) in columns.iter_mut().zip(state.panes.iter_mut()) {
                    let id = format!("pane_{}", p.session.scope());
                    ScrollArea::vertical()
                        .id_salt(id)
                        .auto_shrink([false, false])
                        .show(ui, |ui: &mut Ui| pane(ui, p, output_dir));
                }
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            let enabled = state.mode.is_some();
            if ui.add_enabled(enabled, egui::Button::new("Open…")).clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        let current = state.mode.map(EntryMode::label).unwrap_or("");
        ui.label("Choose a data entry point");
        egui::ComboBox::from_id_salt("entry_mode")
            .selected_text(current)
            .show_ui(ui, |ui: &mut Ui| {
                for mode in [EntryMode::Single, EntryMode::Dual] {
                    if ui
                        .selectable_label(state.mode == Some(mode), mode.label())
                        .clicked()
                    {
                        state.set_mode(mode);
                    }
                }
            });

        ui.separator();

        for p in &state.panes {
            if let Some(ds) = &p.dataset {
                ui.label(format!("{}: {} rows", p.session.scope(), ds.len()));
            }
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let Some(mode) = state.mode else {
        return;
    };
    let dialog = rfd::FileDialog::new()
        .set_title("Upload your file")
        .add_filter("Supported files", SUPPORTED_EXTENSIONS)
        .add_filter("CSV", &["csv"])
        .add_filter("Spreadsheets", &["xlsx", "xlsm", "xlsb", "xls", "ods"]);

    let picked = match mode {
        EntryMode::Single => dialog.pick_file().map(|p| vec![p]),
        EntryMode::Dual => dialog.pick_files(),
    };

    if let Some(paths) = picked {
        if let Err(e) = state.open_files(paths) {
            log::warn!("{e:#}");
            state.status_message = Some(format!("{e:#}"));
        }
    }
}
