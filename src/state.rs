use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use crate::annexure;
use crate::config::Settings;
use crate::data::loader::{self, SourceKind};
use crate::data::model::Dataset;
use crate::filter::session::FilterSession;

/// Dual mode shows exactly this many files side by side.
pub const DUAL_FILE_COUNT: usize = 2;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// How many files the user works on at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    Single,
    Dual,
}

impl EntryMode {
    pub fn file_count(self) -> usize {
        match self {
            EntryMode::Single => 1,
            EntryMode::Dual => DUAL_FILE_COUNT,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntryMode::Single => "Single",
            EntryMode::Dual => "Multiple",
        }
    }
}

/// Outcome line shown under a pane.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Success(String),
    Warning(String),
}

/// An opened input file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub kind: SourceKind,
    /// Worksheet names; empty for formats without sheets.
    pub sheets: Vec<String>,
    pub selected_sheet: Option<String>,
}

impl SourceFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One file's worth of UI state: the loaded data, its filters and the
/// annexure form.
#[derive(Debug, Clone)]
pub struct Pane {
    pub session: FilterSession,
    pub source: Option<SourceFile>,
    /// Loaded dataset (None until a file is opened and decoded).
    pub dataset: Option<Dataset>,
    pub annexure_name: String,
    pub status: Option<Status>,
}

impl Pane {
    pub fn new(scope: &str) -> Self {
        Self {
            session: FilterSession::new(scope),
            source: None,
            dataset: None,
            annexure_name: String::new(),
            status: None,
        }
    }

    /// Open a file. Spreadsheets list their sheets and load the first one.
    pub fn open(&mut self, path: PathBuf) {
        let opened = SourceKind::from_path(&path).and_then(|kind| {
            let sheets = if kind.has_sheets() {
                loader::sheet_names(&path)?
            } else {
                Vec::new()
            };
            Ok(SourceFile {
                selected_sheet: sheets.first().cloned(),
                path,
                kind,
                sheets,
            })
        });

        match opened {
            Ok(source) => {
                self.source = Some(source);
                self.reload();
            }
            Err(e) => self.fail_load(e),
        }
    }

    /// Switch to another worksheet of the open spreadsheet.
    pub fn select_sheet(&mut self, sheet: &str) {
        let Some(source) = &mut self.source else {
            return;
        };
        if source.selected_sheet.as_deref() == Some(sheet) {
            return;
        }
        source.selected_sheet = Some(sheet.to_string());
        self.reload();
    }

    fn reload(&mut self) {
        let Some(source) = &self.source else {
            return;
        };
        match loader::load_file(&source.path, source.selected_sheet.as_deref()) {
            Ok(dataset) => {
                log::info!(
                    "[{}] loaded {} rows with columns {:?}",
                    self.session.scope(),
                    dataset.len(),
                    dataset.column_names().collect::<Vec<_>>()
                );
                self.session.reset();
                self.dataset = Some(dataset);
                self.status = None;
            }
            Err(e) => self.fail_load(e),
        }
    }

    fn fail_load(&mut self, e: anyhow::Error) {
        log::error!("[{}] failed to load file: {e:#}", self.session.scope());
        self.dataset = None;
        self.session.reset();
        self.status = Some(Status::Warning(format!("Error: {e:#}")));
    }

    /// Export `filtered` as the annexure named in the form. Failures are
    /// reported on the pane; the pane stays usable.
    pub fn export(&mut self, filtered: &Dataset, output_dir: &Path) {
        self.status = Some(
            match annexure::create_annexure(filtered, output_dir, &self.annexure_name) {
                Ok(_) => Status::Success("Successfully created the Annexure!".to_string()),
                Err(e) => {
                    log::error!("[{}] annexure export failed: {e}", self.session.scope());
                    Status::Warning(format!("Failed to create Annexure! {e}"))
                }
            },
        );
    }
}

/// The full UI state, independent of rendering.
#[derive(Debug)]
pub struct AppState {
    pub settings: Settings,
    /// Chosen entry mode (None until the user picks one).
    pub mode: Option<EntryMode>,
    /// One pane per file of the current mode.
    pub panes: Vec<Pane>,
    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            mode: None,
            panes: Vec::new(),
            status_message: None,
        }
    }

    /// Switch entry mode, starting over with empty panes.
    pub fn set_mode(&mut self, mode: EntryMode) {
        if self.mode == Some(mode) {
            return;
        }
        self.mode = Some(mode);
        self.panes = (1..=mode.file_count())
            .map(|i| Pane::new(&format!("cb{i}")))
            .collect();
        self.status_message = None;
    }

    /// Open the picked files into the panes, one file per pane.
    pub fn open_files(&mut self, paths: Vec<PathBuf>) -> Result<()> {
        let Some(mode) = self.mode else {
            bail!("Choose a data entry mode first");
        };
        if paths.len() != mode.file_count() {
            bail!(
                "{} mode takes exactly {} file(s), got {}",
                mode.label(),
                mode.file_count(),
                paths.len()
            );
        }
        for (pane, path) in self.panes.iter_mut().zip(paths) {
            pane.open(path);
        }
        self.status_message = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;
    use crate::filter::control::DefaultPresenter;
    use tempfile::TempDir;

    fn csv(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, "Name,Age\nAlice,5\nBob,12\n").unwrap();
        path
    }

    #[test]
    fn dual_mode_needs_exactly_two_files() {
        let dir = TempDir::new().unwrap();
        let mut state = AppState::new(Settings::default());
        state.set_mode(EntryMode::Dual);
        assert_eq!(state.panes.len(), 2);

        let one = vec![csv(&dir, "a.csv")];
        assert!(state.open_files(one).is_err());

        let three = vec![csv(&dir, "a.csv"), csv(&dir, "b.csv"), csv(&dir, "c.csv")];
        assert!(state.open_files(three).is_err());

        state
            .open_files(vec![csv(&dir, "a.csv"), csv(&dir, "b.csv")])
            .unwrap();
        assert!(state.panes.iter().all(|p| p.dataset.is_some()));
        assert_eq!(state.panes[0].session.scope(), "cb1");
        assert_eq!(state.panes[1].session.scope(), "cb2");
    }

    #[test]
    fn files_need_a_mode() {
        let mut state = AppState::new(Settings::default());
        assert!(state.open_files(Vec::new()).is_err());
    }

    #[test]
    fn reopening_resets_filters() {
        let dir = TempDir::new().unwrap();
        let mut pane = Pane::new("cb1");
        pane.open(csv(&dir, "a.csv"));
        pane.session.choose("Age");

        pane.open(csv(&dir, "b.csv"));

        assert!(pane.session.columns().is_empty());
        assert_eq!(pane.dataset.as_ref().map(Dataset::len), Some(2));
    }

    #[test]
    fn bad_file_is_reported_on_the_pane() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        let mut pane = Pane::new("cb1");

        pane.open(path);

        assert!(pane.dataset.is_none());
        assert!(matches!(pane.status, Some(Status::Warning(_))));
    }

    #[test]
    fn spreadsheet_opens_first_sheet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.xlsx");
        let ds = Dataset::from_records(
            vec!["Region".into()],
            vec![vec![CellValue::Text("North".into())]],
        );
        annexure::write_annexure(&ds, &path).unwrap();
        let mut pane = Pane::new("cb1");

        pane.open(path);

        let source = pane.source.as_ref().unwrap();
        assert_eq!(source.sheets, vec!["Sheet1".to_string()]);
        assert_eq!(source.selected_sheet.as_deref(), Some("Sheet1"));
        assert_eq!(
            pane.dataset.as_ref().unwrap().rows[0].get("Region"),
            &CellValue::Text("North".into())
        );
    }

    #[test]
    fn export_reports_success_and_failure() {
        let dir = TempDir::new().unwrap();
        let mut pane = Pane::new("cb1");
        pane.open(csv(&dir, "a.csv"));
        pane.session.enabled = true;
        let ds = pane.dataset.clone().unwrap();
        let filtered = pane.session.apply(&ds, &mut DefaultPresenter).unwrap();

        pane.annexure_name = "out".into();
        pane.export(&filtered, dir.path());
        assert!(matches!(pane.status, Some(Status::Success(_))));
        assert!(dir.path().join("out.xlsx").exists());

        // a name that points into a missing directory cannot be written
        pane.annexure_name = "missing/sub/out".into();
        pane.export(&filtered, dir.path());
        assert!(matches!(pane.status, Some(Status::Warning(_))));
    }
}
