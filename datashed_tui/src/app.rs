//! Browser state and event handling.

use crate::panels::{extract_plot_data, PlotData, PlotSelector};
use crossterm::event::{KeyCode, KeyEvent};
use datashed_catalog::{Catalog, CatalogEntry};
use datashed_persist::PersistStore;
use datashed_source::{DataSource, DriverRegistry, SourceData};
use object_store::ObjectStore;
use ratatui::widgets::ListState;
use std::sync::Arc;
use tracing::warn;

/// Which pane keyboard navigation currently drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Entries,
    Plots,
}

/// What the event loop should do after a key press. Work that needs `await` is returned here so
/// key handling itself stays synchronous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    LoadPlot,
    Persist,
}

pub struct App {
    catalog: Arc<Catalog>,
    drivers: Arc<DriverRegistry>,
    object_store: Arc<dyn ObjectStore>,
    persist: Arc<PersistStore>,
    entries: Vec<Arc<CatalogEntry>>,
    list_state: ListState,
    source: Option<Arc<dyn DataSource>>,
    plot: PlotSelector,
    plot_data: Option<PlotData>,
    focus: Focus,
    status: Option<String>,
    should_quit: bool,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("catalog", &self.catalog.name())
            .field("entries", &self.entries.len())
            .field("selected", &self.list_state.selected())
            .field("focus", &self.focus)
            .finish_non_exhaustive()
    }
}

impl App {
    pub fn new(
        catalog: Arc<Catalog>,
        drivers: Arc<DriverRegistry>,
        object_store: Arc<dyn ObjectStore>,
        persist: Arc<PersistStore>,
    ) -> Self {
        let entries = catalog.entries();
        let mut app = Self {
            catalog,
            drivers,
            object_store,
            persist,
            entries,
            list_state: ListState::default(),
            source: None,
            plot: PlotSelector::default(),
            plot_data: None,
            focus: Focus::Entries,
            status: None,
            should_quit: false,
        };
        if !app.entries.is_empty() {
            app.select(0);
        }
        app
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn entries(&self) -> &[Arc<CatalogEntry>] {
        &self.entries
    }

    pub fn list_state(&mut self) -> &mut ListState {
        &mut self.list_state
    }

    pub fn source(&self) -> Option<&Arc<dyn DataSource>> {
        self.source.as_ref()
    }

    pub fn plot(&self) -> &PlotSelector {
        &self.plot
    }

    pub fn plot_data(&self) -> Option<&PlotData> {
        self.plot_data.as_ref()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Move the selection and reopen the dependent panes' source.
    fn select(&mut self, index: usize) {
        self.list_state.select(Some(index));
        self.source = match self.entries.get(index) {
            Some(entry) => {
                match entry.open(&self.drivers, Arc::clone(&self.object_store)) {
                    Ok(source) => Some(source),
                    Err(e) => {
                        warn!(entry = %entry.name(), error = %e, "failed to open entry");
                        self.status = Some(format!("failed to open {}: {e}", entry.name()));
                        None
                    }
                }
            }
            None => None,
        };
        self.plot = PlotSelector::from_source(self.source.as_ref());
        self.plot_data = None;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                return Action::Quit;
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Entries => Focus::Plots,
                    Focus::Plots => Focus::Entries,
                };
            }
            KeyCode::Down | KeyCode::Char('j') => match self.focus {
                Focus::Entries => self.select_offset(1),
                Focus::Plots => {
                    self.plot.next();
                    self.plot_data = None;
                }
            },
            KeyCode::Up | KeyCode::Char('k') => match self.focus {
                Focus::Entries => self.select_offset(-1),
                Focus::Plots => {
                    self.plot.previous();
                    self.plot_data = None;
                }
            },
            KeyCode::Char('s') => self.plot.toggle_spec(),
            KeyCode::Char('p') => return Action::Persist,
            KeyCode::Enter => {
                if self.plot.has_plots() {
                    return Action::LoadPlot;
                }
            }
            _ => {}
        }
        Action::None
    }

    fn select_offset(&mut self, offset: isize) {
        if self.entries.is_empty() {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0) as isize;
        let len = self.entries.len() as isize;
        let next = (current + offset).rem_euclid(len);
        self.select(next as usize);
    }

    /// Read the selected source and extract the selected plot's data.
    pub async fn load_plot(&mut self) {
        let Some(source) = self.source.as_ref() else {
            return;
        };
        let Some(name) = self.plot.selected_name() else {
            return;
        };
        let Some(def) = source.metadata().plot(name) else {
            self.status = Some(format!("plot {name:?} is not well formed"));
            return;
        };
        match source.read().await {
            Ok(SourceData::Table(table)) => match extract_plot_data(&def, &table) {
                Ok(data) => {
                    self.plot_data = Some(data);
                    self.status = None;
                }
                Err(e) => self.status = Some(e),
            },
            Ok(_) => self.status = Some("selected source is not tabular".to_string()),
            Err(e) => self.status = Some(format!("failed to read source: {e}")),
        }
    }

    /// Persist the selected source and report the outcome in the footer.
    pub async fn persist_selected(&mut self) {
        let Some(source) = self.source.as_ref() else {
            return;
        };
        match self.persist.persist(source.as_ref()).await {
            Ok(cached) => {
                self.status = Some(format!(
                    "persisted {} as {} ({})",
                    source.name(),
                    cached.driver(),
                    cached
                        .spec()
                        .arg_str("path")
                        .unwrap_or("unknown path")
                ));
            }
            Err(e) => {
                warn!(error = %e, "persist failed");
                self.status = Some(format!("persist failed: {e}"));
            }
        }
    }
}
