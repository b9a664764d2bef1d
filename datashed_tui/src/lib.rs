//! Interactive terminal browser for a catalog: an entry list pane driving a description pane and
//! a plot pane. Selecting an entry opens its source; the dependent panes re-derive their contents
//! from the selection on every frame, so they follow it the way the original reactive panels
//! followed their watched source.

pub mod app;
pub mod panels;
pub(crate) mod ui;

use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use thiserror::Error;

pub use app::{Action, App, Focus};

#[derive(Debug, Error)]
pub enum Error {
    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog error: {0}")]
    Catalog(#[from] datashed_catalog::Error),

    #[error("persist error: {0}")]
    Persist(#[from] datashed_persist::Error),

    #[error("source error: {0}")]
    Source(#[from] datashed_source::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Take over the terminal and run the browser until the user quits.
pub async fn run(app: &mut App) -> Result<()> {
    let mut terminal = ratatui::init();
    let result = event_loop(app, &mut terminal).await;
    ratatui::restore();
    result
}

async fn event_loop(app: &mut App, terminal: &mut ratatui::DefaultTerminal) -> Result<()> {
    let mut events = EventStream::new();
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;
        let Some(event) = events.next().await else {
            break;
        };
        if let Event::Key(key) = event? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match app.handle_key(key) {
                Action::Quit => break,
                Action::LoadPlot => app.load_plot().await,
                Action::Persist => app.persist_selected().await,
                Action::None => {}
            }
        }
        if app.should_quit() {
            break;
        }
    }
    Ok(())
}
