//! Terminal ui for browsing and editing the catalog.

mod app;
mod keys;
mod loader;
mod ui;

use std::io;
use std::time::Duration;

use anyhow::Result;
use catalog::prelude::CatalogClient;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::{
    runtime::Handle,
    sync::mpsc::{UnboundedReceiver, unbounded_channel},
};
use tracing::info;

pub use app::{App, InputMode};
pub use keys::{KeyAction, map_key_with_input_mode};
pub use loader::{LoadDelays, Loader};

use crate::state::{
    editor::{EditorDefaults, EditorOptions},
    list::{CatalogList, PageRequest},
    nav::LoadEvent,
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Everything the browser needs to start.
#[derive(Debug)]
pub struct BrowseSettings {
    pub client: CatalogClient,
    pub list: CatalogList,
    pub first: PageRequest,
    pub options: EditorOptions,
    pub defaults: EditorDefaults,
    pub delays: LoadDelays,
}

/// Runs the browser until the user quits.
///
/// Blocks the calling thread; fetches are spawned on `runtime`.
/// Returns the list state as a query string, for `--state` on the next run.
pub fn run(runtime: Handle, settings: BrowseSettings) -> Result<String> {
    let BrowseSettings {
        client,
        list,
        first,
        options,
        defaults,
        delays,
    } = settings;
    let (tx, rx) = unbounded_channel();
    let loader = Loader::new(client, tx, runtime, delays);
    let mut app = App::new(list, first, options, defaults);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));

    let result = event_loop(&mut app, &loader, rx, &mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    result?;
    let state = app.nav.list().to_query_string();
    info!(%state, "browser closed");
    Ok(state)
}

fn event_loop(
    app: &mut App,
    loader: &Loader,
    mut rx: UnboundedReceiver<LoadEvent>,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    loop {
        while let Ok(event) = rx.try_recv() {
            app.on_load_event(event);
        }
        for request in app.take_requests() {
            loader.dispatch(request);
        }

        terminal.draw(|frame| ui::draw(frame, app))?;
        app.fill_list();

        if event::poll(POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let action = map_key_with_input_mode(key, app.is_input_active());
            app.handle_action(action);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
