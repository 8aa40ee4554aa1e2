use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::sync::RwLock;

mod app;
mod config;
mod error;
mod models;
mod services;
mod session;
mod store;
mod tui;

use app::App;
use config::Config;
use error::{AppError, Result};
use models::{split_names, BookmarkDraft, BookmarkQuery, Credentials};
use services::{ApiClient, MarklyApi};
use session::Session;
use store::{hydrate_all, Library};
use tui::{draw, handle_key_event};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Load configuration and the stored session
    let config = Config::load()?;
    let session = Arc::new(RwLock::new(Session::load(&config.session_path)?));
    let client = Arc::new(ApiClient::new(&config, Arc::clone(&session)));

    match args.get(1).map(String::as_str) {
        Some("--login") => {
            let email = args
                .get(2)
                .ok_or_else(|| AppError::InvalidInput("usage: markly --login <email>".into()))?;
            return login_headless(client.as_ref(), email).await;
        }
        Some("--logout") => {
            session.write().await.clear()?;
            println!("Logged out");
            return Ok(());
        }
        Some("--add") => {
            let url = args
                .get(2)
                .ok_or_else(|| AppError::InvalidInput("usage: markly --add <url> [title] [tags]".into()))?;
            return add_headless(&config, client.as_ref(), url, args.get(3), args.get(4)).await;
        }
        Some("--tags") => {
            return tags_headless(client.as_ref()).await;
        }
        Some("--list") => {
            let favorites_only = args.get(2).is_some_and(|a| a == "--fav");
            return list_headless(client.as_ref(), favorites_only).await;
        }
        _ => {}
    }

    // Initialize app
    let mut app = App::new(&config, client, session);
    app.start().await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        // Settle finished favorite requests
        app.poll_toggle_results().await?;

        // Poll for completed summary results
        app.poll_summary_result().await?;

        // Poll for events with timeout to allow async operations
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = handle_key_event(key, app.input_mode()) {
                        let should_quit = app.handle_action(action).await?;
                        if should_quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

async fn login_headless(api: &dyn MarklyApi, email: &str) -> Result<()> {
    let password = match std::env::var("MARKLY_PASSWORD") {
        Ok(password) => password,
        Err(_) => {
            print!("Password for {email}: ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(&['\r', '\n'][..]).to_string()
        }
    };

    let credentials = Credentials {
        email: email.to_string(),
        password,
    };
    api.login(&credentials).await?;
    println!("Logged in as {email}");
    Ok(())
}

async fn add_headless(
    config: &Config,
    api: &dyn MarklyApi,
    url: &str,
    title: Option<&String>,
    tags: Option<&String>,
) -> Result<()> {
    let mut library = Library::new(false);
    library.load(api).await?;

    let mut tag_names = config.default_tags.clone();
    tag_names.extend(tags.map(|t| split_names(t)).unwrap_or_default());

    let draft = BookmarkDraft {
        url: url.to_string(),
        title: title.cloned().unwrap_or_default(),
        tag_names,
        ..Default::default()
    };
    let created = library.add_bookmark(api, draft).await?;
    println!("Saved {} ({})", created.url, created.id);
    Ok(())
}

async fn list_headless(api: &dyn MarklyApi, favorites_only: bool) -> Result<()> {
    let mut library = Library::new(false);
    library.load(api).await?;

    // Favorites are filtered server-side and joined against the loaded lookups
    let bookmarks = if favorites_only {
        let raw = api.list_bookmarks(&BookmarkQuery::favorites()).await?;
        hydrate_all(&raw, library.lookups())
    } else {
        library.bookmarks().to_vec()
    };

    for bookmark in &bookmarks {
        let star = if bookmark.is_fav { "★" } else { " " };
        println!("{star} {}", bookmark.display_title());
        println!("  {}", bookmark.url);

        let mut labels: Vec<String> = bookmark.categories.iter().map(|c| c.label()).collect();
        labels.extend(bookmark.collections.iter().map(|c| c.name.clone()));
        labels.extend(bookmark.tags.iter().map(|t| format!("#{}", t.name)));
        if !labels.is_empty() {
            println!("  {}", labels.join("  "));
        }

        if !bookmark.summary.is_empty() {
            for line in textwrap::wrap(&bookmark.summary, 76) {
                println!("  {line}");
            }
        }
        println!();
    }

    Ok(())
}

async fn tags_headless(api: &dyn MarklyApi) -> Result<()> {
    for tag in api.list_user_tags().await? {
        match tag.trend() {
            Some(n) if n != 0 => println!("#{} ({:+})", tag.name, n),
            _ => println!("#{}", tag.name),
        }
    }
    Ok(())
}
