use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    split_names, Bookmark, BookmarkDraft, Credentials, RawBookmark, Registration, Suggestion,
    SummaryStatus, User,
};
use crate::services::MarklyApi;
use crate::session::Session;
use crate::store::{FavoriteToggles, Library, PendingToggle, ToggleOutcome, ViewFilter};
use crate::tui::{AppAction, InputMode};

// Message for a finished favorite request
pub struct ToggleResult {
    pub pending: PendingToggle,
    pub result: Result<()>,
}

// Message for a finished summary request
pub struct SummaryResult {
    pub bookmark_id: String,
    pub result: Result<RawBookmark>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Library,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    Name,
    #[default]
    Email,
    Password,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub register: bool,
    pub name: String,
    pub email: String,
    pub password: String,
    pub focus: LoginField,
}

impl LoginForm {
    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Name => &mut self.name,
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    fn next_field(&mut self) {
        self.focus = match (self.focus, self.register) {
            (LoginField::Name, _) => LoginField::Email,
            (LoginField::Email, _) => LoginField::Password,
            (LoginField::Password, true) => LoginField::Name,
            (LoginField::Password, false) => LoginField::Email,
        };
    }
}

/// Fields of the add-bookmark form, in entry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkField {
    Url,
    Title,
    Tags,
    Collections,
    Category,
}

impl BookmarkField {
    pub fn label(self) -> &'static str {
        match self {
            BookmarkField::Url => "URL",
            BookmarkField::Title => "Title",
            BookmarkField::Tags => "Tags (comma separated)",
            BookmarkField::Collections => "Collections (comma separated)",
            BookmarkField::Category => "Category",
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            BookmarkField::Url => Some(BookmarkField::Title),
            BookmarkField::Title => Some(BookmarkField::Tags),
            BookmarkField::Tags => Some(BookmarkField::Collections),
            BookmarkField::Collections => Some(BookmarkField::Category),
            BookmarkField::Category => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PromptKind {
    AddBookmark {
        draft: BookmarkDraft,
        field: BookmarkField,
    },
    AddCategory,
    AddCollection,
    AddTag,
    DeleteCollection {
        id: String,
        name: String,
    },
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

impl Prompt {
    pub fn title(&self) -> String {
        match &self.kind {
            PromptKind::AddBookmark { field, .. } => format!(" New bookmark - {} ", field.label()),
            PromptKind::AddCategory => " New category - name, optionally emoji first ".to_string(),
            PromptKind::AddCollection => " New collection - name ".to_string(),
            PromptKind::AddTag => " New tag - name ".to_string(),
            PromptKind::DeleteCollection { name, .. } => {
                format!(" Delete collection {name:?}? Enter to confirm, Esc to cancel ")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    // Data
    pub library: Library,
    pub user: Option<User>,
    pub suggestions: Option<Vec<Suggestion>>,

    // UI State
    pub screen: Screen,
    pub view_index: usize,
    pub selected_index: usize,
    pub show_help: bool,
    pub login: LoginForm,
    pub prompt: Option<Prompt>,
    pub status: Option<StatusMessage>,
    pub is_loading: bool,
    default_tags: Vec<String>,

    // Async state
    toggles: FavoriteToggles,
    toggle_rx: mpsc::Receiver<ToggleResult>,
    toggle_tx: mpsc::Sender<ToggleResult>,
    pub summary_status: SummaryStatus,
    pub pending_summary_id: Option<String>,
    summary_rx: mpsc::Receiver<SummaryResult>,
    summary_tx: mpsc::Sender<SummaryResult>,

    // Services
    api: Arc<dyn MarklyApi>,
    session: Arc<RwLock<Session>>,
}

impl App {
    pub fn new(config: &Config, api: Arc<dyn MarklyApi>, session: Arc<RwLock<Session>>) -> Self {
        let (toggle_tx, toggle_rx) = mpsc::channel(16);
        let (summary_tx, summary_rx) = mpsc::channel(1);

        Self {
            library: Library::new(config.reload_after_write),
            user: None,
            suggestions: None,
            screen: Screen::Login,
            view_index: 0,
            selected_index: 0,
            show_help: false,
            login: LoginForm::default(),
            prompt: None,
            status: None,
            is_loading: false,
            default_tags: config.default_tags.clone(),
            toggles: FavoriteToggles::new(),
            toggle_rx,
            toggle_tx,
            summary_status: SummaryStatus::Idle,
            pending_summary_id: None,
            summary_rx,
            summary_tx,
            api,
            session,
        }
    }

    /// Go straight to the library when a stored session exists.
    pub async fn start(&mut self) -> Result<()> {
        if self.session.read().await.is_authenticated() {
            self.enter_library().await;
        }
        Ok(())
    }

    pub fn input_mode(&self) -> InputMode {
        if self.show_help {
            InputMode::Help
        } else if self.screen == Screen::Login || self.prompt.is_some() {
            InputMode::Text
        } else if self.suggestions.is_some() {
            InputMode::Overlay
        } else {
            InputMode::Normal
        }
    }

    pub fn current_view(&self) -> ViewFilter {
        self.library
            .views()
            .get(self.view_index)
            .cloned()
            .unwrap_or_default()
    }

    pub fn visible_bookmarks(&self) -> Vec<&Bookmark> {
        self.library.filtered(&self.current_view())
    }

    pub fn selected_bookmark(&self) -> Option<&Bookmark> {
        self.visible_bookmarks().get(self.selected_index).copied()
    }

    pub fn is_toggle_pending(&self, id: &str) -> bool {
        self.toggles.is_pending(id)
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => return Ok(true),

            AppAction::MoveUp => {
                if self.selected_index > 0 {
                    self.selected_index -= 1;
                    self.on_selection_changed();
                }
            }

            AppAction::MoveDown => {
                let len = self.visible_bookmarks().len();
                if len > 0 && self.selected_index < len - 1 {
                    self.selected_index += 1;
                    self.on_selection_changed();
                }
            }

            AppAction::MoveToTop => {
                self.selected_index = 0;
                self.on_selection_changed();
            }

            AppAction::MoveToBottom => {
                self.selected_index = self.visible_bookmarks().len().saturating_sub(1);
                self.on_selection_changed();
            }

            AppAction::NextView => self.cycle_view(1),
            AppAction::PrevView => self.cycle_view(-1),

            AppAction::ToggleFavorite => self.toggle_favorite(),

            AppAction::OpenInBrowser => {
                if let Some(bookmark) = self.selected_bookmark() {
                    let url = bookmark.url.clone();
                    if let Err(e) = open::that(&url) {
                        tracing::warn!("Failed to open {}: {}", url, e);
                        self.set_error(format!("Could not open browser: {e}"));
                    }
                }
            }

            AppAction::AddBookmark => {
                let draft = BookmarkDraft {
                    tag_names: self.default_tags.clone(),
                    ..Default::default()
                };
                self.prompt = Some(Prompt {
                    kind: PromptKind::AddBookmark {
                        draft,
                        field: BookmarkField::Url,
                    },
                    input: String::new(),
                });
            }

            AppAction::AddCategory => self.open_prompt(PromptKind::AddCategory),
            AppAction::AddCollection => self.open_prompt(PromptKind::AddCollection),
            AppAction::AddTag => self.open_prompt(PromptKind::AddTag),

            AppAction::DeleteCollection => {
                if let ViewFilter::Collection(id) = self.current_view() {
                    let name = self.library.view_label(&ViewFilter::Collection(id.clone()));
                    self.open_prompt(PromptKind::DeleteCollection { id, name });
                } else {
                    self.set_info("Select a collection in the sidebar first");
                }
            }

            AppAction::Summarize => self.request_summary(),

            AppAction::ShowSuggestions => {
                let result = self.api.suggestions().await;
                match result {
                    Ok(suggestions) => self.suggestions = Some(suggestions),
                    Err(e) => self.report(e),
                }
            }

            AppAction::CloseOverlay => self.suggestions = None,

            AppAction::Reload => self.reload().await,

            AppAction::Logout => self.logout().await?,

            AppAction::ShowHelp => self.show_help = true,
            AppAction::HideHelp => self.show_help = false,

            AppAction::InputChar(c) => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.push(c);
                } else if self.screen == Screen::Login {
                    self.login.field_mut().push(c);
                }
            }

            AppAction::InputBackspace => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.pop();
                } else if self.screen == Screen::Login {
                    self.login.field_mut().pop();
                }
            }

            AppAction::InputNextField => {
                if self.prompt.is_none() && self.screen == Screen::Login {
                    self.login.next_field();
                }
            }

            AppAction::ToggleRegister => {
                if self.prompt.is_none() && self.screen == Screen::Login {
                    self.login.register = !self.login.register;
                    self.login.focus = if self.login.register {
                        LoginField::Name
                    } else {
                        LoginField::Email
                    };
                }
            }

            AppAction::InputConfirm => {
                if self.prompt.is_some() {
                    self.confirm_prompt().await;
                } else if self.screen == Screen::Login {
                    self.confirm_login().await;
                }
            }

            AppAction::InputCancel => {
                if self.prompt.take().is_none() && self.screen == Screen::Login {
                    self.login = LoginForm {
                        register: self.login.register,
                        ..Default::default()
                    };
                }
            }
        }

        Ok(false)
    }

    fn on_selection_changed(&mut self) {
        self.summary_status = SummaryStatus::Idle;
    }

    fn cycle_view(&mut self, step: isize) {
        let count = self.library.views().len() as isize;
        if count == 0 {
            return;
        }
        self.view_index = (self.view_index as isize + step).rem_euclid(count) as usize;
        self.selected_index = 0;
        self.on_selection_changed();
    }

    fn clamp_selection(&mut self) {
        let views = self.library.views().len();
        if self.view_index >= views {
            self.view_index = 0;
        }
        let len = self.visible_bookmarks().len();
        if len > 0 && self.selected_index >= len {
            self.selected_index = len - 1;
        } else if len == 0 {
            self.selected_index = 0;
        }
    }

    fn open_prompt(&mut self, kind: PromptKind) {
        self.prompt = Some(Prompt {
            kind,
            input: String::new(),
        });
    }

    fn set_info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    /// Show an error; an expired session sends the user back to the login screen.
    fn report(&mut self, error: AppError) {
        if error.is_unauthorized() {
            self.screen = Screen::Login;
            self.prompt = None;
            self.suggestions = None;
            self.library = Library::new(self.library_reloads());
            self.set_error("Session expired, please log in again");
        } else {
            tracing::error!("{}", error);
            self.set_error(error.to_string());
        }
    }

    fn library_reloads(&self) -> bool {
        self.library.reloads_after_write()
    }

    async fn enter_library(&mut self) {
        self.screen = Screen::Library;
        match self.api.me().await {
            Ok(user) => self.user = Some(user),
            Err(e) if e.is_unauthorized() => {
                self.report(e);
                return;
            }
            // The library is still usable without a profile
            Err(e) => self.report(e),
        }
        self.reload().await;
    }

    async fn reload(&mut self) {
        self.is_loading = true;
        let result = self.library.reload(self.api.as_ref()).await;
        self.is_loading = false;
        match result {
            Ok(()) => self.clamp_selection(),
            Err(e) => self.report(e),
        }
    }

    async fn logout(&mut self) -> Result<()> {
        self.session.write().await.clear()?;
        self.library = Library::new(self.library_reloads());
        self.user = None;
        self.screen = Screen::Login;
        self.view_index = 0;
        self.selected_index = 0;
        self.login = LoginForm::default();
        self.set_info("Logged out");
        Ok(())
    }

    async fn confirm_login(&mut self) {
        let email = self.login.email.trim().to_string();
        let password = self.login.password.clone();
        if email.is_empty() || password.is_empty() {
            self.set_error("Email and password are required");
            return;
        }

        if self.login.register {
            let registration = Registration {
                name: self.login.name.trim().to_string(),
                email: email.clone(),
                password: password.clone(),
            };
            if let Err(e) = self.api.register(&registration).await {
                self.report(e);
                return;
            }
            tracing::info!("Registered {}", registration.email);
        }

        let credentials = Credentials { email, password };
        match self.api.login(&credentials).await {
            Ok(()) => {
                self.login = LoginForm::default();
                self.status = None;
                self.enter_library().await;
            }
            Err(e) => self.report(e),
        }
    }

    async fn confirm_prompt(&mut self) {
        let Some(mut prompt) = self.prompt.take() else {
            return;
        };
        let input = std::mem::take(&mut prompt.input);

        let result = match prompt.kind {
            PromptKind::AddBookmark { mut draft, field } => {
                match field {
                    BookmarkField::Url => draft.url = input.trim().to_string(),
                    BookmarkField::Title => draft.title = input.trim().to_string(),
                    BookmarkField::Tags => draft.tag_names.extend(split_names(&input)),
                    BookmarkField::Collections => draft.collection_names = split_names(&input),
                    BookmarkField::Category => {
                        draft.category_name = Some(input.trim().to_string()).filter(|s| !s.is_empty())
                    }
                }

                if field == BookmarkField::Url && draft.url.is_empty() {
                    self.set_error("URL is required");
                    self.prompt = Some(Prompt {
                        kind: PromptKind::AddBookmark { draft, field },
                        input: String::new(),
                    });
                    return;
                }

                if let Some(next) = field.next() {
                    self.prompt = Some(Prompt {
                        kind: PromptKind::AddBookmark { draft, field: next },
                        input: String::new(),
                    });
                    return;
                }

                let requested = draft
                    .tag_names
                    .iter()
                    .map(|name| name.trim().to_lowercase())
                    .filter(|name| !name.is_empty())
                    .collect::<HashSet<_>>()
                    .len();
                self.library
                    .add_bookmark(self.api.as_ref(), draft)
                    .await
                    .map(|created| {
                        if created.tags.len() < requested {
                            format!("Saved {} (some tags could not be created)", created.url)
                        } else {
                            format!("Saved {}", created.url)
                        }
                    })
            }

            PromptKind::AddCategory => {
                let (emoji, name) = split_leading_emoji(&input);
                self.library
                    .add_category(self.api.as_ref(), name, emoji)
                    .await
                    .map(|c| format!("Created category {}", c.label()))
            }

            PromptKind::AddCollection => self
                .library
                .add_collection(self.api.as_ref(), &input)
                .await
                .map(|c| format!("Created collection {}", c.name)),

            PromptKind::AddTag => self
                .library
                .add_tag(self.api.as_ref(), &input)
                .await
                .map(|_| format!("Tag {} ready", input.trim())),

            PromptKind::DeleteCollection { id, name } => {
                let result = self
                    .library
                    .delete_collection(self.api.as_ref(), &id)
                    .await
                    .map(|_| format!("Deleted collection {name}"));
                if result.is_ok() {
                    self.view_index = 0;
                    self.selected_index = 0;
                }
                result
            }
        };

        match result {
            Ok(message) => {
                self.set_info(message);
                self.clamp_selection();
            }
            Err(e) => self.report(e),
        }
    }

    /// Flip locally now, send the update in the background.
    fn toggle_favorite(&mut self) {
        let Some(id) = self.selected_bookmark().map(|b| b.id.clone()) else {
            return;
        };
        let Some(pending) = self.toggles.begin(&mut self.library, &id) else {
            return;
        };

        // Keep the cursor inside the list if the item just left this view
        self.clamp_selection();

        let api = Arc::clone(&self.api);
        let tx = self.toggle_tx.clone();
        tokio::spawn(async move {
            let result = pending.send(api.as_ref()).await;
            let _ = tx.send(ToggleResult { pending, result }).await;
        });
    }

    /// Poll for completed favorite requests (non-blocking)
    pub async fn poll_toggle_results(&mut self) -> Result<()> {
        while let Ok(message) = self.toggle_rx.try_recv() {
            self.apply_toggle_result(message).await;
        }
        Ok(())
    }

    async fn apply_toggle_result(&mut self, message: ToggleResult) {
        let outcome = self
            .toggles
            .finish(&mut self.library, self.api.as_ref(), message.pending, message.result)
            .await;
        match outcome {
            Ok(ToggleOutcome::Committed { id, is_fav }) => {
                tracing::debug!("Favorite on {} is now {}", id, is_fav);
            }
            Ok(ToggleOutcome::RolledBack { id, message, .. }) => {
                tracing::debug!("Favorite on {} restored", id);
                self.set_error(format!("Could not update favorite: {message}"));
            }
            Err(e) => self.report(e),
        }
        self.clamp_selection();
    }

    fn request_summary(&mut self) {
        let Some(id) = self.selected_bookmark().map(|b| b.id.clone()) else {
            return;
        };
        if self.pending_summary_id.is_some() {
            self.set_info("A summary is already being generated");
            return;
        }

        self.summary_status = SummaryStatus::Generating;
        self.pending_summary_id = Some(id.clone());

        let api = Arc::clone(&self.api);
        let tx = self.summary_tx.clone();
        tokio::spawn(async move {
            let result = Library::fetch_summary(api.as_ref(), &id).await;
            let _ = tx.send(SummaryResult { bookmark_id: id, result }).await;
        });
    }

    /// Poll for completed summary results (non-blocking)
    pub async fn poll_summary_result(&mut self) -> Result<()> {
        if let Ok(message) = self.summary_rx.try_recv() {
            self.apply_summary_result(message);
        }
        Ok(())
    }

    fn apply_summary_result(&mut self, message: SummaryResult) {
        if self.pending_summary_id.as_deref() != Some(message.bookmark_id.as_str()) {
            return;
        }
        self.pending_summary_id = None;

        match message.result {
            Ok(updated) => {
                self.library.upsert_raw(updated);
                let still_selected = self
                    .selected_bookmark()
                    .is_some_and(|b| b.id == message.bookmark_id);
                self.summary_status = if still_selected {
                    SummaryStatus::Generated
                } else {
                    SummaryStatus::Idle
                };
            }
            Err(e) => {
                self.summary_status = SummaryStatus::Failed;
                self.report(e);
            }
        }
    }
}

/// "🦀 Rust" -> (Some("🦀"), "Rust"). Names that start with a letter or
/// digit have no emoji.
fn split_leading_emoji(input: &str) -> (Option<&str>, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((first, rest)) if !first.chars().any(char::is_alphanumeric) => {
            (Some(first), rest.trim())
        }
        _ => (None, input),
    }
}
