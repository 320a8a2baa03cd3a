use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::prelude::*;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

use sweeptui::api::types::{
    FolderSettings, FolderSettingsUpdate, RuleUpdate, TimeUnit, UserSettingsUpdate,
};
use sweeptui::api::{ApiClient, ApiError, SweepApi};
use sweeptui::app::{App, FOLDER_SETTING_ROWS, FormField, Overlay, RuleForm, View};
use sweeptui::auth::{KeyringStore, TokenStore, check_auth, sign_in, sign_out};
use sweeptui::config::Config;
use sweeptui::store::{FoldersStore, RulesCache, RulesStore, SettingsStore, StatsStore};
use sweeptui::toast::ToastQueue;
use sweeptui::ui::{
    render_confirm, render_folder_name, render_folders, render_help, render_rule_form,
    render_rules, render_settings, render_signin, render_stats, render_toasts,
};
use sweeptui::{logging, ui};

/// Completions the main loop has to act on itself (view switches).
/// Everything else lands in the stores and shows up on the next redraw.
enum AppEvent {
    SignedIn(bool),
    SignedOut,
    SessionExpired,
}

/// Everything the key handlers need to spawn backend work.
#[derive(Clone)]
struct Stores {
    api: Arc<ApiClient>,
    tokens: TokenStore,
    toasts: ToastQueue,
    rules: RulesStore,
    folders: FoldersStore,
    settings: SettingsStore,
    stats: StatsStore,
}

type EventTx = mpsc::UnboundedSender<AppEvent>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init()?;
    let config = Arc::new(Config::load());

    let tokens = TokenStore::new(Arc::new(KeyringStore));
    let api = Arc::new(ApiClient::new(&config.api_base_url, tokens.clone()));
    let api_dyn: Arc<dyn SweepApi> = api.clone();
    let toasts = ToastQueue::new();
    let stores = Stores {
        api,
        tokens: tokens.clone(),
        toasts: toasts.clone(),
        rules: RulesStore::new(api_dyn.clone(), RulesCache::new(), toasts.clone()),
        folders: FoldersStore::new(api_dyn.clone(), toasts.clone()),
        settings: SettingsStore::new(api_dyn.clone(), toasts.clone()),
        stats: StatsStore::new(api_dyn),
    };

    // Probe before entering the alternate screen; keychain prompts and
    // log lines are still visible here.
    let authenticated = check_auth(&stores.api, &tokens).await;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, config, stores, authenticated).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Arc<Config>,
    stores: Stores,
    authenticated: bool,
) -> Result<()> {
    let mut app = App::new(config, authenticated);
    let (tx, mut rx) = mpsc::unbounded_channel();

    if authenticated {
        load_all(&stores);
    }

    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(100));

    loop {
        terminal.draw(|f| render(&mut app, f, &stores))?;

        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        app.clear_status();
                        handle_key(&mut app, key, &stores, &tx);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }
            Some(event) = rx.recv() => match event {
                AppEvent::SignedIn(ok) => {
                    app.signing_in = false;
                    if ok {
                        app.view = View::Rules;
                        load_all(&stores);
                    }
                }
                AppEvent::SignedOut | AppEvent::SessionExpired => {
                    app.signing_in = false;
                    app.view = View::SignIn;
                    app.overlay = Overlay::None;
                }
            },
            _ = tick.tick() => {
                stores.toasts.prune_expired();
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Kick off the initial fetches after sign-in. Results land in the
/// stores; the next tick redraws with them.
fn load_all(stores: &Stores) {
    let s = stores.clone();
    tokio::spawn(async move { s.rules.refresh().await });
    let s = stores.clone();
    tokio::spawn(async move { s.folders.refresh().await });
    let s = stores.clone();
    tokio::spawn(async move { s.settings.refresh().await });
    let s = stores.clone();
    tokio::spawn(async move { s.stats.refresh().await });
}

fn render(app: &mut App, f: &mut Frame, stores: &Stores) {
    let area = f.area();
    let config = app.config.clone();
    let theme = &config.theme;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    match app.view {
        View::SignIn => render_signin(f, chunks[0], app.signing_in, theme),
        View::Rules => {
            let visible = app.visible_rules(&stores.rules.rules());
            app.clamp_selection(visible.len());
            render_rules(
                f,
                chunks[0],
                &visible,
                &mut app.list_state,
                &app.search_query,
                app.sort_column,
                app.sort_descending,
                stores.rules.is_loading(),
                stores.rules.error().as_deref(),
                theme,
                &config.layout,
            );
        }
        View::Folders => {
            let folders = stores.folders.folders();
            let settings;
            let expanded = match &app.expanded_folder {
                Some(id) => {
                    settings = stores.folders.settings_of(id);
                    Some((id.as_str(), settings.as_ref()))
                }
                None => None,
            };
            render_folders(
                f,
                chunks[0],
                &folders,
                &mut app.folder_state,
                expanded,
                app.folder_setting_cursor,
                stores.folders.is_loading(),
                theme,
            );
        }
        View::Stats => render_stats(
            f,
            chunks[0],
            stores.stats.stats().as_ref(),
            stores.stats.is_loading(),
            stores.stats.error().as_deref(),
            theme,
        ),
        View::Settings => render_settings(
            f,
            chunks[0],
            stores.settings.settings().as_ref(),
            stores.settings.watching(),
            app.settings_cursor,
            stores.settings.is_loading(),
            theme,
        ),
    }

    match &app.overlay {
        Overlay::None => {}
        Overlay::RuleForm(form) => render_rule_form(f, chunks[0], form, theme),
        Overlay::ConfirmDeleteRule(_) => {
            render_confirm(f, chunks[0], "Delete this rule?", theme);
        }
        Overlay::FolderName(name) => render_folder_name(f, chunks[0], name, theme),
        Overlay::ConfirmDeleteFolder(_) => {
            render_confirm(f, chunks[0], "Delete folder and its rules?", theme);
        }
    }

    let search_query = if app.searching {
        Some(app.search_query.as_str())
    } else {
        None
    };
    render_help(
        f,
        chunks[1],
        app.view,
        app.status_message.as_deref(),
        search_query,
        theme,
    );

    render_toasts(f, area, &stores.toasts.snapshot(), theme);
}

fn handle_key(app: &mut App, key: KeyEvent, stores: &Stores, tx: &EventTx) {
    if !app.overlay.is_none() {
        handle_overlay_key(app, key, stores, tx);
        return;
    }

    if app.searching {
        match key.code {
            KeyCode::Esc => {
                app.search_query.clear();
                app.searching = false;
            }
            KeyCode::Enter => app.searching = false,
            KeyCode::Backspace => {
                app.search_query.pop();
            }
            KeyCode::Char(c) => app.search_query.push(c),
            KeyCode::Down => app.select_next(app.visible_rules(&stores.rules.rules()).len()),
            KeyCode::Up => app.select_previous(),
            _ => {}
        }
        return;
    }

    match app.view {
        View::SignIn => handle_signin_key(app, key, stores, tx),
        View::Rules => handle_rules_key(app, key, stores, tx),
        View::Folders => handle_folders_key(app, key, stores, tx),
        View::Stats => handle_stats_key(app, key, stores),
        View::Settings => handle_settings_key(app, key, stores, tx),
    }
}

fn next_view(view: View) -> View {
    match view {
        View::SignIn => View::SignIn,
        View::Rules => View::Folders,
        View::Folders => View::Stats,
        View::Stats => View::Settings,
        View::Settings => View::Rules,
    }
}

fn switch_view(app: &mut App, stores: &Stores, view: View) {
    app.view = view;
    // Stats are cheap to re-fetch and go stale quickly
    if view == View::Stats {
        let s = stores.clone();
        tokio::spawn(async move { s.stats.refresh().await });
    }
}

fn handle_signin_key(app: &mut App, key: KeyEvent, stores: &Stores, tx: &EventTx) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Enter if !app.signing_in => {
            app.signing_in = true;
            let s = stores.clone();
            let tx = tx.clone();
            let port = app.config.callback_port;
            tokio::spawn(async move {
                let ok = match sign_in(&s.api, &s.tokens, port).await {
                    Ok(()) => {
                        s.toasts.success("Signed in");
                        true
                    }
                    Err(e) => {
                        warn!(error = %e, "sign-in failed");
                        s.toasts.error("Sign-in failed");
                        false
                    }
                };
                let _ = tx.send(AppEvent::SignedIn(ok));
            });
        }
        _ => {}
    }
}

fn handle_rules_key(app: &mut App, key: KeyEvent, stores: &Stores, tx: &EventTx) {
    let visible = app.visible_rules(&stores.rules.rules());
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab => switch_view(app, stores, next_view(app.view)),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(visible.len()),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('/') => app.searching = true,
        KeyCode::Char('s') => app.sort_by(app.sort_column.next()),
        KeyCode::Char('S') => app.sort_descending = !app.sort_descending,
        KeyCode::Char('R') => {
            let s = stores.clone();
            tokio::spawn(async move { s.rules.refresh().await });
        }
        KeyCode::Char('n') => {
            app.overlay = Overlay::RuleForm(RuleForm::blank());
        }
        KeyCode::Char('e') => {
            if let Some(rule) = app.selected_rule(&visible) {
                app.overlay = Overlay::RuleForm(RuleForm::for_rule(&rule));
            }
        }
        KeyCode::Char('d') => {
            if let Some(rule) = app.selected_rule(&visible) {
                app.overlay = Overlay::ConfirmDeleteRule(rule.id);
            }
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            if let Some(rule) = app.selected_rule(&visible) {
                let update = RuleUpdate::enabled(!rule.enabled);
                spawn_rule_update(stores, tx, rule.id, update);
            }
        }
        _ => {}
    }
}

fn handle_folders_key(app: &mut App, key: KeyEvent, stores: &Stores, tx: &EventTx) {
    let folders = stores.folders.folders();

    // An open settings panel captures the navigation keys.
    if let Some(folder_id) = app.expanded_folder.clone() {
        match key.code {
            KeyCode::Esc => {
                app.expanded_folder = None;
                return;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                app.folder_setting_cursor =
                    (app.folder_setting_cursor + 1).min(FOLDER_SETTING_ROWS - 1);
                return;
            }
            KeyCode::Char('k') | KeyCode::Up => {
                app.folder_setting_cursor = app.folder_setting_cursor.saturating_sub(1);
                return;
            }
            KeyCode::Char(' ') | KeyCode::Char('h') | KeyCode::Char('l') | KeyCode::Left
            | KeyCode::Right | KeyCode::Char('u') => {
                if let Some(settings) = stores.folders.settings_of(&folder_id) {
                    if let Some(update) =
                        folder_setting_update(&settings, app.folder_setting_cursor, key.code)
                    {
                        spawn_folder_settings_update(stores, tx, folder_id, update);
                    }
                }
                return;
            }
            _ => return,
        }
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab => switch_view(app, stores, next_view(app.view)),
        KeyCode::Char('j') | KeyCode::Down => app.folder_next(folders.len()),
        KeyCode::Char('k') | KeyCode::Up => app.folder_previous(),
        KeyCode::Char('R') => {
            let s = stores.clone();
            tokio::spawn(async move { s.folders.refresh().await });
        }
        KeyCode::Char('n') => {
            app.overlay = Overlay::FolderName("@".to_string());
        }
        KeyCode::Char('d') => {
            if let Some(folder) = app
                .folder_state
                .selected()
                .and_then(|i| folders.get(i).cloned())
            {
                app.overlay = Overlay::ConfirmDeleteFolder(folder.id);
            }
        }
        KeyCode::Enter => {
            if let Some(folder) = app
                .folder_state
                .selected()
                .and_then(|i| folders.get(i).cloned())
            {
                app.expanded_folder = Some(folder.id.clone());
                app.folder_setting_cursor = 0;
                let s = stores.clone();
                tokio::spawn(async move { s.folders.load_settings(&folder.id).await });
            }
        }
        _ => {}
    }
}

/// Map a key on one of the four panel rows onto a partial settings
/// update. Returns None when the key doesn't apply to the row.
fn folder_setting_update(
    settings: &FolderSettings,
    cursor: usize,
    code: KeyCode,
) -> Option<FolderSettingsUpdate> {
    let adjust = |value: u32, unit: TimeUnit| -> Option<u32> {
        match code {
            KeyCode::Char('h') | KeyCode::Left => Some(value.saturating_sub(1).max(1)),
            KeyCode::Char('l') | KeyCode::Right => Some((value + 1).min(unit.max_value())),
            _ => None,
        }
    };

    match (cursor, code) {
        (0, KeyCode::Char(' ')) => Some(FolderSettingsUpdate {
            archive_read_enabled: Some(!settings.archive_read_enabled),
            ..Default::default()
        }),
        (2, KeyCode::Char(' ')) => Some(FolderSettingsUpdate {
            archive_unread_enabled: Some(!settings.archive_unread_enabled),
            ..Default::default()
        }),
        (1, KeyCode::Char('u')) => {
            let unit = settings.archive_read_unit.toggled();
            Some(FolderSettingsUpdate {
                archive_read_unit: Some(unit),
                archive_read_value: Some(settings.archive_read_value.min(unit.max_value())),
                ..Default::default()
            })
        }
        (3, KeyCode::Char('u')) => {
            let unit = settings.archive_unread_unit.toggled();
            Some(FolderSettingsUpdate {
                archive_unread_unit: Some(unit),
                archive_unread_value: Some(settings.archive_unread_value.min(unit.max_value())),
                ..Default::default()
            })
        }
        (1, _) => adjust(settings.archive_read_value, settings.archive_read_unit).map(|v| {
            FolderSettingsUpdate {
                archive_read_value: Some(v),
                ..Default::default()
            }
        }),
        (3, _) => adjust(settings.archive_unread_value, settings.archive_unread_unit).map(|v| {
            FolderSettingsUpdate {
                archive_unread_value: Some(v),
                ..Default::default()
            }
        }),
        _ => None,
    }
}

fn handle_stats_key(app: &mut App, key: KeyEvent, stores: &Stores) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab => switch_view(app, stores, next_view(app.view)),
        KeyCode::Char('R') => {
            let s = stores.clone();
            tokio::spawn(async move { s.stats.refresh().await });
        }
        _ => {}
    }
}

fn handle_settings_key(app: &mut App, key: KeyEvent, stores: &Stores, tx: &EventTx) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab => switch_view(app, stores, next_view(app.view)),
        KeyCode::Char('j') | KeyCode::Down => {
            app.settings_cursor = (app.settings_cursor + 1).min(ui::SETTINGS_ROWS - 1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.settings_cursor = app.settings_cursor.saturating_sub(1);
        }
        KeyCode::Char(' ') | KeyCode::Enter => match app.settings_cursor {
            0 => {
                if let Some(settings) = stores.settings.settings() {
                    let update = UserSettingsUpdate {
                        blackhole_enabled: Some(!settings.blackhole_enabled),
                        ..Default::default()
                    };
                    spawn_user_settings_update(stores, tx, update);
                }
            }
            2 => {
                let s = stores.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Err(ApiError::SessionExpired) = s.settings.toggle_watch().await {
                        let _ = tx.send(AppEvent::SessionExpired);
                    }
                });
            }
            3 => {
                let s = stores.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Err(ApiError::SessionExpired) = s.folders.setup_folders().await {
                        let _ = tx.send(AppEvent::SessionExpired);
                    }
                });
            }
            4 => {
                let s = stores.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    match sign_out(&s.tokens).await {
                        Ok(()) => {
                            s.toasts.success("Signed out");
                            let _ = tx.send(AppEvent::SignedOut);
                        }
                        Err(e) => {
                            warn!(error = %e, "sign-out failed");
                            s.toasts.error("Sign-out failed");
                        }
                    }
                });
            }
            _ => {}
        },
        KeyCode::Char('h') | KeyCode::Left | KeyCode::Char('l') | KeyCode::Right => {
            if app.settings_cursor == 1 {
                if let Some(settings) = stores.settings.settings() {
                    let days = match key.code {
                        KeyCode::Char('h') | KeyCode::Left => {
                            settings.blackhole_delete_days.saturating_sub(1).max(1)
                        }
                        _ => (settings.blackhole_delete_days + 1).min(365),
                    };
                    if days != settings.blackhole_delete_days {
                        let update = UserSettingsUpdate {
                            blackhole_delete_days: Some(days),
                            ..Default::default()
                        };
                        spawn_user_settings_update(stores, tx, update);
                    }
                }
            }
        }
        _ => {}
    }
}

fn handle_overlay_key(app: &mut App, key: KeyEvent, stores: &Stores, tx: &EventTx) {
    match &mut app.overlay {
        Overlay::None => {}
        Overlay::RuleForm(form) => {
            match key.code {
                KeyCode::Esc => app.overlay = Overlay::None,
                KeyCode::Tab | KeyCode::Down => form.field = form.field.next(),
                KeyCode::BackTab | KeyCode::Up => form.field = form.field.previous(),
                KeyCode::Enter => {
                    if let Some(error) = form.validation_error() {
                        app.set_status(error);
                        return;
                    }
                    let form = form.clone();
                    match form.editing_id.clone() {
                        Some(id) => spawn_rule_update(stores, tx, id, form.to_update()),
                        None => {
                            let create = form.to_create();
                            let s = stores.clone();
                            let tx = tx.clone();
                            tokio::spawn(async move {
                                if let Err(ApiError::SessionExpired) =
                                    s.rules.create_rule(create).await
                                {
                                    let _ = tx.send(AppEvent::SessionExpired);
                                }
                            });
                        }
                    }
                    app.overlay = Overlay::None;
                }
                KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
                    if !matches!(form.field, FormField::Pattern | FormField::Destination) =>
                {
                    match form.field {
                        FormField::MatchType => form.match_type = form.match_type.next(),
                        FormField::Action => form.action = form.action.next(),
                        FormField::MarkAsRead => form.mark_as_read = !form.mark_as_read,
                        _ => {}
                    }
                }
                KeyCode::Backspace => match form.field {
                    FormField::Pattern => {
                        form.email_pattern.pop();
                    }
                    FormField::Destination => {
                        form.destination.pop();
                    }
                    _ => {}
                },
                KeyCode::Char(c) => match form.field {
                    FormField::Pattern => form.email_pattern.push(c),
                    FormField::Destination => form.destination.push(c),
                    _ => {}
                },
                _ => {}
            }
        }
        Overlay::ConfirmDeleteRule(id) => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let id = id.clone();
                let s = stores.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Err(ApiError::SessionExpired) = s.rules.delete_rule(&id).await {
                        let _ = tx.send(AppEvent::SessionExpired);
                    }
                });
                app.overlay = Overlay::None;
            }
            KeyCode::Char('n') | KeyCode::Esc => app.overlay = Overlay::None,
            _ => {}
        },
        Overlay::FolderName(name) => match key.code {
            KeyCode::Esc => app.overlay = Overlay::None,
            KeyCode::Backspace => {
                name.pop();
            }
            KeyCode::Enter => {
                let name = name.trim().to_string();
                if name.is_empty() || name == "@" {
                    app.set_status("Folder name is required");
                    return;
                }
                let s = stores.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Err(ApiError::SessionExpired) = s.folders.create_folders(vec![name]).await
                    {
                        let _ = tx.send(AppEvent::SessionExpired);
                    }
                });
                app.overlay = Overlay::None;
            }
            KeyCode::Char(c) => name.push(c),
            _ => {}
        },
        Overlay::ConfirmDeleteFolder(id) => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let id = id.clone();
                if app.expanded_folder.as_deref() == Some(id.as_str()) {
                    app.expanded_folder = None;
                }
                let s = stores.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Err(ApiError::SessionExpired) = s.folders.delete_folder(&id).await {
                        let _ = tx.send(AppEvent::SessionExpired);
                    }
                });
                app.overlay = Overlay::None;
            }
            KeyCode::Char('n') | KeyCode::Esc => app.overlay = Overlay::None,
            _ => {}
        },
    }
}

fn spawn_rule_update(stores: &Stores, tx: &EventTx, id: String, update: RuleUpdate) {
    let s = stores.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        if let Err(ApiError::SessionExpired) = s.rules.update_rule(&id, update).await {
            let _ = tx.send(AppEvent::SessionExpired);
        }
    });
}

fn spawn_folder_settings_update(
    stores: &Stores,
    tx: &EventTx,
    folder_id: String,
    update: FolderSettingsUpdate,
) {
    let s = stores.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        if let Err(ApiError::SessionExpired) =
            s.folders.update_settings(&folder_id, update).await
        {
            let _ = tx.send(AppEvent::SessionExpired);
        }
    });
}

fn spawn_user_settings_update(stores: &Stores, tx: &EventTx, update: UserSettingsUpdate) {
    let s = stores.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        if let Err(ApiError::SessionExpired) = s.settings.update_settings(update).await {
            let _ = tx.send(AppEvent::SessionExpired);
        }
    });
}
