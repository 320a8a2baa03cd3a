use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::api::types::{UserSettings, UserSettingsUpdate, WatchStatus};
use crate::api::{ApiResult, SweepApi};
use crate::toast::ToastQueue;

#[derive(Default)]
struct State {
    settings: Option<UserSettings>,
    watch: WatchStatus,
    is_loading: bool,
}

/// Account-level settings plus the mailbox watch toggle.
#[derive(Clone)]
pub struct SettingsStore {
    api: Arc<dyn SweepApi>,
    toasts: ToastQueue,
    state: Arc<Mutex<State>>,
}

impl SettingsStore {
    pub fn new(api: Arc<dyn SweepApi>, toasts: ToastQueue) -> Self {
        Self {
            api,
            toasts,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn settings(&self) -> Option<UserSettings> {
        self.state.lock().unwrap().settings.clone()
    }

    pub fn watching(&self) -> bool {
        self.state.lock().unwrap().watch.watching
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().unwrap().is_loading
    }

    /// Fetch settings and watch state together. The watch probe is
    /// best-effort; a failure there leaves the toggle showing "off".
    pub async fn refresh(&self) {
        self.state.lock().unwrap().is_loading = true;

        match self.api.settings().await {
            Ok(settings) => {
                self.state.lock().unwrap().settings = Some(settings);
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch settings");
            }
        }

        match self.api.watch_status().await {
            Ok(watch) => {
                self.state.lock().unwrap().watch = watch;
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch watch status");
            }
        }

        self.state.lock().unwrap().is_loading = false;
    }

    /// Optimistic settings update with key-scoped rollback, same shape as
    /// the per-folder variant.
    pub async fn update_settings(&self, update: UserSettingsUpdate) -> ApiResult<UserSettings> {
        let previous = {
            let mut state = self.state.lock().unwrap();
            match state.settings.as_mut() {
                Some(settings) => {
                    let previous = update.previous_of(settings);
                    update.apply_to(settings);
                    Some(previous)
                }
                None => None,
            }
        };

        match self.api.update_settings(&update).await {
            Ok(server_settings) => {
                self.state.lock().unwrap().settings = Some(server_settings.clone());
                self.toasts.success("Settings updated");
                Ok(server_settings)
            }
            Err(e) => {
                if let Some(previous) = previous {
                    let mut state = self.state.lock().unwrap();
                    if let Some(settings) = state.settings.as_mut() {
                        previous.apply_to(settings);
                    }
                }
                self.toasts.error("Failed to update settings");
                Err(e)
            }
        }
    }

    /// Flip the mailbox watch. The toggle is not optimistic: watch state
    /// belongs to the backend and only changes once it confirms.
    pub async fn toggle_watch(&self) -> ApiResult<()> {
        let watching = self.watching();
        let result = if watching {
            self.api.stop_watch().await
        } else {
            self.api.start_watch().await
        };

        match result {
            Ok(()) => {
                self.state.lock().unwrap().watch.watching = !watching;
                self.toasts.success(if watching {
                    "Inbox watch stopped"
                } else {
                    "Inbox watch started"
                });
                Ok(())
            }
            Err(e) => {
                self.toasts.error(if watching {
                    "Failed to stop inbox watch"
                } else {
                    "Failed to start inbox watch"
                });
                Err(e)
            }
        }
    }
}
