use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::api::types::{FolderSettings, FolderSettingsUpdate, MagicFolder};
use crate::api::{ApiResult, SweepApi};
use crate::toast::ToastQueue;

#[derive(Default)]
struct State {
    folders: Vec<MagicFolder>,
    settings: HashMap<String, FolderSettings>,
    is_loading: bool,
    error: Option<String>,
}

/// Magic-folder list plus lazily loaded per-folder archive settings.
/// Settings are fetched once, the first time a folder is expanded, and
/// updated optimistically with key-scoped rollback after that.
#[derive(Clone)]
pub struct FoldersStore {
    api: Arc<dyn SweepApi>,
    toasts: ToastQueue,
    state: Arc<Mutex<State>>,
}

impl FoldersStore {
    pub fn new(api: Arc<dyn SweepApi>, toasts: ToastQueue) -> Self {
        Self {
            api,
            toasts,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn folders(&self) -> Vec<MagicFolder> {
        self.state.lock().unwrap().folders.clone()
    }

    /// Settings for a folder, if they have been loaded.
    pub fn settings_of(&self, folder_id: &str) -> Option<FolderSettings> {
        self.state.lock().unwrap().settings.get(folder_id).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().unwrap().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().unwrap().error.clone()
    }

    pub async fn refresh(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.is_loading = true;
            state.error = None;
        }

        match self.api.list_folders().await {
            Ok(folders) => {
                let mut state = self.state.lock().unwrap();
                state.folders = folders;
                state.is_loading = false;
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch folders");
                let mut state = self.state.lock().unwrap();
                state.error = Some(e.to_string());
                state.is_loading = false;
            }
        }
    }

    /// Create one or more folders, then re-fetch the list so the new
    /// entries carry server-assigned ids.
    pub async fn create_folders(&self, names: Vec<String>) -> ApiResult<()> {
        match self.api.create_folders(&names).await {
            Ok(()) => {
                self.toasts.success(if names.len() == 1 {
                    "Folder created".to_string()
                } else {
                    format!("{} folders created", names.len())
                });
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                self.toasts.error("Failed to create folder");
                Err(e)
            }
        }
    }

    /// Delete a folder; the backend cascades to rules referencing it and
    /// reports how many it removed.
    pub async fn delete_folder(&self, folder_id: &str) -> ApiResult<u64> {
        match self.api.delete_folder(folder_id).await {
            Ok(deleted) => {
                {
                    let mut state = self.state.lock().unwrap();
                    state.folders.retain(|f| f.id != folder_id);
                    state.settings.remove(folder_id);
                }
                if deleted.rules_deleted > 0 {
                    self.toasts.success(format!(
                        "Folder deleted ({} rules removed)",
                        deleted.rules_deleted
                    ));
                } else {
                    self.toasts.success("Folder deleted");
                }
                Ok(deleted.rules_deleted)
            }
            Err(e) => {
                self.toasts.error("Failed to delete folder");
                Err(e)
            }
        }
    }

    /// Fetch settings for a folder the first time it is expanded. Later
    /// calls are no-ops; failures are logged and left for the next expand.
    pub async fn load_settings(&self, folder_id: &str) {
        if self
            .state
            .lock()
            .unwrap()
            .settings
            .contains_key(folder_id)
        {
            return;
        }

        match self.api.folder_settings(folder_id).await {
            Ok(settings) => {
                self.state
                    .lock()
                    .unwrap()
                    .settings
                    .insert(folder_id.to_string(), settings);
            }
            Err(e) => {
                warn!(folder = folder_id, error = %e, "failed to fetch folder settings");
            }
        }
    }

    /// Optimistic settings update. Only the keys the update sets are
    /// captured beforehand and restored on failure, so a concurrent edit
    /// of a different key is left alone.
    pub async fn update_settings(
        &self,
        folder_id: &str,
        update: FolderSettingsUpdate,
    ) -> ApiResult<FolderSettings> {
        let previous = {
            let mut state = self.state.lock().unwrap();
            match state.settings.get_mut(folder_id) {
                Some(settings) => {
                    let previous = update.previous_of(settings);
                    update.apply_to(settings);
                    Some(previous)
                }
                None => None,
            }
        };

        match self.api.update_folder_settings(folder_id, &update).await {
            Ok(server_settings) => {
                self.state
                    .lock()
                    .unwrap()
                    .settings
                    .insert(folder_id.to_string(), server_settings.clone());
                self.toasts.success("Settings updated");
                Ok(server_settings)
            }
            Err(e) => {
                if let Some(previous) = previous {
                    let mut state = self.state.lock().unwrap();
                    if let Some(settings) = state.settings.get_mut(folder_id) {
                        previous.apply_to(settings);
                    }
                }
                self.toasts.error("Failed to update settings");
                Err(e)
            }
        }
    }

    /// Ask the backend to create the default folder set.
    pub async fn setup_folders(&self) -> ApiResult<()> {
        match self.api.setup_folders().await {
            Ok(result) => {
                self.toasts.success(result.message);
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                self.toasts.error("Failed to set up folders");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::api::types::{
        FolderDeleted, ProcessingStats, Rule, RuleCreate, RuleUpdate, SetupResult, TimeUnit,
        UserSettings, UserSettingsUpdate, WatchStatus,
    };
    use crate::toast::ToastKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn folder(id: &str, name: &str) -> MagicFolder {
        MagicFolder {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[derive(Default)]
    struct MockApi {
        folders: Mutex<Vec<MagicFolder>>,
        list_fails: Mutex<bool>,
        settings: Mutex<HashMap<String, ApiResult<FolderSettings>>>,
        settings_fetches: AtomicUsize,
        update_result: Mutex<Option<ApiResult<FolderSettings>>>,
        delete_result: Mutex<Option<ApiResult<FolderDeleted>>>,
        create_result: Mutex<Option<ApiResult<()>>>,
        setup_result: Mutex<Option<ApiResult<SetupResult>>>,
    }

    fn network_err() -> ApiError {
        ApiError::Network("connection refused".to_string())
    }

    #[async_trait]
    impl SweepApi for MockApi {
        async fn list_folders(&self) -> ApiResult<Vec<MagicFolder>> {
            if *self.list_fails.lock().unwrap() {
                return Err(network_err());
            }
            Ok(self.folders.lock().unwrap().clone())
        }

        async fn create_folders(&self, names: &[String]) -> ApiResult<()> {
            let result = self
                .create_result
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Ok(()));
            if result.is_ok() {
                let mut folders = self.folders.lock().unwrap();
                for name in names {
                    folders.push(MagicFolder {
                        id: format!("id-{name}"),
                        name: name.clone(),
                    });
                }
            }
            result
        }

        async fn delete_folder(&self, _id: &str) -> ApiResult<FolderDeleted> {
            self.delete_result
                .lock()
                .unwrap()
                .clone()
                .expect("delete_folder not scripted")
        }

        async fn folder_settings(&self, id: &str) -> ApiResult<FolderSettings> {
            self.settings_fetches.fetch_add(1, Ordering::SeqCst);
            self.settings
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .expect("folder_settings not scripted")
        }

        async fn update_folder_settings(
            &self,
            _id: &str,
            _update: &FolderSettingsUpdate,
        ) -> ApiResult<FolderSettings> {
            self.update_result
                .lock()
                .unwrap()
                .clone()
                .expect("update_folder_settings not scripted")
        }

        async fn setup_folders(&self) -> ApiResult<SetupResult> {
            self.setup_result
                .lock()
                .unwrap()
                .clone()
                .expect("setup_folders not scripted")
        }

        async fn list_rules(&self) -> ApiResult<Vec<Rule>> {
            unimplemented!()
        }
        async fn create_rule(&self, _rule: &RuleCreate) -> ApiResult<Rule> {
            unimplemented!()
        }
        async fn update_rule(&self, _id: &str, _update: &RuleUpdate) -> ApiResult<Rule> {
            unimplemented!()
        }
        async fn delete_rule(&self, _id: &str) -> ApiResult<()> {
            unimplemented!()
        }
        async fn settings(&self) -> ApiResult<UserSettings> {
            unimplemented!()
        }
        async fn update_settings(&self, _update: &UserSettingsUpdate) -> ApiResult<UserSettings> {
            unimplemented!()
        }
        async fn watch_status(&self) -> ApiResult<WatchStatus> {
            unimplemented!()
        }
        async fn start_watch(&self) -> ApiResult<()> {
            unimplemented!()
        }
        async fn stop_watch(&self) -> ApiResult<()> {
            unimplemented!()
        }
        async fn stats(&self) -> ApiResult<ProcessingStats> {
            unimplemented!()
        }
    }

    fn store_with(api: MockApi) -> (FoldersStore, ToastQueue, Arc<MockApi>) {
        let api = Arc::new(api);
        let toasts = ToastQueue::new();
        let store = FoldersStore::new(api.clone(), toasts.clone());
        (store, toasts, api)
    }

    #[tokio::test]
    async fn refresh_loads_folder_list() {
        let api = MockApi::default();
        *api.folders.lock().unwrap() = vec![folder("f1", "@Work"), folder("f2", "@News")];

        let (store, _, _) = store_with(api);
        store.refresh().await;

        assert_eq!(store.folders().len(), 2);
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_list() {
        let api = MockApi::default();
        *api.folders.lock().unwrap() = vec![folder("f1", "@Work")];

        let (store, _, api) = store_with(api);
        store.refresh().await;
        assert_eq!(store.folders().len(), 1);

        *api.list_fails.lock().unwrap() = true;
        store.refresh().await;

        assert_eq!(store.folders().len(), 1);
        assert!(store.error().is_some());
    }

    #[tokio::test]
    async fn settings_load_once_per_folder() {
        let api = MockApi::default();
        api.settings
            .lock()
            .unwrap()
            .insert("f1".to_string(), Ok(FolderSettings::default()));

        let (store, _, api) = store_with(api);
        store.load_settings("f1").await;
        store.load_settings("f1").await;
        store.load_settings("f1").await;

        assert_eq!(api.settings_fetches.load(Ordering::SeqCst), 1);
        assert!(store.settings_of("f1").is_some());
    }

    #[tokio::test]
    async fn failed_settings_load_is_silent_and_retried() {
        let api = MockApi::default();
        api.settings
            .lock()
            .unwrap()
            .insert("f1".to_string(), Err(network_err()));

        let (store, toasts, api) = store_with(api);
        store.load_settings("f1").await;
        assert!(store.settings_of("f1").is_none());
        assert!(toasts.is_empty());

        // A later expand tries again.
        api.settings
            .lock()
            .unwrap()
            .insert("f1".to_string(), Ok(FolderSettings::default()));
        store.load_settings("f1").await;
        assert!(store.settings_of("f1").is_some());
        assert_eq!(api.settings_fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_settings_update_reverts_only_the_changed_keys() {
        let api = MockApi::default();
        let mut seeded = FolderSettings::default();
        seeded.archive_read_enabled = true;
        seeded.archive_unread_value = 90;
        api.settings
            .lock()
            .unwrap()
            .insert("f1".to_string(), Ok(seeded.clone()));
        *api.update_result.lock().unwrap() = Some(Err(network_err()));

        let (store, toasts, _) = store_with(api);
        store.load_settings("f1").await;

        let update = FolderSettingsUpdate {
            archive_read_enabled: Some(false),
            archive_read_value: Some(14),
            ..Default::default()
        };
        let result = store.update_settings("f1", update).await;
        assert!(result.is_err());

        let settings = store.settings_of("f1").unwrap();
        assert_eq!(settings, seeded);
        assert!(
            toasts
                .snapshot()
                .iter()
                .any(|t| t.kind == ToastKind::Error)
        );
    }

    #[tokio::test]
    async fn successful_settings_update_takes_server_representation() {
        let api = MockApi::default();
        api.settings
            .lock()
            .unwrap()
            .insert("f1".to_string(), Ok(FolderSettings::default()));
        let mut server = FolderSettings::default();
        server.archive_read_enabled = true;
        server.archive_read_value = 48;
        server.archive_read_unit = TimeUnit::Hours;
        *api.update_result.lock().unwrap() = Some(Ok(server.clone()));

        let (store, _, _) = store_with(api);
        store.load_settings("f1").await;

        let update = FolderSettingsUpdate {
            archive_read_enabled: Some(true),
            ..Default::default()
        };
        store.update_settings("f1", update).await.unwrap();
        assert_eq!(store.settings_of("f1").unwrap(), server);
    }

    #[tokio::test]
    async fn delete_folder_reports_cascaded_rules() {
        let api = MockApi::default();
        *api.folders.lock().unwrap() = vec![folder("f1", "@Work")];
        *api.delete_result.lock().unwrap() = Some(Ok(FolderDeleted { rules_deleted: 3 }));

        let (store, toasts, _) = store_with(api);
        store.refresh().await;

        let deleted = store.delete_folder("f1").await.unwrap();
        assert_eq!(deleted, 3);
        assert!(store.folders().is_empty());
        assert!(
            toasts
                .snapshot()
                .iter()
                .any(|t| t.message.contains("3 rules"))
        );
    }

    #[tokio::test]
    async fn create_folders_refreshes_list() {
        let api = MockApi::default();
        let (store, _, _) = store_with(api);

        store
            .create_folders(vec!["@Receipts".to_string()])
            .await
            .unwrap();

        let folders = store.folders();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "@Receipts");
    }

    #[tokio::test]
    async fn setup_surfaces_server_message() {
        let api = MockApi::default();
        *api.setup_result.lock().unwrap() = Some(Ok(SetupResult {
            message: "Created 4 folders".to_string(),
        }));

        let (store, toasts, _) = store_with(api);
        store.setup_folders().await.unwrap();

        assert_eq!(toasts.snapshot()[0].message, "Created 4 folders");
    }
}
