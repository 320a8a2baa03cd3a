use anyhow::Result;
use async_trait::async_trait;
use keyring::Entry;
use std::sync::Arc;
use tracing::debug;

/// Keychain service name the tokens are filed under.
const SERVICE_NAME: &str = "sweep";

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Minimal secure key-value contract so the token store can run against
/// the OS keychain in the app and an in-memory map in tests.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn store(&self, key: &str, value: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Platform keychain implementation (Keychain / Credential Manager /
/// Secret Service). Keyring calls block, so each one runs on the
/// blocking pool.
pub struct KeyringStore;

impl KeyringStore {
    fn entry(key: &str) -> Result<Entry> {
        Ok(Entry::new(SERVICE_NAME, key)?)
    }
}

#[async_trait]
impl SecretStore for KeyringStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        tokio::task::spawn_blocking(move || match Self::entry(&key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        })
        .await?
    }

    async fn store(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        tokio::task::spawn_blocking(move || {
            Self::entry(&key)?.set_password(&value)?;
            Ok(())
        })
        .await?
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        tokio::task::spawn_blocking(move || match Self::entry(&key)?.delete_credential() {
            Ok(()) => Ok(()),
            // Already gone counts as deleted
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        })
        .await?
    }
}

/// Access/refresh token persistence. Mutated only by sign-in, sign-out,
/// and the API client's 401 forced-sign-out path.
#[derive(Clone)]
pub struct TokenStore {
    secrets: Arc<dyn SecretStore>,
}

impl TokenStore {
    pub fn new(secrets: Arc<dyn SecretStore>) -> Self {
        Self { secrets }
    }

    pub async fn access_token(&self) -> Result<Option<String>> {
        self.secrets.get(ACCESS_TOKEN_KEY).await
    }

    pub async fn store_access_token(&self, token: &str) -> Result<()> {
        debug!("storing access token");
        self.secrets.store(ACCESS_TOKEN_KEY, token).await
    }

    pub async fn delete_access_token(&self) -> Result<()> {
        self.secrets.delete(ACCESS_TOKEN_KEY).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>> {
        self.secrets.get(REFRESH_TOKEN_KEY).await
    }

    pub async fn store_refresh_token(&self, token: &str) -> Result<()> {
        debug!("storing refresh token");
        self.secrets.store(REFRESH_TOKEN_KEY, token).await
    }

    pub async fn delete_refresh_token(&self) -> Result<()> {
        self.secrets.delete(REFRESH_TOKEN_KEY).await
    }

    /// Remove both tokens; used by sign-out and the 401 path.
    pub async fn clear(&self) -> Result<()> {
        self.secrets.delete(ACCESS_TOKEN_KEY).await?;
        self.secrets.delete(REFRESH_TOKEN_KEY).await?;
        Ok(())
    }
}

/// In-memory secret store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    values: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
#[async_trait]
impl SecretStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn store(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TokenStore {
        TokenStore::new(Arc::new(MemoryStore::default()))
    }

    #[tokio::test]
    async fn stores_and_retrieves_both_tokens() {
        let tokens = store();
        tokens.store_access_token("at-1").await.unwrap();
        tokens.store_refresh_token("rt-1").await.unwrap();

        assert_eq!(tokens.access_token().await.unwrap().as_deref(), Some("at-1"));
        assert_eq!(
            tokens.refresh_token().await.unwrap().as_deref(),
            Some("rt-1")
        );
    }

    #[tokio::test]
    async fn missing_tokens_read_as_none() {
        let tokens = store();
        assert!(tokens.access_token().await.unwrap().is_none());
        assert!(tokens.refresh_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let tokens = store();
        tokens.delete_access_token().await.unwrap();
        tokens.store_access_token("at-1").await.unwrap();
        tokens.delete_access_token().await.unwrap();
        tokens.delete_access_token().await.unwrap();
        assert!(tokens.access_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_removes_both() {
        let tokens = store();
        tokens.store_access_token("at-1").await.unwrap();
        tokens.store_refresh_token("rt-1").await.unwrap();
        tokens.clear().await.unwrap();
        assert!(tokens.access_token().await.unwrap().is_none());
        assert!(tokens.refresh_token().await.unwrap().is_none());
    }
}
