use std::sync::{Arc, Mutex};

use tracing::warn;

use super::cache::RulesCache;
use crate::api::types::{Rule, RuleCreate, RuleUpdate};
use crate::api::{ApiResult, SweepApi};
use crate::toast::ToastQueue;

#[derive(Default)]
struct State {
    rules: Vec<Rule>,
    is_loading: bool,
    error: Option<String>,
}

/// Authoritative in-memory rule collection, seeded from the persisted
/// cache so the UI is never empty while the first fetch is in flight.
///
/// Mutations are optimistic: the local change lands before the backend
/// call, and a snapshot captured synchronously beforehand is restored on
/// failure. Snapshots are scoped to the affected rule (not the whole
/// collection) so concurrent operations on different rules never clobber
/// each other's rollback baselines.
#[derive(Clone)]
pub struct RulesStore {
    api: Arc<dyn SweepApi>,
    cache: Arc<RulesCache>,
    toasts: ToastQueue,
    state: Arc<Mutex<State>>,
}

impl RulesStore {
    pub fn new(api: Arc<dyn SweepApi>, cache: RulesCache, toasts: ToastQueue) -> Self {
        let rules = cache.load();
        Self {
            api,
            cache: Arc::new(cache),
            toasts,
            state: Arc::new(Mutex::new(State {
                rules,
                is_loading: false,
                error: None,
            })),
        }
    }

    /// Snapshot of the current collection, for rendering.
    pub fn rules(&self) -> Vec<Rule> {
        self.state.lock().unwrap().rules.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().unwrap().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().unwrap().error.clone()
    }

    /// Fetch the full collection. Success replaces in-memory state
    /// atomically and persists it, but only when non-empty: an empty
    /// result must not erase a good cache with a transient blank
    /// response. Failure keeps the current (cache-seeded) rules visible
    /// and surfaces a retryable error instead.
    pub async fn refresh(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.is_loading = true;
            state.error = None;
        }

        match self.api.list_rules().await {
            Ok(rules) => {
                if !rules.is_empty() {
                    if let Err(e) = self.cache.save(&rules) {
                        warn!(error = %e, "failed to persist rules cache");
                    }
                }
                let mut state = self.state.lock().unwrap();
                state.rules = rules;
                state.is_loading = false;
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch rules");
                let mut state = self.state.lock().unwrap();
                state.error = Some(e.to_string());
                state.is_loading = false;
            }
        }
    }

    /// Create waits for the server-assigned entity; nothing is appended
    /// optimistically.
    pub async fn create_rule(&self, data: RuleCreate) -> ApiResult<Rule> {
        match self.api.create_rule(&data).await {
            Ok(rule) => {
                self.state.lock().unwrap().rules.push(rule.clone());
                self.toasts.success("Rule created");
                Ok(rule)
            }
            Err(e) => {
                self.toasts.error("Failed to create rule");
                Err(e)
            }
        }
    }

    /// Optimistic merge by id, confirmed with the server's authoritative
    /// representation (which may carry derived fields). On failure the
    /// affected rule reverts to its pre-merge value.
    pub async fn update_rule(&self, id: &str, update: RuleUpdate) -> ApiResult<Rule> {
        let previous = {
            let mut state = self.state.lock().unwrap();
            match state.rules.iter_mut().find(|r| r.id == id) {
                Some(rule) => {
                    let previous = rule.clone();
                    update.apply_to(rule);
                    Some(previous)
                }
                None => None,
            }
        };

        match self.api.update_rule(id, &update).await {
            Ok(server_rule) => {
                let mut state = self.state.lock().unwrap();
                if let Some(rule) = state.rules.iter_mut().find(|r| r.id == id) {
                    *rule = server_rule.clone();
                }
                drop(state);
                self.toasts.success("Rule updated");
                Ok(server_rule)
            }
            Err(e) => {
                if let Some(previous) = previous {
                    let mut state = self.state.lock().unwrap();
                    if let Some(rule) = state.rules.iter_mut().find(|r| r.id == id) {
                        *rule = previous;
                    }
                }
                self.toasts.error("Failed to update rule");
                Err(e)
            }
        }
    }

    /// Optimistic removal; on failure the rule reappears at its original
    /// position exactly as it was.
    pub async fn delete_rule(&self, id: &str) -> ApiResult<()> {
        let removed = {
            let mut state = self.state.lock().unwrap();
            state
                .rules
                .iter()
                .position(|r| r.id == id)
                .map(|index| (index, state.rules.remove(index)))
        };

        match self.api.delete_rule(id).await {
            Ok(()) => {
                self.toasts.success("Rule deleted");
                Ok(())
            }
            Err(e) => {
                if let Some((index, rule)) = removed {
                    let mut state = self.state.lock().unwrap();
                    let index = index.min(state.rules.len());
                    state.rules.insert(index, rule);
                }
                self.toasts.error("Failed to delete rule");
                Err(e)
            }
        }
    }
}
