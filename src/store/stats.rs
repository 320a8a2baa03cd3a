use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::api::SweepApi;
use crate::api::types::ProcessingStats;

#[derive(Default)]
struct State {
    stats: Option<ProcessingStats>,
    is_loading: bool,
    error: Option<String>,
}

/// Processing counters for the stats view. A failed refresh keeps the
/// last good numbers on screen and surfaces a retry message beside them.
#[derive(Clone)]
pub struct StatsStore {
    api: Arc<dyn SweepApi>,
    state: Arc<Mutex<State>>,
}

impl StatsStore {
    pub fn new(api: Arc<dyn SweepApi>) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn stats(&self) -> Option<ProcessingStats> {
        self.state.lock().unwrap().stats.clone()
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

        match self.api.stats().await {
            Ok(stats) => {
                let mut state = self.state.lock().unwrap();
                state.stats = Some(stats);
                state.is_loading = false;
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch stats");
                let mut state = self.state.lock().unwrap();
                state.error = Some(e.to_string());
                state.is_loading = false;
            }
        }
    }
}
