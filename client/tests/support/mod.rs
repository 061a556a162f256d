#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use courtfinder_client::error::{ClientError, ClientResult};
use courtfinder_client::http::CourtsApi;
use courtfinder_client::models::{Coordinates, Court};
use courtfinder_client::services::{
    GeolocationError, GeolocationProvider, QueryDescriptor, RowView,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// ==================== Fixtures ====================

pub fn court(id: &str, name: &str, latitude: f64, longitude: f64) -> Court {
    Court::new(id, name).with_position(latitude, longitude)
}

pub fn ids(courts: &[RowView]) -> Vec<String> {
    courts.iter().map(|row| row.id.to_string()).collect()
}

/// Backend whose answer and latency depend on the `q` parameter.
///
/// Each script answers once. Texts without a script answer immediately with
/// no courts.
#[derive(Default)]
pub struct ScriptedCourtsApi {
    scripts: Mutex<HashMap<String, (Duration, ClientResult<Vec<Court>>)>>,
    bearers: Mutex<Vec<Option<String>>>,
}

impl ScriptedCourtsApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, text: &str, delay: Duration, courts: Vec<Court>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(text.to_string(), (delay, Ok(courts)));
        self
    }

    pub fn fail(self, text: &str, delay: Duration, error: ClientError) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(text.to_string(), (delay, Err(error)));
        self
    }

    pub fn bearers(&self) -> Vec<Option<String>> {
        self.bearers.lock().unwrap().clone()
    }
}

#[async_trait]
impl CourtsApi for ScriptedCourtsApi {
    async fn list_courts(
        &self,
        query: &QueryDescriptor,
        bearer: Option<&str>,
    ) -> ClientResult<Vec<Court>> {
        self.bearers.lock().unwrap().push(bearer.map(str::to_string));
        let text = query.get("q").unwrap_or_default().to_string();
        let scripted = self.scripts.lock().unwrap().remove(&text);
        match scripted {
            Some((delay, result)) => {
                tokio::time::sleep(delay).await;
                result
            }
            None => Ok(Vec::new()),
        }
    }
}

/// Provider that answers after `delay`.
pub struct DelayedGeolocation {
    pub delay: Duration,
    pub outcome: Result<Coordinates, GeolocationError>,
}

#[async_trait]
impl GeolocationProvider for DelayedGeolocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        tokio::time::sleep(self.delay).await;
        self.outcome.clone()
    }
}
