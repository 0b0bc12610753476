#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tabsync_core::{
    AutoSaveSettings, LocalCache, Notifier, NotifyLevel, RemoteError, RemoteResult, RemoteStore,
    SqliteLocalCache, StorageKey, SyncCoordinator,
};
use tokio::sync::Semaphore;

pub const KEY: &str = "production1";

/// Remote double with scripted `get` answers and recorded `put` calls.
#[derive(Default)]
pub struct ScriptedRemote {
    get_script: Mutex<VecDeque<ScriptedGet>>,
    get_calls: Mutex<usize>,
    puts: Mutex<Vec<Value>>,
    put_failure: Mutex<Option<RemoteError>>,
    put_gate: Mutex<Option<Arc<Semaphore>>>,
}

struct ScriptedGet {
    answer: RemoteResult<Option<Value>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues the answer for the next `get`; once drained, `get` is absent.
    pub fn push_get(&self, answer: RemoteResult<Option<Value>>) {
        self.get_script
            .lock()
            .push_back(ScriptedGet { answer, gate: None });
    }

    /// Queues an answer that is only returned once the returned semaphore
    /// grants a permit.
    pub fn push_gated_get(&self, answer: RemoteResult<Option<Value>>) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.get_script.lock().push_back(ScriptedGet {
            answer,
            gate: Some(Arc::clone(&gate)),
        });
        gate
    }

    pub fn fail_puts(&self, error: RemoteError) {
        *self.put_failure.lock() = Some(error);
    }

    /// Makes every `put` wait for a permit on the returned semaphore.
    pub fn gate_puts(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.put_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn get_calls(&self) -> usize {
        *self.get_calls.lock()
    }

    pub fn puts(&self) -> Vec<Value> {
        self.puts.lock().clone()
    }

    pub fn put_count(&self) -> usize {
        self.puts.lock().len()
    }
}

#[async_trait]
impl RemoteStore for ScriptedRemote {
    async fn get(&self, _key: &str) -> RemoteResult<Option<Value>> {
        *self.get_calls.lock() += 1;
        let scripted = self.get_script.lock().pop_front();
        let Some(ScriptedGet { answer, gate }) = scripted else {
            return Ok(None);
        };
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate should stay open").forget();
        }
        answer
    }

    async fn put(&self, _key: &str, value: &Value) -> RemoteResult<()> {
        self.puts.lock().push(value.clone());
        let gate = self.put_gate.lock().clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate should stay open").forget();
        }
        match self.put_failure.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Notifier that keeps every message for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(NotifyLevel, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(NotifyLevel, String)> {
        self.messages.lock().clone()
    }

    pub fn contains(&self, level: NotifyLevel, text: &str) -> bool {
        self.messages
            .lock()
            .iter()
            .any(|(seen, message)| *seen == level && message.contains(text))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NotifyLevel, message: &str, _duration: Duration) {
        self.messages.lock().push((level, message.to_string()));
    }
}

pub struct Harness {
    pub coordinator: SyncCoordinator,
    pub local: Arc<SqliteLocalCache>,
    pub remote: Arc<ScriptedRemote>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_local(SqliteLocalCache::open_in_memory().expect("cache should open"))
    }

    pub fn with_settings(settings: AutoSaveSettings) -> Self {
        let local = SqliteLocalCache::open_in_memory().expect("cache should open");
        settings.save(&local);
        Self::with_local(local)
    }

    pub fn with_local(local: SqliteLocalCache) -> Self {
        let local = Arc::new(local);
        let remote = ScriptedRemote::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let coordinator = SyncCoordinator::builder(
            StorageKey::new(KEY),
            Arc::clone(&local) as Arc<dyn LocalCache>,
            Arc::clone(&remote) as Arc<dyn RemoteStore>,
        )
        .notifier(Arc::clone(&notifier) as Arc<dyn Notifier>)
        .build();
        Self {
            coordinator,
            local,
            remote,
            notifier,
        }
    }

    pub fn local_snapshot(&self) -> Option<Value> {
        self.local.load(KEY)
    }
}

pub fn tab(name: &str, production: &[&str]) -> Value {
    let production: Vec<Value> = production
        .iter()
        .map(|item| json!({"item": item, "amount": 1}))
        .collect();
    json!({
        "metadata": {"name": name},
        "request": {"production": production, "input": []},
    })
}

pub fn names(snapshot: &Value) -> Vec<String> {
    snapshot
        .as_array()
        .map(|tabs| {
            tabs.iter()
                .map(|tab| {
                    tab.pointer("/metadata/name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Lets spawned tasks run to their next suspension point.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
