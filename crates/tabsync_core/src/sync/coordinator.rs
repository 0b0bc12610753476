//! Sync coordinator: startup reconciliation, debounced auto-save and
//! guarded remote writes.
//!
//! # Invariants
//! - Every workspace mutation persists the full snapshot locally before the
//!   remote pipeline is touched.
//! - At most one remote `put` is in flight; overlapping triggers are dropped.
//! - Only the latest armed debounce timer may start a save.
//! - A load applies only if no load issued after it has applied already;
//!   loads that end without data never invalidate older ones.
//! - The state lock is never held across an `.await`.

use crate::cache::LocalCache;
use crate::model::schema::{ProductionTabSchema, TabSchema};
use crate::model::snapshot::WorkspaceSnapshot;
use crate::model::tab::{Tab, TabId};
use crate::model::workspace::Workspace;
use crate::notify::{LogNotifier, Notifier, NotifyLevel};
use crate::remote::{RemoteError, RemoteStore};
use crate::settings::AutoSaveSettings;
use crate::sync::key::StorageKey;
use crate::sync::outcome::{InitOutcome, LoadOutcome, SaveOutcome, SavePhase, SaveTrigger};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

const fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Which flow a remote load belongs to; only changes the wording shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadContext {
    Startup,
    Explicit,
}

struct DebounceTimer {
    id: u64,
    handle: JoinHandle<()>,
}

struct SyncState {
    workspace: Workspace,
    settings: AutoSaveSettings,
    debounce: Option<DebounceTimer>,
    next_timer_id: u64,
    save_in_flight: bool,
    last_save_time: Option<SystemTime>,
    load_generation: u64,
    applied_generation: u64,
    initialized: bool,
}

struct Inner {
    key: StorageKey,
    local: Arc<dyn LocalCache>,
    remote: Arc<dyn RemoteStore>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SyncState>,
}

/// Resets the in-flight flag however the save future ends.
struct InFlightGuard<'a> {
    state: &'a Mutex<SyncState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().save_in_flight = false;
    }
}

/// Configures collaborators before the coordinator is shared.
pub struct SyncCoordinatorBuilder {
    key: StorageKey,
    local: Arc<dyn LocalCache>,
    remote: Arc<dyn RemoteStore>,
    notifier: Arc<dyn Notifier>,
    schema: Arc<dyn TabSchema>,
}

impl SyncCoordinatorBuilder {
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn schema(mut self, schema: Arc<dyn TabSchema>) -> Self {
        self.schema = schema;
        self
    }

    /// Reads persisted auto-save settings and creates the coordinator.
    pub fn build(self) -> SyncCoordinator {
        let settings = AutoSaveSettings::load(self.local.as_ref());
        info!(
            "event=sync_create module=sync status=ok key={} auto_save={} delay_s={}",
            self.key, settings.enabled, settings.delay_seconds
        );
        SyncCoordinator {
            inner: Arc::new(Inner {
                key: self.key,
                local: self.local,
                remote: self.remote,
                notifier: self.notifier,
                state: Mutex::new(SyncState {
                    workspace: Workspace::new(self.schema),
                    settings,
                    debounce: None,
                    next_timer_id: 0,
                    save_in_flight: false,
                    last_save_time: None,
                    load_generation: 0,
                    applied_generation: 0,
                    initialized: false,
                }),
            }),
        }
    }
}

/// Shared handle to one workspace's synchronization engine.
///
/// Cloning is cheap; clones drive the same workspace and timers.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<Inner>,
}

impl SyncCoordinator {
    pub fn builder(
        key: StorageKey,
        local: Arc<dyn LocalCache>,
        remote: Arc<dyn RemoteStore>,
    ) -> SyncCoordinatorBuilder {
        SyncCoordinatorBuilder {
            key,
            local,
            remote,
            notifier: Arc::new(LogNotifier),
            schema: Arc::new(ProductionTabSchema),
        }
    }

    /// Coordinator with the production schema and log-backed notifications.
    pub fn new(
        key: StorageKey,
        local: Arc<dyn LocalCache>,
        remote: Arc<dyn RemoteStore>,
    ) -> Self {
        Self::builder(key, local, remote).build()
    }

    pub fn storage_key(&self) -> &StorageKey {
        &self.inner.key
    }

    // ---- startup -------------------------------------------------------

    /// Populates the workspace, remote first with local fallback.
    ///
    /// Always leaves at least one tab and an active pointer. When the local
    /// fallback holds nothing meaningful, one extra remote load is attempted.
    pub async fn initialize(&self) -> InitOutcome {
        let generation = {
            let mut state = self.inner.state.lock();
            if state.initialized {
                warn!(
                    "event=sync_init module=sync status=skipped key={} reason=already_initialized",
                    self.inner.key
                );
                return InitOutcome::AlreadyInitialized;
            }
            state.initialized = true;
            Self::begin_load(&mut state)
        };

        info!("event=sync_init module=sync status=start key={}", self.inner.key);
        self.notify(NotifyLevel::Info, "Loading from server...", ms(1000));

        match self.fetch_remote().await {
            Ok(Some(snapshot)) => {
                match self.apply_remote(generation, snapshot, LoadContext::Startup) {
                    LoadOutcome::Loaded { tabs } => {
                        info!(
                            "event=sync_init module=sync status=ok key={} source=remote tabs={}",
                            self.inner.key, tabs
                        );
                        return InitOutcome::Remote { tabs };
                    }
                    _ => return self.finish_superseded(),
                }
            }
            Ok(None) => {
                info!(
                    "event=sync_init module=sync status=fallback key={} reason=remote_absent",
                    self.inner.key
                );
                self.notify(
                    NotifyLevel::Info,
                    "No data found on server, using local data",
                    ms(2000),
                );
            }
            Err(err) => {
                warn!(
                    "event=sync_init module=sync status=fallback key={} error_code={} transient={} error={}",
                    self.inner.key,
                    err.code(),
                    err.is_transient(),
                    err
                );
                self.notify(
                    NotifyLevel::Info,
                    "Using local data (server unavailable)",
                    ms(3000),
                );
            }
        }

        self.initialize_from_local(generation).await
    }

    async fn initialize_from_local(&self, generation: u64) -> InitOutcome {
        let stored = self.read_local_snapshot();

        let (tabs, meaningful) = {
            let mut state = self.inner.state.lock();
            if Self::is_stale(&state, generation) {
                drop(state);
                return self.finish_superseded();
            }
            let tabs = match stored {
                Some(snapshot) => state.workspace.replace_all(snapshot.into_payloads()),
                None => state.workspace.replace_all(Vec::new()),
            };
            state.applied_generation = generation;
            self.persist_local(&state);
            (tabs, state.workspace.has_meaningful_content())
        };

        info!(
            "event=sync_init module=sync status=ok key={} source=local tabs={} meaningful={}",
            self.inner.key, tabs, meaningful
        );
        if meaningful {
            return InitOutcome::Local {
                tabs,
                secondary: None,
            };
        }

        // One secondary remote pass; its own failure path never recurses.
        let secondary = self.load_from_server().await;
        if tabs == 0 {
            InitOutcome::Empty { secondary }
        } else {
            InitOutcome::Local {
                tabs,
                secondary: Some(secondary),
            }
        }
    }

    fn finish_superseded(&self) -> InitOutcome {
        let mut state = self.inner.state.lock();
        if state.workspace.ensure_not_empty() {
            self.persist_local(&state);
        }
        info!(
            "event=sync_init module=sync status=skipped key={} reason=superseded",
            self.inner.key
        );
        InitOutcome::Superseded
    }

    // ---- explicit remote operations -----------------------------------

    /// Replaces the workspace with the remote snapshot, bypassing debounce.
    ///
    /// On "no data" or failure the workspace is left untouched.
    pub async fn load_from_server(&self) -> LoadOutcome {
        let generation = Self::begin_load(&mut self.inner.state.lock());
        self.notify(NotifyLevel::Info, "Loading from server...", ms(1500));

        match self.fetch_remote().await {
            Ok(Some(snapshot)) => self.apply_remote(generation, snapshot, LoadContext::Explicit),
            Ok(None) => {
                info!(
                    "event=sync_load module=sync status=ok key={} found=false",
                    self.inner.key
                );
                self.notify(
                    NotifyLevel::Info,
                    "No production data found on server.",
                    ms(3000),
                );
                LoadOutcome::NoData
            }
            Err(err) => {
                warn!(
                    "event=sync_load module=sync status=error key={} error_code={} transient={} error={}",
                    self.inner.key,
                    err.code(),
                    err.is_transient(),
                    err
                );
                self.notify(
                    NotifyLevel::Error,
                    "Failed to load data from server.",
                    ms(5000),
                );
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Saves the current workspace remotely through the in-flight guard.
    pub async fn save_to_server(&self) -> SaveOutcome {
        self.perform_remote_save(SaveTrigger::Explicit).await
    }

    /// Runs one guarded remote save.
    ///
    /// Dropped with `SaveOutcome::Skipped` when another save is in flight.
    /// Failures are reported, never retried.
    pub async fn perform_remote_save(&self, trigger: SaveTrigger) -> SaveOutcome {
        let snapshot = {
            let mut state = self.inner.state.lock();
            if state.save_in_flight {
                debug!(
                    "event=remote_save module=sync status=skipped key={} trigger={:?} reason=in_flight",
                    self.inner.key, trigger
                );
                return SaveOutcome::Skipped;
            }
            state.save_in_flight = true;
            state.workspace.snapshot()
        };
        let _in_flight = InFlightGuard {
            state: &self.inner.state,
        };

        let (saving, saved, failed) = match trigger {
            SaveTrigger::AutoSave => (
                ("Saving to server...", ms(1000)),
                ("Saved to server", ms(1000)),
                ("Failed to save to server", ms(3000)),
            ),
            SaveTrigger::Explicit => (
                ("Saving to server...", ms(1500)),
                ("Production data saved to server.", ms(3000)),
                (
                    "Failed to save data to server. Check the log for details.",
                    ms(5000),
                ),
            ),
        };

        self.notify(NotifyLevel::Info, saving.0, saving.1);
        info!(
            "event=remote_save module=sync status=start key={} trigger={:?} tabs={}",
            self.inner.key,
            trigger,
            snapshot.len()
        );

        match self
            .inner
            .remote
            .put(self.inner.key.as_str(), &snapshot.to_json())
            .await
        {
            Ok(()) => {
                {
                    let mut state = self.inner.state.lock();
                    state.last_save_time = Some(SystemTime::now());
                    self.persist_local(&state);
                }
                info!(
                    "event=remote_save module=sync status=ok key={} trigger={:?}",
                    self.inner.key, trigger
                );
                self.notify(NotifyLevel::Success, saved.0, saved.1);
                SaveOutcome::Saved
            }
            Err(err) => {
                warn!(
                    "event=remote_save module=sync status=error key={} trigger={:?} error_code={} transient={} error={}",
                    self.inner.key,
                    trigger,
                    err.code(),
                    err.is_transient(),
                    err
                );
                self.notify(NotifyLevel::Error, failed.0, failed.1);
                SaveOutcome::Failed(err)
            }
        }
    }

    // ---- workspace mutations ------------------------------------------

    /// Appends an empty tab and activates it.
    pub fn add_empty_tab(&self) -> TabId {
        let mut state = self.inner.state.lock();
        let id = state.workspace.add_empty();
        self.after_mutation(&mut state);
        id
    }

    /// Appends a clone of `source` and activates it.
    pub fn clone_tab(&self, source: TabId) -> Option<TabId> {
        self.mutate(|workspace| workspace.clone_tab(source))
    }

    /// Removes one tab; removing the last one leaves a fresh empty tab.
    pub fn remove_tab(&self, id: TabId) -> bool {
        self.mutate(|workspace| workspace.remove(id)).is_some()
    }

    /// Appends imported payloads in order; the active tab is unchanged.
    pub fn import_tabs(&self, payloads: Vec<Value>) -> Vec<TabId> {
        let ids: Vec<TabId> = payloads
            .into_iter()
            .filter_map(|payload| self.mutate(|workspace| Some(workspace.push(Tab::new(payload)))))
            .collect();
        if !ids.is_empty() {
            let plural = if ids.len() == 1 { "" } else { "s" };
            self.notify(
                NotifyLevel::Success,
                &format!("Successfully imported {} tab{plural}.", ids.len()),
                ms(3000),
            );
        }
        ids
    }

    /// Removes every tab one by one; ends with a single empty tab.
    pub fn clear_all_tabs(&self) {
        for id in self.tab_ids() {
            self.remove_tab(id);
        }
        self.mutate(|workspace| workspace.ensure_not_empty().then_some(()));
    }

    /// Edits one tab's payload in place.
    pub fn edit_tab(&self, id: TabId, edit: impl FnOnce(&mut Value)) -> bool {
        self.mutate(|workspace| workspace.edit(id, edit).then_some(()))
            .is_some()
    }

    /// Records a change made to tab content outside `edit_tab`.
    pub fn tab_changed(&self) {
        self.after_mutation(&mut self.inner.state.lock());
    }

    /// Removes every selected tab after `confirm` approves the prompt.
    ///
    /// Returns the number of removed tabs.
    pub fn remove_selected(&self, confirm: impl FnOnce(&str) -> bool) -> usize {
        let selected = self.selected_ids();
        if selected.is_empty() {
            return 0;
        }

        let plural = if selected.len() > 1 { "s" } else { "" };
        let prompt = format!(
            "Do you really want to remove {} tab{plural}?",
            selected.len()
        );
        if !confirm(&prompt) {
            debug!(
                "event=remove_selected module=sync status=skipped reason=not_confirmed count={}",
                selected.len()
            );
            return 0;
        }

        let mut removed = 0;
        for id in selected {
            if self.remove_tab(id) {
                removed += 1;
            }
        }
        self.inner.state.lock().workspace.clear_selection();
        removed
    }

    // ---- selection and navigation (not persisted) ----------------------

    pub fn set_active(&self, id: TabId) -> bool {
        self.inner.state.lock().workspace.set_active(id)
    }

    pub fn select_all(&self) {
        self.inner.state.lock().workspace.select_all();
    }

    pub fn toggle_selection(&self, id: TabId) -> bool {
        self.inner.state.lock().workspace.toggle(id)
    }

    pub fn is_selected(&self, id: TabId) -> bool {
        self.inner.state.lock().workspace.is_selected(id)
    }

    pub fn selected_ids(&self) -> Vec<TabId> {
        self.inner.state.lock().workspace.selected_ids().to_vec()
    }

    // ---- auto-save settings -------------------------------------------

    pub fn auto_save_settings(&self) -> AutoSaveSettings {
        self.inner.state.lock().settings
    }

    /// Persists new settings; disabling cancels an armed timer but never an
    /// in-flight save.
    pub fn update_auto_save_settings(&self, settings: AutoSaveSettings) {
        let mut state = self.inner.state.lock();
        state.settings = settings;
        settings.save(self.inner.local.as_ref());
        if !settings.enabled {
            Self::cancel_timer(&mut state);
        }
        info!(
            "event=settings_update module=sync status=ok auto_save={} delay_s={}",
            settings.enabled, settings.delay_seconds
        );
    }

    /// Cancels the armed debounce timer, if any.
    pub fn cancel_pending_save(&self) -> bool {
        Self::cancel_timer(&mut self.inner.state.lock())
    }

    // ---- observation ---------------------------------------------------

    pub fn phase(&self) -> SavePhase {
        let state = self.inner.state.lock();
        if state.save_in_flight {
            SavePhase::Saving
        } else if state.debounce.is_some() {
            SavePhase::PendingDebounce
        } else {
            SavePhase::Idle
        }
    }

    pub fn is_save_in_flight(&self) -> bool {
        self.inner.state.lock().save_in_flight
    }

    pub fn last_save_time(&self) -> Option<SystemTime> {
        self.inner.state.lock().last_save_time
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        self.inner.state.lock().workspace.snapshot()
    }

    pub fn tab_ids(&self) -> Vec<TabId> {
        self.inner.state.lock().workspace.tab_ids()
    }

    pub fn active_tab(&self) -> Option<Tab> {
        self.inner.state.lock().workspace.active_tab().cloned()
    }

    // ---- internals -----------------------------------------------------

    fn begin_load(state: &mut SyncState) -> u64 {
        state.load_generation += 1;
        state.load_generation
    }

    /// A load issued after `generation` has already replaced the workspace.
    fn is_stale(state: &SyncState, generation: u64) -> bool {
        state.applied_generation > generation
    }

    async fn fetch_remote(&self) -> Result<Option<WorkspaceSnapshot>, RemoteError> {
        let Some(value) = self.inner.remote.get(self.inner.key.as_str()).await? else {
            return Ok(None);
        };
        WorkspaceSnapshot::from_json(value)
            .map(Some)
            .map_err(|err| RemoteError::InvalidPayload(err.to_string()))
    }

    fn read_local_snapshot(&self) -> Option<WorkspaceSnapshot> {
        let value = self.inner.local.load(self.inner.key.as_str())?;
        if value.is_null() {
            return None;
        }
        match WorkspaceSnapshot::from_json(value) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(
                    "event=local_load module=sync status=error key={} error_code=corrupt_snapshot error={}",
                    self.inner.key, err
                );
                None
            }
        }
    }

    fn apply_remote(
        &self,
        generation: u64,
        snapshot: WorkspaceSnapshot,
        context: LoadContext,
    ) -> LoadOutcome {
        let tabs = {
            let mut state = self.inner.state.lock();
            if Self::is_stale(&state, generation) {
                info!(
                    "event=sync_load module=sync status=skipped key={} reason=stale generation={} applied={}",
                    self.inner.key, generation, state.applied_generation
                );
                return LoadOutcome::Stale;
            }
            let tabs = state.workspace.replace_all(snapshot.into_payloads());
            state.applied_generation = generation;
            self.persist_local(&state);
            tabs
        };

        info!(
            "event=sync_load module=sync status=ok key={} found=true tabs={}",
            self.inner.key, tabs
        );
        let (terminator, success_ms) = match context {
            LoadContext::Startup => ("", 2000),
            LoadContext::Explicit => (".", 3000),
        };
        if tabs > 0 {
            let noun = if tabs == 1 { "tab" } else { "tabs" };
            self.notify(
                NotifyLevel::Success,
                &format!("Loaded {tabs} production {noun} from server{terminator}"),
                ms(success_ms),
            );
        } else {
            self.notify(
                NotifyLevel::Warning,
                &format!("Server data was loaded but contained no production tabs{terminator}"),
                ms(3000),
            );
        }
        LoadOutcome::Loaded { tabs }
    }

    /// Applies `op`; when it reports a change, persists locally and re-arms
    /// the debounce timer.
    fn mutate<R>(&self, op: impl FnOnce(&mut Workspace) -> Option<R>) -> Option<R> {
        let mut state = self.inner.state.lock();
        let result = op(&mut state.workspace)?;
        self.after_mutation(&mut state);
        Some(result)
    }

    /// Local persist first, then the debounced remote request.
    fn after_mutation(&self, state: &mut SyncState) {
        self.persist_local(state);
        self.arm_debounce(state);
    }

    fn persist_local(&self, state: &SyncState) {
        let snapshot = state.workspace.snapshot();
        self.inner
            .local
            .save(self.inner.key.as_str(), &snapshot.to_json());
    }

    fn arm_debounce(&self, state: &mut SyncState) {
        if !state.settings.enabled {
            return;
        }
        Self::cancel_timer(state);

        let Ok(runtime) = Handle::try_current() else {
            warn!(
                "event=autosave_arm module=sync status=skipped key={} reason=no_runtime",
                self.inner.key
            );
            return;
        };

        state.next_timer_id += 1;
        let id = state.next_timer_id;
        let delay = state.settings.delay();
        let coordinator = self.clone();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            coordinator.fire_debounce(id).await;
        });
        state.debounce = Some(DebounceTimer { id, handle });
        debug!(
            "event=autosave_arm module=sync status=ok key={} timer_id={} delay_ms={}",
            self.inner.key,
            id,
            delay.as_millis()
        );
    }

    async fn fire_debounce(&self, id: u64) {
        {
            let mut state = self.inner.state.lock();
            if state.debounce.as_ref().map(|timer| timer.id) != Some(id) {
                return;
            }
            state.debounce = None;
        }
        // The slot is cleared, so re-arming from here on cannot abort this save.
        self.perform_remote_save(SaveTrigger::AutoSave).await;
    }

    fn cancel_timer(state: &mut SyncState) -> bool {
        match state.debounce.take() {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    fn notify(&self, level: NotifyLevel, message: &str, duration: Duration) {
        self.inner.notifier.notify(level, message, duration);
    }
}
