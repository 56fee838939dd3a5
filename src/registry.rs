//! Sport plugin registry.
//!
//! Maps the statically known sport ids to lazily constructed plugin
//! instances and owns the single "currently active plugin" slot. Loading is
//! memoized per id; activation runs the lifecycle hooks in a fixed order:
//!
//! ```text
//!  activate(id)
//!     │  previous plugin's on_deactivate (awaited first)
//!     │  loader() + on_load             (at most once per id)
//!     │  on_activate
//!     ▼
//!  active slot ← id        (skipped when a later activate superseded us)
//! ```
//!
//! Overlapping activations are resolved by a generation counter: in-flight
//! loads and hooks are never aborted, but a stale request's resolution is
//! discarded without touching the active slot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use semver::Version;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::error::RegistryError;
use crate::models::{PluginManifest, SportId};
use crate::plugins::SportPlugin;

/// No-argument async constructor for a plugin instance. Invoked at most
/// once per id for the lifetime of the registry.
pub type PluginLoader =
    Box<dyn Fn() -> BoxFuture<'static, anyhow::Result<Arc<dyn SportPlugin>>> + Send + Sync>;

/// Lifecycle state of one registered plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Registered,
    Loading,
    Active,
    Inactive,
    /// Load or activation failed; a later activate() retries
    Error,
}

struct RegistryEntry {
    manifest: PluginManifest,
    loader: PluginLoader,
    /// Memoized instance; stays empty after a failed load so retries re-run
    /// the loader, and stays filled after a failed activation so retries
    /// skip re-loading.
    cell: OnceCell<Arc<dyn SportPlugin>>,
}

#[derive(Default)]
struct RegistryState {
    /// Monotonic activation-request token; stale requests compare against it
    generation: u64,
    active: Option<SportId>,
    status: HashMap<SportId, PluginState>,
}

/// Registry of sport plugins with a single active slot.
///
/// The mutex guards only the slot, the per-id status map and the generation
/// counter; it is never held across an await, so lifecycle hooks and loader
/// futures interleave freely on the runtime.
pub struct SportRegistry {
    entries: Vec<RegistryEntry>,
    core: Version,
    state: Mutex<RegistryState>,
}

impl SportRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            core: Version::parse(env!("CARGO_PKG_VERSION")).expect("crate version is valid semver"),
            state: Mutex::new(RegistryState::default()),
        }
    }

    fn entry(&self, id: SportId) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.manifest.id == id)
    }

    /// Register a plugin. Manifest ids must be unique, and the manifest's
    /// core-version requirement must match this build.
    pub fn register(
        &mut self,
        manifest: PluginManifest,
        loader: PluginLoader,
    ) -> Result<(), RegistryError> {
        let id = manifest.id;
        if self.entry(id).is_some() {
            return Err(RegistryError::Duplicate(id));
        }
        if !manifest.core_version.matches(&self.core) {
            return Err(RegistryError::Incompatible {
                id,
                requirement: manifest.core_version.clone(),
                core: self.core.clone(),
            });
        }
        self.state
            .lock()
            .unwrap()
            .status
            .insert(id, PluginState::Registered);
        self.entries.push(RegistryEntry {
            manifest,
            loader,
            cell: OnceCell::new(),
        });
        debug!(plugin = %id, "plugin registered");
        Ok(())
    }

    /// Manifests of every registered plugin, in registration order. Never
    /// triggers a load.
    pub fn manifests(&self) -> impl Iterator<Item = &PluginManifest> + '_ {
        self.entries.iter().map(|e| &e.manifest)
    }

    /// Same sequence restricted to an allow-list of ids; pure filter, no
    /// registry state involved.
    pub fn manifests_for(&self, enabled: &[SportId]) -> Vec<&PluginManifest> {
        self.manifests()
            .filter(|m| enabled.contains(&m.id))
            .collect()
    }

    pub fn state_of(&self, id: SportId) -> Option<PluginState> {
        self.state.lock().unwrap().status.get(&id).copied()
    }

    pub fn active_id(&self) -> Option<SportId> {
        self.state.lock().unwrap().active
    }

    /// The currently active plugin instance, if any
    pub fn active(&self) -> Option<Arc<dyn SportPlugin>> {
        let id = self.active_id()?;
        self.entry(id).and_then(|e| e.cell.get()).cloned()
    }

    /// Make `id` the active plugin, loading it first if it never loaded.
    ///
    /// Re-activating the already-active id is a no-op that returns the
    /// cached instance without re-running hooks. If a later `activate` call
    /// for a different id supersedes this one while its loader or hooks are
    /// in flight, this call still resolves with the built instance but the
    /// active slot is left to the winner.
    pub async fn activate(&self, id: SportId) -> Result<Arc<dyn SportPlugin>, RegistryError> {
        let entry = self.entry(id).ok_or(RegistryError::UnknownPlugin(id))?;

        let token = {
            let mut st = self.state.lock().unwrap();
            if st.active == Some(id) && st.status.get(&id) == Some(&PluginState::Active) {
                if let Some(plugin) = entry.cell.get() {
                    return Ok(plugin.clone());
                }
            }
            st.generation += 1;
            st.generation
        };

        // The outgoing plugin is deactivated to completion before the
        // replacement's load or activation proceeds. Claiming Inactive under
        // the lock keeps a second overlapping activate() from running the
        // hook twice.
        let outgoing = {
            let mut st = self.state.lock().unwrap();
            match st.active {
                Some(prev) if prev != id && st.status.get(&prev) == Some(&PluginState::Active) => {
                    st.status.insert(prev, PluginState::Inactive);
                    self.entry(prev)
                        .and_then(|e| e.cell.get())
                        .cloned()
                        .map(|p| (prev, p))
                }
                _ => None,
            }
        };
        if let Some((prev, plugin)) = outgoing {
            if let Err(err) = plugin.on_deactivate().await {
                // A failed deactivation must not block the switch.
                warn!(plugin = %prev, error = %err, "deactivation hook failed");
            } else {
                debug!(plugin = %prev, "plugin deactivated");
            }
        }

        let plugin = self.load(entry, id).await?;

        if self.is_stale(token) {
            debug!(plugin = %id, "activation superseded before its hook ran");
            self.mark_inactive(id);
            return Ok(plugin);
        }

        if let Err(err) = plugin.on_activate().await {
            error!(plugin = %id, error = %err, "activation hook failed");
            self.state
                .lock()
                .unwrap()
                .status
                .insert(id, PluginState::Error);
            return Err(RegistryError::Activation { id, source: err });
        }

        let mut st = self.state.lock().unwrap();
        if st.generation == token {
            st.active = Some(id);
            st.status.insert(id, PluginState::Active);
            info!(plugin = %id, "plugin active");
        } else {
            // Superseded while the hook ran; the winner owns the slot.
            st.status.insert(id, PluginState::Inactive);
            debug!(plugin = %id, "stale activation result discarded");
        }
        Ok(plugin)
    }

    async fn load(
        &self,
        entry: &RegistryEntry,
        id: SportId,
    ) -> Result<Arc<dyn SportPlugin>, RegistryError> {
        if let Some(plugin) = entry.cell.get() {
            return Ok(plugin.clone());
        }

        self.state
            .lock()
            .unwrap()
            .status
            .insert(id, PluginState::Loading);

        let result = entry
            .cell
            .get_or_try_init(|| async {
                let plugin = (entry.loader)().await?;
                plugin.on_load().await?;
                debug!(plugin = %id, "plugin loaded");
                Ok::<_, anyhow::Error>(plugin)
            })
            .await;

        match result {
            Ok(plugin) => {
                let mut st = self.state.lock().unwrap();
                if st.status.get(&id) == Some(&PluginState::Loading) {
                    st.status.insert(id, PluginState::Inactive);
                }
                Ok(plugin.clone())
            }
            Err(source) => {
                error!(plugin = %id, error = %source, "plugin load failed");
                self.state
                    .lock()
                    .unwrap()
                    .status
                    .insert(id, PluginState::Error);
                Err(RegistryError::Load { id, source })
            }
        }
    }

    fn is_stale(&self, token: u64) -> bool {
        self.state.lock().unwrap().generation != token
    }

    fn mark_inactive(&self, id: SportId) {
        self.state
            .lock()
            .unwrap()
            .status
            .insert(id, PluginState::Inactive);
    }

    /// Deactivate the active plugin and unload every loaded one. Hook
    /// failures are logged and do not stop the teardown.
    pub async fn shutdown(&self) {
        let active = {
            let mut st = self.state.lock().unwrap();
            let active = st.active.take();
            if let Some(id) = active {
                st.status.insert(id, PluginState::Inactive);
            }
            st.generation += 1;
            active
        };
        if let Some(id) = active {
            if let Some(plugin) = self.entry(id).and_then(|e| e.cell.get()) {
                if let Err(err) = plugin.on_deactivate().await {
                    warn!(plugin = %id, error = %err, "deactivation hook failed during shutdown");
                }
            }
        }
        for entry in &self.entries {
            if let Some(plugin) = entry.cell.get() {
                if let Err(err) = plugin.on_unload().await {
                    warn!(plugin = %entry.manifest.id, error = %err, "unload hook failed");
                }
            }
        }
        info!("registry shut down");
    }
}

impl Default for SportRegistry {
    fn default() -> Self {
        Self::new()
    }
}
