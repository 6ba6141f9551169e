use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use cyanbar_shared_util::SlotName;

use crate::error::{ProviderError, RegistryError};

/// A function that computes the current display text of a slot.
pub type ProviderFn = Box<dyn Fn() -> Result<String, ProviderError> + Send + Sync + 'static>;

/// What a slot shows after its provider failed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep showing the last successfully computed value.
    #[default]
    KeepStale,
    /// Show nothing until the provider succeeds again.
    Blank,
    /// Show a fixed marker instead of the value.
    Marker(String),
}

#[derive(Debug, Default)]
struct SlotState {
    last_value: Option<String>,
    hidden: bool,
    /// Set once the provider ran at least once, successful or not.
    initialized: bool,
}

/// The cached value of one provider.
/// Reading the cache never invokes the provider, except for the very first render of a slot that was never updated.
pub struct CacheSlot {
    name: SlotName,
    provider: ProviderFn,
    interactive: bool,
    on_failure: FailurePolicy,
    state: Mutex<SlotState>,
    /// Serializes the implicit first update, so concurrent first renders run the provider only once.
    init_lock: Mutex<()>,
}

impl std::fmt::Debug for CacheSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSlot")
            .field("name", &self.name)
            .field("interactive", &self.interactive)
            .field("on_failure", &self.on_failure)
            .field("state", &*self.lock_state())
            .finish()
    }
}

impl CacheSlot {
    pub fn new<F>(name: impl Into<SlotName>, provider: F) -> Self
    where
        F: Fn() -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        CacheSlot {
            name: name.into(),
            provider: Box::new(provider),
            interactive: false,
            on_failure: FailurePolicy::default(),
            state: Mutex::new(SlotState::default()),
            init_lock: Mutex::new(()),
        }
    }

    /// Mark this slot as interactive. Interactive slots manage their own refreshes and are skipped by the heartbeat.
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    pub fn name(&self) -> &SlotName {
        &self.name
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn lock_state(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the provider and replace the cached value.
    /// The provider runs without holding the slot lock, the result is stored in one step.
    pub fn update(&self) {
        let result = (self.provider)();
        let mut state = self.lock_state();
        state.initialized = true;
        match result {
            Ok(value) => state.last_value = Some(value),
            Err(err) => {
                log::warn!("Failed to update `{}`: {}", self.name, err);
                match &self.on_failure {
                    FailurePolicy::KeepStale => {}
                    FailurePolicy::Blank => state.last_value = None,
                    FailurePolicy::Marker(marker) => state.last_value = Some(marker.clone()),
                }
            }
        }
    }

    /// Get the cached value, or an empty string if the slot is hidden.
    pub fn render(&self) -> String {
        {
            let state = self.lock_state();
            if state.hidden {
                return String::new();
            }
            if state.initialized {
                return state.last_value.clone().unwrap_or_default();
            }
        }
        self.ensure_initialized();
        let state = self.lock_state();
        if state.hidden {
            String::new()
        } else {
            state.last_value.clone().unwrap_or_default()
        }
    }

    fn ensure_initialized(&self) {
        let _guard = self.init_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let initialized = self.lock_state().initialized;
        if !initialized {
            log::debug!("Computing initial value of `{}`", self.name);
            self.update();
        }
    }

    pub fn hide(&self) {
        self.lock_state().hidden = true;
    }

    pub fn unhide(&self) {
        self.lock_state().hidden = false;
    }

    pub fn is_hidden(&self) -> bool {
        self.lock_state().hidden
    }
}

/// All slots of the bar, in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    slots: RwLock<Vec<Arc<CacheSlot>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, slot: CacheSlot) -> Result<(), RegistryError> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if slots.iter().any(|existing| existing.name == slot.name) {
            return Err(RegistryError::DuplicateSlot(slot.name));
        }
        log::debug!("Registered slot `{}`", slot.name);
        slots.push(Arc::new(slot));
        Ok(())
    }

    pub fn slot(&self, name: &str) -> Result<Arc<CacheSlot>, RegistryError> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|slot| slot.name == name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownSlot(SlotName::from(name)))
    }

    pub fn names(&self) -> Vec<SlotName> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).iter().map(|slot| slot.name.clone()).collect()
    }

    pub fn update(&self, name: &str) -> Result<(), RegistryError> {
        self.slot(name)?.update();
        Ok(())
    }

    /// Render a single slot. Unknown slots render as an empty string.
    pub fn render(&self, name: &str) -> String {
        self.slot(name).map(|slot| slot.render()).unwrap_or_default()
    }

    pub fn hide(&self, name: &str) -> Result<(), RegistryError> {
        self.slot(name)?.hide();
        Ok(())
    }

    pub fn unhide(&self, name: &str) -> Result<(), RegistryError> {
        self.slot(name)?.unhide();
        Ok(())
    }

    /// Update every slot that is not interactive.
    pub fn update_passive(&self) {
        // Clone the list so providers run without holding the registry lock.
        let slots: Vec<_> = self.slots.read().unwrap_or_else(PoisonError::into_inner).clone();
        for slot in slots.iter().filter(|slot| !slot.interactive) {
            slot.update();
        }
    }
}
