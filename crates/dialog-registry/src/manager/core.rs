//! Core DialogRegistry implementation
//!
//! The registry owns the record pool, its counters and the hash index, all
//! behind one mutex. Every operation holds that mutex for its whole critical
//! section and releases it before returning, so references handed back to
//! callers must be re-validated through [`DialogRef::lock`].

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::RegistryConfig;
use crate::dialog::generation::{next_generation, RELEASED_GENERATION};
use crate::dialog::{
    DialogDirection, DialogGuard, DialogIdentity, DialogLeg, DialogRef, GenerationId,
};
use crate::errors::{IndexError, RegistryError, RegistryResult};
use crate::events::DialogCreatedHandler;
use crate::routing::{DialogKey, DialogMatcher, HashIndex};
use super::pool::{LegPool, RegistryResources};

/// State guarded by the registry lock
#[derive(Debug)]
pub(crate) struct RegistryState {
    pub(crate) index: HashIndex<Arc<DialogLeg>>,
    pub(crate) pool: LegPool,
}

impl RegistryState {
    /// Unlink `leg` from the index if it is linked
    fn unlink(&mut self, leg: &DialogLeg) -> RegistryResult<()> {
        let mut identity = leg.identity().write();
        let Some(slot) = identity.hash_slot else {
            return Ok(());
        };
        let params = identity.params()?;
        identity.hash_slot = None;
        match self.index.remove(slot) {
            Some(_) => {
                debug!(
                    slot = leg.slot(),
                    bucket = slot.bucket(),
                    identity = %params,
                    "Dialog removed from hash"
                );
                Ok(())
            }
            None => Err(RegistryError::invariant_violation(format!(
                "dialog record {} points at hash slot {:?} that is not linked",
                leg.slot(),
                slot
            ))),
        }
    }
}

/// Registry of dialog records with RFC 3261 dialog matching
pub struct DialogRegistry {
    pub(crate) config: RegistryConfig,
    pub(crate) state: Mutex<RegistryState>,
    pub(crate) created_handler: RwLock<Option<Arc<dyn DialogCreatedHandler>>>,
}

impl fmt::Debug for DialogRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogRegistry")
            .field("config", &self.config)
            .field("created_handler", &self.created_handler.read().is_some())
            .finish()
    }
}

impl DialogRegistry {
    /// Create a registry sized from `config`.
    ///
    /// The pool and the hash index are allocated here and never grow.
    pub fn new(config: RegistryConfig) -> RegistryResult<Self> {
        config.validate()?;
        let index = HashIndex::new(config.total_capacity(), config.hash_bucket_count());
        let pool = LegPool::new(&config);
        info!(
            max_dialogs = config.max_dialogs,
            max_hidden_dialogs = config.effective_hidden_capacity(),
            buckets = index.bucket_count(),
            "Created dialog registry"
        );
        Ok(Self {
            config,
            state: Mutex::new(RegistryState { index, pool }),
            created_handler: RwLock::new(None),
        })
    }

    /// Configuration the registry was built with
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register the handler that [`DialogRegistry::notify_created`] calls
    pub fn set_created_handler(&self, handler: Arc<dyn DialogCreatedHandler>) {
        *self.created_handler.write() = Some(handler);
    }

    /// Allocate a record in the `Idle` state.
    ///
    /// Hidden records come from their own pool, which only exists when hidden
    /// dialogs are enabled.
    pub fn create_dialog(
        &self,
        direction: DialogDirection,
        hidden: bool,
    ) -> RegistryResult<DialogRef> {
        if hidden && !self.config.hidden_dialogs_enabled {
            return Err(RegistryError::illegal_action(
                "hidden dialog requested but hidden dialogs are disabled",
            ));
        }
        let identity = DialogIdentity::new(direction).hidden(hidden);
        let params = identity.params()?;

        let mut state = self.state.lock();
        state.pool.check_counters(hidden)?;
        let leg = state.pool.allocate().ok_or_else(|| {
            error!("Dialog pool exhausted below its configured capacity");
            RegistryError::out_of_resources("dialog pool", "no free dialog records")
        })?;
        if let Err(e) = state.pool.update_counters(hidden, 1) {
            state.pool.free(&leg)?;
            return Err(e);
        }

        *leg.identity().write() = identity;
        let generation = next_generation(leg.last_generation());
        leg.set_generation(generation);

        debug!(slot = leg.slot(), generation, identity = %params, hidden, "Created dialog record");
        Ok(DialogRef::new(leg, generation))
    }

    /// Link the record into the hash index under its current identity.
    ///
    /// A record that is already linked is left alone. Otherwise the bucket is
    /// probed with the exact matcher and an equal record makes the insert
    /// fail with `OutOfResources`; probe and insert happen under one lock.
    pub fn insert(&self, dialog: &DialogGuard<'_>) -> RegistryResult<()> {
        let leg = dialog.leg().clone();
        let mut state = self.state.lock();

        let (key, params, owned) = {
            let identity = leg.identity().read();
            (DialogKey::from_identity(&identity)?, identity.params()?, identity.hash_slot)
        };
        if owned.is_some() {
            debug!(slot = leg.slot(), "Dialog already in hash");
            return Ok(());
        }

        let matcher = DialogMatcher::Exact {
            key: &key,
            established_only: false,
        };
        let rfc2543 = self.config.rfc2543_compliant;
        let inserted = state.index.insert(&key.call_id, leg.clone(), owned, |other| {
            !Arc::ptr_eq(other, &leg) && matcher.matches(&mut other.identity().write(), rfc2543)
        });

        match inserted {
            Ok(slot) => {
                leg.identity().write().hash_slot = Some(slot);
                debug!(
                    slot = leg.slot(),
                    bucket = slot.bucket(),
                    identity = %params,
                    "Dialog inserted to hash"
                );
                Ok(())
            }
            Err(IndexError::AlreadyPresent) => {
                warn!(
                    slot = leg.slot(),
                    identity = %params,
                    "A dialog with the same identity is already in hash"
                );
                Err(IndexError::AlreadyPresent.into())
            }
            Err(IndexError::Full) => {
                error!(slot = leg.slot(), identity = %params, "Dialog hash is full");
                Err(IndexError::Full.into())
            }
        }
    }

    /// Unlink the record from the hash index. No-op when it is not linked.
    pub fn remove(&self, dialog: &DialogGuard<'_>) -> RegistryResult<()> {
        let mut state = self.state.lock();
        state.unlink(dialog.leg())
    }

    /// Return the record to `Idle` for reuse by a new dialog.
    ///
    /// The record leaves the hash, loses its identity and gets a fresh
    /// generation, so every reference taken before the reset is stale. It
    /// keeps its pool slot. Returns the new generation.
    pub fn reset(&self, dialog: &mut DialogGuard<'_>) -> RegistryResult<GenerationId> {
        let leg = dialog.leg().clone();
        let mut state = self.state.lock();
        state.unlink(&leg)?;
        leg.identity().write().clear();
        dialog.clear_lifecycle();

        let generation = next_generation(leg.generation());
        leg.set_generation(generation);
        dialog.set_generation(generation);
        debug!(slot = leg.slot(), generation, "Dialog record reset to idle");
        Ok(generation)
    }

    /// Destroy the dialog and return its record to the pool
    pub fn release(&self, mut dialog: DialogGuard<'_>) -> RegistryResult<()> {
        let leg = dialog.leg().clone();
        let mut state = self.state.lock();
        state.unlink(&leg)?;

        let hidden = leg.identity().read().is_hidden;
        state.pool.update_counters(hidden, -1)?;

        leg.identity().write().clear();
        dialog.clear_lifecycle();
        leg.set_generation(RELEASED_GENERATION);
        state.pool.free(&leg)?;
        debug!(slot = leg.slot(), hidden, "Dialog record released");
        Ok(())
    }

    /// Current and peak usage of the pools and the hash index
    pub fn resources(&self) -> RegistryResources {
        let state = self.state.lock();
        let (dialogs, hidden_dialogs) = state.pool.usage();
        RegistryResources {
            dialogs,
            hidden_dialogs,
            hash_entries: state.index.len(),
            hash_buckets: state.index.bucket_count(),
        }
    }

    /// Restart peak usage tracking from the current usage
    pub fn reset_max_usage(&self) {
        self.state.lock().pool.reset_max_usage();
    }
}
