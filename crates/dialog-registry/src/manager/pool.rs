//! Bounded pool of dialog records and its usage counters

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::config::RegistryConfig;
use crate::dialog::{DialogDirection, DialogLeg};
use crate::errors::{RegistryError, RegistryResult};

/// Usage of one bounded resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUsage {
    /// Currently allocated
    pub in_use: usize,
    /// Configured maximum
    pub max: usize,
    /// Highest `in_use` since construction or the last reset
    pub max_usage: usize,
}

impl ResourceUsage {
    fn new(max: usize) -> Self {
        Self {
            in_use: 0,
            max,
            max_usage: 0,
        }
    }

    fn is_exhausted(&self) -> bool {
        self.in_use >= self.max
    }
}

impl fmt::Display for ResourceUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} (peak {})", self.in_use, self.max, self.max_usage)
    }
}

/// Snapshot of the registry's resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryResources {
    /// Normal (INVITE) dialogs
    pub dialogs: ResourceUsage,
    /// Hidden dialogs
    pub hidden_dialogs: ResourceUsage,
    /// Records linked into the hash index
    pub hash_entries: usize,
    /// Hash index bucket count
    pub hash_buckets: usize,
}

/// Records plus the free list and counters guarding them
#[derive(Debug)]
pub(crate) struct LegPool {
    legs: Vec<Arc<DialogLeg>>,
    free: Vec<usize>,
    dialogs: ResourceUsage,
    hidden_dialogs: ResourceUsage,
}

impl LegPool {
    pub(crate) fn new(config: &RegistryConfig) -> Self {
        let total = config.total_capacity();
        Self {
            legs: (0..total)
                .map(|slot| Arc::new(DialogLeg::new(slot, DialogDirection::Outgoing)))
                .collect(),
            // pop() hands out slot 0 first
            free: (0..total).rev().collect(),
            dialogs: ResourceUsage::new(config.max_dialogs),
            hidden_dialogs: ResourceUsage::new(config.effective_hidden_capacity()),
        }
    }

    fn usage_mut(&mut self, hidden: bool) -> &mut ResourceUsage {
        if hidden {
            &mut self.hidden_dialogs
        } else {
            &mut self.dialogs
        }
    }

    /// Fail when the counter for this kind of dialog is at its maximum
    pub(crate) fn check_counters(&self, hidden: bool) -> RegistryResult<()> {
        let (usage, resource) = if hidden {
            (&self.hidden_dialogs, "hidden dialogs")
        } else {
            (&self.dialogs, "dialogs")
        };
        if usage.is_exhausted() {
            error!(resource, usage = %usage, "Dialog capacity exhausted");
            return Err(RegistryError::out_of_resources(
                resource,
                format!("all {} records are in use", usage.max),
            ));
        }
        Ok(())
    }

    /// Add `delta` to the counter. Going below zero is an invariant violation.
    pub(crate) fn update_counters(&mut self, hidden: bool, delta: isize) -> RegistryResult<()> {
        let usage = self.usage_mut(hidden);
        let updated = usage.in_use.checked_add_signed(delta).ok_or_else(|| {
            RegistryError::invariant_violation(format!(
                "{} counter would become negative ({} {:+})",
                if hidden { "hidden dialog" } else { "dialog" },
                usage.in_use,
                delta
            ))
        })?;
        usage.in_use = updated;
        usage.max_usage = usage.max_usage.max(updated);
        Ok(())
    }

    pub(crate) fn allocate(&mut self) -> Option<Arc<DialogLeg>> {
        let slot = self.free.pop()?;
        self.legs.get(slot).cloned()
    }

    pub(crate) fn free(&mut self, leg: &DialogLeg) -> RegistryResult<()> {
        let slot = leg.slot();
        if slot >= self.legs.len() || self.free.contains(&slot) {
            return Err(RegistryError::invariant_violation(format!(
                "dialog record {} returned to the pool twice",
                slot
            )));
        }
        self.free.push(slot);
        Ok(())
    }

    pub(crate) fn usage(&self) -> (ResourceUsage, ResourceUsage) {
        (self.dialogs, self.hidden_dialogs)
    }

    pub(crate) fn reset_max_usage(&mut self) {
        self.dialogs.max_usage = self.dialogs.in_use;
        self.hidden_dialogs.max_usage = self.hidden_dialogs.in_use;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_bound_each_kind() {
        let config = RegistryConfig::new(1).with_hidden_dialogs(1);
        let mut pool = LegPool::new(&config);

        pool.check_counters(false).unwrap();
        pool.update_counters(false, 1).unwrap();
        assert!(pool.check_counters(false).unwrap_err().is_capacity_error());
        pool.check_counters(true).unwrap();

        pool.update_counters(false, -1).unwrap();
        let (dialogs, _) = pool.usage();
        assert_eq!(dialogs.in_use, 0);
        assert_eq!(dialogs.max_usage, 1);

        pool.reset_max_usage();
        assert_eq!(pool.usage().0.max_usage, 0);
    }

    #[test]
    fn test_negative_counter_is_invariant_violation() {
        let mut pool = LegPool::new(&RegistryConfig::new(2));
        let err = pool.update_counters(false, -1).unwrap_err();
        assert!(matches!(err, RegistryError::Internal { .. }));
        assert_eq!(pool.usage().0.in_use, 0);
    }

    #[test]
    fn test_free_rejects_double_return() {
        let mut pool = LegPool::new(&RegistryConfig::new(2));
        let leg = pool.allocate().unwrap();
        assert_eq!(leg.slot(), 0);
        pool.free(&leg).unwrap();
        assert!(pool.free(&leg).is_err());
    }
}
