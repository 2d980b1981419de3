//! Pooled dialog records and validated references to them
//!
//! A [`DialogLeg`] is owned by the registry pool and recycled. Code outside
//! the registry holds [`DialogRef`]s: the record plus the generation that was
//! current when the reference was produced. Lookups release the registry lock
//! before returning, so a reference is only trusted after [`DialogRef::lock`]
//! has re-checked the generation under the dialog-level lock.
//!
//! Lock order: dialog lock, then registry lock, then the identity and status
//! locks. Those two are leaves and are never held while acquiring another
//! lock. Lifecycle state lives behind the status lock so registry probes can
//! read it without taking the dialog lock.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::{debug, warn};

use crate::errors::{RegistryError, RegistryResult};
use crate::headers::{PartyHeader, SipMessage};
use super::dialog_state::{DialogState, ReferState};
use super::direction::DialogDirection;
use super::generation::{GenerationId, RELEASED_GENERATION};
use super::identity::DialogIdentity;

/// Lifecycle fields of a record. Written only under the dialog-level lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegStatus {
    /// Lifecycle state
    pub state: DialogState,
    /// REFER state
    pub refer_state: ReferState,
}

/// State guarded by the dialog-level lock
#[derive(Debug, Default)]
pub(crate) struct LegControl {
    pub(crate) is_refer: bool,
    pub(crate) created_notified: bool,
    pub(crate) received_message: Option<Arc<dyn SipMessage>>,
    pub(crate) active_transaction: Option<String>,
}

impl LegControl {
    pub(crate) fn clear(&mut self) {
        *self = LegControl::default();
    }
}

/// A dialog record (call leg) owned by the registry pool
pub struct DialogLeg {
    slot: usize,
    generation: AtomicI32,
    last_generation: AtomicI32,
    control: Mutex<LegControl>,
    status: RwLock<LegStatus>,
    identity: RwLock<DialogIdentity>,
}

impl DialogLeg {
    pub(crate) fn new(slot: usize, direction: DialogDirection) -> Self {
        Self {
            slot,
            generation: AtomicI32::new(RELEASED_GENERATION),
            last_generation: AtomicI32::new(RELEASED_GENERATION),
            control: Mutex::new(LegControl::default()),
            status: RwLock::new(LegStatus::default()),
            identity: RwLock::new(DialogIdentity::new(direction)),
        }
    }

    /// Pool slot of this record
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Current generation, zero while the record sits in the pool
    pub fn generation(&self) -> GenerationId {
        self.generation.load(Ordering::Acquire)
    }

    /// Most recent non-zero generation
    pub(crate) fn last_generation(&self) -> GenerationId {
        self.last_generation.load(Ordering::Acquire)
    }

    pub(crate) fn set_generation(&self, generation: GenerationId) {
        if generation != RELEASED_GENERATION {
            self.last_generation.store(generation, Ordering::Release);
        }
        self.generation.store(generation, Ordering::Release);
    }

    pub(crate) fn identity(&self) -> &RwLock<DialogIdentity> {
        &self.identity
    }

    /// Copy of the lifecycle fields, readable without the dialog lock
    pub fn status(&self) -> LegStatus {
        *self.status.read()
    }

    /// Copy of the identity fields
    pub fn identity_snapshot(&self) -> DialogIdentity {
        self.identity.read().clone()
    }
}

impl fmt::Debug for DialogLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogLeg")
            .field("slot", &self.slot)
            .field("generation", &self.generation())
            .finish()
    }
}

/// Reference to a dialog record, pinned to one generation
#[derive(Clone)]
pub struct DialogRef {
    leg: Arc<DialogLeg>,
    generation: GenerationId,
}

impl DialogRef {
    pub(crate) fn new(leg: Arc<DialogLeg>, generation: GenerationId) -> Self {
        Self { leg, generation }
    }

    pub(crate) fn leg(&self) -> &Arc<DialogLeg> {
        &self.leg
    }

    /// Generation captured when this reference was produced
    pub fn generation(&self) -> GenerationId {
        self.generation
    }

    /// Pool slot of the referenced record
    pub fn slot(&self) -> usize {
        self.leg.slot()
    }

    /// Lock-free check that the record was not reset or released since
    pub fn is_current(&self) -> bool {
        self.generation != RELEASED_GENERATION && self.leg.generation() == self.generation
    }

    /// Whether both references point at the same pool record, any generation
    pub fn same_record(&self, other: &DialogRef) -> bool {
        Arc::ptr_eq(&self.leg, &other.leg)
    }

    /// Acquire the dialog-level lock.
    ///
    /// Returns `None` when the record was reset or released after this
    /// reference was taken; treat that exactly like "not found".
    pub fn lock(&self) -> Option<DialogGuard<'_>> {
        let control = self.leg.control.lock();
        let current = self.leg.generation();
        if current != self.generation || current == RELEASED_GENERATION {
            warn!(
                slot = self.leg.slot(),
                expected = self.generation,
                current,
                "Dialog record was reused or released, reference is stale"
            );
            return None;
        }
        Some(DialogGuard {
            leg: &self.leg,
            control,
            generation: self.generation,
        })
    }

    /// Same generation and not terminated
    pub fn verify_validity(&self) -> bool {
        match self.lock() {
            Some(guard) => !guard.state().is_terminated(),
            None => false,
        }
    }

    /// Copy of the identity fields, regardless of generation
    pub fn identity_snapshot(&self) -> DialogIdentity {
        self.leg.identity_snapshot()
    }
}

impl PartialEq for DialogRef {
    fn eq(&self, other: &Self) -> bool {
        self.same_record(other) && self.generation == other.generation
    }
}

impl Eq for DialogRef {}

impl fmt::Debug for DialogRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogRef")
            .field("slot", &self.leg.slot())
            .field("generation", &self.generation)
            .field("current", &self.is_current())
            .finish()
    }
}

/// Exclusive, validated access to a dialog record
pub struct DialogGuard<'a> {
    leg: &'a Arc<DialogLeg>,
    control: MutexGuard<'a, LegControl>,
    generation: GenerationId,
}

impl<'a> DialogGuard<'a> {
    pub(crate) fn leg(&self) -> &Arc<DialogLeg> {
        self.leg
    }

    pub(crate) fn control_mut(&mut self) -> &mut LegControl {
        &mut self.control
    }

    pub(crate) fn set_generation(&mut self, generation: GenerationId) {
        self.generation = generation;
    }

    /// Back to `Idle` with no REFER and no creation notification
    pub(crate) fn clear_lifecycle(&mut self) {
        self.control.clear();
        *self.leg.status.write() = LegStatus::default();
    }

    /// Generation this guard was validated against
    pub fn generation(&self) -> GenerationId {
        self.generation
    }

    /// Pool slot of the record
    pub fn slot(&self) -> usize {
        self.leg.slot()
    }

    /// A fresh reference to the record at the guarded generation
    pub fn dialog_ref(&self) -> DialogRef {
        DialogRef::new(self.leg.clone(), self.generation)
    }

    /// Lifecycle state
    pub fn state(&self) -> DialogState {
        self.leg.status.read().state
    }

    /// Change the lifecycle state
    pub fn set_state(&mut self, state: DialogState) {
        let mut status = self.leg.status.write();
        debug!(slot = self.leg.slot(), from = %status.state, to = %state, "Dialog state change");
        status.state = state;
    }

    /// REFER state
    pub fn refer_state(&self) -> ReferState {
        self.leg.status.read().refer_state
    }

    /// Change the REFER state
    pub fn set_refer_state(&mut self, refer_state: ReferState) {
        self.leg.status.write().refer_state = refer_state;
    }

    /// Whether the record was created by a REFER
    pub fn is_refer(&self) -> bool {
        self.control.is_refer
    }

    /// Mark the record as created by a REFER
    pub fn set_refer(&mut self, is_refer: bool) {
        self.control.is_refer = is_refer;
    }

    /// Message that triggered the creation callback, only set during the callback
    pub fn received_message(&self) -> Option<Arc<dyn SipMessage>> {
        self.control.received_message.clone()
    }

    /// Transaction active during the creation callback
    pub fn active_transaction(&self) -> Option<&str> {
        self.control.active_transaction.as_deref()
    }

    /// Copy of the identity fields
    pub fn identity(&self) -> DialogIdentity {
        self.leg.identity().read().clone()
    }

    /// Direction of the dialog
    pub fn direction(&self) -> DialogDirection {
        self.leg.identity().read().direction
    }

    /// Whether the record only anchors a subscription
    pub fn is_hidden(&self) -> bool {
        self.leg.identity().read().is_hidden
    }

    /// Whether the record is an original (non-forked) dialog
    pub fn is_original(&self) -> bool {
        self.leg.identity().read().is_original
    }

    /// Whether the record is linked into the hash index
    pub fn is_linked(&self) -> bool {
        self.leg.identity().read().is_linked()
    }

    /// Call-ID
    pub fn call_id(&self) -> Option<Arc<str>> {
        self.leg.identity().read().call_id.clone()
    }

    /// Local tag
    pub fn local_tag(&self) -> Option<Arc<str>> {
        self.leg.identity().read().local_party().tag_handle()
    }

    /// Remote tag
    pub fn remote_tag(&self) -> Option<Arc<str>> {
        self.leg.identity().read().remote_party().tag_handle()
    }

    /// Mark the record original or forked. Only allowed before insertion.
    pub fn set_original(&mut self, is_original: bool) -> RegistryResult<()> {
        self.update_unlinked("original flag", |identity| identity.is_original = is_original)
    }

    /// Set the Call-ID. Only allowed before insertion.
    pub fn set_call_id(&mut self, call_id: impl Into<Arc<str>>) -> RegistryResult<()> {
        let call_id = call_id.into();
        self.update_unlinked("Call-ID", |identity| identity.call_id = Some(call_id))
    }

    /// Set the From header. Only allowed before insertion.
    pub fn set_from(&mut self, from: PartyHeader) -> RegistryResult<()> {
        self.update_unlinked("From header", |identity| identity.from = from)
    }

    /// Set the To header. Only allowed before insertion.
    pub fn set_to(&mut self, to: PartyHeader) -> RegistryResult<()> {
        self.update_unlinked("To header", |identity| identity.to = to)
    }

    /// Set the local tag. Only allowed before insertion.
    pub fn set_local_tag(&mut self, tag: impl Into<Arc<str>>) -> RegistryResult<()> {
        let tag = tag.into();
        self.update_unlinked("local tag", |identity| identity.local_party_mut().set_tag(tag))
    }

    /// Set the remote tag.
    ///
    /// Allowed at any time while the remote tag is absent. Once present it
    /// identifies the dialog and can only be set again to the same value.
    pub fn set_remote_tag(&mut self, tag: impl Into<Arc<str>>) -> RegistryResult<()> {
        let tag: Arc<str> = tag.into();
        let mut identity = self.leg.identity().write();
        match identity.remote_party().tag() {
            Some(existing) if existing != &*tag => Err(RegistryError::illegal_action(format!(
                "dialog in slot {} already has remote tag '{}', refusing '{}'",
                self.leg.slot(),
                existing,
                tag
            ))),
            _ => {
                identity.remote_party_mut().set_tag(tag);
                Ok(())
            }
        }
    }

    /// Record that the peer answered without a tag (RFC 2543), so the absent
    /// remote tag is treated as a real empty tag from now on
    pub fn mark_remote_empty_tag(&mut self) {
        let mut identity = self.leg.identity().write();
        if !identity.remote_party().has_tag() {
            identity.remote_party_mut().set_empty_tag(true);
        }
    }

    fn update_unlinked(
        &mut self,
        what: &str,
        update: impl FnOnce(&mut DialogIdentity),
    ) -> RegistryResult<()> {
        let mut identity = self.leg.identity().write();
        if identity.is_linked() {
            return Err(RegistryError::illegal_action(format!(
                "cannot change {} of dialog in slot {} while it is in the hash",
                what,
                self.leg.slot()
            )));
        }
        update(&mut identity);
        Ok(())
    }
}

impl fmt::Debug for DialogGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogGuard")
            .field("slot", &self.leg.slot())
            .field("generation", &self.generation)
            .field("state", &self.state())
            .finish()
    }
}
