//! Dialog matching policies
//!
//! Every policy reduces to one core comparison of Call-ID and tags, with a
//! direction-aware swap: when the lookup was made from the other side of the
//! dialog, the lookup's From tag is compared against the record's To tag and
//! the other way round (a UAC's local tag is the UAS's remote tag).
//!
//! ## Tag Rules
//!
//! The exact and original policies are lenient about tags nobody knows yet:
//!
//! - A record without a remote tag has not been answered. The lookup tag
//!   aligned with it is not compared, so an early record matches the first
//!   tagged response and early in-dialog requests from the callee.
//! - A lookup without a To tag (CANCEL, retransmitted INVITE) does not
//!   compare the record tag aligned with its To tag.
//!
//! Both rules are phrased in terms of the aligned pair, so swapping the
//! record's direction together with its From and To never changes the
//! outcome. Replaces matching is strict: an absent tag only equals an absent
//! tag, apart from the `"0"` wildcard.

use tracing::debug;

use crate::dialog::{DialogDirection, DialogIdentity};
use super::dialog_key::DialogKey;
use super::tag::{is_wildcard, tag_matches_record, tags_equal};

/// Matching policy applied to every record in the probed bucket
#[derive(Debug, Clone, Copy)]
pub enum DialogMatcher<'a> {
    /// General request and response matching
    Exact {
        /// Lookup key
        key: &'a DialogKey,
        /// Reject records that have no remote tag yet
        established_only: bool,
    },

    /// Outgoing original (non-forked) records, ignoring their remote tag
    Original {
        /// Lookup key
        key: &'a DialogKey,
    },

    /// Hidden records, compared like `Exact`
    Hidden {
        /// Lookup key
        key: &'a DialogKey,
    },

    /// Hidden records, compared like `Original`
    OriginalHidden {
        /// Lookup key
        key: &'a DialogKey,
    },

    /// Records named by a Replaces header (RFC 3891)
    Replaces {
        /// Key from [`DialogKey::from_replaces`]
        key: &'a DialogKey,
    },
}

/// The lookup side of one comparison
#[derive(Debug, Clone, Copy)]
struct Probe<'k> {
    direction: DialogDirection,
    from: Option<&'k str>,
    to: Option<&'k str>,
}

impl<'k> Probe<'k> {
    fn from_key(key: &'k DialogKey) -> Self {
        Self {
            direction: key.direction,
            from: key.from_tag(),
            to: key.to_tag(),
        }
    }
}

impl<'a> DialogMatcher<'a> {
    /// Call-ID used to pick the hash bucket
    pub fn call_id(&self) -> &str {
        match self {
            DialogMatcher::Exact { key, .. }
            | DialogMatcher::Original { key }
            | DialogMatcher::Hidden { key }
            | DialogMatcher::OriginalHidden { key }
            | DialogMatcher::Replaces { key } => &*key.call_id,
        }
    }

    /// Policy name for logging
    pub fn name(&self) -> &'static str {
        match self {
            DialogMatcher::Exact { .. } => "exact",
            DialogMatcher::Original { .. } => "original",
            DialogMatcher::Hidden { .. } => "hidden",
            DialogMatcher::OriginalHidden { .. } => "original-hidden",
            DialogMatcher::Replaces { .. } => "replaces",
        }
    }

    /// Decide whether `existing` matches.
    ///
    /// `existing` is mutable because an `Exact` comparison against a record
    /// whose peer sends no tags (RFC 2543) permanently stores an explicit
    /// empty remote tag once a tagged message is compared against it.
    /// `empty_tag_accommodation` turns that behaviour on.
    pub fn matches(&self, existing: &mut DialogIdentity, empty_tag_accommodation: bool) -> bool {
        match *self {
            DialogMatcher::Exact { key, established_only } => {
                Self::match_exact(key, established_only, existing, empty_tag_accommodation)
            }
            DialogMatcher::Original { key } => Self::match_original(key, existing),
            DialogMatcher::Hidden { key } => {
                if !existing.is_hidden {
                    debug!("Hidden dialog match failed: not a hidden dialog");
                    return false;
                }
                Self::match_exact(key, false, existing, empty_tag_accommodation)
            }
            DialogMatcher::OriginalHidden { key } => {
                if !existing.is_hidden {
                    debug!("Original hidden dialog match failed: not a hidden dialog");
                    return false;
                }
                Self::match_original(key, existing)
            }
            DialogMatcher::Replaces { key } => Self::match_replaces(key, existing),
        }
    }

    fn match_exact(
        key: &DialogKey,
        established_only: bool,
        existing: &mut DialogIdentity,
        empty_tag_accommodation: bool,
    ) -> bool {
        if established_only && !existing.is_established(empty_tag_accommodation) {
            debug!("Exact dialog match failed: no remote tag, dialog not established");
            return false;
        }
        let probe = Probe::from_key(key);
        if empty_tag_accommodation {
            upgrade_empty_remote_tag(&probe, existing);
        }
        compare_identity(&key.call_id, probe, existing, TagPolicy::Lenient)
    }

    fn match_original(key: &DialogKey, existing: &DialogIdentity) -> bool {
        if existing.direction != DialogDirection::Outgoing {
            debug!("Original dialog match failed: not an outgoing dialog");
            return false;
        }
        if !existing.is_original {
            debug!("Original dialog match failed: not the original dialog");
            return false;
        }
        compare_identity(&key.call_id, Probe::from_key(key), existing, TagPolicy::IgnoreRemote)
    }

    fn match_replaces(key: &DialogKey, existing: &DialogIdentity) -> bool {
        let mut probe = Probe::from_key(key);
        // "0" stands in for a tag that was never sent
        match existing.direction {
            DialogDirection::Incoming => {
                if is_wildcard(probe.from) && !existing.from.has_tag() {
                    probe.from = None;
                }
            }
            DialogDirection::Outgoing => {
                if is_wildcard(probe.to) && !existing.from.has_tag() {
                    probe.to = None;
                }
            }
        }
        compare_identity(&key.call_id, probe, existing, TagPolicy::Strict)
    }
}

/// How unknown tags are treated by [`compare_identity`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagPolicy {
    /// Skip comparisons involving an unknown remote tag or lookup To tag
    Lenient,
    /// Like `Lenient`, with the record's remote tag treated as unknown
    IgnoreRemote,
    /// Compare every tag
    Strict,
}

/// Whether the record's remote tag lines up with the probe's To tag
fn remote_aligned_with_to(probe: &Probe<'_>, existing: &DialogIdentity) -> bool {
    let same_direction = probe.direction == existing.direction;
    (existing.direction == DialogDirection::Outgoing) == same_direction
}

/// Store an explicit empty remote tag on a record whose peer is known to
/// send none, once a lookup arrives that carries a real tag for that side
fn upgrade_empty_remote_tag(probe: &Probe<'_>, existing: &mut DialogIdentity) {
    let corresponding = if remote_aligned_with_to(probe, existing) { probe.to } else { probe.from };

    let remote = existing.remote_party_mut();
    if remote.has_tag() || !remote.empty_tag() {
        return;
    }
    if let Some(tag) = corresponding.filter(|tag| !tag.is_empty()) {
        debug!(lookup_tag = tag, "Storing empty remote tag for RFC 2543 dialog");
        remote.set_tag("");
    }
}

/// The comparison shared by every policy
fn compare_identity(
    call_id: &str,
    probe: Probe<'_>,
    existing: &DialogIdentity,
    policy: TagPolicy,
) -> bool {
    let (aligned_from, aligned_to) = if probe.direction == existing.direction {
        (&existing.from, &existing.to)
    } else {
        (&existing.to, &existing.from)
    };

    let remote_with_to = remote_aligned_with_to(&probe, existing);
    let remote_unknown = match policy {
        TagPolicy::IgnoreRemote => true,
        TagPolicy::Lenient | TagPolicy::Strict => !existing.remote_party().has_tag(),
    };
    let lenient = policy != TagPolicy::Strict;
    let skip_from = lenient && !remote_with_to && remote_unknown;
    let skip_to = lenient && ((remote_with_to && remote_unknown) || probe.to.is_none());

    if !skip_from && !tag_matches_record(probe.from, aligned_from) {
        debug!("Dialog match failed: different From tag");
        return false;
    }
    if !skip_to && !tag_matches_record(probe.to, aligned_to) {
        debug!("Dialog match failed: different To tag");
        return false;
    }
    if !tags_equal(Some(call_id), existing.call_id.as_deref()) {
        debug!("Dialog match failed: different Call-ID");
        return false;
    }
    true
}
