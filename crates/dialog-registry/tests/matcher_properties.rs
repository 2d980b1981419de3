//! Property tests for the dialog matching policies

use proptest::prelude::*;
use rvoip_dialog_registry::{
    DialogDirection, DialogIdentity, DialogKey, DialogMatcher, PartyHeader, TransactionKey,
};

fn party(tag: &Option<String>) -> PartyHeader {
    match tag {
        Some(tag) => PartyHeader::with_tag_only(tag.as_str()),
        None => PartyHeader::default(),
    }
}

fn direction(outgoing: bool) -> DialogDirection {
    if outgoing {
        DialogDirection::Outgoing
    } else {
        DialogDirection::Incoming
    }
}

fn record(
    direction: DialogDirection,
    from: &Option<String>,
    to: &Option<String>,
) -> DialogIdentity {
    DialogIdentity::new(direction)
        .with_call_id("call@host")
        .with_from(party(from))
        .with_to(party(to))
}

// A tiny alphabet so equal tags actually occur
fn tag() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::sample::select(vec!["a", "b", "0"]).prop_map(String::from))
}

proptest! {
    /// Swapping the record's direction together with its From and To tags
    /// never changes the exact match outcome.
    #[test]
    fn exact_is_symmetric_under_direction_swap(
        key_outgoing in any::<bool>(),
        established_only in any::<bool>(),
        a1 in tag(),
        a2 in tag(),
        b1 in tag(),
        b2 in tag(),
    ) {
        let d1 = direction(key_outgoing);
        let d2 = d1.opposite();
        let tk = TransactionKey::new("call@host", party(&a1), party(&a2));
        let key = DialogKey::from_transaction_key(&tk, d1);
        let matcher = DialogMatcher::Exact { key: &key, established_only };

        let mut swapped = record(d2, &b2, &b1);
        let mut aligned = record(d1, &b1, &b2);
        prop_assert_eq!(
            matcher.matches(&mut swapped, true),
            matcher.matches(&mut aligned, true)
        );
    }

    /// With every tag known, exact matching is plain equality of the
    /// direction-aligned tag pairs.
    #[test]
    fn exact_with_known_tags_is_pair_equality(
        same_direction in any::<bool>(),
        a1 in "[a-c]{1,2}",
        a2 in "[a-c]{1,2}",
        b1 in "[a-c]{1,2}",
        b2 in "[a-c]{1,2}",
    ) {
        let key_direction = DialogDirection::Outgoing;
        let record_direction =
            if same_direction { key_direction } else { key_direction.opposite() };
        let tk = TransactionKey::new(
            "call@host",
            PartyHeader::with_tag_only(a1.as_str()),
            PartyHeader::with_tag_only(a2.as_str()),
        );
        let key = DialogKey::from_transaction_key(&tk, key_direction);
        let mut existing = record(record_direction, &Some(b1.clone()), &Some(b2.clone()));

        let expected = if same_direction {
            a1 == b1 && a2 == b2
        } else {
            a1 == b2 && a2 == b1
        };
        let matcher = DialogMatcher::Exact { key: &key, established_only: true };
        prop_assert_eq!(matcher.matches(&mut existing, true), expected);
    }
}
