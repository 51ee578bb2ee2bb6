//! Property tests for the LFN codec and error envelopes.

use proptest::prelude::*;

use kernel_planckster_core::envelope::{Attribute, Envelope, ErrorEnvelope, ErrorKind};
use kernel_planckster_core::lfn::{self, canonicalize, is_canonical, Lfn, MARKER};
use kernel_planckster_core::models::{EntityKind, Protocol, SourceKind};

fn entity_kind() -> impl Strategy<Value = EntityKind> {
    prop_oneof![
        Just(EntityKind::User),
        Just(EntityKind::KnowledgeSource),
        Just(EntityKind::SourceData),
        Just(EntityKind::ResearchContext),
        Just(EntityKind::Conversation),
        Just(EntityKind::Message),
        Just(EntityKind::Citation),
    ]
}

fn attribute() -> impl Strategy<Value = Attribute> {
    prop_oneof![Just(Attribute::Id), Just(Attribute::Sid)]
}

fn error_kind() -> impl Strategy<Value = ErrorKind> {
    prop_oneof![
        attribute().prop_map(ErrorKind::missing_attribute),
        (attribute(), any::<i64>()).prop_map(|(a, v)| ErrorKind::not_found(a, v)),
        (attribute(), any::<i64>(), "[a-z]{1,8}( [a-z]{1,8})?")
            .prop_map(|(a, v, m)| ErrorKind::missing_dependent_data(a, v, m)),
    ]
}

fn protocol() -> impl Strategy<Value = Protocol> {
    prop_oneof![Just(Protocol::S3), Just(Protocol::Nas), Just(Protocol::Local)]
}

fn source_kind() -> impl Strategy<Value = SourceKind> {
    prop_oneof![
        Just(SourceKind::Telegram),
        Just(SourceKind::Twitter),
        Just(SourceKind::Augmented),
        Just(SourceKind::Sentinel),
        Just(SourceKind::User),
    ]
}

proptest! {
    #[test]
    fn canonicalize_is_idempotent(path in any::<String>()) {
        let once = canonicalize(&path);
        prop_assert_eq!(canonicalize(&once), once);
    }

    #[test]
    fn canonical_output_is_whitelisted(path in any::<String>()) {
        let out = canonicalize(&path);
        prop_assert!(is_canonical(&out));
        prop_assert!(out
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_./-".contains(c)));
    }

    #[test]
    fn marker_appears_once_after_rewrite(path in "(sdamarker|sda|marker|[a-zA-Z0-9 ?_./-]){0,12}") {
        let out = canonicalize(&path);
        if is_canonical(&path) {
            prop_assert_eq!(out, path);
        } else {
            prop_assert_eq!(out.matches(MARKER).count(), 1);
            prop_assert!(!out.contains('/'));
        }
    }

    #[test]
    fn lfn_survives_the_wire(
        protocol in protocol(),
        tracer_id in "[a-z0-9-]{0,16}",
        job_id in any::<i64>(),
        source in source_kind(),
        path in any::<String>(),
    ) {
        let lfn = Lfn::new(protocol, tracer_id, job_id, source, path);
        let json = lfn::serialize(&lfn).unwrap();
        prop_assert_eq!(lfn::deserialize(&json).unwrap(), lfn);
    }

    #[test]
    fn envelope_is_exclusive(entity in entity_kind(), kind in error_kind(), value in any::<i32>()) {
        let ok: Envelope<i32> = Envelope::Ok(value);
        prop_assert!(ok.status());
        prop_assert!(ok.error_envelope().is_none());

        let err: Envelope<i32> = Envelope::error(entity, kind);
        prop_assert!(!err.status());
        prop_assert!(err.data().is_none());
        prop_assert!(err.error_envelope().is_some());
    }

    #[test]
    fn error_text_is_deterministic(entity in entity_kind(), kind in error_kind()) {
        let a = ErrorEnvelope::build(entity, kind.clone());
        let b = ErrorEnvelope::build(entity, kind.clone());
        prop_assert_eq!(&a, &b);
        prop_assert!(a.message.starts_with(entity.name()));
        prop_assert!(a.error_type.starts_with(entity.name()));
        prop_assert_eq!(a.code, kind.code());
    }
}
