mod support;

use chrono::NaiveDate;
use harvester_core::{
    CancelToken, HarvestSet, ListKind, LookupVerdict, ReconcileOptions, StopReason,
    VerificationPolicy,
};
use harvester_engine::{
    AuditError, AuditSession, CapturedFollowGraph, FollowLookup, HarvestConfig, HarvestError,
    Harvester, ListStore, NoPause, PageScrollFallback, SnapshotContainer, NON_FOLLOWERS_LABEL,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tempfile::TempDir;

use support::{frame, init_logging, user, SimulatedList};

fn session() -> AuditSession<NoPause> {
    AuditSession::new(
        "me",
        Harvester::new(HarvestConfig::default(), NoPause),
        CancelToken::new(),
    )
    .with_fallback(PageScrollFallback {
        pause: (Duration::ZERO, Duration::ZERO),
        ..PageScrollFallback::default()
    })
}

fn store(dir: &TempDir) -> ListStore {
    ListStore::with_clock(dir.path(), || {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    })
}

fn unavailable(kind: ListKind) -> HarvestError {
    HarvestError::SourceUnavailable {
        kind,
        reason: "not on screen".into(),
    }
}

#[test]
fn low_confidence_dialog_falls_back_to_page_and_merges() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let session = session().with_store(store(&temp));

    let mut dialog = SimulatedList::new(100, 10).stalling_at(20);
    let mut page = SnapshotContainer::from_frames(
        "page",
        [
            frame((0..40).map(user)),
            frame((0..80).map(user)),
            frame((5..100).map(user)),
        ],
    );

    let collected = session
        .collect(ListKind::Followers, &mut dialog, Some(&mut page), Some(100))
        .unwrap();

    assert!(collected.used_fallback);
    assert_eq!(collected.report.set.len(), 100);
    assert!(!collected.report.confidence.is_low());
    let saved = collected.saved_to.unwrap();
    assert_eq!(ListStore::load(&saved).unwrap().len(), 100);
}

#[test]
fn cancelled_collect_saves_partial_list_without_fallback() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let cancel = CancelToken::new();
    let session = AuditSession::new(
        "me",
        Harvester::new(HarvestConfig::default(), NoPause),
        cancel.clone(),
    )
    .with_store(store(&temp));

    let mut dialog = SimulatedList::new(1000, 10).cancel_after(3, cancel.clone());
    let mut page = SnapshotContainer::from_frames("page", [frame((0..500).map(user))]);
    let collected = session
        .collect(ListKind::Following, &mut dialog, Some(&mut page), Some(1000))
        .unwrap();

    assert!(session.is_cancelled());
    assert_eq!(collected.report.stop_reason, StopReason::Cancelled);
    assert!(!collected.used_fallback);
    assert!(!collected.report.set.is_empty());
    let saved = ListStore::load(&collected.saved_to.unwrap()).unwrap();
    assert_eq!(saved, collected.report.set.to_vec());
}

#[test]
fn low_confidence_without_page_keeps_dialog_result() {
    init_logging();
    let mut dialog = SimulatedList::new(100, 10).stalling_at(20);
    let collected = session()
        .collect(ListKind::Following, &mut dialog, None, Some(100))
        .unwrap();
    assert!(!collected.used_fallback);
    assert!(collected.report.confidence.is_low());
    assert_eq!(collected.saved_to, None);
}

#[test]
fn missing_dialog_uses_page_view() {
    init_logging();
    let mut dialog = SimulatedList::new(10, 10).unavailable();
    let mut page = SnapshotContainer::from_frames("page", [frame((0..12).map(user))]);
    let collected = session()
        .collect(ListKind::Following, &mut dialog, Some(&mut page), None)
        .unwrap();
    assert!(collected.used_fallback);
    assert_eq!(collected.report.set.len(), 12);
}

#[test]
fn both_sources_unavailable_blocks_reconciliation() {
    init_logging();
    let err = session()
        .reconcile(
            Err(unavailable(ListKind::Following)),
            Err(unavailable(ListKind::Followers)),
            ReconcileOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, AuditError::BothSourcesUnavailable { .. }));
}

#[test]
fn one_missing_side_reconciles_against_empty() {
    init_logging();
    let following = HarvestSet::from_members(ListKind::Following, ["a", "b"]);
    let result = session()
        .reconcile(
            Ok(following),
            Err(unavailable(ListKind::Followers)),
            ReconcileOptions::default(),
        )
        .unwrap();
    assert_eq!(result.to_vec(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn verification_removes_contradicted_members_and_resaves() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let session = session().with_store(store(&temp));

    let following = HarvestSet::from_members(ListKind::Following, ["alice", "bob", "carol", "dave"]);
    let followers = HarvestSet::from_members(ListKind::Followers, ["bob"]);
    let mut result = session
        .reconcile(Ok(following), Ok(followers), ReconcileOptions::default())
        .unwrap();
    assert_eq!(result.len(), 3);

    let graph = CapturedFollowGraph::from_json(
        r#"{ "following": { "alice": ["Me"], "carol": ["someone"] }, "restricted": ["dave"] }"#,
    )
    .unwrap();
    let mut lookup = graph.lookup_for("me");
    let outcome = session.verify(
        &mut result,
        10,
        &mut lookup,
        VerificationPolicy::default(),
        &mut StdRng::seed_from_u64(11),
    );

    assert_eq!(outcome.sampled(), 3);
    assert_eq!(outcome.contradicted(), vec!["alice".to_string()]);
    assert_eq!(outcome.accuracy(), Some(2.0 / 3.0));
    assert_eq!(result.to_vec(), vec!["carol".to_string(), "dave".to_string()]);

    let saved = temp
        .path()
        .join(format!("me_{NON_FOLLOWERS_LABEL}_20240102_030405.json"));
    assert_eq!(
        ListStore::load(&saved).unwrap(),
        vec!["carol".to_string(), "dave".to_string()]
    );
}

#[test]
fn graph_lookup_verdicts() {
    let graph = CapturedFollowGraph::from_json(
        r#"{ "following": { "alice": ["ME"], "carol": [] }, "restricted": ["dave"] }"#,
    )
    .unwrap();
    let mut lookup = graph.lookup_for("me");
    assert_eq!(lookup.lookup("alice"), LookupVerdict::FollowsBack);
    assert_eq!(lookup.lookup("carol"), LookupVerdict::NotFollowing);
    assert_eq!(lookup.lookup("dave"), LookupVerdict::Restricted);
    assert_eq!(lookup.lookup("erin"), LookupVerdict::Undetermined);
}

#[test]
fn closures_act_as_lookups() {
    let mut lookup = |raw: &str| {
        if raw == "x" {
            LookupVerdict::FollowsBack
        } else {
            LookupVerdict::NotFollowing
        }
    };
    assert_eq!(FollowLookup::lookup(&mut lookup, "x"), LookupVerdict::FollowsBack);
}

#[test]
fn malformed_graph_is_rejected() {
    assert!(CapturedFollowGraph::from_json("[1, 2]").is_err());
}
