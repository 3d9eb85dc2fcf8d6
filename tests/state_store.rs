// tests/state_store.rs

mod common;
use crate::common::{Harness, SCOPE, SERVICE, MODEL};

use tfdriver::errors::ErrorKind;
use tfdriver::state::{ExecutionStateRecord, ExecutionStateStore};
use tfdriver::types::{ExecutionStatus, StatusKind};

#[test]
fn identity_assignment_is_idempotent() {
    let h = Harness::new();
    let svc = &h.ctx.service;

    let first = ExecutionStateStore::resolve_identity(&h.host, SCOPE, svc).unwrap();
    let second = ExecutionStateStore::resolve_identity(&h.host, SCOPE, svc).unwrap();

    assert_eq!(first, second);
    assert_eq!(h.identity().as_deref(), Some(first.as_str()));
}

#[test]
fn fresh_identity_has_default_record() {
    let h = Harness::new();
    let id = ExecutionStateStore::resolve_identity(&h.host, SCOPE, &h.ctx.service).unwrap();

    let text = h.host.record(SCOPE, id.as_str()).expect("record created");
    let record = ExecutionStateRecord::from_json(&text).unwrap();
    assert_eq!(record.execute_status, ExecutionStatus::None);
    assert_eq!(record.destroy_status, ExecutionStatus::None);
    assert_eq!(record.working_directory(), None);
}

#[test]
fn existing_identity_attribute_is_reused() {
    let h = Harness::new();
    h.host
        .set_attribute(SCOPE, SERVICE, &format!("{MODEL}.UUID"), "preassigned");

    let id = ExecutionStateStore::resolve_identity(&h.host, SCOPE, &h.ctx.service).unwrap();
    assert_eq!(id.as_str(), "preassigned");
    // Reusing an identity never creates a record for it.
    assert!(h.host.record(SCOPE, "preassigned").is_none());
}

#[test]
fn explicit_working_directory_is_persisted_and_wins() {
    let h = Harness::new();
    let svc = &h.ctx.service;

    ExecutionStateStore::open(&h.host, SCOPE, svc, Some("/first")).unwrap();
    let store = ExecutionStateStore::open(&h.host, SCOPE, svc, Some("/second")).unwrap();
    assert_eq!(store.working_directory(), "/second");
    assert_eq!(
        store.resolve_working_directory(None).unwrap(),
        "/second"
    );
    assert_eq!(h.record().working_directory(), Some("/second"));
}

#[test]
fn missing_working_directory_is_missing_state() {
    let h = Harness::new();
    let err = ExecutionStateStore::open(&h.host, SCOPE, &h.ctx.service, None)
        .err()
        .expect("no working directory anywhere");
    assert_eq!(err.kind(), ErrorKind::MissingState);
}

#[test]
fn deleted_record_is_reported_not_recreated() {
    let h = Harness::new();
    let store = h.store();
    let id = store.identity().clone();

    h.host.remove_record(SCOPE, id.as_str());

    let read = store.get_status(StatusKind::Execute).unwrap_err();
    assert_eq!(read.kind(), ErrorKind::MissingState);
    let write = store
        .set_status(StatusKind::Destroy, ExecutionStatus::Completed)
        .unwrap_err();
    assert_eq!(write.kind(), ErrorKind::MissingState);

    assert!(h.host.record(SCOPE, id.as_str()).is_none());
    // Reopening keeps the same identity and still refuses.
    let reopen = ExecutionStateStore::open(&h.host, SCOPE, &h.ctx.service, Some("/m"))
        .err()
        .unwrap();
    assert_eq!(reopen.kind(), ErrorKind::MissingState);
    assert_eq!(h.identity().as_deref(), Some(id.as_str()));
}

#[test]
fn store_outage_surfaces_as_transport_error() {
    let h = Harness::new();
    let store = h.store();

    h.host.set_offline(true);
    let err = store
        .set_status(StatusKind::Execute, ExecutionStatus::InProgress)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);

    h.host.set_offline(false);
    assert_eq!(
        store.get_status(StatusKind::Execute).unwrap(),
        ExecutionStatus::None
    );
}

#[test]
fn first_use_fails_cleanly_when_store_is_down() {
    let h = Harness::new();
    h.host.set_offline(true);

    let err = ExecutionStateStore::resolve_identity(&h.host, SCOPE, &h.ctx.service).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);

    h.host.set_offline(false);
    assert!(h.identity().is_none());
}

#[test]
fn entities_in_one_scope_do_not_share_records() {
    let h = Harness::new();
    let other = common::ServiceConfigBuilder::new(h.dir.path())
        .name("db-stack")
        .build();

    let a = h.store();
    let b = ExecutionStateStore::open(&h.host, SCOPE, &other, Some("/db")).unwrap();
    assert_ne!(a.identity(), b.identity());

    a.set_status(StatusKind::Execute, ExecutionStatus::Completed)
        .unwrap();
    assert_eq!(
        b.get_status(StatusKind::Execute).unwrap(),
        ExecutionStatus::None
    );
}
