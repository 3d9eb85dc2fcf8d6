// src/state/store.rs

//! Identity resolution and read-modify-write access to one entity's
//! execution state record.

use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::errors::{DriverError, Result};
use crate::host::{HostApi, KeyValue};
use crate::state::record::{ExecutionIdentity, ExecutionStateRecord};
use crate::types::{ExecutionStatus, StatusKind};

/// Request-scoped handle on one entity's execution state.
///
/// Construction goes through [`ExecutionStateStore::open`], which guarantees
/// the entity has an identity and a record, and that a working directory is
/// known.
pub struct ExecutionStateStore<'a> {
    host: &'a dyn HostApi,
    scope_id: String,
    identity: ExecutionIdentity,
    working_dir: String,
}

impl<'a> ExecutionStateStore<'a> {
    /// Resolve the entity's identity, then its working directory.
    ///
    /// An explicit `working_dir` is persisted into the record and wins over
    /// whatever was stored before.
    pub fn open(
        host: &'a dyn HostApi,
        scope_id: &str,
        service: &ServiceConfig,
        working_dir: Option<&str>,
    ) -> Result<Self> {
        let identity = Self::resolve_identity(host, scope_id, service)?;
        let mut store = Self {
            host,
            scope_id: scope_id.to_string(),
            identity,
            working_dir: String::new(),
        };
        store.working_dir = store.resolve_working_directory(working_dir)?;
        Ok(store)
    }

    /// Return the entity's identity, assigning one on first use.
    ///
    /// A fresh record is created under a new identity first, then the
    /// identity is written to the `<model>.UUID` attribute. If either write
    /// fails the entity stays without an identity and the next request
    /// starts over; the most that is left behind is an unreferenced record.
    pub fn resolve_identity(
        host: &dyn HostApi,
        scope_id: &str,
        service: &ServiceConfig,
    ) -> Result<ExecutionIdentity> {
        if let Some(existing) = Self::lookup_identity(host, scope_id, service)? {
            debug!(scope = %scope_id, service = %service.name, identity = %existing, "identity found");
            return Ok(existing);
        }

        let identity = ExecutionIdentity::generate();
        let fresh = ExecutionStateRecord::default().to_json()?;
        host.set_records(scope_id, &[KeyValue::new(identity.as_str(), fresh)])?;
        host.set_attributes(
            scope_id,
            &service.name,
            &[KeyValue::new(service.uuid_attribute(), identity.as_str())],
        )?;

        info!(scope = %scope_id, service = %service.name, identity = %identity, "assigned new execution identity");
        Ok(identity)
    }

    /// The entity's identity if one was ever assigned. Never writes.
    pub fn lookup_identity(
        host: &dyn HostApi,
        scope_id: &str,
        service: &ServiceConfig,
    ) -> Result<Option<ExecutionIdentity>> {
        Ok(host
            .get_attribute(scope_id, &service.name, &service.uuid_attribute())?
            .map(ExecutionIdentity::from_existing))
    }

    /// Identity and record of an entity without assigning anything.
    ///
    /// `Ok(None)` when the entity was never executed. An identity whose
    /// record is gone is `MissingState`.
    pub fn peek(
        host: &'a dyn HostApi,
        scope_id: &str,
        service: &ServiceConfig,
    ) -> Result<Option<(ExecutionIdentity, ExecutionStateRecord)>> {
        let Some(identity) = Self::lookup_identity(host, scope_id, service)? else {
            return Ok(None);
        };
        let store = Self {
            host,
            scope_id: scope_id.to_string(),
            identity,
            working_dir: String::new(),
        };
        let record = store.fetch_record()?;
        Ok(Some((store.identity, record)))
    }

    /// Persist and return `explicit` if given, else return the stored value.
    pub fn resolve_working_directory(&self, explicit: Option<&str>) -> Result<String> {
        match explicit.filter(|d| !d.is_empty()) {
            Some(dir) => {
                self.update(|record| record.working_directory = Some(dir.to_string()))?;
                Ok(dir.to_string())
            }
            None => self
                .fetch_record()?
                .working_directory()
                .map(str::to_string)
                .ok_or_else(|| {
                    DriverError::MissingState(format!(
                        "no working directory recorded for {}",
                        self.identity
                    ))
                }),
        }
    }

    pub fn get_status(&self, kind: StatusKind) -> Result<ExecutionStatus> {
        Ok(self.fetch_record()?.status(kind))
    }

    pub fn set_status(&self, kind: StatusKind, status: ExecutionStatus) -> Result<()> {
        self.update(|record| record.set_status(kind, status))?;
        info!(identity = %self.identity, field = %kind, %status, "status updated");
        Ok(())
    }

    pub fn identity(&self) -> &ExecutionIdentity {
        &self.identity
    }

    pub fn working_directory(&self) -> &str {
        &self.working_dir
    }

    /// Current record for this identity.
    ///
    /// A missing record is a `MissingState` error; it is never recreated
    /// here.
    pub fn fetch_record(&self) -> Result<ExecutionStateRecord> {
        let records = self.host.get_records(&self.scope_id)?;
        let text = records.get(self.identity.as_str()).ok_or_else(|| {
            DriverError::MissingState(format!(
                "no execution state for identity {} in scope {}",
                self.identity, self.scope_id
            ))
        })?;
        ExecutionStateRecord::from_json(text)
    }

    /// Re-fetch the whole record, change it and write the whole record back.
    fn update(&self, mutate: impl FnOnce(&mut ExecutionStateRecord)) -> Result<()> {
        let mut record = self.fetch_record()?;
        mutate(&mut record);
        let json = record.to_json()?;
        self.host
            .set_records(&self.scope_id, &[KeyValue::new(self.identity.as_str(), json)])
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::errors::ErrorKind;
    use crate::host::MemoryHost;

    const SCOPE: &str = "res-1";

    /// Host whose next record write fails once.
    struct FlakyRecords {
        inner: MemoryHost,
        fail_next: AtomicBool,
    }

    impl HostApi for FlakyRecords {
        fn send_progress(&self, scope_id: &str, message: &str) -> Result<()> {
            self.inner.send_progress(scope_id, message)
        }

        fn get_attribute(&self, scope_id: &str, entity: &str, name: &str) -> Result<Option<String>> {
            self.inner.get_attribute(scope_id, entity, name)
        }

        fn set_attributes(&self, scope_id: &str, entity: &str, attrs: &[KeyValue]) -> Result<()> {
            self.inner.set_attributes(scope_id, entity, attrs)
        }

        fn get_records(&self, scope_id: &str) -> Result<BTreeMap<String, String>> {
            self.inner.get_records(scope_id)
        }

        fn set_records(&self, scope_id: &str, records: &[KeyValue]) -> Result<()> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(DriverError::transport("record write dropped"));
            }
            self.inner.set_records(scope_id, records)
        }
    }

    fn service() -> ServiceConfig {
        ServiceConfig::new("web", "Terraform Service", "/modules/web")
    }

    #[test]
    fn identity_is_assigned_once() {
        let host = MemoryHost::new();
        let first = ExecutionStateStore::resolve_identity(&host, SCOPE, &service()).unwrap();
        let second = ExecutionStateStore::resolve_identity(&host, SCOPE, &service()).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            host.attribute(SCOPE, "web", "Terraform Service.UUID").as_deref(),
            Some(first.as_str())
        );
    }

    #[test]
    fn peek_never_assigns() {
        let host = MemoryHost::new();
        assert!(ExecutionStateStore::peek(&host, SCOPE, &service()).unwrap().is_none());
        assert!(host.attribute(SCOPE, "web", "Terraform Service.UUID").is_none());

        let id = ExecutionStateStore::resolve_identity(&host, SCOPE, &service()).unwrap();
        let (seen, record) = ExecutionStateStore::peek(&host, SCOPE, &service())
            .unwrap()
            .unwrap();
        assert_eq!(seen, id);
        assert_eq!(record.execute_status, ExecutionStatus::None);
    }

    #[test]
    fn failed_record_write_leaves_no_identity() {
        let host = FlakyRecords {
            inner: MemoryHost::new(),
            fail_next: AtomicBool::new(true),
        };

        let err = ExecutionStateStore::resolve_identity(&host, SCOPE, &service()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(
            host.inner
                .attribute(SCOPE, "web", "Terraform Service.UUID")
                .is_none()
        );

        let store = ExecutionStateStore::open(&host, SCOPE, &service(), Some("/m")).unwrap();
        assert_eq!(store.get_status(StatusKind::Execute).unwrap(), ExecutionStatus::None);
        assert_eq!(store.working_directory(), "/m");
    }

    #[test]
    fn new_identity_gets_fresh_record() {
        let host = MemoryHost::new();
        let id = ExecutionStateStore::resolve_identity(&host, SCOPE, &service()).unwrap();
        let record =
            ExecutionStateRecord::from_json(&host.record(SCOPE, id.as_str()).unwrap()).unwrap();
        assert_eq!(record, ExecutionStateRecord::default());
    }

    #[test]
    fn open_without_any_working_dir_is_missing_state() {
        let host = MemoryHost::new();
        let err = ExecutionStateStore::open(&host, SCOPE, &service(), None)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::MissingState);
    }

    #[test]
    fn explicit_working_dir_overrides_stored() {
        let host = MemoryHost::new();
        ExecutionStateStore::open(&host, SCOPE, &service(), Some("/old")).unwrap();
        let store = ExecutionStateStore::open(&host, SCOPE, &service(), Some("/new")).unwrap();
        assert_eq!(store.working_directory(), "/new");

        let reopened = ExecutionStateStore::open(&host, SCOPE, &service(), None).unwrap();
        assert_eq!(reopened.working_directory(), "/new");
    }

    #[test]
    fn status_writes_touch_only_their_field() {
        let host = MemoryHost::new();
        let store = ExecutionStateStore::open(&host, SCOPE, &service(), Some("/m")).unwrap();

        store
            .set_status(StatusKind::Execute, ExecutionStatus::InProgress)
            .unwrap();
        store
            .set_status(StatusKind::Destroy, ExecutionStatus::Error)
            .unwrap();

        let record = store.fetch_record().unwrap();
        assert_eq!(record.execute_status, ExecutionStatus::InProgress);
        assert_eq!(record.destroy_status, ExecutionStatus::Error);
        assert_eq!(record.working_directory(), Some("/m"));
    }
}
