#![allow(dead_code)]

use tempfile::TempDir;

use tfdriver::driver::{RequestContext, TerraformDriver};
use tfdriver::exec::{MemoryExecLog, TerraformRunner};
use tfdriver::fs::mock::MockFileSystem;
use tfdriver::host::MemoryHost;
use tfdriver::state::{ExecutionStateRecord, ExecutionStateStore};

pub use tfdriver_test_utils::builders::{MODEL, SCOPE, SERVICE, ServiceConfigBuilder};
pub use tfdriver_test_utils::fake_terraform::FakeTerraform;
pub use tfdriver_test_utils::init_tracing;

pub const OUTPUT_JSON: &str = r#"{"ip":{"value":"1.2.3.4"},"port":{"value":8080}}"#;

/// Everything one driver request needs, backed by in-memory fakes and a
/// real temp module directory (the lock file lives there).
pub struct Harness {
    pub dir: TempDir,
    pub host: MemoryHost,
    pub terraform: FakeTerraform,
    pub exec_log: MemoryExecLog,
    pub fs: MockFileSystem,
    pub ctx: RequestContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_terraform(FakeTerraform::new().succeed("output", OUTPUT_JSON))
    }

    pub fn with_terraform(terraform: FakeTerraform) -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let ctx = ServiceConfigBuilder::new(dir.path()).context();
        Self {
            dir,
            host: MemoryHost::new(),
            terraform,
            exec_log: MemoryExecLog::new(),
            fs: MockFileSystem::new(),
            ctx,
        }
    }

    pub fn driver(&self) -> TerraformDriver<'_> {
        TerraformDriver::new(
            &self.ctx,
            &self.host,
            &self.terraform,
            &self.exec_log,
            &self.fs,
        )
    }

    /// Open the state store the way the driver does.
    pub fn store(&self) -> ExecutionStateStore<'_> {
        let dir = self.dir.path().to_string_lossy().into_owned();
        ExecutionStateStore::open(&self.host, SCOPE, &self.ctx.service, Some(dir.as_str())).unwrap()
    }

    pub fn runner(&self) -> TerraformRunner<'_> {
        TerraformRunner::new(
            &self.host,
            &self.terraform,
            &self.exec_log,
            SCOPE,
            &self.ctx.service,
            self.dir.path(),
        )
    }

    pub fn identity(&self) -> Option<String> {
        self.host.attribute(SCOPE, SERVICE, &format!("{MODEL}.UUID"))
    }

    pub fn record(&self) -> ExecutionStateRecord {
        let (_, record) = ExecutionStateStore::peek(&self.host, SCOPE, &self.ctx.service)
            .unwrap()
            .expect("entity has an identity");
        record
    }

    pub fn output_attribute(&self) -> Option<String> {
        self.host
            .attribute(SCOPE, SERVICE, &format!("{MODEL}.Terraform Output"))
    }
}
