// tests/real_process.rs
//
// Drives a shell script standing in for the terraform binary through the
// real tokio process backend. Everything lives in one test so no other
// thread forks while the script file is being written.

#![cfg(unix)]

mod common;
use crate::common::{init_tracing, ServiceConfigBuilder, SCOPE};

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tfdriver::driver::{RequestContext, TerraformDriver};
use tfdriver::errors::ErrorKind;
use tfdriver::exec::{MemoryExecLog, TokioProcessBackend};
use tfdriver::fs::RealFileSystem;
use tfdriver::host::MemoryHost;
use tfdriver::state::ExecutionStateStore;
use tfdriver::types::ExecutionStatus;

const SCRIPT: &str = r#"#!/bin/sh
echo "$*" >> calls.log
case "$1" in
  plan)
    echo "Plan: 1 to add"
    echo "Warning: deprecated attribute" 1>&2
    ;;
  output)
    echo '{"ip":{"value":"10.0.0.1"},"count":{"value":3}}'
    ;;
  destroy)
    echo "Error: resource still in use" 1>&2
    exit 3
    ;;
  *)
    echo "$1 done"
    ;;
esac
"#;

fn install_script(dir: &Path) {
    let path = dir.join("terraform");
    fs::write(&path, SCRIPT).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[tokio::test]
async fn shell_script_terraform_end_to_end() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    install_script(dir.path());

    let ctx: RequestContext = ServiceConfigBuilder::new(dir.path())
        .inputs("name=web")
        .context();
    let host = MemoryHost::new();
    let backend = TokioProcessBackend;
    let exec_log = MemoryExecLog::new();
    let fs_impl = RealFileSystem;
    let driver = TerraformDriver::new(&ctx, &host, &backend, &exec_log, &fs_impl);

    // run: one process per step, in order.
    let applied = driver.run().await.expect("run succeeds");
    assert_eq!(applied, "apply done\n");
    let calls = fs::read_to_string(dir.path().join("calls.log")).unwrap();
    assert_eq!(
        calls.lines().collect::<Vec<_>>(),
        vec![
            "init",
            "plan -var name=web -out planfile",
            "apply --auto-approve -no-color planfile",
            "output -json",
        ]
    );

    // stdout and stderr both land in the captured plan output.
    let entries = exec_log.entries();
    let plan = &entries[0];
    assert_eq!(plan.tag, "PLAN");
    assert!(plan.output.contains("Plan: 1 to add"));
    assert!(plan.output.contains("Warning: deprecated attribute"));

    let (_, record) = ExecutionStateStore::peek(&host, SCOPE, &ctx.service)
        .unwrap()
        .unwrap();
    assert_eq!(record.execute_status, ExecutionStatus::Completed);

    // destroy: nonzero exit carries stderr back.
    let err = driver.destroy().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
    assert!(err
        .captured_output()
        .unwrap()
        .contains("Error: resource still in use"));
    let (_, record) = ExecutionStateStore::peek(&host, SCOPE, &ctx.service)
        .unwrap()
        .unwrap();
    assert_eq!(record.destroy_status, ExecutionStatus::Error);

    // show-state reads the real file once it exists.
    assert_eq!(driver.show_state(), tfdriver::driver::STATE_FALLBACK);
    fs::write(dir.path().join("terraform.tfstate"), "{\"version\":4}").unwrap();
    assert_eq!(driver.show_state(), "{\"version\":4}");

    // A missing binary is a launch failure with no captured output.
    fs::remove_file(dir.path().join("terraform")).unwrap();
    let err = driver.plan().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
    assert!(err.captured_output().is_none());
}
