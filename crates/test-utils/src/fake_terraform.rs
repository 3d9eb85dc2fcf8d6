use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tfdriver::exec::{CommandInvocation, ProcessBackend, ProcessOutput};

#[derive(Debug, Clone)]
enum Scripted {
    Exit { code: i32, output: String },
    LaunchFailure,
}

/// A fake Terraform binary that:
/// - records every invocation in order
/// - answers each subcommand with scripted output (default: exit 0 and
///   `"<subcommand> ok\n"`).
///
/// Clones share the recorded invocations and the script.
#[derive(Debug, Clone, Default)]
pub struct FakeTerraform {
    script: Arc<Mutex<HashMap<String, Scripted>>>,
    invocations: Arc<Mutex<Vec<CommandInvocation>>>,
}

impl FakeTerraform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `subcommand` exit 0 with `output`.
    pub fn succeed(self, subcommand: &str, output: &str) -> Self {
        self.respond(subcommand, 0, output)
    }

    /// Make `subcommand` exit with `code` and `output`.
    pub fn respond(self, subcommand: &str, code: i32, output: &str) -> Self {
        self.script.lock().unwrap().insert(
            subcommand.to_string(),
            Scripted::Exit {
                code,
                output: output.to_string(),
            },
        );
        self
    }

    /// Make `subcommand` fail to launch at all.
    pub fn fail_to_launch(self, subcommand: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(subcommand.to_string(), Scripted::LaunchFailure);
        self
    }

    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Subcommands seen so far, in order.
    pub fn subcommands(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .map(|i| i.subcommand().to_string())
            .collect()
    }
}

impl ProcessBackend for FakeTerraform {
    fn run<'a>(
        &'a self,
        invocation: &'a CommandInvocation,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ProcessOutput>> + Send + 'a>> {
        let script = Arc::clone(&self.script);
        let invocations = Arc::clone(&self.invocations);

        Box::pin(async move {
            {
                let mut guard = invocations.lock().unwrap();
                guard.push(invocation.clone());
            }

            let sub = invocation.subcommand().to_string();
            let scripted = script.lock().unwrap().get(&sub).cloned();
            match scripted {
                Some(Scripted::Exit { code, output }) => Ok(ProcessOutput {
                    exit_code: Some(code),
                    output,
                }),
                Some(Scripted::LaunchFailure) => {
                    Err(anyhow::anyhow!("No such file or directory (os error 2)"))
                }
                None => Ok(ProcessOutput {
                    exit_code: Some(0),
                    output: format!("{sub} ok\n"),
                }),
            }
        })
    }
}
