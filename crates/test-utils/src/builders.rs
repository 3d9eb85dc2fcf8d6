#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tfdriver::config::ServiceConfig;
use tfdriver::driver::RequestContext;

pub const SCOPE: &str = "reservation-1";
pub const MODEL: &str = "Terraform Service";
pub const SERVICE: &str = "web-stack";

/// Builder for `ServiceConfig` to simplify test setup.
pub struct ServiceConfigBuilder {
    service: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn new(module_path: impl AsRef<Path>) -> Self {
        let mut service = ServiceConfig::new(SERVICE, MODEL, module_path.as_ref());
        service.binary_name = "terraform".to_string();
        Self { service }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.service.name = name.to_string();
        self
    }

    pub fn inputs(mut self, inputs: &str) -> Self {
        self.service.inputs = Some(inputs.to_string());
        self
    }

    pub fn executable_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.service.executable_dir = Some(dir.into());
        self
    }

    pub fn binary_name(mut self, name: &str) -> Self {
        self.service.binary_name = name.to_string();
        self
    }

    pub fn build(self) -> ServiceConfig {
        self.service
    }

    pub fn context(self) -> RequestContext {
        RequestContext::new(SCOPE, self.service)
    }
}
