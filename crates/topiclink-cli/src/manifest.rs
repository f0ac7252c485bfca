use std::fs;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use topiclink_core::Binding;
use topiclink_engine::{ReconcilerConfig, TraceConfig};

/// Deployment manifest: the declared bindings plus the identifiers the
/// engine keys its state record on.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub service: String,
    pub stage: String,
    pub region: String,
    pub account_id: String,
    pub state: StateConfig,
    #[serde(default)]
    pub trace: TraceConfig,
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    pub bucket: String,
}

impl Manifest {
    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            service: self.service.clone(),
            stage: self.stage.clone(),
            region: self.region.clone(),
            account_id: self.account_id.clone(),
            state_bucket: self.state.bucket.clone(),
            trace: self.trace,
        }
    }
}

pub fn load(path: &str) -> Result<Manifest> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read manifest '{path}'"))?;
    let manifest: Manifest =
        toml::from_str(&content).with_context(|| format!("cannot parse manifest '{path}'"))?;
    validate(&manifest)?;
    Ok(manifest)
}

fn validate(manifest: &Manifest) -> Result<()> {
    for (field, value) in [
        ("service", &manifest.service),
        ("stage", &manifest.stage),
        ("region", &manifest.region),
        ("account_id", &manifest.account_id),
    ] {
        if value.is_empty() {
            bail!("manifest field '{field}' must not be empty");
        }
    }
    if manifest.state.bucket.is_empty() {
        bail!("manifest field 'state.bucket' must not be empty");
    }
    for binding in &manifest.bindings {
        if binding.function.is_empty() {
            bail!("every binding must declare a function name");
        }
        binding
            .topic_arn()
            .with_context(|| format!("binding '{}' is invalid", binding.function))?;
    }
    Ok(())
}
