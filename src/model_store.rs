use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::classifier::SvmParams;
use crate::error::{LeadError, Result};
use crate::features::{FEATURE_SCHEMA_VERSION, Strategy};
use crate::training::ModelSet;

pub const MODEL_ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub generated_at: String,
    pub strategy: Strategy,
    pub schema_version: u32,
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub params: SvmParams,
    #[serde(default)]
    pub models: ModelSet,
}

impl ModelArtifact {
    pub fn new(strategy: Strategy, params: SvmParams, models: ModelSet) -> Self {
        Self {
            version: MODEL_ARTIFACT_VERSION,
            generated_at: Utc::now().to_rfc3339(),
            strategy,
            schema_version: FEATURE_SCHEMA_VERSION,
            feature_names: strategy
                .feature_names()
                .iter()
                .map(|n| n.to_string())
                .collect(),
            params,
            models,
        }
    }

    /// Rejects artifacts fitted against a different feature layout.
    fn check_compatible(&self) -> Result<()> {
        if self.version != MODEL_ARTIFACT_VERSION {
            return Err(LeadError::InvalidConfig(format!(
                "model artifact version {} (expected {MODEL_ARTIFACT_VERSION})",
                self.version
            )));
        }
        let expected = self.strategy.feature_names();
        if self.schema_version != FEATURE_SCHEMA_VERSION
            || self.feature_names.len() != expected.len()
            || self.feature_names.iter().zip(expected).any(|(a, b)| a.as_str() != *b)
        {
            return Err(LeadError::InvalidConfig(format!(
                "model artifact for {} was fitted against a different feature layout",
                self.strategy
            )));
        }
        Ok(())
    }
}

pub fn save_models(path: &Path, artifact: &ModelArtifact) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(artifact)?;
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    log::info!(
        "saved {} {} models to {}",
        artifact.models.len(),
        artifact.strategy,
        path.display()
    );
    Ok(())
}

pub fn load_models(path: &Path) -> Result<ModelArtifact> {
    let raw = fs::read_to_string(path)?;
    let artifact = serde_json::from_str::<ModelArtifact>(&raw)?;
    artifact.check_compatible()?;
    Ok(artifact)
}
