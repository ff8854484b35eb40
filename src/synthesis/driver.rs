use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;

use super::{synthesize, TimeBase};
use crate::config::SignalConfig;
use crate::core::{validate, MetadataValue, SignalDataContainer, SignalMetadata, SignalResult};
use crate::storage::SignalArchive;

/// Produces a validated [`SignalDataContainer`] from signal parameters
#[derive(Debug, Clone)]
pub struct SignalSynthesisDriver {
    config: SignalConfig,
    time_base: Option<TimeBase>,
    annotations: Vec<(String, MetadataValue)>,
}

impl SignalSynthesisDriver {
    pub fn new(config: SignalConfig) -> Self {
        Self {
            config,
            time_base: None,
            annotations: Vec::new(),
        }
    }

    /// Override the default one-stamp-per-sample time base
    pub fn with_time_base(mut self, time_base: TimeBase) -> Self {
        self.time_base = Some(time_base);
        self
    }

    /// Attach an extra metadata entry such as the operator name
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.annotations.push((key.into(), value.into()));
        self
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn time_base(&self) -> TimeBase {
        self.time_base.unwrap_or(TimeBase::Sampled {
            sample_rate: self.config.sample_rate,
            duration: self.config.signal_time_length,
        })
    }

    /// Mandatory fields from the config followed by annotations, in insertion order
    pub fn metadata(&self) -> SignalResult<SignalMetadata> {
        let mut metadata = self.config.to_metadata()?;
        for (key, value) in &self.annotations {
            metadata.set(key.clone(), value.clone())?;
        }
        Ok(metadata)
    }

    /// Synthesize the SIN/COS pair at the reference frequency and wrap it in a container.
    ///
    /// Metadata is validated before any samples are generated.
    pub fn run(&self) -> SignalResult<SignalDataContainer> {
        let metadata = self.metadata()?;
        validate(&metadata)?;

        let time_base = self.time_base();
        let t = time_base.samples()?;
        debug!(
            "Synthesizing {} Hz over {} samples ({:?})",
            self.config.reference_frequency,
            t.len(),
            time_base
        );

        let (in_phase, quadrature) = synthesize(self.config.reference_frequency, &t);
        SignalDataContainer::new(in_phase, quadrature, t, metadata)
    }

    /// Run and hand the container to `archive`, returning the written path
    pub async fn run_and_store(&self, archive: &dyn SignalArchive) -> Result<PathBuf> {
        let signal = self.run().context("Failed to build reference signal")?;
        archive
            .store(Arc::new(signal))
            .await
            .context("Failed to archive reference signal")
    }
}
