// src/pipeline.rs

use crate::config::{MaskOptions, TearMatchingConfig};
use crate::error::Result;
use crate::image::extractor::BoundaryExtractor;
use crate::image::loader::FragmentMask;
use crate::matching::engine::MatchEngine;
use crate::matching::MatchResult;
use crate::signature::builder::SignatureBuilder;
use crate::signature::TearSignature;
use crate::store::SignatureStore;
use image::DynamicImage;
use log::{debug, info};
use std::path::Path;
use std::time::Instant;

/// Mask to signature to ranked matches, configured once.
#[derive(Debug, Clone)]
pub struct TearPipeline {
    config: TearMatchingConfig,
    extractor: BoundaryExtractor,
    builder: SignatureBuilder,
    engine: MatchEngine,
}

impl TearPipeline {
    /// Validate `config` and build every stage from it.
    pub fn new(config: TearMatchingConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Tear pipeline ready: resolution {}, {:?} normalization, {:?} metric",
            config.signature.resolution, config.signature.normalization, config.matching.metric
        );

        Ok(Self::assemble(config))
    }

    fn assemble(config: TearMatchingConfig) -> Self {
        Self {
            extractor: BoundaryExtractor::new(config.extractor.clone()),
            builder: SignatureBuilder::new(config.signature.clone()),
            engine: MatchEngine::new(config.matching.clone()),
            config,
        }
    }

    pub fn config(&self) -> &TearMatchingConfig {
        &self.config
    }

    pub fn mask_options(&self) -> &MaskOptions {
        &self.config.mask
    }

    pub fn extractor(&self) -> &BoundaryExtractor {
        &self.extractor
    }

    pub fn builder(&self) -> &SignatureBuilder {
        &self.builder
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn signature_from_mask(&self, mask: &FragmentMask) -> Result<TearSignature> {
        let start = Instant::now();
        let arc = self.extractor.extract(mask)?;
        let signature = self.builder.build(&arc)?;
        debug!(
            "Signature from {}x{} mask: {} arc points, {} samples in {:.3}ms",
            mask.width(),
            mask.height(),
            arc.len(),
            signature.resolution(),
            start.elapsed().as_secs_f64() * 1e3
        );
        Ok(signature)
    }

    pub fn signature_from_image(&self, img: &DynamicImage) -> Result<TearSignature> {
        self.signature_from_mask(&FragmentMask::from_dynamic_image(img, &self.config.mask))
    }

    pub fn signature_from_file<P: AsRef<Path>>(&self, path: P) -> Result<TearSignature> {
        self.signature_from_mask(&FragmentMask::from_file(path, &self.config.mask)?)
    }

    /// Rank the store against a new fragment, then optionally add it.
    ///
    /// Matching runs before insertion, so the fragment never matches itself.
    /// An empty store yields no matches rather than an error. With
    /// `add_to_store` an identifier already in the store is rejected after
    /// the matches have been computed, and nothing is returned.
    pub fn compare_with_store(
        &self,
        store: &mut SignatureStore,
        identifier: &str,
        mask: &FragmentMask,
        add_to_store: bool,
    ) -> Result<Vec<MatchResult>> {
        let signature = self.signature_from_mask(mask)?;

        let matches = if store.is_empty() {
            Vec::new()
        } else {
            self.engine.match_one(identifier, &signature, store)?
        };

        if add_to_store {
            store.insert(identifier, signature, None)?;
            info!("Added '{}' to store ({} records)", identifier, store.len());
        }

        Ok(matches)
    }
}

impl Default for TearPipeline {
    fn default() -> Self {
        Self::assemble(TearMatchingConfig::default())
    }
}
