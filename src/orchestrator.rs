//! Wiring root: owns the configuration, builds one alphabet up front and
//! a fresh codec plus search engine per invocation. No process-wide
//! singletons; every collaborator receives what it needs explicitly.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::alphabet::Alphabet;
use crate::codec::RadixCodec;
use crate::config::CodecConfig;
use crate::error::InlinkError;
use crate::render::RenderPrimitive;
use crate::search::{SearchAttempt, SearchConfig, SearchEngine, SearchOutcome};

/// Outcome of one pack invocation plus its full trial history for
/// observability collaborators.
#[derive(Debug)]
pub struct PackReport {
    pub outcome: SearchOutcome,
    pub attempts: Vec<SearchAttempt>,
}

impl PackReport {
    /// Attempt log as JSON, for status/metrics consumers.
    pub fn attempts_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.attempts)
    }
}

pub struct Orchestrator {
    alphabet: Alphabet,
    codec_cfg: CodecConfig,
}

impl Orchestrator {
    pub fn new(alphabet: &str, codec_cfg: CodecConfig) -> Result<Self, InlinkError> {
        codec_cfg.validate()?;
        Ok(Self {
            alphabet: Alphabet::new(alphabet)?,
            codec_cfg,
        })
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Run one compression search against `image`. Each call gets its own
    /// codec and engine; only the alphabet is shared, read-only.
    pub fn pack(
        &self,
        image: &mut dyn RenderPrimitive,
        search_cfg: SearchConfig,
        abort: Arc<AtomicBool>,
    ) -> Result<PackReport, InlinkError> {
        let mut codec = RadixCodec::new(self.alphabet.clone(), self.codec_cfg.clone())?;
        let mut engine = SearchEngine::new(&mut codec, search_cfg, abort);
        let outcome = engine.run(image)?;
        let attempts = engine.attempts().to_vec();
        Ok(PackReport { outcome, attempts })
    }
}
