use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use inlink::{
    CodecConfig, Orchestrator, OutputFormat, RenderError, RenderPrimitive, SearchConfig,
    SearchOutcome, DEFAULT_ALPHABET,
};

struct FlatImage;

impl RenderPrimitive for FlatImage {
    fn dimensions(&self) -> (u32, u32) {
        (64, 64)
    }

    fn render(
        &mut self,
        _format: OutputFormat,
        quality: f64,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let len = ((width * height) as f64 * quality * 0.1) as usize + 8;
        Ok(vec![0x42; len])
    }
}

#[test]
fn pack_produces_outcome_and_json_log() {
    let orchestrator = Orchestrator::new(DEFAULT_ALPHABET, CodecConfig::default()).unwrap();
    let cfg = SearchConfig {
        budget: 5_000,
        initial_quality: 0.7,
        formats: vec![OutputFormat::Webp, OutputFormat::Jpeg],
    };
    let report = orchestrator
        .pack(&mut FlatImage, cfg, Arc::new(AtomicBool::new(false)))
        .unwrap();

    assert!(matches!(report.outcome, SearchOutcome::Fit(_)));
    assert!(!report.attempts.is_empty());

    let json = report.attempts_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    let first = &parsed.as_array().unwrap()[0];
    assert_eq!(first["format"], "webp");
    assert!(first["fits"].as_bool().unwrap());
}

#[test]
fn invocations_do_not_share_attempt_state() {
    let orchestrator = Orchestrator::new(DEFAULT_ALPHABET, CodecConfig::default()).unwrap();
    let cfg = SearchConfig {
        budget: 5_000,
        initial_quality: 0.7,
        formats: vec![OutputFormat::Jpeg],
    };
    let first = orchestrator
        .pack(&mut FlatImage, cfg.clone(), Arc::new(AtomicBool::new(false)))
        .unwrap();
    let second = orchestrator
        .pack(&mut FlatImage, cfg, Arc::new(AtomicBool::new(false)))
        .unwrap();
    assert_eq!(first.attempts.len(), second.attempts.len());
}

#[test]
fn rejects_bad_alphabet() {
    assert!(Orchestrator::new("short", CodecConfig::default()).is_err());
}
