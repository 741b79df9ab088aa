use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use inlink::{
    Alphabet, CodecConfig, OutputFormat, RadixCodec, RenderError, RenderPrimitive, SearchConfig,
    SearchEngine, SearchOutcome, DEFAULT_ALPHABET,
};

/// Render stand-in whose output size shrinks monotonically with lower
/// quality and smaller dimensions.
struct MonotoneImage {
    width: u32,
    height: u32,
    renders: usize,
    abort_after_render: Option<Arc<AtomicBool>>,
}

impl MonotoneImage {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            renders: 0,
            abort_after_render: None,
        }
    }
}

impl RenderPrimitive for MonotoneImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn render(
        &mut self,
        _format: OutputFormat,
        quality: f64,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        self.renders += 1;
        if let Some(flag) = &self.abort_after_render {
            flag.store(true, Ordering::Relaxed);
        }
        let area = width as f64 * height as f64;
        let len = (area * (0.05 + 0.95 * quality) * 0.25) as usize + 16;
        Ok((0..len).map(|i| (i * 31 % 256) as u8).collect())
    }
}

/// Renderer whose output never shrinks, for exhaustion scenarios.
struct IncompressibleImage;

impl RenderPrimitive for IncompressibleImage {
    fn dimensions(&self) -> (u32, u32) {
        (100, 100)
    }

    fn render(
        &mut self,
        _format: OutputFormat,
        _quality: f64,
        _width: u32,
        _height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        Ok(vec![0xA5; 10_000])
    }
}

fn codec() -> RadixCodec {
    RadixCodec::new(
        Alphabet::new(DEFAULT_ALPHABET).unwrap(),
        CodecConfig::default(),
    )
    .unwrap()
}

fn search_cfg(budget: usize) -> SearchConfig {
    SearchConfig {
        budget,
        initial_quality: 0.8,
        formats: vec![OutputFormat::Jpeg],
    }
}

#[test]
fn generous_budget_fits_on_seed() {
    let mut codec = codec();
    let mut image = MonotoneImage::new(100, 100);
    let abort = Arc::new(AtomicBool::new(false));
    let mut engine = SearchEngine::new(&mut codec, search_cfg(10_000), abort);

    let outcome = engine.run(&mut image).unwrap();
    match outcome {
        SearchOutcome::Fit(result) => {
            assert_eq!(result.scale, 1.0);
            assert!(result.encoded.chars().count() <= 10_000);
        }
        other => panic!("expected fit, got {other:?}"),
    }
    assert_eq!(image.renders, 1);
    assert_eq!(engine.attempts().len(), 1);
    assert!(engine.attempts()[0].fits);
}

#[test]
fn tight_budget_converges_within_bounds() {
    let mut codec = codec();
    let mut image = MonotoneImage::new(100, 100);
    let abort = Arc::new(AtomicBool::new(false));
    let budget = 1_000;
    let mut engine = SearchEngine::new(&mut codec, search_cfg(budget), abort);

    let outcome = engine.run(&mut image).unwrap();
    let result = match outcome {
        SearchOutcome::Fit(result) => result,
        other => panic!("expected fit, got {other:?}"),
    };
    assert!(result.encoded.chars().count() <= budget);

    // Seed + 3 presets of 8 iterations + hill climb rounds is the hard
    // ceiling on renders.
    assert!(image.renders <= 1 + 3 * 8 + 3 * 4);
    // Every logged success honours the budget.
    for attempt in engine.attempts() {
        if attempt.fits {
            assert!(attempt.encoded_len <= budget);
        }
    }
    // The seed trial is recorded first, at the caller's quality.
    assert_eq!(engine.attempts()[0].quality, 0.8);
}

#[test]
fn success_never_exceeds_budget() {
    for budget in [300usize, 800, 2_000, 6_000] {
        let mut codec = codec();
        let mut image = MonotoneImage::new(120, 90);
        let abort = Arc::new(AtomicBool::new(false));
        let mut engine = SearchEngine::new(&mut codec, search_cfg(budget), abort);
        if let SearchOutcome::Fit(result) = engine.run(&mut image).unwrap() {
            assert!(
                result.encoded.chars().count() <= budget,
                "budget {budget} violated"
            );
        }
    }
}

#[test]
fn exhausted_search_reports_closest_miss() {
    let mut codec = codec();
    let mut image = IncompressibleImage;
    let abort = Arc::new(AtomicBool::new(false));
    let mut engine = SearchEngine::new(&mut codec, search_cfg(100), abort);

    match engine.run(&mut image).unwrap() {
        SearchOutcome::Exhausted { closest } => {
            let closest = closest.expect("attempts were made");
            assert!(!closest.fits);
            assert!(closest.encoded_len > 100);
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[test]
fn preset_abort_returns_immediately() {
    let mut codec = codec();
    let mut image = MonotoneImage::new(100, 100);
    let abort = Arc::new(AtomicBool::new(true));
    let mut engine = SearchEngine::new(&mut codec, search_cfg(1_000), abort);

    match engine.run(&mut image).unwrap() {
        SearchOutcome::Aborted => {}
        other => panic!("expected abort, got {other:?}"),
    }
    assert_eq!(image.renders, 0);
}

#[test]
fn mid_search_abort_stops_after_current_render() {
    let mut codec = codec();
    let abort = Arc::new(AtomicBool::new(false));
    let mut image = MonotoneImage::new(100, 100);
    image.abort_after_render = Some(abort.clone());

    // Budget low enough that the first render cannot fit.
    let mut engine = SearchEngine::new(&mut codec, search_cfg(50), abort);
    match engine.run(&mut image).unwrap() {
        SearchOutcome::Aborted => {}
        other => panic!("expected abort, got {other:?}"),
    }
    // The in-flight render completes; nothing further starts.
    assert_eq!(image.renders, 1);
}

#[test]
fn large_image_seed_is_prescaled() {
    let mut codec = codec();
    let mut image = MonotoneImage::new(4_000, 3_000);
    let abort = Arc::new(AtomicBool::new(false));
    let mut engine = SearchEngine::new(&mut codec, search_cfg(2_000_000), abort);

    let _ = engine.run(&mut image).unwrap();
    assert!(engine.attempts()[0].scale < 1.0);
}

#[test]
fn rejects_empty_format_list() {
    let mut codec = codec();
    let mut image = MonotoneImage::new(10, 10);
    let abort = Arc::new(AtomicBool::new(false));
    let cfg = SearchConfig {
        budget: 100,
        initial_quality: 0.8,
        formats: Vec::new(),
    };
    let mut engine = SearchEngine::new(&mut codec, cfg, abort);
    assert!(engine.run(&mut image).is_err());
}
