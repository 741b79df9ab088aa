//! Constrained compression search.
//!
//! Finds a `(format, quality, scale)` combination whose encoded locator
//! fits a hard symbol budget, spending as few renders as possible. Five
//! phases run in order: heuristic seed, bounded binary search over the
//! quality/scale rectangle, hill-climb refinement, an aggressive fixed
//! ladder, and a last-resort thumbnail. A success never exceeds the
//! budget; cancellation is cooperative and checked before every render.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::codec::RadixCodec;
use crate::error::{InlinkError, SearchError};
use crate::render::{OutputFormat, RenderPrimitive};

/// Quality/scale rectangles tried by the binary search, widest first.
/// Later presets recover from an unlucky initial range.
const BINARY_PRESETS: [(f64, f64, f64, f64); 3] = [
    (0.05, 0.95, 0.10, 1.00),
    (0.02, 0.60, 0.05, 0.70),
    (0.01, 0.35, 0.03, 0.40),
];
const MAX_BINARY_ITERATIONS: usize = 8;
/// Both axis ranges below this end a preset early.
const CONVERGENCE_TOLERANCE: f64 = 0.05;

const HILL_QUALITY_STEPS: [f64; 2] = [0.08, 0.02];
const HILL_SCALE_STEPS: [f64; 2] = [0.10, 0.03];
const MAX_HILL_ROUNDS: usize = 3;

const AGGRESSIVE_SCALES: [f64; 6] = [0.60, 0.50, 0.40, 0.30, 0.20, 0.10];
const AGGRESSIVE_QUALITIES: [f64; 4] = [0.50, 0.35, 0.20, 0.10];

/// Above this pixel area the seed render is pre-emptively downscaled.
const LARGE_IMAGE_AREA: u64 = 2_000_000;
/// Above this pixel area a failed search earns one thumbnail attempt.
const LAST_RESORT_AREA: u64 = 1_000_000;
const THUMBNAIL_MAX_DIM: u32 = 320;
const THUMBNAIL_QUALITY: f64 = 0.5;

/// One recorded trial. The ordered attempt log is append-only and is the
/// engine's observability surface.
#[derive(Debug, Clone, Serialize)]
pub struct SearchAttempt {
    pub format: OutputFormat,
    pub quality: f64,
    pub scale: f64,
    pub byte_len: usize,
    pub encoded_len: usize,
    pub fits: bool,
}

/// Mutable quality/scale rectangle narrowed monotonically by the binary
/// search. Owned by a single in-flight search.
#[derive(Debug, Clone)]
pub struct SearchBounds {
    pub min_quality: f64,
    pub max_quality: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl SearchBounds {
    fn converged(&self) -> bool {
        self.max_quality - self.min_quality < CONVERGENCE_TOLERANCE
            && self.max_scale - self.min_scale < CONVERGENCE_TOLERANCE
    }

    fn midpoint(&self) -> (f64, f64) {
        (
            (self.min_quality + self.max_quality) / 2.0,
            (self.min_scale + self.max_scale) / 2.0,
        )
    }
}

/// Successful search output.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub format: OutputFormat,
    pub quality: f64,
    pub scale: f64,
    pub encoded: String,
    pub byte_len: usize,
}

/// Terminal outcome of one search invocation.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Fit(SearchResult),
    Aborted,
    /// Nothing met the budget; `closest` is the smallest oversized
    /// attempt, reported so callers can show how near the miss was.
    Exhausted { closest: Option<SearchAttempt> },
}

/// Caller-supplied search parameters.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Hard maximum for the encoded string, in symbols.
    pub budget: usize,
    /// Quality of the first seed render, 0-1.
    pub initial_quality: f64,
    /// Candidate output formats, most preferred first.
    pub formats: Vec<OutputFormat>,
}

struct TrialRecord {
    format: OutputFormat,
    quality: f64,
    scale: f64,
    byte_len: usize,
    encoded_len: usize,
    fits: bool,
    encoded: Option<String>,
}

impl TrialRecord {
    fn into_result(self) -> SearchResult {
        SearchResult {
            format: self.format,
            quality: self.quality,
            scale: self.scale,
            byte_len: self.byte_len,
            // `fits` implies the encoded string was kept.
            encoded: self.encoded.unwrap_or_default(),
        }
    }
}

enum Trial {
    Aborted,
    RenderFailed(String),
    Done(TrialRecord),
}

/// One-shot search driver. Create a fresh engine per payload; attempt
/// history and bounds are never shared between invocations.
pub struct SearchEngine<'a> {
    codec: &'a mut RadixCodec,
    cfg: SearchConfig,
    abort: Arc<AtomicBool>,
    attempts: Vec<SearchAttempt>,
    best: Option<SearchResult>,
}

impl<'a> SearchEngine<'a> {
    pub fn new(codec: &'a mut RadixCodec, cfg: SearchConfig, abort: Arc<AtomicBool>) -> Self {
        Self {
            codec,
            cfg,
            abort,
            attempts: Vec::new(),
            best: None,
        }
    }

    /// Ordered log of every trial made so far.
    pub fn attempts(&self) -> &[SearchAttempt] {
        &self.attempts
    }

    pub fn run(&mut self, image: &mut dyn RenderPrimitive) -> Result<SearchOutcome, InlinkError> {
        if self.cfg.budget == 0 {
            return Err(InlinkError::Config("budget must be positive".into()));
        }
        if self.cfg.formats.is_empty() {
            return Err(InlinkError::Config("no candidate formats".into()));
        }
        if !(0.0..=1.0).contains(&self.cfg.initial_quality) {
            return Err(InlinkError::Config(format!(
                "initial quality {} outside 0..=1",
                self.cfg.initial_quality
            )));
        }

        let (width, height) = image.dimensions();
        let area = width as u64 * height as u64;
        let seed_scale = if area > LARGE_IMAGE_AREA {
            (LARGE_IMAGE_AREA as f64 / area as f64).sqrt()
        } else {
            1.0
        };

        // Phase 1: heuristic seed. The common case for small payloads.
        let formats = self.cfg.formats.clone();
        let mut primary: Option<(OutputFormat, usize)> = None;
        for &format in &formats {
            match self.trial(image, format, self.cfg.initial_quality, seed_scale)? {
                Trial::Aborted => return Ok(self.abort_outcome()),
                Trial::RenderFailed(msg) => {
                    log::warn!("seed render failed for {format:?}: {msg}");
                }
                Trial::Done(rec) => {
                    if rec.fits {
                        let result = rec.into_result();
                        self.best = Some(result.clone());
                        return Ok(SearchOutcome::Fit(result));
                    }
                    if primary.map_or(true, |(_, len)| rec.encoded_len < len) {
                        primary = Some((format, rec.encoded_len));
                    }
                }
            }
        }
        let format = match primary {
            Some((f, _)) => f,
            None => {
                return Err(SearchError::Render("every candidate format failed".into()).into())
            }
        };

        // Phase 2: bounded binary search over the parameter rectangle.
        let mut champion: Option<TrialRecord> = None;
        for preset in BINARY_PRESETS {
            let mut bounds = SearchBounds {
                min_quality: preset.0,
                max_quality: preset.1,
                min_scale: preset.2,
                max_scale: preset.3,
            };
            for _ in 0..MAX_BINARY_ITERATIONS {
                if bounds.converged() {
                    break;
                }
                let (quality, scale) = bounds.midpoint();
                match self.trial(image, format, quality, scale)? {
                    Trial::Aborted => return Ok(self.abort_outcome()),
                    Trial::RenderFailed(msg) => {
                        return Err(SearchError::Render(msg).into());
                    }
                    Trial::Done(rec) => {
                        if rec.fits {
                            // Expand toward higher quality.
                            bounds.min_quality = quality;
                            bounds.min_scale = scale;
                            let better = champion
                                .as_ref()
                                .map_or(true, |c| rec.encoded_len < c.encoded_len);
                            if better {
                                self.best = Some(rec_result(&rec));
                                champion = Some(rec);
                            }
                        } else {
                            // Shrink toward more aggressive settings.
                            bounds.max_quality = quality;
                            bounds.max_scale = scale;
                        }
                    }
                }
            }
            if champion.is_some() {
                break;
            }
        }

        // Phase 3: hill-climb the best fit toward higher quality.
        if let Some(mut current) = champion {
            for _ in 0..MAX_HILL_ROUNDS {
                let mut improved = false;
                for step in 0..HILL_QUALITY_STEPS.len() {
                    let quality = (current.quality + HILL_QUALITY_STEPS[step]).min(1.0);
                    if quality > current.quality {
                        match self.trial(image, format, quality, current.scale)? {
                            Trial::Aborted => return Ok(self.abort_outcome()),
                            Trial::RenderFailed(msg) => {
                                return Err(SearchError::Render(msg).into())
                            }
                            Trial::Done(rec) => {
                                if rec.fits && rec.byte_len >= current.byte_len {
                                    self.best = Some(rec_result(&rec));
                                    current = rec;
                                    improved = true;
                                }
                            }
                        }
                    }
                    let scale = (current.scale + HILL_SCALE_STEPS[step]).min(1.0);
                    if scale > current.scale {
                        match self.trial(image, format, current.quality, scale)? {
                            Trial::Aborted => return Ok(self.abort_outcome()),
                            Trial::RenderFailed(msg) => {
                                return Err(SearchError::Render(msg).into())
                            }
                            Trial::Done(rec) => {
                                if rec.fits && rec.byte_len >= current.byte_len {
                                    self.best = Some(rec_result(&rec));
                                    current = rec;
                                    improved = true;
                                }
                            }
                        }
                    }
                }
                if !improved {
                    break;
                }
            }
            return Ok(SearchOutcome::Fit(current.into_result()));
        }

        // Phase 4: aggressive ladder. First success wins to bound cost.
        for &scale in &AGGRESSIVE_SCALES {
            for &quality in &AGGRESSIVE_QUALITIES {
                match self.trial(image, format, quality, scale)? {
                    Trial::Aborted => return Ok(self.abort_outcome()),
                    Trial::RenderFailed(msg) => return Err(SearchError::Render(msg).into()),
                    Trial::Done(rec) => {
                        if rec.fits {
                            let result = rec.into_result();
                            self.best = Some(result.clone());
                            return Ok(SearchOutcome::Fit(result));
                        }
                    }
                }
            }
        }

        // Phase 5: one thumbnail render for big images, then give up.
        if area > LAST_RESORT_AREA {
            let scale = THUMBNAIL_MAX_DIM as f64 / width.max(height) as f64;
            match self.trial(image, format, THUMBNAIL_QUALITY, scale.min(1.0))? {
                Trial::Aborted => return Ok(self.abort_outcome()),
                Trial::RenderFailed(msg) => return Err(SearchError::Render(msg).into()),
                Trial::Done(rec) => {
                    if rec.fits {
                        let result = rec.into_result();
                        self.best = Some(result.clone());
                        return Ok(SearchOutcome::Fit(result));
                    }
                }
            }
        }

        log::info!(
            "search exhausted after {} attempts without meeting budget {}",
            self.attempts.len(),
            self.cfg.budget
        );
        Ok(SearchOutcome::Exhausted {
            closest: self.closest_miss(),
        })
    }

    /// Smallest oversized attempt, for failure reporting.
    fn closest_miss(&self) -> Option<SearchAttempt> {
        self.attempts
            .iter()
            .filter(|a| !a.fits)
            .min_by_key(|a| a.encoded_len)
            .cloned()
    }

    fn abort_outcome(&self) -> SearchOutcome {
        // A cancelled search still surrenders the best fit found so far.
        match &self.best {
            Some(result) => SearchOutcome::Fit(result.clone()),
            None => SearchOutcome::Aborted,
        }
    }

    /// Render and measure one parameter combination. Checks the abort
    /// flag before the render; never encodes a candidate the length
    /// estimate already rules out.
    fn trial(
        &mut self,
        image: &mut dyn RenderPrimitive,
        format: OutputFormat,
        quality: f64,
        scale: f64,
    ) -> Result<Trial, InlinkError> {
        if self.abort.load(Ordering::Relaxed) {
            return Ok(Trial::Aborted);
        }
        let (width, height) = image.dimensions();
        let target_w = ((width as f64 * scale).round() as u32).max(1);
        let target_h = ((height as f64 * scale).round() as u32).max(1);
        let quality = quality.clamp(0.0, 1.0);

        let bytes = match image.render(format, quality, target_w, target_h) {
            Ok(b) => b,
            Err(e) => return Ok(Trial::RenderFailed(e.to_string())),
        };

        let estimate = self.codec.estimate_encoded_length(bytes.len());
        let (encoded, encoded_len) = if estimate > self.cfg.budget {
            (None, estimate)
        } else {
            let s = self.codec.encode(&bytes);
            let len = s.chars().count();
            (Some(s), len)
        };
        let fits = encoded.is_some() && encoded_len <= self.cfg.budget;

        let record = TrialRecord {
            format,
            quality,
            scale,
            byte_len: bytes.len(),
            encoded_len,
            fits,
            encoded: if fits { encoded } else { None },
        };
        self.attempts.push(SearchAttempt {
            format,
            quality,
            scale,
            byte_len: record.byte_len,
            encoded_len,
            fits,
        });
        Ok(Trial::Done(record))
    }
}

fn rec_result(rec: &TrialRecord) -> SearchResult {
    SearchResult {
        format: rec.format,
        quality: rec.quality,
        scale: rec.scale,
        encoded: rec.encoded.clone().unwrap_or_default(),
        byte_len: rec.byte_len,
    }
}
