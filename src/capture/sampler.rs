//! The live OCR sampling loop.
//!
//! Runs once per rendered frame of the capture preview. At most one
//! recognition call is ever outstanding; the in-flight flag is a backpressure
//! guard, not a queue. Recognition happens on a dedicated worker thread that
//! owns the engine and is torn down when the job channel closes.

use std::io::Cursor;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context as _, Result};
use image::RgbaImage;
use tracing::{debug, warn};

use crate::capture::median::SampleBuffer;
use crate::ocr::{RecognitionEngine, RecognitionError};

#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    /// Minimum delay between samples.
    pub interval: Duration,
    /// Exclusive validity bounds for parsed longitudes.
    pub long_range: (f64, f64),
    /// Exclusive validity bounds for parsed latitudes.
    pub lat_range: (f64, f64),
    /// Median window size.
    pub buffer_size: usize,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            long_range: (-560.0, 674.0),
            lat_range: (-674.0, 674.0),
            buffer_size: 4,
        }
    }
}

/// Interpret recognized text as a `(long, lat)` candidate.
///
/// Line 1 is latitude, line 2 longitude. The engine misreads 8 as `%`/`£`,
/// so those are mapped back before splitting. A read with fewer than two
/// lines, or whose first line is 4 characters or shorter, is treated as
/// garbage. Comma decimal separators are normalized to periods.
pub fn parse_reading(text: &str, config: &SampleConfig) -> Option<(f64, f64)> {
    let cleaned = text.replace('%', "8").replace('£', "8");
    let values: Vec<&str> = cleaned.split('\n').collect();
    if values.len() < 2 {
        return None;
    }
    let first = values[0].trim_end_matches('\r');
    if first.chars().count() <= 4 {
        return None;
    }
    let lat = parse_float_prefix(&first.replace(',', "."))?;
    let long = parse_float_prefix(&values[1].trim_end_matches('\r').replace(',', "."))?;
    if !lat.is_finite() || !long.is_finite() {
        return None;
    }
    if long <= config.long_range.0 || long >= config.long_range.1 {
        return None;
    }
    if lat <= config.lat_range.0 || lat >= config.lat_range.1 {
        return None;
    }
    Some((long, lat))
}

/// Longest leading float, tolerating trailing garbage the way the readout's
/// surrounding glyphs tend to leak into the crop.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'-' || bytes[i] == b'+') {
        i += 1;
    }
    let mut seen_dot = false;
    while i < bytes.len() {
        match bytes[i] {
            b'0'..=b'9' => i += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                i += 1;
            }
            _ => break,
        }
    }
    let candidate = s[..i].trim_end_matches('.');
    candidate.parse().ok()
}

struct Job {
    generation: u64,
    png: Vec<u8>,
}

struct JobResult {
    generation: u64,
    result: Result<String, RecognitionError>,
}

pub struct LiveSampler {
    jobs_tx: Sender<Job>,
    results_rx: Receiver<JobResult>,
    in_flight: bool,
    last_sample_at: Option<Instant>,
    pub buffer: SampleBuffer,
    config: SampleConfig,
    status: String,
}

impl LiveSampler {
    pub fn new(engine: Box<dyn RecognitionEngine>, config: SampleConfig) -> Result<Self> {
        let (jobs_tx, jobs_rx) = channel::<Job>();
        let (results_tx, results_rx) = channel::<JobResult>();

        std::thread::Builder::new()
            .name("ocr-worker".to_string())
            .spawn(move || {
                for job in jobs_rx {
                    let result = engine.recognize(&job.png);
                    if results_tx
                        .send(JobResult {
                            generation: job.generation,
                            result,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
            })
            .map_err(|err| anyhow!("failed to spawn OCR worker thread: {err}"))?;

        Ok(Self {
            jobs_tx,
            results_rx,
            in_flight: false,
            last_sample_at: None,
            buffer: SampleBuffer::new(config.buffer_size),
            config,
            status: String::new(),
        })
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether the cadence gate and the concurrency guard both allow a new
    /// sample right now.
    pub fn ready_to_sample(&self, now: Instant) -> bool {
        if self.in_flight {
            return false;
        }
        self.last_sample_at
            .map_or(true, |at| now.duration_since(at) >= self.config.interval)
    }

    /// Submit one cropped region for recognition.
    pub fn submit(&mut self, generation: u64, crop: &RgbaImage, now: Instant) -> Result<()> {
        let mut png = Vec::new();
        crop.write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .context("failed to encode OCR sample")?;
        self.jobs_tx
            .send(Job { generation, png })
            .map_err(|_| anyhow!("OCR worker is gone"))?;
        self.in_flight = true;
        self.last_sample_at = Some(now);
        Ok(())
    }

    /// Drain finished recognitions for the given session generation. Stale
    /// results from before a reset are dropped. Returns the new median point
    /// when a valid sample completed the window.
    pub fn poll(&mut self, generation: u64) -> Option<(f64, f64)> {
        let mut emitted = None;
        while let Ok(done) = self.results_rx.try_recv() {
            if done.generation != generation {
                // A current-generation job may still be queued behind this
                // one, so a stale result must not release the guard.
                debug!("dropping recognition result from a previous capture session");
                continue;
            }
            self.in_flight = false;
            match done.result {
                Ok(text) => match parse_reading(&text, &self.config) {
                    Some((long, lat)) => {
                        self.buffer.push(long, lat);
                        self.status = "Live OCR active.".to_string();
                        if let Some(point) = self.buffer.median_point() {
                            emitted = Some(point);
                        }
                    }
                    None => {
                        debug!(text = text.trim(), "discarding unreadable OCR sample");
                        self.status = "Unreadable sample dropped.".to_string();
                    }
                },
                Err(err) => {
                    warn!(error = %err, "recognition failed");
                    self.status = "OCR failed. Retrying...".to_string();
                }
            }
        }
        emitted
    }

    /// Clear buffered samples and the cadence/backpressure state.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.in_flight = false;
        self.last_sample_at = None;
        self.status.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedEngine {
        replies: Mutex<Vec<Result<String, RecognitionError>>>,
    }

    impl ScriptedEngine {
        fn with(replies: Vec<Result<String, RecognitionError>>) -> Box<Self> {
            Box::new(Self {
                replies: Mutex::new(replies),
            })
        }
    }

    impl RecognitionEngine for ScriptedEngine {
        fn recognize(&self, _png: &[u8]) -> Result<String, RecognitionError> {
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn crop() -> RgbaImage {
        RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 0, 255]))
    }

    fn drain(sampler: &mut LiveSampler, generation: u64) -> Option<(f64, f64)> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let point = sampler.poll(generation);
            if !sampler.in_flight() {
                return point;
            }
            assert!(Instant::now() < deadline, "worker never replied");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn single_line_read_is_rejected() {
        let config = SampleConfig::default();
        assert_eq!(parse_reading("12345\n", &config), None);
    }

    #[test]
    fn short_first_line_is_rejected() {
        let config = SampleConfig::default();
        assert_eq!(parse_reading("1234\n5678", &config), None);
    }

    #[test]
    fn comma_decimals_and_artifact_glyphs_parse() {
        let config = SampleConfig::default();
        // £/% are the engine's favorite stand-ins for 8.
        let reading = parse_reading("-123,45\n6£,2", &config).unwrap();
        assert!((reading.1 - (-123.45)).abs() < 1e-9);
        assert!((reading.0 - 68.2).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_pair_is_rejected() {
        let config = SampleConfig::default();
        assert_eq!(parse_reading("0.000\n1000", &config), None);
        assert_eq!(parse_reading("-700.0\n10", &config), None);
    }

    #[test]
    fn only_one_recognition_call_in_flight() {
        let mut sampler = LiveSampler::new(
            ScriptedEngine::with(vec![Ok("100.0\n200.0".to_string())]),
            SampleConfig {
                interval: Duration::ZERO,
                ..SampleConfig::default()
            },
        )
        .unwrap();

        let now = Instant::now();
        assert!(sampler.ready_to_sample(now));
        sampler.submit(1, &crop(), now).unwrap();
        assert!(!sampler.ready_to_sample(now));

        drain(&mut sampler, 1);
        assert!(sampler.ready_to_sample(Instant::now()));
        assert_eq!(sampler.buffer.len(), 1);
    }

    #[test]
    fn cadence_gate_blocks_until_interval_elapses() {
        let mut sampler = LiveSampler::new(
            ScriptedEngine::with(vec![Ok(String::new())]),
            SampleConfig {
                interval: Duration::from_secs(3600),
                ..SampleConfig::default()
            },
        )
        .unwrap();

        let now = Instant::now();
        sampler.submit(1, &crop(), now).unwrap();
        drain(&mut sampler, 1);
        // Call finished, but the interval has not elapsed.
        assert!(!sampler.ready_to_sample(Instant::now()));
    }

    #[test]
    fn stale_generation_results_are_ignored() {
        let mut sampler = LiveSampler::new(
            ScriptedEngine::with(vec![Ok("100.0\n200.0".to_string())]),
            SampleConfig {
                interval: Duration::ZERO,
                ..SampleConfig::default()
            },
        )
        .unwrap();

        sampler.submit(1, &crop(), Instant::now()).unwrap();
        sampler.reset();
        // The session restarted; the outstanding result belongs to
        // generation 1 and must be dropped whenever it lands.
        let deadline = Instant::now() + Duration::from_millis(200);
        while Instant::now() < deadline {
            assert_eq!(sampler.poll(2), None);
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(sampler.buffer.is_empty());
    }

    #[test]
    fn garbage_and_failures_drop_samples_silently() {
        let mut sampler = LiveSampler::new(
            ScriptedEngine::with(vec![
                Err(RecognitionError::BadOutput),
                Ok("garbage".to_string()),
            ]),
            SampleConfig {
                interval: Duration::ZERO,
                ..SampleConfig::default()
            },
        )
        .unwrap();

        sampler.submit(1, &crop(), Instant::now()).unwrap();
        assert_eq!(drain(&mut sampler, 1), None);
        sampler.submit(1, &crop(), Instant::now()).unwrap();
        assert_eq!(drain(&mut sampler, 1), None);
        assert!(sampler.buffer.is_empty());
        // The loop keeps going: a new submit is still accepted.
        assert!(sampler.ready_to_sample(Instant::now()));
    }

    #[test]
    fn full_window_emits_median_point() {
        // Replies pop from the end; submission order is bottom-up.
        let readings = vec![
            Ok("140.0\n1.0".to_string()),
            Ok("130.0\n30.0".to_string()),
            Ok("120.0\n5.0".to_string()),
            Ok("110.0\n10.0".to_string()),
        ];
        let mut sampler = LiveSampler::new(
            ScriptedEngine::with(readings),
            SampleConfig {
                interval: Duration::ZERO,
                ..SampleConfig::default()
            },
        )
        .unwrap();

        let mut last = None;
        for _ in 0..4 {
            sampler.submit(1, &crop(), Instant::now()).unwrap();
            if let Some(point) = drain(&mut sampler, 1) {
                last = Some(point);
            }
        }
        // Per-axis medians: longs [1, 5, 10, 30] and lats [110..140] both
        // take their index-2 element once the window of four fills.
        assert_eq!(last, Some((10.0, 130.0)));
    }

    /// Engine that blocks each recognition until the test releases it.
    struct GatedEngine {
        replies: Mutex<Vec<Result<String, RecognitionError>>>,
        gate: Mutex<Receiver<()>>,
    }

    impl RecognitionEngine for GatedEngine {
        fn recognize(&self, _png: &[u8]) -> Result<String, RecognitionError> {
            let _ = self.gate.lock().unwrap().recv();
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    #[test]
    fn stale_result_does_not_release_the_in_flight_guard() {
        let (gate_tx, gate_rx) = channel();
        let engine = Box::new(GatedEngine {
            replies: Mutex::new(vec![
                Ok("120.0\n210.0".to_string()),
                Ok("110.0\n200.0".to_string()),
            ]),
            gate: Mutex::new(gate_rx),
        });
        let mut sampler = LiveSampler::new(
            engine,
            SampleConfig {
                interval: Duration::ZERO,
                buffer_size: 1,
                ..SampleConfig::default()
            },
        )
        .unwrap();

        // A generation-1 job is mid-flight when the session restarts and a
        // generation-2 job is queued behind it.
        sampler.submit(1, &crop(), Instant::now()).unwrap();
        sampler.reset();
        sampler.submit(2, &crop(), Instant::now()).unwrap();
        assert!(sampler.in_flight());

        // Let the generation-1 job finish; draining its result must not
        // open the gate for a second outstanding generation-2 job.
        gate_tx.send(()).unwrap();
        let window = Instant::now() + Duration::from_millis(200);
        while Instant::now() < window {
            assert_eq!(sampler.poll(2), None);
            assert!(
                sampler.in_flight(),
                "stale result released the sampling guard"
            );
            std::thread::sleep(Duration::from_millis(5));
        }

        gate_tx.send(()).unwrap();
        let point = drain(&mut sampler, 2);
        assert_eq!(point, Some((210.0, 120.0)));
        assert!(!sampler.in_flight());
    }
}
