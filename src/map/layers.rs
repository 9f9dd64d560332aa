//! Per-URL image cache backing the map's layer stack.
//!
//! Decoding happens on background threads; results are delivered over a
//! channel and applied on the UI thread by [`ImageCache::poll`]. Entries are
//! mutated only through the `mark_*` transitions. A failed load is retried the
//! next time the URL is requested after a short cooldown, so load errors are
//! never permanently fatal for a URL.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use eframe::egui::{ColorImage, Context, TextureHandle, TextureOptions};
use tracing::{debug, warn};

const ERROR_RETRY_COOLDOWN: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerStatus {
    Pending,
    Loading,
    Loaded,
    Error,
}

pub struct ImageCacheEntry {
    pub status: LayerStatus,
    pub texture: Option<TextureHandle>,
    pub error: Option<String>,
    failed_at: Option<Instant>,
}

impl ImageCacheEntry {
    fn pending() -> Self {
        Self {
            status: LayerStatus::Pending,
            texture: None,
            error: None,
            failed_at: None,
        }
    }
}

/// Decodes a layer URL into pixels. Swapped for an in-process fake in tests.
pub trait ImageLoader: Send + Sync + 'static {
    fn load(&self, url: &str) -> Result<ColorImage>;
}

/// Resolves layer URLs against an asset directory on disk.
pub struct FsImageLoader {
    pub base_dir: PathBuf,
}

impl ImageLoader for FsImageLoader {
    fn load(&self, url: &str) -> Result<ColorImage> {
        let path = self.base_dir.join(url);
        let img = image::open(&path)
            .with_context(|| format!("failed to load {}", path.display()))?
            .to_rgba8();
        let size = [img.width() as usize, img.height() as usize];
        Ok(ColorImage::from_rgba_unmultiplied(size, img.as_raw()))
    }
}

struct LoadResult {
    url: String,
    result: Result<ColorImage>,
}

pub struct ImageCache {
    loader: Arc<dyn ImageLoader>,
    entries: HashMap<String, ImageCacheEntry>,
    results_tx: Sender<LoadResult>,
    results_rx: Receiver<LoadResult>,
    loads_started: usize,
}

impl ImageCache {
    pub fn new(loader: Arc<dyn ImageLoader>) -> Self {
        let (results_tx, results_rx) = channel();
        Self {
            loader,
            entries: HashMap::new(),
            results_tx,
            results_rx,
            loads_started: 0,
        }
    }

    pub fn entry(&self, url: &str) -> Option<&ImageCacheEntry> {
        self.entries.get(url)
    }

    /// Number of background loads ever started; one per URL unless a load
    /// failed and was retried.
    pub fn loads_started(&self) -> usize {
        self.loads_started
    }

    /// Ensure `url` has an entry and kick off a load if it is pending, or if a
    /// previous attempt failed and the cooldown has lapsed. Requesting a URL
    /// that is already loading or loaded is a no-op.
    pub fn request(&mut self, url: &str) {
        let entry = self
            .entries
            .entry(url.to_string())
            .or_insert_with(ImageCacheEntry::pending);
        let retry = entry.status == LayerStatus::Error
            && entry
                .failed_at
                .map_or(true, |at| at.elapsed() >= ERROR_RETRY_COOLDOWN);
        if entry.status != LayerStatus::Pending && !retry {
            return;
        }

        entry.status = LayerStatus::Loading;
        entry.error = None;
        self.loads_started += 1;

        let loader = Arc::clone(&self.loader);
        let tx = self.results_tx.clone();
        let owned_url = url.to_string();
        std::thread::spawn(move || {
            let result = loader.load(&owned_url);
            let _ = tx.send(LoadResult {
                url: owned_url,
                result,
            });
        });
    }

    /// Apply finished loads. Called once per frame on the UI thread.
    pub fn poll(&mut self, ctx: &Context) {
        while let Ok(done) = self.results_rx.try_recv() {
            match done.result {
                Ok(pixels) => {
                    let texture = ctx.load_texture(&done.url, pixels, TextureOptions::LINEAR);
                    debug!(url = %done.url, "map layer loaded");
                    self.mark_loaded(&done.url, texture);
                }
                Err(err) => {
                    warn!(url = %done.url, error = %err, "map layer failed to load");
                    self.mark_error(&done.url, err.to_string());
                }
            }
        }
    }

    fn mark_loaded(&mut self, url: &str, texture: TextureHandle) {
        if let Some(entry) = self.entries.get_mut(url) {
            entry.status = LayerStatus::Loaded;
            entry.texture = Some(texture);
            entry.error = None;
            entry.failed_at = None;
        }
    }

    fn mark_error(&mut self, url: &str, message: String) {
        if let Some(entry) = self.entries.get_mut(url) {
            entry.status = LayerStatus::Error;
            entry.texture = None;
            entry.error = Some(message);
            entry.failed_at = Some(Instant::now());
        }
    }
}
