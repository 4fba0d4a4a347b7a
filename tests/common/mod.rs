//! Scripted collaborators for pipeline tests.

#![allow(dead_code)]

use crossbeam_channel::{Receiver, Sender, bounded};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use websift::error::ServiceError;
use websift::services::{AnalysisService, ByteFetcher, ImageDecoder, SearchService};
use websift::{
    AnalysisResult, DecodedImage, Face, FaceRectangle, SearchResultItem, Services,
};

/// Bytes the fake decoder refuses.
pub const CORRUPT: &[u8] = b"corrupt";

pub fn item(term: &str, i: usize) -> SearchResultItem {
    SearchResultItem {
        media_url: format!("http://{term}/full/{i}"),
        thumbnail_url: format!("http://{term}/thumb/{i}"),
        title: format!("{term} {i}"),
        source_url: format!("http://{term}/page/{i}"),
        width: Some(200),
        height: Some(100),
    }
}

// --- search ---

/// Returns `hits` items per query (capped at `top`), built from the search term.
pub struct FakeSearch {
    pub hits: usize,
    pub fail: bool,
    pub calls: AtomicUsize,
    pub last_args: Mutex<Option<(u32, u32)>>,
}

impl FakeSearch {
    pub fn new(hits: usize) -> Self {
        Self {
            hits,
            fail: false,
            calls: AtomicUsize::new(0),
            last_args: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(0)
        }
    }
}

impl SearchService for FakeSearch {
    fn query(&self, term: &str, skip: u32, top: u32) -> Result<Vec<SearchResultItem>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_args.lock().unwrap() = Some((skip, top));
        if self.fail {
            return Err(ServiceError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok((0..self.hits.min(top as usize))
            .map(|i| item(term, i))
            .collect())
    }
}

// --- fetcher ---

/// Serves bytes for any URL. URLs in `failing` error out, URLs in `corrupt` return undecodable
/// bytes, and URLs containing "slow" block until [`FakeFetcher::release`] is called.
pub struct FakeFetcher {
    failing: Mutex<HashSet<String>>,
    corrupt: Mutex<HashSet<String>>,
    gate_tx: Mutex<Option<Sender<()>>>,
    gate_rx: Receiver<()>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        let (gate_tx, gate_rx) = bounded(0);
        Self {
            failing: Mutex::new(HashSet::new()),
            corrupt: Mutex::new(HashSet::new()),
            gate_tx: Mutex::new(Some(gate_tx)),
            gate_rx,
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn fail(&self, url: impl Into<String>) {
        self.failing.lock().unwrap().insert(url.into());
    }

    pub fn corrupt(&self, url: impl Into<String>) {
        self.corrupt.lock().unwrap().insert(url.into());
    }

    /// Unblock every current and future "slow" fetch.
    pub fn release(&self) {
        self.gate_tx.lock().unwrap().take();
    }
}

impl ByteFetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if url.contains("slow") {
            let _ = self.gate_rx.recv();
        }
        if let Some(d) = self.delay {
            std::thread::sleep(d);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(url) {
            return Err(ServiceError::other(format!("connection reset: {url}")));
        }
        if self.corrupt.lock().unwrap().contains(url) {
            return Ok(CORRUPT.to_vec());
        }
        Ok(url.as_bytes().to_vec())
    }
}

// --- decoder ---

/// Any bytes except [`CORRUPT`] decode to a small blank image.
pub struct FakeDecoder;

impl ImageDecoder for FakeDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, ServiceError> {
        if bytes == CORRUPT {
            return Err(ServiceError::other("unrecognized image format"));
        }
        Ok(Arc::new(image::DynamicImage::new_rgba8(4, 4)))
    }
}

// --- analysis ---

/// Reports one face for every image unless `fail` or `panic` is set.
pub struct FakeAnalysis {
    pub fail: bool,
    pub panic: bool,
    pub calls: AtomicUsize,
}

impl FakeAnalysis {
    pub fn new() -> Self {
        Self {
            fail: false,
            panic: false,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Default for FakeAnalysis {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisService for FakeAnalysis {
    fn analyze(&self, image_url: &str) -> Result<AnalysisResult, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panic {
            panic!("analysis client crashed on {image_url}");
        }
        if self.fail {
            return Err(ServiceError::other(format!("quota exceeded for {image_url}")));
        }
        Ok(AnalysisResult {
            request_id: Some("req-1".into()),
            faces: vec![Face {
                age: 31,
                gender: "Female".into(),
                face_rectangle: FaceRectangle {
                    left: 20,
                    top: 30,
                    width: 40,
                    height: 40,
                },
            }],
            ..Default::default()
        })
    }
}

/// Handles onto the fakes behind a [`Services`] value.
pub struct Fakes {
    pub search: Arc<FakeSearch>,
    pub fetcher: Arc<FakeFetcher>,
    pub analysis: Arc<FakeAnalysis>,
}

impl Fakes {
    pub fn new(search: FakeSearch, fetcher: FakeFetcher, analysis: FakeAnalysis) -> Self {
        Self {
            search: Arc::new(search),
            fetcher: Arc::new(fetcher),
            analysis: Arc::new(analysis),
        }
    }

    pub fn with_hits(hits: usize) -> Self {
        Self::new(FakeSearch::new(hits), FakeFetcher::new(), FakeAnalysis::new())
    }

    pub fn services(&self) -> Services {
        Services {
            search: self.search.clone(),
            fetcher: self.fetcher.clone(),
            decoder: Arc::new(FakeDecoder),
            analysis: self.analysis.clone(),
        }
    }
}

/// Drain whatever is queued on `rx` without blocking.
pub fn drain<T>(rx: &Receiver<T>) -> Vec<T> {
    rx.try_iter().collect()
}
