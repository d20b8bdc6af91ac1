// SPDX-License-Identifier: GPL-3.0-only

//! Frame dispatcher
//!
//! Admits camera frames into analysis one at a time and turns the first
//! terminal decode result into exactly one host callback.
//!
//! Admission is decided synchronously on the caller's thread, in order:
//!
//! 1. session terminated: drop
//! 2. scan button not pressed yet: drop
//! 3. another frame in flight: drop (a single atomic busy flag)
//! 4. less than the minimum interval since the last accepted frame: drop
//!
//! An accepted frame is converted and cropped on the blocking pool, then
//! decoded. `NotFound` returns the session to idle; anything else ends it.
//! Cancellation bumps a generation counter so a late decode completion is
//! discarded instead of delivered. Every frame is released exactly once,
//! whichever way it leaves.

use crate::camera::Frame;
use crate::config::ScanConfig;
use crate::decoders::{self, BackendKind, DecodeBackend, DecodeResult};
use crate::errors::{ErrorKind, ScanError, ScanResult};
use crate::frame_processor::result_channel::ResultChannel;
use crate::frame_processor::types::{Admission, DropReason, SessionState};
use crate::media::{geometry, yuv_converter};
use futures::{FutureExt, Stream, StreamExt};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

/// Constructs the backend for a session
pub type BackendFactory = Box<dyn Fn(BackendKind) -> Arc<dyn DecodeBackend> + Send + Sync>;

struct Inner {
    session_id: Uuid,
    config: ScanConfig,
    kind: BackendKind,
    portrait: AtomicBool,
    /// Armed by the scan button, or from the start without one
    scanning: AtomicBool,
    busy: AtomicBool,
    terminated: AtomicBool,
    generation: AtomicU64,
    last_accepted: Mutex<Option<Instant>>,
    backend: Mutex<Option<Arc<dyn DecodeBackend>>>,
    factory: BackendFactory,
    results: ResultChannel,
    runtime: Handle,
}

/// Per-session frame admission and analysis
///
/// Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct FrameDispatcher {
    inner: Arc<Inner>,
}

/// Builder for [`FrameDispatcher`]
pub struct DispatcherBuilder {
    config: ScanConfig,
    factory: Option<BackendFactory>,
    runtime: Option<Handle>,
}

impl DispatcherBuilder {
    /// Replace the default backend constructor
    pub fn backend_factory(
        mut self,
        factory: impl Fn(BackendKind) -> Arc<dyn DecodeBackend> + Send + Sync + 'static,
    ) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Use one fixed backend regardless of the configured identifier
    pub fn backend(self, backend: Arc<dyn DecodeBackend>) -> Self {
        self.backend_factory(move |_| backend.clone())
    }

    /// Runtime analysis tasks are spawned on (defaults to the current one)
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Start the session
    ///
    /// A rejected configuration is reported through `results` as well as
    /// returned.
    pub fn build(self, results: ResultChannel) -> ScanResult<FrameDispatcher> {
        let runtime = match self.config.validate() {
            Ok(()) => match self.runtime {
                Some(runtime) => Ok(runtime),
                None => Handle::try_current().map_err(|e| ScanError::Other(e.to_string())),
            },
            Err(e) => Err(e),
        };

        let runtime = match runtime {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "Cannot start scan session");
                results.fail(e.kind());
                return Err(e);
            }
        };

        let session_id = Uuid::new_v4();
        let kind = self.config.backend_kind();
        info!(
            session = %session_id,
            library = %kind,
            portrait = self.config.portrait,
            scan_button = self.config.scan_button,
            "Scan session started"
        );

        Ok(FrameDispatcher {
            inner: Arc::new(Inner {
                session_id,
                kind,
                portrait: AtomicBool::new(self.config.portrait),
                scanning: AtomicBool::new(!self.config.scan_button),
                busy: AtomicBool::new(false),
                terminated: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                last_accepted: Mutex::new(None),
                backend: Mutex::new(None),
                factory: self
                    .factory
                    .unwrap_or_else(|| Box::new(decoders::create_backend)),
                config: self.config,
                results,
                runtime,
            }),
        })
    }
}

impl FrameDispatcher {
    pub fn builder(config: ScanConfig) -> DispatcherBuilder {
        DispatcherBuilder {
            config,
            factory: None,
            runtime: None,
        }
    }

    /// Start a session with the default backend on the current runtime
    pub fn new(config: ScanConfig, results: ResultChannel) -> ScanResult<Self> {
        Self::builder(config).build(results)
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.inner.kind
    }

    pub fn state(&self) -> SessionState {
        if self.inner.terminated.load(Ordering::SeqCst) {
            SessionState::Terminated
        } else if self.inner.busy.load(Ordering::SeqCst) {
            SessionState::Analyzing
        } else {
            SessionState::Idle
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.terminated.load(Ordering::SeqCst)
    }

    /// Update the device orientation used for subsequent frames
    pub fn set_portrait(&self, portrait: bool) {
        if self.inner.portrait.swap(portrait, Ordering::SeqCst) != portrait {
            debug!(session = %self.inner.session_id, portrait, "Orientation changed");
        }
    }

    /// Arm or disarm analysis (scan button)
    pub fn set_scanning(&self, scanning: bool) {
        if self.inner.scanning.swap(scanning, Ordering::SeqCst) != scanning {
            info!(session = %self.inner.session_id, scanning, "Scanning toggled");
        }
    }

    /// Hand a frame to the session
    ///
    /// Returns immediately. A dropped frame has already been released when
    /// this returns; an accepted one is released when its analysis ends.
    pub fn submit(&self, frame: Frame) -> Admission {
        match self.inner.admit() {
            Ok(generation) => {
                let inner = Arc::clone(&self.inner);
                let handle = self
                    .inner
                    .runtime
                    .spawn(async move { inner.analyze(frame, generation).await });
                Admission::Accepted(handle)
            }
            Err(reason) => {
                trace!(?reason, "Dropping frame");
                frame.release();
                Admission::Dropped(reason)
            }
        }
    }

    /// Submit a frame and wait for its analysis
    pub async fn process(&self, frame: Frame) -> Result<DecodeResult, DropReason> {
        match self.submit(frame) {
            Admission::Accepted(handle) => Ok(handle.await.unwrap_or_else(|e| {
                error!(error = %e, "Analysis task failed");
                DecodeResult::Error(ErrorKind::GeneralScanningError)
            })),
            Admission::Dropped(reason) => Err(reason),
        }
    }

    /// Feed frames from a camera stream until the session ends
    ///
    /// Frames left in the stream are released when it is dropped.
    pub async fn run<S>(&self, frames: S)
    where
        S: Stream<Item = Frame>,
    {
        let mut frames = std::pin::pin!(frames);
        while let Some(frame) = frames.next().await {
            if self.is_terminated() {
                frame.release();
                break;
            }
            self.submit(frame);
        }
        debug!(session = %self.inner.session_id, "Frame stream finished");
    }

    /// End the session as cancelled by the host
    ///
    /// Does not wait for an in-flight decode; its result is discarded.
    pub fn cancel(&self) -> bool {
        self.abort(ErrorKind::ScanCancelled)
    }

    /// End the session with an error raised outside the pipeline
    ///
    /// Returns false if the session had already ended.
    pub fn abort(&self, kind: ErrorKind) -> bool {
        if !self.inner.terminate() {
            return false;
        }
        info!(session = %self.inner.session_id, code = kind.code(), "Scan session aborted");
        self.inner.results.fail(kind);
        true
    }
}

impl Inner {
    fn admit(&self) -> Result<u64, DropReason> {
        if self.terminated.load(Ordering::SeqCst) {
            return Err(DropReason::Terminated);
        }
        if !self.scanning.load(Ordering::SeqCst) {
            return Err(DropReason::Disarmed);
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(DropReason::Busy);
        }

        // Read before the terminated re-check so a racing cancel is seen at completion
        let generation = self.generation.load(Ordering::SeqCst);
        if self.terminated.load(Ordering::SeqCst) {
            self.busy.store(false, Ordering::SeqCst);
            return Err(DropReason::Terminated);
        }

        if self.throttled() {
            self.busy.store(false, Ordering::SeqCst);
            return Err(DropReason::Throttled);
        }

        Ok(generation)
    }

    /// Check the throttle and, if clear, stamp this frame as accepted
    fn throttled(&self) -> bool {
        let now = Instant::now();
        let interval = self.config.min_analysis_interval();

        let Ok(mut last) = self.last_accepted.lock() else {
            return false;
        };
        let throttled = match (interval, *last) {
            (Some(interval), Some(last)) => now.duration_since(last) < interval,
            _ => false,
        };
        if !throttled {
            *last = Some(now);
        }
        throttled
    }

    async fn analyze(self: Arc<Self>, frame: Frame, generation: u64) -> DecodeResult {
        let backend = self.backend();
        let target = backend.input_format();
        let width_ratio = self.config.width_ratio;
        let height_ratio = self.config.height_ratio;
        let portrait = self.portrait.load(Ordering::SeqCst);

        let prepared = tokio::task::spawn_blocking(move || {
            let prepared = yuv_converter::convert(&frame, target).map(|buffer| {
                geometry::prepare(buffer, frame.rotation, width_ratio, height_ratio, portrait)
            });
            (frame, prepared)
        })
        .await;

        let (frame, result) = match prepared {
            Ok((frame, Ok((buffer, residual)))) => {
                trace!(
                    width = buffer.width(),
                    height = buffer.height(),
                    rotation = %residual,
                    "Frame prepared"
                );
                let decoded = match panic::catch_unwind(AssertUnwindSafe(|| {
                    backend.decode(buffer, residual)
                })) {
                    Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
                    Err(payload) => Err(payload),
                };
                let result = decoded.unwrap_or_else(|_| {
                    error!(backend = %backend.kind(), "Decoder panicked");
                    DecodeResult::Error(backend.kind().error_kind())
                });
                (Some(frame), result)
            }
            Ok((frame, Err(e))) => {
                warn!(error = %e, "Frame conversion failed");
                (Some(frame), DecodeResult::Error(ErrorKind::GeneralScanningError))
            }
            Err(e) => {
                // The frame was dropped, and released, while unwinding
                error!(error = %e, "Frame preparation panicked");
                (None, DecodeResult::Error(ErrorKind::GeneralScanningError))
            }
        };

        self.finish(generation, &result);
        drop(frame);
        result
    }

    fn finish(&self, generation: u64, result: &DecodeResult) {
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(session = %self.session_id, "Discarding result of cancelled analysis");
            return;
        }

        match result {
            DecodeResult::NotFound => {
                trace!("No code in frame");
                self.busy.store(false, Ordering::SeqCst);
            }
            DecodeResult::Found(text) => {
                if self.terminate() {
                    info!(session = %self.session_id, len = text.len(), "Code scanned");
                    self.results.succeed(text.clone());
                }
            }
            DecodeResult::Error(kind) => {
                if self.terminate() {
                    warn!(session = %self.session_id, code = kind.code(), "Scan failed");
                    self.results.fail(*kind);
                }
            }
        }
    }

    /// Move to terminated and tear down the backend
    ///
    /// Returns false if the session had already ended.
    fn terminate(&self) -> bool {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.busy.store(false, Ordering::SeqCst);
        if let Ok(mut slot) = self.backend.lock() {
            slot.take();
        }
        true
    }

    /// The session's backend, constructed on first use
    fn backend(&self) -> Arc<dyn DecodeBackend> {
        let mut slot = match self.backend.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(backend) = slot.as_ref() {
            return Arc::clone(backend);
        }

        debug!(session = %self.session_id, library = %self.kind, "Creating decode backend");
        let backend = (self.factory)(self.kind);
        // A session that already ended keeps no backend around
        if !self.terminated.load(Ordering::SeqCst) {
            *slot = Some(Arc::clone(&backend));
        }
        backend
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if !self.terminated.load(Ordering::SeqCst) {
            debug!(session = %self.session_id, "Scan session dropped without a result");
        }
    }
}

impl fmt::Debug for FrameDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameDispatcher")
            .field("session_id", &self.inner.session_id)
            .field("backend", &self.inner.kind)
            .field("state", &self.state())
            .finish()
    }
}
