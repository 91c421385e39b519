//! Per-frame transform pipeline.
//!
//! One driving thread walks every frame through
//! `AwaitFilledSlot -> Decoding -> GreyReducing -> Resampling -> Rendering -> Releasing`
//! before touching the next one. Only the grey and resample stages fan out
//! to worker threads, and both join before returning.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::decode::{DecodeError, FrameDecoder};
use crate::device::{CaptureDevice, DeviceError, DeviceRingBuffer};
use crate::frame::FrameBuffer;
use crate::render::{FrameRenderer, RenderError};
use crate::transform::{check_scale, GreyReducer, Resampler, TransformError};

/// Default bound on waiting for a filled slot.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Where a frame currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AwaitFilledSlot,
    Decoding,
    GreyReducing,
    Resampling,
    Rendering,
    Releasing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::AwaitFilledSlot => "waiting for frame",
            Stage::Decoding => "decoding",
            Stage::GreyReducing => "grey reduction",
            Stage::Resampling => "resampling",
            Stage::Rendering => "rendering",
            Stage::Releasing => "releasing slot",
        };
        f.write_str(name)
    }
}

/// Fatal pipeline errors. Nothing is retried past a frame boundary.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{stage}: {source}")]
    Device {
        stage: Stage,
        #[source]
        source: DeviceError,
    },

    #[error("decoding: {0}")]
    Decode(#[from] DecodeError),

    #[error("{stage}: {source}")]
    Transform {
        stage: Stage,
        #[source]
        source: TransformError,
    },

    #[error("rendering: {0}")]
    Render(#[from] RenderError),
}

impl PipelineError {
    /// The stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Device { stage, .. } | PipelineError::Transform { stage, .. } => *stage,
            PipelineError::Decode(_) => Stage::Decoding,
            PipelineError::Render(_) => Stage::Rendering,
        }
    }
}

/// Fixed geometry and tuning for one run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Decoded frame size, fixed at startup.
    pub source_width: u32,
    pub source_height: u32,
    /// Render surface size.
    pub target_width: u32,
    pub target_height: u32,
    /// Threads per parallel stage.
    pub workers: NonZeroU32,
    /// Bound on each wait for a filled slot.
    pub wait_timeout: Duration,
}

/// Timings of one completed frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub wait: Duration,
    pub decode: Duration,
    pub grey: Duration,
    pub resample: Duration,
    pub render: Duration,
}

/// Drives frames from the capture ring to the renderer.
pub struct FrameTransformPipeline<D, C, R>
where
    D: CaptureDevice,
    C: FrameDecoder,
    R: FrameRenderer,
{
    ring: DeviceRingBuffer<D>,
    decoder: C,
    renderer: R,
    grey: FrameBuffer<'static>,
    resized: FrameBuffer<'static>,
    workers: NonZeroU32,
    wait_timeout: Duration,
    stage: Stage,
    frames: u64,
}

impl<D, C, R> FrameTransformPipeline<D, C, R>
where
    D: CaptureDevice,
    C: FrameDecoder,
    R: FrameRenderer,
{
    /// Allocate the intermediate buffers. The ring should already be streaming.
    ///
    /// # Errors
    /// * `PipelineError::Transform` - the target is empty or more than twice
    ///   the source on some axis, so resampling would read past the frame
    pub fn new(
        ring: DeviceRingBuffer<D>,
        decoder: C,
        renderer: R,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        check_scale(
            config.source_width,
            config.source_height,
            config.target_width,
            config.target_height,
        )
        .map_err(|source| PipelineError::Transform {
            stage: Stage::Resampling,
            source,
        })?;

        log::info!(
            "Pipeline {}x{} -> {}x{} with {} worker(s)",
            config.source_width,
            config.source_height,
            config.target_width,
            config.target_height,
            config.workers
        );
        Ok(Self {
            ring,
            decoder,
            renderer,
            grey: FrameBuffer::zeroed(config.source_width, config.source_height, 1),
            resized: FrameBuffer::zeroed(config.target_width, config.target_height, 1),
            workers: config.workers,
            wait_timeout: config.wait_timeout,
            stage: Stage::AwaitFilledSlot,
            frames: 0,
        })
    }

    pub fn workers(&self) -> NonZeroU32 {
        self.workers
    }

    /// Change the worker count for the next frame.
    ///
    /// Needs `&mut self`, so it can't overlap a running stage.
    pub fn set_workers(&mut self, workers: NonZeroU32) {
        log::debug!("Worker count {} -> {}", self.workers, workers);
        self.workers = workers;
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Frames completed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The last frame handed to the renderer.
    pub fn output(&self) -> &FrameBuffer<'static> {
        &self.resized
    }

    pub fn ring(&self) -> &DeviceRingBuffer<D> {
        &self.ring
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Take one frame through every stage.
    pub fn process_frame(&mut self) -> Result<FrameStats, PipelineError> {
        let mut stats = FrameStats::default();
        // The worker count is read once per frame.
        let workers = self.workers;

        self.stage = Stage::AwaitFilledSlot;
        let started = Instant::now();
        let slot = self
            .ring
            .acquire(self.wait_timeout)
            .map_err(|source| PipelineError::Device {
                stage: Stage::AwaitFilledSlot,
                source,
            })?;
        stats.wait = started.elapsed();

        self.stage = Stage::Decoding;
        let started = Instant::now();
        let decoded = self.decoder.decode(slot.bytes())?;
        stats.decode = started.elapsed();

        self.stage = Stage::GreyReducing;
        let started = Instant::now();
        GreyReducer::new(workers)
            .reduce(&decoded, &mut self.grey)
            .map_err(|source| PipelineError::Transform {
                stage: Stage::GreyReducing,
                source,
            })?;
        drop(decoded);
        stats.grey = started.elapsed();

        self.stage = Stage::Resampling;
        let started = Instant::now();
        Resampler::new(workers)
            .resample(&self.grey, &mut self.resized)
            .map_err(|source| PipelineError::Transform {
                stage: Stage::Resampling,
                source,
            })?;
        stats.resample = started.elapsed();

        self.stage = Stage::Rendering;
        let started = Instant::now();
        self.renderer.render(&self.resized)?;
        stats.render = started.elapsed();

        self.stage = Stage::Releasing;
        slot.release().map_err(|source| PipelineError::Device {
            stage: Stage::Releasing,
            source,
        })?;

        self.stage = Stage::AwaitFilledSlot;
        self.frames += 1;
        log::debug!("Frame {}: {:?}", self.frames, stats);
        Ok(stats)
    }

    /// Process frames until `should_stop` returns true.
    ///
    /// `should_stop` is consulted once after every completed frame, never
    /// in the middle of one.
    pub fn run<S>(&mut self, mut should_stop: S) -> Result<u64, PipelineError>
    where
        S: FnMut() -> bool,
    {
        loop {
            if let Err(e) = self.process_frame() {
                log::error!("Pipeline stopped during {}: {}", e.stage(), e);
                return Err(e);
            }
            if should_stop() {
                log::info!("Stop requested after {} frame(s)", self.frames);
                return Ok(self.frames);
            }
        }
    }
}

/// Process-wide stop flag, set from the Ctrl+C handler.
static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Check whether a stop has been requested.
pub fn stop_requested() -> bool {
    STOP_REQUESTED.load(Ordering::SeqCst)
}

/// Ask the pipeline loop to finish after the current frame.
pub fn request_stop() {
    STOP_REQUESTED.store(true, Ordering::SeqCst);
}

/// Set up the Ctrl+C handler.
///
/// This should be called once at program startup.
pub fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(request_stop)
}
