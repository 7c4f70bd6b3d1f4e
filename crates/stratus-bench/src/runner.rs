use std::time::Instant;

use stratus_clouds::worker::{CloudWorker, ThreadWorker};
use stratus_core::error::{ConfigError, WorkerError};
use stratus_scene::SkyScene;
use stratus_sky::schedule::SimTime;
use thiserror::Error;

use crate::scenes::SceneConfig;

/// Midsummer, so the astronomical schedule has a full day to work with.
const BENCH_DAY_OF_YEAR: u32 = 172;
const BENCH_SEED: u32 = 0x5EED;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Scene config rejected: {0}")]
    Config(#[from] ConfigError),

    #[error("Worker unavailable: {0}")]
    Worker(#[from] WorkerError),
}

/// Timing data for a single benchmark run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimingSeries {
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

/// Result of a single scene benchmark.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BenchmarkResult {
    pub scene_name: String,
    pub frame_count: u32,
    /// Live fragments when the run ended.
    pub fragments: u32,
    /// Pixel records held by those fragments.
    pub pixels: u64,
    pub spawned: u64,
    pub reshades: u64,
    pub redraws: u64,
    pub timings: TimingSeries,
}

/// Drives a `SkyScene` headless for a fixed number of frames.
pub struct BenchmarkRunner {
    frame_count: u32,
    /// Scene seconds per frame.
    dt: f32,
    threads: Option<u32>,
    viewport: (f32, f32),
}

impl BenchmarkRunner {
    pub fn new(frame_count: u32) -> Self {
        Self {
            frame_count,
            dt: 1.0 / 60.0,
            threads: None,
            viewport: (1920.0, 1080.0),
        }
    }

    /// Override the worker thread count from the scene config.
    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = (width, height);
        self
    }

    /// Run a scene on a thread pool worker.
    pub fn run_scene(&self, scene: &SceneConfig) -> Result<BenchmarkResult, BenchError> {
        let threads = self.threads.unwrap_or(scene.config.worker.threads);
        let worker = ThreadWorker::new(threads)?;
        log::info!(
            "Running scene '{}' ({} layers, {} clouds per front layer, {} threads)...",
            scene.name,
            scene.config.clouds.layer_count,
            scene.config.clouds.cloud_count,
            threads
        );
        self.run_scene_with(scene, Box::new(worker))
    }

    /// Run a scene on the given worker.
    pub fn run_scene_with(
        &self,
        scene: &SceneConfig,
        worker: Box<dyn CloudWorker>,
    ) -> Result<BenchmarkResult, BenchError> {
        let (width, height) = self.viewport;
        let mut sky = SkyScene::new(
            &scene.config,
            worker,
            width,
            height,
            SimTime::from_hours(BENCH_DAY_OF_YEAR, scene.start_hours),
            BENCH_SEED,
        )?;
        sky.set_time_scale(scene.time_scale);

        let mut frame_times = Vec::with_capacity(self.frame_count as usize);
        for frame in 0..self.frame_count {
            let frame_start = Instant::now();

            if let Some(every) = scene.respawn_every {
                if every > 0 && frame > 0 && frame % every == 0 {
                    sky.clouds_mut().respawn_all();
                }
            }
            sky.update(self.dt);

            frame_times.push(frame_start.elapsed().as_secs_f64() * 1000.0);
        }

        let stats = sky.clouds().stats();
        let live: Vec<_> = sky
            .clouds()
            .fragments()
            .iter()
            .filter(|f| f.is_live())
            .collect();
        let pixels = live.iter().map(|f| f.pixels().len() as u64).sum();

        let timings = compute_timings(&frame_times);
        log::info!(
            "  Done: mean={:.2}ms, p95={:.2}ms, p99={:.2}ms",
            timings.mean_ms,
            timings.p95_ms,
            timings.p99_ms
        );

        Ok(BenchmarkResult {
            scene_name: scene.name.to_string(),
            frame_count: self.frame_count,
            fragments: live.len() as u32,
            pixels,
            spawned: stats.spawned,
            reshades: stats.reshades_submitted,
            redraws: stats.redraws,
            timings,
        })
    }
}

/// Compute timing statistics from a list of frame times in milliseconds.
pub fn compute_timings(times: &[f64]) -> TimingSeries {
    if times.is_empty() {
        return TimingSeries {
            mean_ms: 0.0,
            median_ms: 0.0,
            p95_ms: 0.0,
            p99_ms: 0.0,
            min_ms: 0.0,
            max_ms: 0.0,
        };
    }

    let mut sorted = times.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let p95_idx = ((n as f64) * 0.95).ceil() as usize;
    let p99_idx = ((n as f64) * 0.99).ceil() as usize;

    TimingSeries {
        mean_ms: mean,
        median_ms: median,
        p95_ms: sorted[p95_idx.min(n - 1)],
        p99_ms: sorted[p99_idx.min(n - 1)],
        min_ms: sorted[0],
        max_ms: sorted[n - 1],
    }
}
