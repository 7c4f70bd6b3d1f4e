//! Off-thread boundary for synthesis and re-shading.
//!
//! Requests and responses are owned plain data moved through channels; the
//! worker side keeps no state between calls. Completions come back tagged
//! with the caller's ticket and may arrive in any order.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stratus_core::error::WorkerError;
use stratus_core::types::{CloudFragmentSpec, LightingDescriptor, PixelAttributes};

use crate::reshade::{recompute_colors, recompute_colors_and_shadows, ReshadeOutput};
use crate::shape::{generate_full_cloud_data, CloudData, FragmentRequest};

/// Caller-chosen id matching a completion to its request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticket(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkerRequest {
    GenerateCloud {
        request: FragmentRequest,
        descriptor: Option<LightingDescriptor>,
    },
    RecomputeColors {
        pixels: Vec<PixelAttributes>,
        descriptor: Option<LightingDescriptor>,
    },
    RecomputeColorsAndShadows {
        pixels: Vec<PixelAttributes>,
        descriptor: Option<LightingDescriptor>,
        spec: CloudFragmentSpec,
    },
}

impl WorkerRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerRequest::GenerateCloud { .. } => "generate",
            WorkerRequest::RecomputeColors { .. } => "colors",
            WorkerRequest::RecomputeColorsAndShadows { .. } => "colors+shadows",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkerResponse {
    Cloud(CloudData),
    Colors(Vec<u32>),
    ColorsAndShadows(ReshadeOutput),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub ticket: Ticket,
    pub response: WorkerResponse,
}

/// Run one request to completion on the current thread.
pub fn handle_request(request: WorkerRequest) -> WorkerResponse {
    match request {
        WorkerRequest::GenerateCloud {
            request,
            descriptor,
        } => WorkerResponse::Cloud(generate_full_cloud_data(&request, descriptor.as_ref())),
        WorkerRequest::RecomputeColors { pixels, descriptor } => {
            WorkerResponse::Colors(recompute_colors(&pixels, descriptor.as_ref()))
        }
        WorkerRequest::RecomputeColorsAndShadows {
            pixels,
            descriptor,
            spec,
        } => WorkerResponse::ColorsAndShadows(recompute_colors_and_shadows(
            &pixels,
            descriptor.as_ref(),
            &spec,
        )),
    }
}

/// Transport between the scene and whatever executes requests.
pub trait CloudWorker {
    fn submit(&mut self, ticket: Ticket, request: WorkerRequest) -> Result<(), WorkerError>;

    /// Drain finished requests without blocking.
    fn poll(&mut self) -> Vec<Completion>;

    /// Requests submitted but not yet returned by `poll`.
    fn in_flight(&self) -> usize;
}

/// Executes at submit time and hands results out on the next poll.
/// Deterministic; used by tests and single-threaded hosts.
#[derive(Debug, Default)]
pub struct InlineWorker {
    ready: VecDeque<Completion>,
}

impl InlineWorker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CloudWorker for InlineWorker {
    fn submit(&mut self, ticket: Ticket, request: WorkerRequest) -> Result<(), WorkerError> {
        let response = handle_request(request);
        self.ready.push_back(Completion { ticket, response });
        Ok(())
    }

    fn poll(&mut self) -> Vec<Completion> {
        self.ready.drain(..).collect()
    }

    fn in_flight(&self) -> usize {
        self.ready.len()
    }
}

struct Job {
    ticket: Ticket,
    request: WorkerRequest,
}

/// Fixed pool of worker threads sharing one job queue.
pub struct ThreadWorker {
    job_tx: Option<Sender<Job>>,
    done_rx: Receiver<Completion>,
    handles: Vec<JoinHandle<()>>,
    in_flight: usize,
}

impl ThreadWorker {
    pub fn new(threads: u32) -> Result<Self, WorkerError> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (done_tx, done_rx) = mpsc::channel::<Completion>();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut handles = Vec::new();
        for i in 0..threads.max(1) {
            let jobs = Arc::clone(&job_rx);
            let done = done_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("stratus-worker-{i}"))
                .spawn(move || Self::job_loop(jobs, done))
                .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;
            handles.push(handle);
        }

        log::info!("Started {} cloud worker threads", handles.len());
        Ok(Self {
            job_tx: Some(job_tx),
            done_rx,
            handles,
            in_flight: 0,
        })
    }

    fn job_loop(jobs: Arc<Mutex<Receiver<Job>>>, done: Sender<Completion>) {
        loop {
            let job = {
                let Ok(queue) = jobs.lock() else {
                    break;
                };
                queue.recv()
            };
            let Ok(job) = job else {
                // Pool dropped
                break;
            };
            let response = handle_request(job.request);
            if done
                .send(Completion {
                    ticket: job.ticket,
                    response,
                })
                .is_err()
            {
                break;
            }
        }
    }

    /// Block until at least one completion arrives or `timeout` passes,
    /// then drain whatever else is ready.
    pub fn poll_blocking(&mut self, timeout: Duration) -> Vec<Completion> {
        let mut out = Vec::new();
        if self.in_flight == 0 {
            return out;
        }
        if let Ok(first) = self.done_rx.recv_timeout(timeout) {
            out.push(first);
        }
        while let Ok(c) = self.done_rx.try_recv() {
            out.push(c);
        }
        self.in_flight = self.in_flight.saturating_sub(out.len());
        out
    }
}

impl CloudWorker for ThreadWorker {
    fn submit(&mut self, ticket: Ticket, request: WorkerRequest) -> Result<(), WorkerError> {
        let tx = self.job_tx.as_ref().ok_or(WorkerError::Disconnected)?;
        tx.send(Job { ticket, request })
            .map_err(|_| WorkerError::Disconnected)?;
        self.in_flight += 1;
        Ok(())
    }

    fn poll(&mut self) -> Vec<Completion> {
        let mut out = Vec::new();
        while let Ok(c) = self.done_rx.try_recv() {
            out.push(c);
        }
        self.in_flight = self.in_flight.saturating_sub(out.len());
        out
    }

    fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl Drop for ThreadWorker {
    fn drop(&mut self) {
        // Closing the queue ends every job loop.
        self.job_tx.take();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                log::warn!("Cloud worker thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{fragment_spec, synthesize_pixels, SynthesisSettings};
    use std::time::Instant;
    use stratus_core::types::Archetype;

    fn wait_for(worker: &mut ThreadWorker, count: usize) -> Vec<Completion> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut out = Vec::new();
        while out.len() < count && Instant::now() < deadline {
            out.extend(worker.poll_blocking(Duration::from_millis(100)));
        }
        out
    }

    #[test]
    fn test_inline_worker_round_trip() {
        let mut worker = InlineWorker::new();
        let request = WorkerRequest::GenerateCloud {
            request: FragmentRequest::new(1280.0, 720.0, 7),
            descriptor: None,
        };
        worker.submit(Ticket(1), request).unwrap();
        assert_eq!(worker.in_flight(), 1);

        let done = worker.poll();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].ticket, Ticket(1));
        assert!(matches!(&done[0].response, WorkerResponse::Cloud(d) if !d.pixels.is_empty()));
        assert_eq!(worker.in_flight(), 0);
        assert!(worker.poll().is_empty());
    }

    #[test]
    fn test_thread_worker_matches_inline() {
        let spec = fragment_spec(Archetype::Puffy, 42, 300.0, 160.0);
        let pixels = synthesize_pixels(&spec, &SynthesisSettings::default(), None);
        let request = WorkerRequest::RecomputeColors {
            pixels: pixels.clone(),
            descriptor: None,
        };

        let expected = handle_request(request.clone());
        let mut worker = ThreadWorker::new(2).unwrap();
        worker.submit(Ticket(9), request).unwrap();

        let done = wait_for(&mut worker, 1);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].ticket, Ticket(9));
        assert_eq!(done[0].response, expected);
        assert_eq!(worker.in_flight(), 0);
    }

    #[test]
    fn test_thread_worker_many_tickets() {
        let mut worker = ThreadWorker::new(3).unwrap();
        for i in 0..12u64 {
            let request = WorkerRequest::GenerateCloud {
                request: FragmentRequest::new(800.0, 600.0, i as u32),
                descriptor: None,
            };
            worker.submit(Ticket(i), request).unwrap();
        }
        let done = wait_for(&mut worker, 12);
        let mut tickets: Vec<u64> = done.iter().map(|c| c.ticket.0).collect();
        tickets.sort_unstable();
        assert_eq!(tickets, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_reshade_through_worker() {
        let mut worker = InlineWorker::new();
        let spec = fragment_spec(Archetype::Dense, 1, 100.0, 100.0);
        worker
            .submit(
                Ticket(3),
                WorkerRequest::RecomputeColorsAndShadows {
                    pixels: Vec::new(),
                    descriptor: None,
                    spec,
                },
            )
            .unwrap();
        let done = worker.poll();
        assert_eq!(
            done[0].response,
            WorkerResponse::ColorsAndShadows(ReshadeOutput::default())
        );
    }
}
