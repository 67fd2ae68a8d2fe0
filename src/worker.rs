//! Background recomputation with last-write-wins coalescing.
//!
//! Slider drags fire parameter changes faster than extraction can finish.
//! [`LineArtWorker`] keeps a single pending slot: each [`submit`] overwrites
//! whatever is queued but not yet started, and the worker thread picks up the
//! slot as soon as it finishes the current job. An in-flight job always runs
//! to completion; its result carries a generation number so the caller can
//! discard it once a newer request exists.
//!
//! [`submit`]: LineArtWorker::submit

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::edges::extract_line_art;
use crate::error::{Error, Result};
use crate::params::{DeviceTier, ProcessingParameters};
use crate::raster::RasterBuffer;

/// Result of one extraction, tagged with the request's generation.
#[derive(Debug)]
pub struct RenderOutput {
    /// Generation returned by the [`LineArtWorker::submit`] call that queued it.
    pub generation: u64,
    /// The extracted raster, or the extraction error.
    pub result: Result<RasterBuffer>,
}

struct Request {
    generation: u64,
    source: Arc<RasterBuffer>,
    params: ProcessingParameters,
}

#[derive(Default)]
struct Slot {
    pending: Option<Request>,
    latest: u64,
    shutdown: bool,
}

#[derive(Default)]
struct Shared {
    slot: Mutex<Slot>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| {
            log::warn!("line-art worker lock poisoned, continuing with recovered state");
            poisoned.into_inner()
        })
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, Slot>) -> MutexGuard<'a, Slot> {
        self.wake
            .wait(guard)
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// A dedicated extraction thread fed through a depth-1 coalescing queue.
pub struct LineArtWorker {
    shared: Arc<Shared>,
    results: Receiver<RenderOutput>,
    handle: Option<JoinHandle<()>>,
}

impl LineArtWorker {
    /// Start the worker thread.
    ///
    /// `debounce` is slept after waking for a new request and before taking
    /// the slot, so bursts of submissions collapse into one job.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the thread cannot be spawned.
    pub fn spawn(debounce: Duration) -> Result<Self> {
        let shared = Arc::new(Shared::default());
        let (tx, results) = mpsc::channel();

        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("lineart-worker".into())
            .spawn(move || run(&worker_shared, &tx, debounce))?;

        Ok(Self {
            shared,
            results,
            handle: Some(handle),
        })
    }

    /// Start a worker using the debounce of `tier`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the thread cannot be spawned.
    pub fn for_tier(tier: DeviceTier) -> Result<Self> {
        Self::spawn(tier.debounce())
    }

    /// Queue an extraction, replacing any request that has not started yet.
    ///
    /// Returns the generation assigned to this request.
    pub fn submit(&self, source: Arc<RasterBuffer>, params: ProcessingParameters) -> u64 {
        let mut slot = self.shared.lock();
        slot.latest += 1;
        let generation = slot.latest;
        if let Some(dropped) = slot.pending.replace(Request {
            generation,
            source,
            params,
        }) {
            log::trace!(
                "request {} superseded by {generation} before starting",
                dropped.generation
            );
        }
        drop(slot);
        self.shared.wake.notify_one();
        generation
    }

    /// Generation of the most recent submission (0 before the first).
    #[must_use]
    pub fn latest_generation(&self) -> u64 {
        self.shared.lock().latest
    }

    /// `true` if `output` answers the most recent submission.
    #[must_use]
    pub fn is_current(&self, output: &RenderOutput) -> bool {
        output.generation == self.latest_generation()
    }

    /// Next finished output, if one is ready.
    #[must_use]
    pub fn try_recv(&self) -> Option<RenderOutput> {
        self.results.try_recv().ok()
    }

    /// Block until the next output arrives.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerStopped`] if the worker thread has exited.
    pub fn recv(&self) -> Result<RenderOutput> {
        self.results.recv().map_err(|_| Error::WorkerStopped)
    }

    /// Wait up to `timeout` for the output of the latest submission,
    /// discarding stale outputs along the way.
    ///
    /// Returns `Ok(None)` on timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerStopped`] if the worker thread has exited, or
    /// the extraction error of the latest request.
    pub fn recv_current(&self, timeout: Duration) -> Result<Option<RasterBuffer>> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.results.recv_timeout(remaining) {
                Ok(output) if self.is_current(&output) => return output.result.map(Some),
                Ok(stale) => {
                    log::trace!("discarding stale output {}", stale.generation);
                }
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => return Err(Error::WorkerStopped),
            }
        }
    }
}

impl Drop for LineArtWorker {
    fn drop(&mut self) {
        self.shared.lock().shutdown = true;
        self.shared.wake.notify_all();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("line-art worker thread panicked");
            }
        }
    }
}

fn run(shared: &Shared, tx: &Sender<RenderOutput>, debounce: Duration) {
    loop {
        {
            let mut slot = shared.lock();
            while slot.pending.is_none() && !slot.shutdown {
                slot = shared.wait(slot);
            }
            if slot.shutdown {
                return;
            }
        }

        if !debounce.is_zero() {
            thread::sleep(debounce);
        }

        let request = {
            let mut slot = shared.lock();
            if slot.shutdown {
                return;
            }
            match slot.pending.take() {
                Some(request) => request,
                None => continue,
            }
        };

        let result = extract_line_art(&request.source, &request.params);
        let output = RenderOutput {
            generation: request.generation,
            result,
        };
        if tx.send(output).is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagonal(size: u32) -> Arc<RasterBuffer> {
        let mut img = RasterBuffer::filled(size, size, [255, 255, 255, 255]);
        for i in 0..size {
            img.set_pixel(i, i, [0, 0, 0, 255]);
        }
        Arc::new(img)
    }

    #[test]
    fn single_request_matches_direct_extraction() {
        let worker = LineArtWorker::spawn(Duration::ZERO).unwrap();
        let source = diagonal(40);
        let params = ProcessingParameters::default();

        let generation = worker.submit(Arc::clone(&source), params.clone());
        assert_eq!(generation, 1);

        let output = worker.recv().unwrap();
        assert_eq!(output.generation, 1);
        assert!(worker.is_current(&output));
        assert_eq!(output.result.unwrap(), extract_line_art(&source, &params).unwrap());
    }

    #[test]
    fn burst_of_requests_resolves_to_the_latest() {
        let worker = LineArtWorker::spawn(Duration::from_millis(100)).unwrap();
        let source = diagonal(60);

        for threshold in [10u8, 20, 30, 40, 50] {
            let params = ProcessingParameters {
                threshold,
                ..ProcessingParameters::default()
            };
            worker.submit(Arc::clone(&source), params);
        }
        assert_eq!(worker.latest_generation(), 5);

        let latest = worker
            .recv_current(Duration::from_secs(10))
            .unwrap()
            .expect("latest output within timeout");
        let expected = extract_line_art(
            &source,
            &ProcessingParameters {
                threshold: 50,
                ..ProcessingParameters::default()
            },
        )
        .unwrap();
        assert_eq!(latest, expected);
    }

    #[test]
    fn stale_outputs_are_recognised() {
        let worker = LineArtWorker::spawn(Duration::ZERO).unwrap();
        let source = diagonal(20);
        worker.submit(Arc::clone(&source), ProcessingParameters::default());
        let first = worker.recv().unwrap();
        worker.submit(source, ProcessingParameters::default());
        assert!(!worker.is_current(&first));
        let second = worker.recv().unwrap();
        assert!(worker.is_current(&second));
    }

    #[test]
    fn extraction_errors_are_delivered() {
        let worker = LineArtWorker::spawn(Duration::ZERO).unwrap();
        worker.submit(Arc::new(RasterBuffer::new(0, 0)), ProcessingParameters::default());
        let err = worker.recv_current(Duration::from_secs(10)).unwrap_err();
        assert!(matches!(err, Error::EmptyImage { .. }));
    }

    #[test]
    fn idle_worker_times_out_and_shuts_down() {
        let worker = LineArtWorker::for_tier(DeviceTier::High).unwrap();
        assert!(worker.try_recv().is_none());
        assert!(worker.recv_current(Duration::from_millis(20)).unwrap().is_none());
        drop(worker);
    }
}
