use std::io;
use std::sync::{mpsc, Arc};
use std::thread;

use tracing::{debug, debug_span};

use super::listeners::EngineEvent;
use super::{convert_and_store, Shared};
use crate::backend::ConversionBackend;
use crate::cache::CacheKey;

/// Outcome of [`ConversionWorker::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Submission {
    Queued,
    /// The key is already waiting or being converted.
    AlreadyQueued,
    /// The worker thread is gone.
    Closed,
}

/// Background filler for deferred backends.
///
/// Work is a cache key. A key sits in the shared in-flight set from
/// submission until its conversion settles, so it is queued at most once
/// at a time however often it is requested.
pub(crate) struct ConversionWorker {
    work_tx: mpsc::Sender<CacheKey>,
    shared: Arc<Shared>,
}

impl ConversionWorker {
    pub fn spawn(backend: Arc<dyn ConversionBackend>, shared: Arc<Shared>) -> io::Result<Self> {
        let (work_tx, work_rx) = mpsc::channel::<CacheKey>();
        {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("lipi-conversions".into())
                .spawn(move || {
                    conversion_worker(work_rx, backend, shared);
                })?;
        }
        Ok(Self { work_tx, shared })
    }

    pub fn submit(&self, key: CacheKey) -> Submission {
        if !self.shared.in_flight().insert(key.clone()) {
            return Submission::AlreadyQueued;
        }
        if let Err(mpsc::SendError(key)) = self.work_tx.send(key) {
            self.shared.in_flight().remove(&key);
            return Submission::Closed;
        }
        Submission::Queued
    }
}

fn conversion_worker(
    rx: mpsc::Receiver<CacheKey>,
    backend: Arc<dyn ConversionBackend>,
    shared: Arc<Shared>,
) {
    while let Ok(key) = rx.recv() {
        let _span = debug_span!(
            "background_conversion",
            source = key.source.as_str(),
            target = key.target.as_str(),
            chars = key.text.chars().count()
        )
        .entered();

        let filled = if shared.is_cached(&key) {
            debug!("already cached, skipping");
            false
        } else {
            convert_and_store(backend.as_ref(), &shared, &key).is_some()
        };

        // Settle the in-flight set before notifying so listeners observe it.
        shared.in_flight().remove(&key);
        if filled {
            shared.listeners.notify(&EngineEvent::ConversionReady);
        }
    }
    debug!("conversion worker exiting");
}
