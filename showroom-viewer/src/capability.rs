//! Immersive AR capability query running beside the frame loop

use showroom_core::{ArRuntime, Error, Result};

/// Answer of [`ArRuntime::is_immersive_ar_supported`], delivered from a worker thread.
///
/// The query has no timeout. While it is pending the landing page keeps the
/// orbit viewer; [`CapabilityQuery::poll`] never blocks.
pub struct CapabilityQuery {
    receiver: flume::Receiver<Result<bool>>,
}

impl CapabilityQuery {
    /// Ask `runtime` on a background thread
    pub fn spawn<R>(runtime: &R) -> Self
    where
        R: ArRuntime + Clone + Send + 'static,
    {
        let (sender, receiver) = flume::bounded(1);
        let runtime = runtime.clone();

        let spawned = std::thread::Builder::new()
            .name("showroom-capability".to_string())
            .spawn(move || {
                let answer = pollster::block_on(runtime.is_immersive_ar_supported());
                // The page may be gone already
                let _ = sender.send(answer);
            });
        if let Err(e) = spawned {
            log::error!("Failed to start capability query: {}", e);
        }

        Self { receiver }
    }

    /// The answer, once it has arrived.
    ///
    /// A worker that ended without answering counts as a failed query.
    pub fn poll(&self) -> Option<Result<bool>> {
        match self.receiver.try_recv() {
            Ok(answer) => Some(answer),
            Err(flume::TryRecvError::Empty) => None,
            Err(flume::TryRecvError::Disconnected) => Some(Err(Error::Unsupported(
                "capability query ended without an answer".to_string(),
            ))),
        }
    }
}
