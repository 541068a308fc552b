use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use super::AssetError;

/// Result of an asset load running on a background thread.
///
/// Polled once per frame; never blocks the frame loop.
#[derive(Debug)]
pub struct Pending<T> {
    label: String,
    rx: Option<Receiver<Result<T, AssetError>>>,
}

impl<T: Send + 'static> Pending<T> {
    pub fn spawn<F>(label: impl Into<String>, load: F) -> Self
    where
        F: FnOnce() -> Result<T, AssetError> + Send + 'static,
    {
        let label = label.into();
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name(format!("load {label}"))
            .spawn(move || {
                // The receiver may be gone if the app exited first.
                let _ = tx.send(load());
            });

        match spawned {
            Ok(_) => Self { label, rx: Some(rx) },
            Err(err) => {
                log::error!("failed to spawn loader for {label}: {err}");
                Self { label, rx: None }
            }
        }
    }
}

impl<T> Pending<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// True until a result (or a disconnect) has been returned by [`Pending::poll`].
    pub fn is_pending(&self) -> bool {
        self.rx.is_some()
    }

    /// Returns the load result exactly once; `None` while still loading or afterwards.
    pub fn poll(&mut self) -> Option<Result<T, AssetError>> {
        let rx = self.rx.as_ref()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(AssetError::Disconnected {
                label: self.label.clone(),
            }),
        };
        self.rx = None;
        Some(result)
    }
}
