use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use tracing::{debug, error};

/// Background thread running a sweep on a fixed interval until stopped.
///
/// The ticker holds at most one pending tick, so ticks that arrive while a
/// sweep is still running are dropped instead of piling up.
pub(crate) struct FadingJob {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl FadingJob {
    pub(crate) fn spawn<F>(interval: Duration, mut sweep: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop, stopped) = bounded::<()>(1);
        let ticker = tick(interval);

        let handle = thread::Builder::new()
            .name("heavytop-fading".into())
            .spawn(move || {
                loop {
                    select! {
                        recv(stopped) -> _ => break,
                        recv(ticker) -> _ => sweep(),
                    }
                }
                debug!("fading job exited");
            })?;

        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    #[cfg(test)]
    pub(crate) fn is_stopped(&self) -> bool {
        self.handle.is_none()
    }

    /// Signals the thread and waits for it. Further calls do nothing.
    pub(crate) fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.try_send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("fading job panicked");
            }
        }
    }
}

impl Drop for FadingJob {
    fn drop(&mut self) {
        self.stop();
    }
}
