//! reaper/cycle.rs
//! Background thread that runs the reaper on a fixed period.
//!
//! Driven by a crossbeam ticker; a shutdown channel stops it. Dropping the
//! cycle stops and joins the thread.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, select, tick, Sender};
use tracing::{debug, warn};

use crate::api::Aggregator;

pub struct ReaperCycle {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ReaperCycle {
    pub fn spawn(aggregator: Aggregator, interval: Duration) -> io::Result<Self> {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let ticker = tick(interval);

        let handle = thread::Builder::new()
            .name("stepagg-reaper".to_string())
            .spawn(move || {
                debug!(interval_ms = interval.as_millis() as u64, "reaper cycle started");
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            aggregator.tick();
                        }
                        // Explicit stop or the sender being dropped.
                        recv(shutdown_rx) -> _ => break,
                    }
                }
                debug!("reaper cycle stopped");
            })?;

        Ok(Self { shutdown: Some(shutdown_tx), handle: Some(handle) })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.try_send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("reaper thread panicked");
            }
        }
    }
}

impl Drop for ReaperCycle {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}
