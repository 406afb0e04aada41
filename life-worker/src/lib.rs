#![deny(clippy::all)]
#![forbid(unsafe_code)]

use life_grid::{Generation, Grid, GridError};
use log::{debug, trace};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum WorkerError {
    #[error("a step request is already in flight")]
    Busy,
    #[error("no step request is in flight")]
    NoPending,
    #[error("the worker thread is gone")]
    Disconnected,
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Steps grids on a dedicated thread. The handle allows a single request in
/// flight at a time: a grid snapshot goes in via [`submit`](Self::submit)
/// and the computed generation comes back via [`recv`](Self::recv) or
/// [`try_recv`](Self::try_recv). Dropping the handle shuts the thread down.
#[derive(Debug)]
pub struct StepWorker {
    requests: Option<Sender<Grid>>,
    responses: Receiver<Result<Generation, GridError>>,
    in_flight: bool,
    thread: Option<JoinHandle<()>>,
}

impl StepWorker {
    pub fn spawn() -> io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel();
        let (response_tx, response_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("life-step-worker".into())
            .spawn(move || run(request_rx, response_tx))?;
        debug!("spawned step worker thread");
        Ok(Self {
            requests: Some(request_tx),
            responses: response_rx,
            in_flight: false,
            thread: Some(thread),
        })
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Posts a grid snapshot to the worker. Fails with [`WorkerError::Busy`]
    /// while a previous request is still unanswered.
    pub fn submit(&mut self, grid: Grid) -> Result<(), WorkerError> {
        if self.in_flight {
            return Err(WorkerError::Busy);
        }
        let requests = self.requests.as_ref().ok_or(WorkerError::Disconnected)?;
        requests.send(grid).map_err(|_| WorkerError::Disconnected)?;
        self.in_flight = true;
        Ok(())
    }

    /// Blocks until the outstanding response arrives.
    pub fn recv(&mut self) -> Result<Generation, WorkerError> {
        if !self.in_flight {
            return Err(WorkerError::NoPending);
        }
        let result = self
            .responses
            .recv()
            .map_err(|_| WorkerError::Disconnected)?;
        self.in_flight = false;
        Ok(result?)
    }

    /// Polls for the outstanding response without blocking.
    pub fn try_recv(&mut self) -> Result<Option<Generation>, WorkerError> {
        if !self.in_flight {
            return Err(WorkerError::NoPending);
        }
        match self.responses.try_recv() {
            Ok(result) => {
                self.in_flight = false;
                Ok(Some(result?))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(WorkerError::Disconnected),
        }
    }

    /// Synchronous round trip: submit one grid and wait for its generation.
    pub fn process(&mut self, grid: Grid) -> Result<Generation, WorkerError> {
        self.submit(grid)?;
        self.recv()
    }
}

impl Drop for StepWorker {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            debug!("step worker thread panicked before shutdown");
        }
    }
}

fn run(requests: Receiver<Grid>, responses: Sender<Result<Generation, GridError>>) {
    while let Ok(grid) = requests.recv() {
        trace!("stepping {}x{} grid", grid.width(), grid.height());
        let result = grid.step();
        if responses.send(result).is_err() {
            break;
        }
    }
    debug!("step worker thread shutting down");
}
