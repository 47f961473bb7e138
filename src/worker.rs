//! Dedicated computation thread for the particle field.
//!
//! The worker owns its [`FieldEngine`] outright; callers only talk to it
//! through [`Request`]/[`Response`] messages. Requests are handled one at a
//! time in arrival order, so responses come back in the order requests were
//! sent. Result buffers move through the channel without being copied.

use crate::band::Band;
use crate::engine::{EngineError, FieldEngine, TickResult};
use crate::params::FieldParams;
use anyhow::Context;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Init,
    Update { bands: Vec<Band> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Ready,
    Frame(TickResult),
    Rejected(EngineError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkerError {
    #[error("worker thread is gone")]
    Disconnected,
    #[error("request rejected: {0}")]
    Rejected(#[from] EngineError),
    #[error("unexpected response to {request}")]
    UnexpectedResponse { request: &'static str },
}

/// Handles one request against `engine`. Shared by the worker thread and the
/// stdio server so both speak exactly the same protocol.
pub fn handle_request(engine: &mut FieldEngine, request: Request) -> Response {
    match request {
        Request::Init => {
            engine.initialize();
            Response::Ready
        }
        Request::Update { bands } => match engine.tick(&bands) {
            Ok(frame) => Response::Frame(frame),
            Err(err) => {
                warn!(error = %err, "update rejected");
                Response::Rejected(err)
            }
        },
    }
}

pub struct FieldWorker {
    requests: Option<Sender<Request>>,
    responses: Receiver<Response>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FieldWorker {
    pub fn spawn(params: FieldParams, seed: Option<u64>) -> anyhow::Result<Self> {
        let (req_tx, req_rx) = mpsc::channel::<Request>();
        let (resp_tx, resp_rx) = mpsc::channel::<Response>();

        let handle = thread::Builder::new()
            .name("band-field-worker".to_string())
            .spawn(move || {
                let mut engine = match seed {
                    Some(seed) => FieldEngine::with_seed(params, seed),
                    None => FieldEngine::new(params),
                };
                worker_loop(&mut engine, &req_rx, &resp_tx);
            })
            .context("spawn field worker thread")?;

        info!(particles = params.particle_count, "field worker started");
        Ok(Self {
            requests: Some(req_tx),
            responses: resp_rx,
            handle: Some(handle),
        })
    }

    /// Queues a request without waiting. Pair every call with [`Self::recv`].
    pub fn submit(&self, request: Request) -> Result<(), WorkerError> {
        let tx = self.requests.as_ref().ok_or(WorkerError::Disconnected)?;
        tx.send(request).map_err(|_| WorkerError::Disconnected)
    }

    /// Blocks for the next response, in submission order.
    pub fn recv(&self) -> Result<Response, WorkerError> {
        self.responses.recv().map_err(|_| WorkerError::Disconnected)
    }

    pub fn init(&self) -> Result<(), WorkerError> {
        self.submit(Request::Init)?;
        match self.recv()? {
            Response::Ready => Ok(()),
            _ => Err(WorkerError::UnexpectedResponse { request: "init" }),
        }
    }

    pub fn update(&self, bands: Vec<Band>) -> Result<TickResult, WorkerError> {
        self.submit(Request::Update { bands })?;
        match self.recv()? {
            Response::Frame(frame) => Ok(frame),
            Response::Rejected(err) => Err(WorkerError::Rejected(err)),
            Response::Ready => Err(WorkerError::UnexpectedResponse { request: "update" }),
        }
    }
}

impl Drop for FieldWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.requests.take();
        if let Some(h) = self.handle.take() {
            if join_worker(h) {
                info!("field worker stopped");
            }
        }
    }
}

/// Joins the worker thread. Returns `false` if it panicked.
fn join_worker(handle: thread::JoinHandle<()>) -> bool {
    match handle.join() {
        Ok(()) => true,
        Err(_) => {
            warn!("field worker thread panicked");
            false
        }
    }
}

fn worker_loop(engine: &mut FieldEngine, requests: &Receiver<Request>, responses: &Sender<Response>) {
    while let Ok(request) = requests.recv() {
        let response = handle_request(engine, request);
        if responses.send(response).is_err() {
            break;
        }
    }
}
