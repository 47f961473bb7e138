//! JSON-lines form of the worker messages, one object per line.
//!
//! ```text
//! -> {"type":"init"}
//! <- {"type":"ready"}
//! -> {"type":"update","eqBands":[{"x":5,"y":0,"dryLevel":0.2,"wetLevel":1}]}
//! <- {"type":"frame","particleCoords":[...],"shadowParticleCoords":[...],"lines":[...],"shadowLines":[...]}
//! ```
//!
//! A line that fails to decode gets an `error` reply and the stream keeps
//! going.

use crate::band::Band;
use crate::engine::FieldEngine;
use crate::worker::{handle_request, Request, Response};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WireRequest {
    Init,
    Update {
        #[serde(rename = "eqBands", default)]
        eq_bands: Vec<Band>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WireResponse {
    Ready,
    Frame {
        #[serde(rename = "particleCoords")]
        particle_coords: Vec<f32>,
        #[serde(rename = "shadowParticleCoords")]
        shadow_particle_coords: Vec<f32>,
        lines: Vec<f32>,
        #[serde(rename = "shadowLines")]
        shadow_lines: Vec<f32>,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<WireRequest> for Request {
    fn from(req: WireRequest) -> Self {
        match req {
            WireRequest::Init => Request::Init,
            WireRequest::Update { eq_bands } => Request::Update { bands: eq_bands },
        }
    }
}

impl From<Response> for WireResponse {
    fn from(resp: Response) -> Self {
        match resp {
            Response::Ready => Self::Ready,
            Response::Frame(frame) => Self::Frame {
                particle_coords: frame.particle_coords,
                shadow_particle_coords: frame.shadow_particle_coords,
                lines: frame.lines,
                shadow_lines: frame.shadow_lines,
            },
            Response::Rejected(err) => Self::Error {
                message: err.to_string(),
            },
        }
    }
}

pub fn decode_request(line: &str) -> Result<Request, ProtocolError> {
    let wire: WireRequest = serde_json::from_str(line)?;
    Ok(wire.into())
}

pub fn encode_response(response: Response) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(&WireResponse::from(response))?)
}

/// Runs one input line against `engine`. Blank lines produce no reply.
pub fn handle_line(engine: &mut FieldEngine, line: &str) -> Result<Option<String>, ProtocolError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let request = match decode_request(line) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "dropping malformed request");
            let wire = WireResponse::Error {
                message: err.to_string(),
            };
            return Ok(Some(serde_json::to_string(&wire)?));
        }
    };
    Ok(Some(encode_response(handle_request(engine, request))?))
}

/// Serves requests from `input` until EOF. Returns the number of replies.
pub fn serve<R: BufRead, W: Write>(engine: &mut FieldEngine, input: R, mut output: W) -> anyhow::Result<u64> {
    let mut replies = 0u64;
    for line in input.lines() {
        let line = line.context("read request line")?;
        if let Some(reply) = handle_line(engine, &line)? {
            writeln!(output, "{reply}").context("write response")?;
            output.flush().context("flush response")?;
            replies += 1;
        }
    }
    info!(replies, "input closed");
    Ok(replies)
}
