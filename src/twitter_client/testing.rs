//! Scripted transport for tests: canned responses in, recorded requests out.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use hyper::header::HeaderMap;
use hyper::StatusCode;
use url::Url;

use crate::twitter_client::transport::{
    Transport, TransportError, TransportRequest, TransportResponse,
};

pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<TransportResponse>>,
    requests: Mutex<Vec<Url>>,
    stall: Option<Duration>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            stall: None,
        }
    }

    /// A transport that never answers within `stall`; for timeout tests.
    pub(crate) fn stalled(stall: Duration) -> Self {
        Self {
            stall: Some(stall),
            ..Self::new()
        }
    }

    pub(crate) fn push(&self, response: TransportResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requested_urls(&self) -> Vec<Url> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request.url);

        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
            return Err(TransportError("stalled transport woke up".into()));
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError("no scripted response left".into()))
    }
}

pub(crate) fn json_response(status: u16, body: serde_json::Value) -> TransportResponse {
    raw_response(status, body.to_string().into_bytes())
}

pub(crate) fn raw_response(status: u16, body: Vec<u8>) -> TransportResponse {
    TransportResponse {
        status: StatusCode::from_u16(status).unwrap(),
        headers: HeaderMap::new(),
        body: body.into(),
    }
}
