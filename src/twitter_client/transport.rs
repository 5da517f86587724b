use async_trait::async_trait;
use hyper::body::Bytes;
use hyper::client::HttpConnector;
use hyper::header::HeaderMap;
use hyper::{Body, Client, Method, Request, StatusCode};
use hyper_tls::HttpsConnector;
use url::Url;

/// One wire request: a fully-built URL plus request headers.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

/// The raw exchange result, before any classification or decoding.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// The injectable request primitive. The client only ever talks to the
/// network through this seam, so tests substitute a scripted implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Default transport over hyper + TLS.
#[derive(Clone, Debug)]
pub struct HttpsTransport {
    https_client: Client<HttpsConnector<HttpConnector>>,
}

impl HttpsTransport {
    pub fn new() -> Self {
        let https = HttpsConnector::new();
        let https_client = Client::builder().build::<_, Body>(https);
        Self { https_client }
    }
}

impl Default for HttpsTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpsTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = Request::builder()
            .method(Method::GET)
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let req = builder
            .body(Body::empty())
            .map_err(|e| TransportError(e.to_string()))?;

        let resp = self
            .https_client
            .request(req)
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = hyper::body::to_bytes(resp.into_body())
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
