use crate::normalize::normalize;
use crate::types::{RawRelay, Relay};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::IF_MODIFIED_SINCE;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

/// Builds relay records for tests.
pub struct RelayBuilder {
    raw: RawRelay,
}

impl RelayBuilder {
    pub fn new(fingerprint: &str) -> Self {
        RelayBuilder {
            raw: RawRelay {
                nickname: format!("relay{fingerprint}"),
                fingerprint: fingerprint.to_string(),
                first_seen: "2020-01-01 00:00:00".to_string(),
                running: true,
                ..Default::default()
            },
        }
    }

    pub fn bandwidth(mut self, bandwidth: u64) -> Self {
        self.raw.observed_bandwidth = Some(bandwidth);
        self
    }

    pub fn flags(mut self, flags: &[&str]) -> Self {
        self.raw.flags = flags.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn as_number(mut self, as_number: &str) -> Self {
        self.raw.as_number = Some(as_number.to_string());
        self
    }

    pub fn as_name(mut self, as_name: &str) -> Self {
        self.raw.as_name = Some(as_name.to_string());
        self
    }

    pub fn country(mut self, country: &str) -> Self {
        self.raw.country = Some(country.to_string());
        self
    }

    pub fn platform(mut self, platform: &str) -> Self {
        self.raw.platform = Some(platform.to_string());
        self
    }

    pub fn contact(mut self, contact: &str) -> Self {
        self.raw.contact = Some(contact.to_string());
        self
    }

    pub fn family(mut self, family: &[&str]) -> Self {
        self.raw.effective_family = family.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn first_seen(mut self, first_seen: &str) -> Self {
        self.raw.first_seen = first_seen.to_string();
        self
    }

    pub fn raw(self) -> RawRelay {
        self.raw
    }

    pub fn build(self) -> Relay {
        normalize(self.raw)
    }
}

/// A local Onionoo stand-in. Every request is answered by `respond`, which
/// gets the request's If-Modified-Since header.
pub struct TestOnionooServer {
    pub url: Url,
    requests: Arc<Mutex<Vec<Option<String>>>>,
}

impl TestOnionooServer {
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(Option<&str>) -> Response<Full<Bytes>> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let respond = Arc::new(respond);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = TokioIo::new(stream);
                let respond = respond.clone();
                let seen = seen.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let since = req
                            .headers()
                            .get(IF_MODIFIED_SINCE)
                            .and_then(|value| value.to_str().ok());
                        seen.lock().unwrap().push(since.map(String::from));
                        let response = respond(since);
                        async move { Ok::<_, Infallible>(response) }
                    });

                    let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service)
                        .await;
                });
            }
        });

        TestOnionooServer {
            url: Url::parse(&format!("http://127.0.0.1:{port}/details")).unwrap(),
            requests,
        }
    }

    /// If-Modified-Since of every request served so far.
    pub fn requests(&self) -> Vec<Option<String>> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn response(status: u16, headers: &[(&str, &str)], body: &str) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Full::new(Bytes::from(body.to_string()))).unwrap()
}
