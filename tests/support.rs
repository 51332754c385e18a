#![allow(dead_code)]

//! Scripted HTTP transport shared by the behavior tests.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use stockdesk_core::{HttpClient, HttpError, HttpRequest, HttpResponse};

struct Route {
    needle: String,
    responses: VecDeque<Result<HttpResponse, HttpError>>,
}

/// Routes requests by URL substring and records every request it sees.
///
/// A route with one queued response replays it for every matching call;
/// with several, they are consumed in order.
#[derive(Default)]
pub struct MockHttpClient {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, needle: impl Into<String>, response: HttpResponse) -> Self {
        self.push(needle.into(), Ok(response));
        self
    }

    pub fn on_json(self, needle: impl Into<String>, body: impl Into<String>) -> Self {
        self.on(needle, HttpResponse::ok_json(body))
    }

    pub fn on_status(self, needle: impl Into<String>, status: u16) -> Self {
        self.on(
            needle,
            HttpResponse {
                status,
                body: String::new(),
            },
        )
    }

    pub fn on_error(self, needle: impl Into<String>, error: HttpError) -> Self {
        self.push(needle.into(), Err(error));
        self
    }

    fn push(&self, needle: String, response: Result<HttpResponse, HttpError>) {
        let mut routes = self.routes.lock().expect("routes lock");
        if let Some(route) = routes.iter_mut().find(|route| route.needle == needle) {
            route.responses.push_back(response);
        } else {
            routes.push(Route {
                needle,
                responses: VecDeque::from([response]),
            });
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn calls_matching(&self, needle: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.full_url().contains(needle))
            .count()
    }
}

impl HttpClient for MockHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let url = request.full_url();
        self.requests.lock().expect("requests lock").push(request);

        let response = {
            let mut routes = self.routes.lock().expect("routes lock");
            match routes.iter_mut().find(|route| url.contains(&route.needle)) {
                Some(route) => {
                    if route.responses.len() > 1 {
                        route.responses.pop_front().expect("non-empty queue")
                    } else {
                        route
                            .responses
                            .front()
                            .cloned()
                            .unwrap_or_else(|| Err(HttpError::new("scripted queue exhausted")))
                    }
                }
                None => Err(HttpError::new(format!("no scripted response for {url}"))),
            }
        };
        Box::pin(async move { response })
    }
}
