#![allow(dead_code)]

use std::io::Read;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tiny_http::{Header, Response, Server, StatusCode};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub authorization: Option<String>,
    pub body: String,
}

/// Stand-in clock service on an ephemeral local port. The handler picks the
/// status and JSON body for each request; every request is recorded before
/// it is answered.
pub struct MockService {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl MockService {
    pub fn start<H>(handler: H) -> Self
    where
        H: Fn(&RecordedRequest) -> (u16, String) + Send + 'static,
    {
        let server = Server::http("127.0.0.1:0").expect("bind mock service");
        let addr = server
            .server_addr()
            .to_ip()
            .expect("mock service listens on TCP");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let requests_for_thread = Arc::clone(&requests);
        let stop_for_thread = Arc::clone(&stop);
        let join = thread::spawn(move || {
            while !stop_for_thread.load(Ordering::Relaxed) {
                let mut request = match server.recv_timeout(Duration::from_millis(20)) {
                    Ok(Some(request)) => request,
                    Ok(None) | Err(_) => continue,
                };

                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let url = request.url().to_string();
                let (path, query) = match url.split_once('?') {
                    Some((path, query)) => (path.to_string(), query.to_string()),
                    None => (url.clone(), String::new()),
                };
                let authorization = request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv("Authorization"))
                    .map(|header| header.value.as_str().to_string());
                let recorded = RecordedRequest {
                    method: request.method().to_string(),
                    path,
                    query,
                    authorization,
                    body,
                };

                let (status, payload) = handler(&recorded);
                requests_for_thread
                    .lock()
                    .expect("requests lock")
                    .push(recorded);
                let content_type = Header::from_str("Content-Type: application/json")
                    .expect("content-type header");
                let _ = request.respond(
                    Response::from_string(payload)
                        .with_status_code(StatusCode(status))
                        .with_header(content_type),
                );
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
            stop,
            join: Some(join),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.path == path)
            .count()
    }
}

impl Drop for MockService {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

pub fn tokens_json(access: &str, refresh: &str) -> String {
    format!(r#"{{"access_token":"{access}","refresh_token":"{refresh}"}}"#)
}
