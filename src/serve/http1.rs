//! Plain HTTP/1.1 listener.
//!
//! Blocking accept loop with requests dispatched onto a rayon pool. No TLS
//! and no push: every dependency is fetched by the browser itself.

use std::{io, net::SocketAddr, sync::Arc};

use anyhow::{Context, Result, anyhow};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::{config::ServeConfig, log};

use super::{Exchange, Reply, ServerState};

/// Serve until the process exits.
pub fn run(state: Arc<ServerState>, serve: &ServeConfig) -> Result<()> {
    let addr = SocketAddr::new(serve.interface, serve.port);
    let server = Server::http(addr).map_err(|e| anyhow!("failed to bind {addr}: {e}"))?;
    log!("serve"; "http://{} (HTTP/1.1)", addr);

    run_request_loop(&server, state)
}

/// Dispatch requests until the server is unblocked.
fn run_request_loop(server: &Server, state: Arc<ServerState>) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("http1-{i}"))
        .build()
        .context("failed to create thread pool")?;

    for request in server.incoming_requests() {
        let state = Arc::clone(&state);
        pool.spawn(move || {
            let head = *request.method() == Method::Head;
            let path = request.url().to_owned();
            if let Err(e) = super::handle(&state, head, &path, Http1Exchange(request)) {
                log!("serve"; "request error on {}: {}", path, e);
            }
        });
    }
    Ok(())
}

struct Http1Exchange(Request);

impl Exchange for Http1Exchange {
    type Error = io::Error;

    fn supports_push(&self) -> bool {
        false
    }

    fn push(&mut self, _route: &str, _reply: Reply) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "server push requires HTTP/2",
        ))
    }

    fn respond(self, reply: Reply) -> io::Result<()> {
        let headers = reply
            .headers()
            .into_iter()
            .map(|(name, value)| {
                Header::from_bytes(name, value).map_err(|()| {
                    io::Error::new(io::ErrorKind::InvalidData, format!("invalid header {name}"))
                })
            })
            .collect::<io::Result<Vec<_>>>()?;

        if let Some(delay) = reply.delay {
            std::thread::sleep(delay);
        }

        let response = Response::new(
            StatusCode(reply.status),
            headers,
            io::Cursor::new(reply.body),
            Some(reply.content_length),
            None,
        );
        self.0.respond(response)
    }
}
