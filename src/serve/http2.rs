//! HTTP/2 over TLS listener with server push.
//!
//! One tokio task per connection, one per request stream. Pushed streams
//! get a detached watcher that reports client resets, so a refused push
//! never affects the primary response.

use std::{
    future::poll_fn,
    net::SocketAddr,
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use bytes::Bytes;
use h2::{
    RecvStream, SendStream,
    server::{self, SendResponse},
};
use http::{
    HeaderValue, Method, Request, Response,
    header::{ACCEPT, ACCEPT_ENCODING, CONTENT_LENGTH, HOST},
    request::Parts,
};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpListener,
};
use tokio_rustls::TlsAcceptor;

use crate::{config::ServeConfig, debug, log};

use super::{Exchange, Reply, ServerState, tls};

/// How long a pushed stream is watched for a client reset.
const RESET_WATCH: Duration = Duration::from_secs(30);

/// Characters escaped when a route becomes a push URI path.
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    H2(#[from] h2::Error),

    #[error("malformed message: {0}")]
    Http(#[from] http::Error),
}

/// Serve until the process exits.
pub fn run(state: Arc<ServerState>, serve: &ServeConfig) -> Result<()> {
    let tls = tls::server_config(serve).context("failed to load TLS certificate or key")?;
    let addr = SocketAddr::new(serve.interface, serve.port);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(listen(addr, TlsAcceptor::from(tls), state))
}

async fn listen(addr: SocketAddr, acceptor: TlsAcceptor, state: Arc<ServerState>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log!("serve"; "https://{} (HTTP/2)", addr);

    loop {
        let (tcp, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                log!("serve"; "accept error: {}", e);
                continue;
            }
        };

        let acceptor = acceptor.clone();
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let stream = match acceptor.accept(tcp).await {
                Ok(stream) => stream,
                Err(e) => {
                    debug!("serve"; "TLS handshake with {} failed: {}", peer, e);
                    return;
                }
            };

            let (_, session) = stream.get_ref();
            if session.alpn_protocol() != Some(tls::ALPN_H2) {
                log!("serve"; "{} did not negotiate h2, closing", peer);
                return;
            }

            if let Err(e) = serve_connection(stream, state).await {
                debug!("serve"; "connection {} closed: {}", peer, e);
            }
        });
    }
}

/// Drive one HTTP/2 connection, spawning a task per request stream.
pub async fn serve_connection<T>(io: T, state: Arc<ServerState>) -> Result<(), h2::Error>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let mut connection = server::handshake(io).await?;

    while let Some(accepted) = connection.accept().await {
        let (request, respond) = accepted?;
        let state = Arc::clone(&state);
        tokio::spawn(async move { handle_stream(request, respond, &state) });
    }
    Ok(())
}

fn handle_stream(request: Request<RecvStream>, respond: SendResponse<Bytes>, state: &ServerState) {
    let (parts, _body) = request.into_parts();
    let head = parts.method == Method::HEAD;
    let exchange = H2Exchange {
        authority: authority(&parts),
        accept_encoding: parts.headers.get(ACCEPT_ENCODING).cloned(),
        respond,
        push_refused: false,
    };

    let path = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    if let Err(e) = super::handle(state, head, path, exchange) {
        log!("serve"; "failed to respond to {}: {}", path, e);
    }
}

/// `:authority`, falling back to `host`.
fn authority(parts: &Parts) -> String {
    parts
        .uri
        .authority()
        .map(|a| a.as_str().to_owned())
        .or_else(|| {
            parts
                .headers
                .get(HOST)
                .and_then(|h| h.to_str().ok())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| "localhost".to_owned())
}

struct H2Exchange {
    respond: SendResponse<Bytes>,
    authority: String,
    accept_encoding: Option<HeaderValue>,
    /// Set once a push promise is rejected, usually because the client sent
    /// `SETTINGS_ENABLE_PUSH = 0`.
    push_refused: bool,
}

impl H2Exchange {
    fn push_request(&self, route: &str) -> Result<Request<()>, http::Error> {
        let path = utf8_percent_encode(route, PATH_ESCAPE);
        let mut request = Request::builder()
            .method(Method::GET)
            .uri(format!("https://{}/{}", self.authority, path))
            .header(ACCEPT, "*/*");
        if let Some(accept_encoding) = &self.accept_encoding {
            request = request.header(ACCEPT_ENCODING, accept_encoding.clone());
        }
        request.body(())
    }
}

impl Exchange for H2Exchange {
    type Error = StreamError;

    fn supports_push(&self) -> bool {
        !self.push_refused
    }

    fn push(&mut self, route: &str, reply: Reply) -> Result<(), StreamError> {
        let request = self.push_request(route)?;
        let mut pushed = self.respond.push_request(request).inspect_err(|_| {
            self.push_refused = true;
        })?;

        let end_of_stream = reply.body.is_empty();
        let mut stream = pushed.send_response(to_response(&reply)?, end_of_stream)?;
        if !end_of_stream {
            stream.send_data(reply.body, true)?;
        }

        tokio::spawn(watch_reset(route.to_owned(), stream));
        Ok(())
    }

    fn respond(self, reply: Reply) -> Result<(), StreamError> {
        let Some(delay) = reply.delay else {
            return send_reply(self.respond, reply);
        };

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = send_reply(self.respond, reply) {
                debug!("serve"; "delayed response dropped: {}", e);
            }
        });
        Ok(())
    }
}

fn send_reply(mut respond: SendResponse<Bytes>, reply: Reply) -> Result<(), StreamError> {
    let end_of_stream = reply.body.is_empty();
    let mut stream = respond.send_response(to_response(&reply)?, end_of_stream)?;
    if !end_of_stream {
        stream.send_data(reply.body, true)?;
    }
    Ok(())
}

fn to_response(reply: &Reply) -> Result<Response<()>, http::Error> {
    let mut response = Response::builder().status(reply.status);
    for (name, value) in reply.headers() {
        response = response.header(name, value);
    }
    if reply.is_success() || reply.content_length > 0 {
        response = response.header(CONTENT_LENGTH, reply.content_length);
    }
    response.body(())
}

/// Report a client reset of a pushed stream.
async fn watch_reset(route: String, mut stream: SendStream<Bytes>) {
    let reset = poll_fn(|cx| stream.poll_reset(cx));
    match tokio::time::timeout(RESET_WATCH, reset).await {
        Ok(Ok(reason)) => log!("push"; "client reset /{}: {}", route, reason),
        Ok(Err(e)) => debug!("push"; "/{} ended: {}", route, e),
        Err(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AssetCatalog, fixture, gunzip};
    use h2::client;

    fn state(push: bool) -> Arc<ServerState> {
        let (_dir, build) = fixture::write();
        let catalog = AssetCatalog::load(&build, false).unwrap();
        Arc::new(ServerState::new(catalog, push))
    }

    async fn connect(state: Arc<ServerState>, enable_push: bool) -> client::SendRequest<Bytes> {
        let (client_io, server_io) = tokio::io::duplex(1 << 20);
        tokio::spawn(async move {
            let _ = serve_connection(server_io, state).await;
        });

        let (client, connection) = client::Builder::new()
            .enable_push(enable_push)
            .handshake::<_, Bytes>(client_io)
            .await
            .unwrap();
        tokio::spawn(async move {
            let _ = connection.await;
        });
        client.ready().await.unwrap()
    }

    fn get(path: &str) -> Request<()> {
        Request::get(format!("https://localhost{path}"))
            .header(ACCEPT_ENCODING, "gzip, deflate, br")
            .body(())
            .unwrap()
    }

    async fn read_body(mut body: RecvStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = body.data().await {
            let chunk = chunk.unwrap();
            body.flow_control().release_capacity(chunk.len()).unwrap();
            out.extend_from_slice(&chunk);
        }
        out
    }

    #[tokio::test]
    async fn test_entry_point_pushes_dependencies_in_reverse() {
        let mut client = connect(state(true), true).await;
        let (mut response, _) = client.send_request(get("/three/unbundled/app.js"), true).unwrap();
        let mut promises = response.push_promises();

        let mut pushed = Vec::new();
        for _ in fixture::THREE_DEPS {
            let promise = promises.push_promise().await.unwrap().unwrap();
            let (request, response) = promise.into_parts();
            assert_eq!(request.method(), &Method::GET);
            assert_eq!(request.headers()[ACCEPT], "*/*");
            assert_eq!(request.headers()[ACCEPT_ENCODING], "gzip, deflate, br");

            let response = response.await.unwrap();
            assert_eq!(response.status(), 200);
            assert_eq!(response.headers()["content-type"], "application/javascript");
            assert_eq!(response.headers()["content-encoding"], "gzip");

            let route = request.uri().path().trim_start_matches('/').to_owned();
            let body = read_body(response.into_body()).await;
            assert_eq!(gunzip(&body), fixture::content(&route));
            pushed.push(route);
        }

        let response = response.await.unwrap();
        assert_eq!(response.status(), 200);
        let body = read_body(response.into_body()).await;
        assert_eq!(gunzip(&body), fixture::content(fixture::THREE_ENTRY));

        let mut expected = fixture::THREE_DEPS.to_vec();
        expected.reverse();
        assert_eq!(pushed, expected);
    }

    #[tokio::test]
    async fn test_client_without_push_still_gets_response() {
        let mut client = connect(state(true), false).await;
        let (response, _) = client.send_request(get("/r/42/three/unbundled/app.js"), true).unwrap();

        let response = response.await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["vary"], "Accept-Encoding");
        let body = read_body(response.into_body()).await;
        assert_eq!(gunzip(&body), fixture::content(fixture::THREE_ENTRY));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let mut client = connect(state(false), true).await;
        let (response, _) = client.send_request(get("/nope.js"), true).unwrap();

        let response = response.await.unwrap();
        assert_eq!(response.status(), 404);
        assert!(response.headers().get("content-type").is_none());
        assert!(read_body(response.into_body()).await.is_empty());
    }

    #[tokio::test]
    async fn test_head_has_length_but_no_body() {
        let mut client = connect(state(true), true).await;
        let request = Request::head("https://localhost/").body(()).unwrap();
        let (response, _) = client.send_request(request, true).unwrap();

        let response = response.await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["content-type"], "text/html");
        let length: usize = response.headers()[CONTENT_LENGTH].to_str().unwrap().parse().unwrap();
        assert!(length > 0);
        assert!(read_body(response.into_body()).await.is_empty());
    }

    #[tokio::test]
    async fn test_synthesized_query_reaches_handler() {
        let mut client = connect(state(true), true).await;
        let request = get("/synthesized/a.js?depth=2&branch=3&cacheable&delay=20");
        let (response, _) = client.send_request(request, true).unwrap();

        let response = response.await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["cache-control"], "max-age=86400");
        assert!(response.headers().get("content-encoding").is_none());
        let body = String::from_utf8(read_body(response.into_body()).await).unwrap();
        assert_eq!(body.matches("&depth=1&n=").count(), 3);
    }

    #[test]
    fn test_push_uri_escapes_route() {
        assert_eq!(
            utf8_percent_encode("p/unbundled/my module.js", PATH_ESCAPE).to_string(),
            "p/unbundled/my%20module.js"
        );
    }
}
