//! HTTP server over the in-memory asset catalog.
//!
//! # Module Structure
//!
//! ```text
//! serve/
//! ├── route.rs       # request path → route key
//! ├── response.rs    # Reply: status, headers, gzip body
//! ├── exchange.rs    # Exchange trait (transport seam)
//! ├── push.rs        # dependency push per entry point
//! ├── synthetic.rs   # generated /synthesized/ module graphs
//! ├── http2.rs       # h2 + tokio-rustls listener
//! ├── http1.rs       # tiny_http listener
//! └── tls.rs         # PEM loading, ALPN
//! ```

mod exchange;
mod http1;
mod http2;
mod push;
mod response;
mod route;
mod synthetic;
mod tls;

pub use exchange::Exchange;
pub use push::{PushReport, maybe_push};
pub use response::{Reply, reply_for};
pub use route::resolve;
pub use tls::TlsError;

use std::sync::Arc;

use anyhow::Result;

use crate::{
    catalog::AssetCatalog,
    config::{Protocol, ServerConfig},
    debug, log,
};

/// Read-only state shared by every request.
#[derive(Debug)]
pub struct ServerState {
    catalog: AssetCatalog,
    push: bool,
}

impl ServerState {
    pub fn new(catalog: AssetCatalog, push: bool) -> Self {
        Self { catalog, push }
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn push_enabled(&self) -> bool {
        self.push
    }
}

/// Run the listener selected by `config` until the process exits.
pub fn run(config: &ServerConfig, catalog: AssetCatalog) -> Result<()> {
    let state = Arc::new(ServerState::new(catalog, config.serve.push_enabled()));

    match config.serve.protocol {
        Protocol::H2 => http2::run(state, &config.serve),
        Protocol::Http1 => http1::run(state, &config.serve),
    }
}

/// Handle one request: resolve, push dependencies, then respond.
///
/// `path` is the request target, query included. `/synthesized/` is
/// generated on the fly and never pushes. Pushes are issued before the
/// primary response so the client learns of them before it parses the
/// entry point. HEAD gets headers only and no pushes.
pub fn handle<E: Exchange>(
    state: &ServerState,
    head: bool,
    path: &str,
    mut exchange: E,
) -> Result<(), E::Error> {
    if let Some(reply) = synthetic::reply(path) {
        debug!("serve"; "synthesized {}", path);
        return exchange.respond(if head { reply.without_body() } else { reply });
    }

    let route = resolve(path);

    let reply = reply_for(&state.catalog, &route);
    if !reply.is_success() {
        log!("serve"; "not found: {}", path);
        return exchange.respond(reply);
    }

    debug!("serve"; "{}", route);
    if head {
        return exchange.respond(reply.without_body());
    }

    maybe_push(state, &route, &mut exchange);
    exchange.respond(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{fixture, gunzip};

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Push(String),
        PushFailed(String),
        Respond(Reply),
    }

    /// Records what the handler asks of the transport.
    struct Recorder<'a> {
        events: &'a mut Vec<Event>,
        can_push: bool,
        fail: &'a [&'a str],
        /// A failed push disables further pushes, as a client with push
        /// turned off does.
        refuse_after_failure: bool,
    }

    impl Exchange for Recorder<'_> {
        type Error = String;

        fn supports_push(&self) -> bool {
            self.can_push
        }

        fn push(&mut self, route: &str, reply: Reply) -> Result<(), String> {
            assert_eq!(reply.content_type, Some("application/javascript"));
            if self.fail.contains(&route) {
                self.can_push = !self.refuse_after_failure;
                self.events.push(Event::PushFailed(route.to_owned()));
                return Err(format!("stream refused: {route}"));
            }
            self.events.push(Event::Push(route.to_owned()));
            Ok(())
        }

        fn respond(self, reply: Reply) -> Result<(), String> {
            self.events.push(Event::Respond(reply));
            Ok(())
        }
    }

    fn state(push: bool) -> ServerState {
        let (_dir, build) = fixture::write();
        ServerState::new(AssetCatalog::load(&build, false).unwrap(), push)
    }

    fn request(state: &ServerState, head: bool, path: &str, can_push: bool, fail: &[&str]) -> Vec<Event> {
        let mut events = Vec::new();
        let recorder = Recorder {
            events: &mut events,
            can_push,
            fail,
            refuse_after_failure: false,
        };
        handle(state, head, path, recorder).unwrap();
        events
    }

    fn respond_event(events: &[Event]) -> &Reply {
        match events.last() {
            Some(Event::Respond(reply)) => reply,
            other => panic!("expected a response last, got {other:?}"),
        }
    }

    #[test]
    fn test_pushes_precede_response_in_reverse_order() {
        let state = state(true);
        let events = request(&state, false, "/three/unbundled/app.js", true, &[]);

        let [a, b, c] = fixture::THREE_DEPS;
        assert_eq!(
            events[..3],
            [
                Event::Push(c.to_owned()),
                Event::Push(b.to_owned()),
                Event::Push(a.to_owned()),
            ]
        );
        assert_eq!(events.len(), 4);

        let reply = respond_event(&events);
        assert_eq!(reply.status, 200);
        assert_eq!(gunzip(&reply.body), fixture::content(fixture::THREE_ENTRY));
    }

    #[test]
    fn test_failed_push_does_not_affect_others() {
        let state = state(true);
        let [a, b, c] = fixture::THREE_DEPS;
        let events = request(&state, false, "/three/unbundled/app.js", true, &[b]);

        assert_eq!(
            events[..3],
            [
                Event::Push(c.to_owned()),
                Event::PushFailed(b.to_owned()),
                Event::Push(a.to_owned()),
            ]
        );
        assert_eq!(
            respond_event(&events),
            &reply_for(state.catalog(), fixture::THREE_ENTRY)
        );
    }

    #[test]
    fn test_refused_push_stops_the_round() {
        let state = state(true);
        let [a, b, c] = fixture::THREE_DEPS;
        let mut events = Vec::new();
        let mut recorder = Recorder {
            events: &mut events,
            can_push: true,
            fail: &[c, b, a],
            refuse_after_failure: true,
        };

        let report = maybe_push(&state, fixture::THREE_ENTRY, &mut recorder);
        assert_eq!(report, PushReport { pushed: 0, failed: 1 });
        recorder.respond(Reply::not_found()).unwrap();
        assert_eq!(
            events,
            [
                Event::PushFailed(c.to_owned()),
                Event::Respond(Reply::not_found()),
            ]
        );
    }

    #[test]
    fn test_push_disabled() {
        let state = state(false);
        let events = request(&state, false, "/three/unbundled/app.js", true, &[]);
        assert_eq!(events.len(), 1);
        assert_eq!(respond_event(&events).status, 200);
    }

    #[test]
    fn test_transport_without_push() {
        let state = state(true);
        let events = request(&state, false, "/three/unbundled/app.js", false, &[]);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_no_push_for_non_entry_routes() {
        let state = state(true);
        for path in [
            "/three/unbundled.html",
            "/three/unbundled/src/a.js",
            "/three/bundled-optimized/app.js",
            "/moment/unbundled/app.js",
        ] {
            let events = request(&state, false, path, true, &[]);
            assert_eq!(events.len(), 1, "{path}");
        }
    }

    #[test]
    fn test_cache_busted_request_matches_plain() {
        let state = state(true);
        let plain = request(&state, false, "/three/unbundled/app.js", true, &[]);
        let busted = request(&state, false, "/r/12345/three/unbundled/app.js", true, &[]);
        assert_eq!(plain, busted);
    }

    #[test]
    fn test_root_serves_index() {
        let state = state(false);
        let events = request(&state, false, "/", true, &[]);
        let reply = respond_event(&events);
        assert_eq!(reply.content_type, Some("text/html"));
        assert_eq!(gunzip(&reply.body), fixture::content("index.html"));
    }

    #[test]
    fn test_unknown_route_is_404() {
        let state = state(true);
        for path in ["/missing.js", "/r/7/three/", "/three/unbundled/src/d.js"] {
            let events = request(&state, false, path, true, &[]);
            assert_eq!(events, [Event::Respond(Reply::not_found())], "{path}");
        }
    }

    #[test]
    fn test_synthesized_bypasses_catalog() {
        let state = state(true);
        let events = request(&state, false, "/synthesized/a.js?depth=1&cacheable", true, &[]);
        assert_eq!(events.len(), 1);

        let reply = respond_event(&events);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.encoding, None);
        assert_eq!(reply.cache_control, Some("max-age=86400"));
        let source = std::str::from_utf8(&reply.body).unwrap();
        assert_eq!(source.matches("import {} from './a.js?").count(), 2);

        let events = request(&state, true, "/synthesized/index", true, &[]);
        let reply = respond_event(&events);
        assert_eq!(reply.content_type, Some("text/html"));
        assert!(reply.body.is_empty());
        assert!(reply.content_length > 0);
    }

    #[test]
    fn test_head_has_no_body_and_no_push() {
        let state = state(true);
        let events = request(&state, true, "/three/unbundled/app.js", true, &[]);
        assert_eq!(events.len(), 1);

        let reply = respond_event(&events);
        assert_eq!(reply.status, 200);
        assert!(reply.body.is_empty());
        assert_eq!(
            reply.content_length,
            reply_for(state.catalog(), fixture::THREE_ENTRY).content_length
        );
    }
}
