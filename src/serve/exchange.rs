//! The transport seam between request handling and a wire protocol.

use std::fmt;

use super::Reply;

/// One in-flight request as seen by the handler.
///
/// Pushes must be issued before [`Exchange::respond`], which consumes the
/// exchange.
pub trait Exchange {
    type Error: fmt::Display;

    /// Whether the connection can carry server pushes.
    fn supports_push(&self) -> bool;

    /// Promise `route` and send `reply` on the pushed stream.
    fn push(&mut self, route: &str, reply: Reply) -> Result<(), Self::Error>;

    /// Send the primary response.
    fn respond(self, reply: Reply) -> Result<(), Self::Error>;
}
