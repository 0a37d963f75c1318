//! Server push of an entry point's dependencies.

use crate::{debug, log};

use super::{Exchange, Reply, ServerState};

/// Outcome of one push round.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PushReport {
    pub pushed: usize,
    pub failed: usize,
}

impl PushReport {
    pub fn attempted(&self) -> usize {
        self.pushed + self.failed
    }
}

/// Push every dependency of `route`, last manifest entry first.
///
/// Best-effort: a failed push is logged and the next one is tried, unless
/// the failure leaves the transport unable to push at all. Does nothing when
/// push is off, the transport cannot push, or `route` has no dependencies.
pub fn maybe_push<E: Exchange>(state: &ServerState, route: &str, exchange: &mut E) -> PushReport {
    let mut report = PushReport::default();
    if !state.push_enabled() || !exchange.supports_push() {
        return report;
    }

    let catalog = state.catalog();
    for dep in catalog.dependencies().push_order(route) {
        let Some(entry) = catalog.get(dep) else {
            continue;
        };

        match exchange.push(dep, Reply::pushed(entry)) {
            Ok(()) => {
                debug!("push"; "/{}", dep);
                report.pushed += 1;
            }
            Err(e) if !exchange.supports_push() => {
                debug!("push"; "client refused pushes for {}: {}", route, e);
                report.failed += 1;
                break;
            }
            Err(e) => {
                log!("push"; "failed to push /{}: {}", dep, e);
                report.failed += 1;
            }
        }
    }

    if report.attempted() > 0 {
        debug!("push"; "{}: {} pushed, {} failed", route, report.pushed, report.failed);
    }
    report
}
