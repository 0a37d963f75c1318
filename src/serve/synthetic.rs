//! Generated module graphs, independent of the asset catalog.
//!
//! `/synthesized/<anything>` serves a page that loads `a.js` as a module.
//! `/synthesized/a.js` imports itself `branch` times with `depth - 1`, so a
//! single request unfolds into a tree of `branch^depth` module fetches.
//!
//! Query parameters:
//!
//! | name        | page | a.js                                   |
//! |-------------|------|----------------------------------------|
//! | `depth`     | 5    | no imports when absent or `<= 0`       |
//! | `branch`    | -    | 2; `1` imports once without `n`        |
//! | `cacheable` | -    | `cache-control: max-age=86400`         |
//! | `delay`     | -    | hold the response for that many ms     |
//!
//! The page forwards what it was given to `a.js`.

use std::{fmt::Write, str::FromStr, time::Duration};

use url::form_urlencoded;

use crate::utils::mime::types;

use super::Reply;

const PREFIX: &str = "/synthesized/";
const MODULE_PATH: &str = "/synthesized/a.js";

/// Depth used by the page when none is given.
const DEFAULT_DEPTH: &str = "5";
const DEFAULT_BRANCH: i64 = 2;
const CACHE_FOR_A_DAY: &str = "max-age=86400";

/// Functions in each generated module body.
const FILLER_FUNCTIONS: usize = 10;

/// Parameters the page passes on to `a.js`, in this order.
const FORWARDED: [&str; 3] = ["branch", "cacheable", "delay"];

/// The generated reply for `path`, or `None` outside `/synthesized/`.
///
/// `path` is the raw request target, query included.
pub fn reply(path: &str) -> Option<Reply> {
    let (path, query) = path.split_once('?').unwrap_or((path, ""));
    if path == MODULE_PATH {
        Some(module(query))
    } else if path.starts_with(PREFIX) {
        Some(page(query))
    } else {
        None
    }
}

/// Decoded query pairs, in request order, repeats kept.
struct Query(Vec<(String, String)>);

impl Query {
    fn parse(raw: &str) -> Self {
        Self(
            form_urlencoded::parse(raw.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }

    fn first(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn has(&self, key: &str) -> bool {
        self.first(key).is_some()
    }

    /// First value of `key` as a number. An unparsable value is an error.
    fn number<T: FromStr>(&self, key: &str) -> Result<Option<T>, String> {
        self.first(key)
            .map(|v| v.parse().map_err(|_| format!("invalid {key}: {v:?}")))
            .transpose()
    }

    /// Replace every value of `key` with `value`.
    fn set(&mut self, key: &str, value: String) {
        self.0.retain(|(k, _)| k != key);
        self.0.push((key.to_owned(), value));
    }

    /// `application/x-www-form-urlencoded`, keys sorted, repeats in order.
    fn encode(&self) -> String {
        let mut pairs: Vec<_> = self.0.iter().collect();
        pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish()
    }
}

fn page(raw: &str) -> Reply {
    let query = Query::parse(raw);

    let mut src = form_urlencoded::Serializer::new(String::from("a.js?"));
    src.append_pair("depth", query.first("depth").unwrap_or(DEFAULT_DEPTH));
    for key in FORWARDED {
        if let Some(value) = query.first(key) {
            src.append_pair(key, value);
        }
    }
    let src = src.finish().replace('&', "&amp;");

    let html = format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>Synthesized module graph</title>\n\
         </head>\n\
         <body>\n\
         <script type=\"module\" src=\"{src}\"></script>\n\
         </body>\n\
         </html>\n"
    );
    Reply::uncompressed(200, types::HTML, html)
}

fn module(raw: &str) -> Reply {
    let mut query = Query::parse(raw);
    match module_source(&mut query) {
        Ok(source) => Reply {
            cache_control: query.has("cacheable").then_some(CACHE_FOR_A_DAY),
            delay: delay(&query),
            ..Reply::uncompressed(200, types::JAVASCRIPT, source)
        },
        Err(reason) => Reply::bad_request(reason),
    }
}

/// Imports for the next level down, then a filler body.
fn module_source(query: &mut Query) -> Result<String, String> {
    let mut out = String::new();

    let depth = query.number::<i64>("depth")?.unwrap_or(0);
    let branch = query.number::<i64>("branch")?.unwrap_or(DEFAULT_BRANCH);
    // Reject a bad delay before generating anything.
    query.number::<i64>("delay")?;

    if depth > 0 {
        query.set("depth", (depth - 1).to_string());
        let params = query.encode();
        if branch == 1 {
            writeln!(out, "import {{}} from './a.js?{params}';").ok();
        } else {
            for i in 0..branch {
                writeln!(out, "import {{}} from './a.js?{params}&n={i}';").ok();
            }
        }
    }

    out.push_str(
        "\n// Bogus script\n\
         (function() {\n  \
           function notActuallyCalled(arg) {\n    \
             return 'This string not actually used: ' + arg;\n  \
           }\n",
    );
    for i in 0..FILLER_FUNCTIONS {
        write!(
            out,
            "\n    function fib{i}(n) {{\n      \
               if (n < 2)\n        \
                 return 1;\n      \
               return fib{i}(n-2) + fib{i}(n-1);\n    \
             }}\n"
        )
        .ok();
    }
    out.push_str("\n})();\n");
    Ok(out)
}

/// `delay` in milliseconds. Zero or negative means no delay.
fn delay(query: &Query) -> Option<Duration> {
    query
        .number::<i64>("delay")
        .ok()
        .flatten()
        .and_then(|ms| u64::try_from(ms).ok())
        .filter(|&ms| ms > 0)
        .map(Duration::from_millis)
}
