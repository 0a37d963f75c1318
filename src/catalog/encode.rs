//! Gzip encoding of stored payloads.

use std::io::{self, Write};

use flate2::{Compression, write::GzEncoder};

/// Compress `content` with gzip at the default level.
pub fn gzip(content: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(
        Vec::with_capacity(content.len() / 3 + 32),
        Compression::default(),
    );
    encoder.write_all(content)?;
    encoder.finish()
}

/// Inverse of [`gzip`], for asserting on served bodies.
#[cfg(test)]
pub fn gunzip(data: &[u8]) -> Vec<u8> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut out = Vec::new();
    GzDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}
