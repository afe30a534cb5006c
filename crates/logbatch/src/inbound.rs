// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Inbound record streams
//!
//! The consumer pulls raw envelopes from an [`Inbound`] implementation.
//! Delivery is auto-acknowledged: an envelope counts as consumed the moment
//! `recv` hands it out, whatever happens to it afterwards.
//!
//! # Implementations
//!
//! - `mpsc::Receiver<RawEnvelope>` -- channel fed by a broker client task
//! - [`LineSource`] -- newline-delimited payloads from a file or stdin

use crate::record::RawEnvelope;
use std::future::Future;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Split};
use tokio::sync::mpsc;

/// Abstract inbound stream
pub trait Inbound: Send {
    /// Receive the next envelope, or `None` once the stream is closed.
    ///
    /// The returned future must be cancel-safe: the consumer drops it
    /// whenever the idle timer wins the race, and no envelope may be lost
    /// when that happens.
    fn recv(&mut self) -> impl Future<Output = Option<RawEnvelope>> + Send;
}

impl Inbound for mpsc::Receiver<RawEnvelope> {
    fn recv(&mut self) -> impl Future<Output = Option<RawEnvelope>> + Send {
        mpsc::Receiver::recv(self)
    }
}

/// Newline-delimited payload reader.
///
/// Each non-blank line is one payload, passed on as raw bytes so that a line
/// which is not valid UTF-8 still reaches the decoder. A trailing `\r` is
/// stripped. Delivery tags count the payloads handed out, starting at 1.
/// An I/O error closes the stream.
pub struct LineSource<R> {
    lines: Split<R>,
    next_tag: u64,
    closed: bool,
}

impl<R: AsyncBufRead + Unpin + Send> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.split(b'\n'),
            next_tag: 1,
            closed: false,
        }
    }
}

impl LineSource<BufReader<tokio::io::Stdin>> {
    /// Read payloads from standard input until EOF
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl LineSource<BufReader<tokio::fs::File>> {
    /// Read payloads from a file until EOF
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin + Send> Inbound for LineSource<R> {
    fn recv(&mut self) -> impl Future<Output = Option<RawEnvelope>> + Send {
        async move {
            if self.closed {
                return None;
            }

            loop {
                match self.lines.next_segment().await {
                    Ok(Some(mut line)) => {
                        if line.last() == Some(&b'\r') {
                            line.pop();
                        }
                        if line.iter().all(u8::is_ascii_whitespace) {
                            continue;
                        }
                        let tag = self.next_tag;
                        self.next_tag += 1;
                        return Some(RawEnvelope::new(line, tag));
                    }
                    Ok(None) => {
                        self.closed = true;
                        return None;
                    }
                    Err(e) => {
                        tracing::warn!("Inbound read failed, closing stream: {}", e);
                        self.closed = true;
                        return None;
                    }
                }
            }
        }
    }
}
