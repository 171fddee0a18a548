// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error types for the one-shot NTP query.
//!
//! Every condition is terminal for the single call: there are no retries and no partial results,
//! so a caller must treat any error as "no measurement obtained".

use std::fmt;
use std::io;

/// Errors that can occur during an NTP query.
#[derive(Debug)]
pub enum NtpError {
    /// Address resolution, socket setup, or transport I/O failure, including exceeding the
    /// round-trip deadline. Propagated unchanged from the underlying operation.
    Io(io::Error),
    /// The decoded receive or transmit timestamp of the reply is at or before the Unix epoch.
    /// The server packet is all-zero or otherwise degenerate.
    ZeroPacket,
    /// The reply's origin timestamp does not equal, bit for bit, the transmit timestamp of our
    /// request. The reply is stale, replayed, or a response to a different request.
    BogusPacket,
}

impl fmt::Display for NtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NtpError::Io(e) => write!(f, "{e}"),
            NtpError::ZeroPacket => write!(f, "received zero packet"),
            NtpError::BogusPacket => write!(f, "received bogus packet"),
        }
    }
}

impl std::error::Error for NtpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NtpError::Io(e) => Some(e),
            NtpError::ZeroPacket | NtpError::BogusPacket => None,
        }
    }
}

impl From<io::Error> for NtpError {
    fn from(e: io::Error) -> Self {
        NtpError::Io(e)
    }
}
