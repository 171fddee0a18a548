/*!
# Example
Shows how to query an NTP server for the round-trip delay and the offset of
the local clock relative to the server's clock.

```rust,no_run
fn main() {
    let stats = ntp_probe::request("0.pool.ntp.org").unwrap();
    println!("delay:  {} us", stats.delay.num_microseconds().unwrap());
    println!("offset: {} us", stats.offset.num_microseconds().unwrap());
}
```

A single call performs exactly one NTPv4 (RFC 5905) client-mode exchange over
UDP: build the 48-byte request, stamp it with the local clock, send it,
validate the reply, and derive the delay and offset from the four protocol
timestamps. Nothing is retried, filtered, or smoothed, and the local clock is
never adjusted.
*/

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod protocol;
pub mod unix_time;

use log::debug;
use protocol::{ConstPackedSizeBytes, ReadBytes, WriteBytes};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

pub use error::NtpError;

/// The fixed round-trip deadline applied by [`request`], covering both the write and the read.
const REQUEST_DEADLINE: Duration = Duration::from_secs(5);

/// The measurement produced by a successful exchange.
///
/// Both quantities are signed: the offset of a clock running ahead of the server is negative,
/// and so (pathologically, with an unstable local clock) can be the delay.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NtpStats {
    /// Network-only round-trip delay, `(T4 - T1) - (T3 - T2)`: the client-observed round trip
    /// minus the server-side span between receiving the request and transmitting the reply.
    pub delay: chrono::Duration,
    /// Estimated clock offset, `((T2 - T1) + (T3 - T4)) / 2`: the average of the two one-way
    /// skew estimates, valid under the assumption of symmetric network delay. Positive when the
    /// local clock is behind the server.
    pub offset: chrono::Duration,
}

/// Select the appropriate bind address based on the target address family.
///
/// Returns `"0.0.0.0:0"` for IPv4 targets and `"[::]:0"` for IPv6 targets.
fn bind_addr_for(target: &SocketAddr) -> &'static str {
    match target {
        SocketAddr::V4(_) => "0.0.0.0:0",
        SocketAddr::V6(_) => "[::]:0",
    }
}

/// Time remaining until `deadline`, or a `TimedOut` error once it has passed.
///
/// Feeding the remainder to the socket timeouts turns the two relative I/O timeouts into one
/// absolute deadline across write and read.
fn time_left(deadline: std::time::Instant) -> io::Result<Duration> {
    let left = deadline.saturating_duration_since(std::time::Instant::now());
    if left.is_zero() {
        return Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "NTP request deadline exceeded",
        ));
    }
    Ok(left)
}

/// Build an NTPv4 client request packet and serialize it.
///
/// Returns the serialized buffer together with the origin time T1: once as the wall-clock
/// instant used for the delay/offset arithmetic, and once as the NTP timestamp written into the
/// transmit field, kept for the bit-for-bit origin comparison against the reply.
fn build_request_packet() -> io::Result<(
    [u8; protocol::Packet::PACKED_SIZE_BYTES],
    unix_time::Instant,
    protocol::TimestampFormat,
)> {
    let origin_time = unix_time::Instant::now();
    let t1: protocol::TimestampFormat = origin_time.into();

    let mut packet = protocol::Packet::default();
    packet.set_mode(protocol::Mode::Client);
    packet.set_version(protocol::Version::V4);
    packet.transmit_timestamp = t1;

    let mut send_buf = [0u8; protocol::Packet::PACKED_SIZE_BYTES];
    (&mut send_buf[..]).write_bytes(packet)?;
    Ok((send_buf, origin_time, t1))
}

/// Validate a decoded reply and extract the server-side timestamps T2 and T3.
///
/// Checks, in order, first failure aborting with no partial result:
/// 1. The receive and transmit timestamps must each lie strictly after the Unix epoch. A
///    timestamp at or before that floor means the packet is all-zero or otherwise degenerate.
/// 2. The origin timestamp must echo the request's transmit timestamp exactly. Anything else is
///    a stale, replayed, or spoofed reply and is rejected outright, never used best-effort.
fn validate_reply(
    reply: &protocol::Packet,
    t1: protocol::TimestampFormat,
) -> Result<(unix_time::Instant, unix_time::Instant), NtpError> {
    let t2 = unix_time::Instant::from(reply.receive_timestamp);
    let t3 = unix_time::Instant::from(reply.transmit_timestamp);

    if t2 <= unix_time::Instant::UNIX_EPOCH || t3 <= unix_time::Instant::UNIX_EPOCH {
        return Err(NtpError::ZeroPacket);
    }

    if reply.origin_timestamp != t1 {
        return Err(NtpError::BogusPacket);
    }

    Ok((t2, t3))
}

/// Derive the measurement from the four exchange timestamps.
///
/// `t1`/`t4` are the local send and receive instants, `t2`/`t3` the server's receive and
/// transmit instants. All arithmetic is in signed nanoseconds.
fn compute_stats(
    t1: &unix_time::Instant,
    t2: &unix_time::Instant,
    t3: &unix_time::Instant,
    t4: &unix_time::Instant,
) -> NtpStats {
    let net_rtt_delay = t4.duration_since(t1);
    let srv_sched_delay = t3.duration_since(t2);
    let delay = net_rtt_delay - srv_sched_delay;
    let offset = (t2.duration_since(t1) + t3.duration_since(t4)) / 2;
    NtpStats { delay, offset }
}

/// Query the NTP server at `host` and return the measured delay and offset.
///
/// `host` is a bare hostname or address; the well-known NTP port 123 is appended internally.
/// The whole round trip, write and read together, is bounded by a 5-second deadline.
///
/// # Examples
///
/// ```no_run
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let stats = ntp_probe::request("pool.ntp.org")?;
/// println!("offset: {} us", stats.offset.num_microseconds().unwrap());
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`NtpError::Io`] if resolution, connection, or transport I/O fails or the deadline
/// is exceeded; [`NtpError::ZeroPacket`] if the reply carries degenerate timestamps; and
/// [`NtpError::BogusPacket`] if the reply does not answer this exact request. Any error means
/// no measurement was obtained.
pub fn request(host: &str) -> Result<NtpStats, NtpError> {
    request_with_timeout((host, protocol::PORT), REQUEST_DEADLINE)
}

/// Query an NTP server with an explicit address and round-trip deadline.
///
/// Unlike [`request`], the address carries its own port, so non-standard ports (and loopback
/// test servers) are reachable. `timeout` is an absolute budget measured from the start of the
/// call; the write and the read share it.
///
/// The UDP socket lives for exactly one exchange and is closed on every exit path, success or
/// failure.
pub fn request_with_timeout<A: ToSocketAddrs>(
    addr: A,
    timeout: Duration,
) -> Result<NtpStats, NtpError> {
    let deadline = std::time::Instant::now() + timeout;

    let target = addr
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "address resolved to no socket addresses",
            )
        })?;

    // Connecting restricts received datagrams to the chosen peer, so no explicit source
    // address check is needed after the read.
    let sock = UdpSocket::bind(bind_addr_for(&target))?;
    sock.connect(target)?;

    let (send_buf, origin_time, t1) = build_request_packet()?;

    sock.set_write_timeout(Some(time_left(deadline)?))?;
    let sent = sock.send(&send_buf)?;
    debug!("sent {} bytes to {}", sent, target);

    // Receive into a larger buffer: servers may append extension fields or a MAC, which are
    // ignored beyond the 48-byte header.
    let mut recv_buf = [0u8; 1024];
    sock.set_read_timeout(Some(time_left(deadline)?))?;
    let recv_len = sock.recv(&mut recv_buf[..])?;
    let destination_time = unix_time::Instant::now();
    debug!("received {} bytes from {}", recv_len, target);

    if recv_len < protocol::Packet::PACKED_SIZE_BYTES {
        return Err(NtpError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "NTP response too short",
        )));
    }
    let reply: protocol::Packet =
        (&recv_buf[..protocol::Packet::PACKED_SIZE_BYTES]).read_bytes()?;

    let (receive_time, transmit_time) = validate_reply(&reply, t1)?;

    Ok(compute_stats(
        &origin_time,
        &receive_time,
        &transmit_time,
        &destination_time,
    ))
}
