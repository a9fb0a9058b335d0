//! # Transport Layer
//!
//! UDP on a dedicated I/O thread. One datagram carries exactly one protocol
//! packet; there is no framing, reliability or fragmentation here.
//!
//! ```text
//!   game thread                       I/O thread
//!   ───────────                       ──────────
//!   send(addr, bytes) ── outgoing ──▶ socket.send_to
//!   try_recv()        ◀── datagrams ─ socket.recv_from (non-blocking)
//! ```
//!
//! Both queues are bounded. When the game thread falls behind, incoming
//! datagrams are dropped rather than buffered without limit. Closing the
//! outgoing queue stops the I/O thread once it has sent what was queued.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};

use crate::error::{ServerError, ServerResult};

/// Largest datagram accepted. Longer ones are dropped whole.
pub const MAX_DATAGRAM_SIZE: usize = 8192;

/// Capacity of each queue.
const QUEUE_CAPACITY: usize = 10_000;

/// Idle back-off of the I/O thread.
const IDLE_SLEEP: Duration = Duration::from_micros(500);

/// A received datagram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Datagram {
    /// Sender.
    pub addr: SocketAddr,
    /// Payload.
    pub data: Vec<u8>,
}

/// Where encoded packets go. Implemented by [`UdpTransport`]; tests collect
/// into memory.
pub trait PacketSink {
    /// Queues `data` for `addr`.
    fn send(&mut self, addr: SocketAddr, data: Vec<u8>);
}

/// Transport statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Datagrams sent.
    pub packets_sent: u64,
    /// Datagrams received.
    pub packets_received: u64,
    /// Bytes sent.
    pub bytes_sent: u64,
    /// Bytes received.
    pub bytes_received: u64,
    /// Failed sends.
    pub send_errors: u64,
    /// Failed receives.
    pub recv_errors: u64,
    /// Datagrams dropped because the game thread was behind or they were
    /// longer than [`MAX_DATAGRAM_SIZE`].
    pub dropped: u64,
}

/// UDP socket served by a background thread.
pub struct UdpTransport {
    local_addr: SocketAddr,
    datagrams: Receiver<Datagram>,
    outgoing: Sender<Datagram>,
    io_thread: Option<JoinHandle<TransportStats>>,
}

impl UdpTransport {
    /// Binds `addr` and starts the I/O thread.
    ///
    /// # Errors
    ///
    /// Fails if the socket cannot be bound or configured, or the thread
    /// cannot be spawned.
    pub fn bind(addr: SocketAddr) -> ServerResult<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        let local_addr = socket.local_addr()?;

        let (datagram_tx, datagrams) = bounded(QUEUE_CAPACITY);
        let (outgoing, outgoing_rx) = bounded(QUEUE_CAPACITY);
        let io_thread = std::thread::Builder::new()
            .name("trench-udp".to_string())
            .spawn(move || io_loop(&socket, &datagram_tx, &outgoing_rx))?;

        tracing::info!(%local_addr, "udp transport bound");
        Ok(Self {
            local_addr,
            datagrams,
            outgoing,
            io_thread: Some(io_thread),
        })
    }

    /// Bound address.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Next received datagram, if any.
    pub fn try_recv(&self) -> Option<Datagram> {
        self.datagrams.try_recv().ok()
    }

    /// Sends everything still queued, stops the I/O thread and returns its
    /// statistics.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::TransportClosed`] if the thread already died.
    pub fn shutdown(mut self) -> ServerResult<TransportStats> {
        self.stop().ok_or(ServerError::TransportClosed)
    }

    fn stop(&mut self) -> Option<TransportStats> {
        let handle = self.io_thread.take()?;
        // Dropping our only sender is the stop signal
        let (closed, _) = bounded(0);
        drop(std::mem::replace(&mut self.outgoing, closed));
        handle.join().ok()
    }
}

impl PacketSink for UdpTransport {
    fn send(&mut self, addr: SocketAddr, data: Vec<u8>) {
        match self.outgoing.try_send(Datagram { addr, data }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => tracing::warn!(%addr, "send queue full, packet dropped"),
            Err(TrySendError::Disconnected(_)) => tracing::warn!(%addr, "transport closed"),
        }
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for UdpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpTransport")
            .field("local_addr", &self.local_addr)
            .field("running", &self.io_thread.is_some())
            .finish_non_exhaustive()
    }
}

fn io_loop(
    socket: &UdpSocket,
    datagrams: &Sender<Datagram>,
    outgoing: &Receiver<Datagram>,
) -> TransportStats {
    let mut stats = TransportStats::default();
    // One spare byte tells a full-size datagram from a truncated one
    let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE + 1];

    loop {
        let mut busy = false;

        loop {
            match outgoing.try_recv() {
                Ok(Datagram { addr, data }) => {
                    busy = true;
                    match socket.send_to(&data, addr) {
                        Ok(n) => {
                            stats.packets_sent += 1;
                            stats.bytes_sent += n as u64;
                        }
                        Err(e) => {
                            stats.send_errors += 1;
                            tracing::debug!(%addr, error = %e, "send failed");
                        }
                    }
                }
                Err(TryRecvError::Disconnected) => return stats,
                Err(TryRecvError::Empty) => break,
            }
        }

        loop {
            match socket.recv_from(&mut buffer) {
                Ok((len, addr)) => {
                    busy = true;
                    stats.packets_received += 1;
                    stats.bytes_received += len as u64;
                    if len > MAX_DATAGRAM_SIZE {
                        stats.dropped += 1;
                        tracing::warn!(%addr, "oversized datagram dropped");
                        continue;
                    }
                    let datagram = Datagram {
                        addr,
                        data: buffer[..len].to_vec(),
                    };
                    if datagrams.try_send(datagram).is_err() {
                        stats.dropped += 1;
                        tracing::warn!(%addr, "receive queue full, datagram dropped");
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    // ICMP port unreachable shows up here on some platforms
                    stats.recv_errors += 1;
                    tracing::debug!(error = %e, "receive failed");
                    break;
                }
            }
        }

        if !busy {
            std::thread::sleep(IDLE_SLEEP);
        }
    }
}
