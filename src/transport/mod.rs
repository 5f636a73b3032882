//! Datagram transport to the vehicle
//!
//! The [`Transport`] trait is the I/O seam of the link: the driver tasks only
//! ever see whole datagrams going out to one fixed remote endpoint and whole
//! datagrams coming in. There is no acknowledgement, retry or ordering layer;
//! a lost datagram is superseded by the next one.

use std::net::SocketAddr;

use crate::Result;

pub mod udp;

pub use udp::UdpLink;

/// Best-effort datagram link to the vehicle.
///
/// Methods take `&self` so one transport can be shared between the sending
/// tasks and the receive task behind an `Arc`.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send one datagram to the remote endpoint.
    ///
    /// Returns the number of bytes handed to the network. A returned error is
    /// for this datagram only; the next send is attempted independently.
    async fn send(&self, datagram: &[u8]) -> Result<usize>;

    /// Wait for the next inbound datagram and copy it into `buf`.
    ///
    /// Returns the datagram length. Datagrams longer than `buf` are truncated
    /// by the socket, so callers size `buf` above the largest expected record.
    async fn recv(&self, buf: &mut [u8]) -> Result<usize>;

    /// Address the vehicle datagrams are sent to.
    fn remote_addr(&self) -> SocketAddr;

    /// Local address the transport listens on.
    fn local_addr(&self) -> Result<SocketAddr>;
}
