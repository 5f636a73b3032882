//! UDP implementation of the vehicle link

use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{info, trace};

use super::Transport;
use crate::{LinkError, Result};

/// One UDP socket bound to a local port, sending to a fixed remote endpoint.
///
/// The socket is not `connect`ed: telemetry may arrive from a different source
/// port than the one control frames are sent to.
#[derive(Debug)]
pub struct UdpLink {
    socket: UdpSocket,
    remote: SocketAddr,
}

impl UdpLink {
    /// Bind `local` and target `remote` for all outbound datagrams.
    pub async fn bind(local: SocketAddr, remote: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| LinkError::io(format!("binding {}", local), e))?;
        let bound = socket.local_addr().map_err(|e| LinkError::io("reading local address", e))?;
        info!(local = %bound, remote = %remote, "UDP link bound");
        Ok(Self { socket, remote })
    }
}

#[async_trait::async_trait]
impl Transport for UdpLink {
    async fn send(&self, datagram: &[u8]) -> Result<usize> {
        let sent = self
            .socket
            .send_to(datagram, self.remote)
            .await
            .map_err(|e| LinkError::io(format!("sending to {}", self.remote), e))?;
        trace!(bytes = sent, "Datagram sent");
        Ok(sent)
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        let (len, from) =
            self.socket.recv_from(buf).await.map_err(|e| LinkError::io("receiving datagram", e))?;
        trace!(bytes = len, %from, "Datagram received");
        Ok(len)
    }

    fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(|e| LinkError::io("reading local address", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    #[tokio::test]
    async fn send_reaches_remote_and_recv_returns_length() {
        let vehicle = UdpSocket::bind(loopback()).await.unwrap();
        let vehicle_addr = vehicle.local_addr().unwrap();

        let link = UdpLink::bind(loopback(), vehicle_addr).await.unwrap();
        assert_eq!(link.remote_addr(), vehicle_addr);

        let sent = link.send(&[0xAC, 1, 2, 3]).await.unwrap();
        assert_eq!(sent, 4);

        let mut buf = [0u8; 16];
        let (len, from) = vehicle.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], &[0xAC, 1, 2, 3]);

        vehicle.send_to(&[0xAE, 9], from).await.unwrap();
        let len = link.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], &[0xAE, 9]);
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let taken = UdpSocket::bind(loopback()).await.unwrap();
        let addr = taken.local_addr().unwrap();
        let err = UdpLink::bind(addr, addr).await.unwrap_err();
        assert!(matches!(err, LinkError::Io { .. }));
    }
}
