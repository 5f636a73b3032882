//! Test utilities for driving the link without a network.
//!
//! [`ChannelTransport`] stands in for the UDP socket. Its [`VehicleEnd`] plays
//! the vehicle: it sees every datagram the station sends and can inject
//! telemetry datagrams for the station to receive.

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::{Mutex, mpsc};

use crate::transport::Transport;
use crate::types::{Axis, JoystickSample};
use crate::{LinkError, Result};

const TEST_REMOTE: ([u8; 4], u16) = ([127, 0, 0, 1], 3010);
const TEST_LOCAL: ([u8; 4], u16) = ([127, 0, 0, 1], 3011);

/// In-memory transport backed by unbounded channels.
#[derive(Debug)]
pub struct ChannelTransport {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    fail_sends: Arc<AtomicU32>,
}

/// Vehicle side of a [`ChannelTransport`].
#[derive(Debug)]
pub struct VehicleEnd {
    sent: mpsc::UnboundedReceiver<Vec<u8>>,
    inject: mpsc::UnboundedSender<Vec<u8>>,
    fail_sends: Arc<AtomicU32>,
}

impl ChannelTransport {
    /// Create a connected transport and vehicle end.
    pub fn pair() -> (Arc<Self>, VehicleEnd) {
        let (outbound, sent) = mpsc::unbounded_channel();
        let (inject, inbound) = mpsc::unbounded_channel();
        let fail_sends = Arc::new(AtomicU32::new(0));

        let transport =
            Arc::new(Self { outbound, inbound: Mutex::new(inbound), fail_sends: Arc::clone(&fail_sends) });
        (transport, VehicleEnd { sent, inject, fail_sends })
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, datagram: &[u8]) -> Result<usize> {
        let failing = self
            .fail_sends
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(LinkError::io(
                "send datagram",
                io::Error::new(io::ErrorKind::ConnectionRefused, "injected send failure"),
            ));
        }

        self.outbound
            .send(datagram.to_vec())
            .map_err(|_| LinkError::io("send datagram", io::ErrorKind::BrokenPipe.into()))?;
        Ok(datagram.len())
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        let datagram = self
            .inbound
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| LinkError::io("receive datagram", io::ErrorKind::BrokenPipe.into()))?;

        // Oversized datagrams are truncated the way a UDP socket truncates them
        let len = datagram.len().min(buf.len());
        buf[..len].copy_from_slice(&datagram[..len]);
        Ok(len)
    }

    fn remote_addr(&self) -> SocketAddr {
        SocketAddr::from(TEST_REMOTE)
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(SocketAddr::from(TEST_LOCAL))
    }
}

impl VehicleEnd {
    /// Next datagram the station sent, or `None` once the transport is gone.
    pub async fn next_sent(&mut self) -> Option<Vec<u8>> {
        self.sent.recv().await
    }

    /// Datagrams already sent and not yet taken.
    pub fn drain_sent(&mut self) -> Vec<Vec<u8>> {
        let mut datagrams = Vec::new();
        while let Ok(datagram) = self.sent.try_recv() {
            datagrams.push(datagram);
        }
        datagrams
    }

    /// Queue a datagram for the station to receive.
    pub fn inject(&self, datagram: Vec<u8>) {
        // Receiver is gone only after the transport is dropped
        let _ = self.inject.send(datagram);
    }

    /// Make the next `count` sends fail with an I/O error.
    pub fn fail_next_sends(&self, count: u32) {
        self.fail_sends.store(count, Ordering::Release);
    }
}

/// Sample with a single axis deflected and everything else neutral.
pub fn deflected_sample(axis: Axis, value: i16) -> JoystickSample {
    JoystickSample::neutral().with_axis(axis, value)
}

/// Samples sweeping every axis through its full range, for benchmarks.
pub fn sweep_samples(steps: usize) -> Vec<JoystickSample> {
    let steps = steps.max(2);
    (0..steps)
        .map(|i| {
            let value = (-127 + (254 * i / (steps - 1)) as i32) as i16;
            let mut sample = JoystickSample::neutral();
            for (slot, axis) in Axis::ALL.iter().enumerate() {
                // Stagger axes so they do not all move in lockstep
                let offset = (slot as i16 * 37) % 127;
                sample = sample.with_axis(*axis, value.saturating_add(offset).clamp(-127, 127));
            }
            sample.hats = [(i % 3) as i8 - 1, ((i / 3) % 3) as i8 - 1];
            sample.buttons.camera_select = i % 4 == 0;
            sample
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn datagrams_cross_in_both_directions() {
        let (transport, mut vehicle) = ChannelTransport::pair();

        transport.send(&[1, 2, 3]).await.unwrap();
        assert_eq!(vehicle.next_sent().await, Some(vec![1, 2, 3]));

        vehicle.inject(vec![9; 40]);
        let mut buf = [0u8; 16];
        assert_eq!(transport.recv(&mut buf).await.unwrap(), 16);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let (transport, mut vehicle) = ChannelTransport::pair();
        vehicle.fail_next_sends(1);

        assert!(transport.send(&[1]).await.is_err());
        transport.send(&[2]).await.unwrap();
        assert_eq!(vehicle.drain_sent(), vec![vec![2]]);
    }

    #[test]
    fn sweep_covers_axis_range() {
        let samples = sweep_samples(16);
        assert_eq!(samples.len(), 16);
        assert_eq!(samples[0].axes[0], -127);
        assert_eq!(samples[15].axes[0], 127);
    }
}
