//! Art-Net UDP listener
//!
//! Owns the UDP socket. Data frames for the followed universe go to the
//! scheduler actor; polls are answered on the spot with an ArtPollReply
//! broadcast; everything else is dropped.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use dmx_protocol::{decode, EncodePacket, Packet, ARTNET_PORT};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::actor::SchedulerCommand;
use crate::error::EngineError;
use crate::network::NetworkIdentity;

/// Name announced in poll replies unless overridden
pub const DEFAULT_NODE_NAME: &str = "HueDMX";

/// Largest datagram read; an ArtDmx packet is at most 530 bytes
const RECV_BUFFER_LEN: usize = 1024;

/// Pause after the first failed receive; doubles per consecutive failure
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(10);
/// Longest pause between failed receives
const RECV_ERROR_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Delay before receiving again after `failures` consecutive errors
fn recv_backoff(failures: u32) -> Duration {
    RECV_ERROR_BACKOFF
        .saturating_mul(1 << failures.saturating_sub(1).min(16))
        .min(RECV_ERROR_BACKOFF_MAX)
}

/// Where poll replies are broadcast for a given bind address
///
/// Bound to all interfaces: limited broadcast. Otherwise the bind address's
/// first octet followed by `255.255.255`.
pub fn poll_reply_target(bind_ip: IpAddr) -> IpAddr {
    match bind_ip {
        IpAddr::V4(v4) if !v4.is_unspecified() => {
            IpAddr::V4(Ipv4Addr::new(v4.octets()[0], 255, 255, 255))
        }
        _ => IpAddr::V4(Ipv4Addr::BROADCAST),
    }
}

/// UDP endpoint following one universe
pub struct UniverseListener {
    socket: UdpSocket,
    universe: u16,
    frame_tx: mpsc::Sender<SchedulerCommand>,
    node_name: String,
    identity: Option<NetworkIdentity>,
    reply_target: SocketAddr,
}

impl UniverseListener {
    /// Bind the socket with broadcast enabled
    pub async fn bind(
        addr: SocketAddr,
        universe: u16,
        frame_tx: mpsc::Sender<SchedulerCommand>,
    ) -> Result<Self, EngineError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| EngineError::Bind { addr, source })?;
        socket
            .set_broadcast(true)
            .map_err(|source| EngineError::Bind { addr, source })?;

        info!("Listening for Art-Net universe {} on {}", universe, addr);

        Ok(Self {
            socket,
            universe,
            frame_tx,
            node_name: DEFAULT_NODE_NAME.to_string(),
            identity: None,
            reply_target: SocketAddr::new(poll_reply_target(addr.ip()), ARTNET_PORT),
        })
    }

    /// Announce a different node name in poll replies
    pub fn with_node_name(mut self, name: impl Into<String>) -> Self {
        self.node_name = name.into();
        self
    }

    /// Use a fixed identity instead of detecting it on every poll
    pub fn with_identity(mut self, identity: NetworkIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Send poll replies somewhere other than the derived broadcast address
    pub fn with_reply_target(mut self, target: SocketAddr) -> Self {
        self.reply_target = target;
        self
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, EngineError> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive datagrams until the scheduler goes away
    pub async fn run(self) -> Result<(), EngineError> {
        let mut buf = [0u8; RECV_BUFFER_LEN];
        let mut failures: u32 = 0;

        loop {
            let (len, from) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => {
                    failures = 0;
                    received
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    if failures == 1 {
                        warn!("UDP receive failed: {}", e);
                    } else {
                        debug!("UDP receive failed ({} in a row): {}", failures, e);
                    }
                    tokio::time::sleep(recv_backoff(failures)).await;
                    continue;
                }
            };

            match decode(&buf[..len]) {
                Packet::Ignored => {}
                Packet::Poll => {
                    debug!("ArtPoll from {}", from);
                    self.answer_poll().await;
                }
                Packet::Dmx(frame) if frame.universe == self.universe => {
                    trace!("ArtDmx seq {} from {}", frame.sequence, from);
                    if self
                        .frame_tx
                        .send(SchedulerCommand::Frame(frame))
                        .await
                        .is_err()
                    {
                        info!("Scheduler stopped, listener exiting");
                        return Ok(());
                    }
                }
                Packet::Dmx(frame) => {
                    trace!("Ignoring frame for universe {}", frame.universe);
                }
            }
        }
    }

    async fn answer_poll(&self) {
        let identity = match &self.identity {
            Some(identity) => identity.clone(),
            None => match NetworkIdentity::detect() {
                Ok(identity) => identity,
                Err(e) => {
                    warn!("Not answering ArtPoll: {}", e);
                    return;
                }
            },
        };

        let reply = identity.poll_reply(&self.node_name).encode();
        match self.socket.send_to(&reply, self.reply_target).await {
            Ok(_) => debug!(
                "ArtPollReply for {} ({}) sent to {}",
                identity.ip, identity.interface, self.reply_target
            ),
            Err(e) => warn!("Failed to send ArtPollReply: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_target_all_interfaces() {
        assert_eq!(
            poll_reply_target(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            IpAddr::V4(Ipv4Addr::BROADCAST)
        );
    }

    #[test]
    fn test_reply_target_from_first_octet() {
        assert_eq!(
            poll_reply_target(IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3))),
            IpAddr::V4(Ipv4Addr::new(10, 255, 255, 255))
        );
        assert_eq!(
            poll_reply_target(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20))),
            IpAddr::V4(Ipv4Addr::new(192, 255, 255, 255))
        );
    }

    #[test]
    fn test_recv_backoff_grows_and_caps() {
        assert_eq!(recv_backoff(1), Duration::from_millis(10));
        assert_eq!(recv_backoff(2), Duration::from_millis(20));
        assert_eq!(recv_backoff(5), Duration::from_millis(160));
        assert_eq!(recv_backoff(8), RECV_ERROR_BACKOFF_MAX);
        assert_eq!(recv_backoff(u32::MAX), RECV_ERROR_BACKOFF_MAX);
    }

    #[tokio::test]
    async fn test_bind_conflict_reports_address() {
        let (tx, _rx) = mpsc::channel(1);
        let first = UniverseListener::bind("127.0.0.1:0".parse().unwrap(), 0, tx.clone())
            .await
            .unwrap();
        let taken = first.local_addr().unwrap();

        match UniverseListener::bind(taken, 0, tx).await {
            Err(EngineError::Bind { addr, .. }) => assert_eq!(addr, taken),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("second bind should fail"),
        }
    }
}
