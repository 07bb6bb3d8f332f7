//! Datagram (UDP) delivery
//!
//! Fire-and-forget: a datagram accepted by the local socket counts as sent.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use bytes::Bytes;
use contracts::{ContractError, Destination};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, instrument};

use super::{connect_with_retry, resolve, send_error, send_timeout};

async fn open_socket(addr: SocketAddr) -> std::io::Result<UdpSocket> {
    let local: SocketAddr = if addr.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(addr).await?;
    Ok(socket)
}

/// Send every packet as one datagram; returns bytes handed to the socket
#[instrument(
    name = "transport_send_datagrams",
    skip(destination, packets),
    fields(destination = %destination.alias, packets = packets.len())
)]
pub async fn send_datagrams(
    destination: &Destination,
    packets: &[Bytes],
) -> Result<usize, ContractError> {
    let candidates = resolve(destination).await?;
    let socket = connect_with_retry(destination, &candidates, open_socket).await?;

    let mut total = 0;
    for packet in packets {
        match timeout(destination.timeout, socket.send(packet)).await {
            Ok(Ok(sent)) => total += sent,
            Ok(Err(e)) => return Err(send_error(destination, e)),
            Err(_) => return Err(send_timeout(destination)),
        }
    }

    debug!(bytes = total, "Datagrams sent");
    Ok(total)
}
