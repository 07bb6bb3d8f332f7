//! Transport - resolve, connect with bounded retry, send
//!
//! Connection attempts cycle through resolved candidates in order and stop
//! at the first success or after `Destination::attempts()` tries. Every
//! network step is bounded by the destination timeout.

mod datagram;
mod stream;

pub use self::datagram::send_datagrams;
pub use self::stream::send_stream;

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use contracts::{ContractError, Destination, TransportFailure};
use tokio::net::lookup_host;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// Resolve `host:port` into connection candidates, in resolver order
#[instrument(name = "transport_resolve", skip(destination), fields(endpoint = %destination.endpoint()))]
pub async fn resolve(destination: &Destination) -> Result<Vec<SocketAddr>, ContractError> {
    let endpoint = destination.endpoint();
    let lookup = lookup_host((destination.host.as_str(), destination.port));

    let candidates: Vec<SocketAddr> = match timeout(destination.timeout, lookup).await {
        Ok(Ok(addrs)) => addrs.collect(),
        Ok(Err(e)) => {
            return Err(ContractError::transport(
                endpoint,
                TransportFailure::HostNotFound,
                e.to_string(),
            ))
        }
        Err(_) => {
            return Err(ContractError::transport(
                endpoint,
                TransportFailure::Timeout,
                format!("name resolution exceeded {:?}", destination.timeout),
            ))
        }
    };

    if candidates.is_empty() {
        return Err(ContractError::transport(
            endpoint,
            TransportFailure::HostNotFound,
            "no addresses resolved",
        ));
    }

    debug!(candidates = candidates.len(), "Resolved");
    Ok(candidates)
}

/// Try `connect` against candidates until one succeeds or attempts run out
///
/// One attempt reports its own failure kind; more report `Exhausted`.
pub async fn connect_with_retry<T, F, Fut>(
    destination: &Destination,
    candidates: &[SocketAddr],
    mut connect: F,
) -> Result<T, ContractError>
where
    F: FnMut(SocketAddr) -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    let endpoint = destination.endpoint();
    if candidates.is_empty() {
        return Err(ContractError::transport(
            endpoint,
            TransportFailure::HostNotFound,
            "no addresses resolved",
        ));
    }

    let attempts = destination.attempts();
    let mut last = (TransportFailure::HostNotFound, String::new());

    for attempt in 0..attempts {
        let addr = candidates[attempt as usize % candidates.len()];

        match timeout(destination.timeout, connect(addr)).await {
            Ok(Ok(conn)) => {
                debug!(
                    destination = %destination.alias,
                    addr = %addr,
                    attempt = attempt + 1,
                    "Connected"
                );
                return Ok(conn);
            }
            Ok(Err(e)) => last = (classify_io_error(&e), e.to_string()),
            Err(_) => {
                last = (
                    TransportFailure::Timeout,
                    format!("connect exceeded {:?}", destination.timeout),
                )
            }
        }

        warn!(
            destination = %destination.alias,
            addr = %addr,
            attempt = attempt + 1,
            max_attempts = attempts,
            error = %last.1,
            "Connection attempt failed"
        );
    }

    let (failure, message) = last;
    if attempts == 1 {
        Err(ContractError::transport(endpoint, failure, message))
    } else {
        Err(ContractError::transport(
            endpoint,
            TransportFailure::Exhausted,
            format!("gave up after {attempts} attempts, last error: {failure}: {message}"),
        ))
    }
}

/// Map an IO error onto the transport failure taxonomy
pub fn classify_io_error(err: &io::Error) -> TransportFailure {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportFailure::Timeout,
        io::ErrorKind::NotFound | io::ErrorKind::AddrNotAvailable => {
            TransportFailure::HostNotFound
        }
        _ => TransportFailure::ConnectionRefused,
    }
}

/// Wrap an IO error raised after a connection was established
pub(crate) fn send_error(destination: &Destination, err: io::Error) -> ContractError {
    ContractError::transport(destination.endpoint(), classify_io_error(&err), err.to_string())
}

/// Error for a send that exceeded the destination timeout
pub(crate) fn send_timeout(destination: &Destination) -> ContractError {
    ContractError::transport(
        destination.endpoint(),
        TransportFailure::Timeout,
        format!("send exceeded {:?}", destination.timeout),
    )
}
