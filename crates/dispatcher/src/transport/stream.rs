//! Stream (TCP) delivery

use contracts::{ContractError, Destination};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument};

use super::{connect_with_retry, resolve, send_error, send_timeout};

/// Write `payload` to the destination as one logical send
///
/// `write_all` retries partial writes until the whole payload is out.
#[instrument(
    name = "transport_send_stream",
    skip(destination, payload),
    fields(destination = %destination.alias, bytes = payload.len())
)]
pub async fn send_stream(destination: &Destination, payload: &[u8]) -> Result<usize, ContractError> {
    let candidates = resolve(destination).await?;
    let mut stream = connect_with_retry(destination, &candidates, |addr| TcpStream::connect(addr)).await?;

    let write = async {
        stream.write_all(payload).await?;
        stream.flush().await?;
        stream.shutdown().await
    };

    match timeout(destination.timeout, write).await {
        Ok(Ok(())) => {
            debug!(bytes = payload.len(), "Stream payload written");
            Ok(payload.len())
        }
        Ok(Err(e)) => Err(send_error(destination, e)),
        Err(_) => Err(send_timeout(destination)),
    }
}
