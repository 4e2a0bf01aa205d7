//! Client side: one request, one response, one connection

use crate::codec::{read_frame, write_frame, ProtoError};
use crate::message::WorkerRequest;
use jmxgate_common::ResponseMap;
use tokio::io::BufReader;
use tokio::net::TcpStream;

/// Connect to `host_port`, send `request` and decode the answer.
/// Timeouts are the caller's concern.
pub async fn send_request(
    host_port: &str,
    request: &WorkerRequest,
) -> Result<ResponseMap, ProtoError> {
    let stream = TcpStream::connect(host_port).await?;
    let (read_half, mut write_half) = stream.into_split();

    write_frame(&mut write_half, request).await?;

    let mut reader = BufReader::new(read_half);
    read_frame(&mut reader).await?.ok_or(ProtoError::Closed)
}
