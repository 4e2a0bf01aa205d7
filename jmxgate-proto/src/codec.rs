//! Newline-delimited JSON framing
//!
//! Each frame is one JSON document followed by `\n`. Frames are bounded by
//! [`MAX_FRAME_BYTES`]; anything larger is rejected before it is decoded.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single encoded frame, newline included
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame exceeds {max} bytes")]
    FrameTooLarge { max: usize },

    #[error("connection closed mid-frame")]
    Truncated,

    #[error("connection closed before a response was received")]
    Closed,

    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Encode `message` and write it as one frame
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), ProtoError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut buf = serde_json::to_vec(message)?;
    buf.push(b'\n');

    if buf.len() > MAX_FRAME_BYTES {
        return Err(ProtoError::FrameTooLarge {
            max: MAX_FRAME_BYTES,
        });
    }

    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Read and decode one frame. Returns `Ok(None)` on a clean end of stream.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, ProtoError>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    let mut buf = Vec::new();
    let limit = (MAX_FRAME_BYTES + 1) as u64;
    let n = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;

    if n == 0 {
        return Ok(None);
    }

    if buf.last() != Some(&b'\n') {
        if buf.len() > MAX_FRAME_BYTES {
            return Err(ProtoError::FrameTooLarge {
                max: MAX_FRAME_BYTES,
            });
        }
        return Err(ProtoError::Truncated);
    }

    buf.pop();
    Ok(Some(serde_json::from_slice(&buf)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmxgate_common::ResponseMap;
    use serde_json::{json, Value};
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_frames_in_sequence() {
        let mut wire = Vec::new();
        write_frame(&mut wire, &json!({"a": 1})).await.expect("Should write");
        write_frame(&mut wire, &json!({"b": 2})).await.expect("Should write");

        let mut reader = BufReader::new(wire.as_slice());
        let first: Option<Value> = read_frame(&mut reader).await.expect("Should read");
        let second: Option<Value> = read_frame(&mut reader).await.expect("Should read");
        let end: Option<Value> = read_frame(&mut reader).await.expect("Should read");

        assert_eq!(first, Some(json!({"a": 1})));
        assert_eq!(second, Some(json!({"b": 2})));
        assert_eq!(end, None);
    }

    #[tokio::test]
    async fn test_truncated_frame() {
        let mut reader = BufReader::new(&b"{\"a\": 1"[..]);
        let result: Result<Option<Value>, _> = read_frame(&mut reader).await;
        assert!(matches!(result, Err(ProtoError::Truncated)));
    }

    #[tokio::test]
    async fn test_non_object_response_is_malformed() {
        let mut reader = BufReader::new(&b"[1,2,3]\n"[..]);
        let result: Result<Option<ResponseMap>, _> = read_frame(&mut reader).await;
        assert!(matches!(result, Err(ProtoError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_oversize_frame() {
        let payload = vec![b'x'; MAX_FRAME_BYTES + 10];
        let mut reader = BufReader::new(payload.as_slice());
        let result: Result<Option<Value>, _> = read_frame(&mut reader).await;
        assert!(matches!(result, Err(ProtoError::FrameTooLarge { .. })));
    }
}
