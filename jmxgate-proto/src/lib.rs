//! Worker management protocol for jmxgate
//!
//! Defines:
//! - `WorkerRequest` - command plus optional object and attribute names
//! - newline-delimited JSON framing shared by both ends
//! - `send_request` for the coordinator and `serve` for workers
//!
//! Responses are plain JSON objects decoded into `ResponseMap`.

pub mod client;
pub mod codec;
pub mod message;
pub mod server;

pub use client::send_request;
pub use codec::{read_frame, write_frame, ProtoError, MAX_FRAME_BYTES};
pub use message::WorkerRequest;
pub use server::{serve, serve_connection, RequestHandler};
