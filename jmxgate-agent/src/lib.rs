//! Worker-side agent for jmxgate
//!
//! Responsibilities:
//! - Keep a registry of this process's management objects
//! - Answer the coordinator's management protocol requests (:12321)

pub mod server;
