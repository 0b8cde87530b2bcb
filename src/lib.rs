//! kanabridge — the session layer of an IME backend.
//!
//! Tracks one user's in-progress composition (phonetic buffer, cursor,
//! left-side context), assembles per-request conversion options including an
//! optional neural personalization mode, reconstructs engine candidates
//! against the typed prefix, and exposes the whole surface to a non-native
//! host over a C FFI with explicit ownership transfer.

// FFI functions perform null checks before dereferencing raw pointers.
// Clippy cannot verify this statically, so we allow it at crate level.
#![allow(clippy::not_unsafe_ptr_arg_deref)]

pub mod capability;
pub mod config;
pub mod engine;
pub mod reconstruct;
pub mod request;
pub mod service;
pub mod session;

pub mod ffi;
mod trace_init;

pub use engine::{CandidateSegment, ConversionEngine, EngineCandidate};
pub use service::{Candidate, Service};
