// Copyright (c) 2026 Helio Contributors. MIT License.
// See LICENSE for details.

//! # HELIO Toolkit — Core Library
//!
//! The transaction pipeline behind the HELIO tool gateway: everything
//! needed to turn a declarative list of transfer instructions into a
//! canonically-encoded, signed, network-transmittable Solana transaction,
//! and to answer the read-only queries that surround that workflow.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the stages of the pipeline:
//!
//! - **cluster** — Resolves the three public network names. Closed set,
//!   no custom endpoints.
//! - **keys** — Addresses, Ed25519 keypairs, signatures. Secrets never
//!   outlive a call.
//! - **instruction** — The caller-facing instruction vocabulary and its
//!   compilation into program-level instructions.
//! - **assembler** — Builds the deduplicated, privilege-ordered account
//!   table and the unsigned envelope.
//! - **signing** — Applies signatures positionally, idempotently, and only
//!   for required signers.
//! - **wire** — The network-canonical byte codec. Strict on decode.
//! - **rpc** — The one module that does network I/O. JSON-RPC 2.0,
//!   bounded timeout, no retries.
//! - **tools** — The dispatcher: typed calls in, textual payloads out,
//!   failures contained.
//! - **config** — Every constant the pipeline relies on, named.
//! - **error** — One error enum for the whole pipeline.
//!
//! ## Design Philosophy
//!
//! 1. Fail before I/O: anything checkable locally is checked locally.
//! 2. Strict codecs: bytes that decode re-encode to the same bytes.
//! 3. If it touches key material, it neither logs nor echoes it.
//! 4. Absence is not failure: a missing account is `None`, not an error.

pub mod assembler;
pub mod cluster;
pub mod config;
pub mod error;
pub mod instruction;
pub mod keys;
pub mod rpc;
pub mod signing;
pub mod tools;
pub mod wire;
