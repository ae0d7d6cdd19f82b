#![allow(missing_docs)]
//! Wire types for the handshake layer of TLS1.2 and earlier.
//!
//! Every type here decodes through [`codec::Codec::read`] and fails with an
//! [`crate::error::InvalidMessage`] rather than panicking on hostile input.

#[macro_use]
mod macros;

pub mod alert;
pub mod base;
pub mod codec;
pub mod deframer;
pub mod enums;
pub mod fragmenter;
pub mod handshake;
pub mod hsjoiner;
pub mod message;
pub mod persist;
