//! HTTP request handlers
//!
//! Thin controllers: validate at the boundary, delegate to the service
//! layer, wrap the result in the standard envelope.

pub mod storage;
