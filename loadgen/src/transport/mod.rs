//! Request transport used by virtual users
//!
//! This module provides:
//! - `Transport` trait abstracting how a scenario request is sent
//! - `HttpTransport` issuing requests against the target base URL

mod http;
mod service;

pub use http::HttpTransport;
pub use service::{RequestError, Transport};
