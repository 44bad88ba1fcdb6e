//! REST API client implementations.

pub mod http;

pub use http::HttpChatApi;
