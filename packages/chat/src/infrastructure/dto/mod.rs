//! Data Transfer Objects (DTOs) for the chat client.
//!
//! The wire shapes themselves live in `tabiji_shared::protocol`; this module
//! holds the single normalization step from those shapes into domain values.

pub mod conversion;

pub use conversion::{decode_server_frame, encode_client_frame};
