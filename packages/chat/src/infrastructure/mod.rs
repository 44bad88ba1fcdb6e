//! Infrastructure layer: adapters implementing the domain ports.

pub mod api;
pub mod broadcast;
pub mod credential;
pub mod dto;
pub mod transport;
