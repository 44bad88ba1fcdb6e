//! Infrastructure 層（サーバー側）

pub mod dto;
pub mod message_pusher;
pub mod repository;
