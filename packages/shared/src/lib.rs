//! Code shared by the Tabiji chat client core, the development backend and the
//! terminal front-end.

pub mod logger;
pub mod protocol;
pub mod time;
