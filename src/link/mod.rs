//! Cloud link: the WebSocket channel plus the messages sent over it.

mod channel;
pub mod register;
pub mod report;

pub use channel::{CloudChannel, LinkEvent, LinkState};
