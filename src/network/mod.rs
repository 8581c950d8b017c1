//! Network Layer
//!
//! Wire protocol, outbound command queues and the WebSocket adapter.
//! Transport is an external concern: the simulation only ever sees
//! messages marshaled onto its own step.

pub mod bus;
pub mod protocol;
pub mod server;

pub use bus::{Loopback, SyncQueue};
pub use protocol::{CastCommand, ClientMessage, JoinRequest, ServerMessage};
pub use server::{GameServer, ServerConfig, ServerError};
