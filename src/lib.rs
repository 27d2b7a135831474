#![cfg_attr(not(feature = "std"), no_std)]
//! Two-player Minesweeper: board engine, game session, snapshot protocol and
//! peer synchronization. The transport, actor and terminal front-end need the
//! `std` feature.

extern crate alloc;

mod board;
mod cell;
mod clock;
mod common;
mod config;
mod game;
mod persistence;
mod player;
pub mod protocol;
pub mod snapshot;
pub mod sync;
#[cfg(feature = "std")]
pub mod cli;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod node;
#[cfg(feature = "std")]
pub mod transport;

pub use board::*;
pub use cell::Cell;
pub use clock::*;
pub use common::*;
pub use config::*;
pub use game::*;
pub use persistence::*;
pub use player::*;
pub use protocol::{Message, MessageType, ProtocolError};
pub use sync::{Link, Role, SyncCoordinator};
#[cfg(feature = "std")]
pub use logging::init_logging;
#[cfg(feature = "std")]
pub use node::{Command, GameNode, NodeView};
#[cfg(feature = "std")]
pub use transport::session::{ConnectionState, TransportEvent, TransportSession};
