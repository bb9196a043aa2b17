//! Types shared between the relay server, the state store and the
//! controller-side tooling: the machine snapshot, the command grammar
//! and the wire-level request/response shapes.

pub mod command;
pub mod domain;
pub mod error;
pub mod protocol;
