use rv_core::types::{CharacterId, Direction};

use crate::movement::MovementMode;

/// Command headers the client sends to the server. Only the movement
/// related subset exists here; the numeric values are part of the wire
/// protocol and must not change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ClientCommandType {
    Empty = 0,
    CmdMove = 10,
    CmdTurn = 11,
}

/// A single client-to-server command: a one-byte header followed by a
/// command specific little-endian payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientCommand {
    header: ClientCommandType,
    payload: Vec<u8>,
}

impl ClientCommand {
    pub fn new_move(id: CharacterId, mode: MovementMode, direction: Direction) -> Self {
        let mut payload = Vec::with_capacity(6);
        payload.extend_from_slice(&id.value().to_le_bytes());
        payload.push(mode.id());
        payload.push(direction.id());
        ClientCommand {
            header: ClientCommandType::CmdMove,
            payload,
        }
    }

    pub fn new_turn(direction: Direction) -> Self {
        ClientCommand {
            header: ClientCommandType::CmdTurn,
            payload: vec![direction.id()],
        }
    }

    pub fn command_type(&self) -> ClientCommandType {
        self.header
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.payload.len());
        bytes.push(self.header as u8);
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}
