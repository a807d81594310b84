pub mod command;

pub use command::{ClientCommand, ClientCommandType};

/// Where outgoing commands go. The real client hands them to the socket
/// writer; tests and the demo collect them instead.
pub trait CommandSink {
    fn send_command(&mut self, command: ClientCommand);
}

/// A sink that keeps every command it was handed, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub sent: Vec<ClientCommand>,
}

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink::default()
    }

    pub fn drain(&mut self) -> Vec<ClientCommand> {
        std::mem::take(&mut self.sent)
    }
}

impl CommandSink for RecordingSink {
    fn send_command(&mut self, command: ClientCommand) {
        self.sent.push(command);
    }
}
