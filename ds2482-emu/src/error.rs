use crate::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Emulation errors. None of them are fatal: the bridge keeps serving
/// the transport after reporting any of these.
pub enum BridgeError {
    /// An inbound burst exceeded the command buffer; the excess was dropped.
    BufferOverflow {
        /// Bytes retained.
        kept: usize,
        /// Bytes discarded.
        dropped: usize,
    },
    /// The opcode is not a command the emulation executes.
    UnknownCommand(u8),
    /// The read pointer designates a register the emulation does not provide.
    UnsupportedRegister(u8),
    /// A command's parameter byte did not arrive in time.
    ParameterTimeout(Command),
}
