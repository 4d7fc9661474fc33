use crate::{BridgeError, BridgeResult, Command, CommandBuffer, RegisterFile, RegisterPointer};

/// Where the dispatcher is in handling the buffered transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Nothing pending.
    Idle,
    /// The opcode was seen but parameter byte(s) are still missing.
    AwaitingParameter {
        /// Command waiting for its parameters.
        command: Command,
        /// Buffer offset of the last parameter the command needs.
        needed: usize,
        /// Ticks spent waiting so far.
        waited: u16,
    },
    /// Opcode and parameters are buffered, the command is executing.
    /// Only held within a single tick.
    Ready(Command),
}

/// Result of one dispatcher tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The buffer was empty.
    Idle,
    /// A command is waiting for parameter bytes.
    Waiting(Command),
    /// A command was applied to the registers.
    Executed(Command),
}

/// Decodes buffered transactions and applies them to the [`RegisterFile`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registers: RegisterFile,
    state: DispatchState,
    retries: Option<u8>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Some(100))
    }
}

impl Dispatcher {
    /// Creates a dispatcher in the power-on state.
    ///
    /// `retries` bounds how many ticks a command may wait for its
    /// parameters; `None` waits forever.
    pub const fn new(retries: Option<u8>) -> Self {
        Self {
            registers: RegisterFile::new(),
            state: DispatchState::Idle,
            retries,
        }
    }

    /// Current state of the machine.
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// The registers.
    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub(crate) fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.registers
    }

    /// Apply a Device Reset, preempting any pending command.
    pub fn device_reset(&mut self) {
        if let DispatchState::AwaitingParameter { command, .. } = self.state {
            log::debug!("{} preempted by reset", command.name());
        }
        self.state = DispatchState::Idle;
        self.registers.device_reset();
        log::info!("RESET");
    }

    /// Drop a command whose parameters never arrived because a new
    /// transaction started.
    pub fn abandon(&mut self) {
        if let DispatchState::AwaitingParameter { command, .. } = self.state {
            log::warn!("{} abandoned by new transaction", command.name());
        }
        self.state = DispatchState::Idle;
    }

    /// Advance the machine by one scheduling tick.
    ///
    /// Only the first buffered byte selects the command and trailing bytes
    /// beyond its parameters are ignored. Whenever this returns anything but
    /// [`Dispatch::Waiting`], the buffer is empty and the state is
    /// [`DispatchState::Idle`].
    pub fn tick<const N: usize>(
        &mut self,
        buffer: &mut CommandBuffer<N>,
    ) -> BridgeResult<Dispatch> {
        let (command, needed, waited) = match self.state {
            DispatchState::AwaitingParameter {
                command,
                needed,
                waited,
            } => (command, needed, waited.saturating_add(1)),
            _ => match buffer.first_command_byte() {
                Some(opcode) => {
                    log::debug!("Rx [{}]: {:02X?}", buffer.len(), buffer.as_slice());
                    let command = Command::from(opcode);
                    if !command.is_emulated() {
                        log::warn!("unknown command {:#04x} ({})", opcode, command.name());
                        self.finish(buffer);
                        return Err(BridgeError::UnknownCommand(opcode));
                    }
                    (command, command.parameter_count(), 0)
                }
                None => return Ok(Dispatch::Idle),
            },
        };

        if !buffer.has_parameter_at(needed) {
            return self.wait(command, needed, waited, buffer);
        }

        self.state = DispatchState::Ready(command);
        let res = self.execute(command, buffer);
        self.finish(buffer);
        res.map(|_| Dispatch::Executed(command))
    }

    fn wait<const N: usize>(
        &mut self,
        command: Command,
        needed: usize,
        waited: u16,
        buffer: &mut CommandBuffer<N>,
    ) -> BridgeResult<Dispatch> {
        if self.retries.is_some_and(|retries| waited > u16::from(retries)) {
            log::warn!("{} timed out waiting for parameters", command.name());
            self.finish(buffer);
            return Err(BridgeError::ParameterTimeout(command));
        }
        self.state = DispatchState::AwaitingParameter {
            command,
            needed,
            waited,
        };
        Ok(Dispatch::Waiting(command))
    }

    fn execute<const N: usize>(
        &mut self,
        command: Command,
        buffer: &mut CommandBuffer<N>,
    ) -> BridgeResult<()> {
        match command {
            Command::DeviceReset => self.device_reset(),
            Command::SetReadPointer => {
                let selector = buffer
                    .take_parameter()
                    .ok_or(BridgeError::ParameterTimeout(command))?;
                let pointer = RegisterPointer::from(selector);
                log::info!("read pointer={:?}", pointer);
                self.registers.set_read_pointer(pointer);
            }
            Command::ChannelSelect => {
                let channel = buffer
                    .take_parameter()
                    .ok_or(BridgeError::ParameterTimeout(command))?;
                log::info!("CH={}", channel);
                self.registers.set_channel(channel);
            }
            other => return Err(BridgeError::UnknownCommand(other.opcode())),
        }
        Ok(())
    }

    fn finish<const N: usize>(&mut self, buffer: &mut CommandBuffer<N>) {
        buffer.reset();
        self.state = DispatchState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceStatus;

    fn buffer(bytes: &[u8]) -> CommandBuffer<16> {
        let mut buf = CommandBuffer::new();
        for &b in bytes {
            buf.append(b);
        }
        buf
    }

    #[test]
    fn empty_buffer_is_idle() {
        let mut disp = Dispatcher::default();
        assert_eq!(disp.tick(&mut buffer(&[])), Ok(Dispatch::Idle));
        assert_eq!(disp.state(), DispatchState::Idle);
    }

    #[test]
    fn channel_select_waits_for_parameter() {
        let mut disp = Dispatcher::default();
        let mut buf = buffer(&[0xc3]);
        assert_eq!(disp.tick(&mut buf), Ok(Dispatch::Waiting(Command::ChannelSelect)));
        assert_eq!(
            disp.state(),
            DispatchState::AwaitingParameter {
                command: Command::ChannelSelect,
                needed: 1,
                waited: 0
            }
        );
        assert_eq!(disp.tick(&mut buf), Ok(Dispatch::Waiting(Command::ChannelSelect)));
        buf.append(0x05);
        assert_eq!(disp.tick(&mut buf), Ok(Dispatch::Executed(Command::ChannelSelect)));
        assert_eq!(disp.registers().channel(), 5);
        assert_eq!(disp.state(), DispatchState::Idle);
        assert!(buf.is_empty());
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut disp = Dispatcher::default();
        let mut buf = buffer(&[0xe1, 0xc3, 0xff, 0xff]);
        assert_eq!(disp.tick(&mut buf), Ok(Dispatch::Executed(Command::SetReadPointer)));
        assert_eq!(
            disp.registers().read_pointer(),
            RegisterPointer::DeviceConfiguration
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn unsupported_opcodes_are_unknown() {
        for opcode in [0xd2, 0xb4, 0x87, 0xa5, 0x96, 0x78, 0x99] {
            let mut disp = Dispatcher::default();
            let before = *disp.registers();
            let mut buf = buffer(&[opcode, 0x01]);
            assert_eq!(disp.tick(&mut buf), Err(BridgeError::UnknownCommand(opcode)));
            assert_eq!(*disp.registers(), before);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn parameter_wait_times_out() {
        let mut disp = Dispatcher::new(Some(2));
        let mut buf = buffer(&[0xe1]);
        for _ in 0..3 {
            assert_eq!(disp.tick(&mut buf), Ok(Dispatch::Waiting(Command::SetReadPointer)));
        }
        assert_eq!(
            disp.tick(&mut buf),
            Err(BridgeError::ParameterTimeout(Command::SetReadPointer))
        );
        assert_eq!(disp.state(), DispatchState::Idle);
        assert!(buf.is_empty());
        assert_eq!(disp.registers().read_pointer(), RegisterPointer::Status);
    }

    #[test]
    fn largest_retry_count_still_times_out() {
        let mut disp = Dispatcher::new(Some(u8::MAX));
        let mut buf = buffer(&[0xc3]);
        for _ in 0..=u8::MAX {
            assert_eq!(disp.tick(&mut buf), Ok(Dispatch::Waiting(Command::ChannelSelect)));
        }
        assert_eq!(
            disp.tick(&mut buf),
            Err(BridgeError::ParameterTimeout(Command::ChannelSelect))
        );
        assert_eq!(disp.state(), DispatchState::Idle);
        assert!(buf.is_empty());
    }

    #[test]
    fn resumed_wait_keeps_parameter_offset() {
        let mut disp = Dispatcher::default();
        let mut buf = buffer(&[0xe1]);
        disp.tick(&mut buf).unwrap();
        disp.tick(&mut buf).unwrap();
        assert_eq!(
            disp.state(),
            DispatchState::AwaitingParameter {
                command: Command::SetReadPointer,
                needed: 1,
                waited: 1
            }
        );
    }

    #[test]
    fn unbounded_wait_never_times_out() {
        let mut disp = Dispatcher::new(None);
        let mut buf = buffer(&[0xc3]);
        for _ in 0..1000 {
            assert_eq!(disp.tick(&mut buf), Ok(Dispatch::Waiting(Command::ChannelSelect)));
        }
    }

    #[test]
    fn reset_preempts_pending_command() {
        let mut disp = Dispatcher::default();
        let mut buf = buffer(&[0xc3]);
        disp.tick(&mut buf).unwrap();
        disp.device_reset();
        assert_eq!(disp.state(), DispatchState::Idle);
        assert_eq!(disp.registers().status(), DeviceStatus::AFTER_RESET);
    }
}
