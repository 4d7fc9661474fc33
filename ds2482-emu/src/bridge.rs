use crate::{
    BridgeError, BridgeResult, CommandBuffer, Dispatch, Dispatcher, I2cTarget, RegisterFile,
    RegisterPointer, command::DEVICE_RST_CMD,
};

/// Value clocked out when a read targets a register the emulation lacks.
pub(crate) const IDLE_BUS_BYTE: u8 = 0xff;

/// Builder for creating a [`Bridge`] instance with custom configuration.
#[derive(Debug, Clone, Copy)]
pub struct BridgeBuilder {
    pub(crate) addr: u8,
    pub(crate) retries: Option<u8>,
    pub(crate) idle_delay_ms: u32,
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeBuilder {
    /// Default configuration: address `0x18`, 100 tick parameter timeout,
    /// 100 ms idle delay.
    pub const fn new() -> Self {
        BridgeBuilder {
            addr: crate::DEFAULT_ADDRESS,
            retries: Some(100),
            idle_delay_ms: 100,
        }
    }

    /// Sets the 7-bit I2C address the bridge answers to.
    pub const fn with_address(mut self, addr: u8) -> Self {
        self.addr = addr;
        self
    }

    /// Sets the retry count.
    ///
    /// The retry count is the number of scheduling ticks a command may
    /// spend waiting for its parameter bytes before it is discarded.
    pub const fn with_retries(mut self, retries: u8) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Wait for parameter bytes forever.
    pub const fn without_timeout(mut self) -> Self {
        self.retries = None;
        self
    }

    /// Sets how long the scheduler sleeps when there is nothing to do.
    pub const fn with_idle_delay_ms(mut self, ms: u32) -> Self {
        self.idle_delay_ms = ms;
        self
    }

    /// Builds a new [`Bridge`] in the power-on state.
    pub const fn build<const N: usize>(self) -> Bridge<N> {
        Bridge {
            buffer: CommandBuffer::new(),
            dispatcher: Dispatcher::new(self.retries),
            addr: self.addr,
            idle_delay_ms: self.idle_delay_ms,
            reset_seen: false,
        }
    }
}

/// An emulated DS2482 I2C to 1-Wire bridge.
///
/// Owns the command buffer and the dispatcher. The transport delivers
/// inbound bytes and requests outbound bytes; [`poll`](Bridge::poll)
/// runs the dispatcher from the main loop.
#[derive(Debug, Clone)]
pub struct Bridge<const N: usize = { crate::MAX_DATA }> {
    buffer: CommandBuffer<N>,
    dispatcher: Dispatcher,
    addr: u8,
    pub(crate) idle_delay_ms: u32,
    // Rest of the transaction is ignored after a Device Reset opcode
    reset_seen: bool,
}

impl<const N: usize> Default for Bridge<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Bridge<N> {
    /// Creates a bridge with the default configuration.
    pub const fn new() -> Self {
        BridgeBuilder::new().build()
    }

    /// The registers.
    pub fn registers(&self) -> &RegisterFile {
        self.dispatcher.registers()
    }

    /// The command buffer.
    pub fn buffer(&self) -> &CommandBuffer<N> {
        &self.buffer
    }

    /// The dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Start a new inbound transaction, superseding anything buffered.
    pub fn begin_transaction(&mut self) {
        self.dispatcher.abandon();
        self.buffer.reset();
        self.reset_seen = false;
    }

    /// Store one inbound byte of the current transaction.
    ///
    /// A Device Reset opcode in the first position is applied right away
    /// and the remaining bytes of the transaction are ignored.
    /// Returns `false` if the byte was dropped because the buffer is full.
    pub fn on_byte_received(&mut self, byte: u8) -> bool {
        if self.reset_seen {
            return true;
        }
        if !self.buffer.append(byte) {
            return false;
        }
        if self.buffer.len() == 1 && byte == DEVICE_RST_CMD {
            self.buffer.reset();
            self.dispatcher.device_reset();
            self.reset_seen = true;
        }
        true
    }

    /// Store a complete inbound burst.
    ///
    /// An empty burst is an address-only write and leaves everything as is.
    pub fn on_bytes_received(&mut self, bytes: &[u8]) -> BridgeResult<usize> {
        if bytes.is_empty() {
            return Ok(0);
        }
        self.begin_transaction();
        let mut kept = 0;
        for &byte in bytes {
            if !self.on_byte_received(byte) {
                break;
            }
            kept += 1;
        }
        if kept < bytes.len() {
            let dropped = bytes.len() - kept;
            log::warn!("buffer full, dropped {} of {} bytes", dropped, bytes.len());
            return Err(BridgeError::BufferOverflow { kept, dropped });
        }
        Ok(kept)
    }

    /// Content of the register the read pointer designates.
    ///
    /// Only the status register is emulated; reading it clears its
    /// event bits.
    pub fn produce_next_byte(&mut self) -> BridgeResult<u8> {
        let registers = self.dispatcher.registers_mut();
        match registers.read_pointer() {
            RegisterPointer::Status => {
                let status = registers.read_status();
                log::debug!("status={:#04x}", status.into_bits());
                Ok(status.into_bits())
            }
            other => Err(BridgeError::UnsupportedRegister(other.into())),
        }
    }

    /// Byte clocked out to the master on a read request.
    pub fn on_byte_requested(&mut self) -> u8 {
        self.produce_next_byte().unwrap_or_else(|e| {
            log::warn!("read failed: {:?}", e);
            IDLE_BUS_BYTE
        })
    }

    /// Run the dispatcher once.
    pub fn poll(&mut self) -> BridgeResult<Dispatch> {
        self.dispatcher.tick(&mut self.buffer)
    }

    /// 7-bit I2C address of the bridge.
    pub fn address(&self) -> u8 {
        self.addr
    }
}

impl<const N: usize> I2cTarget for Bridge<N> {
    fn address(&self) -> u8 {
        self.addr
    }

    fn on_receive(&mut self, bytes: &[u8]) {
        let _ = self.on_bytes_received(bytes);
    }

    fn on_request(&mut self) -> u8 {
        self.on_byte_requested()
    }

    fn poll(&mut self) -> BridgeResult<Dispatch> {
        self.dispatcher.tick(&mut self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Command, DeviceStatus, DispatchState};

    #[test]
    fn reset_fast_path() {
        let mut bridge = Bridge::<16>::new();
        assert_eq!(bridge.on_bytes_received(&[0xf0]), Ok(1));
        assert!(bridge.buffer().is_empty());
        assert_eq!(bridge.registers().status(), DeviceStatus::AFTER_RESET);
        assert_eq!(bridge.poll(), Ok(Dispatch::Idle));
    }

    #[test]
    fn bytes_after_reset_are_ignored() {
        let mut bridge = Bridge::<16>::new();
        bridge.on_bytes_received(&[0xf0, 0xe1, 0xe1]).unwrap();
        assert!(bridge.buffer().is_empty());
        assert_eq!(bridge.poll(), Ok(Dispatch::Idle));
        assert_eq!(bridge.registers().read_pointer(), RegisterPointer::Status);
    }

    #[test]
    fn reset_preempts_parameter_wait() {
        let mut bridge = Bridge::<16>::new();
        bridge.begin_transaction();
        bridge.on_byte_received(0xc3);
        assert_eq!(bridge.poll(), Ok(Dispatch::Waiting(Command::ChannelSelect)));
        bridge.on_bytes_received(&[0xf0]).unwrap();
        assert_eq!(bridge.dispatcher().state(), DispatchState::Idle);
        assert_eq!(bridge.on_byte_requested(), 0x18);
        assert_eq!(bridge.registers().channel(), 0);
    }

    #[test]
    fn byte_streaming_completes_pending_command() {
        let mut bridge = Bridge::<16>::new();
        bridge.begin_transaction();
        assert!(bridge.on_byte_received(0xc3));
        assert_eq!(bridge.poll(), Ok(Dispatch::Waiting(Command::ChannelSelect)));
        assert!(bridge.on_byte_received(0x07));
        assert_eq!(bridge.poll(), Ok(Dispatch::Executed(Command::ChannelSelect)));
        assert_eq!(bridge.registers().channel(), 7);
    }

    #[test]
    fn new_transaction_abandons_pending_command() {
        let mut bridge = Bridge::<16>::new();
        bridge.begin_transaction();
        bridge.on_byte_received(0xe1);
        bridge.poll().unwrap();
        bridge.on_bytes_received(&[0xc3, 0x01]).unwrap();
        assert_eq!(bridge.poll(), Ok(Dispatch::Executed(Command::ChannelSelect)));
        assert_eq!(bridge.registers().read_pointer(), RegisterPointer::Status);
        assert_eq!(bridge.registers().channel(), 1);
    }

    #[test]
    fn unsupported_register_reads_idle_bus() {
        let mut bridge = Bridge::<16>::new();
        bridge.on_bytes_received(&[0xe1, 0xe1]).unwrap();
        bridge.poll().unwrap();
        assert_eq!(
            bridge.produce_next_byte(),
            Err(BridgeError::UnsupportedRegister(0xe1))
        );
        assert_eq!(bridge.on_byte_requested(), IDLE_BUS_BYTE);
    }

    #[test]
    fn empty_burst_is_a_no_op() {
        let mut bridge = Bridge::<16>::new();
        bridge.begin_transaction();
        bridge.on_byte_received(0xc3);
        bridge.poll().unwrap();
        assert_eq!(bridge.on_bytes_received(&[]), Ok(0));
        bridge.on_byte_received(0x02);
        assert_eq!(bridge.poll(), Ok(Dispatch::Executed(Command::ChannelSelect)));
        assert_eq!(bridge.registers().channel(), 2);
    }

    #[test]
    fn builder_configuration() {
        let bridge: Bridge<8> = BridgeBuilder::default()
            .with_address(0x1b)
            .with_idle_delay_ms(5)
            .without_timeout()
            .build();
        assert_eq!(bridge.address(), 0x1b);
        assert_eq!(bridge.idle_delay_ms, 5);
        assert_eq!(bridge.buffer().capacity(), 7);
    }

    #[test]
    fn target_receive_keeps_prefix_on_overflow() {
        let mut bridge = Bridge::<4>::new();
        I2cTarget::on_receive(&mut bridge, &[0xc3, 0x07, 0xaa, 0xbb, 0xcc]);
        assert_eq!(bridge.buffer().as_slice(), &[0xc3, 0x07, 0xaa]);
        assert_eq!(
            I2cTarget::poll(&mut bridge),
            Ok(Dispatch::Executed(Command::ChannelSelect))
        );
        assert_eq!(bridge.registers().channel(), 7);
    }
}
