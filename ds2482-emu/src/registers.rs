use bitfield_struct::bitfield;

/// Status register value with only the logic level bit asserted.
pub(crate) const STATUS_LL: u8 = 0x08;
/// Status register value of the device reset bit.
pub(crate) const STATUS_RST: u8 = 0x10;

/// Status register of the emulated bridge.
///
/// The read-only Status register is the general means for
/// the bridge to report bit-type data from the 1-Wire side,
/// 1-Wire busy status, and its own reset status to the host
/// processor. The emulation only ever drives the logic level
/// and device reset bits; the remaining bits are kept so that
/// the register has the same layout the host expects.
///
/// Reading the register through [`RegisterFile::read_status`]
/// clears every event bit back to [`DeviceStatus::IDLE`].
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct DeviceStatus {
    /// 1WB: the 1-Wire line is busy.
    pub onewire_busy: bool,
    /// PPD: a presence pulse was detected during the last 1-Wire reset.
    pub presence_pulse_detect: bool,
    /// SD: a short was detected during the last 1-Wire reset.
    pub short_detect: bool,
    /// LL: logic state of the active 1-Wire line.
    pub logic_level: bool,
    /// RST: the bridge has performed an internal reset cycle,
    /// either at power-on or after a Device Reset command.
    pub device_reset: bool,
    /// SBR: single bit result.
    pub single_bit_result: bool,
    /// TSB: triplet second bit.
    pub triplet_second_bit: bool,
    /// DIR: branch direction taken by the last triplet.
    pub branch_dir_taken: bool,
}

impl DeviceStatus {
    /// Idle baseline: line level high, no events pending.
    pub const IDLE: Self = Self::from_bits(STATUS_LL);

    /// Value reported right after a device reset.
    pub const AFTER_RESET: Self = Self::from_bits(STATUS_LL | STATUS_RST);
}

/// Register selectors accepted by the Set Read Pointer command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterPointer {
    /// Status register (`0xF0`).
    Status,
    /// Read data register (`0xE1`).
    ReadData,
    /// Device configuration register (`0xC3`).
    DeviceConfiguration,
    /// Channel selection register (`0xD2`), DS2482-800 only.
    ChannelSelection,
    /// Port configuration register (`0xB4`), DS2483 only.
    PortConfiguration,
    /// Any selector the bridge does not define.
    Unknown(u8),
}

impl From<u8> for RegisterPointer {
    fn from(value: u8) -> Self {
        match value {
            0xf0 => Self::Status,
            0xe1 => Self::ReadData,
            0xc3 => Self::DeviceConfiguration,
            0xd2 => Self::ChannelSelection,
            0xb4 => Self::PortConfiguration,
            other => Self::Unknown(other),
        }
    }
}

impl From<RegisterPointer> for u8 {
    fn from(value: RegisterPointer) -> Self {
        match value {
            RegisterPointer::Status => 0xf0,
            RegisterPointer::ReadData => 0xe1,
            RegisterPointer::DeviceConfiguration => 0xc3,
            RegisterPointer::ChannelSelection => 0xd2,
            RegisterPointer::PortConfiguration => 0xb4,
            RegisterPointer::Unknown(other) => other,
        }
    }
}

/// Registers maintained by the emulation.
///
/// Only the [`Dispatcher`](crate::Dispatcher) mutates these; the transport
/// side goes through [`Bridge`](crate::Bridge) to read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFile {
    status: DeviceStatus,
    channel: u8,
    read_pointer: RegisterPointer,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    /// Power-on register state.
    pub const fn new() -> Self {
        Self {
            status: DeviceStatus::IDLE,
            channel: 0,
            read_pointer: RegisterPointer::Status,
        }
    }

    /// Read the status register, clearing all event bits.
    pub fn read_status(&mut self) -> DeviceStatus {
        let status = self.status;
        self.status = DeviceStatus::IDLE;
        log::trace!("status={:#04x}", status.into_bits());
        status
    }

    /// Current status without the read-and-clear side effect.
    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    /// Set bits in the status register. Bits are only ever cleared by
    /// [`read_status`](Self::read_status).
    pub fn write_status_flags(&mut self, mask: DeviceStatus) {
        self.status = DeviceStatus::from_bits(self.status.into_bits() | mask.into_bits());
    }

    /// Select the active channel.
    pub fn set_channel(&mut self, channel: u8) {
        self.channel = channel;
    }

    /// Last channel byte supplied to a Channel Select command.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Position the read pointer.
    pub fn set_read_pointer(&mut self, pointer: RegisterPointer) {
        self.read_pointer = pointer;
    }

    /// Register returned by the next read.
    pub fn read_pointer(&self) -> RegisterPointer {
        self.read_pointer
    }

    /// Apply a Device Reset: status reports the reset and the read
    /// pointer is positioned at the status register.
    pub fn device_reset(&mut self) {
        self.status = DeviceStatus::IDLE;
        self.write_status_flags(DeviceStatus::new().with_device_reset(true));
        self.read_pointer = RegisterPointer::Status;
    }
}
