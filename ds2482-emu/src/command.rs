pub(crate) const DEVICE_RST_CMD: u8 = 0xf0; // Reset the device
pub(crate) const READ_PTR_CMD: u8 = 0xe1; // Set the read pointer
pub(crate) const CHANNEL_SELECT_CMD: u8 = 0xc3; // Select the active channel
pub(crate) const WRITE_CONFIG_CMD: u8 = 0xd2;
pub(crate) const ONEWIRE_RESET_CMD: u8 = 0xb4;
pub(crate) const ONEWIRE_SINGLE_BIT: u8 = 0x87;
pub(crate) const ONEWIRE_WRITE_BYTE: u8 = 0xa5;
pub(crate) const ONEWIRE_READ_BYTE: u8 = 0x96;
pub(crate) const ONEWIRE_TRIPLET: u8 = 0x78;

/// Function commands of the bridge, decoded from the first byte of a
/// write transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Device Reset (`0xF0`), no parameter.
    DeviceReset,
    /// Set Read Pointer (`0xE1`), one register selector parameter.
    SetReadPointer,
    /// Channel Select (`0xC3`), one channel parameter.
    ChannelSelect,
    /// Write Device Configuration (`0xD2`).
    WriteConfig,
    /// 1-Wire Reset (`0xB4`).
    OneWireReset,
    /// 1-Wire Single Bit (`0x87`).
    OneWireSingleBit,
    /// 1-Wire Write Byte (`0xA5`).
    OneWireWriteByte,
    /// 1-Wire Read Byte (`0x96`).
    OneWireReadByte,
    /// 1-Wire Triplet (`0x78`).
    OneWireTriplet,
    /// Byte that is not a bridge opcode.
    Unknown(u8),
}

impl From<u8> for Command {
    fn from(opcode: u8) -> Self {
        match opcode {
            DEVICE_RST_CMD => Self::DeviceReset,
            READ_PTR_CMD => Self::SetReadPointer,
            CHANNEL_SELECT_CMD => Self::ChannelSelect,
            WRITE_CONFIG_CMD => Self::WriteConfig,
            ONEWIRE_RESET_CMD => Self::OneWireReset,
            ONEWIRE_SINGLE_BIT => Self::OneWireSingleBit,
            ONEWIRE_WRITE_BYTE => Self::OneWireWriteByte,
            ONEWIRE_READ_BYTE => Self::OneWireReadByte,
            ONEWIRE_TRIPLET => Self::OneWireTriplet,
            other => Self::Unknown(other),
        }
    }
}

impl Command {
    /// The opcode byte on the wire.
    pub fn opcode(&self) -> u8 {
        match self {
            Self::DeviceReset => DEVICE_RST_CMD,
            Self::SetReadPointer => READ_PTR_CMD,
            Self::ChannelSelect => CHANNEL_SELECT_CMD,
            Self::WriteConfig => WRITE_CONFIG_CMD,
            Self::OneWireReset => ONEWIRE_RESET_CMD,
            Self::OneWireSingleBit => ONEWIRE_SINGLE_BIT,
            Self::OneWireWriteByte => ONEWIRE_WRITE_BYTE,
            Self::OneWireReadByte => ONEWIRE_READ_BYTE,
            Self::OneWireTriplet => ONEWIRE_TRIPLET,
            Self::Unknown(other) => *other,
        }
    }

    /// Number of parameter bytes following the opcode on a real bridge.
    pub fn parameter_count(&self) -> usize {
        match self {
            Self::SetReadPointer
            | Self::ChannelSelect
            | Self::WriteConfig
            | Self::OneWireSingleBit
            | Self::OneWireWriteByte
            | Self::OneWireTriplet => 1,
            Self::DeviceReset
            | Self::OneWireReset
            | Self::OneWireReadByte
            | Self::Unknown(_) => 0,
        }
    }

    /// Whether the emulation executes this command. Everything else is
    /// rejected as an unknown command.
    pub fn is_emulated(&self) -> bool {
        matches!(
            self,
            Self::DeviceReset | Self::SetReadPointer | Self::ChannelSelect
        )
    }

    /// Name used in diagnostic traces.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeviceReset => "Device Reset",
            Self::SetReadPointer => "Set Read Pointer",
            Self::ChannelSelect => "Channel Select",
            Self::WriteConfig => "Write Configuration",
            Self::OneWireReset => "1-Wire Reset",
            Self::OneWireSingleBit => "1-Wire Single Bit",
            Self::OneWireWriteByte => "1-Wire Write Byte",
            Self::OneWireReadByte => "1-Wire Read Byte",
            Self::OneWireTriplet => "1-Wire Triplet",
            Self::Unknown(_) => "unknown",
        }
    }
}
