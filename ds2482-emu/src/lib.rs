#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

/*! # DS2482 emulator
 *
 * Register-level emulation of the DS2482/DS2483 I2C to 1-Wire bridge,
 * for microcontrollers acting as an I2C target. An I2C master talks to
 * it as if it were the real chip.
 *
 * The I2C peripheral delivers write transactions to the [`Bridge`]
 * (usually through a [`SharedBridge`] from interrupt context) and asks
 * it for bytes on reads. The main loop calls [`SharedBridge::service`]
 * to run the command [`Dispatcher`].
 *
 * Emulated commands are Device Reset, Set Read Pointer and Channel Select.
 * Reads are served for the status register only; any other read pointer
 * reports [`BridgeError::UnsupportedRegister`]. No 1-Wire signalling
 * takes place.
 */

mod bridge;
mod buffer;
mod command;
mod dispatcher;
mod error;
mod registers;
mod service;
mod service_async;
mod shared;
mod traits;

pub use bridge::{Bridge, BridgeBuilder};
pub use buffer::CommandBuffer;
pub use command::Command;
pub use dispatcher::{Dispatch, DispatchState, Dispatcher};
pub use error::BridgeError;
pub use registers::{DeviceStatus, RegisterFile, RegisterPointer};
pub use shared::SharedBridge;
pub use traits::I2cTarget;

/// Results of bridge emulation calls.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Default 7-bit I2C address of the bridge.
pub const DEFAULT_ADDRESS: u8 = 0x18;

/// Default command buffer size.
pub const MAX_DATA: usize = 16;
