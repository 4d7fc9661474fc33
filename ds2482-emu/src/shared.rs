use core::cell::RefCell;

use critical_section::Mutex;

use crate::{Bridge, BridgeResult, Dispatch, I2cTarget, RegisterFile};

/// A [`Bridge`] shared between the I2C callbacks and the main loop.
///
/// Every access runs inside a critical section, so the transport may
/// call in from interrupt context while the scheduler is servicing the
/// dispatcher. Suitable for a `static`:
///
/// ```ignore
/// static BRIDGE: SharedBridge = SharedBridge::new(Bridge::new());
/// ```
pub struct SharedBridge<const N: usize = { crate::MAX_DATA }> {
    inner: Mutex<RefCell<Bridge<N>>>,
}

impl<const N: usize> SharedBridge<N> {
    /// Wrap a bridge for shared access.
    pub const fn new(bridge: Bridge<N>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(bridge)),
        }
    }

    /// Run `f` with exclusive access to the bridge.
    pub fn with<R>(&self, f: impl FnOnce(&mut Bridge<N>) -> R) -> R {
        critical_section::with(|cs| f(&mut *self.inner.borrow_ref_mut(cs)))
    }

    /// See [`Bridge::begin_transaction`].
    pub fn begin_transaction(&self) {
        self.with(|bridge| bridge.begin_transaction())
    }

    /// See [`Bridge::on_byte_received`].
    pub fn on_byte_received(&self, byte: u8) -> bool {
        self.with(|bridge| bridge.on_byte_received(byte))
    }

    /// See [`Bridge::on_bytes_received`].
    pub fn on_bytes_received(&self, bytes: &[u8]) -> BridgeResult<usize> {
        self.with(|bridge| bridge.on_bytes_received(bytes))
    }

    /// See [`Bridge::on_byte_requested`].
    pub fn on_byte_requested(&self) -> u8 {
        self.with(|bridge| bridge.on_byte_requested())
    }

    /// Run the dispatcher once, without sleeping.
    pub fn poll(&self) -> BridgeResult<Dispatch> {
        self.with(|bridge| bridge.poll())
    }

    /// Snapshot of the registers.
    pub fn registers(&self) -> RegisterFile {
        self.with(|bridge| *bridge.registers())
    }

    /// 7-bit I2C address of the bridge.
    pub fn address(&self) -> u8 {
        self.with(|bridge| bridge.address())
    }
}

impl<const N: usize> I2cTarget for &SharedBridge<N> {
    fn address(&self) -> u8 {
        SharedBridge::address(*self)
    }

    fn on_receive(&mut self, bytes: &[u8]) {
        let _ = self.on_bytes_received(bytes);
    }

    fn on_request(&mut self) -> u8 {
        self.on_byte_requested()
    }

    fn poll(&mut self) -> BridgeResult<Dispatch> {
        SharedBridge::poll(*self)
    }
}
