use crate::{BridgeResult, Dispatch};

/// The I2C target side of the bridge, as seen by a byte transport.
///
/// An I2C peripheral driver (or a simulated master) calls
/// [`on_receive`](I2cTarget::on_receive) when a write transaction
/// addressed to [`address`](I2cTarget::address) completes, and
/// [`on_request`](I2cTarget::on_request) for every byte the master reads.
pub trait I2cTarget {
    /// 7-bit address the target answers to.
    fn address(&self) -> u8;
    /// A write transaction delivered `bytes`.
    fn on_receive(&mut self, bytes: &[u8]);
    /// The master clocks out one byte.
    fn on_request(&mut self) -> u8;
    /// Process buffered commands once.
    fn poll(&mut self) -> BridgeResult<Dispatch>;
}
