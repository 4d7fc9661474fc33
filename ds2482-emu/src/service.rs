use embedded_hal::delay::DelayNs;

use crate::{BridgeResult, Dispatch, SharedBridge};

/// Delay between ticks while a command waits for its parameters.
pub(crate) const PARAMETER_POLL_MS: u32 = 1;

impl<const N: usize> SharedBridge<N> {
    /// One tick of the cooperative scheduler.
    ///
    /// Runs the dispatcher inside a critical section, then sleeps outside
    /// of it: for the idle delay if nothing was buffered, for
    /// 1 ms if a command is still waiting for parameters. An executed or
    /// rejected command returns immediately.
    pub fn service<D: DelayNs>(&self, delay: &mut D) -> BridgeResult<Dispatch> {
        let (res, idle_delay_ms) = self.with(|bridge| (bridge.poll(), bridge.idle_delay_ms));
        match res {
            Ok(Dispatch::Idle) => delay.delay_ms(idle_delay_ms),
            Ok(Dispatch::Waiting(_)) => delay.delay_ms(PARAMETER_POLL_MS),
            _ => {}
        }
        res
    }

    /// Service the bridge forever. Errors are logged by the dispatcher
    /// and never stop the loop.
    pub fn run<D: DelayNs>(&self, delay: &mut D) -> ! {
        loop {
            let _ = self.service(delay);
        }
    }
}
