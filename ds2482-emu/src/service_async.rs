use embedded_hal_async::delay::DelayNs;

use crate::{BridgeResult, Dispatch, SharedBridge, service::PARAMETER_POLL_MS};

impl<const N: usize> SharedBridge<N> {
    /// One tick of the scheduler for async executors.
    ///
    /// Same as [`service`](SharedBridge::service), but yields to the
    /// executor while sleeping.
    pub async fn service_async<D: DelayNs>(&self, delay: &mut D) -> BridgeResult<Dispatch> {
        let (res, idle_delay_ms) = self.with(|bridge| (bridge.poll(), bridge.idle_delay_ms));
        match res {
            Ok(Dispatch::Idle) => delay.delay_ms(idle_delay_ms).await,
            Ok(Dispatch::Waiting(_)) => delay.delay_ms(PARAMETER_POLL_MS).await,
            _ => {}
        }
        res
    }

    /// Service the bridge forever from an async task.
    pub async fn run_async<D: DelayNs>(&self, delay: &mut D) -> ! {
        loop {
            let _ = self.service_async(delay).await;
        }
    }
}
