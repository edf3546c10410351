use core::fmt::Write;

use avionics_core::config::DEBUG_POLL_PERIOD;
use embassy_executor::task;
use embassy_stm32::dma::NoDma;
use embassy_stm32::peripherals::UART5;
use embassy_stm32::usart::Uart;
use embassy_time::Timer;

use crate::{PAYLOAD_POOL, ROUTER};

/// Prints the router and payload counters.
const STATUS_REQUEST: u8 = b'?';

/// Debug console on UART5, polled every `DEBUG_POLL_PERIOD`.
///
/// Read-only: `?` prints counters, every other byte is ignored. Nothing
/// typed here reaches the flight-phase queue.
#[task]
pub async fn debug_task(mut uart: Uart<'static, UART5, NoDma, NoDma>) {
    loop {
        Timer::after(DEBUG_POLL_PERIOD).await;

        while let Ok(byte) = uart.nb_read() {
            if byte != STATUS_REQUEST {
                defmt::trace!("debug byte {=u8:#x} ignored", byte);
                continue;
            }

            let stats = ROUTER.stats();
            let mut m = heapless::String::<128>::new();
            let _ = write!(
                m,
                "queue {}/{} front={} back={} dropped={} payloads={} peak={} faults={}\r\n",
                ROUTER.queue().len(),
                ROUTER.queue().capacity(),
                stats.front,
                stats.back,
                stats.dropped,
                PAYLOAD_POOL.live(),
                PAYLOAD_POOL.peak(),
                PAYLOAD_POOL.faults(),
            );
            let _ = uart.blocking_write(m.as_bytes());
        }
    }
}
