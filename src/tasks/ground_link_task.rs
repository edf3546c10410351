use avionics_core::config::FLIGHT_PHASE_QUEUE_SIZE;
use avionics_core::GroundLinkRouter;
use embassy_executor::task;
use embassy_stm32::peripherals::{DMA1_CH5, USART2};
use embassy_stm32::usart::UartRx;

/// Ground link: every received byte is one command.
///
/// Routing never waits; a full flight-phase queue drops the byte and the
/// router counts it.
#[task]
pub async fn ground_link_task(
    mut rx: UartRx<'static, USART2, DMA1_CH5>,
    router: &'static GroundLinkRouter<'static, FLIGHT_PHASE_QUEUE_SIZE>,
) {
    let mut byte = [0u8; 1];
    loop {
        match rx.read(&mut byte).await {
            Ok(()) => {
                let _ = router.route(byte[0]);
            }
            Err(e) => defmt::warn!("ground link rx error: {}", e),
        }
    }
}
