use avionics_core::config::{
    GPS_RX_BUFFER, GPS_SENTENCE_PREFIX, GPS_SILENCE_TIMEOUT, RECORD_LOCK_TIMEOUT,
};
use avionics_core::nmea::gga;
use avionics_core::record::{GpsRecord, SharedRecord};
use avionics_core::{GpsLink, Wait};
use embassy_executor::task;
use embassy_futures::select::{select, Either};
use embassy_stm32::peripherals::{DMA1_CH2, UART4};
use embassy_stm32::usart::UartRx;
use embassy_time::Timer;

/// GPS task: capture `$GPGGA` lines from UART4 bursts into the GPS record,
/// then decode whatever is pending.
///
/// A burst is read whole, ending on line idle or a full buffer. The framer
/// is reset whenever bytes may have been lost (read error, or a read
/// cancelled after `GPS_SILENCE_TIMEOUT` of quiet) so no line spans a gap.
#[task]
pub async fn gps_task(
    mut rx: UartRx<'static, UART4, DMA1_CH2>,
    record: &'static SharedRecord<GpsRecord>,
) {
    let mut link: GpsLink<'static> = GpsLink::new(GPS_SENTENCE_PREFIX, record);
    let mut buf = [0u8; GPS_RX_BUFFER];

    loop {
        match select(rx.read_until_idle(&mut buf), Timer::after(GPS_SILENCE_TIMEOUT)).await {
            Either::First(Ok(n)) => {
                link.on_bytes(&buf[..n]);
            }
            Either::First(Err(e)) => {
                defmt::debug!("gps rx error: {}", e);
                link.reset();
                continue;
            }
            Either::Second(()) => {
                defmt::warn!("gps silent for {} ms", GPS_SILENCE_TIMEOUT.as_millis());
                link.reset();
                continue;
            }
        }

        match gga::decode_pending(record, Wait::For(RECORD_LOCK_TIMEOUT)).await {
            Ok(Some(fix)) if fix.has_fix() => {
                defmt::trace!("gps fix: {} sats", fix.satellites);
            }
            Ok(_) => {}
            Err(e) => defmt::debug!("gga decode failed: {}", e),
        }
    }
}
