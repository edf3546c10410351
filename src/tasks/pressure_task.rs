use avionics_core::config::{PRESSURE_PERIOD, RECORD_LOCK_TIMEOUT};
use avionics_core::record::{PressureRecord, SharedRecord};
use avionics_core::Wait;
use embassy_executor::task;
use embassy_stm32::adc::{Adc, SampleTime};
use embassy_stm32::peripherals::{ADC1, PC0, PC1};
use embassy_time::Ticker;

/// Pressure task: combustion chamber and oxidizer tank transducers, raw
/// 12-bit counts. Conversion to pressure happens on the ground.
#[task]
pub async fn pressure_task(
    mut adc: Adc<'static, ADC1>,
    mut chamber_pin: PC0,
    mut tank_pin: PC1,
    chamber: &'static SharedRecord<PressureRecord>,
    tank: &'static SharedRecord<PressureRecord>,
) {
    adc.set_sample_time(SampleTime::Cycles480);
    let wait = Wait::For(RECORD_LOCK_TIMEOUT);
    let mut ticker = Ticker::every(PRESSURE_PERIOD);

    loop {
        ticker.next().await;

        let reading = PressureRecord {
            pressure: adc.read(&mut chamber_pin) as i32,
        };
        let _ = chamber.publish(reading, wait).await;

        let reading = PressureRecord {
            pressure: adc.read(&mut tank_pin) as i32,
        };
        let _ = tank.publish(reading, wait).await;
    }
}
