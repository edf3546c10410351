use avionics_core::config::{RECORD_LOCK_TIMEOUT, SENSOR_PERIOD};
use avionics_core::record::{BarometerRecord, ImuRecord, SharedRecord};
use avionics_core::Wait;
use embassy_executor::task;
use embassy_stm32::i2c::I2c;
use embassy_stm32::peripherals::{DMA1_CH0, DMA1_CH7, I2C1, SPI1};
use embassy_time::Ticker;

use crate::drivers::hmc5883::Hmc5883;
use crate::drivers::icm42688::Icm42688;
use crate::drivers::spl06::Spl06;

/// Barometer runs at a tenth of the IMU rate.
const BARO_DIVIDER: u32 = 10;

/// Sensor task: ICM-42688 + HMC5883L into the IMU record, SPL06 into the
/// barometer record. A sensor that fails to start leaves its fields at the
/// sentinel values.
#[task]
pub async fn sensor_task(
    mut imu: Icm42688<'static, SPI1>,
    mut i2c: I2c<'static, I2C1, DMA1_CH7, DMA1_CH0>,
    imu_record: &'static SharedRecord<ImuRecord>,
    baro_record: &'static SharedRecord<BarometerRecord>,
) {
    let imu_ok = match imu.init().await {
        Ok(_) => true,
        Err(e) => {
            defmt::error!("icm42688 init failed: {}", e);
            false
        }
    };
    let mut mag = Hmc5883::init(&mut i2c)
        .await
        .map_err(|e| defmt::error!("hmc5883 init failed: {}", e))
        .ok();
    let mut baro = Spl06::init(&mut i2c)
        .await
        .map_err(|e| defmt::error!("spl06 init failed: {}", e))
        .ok();

    let wait = Wait::For(RECORD_LOCK_TIMEOUT);
    let mut ticker = Ticker::every(SENSOR_PERIOD);
    let mut tick: u32 = 0;

    loop {
        ticker.next().await;
        tick = tick.wrapping_add(1);

        let sample = if imu_ok { imu.read().ok() } else { None };
        let magneto = mag.as_mut().and_then(|m| m.read(&mut i2c).ok());
        if sample.is_some() || magneto.is_some() {
            // Partial update: keep whatever the other sensor last wrote.
            if let Ok(mut rec) = imu_record.acquire(wait).await {
                if let Some(s) = &sample {
                    rec.accel = s.accel;
                    rec.gyro = s.gyro;
                }
                if let Some(m) = magneto {
                    rec.magneto = m;
                }
            }
        }

        if tick % BARO_DIVIDER == 0 {
            if let Some(Ok((pressure, temperature))) = baro.as_mut().map(|b| b.read(&mut i2c)) {
                let _ = baro_record
                    .publish(BarometerRecord { pressure, temperature }, wait)
                    .await;
            }
        }
    }
}
