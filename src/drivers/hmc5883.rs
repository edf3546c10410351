use embassy_stm32::i2c::{Error, I2c, Instance, RxDma, TxDma};
use embassy_time::Timer;

const ADDR: u8 = 0x1E;

const REG_CONFIG_A: u8 = 0x00;
const REG_CONFIG_B: u8 = 0x01;
const REG_MODE: u8 = 0x02;
const REG_DATA_X_MSB: u8 = 0x03;

/// 8-sample average, 15 Hz, normal measurement.
const CONFIG_A: u8 = 0x70;
/// +-1.3 Ga.
const CONFIG_B: u8 = 0x20;
const MODE_CONTINUOUS: u8 = 0x00;

/// HMC5883L magnetometer. Stateless; the bus is passed per call so it can
/// be shared with the barometer.
pub struct Hmc5883;

impl Hmc5883 {
    pub async fn init<T: Instance, Tx: TxDma<T>, Rx: RxDma<T>>(
        i2c: &mut I2c<'_, T, Tx, Rx>,
    ) -> Result<Self, Error> {
        for (reg, value) in [
            (REG_CONFIG_A, CONFIG_A),
            (REG_CONFIG_B, CONFIG_B),
            (REG_MODE, MODE_CONTINUOUS),
        ] {
            i2c.blocking_write(ADDR, &[reg, value])?;
        }
        Timer::after_millis(10).await;
        Ok(Self)
    }

    /// Raw counts as X, Y, Z.
    pub fn read<T: Instance, Tx: TxDma<T>, Rx: RxDma<T>>(
        &mut self,
        i2c: &mut I2c<'_, T, Tx, Rx>,
    ) -> Result<[i32; 3], Error> {
        let mut data = [0u8; 6];
        i2c.blocking_write_read(ADDR, &[REG_DATA_X_MSB], &mut data)?;

        // Register order is X, Z, Y.
        let axis = |i: usize| i16::from_be_bytes([data[i], data[i + 1]]) as i32;
        Ok([axis(0), axis(4), axis(2)])
    }
}
