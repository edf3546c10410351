use embassy_stm32::i2c::{Error, I2c, Instance, RxDma, TxDma};
use embassy_time::Timer;

const ADDR: u8 = 0x76;

const REG_PRESS_DATA: u8 = 0x00;
const REG_TEMP_DATA: u8 = 0x03;
const REG_PRS_CFG: u8 = 0x06;
const REG_TMP_CFG: u8 = 0x07;
const REG_MEAS_CFG: u8 = 0x08;
const REG_RESET: u8 = 0x0C;
const REG_CHIP_ID: u8 = 0x0D;
const REG_COEF: u8 = 0x10;

const CHIP_ID: u8 = 0x10;
const SOFT_RESET: u8 = 0x09;
/// 16 measurements/s, 8x oversampling.
const PRS_CFG: u8 = 0x43;
/// External sensor, 1 measurement/s, 8x oversampling.
const TMP_CFG: u8 = 0x83;
/// Continuous pressure and temperature.
const MEAS_CONTINUOUS: u8 = 0x07;

/// Compensation scale factor for 8x oversampling.
const SCALE_8X: f32 = 7_864_320.0;

fn sign_extend(raw: i32, bits: u32) -> i32 {
    let shift = 32 - bits;
    (raw << shift) >> shift
}

#[derive(Default, Clone, Copy)]
struct Coefficients {
    c0: i32,
    c1: i32,
    c00: i32,
    c10: i32,
    c01: i32,
    c11: i32,
    c20: i32,
    c21: i32,
    c30: i32,
}

impl Coefficients {
    fn parse(b: &[u8; 18]) -> Self {
        let u = |i: usize| b[i] as i32;
        let word = |i: usize| i16::from_be_bytes([b[i], b[i + 1]]) as i32;
        Self {
            c0: sign_extend((u(0) << 4) | (u(1) >> 4), 12),
            c1: sign_extend(((u(1) & 0x0F) << 8) | u(2), 12),
            c00: sign_extend((u(3) << 12) | (u(4) << 4) | (u(5) >> 4), 20),
            c10: sign_extend(((u(5) & 0x0F) << 16) | (u(6) << 8) | u(7), 20),
            c01: word(8),
            c11: word(10),
            c20: word(12),
            c21: word(14),
            c30: word(16),
        }
    }
}

/// SPL06-001 barometer in continuous mode.
pub struct Spl06 {
    coef: Coefficients,
}

impl Spl06 {
    pub async fn init<T: Instance, Tx: TxDma<T>, Rx: RxDma<T>>(
        i2c: &mut I2c<'_, T, Tx, Rx>,
    ) -> Result<Self, Error> {
        i2c.blocking_write(ADDR, &[REG_RESET, SOFT_RESET])?;
        Timer::after_millis(50).await;

        let mut id = [0u8; 1];
        i2c.blocking_write_read(ADDR, &[REG_CHIP_ID], &mut id)?;
        if id[0] != CHIP_ID {
            defmt::warn!("spl06: unexpected id {=u8:#x}", id[0]);
        }

        let mut raw = [0u8; 18];
        i2c.blocking_write_read(ADDR, &[REG_COEF], &mut raw)?;

        i2c.blocking_write(ADDR, &[REG_PRS_CFG, PRS_CFG])?;
        i2c.blocking_write(ADDR, &[REG_TMP_CFG, TMP_CFG])?;
        i2c.blocking_write(ADDR, &[REG_MEAS_CFG, MEAS_CONTINUOUS])?;
        Timer::after_millis(50).await;

        Ok(Self {
            coef: Coefficients::parse(&raw),
        })
    }

    fn read_raw<T: Instance, Tx: TxDma<T>, Rx: RxDma<T>>(
        i2c: &mut I2c<'_, T, Tx, Rx>,
        reg: u8,
    ) -> Result<i32, Error> {
        let mut b = [0u8; 3];
        i2c.blocking_write_read(ADDR, &[reg], &mut b)?;
        Ok(sign_extend(
            ((b[0] as i32) << 16) | ((b[1] as i32) << 8) | b[2] as i32,
            24,
        ))
    }

    /// Compensated (pressure Pa, temperature centi-degrees C).
    pub fn read<T: Instance, Tx: TxDma<T>, Rx: RxDma<T>>(
        &mut self,
        i2c: &mut I2c<'_, T, Tx, Rx>,
    ) -> Result<(i32, i32), Error> {
        let p_sc = Self::read_raw(i2c, REG_PRESS_DATA)? as f32 / SCALE_8X;
        let t_sc = Self::read_raw(i2c, REG_TEMP_DATA)? as f32 / SCALE_8X;
        let c = self.coef;

        let temp_c = c.c0 as f32 * 0.5 + c.c1 as f32 * t_sc;
        let pressure = c.c00 as f32
            + p_sc * (c.c10 as f32 + p_sc * (c.c20 as f32 + p_sc * c.c30 as f32))
            + t_sc * c.c01 as f32
            + t_sc * p_sc * (c.c11 as f32 + p_sc * c.c21 as f32);

        Ok((pressure as i32, (temp_c * 100.0) as i32))
    }
}
