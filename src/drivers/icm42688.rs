use embassy_stm32::dma::NoDma;
use embassy_stm32::gpio::{AnyPin, Output};
use embassy_stm32::spi::{Error, Instance, Spi};
use embassy_time::Timer;

const REG_DEVICE_CONFIG: u8 = 0x11;
const REG_ACCEL_DATA_X1: u8 = 0x1F;
const REG_PWR_MGMT0: u8 = 0x4E;
const REG_WHO_AM_I: u8 = 0x75;

const WHO_AM_I: u8 = 0x47;
const SOFT_RESET: u8 = 0x01;
/// Gyro and accel both in low-noise mode.
const PWR_LOW_NOISE: u8 = 0x0F;

const READ: u8 = 0x80;

/// Raw counts, sensor frame.
pub struct ImuSample {
    pub accel: [i32; 3],
    pub gyro: [i32; 3],
}

pub struct Icm42688<'d, T: Instance> {
    spi: Spi<'d, T, NoDma, NoDma>,
    cs: Output<'d, AnyPin>,
}

impl<'d, T: Instance> Icm42688<'d, T> {
    pub fn new(spi: Spi<'d, T, NoDma, NoDma>, cs: Output<'d, AnyPin>) -> Self {
        Self { spi, cs }
    }

    /// Full-duplex transfer framed by chip select.
    fn transfer(&mut self, rx: &mut [u8], tx: &[u8]) -> Result<(), Error> {
        self.cs.set_low();
        let res = self.spi.blocking_transfer(rx, tx);
        self.cs.set_high();
        res
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Error> {
        let mut rx = [0u8; 2];
        self.transfer(&mut rx, &[reg & !READ, value])
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, Error> {
        let mut rx = [0u8; 2];
        self.transfer(&mut rx, &[reg | READ, 0])?;
        Ok(rx[1])
    }

    /// Reset and start both sensors. Returns the WHO_AM_I value read back.
    pub async fn init(&mut self) -> Result<u8, Error> {
        self.write_reg(REG_DEVICE_CONFIG, SOFT_RESET)?;
        Timer::after_millis(10).await;

        let id = self.read_reg(REG_WHO_AM_I)?;
        if id != WHO_AM_I {
            defmt::warn!("icm42688: unexpected id {=u8:#x}", id);
        }

        self.write_reg(REG_PWR_MGMT0, PWR_LOW_NOISE)?;
        Timer::after_millis(50).await;
        Ok(id)
    }

    /// Burst read of accel X..Z then gyro X..Z, big endian.
    pub fn read(&mut self) -> Result<ImuSample, Error> {
        let mut tx = [0u8; 13];
        tx[0] = REG_ACCEL_DATA_X1 | READ;
        let mut rx = [0u8; 13];
        self.transfer(&mut rx, &tx)?;

        let word = |i: usize| i16::from_be_bytes([rx[1 + 2 * i], rx[2 + 2 * i]]) as i32;
        Ok(ImuSample {
            accel: [word(0), word(1), word(2)],
            gyro: [word(3), word(4), word(5)],
        })
    }
}
