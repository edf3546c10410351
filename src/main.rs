#![no_std]
#![no_main]

mod board;
mod drivers;
mod tasks;
mod usb;

use avionics_core::command::{CommandQueue, PayloadPool, PoolFault};
use avionics_core::config::{
    EVENT_QUEUE_SIZE, FLIGHT_PHASE_QUEUE_SIZE, MAX_LIVE_PAYLOADS, PHASE_BLINK_PERIOD,
    PHASE_DISPLAY_PERIOD, RECORD_LOCK_TIMEOUT,
};
use avionics_core::{FlightPhase, FlightPhaseQueue, GroundLinkRouter, SensorRecords, Wait};
use embassy_executor::Spawner;
use embassy_stm32::adc::Adc;
use embassy_stm32::dma::NoDma;
use embassy_stm32::gpio::{Level, Output, Pin, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::spi::{Config as SpiConfig, Spi};
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_stm32::usart::{Uart, UartRx, UartTx};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_time::{Delay, Instant, Timer};
use {defmt_rtt as _, panic_probe as _};

use crate::board::Board;
use crate::drivers::icm42688::Icm42688;

// ── Shared state ──────────────────────────────────────────────────────────────
//  Records are last-value cells; queues carry every item in order.
pub static RECORDS: SensorRecords = SensorRecords::new();

pub static FLIGHT_QUEUE: FlightPhaseQueue<FLIGHT_PHASE_QUEUE_SIZE> = FlightPhaseQueue::new();
pub static ROUTER: GroundLinkRouter<'static, FLIGHT_PHASE_QUEUE_SIZE> =
    GroundLinkRouter::new(&FLIGHT_QUEUE);

pub static PAYLOAD_POOL: PayloadPool = PayloadPool::new(MAX_LIVE_PAYLOADS, payload_leak);
pub static EVENT_QUEUE: CommandQueue<'static, EVENT_QUEUE_SIZE> = CommandQueue::new(&PAYLOAD_POOL);

/// More live payloads than the ceiling means commands are not being reset.
fn payload_leak(fault: PoolFault) {
    defmt::panic!(
        "payload leak: {} live, ceiling {}",
        fault.live,
        fault.ceiling
    );
}

// ── Interrupt bindings ────────────────────────────────────────────────────────
bind_interrupts!(struct Irqs {
    I2C1_EV => embassy_stm32::i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => embassy_stm32::i2c::ErrorInterruptHandler<peripherals::I2C1>;
    USART1  => embassy_stm32::usart::InterruptHandler<peripherals::USART1>;
    USART2  => embassy_stm32::usart::InterruptHandler<peripherals::USART2>;
    UART4   => embassy_stm32::usart::InterruptHandler<peripherals::UART4>;
    UART5   => embassy_stm32::usart::InterruptHandler<peripherals::UART5>;
});

// ── Main ──────────────────────────────────────────────────────────────────────
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // 1. Clocks (168 MHz core, 48 MHz USB)
    let board = Board::init();
    let p = board.p;
    defmt::info!("avionics up, phase {}", FlightPhase::Prelaunch.name());

    // 2. USB CDC-ACM, mirrored telemetry
    let (usb_dev, usb_serial) = usb::init(p.USB_OTG_FS, p.PA12, p.PA11);
    spawner.spawn(usb::usb_task(usb_dev)).unwrap();

    // 3. Ground link USART2 RX (PA3): single command bytes
    let ground_rx = UartRx::new(
        p.USART2,
        Irqs,
        p.PA3,
        p.DMA1_CH5,
        board::uart_config(board::GROUND_LINK_BAUD),
    )
    .unwrap();
    spawner.spawn(tasks::ground_link_task(ground_rx, &ROUTER)).unwrap();

    // 4. GPS UART4 RX (PA1)
    let gps_rx = UartRx::new(
        p.UART4,
        Irqs,
        p.PA1,
        p.DMA1_CH2,
        board::uart_config(board::GPS_BAUD),
    )
    .unwrap();
    spawner.spawn(tasks::gps_task(gps_rx, &RECORDS.gps)).unwrap();

    // 5. Flight-phase state machine
    spawner
        .spawn(tasks::flight_phase_task(&FLIGHT_QUEUE, &RECORDS.phase, &EVENT_QUEUE))
        .unwrap();

    // 6. SPI1 @ 10 MHz: ICM-42688 (SCK=PA5, MOSI=PA7, MISO=PA6, CS=PB12)
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = TimeHertz(10_000_000);
    let spi = Spi::new(p.SPI1, p.PA5, p.PA7, p.PA6, NoDma, NoDma, spi_config);
    let cs_imu = Output::new(p.PB12.degrade(), Level::High, Speed::VeryHigh);
    let imu = Icm42688::new(spi, cs_imu);

    // 7. I2C1 @ 400 kHz: HMC5883L + SPL06 (SCL=PB8, SDA=PB9)
    let i2c = I2c::new(
        p.I2C1,
        p.PB8,
        p.PB9,
        Irqs,
        p.DMA1_CH7,
        p.DMA1_CH0,
        TimeHertz(400_000),
        Default::default(),
    );
    spawner
        .spawn(tasks::sensor_task(imu, i2c, &RECORDS.imu, &RECORDS.barometer))
        .unwrap();

    // 8. ADC1: combustion chamber (PC0) and oxidizer tank (PC1) transducers
    let adc = Adc::new(p.ADC1, &mut Delay);
    spawner
        .spawn(tasks::pressure_task(
            adc,
            p.PC0,
            p.PC1,
            &RECORDS.combustion_chamber,
            &RECORDS.oxidizer_tank,
        ))
        .unwrap();

    // 9. Radio USART1 TX (PA9)
    let radio_tx = UartTx::new(
        p.USART1,
        p.PA9,
        p.DMA2_CH7,
        board::uart_config(board::RADIO_BAUD),
    )
    .unwrap();
    spawner
        .spawn(tasks::telemetry_task(radio_tx, usb_serial, &RECORDS, &EVENT_QUEUE))
        .unwrap();

    // 10. Debug console UART5 (TX=PC12, RX=PD2), polled
    let debug_uart = Uart::new(
        p.UART5,
        p.PD2,
        p.PC12,
        Irqs,
        NoDma,
        NoDma,
        board::uart_config(board::DEBUG_BAUD),
    )
    .unwrap();
    spawner.spawn(tasks::debug_task(debug_uart)).unwrap();

    // 11. Main task: blink the status LED (PC13) phase + 1 times per second
    let mut led = Output::new(p.PC13, Level::High, Speed::Low);
    loop {
        let started = Instant::now();
        let phase = RECORDS
            .phase
            .snapshot(Wait::For(RECORD_LOCK_TIMEOUT))
            .await
            .unwrap_or(FlightPhase::Prelaunch);

        for _ in 0..phase.blink_count() {
            led.set_low();
            Timer::after(PHASE_BLINK_PERIOD).await;
            led.set_high();
            Timer::after(PHASE_BLINK_PERIOD).await;
        }

        // Abort's seven blinks overrun the period; start the next round at once.
        Timer::at(started + PHASE_DISPLAY_PERIOD).await;
    }
}
