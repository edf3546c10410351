use embassy_stm32::rcc::*;
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_stm32::usart::Config as UsartConfig;
use embassy_stm32::Config;

// ── Serial links ──────────────────────────────────────────────────────────────
pub const GROUND_LINK_BAUD: u32 = 57_600;
pub const GPS_BAUD: u32 = 9_600;
pub const RADIO_BAUD: u32 = 57_600;
pub const DEBUG_BAUD: u32 = 115_200;

/// 8N1 at `baudrate`.
pub fn uart_config(baudrate: u32) -> UsartConfig {
    let mut config = UsartConfig::default();
    config.baudrate = baudrate;
    config
}

pub struct Board {
    pub p: embassy_stm32::Peripherals,
}

impl Board {
    /// 8 MHz crystal -> PLL: SYSCLK 168 MHz, 48 MHz for USB, APB1 42 MHz, APB2 84 MHz.
    pub fn init() -> Self {
        let mut config = Config::default();
        config.rcc.hse = Some(Hse {
            freq: TimeHertz(8_000_000),
            mode: HseMode::Oscillator,
        });
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL168,
            divp: Some(PllPDiv::DIV2),
            divq: Some(PllQDiv::DIV7),
            divr: None,
        });
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;

        Self {
            p: embassy_stm32::init(config),
        }
    }
}
