use embassy_stm32::usb_otg::{self, Driver};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    OTG_FS => usb_otg::InterruptHandler<peripherals::USB_OTG_FS>;
});

pub type UsbDriver = Driver<'static, peripherals::USB_OTG_FS>;
pub type UsbSerial<'a> = CdcAcmClass<'a, UsbDriver>;

const MAX_PACKET: u16 = 64;

static EP_OUT_BUFFER: StaticCell<[u8; 256]> = StaticCell::new();
static CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static CDC_STATE: StaticCell<State<'static>> = StaticCell::new();

#[embassy_executor::task]
pub async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    device.run().await
}

/// Build the CDC-ACM device. Call once; the static cells panic on reuse.
pub fn init(
    usb_periph: peripherals::USB_OTG_FS,
    dp: peripherals::PA12,
    dm: peripherals::PA11,
) -> (UsbDevice<'static, UsbDriver>, UsbSerial<'static>) {
    let mut driver_config = usb_otg::Config::default();
    driver_config.vbus_detection = false;
    let driver = Driver::new_fs(
        usb_periph,
        Irqs,
        dp,
        dm,
        EP_OUT_BUFFER.init([0; 256]),
        driver_config,
    );

    let mut config = Config::new(0xc0de, 0xcafe);
    config.manufacturer = Some("Rocket Avionics");
    config.product = Some("Flight Computer Telemetry");
    config.serial_number = Some("00000001");

    let mut builder = Builder::new(
        driver,
        config,
        CONFIG_DESC.init([0; 256]),
        BOS_DESC.init([0; 256]),
        &mut [],
        CONTROL_BUF.init([0; 64]),
    );
    let class = CdcAcmClass::new(&mut builder, CDC_STATE.init(State::new()), MAX_PACKET);

    (builder.build(), class)
}

/// Write a line in max-size packets. Drops silently when no host is attached.
pub async fn write_line(serial: &mut UsbSerial<'static>, line: &[u8]) -> Result<(), EndpointError> {
    if !serial.dtr() {
        return Ok(());
    }
    for chunk in line.chunks(MAX_PACKET as usize) {
        serial.write_packet(chunk).await?;
    }
    // A full final packet needs a zero-length packet to end the transfer.
    if line.len() % MAX_PACKET as usize == 0 {
        serial.write_packet(&[]).await?;
    }
    Ok(())
}
