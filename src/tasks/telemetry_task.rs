use core::fmt::Write;

use avionics_core::command::CommandQueue;
use avionics_core::config::{EVENT_QUEUE_SIZE, RECORD_LOCK_TIMEOUT, TELEMETRY_PERIOD};
use avionics_core::telemetry::{CSV_HEADER, CSV_LINE_MAX};
use avionics_core::{SensorRecords, Wait};
use embassy_executor::task;
use embassy_stm32::peripherals::{DMA2_CH7, USART1};
use embassy_stm32::usart::UartTx;
use embassy_time::Ticker;

use crate::usb::{self, UsbSerial};

/// Resend the CSV header every this many ticks so a late receiver can sync.
const HEADER_EVERY: u32 = 200;

/// Room for every event line drained in one tick.
const EVENT_LINES_MAX: usize = 256;

/// Telemetry task, 20 Hz.
/// Sends one CSV snapshot line per tick over the radio and USB, followed by
/// any phase events queued since the last tick.
#[task]
pub async fn telemetry_task(
    mut radio: UartTx<'static, USART1, DMA2_CH7>,
    mut usb_serial: UsbSerial<'static>,
    records: &'static SensorRecords,
    events: &'static CommandQueue<'static, EVENT_QUEUE_SIZE>,
) {
    let mut ticker = Ticker::every(TELEMETRY_PERIOD);
    let mut tick: u32 = 0;

    loop {
        ticker.next().await;

        if tick % HEADER_EVERY == 0 {
            let mut header = heapless::String::<{ CSV_HEADER.len() + 2 }>::new();
            if header.push_str(CSV_HEADER).is_ok() && header.push_str("\r\n").is_ok() {
                send(&mut radio, &mut usb_serial, header.as_bytes()).await;
            }
        }
        tick = tick.wrapping_add(1);

        match records.snapshot(Wait::For(RECORD_LOCK_TIMEOUT)).await {
            Ok(snap) => {
                let mut row = heapless::String::<{ CSV_LINE_MAX + 2 }>::new();
                if snap.write_csv(&mut row).is_ok() && row.push_str("\r\n").is_ok() {
                    send(&mut radio, &mut usb_serial, row.as_bytes()).await;
                } else {
                    defmt::warn!("telemetry row truncated, not sent");
                }
            }
            Err(e) => defmt::debug!("telemetry snapshot skipped: {}", e),
        }

        // ── Phase events ───────────────────────────────────────────────────
        let mut lines = heapless::String::<EVENT_LINES_MAX>::new();
        while let Ok(mut command) = events.try_receive() {
            let mut m = heapless::String::<64>::new();
            let mut ok = write!(m, "EVT,{:#06x}", command.task_command()).is_ok();
            for b in command.data() {
                ok &= write!(m, ",{}", b).is_ok();
            }
            ok &= m.push_str("\r\n").is_ok();
            if !ok || lines.push_str(&m).is_err() {
                defmt::warn!("event {} not sent", command.task_command());
            }
            command.reset();
        }
        if !lines.is_empty() {
            send(&mut radio, &mut usb_serial, lines.as_bytes()).await;
        }
    }
}

async fn send(
    radio: &mut UartTx<'static, USART1, DMA2_CH7>,
    usb_serial: &mut UsbSerial<'static>,
    bytes: &[u8],
) {
    if let Err(e) = radio.write(bytes).await {
        defmt::debug!("radio write failed: {}", e);
    }
    let _ = usb::write_line(usb_serial, bytes).await;
}
