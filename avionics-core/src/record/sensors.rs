use heapless::Vec;

use super::SharedRecord;
use crate::config::NMEA_MAX_LENGTH;
use crate::phase::FlightPhase;

// Negative sentinels mark "never written" so a log can tell a dead sensor
// from a zero reading.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImuRecord {
    pub accel: [i32; 3],
    pub gyro: [i32; 3],
    pub magneto: [i32; 3],
}

impl ImuRecord {
    pub const fn new() -> Self {
        Self {
            accel: [-1, -2, -3],
            gyro: [-4, -5, -6],
            magneto: [-7, -8, -9],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BarometerRecord {
    /// Pascals.
    pub pressure: i32,
    /// Hundredths of a degree Celsius.
    pub temperature: i32,
}

impl BarometerRecord {
    pub const fn new() -> Self {
        Self {
            pressure: -10,
            temperature: -11,
        }
    }
}

/// Single pressure channel (combustion chamber or oxidizer tank), raw ADC counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PressureRecord {
    pub pressure: i32,
}

impl PressureRecord {
    pub const fn new(sentinel: i32) -> Self {
        Self { pressure: sentinel }
    }
}

/// Decoded GGA fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsFix {
    /// hhmmss, UTC.
    pub utc_time: u32,
    pub latitude_udeg: i32,
    pub longitude_udeg: i32,
    pub altitude_mm: i32,
    pub satellites: u8,
    /// 0 = no fix, 1 = GPS, 2 = DGPS ...
    pub quality: u8,
}

impl GpsFix {
    pub const fn new() -> Self {
        Self {
            utc_time: 0,
            latitude_udeg: 0,
            longitude_udeg: 0,
            altitude_mm: 0,
            satellites: 0,
            quality: 0,
        }
    }

    pub fn has_fix(&self) -> bool {
        self.quality != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpsRecord {
    /// Last captured sentence, prefix included, terminator stripped.
    pub line: Vec<u8, NMEA_MAX_LENGTH>,
    /// Set when `line` holds a sentence nobody has decoded yet.
    pub parse_ready: bool,
    pub fix: GpsFix,
}

impl GpsRecord {
    pub const fn new() -> Self {
        Self {
            line: Vec::new(),
            parse_ready: false,
            fix: GpsFix::new(),
        }
    }

    /// Replace the buffered sentence in one step. Returns `false` if the
    /// line does not fit, leaving the record untouched.
    pub fn store_line(&mut self, line: &[u8]) -> bool {
        if line.len() > NMEA_MAX_LENGTH {
            return false;
        }
        self.line.clear();
        if self.line.extend_from_slice(line).is_err() {
            return false;
        }
        self.parse_ready = true;
        true
    }

    /// Hand the pending sentence to a decoder and mark it consumed.
    pub fn take_line(&mut self) -> Option<Vec<u8, NMEA_MAX_LENGTH>> {
        if !self.parse_ready {
            return None;
        }
        self.parse_ready = false;
        Some(self.line.clone())
    }
}

/// Every shared sensor record, as handed to the logger and transmitter.
pub struct SensorRecords {
    pub imu: SharedRecord<ImuRecord>,
    pub barometer: SharedRecord<BarometerRecord>,
    pub combustion_chamber: SharedRecord<PressureRecord>,
    pub gps: SharedRecord<GpsRecord>,
    pub oxidizer_tank: SharedRecord<PressureRecord>,
    pub phase: SharedRecord<FlightPhase>,
}

impl SensorRecords {
    pub const fn new() -> Self {
        Self {
            imu: SharedRecord::new(ImuRecord::new()),
            barometer: SharedRecord::new(BarometerRecord::new()),
            combustion_chamber: SharedRecord::new(PressureRecord::new(-12)),
            gps: SharedRecord::new(GpsRecord::new()),
            oxidizer_tank: SharedRecord::new(PressureRecord::new(-17)),
            phase: SharedRecord::new(FlightPhase::Prelaunch),
        }
    }
}

impl Default for SensorRecords {
    fn default() -> Self {
        Self::new()
    }
}
