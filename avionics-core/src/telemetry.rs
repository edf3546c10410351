//! Point-in-time copy of every sensor record, for the logger and radio.

use core::fmt::{self, Write};

use embassy_time::Instant;

use crate::phase::FlightPhase;
use crate::record::{
    AccessError, BarometerRecord, GpsFix, ImuRecord, PressureRecord, SensorRecords,
};
use crate::wait::Wait;

/// Column order of [`TelemetrySnapshot::write_csv`].
pub const CSV_HEADER: &str = "uptime_ms,phase,ax,ay,az,gx,gy,gz,mx,my,mz,\
baro_pa,baro_cc,chamber,tank,utc,lat_udeg,lon_udeg,alt_mm,sats,fix";

/// Longest line `write_csv` can produce, every field at its widest.
pub const CSV_LINE_MAX: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetrySnapshot {
    pub uptime_ms: u64,
    pub phase: FlightPhase,
    pub imu: ImuRecord,
    pub barometer: BarometerRecord,
    pub combustion_chamber: PressureRecord,
    pub oxidizer_tank: PressureRecord,
    pub gps: GpsFix,
}

impl TelemetrySnapshot {
    /// One line, no terminator.
    pub fn write_csv<W: Write>(&self, out: &mut W) -> fmt::Result {
        let imu = &self.imu;
        write!(out, "{},{}", self.uptime_ms, self.phase.index())?;
        for v in imu.accel.iter().chain(&imu.gyro).chain(&imu.magneto) {
            write!(out, ",{}", v)?;
        }
        write!(
            out,
            ",{},{},{},{},{},{},{},{},{},{}",
            self.barometer.pressure,
            self.barometer.temperature,
            self.combustion_chamber.pressure,
            self.oxidizer_tank.pressure,
            self.gps.utc_time,
            self.gps.latitude_udeg,
            self.gps.longitude_udeg,
            self.gps.altitude_mm,
            self.gps.satellites,
            self.gps.quality,
        )
    }
}

impl SensorRecords {
    /// Copy each record under its own lock, one at a time.
    ///
    /// No two locks are ever held together, so fields from different
    /// records may be from slightly different instants.
    pub async fn snapshot(&self, wait: Wait) -> Result<TelemetrySnapshot, AccessError> {
        Ok(TelemetrySnapshot {
            uptime_ms: Instant::now().as_millis(),
            phase: self.phase.snapshot(wait).await?,
            imu: self.imu.snapshot(wait).await?,
            barometer: self.barometer.snapshot(wait).await?,
            combustion_chamber: self.combustion_chamber.snapshot(wait).await?,
            oxidizer_tank: self.oxidizer_tank.snapshot(wait).await?,
            gps: self.gps.read_with(wait, |gps| gps.fix).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::*;

    #[test]
    fn test_snapshot_of_fresh_records_has_sentinels() {
        let records = SensorRecords::new();
        let snap = block_on(records.snapshot(Wait::Poll)).unwrap();
        assert_eq!(snap.phase, FlightPhase::Prelaunch);
        assert_eq!(snap.imu, ImuRecord::new());
        assert_eq!(snap.combustion_chamber.pressure, -12);
        assert_eq!(snap.oxidizer_tank.pressure, -17);
        assert_eq!(snap.gps, GpsFix::new());
    }

    #[test]
    fn test_snapshot_reports_busy_record() {
        let records = SensorRecords::new();
        let _held = records.barometer.try_acquire().unwrap();
        assert_eq!(
            block_on(records.snapshot(Wait::Poll)),
            Err(AccessError::Busy)
        );
        assert_eq!(
            block_on(records.snapshot(Wait::millis(2))),
            Err(AccessError::Timeout)
        );
    }

    #[test]
    fn test_csv_line() {
        let records = SensorRecords::new();
        records.phase.try_publish(FlightPhase::Burn).unwrap();
        records.gps.try_acquire().unwrap().fix.satellites = 7;

        let mut snap = block_on(records.snapshot(Wait::Poll)).unwrap();
        snap.uptime_ms = 1500;

        let mut line = heapless::String::<256>::new();
        snap.write_csv(&mut line).unwrap();
        assert_eq!(
            line.as_str(),
            "1500,2,-1,-2,-3,-4,-5,-6,-7,-8,-9,-10,-11,-12,-17,0,0,0,0,7,0"
        );
        assert_eq!(
            line.split(',').count(),
            CSV_HEADER.split(',').count()
        );
    }

    #[test]
    fn test_widest_csv_line_fits() {
        let snap = TelemetrySnapshot {
            uptime_ms: u64::MAX,
            phase: FlightPhase::Abort,
            imu: ImuRecord {
                accel: [i32::MIN; 3],
                gyro: [i32::MIN; 3],
                magneto: [i32::MIN; 3],
            },
            barometer: BarometerRecord {
                pressure: i32::MIN,
                temperature: i32::MIN,
            },
            combustion_chamber: PressureRecord::new(i32::MIN),
            oxidizer_tank: PressureRecord::new(i32::MIN),
            gps: GpsFix {
                utc_time: u32::MAX,
                latitude_udeg: i32::MIN,
                longitude_udeg: i32::MIN,
                altitude_mm: i32::MIN,
                satellites: u8::MAX,
                quality: u8::MAX,
            },
        };

        let mut line = heapless::String::<CSV_LINE_MAX>::new();
        snap.write_csv(&mut line).unwrap();
        assert_eq!(line.len(), CSV_LINE_MAX);
    }
}
