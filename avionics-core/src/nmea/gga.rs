//! `$GPGGA` decoding.
//!
//! ```text
//! $GPGGA,hhmmss.ss,ddmm.mmmm,N,dddmm.mmmm,E,q,ss,h.h,a.a,M,g.g,M,,*CS
//! ```
//!
//! Position is reported in micro-degrees and altitude in millimetres so the
//! whole fix stays integer.

use crate::record::{AccessError, GpsFix, GpsRecord, SharedRecord};
use crate::wait::Wait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GgaError {
    NotGga,
    BadChecksum { expected: u8, actual: u8 },
    MissingField(u8),
    BadField(u8),
    Record(AccessError),
}

impl From<AccessError> for GgaError {
    fn from(e: AccessError) -> Self {
        GgaError::Record(e)
    }
}

// Field indices after the sentence id.
const F_TIME: u8 = 1;
const F_LAT: u8 = 2;
const F_LAT_HEMI: u8 = 3;
const F_LON: u8 = 4;
const F_LON_HEMI: u8 = 5;
const F_QUALITY: u8 = 6;
const F_SATS: u8 = 7;
const F_ALT: u8 = 9;

/// Split off and verify the `*hh` trailer. Sentences without one pass.
pub fn validate_checksum(line: &[u8]) -> Result<&[u8], GgaError> {
    let body = line.strip_prefix(b"$").unwrap_or(line);
    let Some(star) = body.iter().position(|&b| b == b'*') else {
        return Ok(body);
    };
    let (payload, trailer) = body.split_at(star);
    let expected = match trailer.get(1..3) {
        Some(&[hi, lo]) => (hex(hi).ok_or(GgaError::BadField(0))? << 4)
            | hex(lo).ok_or(GgaError::BadField(0))?,
        _ => return Err(GgaError::BadField(0)),
    };
    let actual = payload.iter().fold(0u8, |acc, &b| acc ^ b);
    if expected != actual {
        return Err(GgaError::BadChecksum { expected, actual });
    }
    Ok(payload)
}

/// Decode one captured sentence.
pub fn parse(line: &[u8]) -> Result<GpsFix, GgaError> {
    let payload = validate_checksum(line)?;
    let mut fields = payload.split(|&b| b == b',');

    match fields.next() {
        Some(id) if id.len() == 5 && id.ends_with(b"GGA") => {}
        _ => return Err(GgaError::NotGga),
    }

    let mut raw: [&[u8]; 10] = [&[]; 10];
    for (slot, field) in raw.iter_mut().skip(1).zip(fields) {
        *slot = field;
    }

    let quality = raw[F_QUALITY as usize];
    if quality.is_empty() {
        return Err(GgaError::MissingField(F_QUALITY));
    }

    Ok(GpsFix {
        utc_time: integer(raw[F_TIME as usize], 0, F_TIME)?,
        latitude_udeg: coordinate(raw[F_LAT as usize], raw[F_LAT_HEMI as usize], b'S', F_LAT)?,
        longitude_udeg: coordinate(raw[F_LON as usize], raw[F_LON_HEMI as usize], b'W', F_LON)?,
        altitude_mm: integer(raw[F_ALT as usize], 3, F_ALT)?,
        satellites: integer(raw[F_SATS as usize], 0, F_SATS)?,
        quality: integer(quality, 0, F_QUALITY)?,
    })
}

/// Decode the record's pending sentence, if any, and store the fix.
///
/// The line is copied out under one short lock and written back under a
/// second, so the receive path is never held off while parsing.
pub async fn decode_pending(
    record: &SharedRecord<GpsRecord>,
    wait: Wait,
) -> Result<Option<GpsFix>, GgaError> {
    let Some(line) = record.acquire(wait).await?.take_line() else {
        return Ok(None);
    };
    let fix = parse(&line)?;
    record.acquire(wait).await?.fix = fix;
    Ok(Some(fix))
}

fn hex(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

/// Fixed-point decimal: `"545.4"` with `scale` 3 is `545400`. Extra
/// fractional digits are truncated. Empty reads as zero.
fn decimal(field: &[u8], scale: u32, index: u8) -> Result<i64, GgaError> {
    let (negative, digits) = match field.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, field),
    };

    let mut value: i64 = 0;
    let mut frac_digits: Option<u32> = None;
    for &b in digits {
        match b {
            b'.' if frac_digits.is_none() => frac_digits = Some(0),
            b'0'..=b'9' => {
                if let Some(n) = frac_digits {
                    if n == scale {
                        continue;
                    }
                    frac_digits = Some(n + 1);
                }
                value = value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add((b - b'0') as i64))
                    .ok_or(GgaError::BadField(index))?;
            }
            _ => return Err(GgaError::BadField(index)),
        }
    }

    let shift = scale - frac_digits.unwrap_or(0);
    let value = value
        .checked_mul(10i64.pow(shift))
        .ok_or(GgaError::BadField(index))?;
    Ok(if negative { -value } else { value })
}

fn integer<T: TryFrom<i64>>(field: &[u8], scale: u32, index: u8) -> Result<T, GgaError> {
    T::try_from(decimal(field, scale, index)?).map_err(|_| GgaError::BadField(index))
}

/// `ddmm.mmmm` / `dddmm.mmmm` to signed micro-degrees.
fn coordinate(field: &[u8], hemisphere: &[u8], negative: u8, index: u8) -> Result<i32, GgaError> {
    if field.is_empty() {
        return Ok(0);
    }
    // Minutes scaled by 1e6.
    let raw = decimal(field, 6, index)?;
    let degrees = raw / 100_000_000;
    let minutes = raw % 100_000_000;
    if minutes >= 60_000_000 {
        return Err(GgaError::BadField(index));
    }
    let udeg = degrees * 1_000_000 + minutes / 60;
    let udeg = match hemisphere {
        [h] if *h == negative => -udeg,
        _ => udeg,
    };
    i32::try_from(udeg).map_err(|_| GgaError::BadField(index))
}
