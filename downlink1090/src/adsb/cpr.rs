//! Compact Position Reporting
//!
//! Latitude and longitude are reported using two alternating messages
//! (called even and odd). The original position can be recovered two ways:
//!
//! - global: needs an even/odd pair received close together, but might fail
//!   if the messages are from different zones.
//! - local: needs one message and a recent reference position.
//!   - airborne: the reference needs to be within 180 NM of the actual
//!     position.
//!   - surface: the reference needs to be within 45 NM of the actual
//!     position.
//!
//! Surface messages encode the position into a quarter of the angular range,
//! so globally decoded surface positions are fourfold ambiguous and need a
//! reference to pick the right solution.
//!
//! <https://mode-s.org/1090mhz/content/ads-b/3-airborne-position.html>

use std::ops::Not;

pub use self::decode::{
    decode_globally_unambiguous,
    decode_locally_unambiguous,
    n_l,
};
use crate::frame::VerticalStatus;

/// Pairing and reference validity window in milliseconds.
pub fn pairing_window(vertical_status: VerticalStatus) -> u64 {
    match vertical_status {
        VerticalStatus::Airborne => 10_000,
        VerticalStatus::Ground => 50_000,
    }
}

/// Maximum distance between a locally decoded position and its reference.
pub fn local_range_nm(vertical_status: VerticalStatus) -> f64 {
    match vertical_status {
        VerticalStatus::Airborne => 180.0,
        VerticalStatus::Ground => 45.0,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cpr {
    pub format: CprFormat,
    pub latitude: CprValue,
    pub longitude: CprValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CprFormat {
    Even,
    Odd,
}

impl CprFormat {
    /// Returns the CPR format from the boolean value of the bit in the
    /// respective fields.
    pub fn from_bit(bit: bool) -> Self {
        if bit { CprFormat::Odd } else { CprFormat::Even }
    }

    /// The returned boolean corresponds to the value of the bit encoded in
    /// the frames.
    pub fn as_bit(&self) -> bool {
        matches!(self, CprFormat::Odd)
    }

    pub fn other(&self) -> Self {
        match self {
            Self::Even => Self::Odd,
            Self::Odd => Self::Even,
        }
    }
}

impl Not for CprFormat {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.other()
    }
}

/// 17 bit encoded latitude/longitude
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CprValue(u32);

impl CprValue {
    pub const fn from_u32_unchecked(word: u32) -> Self {
        Self(word)
    }

    pub const fn from_u32(word: u32) -> Option<Self> {
        if word & 0xfffe0000 == 0 {
            Some(Self(word))
        }
        else {
            None
        }
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// A decoded WGS84 latitude/longitude pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodedPosition {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum CprDecodeError {
    #[error("messages must be from the same longitude zone")]
    MessagesFromDifferentLongitudeZones { nl_lat_even: f64, nl_lat_odd: f64 },

    #[error("surface positions cannot be decoded globally without a reference")]
    NoSurfaceReference,
}

mod decode {
    use std::f64::consts::{
        FRAC_PI_2,
        PI,
        TAU,
    };

    use super::{
        Cpr,
        CprDecodeError,
        CprFormat,
        CprValue,
        DecodedPosition,
    };
    use crate::frame::VerticalStatus;

    const N_Z: f64 = 15.0;

    // floor(x) = x.floor()
    // mod(x, y) = x.rem_euclid(y)
    // arccos(x) = x.acos()

    /// Number of longitude zones at a latitude.
    pub fn n_l(lat: f64) -> f64 {
        if lat == 0.0 {
            59.0
        }
        else if lat == 87.0 || lat == -87.0 {
            2.0
        }
        else if lat > 87.0 || lat < -87.0 {
            1.0
        }
        else {
            let a = 1.0 - (FRAC_PI_2 / N_Z).cos();
            let b = (PI * lat / 180.0).cos().powi(2);
            (TAU / (1.0 - a / b).acos()).floor()
        }
    }

    /// scale cpr latitude longitude to a fraction [0, 1]
    #[inline(always)]
    fn fraction(x: CprValue) -> f64 {
        (x.0 as f64) / 131072.0
    }

    /// The surface angular range is a quarter of the airborne one.
    fn angle_range(vertical_status: VerticalStatus) -> f64 {
        match vertical_status {
            VerticalStatus::Airborne => 360.0,
            VerticalStatus::Ground => 90.0,
        }
    }

    /// Picks the surface solution closest to the reference out of
    /// `base + k * step`.
    fn closest_to(reference: f64, base: f64, step: f64, solutions: u32) -> f64 {
        let mut best = base;
        for k in 1..solutions {
            let mut candidate = base + f64::from(k) * step;
            if candidate >= 180.0 {
                candidate -= 360.0;
            }
            if (candidate - reference).abs() < (best - reference).abs() {
                best = candidate;
            }
        }
        best
    }

    /// Decode an even and an odd CPR into latitude and longitude in degrees.
    ///
    /// This might fail if the CPRs are from different zones. If you don't
    /// have both CPRs or if this fails, [`decode_locally_unambiguous`] works
    /// with a single message and a reference.
    ///
    /// Surface decoding always needs a reference to pick among the fourfold
    /// ambiguous solutions.
    pub fn decode_globally_unambiguous(
        even: &Cpr,
        odd: &Cpr,
        most_recent: CprFormat,
        vertical_status: VerticalStatus,
        reference: Option<&DecodedPosition>,
    ) -> Result<DecodedPosition, CprDecodeError> {
        let range = angle_range(vertical_status);
        let d_lat_even = range / (4.0 * N_Z);
        let d_lat_odd = range / (4.0 * N_Z - 1.0);

        let lat_cpr_even = fraction(even.latitude);
        let lat_cpr_odd = fraction(odd.latitude);

        // latitude zone index
        let j = (59.0 * lat_cpr_even - 60.0 * lat_cpr_odd + 0.5).floor();

        let mut lat_even = d_lat_even * (j.rem_euclid(60.0) + lat_cpr_even);
        let mut lat_odd = d_lat_odd * (j.rem_euclid(59.0) + lat_cpr_odd);

        let reference = match vertical_status {
            VerticalStatus::Airborne => None,
            VerticalStatus::Ground => Some(reference.ok_or(CprDecodeError::NoSurfaceReference)?),
        };

        if let Some(reference) = reference {
            // northern and southern hemisphere solution
            lat_even = closest_to(reference.latitude, lat_even - 90.0, 90.0, 2);
            lat_odd = closest_to(reference.latitude, lat_odd - 90.0, 90.0, 2);
        }
        else {
            if lat_even >= 270.0 {
                lat_even -= 360.0;
            }
            if lat_odd >= 270.0 {
                lat_odd -= 360.0;
            }
        }

        let nl_lat_even = n_l(lat_even);
        let nl_lat_odd = n_l(lat_odd);

        if nl_lat_even != nl_lat_odd {
            return Err(CprDecodeError::MessagesFromDifferentLongitudeZones {
                nl_lat_even,
                nl_lat_odd,
            });
        }

        let (lat, nl_lat) = match most_recent {
            CprFormat::Even => (lat_even, nl_lat_even),
            CprFormat::Odd => (lat_odd, nl_lat_odd),
        };

        let lon_cpr_even = fraction(even.longitude);
        let lon_cpr_odd = fraction(odd.longitude);

        // longitude zone index
        let m = (lon_cpr_even * (nl_lat - 1.0) - lon_cpr_odd * nl_lat + 0.5).floor();

        // number of longitude zones
        let n_even = nl_lat.max(1.0);
        let n_odd = (nl_lat - 1.0).max(1.0);

        // size of longitude zones
        let d_lon_even = range / n_even;
        let d_lon_odd = range / n_odd;

        let lon_even = d_lon_even * (m.rem_euclid(n_even) + lon_cpr_even);
        let lon_odd = d_lon_odd * (m.rem_euclid(n_odd) + lon_cpr_odd);

        let mut lon = match most_recent {
            CprFormat::Even => lon_even,
            CprFormat::Odd => lon_odd,
        };

        if let Some(reference) = reference {
            // the encoded longitude repeats every quarter turn
            lon = closest_to(reference.longitude, lon - 180.0, 90.0, 4);
        }
        else if lon >= 180.0 {
            lon -= 360.0;
        }

        Ok(DecodedPosition {
            latitude: lat,
            longitude: lon,
        })
    }

    /// Decode a single CPR using a reference position.
    ///
    /// This always yields a position, but it is only correct if the
    /// reference is close (180 NM airborne, 45 NM surface).
    pub fn decode_locally_unambiguous(
        cpr: &Cpr,
        reference: &DecodedPosition,
        vertical_status: VerticalStatus,
    ) -> DecodedPosition {
        let range = angle_range(vertical_status);
        let i = match cpr.format {
            CprFormat::Even => 0.0,
            CprFormat::Odd => 1.0,
        };

        let lat_ref = reference.latitude;
        let lon_ref = reference.longitude;

        let lat_cpr = fraction(cpr.latitude);
        let lon_cpr = fraction(cpr.longitude);

        let d_lat = range / (4.0 * N_Z - i);

        // latitude zone index
        let j =
            (lat_ref / d_lat).floor() + (lat_ref.rem_euclid(d_lat) / d_lat - lat_cpr + 0.5).floor();

        let lat = d_lat * (j + lat_cpr);

        let d_lon = range / (n_l(lat) - i).max(1.0);

        // longitude zone index
        let m =
            (lon_ref / d_lon).floor() + (lon_ref.rem_euclid(d_lon) / d_lon - lon_cpr + 0.5).floor();

        let lon = d_lon * (m + lon_cpr);

        DecodedPosition {
            latitude: lat,
            longitude: lon,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct CprSample {
    cpr: Cpr,
    vertical_status: VerticalStatus,
    timestamp: u64,
}

#[derive(Clone, Copy, Debug)]
struct TimedFix {
    position: DecodedPosition,
    timestamp: u64,
}

/// Per-aircraft CPR pairing cell.
///
/// Holds the most recent even and odd sample, pairs them for global decoding
/// when they are close enough together, and falls back to local decoding
/// against a recent own fix or a supplied receiver position.
#[derive(Clone, Copy, Debug, Default)]
pub struct PositionDecoder {
    even: Option<CprSample>,
    odd: Option<CprSample>,
    last_fix: Option<TimedFix>,
}

impl PositionDecoder {
    /// Push a CPR value and try to decode it. Timestamps are milliseconds.
    ///
    /// Globally decoded positions further than `max_global_jump_nm` from the
    /// previous fix are rejected as unreasonable.
    pub fn decode(
        &mut self,
        cpr: Cpr,
        vertical_status: VerticalStatus,
        timestamp: u64,
        receiver: Option<&DecodedPosition>,
        max_global_jump_nm: f64,
    ) -> Option<DecodedPosition> {
        let window = pairing_window(vertical_status);

        // store the sample, newest wins
        let bin = match cpr.format {
            CprFormat::Even => &mut self.even,
            CprFormat::Odd => &mut self.odd,
        };
        if let Some(sample) = bin {
            if timestamp < sample.timestamp {
                return None;
            }
        }
        *bin = Some(CprSample {
            cpr,
            vertical_status,
            timestamp,
        });

        let other = match cpr.format {
            CprFormat::Even => self.odd,
            CprFormat::Odd => self.even,
        };

        let reference = self
            .last_fix
            .filter(|fix| timestamp.saturating_sub(fix.timestamp) <= window)
            .map(|fix| fix.position)
            .or_else(|| receiver.copied());

        if let Some(other) = other {
            if other.vertical_status == vertical_status
                && timestamp.saturating_sub(other.timestamp) <= window
            {
                let most_recent = if timestamp >= other.timestamp {
                    cpr.format
                }
                else {
                    other.cpr.format
                };
                let (even, odd) = match cpr.format {
                    CprFormat::Even => (&cpr, &other.cpr),
                    CprFormat::Odd => (&other.cpr, &cpr),
                };

                if let Ok(position) = decode_globally_unambiguous(
                    even,
                    odd,
                    most_recent,
                    vertical_status,
                    reference.as_ref(),
                ) {
                    if let Some(fix) = &self.last_fix {
                        if haversine_nm(&fix.position, &position) > max_global_jump_nm {
                            return None;
                        }
                    }
                    self.last_fix = Some(TimedFix {
                        position,
                        timestamp,
                    });
                    return Some(position);
                }
            }
        }

        let reference = reference?;
        let position = decode_locally_unambiguous(&cpr, &reference, vertical_status);
        if haversine_nm(&reference, &position) > local_range_nm(vertical_status) {
            return None;
        }

        self.last_fix = Some(TimedFix {
            position,
            timestamp,
        });
        Some(position)
    }
}

const EARTH_RADIUS_NM: f64 = 3440.07;

/// Great-circle distance in nautical miles.
pub fn haversine_nm(a: &DecodedPosition, b: &DecodedPosition) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    EARTH_RADIUS_NM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use crate::{
        adsb::cpr::{
            Cpr,
            CprFormat,
            CprValue,
            DecodedPosition,
            PositionDecoder,
            decode_globally_unambiguous,
            decode_locally_unambiguous,
            haversine_nm,
        },
        frame::VerticalStatus,
    };

    fn even() -> Cpr {
        Cpr {
            format: CprFormat::Even,
            latitude: CprValue::from_u32_unchecked(93000),
            longitude: CprValue::from_u32_unchecked(51372),
        }
    }

    fn odd() -> Cpr {
        Cpr {
            format: CprFormat::Odd,
            latitude: CprValue::from_u32_unchecked(74158),
            longitude: CprValue::from_u32_unchecked(50194),
        }
    }

    #[test]
    fn it_decodes_globally_airborne() {
        let DecodedPosition {
            latitude,
            longitude,
        } = decode_globally_unambiguous(
            &even(),
            &odd(),
            CprFormat::Even,
            VerticalStatus::Airborne,
            None,
        )
        .unwrap();

        assert_abs_diff_eq!(latitude, 52.25720, epsilon = 0.001);
        assert_abs_diff_eq!(longitude, 3.91937, epsilon = 0.001);
    }

    #[test]
    fn it_decodes_locally_airborne() {
        let reference = DecodedPosition {
            latitude: 52.258,
            longitude: 3.918,
        };

        let DecodedPosition {
            latitude,
            longitude,
        } = decode_locally_unambiguous(&even(), &reference, VerticalStatus::Airborne);

        assert_abs_diff_eq!(latitude, 52.25720, epsilon = 0.001);
        assert_abs_diff_eq!(longitude, 3.91937, epsilon = 0.001);
    }

    #[test]
    fn it_decodes_globally_surface_with_a_reference() {
        // same encoded coordinates read as a surface pair: a quarter of the
        // angular range
        assert!(
            decode_globally_unambiguous(
                &even(),
                &odd(),
                CprFormat::Even,
                VerticalStatus::Ground,
                None,
            )
            .is_err()
        );

        let reference = DecodedPosition {
            latitude: 13.0,
            longitude: 0.5,
        };
        let DecodedPosition {
            latitude,
            longitude,
        } = decode_globally_unambiguous(
            &even(),
            &odd(),
            CprFormat::Even,
            VerticalStatus::Ground,
            Some(&reference),
        )
        .unwrap();

        assert_abs_diff_eq!(latitude, 52.25720 / 4.0, epsilon = 0.01);
        assert_abs_diff_eq!(longitude, 0.608, epsilon = 0.01);
    }

    #[test]
    fn it_pairs_even_and_odd_within_the_window() {
        let mut decoder = PositionDecoder::default();

        assert!(
            decoder
                .decode(odd(), VerticalStatus::Airborne, 0, None, 50.0)
                .is_none()
        );
        let position = decoder
            .decode(even(), VerticalStatus::Airborne, 1000, None, 50.0)
            .unwrap();

        assert_abs_diff_eq!(position.latitude, 52.25720, epsilon = 0.001);
        assert_abs_diff_eq!(position.longitude, 3.91937, epsilon = 0.001);
    }

    #[test]
    fn it_does_not_pair_across_the_window() {
        let mut decoder = PositionDecoder::default();

        assert!(
            decoder
                .decode(odd(), VerticalStatus::Airborne, 0, None, 50.0)
                .is_none()
        );
        assert!(
            decoder
                .decode(even(), VerticalStatus::Airborne, 20_000, None, 50.0)
                .is_none()
        );
    }

    #[test]
    fn it_decodes_locally_against_the_receiver() {
        let mut decoder = PositionDecoder::default();
        let receiver = DecodedPosition {
            latitude: 52.3,
            longitude: 4.0,
        };

        let position = decoder
            .decode(even(), VerticalStatus::Airborne, 0, Some(&receiver), 50.0)
            .unwrap();
        assert_abs_diff_eq!(position.latitude, 52.25720, epsilon = 0.001);
    }

    #[test]
    fn it_rejects_local_results_outside_the_surface_range() {
        // near the corner of the surface zone the decoded position ends up
        // more than 45 NM from the reference
        let mut decoder = PositionDecoder::default();
        let receiver = DecodedPosition {
            latitude: 13.8,
            longitude: 1.358,
        };
        assert!(
            decoder
                .decode(even(), VerticalStatus::Ground, 0, Some(&receiver), 50.0)
                .is_none()
        );

        // a reference in the middle of the zone works
        let mut decoder = PositionDecoder::default();
        let receiver = DecodedPosition {
            latitude: 13.0,
            longitude: 0.5,
        };
        let position = decoder
            .decode(even(), VerticalStatus::Ground, 0, Some(&receiver), 50.0)
            .unwrap();
        assert_abs_diff_eq!(position.latitude, 13.0643, epsilon = 0.001);
        assert_abs_diff_eq!(position.longitude, 0.608, epsilon = 0.01);
    }

    #[test]
    fn it_rejects_unreasonable_global_jumps() {
        let mut decoder = PositionDecoder::default();

        decoder.decode(odd(), VerticalStatus::Airborne, 0, None, 50.0);
        assert!(
            decoder
                .decode(even(), VerticalStatus::Airborne, 1000, None, 50.0)
                .is_some()
        );

        // an even frame from a different latitude zone pairs into a position
        // hundreds of NM away and is dropped
        let jumped = Cpr {
            format: CprFormat::Even,
            latitude: CprValue::from_u32_unchecked(93000 + 6554),
            longitude: CprValue::from_u32_unchecked(51372),
        };
        assert!(
            decoder
                .decode(jumped, VerticalStatus::Airborne, 2000, None, 50.0)
                .is_none()
        );
    }

    #[test]
    fn haversine_is_sane() {
        let schiphol = DecodedPosition {
            latitude: 52.3105,
            longitude: 4.7683,
        };
        let heathrow = DecodedPosition {
            latitude: 51.4700,
            longitude: -0.4543,
        };

        let distance = haversine_nm(&schiphol, &heathrow);
        assert!((195.0..205.0).contains(&distance), "distance {distance}");
    }
}
