//! WGS 84 to UTM projection (transverse Mercator series expansion)

use crate::model::Crs;

const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;
const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Projects longitude/latitude degrees into one UTM zone, in metres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmProjection {
    zone: u8,
    north: bool,
    central_meridian: f64,
}

impl UtmProjection {
    /// Projection for the zone containing `(lon, lat)`
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn for_lon_lat(lon: f64, lat: f64) -> Self {
        let zone = (((lon + 180.0) / 6.0).floor() as i64 + 1).clamp(1, 60) as u8;
        Self::new(zone, lat >= 0.0)
    }

    pub fn new(zone: u8, north: bool) -> Self {
        let zone = zone.clamp(1, 60);
        Self {
            zone,
            north,
            central_meridian: f64::from(zone) * 6.0 - 183.0,
        }
    }

    pub fn zone(&self) -> u8 {
        self.zone
    }

    pub fn crs(&self) -> Crs {
        Crs::utm(self.zone, self.north)
    }

    /// Easting and northing of `(lon, lat)`
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let e2 = FLATTENING * (2.0 - FLATTENING);
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let ep2 = e2 / (1.0 - e2);

        let phi = lat.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = SEMI_MAJOR_AXIS / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let a = cos_phi * (lon - self.central_meridian).to_radians();

        // Meridional arc
        let m = SEMI_MAJOR_AXIS
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin());

        let x = SCALE_FACTOR
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0)
            + FALSE_EASTING;

        let mut y = SCALE_FACTOR
            * (m + n
                * tan_phi
                * (a * a / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));

        if !self.north {
            y += FALSE_NORTHING_SOUTH;
        }

        (x, y)
    }
}
