//! Fixed transverse Mercator projection for the SVY21 grid.
//!
//! SVY21 is the Singapore survey grid: a transverse Mercator projection on the
//! WGS84 ellipsoid with its origin at 1°22'N 103°50'E, unit scale factor and a
//! false origin of (28001.642 E, 38744.572 N) metres. The parameters are
//! constants; there is no runtime configuration.
//!
//! Forward and inverse use the Redfearn series, which agree to well under a
//! millimetre over the whole grid.

use geo::Point;
use once_cell::sync::Lazy;

/// WGS84 semi-major axis in metres.
pub const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const FLATTENING: f64 = 1.0 / 298.257_223_563;
pub const ORIGIN_LATITUDE: f64 = 1.0 + 22.0 / 60.0;
pub const ORIGIN_LONGITUDE: f64 = 103.0 + 50.0 / 60.0;
pub const FALSE_NORTHING: f64 = 38_744.572;
pub const FALSE_EASTING: f64 = 28_001.642;
pub const SCALE_FACTOR: f64 = 1.0;

static SVY21: Lazy<TransverseMercator> = Lazy::new(|| {
    TransverseMercator::new(
        SEMI_MAJOR_AXIS,
        FLATTENING,
        ORIGIN_LATITUDE,
        ORIGIN_LONGITUDE,
        FALSE_NORTHING,
        FALSE_EASTING,
        SCALE_FACTOR,
    )
});

/// Convert SVY21 grid coordinates to WGS84.
///
/// Returns a point with `x = longitude` and `y = latitude` in degrees.
///
/// # Examples
///
/// ```
/// use regionheat::compute::projection::{svy21_to_wgs84, FALSE_EASTING, FALSE_NORTHING};
///
/// let origin = svy21_to_wgs84(FALSE_EASTING, FALSE_NORTHING);
/// assert!((origin.x() - 103.833_333).abs() < 1e-6);
/// assert!((origin.y() - 1.366_667).abs() < 1e-6);
/// ```
pub fn svy21_to_wgs84(easting: f64, northing: f64) -> Point<f64> {
    let (lng, lat) = SVY21.inverse(easting, northing);
    Point::new(lng, lat)
}

/// Convert WGS84 longitude/latitude (degrees) to SVY21 grid coordinates.
///
/// Returns a point with `x = easting` and `y = northing` in metres.
pub fn wgs84_to_svy21(lng: f64, lat: f64) -> Point<f64> {
    let (easting, northing) = SVY21.forward(lng, lat);
    Point::new(easting, northing)
}

/// Transverse Mercator projection with precomputed series coefficients.
#[derive(Debug, Clone)]
struct TransverseMercator {
    a: f64,
    b: f64,
    e2: f64,
    origin_lon: f64,
    false_northing: f64,
    false_easting: f64,
    k: f64,
    // Meridian distance series
    a0: f64,
    a2: f64,
    a4: f64,
    a6: f64,
    // Meridian distance at the origin latitude
    m0: f64,
}

impl TransverseMercator {
    fn new(
        a: f64,
        f: f64,
        origin_lat: f64,
        origin_lon: f64,
        false_northing: f64,
        false_easting: f64,
        k: f64,
    ) -> Self {
        let b = a * (1.0 - f);
        let e2 = 2.0 * f - f * f;
        let e4 = e2 * e2;
        let e6 = e4 * e2;

        let mut tm = Self {
            a,
            b,
            e2,
            origin_lon,
            false_northing,
            false_easting,
            k,
            a0: 1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0,
            a2: 3.0 / 8.0 * (e2 + e4 / 4.0 + 15.0 * e6 / 128.0),
            a4: 15.0 / 256.0 * (e4 + 3.0 * e6 / 4.0),
            a6: 35.0 * e6 / 3072.0,
            m0: 0.0,
        };
        tm.m0 = tm.meridian_distance(origin_lat);
        tm
    }

    fn meridian_distance(&self, lat: f64) -> f64 {
        let r = lat.to_radians();
        self.a
            * (self.a0 * r - self.a2 * (2.0 * r).sin() + self.a4 * (4.0 * r).sin()
                - self.a6 * (6.0 * r).sin())
    }

    /// Radius of curvature in the meridian.
    fn rho(&self, sin2: f64) -> f64 {
        self.a * (1.0 - self.e2) / (1.0 - self.e2 * sin2).powf(1.5)
    }

    /// Radius of curvature in the prime vertical.
    fn nu(&self, sin2: f64) -> f64 {
        self.a / (1.0 - self.e2 * sin2).sqrt()
    }

    fn forward(&self, lng: f64, lat: f64) -> (f64, f64) {
        let lat_r = lat.to_radians();
        let sin_lat = lat_r.sin();
        let sin2 = sin_lat * sin_lat;
        let cos_lat = lat_r.cos();
        let cos2 = cos_lat * cos_lat;
        let cos3 = cos2 * cos_lat;
        let cos4 = cos3 * cos_lat;
        let cos5 = cos4 * cos_lat;
        let cos6 = cos5 * cos_lat;
        let cos7 = cos6 * cos_lat;

        let rho = self.rho(sin2);
        let nu = self.nu(sin2);
        let psi = nu / rho;
        let t = lat_r.tan();
        let w = (lng - self.origin_lon).to_radians();
        let m = self.meridian_distance(lat);

        let (w2, w4, w6, w8) = (w.powi(2), w.powi(4), w.powi(6), w.powi(8));
        let (psi2, psi3, psi4) = (psi.powi(2), psi.powi(3), psi.powi(4));
        let (t2, t4, t6) = (t.powi(2), t.powi(4), t.powi(6));

        let n1 = w2 / 2.0 * nu * sin_lat * cos_lat;
        let n2 = w4 / 24.0 * nu * sin_lat * cos3 * (4.0 * psi2 + psi - t2);
        let n3 = w6 / 720.0
            * nu
            * sin_lat
            * cos5
            * (8.0 * psi4 * (11.0 - 24.0 * t2) - 28.0 * psi3 * (1.0 - 6.0 * t2)
                + psi2 * (1.0 - 32.0 * t2)
                - psi * 2.0 * t2
                + t4);
        let n4 = w8 / 40320.0 * nu * sin_lat * cos7 * (1385.0 - 3111.0 * t2 + 543.0 * t4 - t6);
        let northing = self.false_northing + self.k * (m - self.m0 + n1 + n2 + n3 + n4);

        let e1 = w2 / 6.0 * cos2 * (psi - t2);
        let e2 = w4 / 120.0
            * cos4
            * (4.0 * psi3 * (1.0 - 6.0 * t2) + psi2 * (1.0 + 8.0 * t2) - psi * 2.0 * t2 + t4);
        let e3 = w6 / 5040.0 * cos6 * (61.0 - 479.0 * t2 + 179.0 * t4 - t6);
        let easting = self.false_easting + self.k * nu * w * cos_lat * (1.0 + e1 + e2 + e3);

        (easting, northing)
    }

    fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let n_prime = northing - self.false_northing;
        let m_prime = self.m0 + n_prime / self.k;

        let n = (self.a - self.b) / (self.a + self.b);
        let (n2, n3, n4) = (n.powi(2), n.powi(3), n.powi(4));
        let g = self.a
            * (1.0 - n)
            * (1.0 - n2)
            * (1.0 + 9.0 * n2 / 4.0 + 225.0 * n4 / 64.0)
            * (std::f64::consts::PI / 180.0);
        let sigma = m_prime.to_radians() / g;

        // Foot-point latitude
        let lat_prime = sigma
            + (3.0 * n / 2.0 - 27.0 * n3 / 32.0) * (2.0 * sigma).sin()
            + (21.0 * n2 / 16.0 - 55.0 * n4 / 32.0) * (4.0 * sigma).sin()
            + (151.0 * n3 / 96.0) * (6.0 * sigma).sin()
            + (1097.0 * n4 / 512.0) * (8.0 * sigma).sin();

        let sin_lat = lat_prime.sin();
        let sin2 = sin_lat * sin_lat;
        let rho = self.rho(sin2);
        let nu = self.nu(sin2);
        let psi = nu / rho;
        let (psi2, psi3, psi4) = (psi.powi(2), psi.powi(3), psi.powi(4));
        let sec_lat = 1.0 / lat_prime.cos();
        let t = lat_prime.tan();
        let (t2, t4, t6) = (t.powi(2), t.powi(4), t.powi(6));

        let e_prime = easting - self.false_easting;
        let x = e_prime / (self.k * nu);
        let (x3, x5, x7) = (x.powi(3), x.powi(5), x.powi(7));

        let lat_factor = t / (self.k * rho);
        let lat1 = lat_factor * (e_prime * x / 2.0);
        let lat2 = lat_factor
            * (e_prime * x3 / 24.0)
            * (-4.0 * psi2 + 9.0 * psi * (1.0 - t2) + 12.0 * t2);
        let lat3 = lat_factor
            * (e_prime * x5 / 720.0)
            * (8.0 * psi4 * (11.0 - 24.0 * t2) - 12.0 * psi3 * (21.0 - 71.0 * t2)
                + 15.0 * psi2 * (15.0 - 98.0 * t2 + 15.0 * t4)
                + 180.0 * psi * (5.0 * t2 - 3.0 * t4)
                + 360.0 * t4);
        let lat4 = lat_factor
            * (e_prime * x7 / 40320.0)
            * (1385.0 + 3633.0 * t2 + 4095.0 * t4 + 1575.0 * t6);
        let lat = lat_prime - lat1 + lat2 - lat3 + lat4;

        let lon1 = x * sec_lat;
        let lon2 = x3 * sec_lat / 6.0 * (psi + 2.0 * t2);
        let lon3 = x5 * sec_lat / 120.0
            * (-4.0 * psi3 * (1.0 - 6.0 * t2) + psi2 * (9.0 - 68.0 * t2) + 72.0 * psi * t2
                + 24.0 * t4);
        let lon4 = x7 * sec_lat / 5040.0 * (61.0 + 662.0 * t2 + 1320.0 * t4 + 720.0 * t6);
        let lon = self.origin_lon.to_radians() + lon1 - lon2 + lon3 - lon4;

        (lon.to_degrees(), lat.to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_false_origin() {
        let grid = wgs84_to_svy21(ORIGIN_LONGITUDE, ORIGIN_LATITUDE);
        assert!((grid.x() - FALSE_EASTING).abs() < 1e-6);
        assert!((grid.y() - FALSE_NORTHING).abs() < 1e-6);

        let geo = svy21_to_wgs84(FALSE_EASTING, FALSE_NORTHING);
        assert!((geo.x() - ORIGIN_LONGITUDE).abs() < 1e-9);
        assert!((geo.y() - ORIGIN_LATITUDE).abs() < 1e-9);
    }

    #[test]
    fn test_grid_scale_near_origin() {
        // One hundredth of a degree north is about 1105.8 m near the equator
        let north = wgs84_to_svy21(ORIGIN_LONGITUDE, ORIGIN_LATITUDE + 0.01);
        let dn = north.y() - FALSE_NORTHING;
        assert!((1100.0..1112.0).contains(&dn), "northing delta {}", dn);
        assert!((north.x() - FALSE_EASTING).abs() < 1e-3);

        // And one hundredth of a degree east about 1113.2 m
        let east = wgs84_to_svy21(ORIGIN_LONGITUDE + 0.01, ORIGIN_LATITUDE);
        let de = east.x() - FALSE_EASTING;
        assert!((1108.0..1118.0).contains(&de), "easting delta {}", de);
    }

    #[test]
    fn test_forward_inverse_round_trip() {
        let samples = [
            (103.6189, 1.2214),
            (103.8198, 1.3521),
            (103.9915, 1.3644),
            (104.0405, 1.4255),
            (103.7065, 1.4612),
        ];
        for (lng, lat) in samples {
            let grid = wgs84_to_svy21(lng, lat);
            let back = svy21_to_wgs84(grid.x(), grid.y());
            // 1e-7 degrees is roughly a centimetre
            assert!((back.x() - lng).abs() < 1e-7, "lng {} -> {}", lng, back.x());
            assert!((back.y() - lat).abs() < 1e-7, "lat {} -> {}", lat, back.y());
        }
    }

    #[test]
    fn test_inverse_forward_round_trip() {
        for (e, n) in [(1000.0, 20000.0), (30000.0, 30000.0), (45000.0, 50000.0)] {
            let geo = svy21_to_wgs84(e, n);
            let grid = wgs84_to_svy21(geo.x(), geo.y());
            assert!((grid.x() - e).abs() < 0.05);
            assert!((grid.y() - n).abs() < 0.05);
        }
    }
}
