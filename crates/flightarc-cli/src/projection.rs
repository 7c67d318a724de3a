//! Ellipsoidal Lambert conformal conic projection for the North America map.

use flightarc_core::{Ellipsoid, GeoPoint, PlotPoint, Projection};

// Keeps the south pole, where the cone radius diverges, just inside the map.
const MIN_LATITUDE: f64 = -89.999_999;

/// Parameters of the conic and the map window around its origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConicParams {
    pub standard_parallel_1: f64,
    pub standard_parallel_2: f64,
    pub origin_lat: f64,
    pub central_meridian: f64,
    pub width_m: f64,
    pub height_m: f64,
}

impl Default for ConicParams {
    fn default() -> Self {
        Self {
            standard_parallel_1: 0.0,
            standard_parallel_2: 10.0,
            origin_lat: 43.0,
            central_meridian: -105.0,
            width_m: 12_000_000.0,
            height_m: 8_000_000.0,
        }
    }
}

/// Output coordinates are map meters with the lower-left corner at (0, 0).
#[derive(Debug, Clone, Copy)]
pub struct LambertConformalConic {
    params: ConicParams,
    a: f64,
    e: f64,
    n: f64,
    af: f64,
    rho0: f64,
}

impl LambertConformalConic {
    pub fn new(ellipsoid: Ellipsoid, params: ConicParams) -> Self {
        let a = ellipsoid.a;
        let e = ellipsoid.eccentricity_sq().sqrt();
        let phi1 = params.standard_parallel_1.to_radians();
        let phi2 = params.standard_parallel_2.to_radians();

        let m1 = m(phi1, e);
        let t1 = t(phi1, e);
        let n = if (phi1 - phi2).abs() < 1e-10 {
            phi1.sin()
        } else {
            (m1.ln() - m(phi2, e).ln()) / (t1.ln() - t(phi2, e).ln())
        };
        let af = a * m1 / (n * t1.powf(n));
        let rho0 = af * t(params.origin_lat.to_radians(), e).powf(n);

        Self {
            params,
            a,
            e,
            n,
            af,
            rho0,
        }
    }

    pub fn north_america(ellipsoid: Ellipsoid) -> Self {
        Self::new(ellipsoid, ConicParams::default())
    }

    pub fn params(&self) -> &ConicParams {
        &self.params
    }

    /// Map extent in meters as (width, height).
    pub fn extent(&self) -> (f64, f64) {
        (self.params.width_m, self.params.height_m)
    }

    /// Scale factor along the parallel at `lat`; 1 on the standard parallels.
    pub fn scale_factor(&self, lat: f64) -> f64 {
        let phi = lat.to_radians();
        let rho = self.af * t(phi, self.e).powf(self.n);
        rho * self.n / (self.a * m(phi, self.e))
    }
}

fn m(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    phi.cos() / (1.0 - es * es).sqrt()
}

fn t(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    (std::f64::consts::FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - es) / (1.0 + es)).powf(e / 2.0)
}

impl Projection for LambertConformalConic {
    fn project_point(&self, point: GeoPoint) -> PlotPoint {
        let phi = point.lat.clamp(MIN_LATITUDE, 90.0).to_radians();
        let mut dlon = point.lon - self.params.central_meridian;
        if dlon > 180.0 {
            dlon -= 360.0;
        } else if dlon < -180.0 {
            dlon += 360.0;
        }

        let rho = self.af * t(phi, self.e).powf(self.n);
        let theta = self.n * dlon.to_radians();
        PlotPoint::new(
            rho * theta.sin() + self.params.width_m / 2.0,
            self.rho0 - rho * theta.cos() + self.params.height_m / 2.0,
        )
    }
}
