//! Ellipsoidal geodesics and partial great-circle paths.
//!
//! Distances and azimuths use Vincenty's formulae on the map's reference
//! ellipsoid. Coincident and antipodal endpoints have no unique bearing and
//! are resolved here; nothing in this module returns an error to the caller.

use std::f64::consts::PI;

use crate::models::GeoPoint;
use crate::rules::SimulationRules;

const TOLERANCE: f64 = 1e-12;
const MAX_ITERATIONS: usize = 200;
/// Degrees; endpoints closer than this are treated as the same point
const COINCIDENT_EPS_DEG: f64 = 1e-12;

/// Reference ellipsoid given by its semi-axes in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub a: f64,
    pub b: f64,
}

impl Ellipsoid {
    /// Clarke 1866, the default ellipsoid of the North American map projection.
    pub const CLARKE_1866: Ellipsoid = Ellipsoid {
        a: 6_378_206.4,
        b: 6_356_583.8,
    };

    pub const WGS84: Ellipsoid = Ellipsoid {
        a: 6_378_137.0,
        b: 6_356_752.314_245,
    };

    pub fn flattening(&self) -> f64 {
        (self.a - self.b) / self.a
    }

    /// First eccentricity squared, (a² - b²) / a².
    pub fn eccentricity_sq(&self) -> f64 {
        (self.a * self.a - self.b * self.b) / (self.a * self.a)
    }

    fn second_eccentricity_sq(&self) -> f64 {
        (self.a * self.a - self.b * self.b) / (self.b * self.b)
    }

    pub fn mean_radius(&self) -> f64 {
        (2.0 * self.a + self.b) / 3.0
    }

    /// Length of the meridian from pole to pole.
    pub fn half_meridian_m(&self) -> f64 {
        let (a_coef, _) = series_coefficients(self.second_eccentricity_sq());
        self.b * a_coef * PI
    }

    /// Solve the inverse problem: distance and initial azimuth from `p0` to `p1`.
    ///
    /// Coincident points give a zero distance with azimuth 0. Exact antipodes
    /// follow the meridian through the pole (azimuth 0, or 180 from the north
    /// pole). When the iteration does not converge the spherical solution on
    /// the mean radius is used instead.
    pub fn inverse(&self, p0: GeoPoint, p1: GeoPoint) -> Geodesic {
        if coincident(p0, p1) {
            return Geodesic {
                distance_m: 0.0,
                initial_azimuth_deg: 0.0,
            };
        }
        if antipodal(p0, p1) {
            let azimuth = if p0.lat >= 90.0 - COINCIDENT_EPS_DEG {
                180.0
            } else {
                0.0
            };
            return Geodesic {
                distance_m: self.half_meridian_m(),
                initial_azimuth_deg: azimuth,
            };
        }

        match self.vincenty_inverse(p0, p1) {
            Ok(geodesic) => geodesic,
            Err(err) => {
                tracing::debug!(
                    "Geodesic ({:.4}, {:.4}) -> ({:.4}, {:.4}) fell back to sphere: {:?}",
                    p0.lon,
                    p0.lat,
                    p1.lon,
                    p1.lat,
                    err
                );
                self.spherical_inverse(p0, p1)
            }
        }
    }

    fn vincenty_inverse(
        &self,
        p0: GeoPoint,
        p1: GeoPoint,
    ) -> Result<Geodesic, GeodesicComputationError> {
        let f = self.flattening();
        let l = wrap_radians((p1.lon - p0.lon).to_radians());
        let (sin_u1, cos_u1) = reduced_latitude(f, p0.lat.to_radians()).sin_cos();
        let (sin_u2, cos_u2) = reduced_latitude(f, p1.lat.to_radians()).sin_cos();

        let mut lambda = l;
        for _ in 0..MAX_ITERATIONS {
            let (sin_lambda, cos_lambda) = lambda.sin_cos();
            let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
                + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
            .sqrt();
            if sin_sigma == 0.0 {
                return Err(GeodesicComputationError::UndefinedBearing);
            }
            let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
            let sigma = sin_sigma.atan2(cos_sigma);
            let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
            let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
            // Equatorial lines have cos²α = 0
            let cos_2sigma_m = if cos_sq_alpha != 0.0 {
                cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
            } else {
                0.0
            };
            let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));

            let lambda_prev = lambda;
            lambda = l
                + (1.0 - c)
                    * f
                    * sin_alpha
                    * (sigma
                        + c * sin_sigma
                            * (cos_2sigma_m
                                + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

            if lambda.abs() > PI {
                return Err(GeodesicComputationError::NonConvergent);
            }
            if (lambda - lambda_prev).abs() < TOLERANCE {
                let u_sq = cos_sq_alpha * self.second_eccentricity_sq();
                let (a_coef, b_coef) = series_coefficients(u_sq);
                let d_sigma = delta_sigma(b_coef, sin_sigma, cos_sigma, cos_2sigma_m);
                let distance_m = self.b * a_coef * (sigma - d_sigma);

                let (sin_lambda, cos_lambda) = lambda.sin_cos();
                let azimuth =
                    (cos_u2 * sin_lambda).atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda);
                return Ok(Geodesic {
                    distance_m,
                    initial_azimuth_deg: normalize_azimuth(azimuth.to_degrees()),
                });
            }
        }

        Err(GeodesicComputationError::NonConvergent)
    }

    fn spherical_inverse(&self, p0: GeoPoint, p1: GeoPoint) -> Geodesic {
        let phi1 = p0.lat.to_radians();
        let phi2 = p1.lat.to_radians();
        let dphi = phi2 - phi1;
        let dlambda = (p1.lon - p0.lon).to_radians();

        let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
        let central_angle = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());

        let x = dlambda.sin() * phi2.cos();
        let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();

        Geodesic {
            distance_m: self.mean_radius() * central_angle,
            initial_azimuth_deg: normalize_azimuth(x.atan2(y).to_degrees()),
        }
    }

    /// Solve the direct problem: the point reached after `distance_m` along `azimuth_deg`.
    pub fn direct(&self, origin: GeoPoint, azimuth_deg: f64, distance_m: f64) -> GeoPoint {
        if distance_m.abs() <= f64::EPSILON {
            return origin;
        }

        let f = self.flattening();
        let (sin_alpha1, cos_alpha1) = azimuth_deg.to_radians().sin_cos();
        let (sin_u1, cos_u1) = reduced_latitude(f, origin.lat.to_radians()).sin_cos();
        let sigma1 = sin_u1.atan2(cos_u1 * cos_alpha1);
        let sin_alpha = cos_u1 * sin_alpha1;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        let u_sq = cos_sq_alpha * self.second_eccentricity_sq();
        let (a_coef, b_coef) = series_coefficients(u_sq);

        let sigma_base = distance_m / (self.b * a_coef);
        let mut sigma = sigma_base;
        for _ in 0..MAX_ITERATIONS {
            let cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
            let (sin_sigma, cos_sigma) = sigma.sin_cos();
            let next = sigma_base + delta_sigma(b_coef, sin_sigma, cos_sigma, cos_2sigma_m);
            let converged = (next - sigma).abs() < TOLERANCE;
            sigma = next;
            if converged {
                break;
            }
        }

        let cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
        let (sin_sigma, cos_sigma) = sigma.sin_cos();
        let tmp = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
        let lat = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
            .atan2((1.0 - f) * (sin_alpha * sin_alpha + tmp * tmp).sqrt());
        let lambda =
            (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let l = lambda
            - (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        GeoPoint {
            lon: normalize_longitude(origin.lon + l.to_degrees()),
            lat: lat.to_degrees(),
        }
    }

    /// `count` points evenly spaced along a geodesic, ending exactly at `distance_m`.
    pub fn waypoints(
        &self,
        origin: GeoPoint,
        azimuth_deg: f64,
        distance_m: f64,
        count: usize,
    ) -> Vec<GeoPoint> {
        (1..=count)
            .map(|k| {
                let along = distance_m * k as f64 / count as f64;
                self.direct(origin, azimuth_deg, along)
            })
            .collect()
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Ellipsoid::CLARKE_1866
    }
}

/// Solution of the inverse geodesic problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodesic {
    pub distance_m: f64,
    /// Degrees clockwise from north, in [0, 360)
    pub initial_azimuth_deg: f64,
}

/// Reasons the iterative inverse solution can fail. Never leaves this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeodesicComputationError {
    UndefinedBearing,
    NonConvergent,
}

/// Ordered points from the departure point toward the point reached at fraction t.
#[derive(Debug, Clone, PartialEq)]
pub struct GreatCirclePath {
    pub points: Vec<GeoPoint>,
    /// Geodesic length covered by the path
    pub traversed_m: f64,
    /// Geodesic length of the whole route
    pub total_m: f64,
}

impl GreatCirclePath {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&GeoPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&GeoPoint> {
        self.points.last()
    }
}

/// Computes truncated great-circle paths for growing flight arcs.
#[derive(Debug, Clone, PartialEq)]
pub struct GreatCircleInterpolator {
    ellipsoid: Ellipsoid,
    point_spacing_m: f64,
}

impl Default for GreatCircleInterpolator {
    fn default() -> Self {
        Self::new(Ellipsoid::CLARKE_1866, SimulationRules::default().point_spacing_m)
    }
}

impl GreatCircleInterpolator {
    pub fn new(ellipsoid: Ellipsoid, point_spacing_m: f64) -> Self {
        Self {
            ellipsoid,
            point_spacing_m,
        }
    }

    pub fn from_rules(ellipsoid: Ellipsoid, rules: &SimulationRules) -> Self {
        Self::new(ellipsoid, rules.point_spacing_m)
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    /// One point per spacing of traversed distance, rounded to nearest.
    pub fn waypoint_count(&self, distance_m: f64) -> usize {
        if !(distance_m.is_finite() && distance_m > 0.0) {
            return 0;
        }
        ((distance_m + 0.5 * self.point_spacing_m) / self.point_spacing_m).floor() as usize
    }

    /// Path from `p0` toward `p1`, truncated at fraction `t` of the geodesic length.
    ///
    /// # Arguments
    /// * `p0`, `p1` - Route endpoints
    /// * `t` - Fraction of the route to cover; clamped into [0, 1], NaN counts as 0
    ///
    /// # Returns
    /// `[p0]` followed by evenly spaced waypoints, the last of which is the
    /// point reached at `t`.
    pub fn interpolate(&self, p0: GeoPoint, p1: GeoPoint, t: f64) -> GreatCirclePath {
        self.interpolate_along(p0, &self.route(p0, p1), t)
    }

    /// Full-route geodesic, computed once per flight and reused every tick.
    pub fn route(&self, p0: GeoPoint, p1: GeoPoint) -> Geodesic {
        self.ellipsoid.inverse(p0, p1)
    }

    /// Same as [`interpolate`](Self::interpolate) for a route solved beforehand.
    pub fn interpolate_along(&self, p0: GeoPoint, geodesic: &Geodesic, t: f64) -> GreatCirclePath {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let traversed_m = geodesic.distance_m * t;
        let count = self.waypoint_count(traversed_m);

        let mut points = Vec::with_capacity(count + 1);
        points.push(p0);
        points.extend(self.ellipsoid.waypoints(
            p0,
            geodesic.initial_azimuth_deg,
            traversed_m,
            count,
        ));

        GreatCirclePath {
            points,
            traversed_m,
            total_m: geodesic.distance_m,
        }
    }
}

fn reduced_latitude(flattening: f64, lat_rad: f64) -> f64 {
    ((1.0 - flattening) * lat_rad.sin()).atan2(lat_rad.cos())
}

/// Vincenty's A and B series coefficients for u².
fn series_coefficients(u_sq: f64) -> (f64, f64) {
    let a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    (a, b)
}

fn delta_sigma(b_coef: f64, sin_sigma: f64, cos_sigma: f64, cos_2sigma_m: f64) -> f64 {
    let cos_sq = cos_2sigma_m * cos_2sigma_m;
    b_coef
        * sin_sigma
        * (cos_2sigma_m
            + b_coef / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos_sq)
                    - b_coef / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                        * (-3.0 + 4.0 * cos_sq)))
}

fn wrap_radians(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    // Keep +π rather than folding it to -π
    if wrapped == -PI && angle > 0.0 {
        PI
    } else {
        wrapped
    }
}

fn lon_difference_deg(a: f64, b: f64) -> f64 {
    (b - a + 180.0).rem_euclid(360.0) - 180.0
}

/// Normalize a longitude into [-180, 180).
pub fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

fn normalize_azimuth(azimuth_deg: f64) -> f64 {
    let az = azimuth_deg.rem_euclid(360.0);
    if az >= 360.0 {
        0.0
    } else {
        az
    }
}

fn at_pole(lat: f64) -> bool {
    lat.abs() >= 90.0 - COINCIDENT_EPS_DEG
}

fn coincident(p0: GeoPoint, p1: GeoPoint) -> bool {
    if (p0.lat - p1.lat).abs() > COINCIDENT_EPS_DEG {
        return false;
    }
    at_pole(p0.lat) || lon_difference_deg(p0.lon, p1.lon).abs() <= COINCIDENT_EPS_DEG
}

fn antipodal(p0: GeoPoint, p1: GeoPoint) -> bool {
    if (p0.lat + p1.lat).abs() > COINCIDENT_EPS_DEG {
        return false;
    }
    if at_pole(p0.lat) {
        return true;
    }
    (lon_difference_deg(p0.lon, p1.lon).abs() - 180.0).abs() <= COINCIDENT_EPS_DEG
}
