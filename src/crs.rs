//! Coordinate reference system transformations
//!
//! The query engine consumes reprojection only through the [`CrsTransform`]
//! trait, so a full geodesy library (or a test double) can stand in. The
//! built-in [`CrsTransformer`] covers the coordinate systems the published
//! earth models use: geographic WGS84/NAD83 and the California Albers
//! equal-area conic projections, implemented from first principles on the
//! GRS80 ellipsoid.
//!
//! Geographic coordinates follow EPSG axis order: `x` is latitude and `y` is
//! longitude, both in degrees. Elevation passes through unchanged in either
//! direction.

use crate::error::{GridError, Result};

/// Reprojection between an input CRS and a model CRS
pub trait CrsTransform: Send + Sync {
    /// Forward reprojection, input CRS -> model CRS
    fn transform(&self, x: f64, y: f64, z: f64) -> Result<(f64, f64, f64)>;

    /// Inverse reprojection, model CRS -> input CRS
    fn inverse_transform(&self, x: f64, y: f64, z: f64) -> Result<(f64, f64, f64)>;
}

// GRS80 ellipsoid
const ELLIPSOID_A: f64 = 6378137.0;
const ELLIPSOID_F: f64 = 1.0 / 298.257222101;

/// Albers equal-area conic projection on the GRS80 ellipsoid.
///
/// Closed-form forward mapping and fixed-point latitude iteration for the
/// inverse (Snyder, "Map Projections: A Working Manual", eqs. 14-1..14-21).
#[derive(Debug, Clone)]
struct AlbersConic {
    /// Central meridian in radians
    lon0: f64,
    /// False easting / northing (meters)
    x0: f64,
    y0: f64,
    /// Cone constant
    n: f64,
    /// C constant
    c: f64,
    /// Radial distance of the projection origin
    rho0: f64,
    e: f64,
    e2: f64,
}

impl AlbersConic {
    fn new(lat1_deg: f64, lat2_deg: f64, lat0_deg: f64, lon0_deg: f64, x0: f64, y0: f64) -> Self {
        let e2 = 2.0 * ELLIPSOID_F - ELLIPSOID_F * ELLIPSOID_F;
        let e = e2.sqrt();

        let q = |phi: f64| -> f64 {
            let s = phi.sin();
            (1.0 - e2) * (s / (1.0 - e2 * s * s) - (1.0 / (2.0 * e)) * ((1.0 - e * s) / (1.0 + e * s)).ln())
        };
        let m = |phi: f64| -> f64 {
            let s = phi.sin();
            phi.cos() / (1.0 - e2 * s * s).sqrt()
        };

        let lat1 = lat1_deg.to_radians();
        let lat2 = lat2_deg.to_radians();
        let lat0 = lat0_deg.to_radians();

        let (m1, m2) = (m(lat1), m(lat2));
        let (q1, q2, q0) = (q(lat1), q(lat2), q(lat0));
        let n = (m1 * m1 - m2 * m2) / (q2 - q1);
        let c = m1 * m1 + n * q1;
        let rho0 = ELLIPSOID_A * (c - n * q0).sqrt() / n;

        Self {
            lon0: lon0_deg.to_radians(),
            x0,
            y0,
            n,
            c,
            rho0,
            e,
            e2,
        }
    }

    /// California Albers (EPSG:3310 / EPSG:3311 projection parameters)
    fn california() -> Self {
        Self::new(34.0, 40.5, 0.0, -120.0, 0.0, -4.0e+6)
    }

    fn q(&self, phi: f64) -> f64 {
        let s = phi.sin();
        (1.0 - self.e2)
            * (s / (1.0 - self.e2 * s * s)
                - (1.0 / (2.0 * self.e)) * ((1.0 - self.e * s) / (1.0 + self.e * s)).ln())
    }

    /// Geographic (radians) -> projected (meters)
    fn forward(&self, phi: f64, lam: f64) -> (f64, f64) {
        let rho = ELLIPSOID_A * (self.c - self.n * self.q(phi)).sqrt() / self.n;
        let theta = self.n * (lam - self.lon0);
        let x = self.x0 + rho * theta.sin();
        let y = self.y0 + self.rho0 - rho * theta.cos();
        (x, y)
    }

    /// Projected (meters) -> geographic (radians)
    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let dx = x - self.x0;
        let dy = self.rho0 - (y - self.y0);
        let rho = (dx * dx + dy * dy).sqrt();
        let theta = dx.atan2(dy);
        let lam = self.lon0 + theta / self.n;

        let q = (self.c - (rho * self.n / ELLIPSOID_A).powi(2)) / self.n;
        let mut phi = (q / 2.0).clamp(-1.0, 1.0).asin();
        for _ in 0..30 {
            let s = phi.sin();
            let denom = 1.0 - self.e2 * s * s;
            let correction = (denom * denom) / (2.0 * phi.cos())
                * (q / (1.0 - self.e2) - s / denom
                    + (1.0 / (2.0 * self.e)) * ((1.0 - self.e * s) / (1.0 + self.e * s)).ln());
            phi += correction;
            if correction.abs() < 1.0e-12 {
                return Ok((phi, lam));
            }
        }
        Err(GridError::Crs(format!(
            "inverse projection did not converge at ({x}, {y})"
        )))
    }
}

#[derive(Debug, Clone)]
enum CrsDef {
    /// Geographic latitude/longitude in degrees (EPSG axis order)
    Geographic,
    Albers(AlbersConic),
}

impl CrsDef {
    fn parse(id: &str) -> Result<Self> {
        match id.trim().to_ascii_uppercase().as_str() {
            "EPSG:4326" | "EPSG:4269" => Ok(CrsDef::Geographic),
            "EPSG:3310" | "EPSG:3311" => Ok(CrsDef::Albers(AlbersConic::california())),
            other => Err(GridError::Crs(format!("unsupported CRS '{other}'"))),
        }
    }

    /// -> geographic radians (lat, lon)
    fn to_geographic(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        match self {
            CrsDef::Geographic => Ok((x.to_radians(), y.to_radians())),
            CrsDef::Albers(albers) => albers.inverse(x, y),
        }
    }

    /// geographic radians (lat, lon) ->
    fn from_geographic(&self, phi: f64, lam: f64) -> (f64, f64) {
        match self {
            CrsDef::Geographic => (phi.to_degrees(), lam.to_degrees()),
            CrsDef::Albers(albers) => albers.forward(phi, lam),
        }
    }
}

/// Built-in CRS transformer between two named coordinate systems.
///
/// Construction fails for identifiers outside the supported set unless the
/// source and destination are the same string, which is an identity
/// transform.
pub struct CrsTransformer {
    src: Option<CrsDef>,
    dst: Option<CrsDef>,
}

impl CrsTransformer {
    pub fn new(src: &str, dst: &str) -> Result<Self> {
        if src.trim().eq_ignore_ascii_case(dst.trim()) {
            return Ok(Self {
                src: None,
                dst: None,
            });
        }
        Ok(Self {
            src: Some(CrsDef::parse(src)?),
            dst: Some(CrsDef::parse(dst)?),
        })
    }
}

impl CrsTransform for CrsTransformer {
    fn transform(&self, x: f64, y: f64, z: f64) -> Result<(f64, f64, f64)> {
        match (&self.src, &self.dst) {
            (Some(src), Some(dst)) => {
                let (phi, lam) = src.to_geographic(x, y)?;
                let (xd, yd) = dst.from_geographic(phi, lam);
                Ok((xd, yd, z))
            }
            _ => Ok((x, y, z)),
        }
    }

    fn inverse_transform(&self, x: f64, y: f64, z: f64) -> Result<(f64, f64, f64)> {
        match (&self.src, &self.dst) {
            (Some(src), Some(dst)) => {
                let (phi, lam) = dst.to_geographic(x, y)?;
                let (xs, ys) = src.from_geographic(phi, lam);
                Ok((xs, ys, z))
            }
            _ => Ok((x, y, z)),
        }
    }
}
