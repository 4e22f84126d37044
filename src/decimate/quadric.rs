use std::ops::{Add, AddAssign};

use glam::DVec3;

// Credit to:
// https://github.com/Philip-Trettner/probabilistic-quadrics/blob/master/probabilistic-quadrics.hh
/// Symmetric quadric error `p^T A p - 2 b.p + c`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(super) struct Quadric {
    a00: f64,
    a01: f64,
    a02: f64,
    a11: f64,
    a12: f64,
    a22: f64,
    b0: f64,
    b1: f64,
    b2: f64,
    c: f64,
}

impl Quadric {
    /// Squared distance to the plane through `pos` with unit `normal`.
    pub(super) fn plane(pos: DVec3, normal: DVec3) -> Self {
        let DVec3 {
            x: nx,
            y: ny,
            z: nz,
        } = normal;
        let dot = pos.dot(normal);
        let ndv = normal * dot;
        Self {
            a00: nx * nx,
            a01: nx * ny,
            a02: nx * nz,
            a11: ny * ny,
            a12: ny * nz,
            a22: nz * nz,
            b0: ndv.x,
            b1: ndv.y,
            b2: ndv.z,
            c: dot * dot,
        }
    }

    pub(super) fn residual(&self, p: DVec3) -> f64 {
        p.dot(DVec3::new(
            self.a00 * p.x + self.a01 * p.y + self.a02 * p.z,
            self.a01 * p.x + self.a11 * p.y + self.a12 * p.z,
            self.a02 * p.x + self.a12 * p.y + self.a22 * p.z,
        )) - 2.0 * (p.x * self.b0 + p.y * self.b1 + p.z * self.b2)
            + self.c
    }
}

impl AddAssign for Quadric {
    fn add_assign(&mut self, rhs: Self) {
        self.a00 += rhs.a00;
        self.a01 += rhs.a01;
        self.a02 += rhs.a02;
        self.a11 += rhs.a11;
        self.a12 += rhs.a12;
        self.a22 += rhs.a22;
        self.b0 += rhs.b0;
        self.b1 += rhs.b1;
        self.b2 += rhs.b2;
        self.c += rhs.c;
    }
}

impl Add for Quadric {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}
