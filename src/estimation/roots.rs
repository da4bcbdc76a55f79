//! Root analysis of estimated lag polynomials.

use nalgebra::{Complex, DMatrix};

/// Inverse root of a lag polynomial.
///
/// A stationary or invertible polynomial has all inverse roots strictly
/// inside the unit circle; a modulus near one signals a (near) unit root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseRoot {
    pub re: f64,
    pub im: f64,
}

impl InverseRoot {
    pub fn modulus(&self) -> f64 {
        self.re.hypot(self.im)
    }

    /// Distance to another inverse root in the complex plane.
    pub fn distance(&self, other: &InverseRoot) -> f64 {
        (self.re - other.re).hypot(self.im - other.im)
    }
}

/// Inverse roots of `1 + a_1 B + ... + a_k B^k` given `coeffs = [a_1..a_k]`.
///
/// For an AR polynomial `1 - phi_1 B - ...` pass `a_i = -phi_i`; for an MA
/// polynomial `1 + theta_1 B + ...` pass `a_i = theta_i`. Computed as the
/// eigenvalues of the companion matrix of the reversed polynomial.
pub fn inverse_roots(coeffs: &[f64]) -> Vec<InverseRoot> {
    // drop trailing zero coefficients, they only add roots at the origin
    let degree = coeffs
        .iter()
        .rposition(|&c| c.abs() > 1e-12)
        .map(|i| i + 1)
        .unwrap_or(0);
    if degree == 0 {
        return vec![];
    }

    // z^k + a_1 z^{k-1} + ... + a_k = 0, the roots are the inverse roots
    let mut companion = DMatrix::<f64>::zeros(degree, degree);
    for (i, &c) in coeffs.iter().take(degree).enumerate() {
        companion[(0, i)] = -c;
    }
    for i in 1..degree {
        companion[(i, i - 1)] = 1.0;
    }

    companion
        .complex_eigenvalues()
        .iter()
        .map(|z: &Complex<f64>| InverseRoot { re: z.re, im: z.im })
        .collect()
}

/// Largest modulus among the inverse roots, zero for an empty polynomial.
pub fn max_modulus(roots: &[InverseRoot]) -> f64 {
    roots.iter().map(InverseRoot::modulus).fold(0.0, f64::max)
}
