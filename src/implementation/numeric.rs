// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Numeric primitives that do not deserve their own module: bounded
//! arithmetic on extended reals, snap-to-grid, a uniform direction on the
//! unit sphere, and a Householder QR used to build an orthonormal poll
//! basis. None of these need a crate from the dependency graph: they are
//! small, self-contained and operate on plain `Vec<f64>`.

use rand::Rng;

/// Treats an undefined bound as ±∞, per the data model.
pub fn effective_lower(b: Option<f64>) -> f64 {
    b.unwrap_or(f64::NEG_INFINITY)
}
pub fn effective_upper(b: Option<f64>) -> f64 {
    b.unwrap_or(f64::INFINITY)
}

/// Round `v` to the nearest multiple of `step` (step must be > 0).
pub fn round_to_multiple(v: f64, step: f64) -> f64 {
    debug_assert!(step > 0.0);
    (v / step).round() * step
}

/// Clip `v` into `[lb, ub]`, then — if it is within `tol` of the boundary it
/// was clipped to — nothing more to do since clipping already pulled it in.
/// Kept separate from `round_to_multiple` so the mesh module can apply the
/// "pull inside by half a mesh size" rule explicitly.
pub fn clip(v: f64, lb: f64, ub: f64) -> f64 {
    v.max(lb).min(ub)
}

/// Samples a uniformly random direction on the unit sphere in `n`
/// dimensions (Muller's method: normalize a vector of i.i.d. standard
/// normal coordinates).
pub fn random_unit_direction(n: usize, rng: &mut impl Rng) -> Vec<f64> {
    loop {
        let mut v: Vec<f64> = (0..n).map(|_| standard_normal(rng)).collect();
        let norm = norm2(&v);
        if norm > 1e-12 {
            for x in v.iter_mut() {
                *x /= norm;
            }
            return v;
        }
    }
}

fn standard_normal(rng: &mut impl Rng) -> f64 {
    // Box-Muller, using only the uniform primitive so no extra distribution
    // crate is required beyond `rand` itself.
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

pub fn norm2(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Builds an orthonormal basis of `R^n` whose first column is `dir` (assumed
/// unit norm), via a single Householder reflection that maps `e1` onto
/// `dir`. Returns the basis as `n` column vectors, each of length `n`.
///
/// This is the QR step the Poll uses to build its 2n / (n+1) direction
/// families: reflecting the canonical basis onto a random direction gives a
/// positive spanning set once both signs of each column are taken.
pub fn householder_basis(dir: &[f64]) -> Vec<Vec<f64>> {
    let n = dir.len();

    // v = e1 - dir, the Householder vector of the reflection
    // H = I - 2 v v^T / (v^T v) that satisfies H * e1 = dir exactly.
    let mut v: Vec<f64> = dir.iter().map(|d| -d).collect();
    v[0] += 1.0;

    let vtv = norm2(&v).powi(2);
    if vtv < 1e-18 {
        // dir is (numerically) e1 already: the reflection degenerates to
        // the identity, still a valid orthonormal basis with first column
        // `dir`.
        let mut basis = Vec::with_capacity(n);
        for i in 0..n {
            let mut col = vec![0.0; n];
            col[i] = 1.0;
            basis.push(col);
        }
        return basis;
    }

    let mut basis = Vec::with_capacity(n);
    for j in 0..n {
        let mut ej = vec![0.0; n];
        ej[j] = 1.0;
        let dot: f64 = v.iter().zip(ej.iter()).map(|(a, b)| a * b).sum();
        let factor = 2.0 * dot / vtv;
        let col: Vec<f64> = ej.iter().zip(v.iter()).map(|(e, vv)| e - factor * vv).collect();
        basis.push(col);
    }
    basis
}

#[cfg(test)]
mod test_numeric {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn round_to_multiple_basic() {
        assert_eq!(round_to_multiple(1.24, 0.5), 1.0);
        assert_eq!(round_to_multiple(1.26, 0.5), 1.5);
    }

    #[test]
    fn round_to_mesh_is_additive_over_translation_by_a_multiple() {
        // For any v, round(v + delta) == round(v) + delta (round-trip law).
        let step = 0.25;
        let delta = 3.0 * step;
        for v in [0.0, 0.1, -1.37, 10.0] {
            let lhs = round_to_multiple(v + delta, step);
            let rhs = round_to_multiple(v, step) + delta;
            assert!((lhs - rhs).abs() < 1e-9, "{lhs} != {rhs}");
        }
    }

    #[test]
    fn householder_basis_is_orthonormal_and_matches_direction() {
        let mut rng = StdRng::seed_from_u64(42);
        let dir = random_unit_direction(4, &mut rng);
        let basis = householder_basis(&dir);
        assert_eq!(basis.len(), 4);
        // first column equals dir
        for (a, b) in basis[0].iter().zip(dir.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
        // orthonormal: pairwise dot products are the identity matrix
        for i in 0..4 {
            for j in 0..4 {
                let dot: f64 = basis[i].iter().zip(basis[j].iter()).map(|(a, b)| a * b).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-6, "basis[{i}]·basis[{j}] = {dot}");
            }
        }
    }

    #[test]
    fn random_unit_direction_has_unit_norm() {
        let mut rng = StdRng::seed_from_u64(7);
        let d = random_unit_direction(6, &mut rng);
        assert!((norm2(&d) - 1.0).abs() < 1e-9);
    }
}
