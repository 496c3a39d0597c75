//! Minimum-cost perfect matching on a square cost matrix.
//!
//! Shortest-augmenting-path with dual potentials (the Jonker–Volgenant
//! family): rows are inserted one by one, each via a Dijkstra-like scan
//! over reduced costs. O(n³) time, O(n²) memory (the matrix itself).
//!
//! Ties are broken deterministically: a strictly smaller reduced cost is
//! required to displace the current candidate, so the lowest column index
//! wins. Bit-identical input yields a bit-identical permutation.

use crate::cost::CostMatrix;
use tessella_core::MosaicResult;

/// The solved matching: `indices[i]` is the donor (column) assigned to
/// receiver (row) `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
	pub indices: Vec<usize>,
	/// Σ_i M[i, indices[i]], accumulated in f64.
	pub total_cost: f64,
}

const UNMATCHED: usize = usize::MAX;

/// Finds the permutation minimizing the summed cost.
///
/// Fails with [`tessella_core::MosaicError::NonFinite`] if the matrix
/// contains NaN or an infinity. Entries are otherwise unrestricted;
/// potentials absorb any offset.
pub fn solve(matrix: &CostMatrix) -> MosaicResult<Assignment> {
	matrix.validate_finite()?;

	let n = matrix.n();
	if n == 0 {
		return Ok(Assignment {
			indices: Vec::new(),
			total_cost: 0.0,
		});
	}

	// Column n is the virtual start of every augmenting path.
	let virt = n;
	let mut u = vec![0.0f64; n];
	let mut v = vec![0.0f64; n + 1];
	let mut matched = vec![UNMATCHED; n + 1];

	let mut minv = vec![0.0f64; n];
	let mut way = vec![virt; n];
	let mut used = vec![false; n + 1];

	for row in 0..n {
		matched[virt] = row;
		minv.fill(f64::INFINITY);
		way.fill(virt);
		used.fill(false);

		// Grow the alternating tree until a free column is reached.
		let mut j0 = virt;
		loop {
			used[j0] = true;
			let i0 = matched[j0];
			let mut delta = f64::INFINITY;
			let mut j1 = virt;

			for j in 0..n {
				if used[j] {
					continue;
				}
				let reduced = f64::from(matrix.get(i0, j)) - u[i0] - v[j];
				if reduced < minv[j] {
					minv[j] = reduced;
					way[j] = j0;
				}
				if minv[j] < delta {
					delta = minv[j];
					j1 = j;
				}
			}
			debug_assert!(delta.is_finite(), "augmenting path ran out of columns");

			for j in 0..n {
				if used[j] {
					u[matched[j]] += delta;
					v[j] -= delta;
				} else {
					minv[j] -= delta;
				}
			}
			u[matched[virt]] += delta;
			v[virt] -= delta;

			j0 = j1;
			if matched[j0] == UNMATCHED {
				break;
			}
		}

		// Flip the path: every column on it takes its predecessor's row.
		let mut j = j0;
		loop {
			let prev = way[j];
			matched[j] = matched[prev];
			j = prev;
			if j == virt {
				break;
			}
		}
	}

	let mut indices = vec![0usize; n];
	for j in 0..n {
		indices[matched[j]] = j;
	}

	let total_cost = indices
		.iter()
		.enumerate()
		.map(|(i, &j)| f64::from(matrix.get(i, j)))
		.sum();

	Ok(Assignment { indices, total_cost })
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_abs_diff_eq;
	use tessella_core::MosaicError;

	fn matrix(n: usize, data: Vec<f32>) -> CostMatrix {
		CostMatrix::new(n, data).unwrap()
	}

	fn assert_permutation(indices: &[usize]) {
		let mut seen = vec![false; indices.len()];
		for &j in indices {
			assert!(j < indices.len());
			assert!(!seen[j], "column {j} assigned twice");
			seen[j] = true;
		}
	}

	/// Exhaustive minimum over all permutations, for small fixtures.
	fn brute_force(m: &CostMatrix) -> f64 {
		fn go(m: &CostMatrix, row: usize, used: &mut Vec<bool>) -> f64 {
			if row == m.n() {
				return 0.0;
			}
			let mut best = f64::INFINITY;
			for j in 0..m.n() {
				if !used[j] {
					used[j] = true;
					best = best.min(f64::from(m.get(row, j)) + go(m, row + 1, used));
					used[j] = false;
				}
			}
			best
		}
		go(m, 0, &mut vec![false; m.n()])
	}

	#[test]
	fn zero_diagonal_yields_identity() {
		let m = matrix(3, vec![0.0, 0.5, 0.5, 0.5, 0.0, 0.5, 0.5, 0.5, 0.0]);
		let result = solve(&m).unwrap();
		assert_eq!(result.indices, vec![0, 1, 2]);
		assert_eq!(result.total_cost, 0.0);
	}

	#[test]
	fn known_three_by_three_optimum() {
		let m = matrix(3, vec![4.0, 1.0, 3.0, 2.0, 0.0, 5.0, 3.0, 2.0, 2.0]);
		let result = solve(&m).unwrap();
		assert_eq!(result.indices, vec![1, 0, 2]);
		assert_abs_diff_eq!(result.total_cost, 5.0, epsilon = 1e-9);
	}

	#[test]
	fn matches_brute_force_on_small_matrices() {
		// A fixed pseudo-random 5x5 fixture.
		let data: Vec<f32> = (0..25).map(|k| ((k * 7919 + 13) % 97) as f32 / 97.0).collect();
		let m = matrix(5, data);

		let result = solve(&m).unwrap();
		assert_permutation(&result.indices);
		assert_abs_diff_eq!(result.total_cost, brute_force(&m), epsilon = 1e-6);
	}

	#[test]
	fn ties_break_deterministically() {
		let m = matrix(4, vec![0.5; 16]);
		let first = solve(&m).unwrap();
		let second = solve(&m).unwrap();

		assert_permutation(&first.indices);
		assert_eq!(first, second);
		assert_abs_diff_eq!(first.total_cost, 2.0, epsilon = 1e-9);
	}

	#[test]
	fn rejects_non_finite_entries() {
		let m = matrix(2, vec![0.0, f32::INFINITY, 0.0, 0.0]);
		let err = solve(&m).unwrap_err();
		assert!(matches!(err, MosaicError::NonFinite { row: 0, col: 1 }));
	}

	#[test]
	fn empty_matrix_solves_trivially() {
		let result = solve(&matrix(0, Vec::new())).unwrap();
		assert!(result.indices.is_empty());
		assert_eq!(result.total_cost, 0.0);
	}
}
