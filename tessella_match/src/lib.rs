//! # tessella_match
//!
//! Fragment matching: per-tile feature tensors and similarities, dense
//! cost-matrix construction (CPU and GPU backends), and the minimum-cost
//! assignment solver.

pub mod cost;
pub mod features;
pub mod solver;

pub use cost::{CostBackend, CostMatrix, CpuCostBackend, FeaturePair, build_cost_matrix};
pub use features::{FeatureKind, FeatureTensor};
pub use solver::{Assignment, solve};
