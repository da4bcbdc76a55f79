//! Nelder-Mead simplex minimization.
//!
//! Derivative-free minimizer used for the concentrated ARMA objective. The
//! estimation-precision policy supplies the tolerance and iteration cap.

/// Result of a simplex minimization.
#[derive(Debug, Clone)]
pub struct SimplexResult {
    /// The best point found.
    pub point: Vec<f64>,
    /// Objective value at the best point.
    pub value: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether the value spread fell below the tolerance.
    pub converged: bool,
}

/// Configuration for the simplex search.
#[derive(Debug, Clone, Copy)]
pub struct SimplexConfig {
    /// Maximum iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the simplex value spread.
    pub tolerance: f64,
    /// Initial simplex step.
    pub initial_step: f64,
}

impl Default for SimplexConfig {
    fn default() -> Self {
        Self {
            max_iter: 500,
            tolerance: 1e-7,
            initial_step: 0.1,
        }
    }
}

// standard Nelder-Mead coefficients
const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

fn clamp_point(point: &mut [f64], bounds: Option<&[(f64, f64)]>) {
    if let Some(bounds) = bounds {
        for (x, &(lo, hi)) in point.iter_mut().zip(bounds) {
            *x = x.clamp(lo, hi);
        }
    }
}

/// Minimize `objective` starting from `initial`, clamping every trial point
/// to `bounds` when given.
pub fn minimize<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: SimplexConfig,
) -> SimplexResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return SimplexResult {
            point: vec![],
            value: objective(&[]),
            iterations: 0,
            converged: true,
        };
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    let mut start = initial.to_vec();
    clamp_point(&mut start, bounds);
    simplex.push(start.clone());
    for i in 0..n {
        let mut vertex = start.clone();
        let step = if vertex[i].abs() > 1e-10 {
            config.initial_step * vertex[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        clamp_point(&mut vertex, bounds);
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        if (values[worst] - values[best]).abs()
            <= config.tolerance * (1.0 + values[best].abs())
        {
            converged = true;
            break;
        }

        // centroid of all vertices but the worst
        let mut centroid = vec![0.0; n];
        for (idx, vertex) in simplex.iter().enumerate() {
            if idx == worst {
                continue;
            }
            for (c, x) in centroid.iter_mut().zip(vertex) {
                *c += x / n as f64;
            }
        }

        let trial = |coef: f64| -> Vec<f64> {
            let mut point: Vec<f64> = centroid
                .iter()
                .zip(&simplex[worst])
                .map(|(c, w)| c + coef * (c - w))
                .collect();
            clamp_point(&mut point, bounds);
            point
        };

        let reflected = trial(REFLECT);
        let reflected_value = objective(&reflected);

        if reflected_value < values[best] {
            let expanded = trial(EXPAND);
            let expanded_value = objective(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
        } else if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
        } else {
            let contracted = trial(-CONTRACT);
            let contracted_value = objective(&contracted);
            if contracted_value < values[worst] {
                simplex[worst] = contracted;
                values[worst] = contracted_value;
            } else {
                // shrink towards the best vertex
                let best_vertex = simplex[best].clone();
                for (idx, vertex) in simplex.iter_mut().enumerate() {
                    if idx == best {
                        continue;
                    }
                    for (x, b) in vertex.iter_mut().zip(&best_vertex) {
                        *x = b + SHRINK * (*x - b);
                    }
                    clamp_point(vertex, bounds);
                    values[idx] = objective(vertex);
                }
            }
        }
    }

    let (best_idx, best_value) = values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, v)| (i, *v))
        .unwrap_or((0, f64::NAN));

    SimplexResult {
        point: simplex.swap_remove(best_idx),
        value: best_value,
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn minimizes_quadratic() {
        let result = minimize(
            |x| (x[0] - 2.0).powi(2) + (x[1] + 3.0).powi(2),
            &[0.0, 0.0],
            None,
            SimplexConfig::default(),
        );
        assert!(result.converged);
        assert_relative_eq!(result.point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.point[1], -3.0, epsilon = 1e-3);
    }

    #[test]
    fn respects_bounds() {
        let bounds = [(-0.5, 0.5)];
        let result = minimize(
            |x| (x[0] - 2.0).powi(2),
            &[0.0],
            Some(&bounds),
            SimplexConfig::default(),
        );
        assert!(result.point[0] <= 0.5 + 1e-12);
        assert_relative_eq!(result.point[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn empty_problem_is_trivially_converged() {
        let result = minimize(|_| 7.0, &[], None, SimplexConfig::default());
        assert!(result.converged);
        assert_relative_eq!(result.value, 7.0);
    }

    #[test]
    fn rosenbrock_reaches_valley() {
        let result = minimize(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2),
            &[-1.0, 1.0],
            None,
            SimplexConfig {
                max_iter: 5000,
                tolerance: 1e-12,
                initial_step: 0.1,
            },
        );
        assert!(result.value < 1e-4);
    }
}
