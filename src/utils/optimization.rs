//! Derivative-free optimization used by the model estimators.

use std::time::{Duration, Instant};

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The optimal point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the optimal point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the algorithm converged.
    pub converged: bool,
    /// Whether the run stopped because `max_duration` elapsed.
    pub timed_out: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance, relative to the magnitude of the best value.
    pub tolerance: f64,
    /// Largest distance from the best vertex at which the simplex counts as collapsed.
    pub x_tolerance: f64,
    /// Reflection coefficient (default: 1.0).
    pub alpha: f64,
    /// Expansion coefficient (default: 2.0).
    pub gamma: f64,
    /// Contraction coefficient (default: 0.5).
    pub rho: f64,
    /// Shrinkage coefficient (default: 0.5).
    pub sigma: f64,
    /// Initial simplex step size (default: 0.05).
    pub initial_step: f64,
    /// Wall-clock budget; `None` runs until convergence or `max_iter`.
    pub max_duration: Option<Duration>,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            x_tolerance: 1e-6,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
            max_duration: None,
        }
    }
}

/// Minimise `objective` with the Nelder-Mead simplex method.
///
/// Every trial point is clamped to `bounds` when given. A NaN objective value
/// ranks as worst. The run converges once the objective spread across the
/// simplex is within `tolerance` relative to the best value and every vertex
/// lies within `x_tolerance` of the best one. Otherwise it stops after
/// `max_iter` iterations or when `max_duration` elapses.
///
/// # Example
/// ```
/// use stockcast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// // Minimize (x-2)^2 + (y-3)^2
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    if initial.is_empty() {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
            timed_out: false,
        };
    }

    let started = Instant::now();
    let evaluate = |point: Vec<f64>| {
        let value = objective(&point);
        // NaN would poison the vertex ordering
        let value = if value.is_nan() { f64::INFINITY } else { value };
        Vertex { point, value }
    };
    let mut simplex = Simplex::around(initial, config.initial_step, bounds, &evaluate);

    let mut iterations = 0;
    let mut converged = false;
    let mut timed_out = false;

    while iterations < config.max_iter {
        if config
            .max_duration
            .is_some_and(|budget| started.elapsed() >= budget)
        {
            timed_out = true;
            break;
        }
        iterations += 1;

        simplex.order();
        let best = simplex.best().value;
        // Equal values can straddle a minimum, so a flat simplex alone is not enough
        let flat = simplex.spread() <= config.tolerance * (1.0 + best.abs());
        if flat && simplex.radius(&simplex.best().point) <= config.x_tolerance {
            converged = true;
            break;
        }

        let centroid = simplex.centroid();

        let worst = simplex.worst();
        let reflected = evaluate(affine(&centroid, &worst.point, -config.alpha, bounds));

        if reflected.value < best {
            let expanded = evaluate(affine(&centroid, &reflected.point, config.gamma, bounds));
            simplex.replace_worst(if expanded.value < reflected.value {
                expanded
            } else {
                reflected
            });
            continue;
        }
        if reflected.value < simplex.second_worst().value {
            simplex.replace_worst(reflected);
            continue;
        }

        let worst_value = worst.value;
        let contracted = if reflected.value < worst_value {
            let outside = evaluate(affine(&centroid, &reflected.point, config.rho, bounds));
            (outside.value <= reflected.value).then_some(outside)
        } else {
            let inside = evaluate(affine(&centroid, &worst.point, config.rho, bounds));
            (inside.value < worst_value).then_some(inside)
        };
        match contracted {
            Some(vertex) => simplex.replace_worst(vertex),
            None => simplex.shrink(config.sigma, bounds, &evaluate),
        }
    }

    let Vertex { point, value } = simplex.into_best();
    NelderMeadResult {
        optimal_point: point,
        optimal_value: value,
        iterations,
        converged,
        timed_out,
    }
}

#[derive(Debug, Clone)]
struct Vertex {
    point: Vec<f64>,
    value: f64,
}

/// n + 1 vertices; `order` puts the best first.
struct Simplex {
    vertices: Vec<Vertex>,
}

impl Simplex {
    /// Start from `initial` plus one vertex stepped along each axis.
    fn around<E>(initial: &[f64], step: f64, bounds: Option<&[(f64, f64)]>, evaluate: &E) -> Self
    where
        E: Fn(Vec<f64>) -> Vertex,
    {
        let mut vertices = Vec::with_capacity(initial.len() + 1);
        vertices.push(evaluate(initial.to_vec()));
        for (i, &x) in initial.iter().enumerate() {
            let mut point = initial.to_vec();
            point[i] += if x.abs() > 1e-10 { step * x.abs() } else { step };
            vertices.push(evaluate(clamp(point, bounds)));
        }
        Self { vertices }
    }

    fn order(&mut self) {
        self.vertices.sort_by(|a, b| a.value.total_cmp(&b.value));
    }

    fn best(&self) -> &Vertex {
        &self.vertices[0]
    }

    fn worst(&self) -> Vertex {
        self.vertices[self.vertices.len() - 1].clone()
    }

    fn second_worst(&self) -> &Vertex {
        &self.vertices[self.vertices.len() - 2]
    }

    fn spread(&self) -> f64 {
        self.vertices[self.vertices.len() - 1].value - self.vertices[0].value
    }

    /// Centroid of every vertex but the worst.
    fn centroid(&self) -> Vec<f64> {
        let kept = &self.vertices[..self.vertices.len() - 1];
        let mut centroid = vec![0.0; kept[0].point.len()];
        for vertex in kept {
            for (c, x) in centroid.iter_mut().zip(&vertex.point) {
                *c += x;
            }
        }
        let count = kept.len() as f64;
        centroid.iter_mut().for_each(|c| *c /= count);
        centroid
    }

    /// Largest distance from `center` to a vertex.
    fn radius(&self, center: &[f64]) -> f64 {
        self.vertices
            .iter()
            .map(|v| {
                v.point
                    .iter()
                    .zip(center)
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .fold(0.0, f64::max)
    }

    fn replace_worst(&mut self, vertex: Vertex) {
        let last = self.vertices.len() - 1;
        self.vertices[last] = vertex;
    }

    /// Pull every vertex toward the best one.
    fn shrink<E>(&mut self, sigma: f64, bounds: Option<&[(f64, f64)]>, evaluate: &E)
    where
        E: Fn(Vec<f64>) -> Vertex,
    {
        let best = self.vertices[0].point.clone();
        for vertex in self.vertices.iter_mut().skip(1) {
            *vertex = evaluate(affine(&best, &vertex.point, sigma, bounds));
        }
    }

    fn into_best(self) -> Vertex {
        self.vertices
            .into_iter()
            .min_by(|a, b| a.value.total_cmp(&b.value))
            .unwrap_or(Vertex {
                point: vec![],
                value: f64::NAN,
            })
    }
}

/// `origin + t * (toward - origin)`, clamped to `bounds`.
fn affine(origin: &[f64], toward: &[f64], t: f64, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    let point = origin
        .iter()
        .zip(toward)
        .map(|(o, p)| o + t * (p - o))
        .collect();
    clamp(point, bounds)
}

fn clamp(mut point: Vec<f64>, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    if let Some(bounds) = bounds {
        for (x, &(lo, hi)) in point.iter_mut().zip(bounds) {
            *x = x.clamp(lo, hi);
        }
    }
    point
}
