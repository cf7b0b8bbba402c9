//! Feedforward muscle controller
//!
//! Maps the encoded body state plus a periodic drive signal to one
//! contraction set-point per muscle. Weights are drawn once at construction
//! from a seeded RNG and never mutated: there is no training step, the
//! controller is a pure function for the lifetime of the creature.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::RigError;

/// Width of the periodic drive signal vector
pub const DRIVE_DIM: usize = 6;

/// Periodic drive signals at three harmonics of elapsed simulated time.
///
/// A stand-in for an external rhythm or command input: the controller gets a
/// phase reference for periodic gaits. Pure function of `time`.
pub fn drive_signals(time: f32) -> [f32; DRIVE_DIM] {
    [
        time.sin(),
        time.cos(),
        (2.0 * time).sin(),
        (2.0 * time).cos(),
        (3.0 * time).sin(),
        (3.0 * time).cos(),
    ]
}

/// How raw output activations become contraction set-points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Softmax across outputs (entrywise >= 0, sums to 1), then scaled.
    /// Muscles compete for a fixed activation budget.
    #[default]
    Normalized,
    /// Rectified activations scaled directly; each muscle's clamp range does
    /// the constraining.
    Direct,
}

/// Controller hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrainConfig {
    /// Hidden layer width
    pub hidden_units: usize,
    /// Standard deviation of the zero-mean normal weight initialization
    pub weight_std: f32,
    /// Biases are drawn uniformly from (-bias_range, bias_range)
    pub bias_range: f32,
    /// Rescales normalized outputs into the muscles' contraction range
    pub output_scale: f32,
    pub output_mode: OutputMode,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            hidden_units: 30,
            weight_std: 0.5,
            bias_range: 0.5,
            output_scale: 10.0,
            output_mode: OutputMode::Normalized,
        }
    }
}

/// Softmax over a finite activation vector.
///
/// Shifted by the maximum entry so large activations cannot overflow.
/// An empty slice yields an empty vector.
pub fn softmax(values: &[f32]) -> Vec<f32> {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = values.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

/// Two-layer feedforward controller with fixed weights.
///
/// Input layer width is the encoder state width plus [`DRIVE_DIM`]; output
/// width is the muscle count, in muscle-interface order. The first layer is
/// linear, the second rectified; output activations then pass through the
/// configured [`OutputMode`].
pub struct Brain {
    w1: Vec<f32>,
    b1: Vec<f32>,
    w2: Vec<f32>,
    b2: Vec<f32>,
    input_dim: usize,
    hidden_dim: usize,
    output_dim: usize,
    output_scale: f32,
    output_mode: OutputMode,
}

impl Brain {
    /// Build a controller for `muscle_count` muscles reading `state_dim`
    /// encoder values, with weights drawn from the provided RNG.
    ///
    /// Pass a seeded RNG for reproducible controllers.
    pub fn new<R: Rng>(
        state_dim: usize,
        muscle_count: usize,
        config: &BrainConfig,
        rng: &mut R,
    ) -> Self {
        let input_dim = state_dim + DRIVE_DIM;
        let hidden_dim = config.hidden_units;
        let output_dim = muscle_count;

        let normal = Normal::new(0.0, config.weight_std).expect("weight_std must be finite");
        let bias = config.bias_range;

        let w1: Vec<f32> = (0..input_dim * hidden_dim)
            .map(|_| normal.sample(rng))
            .collect();
        let b1: Vec<f32> = (0..hidden_dim).map(|_| rng.random_range(-bias..bias)).collect();
        let w2: Vec<f32> = (0..hidden_dim * output_dim)
            .map(|_| normal.sample(rng))
            .collect();
        let b2: Vec<f32> = (0..output_dim).map(|_| rng.random_range(-bias..bias)).collect();

        log::debug!(
            "Brain: {} -> {} -> {} ({} weights)",
            input_dim,
            hidden_dim,
            output_dim,
            w1.len() + w2.len()
        );

        Self {
            w1,
            b1,
            w2,
            b2,
            input_dim,
            hidden_dim,
            output_dim,
            output_scale: config.output_scale,
            output_mode: config.output_mode,
        }
    }

    /// Total input width (encoder state + drive signals)
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Output width (one value per muscle)
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// Verify that an encoder producing `state_len` values fits this
    /// controller's input layer.
    ///
    /// A mismatch means the rig and the controller were built from different
    /// muscle sets and inference would read garbage, so callers must treat
    /// this as fatal at construction time.
    pub fn check_state_dim(&self, state_len: usize) -> Result<(), RigError> {
        let expected = self.input_dim - DRIVE_DIM;
        if state_len != expected {
            return Err(RigError::DimensionMismatch {
                expected,
                actual: state_len,
            });
        }
        Ok(())
    }

    /// Forward pass: encoded state + drive signals -> contraction set-points.
    ///
    /// hidden = W1 * input + b1 (linear), out = relu(W2 * hidden + b2),
    /// then normalization/scaling per the configured output mode.
    pub fn infer(&self, input: &[f32]) -> Vec<f32> {
        assert_eq!(input.len(), self.input_dim, "input dimension mismatch");

        let mut hidden = vec![0.0; self.hidden_dim];
        #[allow(clippy::needless_range_loop)]
        for h in 0..self.hidden_dim {
            let mut sum = self.b1[h];
            for i in 0..self.input_dim {
                sum += input[i] * self.w1[h * self.input_dim + i];
            }
            hidden[h] = sum;
        }

        let mut output = vec![0.0; self.output_dim];
        #[allow(clippy::needless_range_loop)]
        for o in 0..self.output_dim {
            let mut sum = self.b2[o];
            for h in 0..self.hidden_dim {
                sum += hidden[h] * self.w2[o * self.hidden_dim + h];
            }
            output[o] = sum.max(0.0); // relu
        }

        match self.output_mode {
            OutputMode::Normalized => softmax(&output)
                .into_iter()
                .map(|v| v * self.output_scale)
                .collect(),
            OutputMode::Direct => output.into_iter().map(|v| v * self.output_scale).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    fn test_brain(state_dim: usize, muscle_count: usize) -> Brain {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        Brain::new(state_dim, muscle_count, &BrainConfig::default(), &mut rng)
    }

    #[test]
    fn test_drive_signals_at_zero() {
        let signals = drive_signals(0.0);
        assert_eq!(signals, [0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_drive_signals_at_pi() {
        let signals = drive_signals(std::f32::consts::PI);
        assert_relative_eq!(signals[0], 0.0, epsilon = 1.0e-5);
        assert_relative_eq!(signals[1], -1.0, epsilon = 1.0e-5);
        assert_relative_eq!(signals[2], 0.0, epsilon = 1.0e-5);
        assert_relative_eq!(signals[3], 1.0, epsilon = 1.0e-5);
        assert_relative_eq!(signals[4], 0.0, epsilon = 1.0e-5);
        assert_relative_eq!(signals[5], -1.0, epsilon = 1.0e-5);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let out = softmax(&[0.3, 1.2, 0.0, 4.5]);
        let sum: f32 = out.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1.0e-6);
        assert!(out.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_softmax_uniform_on_equal_inputs() {
        let out = softmax(&[0.0, 0.0, 0.0, 0.0]);
        for v in out {
            assert_relative_eq!(v, 0.25, epsilon = 1.0e-6);
        }
    }

    #[test]
    fn test_infer_output_is_normalized_and_scaled() {
        let brain = test_brain(12, 8);
        let input = vec![0.25; brain.input_dim()];

        let output = brain.infer(&input);
        assert_eq!(output.len(), 8);
        assert!(output.iter().all(|&v| v >= 0.0));

        let sum: f32 = output.iter().sum();
        assert_relative_eq!(sum, BrainConfig::default().output_scale, epsilon = 1.0e-3);
    }

    #[test]
    fn test_infer_handles_all_zero_input() {
        let brain = test_brain(12, 8);
        let input = vec![0.0; brain.input_dim()];

        let output = brain.infer(&input);
        let sum: f32 = output.iter().sum();
        assert!(output.iter().all(|&v| v.is_finite() && v >= 0.0));
        assert_relative_eq!(sum, BrainConfig::default().output_scale, epsilon = 1.0e-3);
    }

    #[test]
    fn test_infer_is_deterministic_for_a_seed() {
        let a = test_brain(10, 4);
        let b = test_brain(10, 4);
        let input: Vec<f32> = (0..a.input_dim()).map(|i| i as f32 * 0.1).collect();
        assert_eq!(a.infer(&input), b.infer(&input));
    }

    #[test]
    fn test_check_state_dim() {
        let brain = test_brain(20, 5);
        assert!(brain.check_state_dim(20).is_ok());

        let err = brain.check_state_dim(19).unwrap_err();
        assert!(matches!(
            err,
            RigError::DimensionMismatch {
                expected: 20,
                actual: 19
            }
        ));
    }

    #[test]
    #[should_panic(expected = "input dimension mismatch")]
    fn test_infer_rejects_wrong_input_width() {
        let brain = test_brain(10, 4);
        brain.infer(&vec![0.0; 3]);
    }

    #[test]
    fn test_direct_mode_skips_normalization() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(7);
        let config = BrainConfig {
            output_mode: OutputMode::Direct,
            ..BrainConfig::default()
        };
        let brain = Brain::new(6, 4, &config, &mut rng);
        let output = brain.infer(&vec![0.5; brain.input_dim()]);

        // Rectified outputs are non-negative but carry no sum constraint
        assert!(output.iter().all(|&v| v >= 0.0));
    }
}
