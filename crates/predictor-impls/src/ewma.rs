use placesim_core::{ContainerId, Prediction, TrafficGenerator, TrafficMatrix, TrafficPredictor};

const DEFAULT_ALPHA: f64 = 0.3;

/// An exponentially weighted moving average of incoming volume per
/// container, with the exponentially weighted standard deviation serving as
/// the uncertainty signal. The first observation primes the averages.
#[derive(Debug, Clone)]
pub struct EwmaPredictor {
    alpha: f64,
    means: Vec<f64>,
    variances: Vec<f64>,
    primed: bool,
}

impl EwmaPredictor {
    pub fn new(num_containers: usize) -> Self {
        Self::with_alpha(num_containers, DEFAULT_ALPHA)
    }

    pub fn with_alpha(num_containers: usize, alpha: f64) -> Self {
        Self {
            alpha,
            means: vec![0.0; num_containers],
            variances: vec![0.0; num_containers],
            primed: false,
        }
    }

    fn observe(&mut self, matrix: &TrafficMatrix) {
        let observed = (0..self.means.len())
            .map(|i| matrix.incoming_volume(ContainerId::new(i)))
            .collect::<Vec<_>>();
        if !self.primed {
            self.means = observed;
            self.primed = true;
            return;
        }
        for (i, &x) in observed.iter().enumerate() {
            let delta = x - self.means[i];
            self.means[i] += self.alpha * delta;
            self.variances[i] =
                (1.0 - self.alpha) * (self.variances[i] + self.alpha * delta * delta);
        }
    }
}

impl TrafficPredictor for EwmaPredictor {
    fn train(&mut self, generator: &TrafficGenerator) {
        self.observe(generator.matrix());
    }

    fn predict(&mut self, matrix: &TrafficMatrix) -> Prediction {
        self.observe(matrix);
        Prediction {
            volumes: self.means.clone(),
            uncertainties: self.variances.iter().map(|v| v.sqrt()).collect(),
        }
    }

    fn reset(&mut self) {
        self.means.iter_mut().for_each(|m| *m = 0.0);
        self.variances.iter_mut().for_each(|v| *v = 0.0);
        self.primed = false;
    }
}
