use rand::Rng;
use serde::{Deserialize, Serialize};

/// Stand-in for "infinitely far / never matched".
pub const INFINITY_SENTINEL: f64 = 1e19;

const SECANT_TOLERANCE: f64 = 1e-14;
const SECANT_MAX_ITERATIONS: usize = 100;

/// One measured quantity over a set of elements.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Property {
    pub measures: Vec<f64>,
    pub avg: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    #[serde(skip)]
    sum: f64,
    #[serde(skip)]
    norm: f64,
}

impl Default for Property {
    fn default() -> Self {
        Property {
            measures: vec![],
            avg: 0.0,
            std: 0.0,
            min: INFINITY_SENTINEL,
            max: -1.0,
            sum: 0.0,
            norm: 0.0,
        }
    }
}

impl Property {
    pub fn new() -> Property {
        Property::default()
    }

    /// Record a measure, weighted by `confidence` in the average.
    pub fn push(&mut self, measure: f64, confidence: f64) {
        self.measures.push(measure);
        self.sum += measure * confidence;
        self.norm += confidence;
        self.min = self.min.min(measure);
        self.max = self.max.max(measure);
    }

    /// Compute avg and std from everything pushed so far. An empty property
    /// ends up with an average and deviation of zero.
    pub fn finalize(&mut self) {
        if self.measures.is_empty() || self.norm <= 0.0 {
            self.avg = 0.0;
            self.std = 0.0;
            return;
        }
        self.avg = self.sum / self.norm;
        let var = self.measures.iter().map(|m| (m - self.avg).powi(2)).sum::<f64>() / self.measures.len() as f64;
        self.std = var.sqrt();
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    /// Measures sorted ascending.
    pub fn sorted(&self) -> Vec<f64> {
        let mut sorted = self.measures.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted
    }

    /// Clamp a value into the observed range. Empty properties leave it alone.
    pub fn clamp(&self, value: f64) -> f64 {
        if self.is_empty() {
            value
        } else {
            value.max(self.min).min(self.max)
        }
    }
}

/// Standard normal cumulative distribution, from its Taylor series.
pub fn normal_distrib(x: f64) -> f64 {
    if x < 0.0 {
        return 1.0 - normal_distrib(-x);
    }
    if x > 12.0 {
        return 1.0;
    }
    let mut sum = x;
    let mut term = x;
    let mut n = 1.0;
    loop {
        term *= x * x / (2.0 * n + 1.0);
        if term <= 1e-17 * sum {
            break;
        }
        sum += term;
        n += 1.0;
    }
    0.5 + sum * (-x * x / 2.0).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// Solve `normal_distrib(x) == a` for `a` in [0.5, 1) with the secant method.
pub fn secant(a: f64) -> f64 {
    let mut xi = 1.0;
    let mut xii = 1.1;
    let mut yi = normal_distrib(xi) - a;
    let mut yii = normal_distrib(xii) - a;
    for _ in 0..SECANT_MAX_ITERATIONS {
        if yii.abs() <= SECANT_TOLERANCE || (yii - yi).abs() < f64::MIN_POSITIVE {
            break;
        }
        let next = xii - yii * (xii - xi) / (yii - yi);
        xi = xii;
        yi = yii;
        xii = next;
        yii = normal_distrib(xii) - a;
    }
    xii
}

/// Draw from a normal distribution by inverting its CDF, then clamp the
/// result to two deviations either side of the mean.
pub fn sample<R: Rng + ?Sized>(rng: &mut R, avg: f64, std: f64) -> f64 {
    let std = std.abs();
    if std == 0.0 || !std.is_finite() {
        return avg;
    }
    let x: f64 = rng.gen();
    let p = if x == 0.5 {
        0.0
    } else if x < 0.5 {
        -secant(1.0 - x)
    } else {
        secant(x)
    };
    (p * std + avg).max(avg - 2.0 * std).min(avg + 2.0 * std)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_property_stats() {
        let mut p = Property::new();
        for m in [1.0, 2.0, 3.0, 4.0] {
            p.push(m, 1.0);
        }
        p.finalize();
        assert!((p.avg - 2.5).abs() < 1e-12);
        assert!((p.std - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!(p.min, 1.0);
        assert_eq!(p.max, 4.0);
        assert!(p.min <= p.avg && p.avg <= p.max);
        assert_eq!(p.sorted(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(p.clamp(10.0), 4.0);
    }

    #[test]
    fn test_empty_property() {
        let mut p = Property::new();
        p.finalize();
        assert_eq!(p.avg, 0.0);
        assert_eq!(p.std, 0.0);
        assert!(!p.avg.is_nan() && !p.std.is_nan());
    }

    #[test]
    fn test_normal_distrib() {
        assert!((normal_distrib(0.0) - 0.5).abs() < 1e-12);
        assert!((normal_distrib(1.0) - 0.841344746).abs() < 1e-8);
        assert!((normal_distrib(-1.96) - 0.024997895).abs() < 1e-8);
        assert_eq!(normal_distrib(13.0), 1.0);
    }

    #[test]
    fn test_secant_inverts() {
        for a in [0.6, 0.75, 0.9, 0.975] {
            let x = secant(a);
            assert!((normal_distrib(x) - a).abs() < 1e-10);
        }
    }

    #[test]
    fn test_sample_distribution() {
        let mut rng = SmallRng::seed_from_u64(42);
        let (avg, std) = (3.0, 0.5);
        let n = 100_000;
        let draws: Vec<f64> = (0..n).map(|_| sample(&mut rng, avg, std)).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        println!("Sample mean: {}", mean);
        assert!((mean - avg).abs() < 0.01);
        for d in draws.iter() {
            assert!(*d >= avg - 2.0 * std && *d <= avg + 2.0 * std);
        }
        let var = draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n as f64;
        // Clamping at two deviations trims the variance a little.
        assert!(var.sqrt() < std && var.sqrt() > 0.8 * std);
    }

    #[test]
    fn test_sample_zero_std() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(sample(&mut rng, 1.5, 0.0), 1.5);
    }
}
