/// Smallest |slope| the fitted model may have before it is treated as flat.
pub(super) const MIN_INVERTIBLE_SLOPE: f64 = 1e-6;

/// Result of an estimator that can be undefined for degenerate input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Estimate<T> {
    Computable(T),
    Undefined(&'static str),
}

impl<T> Estimate<T> {
    pub(super) fn computable(self) -> Option<T> {
        match self {
            Self::Computable(value) => Some(value),
            Self::Undefined(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct LinearFit {
    pub(super) slope: f64,
    pub(super) intercept: f64,
}

impl LinearFit {
    pub(super) fn is_invertible(&self) -> bool {
        self.slope.abs() > MIN_INVERTIBLE_SLOPE
    }

    /// Solves `y = slope * x + intercept` for `x`. Only meaningful when
    /// [`LinearFit::is_invertible`] holds.
    pub(super) fn solve_for_x(&self, y: f64) -> f64 {
        (y - self.intercept) / self.slope
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct ErrorSummary {
    pub(super) n: usize,
    pub(super) human_mean: f64,
    pub(super) judge_mean: f64,
    /// Mean of `judge - human`.
    pub(super) bias: f64,
    pub(super) mae: f64,
    pub(super) rmse: f64,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn check_paired(x: &[f64], y: &[f64]) -> Result<(), &'static str> {
    if x.len() != y.len() {
        return Err("sequences differ in length");
    }
    if x.len() < 2 {
        return Err("fewer than 2 points");
    }
    Ok(())
}

pub(super) fn pearson(x: &[f64], y: &[f64]) -> Estimate<f64> {
    if let Err(reason) = check_paired(x, y) {
        return Estimate::Undefined(reason);
    }

    let mean_x = mean(x);
    let mean_y = mean(y);
    let mut num = 0.0_f64;
    let mut den_x = 0.0_f64;
    let mut den_y = 0.0_f64;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        num += dx * dy;
        den_x += dx * dx;
        den_y += dy * dy;
    }

    if den_x <= 0.0 || den_y <= 0.0 {
        return Estimate::Undefined("zero variance");
    }
    Estimate::Computable((num / (den_x * den_y).sqrt()).clamp(-1.0, 1.0))
}

/// Ordinary least squares fit of `y ≈ slope * x + intercept`.
pub(super) fn linear_fit(x: &[f64], y: &[f64]) -> Estimate<LinearFit> {
    if let Err(reason) = check_paired(x, y) {
        return Estimate::Undefined(reason);
    }

    let mean_x = mean(x);
    let mean_y = mean(y);
    let mut sxx = 0.0_f64;
    let mut sxy = 0.0_f64;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        sxx += dx * dx;
        sxy += dx * (b - mean_y);
    }

    if sxx <= 0.0 {
        return Estimate::Undefined("zero variance in x");
    }
    let slope = sxy / sxx;
    Estimate::Computable(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Bias, MAE and RMSE over one shared `judge - human` error list.
pub(super) fn summarize_errors(human: &[f64], judge: &[f64]) -> Option<ErrorSummary> {
    if human.is_empty() || human.len() != judge.len() {
        return None;
    }

    let errors = human
        .iter()
        .zip(judge)
        .map(|(h, j)| j - h)
        .collect::<Vec<f64>>();
    let n = errors.len() as f64;

    Some(ErrorSummary {
        n: errors.len(),
        human_mean: mean(human),
        judge_mean: mean(judge),
        bias: errors.iter().sum::<f64>() / n,
        mae: errors.iter().map(|e| e.abs()).sum::<f64>() / n,
        rmse: (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt(),
    })
}
