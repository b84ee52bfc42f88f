// =============================================================================
// Numeric Constants
// =============================================================================
//
// Thresholds shared by the links, families and solvers. Keeping them in one
// place means the clamping in the variance functions and the clamping in the
// inverse links can't drift apart.
//
// =============================================================================

/// Smallest μ allowed for families whose mean must be positive
/// (Poisson, Gamma, Inverse Gaussian) when evaluating the variance.
pub const MU_MIN_POSITIVE: f64 = 1e-10;

/// Lower clamp for probabilities when evaluating the Binomial variance.
pub const MU_MIN_PROBABILITY: f64 = 1e-10;

/// Upper clamp for probabilities when evaluating the Binomial variance.
pub const MU_MAX_PROBABILITY: f64 = 1.0 - 1e-10;

/// Beyond |η| = 30 the logistic function saturates at machine epsilon.
pub const LOGIT_THRESH: f64 = 30.0;

/// Cloglog's inverse overflows `exp(exp(η))` past this point.
pub const CLOGLOG_ETA_MAX: f64 = 700.0;

/// Added to |deviance_old| in the convergence denominator so an exactly
/// zero starting deviance (e.g. Gaussian, where μ₀ = y) cannot divide by 0.
pub const CONVERGENCE_DEVIANCE_FLOOR: f64 = 0.1;

/// Default relative threshold on |R_jj| / max|R_ii| below which a column
/// of the weighted design counts as linearly dependent.
pub const DEFAULT_RANK_TOLERANCE: f64 = 1e-11;

/// Standard errors at or below this are treated as degenerate when
/// forming test statistics.
pub const MIN_STD_ERROR: f64 = 1e-10;

/// Leverages within this distance of 1 are treated as exactly 1.
pub const LEVERAGE_ONE_TOL: f64 = 10.0 * f64::EPSILON;
