// =============================================================================
// Link Functions
// =============================================================================
//
// A link g maps the mean μ to the linear predictor: η = g(μ).
//
//   Identity:  g(μ) = μ
//   Log:       g(μ) = log(μ)
//   Logit:     g(μ) = log(μ / (1 - μ))
//   Inverse:   g(μ) = 1 / μ
//
// Like the family, the link is a configuration tag held by the model. The
// evaluator's mean transform is fixed (softplus) and does not consult it.
//
// =============================================================================

use std::fmt;
use std::str::FromStr;

use crate::error::GlmError;

/// Link between the linear predictor and the response mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LinkFunction {
    Identity,
    #[default]
    Log,
    Logit,
    Inverse,
}

impl LinkFunction {
    pub fn name(&self) -> &'static str {
        match self {
            LinkFunction::Identity => "identity",
            LinkFunction::Log => "log",
            LinkFunction::Logit => "logit",
            LinkFunction::Inverse => "inverse",
        }
    }
}

impl fmt::Display for LinkFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LinkFunction {
    type Err = GlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "identity" => Ok(LinkFunction::Identity),
            "log" => Ok(LinkFunction::Log),
            "logit" => Ok(LinkFunction::Logit),
            "inverse" | "reciprocal" => Ok(LinkFunction::Inverse),
            _ => Err(GlmError::InvalidArgument(format!(
                "unknown link '{}'. Use 'identity', 'log', 'logit', or 'inverse'.",
                s
            ))),
        }
    }
}
