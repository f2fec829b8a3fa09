// =============================================================================
// Distribution Families
// =============================================================================
//
// The family tag records which response distribution the model assumes. It is
// configuration only: the likelihood evaluator always uses the softplus
// transform, whatever family is selected. The tag is stored, reported through
// the parameter table, and can be set from a name string.
//
// =============================================================================

use std::fmt;
use std::str::FromStr;

use crate::error::GlmError;
use crate::links::LinkFunction;

/// Response distribution assumed by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DistributionFamily {
    /// Normal noise, constant variance.
    Gaussian,
    /// Counts, variance equal to the mean.
    #[default]
    Poisson,
    /// Binary or proportion responses.
    Binomial,
}

impl DistributionFamily {
    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            DistributionFamily::Gaussian => "gaussian",
            DistributionFamily::Poisson => "poisson",
            DistributionFamily::Binomial => "binomial",
        }
    }

    /// Canonical link for the family.
    pub fn default_link(&self) -> LinkFunction {
        match self {
            DistributionFamily::Gaussian => LinkFunction::Identity,
            DistributionFamily::Poisson => LinkFunction::Log,
            DistributionFamily::Binomial => LinkFunction::Logit,
        }
    }
}

impl fmt::Display for DistributionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case-insensitive, accepts the usual aliases.
impl FromStr for DistributionFamily {
    type Err = GlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gaussian" | "normal" => Ok(DistributionFamily::Gaussian),
            "poisson" => Ok(DistributionFamily::Poisson),
            "binomial" | "logistic" | "bernoulli" => Ok(DistributionFamily::Binomial),
            _ => Err(GlmError::InvalidArgument(format!(
                "unknown family '{}'. Use 'gaussian', 'poisson', or 'binomial'.",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Normal".parse::<DistributionFamily>().unwrap(), DistributionFamily::Gaussian);
        assert_eq!(" poisson ".parse::<DistributionFamily>().unwrap(), DistributionFamily::Poisson);
        assert_eq!("logistic".parse::<DistributionFamily>().unwrap(), DistributionFamily::Binomial);
    }

    #[test]
    fn test_parse_unknown_is_invalid_argument() {
        let err = "tweedie".parse::<DistributionFamily>().unwrap_err();
        assert!(matches!(err, GlmError::InvalidArgument(_)));
    }

    #[test]
    fn test_name_roundtrips_through_display() {
        for family in [
            DistributionFamily::Gaussian,
            DistributionFamily::Poisson,
            DistributionFamily::Binomial,
        ] {
            assert_eq!(family.to_string().parse::<DistributionFamily>().unwrap(), family);
        }
    }

    #[test]
    fn test_default_links() {
        assert_eq!(DistributionFamily::Gaussian.default_link(), LinkFunction::Identity);
        assert_eq!(DistributionFamily::Poisson.default_link(), LinkFunction::Log);
        assert_eq!(DistributionFamily::Binomial.default_link(), LinkFunction::Logit);
    }
}
