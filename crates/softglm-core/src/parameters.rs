// =============================================================================
// Parameter Descriptors
// =============================================================================
//
// A model publishes its settings as a table of descriptors: a name, a
// human-readable description, and a mutability category. The table is plain
// data that callers can list and query; reading and writing the values goes
// through the owning model (`Glm::get_parameter` / `Glm::set_parameter`),
// using `ParameterValue` as the currency.
//
// The numeric evaluators never look at this table.
//
// =============================================================================

use std::fmt;

use ndarray::Array1;

use crate::families::DistributionFamily;
use crate::links::LinkFunction;
use crate::updater::DescendUpdater;

/// How a registered parameter may change over the model's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    /// Chosen by the user before training; fixed during evaluation.
    Setting,
    /// Learned state, written by the optimizer.
    Model,
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mutability::Setting => "setting",
            Mutability::Model => "model",
        };
        f.write_str(s)
    }
}

/// One registered parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub mutability: Mutability,
}

/// Ordered collection of descriptors, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterTable {
    entries: Vec<ParameterDescriptor>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter. Re-registering a name replaces the earlier entry
    /// in place.
    pub fn register(
        &mut self,
        name: &'static str,
        description: &'static str,
        mutability: Mutability,
    ) -> &mut Self {
        let descriptor = ParameterDescriptor {
            name,
            description,
            mutability,
        };
        match self.entries.iter_mut().find(|d| d.name == name) {
            Some(existing) => *existing = descriptor,
            None => self.entries.push(descriptor),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.entries.iter().find(|d| d.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|d| d.name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A parameter value read from or written to a model.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Real(f64),
    Vector(Array1<f64>),
    Family(DistributionFamily),
    Link(LinkFunction),
    Updater(DescendUpdater),
    /// Name form, parsed by the receiving parameter (e.g. "poisson", "logit").
    Text(String),
}

impl ParameterValue {
    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParameterValue::Real(_) => "real",
            ParameterValue::Vector(_) => "vector",
            ParameterValue::Family(_) => "family",
            ParameterValue::Link(_) => "link",
            ParameterValue::Updater(_) => "updater",
            ParameterValue::Text(_) => "text",
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        ParameterValue::Real(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        ParameterValue::Text(v.to_string())
    }
}

impl From<DistributionFamily> for ParameterValue {
    fn from(v: DistributionFamily) -> Self {
        ParameterValue::Family(v)
    }
}

impl From<LinkFunction> for ParameterValue {
    fn from(v: LinkFunction) -> Self {
        ParameterValue::Link(v)
    }
}

impl From<DescendUpdater> for ParameterValue {
    fn from(v: DescendUpdater) -> Self {
        ParameterValue::Updater(v)
    }
}

impl From<Array1<f64>> for ParameterValue {
    fn from(v: Array1<f64>) -> Self {
        ParameterValue::Vector(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_preserves_order() {
        let mut table = ParameterTable::new();
        table
            .register("b", "second letter", Mutability::Setting)
            .register("a", "first letter", Mutability::Model);

        assert_eq!(table.names(), vec!["b", "a"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a").unwrap().mutability, Mutability::Model);
        assert!(table.get("c").is_none());
    }

    #[test]
    fn test_reregister_replaces() {
        let mut table = ParameterTable::new();
        table.register("x", "old", Mutability::Setting);
        table.register("y", "other", Mutability::Setting);
        table.register("x", "new", Mutability::Model);

        assert_eq!(table.names(), vec!["x", "y"]);
        let x = table.get("x").unwrap();
        assert_eq!(x.description, "new");
        assert_eq!(x.mutability, Mutability::Model);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(ParameterValue::from(1.5), ParameterValue::Real(1.5));
        assert_eq!(ParameterValue::from("logit").kind(), "text");
        assert_eq!(ParameterValue::from(LinkFunction::Logit).kind(), "link");
        assert_eq!(Mutability::Model.to_string(), "model");
    }
}
