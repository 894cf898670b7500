// Rewrite passes applied to each operation before rendering
use crate::models::Operation;

/// A pure rewrite of an operation.
///
/// Passes must be idempotent: applying one twice gives the same operation as
/// applying it once.
pub trait Optimizer: Send + Sync {
    fn name(&self) -> &str;

    fn optimize(&self, operation: Operation) -> Operation;
}

/// Upper-cases every identifier (dataset levels and column names)
#[derive(Debug, Clone, Copy, Default)]
pub struct UpperCaseOptimizer;

impl Optimizer for UpperCaseOptimizer {
    fn name(&self) -> &str {
        "upper_case"
    }

    fn optimize(&self, operation: Operation) -> Operation {
        operation.map_identifiers(&|identifier: &str| identifier.to_uppercase())
    }
}

/// Lower-cases every identifier
#[derive(Debug, Clone, Copy, Default)]
pub struct LowerCaseOptimizer;

impl Optimizer for LowerCaseOptimizer {
    fn name(&self) -> &str {
        "lower_case"
    }

    fn optimize(&self, operation: Operation) -> Operation {
        operation.map_identifiers(&|identifier: &str| identifier.to_lowercase())
    }
}

/// Optimizer built from an identifier-to-identifier function.
///
/// The caller is responsible for the function being idempotent.
pub struct IdentifierOptimizer<F> {
    name: String,
    rewrite: F,
}

impl<F> IdentifierOptimizer<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    pub fn new(name: impl Into<String>, rewrite: F) -> Self {
        Self {
            name: name.into(),
            rewrite,
        }
    }
}

impl<F> Optimizer for IdentifierOptimizer<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn optimize(&self, operation: Operation) -> Operation {
        operation.map_identifiers(&self.rewrite)
    }
}
