use serde::{Deserialize, Serialize};

/// Ordered literal SQL statements, in the order of the operations that
/// produced them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlPlan {
    statements: Vec<String>,
}

impl SqlPlan {
    pub fn new(statements: Vec<String>) -> Self {
        Self { statements }
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Append the statements of another plan, keeping both orders
    pub fn extend(&mut self, other: SqlPlan) {
        self.statements.extend(other.statements);
    }
}

impl IntoIterator for SqlPlan {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_appends_in_order() {
        let mut plan = SqlPlan::new(vec!["A".to_string()]);
        plan.extend(SqlPlan::new(vec!["B".to_string(), "C".to_string()]));
        assert_eq!(plan.statements(), ["A", "B", "C"]);
        assert_eq!(plan.into_iter().last().as_deref(), Some("C"));
    }
}
