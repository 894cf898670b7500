// Logical plan: dialect-independent operations over datasets
use crate::models::Dataset;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFunction {
    Max,
    Min,
    Count,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Max => "MAX",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Count => "COUNT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticOperator {
    Plus,
    Minus,
}

impl ArithmeticOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithmeticOperator::Plus => "+",
            ArithmeticOperator::Minus => "-",
        }
    }
}

/// A typed value expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Literal(Literal),
    /// The execution-time clock value for this run, resolved by the
    /// transformer from its injected clock
    BatchStartTimestamp,
    Column {
        qualifier: Option<String>,
        name: String,
    },
    Aggregate {
        function: AggregateFunction,
        argument: Box<Value>,
    },
    Arithmetic {
        operator: ArithmeticOperator,
        left: Box<Value>,
        right: Box<Value>,
    },
}

impl Value {
    pub fn null() -> Self {
        Value::Literal(Literal::Null)
    }

    pub fn integer(value: i64) -> Self {
        Value::Literal(Literal::Integer(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::Literal(Literal::String(value.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Value::Literal(Literal::Boolean(value))
    }

    pub fn column(name: impl Into<String>) -> Self {
        Value::Column {
            qualifier: None,
            name: name.into(),
        }
    }

    /// Column reference qualified by its table name
    pub fn qualified_column(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Value::Column {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }

    pub fn max(argument: Value) -> Self {
        Value::Aggregate {
            function: AggregateFunction::Max,
            argument: Box::new(argument),
        }
    }

    pub fn plus(self, right: Value) -> Self {
        Value::Arithmetic {
            operator: ArithmeticOperator::Plus,
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    fn map_identifiers(self, f: &dyn Fn(&str) -> String) -> Self {
        match self {
            Value::Column { qualifier, name } => Value::Column {
                qualifier: qualifier.map(|q| f(&q)),
                name: f(&name),
            },
            Value::Aggregate { function, argument } => Value::Aggregate {
                function,
                argument: Box::new(argument.map_identifiers(f)),
            },
            Value::Arithmetic {
                operator,
                left,
                right,
            } => Value::Arithmetic {
                operator,
                left: Box::new(left.map_identifiers(f)),
                right: Box::new(right.map_identifiers(f)),
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Always true; rendered as `1 = 1`
    Tautology,
    Equals(Value, Value),
    IsNull(Value),
    IsNotNull(Value),
    And(Vec<Condition>),
    Not(Box<Condition>),
    Exists(Box<Select>),
    NotExists(Box<Select>),
}

impl Condition {
    fn map_identifiers(self, f: &dyn Fn(&str) -> String) -> Self {
        match self {
            Condition::Tautology => Condition::Tautology,
            Condition::Equals(left, right) => {
                Condition::Equals(left.map_identifiers(f), right.map_identifiers(f))
            }
            Condition::IsNull(value) => Condition::IsNull(value.map_identifiers(f)),
            Condition::IsNotNull(value) => Condition::IsNotNull(value.map_identifiers(f)),
            Condition::And(conditions) => Condition::And(
                conditions
                    .into_iter()
                    .map(|c| c.map_identifiers(f))
                    .collect(),
            ),
            Condition::Not(inner) => Condition::Not(Box::new(inner.map_identifiers(f))),
            Condition::Exists(select) => Condition::Exists(Box::new(select.map_identifiers(f))),
            Condition::NotExists(select) => {
                Condition::NotExists(Box::new(select.map_identifiers(f)))
            }
        }
    }
}

/// A projection, optionally over a dataset. An empty value list means `*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Select {
    pub values: Vec<Value>,
    pub source: Option<Dataset>,
    pub condition: Option<Condition>,
}

impl Select {
    pub fn all_from(source: Dataset) -> Self {
        Self {
            values: Vec::new(),
            source: Some(source),
            condition: None,
        }
    }

    pub fn values(values: Vec<Value>) -> Self {
        Self {
            values,
            source: None,
            condition: None,
        }
    }

    pub fn from(mut self, source: Dataset) -> Self {
        self.source = Some(source);
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    fn map_identifiers(self, f: &dyn Fn(&str) -> String) -> Self {
        Self {
            values: self
                .values
                .into_iter()
                .map(|v| v.map_identifiers(f))
                .collect(),
            source: self.source.map(|d| map_dataset(d, f)),
            condition: self.condition.map(|c| c.map_identifiers(f)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InsertSource {
    Values(Vec<Vec<Value>>),
    Select(Select),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShowKind {
    Tables,
    Schemas,
    Columns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    Create {
        dataset: Dataset,
        if_not_exists: bool,
    },
    Drop {
        dataset: Dataset,
        if_exists: bool,
    },
    Delete {
        dataset: Dataset,
        condition: Condition,
    },
    Insert {
        dataset: Dataset,
        columns: Vec<String>,
        source: InsertSource,
    },
    Update {
        dataset: Dataset,
        assignments: Vec<(String, Value)>,
        condition: Condition,
    },
    Select(Select),
    Show {
        kind: ShowKind,
        dataset: Dataset,
    },
}

impl Operation {
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Create { .. } => "create",
            Operation::Drop { .. } => "drop",
            Operation::Delete { .. } => "delete",
            Operation::Insert { .. } => "insert",
            Operation::Update { .. } => "update",
            Operation::Select(_) => "select",
            Operation::Show { .. } => "show",
        }
    }

    /// Rewrite every identifier (dataset levels, column names, qualifiers).
    /// String literals are left untouched.
    pub fn map_identifiers(self, f: &dyn Fn(&str) -> String) -> Self {
        match self {
            Operation::Create {
                dataset,
                if_not_exists,
            } => Operation::Create {
                dataset: map_dataset(dataset, f),
                if_not_exists,
            },
            Operation::Drop { dataset, if_exists } => Operation::Drop {
                dataset: map_dataset(dataset, f),
                if_exists,
            },
            Operation::Delete { dataset, condition } => Operation::Delete {
                dataset: map_dataset(dataset, f),
                condition: condition.map_identifiers(f),
            },
            Operation::Insert {
                dataset,
                columns,
                source,
            } => Operation::Insert {
                dataset: map_dataset(dataset, f),
                columns: columns.iter().map(|c| f(c)).collect(),
                source: match source {
                    InsertSource::Values(rows) => InsertSource::Values(
                        rows.into_iter()
                            .map(|row| row.into_iter().map(|v| v.map_identifiers(f)).collect())
                            .collect(),
                    ),
                    InsertSource::Select(select) => {
                        InsertSource::Select(select.map_identifiers(f))
                    }
                },
            },
            Operation::Update {
                dataset,
                assignments,
                condition,
            } => Operation::Update {
                dataset: map_dataset(dataset, f),
                assignments: assignments
                    .into_iter()
                    .map(|(column, value)| (f(&column), value.map_identifiers(f)))
                    .collect(),
                condition: condition.map_identifiers(f),
            },
            Operation::Select(select) => Operation::Select(select.map_identifiers(f)),
            Operation::Show { kind, dataset } => Operation::Show {
                kind,
                dataset: map_dataset(dataset, f),
            },
        }
    }
}

fn map_dataset(mut dataset: Dataset, f: &dyn Fn(&str) -> String) -> Dataset {
    dataset.database = dataset.database.map(|d| f(&d));
    dataset.group = dataset.group.map(|g| f(&g));
    dataset.name = f(&dataset.name);
    for field in dataset.schema.fields.iter_mut() {
        field.name = f(&field.name);
    }
    dataset
}

/// Ordered, immutable sequence of operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicalPlan {
    operations: Vec<Operation>,
}

impl LogicalPlan {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl From<Operation> for LogicalPlan {
    fn from(operation: Operation) -> Self {
        Self::new(vec![operation])
    }
}

impl From<Vec<Operation>> for LogicalPlan {
    fn from(operations: Vec<Operation>) -> Self {
        Self::new(operations)
    }
}
