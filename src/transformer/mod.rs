// Logical plan to SQL plan compilation
pub mod optimizer;
mod render;

pub use optimizer::{IdentifierOptimizer, LowerCaseOptimizer, Optimizer, UpperCaseOptimizer};

use crate::error::{Error, Result};
use crate::models::{LogicalPlan, Operation, SqlPlan};
use crate::sink::Sink;
use chrono::{DateTime, Utc};
use render::SqlRenderer;
use std::sync::Arc;

/// Source of the execution timestamp used for `BatchStartTimestamp`
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant; makes generated SQL reproducible
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Per-compile settings: the execution clock and the optimizer chain.
#[derive(Clone)]
pub struct TransformOptions {
    clock: Arc<dyn Clock>,
    optimizers: Vec<Arc<dyn Optimizer>>,
}

impl TransformOptions {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Arc::new(clock),
            optimizers: Vec::new(),
        }
    }

    /// Append an optimizer; optimizers run in registration order
    pub fn with_optimizer(mut self, optimizer: impl Optimizer + 'static) -> Self {
        self.optimizers.push(Arc::new(optimizer));
        self
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn optimizer_names(&self) -> Vec<&str> {
        self.optimizers.iter().map(|o| o.name()).collect()
    }

    fn optimize(&self, operation: Operation) -> Operation {
        self.optimizers
            .iter()
            .fold(operation, |operation, optimizer| optimizer.optimize(operation))
    }
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl std::fmt::Debug for TransformOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformOptions")
            .field("now", &self.clock.now())
            .field("optimizers", &self.optimizer_names())
            .finish()
    }
}

/// Compiles logical plans into literal SQL for one dialect
#[derive(Debug, Clone)]
pub struct Transformer {
    sink: Sink,
    options: TransformOptions,
}

impl Transformer {
    pub fn new(sink: Sink, options: TransformOptions) -> Self {
        Self { sink, options }
    }

    pub fn sink(&self) -> Sink {
        self.sink
    }

    /// Render every operation, in order.
    ///
    /// The clock is read once, so every `BatchStartTimestamp` in the plan
    /// renders the same instant. The first operation that cannot be rendered
    /// aborts the compile; no partial plan is returned.
    pub fn generate_physical_plan(&self, plan: &LogicalPlan) -> Result<SqlPlan> {
        let renderer = SqlRenderer::new(self.sink, self.options.clock().now());
        let mut statements = Vec::with_capacity(plan.len());

        for (position, operation) in plan.operations().iter().enumerate() {
            let optimized = self.options.optimize(operation.clone());
            let rendered = renderer.render(&optimized).map_err(|source| Error::Compile {
                position,
                operation: operation.kind(),
                source: Box::new(source),
            })?;
            for statement in &rendered {
                tracing::debug!("[{}] #{} {}", self.sink, position, statement);
            }
            statements.extend(rendered);
        }

        Ok(SqlPlan::new(statements))
    }
}

/// Compile `plan` for `sink` with `options`
pub fn generate_physical_plan(
    plan: &LogicalPlan,
    sink: Sink,
    options: TransformOptions,
) -> Result<SqlPlan> {
    Transformer::new(sink, options).generate_physical_plan(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Condition, DataType, Dataset, Field, FieldType, InsertSource, Schema, Select, ShowKind,
        Value,
    };
    use chrono::TimeZone;
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;

    fn fixed_options() -> TransformOptions {
        TransformOptions::new(FixedClock(
            Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap(),
        ))
    }

    fn compile(sink: Sink, operations: Vec<Operation>) -> Result<SqlPlan> {
        generate_physical_plan(&LogicalPlan::new(operations), sink, fixed_options())
    }

    fn show_tables(dataset: Dataset) -> Operation {
        Operation::Show {
            kind: ShowKind::Tables,
            dataset,
        }
    }

    fn trips_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int).primary_key(),
            Field::new("name", FieldType::new(DataType::Varchar, Some(64), None)),
            Field::new("amount", DataType::Decimal),
        ])
    }

    #[test]
    fn test_show_tables_omits_missing_levels() {
        let plan = compile(
            Sink::Snowflake,
            vec![
                show_tables(Dataset::reference("trips").with_group("public")),
                show_tables(
                    Dataset::reference("trips")
                        .with_group("public")
                        .with_database("CITIBIKE"),
                ),
                show_tables(Dataset::reference("trips")),
            ],
        )
        .unwrap();

        assert_eq!(
            plan.statements(),
            [
                "SHOW TABLES FROM public LIKE 'trips'",
                "SHOW TABLES FROM CITIBIKE.public LIKE 'trips'",
                "SHOW TABLES LIKE 'trips'",
            ]
        );
    }

    #[test]
    fn test_show_schemas_and_columns() {
        let dataset = Dataset::reference("trips")
            .with_group("public")
            .with_database("CITIBIKE");
        let plan = compile(
            Sink::Snowflake,
            vec![
                Operation::Show {
                    kind: ShowKind::Schemas,
                    dataset: dataset.clone(),
                },
                Operation::Show {
                    kind: ShowKind::Columns,
                    dataset: dataset.clone(),
                },
            ],
        )
        .unwrap();
        assert_eq!(
            plan.statements(),
            [
                "SHOW SCHEMAS IN CITIBIKE LIKE 'public'",
                "SHOW COLUMNS IN TABLE CITIBIKE.public.trips",
            ]
        );

        let plan = compile(
            Sink::MySql,
            vec![Operation::Show {
                kind: ShowKind::Columns,
                dataset,
            }],
        )
        .unwrap();
        assert_eq!(plan.statements(), ["SHOW COLUMNS FROM CITIBIKE.public.trips"]);
    }

    #[test]
    fn test_statements_follow_operation_order() {
        let trips = Dataset::new("trips", trips_schema());
        let operations = vec![
            Operation::Create {
                dataset: trips.clone(),
                if_not_exists: true,
            },
            Operation::Insert {
                dataset: trips.clone(),
                columns: vec!["id".to_string(), "name".to_string()],
                source: InsertSource::Values(vec![
                    vec![Value::integer(1), Value::string("a")],
                    vec![Value::integer(2), Value::string("b")],
                ]),
            },
            Operation::Update {
                dataset: trips.clone(),
                assignments: vec![("name".to_string(), Value::string("c"))],
                condition: Condition::Equals(Value::column("id"), Value::integer(2)),
            },
            Operation::Select(Select::all_from(trips.clone())),
            Operation::Delete {
                dataset: trips.clone(),
                condition: Condition::Tautology,
            },
            Operation::Drop {
                dataset: trips,
                if_exists: true,
            },
        ];

        let plan = compile(Sink::Sqlite, operations).unwrap();
        assert_eq!(
            plan.statements(),
            [
                "CREATE TABLE IF NOT EXISTS \"trips\" (\"id\" INTEGER NOT NULL, \"name\" VARCHAR(64), \"amount\" DECIMAL(38,10), PRIMARY KEY (\"id\"))",
                "INSERT INTO \"trips\" (\"id\", \"name\") VALUES (1, 'a'), (2, 'b')",
                "UPDATE \"trips\" SET \"name\" = 'c' WHERE \"id\" = 2",
                "SELECT * FROM \"trips\"",
                "DELETE FROM \"trips\" WHERE 1 = 1",
                "DROP TABLE IF EXISTS \"trips\"",
            ]
        );

        for statement in plan.statements() {
            Parser::parse_sql(&GenericDialect {}, statement)
                .unwrap_or_else(|e| panic!("{}: {}", statement, e));
        }
    }

    #[test]
    fn test_batch_start_timestamp_uses_injected_clock() {
        let dataset = Dataset::reference("audit");
        let insert = || Operation::Insert {
            dataset: dataset.clone(),
            columns: vec!["ts".to_string()],
            source: InsertSource::Values(vec![vec![Value::BatchStartTimestamp]]),
        };

        let plan = compile(Sink::Ansi, vec![insert(), insert()]).unwrap();
        let expected = "INSERT INTO \"audit\" (\"ts\") VALUES (TIMESTAMP '2000-01-01 00:00:00.000000')";
        assert_eq!(plan.statements(), [expected, expected]);
    }

    #[test]
    fn test_upper_case_optimizer_is_idempotent() {
        let dataset = Dataset::reference("trips")
            .with_group("public")
            .with_database("citibike");
        let options = fixed_options()
            .with_optimizer(UpperCaseOptimizer)
            .with_optimizer(UpperCaseOptimizer);
        let plan = Transformer::new(Sink::Snowflake, options)
            .generate_physical_plan(&show_tables(dataset.clone()).into())
            .unwrap();
        assert_eq!(
            plan.statements(),
            ["SHOW TABLES FROM CITIBIKE.PUBLIC LIKE 'TRIPS'"]
        );

        let once = UpperCaseOptimizer.optimize(show_tables(dataset));
        let twice = UpperCaseOptimizer.optimize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_optimizers_apply_in_registration_order() {
        let options = fixed_options()
            .with_optimizer(UpperCaseOptimizer)
            .with_optimizer(IdentifierOptimizer::new("suffix", |s: &str| format!("{}_v2", s)));
        assert_eq!(options.optimizer_names(), vec!["upper_case", "suffix"]);

        let plan = Transformer::new(Sink::Ansi, options)
            .generate_physical_plan(&Operation::Select(Select::all_from(Dataset::reference("t"))).into())
            .unwrap();
        assert_eq!(plan.statements(), ["SELECT * FROM \"T_v2\""]);
    }

    #[test]
    fn test_compile_error_reports_position_and_discards_output() {
        let ok = Operation::Select(Select::all_from(Dataset::reference("t")));
        let bad = Operation::Create {
            dataset: Dataset::new(
                "events",
                Schema::new(vec![Field::new("payload", DataType::Map)]),
            ),
            if_not_exists: true,
        };

        let result = compile(Sink::Postgres, vec![ok, bad]);
        let Err(err) = result else {
            panic!("expected compile failure, got {:?}", result);
        };
        match err {
            Error::Compile {
                position,
                operation,
                source,
            } => {
                assert_eq!(position, 1);
                assert_eq!(operation, "create");
                assert!(matches!(
                    *source,
                    Error::UnsupportedType {
                        data_type: DataType::Map,
                        ..
                    }
                ));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_show_unsupported_on_postgres() {
        let err = compile(Sink::Postgres, vec![show_tables(Dataset::reference("t"))]).unwrap_err();
        match err {
            Error::Compile { source, .. } => assert!(matches!(
                *source,
                Error::UnsupportedOperation {
                    dialect: "postgres",
                    ..
                }
            )),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_shapes_are_rejected() {
        let dataset = Dataset::reference("t");
        let cases = vec![
            Operation::Insert {
                dataset: dataset.clone(),
                columns: vec!["a".to_string(), "b".to_string()],
                source: InsertSource::Values(vec![vec![Value::integer(1)]]),
            },
            Operation::Update {
                dataset: dataset.clone(),
                assignments: vec![],
                condition: Condition::Tautology,
            },
            Operation::Create {
                dataset,
                if_not_exists: false,
            },
        ];

        for operation in cases {
            let err = compile(Sink::Ansi, vec![operation]).unwrap_err();
            match err {
                Error::Compile { source, .. } => {
                    assert!(matches!(*source, Error::InvalidOperation(_)))
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_mysql_select_without_table_uses_dual() {
        let select = Select::values(vec![Value::integer(1)]).filter(Condition::NotExists(
            Box::new(Select::all_from(Dataset::reference("lock"))),
        ));
        let plan = compile(Sink::MySql, vec![Operation::Select(select.clone())]).unwrap();
        assert_eq!(
            plan.statements(),
            ["SELECT 1 FROM DUAL WHERE NOT EXISTS (SELECT * FROM `lock`)"]
        );

        let plan = compile(Sink::Sqlite, vec![Operation::Select(select)]).unwrap();
        assert_eq!(
            plan.statements(),
            ["SELECT 1 WHERE NOT EXISTS (SELECT * FROM \"lock\")"]
        );
    }

    #[test]
    fn test_non_finite_float_fails_compile() {
        let select = Select::values(vec![Value::Literal(crate::models::Literal::Float(f64::NAN))]);
        let err = compile(
            Sink::Sqlite,
            vec![Operation::Select(Select::values(vec![Value::integer(1)])), Operation::Select(select)],
        )
        .unwrap_err();
        match err {
            Error::Compile {
                position, source, ..
            } => {
                assert_eq!(position, 1);
                assert!(matches!(*source, Error::InvalidOperation(_)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_plan_compiles_to_empty_sql_plan() {
        let plan = compile(Sink::Ansi, vec![]).unwrap();
        assert!(plan.is_empty());
    }
}
