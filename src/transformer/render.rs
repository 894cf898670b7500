// Dialect-aware rendering of single operations
use crate::error::{Error, Result};
use crate::models::{
    Condition, Dataset, InsertSource, Literal, Operation, Select, ShowKind, Value,
};
use crate::sink::{quote_literal, Sink, SinkCapabilities};
use chrono::{DateTime, Utc};

pub(crate) struct SqlRenderer {
    sink: Sink,
    capabilities: &'static SinkCapabilities,
    now: DateTime<Utc>,
}

impl SqlRenderer {
    pub(crate) fn new(sink: Sink, now: DateTime<Utc>) -> Self {
        Self {
            sink,
            capabilities: sink.capabilities(),
            now,
        }
    }

    pub(crate) fn render(&self, operation: &Operation) -> Result<Vec<String>> {
        let statement = match operation {
            Operation::Create {
                dataset,
                if_not_exists,
            } => self.create(dataset, *if_not_exists)?,
            Operation::Drop { dataset, if_exists } => format!(
                "DROP TABLE {}{}",
                if *if_exists { "IF EXISTS " } else { "" },
                self.sink.qualified_name(dataset)
            ),
            Operation::Delete { dataset, condition } => format!(
                "DELETE FROM {} WHERE {}",
                self.sink.qualified_name(dataset),
                self.condition(condition)?
            ),
            Operation::Insert {
                dataset,
                columns,
                source,
            } => self.insert(dataset, columns, source)?,
            Operation::Update {
                dataset,
                assignments,
                condition,
            } => self.update(dataset, assignments, condition)?,
            Operation::Select(select) => self.select(select)?,
            Operation::Show { kind, dataset } => self.show(*kind, dataset)?,
        };
        Ok(vec![statement])
    }

    fn create(&self, dataset: &Dataset, if_not_exists: bool) -> Result<String> {
        if dataset.schema.is_empty() {
            return Err(Error::InvalidOperation(format!(
                "cannot create {} without columns",
                dataset
            )));
        }

        let mut definitions = dataset
            .schema
            .fields
            .iter()
            .map(|field| {
                let mut definition = format!(
                    "{} {}",
                    self.sink.quote_identifier(&field.name),
                    self.sink.render_type(&field.field_type)?
                );
                if !field.nullable {
                    definition.push_str(" NOT NULL");
                }
                Ok(definition)
            })
            .collect::<Result<Vec<_>>>()?;

        let keys: Vec<String> = dataset
            .schema
            .primary_keys()
            .map(|field| self.sink.quote_identifier(&field.name))
            .collect();
        if !keys.is_empty() {
            definitions.push(format!("PRIMARY KEY ({})", keys.join(", ")));
        }

        Ok(format!(
            "CREATE TABLE {}{} ({})",
            if if_not_exists { "IF NOT EXISTS " } else { "" },
            self.sink.qualified_name(dataset),
            definitions.join(", ")
        ))
    }

    fn insert(&self, dataset: &Dataset, columns: &[String], source: &InsertSource) -> Result<String> {
        if columns.is_empty() {
            return Err(Error::InvalidOperation(format!(
                "insert into {} names no columns",
                dataset
            )));
        }

        let body = match source {
            InsertSource::Values(rows) => {
                if rows.is_empty() {
                    return Err(Error::InvalidOperation(format!(
                        "insert into {} has no rows",
                        dataset
                    )));
                }
                let rendered = rows
                    .iter()
                    .enumerate()
                    .map(|(index, row)| {
                        if row.len() != columns.len() {
                            return Err(Error::InvalidOperation(format!(
                                "row {} of insert into {} has {} values for {} columns",
                                index,
                                dataset,
                                row.len(),
                                columns.len()
                            )));
                        }
                        Ok(format!("({})", self.values(row)?))
                    })
                    .collect::<Result<Vec<_>>>()?;
                format!("VALUES {}", rendered.join(", "))
            }
            InsertSource::Select(select) => {
                if !select.values.is_empty() && select.values.len() != columns.len() {
                    return Err(Error::InvalidOperation(format!(
                        "insert into {} selects {} values for {} columns",
                        dataset,
                        select.values.len(),
                        columns.len()
                    )));
                }
                self.select(select)?
            }
        };

        Ok(format!(
            "INSERT INTO {} ({}) {}",
            self.sink.qualified_name(dataset),
            self.identifiers(columns),
            body
        ))
    }

    fn update(
        &self,
        dataset: &Dataset,
        assignments: &[(String, Value)],
        condition: &Condition,
    ) -> Result<String> {
        if assignments.is_empty() {
            return Err(Error::InvalidOperation(format!(
                "update of {} assigns no columns",
                dataset
            )));
        }

        let assignments = assignments
            .iter()
            .map(|(column, value)| {
                Ok(format!(
                    "{} = {}",
                    self.sink.quote_identifier(column),
                    self.value(value)?
                ))
            })
            .collect::<Result<Vec<_>>>()?
            .join(", ");

        Ok(format!(
            "UPDATE {} SET {} WHERE {}",
            self.sink.qualified_name(dataset),
            assignments,
            self.condition(condition)?
        ))
    }

    // SHOW takes bare names, matching what the catalog lists
    fn show(&self, kind: ShowKind, dataset: &Dataset) -> Result<String> {
        if !self.capabilities.supports_show {
            return Err(Error::UnsupportedOperation {
                dialect: self.capabilities.name,
                operation: "SHOW",
            });
        }

        let statement = match kind {
            ShowKind::Tables => {
                let containers = dataset.container_parts();
                let mut sql = "SHOW TABLES".to_string();
                if !containers.is_empty() {
                    sql.push_str(&format!(" FROM {}", containers.join(".")));
                }
                sql.push_str(&format!(" LIKE {}", quote_literal(&dataset.name)));
                sql
            }
            ShowKind::Schemas => {
                let mut sql = "SHOW SCHEMAS".to_string();
                if let Some(database) = &dataset.database {
                    sql.push_str(&format!(" IN {}", database));
                }
                if let Some(group) = &dataset.group {
                    sql.push_str(&format!(" LIKE {}", quote_literal(group)));
                }
                sql
            }
            ShowKind::Columns => {
                let name = dataset.qualified_parts().join(".");
                match self.sink {
                    Sink::MySql => format!("SHOW COLUMNS FROM {}", name),
                    _ => format!("SHOW COLUMNS IN TABLE {}", name),
                }
            }
        };
        Ok(statement)
    }

    fn select(&self, select: &Select) -> Result<String> {
        let projection = if select.values.is_empty() {
            "*".to_string()
        } else {
            self.values(&select.values)?
        };

        let mut sql = format!("SELECT {}", projection);
        match &select.source {
            Some(source) => {
                sql.push_str(&format!(" FROM {}", self.sink.qualified_name(source)));
            }
            None if select.condition.is_some() && self.capabilities.requires_dual => {
                sql.push_str(" FROM DUAL");
            }
            None => {}
        }
        if let Some(condition) = &select.condition {
            sql.push_str(&format!(" WHERE {}", self.condition(condition)?));
        }
        Ok(sql)
    }

    fn condition(&self, condition: &Condition) -> Result<String> {
        let sql = match condition {
            Condition::Tautology => "1 = 1".to_string(),
            Condition::Equals(left, right) => {
                format!("{} = {}", self.value(left)?, self.value(right)?)
            }
            Condition::IsNull(value) => format!("{} IS NULL", self.value(value)?),
            Condition::IsNotNull(value) => format!("{} IS NOT NULL", self.value(value)?),
            Condition::And(conditions) if conditions.is_empty() => "1 = 1".to_string(),
            Condition::And(conditions) => conditions
                .iter()
                .map(|c| match c {
                    Condition::And(_) => Ok(format!("({})", self.condition(c)?)),
                    _ => self.condition(c),
                })
                .collect::<Result<Vec<_>>>()?
                .join(" AND "),
            Condition::Not(inner) => format!("NOT ({})", self.condition(inner)?),
            Condition::Exists(select) => format!("EXISTS ({})", self.select(select)?),
            Condition::NotExists(select) => format!("NOT EXISTS ({})", self.select(select)?),
        };
        Ok(sql)
    }

    fn values(&self, values: &[Value]) -> Result<String> {
        Ok(values
            .iter()
            .map(|v| self.value(v))
            .collect::<Result<Vec<_>>>()?
            .join(", "))
    }

    fn value(&self, value: &Value) -> Result<String> {
        let sql = match value {
            Value::Literal(literal) => match literal {
                Literal::Null => "NULL".to_string(),
                Literal::Integer(i) => i.to_string(),
                Literal::Float(f) if !f.is_finite() => {
                    return Err(Error::InvalidOperation(format!(
                        "float literal {} has no SQL representation",
                        f
                    )));
                }
                // Debug keeps the decimal point, so 2.0 stays a float literal
                Literal::Float(f) => format!("{:?}", f),
                Literal::String(s) => quote_literal(s),
                Literal::Boolean(true) => "TRUE".to_string(),
                Literal::Boolean(false) => "FALSE".to_string(),
            },
            Value::BatchStartTimestamp => self.sink.timestamp_literal(&self.now),
            Value::Column {
                qualifier: Some(qualifier),
                name,
            } => format!(
                "{}.{}",
                self.sink.quote_identifier(qualifier),
                self.sink.quote_identifier(name)
            ),
            Value::Column {
                qualifier: None,
                name,
            } => self.sink.quote_identifier(name),
            Value::Aggregate { function, argument } => {
                format!("{}({})", function.as_str(), self.value(argument)?)
            }
            Value::Arithmetic {
                operator,
                left,
                right,
            } => {
                // `+` and `-` associate left, so only a nested right operand
                // needs grouping
                let right = match right.as_ref() {
                    Value::Arithmetic { .. } => format!("({})", self.value(right)?),
                    _ => self.value(right)?,
                };
                format!("{}{}{}", self.value(left)?, operator.as_str(), right)
            }
        };
        Ok(sql)
    }

    fn identifiers(&self, identifiers: &[String]) -> String {
        identifiers
            .iter()
            .map(|i| self.sink.quote_identifier(i))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn renderer(sink: Sink) -> SqlRenderer {
        SqlRenderer::new(sink, Utc.with_ymd_and_hms(2024, 3, 9, 12, 30, 5).unwrap())
    }

    #[test]
    fn test_values_and_literals() {
        let r = renderer(Sink::Postgres);
        assert_eq!(r.value(&Value::string("O'Brien")).unwrap(), "'O''Brien'");
        assert_eq!(r.value(&Value::null()).unwrap(), "NULL");
        assert_eq!(r.value(&Value::boolean(false)).unwrap(), "FALSE");
        assert_eq!(
            r.value(&Value::BatchStartTimestamp).unwrap(),
            "TIMESTAMP '2024-03-09 12:30:05.000000'"
        );
        assert_eq!(
            r.value(&Value::max(Value::qualified_column("lock", "batch_id")).plus(Value::integer(1)))
                .unwrap(),
            "MAX(\"lock\".\"batch_id\")+1"
        );
    }

    #[test]
    fn test_float_literals_keep_decimal_point() {
        let r = renderer(Sink::Ansi);
        assert_eq!(r.value(&Value::Literal(Literal::Float(2.0))).unwrap(), "2.0");
        assert_eq!(r.value(&Value::Literal(Literal::Float(-0.25))).unwrap(), "-0.25");
    }

    #[test]
    fn test_non_finite_floats_are_rejected() {
        let r = renderer(Sink::Ansi);
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                r.value(&Value::Literal(Literal::Float(f))),
                Err(Error::InvalidOperation(_))
            ));
        }
    }

    #[test]
    fn test_nested_right_operand_is_grouped() {
        let r = renderer(Sink::Ansi);
        let nested = Value::Arithmetic {
            operator: crate::models::ArithmeticOperator::Minus,
            left: Box::new(Value::integer(10)),
            right: Box::new(Value::integer(2).plus(Value::integer(3))),
        };
        assert_eq!(r.value(&nested).unwrap(), "10-(2+3)");

        // Left-nested chains read the same without grouping
        let chained = Value::integer(1).plus(Value::integer(2)).plus(Value::integer(3));
        assert_eq!(r.value(&chained).unwrap(), "1+2+3");
    }

    #[test]
    fn test_nested_conditions() {
        let r = renderer(Sink::Ansi);
        let condition = Condition::And(vec![
            Condition::IsNotNull(Value::column("a")),
            Condition::Not(Box::new(Condition::Equals(
                Value::column("b"),
                Value::integer(3),
            ))),
            Condition::And(vec![Condition::Tautology, Condition::IsNull(Value::column("c"))]),
        ]);
        assert_eq!(
            r.condition(&condition).unwrap(),
            "\"a\" IS NOT NULL AND NOT (\"b\" = 3) AND (1 = 1 AND \"c\" IS NULL)"
        );
        assert_eq!(r.condition(&Condition::And(vec![])).unwrap(), "1 = 1");
    }

    #[test]
    fn test_create_without_primary_key() {
        let r = renderer(Sink::MySql);
        let dataset = Dataset::new(
            "events",
            crate::models::Schema::new(vec![
                crate::models::Field::new("flag", crate::models::DataType::Boolean).not_null(),
                crate::models::Field::new("at", crate::models::DataType::Timestamp),
            ]),
        )
        .with_database("app");
        assert_eq!(
            r.create(&dataset, false).unwrap(),
            "CREATE TABLE `app`.`events` (`flag` BOOLEAN NOT NULL, `at` DATETIME)"
        );
    }
}
