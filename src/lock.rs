// Batch-lock protocol: logical plan fragments over the lock table
use crate::models::{
    Condition, Dataset, InsertSource, LockInfoDataset, LogicalPlan, Operation, Select, Value,
};

/// Builds the operations of the lock-table protocol.
///
/// A run goes uninitialized, then initialized (idempotent), then any number
/// of heartbeats, then batch id assigned. Nothing here takes a database
/// lock: reading the next batch id and writing it back is a race unless the
/// caller holds an exclusive lock around both (see
/// [`Sink::lock_table_statement`](crate::sink::Sink::lock_table_statement)).
///
/// The multi-ingest operations reference `batch_id` and expect a lock
/// dataset built with [`LockInfoDataset::with_batch_id`].
#[derive(Debug, Clone)]
pub struct LockInfoUtils {
    lock: LockInfoDataset,
    dataset: Dataset,
}

impl LockInfoUtils {
    pub fn new(lock: LockInfoDataset) -> Self {
        let dataset = lock.dataset();
        Self { lock, dataset }
    }

    pub fn lock_dataset(&self) -> &LockInfoDataset {
        &self.lock
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn create_lock_table(&self) -> Operation {
        Operation::Create {
            dataset: self.dataset.clone(),
            if_not_exists: true,
        }
    }

    fn table_is_empty(&self) -> Condition {
        Condition::NotExists(Box::new(Select::all_from(self.dataset.clone())))
    }

    /// Insert the lock row only when the table has no rows, so repeated
    /// runs leave exactly one row.
    pub fn initialize_lock_info(&self, now: Value) -> Operation {
        Operation::Insert {
            dataset: self.dataset.clone(),
            columns: vec![
                self.lock.insert_ts_field().to_string(),
                self.lock.last_used_ts_field().to_string(),
            ],
            source: InsertSource::Select(
                Select::values(vec![now.clone(), now]).filter(self.table_is_empty()),
            ),
        }
    }

    /// Guarded insert carrying a batch id.
    ///
    /// Without a seed the row starts at batch 1 and a single operation is
    /// returned. With a seed the guarded insert is followed by an update that
    /// stamps the seed onto rows left without a batch id by an earlier
    /// single-ingest bootstrap.
    pub fn initialize_lock_info_for_multi_ingest(
        &self,
        batch_id_seed: Option<i64>,
        now: Value,
    ) -> Vec<Operation> {
        let batch_id = batch_id_seed.unwrap_or(1);
        let insert = Operation::Insert {
            dataset: self.dataset.clone(),
            columns: vec![
                self.lock.insert_ts_field().to_string(),
                self.lock.batch_id_field().to_string(),
                self.lock.last_used_ts_field().to_string(),
            ],
            source: InsertSource::Select(
                Select::values(vec![now.clone(), Value::integer(batch_id), now])
                    .filter(self.table_is_empty()),
            ),
        };

        match batch_id_seed {
            None => vec![insert],
            Some(seed) => vec![
                insert,
                Operation::Update {
                    dataset: self.dataset.clone(),
                    assignments: vec![(
                        self.lock.batch_id_field().to_string(),
                        Value::integer(seed),
                    )],
                    condition: Condition::IsNull(Value::column(self.lock.batch_id_field())),
                },
            ],
        }
    }

    /// Heartbeat: touch `last_used_ts_utc` on every row
    pub fn update_lock_info(&self, now: Value) -> Operation {
        Operation::Update {
            dataset: self.dataset.clone(),
            assignments: vec![(self.lock.last_used_ts_field().to_string(), now)],
            condition: Condition::Tautology,
        }
    }

    pub fn update_batch_id(&self, batch_id: i64) -> Operation {
        Operation::Update {
            dataset: self.dataset.clone(),
            assignments: vec![(
                self.lock.batch_id_field().to_string(),
                Value::integer(batch_id),
            )],
            condition: Condition::Tautology,
        }
    }

    /// `MAX(batch_id) + 1` over the lock table. This is a proposal, not a
    /// claim: two runs reading concurrently get the same value.
    pub fn logical_plan_for_next_batch_id_value(&self) -> LogicalPlan {
        let max_batch_id = Value::max(Value::qualified_column(
            self.dataset.name.clone(),
            self.lock.batch_id_field(),
        ));
        Operation::Select(
            Select::values(vec![max_batch_id.plus(Value::integer(1))]).from(self.dataset.clone()),
        )
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{Executor, SqliteConnection};
    use crate::models::SqlPlan;
    use crate::sink::Sink;
    use crate::transformer::{FixedClock, TransformOptions, Transformer};
    use chrono::{TimeZone, Utc};

    fn transformer(sink: Sink) -> Transformer {
        Transformer::new(
            sink,
            TransformOptions::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap())),
        )
    }

    fn compile(sink: Sink, operations: Vec<Operation>) -> SqlPlan {
        transformer(sink)
            .generate_physical_plan(&LogicalPlan::new(operations))
            .unwrap()
    }

    fn executor() -> Executor {
        Executor::new(Sink::Sqlite, SqliteConnection::open_in_memory().unwrap())
    }

    fn scalar(executor: &mut Executor, sql: &str) -> Option<i64> {
        let results = executor
            .execute_physical_plan_and_get_results(&SqlPlan::new(vec![sql.to_string()]))
            .unwrap();
        results.first().and_then(|r| r.scalar_i64())
    }

    fn next_batch_id(utils: &LockInfoUtils, executor: &mut Executor) -> Option<i64> {
        let plan = transformer(Sink::Sqlite)
            .generate_physical_plan(&utils.logical_plan_for_next_batch_id_value())
            .unwrap();
        let results = executor.execute_physical_plan_and_get_results(&plan).unwrap();
        results.first().and_then(|r| r.scalar_i64())
    }

    #[test]
    fn test_initialize_renders_guarded_insert() {
        let utils = LockInfoUtils::new(LockInfoDataset::new("batch_lock").with_group("ops"));
        let plan = compile(Sink::Ansi, vec![utils.initialize_lock_info(Value::BatchStartTimestamp)]);
        assert_eq!(
            plan.statements(),
            ["INSERT INTO \"ops\".\"batch_lock\" (\"insert_ts_utc\", \"last_used_ts_utc\") \
              SELECT TIMESTAMP '2024-05-01 08:00:00.000000', TIMESTAMP '2024-05-01 08:00:00.000000' \
              WHERE NOT EXISTS (SELECT * FROM \"ops\".\"batch_lock\")"]
        );
    }

    #[test]
    fn test_heartbeat_is_unconditional() {
        let utils = LockInfoUtils::new(LockInfoDataset::new("batch_lock"));
        let plan = compile(Sink::Ansi, vec![utils.update_lock_info(Value::BatchStartTimestamp)]);
        assert_eq!(
            plan.statements(),
            ["UPDATE \"batch_lock\" SET \"last_used_ts_utc\" = TIMESTAMP '2024-05-01 08:00:00.000000' WHERE 1 = 1"]
        );
    }

    #[test]
    fn test_multi_ingest_with_seed_inserts_then_updates() {
        let utils = LockInfoUtils::new(LockInfoDataset::new("batch_lock").with_batch_id());
        let operations =
            utils.initialize_lock_info_for_multi_ingest(Some(50), Value::BatchStartTimestamp);
        assert_eq!(operations.len(), 2);

        let plan = compile(Sink::Sqlite, operations);
        let insert = &plan.statements()[0];
        assert!(insert.starts_with("INSERT INTO \"batch_lock\" (\"insert_ts_utc\", \"batch_id\", \"last_used_ts_utc\")"));
        assert!(insert.contains(", 50, "));
        assert!(insert.ends_with("WHERE NOT EXISTS (SELECT * FROM \"batch_lock\")"));
        assert_eq!(
            plan.statements()[1],
            "UPDATE \"batch_lock\" SET \"batch_id\" = 50 WHERE \"batch_id\" IS NULL"
        );
    }

    #[test]
    fn test_multi_ingest_without_seed_starts_at_one() {
        let utils = LockInfoUtils::new(LockInfoDataset::new("batch_lock").with_batch_id());
        let operations = utils.initialize_lock_info_for_multi_ingest(None, Value::BatchStartTimestamp);
        assert_eq!(operations.len(), 1);
        assert_eq!(operations[0].kind(), "insert");
    }

    #[test]
    fn test_next_batch_id_sql() {
        let utils = LockInfoUtils::new(LockInfoDataset::new("batch_lock").with_batch_id());
        let plan = transformer(Sink::Postgres)
            .generate_physical_plan(&utils.logical_plan_for_next_batch_id_value())
            .unwrap();
        assert_eq!(
            plan.statements(),
            ["SELECT MAX(\"batch_lock\".\"batch_id\")+1 FROM \"batch_lock\""]
        );
    }

    #[test]
    fn test_repeated_bootstrap_leaves_one_row() {
        let utils = LockInfoUtils::new(LockInfoDataset::new("batch_lock"));
        let mut executor = executor();
        executor
            .execute_physical_plan(&compile(Sink::Sqlite, vec![utils.create_lock_table()]))
            .unwrap();

        for n in 1..=5 {
            executor
                .execute_physical_plan(&compile(
                    Sink::Sqlite,
                    vec![
                        utils.create_lock_table(),
                        utils.initialize_lock_info(Value::BatchStartTimestamp),
                        utils.update_lock_info(Value::BatchStartTimestamp),
                    ],
                ))
                .unwrap();
            assert_eq!(
                scalar(&mut executor, "SELECT COUNT(*) FROM batch_lock"),
                Some(1),
                "after {} bootstraps",
                n
            );
        }

        executor.validate_main_dataset_schema(utils.dataset()).unwrap();
    }

    #[test]
    fn test_next_batch_id_is_max_plus_one() {
        let utils = LockInfoUtils::new(LockInfoDataset::new("batch_lock").with_batch_id());
        let mut executor = executor();

        let mut operations = vec![utils.create_lock_table()];
        operations.extend(utils.initialize_lock_info_for_multi_ingest(Some(50), Value::BatchStartTimestamp));
        executor.execute_physical_plan(&compile(Sink::Sqlite, operations)).unwrap();
        assert_eq!(next_batch_id(&utils, &mut executor), Some(51));

        executor.begin().unwrap();
        executor
            .execute_physical_plan(&compile(Sink::Sqlite, vec![utils.update_batch_id(51)]))
            .unwrap();
        executor.commit().unwrap();
        assert_eq!(next_batch_id(&utils, &mut executor), Some(52));
    }

    #[test]
    fn test_seed_reconciles_unseeded_row() {
        let utils = LockInfoUtils::new(LockInfoDataset::new("batch_lock").with_batch_id());
        let mut executor = executor();
        executor
            .execute_physical_plan(&compile(
                Sink::Sqlite,
                vec![
                    utils.create_lock_table(),
                    utils.initialize_lock_info(Value::BatchStartTimestamp),
                ],
            ))
            .unwrap();
        assert_eq!(next_batch_id(&utils, &mut executor), None);

        executor
            .execute_physical_plan(&compile(
                Sink::Sqlite,
                utils.initialize_lock_info_for_multi_ingest(Some(7), Value::BatchStartTimestamp),
            ))
            .unwrap();
        assert_eq!(scalar(&mut executor, "SELECT COUNT(*) FROM batch_lock"), Some(1));
        assert_eq!(next_batch_id(&utils, &mut executor), Some(8));
    }
}
