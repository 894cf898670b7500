use anyhow::Context;
use persistence_compiler::config::Config;
use persistence_compiler::{
    Executor, LockInfoDataset, LockInfoUtils, LogicalPlan, Operation, Select, Sink, SinkRegistry,
    SqliteConnection, TransformOptions, Transformer, Value,
};
use tracing::{error, info, warn};

fn main() -> anyhow::Result<()> {
    // Load configuration; logging is not up yet, so failures go to stderr
    let config = Config::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    // Initialize logging; RUST_LOG is already folded into logging.level
    let filter = tracing_subscriber::EnvFilter::try_new(&config.logging.level);
    let invalid_level = filter.is_err();
    tracing_subscriber::fmt()
        .with_env_filter(filter.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")))
        .init();
    if invalid_level {
        warn!("Invalid log level '{}', using 'info'", config.logging.level);
    }

    let sink = SinkRegistry::global()
        .get(&config.sink.dialect)
        .context("resolving dialect")?;

    let mut lock = LockInfoDataset::new(&config.lock.table).with_batch_id();
    if let Some(database) = &config.lock.database {
        lock = lock.with_database(database);
    }
    if let Some(group) = &config.lock.group {
        lock = lock.with_group(group);
    }
    let utils = LockInfoUtils::new(lock);
    let transformer = Transformer::new(sink, TransformOptions::default());

    let mut bootstrap = vec![utils.create_lock_table()];
    bootstrap.extend(
        utils.initialize_lock_info_for_multi_ingest(
            config.lock.batch_id_seed,
            Value::BatchStartTimestamp,
        ),
    );
    bootstrap.push(utils.update_lock_info(Value::BatchStartTimestamp));
    let plan = transformer
        .generate_physical_plan(&LogicalPlan::new(bootstrap))
        .context("compiling lock bootstrap")?;

    // Only SQLite has a bundled connection; other dialects print their plan
    if sink != Sink::Sqlite {
        info!("Compiled {} lock bootstrap ({} statements)", sink, plan.len());
        for statement in plan.statements() {
            println!("{};", statement);
        }
        return Ok(());
    }

    info!("Bootstrapping lock table {} on {}", utils.dataset(), config.database.url);
    let connection = SqliteConnection::from_url(&config.database.url).map_err(|e| {
        error!("Failed to open database: {}", e);
        e
    })?;
    let mut executor = Executor::new(sink, connection);

    executor.begin()?;
    if let Err(e) = executor.execute_physical_plan(&plan) {
        error!("Lock bootstrap failed: {}", e);
        executor.revert()?;
        return Err(e.into());
    }
    executor.commit()?;
    executor.validate_main_dataset_schema(utils.dataset())?;

    let next_plan = transformer.generate_physical_plan(&utils.logical_plan_for_next_batch_id_value())?;
    let next_batch_id = executor
        .execute_physical_plan_and_get_results(&next_plan)?
        .first()
        .and_then(|result| result.scalar_i64());
    match next_batch_id {
        Some(batch_id) => info!("Next batch id: {}", batch_id),
        None => info!("Lock table has no batch id yet"),
    }

    let select = Operation::Select(Select::all_from(utils.dataset().clone()));
    let rows = executor.execute_physical_plan_and_get_results(
        &transformer.generate_physical_plan(&select.into())?,
    )?;
    for row in rows.iter().flat_map(|result| result.rows.iter()) {
        info!("Lock row: {}", serde_json::to_string(row)?);
    }

    executor.close()?;
    Ok(())
}
