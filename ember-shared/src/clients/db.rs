use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

const POOL_MAX: u32 = 10;
const POOL_MIN_IDLE: u32 = 2;

/// r2d2 pool over Postgres. Connections are validated on checkout; a handler
/// that cannot get one reports it as an internal error.
pub fn create_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(POOL_MAX)
        .min_idle(Some(POOL_MIN_IDLE))
        .test_on_check_out(true)
        .build(manager)
        .expect("failed to create database pool");

    tracing::info!(max_connections = POOL_MAX, "postgres pool ready");
    pool
}
