//! Database migrations
//!
//! Versioned raw-SQL migrations, applied automatically on connect. The
//! relational store and the graph projection have separate migration sets;
//! each database tracks its own version in a `_migrations` table.

use crate::storage::database::Schema;
use sqlx::SqlitePool;

/// Current relational schema version
pub const RELATIONAL_VERSION: i32 = 2;

/// Current graph-projection schema version
pub const GRAPH_VERSION: i32 = 1;

/// SQL for creating the migrations tracking table
const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Relational migration 1: catalog and appointments of record
const RELATIONAL_V1: &str = r#"
    -- Customers table. Customers are soft-deactivated, never hard-deleted.
    CREATE TABLE IF NOT EXISTS customers (
        id TEXT PRIMARY KEY NOT NULL,
        external_id TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        phone TEXT,
        email TEXT,
        preferences TEXT NOT NULL DEFAULT '{}',
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE UNIQUE INDEX IF NOT EXISTS idx_customers_external_id ON customers(external_id);
    CREATE INDEX IF NOT EXISTS idx_customers_is_active ON customers(is_active);

    -- Staff table
    CREATE TABLE IF NOT EXISTS staff (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        phone TEXT,
        specializations TEXT NOT NULL DEFAULT '[]',
        working_hours TEXT NOT NULL DEFAULT '{}',
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_staff_is_active ON staff(is_active);

    -- Services table
    CREATE TABLE IF NOT EXISTS services (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        duration_minutes INTEGER NOT NULL,
        price REAL NOT NULL DEFAULT 0.0,
        category TEXT NOT NULL DEFAULT '',
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_services_name ON services(name);
    CREATE INDEX IF NOT EXISTS idx_services_category ON services(category);

    -- Appointments of record. Append-only history: lifecycle transitions
    -- change status, rows are never deleted.
    CREATE TABLE IF NOT EXISTS appointments (
        id TEXT PRIMARY KEY NOT NULL,
        customer_id TEXT NOT NULL REFERENCES customers(id),
        staff_id TEXT NOT NULL REFERENCES staff(id),
        service_id TEXT NOT NULL REFERENCES services(id),
        start_time TIMESTAMP NOT NULL,
        end_time TIMESTAMP NOT NULL,
        status TEXT NOT NULL DEFAULT 'confirmed'
            CHECK (status IN ('confirmed', 'rescheduled', 'cancelled', 'completed', 'no_show')),
        notes TEXT,
        cancellation_reason TEXT,
        reminder_sent INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CHECK (end_time > start_time)
    );

    -- Overlap queries scan one staff member's timeline for a day
    CREATE INDEX IF NOT EXISTS idx_appointments_staff_start ON appointments(staff_id, start_time);
    CREATE INDEX IF NOT EXISTS idx_appointments_customer_id ON appointments(customer_id);
    CREATE INDEX IF NOT EXISTS idx_appointments_status ON appointments(status);
"#;

/// Relational migration 2: graph outbox for deferred projection retries
const RELATIONAL_V2: &str = r#"
    -- Failed graph writes are queued here and retried with bounded attempts.
    -- The appointment id inside the payload doubles as the idempotency key.
    CREATE TABLE IF NOT EXISTS graph_outbox (
        id TEXT PRIMARY KEY NOT NULL,
        op TEXT NOT NULL,
        payload TEXT NOT NULL,
        attempts INTEGER NOT NULL DEFAULT 0,
        last_error TEXT,
        status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'dead')),
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_graph_outbox_status ON graph_outbox(status);
"#;

/// Graph migration 1: nodes and weighted edges
const GRAPH_V1: &str = r#"
    -- Node identity mirrors the relational store; the graph is a derived
    -- projection and may be rebuilt from booking history.
    CREATE TABLE IF NOT EXISTS graph_nodes (
        id TEXT PRIMARY KEY NOT NULL,
        kind TEXT NOT NULL CHECK (kind IN ('customer', 'staff', 'service', 'appointment')),
        label TEXT NOT NULL DEFAULT '',
        properties TEXT NOT NULL DEFAULT '{}',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_graph_nodes_kind ON graph_nodes(kind);

    -- Adjacency rows. The (source, target, type) key makes every write an
    -- upsert, so retried projections cannot duplicate edges.
    CREATE TABLE IF NOT EXISTS graph_edges (
        source_id TEXT NOT NULL,
        target_id TEXT NOT NULL,
        edge_type TEXT NOT NULL,
        strength REAL NOT NULL DEFAULT 0.0,
        count INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (source_id, target_id, edge_type)
    );

    CREATE INDEX IF NOT EXISTS idx_graph_edges_source ON graph_edges(source_id, edge_type);
    CREATE INDEX IF NOT EXISTS idx_graph_edges_target ON graph_edges(target_id, edge_type);
"#;

/// Get the current schema version from the database
async fn get_current_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    // Ensure migrations table exists
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    let row: Option<(i32,)> = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|(v,)| v).unwrap_or(0))
}

/// Record that a migration has been applied
async fn record_migration(pool: &SqlitePool, version: i32) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Target version for a schema
pub fn target_version(schema: Schema) -> i32 {
    match schema {
        Schema::Relational => RELATIONAL_VERSION,
        Schema::Graph => GRAPH_VERSION,
    }
}

/// Run all pending migrations for the given schema
pub async fn run_migrations(pool: &SqlitePool, schema: Schema) -> anyhow::Result<()> {
    let current_version = get_current_version(pool).await?;
    let target = target_version(schema);

    tracing::info!(
        current_version = current_version,
        target_version = target,
        ?schema,
        "Checking database migrations"
    );

    if current_version >= target {
        tracing::debug!("Database is up to date");
        return Ok(());
    }

    match schema {
        Schema::Relational => {
            if current_version < 1 {
                tracing::info!("Applying relational migration v1: catalog and appointments");
                sqlx::raw_sql(RELATIONAL_V1).execute(pool).await?;
                record_migration(pool, 1).await?;
            }
            if current_version < 2 {
                tracing::info!("Applying relational migration v2: graph outbox");
                sqlx::raw_sql(RELATIONAL_V2).execute(pool).await?;
                record_migration(pool, 2).await?;
            }
        }
        Schema::Graph => {
            if current_version < 1 {
                tracing::info!("Applying graph migration v1: nodes and edges");
                sqlx::raw_sql(GRAPH_V1).execute(pool).await?;
                record_migration(pool, 1).await?;
            }
        }
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Check if the database needs migrations
pub async fn needs_migration(pool: &SqlitePool, schema: Schema) -> anyhow::Result<bool> {
    let current_version = get_current_version(pool).await?;
    Ok(current_version < target_version(schema))
}

/// Get migration status information
pub async fn migration_status(pool: &SqlitePool, schema: Schema) -> anyhow::Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    let target = target_version(schema);
    Ok(MigrationStatus {
        current_version,
        target_version: target,
        needs_migration: current_version < target,
    })
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Current schema version in the database
    pub current_version: i32,
    /// Target schema version (latest)
    pub target_version: i32,
    /// Whether migrations need to be run
    pub needs_migration: bool,
}
