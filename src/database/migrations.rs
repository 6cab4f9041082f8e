use sqlx::{Connection, Sqlite, Transaction};
use tracing::{info, instrument, warn};

use super::schema::{
    ADDITIVE_COLUMNS, AdditiveColumn, CURRENT_SCHEMA, SEED_ADMIN, SEED_USER, SEED_VOCAB, SeedUser,
};
use super::store::Store;
use crate::error::AppError;

/// What a run of the initializer changed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InitReport {
    pub default_owner: i64,
    pub columns_added: Vec<String>,
    pub users_seeded: bool,
    pub admin_promoted: Option<i64>,
    pub vocab_seeded: bool,
    pub sessions_backfilled: u64,
    pub vocab_backfilled: u64,
}

impl InitReport {
    pub fn has_any_changes(&self) -> bool {
        !self.columns_added.is_empty()
            || self.users_seeded
            || self.admin_promoted.is_some()
            || self.vocab_seeded
            || self.sessions_backfilled > 0
            || self.vocab_backfilled > 0
    }
}

/// Brings a fresh or previously initialized database up to the current
/// schema, seeds empty tables and attributes ownerless rows to the default
/// owner. Runs inside one transaction; any error rolls the whole run back.
pub struct SchemaInitializer {
    report: InitReport,
}

impl SchemaInitializer {
    pub fn new() -> Self {
        Self {
            report: InitReport::default(),
        }
    }

    #[instrument(skip_all)]
    pub async fn run(mut self, store: &Store) -> Result<InitReport, AppError> {
        info!("Starting database initialization");

        let mut conn = store.connect().await?;
        let mut tx = conn.begin().await?;

        match self.apply(&mut tx).await {
            Ok(()) => {
                tx.commit().await?;

                if self.report.has_any_changes() {
                    info!(report = ?self.report, "Database initialization applied changes");
                } else {
                    info!(
                        default_owner = self.report.default_owner,
                        "Database already initialized, no changes needed"
                    );
                }
                Ok(self.report)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    async fn apply(&mut self, tx: &mut Transaction<'_, Sqlite>) -> Result<(), AppError> {
        sqlx::Executor::execute(&mut **tx, sqlx::raw_sql(CURRENT_SCHEMA)).await?;

        for column in ADDITIVE_COLUMNS {
            self.ensure_column(tx, column).await?;
        }

        self.report.default_owner = self.resolve_default_owner(tx).await?;

        self.seed_vocab_if_empty(tx).await?;

        // Seeded vocabulary has no owner of its own, so this runs after it
        self.backfill_owners(tx).await?;

        Ok(())
    }

    #[instrument(skip(self, tx))]
    async fn ensure_column(
        &mut self,
        tx: &mut Transaction<'_, Sqlite>,
        column: &AdditiveColumn,
    ) -> Result<(), AppError> {
        if column_exists(tx, column.table, column.column).await? {
            return Ok(());
        }

        let sql = column.alter_sql();
        info!("Database migration: add column {}.{} with SQL:\n{}", column.table, column.column, sql);
        sqlx::query(&sql).execute(&mut **tx).await?;

        self.report
            .columns_added
            .push(format!("{}.{}", column.table, column.column));
        Ok(())
    }

    #[instrument(skip_all)]
    async fn resolve_default_owner(
        &mut self,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<i64, AppError> {
        let user_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&mut **tx)
            .await?;

        if user_count == 0 {
            info!("Users table is empty, seeding default users");
            let admin_id = insert_seed_user(tx, &SEED_ADMIN).await?;
            insert_seed_user(tx, &SEED_USER).await?;
            self.report.users_seeded = true;
            return Ok(admin_id);
        }

        let admin_id =
            sqlx::query_scalar::<_, Option<i64>>("SELECT MIN(id) FROM users WHERE role = 'ADMIN'")
                .fetch_one(&mut **tx)
                .await?;

        if let Some(admin_id) = admin_id {
            return Ok(admin_id);
        }

        let first_id = sqlx::query_scalar::<_, i64>("SELECT MIN(id) FROM users")
            .fetch_one(&mut **tx)
            .await?;

        warn!(user_id = first_id, "No admin user found, promoting lowest-id user");
        sqlx::query("UPDATE users SET role = 'ADMIN' WHERE id = ?")
            .bind(first_id)
            .execute(&mut **tx)
            .await?;
        self.report.admin_promoted = Some(first_id);

        Ok(first_id)
    }

    #[instrument(skip_all)]
    async fn seed_vocab_if_empty(&mut self, tx: &mut Transaction<'_, Sqlite>) -> Result<(), AppError> {
        let vocab_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM vocab_bank")
            .fetch_one(&mut **tx)
            .await?;

        if vocab_count > 0 {
            return Ok(());
        }

        info!("Vocabulary bank is empty, seeding example words");
        for entry in SEED_VOCAB {
            sqlx::query("INSERT INTO vocab_bank (word, form, meaning, example) VALUES (?, ?, ?, ?)")
                .bind(entry.word)
                .bind(entry.form)
                .bind(entry.meaning)
                .bind(entry.example)
                .execute(&mut **tx)
                .await?;
        }
        self.report.vocab_seeded = true;

        Ok(())
    }

    #[instrument(skip(self, tx))]
    async fn backfill_owners(&mut self, tx: &mut Transaction<'_, Sqlite>) -> Result<(), AppError> {
        let owner = self.report.default_owner;

        self.report.sessions_backfilled =
            sqlx::query("UPDATE sessions SET user_id = ? WHERE user_id IS NULL")
                .bind(owner)
                .execute(&mut **tx)
                .await?
                .rows_affected();

        self.report.vocab_backfilled =
            sqlx::query("UPDATE vocab_bank SET user_id = ? WHERE user_id IS NULL")
                .bind(owner)
                .execute(&mut **tx)
                .await?
                .rows_affected();

        Ok(())
    }
}

impl Default for SchemaInitializer {
    fn default() -> Self {
        Self::new()
    }
}

async fn column_exists(
    tx: &mut Transaction<'_, Sqlite>,
    table: &str,
    column: &str,
) -> Result<bool, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
        .bind(table)
        .bind(column)
        .fetch_one(&mut **tx)
        .await?;

    Ok(count > 0)
}

async fn insert_seed_user(
    tx: &mut Transaction<'_, Sqlite>,
    user: &SeedUser,
) -> Result<i64, AppError> {
    let res = sqlx::query("INSERT INTO users (name, avatar, weekly_goal, role) VALUES (?, ?, ?, ?)")
        .bind(user.name)
        .bind(user.avatar)
        .bind(user.weekly_goal)
        .bind(user.role)
        .execute(&mut **tx)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(store))]
pub async fn initialize_database(store: &Store) -> Result<InitReport, AppError> {
    SchemaInitializer::new().run(store).await
}
