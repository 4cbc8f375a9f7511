use std::str::FromStr as _;

use chrono::{DateTime, Utc};
use family_night_common::{
    models::{AdvisoryRecord, Category, SeverityLabel},
    Conf,
};
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub use sqlx::SqlitePool as Pool;

#[tracing::instrument(skip(conf), err)]
pub async fn init_database_connection(conf: &Conf) -> Result<Pool, family_night_common::Report> {
    connect(&conf.database).await
}

/// Opens (creating if needed) and migrates the advisory cache.
///
/// In-memory databases only live as long as their connection, so those get a
/// pool of one.
#[tracing::instrument(err)]
pub async fn connect(database: &str) -> Result<Pool, family_night_common::Report> {
    static MIGRATOR: Migrator = sqlx::migrate!();

    let options = SqliteConnectOptions::from_str(database)?.create_if_missing(true);

    let max_connections = if database.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;

    Ok(pool)
}

#[derive(Debug, thiserror::Error)]
#[error("advisory store unavailable")]
pub struct StoreError(#[from] pub sqlx::Error);

/// One stored advisory: the overall rating plus a rank per fixed category.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct CachedAdvisory {
    pub identifier: String,
    pub rating: String,
    pub sex_nudity: i64,
    pub violence_gore: i64,
    pub profanity: i64,
    pub substance_use: i64,
    pub frightening_intense: i64,
    pub created: DateTime<Utc>,
}

impl CachedAdvisory {
    /// Flattens a record into storage ranks; categories the record does not
    /// mention are stored as rank 0.
    pub fn from_record(identifier: &str, record: &AdvisoryRecord) -> Self {
        let rank = |category| {
            let severity = record.get(category).unwrap_or(SeverityLabel::None);

            if severity == SeverityLabel::Unknown {
                tracing::warn!(identifier = %identifier, category = %category, "storing unrecognized severity as none");
            }

            i64::from(severity.rank())
        };

        Self {
            identifier: identifier.to_string(),
            rating: record.overall_rating.clone(),
            sex_nudity: rank(Category::SexNudity),
            violence_gore: rank(Category::ViolenceGore),
            profanity: rank(Category::Profanity),
            substance_use: rank(Category::SubstanceUse),
            frightening_intense: rank(Category::FrighteningIntense),
            created: Utc::now(),
        }
    }

    pub fn rank(&self, category: Category) -> i64 {
        match category {
            Category::SexNudity => self.sex_nudity,
            Category::ViolenceGore => self.violence_gore,
            Category::Profanity => self.profanity,
            Category::SubstanceUse => self.substance_use,
            Category::FrighteningIntense => self.frightening_intense,
        }
    }

    /// Rebuilds a record with every fixed category present, in column order.
    pub fn to_record(&self) -> AdvisoryRecord {
        let mut record = AdvisoryRecord::with_rating(self.rating.clone());

        for category in Category::ALL {
            record.insert(category, SeverityLabel::from_rank(self.rank(category)));
        }

        record
    }
}

#[async_trait::async_trait]
pub trait AdvisoryStore: Send + Sync {
    /// Most recently created row for `identifier`, if any.
    async fn find_latest_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<CachedAdvisory>, StoreError>;

    /// Always adds a new row, older rows for the identifier are left alone.
    async fn insert(&self, advisory: &CachedAdvisory) -> Result<(), StoreError>;
}

#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: Pool,
}

impl SqliteStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AdvisoryStore for SqliteStore {
    #[tracing::instrument(skip(self), err)]
    async fn find_latest_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<CachedAdvisory>, StoreError> {
        let row = sqlx::query_as::<_, CachedAdvisory>(
            "SELECT identifier, rating, sex_nudity, violence_gore, profanity, substance_use, frightening_intense, created \
             FROM advisories WHERE identifier = ? ORDER BY created DESC, id DESC LIMIT 1",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self, advisory), fields(identifier = %advisory.identifier), err)]
    async fn insert(&self, advisory: &CachedAdvisory) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO advisories(identifier, rating, sex_nudity, violence_gore, profanity, substance_use, frightening_intense, created) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&advisory.identifier)
        .bind(&advisory.rating)
        .bind(advisory.sex_nudity)
        .bind(advisory.violence_gore)
        .bind(advisory.profanity)
        .bind(advisory.substance_use)
        .bind(advisory.frightening_intense)
        .bind(advisory.created)
        .execute(&self.pool)
        .await?;

        tracing::debug!("stored advisory");

        Ok(())
    }
}
