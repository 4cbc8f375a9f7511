mod extract;
mod fetch;
mod query;

use family_night_common::{
    models::AdvisoryRecord, parse_identifier, render::render, Conf, Report,
};
use family_night_queries::{AdvisoryStore, CachedAdvisory, SqliteStore};

pub use extract::extract;
pub use fetch::{FetchError, HttpUpstream, Upstream};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unable to read advisory document")]
    Io(#[from] std::io::Error),
    #[error("advisory document has no root element")]
    NoRoot,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("advisory page could not be parsed")]
    Parse(#[from] ParseError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Upstream,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct Resolution {
    pub source: Source,
    pub record: AdvisoryRecord,
}

/// Cache-aside lookup of advisories: the store is asked first, the upstream
/// page is only scraped on a miss and the result is stored for next time.
///
/// Concurrent misses for the same title may each scrape and insert, reads
/// always take the newest row so the extra rows are harmless.
pub struct Resolver<S, U> {
    store: S,
    upstream: U,
}

impl<S, U> Resolver<S, U>
where
    S: AdvisoryStore,
    U: Upstream,
{
    pub fn new(store: S, upstream: U) -> Self {
        Self { store, upstream }
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    /// Rendered advisory for `identifier`.
    pub async fn resolve(&self, identifier: &str) -> Result<String, ResolveError> {
        let resolution = self.resolve_record(identifier).await?;

        Ok(render(&resolution.record))
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn resolve_record(&self, identifier: &str) -> Result<Resolution, ResolveError> {
        match self.store.find_latest_by_identifier(identifier).await {
            Ok(Some(row)) => {
                tracing::info!("cache hit");

                return Ok(Resolution {
                    source: Source::Cache,
                    record: row.to_record(),
                });
            }
            Ok(None) => tracing::info!("cache miss"),
            Err(err) => tracing::warn!(error = ?err, "cache read failed, scraping instead"),
        }

        let html = self.upstream.fetch(identifier).await?;

        let record = extract(&html)?;

        // the scrape already succeeded, a failed write only costs a re-scrape later
        let row = CachedAdvisory::from_record(identifier, &record);
        if let Err(err) = self.store.insert(&row).await {
            tracing::error!(error = ?err, "unable to cache advisory");
        }

        Ok(Resolution {
            source: Source::Upstream,
            record,
        })
    }
}

#[tracing::instrument(skip(conf), err)]
pub async fn run(conf: &Conf, identifier: &str, json: bool) -> Result<(), Report> {
    let identifier = parse_identifier(identifier)?;

    let pool = family_night_queries::init_database_connection(conf).await?;
    let resolver = Resolver::new(SqliteStore::new(pool), HttpUpstream::new(conf)?);

    let resolution = resolver.resolve_record(identifier).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else {
        println!("{}", render(&resolution.record));
    }

    Ok(())
}
