use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    error_handling::HandleErrorLayer,
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    BoxError, Json, Router, Server,
};
use family_night_common::{parse_identifier, Conf, Context as _, InvalidIdentifier, Report};
use family_night_queries::{AdvisoryStore, SqliteStore};
use family_night_scrape::{HttpUpstream, ResolveError, Resolver, Upstream};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

const ADDON_ID: &str = "com.mhdev.family-night";
const STREAM_NAME: &str = "Parental Guide";

pub async fn run(conf: &Conf) -> Result<(), Report> {
    let pool = family_night_queries::init_database_connection(conf).await?;
    let resolver = Resolver::new(SqliteStore::new(pool), HttpUpstream::new(conf)?);

    let addr: SocketAddr = conf
        .listen
        .parse()
        .with_context(|| format!("invalid listen address `{}`", conf.listen))?;

    // leave room for the upstream fetch to time out on its own first
    let request_timeout = Duration::from_secs(conf.fetch_timeout + 5);

    let app = app(Arc::new(resolver), request_timeout);

    tracing::info!("starting on `{}`", addr);

    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(err = ?err, "unable to listen for shutdown signal");
    }

    tracing::info!("shutting down");
}

pub fn app<S, U>(resolver: Arc<Resolver<S, U>>, request_timeout: Duration) -> Router
where
    S: AdvisoryStore + 'static,
    U: Upstream + 'static,
{
    Router::new()
        .route("/manifest.json", get(manifest))
        .route("/stream/:kind/:id", get(stream::<S, U>))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(|error: BoxError| async move {
                    if error.is::<tower::timeout::error::Elapsed>() {
                        (StatusCode::REQUEST_TIMEOUT, String::new())
                    } else {
                        (StatusCode::INTERNAL_SERVER_ERROR, String::new())
                    }
                }))
                .load_shed()
                .concurrency_limit(1024)
                .timeout(request_timeout)
                .layer(Extension(resolver))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    id: &'static str,
    version: &'static str,
    name: &'static str,
    description: &'static str,
    resources: &'static [&'static str],
    types: &'static [&'static str],
    id_prefixes: &'static [&'static str],
    catalogs: &'static [&'static str],
}

async fn manifest() -> Json<Manifest> {
    Json(Manifest {
        id: ADDON_ID,
        version: env!("CARGO_PKG_VERSION"),
        name: "Family Night",
        description: "Parental guide ratings for movies and series",
        resources: &["stream"],
        types: &["movie", "series"],
        id_prefixes: &["tt"],
        catalogs: &[],
    })
}

#[derive(Debug, serde::Serialize)]
struct Streams {
    streams: Vec<Stream>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Stream {
    name: &'static str,
    title: String,
    external_url: String,
}

async fn stream<S, U>(
    Extension(resolver): Extension<Arc<Resolver<S, U>>>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<Streams>, Error>
where
    S: AdvisoryStore + 'static,
    U: Upstream + 'static,
{
    let raw = id.strip_suffix(".json").unwrap_or(&id);
    let identifier = parse_identifier(raw)?;

    tracing::debug!(kind = %kind, identifier = %identifier, "stream request");

    let title = resolver.resolve(identifier).await?;

    Ok(Json(Streams {
        streams: vec![Stream {
            name: STREAM_NAME,
            title,
            external_url: resolver.upstream().page_url(identifier),
        }],
    }))
}

#[derive(Debug)]
pub struct Error {
    status: StatusCode,
    report: Report,
}

impl From<InvalidIdentifier> for Error {
    fn from(err: InvalidIdentifier) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            report: err.into(),
        }
    }
}

impl From<ResolveError> for Error {
    fn from(err: ResolveError) -> Self {
        let status = match err {
            ResolveError::Fetch(_) => StatusCode::NOT_FOUND,
            ResolveError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self {
            status,
            report: err.into(),
        }
    }
}

impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum_core::response::Response {
        #[derive(serde::Serialize)]
        struct Res {
            error: ResErr,
        }

        #[derive(serde::Serialize)]
        struct ResErr {
            code: u16,
            status: &'static str,
        }

        if self.status.is_server_error() {
            tracing::error!(error = ?self.report, "error handling request");
        } else {
            tracing::warn!(error = %self.report, "rejected request");
        }

        let body = Res {
            error: ResErr {
                code: self.status.as_u16(),
                status: self.status.canonical_reason().unwrap_or("error"),
            },
        };

        (self.status, Json(body)).into_response()
    }
}
