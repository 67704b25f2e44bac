use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::{FileServer, NamedFile};
use rocket::http::{Header, Status};
use rocket::request::Request;
use rocket::serde::json::Json;
use rocket::{catch, catchers, get, options, routes, Build, Response, Rocket, State};
use serde::Serialize;

use common::Config;

use crate::error::{ErrorBody, RequestError};
use crate::model::{Page, SortOrder};
use crate::store::ArticleStore;
use crate::view;

/// Application state stored inside Rocket managed state.
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub store: ArticleStore,
    pub page_size: usize,
    pub static_dir: PathBuf,
    pub topics: Vec<String>,
}

impl AppState {
    pub fn new(store: ArticleStore, page_size: usize, static_dir: impl Into<PathBuf>, topics: Vec<String>) -> Self {
        Self {
            started_at: Utc::now(),
            store,
            page_size,
            static_dir: static_dir.into(),
            topics,
        }
    }
}

/// Lets pages on any origin call the API.
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Cross-origin headers",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _req: &'r Request<'_>, res: &mut Response<'r>) {
        res.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        res.set_header(Header::new("Access-Control-Allow-Methods", "GET, OPTIONS"));
        res.set_header(Header::new("Access-Control-Allow-Headers", "Content-Type"));
        res.set_header(Header::new("Access-Control-Max-Age", "86400"));
    }
}

/// Response structure for `/api/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    cached_topics: Vec<CachedTopic>,
}

#[derive(Serialize)]
struct CachedTopic {
    topic: String,
    articles: usize,
    fetched_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct TopicsResponse {
    topics: Vec<String>,
}

/// Landing page
#[get("/")]
async fn index(state: &State<AppState>) -> Option<NamedFile> {
    NamedFile::open(state.static_dir.join("index.html")).await.ok()
}

/// CORS preflight; headers come from the [`Cors`] fairing.
#[options("/<_..>")]
fn preflight() -> Status {
    Status::NoContent
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

/// One sorted page of a topic's articles. `page` defaults to 1, `sort` to latest.
#[get("/api/news/<topic>?<page>&<sort>")]
async fn news(
    state: &State<AppState>,
    topic: &str,
    page: Option<&str>,
    sort: Option<&str>,
) -> Result<Json<Page>, RequestError> {
    let page = parse_page(page)?;
    let sort = match sort {
        Some(s) => s.parse::<SortOrder>()?,
        None => SortOrder::default(),
    };

    let articles = state.store.resolve(topic, Utc::now()).await;
    let result = view::paginate(&articles, sort, page, state.page_size);
    tracing::debug!(
        "topic '{}' page {} ({}): {} of {} articles",
        topic,
        page,
        sort,
        result.articles.len(),
        result.meta.total
    );
    Ok(Json(result))
}

#[get("/api/topics")]
async fn topics(state: &State<AppState>) -> Json<TopicsResponse> {
    Json(TopicsResponse {
        topics: state.topics.clone(),
    })
}

/// Uptime and what is currently cached.
#[get("/api/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    let uptime = (Utc::now() - state.started_at).num_seconds();
    let cached_topics = state
        .store
        .cache()
        .entries()
        .into_iter()
        .map(|(topic, entry)| CachedTopic {
            topic,
            articles: entry.articles.len(),
            fetched_at: entry.fetched_at,
        })
        .collect();

    Json(StatusResponse {
        status: "ok",
        uptime_seconds: uptime,
        cached_topics,
    })
}

#[catch(404)]
fn not_found(req: &Request) -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "not_found".to_string(),
        message: format!("no route for {}", req.uri()),
    })
}

#[catch(500)]
fn internal_error() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "internal".to_string(),
        message: "internal server error".to_string(),
    })
}

fn parse_page(raw: Option<&str>) -> Result<usize, RequestError> {
    match raw {
        None => Ok(1),
        Some(s) => match s.trim().parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(RequestError::InvalidPage(s.to_string())),
        },
    }
}

/// Assemble the Rocket instance without launching it (tests drive it
/// through a local client).
pub fn build_rocket(state: AppState, figment: rocket::figment::Figment) -> Rocket<Build> {
    let static_dir = state.static_dir.clone();
    let mut rocket = rocket::custom(figment)
        .manage(state)
        .attach(Cors)
        .mount("/", routes![index, preflight, health, news, topics, status])
        .register("/", catchers![not_found, internal_error]);

    if static_dir.is_dir() {
        rocket = rocket.mount("/static", FileServer::from(static_dir));
    } else {
        tracing::warn!("static directory {} not found; serving API only", static_dir.display());
    }
    rocket
}

/// Build and launch the Rocket server, binding to the configured address and port.
///
/// Blocks until Rocket shuts down.
pub async fn launch_rocket(state: AppState, config: &Config, port: u16) -> Result<()> {
    let figment = rocket::Config::figment()
        .merge(("address", config.bind()))
        .merge(("port", port));

    tracing::info!("Starting Rocket HTTP server on {}:{}", config.bind(), port);
    build_rocket(state, figment)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
