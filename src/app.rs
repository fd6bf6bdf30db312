use anyhow::{Context, Result};
use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::controller::{find_playable_trailer, hero_movie, random_trending, HomeFeed};
use crate::error::{AppError, AppResult};
use crate::render::{self, Chrome, HomeContext};
use crate::storage::{FileStore, Persistence};
use crate::theme::ThemeStore;
use crate::tmdb::{
    resolve_trailer_key, youtube_embed_url, Category, Genre, ImageCdn, MovieId, MoviePage,
    TmdbApi, TmdbClient,
};
use crate::watchlist::{Watchlist, WatchlistEntry};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn TmdbApi>,
    pub images: ImageCdn,
    pub watchlist: Arc<Mutex<Watchlist>>,
    pub theme: Arc<Mutex<ThemeStore>>,
    pub feed: Arc<HomeFeed>,
}

impl AppState {
    pub fn new(api: Arc<dyn TmdbApi>, persistence: Persistence, images: ImageCdn) -> Self {
        Self {
            api,
            images,
            watchlist: Arc::new(Mutex::new(Watchlist::load(persistence.clone()))),
            theme: Arc::new(Mutex::new(ThemeStore::load(persistence))),
            feed: Arc::new(HomeFeed::new()),
        }
    }

    async fn chrome(&self, return_to: &str) -> Chrome {
        Chrome::new(self.theme.lock().await.current(), return_to)
    }

    async fn watchlist_entries(&self) -> Vec<WatchlistEntry> {
        self.watchlist.lock().await.entries().to_vec()
    }

    /// Current feed rows, loading page 1 first if nothing was loaded yet.
    async fn feed_categories(&self) -> Vec<Category> {
        let categories = self.feed.categories().await;
        if categories.is_empty() {
            self.feed.load_initial(&*self.api).await
        } else {
            categories
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let api: Arc<dyn TmdbApi> = Arc::new(TmdbClient::from_config(&config)?);
    let store = FileStore::new(config.data_dir.clone());
    info!("Persisting user data under {:?}", store.dir());
    let persistence = Persistence::new(Arc::new(store));
    let state = AppState::new(api, persistence, ImageCdn::new(&config.image_base_url));

    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/feed/more", get(feed_more))
        .route("/category/:name", get(category))
        .route("/genres", get(genres))
        .route("/genre/:id", get(genre))
        .route("/search", get(search))
        .route("/movie/:id", get(movie))
        .route("/movie/:id/trailer", get(trailer))
        .route("/hero/play", get(hero_play))
        .route("/hero/info", get(hero_info))
        .route("/watchlist", get(watchlist))
        .route("/watchlist/toggle", post(toggle_watchlist))
        .route("/watchlist/:id/remove", post(remove_from_watchlist))
        .route("/watchlist/clear", get(confirm_clear).post(clear_watchlist))
        .route("/theme/toggle", post(toggle_theme))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Default, Deserialize)]
struct HomeQuery {
    category: Option<String>,
    notice: Option<String>,
}

async fn home(State(state): State<AppState>, Query(q): Query<HomeQuery>) -> AppResult<Html<String>> {
    let categories = state.feed.load_initial(&*state.api).await;
    if let Some(hero) = hero_movie(&categories) {
        info!("Featured movie: {} ({})", hero.title, hero.id);
    }
    let entries = state.watchlist_entries().await;
    let chrome = state.chrome("/").await.with_notice(q.notice.as_deref());
    let html = render::home_page(
        HomeContext {
            categories: &categories,
            watchlist: &entries,
            filter: q.category.as_deref(),
            chrome,
        },
        &state.images,
    )?;
    Ok(Html(html))
}

async fn feed_more(State(state): State<AppState>) -> AppResult<Response> {
    match state.feed.load_more(&*state.api).await {
        Ok(None) => Ok(StatusCode::NO_CONTENT.into_response()),
        Ok(Some(fresh)) => {
            let entries = state.watchlist_entries().await;
            let html = render::rows_fragment(&fresh, &entries, &state.images)?;
            Ok(Html(html).into_response())
        }
        Err(e) => {
            warn!("Infinite scroll failed: {}", e);
            Ok((StatusCode::BAD_GATEWAY, "Failed to load more movies.").into_response())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    page: Option<u32>,
}

async fn category(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<PageQuery>,
) -> AppResult<Json<MoviePage>> {
    let page = state
        .api
        .fetch_category(&name, q.page.unwrap_or(1))
        .await
        .map_err(|e| AppError::fetch("Failed to load movies.", e))?;
    Ok(Json(page))
}

async fn genres(State(state): State<AppState>) -> AppResult<Json<Vec<Genre>>> {
    let genres = state
        .api
        .get_genres()
        .await
        .map_err(|e| AppError::fetch("Failed to load genres.", e))?;
    Ok(Json(genres))
}

async fn genre(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(q): Query<PageQuery>,
) -> AppResult<Json<MoviePage>> {
    let page = state
        .api
        .movies_by_genre(id, q.page.unwrap_or(1))
        .await
        .map_err(|e| AppError::fetch("Failed to load movies.", e))?;
    Ok(Json(page))
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    q: Option<String>,
    page: Option<u32>,
}

async fn search(State(state): State<AppState>, Query(q): Query<SearchQuery>) -> AppResult<Response> {
    let query = q.q.unwrap_or_default();
    let query = query.trim();
    if query.is_empty() {
        return Ok(Redirect::to("/").into_response());
    }

    let results = match state.api.search(query, q.page.unwrap_or(1)).await {
        Ok(page) => Some(page),
        Err(e) => {
            warn!("Search for '{}' failed: {}", query, e);
            None
        }
    };
    let return_to = format!("/search?q={}", urlencoding::encode(query));
    let chrome = state.chrome(&return_to).await.with_query(query);
    let html = render::search_page(
        results.as_ref().map(|p| p.results.as_slice()),
        chrome,
        &state.images,
    )?;
    Ok(Html(html).into_response())
}

#[derive(Debug, Default, Deserialize)]
struct NoticeQuery {
    notice: Option<String>,
}

async fn movie(
    State(state): State<AppState>,
    Path(id): Path<MovieId>,
    Query(q): Query<NoticeQuery>,
) -> AppResult<Html<String>> {
    let detail = state
        .api
        .get_movie_details(id)
        .await
        .map_err(|e| AppError::fetch("Failed to load movie details. Please try again.", e))?;
    let saved = state.watchlist.lock().await.contains(id);
    let chrome = state
        .chrome(&format!("/movie/{id}"))
        .await
        .with_notice(q.notice.as_deref());
    let html = render::movie_page(&detail, saved, chrome, &state.images)?;
    Ok(Html(html))
}

async fn trailer(State(state): State<AppState>, Path(id): Path<MovieId>) -> AppResult<Html<String>> {
    let detail = state
        .api
        .get_movie_details(id)
        .await
        .map_err(|e| AppError::fetch("Failed to load movie details. Please try again.", e))?;
    let key = resolve_trailer_key(&detail.videos)
        .ok_or_else(|| AppError::NotFound("No trailer available for this movie.".to_string()))?;
    let back = format!("/movie/{id}");
    let chrome = state.chrome(&back).await;
    let html = render::trailer_page(&detail.title, &youtube_embed_url(key), &back, chrome)?;
    Ok(Html(html))
}

async fn hero_play(State(state): State<AppState>) -> AppResult<Html<String>> {
    let categories = state.feed_categories().await;
    let (movie, key) = find_playable_trailer(&*state.api, &categories)
        .await
        .ok_or_else(|| AppError::NotFound("No trailers available at the moment.".to_string()))?;
    let chrome = state.chrome("/").await;
    let html = render::trailer_page(&movie.title, &youtube_embed_url(&key), "/", chrome)?;
    Ok(Html(html))
}

async fn hero_info(State(state): State<AppState>) -> AppResult<Redirect> {
    let categories = state.feed_categories().await;
    let movie = random_trending(&categories)
        .ok_or_else(|| AppError::NotFound("No movies available.".to_string()))?;
    Ok(Redirect::to(&format!("/movie/{}", movie.id)))
}

async fn watchlist(State(state): State<AppState>) -> Json<Vec<WatchlistEntry>> {
    Json(state.watchlist_entries().await)
}

#[derive(Debug, Deserialize)]
struct ToggleForm {
    id: MovieId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    poster_path: String,
    #[serde(default)]
    vote_average: String,
    #[serde(default)]
    release_date: String,
    #[serde(default)]
    return_to: String,
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl From<ToggleForm> for WatchlistEntry {
    fn from(form: ToggleForm) -> Self {
        Self {
            id: form.id,
            title: form.title,
            poster_path: non_empty(form.poster_path),
            vote_average: form.vote_average.trim().parse().unwrap_or(0.0),
            release_date: non_empty(form.release_date),
        }
    }
}

async fn toggle_watchlist(State(state): State<AppState>, Form(form): Form<ToggleForm>) -> Redirect {
    let target = local_path(&form.return_to).to_string();
    let id = form.id;
    let outcome = state.watchlist.lock().await.toggle(form.into());
    info!("Watchlist toggle for movie {}: {:?}", id, outcome);
    Redirect::to(&with_notice(&target, outcome.notice()))
}

async fn remove_from_watchlist(State(state): State<AppState>, Path(id): Path<MovieId>) -> Redirect {
    if state.watchlist.lock().await.remove(id) {
        info!("Removed movie {} from watchlist", id);
        Redirect::to(&with_notice("/", "Removed from watchlist!"))
    } else {
        Redirect::to("/")
    }
}

async fn confirm_clear(State(state): State<AppState>) -> AppResult<Html<String>> {
    let count = state.watchlist.lock().await.entries().len();
    let chrome = state.chrome("/").await;
    Ok(Html(render::confirm_clear_page(count, chrome)?))
}

#[derive(Debug, Default, Deserialize)]
struct ClearForm {
    confirm: Option<String>,
}

async fn clear_watchlist(State(state): State<AppState>, Form(form): Form<ClearForm>) -> Redirect {
    if form.confirm.as_deref() != Some("yes") {
        return Redirect::to("/");
    }
    state.watchlist.lock().await.clear();
    info!("Watchlist cleared");
    Redirect::to(&with_notice("/", "Watchlist cleared!"))
}

#[derive(Debug, Default, Deserialize)]
struct ReturnForm {
    #[serde(default)]
    return_to: String,
}

async fn toggle_theme(State(state): State<AppState>, Form(form): Form<ReturnForm>) -> Redirect {
    let theme = state.theme.lock().await.toggle();
    info!("Theme switched to {:?}", theme);
    Redirect::to(local_path(&form.return_to))
}

/// Only same-site paths are accepted as redirect targets.
fn local_path(target: &str) -> &str {
    let target = target.trim();
    if target.starts_with('/') && !target.starts_with("//") && !target.contains('\\') {
        target
    } else {
        "/"
    }
}

fn with_notice(path: &str, notice: &str) -> String {
    let (base, fragment) = match path.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (path, None),
    };
    let sep = if base.contains('?') { '&' } else { '?' };
    let mut url = format!("{base}{sep}notice={}", urlencoding::encode(notice));
    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    url
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
