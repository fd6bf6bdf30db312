//! View building and HTML rendering.
//!
//! Everything here is pure: records from the API client and the stores go in,
//! view models and HTML strings come out. Templates live in `templates/`.
use askama::Template;

use crate::controller::{hero_movie, HERO_FALLBACK_TITLE};
use crate::format::{format_date, format_rating, format_runtime, truncate_text, year_from_date};
use crate::theme::Theme;
use crate::tmdb::{
    resolve_trailer_key, Category, CategoryId, ImageCdn, ImageSize, MovieDetail, MovieId,
    MovieSummary,
};
use crate::watchlist::WatchlistEntry;

const OVERVIEW_CHARS: usize = 120;
const CAST_LIMIT: usize = 10;
const CAST_NAME_CHARS: usize = 15;
const CAST_CHARACTER_CHARS: usize = 20;
const WATCHLIST_TITLE_CHARS: usize = 20;
const SEARCH_RESULT_LIMIT: usize = 10;
const TRENDING_BADGES: usize = 3;
const TOP_RATED_THRESHOLD: f64 = 8.0;

/// Shared page frame: theme, notification banner, search box state.
#[derive(Debug, Clone)]
pub struct Chrome {
    pub light_theme: bool,
    pub has_notice: bool,
    pub notice: String,
    pub query: String,
    pub return_to: String,
}

impl Chrome {
    pub fn new(theme: Theme, return_to: &str) -> Self {
        Self {
            light_theme: theme.is_light(),
            has_notice: false,
            notice: String::new(),
            query: String::new(),
            return_to: return_to.to_string(),
        }
    }

    pub fn with_notice(mut self, notice: Option<&str>) -> Self {
        if let Some(n) = notice.map(str::trim).filter(|n| !n.is_empty()) {
            self.has_notice = true;
            self.notice = n.to_string();
        }
        self
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.to_string();
        self
    }
}

/// Hidden-field values for the watchlist toggle form.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleFields {
    pub id: MovieId,
    pub title: String,
    pub poster_path: String,
    pub vote_average: String,
    pub release_date: String,
}

impl ToggleFields {
    fn new(
        id: MovieId,
        title: &str,
        poster_path: Option<&str>,
        vote_average: f64,
        release_date: Option<&str>,
    ) -> Self {
        Self {
            id,
            title: title.to_string(),
            poster_path: poster_path.unwrap_or_default().to_string(),
            vote_average: vote_average.to_string(),
            release_date: release_date.unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub id: MovieId,
    pub title: String,
    pub poster_url: String,
    pub rating: String,
    pub overview: String,
    pub has_rank: bool,
    pub rank: usize,
    pub top_rated: bool,
    pub saved: bool,
    pub toggle: ToggleFields,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub id: &'static str,
    pub name: String,
    pub cards: Vec<CardView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeroView {
    pub title: String,
    pub has_movie: bool,
    pub movie_id: MovieId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatchlistCardView {
    pub id: MovieId,
    pub title: String,
    pub poster_url: String,
    pub rating: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastView {
    pub name: String,
    pub character: String,
    pub photo_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieView {
    pub id: MovieId,
    pub title: String,
    pub poster_url: String,
    pub rating: String,
    pub release: String,
    pub runtime: String,
    pub genres: String,
    pub overview: String,
    pub cast: Vec<CastView>,
    pub has_trailer: bool,
    pub saved: bool,
    pub toggle: ToggleFields,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOption {
    pub id: &'static str,
    pub name: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultView {
    pub id: MovieId,
    pub title: String,
    pub poster_url: String,
    pub year: String,
    pub rating: String,
}

fn display_title(title: &str) -> String {
    if title.trim().is_empty() {
        "Untitled".to_string()
    } else {
        title.to_string()
    }
}

pub fn card_view(
    movie: &MovieSummary,
    index: usize,
    category: CategoryId,
    with_rank: bool,
    saved: bool,
    cdn: &ImageCdn,
) -> CardView {
    let has_rank = with_rank && category == CategoryId::Trending && index < TRENDING_BADGES;
    let overview = if movie.overview.trim().is_empty() {
        "No description available.".to_string()
    } else {
        truncate_text(&movie.overview, OVERVIEW_CHARS)
    };
    CardView {
        id: movie.id,
        title: display_title(&movie.title),
        poster_url: cdn.image_url(movie.poster_path.as_deref(), ImageSize::W500),
        rating: format_rating(movie.vote_average),
        overview,
        has_rank,
        rank: index + 1,
        top_rated: movie.vote_average >= TOP_RATED_THRESHOLD,
        saved,
        toggle: ToggleFields::new(
            movie.id,
            &movie.title,
            movie.poster_path.as_deref(),
            movie.vote_average,
            movie.release_date.as_deref(),
        ),
    }
}

/// Rows for the homepage. Categories without movies are skipped; `filter`
/// keeps a single category.
pub fn row_views(
    categories: &[Category],
    filter: Option<CategoryId>,
    with_rank: bool,
    watchlist: &[WatchlistEntry],
    cdn: &ImageCdn,
) -> Vec<RowView> {
    categories
        .iter()
        .filter(|c| !c.movies.is_empty())
        .filter(|c| filter.map_or(true, |f| f == c.id))
        .map(|c| RowView {
            id: c.id.as_str(),
            name: c.name.clone(),
            cards: c
                .movies
                .iter()
                .enumerate()
                .map(|(i, m)| {
                    let saved = watchlist.iter().any(|e| e.id == m.id);
                    card_view(m, i, c.id, with_rank, saved, cdn)
                })
                .collect(),
        })
        .collect()
}

pub fn hero_view(categories: &[Category]) -> HeroView {
    match hero_movie(categories) {
        Some(movie) if !movie.title.trim().is_empty() => HeroView {
            title: movie.title.clone(),
            has_movie: true,
            movie_id: movie.id,
        },
        Some(movie) => HeroView {
            title: HERO_FALLBACK_TITLE.to_string(),
            has_movie: true,
            movie_id: movie.id,
        },
        None => HeroView {
            title: HERO_FALLBACK_TITLE.to_string(),
            has_movie: false,
            movie_id: 0,
        },
    }
}

pub fn watchlist_views(entries: &[WatchlistEntry], cdn: &ImageCdn) -> Vec<WatchlistCardView> {
    entries
        .iter()
        .map(|e| WatchlistCardView {
            id: e.id,
            title: truncate_text(&display_title(&e.title), WATCHLIST_TITLE_CHARS),
            poster_url: cdn.image_url(e.poster_path.as_deref(), ImageSize::W300),
            rating: format_rating(e.vote_average),
        })
        .collect()
}

pub fn movie_view(detail: &MovieDetail, saved: bool, cdn: &ImageCdn) -> MovieView {
    let release = detail
        .release_date
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(format_date)
        .unwrap_or_else(|| "Release date unknown".to_string());
    let overview = if detail.overview.trim().is_empty() {
        "No overview available.".to_string()
    } else {
        detail.overview.clone()
    };
    let cast = detail
        .credits
        .cast
        .iter()
        .take(CAST_LIMIT)
        .map(|p| CastView {
            name: truncate_text(&p.name, CAST_NAME_CHARS),
            character: truncate_text(&p.character, CAST_CHARACTER_CHARS),
            photo_url: cdn.image_url(p.profile_path.as_deref(), ImageSize::W185),
        })
        .collect();

    MovieView {
        id: detail.id,
        title: display_title(&detail.title),
        poster_url: cdn.image_url(detail.poster_path.as_deref(), ImageSize::W500),
        rating: format_rating(detail.vote_average),
        release,
        runtime: detail.runtime.map(format_runtime).unwrap_or_default(),
        genres: detail
            .genres
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        overview,
        cast,
        has_trailer: resolve_trailer_key(&detail.videos).is_some(),
        saved,
        toggle: ToggleFields::new(
            detail.id,
            &detail.title,
            detail.poster_path.as_deref(),
            detail.vote_average,
            detail.release_date.as_deref(),
        ),
    }
}

pub fn search_views(results: &[MovieSummary], cdn: &ImageCdn) -> Vec<SearchResultView> {
    results
        .iter()
        .take(SEARCH_RESULT_LIMIT)
        .map(|m| SearchResultView {
            id: m.id,
            title: display_title(&m.title),
            poster_url: cdn.image_url(m.poster_path.as_deref(), ImageSize::W92),
            year: year_from_date(m.release_date.as_deref())
                .map(|y| y.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            rating: format_rating(m.vote_average),
        })
        .collect()
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub chrome: Chrome,
    pub hero: HeroView,
    pub rows: Vec<RowView>,
    pub all_active: bool,
    pub filters: Vec<FilterOption>,
    pub all_failed: bool,
    pub watchlist: Vec<WatchlistCardView>,
}

#[derive(Template)]
#[template(path = "rows.html")]
pub struct RowsTemplate {
    pub rows: Vec<RowView>,
}

#[derive(Template)]
#[template(path = "movie.html")]
pub struct MovieTemplate {
    pub chrome: Chrome,
    pub movie: MovieView,
}

#[derive(Template)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub chrome: Chrome,
    pub results: Vec<SearchResultView>,
    pub failed: bool,
}

#[derive(Template)]
#[template(path = "trailer.html")]
pub struct TrailerTemplate {
    pub chrome: Chrome,
    pub title: String,
    pub embed_url: String,
    pub back_url: String,
}

#[derive(Template)]
#[template(path = "confirm_clear.html")]
pub struct ConfirmClearTemplate {
    pub chrome: Chrome,
    pub count: usize,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub chrome: Chrome,
    pub message: String,
}

pub struct HomeContext<'a> {
    pub categories: &'a [Category],
    pub watchlist: &'a [WatchlistEntry],
    pub filter: Option<&'a str>,
    pub chrome: Chrome,
}

pub fn home_page(ctx: HomeContext<'_>, cdn: &ImageCdn) -> askama::Result<String> {
    let filter = ctx
        .filter
        .map(str::trim)
        .filter(|f| !f.is_empty() && *f != "all")
        .map(CategoryId::from_name);
    let template = HomeTemplate {
        hero: hero_view(ctx.categories),
        rows: row_views(ctx.categories, filter, true, ctx.watchlist, cdn),
        all_active: filter.is_none(),
        filters: CategoryId::HOMEPAGE
            .into_iter()
            .map(|c| FilterOption {
                id: c.as_str(),
                name: c.display_name(),
                active: filter == Some(c),
            })
            .collect(),
        all_failed: !ctx.categories.is_empty() && ctx.categories.iter().all(|c| c.error),
        watchlist: watchlist_views(ctx.watchlist, cdn),
        chrome: ctx.chrome,
    };
    template.render()
}

/// Cards appended by infinite scroll; rank badges only appear on the first page.
pub fn rows_fragment(
    categories: &[Category],
    watchlist: &[WatchlistEntry],
    cdn: &ImageCdn,
) -> askama::Result<String> {
    RowsTemplate {
        rows: row_views(categories, None, false, watchlist, cdn),
    }
    .render()
}

pub fn movie_page(
    detail: &MovieDetail,
    saved: bool,
    chrome: Chrome,
    cdn: &ImageCdn,
) -> askama::Result<String> {
    MovieTemplate {
        chrome,
        movie: movie_view(detail, saved, cdn),
    }
    .render()
}

/// `results` is `None` when the search call failed.
pub fn search_page(
    results: Option<&[MovieSummary]>,
    chrome: Chrome,
    cdn: &ImageCdn,
) -> askama::Result<String> {
    SearchTemplate {
        chrome,
        results: results.map(|r| search_views(r, cdn)).unwrap_or_default(),
        failed: results.is_none(),
    }
    .render()
}

pub fn trailer_page(
    title: &str,
    embed_url: &str,
    back_url: &str,
    chrome: Chrome,
) -> askama::Result<String> {
    TrailerTemplate {
        chrome,
        title: display_title(title),
        embed_url: embed_url.to_string(),
        back_url: back_url.to_string(),
    }
    .render()
}

pub fn confirm_clear_page(count: usize, chrome: Chrome) -> askama::Result<String> {
    ConfirmClearTemplate { chrome, count }.render()
}

pub fn error_page(message: &str) -> askama::Result<String> {
    ErrorTemplate {
        chrome: Chrome::new(Theme::default(), "/"),
        message: message.to_string(),
    }
    .render()
}
