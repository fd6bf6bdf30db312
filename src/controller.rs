//! Home feed lifecycle: initial load, infinite-scroll pagination and the hero
//! banner actions.
use rand::seq::IndexedRandom;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::tmdb::{resolve_trailer_key, Category, CategoryId, MovieSummary, TmdbApi};

pub const HERO_FALLBACK_TITLE: &str = "Unlimited movies, TV shows, and more";
const TRAILER_CANDIDATES: usize = 3;

#[derive(Debug, thiserror::Error)]
#[error("no category could be loaded for page {page}")]
pub struct LoadMoreError {
    pub page: u32,
}

#[derive(Debug, Default)]
struct FeedState {
    categories: Vec<Category>,
    current_page: u32,
}

#[derive(Debug, Default)]
pub struct HomeFeed {
    state: Mutex<FeedState>,
    loading: AtomicBool,
}

struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl HomeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches page 1 and replaces whatever the feed held.
    pub async fn load_initial(&self, api: &dyn TmdbApi) -> Vec<Category> {
        info!("Loading homepage categories");
        let categories = api.get_homepage_movies(1).await;
        let mut state = self.state.lock().await;
        state.categories = categories.clone();
        state.current_page = 1;
        categories
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.state.lock().await.categories.clone()
    }

    pub async fn current_page(&self) -> u32 {
        self.state.lock().await.current_page
    }

    /// Fetches the next page and appends it to the existing rows.
    ///
    /// Returns `Ok(None)` when another load is already in flight, otherwise the
    /// newly fetched rows. When every category fails the page counter is left
    /// unchanged so the next attempt retries the same page.
    pub async fn load_more(&self, api: &dyn TmdbApi) -> Result<Option<Vec<Category>>, LoadMoreError> {
        if self.loading.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        let _guard = LoadingGuard(&self.loading);

        let page = self.state.lock().await.current_page.max(1) + 1;
        info!("Loading more movies (page {})", page);
        let fresh = api.get_homepage_movies(page).await;
        if fresh.iter().all(|c| c.error) {
            warn!("Every category failed for page {}", page);
            return Err(LoadMoreError { page });
        }

        let mut state = self.state.lock().await;
        let FeedState {
            categories,
            current_page,
        } = &mut *state;
        for new_category in &fresh {
            match categories.iter_mut().find(|c| c.id == new_category.id) {
                Some(existing) => existing.movies.extend(new_category.movies.iter().cloned()),
                None => categories.push(new_category.clone()),
            }
        }
        *current_page = page;
        Ok(Some(fresh))
    }
}

fn trending(categories: &[Category]) -> &[MovieSummary] {
    categories
        .iter()
        .find(|c| c.id == CategoryId::Trending)
        .map(|c| c.movies.as_slice())
        .unwrap_or_default()
}

/// The featured movie: first trending entry.
pub fn hero_movie(categories: &[Category]) -> Option<&MovieSummary> {
    trending(categories).first()
}

pub fn random_trending(categories: &[Category]) -> Option<&MovieSummary> {
    trending(categories).choose(&mut rand::rng())
}

/// The first of the leading trending movies that has a trailer, with its key.
/// Movies whose details fail to load are skipped.
pub async fn find_playable_trailer<'a>(
    api: &dyn TmdbApi,
    categories: &'a [Category],
) -> Option<(&'a MovieSummary, String)> {
    for movie in trending(categories).iter().take(TRAILER_CANDIDATES) {
        match api.get_movie_details(movie.id).await {
            Ok(detail) => {
                if let Some(key) = resolve_trailer_key(&detail.videos) {
                    return Some((movie, key.to_string()));
                }
            }
            Err(e) => {
                warn!("Skipping movie {} while looking for a trailer: {}", movie.id, e);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::tmdb::{Credits, Genre, MovieDetail, MovieId, MoviePage, Video, Videos};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    fn movie(id: MovieId) -> MovieSummary {
        MovieSummary {
            id,
            title: format!("Movie {id}"),
            poster_path: None,
            overview: String::new(),
            vote_average: 6.0,
            release_date: None,
        }
    }

    struct PagedApi {
        failing_pages: Vec<u32>,
        requested: StdMutex<Vec<u32>>,
    }

    #[async_trait]
    impl TmdbApi for PagedApi {
        async fn fetch_category(&self, _name: &str, _page: u32) -> Result<MoviePage, FetchError> {
            Ok(MoviePage::empty())
        }
        async fn search(&self, _query: &str, _page: u32) -> Result<MoviePage, FetchError> {
            Ok(MoviePage::empty())
        }
        async fn get_movie_details(&self, id: MovieId) -> Result<MovieDetail, FetchError> {
            if id == 1 {
                return Err(FetchError::Status {
                    endpoint: "/movie/1".into(),
                    status: 404,
                });
            }
            let results = if id == 3 {
                vec![Video {
                    video_type: "Teaser".into(),
                    site: "YouTube".into(),
                    key: "teaser-3".into(),
                }]
            } else {
                Vec::new()
            };
            Ok(MovieDetail {
                id,
                title: String::new(),
                poster_path: None,
                overview: String::new(),
                vote_average: 0.0,
                release_date: None,
                runtime: None,
                genres: Vec::<Genre>::new(),
                credits: Credits::default(),
                videos: Videos { results },
            })
        }
        async fn get_homepage_movies(&self, page: u32) -> Vec<Category> {
            self.requested.lock().unwrap().push(page);
            CategoryId::HOMEPAGE
                .into_iter()
                .map(|id| {
                    if self.failing_pages.contains(&page) {
                        Category::failed(id)
                    } else {
                        let base = page as MovieId * 100;
                        Category::loaded(id, vec![movie(base + 1), movie(base + 2)])
                    }
                })
                .collect()
        }
        async fn get_genres(&self) -> Result<Vec<Genre>, FetchError> {
            Ok(Vec::new())
        }
        async fn movies_by_genre(&self, _genre_id: i32, _page: u32) -> Result<MoviePage, FetchError> {
            Ok(MoviePage::empty())
        }
    }

    fn api(failing_pages: Vec<u32>) -> PagedApi {
        PagedApi {
            failing_pages,
            requested: StdMutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn load_more_appends_next_page_to_each_row() {
        let api = api(Vec::new());
        let feed = HomeFeed::new();
        feed.load_initial(&api).await;

        let fresh = feed.load_more(&api).await.unwrap().unwrap();
        assert_eq!(fresh[0].movies[0].id, 201);
        assert_eq!(feed.current_page().await, 2);

        let rows = feed.categories().await;
        let ids: Vec<MovieId> = rows[0].movies.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![101, 102, 201, 202]);
        assert_eq!(*api.requested.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn total_failure_keeps_page_for_retry() {
        let api = api(vec![2]);
        let feed = HomeFeed::new();
        feed.load_initial(&api).await;

        let err = feed.load_more(&api).await.unwrap_err();
        assert_eq!(err.page, 2);
        assert_eq!(feed.current_page().await, 1);
        assert_eq!(feed.categories().await[0].movies.len(), 2);
        // the loading flag is released after a failure
        assert!(feed.load_more(&api).await.is_err());
    }

    #[tokio::test]
    async fn load_more_is_skipped_while_loading() {
        let api = api(Vec::new());
        let feed = HomeFeed::new();
        feed.loading.store(true, Ordering::SeqCst);
        assert!(feed.load_more(&api).await.unwrap().is_none());
        assert!(api.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn hero_is_first_trending_movie() {
        let api = api(Vec::new());
        let rows = api.get_homepage_movies(1).await;
        assert_eq!(hero_movie(&rows).map(|m| m.id), Some(101));
        assert!(random_trending(&rows).is_some());
        assert!(hero_movie(&[Category::failed(CategoryId::Trending)]).is_none());
    }

    #[tokio::test]
    async fn trailer_search_skips_failures_and_movies_without_videos() {
        let api = api(Vec::new());
        let rows = vec![Category::loaded(
            CategoryId::Trending,
            vec![movie(1), movie(2), movie(3), movie(4)],
        )];
        let (owner, key) = find_playable_trailer(&api, &rows).await.unwrap();
        assert_eq!(owner.id, 3);
        assert_eq!(key, "teaser-3");

        let only_first_two = vec![Category::loaded(
            CategoryId::Trending,
            vec![movie(1), movie(2)],
        )];
        assert!(find_playable_trailer(&api, &only_first_two).await.is_none());
    }
}
