use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

use crate::cache::{Params, RequestCache};
use crate::config::Config;
use crate::error::FetchError;

pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/500x750?text=No+Image";
pub const HOMEPAGE_ROW_LIMIT: usize = 10;
const TRAILER_SITE: &str = "YouTube";

pub type MovieId = i32;

/// Upstream records sometimes carry explicit `null`s; read them as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Trending,
    Popular,
    TopRated,
    NowPlaying,
    Upcoming,
    Search,
    MovieDetails(MovieId),
    MovieCredits(MovieId),
    MovieVideos(MovieId),
    GenreList,
    Discover,
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Trending => "/trending/movie/week".to_string(),
            Endpoint::Popular => "/movie/popular".to_string(),
            Endpoint::TopRated => "/movie/top_rated".to_string(),
            Endpoint::NowPlaying => "/movie/now_playing".to_string(),
            Endpoint::Upcoming => "/movie/upcoming".to_string(),
            Endpoint::Search => "/search/movie".to_string(),
            Endpoint::MovieDetails(id) => format!("/movie/{id}"),
            Endpoint::MovieCredits(id) => format!("/movie/{id}/credits"),
            Endpoint::MovieVideos(id) => format!("/movie/{id}/videos"),
            Endpoint::GenreList => "/genre/movie/list".to_string(),
            Endpoint::Discover => "/discover/movie".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CategoryId {
    Trending,
    Popular,
    TopRated,
    NowPlaying,
    Upcoming,
}

impl CategoryId {
    /// Homepage rows, in display order.
    pub const HOMEPAGE: [CategoryId; 5] = [
        CategoryId::Trending,
        CategoryId::Popular,
        CategoryId::TopRated,
        CategoryId::NowPlaying,
        CategoryId::Upcoming,
    ];

    /// Unknown names fall back to popular.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "trending" => CategoryId::Trending,
            "topRated" | "top_rated" => CategoryId::TopRated,
            "nowPlaying" | "now_playing" => CategoryId::NowPlaying,
            "upcoming" => CategoryId::Upcoming,
            _ => CategoryId::Popular,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryId::Trending => "trending",
            CategoryId::Popular => "popular",
            CategoryId::TopRated => "topRated",
            CategoryId::NowPlaying => "nowPlaying",
            CategoryId::Upcoming => "upcoming",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CategoryId::Trending => "Trending Now",
            CategoryId::Popular => "Popular",
            CategoryId::TopRated => "Top Rated",
            CategoryId::NowPlaying => "Now Playing",
            CategoryId::Upcoming => "Upcoming Movies",
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        match self {
            CategoryId::Trending => Endpoint::Trending,
            CategoryId::Popular => Endpoint::Popular,
            CategoryId::TopRated => Endpoint::TopRated,
            CategoryId::NowPlaying => Endpoint::NowPlaying,
            CategoryId::Upcoming => Endpoint::Upcoming,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: MovieId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoviePage {
    #[serde(default = "first_page", deserialize_with = "page_or_first")]
    pub page: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<MovieSummary>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_pages: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_results: u64,
}

fn first_page() -> u32 {
    1
}

fn page_or_first<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_else(first_page))
}

impl MoviePage {
    pub fn empty() -> Self {
        Self {
            page: 1,
            results: Vec::new(),
            total_pages: 0,
            total_results: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub character: String,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cast: Vec<CastMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub video_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub site: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Videos {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Video>,
}

/// Details, credits and videos of one movie, merged from three responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: MovieId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<Genre>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub credits: Credits,
    #[serde(default, deserialize_with = "null_as_default")]
    pub videos: Videos,
}

/// One homepage row. A failed fetch yields an empty row with `error` set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub movies: Vec<MovieSummary>,
    pub error: bool,
}

impl Category {
    pub fn loaded(id: CategoryId, mut movies: Vec<MovieSummary>) -> Self {
        movies.truncate(HOMEPAGE_ROW_LIMIT);
        Self {
            id,
            name: id.display_name().to_string(),
            movies,
            error: false,
        }
    }

    pub fn failed(id: CategoryId) -> Self {
        Self {
            id,
            name: id.display_name().to_string(),
            movies: Vec::new(),
            error: true,
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, endpoint: &str, params: &Params) -> Result<Value, FetchError>;
}

/// HTTPS transport adding `api_key` and `language` to every call.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, api_key: &str, language: &str) -> Result<Self> {
        let user_agent = format!("cinestream/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            language: language.to_string(),
        })
    }

    /// Credentials and locale first, then the call's own parameters. Pairs
    /// with an empty value are left out of the query string.
    fn query_pairs<'a>(&'a self, params: &'a Params) -> Vec<(&'a str, &'a str)> {
        [
            ("api_key", self.api_key.as_str()),
            ("language", self.language.as_str()),
        ]
        .into_iter()
        .chain(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .filter(|(_, v)| !v.is_empty())
        .collect()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, endpoint: &str, params: &Params) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let transport_err = |source: reqwest::Error| FetchError::Transport {
            endpoint: endpoint.to_string(),
            source,
        };
        let res = self
            .client
            .get(&url)
            .query(&self.query_pairs(params))
            .send()
            .await
            .map_err(transport_err)?;
        let status = res.status();
        let text = res.text().await.map_err(transport_err)?;
        if !status.is_success() {
            debug!(endpoint, status = status.as_u16(), body = %text, "TMDB error response");
            return Err(FetchError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        serde_json::from_str(&text).map_err(|source| FetchError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn fetch_category(&self, name: &str, page: u32) -> Result<MoviePage, FetchError>;
    async fn search(&self, query: &str, page: u32) -> Result<MoviePage, FetchError>;
    async fn get_movie_details(&self, id: MovieId) -> Result<MovieDetail, FetchError>;
    async fn get_homepage_movies(&self, page: u32) -> Vec<Category>;
    async fn get_genres(&self) -> Result<Vec<Genre>, FetchError>;
    async fn movies_by_genre(&self, genre_id: i32, page: u32) -> Result<MoviePage, FetchError>;
}

pub struct TmdbClient {
    transport: Arc<dyn Transport>,
    cache: RequestCache,
}

impl TmdbClient {
    pub fn new(transport: Arc<dyn Transport>, cache: RequestCache) -> Self {
        Self { transport, cache }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(
            &config.tmdb_base_url,
            &config.tmdb_api_key,
            &config.language,
        )?;
        Ok(Self::new(Arc::new(transport), RequestCache::default()))
    }

    async fn fetch(&self, endpoint: &str, params: Params) -> Result<Value, FetchError> {
        self.cache
            .get_or_fetch(endpoint, &params, || {
                self.transport.get_json(endpoint, &params)
            })
            .await
    }

    async fn fetch_page(&self, endpoint: Endpoint, params: Params) -> Result<MoviePage, FetchError> {
        let path = endpoint.path();
        let value = self.fetch(&path, params).await?;
        decode(&path, value)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn fetch_category(&self, name: &str, page: u32) -> Result<MoviePage, FetchError> {
        let category = CategoryId::from_name(name);
        self.fetch_page(category.endpoint(), page_params(page)).await
    }

    async fn search(&self, query: &str, page: u32) -> Result<MoviePage, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(MoviePage::empty());
        }
        let mut params = page_params(page);
        params.insert("query".to_string(), query.to_string());
        self.fetch_page(Endpoint::Search, params).await
    }

    async fn get_movie_details(&self, id: MovieId) -> Result<MovieDetail, FetchError> {
        let details_path = Endpoint::MovieDetails(id).path();
        let credits_path = Endpoint::MovieCredits(id).path();
        let videos_path = Endpoint::MovieVideos(id).path();

        let (mut details, credits, videos) = tokio::try_join!(
            self.fetch(&details_path, Params::new()),
            self.fetch(&credits_path, Params::new()),
            self.fetch(&videos_path, Params::new()),
        )?;

        if let Value::Object(map) = &mut details {
            map.insert("credits".to_string(), credits);
            map.insert("videos".to_string(), videos);
        }
        decode(&details_path, details)
    }

    async fn get_homepage_movies(&self, page: u32) -> Vec<Category> {
        let requests = CategoryId::HOMEPAGE.into_iter().map(|category| async move {
            match self.fetch_page(category.endpoint(), page_params(page)).await {
                Ok(data) => Category::loaded(category, data.results),
                Err(e) => {
                    warn!("Category '{}' failed to load: {}", category.as_str(), e);
                    Category::failed(category)
                }
            }
        });
        join_all(requests).await
    }

    async fn get_genres(&self) -> Result<Vec<Genre>, FetchError> {
        #[derive(Deserialize)]
        struct GenreList {
            #[serde(default)]
            genres: Vec<Genre>,
        }

        let path = Endpoint::GenreList.path();
        let value = self.fetch(&path, Params::new()).await?;
        let list: GenreList = decode(&path, value)?;
        Ok(list.genres)
    }

    async fn movies_by_genre(&self, genre_id: i32, page: u32) -> Result<MoviePage, FetchError> {
        let mut params = page_params(page);
        params.insert("with_genres".to_string(), genre_id.to_string());
        self.fetch_page(Endpoint::Discover, params).await
    }
}

fn page_params(page: u32) -> Params {
    let mut params = Params::new();
    params.insert("page".to_string(), page.max(1).to_string());
    params
}

fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, FetchError> {
    serde_json::from_value(value).map_err(|source| FetchError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// First YouTube "Trailer", else first YouTube "Teaser".
pub fn resolve_trailer_key(videos: &Videos) -> Option<&str> {
    let on_site = |v: &&Video| v.site.eq_ignore_ascii_case(TRAILER_SITE) && !v.key.is_empty();
    videos
        .results
        .iter()
        .filter(on_site)
        .find(|v| v.video_type == "Trailer")
        .or_else(|| {
            videos
                .results
                .iter()
                .filter(on_site)
                .find(|v| v.video_type == "Teaser")
        })
        .map(|v| v.key.as_str())
}

pub fn youtube_embed_url(key: &str) -> String {
    format!(
        "https://www.youtube.com/embed/{}?autoplay=1&rel=0",
        urlencoding::encode(key)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    W92,
    W185,
    W300,
    #[default]
    W500,
    Original,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::W92 => "w92",
            ImageSize::W185 => "w185",
            ImageSize::W300 => "w300",
            ImageSize::W500 => "w500",
            ImageSize::Original => "original",
        }
    }
}

/// Composes image CDN URLs.
#[derive(Debug, Clone)]
pub struct ImageCdn {
    base: String,
}

impl ImageCdn {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn image_url(&self, path: Option<&str>, size: ImageSize) -> String {
        match path.map(str::trim).filter(|p| !p.is_empty()) {
            None => PLACEHOLDER_IMAGE.to_string(),
            Some(p) => format!(
                "{}/{}/{}",
                self.base,
                size.as_str(),
                p.trim_start_matches('/')
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTransport {
        failing: HashSet<String>,
        calls: Mutex<Vec<(String, Params)>>,
    }

    impl FakeTransport {
        fn failing(endpoints: &[&str]) -> Self {
            Self {
                failing: endpoints.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    fn movies(prefix: i32, n: i32) -> Value {
        let results: Vec<Value> = (0..n)
            .map(|i| {
                json!({
                    "id": prefix + i,
                    "title": format!("Movie {}", prefix + i),
                    "poster_path": format!("/p{}.jpg", prefix + i),
                    "overview": "",
                    "vote_average": 7.5,
                    "release_date": "2024-01-01"
                })
            })
            .collect();
        json!({ "page": 1, "results": results, "total_pages": 3, "total_results": 60 })
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get_json(&self, endpoint: &str, params: &Params) -> Result<Value, FetchError> {
            self.calls
                .lock()
                .unwrap()
                .push((endpoint.to_string(), params.clone()));
            if self.failing.contains(endpoint) {
                return Err(FetchError::Status {
                    endpoint: endpoint.to_string(),
                    status: 503,
                });
            }
            let body = match endpoint {
                "/trending/movie/week" => movies(100, 20),
                "/movie/popular" => movies(200, 20),
                "/movie/top_rated" => movies(300, 4),
                "/movie/now_playing" => movies(400, 20),
                "/movie/upcoming" => movies(500, 20),
                "/search/movie" => movies(600, 2),
                "/discover/movie" => movies(700, 3),
                "/genre/movie/list" => json!({ "genres": [{ "id": 28, "name": "Action" }] }),
                "/movie/42" => json!({
                    "id": 42,
                    "title": "The Answer",
                    "overview": "Deep thought.",
                    "vote_average": 8.4,
                    "runtime": 136,
                    "release_date": "1999-03-31",
                    "genres": [{ "id": 878, "name": "Science Fiction" }]
                }),
                "/movie/42/credits" => json!({
                    "id": 42,
                    "cast": [{ "name": "Keanu Reeves", "character": "Neo", "profile_path": "/k.jpg" }]
                }),
                "/movie/42/videos" => json!({
                    "id": 42,
                    "results": [{ "type": "Trailer", "site": "YouTube", "key": "abc" }]
                }),
                _ => json!({}),
            };
            Ok(body)
        }
    }

    fn client(transport: Arc<FakeTransport>) -> TmdbClient {
        TmdbClient::new(transport, RequestCache::default())
    }

    #[tokio::test]
    async fn blank_search_makes_no_network_call() {
        let transport = Arc::new(FakeTransport::default());
        let api = client(transport.clone());

        assert!(api.search("", 1).await.unwrap().results.is_empty());
        assert!(api.search("   ", 1).await.unwrap().results.is_empty());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn search_trims_query_and_forwards_page() {
        let transport = Arc::new(FakeTransport::default());
        let api = client(transport.clone());

        let page = api.search("  alien ", 2).await.unwrap();
        assert_eq!(page.results.len(), 2);
        let calls = transport.calls.lock().unwrap();
        let (endpoint, params) = &calls[0];
        assert_eq!(endpoint, "/search/movie");
        assert_eq!(params.get("query").map(String::as_str), Some("alien"));
        assert_eq!(params.get("page").map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn repeated_category_fetch_hits_network_once() {
        let transport = Arc::new(FakeTransport::default());
        let api = client(transport.clone());

        api.fetch_category("popular", 1).await.unwrap();
        api.fetch_category("popular", 1).await.unwrap();
        assert_eq!(transport.call_count(), 1);

        api.fetch_category("popular", 2).await.unwrap();
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn unknown_category_falls_back_to_popular() {
        let transport = Arc::new(FakeTransport::default());
        let api = client(transport.clone());

        let page = api.fetch_category("documentaries", 1).await.unwrap();
        assert_eq!(page.results[0].id, 200);
        assert_eq!(transport.calls.lock().unwrap()[0].0, "/movie/popular");
        assert_eq!(CategoryId::from_name("top_rated"), CategoryId::TopRated);
        assert_eq!(CategoryId::from_name("nowPlaying"), CategoryId::NowPlaying);
    }

    #[tokio::test]
    async fn movie_details_merge_credits_and_videos() {
        let api = client(Arc::new(FakeTransport::default()));

        let detail = api.get_movie_details(42).await.unwrap();
        assert_eq!(detail.title, "The Answer");
        assert_eq!(detail.runtime, Some(136));
        assert_eq!(detail.genres[0].name, "Science Fiction");
        assert_eq!(detail.credits.cast[0].character, "Neo");
        assert_eq!(resolve_trailer_key(&detail.videos), Some("abc"));
    }

    #[tokio::test]
    async fn movie_details_fail_when_any_part_fails() {
        for failing in ["/movie/42", "/movie/42/credits", "/movie/42/videos"] {
            let api = client(Arc::new(FakeTransport::failing(&[failing])));
            let err = api.get_movie_details(42).await.unwrap_err();
            assert_eq!(err.endpoint(), failing);
        }
    }

    #[tokio::test]
    async fn homepage_isolates_failures_and_truncates_rows() {
        let api = client(Arc::new(FakeTransport::failing(&["/movie/top_rated"])));

        let categories = api.get_homepage_movies(1).await;
        assert_eq!(categories.len(), 5);
        let ids: Vec<CategoryId> = categories.iter().map(|c| c.id).collect();
        assert_eq!(ids, CategoryId::HOMEPAGE.to_vec());

        for category in &categories {
            if category.id == CategoryId::TopRated {
                assert!(category.error);
                assert!(category.movies.is_empty());
            } else {
                assert!(!category.error);
                assert_eq!(category.movies.len(), HOMEPAGE_ROW_LIMIT);
            }
        }
        assert_eq!(categories[0].name, "Trending Now");
        assert_eq!(categories[0].movies[0].id, 100);
    }

    #[tokio::test]
    async fn genre_endpoints_decode() {
        let transport = Arc::new(FakeTransport::default());
        let api = client(transport.clone());

        let genres = api.get_genres().await.unwrap();
        assert_eq!(genres, vec![Genre { id: 28, name: "Action".into() }]);

        let page = api.movies_by_genre(28, 3).await.unwrap();
        assert_eq!(page.results.len(), 3);
        let calls = transport.calls.lock().unwrap();
        let (_, params) = calls.last().unwrap();
        assert_eq!(params.get("with_genres").map(String::as_str), Some("28"));
        assert_eq!(params.get("page").map(String::as_str), Some("3"));
    }

    fn video(kind: &str, site: &str, key: &str) -> Video {
        Video {
            video_type: kind.to_string(),
            site: site.to_string(),
            key: key.to_string(),
        }
    }

    #[test]
    fn trailer_beats_an_earlier_teaser() {
        let videos = Videos {
            results: vec![
                video("Teaser", "YouTube", "teaser-1"),
                video("Featurette", "YouTube", "feat"),
                video("Trailer", "Vimeo", "vimeo-trailer"),
                video("Trailer", "YouTube", "trailer-1"),
                video("Trailer", "YouTube", "trailer-2"),
            ],
        };
        assert_eq!(resolve_trailer_key(&videos), Some("trailer-1"));
    }

    #[test]
    fn teaser_used_only_without_trailer() {
        let videos = Videos {
            results: vec![
                video("Clip", "YouTube", "clip"),
                video("Teaser", "YouTube", "teaser-1"),
                video("Teaser", "YouTube", "teaser-2"),
            ],
        };
        assert_eq!(resolve_trailer_key(&videos), Some("teaser-1"));

        let none = Videos {
            results: vec![video("Clip", "YouTube", "clip"), video("Trailer", "Vimeo", "v")],
        };
        assert_eq!(resolve_trailer_key(&none), None);
        assert_eq!(resolve_trailer_key(&Videos::default()), None);
    }

    #[test]
    fn image_urls_use_placeholder_and_size_tokens() {
        let cdn = ImageCdn::new("https://image.tmdb.org/t/p/");
        assert_eq!(cdn.image_url(None, ImageSize::default()), PLACEHOLDER_IMAGE);
        assert_eq!(cdn.image_url(Some(""), ImageSize::W300), PLACEHOLDER_IMAGE);
        assert_eq!(
            cdn.image_url(Some("/abc.jpg"), ImageSize::W92),
            "https://image.tmdb.org/t/p/w92/abc.jpg"
        );
        assert_eq!(
            cdn.image_url(Some("/abc.jpg"), ImageSize::default()),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
    }

    #[test]
    fn embed_url_autoplays() {
        assert_eq!(
            youtube_embed_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1&rel=0"
        );
    }

    /// Answers every endpoint with records whose text fields are `null`.
    struct NullFieldsTransport;

    #[async_trait]
    impl Transport for NullFieldsTransport {
        async fn get_json(&self, endpoint: &str, _params: &Params) -> Result<Value, FetchError> {
            let movie = json!({
                "id": 9,
                "title": null,
                "overview": null,
                "vote_average": null,
                "poster_path": null,
                "release_date": null
            });
            let body = match endpoint {
                "/movie/9" => json!({
                    "id": 9,
                    "title": null,
                    "overview": null,
                    "vote_average": 6.1,
                    "runtime": null,
                    "genres": [{ "id": 18, "name": null }]
                }),
                "/movie/9/credits" => json!({
                    "cast": [{ "name": "Ana", "character": null, "profile_path": null }]
                }),
                "/movie/9/videos" => json!({
                    "results": [{ "type": "Trailer", "site": "YouTube", "key": null }]
                }),
                _ => json!({
                    "page": null,
                    "results": [movie],
                    "total_pages": null,
                    "total_results": 1
                }),
            };
            Ok(body)
        }
    }

    #[tokio::test]
    async fn null_text_fields_do_not_fail_homepage_rows() {
        let api = TmdbClient::new(Arc::new(NullFieldsTransport), RequestCache::default());

        let categories = api.get_homepage_movies(1).await;
        assert_eq!(categories.len(), 5);
        for category in &categories {
            assert!(!category.error, "{} marked failed", category.name);
            assert_eq!(category.movies.len(), 1);
            assert_eq!(category.movies[0].title, "");
            assert_eq!(category.movies[0].overview, "");
            assert_eq!(category.movies[0].vote_average, 0.0);
        }

        let page = api.search("anything", 1).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn null_text_fields_do_not_fail_movie_details() {
        let api = TmdbClient::new(Arc::new(NullFieldsTransport), RequestCache::default());

        let detail = api.get_movie_details(9).await.unwrap();
        assert_eq!(detail.title, "");
        assert_eq!(detail.overview, "");
        assert_eq!(detail.genres[0].name, "");
        assert_eq!(detail.credits.cast[0].name, "Ana");
        assert_eq!(detail.credits.cast[0].character, "");
        assert_eq!(detail.videos.results[0].key, "");
    }

    #[test]
    fn query_omits_empty_values() {
        let transport = HttpTransport::new("https://api.themoviedb.org/3", "secret", "").unwrap();
        let mut params = Params::new();
        params.insert("page".into(), "2".into());
        params.insert("with_genres".into(), String::new());

        assert_eq!(
            transport.query_pairs(&params),
            vec![("api_key", "secret"), ("page", "2")]
        );
    }

    #[test]
    fn summaries_tolerate_missing_fields() {
        let movie: MovieSummary = serde_json::from_value(json!({ "id": 7 })).unwrap();
        assert_eq!(movie.title, "");
        assert_eq!(movie.poster_path, None);
        assert_eq!(movie.vote_average, 0.0);
    }
}
