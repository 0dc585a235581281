use colored::Colorize;
use regex::Regex;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{config::Config, error::Result};

const BASE_URL: &str = "https://api.themoviedb.org/3";

#[derive(Debug, PartialEq, Deserialize)]
pub struct ShowMatch {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, PartialEq, Deserialize)]
struct MovieResult {
    id: i32,
    title: String,
    #[serde(default)]
    release_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieMatch {
    pub id: i32,
    pub title: String,
    pub year: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Episode {
    pub episode_number: i32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct SearchResults<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct SeasonDetails {
    #[serde(default)]
    episodes: Vec<Episode>,
}

/// Leading four digit year of a TMDB date such as `2010-07-16`.
fn release_year(date: &str) -> Option<String> {
    let re = Regex::new(r"^(\d{4})").ok()?;
    Some(re.captures(date)?.get(1)?.as_str().to_string())
}

pub struct TmdbClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl TmdbClient {
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(config, BASE_URL)
    }

    pub fn with_base_url(config: &Config, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);
        Ok(self
            .client
            .get(url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    /// Id of the first show matching `query`, or `None` when TMDB has no match.
    pub async fn find_show_id(&self, query: &str) -> Result<Option<i32>> {
        let search: SearchResults<ShowMatch> =
            self.get("/search/tv", &[("query", query)]).await?;

        match search.results.into_iter().next() {
            Some(show) => {
                println!("{} ({})", show.name.green(), show.id);
                Ok(Some(show.id))
            }
            None => {
                warn!("Can not get the id for {:?}, check the name", query);
                Ok(None)
            }
        }
    }

    /// First movie matching `query`. The release year reported by TMDB replaces
    /// the `year` used to narrow the search.
    pub async fn find_movie(&self, query: &str, year: Option<&str>) -> Result<Option<MovieMatch>> {
        let mut params = vec![("query", query)];
        if let Some(year) = year {
            params.push(("year", year));
        }
        let search: SearchResults<MovieResult> = self.get("/search/movie", &params).await?;

        let Some(movie) = search.results.into_iter().next() else {
            warn!("Movie not found: {:?}", query);
            return Ok(None);
        };

        let year = movie
            .release_date
            .as_deref()
            .and_then(release_year)
            .or_else(|| year.map(str::to_string));

        println!(
            "Movie found: {} (ID: {}) (year: {})",
            movie.title.green(),
            movie.id,
            year.as_deref().unwrap_or("unknown")
        );

        Ok(Some(MovieMatch {
            id: movie.id,
            title: movie.title,
            year,
        }))
    }

    /// Episodes of one season, in the order TMDB returns them.
    pub async fn list_episodes(&self, show_id: i32, season: u32) -> Result<Vec<Episode>> {
        let details: SeasonDetails = self
            .get(&format!("/tv/{}/season/{}", show_id, season), &[])
            .await?;
        Ok(details.episodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    fn test_config() -> Config {
        Config {
            api_key: "0123456789abcdef0123456789abcdef".to_string(),
            language: "zh-CN".to_string(),
        }
    }

    fn client_for(server: &MockServer) -> TmdbClient {
        TmdbClient::with_base_url(&test_config(), &server.uri())
    }

    #[test]
    fn test_release_year() {
        assert_eq!(release_year("2010-07-16").as_deref(), Some("2010"));
        assert_eq!(release_year("1999").as_deref(), Some("1999"));
        assert_eq!(release_year(""), None);
        assert_eq!(release_year("99-01-01"), None);
    }

    #[tokio::test]
    async fn test_find_show_id_picks_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/tv"))
            .and(query_param("query", "Dark"))
            .and(query_param("language", "zh-CN"))
            .and(query_param("api_key", "0123456789abcdef0123456789abcdef"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 1,
                "results": [
                    {"id": 70523, "name": "暗黑", "popularity": 40.1},
                    {"id": 1, "name": "Dark Matter"}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.find_show_id("Dark").await.unwrap(), Some(70523));
    }

    #[tokio::test]
    async fn test_find_show_id_no_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/tv"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.find_show_id("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_show_id_missing_results_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/tv"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status_message": "oops"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.find_show_id("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_show_id_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/tv"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.find_show_id("Dark").await;
        assert!(matches!(result, Err(Error::Request(_))), "{:?}", result);
    }

    #[tokio::test]
    async fn test_find_movie_uses_release_year() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .and(query_param("query", "Inception"))
            .and(query_param("year", "2011"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"id": 27205, "title": "盗梦空间", "release_date": "2010-07-15"}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let movie = client.find_movie("Inception", Some("2011")).await.unwrap();
        assert_eq!(
            movie,
            Some(MovieMatch {
                id: 27205,
                title: "盗梦空间".to_string(),
                year: Some("2010".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn test_find_movie_keeps_requested_year_without_release_date() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"id": 5, "title": "Unreleased", "release_date": ""}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let movie = client.find_movie("Unreleased", Some("2030")).await.unwrap();
        assert_eq!(movie.unwrap().year.as_deref(), Some("2030"));

        let movie = client.find_movie("Unreleased", None).await.unwrap();
        assert_eq!(movie.unwrap().year, None);
    }

    #[tokio::test]
    async fn test_find_movie_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.find_movie("nothing", None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_episodes_keeps_api_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tv/70523/season/2"))
            .and(query_param("language", "zh-CN"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 100,
                "season_number": 2,
                "episodes": [
                    {"episode_number": 2, "name": "Two", "overview": ""},
                    {"episode_number": 1, "name": "One"},
                    {"episode_number": 3, "name": "Three"}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let episodes = client.list_episodes(70523, 2).await.unwrap();
        let numbers: Vec<i32> = episodes.iter().map(|e| e.episode_number).collect();
        assert_eq!(numbers, vec![2, 1, 3]);
        assert_eq!(episodes[0].name, "Two");
    }

    #[tokio::test]
    async fn test_list_episodes_bad_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tv/1/season/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.list_episodes(1, 1).await;
        assert!(matches!(result, Err(Error::Request(_))), "{:?}", result);
    }
}
