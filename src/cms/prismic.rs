//! Prismic REST API v2 client

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tokio::sync::OnceCell;

use super::{CancelToken, CmsError, PageDataProvider};
use crate::config::CmsConfig;
use crate::content::{
    Article, ArticleContentBlock, ArticleListingPage, ArticleSummary, RichTextSpan,
};

/// `/api/v2` entry document
#[derive(Debug, Deserialize)]
struct ApiInfo {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// `/documents/search` response
#[derive(Debug, Deserialize)]
struct SearchResponse<D> {
    page: u32,
    #[serde(deserialize_with = "present_or_null")]
    next_page: Option<String>,
    results: Vec<Document<D>>,
}

#[derive(Debug, Deserialize)]
struct Document<D> {
    id: String,
    #[serde(default)]
    uid: Option<String>,
    #[serde(default)]
    first_publication_date: Option<String>,
    data: D,
}

#[derive(Debug, Deserialize)]
struct SummaryData {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    author: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostData {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    banner: Option<ImageField>,
    #[serde(default, alias = "body")]
    content: Vec<ContentGroup>,
}

#[derive(Debug, Deserialize)]
struct ImageField {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentGroup {
    #[serde(default)]
    heading: Option<String>,
    #[serde(default)]
    body: Vec<RichTextSpan>,
}

/// A nullable field that must still be present in the payload
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

impl Document<SummaryData> {
    fn into_summary(self) -> ArticleSummary {
        ArticleSummary {
            id: self.uid.unwrap_or(self.id),
            published_at: self.first_publication_date,
            title: self.data.title.unwrap_or_default(),
            subtitle: self.data.subtitle.unwrap_or_default(),
            author: self.data.author.unwrap_or_default(),
        }
    }
}

impl Document<PostData> {
    fn into_article(self) -> Article {
        Article {
            uid: self.uid.unwrap_or(self.id),
            published_at: self.first_publication_date,
            title: self.data.title.unwrap_or_default(),
            subtitle: self.data.subtitle.unwrap_or_default(),
            author: self.data.author.unwrap_or_default(),
            banner_url: self
                .data
                .banner
                .and_then(|b| b.url)
                .unwrap_or_default(),
            content: self
                .data
                .content
                .into_iter()
                .map(|group| ArticleContentBlock {
                    heading: group.heading.unwrap_or_default(),
                    body: group.body,
                })
                .collect(),
        }
    }
}

impl SearchResponse<SummaryData> {
    fn into_listing(self) -> ArticleListingPage {
        ArticleListingPage {
            items: self
                .results
                .into_iter()
                .map(Document::into_summary)
                .collect(),
            next_cursor: self.next_page,
            page: self.page,
        }
    }
}

/// Page data provider backed by a Prismic repository.
///
/// Built from an explicit [`CmsConfig`]; the master ref is fetched once per
/// client and reused for every search.
pub struct PrismicClient {
    http: reqwest::Client,
    endpoint: String,
    document_type: String,
    page_size: u32,
    access_token: Option<String>,
    timeout: Option<Duration>,
    master_ref: OnceCell<String>,
}

impl PrismicClient {
    pub fn new(config: &CmsConfig) -> Result<Self, CmsError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint(),
            document_type: config.document_type.clone(),
            page_size: config.page_size.max(1),
            access_token: config.access_token.clone(),
            timeout: config.timeout(),
            master_ref: OnceCell::new(),
        })
    }

    fn parse_url(raw: &str) -> Result<Url, CmsError> {
        Url::parse(raw).map_err(|e| CmsError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })
    }

    /// Append the access token unless the URL already carries one
    fn authorize(&self, mut url: Url) -> Url {
        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(key, _)| key == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
        url
    }

    fn map_http_error(&self, err: reqwest::Error) -> CmsError {
        if err.is_timeout() {
            CmsError::Timeout(self.timeout.unwrap_or_default())
        } else {
            CmsError::Http(err)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CmsError> {
        let url = self.authorize(url);
        tracing::debug!("GET {}{}", url.host_str().unwrap_or_default(), url.path());

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.map_http_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let mut shown = url;
            shown.set_query(None);
            return Err(CmsError::Status {
                status: status.as_u16(),
                url: shown.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_http_error(e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn master_ref(&self) -> Result<String, CmsError> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let info: ApiInfo = self.get_json(Self::parse_url(&self.endpoint)?).await?;
                info.refs
                    .into_iter()
                    .find(|r| r.is_master_ref)
                    .map(|r| r.reference)
                    .ok_or(CmsError::NoMasterRef)
            })
            .await?;
        Ok(reference.clone())
    }

    async fn search_url(&self, predicate: &str, page_size: u32) -> Result<Url, CmsError> {
        let master_ref = self.master_ref().await?;
        let mut url = Self::parse_url(&format!("{}/documents/search", self.endpoint))?;
        url.query_pairs_mut()
            .append_pair("ref", &master_ref)
            .append_pair("q", predicate)
            .append_pair("pageSize", &page_size.to_string());
        Ok(url)
    }

    fn type_predicate(&self) -> String {
        format!(r#"[[at(document.type,"{}")]]"#, self.document_type)
    }

    fn uid_predicate(&self, uid: &str) -> String {
        format!(
            r#"[[at(my.{}.uid,"{}")]]"#,
            self.document_type,
            uid.replace('\\', "\\\\").replace('"', "\\\"")
        )
    }
}

#[async_trait]
impl PageDataProvider for PrismicClient {
    async fn first_page(&self, cancel: &CancelToken) -> Result<ArticleListingPage, CmsError> {
        cancel
            .run(async {
                let url = self
                    .search_url(&self.type_predicate(), self.page_size)
                    .await?;
                let response: SearchResponse<SummaryData> = self.get_json(url).await?;
                Ok::<_, CmsError>(response.into_listing())
            })
            .await
    }

    async fn page(
        &self,
        cursor: &str,
        cancel: &CancelToken,
    ) -> Result<ArticleListingPage, CmsError> {
        let url = Self::parse_url(cursor)?;
        cancel
            .run(async {
                let response: SearchResponse<SummaryData> = self.get_json(url).await?;
                Ok::<_, CmsError>(response.into_listing())
            })
            .await
    }

    async fn article(&self, uid: &str, cancel: &CancelToken) -> Result<Article, CmsError> {
        cancel
            .run(async {
                let url = self.search_url(&self.uid_predicate(uid), 1).await?;
                let response: SearchResponse<PostData> = self.get_json(url).await?;
                response
                    .results
                    .into_iter()
                    .next()
                    .map(Document::into_article)
                    .ok_or_else(|| CmsError::NotFound(uid.to_string()))
            })
            .await
    }
}
