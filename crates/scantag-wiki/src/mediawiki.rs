//! MediaWiki Action API implementation of [`DocumentService`]

use crate::client::{ClientOptions, HttpClient};
use crate::error::{Error, Result};
use crate::service::DocumentService;
use crate::types::{Document, EditOutcome, EditRequest, PageRef, RevisionMeta};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    curtimestamp: Option<String>,
    #[serde(default)]
    query: Option<QueryBody>,
    #[serde(default, rename = "continue")]
    continuation: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryBody {
    #[serde(default)]
    normalized: Vec<Normalized>,
    #[serde(default)]
    pages: Vec<PageEntry>,
}

#[derive(Debug, Deserialize)]
struct Normalized {
    from: String,
    to: String,
}

#[derive(Debug, Deserialize)]
struct PageEntry {
    #[serde(default)]
    pageid: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    revisions: Vec<RevisionEntry>,
}

#[derive(Debug, Deserialize)]
struct RevisionEntry {
    #[serde(default)]
    revid: Option<u64>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    slots: Option<Slots>,
}

#[derive(Debug, Deserialize)]
struct Slots {
    main: MainSlot,
}

#[derive(Debug, Deserialize)]
struct MainSlot {
    #[serde(default)]
    content: Option<String>,
}

/// Pages collected across continuation requests
struct QueryResult {
    curtimestamp: String,
    normalized: HashMap<String, String>,
    pages: Vec<PageEntry>,
}

impl PageEntry {
    fn into_document(self, curtimestamp: &str) -> Result<Option<Document>> {
        if self.missing || self.invalid {
            return Ok(None);
        }
        let title = self
            .title
            .ok_or_else(|| Error::malformed("page without a title"))?;
        let page_id = self
            .pageid
            .ok_or_else(|| Error::malformed(format!("no page id for {}", title)))?;
        let Some(revision) = self.revisions.into_iter().next() else {
            return Ok(None);
        };
        let text = revision
            .slots
            .and_then(|slots| slots.main.content)
            .ok_or_else(|| Error::malformed(format!("no content for {}", title)))?;
        let base_timestamp = revision
            .timestamp
            .ok_or_else(|| Error::malformed(format!("no revision timestamp for {}", title)))?;

        Ok(Some(Document {
            title,
            page_id,
            text,
            base_timestamp,
            start_timestamp: curtimestamp.to_string(),
        }))
    }
}

/// Client for one MediaWiki Action API endpoint
pub struct WikiClient {
    http: HttpClient,
    api_url: Url,
    csrf_token: Mutex<Option<String>>,
    logged_in: Mutex<bool>,
}

impl WikiClient {
    /// Create a client for `api_url` (the wiki's `api.php`)
    pub fn new(api_url: &str, options: &ClientOptions) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(options)?,
            api_url: Url::parse(api_url)?,
            csrf_token: Mutex::new(None),
            logged_in: Mutex::new(false),
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Log in with a bot password
    ///
    /// The session lives in the client's cookie store; later edits assert
    /// that it is still valid.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let body = self
            .http
            .get_json(
                &self.api_url,
                &[("action", "query"), ("meta", "tokens"), ("type", "login")],
            )
            .await?;
        let login_token = body
            .pointer("/query/tokens/logintoken")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::malformed("missing login token"))?
            .to_string();

        let body = self
            .http
            .post_form(
                &self.api_url,
                &[
                    ("action", "login"),
                    ("lgname", username),
                    ("lgpassword", password),
                    ("lgtoken", login_token.as_str()),
                ],
            )
            .await?;

        match body.pointer("/login/result").and_then(Value::as_str) {
            Some("Success") => {
                info!(user = username, "logged in");
                *self.logged_in.lock() = true;
                self.csrf_token.lock().take();
                Ok(())
            }
            Some(result) => {
                let reason = body
                    .pointer("/login/reason")
                    .and_then(Value::as_str)
                    .unwrap_or(result);
                Err(Error::Login(reason.to_string()))
            }
            None => Err(Error::malformed("login response without a result")),
        }
    }

    /// CSRF token for edits, fetched once per session
    async fn csrf_token(&self) -> Result<String> {
        if let Some(token) = self.csrf_token.lock().clone() {
            return Ok(token);
        }

        let body = self
            .http
            .get_json(&self.api_url, &[("action", "query"), ("meta", "tokens")])
            .await?;
        let token = body
            .pointer("/query/tokens/csrftoken")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::malformed("missing csrf token"))?
            .to_string();

        *self.csrf_token.lock() = Some(token.clone());
        Ok(token)
    }

    /// Run a revisions query, following continuations until complete
    ///
    /// Queries go out as form POSTs; a full batch of `|`-joined titles is
    /// too long for a request line.
    async fn query_revisions(&self, selector: (&str, &str), rvprop: &str) -> Result<QueryResult> {
        let base: Vec<(&str, &str)> = vec![
            ("action", "query"),
            ("prop", "revisions"),
            ("rvprop", rvprop),
            ("rvslots", "main"),
            ("curtimestamp", "1"),
            selector,
        ];

        let mut result = QueryResult {
            curtimestamp: String::new(),
            normalized: HashMap::new(),
            pages: Vec::new(),
        };
        let mut continuation: Vec<(String, String)> = Vec::new();

        loop {
            let mut params = base.clone();
            params.extend(continuation.iter().map(|(k, v)| (k.as_str(), v.as_str())));

            let body = self.http.post_form(&self.api_url, &params).await?;
            let response: QueryResponse = serde_json::from_value(body)?;

            if result.curtimestamp.is_empty() {
                result.curtimestamp = response
                    .curtimestamp
                    .ok_or_else(|| Error::malformed("missing curtimestamp"))?;
            }

            let query = response.query.unwrap_or_default();
            for n in query.normalized {
                result.normalized.insert(n.from, n.to);
            }
            for page in query.pages {
                // Continuations repeat pages whose revisions came earlier
                match result
                    .pages
                    .iter_mut()
                    .find(|p| p.title.is_some() && p.title == page.title)
                {
                    Some(existing) if existing.revisions.is_empty() => *existing = page,
                    Some(_) => {}
                    None => result.pages.push(page),
                }
            }

            match response.continuation {
                Some(next) => {
                    debug!("following query continuation");
                    continuation = next
                        .into_iter()
                        .map(|(k, v)| {
                            let v = match v {
                                Value::String(s) => s,
                                other => other.to_string(),
                            };
                            (k, v)
                        })
                        .collect();
                }
                None => return Ok(result),
            }
        }
    }

    async fn submit_edit(&self, request: &EditRequest) -> Result<Value> {
        let token = self.csrf_token().await?;
        let checksum = request.checksum();
        let page_id;

        let mut params: Vec<(&str, &str)> = vec![("action", "edit")];
        match &request.page {
            PageRef::Title(title) => params.push(("title", title.as_str())),
            PageRef::Id(id) => {
                page_id = id.to_string();
                params.push(("pageid", page_id.as_str()));
            }
        }
        params.push(("text", request.text.as_str()));
        params.push(("summary", request.summary.as_str()));
        params.push(("md5", checksum.as_str()));
        params.push(("nocreate", "1"));
        if request.bot {
            params.push(("bot", "1"));
        }
        if let Some(ts) = &request.base_timestamp {
            params.push(("basetimestamp", ts.as_str()));
        }
        if let Some(ts) = &request.start_timestamp {
            params.push(("starttimestamp", ts.as_str()));
        }
        if *self.logged_in.lock() {
            params.push(("assert", "user"));
        }
        params.push(("token", token.as_str()));

        self.http.post_form(&self.api_url, &params).await
    }
}

#[async_trait]
impl DocumentService for WikiClient {
    async fn fetch_batch(&self, titles: &[String]) -> Result<Vec<Document>> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let joined = titles.join("|");
        let result = self
            .query_revisions(("titles", joined.as_str()), "content|timestamp")
            .await?;

        let mut by_title = HashMap::new();
        for page in result.pages {
            if let Some(doc) = page.into_document(&result.curtimestamp)? {
                by_title.insert(doc.title.clone(), doc);
            }
        }

        let documents = titles
            .iter()
            .filter_map(|title| {
                let title = result.normalized.get(title).unwrap_or(title);
                by_title.remove(title)
            })
            .collect();
        Ok(documents)
    }

    async fn fetch(&self, page: &PageRef) -> Result<Option<Document>> {
        let id;
        let selector = match page {
            PageRef::Title(title) => ("titles", title.as_str()),
            PageRef::Id(page_id) => {
                id = page_id.to_string();
                ("pageids", id.as_str())
            }
        };

        let result = self.query_revisions(selector, "content|timestamp").await?;
        match result.pages.into_iter().next() {
            Some(entry) => entry.into_document(&result.curtimestamp),
            None => Ok(None),
        }
    }

    async fn revision_meta(&self, page: &PageRef) -> Result<RevisionMeta> {
        let id;
        let selector = match page {
            PageRef::Title(title) => ("titles", title.as_str()),
            PageRef::Id(page_id) => {
                id = page_id.to_string();
                ("pageids", id.as_str())
            }
        };

        let result = self.query_revisions(selector, "ids|timestamp|user").await?;
        let revision = result
            .pages
            .into_iter()
            .filter(|p| !p.missing && !p.invalid)
            .find_map(|p| p.revisions.into_iter().next())
            .ok_or_else(|| Error::MissingPage(page.to_string()))?;

        Ok(RevisionMeta {
            revid: revision
                .revid
                .ok_or_else(|| Error::malformed("revision without an id"))?,
            timestamp: revision
                .timestamp
                .ok_or_else(|| Error::malformed("revision without a timestamp"))?,
            user: revision.user.unwrap_or_default(),
        })
    }

    async fn edit(&self, request: &EditRequest) -> Result<EditOutcome> {
        let body = match self.submit_edit(request).await {
            Err(Error::Api { code, .. }) if code == "badtoken" => {
                debug!("csrf token expired, fetching a new one");
                self.csrf_token.lock().take();
                self.submit_edit(request).await?
            }
            other => other?,
        };

        let edit = body
            .get("edit")
            .ok_or_else(|| Error::malformed("edit response without an edit object"))?;

        match edit.get("result").and_then(Value::as_str) {
            Some("Success") => {
                if edit.get("nochange").is_some() {
                    Ok(EditOutcome::NoChange)
                } else {
                    Ok(EditOutcome::Saved {
                        new_revid: edit.get("newrevid").and_then(Value::as_u64),
                    })
                }
            }
            Some(other) => Err(Error::api(other.to_lowercase(), edit.to_string())),
            None => Err(Error::malformed("edit response without a result")),
        }
    }
}
