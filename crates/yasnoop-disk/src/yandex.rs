// ABOUTME: Yandex Disk REST implementation of the Disk trait.
// ABOUTME: Handles OAuth headers, pagination, upload links, and the trash sub-API.

use crate::client::{ClearResponse, Disk, OperationStatus, Quota, RemoteNode};
use crate::error::{DiskError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default REST endpoint of the Yandex Disk API.
pub const DEFAULT_API_URL: &str = "https://cloud-api.yandex.net/v1/disk";

/// Page size used when listing directories.
const LIST_PAGE_SIZE: usize = 100;

/// Only the listing fields the engines read.
const LIST_FIELDS: &str =
    "_embedded.items.name,_embedded.items.path,_embedded.items.type,_embedded.total";

/// 409 error code for a directory that is already there.
const DIRECTORY_EXISTS_ERROR: &str = "DiskPathPointsToExistentDirectoryError";

/// 409 error code for a file upload whose target is taken.
const RESOURCE_EXISTS_ERROR: &str = "DiskResourceAlreadyExistsError";

/// Yandex Disk client authenticated with an OAuth token.
pub struct YandexDisk {
    client: Client,
    api_url: String,
    token: String,
}

impl std::fmt::Debug for YandexDisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YandexDisk")
            .field("api_url", &self.api_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct DiskInfo {
    total_space: u64,
    used_space: u64,
}

#[derive(Deserialize)]
struct ResourcePage {
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedItems>,
}

#[derive(Deserialize)]
struct EmbeddedItems {
    #[serde(default)]
    items: Vec<RemoteNode>,
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Deserialize)]
struct TrashInfo {
    #[serde(rename = "_embedded")]
    embedded: EmbeddedTotal,
}

#[derive(Deserialize)]
struct EmbeddedTotal {
    total: u64,
}

#[derive(Deserialize)]
struct Link {
    href: String,
}

#[derive(Deserialize)]
struct OperationInfo {
    status: OperationStatus,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: String,
}

impl YandexDisk {
    /// Create a client for the given API root with a per-request timeout.
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.is_empty() {
            self.api_url.clone()
        } else {
            format!("{}/{}", self.api_url, endpoint)
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("OAuth {}", self.token))
    }

    /// Fetch one page of a directory listing.
    async fn list_page(&self, path: &str, offset: usize) -> Result<EmbeddedItems> {
        let limit = LIST_PAGE_SIZE.to_string();
        let offset = offset.to_string();
        let response = self
            .request(Method::GET, &self.url("resources"))
            .query(&[
                ("path", path),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
                ("fields", LIST_FIELDS),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiskError::NotFound(path.to_string()));
        }
        let page: ResourcePage = decode(expect_status(response, &[StatusCode::OK]).await?).await?;
        Ok(page.embedded.unwrap_or(EmbeddedItems {
            items: Vec::new(),
            total: Some(0),
        }))
    }
}

/// Normalize a path so the API treats it as rooted at the disk.
pub fn disk_path(path: &str) -> String {
    if path.starts_with('/') || path.starts_with("disk:") {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Return the response if its status is one of `expected`, otherwise an Api error with the body.
async fn expect_status(response: Response, expected: &[StatusCode]) -> Result<Response> {
    let status = response.status();
    if expected.contains(&status) {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DiskError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Error code from an API error body, if it has one.
fn error_code(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|body| body.error)
}

/// Accept a conflict only when the API names `code`; any other conflict is an Api error.
async fn expect_conflict(response: Response, code: &str) -> Result<()> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if error_code(&body).as_deref() == Some(code) {
        return Ok(());
    }
    Err(DiskError::Api {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl Disk for YandexDisk {
    async fn exists(&self, path: &str) -> Result<bool> {
        let path = disk_path(path);
        let response = self
            .request(Method::GET, &self.url("resources"))
            .query(&[("path", path.as_str()), ("fields", "path")])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => expect_status(response, &[]).await.map(|_| false),
        }
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        let path = disk_path(path);
        let response = self
            .request(Method::PUT, &self.url("resources"))
            .query(&[("path", path.as_str())])
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            expect_conflict(response, DIRECTORY_EXISTS_ERROR).await?;
            debug!(path = %path, "Directory already exists");
            return Ok(());
        }
        expect_status(response, &[StatusCode::CREATED]).await?;
        debug!(path = %path, "Directory created");
        Ok(())
    }

    async fn upload(&self, data: Vec<u8>, path: &str) -> Result<()> {
        let path = disk_path(path);
        let response = self
            .request(Method::GET, &self.url("resources/upload"))
            .query(&[("path", path.as_str()), ("overwrite", "false")])
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            expect_conflict(response, RESOURCE_EXISTS_ERROR).await?;
            return Err(DiskError::AlreadyExists(path));
        }
        let link: Link = decode(expect_status(response, &[StatusCode::OK]).await?).await?;

        let size = data.len();
        let response = self.client.put(&link.href).body(data).send().await?;
        expect_status(response, &[StatusCode::CREATED, StatusCode::ACCEPTED]).await?;
        debug!(path = %path, size, "File uploaded");
        Ok(())
    }

    async fn list_children(&self, path: &str) -> Result<Vec<RemoteNode>> {
        let path = disk_path(path);
        let mut children = Vec::new();
        loop {
            let page = self.list_page(&path, children.len()).await?;
            let received = page.items.len();
            children.extend(page.items);

            let reached_total = page
                .total
                .is_some_and(|total| children.len() as u64 >= total);
            if received < LIST_PAGE_SIZE || reached_total {
                break;
            }
        }
        Ok(children)
    }

    async fn quota(&self) -> Result<Quota> {
        let response = self.request(Method::GET, &self.url("")).send().await?;
        let info: DiskInfo = decode(expect_status(response, &[StatusCode::OK]).await?).await?;
        Ok(Quota {
            total: info.total_space,
            used: info.used_space,
        })
    }

    async fn trash_total(&self) -> Result<u64> {
        let response = self
            .request(Method::GET, &self.url("trash/resources"))
            .query(&[("path", "/")])
            .send()
            .await?;
        let info: TrashInfo = decode(expect_status(response, &[StatusCode::OK]).await?).await?;
        Ok(info.embedded.total)
    }

    async fn clear_trash(&self) -> Result<ClearResponse> {
        let response = self
            .request(Method::DELETE, &self.url("trash/resources"))
            .query(&[("path", "/"), ("permanently", "true")])
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(ClearResponse::Completed),
            StatusCode::ACCEPTED => {
                let link: Link = decode(response).await?;
                Ok(ClearResponse::Accepted { href: link.href })
            }
            _ => expect_status(response, &[])
                .await
                .map(|_| ClearResponse::Completed),
        }
    }

    async fn operation_status(&self, href: &str) -> Result<OperationStatus> {
        let response = self.request(Method::GET, href).send().await?;
        let info: OperationInfo =
            decode(expect_status(response, &[StatusCode::OK]).await?).await?;
        Ok(info.status)
    }
}
