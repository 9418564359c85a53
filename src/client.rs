//! Client facade for the cubic content-delivery API.
//!
//! Every operation follows the same steps: check the credentials, check the
//! operation's arguments, normalize the section category where the endpoint
//! needs it, compose the URL, build the body (a multipart form for uploads),
//! and hand the request to the [`Transport`]. The transport's result is
//! returned untouched and any failure is propagated as-is.
//!
//! # Cancellation
//! A client owns one [`CancellationToken`]. Cancelling it aborts every
//! in-flight call made through that client. [`CubicClient::with_cancellation`]
//! returns a handle on the same transport scoped to another token, for callers
//! that need to cancel a subset of calls.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::ClientConfig;
use crate::contract::{RequestBody, Transport};
use crate::error::CubicError;
use crate::form::{build_form, merge_headers};
use crate::http::HttpTransport;
use crate::section::normalize;
use crate::types::{
    CreateFolder, DeleteFile, DeleteFolder, FileDescriptor, FolderUploadMeta, FormFields,
    SingleUploadMeta,
};
use crate::validate;

const CDN: &str = "/api/v1/cubic_cdn";
const DELIVERY: &str = "/backend/api/v1/cdelivery";

pub struct CubicClient<T = HttpTransport> {
    config: Arc<ClientConfig>,
    transport: Arc<T>,
    cancel: CancellationToken,
}

impl<T> Clone for CubicClient<T> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
            cancel: self.cancel.clone(),
        }
    }
}

impl<T> fmt::Debug for CubicClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CubicClient")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl CubicClient<HttpTransport> {
    /// Client over a reqwest transport using the config's timeout.
    pub fn new(config: ClientConfig) -> Result<Self, CubicError> {
        let transport = HttpTransport::new(config.timeout())?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> CubicClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
            cancel: CancellationToken::new(),
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Aborts every call currently running through this client.
    pub fn cancel_all(&self) {
        info!("Cancelling all in-flight cubic requests");
        self.cancel.cancel();
    }

    /// Same client, observing `token` instead of the shared one.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
            cancel: token,
        }
    }

    /// Lists every delivery cubic on the account.
    pub async fn list_cubics(&self) -> Result<Value, CubicError> {
        self.config.validate()?;
        self.get("list_cubics", format!("{CDN}/all")).await
    }

    pub async fn get_cubic(&self, cubic_id: &str) -> Result<Value, CubicError> {
        self.config.validate()?;
        validate::cubic_id(cubic_id)?;
        self.get("get_cubic", format!("{CDN}/single/{cubic_id}"))
            .await
    }

    /// One section (`image`, `music`, `video` or `files`) of a cubic.
    pub async fn get_section(&self, cubic_id: &str, section: &str) -> Result<Value, CubicError> {
        self.config.validate()?;
        validate::section(cubic_id, section)?;
        self.get(
            "get_section",
            format!("{CDN}/single/section/{cubic_id}/{section}"),
        )
        .await
    }

    pub async fn get_singles(&self, cubic_id: &str, section: &str) -> Result<Value, CubicError> {
        self.config.validate()?;
        validate::section(cubic_id, section)?;
        self.get(
            "get_singles",
            format!("{CDN}/single/section/{cubic_id}/{section}/singles"),
        )
        .await
    }

    pub async fn get_folders(&self, cubic_id: &str, section: &str) -> Result<Value, CubicError> {
        self.config.validate()?;
        validate::section(cubic_id, section)?;
        self.get(
            "get_folders",
            format!("{CDN}/folder/section/{cubic_id}/{section}/folders"),
        )
        .await
    }

    pub async fn get_folder(
        &self,
        cubic_id: &str,
        section: &str,
        folder_name: &str,
    ) -> Result<Value, CubicError> {
        self.config.validate()?;
        // The folder name may be empty.
        validate::section(cubic_id, section)?;
        self.get(
            "get_folder",
            format!("{CDN}/folder/section/{cubic_id}/{section}/folders/{folder_name}"),
        )
        .await
    }

    pub async fn create_folder(&self, req: &CreateFolder) -> Result<Value, CubicError> {
        self.config.validate()?;
        validate::create_folder(req)?;
        let url = self.url(&format!("{DELIVERY}/card/add/folder"));
        let body = RequestBody::Json(to_body(req)?);
        self.post("create_folder", url, body, self.headers()?).await
    }

    /// Removes a folder and everything in it.
    pub async fn delete_folder(&self, req: &DeleteFolder) -> Result<Value, CubicError> {
        self.config.validate()?;
        validate::delete_folder(req)?;
        let segment = normalize(&req.section_name)?;
        let url = self.url(&format!("{DELIVERY}/{segment}/folder/delete/full"));
        self.delete("delete_folder", url, to_body(req)?).await
    }

    /// Uploads files into a section's singles listing.
    pub async fn upload_single(
        &self,
        meta: &SingleUploadMeta,
        field_name: &str,
        files: &[FileDescriptor],
    ) -> Result<Value, CubicError> {
        self.config.validate()?;
        validate::single_upload_field(field_name)?;
        let segment = normalize(&meta.section_name)?;
        let url = self.url(&format!("{DELIVERY}/{segment}/singles/upload"));
        self.upload("upload_single", url, &meta.form_fields(), field_name, files)
            .await
    }

    pub async fn delete_single_file(&self, req: &DeleteFile) -> Result<Value, CubicError> {
        self.config.validate()?;
        validate::delete_file(req)?;
        let segment = normalize(&req.section_name)?;
        let url = self.url(&format!("{DELIVERY}/{segment}/singles/delete"));
        self.delete("delete_single_file", url, to_body(req)?).await
    }

    /// Uploads files into a named folder. Any field name is accepted.
    pub async fn upload_folder_file(
        &self,
        meta: &FolderUploadMeta,
        field_name: &str,
        files: &[FileDescriptor],
    ) -> Result<Value, CubicError> {
        self.config.validate()?;
        let segment = normalize(&meta.section_name)?;
        let url = self.url(&format!("{DELIVERY}/{segment}/folder/upload"));
        self.upload("upload_folder_file", url, &meta.form_fields(), field_name, files)
            .await
    }

    pub async fn delete_folder_file(&self, req: &DeleteFile) -> Result<Value, CubicError> {
        self.config.validate()?;
        validate::delete_file(req)?;
        let segment = normalize(&req.section_name)?;
        let url = self.url(&format!("{DELIVERY}/{segment}/folder/delete"));
        self.delete("delete_folder_file", url, to_body(req)?).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url(), path)
    }

    /// Base headers: JSON content type, raw token, app id.
    fn headers(&self) -> Result<HeaderMap, CubicError> {
        let token = HeaderValue::from_str(self.config.token())
            .map_err(|_| CubicError::validation("token", "Token is not a valid header value"))?;
        let app_id = HeaderValue::from_str(self.config.app_id())
            .map_err(|_| CubicError::validation("appID", "AppId is not a valid header value"))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, token);
        headers.insert(HeaderName::from_static("appid"), app_id);
        Ok(headers)
    }

    async fn get(&self, operation: &'static str, path: String) -> Result<Value, CubicError> {
        let url = self.url(&path);
        let headers = self.headers()?;
        info!(operation, url = %url, "Calling cubic API");
        let result = self.transport.get(&url, headers, &self.cancel).await;
        traced(operation, result)
    }

    async fn post(
        &self,
        operation: &'static str,
        url: String,
        body: RequestBody,
        headers: HeaderMap,
    ) -> Result<Value, CubicError> {
        info!(operation, url = %url, "Calling cubic API");
        let result = self.transport.post(&url, body, headers, &self.cancel).await;
        traced(operation, result)
    }

    async fn delete(
        &self,
        operation: &'static str,
        url: String,
        body: Value,
    ) -> Result<Value, CubicError> {
        let headers = self.headers()?;
        info!(operation, url = %url, "Calling cubic API");
        let result = self.transport.delete(&url, body, headers, &self.cancel).await;
        traced(operation, result)
    }

    async fn upload(
        &self,
        operation: &'static str,
        url: String,
        fields: &FormFields,
        field_name: &str,
        files: &[FileDescriptor],
    ) -> Result<Value, CubicError> {
        let mut headers = self.headers()?;
        let (form, form_headers) = build_form(fields, field_name, files).await?;
        merge_headers(&mut headers, &form_headers);
        info!(files = files.len(), field = field_name, "Built multipart upload form");
        self.post(operation, url, RequestBody::Multipart(form), headers)
            .await
    }
}

fn to_body<S: Serialize>(value: &S) -> Result<Value, CubicError> {
    serde_json::to_value(value).map_err(|e| CubicError::Transport(e.to_string()))
}

fn traced(operation: &'static str, result: Result<Value, CubicError>) -> Result<Value, CubicError> {
    match &result {
        Ok(_) => info!(operation, "Cubic API call succeeded"),
        Err(e) => error!(operation, error = %e, "Cubic API call failed"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MockTransport;
    use serde_json::json;
    use std::io::Write;

    const BASE: &str = "https://cdn.example.com";

    fn client(transport: MockTransport) -> CubicClient<MockTransport> {
        CubicClient::with_transport(ClientConfig::new("tok", "app", BASE), transport)
    }

    fn folder_meta(section: &str) -> FolderUploadMeta {
        FolderUploadMeta {
            card_id: "c1".into(),
            card_name: "cubic".into(),
            section_name: section.into(),
            section_title: "folders".into(),
            folder_name: "invoices".into(),
            folder_id: "f1".into(),
        }
    }

    #[tokio::test]
    async fn empty_cubic_id_never_reaches_transport() {
        // No expectations: any transport call would panic.
        let err = client(MockTransport::new()).get_cubic("").await.unwrap_err();
        assert_eq!(err.field(), Some("cubicId"));
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_transport() {
        let client = CubicClient::with_transport(ClientConfig::new("", "app", BASE), MockTransport::new());
        let err = client.list_cubics().await.unwrap_err();
        assert_eq!(err.field(), Some("token"));
    }

    #[tokio::test]
    async fn list_cubics_sends_auth_headers() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|url, headers, _| {
                url.to_string() == format!("{BASE}/api/v1/cubic_cdn/all")
                    && headers[AUTHORIZATION] == "tok"
                    && headers["AppID"] == "app"
                    && headers[CONTENT_TYPE] == "application/json"
            })
            .times(1)
            .returning(|_, _, _| Ok(json!([{"id": "c1"}])));

        let body = client(transport).list_cubics().await.unwrap();
        assert_eq!(body, json!([{"id": "c1"}]));
    }

    #[tokio::test]
    async fn read_endpoints_use_raw_section_name() {
        let mut transport = MockTransport::new();
        let expected = [
            format!("{BASE}/api/v1/cubic_cdn/single/c1"),
            format!("{BASE}/api/v1/cubic_cdn/single/section/c1/music"),
            format!("{BASE}/api/v1/cubic_cdn/single/section/c1/music/singles"),
            format!("{BASE}/api/v1/cubic_cdn/folder/section/c1/music/folders"),
            format!("{BASE}/api/v1/cubic_cdn/folder/section/c1/music/folders/docs"),
        ];
        for url in expected {
            transport
                .expect_get()
                .withf(move |got, _, _| got.to_string() == url)
                .times(1)
                .returning(|_, _, _| Ok(Value::Null));
        }

        let client = client(transport);
        client.get_cubic("c1").await.unwrap();
        client.get_section("c1", "music").await.unwrap();
        client.get_singles("c1", "music").await.unwrap();
        client.get_folders("c1", "music").await.unwrap();
        client.get_folder("c1", "music", "docs").await.unwrap();
    }

    #[tokio::test]
    async fn get_folder_accepts_empty_folder_name() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|url, _, _| {
                url.to_string() == format!("{BASE}/api/v1/cubic_cdn/folder/section/c1/video/folders/")
            })
            .times(1)
            .returning(|_, _, _| Ok(json!([])));
        let client = client(transport);

        assert_eq!(client.get_folder("c1", "video", "").await.unwrap(), json!([]));
        let err = client.get_folder("c1", "", "docs").await.unwrap_err();
        assert_eq!(err.field(), Some("sectionName"));
    }

    #[tokio::test]
    async fn create_folder_posts_exact_body() {
        let mut transport = MockTransport::new();
        transport
            .expect_post()
            .withf(|url, body, _, _| {
                url.to_string() == format!("{BASE}/backend/api/v1/cdelivery/card/add/folder")
                    && body.as_json()
                        == Some(&json!({
                            "cubicId": "c1",
                            "cubicName": "n",
                            "sectionName": "files",
                            "folderName": "f"
                        }))
            })
            .times(1)
            .returning(|_, _, _, _| Ok(json!({"status": "ok"})));

        let req = CreateFolder {
            cubic_id: "c1".into(),
            cubic_name: "n".into(),
            section_name: "files".into(),
            folder_name: "f".into(),
        };
        assert_eq!(client(transport).create_folder(&req).await.unwrap(), json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn delete_endpoints_use_normalized_segment() {
        let mut transport = MockTransport::new();
        let expected = [
            format!("{BASE}/backend/api/v1/cdelivery/file/folder/delete/full"),
            format!("{BASE}/backend/api/v1/cdelivery/image/singles/delete"),
            format!("{BASE}/backend/api/v1/cdelivery/video/folder/delete"),
        ];
        for url in expected {
            transport
                .expect_delete()
                .withf(move |got, _, _, _| got.to_string() == url)
                .times(1)
                .returning(|_, body, _, _| Ok(body));
        }

        let client = client(transport);
        let folder = DeleteFolder {
            cubic_id: "c1".into(),
            cubic_name: "n".into(),
            section_name: "files".into(),
            folder_name: "f".into(),
            folder_id: "f1".into(),
        };
        let echoed = client.delete_folder(&folder).await.unwrap();
        assert_eq!(echoed["folderId"], "f1");

        let single = DeleteFile::new("music").with_field("fileName", "a.mp3");
        let echoed = client.delete_single_file(&single).await.unwrap();
        assert_eq!(echoed["fileName"], "a.mp3");

        client
            .delete_folder_file(&DeleteFile::new("video"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_section_is_rejected_before_transport() {
        let err = client(MockTransport::new())
            .delete_single_file(&DeleteFile::new("audio"))
            .await
            .unwrap_err();
        assert_eq!(err, CubicError::InvalidSection("audio".into()));
    }

    #[tokio::test]
    async fn folder_upload_targets_normalized_endpoint_with_form_headers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.7").unwrap();

        let mut transport = MockTransport::new();
        transport
            .expect_post()
            .withf(|url, body, headers, _| {
                url.to_string().contains("/cdelivery/video/folder/upload")
                    && matches!(body, RequestBody::Multipart(_))
                    && headers[CONTENT_TYPE]
                        .to_str()
                        .map(|v| v.starts_with("multipart/form-data; boundary="))
                        .unwrap_or(false)
                    && headers["AppID"] == "app"
            })
            .times(1)
            .returning(|_, _, _, _| Ok(json!({"uploaded": 1})));

        let files = [FileDescriptor {
            original_filename: "inv.pdf".into(),
            size: 8,
            filepath: file.path().to_path_buf(),
            mime_type: "application/pdf".into(),
        }];
        let body = client(transport)
            .upload_folder_file(&folder_meta("video"), "eFile", &files)
            .await
            .unwrap();
        assert_eq!(body, json!({"uploaded": 1}));
    }

    #[tokio::test]
    async fn single_upload_requires_field_name() {
        let meta = SingleUploadMeta {
            cubic_id: "c1".into(),
            cubic_name: "cubic".into(),
            section_name: "files".into(),
            section_title: "Singles".into(),
        };
        let err = client(MockTransport::new())
            .upload_single(&meta, "", &[])
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("fieldname"));
    }

    #[tokio::test]
    async fn transport_errors_propagate_unchanged() {
        let mut transport = MockTransport::new();
        transport.expect_get().returning(|_, _, _| {
            Err(CubicError::HttpStatus {
                status: 500,
                status_text: "Internal Server Error".into(),
            })
        });
        let err = client(transport).list_cubics().await.unwrap_err();
        assert_eq!(err.to_string(), "Internal Server Error");
    }

    #[tokio::test]
    async fn scoped_cancellation_leaves_shared_token_alone() {
        let client = client(MockTransport::new());
        let scoped = client.with_cancellation(CancellationToken::new());
        scoped.cancellation_token().cancel();
        assert!(!client.cancellation_token().is_cancelled());

        client.cancel_all();
        assert!(client.cancellation_token().is_cancelled());
        assert!(client.clone().cancellation_token().is_cancelled());
    }
}
