//! Cloudinary upload API client.
//!
//! Uploads go to `{api_base}/v1_1/{cloud}/auto/upload` so the host detects the
//! resource type itself. Requests are signed: the signed parameters are
//! sorted by name, joined as `k=v&k=v`, suffixed with the API secret and
//! digested.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::config::{CloudinarySettings, SignatureAlgorithm};
use crate::error::{AppError, AppResult};
use crate::services::data_uri::DataUri;

use super::{StorageProvider, StoredObject};

const AUTO_RESOURCE_TYPE: &str = "auto";
const DEFAULT_DESTROY_RESOURCE_TYPE: &str = "image";

#[derive(Debug, Deserialize)]
struct UploadResult {
    public_id: String,
    secure_url: String,
    resource_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DestroyResult {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Cloudinary storage client.
#[derive(Clone)]
pub struct CloudinaryStorage {
    http: reqwest::Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
    folder: Option<String>,
    signature_algorithm: SignatureAlgorithm,
}

impl CloudinaryStorage {
    /// Create a new Cloudinary client from configuration.
    pub fn new(settings: &CloudinarySettings) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("qrshare/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        info!(
            "Cloudinary storage initialized: cloud={}, folder={:?}",
            settings.cloud_name, settings.folder
        );

        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            cloud_name: settings.cloud_name.clone(),
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
            folder: settings.folder.clone(),
            signature_algorithm: settings.signature_algorithm,
        })
    }

    fn endpoint(&self, resource_type: &str, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/{}",
            self.api_base, self.cloud_name, resource_type, action
        )
    }

    /// Compute the request signature for a set of signed parameters.
    pub fn sign(
        params: &BTreeMap<&str, String>,
        secret: &str,
        algorithm: SignatureAlgorithm,
    ) -> String {
        let to_sign = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        let payload = format!("{}{}", to_sign, secret);

        match algorithm {
            SignatureAlgorithm::Sha1 => hex::encode(Sha1::digest(payload.as_bytes())),
            SignatureAlgorithm::Sha256 => hex::encode(Sha256::digest(payload.as_bytes())),
        }
    }

    /// Stamp, sign and serialize request parameters.
    fn signed_body(
        &self,
        mut params: BTreeMap<&str, String>,
    ) -> serde_json::Map<String, serde_json::Value> {
        params.insert("timestamp", Utc::now().timestamp().to_string());
        let signature = Self::sign(
            &params,
            self.api_secret.expose_secret(),
            self.signature_algorithm,
        );

        let mut body: serde_json::Map<String, serde_json::Value> = params
            .into_iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v)))
            .collect();
        body.insert("api_key".to_string(), self.api_key.clone().into());
        body.insert("signature".to_string(), signature.into());
        body
    }

    async fn post(
        &self,
        url: &str,
        body: &serde_json::Map<String, serde_json::Value>,
    ) -> AppResult<reqwest::Response> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::StorageUpload(format!("Cloudinary request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string(),
        };

        Err(AppError::StorageUpload(format!(
            "Cloudinary returned {}: {}",
            status.as_u16(),
            message
        )))
    }
}

#[async_trait]
impl StorageProvider for CloudinaryStorage {
    async fn upload(&self, content: &DataUri) -> AppResult<StoredObject> {
        let mut params = BTreeMap::new();
        if let Some(ref folder) = self.folder {
            params.insert("folder", folder.clone());
        }

        let mut body = self.signed_body(params);
        // `file` is never part of the signature
        body.insert("file".to_string(), content.as_str().into());

        let response = self
            .post(&self.endpoint(AUTO_RESOURCE_TYPE, "upload"), &body)
            .await?;

        let uploaded: UploadResult = response.json().await.map_err(|e| {
            AppError::StorageUpload(format!("Invalid Cloudinary upload response: {}", e))
        })?;

        Ok(StoredObject {
            public_url: uploaded.secure_url,
            storage_id: uploaded.public_id,
            resource_type: uploaded.resource_type,
        })
    }

    async fn delete(&self, object: &StoredObject) -> AppResult<()> {
        let resource_type = object
            .resource_type
            .as_deref()
            .unwrap_or(DEFAULT_DESTROY_RESOURCE_TYPE);

        let mut params = BTreeMap::new();
        params.insert("public_id", object.storage_id.clone());
        let body = self.signed_body(params);

        let response = self
            .post(&self.endpoint(resource_type, "destroy"), &body)
            .await?;

        let destroyed: DestroyResult = response.json().await.map_err(|e| {
            AppError::StorageUpload(format!("Invalid Cloudinary destroy response: {}", e))
        })?;

        match destroyed.result.as_str() {
            "ok" => Ok(()),
            "not found" => {
                warn!(
                    "Cloudinary object {} was already gone when deleting",
                    object.storage_id
                );
                Ok(())
            }
            other => Err(AppError::StorageUpload(format!(
                "Cloudinary could not delete {}: {}",
                object.storage_id, other
            ))),
        }
    }

    fn storage_type(&self) -> &'static str {
        "cloudinary"
    }
}
