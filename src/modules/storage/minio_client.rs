//! MinIO/S3-compatible storage client
//!
//! Report PDFs live under `{public_prefix}/{reports_folder}/` and that folder
//! is opened for anonymous reads so the links emailed to owners resolve.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::{storage_key_from_url, ObjectStorage};
use crate::core::config::MinIOConfig;
use crate::core::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const SIGNING_ALGORITHM: &str = "AWS4-HMAC-SHA256";
const POLICY_SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// MinIO/S3-compatible storage for report documents
pub struct MinIOClient {
    bucket: Box<Bucket>,
    endpoint: String,
    public_endpoint: String,
    public_prefix: String,
    reports_folder: String,
    signer: SigV4Signer,
    /// Used for the bucket policy call, which rust-s3 does not expose
    http_client: Client,
}

impl MinIOClient {
    /// Connect, make sure the report bucket exists and open the reports folder
    /// for anonymous reads.
    pub async fn new(config: MinIOConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Invalid MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| {
                AppError::Internal(format!("Invalid report bucket '{}': {}", config.bucket, e))
            })?;
        bucket.set_path_style();

        ensure_report_bucket(&bucket.name(), region, credentials).await;

        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let client = Self {
            bucket,
            endpoint: config.endpoint,
            public_endpoint: config.public_endpoint,
            public_prefix: config.public_prefix,
            reports_folder: config.reports_folder,
            signer: SigV4Signer {
                access_key: config.access_key,
                secret_key: config.secret_key,
                region: config.region,
            },
            http_client,
        };

        client.open_reports_folder().await;

        info!(
            "Report storage ready at {} (bucket '{}', folder '{}')",
            client.endpoint,
            client.bucket.name(),
            client.reports_prefix()
        );

        Ok(client)
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    fn reports_prefix(&self) -> String {
        format!("{}/{}", self.public_prefix, self.reports_folder)
    }

    /// Direct URL of a stored report
    pub fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket.name(), key)
    }

    fn url_bases(&self) -> Vec<String> {
        let bucket = self.bucket.name();
        vec![
            format!("{}/{}", self.public_endpoint, bucket),
            format!("{}/{}", self.endpoint, bucket),
        ]
    }

    // Failure only breaks emailed links until the policy is set by hand
    async fn open_reports_folder(&self) {
        let bucket = self.bucket.name();
        let prefix = self.reports_prefix();
        let policy = reports_read_policy(&bucket, &prefix).to_string();

        match self.put_bucket_policy(&bucket, &policy).await {
            Ok(()) => info!("Report links are public under {}/{}/*", bucket, prefix),
            Err(e) => warn!(
                "Could not open '{}/{}' for anonymous reads: {}. \
                Run: mc anonymous set download minio/{}/{}",
                bucket, prefix, e, bucket, prefix
            ),
        }
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), AppError> {
        let endpoint = Url::parse(&self.endpoint)
            .map_err(|e| AppError::Internal(format!("Invalid MinIO endpoint: {}", e)))?;
        let host = endpoint
            .host_str()
            .map(|host| match endpoint.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            })
            .ok_or_else(|| AppError::Internal("MinIO endpoint has no host".to_string()))?;

        let signed = self
            .signer
            .sign_policy_put(bucket, &host, policy, Utc::now())?;

        let response = self
            .http_client
            .put(format!("{}/{}?policy", self.endpoint, bucket))
            .header("Host", &host)
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", &signed.payload_hash)
            .header("Authorization", &signed.authorization)
            .header("Content-Type", "application/json")
            .body(policy.to_string())
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Policy request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::ExternalServiceError(format!(
            "MinIO rejected bucket policy: {} {}",
            status, body
        )))
    }
}

/// Create the bucket unless it is already there. Other failures are logged;
/// uploads will surface them if the bucket really is missing.
async fn ensure_report_bucket(name: &str, region: Region, credentials: Credentials) {
    let result =
        Bucket::create_with_path_style(name, region, credentials, BucketConfiguration::default())
            .await;

    match result {
        Ok(_) => info!("Created report bucket '{}'", name),
        Err(e) if bucket_already_exists(&e.to_string()) => {
            debug!("Report bucket '{}' already exists", name)
        }
        Err(e) => warn!("Could not create report bucket '{}': {}", name, e),
    }
}

fn bucket_already_exists(error: &str) -> bool {
    ["BucketAlreadyOwnedByYou", "BucketAlreadyExists", "already own it"]
        .iter()
        .any(|marker| error.contains(marker))
}

/// Anonymous `GetObject` on the reports folder only
fn reports_read_policy(bucket: &str, reports_prefix: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": {"AWS": "*"},
            "Action": ["s3:GetObject"],
            "Resource": [format!("arn:aws:s3:::{}/{}/*", bucket, reports_prefix.trim_matches('/'))]
        }]
    })
}

/// Headers for a SigV4-signed request
struct SignedRequest {
    amz_date: String,
    payload_hash: String,
    authorization: String,
}

/// AWS Signature v4 for the `PUT ?policy` call
struct SigV4Signer {
    access_key: String,
    secret_key: String,
    region: String,
}

impl SigV4Signer {
    fn sign_policy_put(
        &self,
        bucket: &str,
        host: &str,
        policy: &str,
        now: DateTime<Utc>,
    ) -> Result<SignedRequest, AppError> {
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let payload_hash = hex::encode(Sha256::digest(policy.as_bytes()));

        let canonical_request = format!(
            "PUT\n/{bucket}\npolicy=\nhost:{host}\nx-amz-content-sha256:{payload_hash}\nx-amz-date:{amz_date}\n\n{POLICY_SIGNED_HEADERS}\n{payload_hash}"
        );

        let scope = format!("{}/{}/s3/aws4_request", date_stamp, self.region);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            SIGNING_ALGORITHM,
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let key = self.signing_key(&date_stamp, "s3")?;
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

        Ok(SignedRequest {
            authorization: format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                SIGNING_ALGORITHM, self.access_key, scope, POLICY_SIGNED_HEADERS, signature
            ),
            amz_date,
            payload_hash,
        })
    }

    fn signing_key(&self, date_stamp: &str, service: &str) -> Result<Vec<u8>, AppError> {
        let secret = format!("AWS4{}", self.secret_key);
        [date_stamp, self.region.as_str(), service, "aws4_request"]
            .iter()
            .try_fold(secret.into_bytes(), |key, part| {
                hmac_sha256(&key, part.as_bytes())
            })
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AppError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[async_trait]
impl ObjectStorage for MinIOClient {
    async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        self.bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Failed to upload report '{}': {}", key, e))
            })?;

        debug!("Stored report '{}' ({} bytes)", key, data.len());
        Ok(self.get_public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.bucket.delete_object(key).await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to delete report '{}': {}", key, e))
        })?;

        debug!("Removed report '{}'", key);
        Ok(())
    }

    fn report_key(&self, file_name: &str) -> String {
        format!("{}/{}", self.reports_prefix(), file_name)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        storage_key_from_url(url, &self.url_bases())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn signer() -> SigV4Signer {
        SigV4Signer {
            access_key: "AKIDEXAMPLE".to_string(),
            secret_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string(),
            region: "us-east-1".to_string(),
        }
    }

    #[test]
    fn test_signing_key_matches_aws_reference() {
        // Reference derivation published in the AWS SigV4 documentation
        let key = signer().signing_key("20120215", "iam").unwrap();
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_policy_put_headers() {
        let now = Utc.with_ymd_and_hms(2025, 1, 6, 12, 30, 0).unwrap();
        let signed = signer()
            .sign_policy_put("condo-maintenance", "minio:9000", "{}", now)
            .unwrap();

        assert_eq!(signed.amz_date, "20250106T123000Z");
        assert_eq!(signed.payload_hash, hex::encode(Sha256::digest(b"{}")));
        assert!(signed.authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20250106/us-east-1/s3/aws4_request, \
             SignedHeaders=host;x-amz-content-sha256;x-amz-date, Signature="
        ));

        let again = signer()
            .sign_policy_put("condo-maintenance", "minio:9000", "{}", now)
            .unwrap();
        assert_eq!(signed.authorization, again.authorization);
    }

    #[test]
    fn test_read_policy_covers_reports_folder_only() {
        let policy = reports_read_policy("condo-maintenance", "public/maintenance/reports/");
        assert_eq!(
            policy["Statement"][0]["Resource"][0],
            "arn:aws:s3:::condo-maintenance/public/maintenance/reports/*"
        );
        assert_eq!(policy["Statement"][0]["Action"][0], "s3:GetObject");
    }

    #[test]
    fn test_existing_bucket_errors() {
        assert!(bucket_already_exists("409: BucketAlreadyOwnedByYou"));
        assert!(bucket_already_exists("Your previous request to create the named bucket succeeded and you already own it."));
        assert!(!bucket_already_exists("403: AccessDenied"));
    }
}
