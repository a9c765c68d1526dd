use aws_config::Region;
use aws_sdk_s3::config::{Builder as S3ConfigBuilder, Credentials, SharedCredentialsProvider};
use aws_sdk_s3::Client as S3Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket() -> String {
    "tournament-logos".to_string()
}

fn default_path_style() -> bool {
    true
}

/// S3-compatible object storage holding uploaded team logos
#[derive(Debug, Deserialize, Clone)]
pub struct MinIOSettings {
    pub endpoint: String,
    pub access_key: SecretString,
    pub secret_key: SecretString,
    #[serde(default = "default_bucket")]
    pub bucket_name: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// MinIO needs path-style addressing; hosted S3 works either way
    #[serde(default = "default_path_style")]
    pub force_path_style: bool,
}

impl MinIOSettings {
    pub fn s3_client(&self) -> S3Client {
        let credentials = Credentials::new(
            self.access_key.expose_secret(),
            self.secret_key.expose_secret(),
            None,
            None,
            "tournament-storage",
        );

        let config = S3ConfigBuilder::new()
            .endpoint_url(&self.endpoint)
            .credentials_provider(SharedCredentialsProvider::new(credentials))
            .region(Region::new(self.region.clone()))
            .force_path_style(self.force_path_style)
            .behavior_version_latest()
            .build();

        S3Client::from_conf(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_section_fills_in_defaults() {
        let settings: MinIOSettings = serde_json::from_value(serde_json::json!({
            "endpoint": "http://localhost:9000",
            "access_key": "minio",
            "secret_key": "minio-secret"
        }))
        .unwrap();

        assert_eq!(settings.bucket_name, "tournament-logos");
        assert_eq!(settings.region, "us-east-1");
        assert!(settings.force_path_style);
    }
}
