//! S3 implementation of the bucket gateway

use crate::context::AwsContext;
use crate::error::{BUCKET_ALREADY_OWNED_BY_YOU, NO_SUCH_TAG_SET, classify_sdk_error};
use crate::retry::with_retry;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{BuildError, ProvideErrorMetadata};
use aws_sdk_s3::types::{
    BucketCannedAcl, BucketLocationConstraint, CreateBucketConfiguration, ErrorDocument,
    IndexDocument, Tag as S3Tag, Tagging, WebsiteConfiguration as S3WebsiteConfiguration,
};
use bucketflow_cloud::{
    BucketGateway, CreateBucketRequest, GatewayError, GatewayResult, RetryConfig, Tag,
    WebsiteConfiguration,
};
use tracing::{debug, info, warn};

/// Gateway talking to Amazon S3 through the AWS SDK
pub struct S3Gateway {
    client: Client,
    region: String,
    retry: RetryConfig,
}

impl S3Gateway {
    /// Create a gateway, loading AWS configuration for `region`
    pub async fn new(region: &str) -> Self {
        let ctx = AwsContext::new(region).await;
        Self::from_context(&ctx)
    }

    /// Create a gateway from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
            region: ctx.region().to_string(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Region the client was configured for
    pub fn region(&self) -> &str {
        &self.region
    }
}

fn build_error(e: BuildError) -> GatewayError {
    GatewayError::Api {
        code: None,
        message: e.to_string(),
    }
}

fn to_s3_website(website: &WebsiteConfiguration) -> GatewayResult<S3WebsiteConfiguration> {
    let index_document = website
        .index_suffix
        .as_deref()
        .map(|suffix| IndexDocument::builder().suffix(suffix).build())
        .transpose()
        .map_err(build_error)?;
    let error_document = website
        .error_key
        .as_deref()
        .map(|key| ErrorDocument::builder().key(key).build())
        .transpose()
        .map_err(build_error)?;

    Ok(S3WebsiteConfiguration::builder()
        .set_index_document(index_document)
        .set_error_document(error_document)
        .build())
}

fn to_s3_tagging(tags: &[Tag]) -> GatewayResult<Tagging> {
    let tag_set = tags
        .iter()
        .map(|t| S3Tag::builder().key(&t.key).value(&t.value).build())
        .collect::<Result<Vec<_>, _>>()
        .map_err(build_error)?;

    Tagging::builder()
        .set_tag_set(Some(tag_set))
        .build()
        .map_err(build_error)
}

fn from_s3_tags(tag_set: &[S3Tag]) -> Vec<Tag> {
    tag_set.iter().map(|t| Tag::new(t.key(), t.value())).collect()
}

/// S3 call that makes the remote tag set equal to the given tags
#[derive(Debug, Clone, PartialEq)]
enum TaggingRequest {
    Put(Tagging),
    Delete,
}

fn tagging_request(tags: &[Tag]) -> GatewayResult<TaggingRequest> {
    // PutBucketTagging rejects an empty tag set
    if tags.is_empty() {
        return Ok(TaggingRequest::Delete);
    }
    to_s3_tagging(tags).map(TaggingRequest::Put)
}

/// GetBucketTagging answers `NoSuchTagSet` instead of an empty set
fn tag_fetch_error(code: Option<&str>, error: GatewayError) -> GatewayResult<Vec<Tag>> {
    if code == Some(NO_SUCH_TAG_SET) {
        return Ok(Vec::new());
    }
    Err(error)
}

/// Outcome of one CreateBucket attempt.
///
/// An attempt whose response was lost may still have created the bucket,
/// so a retry answering `BucketAlreadyOwnedByYou` counts as success.
fn create_outcome(attempt: u32, result: GatewayResult<()>) -> GatewayResult<()> {
    match result {
        Err(GatewayError::Api { code: Some(code), .. })
            if attempt > 1 && code == BUCKET_ALREADY_OWNED_BY_YOU =>
        {
            warn!(attempt, "S3 bucket created by an earlier attempt");
            Ok(())
        }
        other => other,
    }
}

#[async_trait]
impl BucketGateway for S3Gateway {
    fn name(&self) -> &str {
        "aws-s3"
    }

    async fn create_bucket(&self, request: &CreateBucketRequest) -> GatewayResult<()> {
        info!(
            bucket = %request.bucket,
            acl = %request.acl,
            location = ?request.location_constraint,
            "Creating S3 bucket"
        );

        let create_config = request.location_constraint.as_deref().map(|region| {
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build()
        });

        let mut attempt = 0u32;
        with_retry(&self.retry, "create_bucket", move || {
            attempt += 1;
            let create_config = create_config.clone();
            async move {
                let result = self
                    .client
                    .create_bucket()
                    .bucket(&request.bucket)
                    .acl(BucketCannedAcl::from(request.acl.as_str()))
                    .set_create_bucket_configuration(create_config)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|e| classify_sdk_error(&e));
                create_outcome(attempt, result)
            }
        })
        .await
    }

    async fn head_bucket(&self, bucket: &str) -> GatewayResult<()> {
        debug!(bucket = %bucket, "Checking S3 bucket");

        with_retry(&self.retry, "head_bucket", move || async move {
            self.client
                .head_bucket()
                .bucket(bucket)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| classify_sdk_error(&e))
        })
        .await
    }

    async fn delete_bucket(&self, bucket: &str) -> GatewayResult<()> {
        info!(bucket = %bucket, "Deleting S3 bucket");

        with_retry(&self.retry, "delete_bucket", move || async move {
            self.client
                .delete_bucket()
                .bucket(bucket)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| classify_sdk_error(&e))
        })
        .await
    }

    async fn put_bucket_website(
        &self,
        bucket: &str,
        website: &WebsiteConfiguration,
    ) -> GatewayResult<()> {
        debug!(
            bucket = %bucket,
            index = ?website.index_suffix,
            error = ?website.error_key,
            "Putting S3 website configuration"
        );

        let configuration = to_s3_website(website)?;

        with_retry(&self.retry, "put_bucket_website", move || {
            let configuration = configuration.clone();
            async move {
                self.client
                    .put_bucket_website()
                    .bucket(bucket)
                    .website_configuration(configuration)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|e| classify_sdk_error(&e))
            }
        })
        .await
    }

    async fn delete_bucket_website(&self, bucket: &str) -> GatewayResult<()> {
        debug!(bucket = %bucket, "Deleting S3 website configuration");

        with_retry(&self.retry, "delete_bucket_website", move || async move {
            self.client
                .delete_bucket_website()
                .bucket(bucket)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| classify_sdk_error(&e))
        })
        .await
    }

    async fn get_bucket_tags(&self, bucket: &str) -> GatewayResult<Vec<Tag>> {
        debug!(bucket = %bucket, "Fetching S3 bucket tags");

        with_retry(&self.retry, "get_bucket_tags", move || async move {
            match self.client.get_bucket_tagging().bucket(bucket).send().await {
                Ok(output) => Ok(from_s3_tags(output.tag_set())),
                Err(e) => tag_fetch_error(e.code(), classify_sdk_error(&e)),
            }
        })
        .await
    }

    async fn put_bucket_tags(&self, bucket: &str, tags: &[Tag]) -> GatewayResult<()> {
        debug!(bucket = %bucket, count = tags.len(), "Putting S3 bucket tags");

        let tagging = match tagging_request(tags)? {
            TaggingRequest::Put(tagging) => tagging,
            TaggingRequest::Delete => {
                return with_retry(&self.retry, "delete_bucket_tagging", move || async move {
                    self.client
                        .delete_bucket_tagging()
                        .bucket(bucket)
                        .send()
                        .await
                        .map(|_| ())
                        .map_err(|e| classify_sdk_error(&e))
                })
                .await;
            }
        };

        with_retry(&self.retry, "put_bucket_tagging", move || {
            let tagging = tagging.clone();
            async move {
                self.client
                    .put_bucket_tagging()
                    .bucket(bucket)
                    .tagging(tagging)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|e| classify_sdk_error(&e))
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::classify_s3_error;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_multiplier: 2.0,
        }
    }

    fn owned_by_you() -> GatewayError {
        classify_s3_error(
            Some(BUCKET_ALREADY_OWNED_BY_YOU),
            Some("Your previous request to create the named bucket succeeded"),
            Some(409),
        )
    }

    #[test]
    fn test_owned_bucket_on_first_attempt_is_an_error() {
        let err = create_outcome(1, Err(owned_by_you())).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Api { code: Some(ref c), .. } if c == BUCKET_ALREADY_OWNED_BY_YOU
        ));
    }

    #[test]
    fn test_owned_bucket_on_retry_is_created() {
        assert_eq!(create_outcome(2, Err(owned_by_you())), Ok(()));

        let exists = GatewayError::Api {
            code: Some("BucketAlreadyExists".to_string()),
            message: "taken".to_string(),
        };
        assert_eq!(create_outcome(2, Err(exists.clone())), Err(exists));
    }

    #[tokio::test]
    async fn test_create_retried_after_lost_response_succeeds() {
        // first request lands but its response is lost
        let calls = &AtomicU32::new(0);
        let mut attempt = 0u32;
        let result = with_retry(&fast_retry(), "create_bucket", move || {
            attempt += 1;
            async move {
                let result = if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(GatewayError::Transport("connection reset".into()))
                } else {
                    Err(owned_by_you())
                };
                create_outcome(attempt, result)
            }
        })
        .await;

        assert_eq!(result, Ok(()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_tags_delete_the_tag_set() {
        assert_eq!(tagging_request(&[]).unwrap(), TaggingRequest::Delete);

        match tagging_request(&[Tag::new("env", "prod")]).unwrap() {
            TaggingRequest::Put(tagging) => {
                assert_eq!(tagging.tag_set().len(), 1);
                assert_eq!(tagging.tag_set()[0].key(), "env");
                assert_eq!(tagging.tag_set()[0].value(), "prod");
            }
            TaggingRequest::Delete => panic!("expected a put for non-empty tags"),
        }
    }

    #[test]
    fn test_missing_tag_set_reads_as_empty() {
        let err = classify_s3_error(
            Some(NO_SUCH_TAG_SET),
            Some("The TagSet does not exist"),
            Some(404),
        );
        assert_eq!(tag_fetch_error(Some(NO_SUCH_TAG_SET), err), Ok(Vec::new()));
    }

    #[test]
    fn test_other_tag_fetch_errors_are_kept() {
        let err = classify_s3_error(Some("NoSuchBucket"), Some("gone"), Some(404));
        let result = tag_fetch_error(Some("NoSuchBucket"), err);
        assert!(result.unwrap_err().is_not_found());

        let err = GatewayError::Transport("timed out".into());
        assert_eq!(tag_fetch_error(None, err.clone()), Err(err));
    }

    #[test]
    fn test_tags_from_s3_keep_order() {
        let tag_set = vec![
            S3Tag::builder().key("team").value("web").build().unwrap(),
            S3Tag::builder().key("env").value("prod").build().unwrap(),
        ];
        assert_eq!(
            from_s3_tags(&tag_set),
            vec![Tag::new("team", "web"), Tag::new("env", "prod")]
        );
    }

    #[test]
    fn test_website_conversion_keeps_set_documents() {
        let website = WebsiteConfiguration {
            index_suffix: Some("index.html".to_string()),
            error_key: None,
        };
        let converted = to_s3_website(&website).unwrap();
        assert_eq!(
            converted.index_document().map(|d| d.suffix()),
            Some("index.html")
        );
        assert!(converted.error_document().is_none());
    }

    #[test]
    fn test_empty_website_conversion() {
        let converted = to_s3_website(&WebsiteConfiguration::default()).unwrap();
        assert!(converted.index_document().is_none());
        assert!(converted.error_document().is_none());
    }

    #[test]
    fn test_tagging_conversion_preserves_order() {
        let tagging = to_s3_tagging(&[Tag::new("app", "site"), Tag::new("env", "prod")]).unwrap();
        let keys: Vec<&str> = tagging.tag_set().iter().map(|t| t.key()).collect();
        assert_eq!(keys, vec!["app", "env"]);
    }

    #[tokio::test]
    #[ignore = "requires AWS credentials"]
    async fn test_missing_bucket_is_not_found() {
        let gateway = S3Gateway::new("us-east-1")
            .await
            .with_retry(RetryConfig::none());
        let err = gateway
            .head_bucket("bucketflow-definitely-missing-7f3a9c")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
