use async_trait::async_trait;
use bucketflow_cloud::{
    BucketGateway, CannedAcl, CreateBucketRequest, GatewayError, GatewayResult, Tag,
    WebsiteConfiguration,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Gateway call as recorded by [`FakeGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateBucket(CreateBucketRequest),
    HeadBucket(String),
    DeleteBucket(String),
    PutWebsite(String, WebsiteConfiguration),
    DeleteWebsite(String),
    GetTags(String),
    PutTags(String, Vec<Tag>),
}

#[derive(Debug, Clone, Default)]
pub struct RemoteBucket {
    #[allow(dead_code)]
    pub acl: CannedAcl,
    pub website: Option<WebsiteConfiguration>,
    pub tags: Vec<Tag>,
}

#[derive(Default)]
struct Inner {
    buckets: HashMap<String, RemoteBucket>,
    calls: Vec<Call>,
    failures: HashMap<&'static str, GatewayError>,
}

/// In-memory provider that records every call
#[derive(Default)]
pub struct FakeGateway {
    inner: Mutex<Inner>,
}

#[allow(dead_code)]
impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend a bucket already exists remotely
    pub fn with_bucket(self, name: &str, bucket: RemoteBucket) -> Self {
        self.inner
            .lock()
            .unwrap()
            .buckets
            .insert(name.to_string(), bucket);
        self
    }

    /// Make every call of `method` fail with `error`
    pub fn fail(&self, method: &'static str, error: GatewayError) {
        self.inner.lock().unwrap().failures.insert(method, error);
    }

    /// Stop failing calls of `method`
    pub fn recover(&self, method: &'static str) {
        self.inner.lock().unwrap().failures.remove(method);
    }

    /// Simulate a bucket deleted outside the controller
    pub fn remove_bucket(&self, name: &str) {
        self.inner.lock().unwrap().buckets.remove(name);
    }

    /// Simulate tags edited outside the controller
    pub fn set_tags(&self, name: &str, tags: Vec<Tag>) {
        if let Some(bucket) = self.inner.lock().unwrap().buckets.get_mut(name) {
            bucket.tags = tags;
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn bucket(&self, name: &str) -> Option<RemoteBucket> {
        self.inner.lock().unwrap().buckets.get(name).cloned()
    }

    pub fn website(&self, name: &str) -> Option<WebsiteConfiguration> {
        self.bucket(name).and_then(|b| b.website)
    }

    fn record(&self, method: &'static str, call: Call) -> GatewayResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(call);
        match inner.failures.get(method) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn with_existing<T>(
        &self,
        bucket: &str,
        f: impl FnOnce(&mut RemoteBucket) -> T,
    ) -> GatewayResult<T> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .buckets
            .get_mut(bucket)
            .map(f)
            .ok_or_else(|| GatewayError::NotFound(format!("NoSuchBucket: {}", bucket)))
    }
}

#[async_trait]
impl BucketGateway for FakeGateway {
    fn name(&self) -> &str {
        "fake"
    }

    async fn create_bucket(&self, request: &CreateBucketRequest) -> GatewayResult<()> {
        self.record("create_bucket", Call::CreateBucket(request.clone()))?;
        let mut inner = self.inner.lock().unwrap();
        if inner.buckets.contains_key(&request.bucket) {
            return Err(GatewayError::Api {
                code: Some("BucketAlreadyOwnedByYou".to_string()),
                message: request.bucket.clone(),
            });
        }
        inner.buckets.insert(
            request.bucket.clone(),
            RemoteBucket {
                acl: request.acl,
                ..Default::default()
            },
        );
        Ok(())
    }

    async fn head_bucket(&self, bucket: &str) -> GatewayResult<()> {
        self.record("head_bucket", Call::HeadBucket(bucket.to_string()))?;
        self.with_existing(bucket, |_| ())
    }

    async fn delete_bucket(&self, bucket: &str) -> GatewayResult<()> {
        self.record("delete_bucket", Call::DeleteBucket(bucket.to_string()))?;
        self.with_existing(bucket, |_| ())?;
        self.inner.lock().unwrap().buckets.remove(bucket);
        Ok(())
    }

    async fn put_bucket_website(
        &self,
        bucket: &str,
        website: &WebsiteConfiguration,
    ) -> GatewayResult<()> {
        self.record(
            "put_bucket_website",
            Call::PutWebsite(bucket.to_string(), website.clone()),
        )?;
        self.with_existing(bucket, |b| b.website = Some(website.clone()))
    }

    async fn delete_bucket_website(&self, bucket: &str) -> GatewayResult<()> {
        self.record(
            "delete_bucket_website",
            Call::DeleteWebsite(bucket.to_string()),
        )?;
        self.with_existing(bucket, |b| b.website = None)
    }

    async fn get_bucket_tags(&self, bucket: &str) -> GatewayResult<Vec<Tag>> {
        self.record("get_bucket_tags", Call::GetTags(bucket.to_string()))?;
        self.with_existing(bucket, |b| b.tags.clone())
    }

    async fn put_bucket_tags(&self, bucket: &str, tags: &[Tag]) -> GatewayResult<()> {
        self.record(
            "put_bucket_tags",
            Call::PutTags(bucket.to_string(), tags.to_vec()),
        )?;
        self.with_existing(bucket, |b| b.tags = tags.to_vec())
    }
}
