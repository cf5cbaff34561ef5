mod common;

use bucketflow_cloud::bucket::reconcile_website;
use bucketflow_cloud::{GatewayError, Operation, WebsiteConfiguration};
use common::{Call, FakeGateway, RemoteBucket};

#[tokio::test]
async fn test_website_reconcile_is_idempotent() {
    let documents = [None, Some(""), Some("index.html")];

    for enabled in [true, false] {
        for index in documents {
            for error in [None, Some(""), Some("404.html")] {
                let gateway = FakeGateway::new().with_bucket("b1", RemoteBucket::default());

                reconcile_website(&gateway, "b1", enabled, index, error)
                    .await
                    .unwrap();
                let once = gateway.website("b1");

                reconcile_website(&gateway, "b1", enabled, index, error)
                    .await
                    .unwrap();
                assert_eq!(
                    gateway.website("b1"),
                    once,
                    "enabled={} index={:?} error={:?}",
                    enabled,
                    index,
                    error
                );
                assert_eq!(once.is_some(), enabled);
            }
        }
    }
}

#[tokio::test]
async fn test_empty_configuration_is_still_submitted() {
    let gateway = FakeGateway::new().with_bucket("b1", RemoteBucket::default());

    reconcile_website(&gateway, "b1", true, None, None)
        .await
        .unwrap();

    assert_eq!(
        gateway.calls(),
        vec![Call::PutWebsite(
            "b1".to_string(),
            WebsiteConfiguration::default()
        )]
    );
}

#[tokio::test]
async fn test_disable_without_configuration_succeeds() {
    let gateway = FakeGateway::new().with_bucket("b1", RemoteBucket::default());

    reconcile_website(&gateway, "b1", false, Some("index.html"), None)
        .await
        .unwrap();

    assert_eq!(gateway.calls(), vec![Call::DeleteWebsite("b1".to_string())]);
}

#[tokio::test]
async fn test_delete_not_found_is_success() {
    let gateway = FakeGateway::new().with_bucket("b1", RemoteBucket::default());
    gateway.fail(
        "delete_bucket_website",
        GatewayError::NotFound("NoSuchWebsiteConfiguration".to_string()),
    );

    reconcile_website(&gateway, "b1", false, None, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_put_failure_is_annotated() {
    let gateway = FakeGateway::new().with_bucket("b1", RemoteBucket::default());
    gateway.fail(
        "put_bucket_website",
        GatewayError::Api {
            code: Some("AccessDenied".to_string()),
            message: "Access Denied".to_string(),
        },
    );

    let err = reconcile_website(&gateway, "b1", true, Some("index.html"), None)
        .await
        .unwrap_err();

    assert_eq!(err.operation(), Some(Operation::PutWebsite));
    assert_eq!(
        err.to_string(),
        "error putting S3 website \"b1\": AccessDenied: Access Denied"
    );
}

#[tokio::test]
async fn test_delete_failure_is_annotated() {
    let gateway = FakeGateway::new().with_bucket("b1", RemoteBucket::default());
    gateway.fail(
        "delete_bucket_website",
        GatewayError::Throttled("SlowDown".to_string()),
    );

    let err = reconcile_website(&gateway, "b1", false, None, None)
        .await
        .unwrap_err();
    assert_eq!(err.operation(), Some(Operation::DeleteWebsite));
}
