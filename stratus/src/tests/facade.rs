use std::collections::{BTreeSet, HashMap};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::TryStreamExt;
use rstest::rstest;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use crate::core::client::storage::{ErrorKind, MockStorageClient, ObjectPage, StorageError};
use crate::facade::ObjectStore;
use crate::types::object::{ObjectStat, ObjectSummary, PutOptions, PutSource};
use crate::types::params::{OpContext, TransferConfig};

fn store(mock: MockStorageClient) -> ObjectStore {
    ObjectStore::with_client(Arc::new(mock), TransferConfig::default())
}

fn store_with(mock: MockStorageClient, transfer: TransferConfig) -> ObjectStore {
    ObjectStore::with_client(Arc::new(mock), transfer)
}

fn stat_fixture(key: &str) -> ObjectStat {
    ObjectStat {
        key: key.to_string(),
        size: 5,
        content_type: Some("application/octet-stream".to_string()),
        etag: Some("\"etag\"".to_string()),
        last_modified: None,
        metadata: HashMap::new(),
        sse: None,
        version_id: None,
    }
}

fn summary(key: &str) -> ObjectSummary {
    ObjectSummary { key: key.to_string(), size: 5, etag: None, last_modified: None, is_prefix: false }
}

#[tokio::test]
async fn remove_object_on_missing_key_is_not_found() {
    let mut mock = MockStorageClient::new();
    mock.expect_stat_object()
        .returning(|_, key| Err(StorageError::not_found("stat_object", format!("object {key} does not exist"))));
    mock.expect_remove_object().never();

    let err = store(mock)
        .remove_object("test-1", "missing.txt", &OpContext::default())
        .await
        .expect_err("missing key must fail");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn remove_object_deletes_existing_keys() {
    let mut mock = MockStorageClient::new();
    mock.expect_stat_object().returning(|_, key| Ok(stat_fixture(key)));
    mock.expect_remove_object().times(1).returning(|_, _| Ok(()));

    store(mock).remove_object("test-1", "a.txt", &OpContext::default()).await.expect("existing key is removed");
}

#[tokio::test]
async fn remove_objects_reports_exactly_the_failed_keys() {
    let mut mock = MockStorageClient::new();
    mock.expect_stat_object().returning(|_, key| {
        if key == "missing.txt" {
            Err(StorageError::not_found("stat_object", "no such key"))
        } else {
            Ok(stat_fixture(key))
        }
    });
    mock.expect_remove_object().times(2).returning(|_, _| Ok(()));

    let keys: BTreeSet<String> =
        ["a.txt", "b.txt", "missing.txt"].into_iter().map(str::to_string).collect();
    let failures =
        store(mock).remove_objects("test-1", &keys, &OpContext::default()).await.expect("bulk removal completes");

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].key, "missing.txt");
    assert_eq!(failures[0].error.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn remove_objects_with_no_failures_returns_empty() {
    let mut mock = MockStorageClient::new();
    mock.expect_stat_object().returning(|_, key| Ok(stat_fixture(key)));
    mock.expect_remove_object().returning(|_, _| Ok(()));

    let keys: BTreeSet<String> = ["a.txt", "b.txt"].into_iter().map(str::to_string).collect();
    let failures =
        store(mock).remove_objects("test-1", &keys, &OpContext::default()).await.expect("bulk removal completes");
    assert!(failures.is_empty());
}

#[tokio::test]
async fn put_switches_to_multipart_strictly_above_the_threshold() {
    let mut mock = MockStorageClient::new();
    mock.expect_put_object().never();
    mock.expect_put_object_multipart()
        .times(1)
        .withf(|_, _, _, size, part_size, _| *size == 9 && *part_size == 4)
        .returning(|_, _, _, _, _, _| Ok(()));

    let transfer = TransferConfig { multipart_threshold: 8, part_size: 4 };
    let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(Cursor::new(vec![0u8; 9]));
    store_with(mock, transfer)
        .put_object("test-1", "big.bin", PutSource::Reader { reader, size: 9 }, PutOptions::default(), &OpContext::default())
        .await
        .expect("upload succeeds");
}

#[tokio::test]
async fn put_at_the_threshold_stays_single_shot() {
    let mut mock = MockStorageClient::new();
    mock.expect_put_object_multipart().never();
    mock.expect_put_object()
        .times(1)
        .withf(|_, _, data, _| data.len() == 8)
        .returning(|_, _, _, _| Ok(()));

    let transfer = TransferConfig { multipart_threshold: 8, part_size: 4 };
    let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(Cursor::new(vec![0u8; 8]));
    store_with(mock, transfer)
        .put_object("test-1", "small.bin", PutSource::Reader { reader, size: 8 }, PutOptions::default(), &OpContext::default())
        .await
        .expect("upload succeeds");
}

#[tokio::test]
async fn put_defaults_the_content_type() {
    let mut mock = MockStorageClient::new();
    mock.expect_put_object()
        .times(1)
        .withf(|_, _, data, opts| {
            data.as_ref() == b"hello" && opts.content_type.as_deref() == Some("application/octet-stream")
        })
        .returning(|_, _, _, _| Ok(()));

    store(mock)
        .put_object("test-1", "a.txt", PutSource::from(Bytes::from_static(b"hello")), PutOptions::default(), &OpContext::default())
        .await
        .expect("upload succeeds");
}

#[tokio::test]
async fn put_rejects_a_lying_reader() {
    let mut mock = MockStorageClient::new();
    mock.expect_put_object().never();
    mock.expect_put_object_multipart().never();

    let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(Cursor::new(b"abc".to_vec()));
    let err = store(mock)
        .put_object("test-1", "a.txt", PutSource::Reader { reader, size: 7 }, PutOptions::default(), &OpContext::default())
        .await
        .expect_err("size mismatch must fail");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn get_object_streams_into_the_destination() {
    let mut mock = MockStorageClient::new();
    mock.expect_get_object().returning(|_, _, _| {
        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(Cursor::new(b"hello".to_vec()));
        Ok(reader)
    });

    let mut dest = Vec::new();
    let written = store(mock)
        .get_object("test-1", "a.txt", None, &mut dest, &OpContext::default())
        .await
        .expect("download succeeds");

    assert_eq!(written, 5);
    assert_eq!(dest, b"hello");
}

#[tokio::test]
async fn get_object_to_file_round_trips() {
    let mut mock = MockStorageClient::new();
    mock.expect_get_object().returning(|_, _, _| {
        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(Cursor::new(b"payload".to_vec()));
        Ok(reader)
    });

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("a.txt");
    let written = store(mock)
        .get_object_to_file("test-1", "a.txt", None, &path, &OpContext::default())
        .await
        .expect("download succeeds");

    assert_eq!(written, 7);
    assert_eq!(std::fs::read(&path).expect("file exists"), b"payload");
}

#[tokio::test]
async fn list_objects_follows_continuation_tokens_in_order() {
    let mut mock = MockStorageClient::new();
    mock.expect_list_objects_page().times(2).returning(|_, _, _, continuation| match continuation.as_deref() {
        None => Ok(ObjectPage {
            entries: vec![summary("a.txt"), summary("b.txt")],
            next_token: Some("token-1".to_string()),
        }),
        Some("token-1") => Ok(ObjectPage { entries: vec![summary("c.txt")], next_token: None }),
        other => panic!("unexpected continuation token {other:?}"),
    });

    let entries: Vec<_> = store(mock)
        .list_objects("test-1", "", true, &OpContext::default())
        .try_collect()
        .await
        .expect("listing succeeds");

    let keys: Vec<_> = entries.iter().map(|entry| entry.key.as_str()).collect();
    assert_eq!(keys, vec!["a.txt", "b.txt", "c.txt"]);
}

#[tokio::test]
async fn pre_cancelled_context_never_reaches_the_backend() {
    let mock = MockStorageClient::new();
    let token = CancellationToken::new();
    token.cancel();

    let err = store(mock)
        .list_buckets(&OpContext::with_cancellation(token))
        .await
        .expect_err("cancelled context must fail");
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[tokio::test]
async fn cancelled_context_fails_listing_streams() {
    let mock = MockStorageClient::new();
    let token = CancellationToken::new();
    token.cancel();

    let result: Result<Vec<_>, _> = store(mock)
        .list_objects("test-1", "", true, &OpContext::with_cancellation(token))
        .try_collect()
        .await;
    assert_eq!(result.expect_err("cancelled stream must fail").kind(), ErrorKind::Cancelled);
}

#[rstest]
#[case("")]
#[case("ab")]
#[case("UpperCase")]
#[case("192.168.1.1")]
#[tokio::test]
async fn invalid_bucket_names_are_rejected_locally(#[case] name: &str) {
    let mock = MockStorageClient::new();
    let err = store(mock)
        .create_bucket(name, None, &OpContext::default())
        .await
        .expect_err("invalid name must be rejected");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn presign_get_rejects_zero_expiry_at_generation_time() {
    let mock = MockStorageClient::new();
    let err = store(mock)
        .presign_get("test-1", "a.txt", Duration::ZERO, HashMap::new(), &OpContext::default())
        .await
        .expect_err("zero expiry must be rejected");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn presign_get_rejects_oversized_expiry() {
    let mock = MockStorageClient::new();
    let err = store(mock)
        .presign_get("test-1", "a.txt", Duration::from_secs(8 * 24 * 60 * 60), HashMap::new(), &OpContext::default())
        .await
        .expect_err("week-plus expiry must be rejected");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn presign_get_rejects_unknown_response_overrides() {
    let mock = MockStorageClient::new();
    let mut params = HashMap::new();
    params.insert("x-custom-param".to_string(), "value".to_string());

    let err = store(mock)
        .presign_get("test-1", "a.txt", Duration::from_secs(600), params, &OpContext::default())
        .await
        .expect_err("unknown override must be rejected");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn presign_get_forwards_supported_overrides() {
    let mut mock = MockStorageClient::new();
    mock.expect_presign_get()
        .times(1)
        .withf(|_, _, _, params| params.get("response-content-type").map(String::as_str) == Some("application/json"))
        .returning(|_, _, _, _| Ok("http://localhost:9000/test-1/a.txt?signed".to_string()));

    let mut params = HashMap::new();
    params.insert("response-content-type".to_string(), "application/json".to_string());

    let url = store(mock)
        .presign_get("test-1", "a.txt", Duration::from_secs(600), params, &OpContext::default())
        .await
        .expect("grant is issued");
    assert!(url.contains("test-1/a.txt"));
}

#[tokio::test]
async fn remove_incomplete_upload_is_a_noop_without_uploads() {
    let mut mock = MockStorageClient::new();
    mock.expect_list_incomplete_uploads().returning(|_, _| Ok(Vec::new()));
    mock.expect_abort_upload().never();

    store(mock)
        .remove_incomplete_upload("test-1", "a.txt", &OpContext::default())
        .await
        .expect("no upload to abort is a success");
}

#[tokio::test]
async fn remove_incomplete_upload_aborts_only_exact_key_matches() {
    use crate::types::object::MultipartUploadInfo;

    let mut mock = MockStorageClient::new();
    mock.expect_list_incomplete_uploads().returning(|_, _| {
        Ok(vec![
            MultipartUploadInfo { key: "a.txt".to_string(), upload_id: "upload-1".to_string(), initiated: None },
            MultipartUploadInfo { key: "a.txt.bak".to_string(), upload_id: "upload-2".to_string(), initiated: None },
        ])
    });
    mock.expect_abort_upload()
        .times(1)
        .withf(|_, _, upload_id| upload_id == "upload-1")
        .returning(|_, _, _| Ok(()));

    store(mock)
        .remove_incomplete_upload("test-1", "a.txt", &OpContext::default())
        .await
        .expect("matching upload is aborted");
}

#[tokio::test]
async fn set_bucket_policy_requires_json() {
    let mock = MockStorageClient::new();
    let err = store(mock)
        .set_bucket_policy("test-1", "not json at all", &OpContext::default())
        .await
        .expect_err("non-JSON policy must be rejected");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn set_bucket_notification_rejects_eventless_rules() {
    use crate::types::notification::{BucketNotificationConfig, NotificationRule, NotificationTarget};

    let mock = MockStorageClient::new();
    let config = BucketNotificationConfig::empty().with_rule(NotificationRule::new(
        NotificationTarget::Topic("arn:aws:sns:us-east-1:123456789012:events".to_string()),
        Vec::new(),
    ));

    let err = store(mock)
        .set_bucket_notification("test-1", &config, &OpContext::default())
        .await
        .expect_err("eventless rule must be rejected");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn remove_all_notifications_sets_the_empty_config() {
    let mut mock = MockStorageClient::new();
    mock.expect_set_bucket_notification()
        .times(1)
        .withf(|_, config| config.is_empty())
        .returning(|_, _| Ok(()));

    store(mock)
        .remove_all_bucket_notifications("test-1", &OpContext::default())
        .await
        .expect("clearing notifications succeeds");
}
