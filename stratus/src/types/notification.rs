use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::client::storage::StorageError;

/// Destination of bucket event notifications. Closed variant set, dispatched
/// by pattern match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationTarget {
    /// SNS topic ARN
    Topic(String),
    /// SQS queue ARN
    Queue(String),
    /// Lambda function ARN
    Lambda(String),
}

impl NotificationTarget {
    pub fn arn(&self) -> &str {
        match self {
            NotificationTarget::Topic(arn) | NotificationTarget::Queue(arn) | NotificationTarget::Lambda(arn) => arn,
        }
    }
}

/// Bucket events a notification rule can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    ObjectCreatedAll,
    ObjectCreatedPut,
    ObjectCreatedPost,
    ObjectCreatedCopy,
    ObjectCreatedCompleteMultipartUpload,
    ObjectRemovedAll,
    ObjectRemovedDelete,
    ObjectRemovedDeleteMarkerCreated,
}

impl EventKind {
    /// The wire name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ObjectCreatedAll => "s3:ObjectCreated:*",
            EventKind::ObjectCreatedPut => "s3:ObjectCreated:Put",
            EventKind::ObjectCreatedPost => "s3:ObjectCreated:Post",
            EventKind::ObjectCreatedCopy => "s3:ObjectCreated:Copy",
            EventKind::ObjectCreatedCompleteMultipartUpload => "s3:ObjectCreated:CompleteMultipartUpload",
            EventKind::ObjectRemovedAll => "s3:ObjectRemoved:*",
            EventKind::ObjectRemovedDelete => "s3:ObjectRemoved:Delete",
            EventKind::ObjectRemovedDeleteMarkerCreated => "s3:ObjectRemoved:DeleteMarkerCreated",
        }
    }

    const ALL: &'static [EventKind] = &[
        EventKind::ObjectCreatedAll,
        EventKind::ObjectCreatedPut,
        EventKind::ObjectCreatedPost,
        EventKind::ObjectCreatedCopy,
        EventKind::ObjectCreatedCompleteMultipartUpload,
        EventKind::ObjectRemovedAll,
        EventKind::ObjectRemovedDelete,
        EventKind::ObjectRemovedDeleteMarkerCreated,
    ];
}

impl FromStr for EventKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| StorageError::invalid_argument("bucket_notification", format!("unsupported event {s:?}")))
    }
}

/// One notification rule: a target plus the events that trigger it, with
/// optional key prefix/suffix filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRule {
    pub id: Option<String>,
    pub target: NotificationTarget,
    pub events: Vec<EventKind>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

impl NotificationRule {
    pub fn new(target: NotificationTarget, events: Vec<EventKind>) -> Self {
        Self { id: None, target, events, prefix: None, suffix: None }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }
}

/// The complete notification rule set of a bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketNotificationConfig {
    pub rules: Vec<NotificationRule>,
}

impl BucketNotificationConfig {
    /// The empty rule set; setting it removes all notifications
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn with_rule(mut self, rule: NotificationRule) -> Self {
        self.rules.push(rule);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().expect("known event"), *kind);
        }
    }

    #[test]
    fn unknown_event_is_rejected() {
        let err = "s3:ObjectTagging:Put".parse::<EventKind>().expect_err("unsupported event");
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }

    #[test]
    fn rule_builder_fills_filters() {
        let rule = NotificationRule::new(
            NotificationTarget::Queue("arn:aws:sqs:us-east-1:123456789012:ingest".to_string()),
            vec![EventKind::ObjectCreatedPut],
        )
        .with_prefix("images/")
        .with_suffix(".png");

        assert_eq!(rule.target.arn(), "arn:aws:sqs:us-east-1:123456789012:ingest");
        assert_eq!(rule.prefix.as_deref(), Some("images/"));
        assert_eq!(rule.suffix.as_deref(), Some(".png"));
    }
}
