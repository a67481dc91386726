/// Testimonial moderation state machine
///
/// Statuses a testimonial can occupy and the owner/admin-triggered
/// transitions between them. Transition legality is a pure function so the
/// single-item and bulk paths share one rule set.
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};

/// Testimonial lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestimonialStatus {
    Pending,
    Approved,
    Rejected,
    Archived,
    Spam,
    Deleted,
}

impl TestimonialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestimonialStatus::Pending => "pending",
            TestimonialStatus::Approved => "approved",
            TestimonialStatus::Rejected => "rejected",
            TestimonialStatus::Archived => "archived",
            TestimonialStatus::Spam => "spam",
            TestimonialStatus::Deleted => "deleted",
        }
    }

    pub fn from_str(s: &str) -> ApiResult<Self> {
        match s {
            "pending" => Ok(TestimonialStatus::Pending),
            "approved" => Ok(TestimonialStatus::Approved),
            "rejected" => Ok(TestimonialStatus::Rejected),
            "archived" => Ok(TestimonialStatus::Archived),
            "spam" => Ok(TestimonialStatus::Spam),
            "deleted" => Ok(TestimonialStatus::Deleted),
            _ => Err(ApiError::Validation(format!("Invalid status: {}", s))),
        }
    }
}

/// Moderation action types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    /// Publish a pending testimonial
    Approve,
    /// Decline a pending testimonial
    Reject,
    /// Move out of the inbox without deciding
    Archive,
    /// Return an archived testimonial to the inbox
    Unarchive,
    /// Mark as spam
    Spam,
    /// Soft-delete (terminal; no route transitions out of it)
    Delete,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Approve => "approve",
            ModerationAction::Reject => "reject",
            ModerationAction::Archive => "archive",
            ModerationAction::Unarchive => "unarchive",
            ModerationAction::Spam => "spam",
            ModerationAction::Delete => "delete",
        }
    }

    pub fn from_str(s: &str) -> ApiResult<Self> {
        match s {
            "approve" => Ok(ModerationAction::Approve),
            "reject" => Ok(ModerationAction::Reject),
            "archive" => Ok(ModerationAction::Archive),
            "unarchive" => Ok(ModerationAction::Unarchive),
            "spam" => Ok(ModerationAction::Spam),
            "delete" => Ok(ModerationAction::Delete),
            _ => Err(ApiError::Validation(format!(
                "Invalid moderation action: {}",
                s
            ))),
        }
    }

    /// The status this action moves a testimonial into
    pub fn target_status(&self) -> TestimonialStatus {
        match self {
            ModerationAction::Approve => TestimonialStatus::Approved,
            ModerationAction::Reject => TestimonialStatus::Rejected,
            ModerationAction::Archive => TestimonialStatus::Archived,
            ModerationAction::Unarchive => TestimonialStatus::Pending,
            ModerationAction::Spam => TestimonialStatus::Spam,
            ModerationAction::Delete => TestimonialStatus::Deleted,
        }
    }

    /// Statuses this action may be applied from. Used both for single-item
    /// legality checks and to build the bulk-update source predicate.
    pub fn allowed_from(&self) -> &'static [TestimonialStatus] {
        use TestimonialStatus::*;
        match self {
            ModerationAction::Approve | ModerationAction::Reject => &[Pending],
            ModerationAction::Archive | ModerationAction::Spam => {
                &[Pending, Approved, Rejected, Archived, Spam]
            }
            ModerationAction::Unarchive => &[Archived],
            ModerationAction::Delete => {
                &[Pending, Approved, Rejected, Archived, Spam, Deleted]
            }
        }
    }
}

/// Compute the status an action produces from `current`, or `None` when the
/// transition is not permitted.
pub fn transition(
    current: TestimonialStatus,
    action: ModerationAction,
) -> Option<TestimonialStatus> {
    if action.allowed_from().contains(&current) {
        Some(action.target_status())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TestimonialStatus::*;

    #[test]
    fn test_action_from_str() {
        assert_eq!(
            ModerationAction::from_str("approve").unwrap(),
            ModerationAction::Approve
        );
        assert_eq!(
            ModerationAction::from_str("unarchive").unwrap(),
            ModerationAction::Unarchive
        );
        assert!(ModerationAction::from_str("invalid").is_err());
    }

    #[test]
    fn test_pending_transitions() {
        assert_eq!(transition(Pending, ModerationAction::Approve), Some(Approved));
        assert_eq!(transition(Pending, ModerationAction::Reject), Some(Rejected));
    }

    #[test]
    fn test_approve_requires_pending() {
        assert_eq!(transition(Archived, ModerationAction::Approve), None);
        assert_eq!(transition(Rejected, ModerationAction::Approve), None);
        assert_eq!(transition(Deleted, ModerationAction::Approve), None);
    }

    #[test]
    fn test_archive_from_any_non_deleted() {
        for status in [Pending, Approved, Rejected, Archived, Spam] {
            assert_eq!(transition(status, ModerationAction::Archive), Some(Archived));
        }
        assert_eq!(transition(Deleted, ModerationAction::Archive), None);
    }

    #[test]
    fn test_unarchive_only_from_archived() {
        assert_eq!(transition(Archived, ModerationAction::Unarchive), Some(Pending));
        assert_eq!(transition(Approved, ModerationAction::Unarchive), None);
    }

    #[test]
    fn test_spam_from_any_non_deleted() {
        for status in [Pending, Approved, Rejected, Archived, Spam] {
            assert_eq!(transition(status, ModerationAction::Spam), Some(Spam));
        }
        assert_eq!(transition(Deleted, ModerationAction::Spam), None);
    }

    #[test]
    fn test_delete_is_terminal_and_universal() {
        for status in [Pending, Approved, Rejected, Archived, Spam, Deleted] {
            assert_eq!(transition(status, ModerationAction::Delete), Some(Deleted));
        }
        // Nothing leads out of deleted
        for action in [
            ModerationAction::Approve,
            ModerationAction::Reject,
            ModerationAction::Archive,
            ModerationAction::Unarchive,
            ModerationAction::Spam,
        ] {
            assert_eq!(transition(Deleted, action), None);
        }
    }
}
