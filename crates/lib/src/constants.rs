//! Constants used throughout the store.
//!
//! Central definitions for provider event names, JWT claim keys and the
//! well-known user properties the toolkit reads and writes.

/// Provider event fired when the access token is set or refreshed.
pub const EVENT_ACCESS_TOKEN_SET: &str = "accessToken.set";

/// Provider event fired after the person's profile changed.
pub const EVENT_PROFILE_UPDATE: &str = "profile.update";

/// Provider event fired after the account changed.
pub const EVENT_ACCOUNT_UPDATE: &str = "account.update";

/// Provider event fired after the subscription changed.
pub const EVENT_SUBSCRIPTION_UPDATE: &str = "subscription.update";

/// Provider event fired on logout.
pub const EVENT_LOGOUT: &str = "logout";

/// Events that re-run `sync_user` by default.
pub const DEFAULT_SYNC_EVENTS: [&str; 4] = [
    EVENT_ACCESS_TOKEN_SET,
    EVENT_PROFILE_UPDATE,
    EVENT_ACCOUNT_UPDATE,
    EVENT_SUBSCRIPTION_UPDATE,
];

/// Events that run `reset` by default.
pub const DEFAULT_RESET_EVENTS: [&str; 1] = [EVENT_LOGOUT];

/// Quiet period before pending edits are persisted.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Subject claim; correlates with the user record's `Uid`.
pub const CLAIM_SUBJECT: &str = "sub";
pub const CLAIM_EMAIL: &str = "email";
pub const CLAIM_PLAN_UID: &str = "outseta:planUid";
pub const CLAIM_ADD_ON_UIDS: &str = "outseta:addOnUids";
pub const CLAIM_ACCOUNT_UID: &str = "outseta:accountUid";
pub const CLAIM_SUBSCRIPTION_UID: &str = "outseta:subscriptionUid";
pub const CLAIM_IS_PRIMARY: &str = "outseta:isPrimary";

/// Unique id field of a user record.
pub const USER_ID_FIELD: &str = "Uid";

/// Custom user property holding bookmarked slugs.
pub const BOOKMARKS_PROPERTY: &str = "Bookmarks";

/// Custom user property holding completed lesson slugs.
pub const LESSONS_COMPLETED_PROPERTY: &str = "LessonsCompleted";

/// Largest array index a property path may address.
pub const MAX_PATH_INDEX: usize = 10_000;
