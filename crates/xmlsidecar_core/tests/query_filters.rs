use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;
use xmlsidecar_core::{
    DeletedState, SoftDeletable, SoftDeleteQuery, SystemVersioned, SystemVersionedQuery, Token,
    TokenQuery, TokenValidity, UserToken, UserTokenQuery,
};

#[derive(Debug, Clone, PartialEq)]
struct AccessToken {
    id: i64,
    token_key: String,
    user_id: i64,
    valid_until: DateTime<Utc>,
    deleted: bool,
}

impl AccessToken {
    fn new(id: i64, token_key: impl Into<String>, valid_until: DateTime<Utc>) -> Self {
        Self {
            id,
            token_key: token_key.into(),
            user_id: 0,
            valid_until,
            deleted: false,
        }
    }
}

impl SoftDeletable for AccessToken {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

impl Token for AccessToken {
    fn id(&self) -> i64 {
        self.id
    }

    fn token_key(&self) -> &str {
        &self.token_key
    }

    fn valid_until(&self) -> DateTime<Utc> {
        self.valid_until
    }
}

impl UserToken for AccessToken {
    fn user_id(&self) -> i64 {
        self.user_id
    }
}

#[derive(Debug, Clone, PartialEq)]
struct AuditRow {
    name: &'static str,
    sys_start_time: DateTime<Utc>,
}

impl SystemVersioned for AuditRow {
    fn sys_start_time(&self) -> DateTime<Utc> {
        self.sys_start_time
    }
}

fn ids<T: IntoIterator<Item = AccessToken>>(tokens: T) -> Vec<i64> {
    tokens.into_iter().map(|token| token.id).collect()
}

#[test]
fn validity_partitions_by_expiry() {
    let future = Utc::now() + Duration::hours(1);
    let past = Utc::now() - Duration::hours(1);
    let tokens = vec![
        AccessToken::new(1, "fresh", future),
        AccessToken::new(2, "stale", past),
    ];

    let valid = tokens
        .clone()
        .into_iter()
        .of_token_key("fresh", TokenValidity::Valid, DeletedState::NotDeleted);
    assert_eq!(ids(valid), vec![1]);

    let expired = tokens
        .clone()
        .into_iter()
        .of_token_key("stale", TokenValidity::NotValid, DeletedState::Any);
    assert_eq!(ids(expired), vec![2]);

    let any = tokens
        .into_iter()
        .of_token_id(2, TokenValidity::Any, DeletedState::Any);
    assert_eq!(ids(any), vec![2]);
}

#[test]
fn expired_tokens_are_the_complement_of_valid_ones() {
    let now = Utc::now();
    let tokens = vec![
        AccessToken::new(1, "a", now + Duration::minutes(5)),
        AccessToken::new(2, "a", now - Duration::minutes(5)),
        AccessToken::new(3, "a", now + Duration::days(1)),
    ];

    let valid = tokens
        .clone()
        .into_iter()
        .of_token_key("a", TokenValidity::Valid, DeletedState::Any);
    let not_valid = tokens
        .into_iter()
        .of_token_key("a", TokenValidity::NotValid, DeletedState::Any);

    assert_eq!(ids(valid), vec![1, 3]);
    assert_eq!(ids(not_valid), vec![2]);
}

#[test]
fn deleted_tokens_are_filtered_out_unless_requested() {
    let future = Utc::now() + Duration::hours(1);
    let mut deleted = AccessToken::new(1, "k", future);
    deleted.deleted = true;
    let tokens = vec![deleted, AccessToken::new(2, "k", future)];

    let kept = tokens
        .clone()
        .into_iter()
        .of_token_key("k", TokenValidity::Valid, DeletedState::NotDeleted);
    assert_eq!(ids(kept), vec![2]);

    let tombstones = tokens
        .into_iter()
        .of_token_key("k", TokenValidity::Valid, DeletedState::Deleted);
    assert_eq!(ids(tombstones), vec![1]);
}

#[test]
fn token_key_and_id_constraints_apply() {
    let future = Utc::now() + Duration::hours(1);
    let key_a = Uuid::new_v4().to_string();
    let key_b = Uuid::new_v4().to_string();
    let tokens = vec![
        AccessToken::new(1, key_a.clone(), future),
        AccessToken::new(2, key_b, future),
    ];

    let by_key = tokens
        .clone()
        .into_iter()
        .of_token_key(&key_a, TokenValidity::Any, DeletedState::Any);
    assert_eq!(ids(by_key), vec![1]);

    let by_id = tokens
        .into_iter()
        .of_token_id(2, TokenValidity::Any, DeletedState::Any);
    assert_eq!(ids(by_id), vec![2]);
}

#[test]
fn user_token_filter_requires_matching_owner() {
    let future = Utc::now() + Duration::hours(1);
    let mut mine = AccessToken::new(1, "shared", future);
    mine.user_id = 10;
    let mut theirs = AccessToken::new(2, "shared", future);
    theirs.user_id = 11;

    let matched = vec![mine, theirs].into_iter().of_user_token(
        "shared",
        10,
        TokenValidity::Valid,
        DeletedState::NotDeleted,
    );
    assert_eq!(ids(matched), vec![1]);
}

#[test]
fn filters_work_over_references_too() {
    let future = Utc::now() + Duration::hours(1);
    let tokens = vec![
        AccessToken::new(1, "k", future),
        AccessToken::new(2, "k", future),
    ];

    let kept: Vec<&AccessToken> = tokens
        .iter()
        .of_deleted_state(DeletedState::NotDeleted)
        .collect();
    assert_eq!(kept.len(), 2);
}

#[test]
fn modified_after_none_and_epoch_pass_everything_through() {
    let rows = vec![
        AuditRow {
            name: "old",
            sys_start_time: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        },
        AuditRow {
            name: "new",
            sys_start_time: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        },
    ];

    let unfiltered: Vec<_> = rows.clone().into_iter().of_modified_after(None).collect();
    assert_eq!(unfiltered.len(), 2);

    let epoch = DateTime::<Utc>::UNIX_EPOCH;
    let unfiltered: Vec<_> = rows
        .clone()
        .into_iter()
        .of_modified_after(Some(epoch))
        .collect();
    assert_eq!(unfiltered.len(), 2);
}

#[test]
fn modified_after_is_strictly_greater() {
    let threshold = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let rows = vec![
        AuditRow {
            name: "before",
            sys_start_time: threshold - Duration::seconds(1),
        },
        AuditRow {
            name: "exact",
            sys_start_time: threshold,
        },
        AuditRow {
            name: "after",
            sys_start_time: threshold + Duration::seconds(1),
        },
    ];

    let kept: Vec<_> = rows
        .into_iter()
        .of_modified_after(Some(threshold))
        .map(|row| row.name)
        .collect();
    assert_eq!(kept, vec!["after"]);
}
