//! Token validity filtering.

use crate::model::capabilities::{SoftDeletable, Token, UserToken};
use crate::query::deleted::DeletedState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a query keeps valid tokens, expired tokens, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenValidity {
    Valid,
    NotValid,
    Any,
}

impl TokenValidity {
    /// Whether a token expiring at `valid_until` passes relative to `now`.
    ///
    /// A token expiring exactly at `now` still counts as valid.
    pub fn retains(self, valid_until: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::Valid => valid_until >= now,
            Self::NotValid => valid_until < now,
            Self::Any => true,
        }
    }
}

/// Token filtering over any token sequence.
///
/// "Now" is captured once when the filter is constructed, so one query
/// evaluates every token against the same instant.
pub trait TokenQuery: Iterator + Sized
where
    Self::Item: Token,
{
    fn of_token_id(
        self,
        token_id: i64,
        validity: TokenValidity,
        state: DeletedState,
    ) -> impl Iterator<Item = Self::Item> {
        filter_tokens(self, validity, state, Some(token_id), None)
    }

    fn of_token_key(
        self,
        token_key: &str,
        validity: TokenValidity,
        state: DeletedState,
    ) -> impl Iterator<Item = Self::Item> {
        filter_tokens(self, validity, state, None, Some(token_key.to_owned()))
    }
}

impl<I> TokenQuery for I
where
    I: Iterator + Sized,
    I::Item: Token,
{
}

/// Token filtering additionally constrained to one owning user.
pub trait UserTokenQuery: Iterator + Sized
where
    Self::Item: UserToken,
{
    fn of_user_token(
        self,
        token_key: &str,
        user_id: i64,
        validity: TokenValidity,
        state: DeletedState,
    ) -> impl Iterator<Item = Self::Item> {
        filter_tokens(self, validity, state, None, Some(token_key.to_owned()))
            .filter(move |token| token.user_id() == user_id)
    }
}

impl<I> UserTokenQuery for I
where
    I: Iterator + Sized,
    I::Item: UserToken,
{
}

fn filter_tokens<I>(
    tokens: I,
    validity: TokenValidity,
    state: DeletedState,
    token_id: Option<i64>,
    token_key: Option<String>,
) -> impl Iterator<Item = I::Item>
where
    I: Iterator,
    I::Item: Token,
{
    let now = Utc::now();
    tokens.filter(move |token| {
        state.retains(token.is_deleted())
            && validity.retains(token.valid_until(), now)
            && token_id.map_or(true, |id| token.id() == id)
            && token_key
                .as_deref()
                .map_or(true, |key| token.token_key() == key)
    })
}

#[cfg(test)]
mod tests {
    use super::TokenValidity;
    use chrono::{Duration, Utc};

    #[test]
    fn validity_boundaries() {
        let now = Utc::now();
        assert!(TokenValidity::Valid.retains(now, now));
        assert!(TokenValidity::Valid.retains(now + Duration::hours(1), now));
        assert!(!TokenValidity::Valid.retains(now - Duration::hours(1), now));

        assert!(TokenValidity::NotValid.retains(now - Duration::hours(1), now));
        assert!(!TokenValidity::NotValid.retains(now, now));

        assert!(TokenValidity::Any.retains(now - Duration::hours(1), now));
        assert!(TokenValidity::Any.retains(now + Duration::hours(1), now));
    }
}
