//! proptest strategies for member data.
//!
//! Generated ids fit the `varchar(10)` key column and never collide with the
//! reserved [`MEMBER_EX`](crate::fixtures::MEMBER_EX) id.

use crate::fixtures::MEMBER_EX;
use proptest::prelude::*;
use txsync_core::{Member, MemberId};

/// Member ids of 1 to 10 alphanumeric characters, excluding the reserved id.
pub fn member_id() -> impl Strategy<Value = MemberId> {
    "[a-z][a-zA-Z0-9]{0,9}"
        .prop_filter("reserved id", |s| s != MEMBER_EX)
        .prop_map(MemberId::new)
}

/// Non-negative balances.
pub fn balance() -> impl Strategy<Value = i64> {
    0_i64..1_000_000
}

/// A member with a generated id and balance.
pub fn member() -> impl Strategy<Value = Member> {
    (member_id(), balance()).prop_map(|(member_id, money)| Member { member_id, money })
}

/// Two members with distinct ids, plus an amount no larger than the first one's balance.
pub fn transfer_case() -> impl Strategy<Value = (Member, Member, i64)> {
    (member(), member())
        .prop_filter("distinct ids", |(from, to)| from.member_id != to.member_id)
        .prop_flat_map(|(from, to)| {
            let max = from.money;
            (Just(from), Just(to), 0..=max)
        })
}
