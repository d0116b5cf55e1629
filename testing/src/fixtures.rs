//! Member fixtures.

use txsync_core::{Member, MemberId};

/// Sender in the transfer scenarios.
pub const MEMBER_A: &str = "memberA";

/// Receiver in the transfer scenarios.
pub const MEMBER_B: &str = "memberB";

/// Receiver id that makes a transfer fail after the first write.
pub const MEMBER_EX: &str = "ex";

/// Opening balance of every standard member.
pub const INITIAL_BALANCE: i64 = 10_000;

/// `memberA` with the opening balance.
#[must_use]
pub fn member_a() -> Member {
    Member::new(MEMBER_A, INITIAL_BALANCE)
}

/// `memberB` with the opening balance.
#[must_use]
pub fn member_b() -> Member {
    Member::new(MEMBER_B, INITIAL_BALANCE)
}

/// `ex` with the opening balance.
#[must_use]
pub fn member_ex() -> Member {
    Member::new(MEMBER_EX, INITIAL_BALANCE)
}

/// `memberA` and `memberB`.
#[must_use]
pub fn standard_members() -> Vec<Member> {
    vec![member_a(), member_b()]
}

/// Shorthand for building ids in assertions.
#[must_use]
pub fn id(value: &str) -> MemberId {
    MemberId::new(value)
}
