use chrono::{DateTime, SubsecRound, Utc};

/// Current UTC time truncated to microseconds.
///
/// Postgres `timestamptz` keeps microseconds, so values written and read back
/// compare equal.
#[must_use]
pub fn utc_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
