#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod clock;
pub mod hash;
pub mod password;
pub mod secret;

pub use clock::utc_now;
pub use password::{check_pass, make_pass};
pub use secret::SecretString;
