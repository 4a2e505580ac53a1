//! Security identity allocation.
//!
//! Label sets are deduplicated by content digest into numeric identities and
//! reference-counted by their holders.

mod store;

pub use store::IdentityStore;
