//! Collector side of the heartbeat monitor
//!
//! - Membership table shared by every task
//! - Ingestion listener decoding one beacon per connection
//! - Expiry sweeper evicting sources that stopped reporting
//! - Beacon wire codec shared with the agent

mod listener;
pub mod protocol;
mod sweeper;
mod table;

pub use listener::IngestListener;
pub use sweeper::{Sweeper, TIMEOUT_MULTIPLIER};
pub use table::MembershipTable;
