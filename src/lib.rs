//! Shared primitives for the TotalImpact backend: error taxonomy, retry
//! policy, backoff/jitter strategies, interruptible sleeping, and the item
//! data model. Every other crate in this workspace depends on `ti-core`.

mod backoff;
mod clock;
mod engine;
mod error;
mod item;
mod retry;
mod shutdown;
mod sleeper;

pub use backoff::{incremental_back_off, linear_delay, retry_wait, RetryType};
pub use clock::{Clock, MonotonicClock};
pub use engine::drive_retries;
pub use error::{ErrorKind, ProviderError};
pub use item::{Alias, AliasSet, Biblio, Item, MetricSeries, Metrics};
pub use retry::{PolicyTable, RetryPolicyEntry};
pub use shutdown::Shutdown;
pub use sleeper::{interruptible_sleep, InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper};

pub mod prelude {
    pub use crate::{
        drive_retries, incremental_back_off, interruptible_sleep, linear_delay, retry_wait,
        Alias, AliasSet, Biblio, Clock, ErrorKind, Item, MetricSeries, Metrics, MonotonicClock,
        PolicyTable, ProviderError, RetryPolicyEntry, RetryType, Shutdown, Sleeper, TokioSleeper,
    };
}
