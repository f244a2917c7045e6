//! Store query metrics.

use metrics::{counter, histogram};
use std::time::Instant;

/// Record how long a store query took.
pub fn record_query_duration(query_name: &'static str, duration_secs: f64) {
    histogram!("invitation_store_query_duration_seconds", "query" => query_name)
        .record(duration_secs);
}

/// Count a store query that failed, labelled by failure class.
pub fn record_query_failure(query_name: &'static str, class: &'static str) {
    counter!(
        "invitation_store_query_failures_total",
        "query" => query_name,
        "class" => class
    )
    .increment(1);
}

/// Times a single store query.
///
/// ```ignore
/// let timer = QueryTimer::new("invitation_get");
/// let row = sqlx::query_as::<_, InvitationEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}
