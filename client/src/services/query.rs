//! Query building and stale-response guarding.
//!
//! [`build_query`] is a pure mapping from the filter selections to the ordered
//! parameter list of `GET /courts`. [`QueryTracker`] tags every issued query
//! with a monotonically increasing sequence number and decides whether a
//! response is still authoritative when it arrives.

use serde::{Deserialize, Serialize};

use crate::models::{CourtStatus, FilterSet};

/// Query parameter order of the listing endpoint.
pub const QUERY_KEYS: [&str; 6] = [
    "status",
    "q",
    "indoor_outdoor",
    "min_courts",
    "court_type",
    "lighting",
];

/// Canonical listing query: ordered key/value pairs, unset fields encoded as "".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pairs: Vec<(String, String)>,
}

impl QueryDescriptor {
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Value for `key`, if the key is part of the descriptor.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// URL-encoded query string without the leading `?`.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl std::fmt::Display for QueryDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// Build the listing query for a status and a filter set.
pub fn build_query(status: CourtStatus, filters: &FilterSet) -> QueryDescriptor {
    let values = [
        status.as_str().to_string(),
        filters.text.clone(),
        filters
            .indoor_outdoor
            .map(|v| v.as_str().to_string())
            .unwrap_or_default(),
        filters
            .min_courts
            .map(|v| v.to_string())
            .unwrap_or_default(),
        filters
            .court_type
            .map(|v| v.as_str().to_string())
            .unwrap_or_default(),
        filters
            .lighting
            .map(|v| v.as_str().to_string())
            .unwrap_or_default(),
    ];

    QueryDescriptor {
        pairs: QUERY_KEYS
            .iter()
            .zip(values)
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    }
}

/// Sequence number of an issued query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuerySeq(pub u64);

impl std::fmt::Display for QuerySeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A query the host must fetch and report back with [`QueryTicket::seq`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    pub seq: QuerySeq,
    pub descriptor: QueryDescriptor,
}

/// Issue-order bookkeeping for listing queries.
#[derive(Debug, Clone, Default)]
pub struct QueryTracker {
    last_issued: Option<QuerySeq>,
    last_applied: Option<QuerySeq>,
}

impl QueryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag a new descriptor. Every earlier ticket becomes stale.
    pub fn issue(&mut self, descriptor: QueryDescriptor) -> QueryTicket {
        let next = self.last_issued.map_or(1, |s| s.0 + 1);
        let seq = QuerySeq(next);
        self.last_issued = Some(seq);
        QueryTicket { seq, descriptor }
    }

    /// Whether a response for `seq` may still be applied.
    ///
    /// Only the most recently issued query is authoritative.
    pub fn is_current(&self, seq: QuerySeq) -> bool {
        self.last_issued == Some(seq) && self.last_applied.map_or(true, |applied| seq > applied)
    }

    /// Record that the response for `seq` was applied or failed.
    ///
    /// Returns `false` (and changes nothing) if `seq` is not current.
    pub fn mark_applied(&mut self, seq: QuerySeq) -> bool {
        if !self.is_current(seq) {
            return false;
        }
        self.last_applied = Some(seq);
        true
    }

    /// A query was issued and has not settled yet.
    pub fn is_pending(&self) -> bool {
        self.last_issued.is_some() && self.last_issued != self.last_applied
    }

    pub fn last_issued(&self) -> Option<QuerySeq> {
        self.last_issued
    }

    pub fn last_applied(&self) -> Option<QuerySeq> {
        self.last_applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourtType, IndoorOutdoor, Lighting};
    use proptest::prelude::*;

    #[test]
    fn test_unconstrained_query_encodes_empty_values() {
        let descriptor = build_query(CourtStatus::Active, &FilterSet::default());
        assert_eq!(
            descriptor.to_query_string(),
            "status=active&q=&indoor_outdoor=&min_courts=&court_type=&lighting="
        );
    }

    #[test]
    fn test_full_query_encoding() {
        let filters = FilterSet {
            text: "san diego".to_string(),
            indoor_outdoor: Some(IndoorOutdoor::Indoor),
            min_courts: Some(4),
            court_type: Some(CourtType::PayToPlay),
            lighting: Some(Lighting::Yes),
        };
        let descriptor = build_query(CourtStatus::Active, &filters);
        assert_eq!(descriptor.get("q"), Some("san diego"));
        assert_eq!(descriptor.get("min_courts"), Some("4"));
        assert_eq!(
            descriptor.to_query_string(),
            "status=active&q=san+diego&indoor_outdoor=indoor&min_courts=4&court_type=pay+to+play&lighting=yes"
        );
    }

    #[test]
    fn test_pending_review_status() {
        let descriptor = build_query(CourtStatus::PendingReview, &FilterSet::default());
        assert_eq!(descriptor.get("status"), Some("pending review"));
    }

    #[test]
    fn test_tracker_latest_issue_wins() {
        let mut tracker = QueryTracker::new();
        let a = tracker.issue(build_query(CourtStatus::Active, &FilterSet::default()));
        let b = tracker.issue(build_query(CourtStatus::Active, &FilterSet::default()));
        assert!(a.seq < b.seq);
        assert!(tracker.is_pending());

        // B resolves first, A arrives late
        assert!(tracker.mark_applied(b.seq));
        assert!(!tracker.mark_applied(a.seq));
        assert_eq!(tracker.last_applied(), Some(b.seq));
        assert!(!tracker.is_pending());
    }

    #[test]
    fn test_tracker_superseded_response_is_not_applied_early() {
        let mut tracker = QueryTracker::new();
        let a = tracker.issue(build_query(CourtStatus::Active, &FilterSet::default()));
        let _b = tracker.issue(build_query(CourtStatus::Active, &FilterSet::default()));
        assert!(!tracker.is_current(a.seq));
        assert!(!tracker.mark_applied(a.seq));
        assert_eq!(tracker.last_applied(), None);
    }

    #[test]
    fn test_tracker_same_seq_twice() {
        let mut tracker = QueryTracker::new();
        let a = tracker.issue(build_query(CourtStatus::Active, &FilterSet::default()));
        assert!(tracker.mark_applied(a.seq));
        assert!(!tracker.mark_applied(a.seq));
    }

    proptest! {
        #[test]
        fn prop_descriptor_has_fixed_key_order(
            text in ".{0,24}",
            min in proptest::option::of(0u32..500),
            indoor in proptest::bool::ANY,
        ) {
            let filters = FilterSet {
                text,
                indoor_outdoor: indoor.then_some(IndoorOutdoor::Indoor),
                min_courts: min,
                ..Default::default()
            };
            let descriptor = build_query(CourtStatus::Active, &filters);
            let keys: Vec<&str> = descriptor.pairs().iter().map(|(k, _)| k.as_str()).collect();
            prop_assert_eq!(keys, QUERY_KEYS.to_vec());
        }

        #[test]
        fn prop_descriptor_is_deterministic(text in ".{0,24}", min in proptest::option::of(0u32..50)) {
            let filters = FilterSet { text, min_courts: min, ..Default::default() };
            prop_assert_eq!(
                build_query(CourtStatus::Active, &filters),
                build_query(CourtStatus::Active, &filters.clone())
            );
        }
    }
}
