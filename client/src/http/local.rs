//! In-memory courts backend for development and tests.
//!
//! Filtering is a plausible stand-in for the real backend: substring match on
//! name/city/state, equality on the enum filters, and a lower bound on the
//! court count. Scripted failures let tests exercise the error paths.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::CourtsApi;
use crate::error::{ClientError, ClientResult};
use crate::models::{Court, CourtStatus};
use crate::services::QueryDescriptor;

#[derive(Debug, Default)]
struct LocalState {
    courts: Vec<(CourtStatus, Court)>,
    failures: VecDeque<ClientError>,
    requests: Vec<QueryDescriptor>,
    required_token: Option<String>,
}

/// In-memory [`CourtsApi`].
#[derive(Debug, Clone, Default)]
pub struct LocalCourtsApi {
    state: Arc<RwLock<LocalState>>,
}

impl LocalCourtsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-filled with active courts.
    pub fn with_courts(courts: impl IntoIterator<Item = Court>) -> Self {
        let api = Self::new();
        for court in courts {
            api.insert(CourtStatus::Active, court);
        }
        api
    }

    pub fn insert(&self, status: CourtStatus, court: Court) {
        self.state.write().courts.push((status, court));
    }

    /// Queue an error for the next `list_courts` call.
    pub fn fail_next(&self, error: ClientError) {
        self.state.write().failures.push_back(error);
    }

    /// Reject requests that do not carry this bearer token.
    pub fn require_token(&self, token: impl Into<String>) {
        self.state.write().required_token = Some(token.into());
    }

    /// Every query received so far, in arrival order.
    pub fn requests(&self) -> Vec<QueryDescriptor> {
        self.state.read().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.read().requests.len()
    }
}

fn matches(status: CourtStatus, court: &Court, query: &QueryDescriptor) -> bool {
    let param = |key: &str| query.get(key).filter(|v| !v.trim().is_empty());

    if let Some(wanted) = param("status") {
        if status.as_str() != wanted {
            return false;
        }
    }
    if let Some(text) = param("q") {
        let needle = text.trim().to_lowercase();
        let haystacks = [
            Some(court.name.as_str()),
            court.address_city.as_deref(),
            court.address_state.as_deref(),
        ];
        if !haystacks
            .iter()
            .flatten()
            .any(|h| h.to_lowercase().contains(&needle))
        {
            return false;
        }
    }
    if let Some(kind) = param("indoor_outdoor") {
        if court.indoor_outdoor.map(|k| k.as_str()) != Some(kind) {
            return false;
        }
    }
    if let Some(min) = param("min_courts").and_then(|v| v.parse::<u32>().ok()) {
        if court.number_of_courts.unwrap_or(0) < min {
            return false;
        }
    }
    if let Some(kind) = param("court_type") {
        if court.court_type.map(|k| k.as_str()) != Some(kind) {
            return false;
        }
    }
    if let Some(lights) = param("lighting") {
        if court.lighting.map(|l| l.as_str()) != Some(lights) {
            return false;
        }
    }
    true
}

#[async_trait]
impl CourtsApi for LocalCourtsApi {
    async fn list_courts(
        &self,
        query: &QueryDescriptor,
        bearer: Option<&str>,
    ) -> ClientResult<Vec<Court>> {
        let mut state = self.state.write();
        state.requests.push(query.clone());

        if let Some(required) = state.required_token.as_deref() {
            if bearer != Some(required) {
                return Err(ClientError::http(401, "Not authenticated")
                    .with_operation("list_courts"));
            }
        }
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }

        Ok(state
            .courts
            .iter()
            .filter(|(status, court)| matches(*status, court, query))
            .map(|(_, court)| court.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourtType, FilterSet, IndoorOutdoor, Lighting};
    use crate::services::build_query;

    fn fixture() -> LocalCourtsApi {
        let mut riverside = Court::new("r", "Riverside Park").with_position(40.8, -73.97);
        riverside.address_city = Some("New York".into());
        riverside.indoor_outdoor = Some(IndoorOutdoor::Outdoor);
        riverside.number_of_courts = Some(6);
        riverside.lighting = Some(Lighting::Yes);
        riverside.court_type = Some(CourtType::Public);

        let mut club = Court::new("c", "Austin Racquet Club");
        club.address_city = Some("Austin".into());
        club.indoor_outdoor = Some(IndoorOutdoor::Indoor);
        club.number_of_courts = Some(2);
        club.court_type = Some(CourtType::PrivateClub);

        let api = LocalCourtsApi::with_courts([riverside, club]);
        api.insert(CourtStatus::PendingReview, Court::new("p", "Pending Place"));
        api
    }

    async fn ids(api: &LocalCourtsApi, status: CourtStatus, filters: FilterSet) -> Vec<String> {
        api.list_courts(&build_query(status, &filters), None)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id.0)
            .collect()
    }

    #[tokio::test]
    async fn test_unconstrained_lists_active_in_insert_order() {
        let api = fixture();
        assert_eq!(
            ids(&api, CourtStatus::Active, FilterSet::default()).await,
            vec!["r", "c"]
        );
        assert_eq!(
            ids(&api, CourtStatus::PendingReview, FilterSet::default()).await,
            vec!["p"]
        );
    }

    #[tokio::test]
    async fn test_filters_narrow_results() {
        let api = fixture();
        let by_city = FilterSet {
            text: "austin".into(),
            ..Default::default()
        };
        assert_eq!(ids(&api, CourtStatus::Active, by_city).await, vec!["c"]);

        let big = FilterSet {
            min_courts: Some(4),
            ..Default::default()
        };
        assert_eq!(ids(&api, CourtStatus::Active, big).await, vec!["r"]);

        let lit_indoor = FilterSet {
            indoor_outdoor: Some(IndoorOutdoor::Indoor),
            lighting: Some(Lighting::Yes),
            ..Default::default()
        };
        assert!(ids(&api, CourtStatus::Active, lit_indoor).await.is_empty());
    }

    #[tokio::test]
    async fn test_scripted_failure_then_recovery() {
        let api = fixture();
        api.fail_next(ClientError::http(503, "down"));
        let query = build_query(CourtStatus::Active, &FilterSet::default());
        assert!(api.list_courts(&query, None).await.is_err());
        assert!(api.list_courts(&query, None).await.is_ok());
        assert_eq!(api.request_count(), 2);
    }

    #[tokio::test]
    async fn test_required_token() {
        let api = fixture();
        api.require_token("secret");
        let query = build_query(CourtStatus::Active, &FilterSet::default());
        let err = api.list_courts(&query, None).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(api.list_courts(&query, Some("secret")).await.is_ok());
    }
}
