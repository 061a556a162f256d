//! The court list currently shown by the map and the list.

use crate::models::{Coordinates, Court, CourtId};

use super::query::QuerySeq;

/// A court that can be drawn on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerPoint<'a> {
    pub court: &'a Court,
    pub position: Coordinates,
}

/// Most recent successfully applied listing, in server order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourtResultSet {
    courts: Vec<Court>,
    source: Option<QuerySeq>,
}

impl CourtResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_courts(courts: Vec<Court>, source: QuerySeq) -> Self {
        Self {
            courts,
            source: Some(source),
        }
    }

    /// Replace the listing. Returns the previous one.
    pub fn replace(&mut self, courts: Vec<Court>, source: QuerySeq) -> Vec<Court> {
        self.source = Some(source);
        std::mem::replace(&mut self.courts, courts)
    }

    /// Every court, in the order the backend returned them.
    pub fn rows(&self) -> &[Court] {
        &self.courts
    }

    /// Courts with both coordinates present, in server order.
    pub fn markers(&self) -> impl Iterator<Item = MarkerPoint<'_>> + '_ {
        self.courts.iter().filter_map(|court| {
            court
                .coordinates()
                .map(|position| MarkerPoint { court, position })
        })
    }

    pub fn contains(&self, id: &CourtId) -> bool {
        self.courts.iter().any(|c| &c.id == id)
    }

    pub fn get(&self, id: &CourtId) -> Option<&Court> {
        self.courts.iter().find(|c| &c.id == id)
    }

    /// Query that produced this listing, `None` before the first apply.
    pub fn source(&self) -> Option<QuerySeq> {
        self.source
    }

    pub fn len(&self) -> usize {
        self.courts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courts.is_empty()
    }
}
