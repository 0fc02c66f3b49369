//! The itinerary store: the single owner of the ordered stop list.
//!
//! Every mutating call bumps [`Itinerary::revision`]. Anything derived from
//! an earlier revision (timelines, leg durations, pending route requests) is
//! unknown from that point on and must be recomputed.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::stop::{Stop, StopField};

/// Name given to the stop created when a captured position becomes the start.
pub const CURRENT_LOCATION_NAME: &str = "Current location";

/// Ordered stops plus the revision counter that dates derived data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Itinerary {
    stops: Vec<Stop>,
    #[serde(skip)]
    revision: u64,
}

impl Itinerary {
    /// An empty itinerary at revision 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap stops loaded from elsewhere, starting at revision 0.
    pub fn from_stops(stops: Vec<Stop>) -> Self {
        Self { stops, revision: 0 }
    }

    /// The stops in itinerary order.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Number of stops.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// # Errors
    ///
    /// Returns [`PlanError::IndexOutOfRange`] when `index >= len`.
    pub fn get(&self, index: usize) -> Result<&Stop> {
        self.check(index)?;
        Ok(&self.stops[index])
    }

    /// Counter bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Locations in itinerary order, as handed to the routing provider.
    pub fn locations(&self) -> Vec<String> {
        self.stops.iter().map(|s| s.location.clone()).collect()
    }

    // ── mutations ───────────────────────────────────────────────────────

    pub fn append(&mut self, stop: Stop) {
        self.stops.push(stop);
        self.touch();
    }

    /// Insert before the stop currently at `index`. Use [`Itinerary::append`]
    /// to add at the end.
    pub fn insert_at(&mut self, index: usize, stop: Stop) -> Result<()> {
        self.check(index)?;
        self.stops.insert(index, stop);
        self.touch();
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Stop> {
        self.check(index)?;
        let removed = self.stops.remove(index);
        self.touch();
        Ok(removed)
    }

    /// Insert a copy of the stop at `index` immediately after it.
    pub fn duplicate_at(&mut self, index: usize) -> Result<()> {
        self.check(index)?;
        let copy = self.stops[index].clone();
        self.stops.insert(index + 1, copy);
        self.touch();
        Ok(())
    }

    /// Relocate one stop so that it ends up at `to`, keeping every other
    /// stop in its relative order. The stop keeps its own target time.
    ///
    /// `from == to` changes nothing and does not bump the revision.
    pub fn move_to(&mut self, from: usize, to: usize) -> Result<()> {
        self.check(from)?;
        self.check(to)?;
        if from == to {
            return Ok(());
        }
        let moved = self.stops.remove(from);
        self.stops.insert(to, moved);
        self.touch();
        Ok(())
    }

    pub fn set_field(&mut self, index: usize, field: StopField) -> Result<()> {
        self.check(index)?;
        field.apply(&mut self.stops[index]);
        self.touch();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.stops.clear();
        self.touch();
    }

    /// Make `location` (typically a captured `"lat,lng"`) the start point.
    ///
    /// Replaces the first stop's location, or creates a
    /// [`CURRENT_LOCATION_NAME`] stop when the itinerary is empty.
    pub fn set_origin(&mut self, location: impl Into<String>) {
        let location = location.into();
        match self.stops.first_mut() {
            Some(first) => first.location = location,
            None => self.stops.push(Stop::new(
                CURRENT_LOCATION_NAME,
                Default::default(),
                location,
                0,
            )),
        }
        self.touch();
    }

    fn check(&self, index: usize) -> Result<()> {
        if index < self.stops.len() {
            Ok(())
        } else {
            Err(PlanError::IndexOutOfRange {
                index,
                len: self.stops.len(),
            })
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ClockTime, TargetTime};

    fn named(names: &[&str]) -> Itinerary {
        Itinerary::from_stops(names.iter().map(|n| Stop::new(*n, TargetTime::Unscheduled, *n, 0)).collect())
    }

    fn names(it: &Itinerary) -> Vec<&str> {
        it.stops().iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_append_and_insert() {
        let mut it = named(&["A", "C"]);
        it.insert_at(1, Stop::new("B", TargetTime::Unscheduled, "B", 0)).unwrap();
        it.append(Stop::new("D", TargetTime::Unscheduled, "D", 0));
        assert_eq!(names(&it), ["A", "B", "C", "D"]);
    }

    #[test]
    fn test_insert_rejects_end_index() {
        let mut it = named(&["A"]);
        let err = it.insert_at(1, Stop::unscheduled("x")).unwrap_err();
        assert_eq!(err, PlanError::IndexOutOfRange { index: 1, len: 1 });
    }

    #[test]
    fn test_remove_returns_stop() {
        let mut it = named(&["A", "B", "C"]);
        let removed = it.remove_at(1).unwrap();
        assert_eq!(removed.name, "B");
        assert_eq!(names(&it), ["A", "C"]);
        assert!(it.remove_at(2).is_err());
    }

    #[test]
    fn test_duplicate_inserts_copy_after() {
        let mut it = named(&["A", "B"]);
        it.set_field(0, StopField::Note("bring tickets".into())).unwrap();
        it.duplicate_at(0).unwrap();
        assert_eq!(names(&it), ["A", "A", "B"]);
        assert_eq!(it.stops()[1].note, "bring tickets");
    }

    #[test]
    fn test_move_to_front() {
        let mut it = named(&["A", "B", "C", "D"]);
        it.move_to(2, 0).unwrap();
        assert_eq!(names(&it), ["C", "A", "B", "D"]);
    }

    #[test]
    fn test_move_to_back() {
        let mut it = named(&["A", "B", "C", "D"]);
        it.move_to(0, 3).unwrap();
        assert_eq!(names(&it), ["B", "C", "D", "A"]);
    }

    #[test]
    fn test_move_keeps_target_time_with_stop() {
        let mut it = named(&["A", "B", "C"]);
        let nine = ClockTime::parse("9:00am").unwrap();
        it.set_field(2, StopField::Target(nine.into())).unwrap();
        it.move_to(2, 0).unwrap();
        assert_eq!(it.stops()[0].name, "C");
        assert_eq!(it.stops()[0].target.time(), Some(nine));
    }

    #[test]
    fn test_move_same_index_is_noop() {
        let mut it = named(&["A", "B"]);
        let rev = it.revision();
        it.move_to(1, 1).unwrap();
        assert_eq!(it.revision(), rev);
        assert_eq!(names(&it), ["A", "B"]);
    }

    #[test]
    fn test_move_out_of_range() {
        let mut it = named(&["A", "B"]);
        assert!(it.move_to(0, 2).is_err());
        assert!(it.move_to(5, 0).is_err());
        assert_eq!(names(&it), ["A", "B"]);
    }

    #[test]
    fn test_every_mutation_bumps_revision() {
        let mut it = named(&["A", "B"]);
        let mut last = it.revision();
        let mut bumped = |it: &Itinerary| {
            let now = it.revision();
            assert!(now > last);
            last = now;
        };
        it.append(Stop::unscheduled("C"));
        bumped(&it);
        it.set_field(0, StopField::Duration(10)).unwrap();
        bumped(&it);
        it.duplicate_at(1).unwrap();
        bumped(&it);
        it.move_to(0, 1).unwrap();
        bumped(&it);
        it.remove_at(0).unwrap();
        bumped(&it);
        it.set_origin("1.0,2.0");
        bumped(&it);
        it.clear();
        bumped(&it);
    }

    #[test]
    fn test_failed_mutation_keeps_revision() {
        let mut it = named(&["A"]);
        let rev = it.revision();
        assert!(it.set_field(3, StopField::Duration(1)).is_err());
        assert_eq!(it.revision(), rev);
    }

    #[test]
    fn test_set_origin_replaces_first_location() {
        let mut it = named(&["A", "B"]);
        it.set_origin("37.77,-122.41");
        assert_eq!(it.locations(), ["37.77,-122.41", "B"]);
        assert_eq!(it.stops()[0].name, "A");
    }

    #[test]
    fn test_set_origin_on_empty_creates_stop() {
        let mut it = Itinerary::new();
        it.set_origin("37.77,-122.41");
        assert_eq!(it.len(), 1);
        assert_eq!(it.stops()[0].name, CURRENT_LOCATION_NAME);
    }
}
