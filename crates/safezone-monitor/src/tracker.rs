use safezone_core::{Coordinate, LocationFix, Zone};
use safezone_geo::point_in_polygon;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneTransition {
    Left,
    Returned,
}

/// Inside/outside state for one tracked subject.
///
/// Starts out inside so that the very first fix can only ever produce a
/// `Left` transition, never a spurious one in the other direction. With no
/// zones every fix is outside: the first fix leaves and nothing can bring
/// the subject back.
#[derive(Debug, Clone)]
pub struct ZoneTracker {
    zones: Vec<Zone>,
    inside: bool,
}

impl ZoneTracker {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self {
            zones,
            inside: true,
        }
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn is_inside(&self) -> bool {
        self.inside
    }

    pub fn contains(&self, coordinate: Coordinate) -> bool {
        self.zones
            .iter()
            .any(|zone| point_in_polygon(coordinate, &zone.points))
    }

    pub fn observe(&mut self, fix: &LocationFix) -> Option<ZoneTransition> {
        let contained = self.contains(fix.coordinate);
        match (self.inside, contained) {
            (true, false) => {
                self.inside = false;
                Some(ZoneTransition::Left)
            }
            (false, true) => {
                self.inside = true;
                Some(ZoneTransition::Returned)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safezone_core::ZoneId;

    fn fix(latitude: f64, longitude: f64) -> LocationFix {
        LocationFix::new(Coordinate::new(latitude, longitude), 0)
    }

    fn square() -> Zone {
        Zone::new(
            ZoneId::new("home"),
            vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 10.0),
                Coordinate::new(10.0, 10.0),
                Coordinate::new(10.0, 0.0),
            ],
        )
    }

    #[test]
    fn leave_and_return() {
        let mut tracker = ZoneTracker::new(vec![square()]);
        assert_eq!(tracker.observe(&fix(5.0, 5.0)), None);
        assert_eq!(tracker.observe(&fix(50.0, 50.0)), Some(ZoneTransition::Left));
        assert!(!tracker.is_inside());
        assert_eq!(tracker.observe(&fix(60.0, 50.0)), None);
        assert_eq!(tracker.observe(&fix(5.0, 5.0)), Some(ZoneTransition::Returned));
        assert!(tracker.is_inside());
    }

    #[test]
    fn first_fix_outside_leaves() {
        let mut tracker = ZoneTracker::new(vec![square()]);
        assert_eq!(tracker.observe(&fix(-3.0, 4.0)), Some(ZoneTransition::Left));
    }

    #[test]
    fn any_zone_counts() {
        let far = Zone::new(
            ZoneId::new("park"),
            vec![
                Coordinate::new(20.0, 20.0),
                Coordinate::new(20.0, 30.0),
                Coordinate::new(30.0, 30.0),
                Coordinate::new(30.0, 20.0),
            ],
        );
        let mut tracker = ZoneTracker::new(vec![square(), far]);
        assert_eq!(tracker.observe(&fix(25.0, 25.0)), None);
        assert_eq!(tracker.observe(&fix(5.0, 5.0)), None);
        assert_eq!(tracker.observe(&fix(15.0, 15.0)), Some(ZoneTransition::Left));
    }

    #[test]
    fn no_zones_leaves_once_and_stays_out() {
        let mut tracker = ZoneTracker::new(Vec::new());
        assert_eq!(tracker.observe(&fix(5.0, 5.0)), Some(ZoneTransition::Left));
        for _ in 0..3 {
            assert_eq!(tracker.observe(&fix(5.0, 5.0)), None);
        }
        assert!(!tracker.is_inside());
    }
}
