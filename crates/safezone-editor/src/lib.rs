//! Interactive safe-zone drawing.
//!
//! A caregiver taps points onto a map to build a draft outline. Every tap
//! is validated before it lands, and the finished outline is validated once
//! more against the zones that already exist before it is handed to the
//! [`ZoneStore`]. A zone only becomes part of the local collection after
//! the store has accepted it.

use metrics::counter;
use safezone_core::{BoundingBox, Coordinate, Zone, ZoneError, ZoneId, ZoneResult, metric_names};
use safezone_geo::{
    point_in_polygon, polygon_self_intersects, polygons_intersect, segments_intersect,
};
use safezone_store::ZoneStore;
use tracing::{debug, info, warn};

pub const MIN_ZONE_POINTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Empty,
    Drafting,
    ReadyToCommit,
}

pub struct ZoneEditor<S> {
    store: S,
    draft: Vec<Coordinate>,
    zones: Vec<Zone>,
    active: Option<ZoneId>,
}

impl<S: ZoneStore> ZoneEditor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            draft: Vec::new(),
            zones: Vec::new(),
            active: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn draft(&self) -> &[Coordinate] {
        &self.draft
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn state(&self) -> EditorState {
        match self.draft.len() {
            0 => EditorState::Empty,
            n if n < MIN_ZONE_POINTS => EditorState::Drafting,
            _ => EditorState::ReadyToCommit,
        }
    }

    pub fn active_zone(&self) -> Option<&Zone> {
        let id = self.active.as_ref()?;
        self.zones.iter().find(|zone| &zone.id == id)
    }

    /// Replaces the committed zones wholesale. Zones coming from the store
    /// are trusted as they are; overlap is only ever checked on commit.
    pub fn load_zones(&mut self, zones: Vec<Zone>) {
        self.zones = zones;
        self.active = None;
    }

    /// Pulls the assigned zones from the store. Local zones are kept if the
    /// fetch fails.
    pub async fn reload(&mut self) -> ZoneResult<usize> {
        let zones = self
            .store
            .fetch()
            .await
            .map_err(|err| ZoneError::PersistenceFailure(err.message))?;
        debug!(zones = zones.len(), "loaded zones from store");
        let count = zones.len();
        self.load_zones(zones);
        Ok(count)
    }

    pub fn add_point(&mut self, coord: Coordinate) -> ZoneResult<()> {
        if let Some((&last, rest)) = self.draft.split_last() {
            // The edge ending at `last` shares a vertex with the new edge
            // and is skipped.
            let crosses = rest
                .windows(2)
                .any(|edge| segments_intersect(last, coord, edge[0], edge[1]));
            if crosses {
                return Err(rejected(ZoneError::SelfIntersection));
            }
        }

        if self
            .zones
            .iter()
            .any(|zone| point_in_polygon(coord, &zone.points))
        {
            return Err(rejected(ZoneError::PointInsideExistingZone));
        }

        self.draft.push(coord);
        Ok(())
    }

    /// Removes the draft point at `index`. Indices past the end are ignored.
    pub fn remove_point(&mut self, index: usize) -> Option<Coordinate> {
        (index < self.draft.len()).then(|| self.draft.remove(index))
    }

    pub async fn commit(&mut self) -> ZoneResult<Zone> {
        if self.draft.len() < MIN_ZONE_POINTS {
            return Err(rejected(ZoneError::InsufficientPoints {
                required: MIN_ZONE_POINTS,
                actual: self.draft.len(),
            }));
        }

        // Taps only check the edge they add. The closing edge and edges
        // left behind by removals are checked here.
        if polygon_self_intersects(&self.draft) {
            return Err(rejected(ZoneError::SelfIntersection));
        }

        if let Some(existing) = self
            .zones
            .iter()
            .find(|zone| polygons_intersect(&self.draft, &zone.points))
        {
            return Err(rejected(ZoneError::ZoneOverlap {
                zone_id: existing.id.clone(),
            }));
        }

        let zone = Zone::new(ZoneId::generate(), self.draft.clone());
        let record = zone.to_record();

        if let Err(err) = self.store.submit(&record).await {
            warn!(zone_id = %zone.id, error = %err, "zone submission failed");
            return Err(rejected(ZoneError::PersistenceFailure(err.message)));
        }

        info!(
            zone_id = %zone.id,
            points = zone.points.len(),
            min_latitude = record.coordinate_range.min_latitude,
            max_latitude = record.coordinate_range.max_latitude,
            min_longitude = record.coordinate_range.min_longitude,
            max_longitude = record.coordinate_range.max_longitude,
            "zone committed"
        );
        counter!(metric_names::ZONES_COMMITTED).increment(1);

        self.zones.push(zone.clone());
        self.draft.clear();
        Ok(zone)
    }

    /// Marks a zone as active and returns its envelope for display.
    pub fn select_zone(&mut self, id: &ZoneId) -> Option<BoundingBox> {
        let range = self
            .zones
            .iter()
            .find(|zone| &zone.id == id)?
            .bounding_box()?;
        self.active = Some(id.clone());
        Some(range)
    }

    /// Local removal only; the store is not told.
    pub fn delete_zone(&mut self, id: &ZoneId) -> Option<Zone> {
        let index = self.zones.iter().position(|zone| &zone.id == id)?;
        self.active = None;
        self.draft.clear();
        Some(self.zones.remove(index))
    }

    pub fn clear_draft(&mut self) {
        self.draft.clear();
        self.active = None;
    }

    pub fn clear_all(&mut self) {
        self.zones.clear();
        self.clear_draft();
    }
}

fn rejected(err: ZoneError) -> ZoneError {
    debug!(error = %err, code = ?err.code(), "zone edit rejected");
    counter!(metric_names::ZONE_EDITS_REJECTED).increment(1);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use safezone_core::ZoneRecord;
    use safezone_store::StoreError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        submitted: Mutex<Vec<ZoneRecord>>,
        stored: Vec<Zone>,
        fail: bool,
    }

    #[async_trait]
    impl ZoneStore for RecordingStore {
        async fn submit(&self, record: &ZoneRecord) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::new("backend unavailable"));
            }
            self.submitted.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn fetch(&self) -> Result<Vec<Zone>, StoreError> {
            if self.fail {
                return Err(StoreError::new("backend unavailable"));
            }
            Ok(self.stored.clone())
        }
    }

    fn c(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate::new(latitude, longitude)
    }

    fn square() -> Zone {
        Zone::new(
            ZoneId::new("square"),
            vec![c(0.0, 0.0), c(0.0, 10.0), c(10.0, 10.0), c(10.0, 0.0)],
        )
    }

    fn editor_with_square() -> ZoneEditor<RecordingStore> {
        let mut editor = ZoneEditor::new(RecordingStore::default());
        editor.load_zones(vec![square()]);
        editor
    }

    fn draw(editor: &mut ZoneEditor<RecordingStore>, points: &[Coordinate]) {
        for point in points {
            editor.add_point(*point).unwrap();
        }
    }

    #[test]
    fn state_follows_point_count() {
        let mut editor = ZoneEditor::new(RecordingStore::default());
        assert_eq!(editor.state(), EditorState::Empty);
        draw(&mut editor, &[c(20.0, 20.0), c(20.0, 30.0), c(30.0, 30.0)]);
        assert_eq!(editor.state(), EditorState::Drafting);
        editor.add_point(c(30.0, 20.0)).unwrap();
        assert_eq!(editor.state(), EditorState::ReadyToCommit);
    }

    #[test]
    fn crossing_edge_is_rejected() {
        let mut editor = ZoneEditor::new(RecordingStore::default());
        draw(&mut editor, &[c(0.0, 0.0), c(10.0, 10.0), c(10.0, 0.0)]);
        let err = editor.add_point(c(0.0, 10.0)).unwrap_err();
        assert_eq!(err, ZoneError::SelfIntersection);
        assert_eq!(editor.draft().len(), 3);
    }

    #[test]
    fn doubling_back_along_the_last_edge_is_allowed() {
        let mut editor = ZoneEditor::new(RecordingStore::default());
        draw(&mut editor, &[c(0.0, 0.0), c(0.0, 10.0)]);
        editor.add_point(c(0.0, 5.0)).unwrap();
        assert_eq!(editor.draft().len(), 3);
    }

    #[test]
    fn point_inside_existing_zone_is_rejected() {
        let mut editor = editor_with_square();
        let err = editor.add_point(c(5.0, 5.0)).unwrap_err();
        assert_eq!(err, ZoneError::PointInsideExistingZone);
        assert!(editor.draft().is_empty());
    }

    #[test]
    fn remove_point_drops_back_to_drafting() {
        let mut editor = ZoneEditor::new(RecordingStore::default());
        draw(
            &mut editor,
            &[c(20.0, 20.0), c(20.0, 30.0), c(30.0, 30.0), c(30.0, 20.0)],
        );
        assert_eq!(editor.remove_point(1), Some(c(20.0, 30.0)));
        assert_eq!(editor.state(), EditorState::Drafting);
        assert_eq!(editor.remove_point(7), None);
        assert_eq!(editor.draft().len(), 3);
    }

    #[tokio::test]
    async fn commit_needs_four_points() {
        let mut editor = editor_with_square();
        draw(&mut editor, &[c(20.0, 20.0), c(20.0, 30.0), c(30.0, 30.0)]);
        let err = editor.commit().await.unwrap_err();
        assert_eq!(
            err,
            ZoneError::InsufficientPoints {
                required: 4,
                actual: 3
            }
        );
        assert_eq!(editor.zones().len(), 1);
        assert!(editor.store().submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_rejects_crossing_closing_edge() {
        let mut editor = ZoneEditor::new(RecordingStore::default());
        // Every tap is fine on its own; closing back to the first point
        // cuts across the second edge.
        draw(
            &mut editor,
            &[c(0.0, 0.0), c(0.0, 10.0), c(10.0, 0.0), c(10.0, 10.0)],
        );
        let err = editor.commit().await.unwrap_err();
        assert_eq!(err, ZoneError::SelfIntersection);
        assert!(editor.zones().is_empty());
        assert_eq!(editor.draft().len(), 4);
        assert!(editor.store().submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_rejects_crossing_left_by_removal() {
        let mut editor = ZoneEditor::new(RecordingStore::default());
        // A square with a bump at high latitude and a spike reaching up
        // into the bump from the other side.
        draw(
            &mut editor,
            &[
                c(0.0, 0.0),
                c(10.0, 0.0),
                c(20.0, 5.0),
                c(10.0, 10.0),
                c(0.0, 10.0),
                c(0.0, 6.0),
                c(12.0, 5.0),
                c(0.0, 4.0),
            ],
        );
        // Flattening the bump leaves an edge straight through the spike.
        assert_eq!(editor.remove_point(2), Some(c(20.0, 5.0)));
        let err = editor.commit().await.unwrap_err();
        assert_eq!(err, ZoneError::SelfIntersection);
        assert_eq!(editor.draft().len(), 7);
    }

    #[tokio::test]
    async fn commit_rejects_crossing_an_existing_zone() {
        let mut editor = editor_with_square();
        // A band whose corners are all outside the square but whose long
        // edges cut straight through it.
        draw(
            &mut editor,
            &[c(-5.0, 3.0), c(-5.0, 7.0), c(15.0, 7.0), c(15.0, 3.0)],
        );
        let err = editor.commit().await.unwrap_err();
        assert_eq!(
            err,
            ZoneError::ZoneOverlap {
                zone_id: ZoneId::new("square")
            }
        );
        assert_eq!(editor.zones().len(), 1);
        assert_eq!(editor.draft().len(), 4);
    }

    #[tokio::test]
    async fn commit_submits_envelope_and_keeps_outline() {
        let mut editor = editor_with_square();
        let outline = [c(20.0, 20.0), c(22.0, 30.0), c(30.0, 31.0), c(29.0, 19.0)];
        draw(&mut editor, &outline);

        let zone = editor.commit().await.unwrap();
        assert_eq!(zone.points, outline.to_vec());
        assert_eq!(editor.zones().len(), 2);
        assert_eq!(editor.state(), EditorState::Empty);

        let submitted = editor.store().submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].id.as_ref(), Some(&zone.id));
        assert_eq!(
            submitted[0].coordinate_range,
            BoundingBox {
                min_latitude: 20.0,
                max_latitude: 30.0,
                min_longitude: 19.0,
                max_longitude: 31.0,
            }
        );
        assert!(submitted[0].coordinates.is_none());
    }

    #[tokio::test]
    async fn failed_submission_adds_nothing() {
        let mut editor = ZoneEditor::new(RecordingStore {
            fail: true,
            ..RecordingStore::default()
        });
        draw(
            &mut editor,
            &[c(20.0, 20.0), c(20.0, 30.0), c(30.0, 30.0), c(30.0, 20.0)],
        );
        let err = editor.commit().await.unwrap_err();
        assert!(matches!(err, ZoneError::PersistenceFailure(_)));
        assert!(editor.zones().is_empty());
        assert_eq!(editor.draft().len(), 4);
    }

    #[tokio::test]
    async fn committed_zones_are_unique() {
        let mut editor = ZoneEditor::new(RecordingStore::default());
        draw(
            &mut editor,
            &[c(0.0, 0.0), c(0.0, 1.0), c(1.0, 1.0), c(1.0, 0.0)],
        );
        let first = editor.commit().await.unwrap();
        draw(
            &mut editor,
            &[c(5.0, 5.0), c(5.0, 6.0), c(6.0, 6.0), c(6.0, 5.0)],
        );
        let second = editor.commit().await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn reload_replaces_local_zones() {
        let mut editor = ZoneEditor::new(RecordingStore {
            stored: vec![square()],
            ..RecordingStore::default()
        });
        assert_eq!(editor.reload().await.unwrap(), 1);
        assert_eq!(editor.zones()[0].id, ZoneId::new("square"));
    }

    #[tokio::test]
    async fn failed_reload_keeps_local_zones() {
        let mut editor = ZoneEditor::new(RecordingStore {
            fail: true,
            ..RecordingStore::default()
        });
        editor.load_zones(vec![square()]);
        assert!(editor.reload().await.is_err());
        assert_eq!(editor.zones().len(), 1);
    }

    #[test]
    fn select_then_delete_zone() {
        let mut editor = editor_with_square();
        let id = ZoneId::new("square");
        let range = editor.select_zone(&id).unwrap();
        assert_eq!(range.max_latitude, 10.0);
        assert_eq!(editor.active_zone().map(|zone| &zone.id), Some(&id));

        assert!(editor.delete_zone(&id).is_some());
        assert!(editor.active_zone().is_none());
        assert!(editor.zones().is_empty());
        assert!(editor.delete_zone(&id).is_none());
        assert!(editor.select_zone(&id).is_none());
    }

    #[test]
    fn clear_all_discards_everything() {
        let mut editor = editor_with_square();
        editor.add_point(c(20.0, 20.0)).unwrap();
        editor.clear_all();
        assert!(editor.zones().is_empty());
        assert_eq!(editor.state(), EditorState::Empty);
        // The old square no longer blocks points.
        editor.add_point(c(5.0, 5.0)).unwrap();
    }
}
