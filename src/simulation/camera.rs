//! Camera field-of-view projection
//!
//! Each camera sees a fixed trapezoid in front of it. After a run, every
//! recorded sample inside that trapezoid is re-expressed in the camera's own
//! frame to form the camera's tracklets.

use log::debug;

use super::scenario::CameraPose;
use super::track::GroundTruthTrack;
use super::types::{TrackId, Vector2};

/// Field of view in camera-local coordinates, symmetric about the forward (+x) axis
pub const FOV_POLYGON: [Vector2; 4] = [
    Vector2 { x: 9.0, y: 1.0 },
    Vector2 { x: 17.5, y: 5.5 },
    Vector2 { x: 17.5, y: -5.5 },
    Vector2 { x: 9.0, y: -1.0 },
];

/// One sample seen by a camera, in that camera's frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackletPoint {
    pub x: f64,
    pub y: f64,
    pub t: f64,
    pub track: TrackId,
}

/// Everything one camera saw during a run
#[derive(Debug, Clone, PartialEq)]
pub struct CameraTracklets {
    pub camera: usize,
    pub points: Vec<TrackletPoint>,
    /// Tracks with at least one sample in view, in track order
    pub tracks_present: Vec<TrackId>,
}

impl CameraTracklets {
    pub fn new(camera: usize) -> Self {
        Self {
            camera,
            points: Vec::new(),
            tracks_present: Vec::new(),
        }
    }
}

/// A camera's field of view placed in the world
#[derive(Debug, Clone, PartialEq)]
pub struct CameraView {
    pub center: Vector2,
    /// Heading in radians
    pub heading: f64,
    /// FOV polygon in world coordinates
    pub polygon: Vec<Vector2>,
}

impl CameraView {
    pub fn new(pose: &CameraPose) -> Self {
        Self::with_polygon(pose, &FOV_POLYGON)
    }

    /// Place an arbitrary local polygon at the camera pose
    pub fn with_polygon(pose: &CameraPose, local_polygon: &[Vector2]) -> Self {
        let center = pose.center();
        let heading = pose.heading_radians();
        let polygon = local_polygon
            .iter()
            .map(|v| v.rotate(heading) + center)
            .collect();
        Self {
            center,
            heading,
            polygon,
        }
    }

    /// Half-plane containment test
    ///
    /// The point is inside when every edge puts it on the same side. An edge
    /// the point lies on is skipped rather than counted against it.
    pub fn contains(&self, point: Vector2) -> bool {
        polygon_contains(&self.polygon, point)
    }

    /// Express a world point in this camera's frame
    pub fn to_local(&self, point: Vector2) -> Vector2 {
        (point - self.center).rotate(-self.heading)
    }
}

/// Same-sign cross-product test over the polygon's edges in order
pub fn polygon_contains(polygon: &[Vector2], point: Vector2) -> bool {
    let mut reference = 0.0;

    for (i, &a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        let side = (b - a).perp().dot(&(point - a));

        if reference == 0.0 {
            reference = side;
        } else if reference * side > 0.0 {
            reference = side;
        } else if side == 0.0 {
            continue;
        } else {
            return false;
        }
    }

    true
}

/// Collect the tracklets of every camera, in camera order
pub fn project_tracks(cameras: &[CameraPose], tracks: &[GroundTruthTrack]) -> Vec<CameraTracklets> {
    cameras
        .iter()
        .enumerate()
        .map(|(index, pose)| {
            let view = CameraView::new(pose);
            let mut tracklets = CameraTracklets::new(index);

            for track in tracks {
                let before = tracklets.points.len();
                tracklets.points.extend(
                    track
                        .samples
                        .iter()
                        .filter(|s| view.contains(s.position()))
                        .map(|s| {
                            let local = view.to_local(s.position());
                            TrackletPoint {
                                x: local.x,
                                y: local.y,
                                t: s.t,
                                track: track.id,
                            }
                        }),
                );
                if tracklets.points.len() > before {
                    tracklets.tracks_present.push(track.id);
                }
            }

            debug!(
                "Camera {}: {} points from {} tracks",
                index,
                tracklets.points.len(),
                tracklets.tracks_present.len()
            );
            tracklets
        })
        .collect()
}
