//! Synthetic Multi-Camera Tracklet Library
//!
//! Drives a crowd simulation from a scenario file, records ground-truth
//! trajectories and projects them into static camera views.

pub mod simulation;
