//! Grouping of motion blobs that belong to the same object.
//!
//! A dart in the mask is often split into several blobs (flight, shaft,
//! tip). Blobs whose borders come within `proximity_px` of each other are
//! chained into one group.

use crate::params::ClusterParams;
use dartcam_core::{find_external_contours, min_point_distance, Contour, GrayImage};
use log::trace;
use nalgebra::Point2;
use std::collections::VecDeque;

/// Contours that were linked together by proximity.
#[derive(Clone, Debug, PartialEq)]
pub struct ContourGroup {
    pub contours: Vec<Contour>,
    /// Sum of the member contour areas.
    pub area: f64,
}

impl ContourGroup {
    /// All border points of all members, in member order.
    pub fn merged_points(&self) -> Vec<Point2<i32>> {
        self.contours
            .iter()
            .flat_map(|c| c.points.iter().copied())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct BlobClusterer {
    params: ClusterParams,
}

impl BlobClusterer {
    pub fn new(params: ClusterParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ClusterParams {
        &self.params
    }

    pub fn set_min_blob_area(&mut self, area: f64) {
        self.params.min_blob_area = area;
    }

    /// Groups of the mask's outer contours, largest total area first.
    pub fn cluster(&self, mask: &GrayImage) -> Vec<ContourGroup> {
        let contours: Vec<Contour> = find_external_contours(mask)
            .into_iter()
            .filter(|c| c.area() >= self.params.min_blob_area)
            .collect();
        let groups = self.link(contours);
        trace!(
            "{} groups, areas {:?}",
            groups.len(),
            groups.iter().map(|g| g.area).collect::<Vec<_>>()
        );
        groups
    }

    pub fn largest(&self, mask: &GrayImage) -> Option<ContourGroup> {
        self.cluster(mask).into_iter().next()
    }

    fn link(&self, contours: Vec<Contour>) -> Vec<ContourGroup> {
        let n = contours.len();
        let mut group_of: Vec<Option<usize>> = vec![None; n];
        let mut members: Vec<Vec<usize>> = Vec::new();
        let mut queue = VecDeque::new();

        for seed in 0..n {
            if group_of[seed].is_some() {
                continue;
            }
            let g = members.len();
            group_of[seed] = Some(g);
            members.push(vec![seed]);
            queue.push_back(seed);
            while let Some(i) = queue.pop_front() {
                for j in 0..n {
                    if group_of[j].is_some() {
                        continue;
                    }
                    let d = min_point_distance(&contours[i].points, &contours[j].points);
                    if d < self.params.proximity_px {
                        group_of[j] = Some(g);
                        members[g].push(j);
                        queue.push_back(j);
                    }
                }
            }
        }

        let mut slots: Vec<Option<Contour>> = contours.into_iter().map(Some).collect();
        let mut groups: Vec<ContourGroup> = members
            .into_iter()
            .map(|idx| {
                let contours: Vec<Contour> =
                    idx.into_iter().filter_map(|i| slots[i].take()).collect();
                let area = contours.iter().map(Contour::area).sum();
                ContourGroup { contours, area }
            })
            .collect();
        groups.sort_by(|a, b| b.area.total_cmp(&a.area));
        groups
    }
}
