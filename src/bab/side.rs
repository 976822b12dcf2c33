//! One triangulated side between a pair of sub-strands.

use glam::Vec3;

use crate::geometry::{angle, triangle_normal};
use crate::pdb::CaAtom;

/// The triangle spanned by two consecutive CA atoms of one sub-strand and
/// the widest-angle CA of the partner sub-strand, with unit normals for both
/// base orientations.
#[derive(Debug, Clone, Copy)]
pub struct TriangleSide {
    a0: Vec3,
    a1: Vec3,
    /// The widest vertex angle seen from the chosen opposite atom.
    max_angle: f32,
    /// `[forward, reversed]` normals off the triangle plane.
    normals: [Vec3; 2],
}

impl TriangleSide {
    /// Pick the real atom of `opposite` that maximises the vertex angle
    /// a0–opp–a1 and build the two normals.
    pub fn new(a0: Vec3, a1: Vec3, opposite: &[CaAtom]) -> Self {
        let mut best = opposite.first().map(|a| a.xyz).unwrap_or(Vec3::ZERO);
        let mut max_angle = 0.0f32;
        for atom in opposite {
            if !atom.real {
                continue;
            }
            let candidate = angle(a0, a1, atom.xyz);
            if max_angle < candidate {
                max_angle = candidate;
                best = atom.xyz;
            }
        }

        TriangleSide {
            a0,
            a1,
            max_angle,
            normals: [
                triangle_normal(a0, best, a1),
                triangle_normal(a1, best, a0),
            ],
        }
    }

    pub fn max_angle(&self) -> f32 {
        self.max_angle
    }

    pub fn normal(&self, reversed: bool) -> Vec3 {
        self.normals[reversed as usize]
    }

    pub fn base_point(&self, reversed: bool) -> Vec3 {
        if reversed {
            self.a1
        } else {
            self.a0
        }
    }

    /// Half-space decision for a probe point.
    ///
    /// Returns `(on_left, is_distant)`; points within `min_dist` of the
    /// plane are too close and must not be counted. `myside` flips the sign
    /// convention for sides belonging to the second strand of the pair.
    pub fn on_left_side(
        &self,
        v: Vec3,
        reversed: bool,
        myside: bool,
        min_dist: f32,
    ) -> (bool, bool) {
        let dist = self.normal(reversed).dot(v - self.base_point(reversed));
        let is_distant = min_dist < dist.abs();
        let on_left = if myside {
            dist < -min_dist
        } else {
            dist > min_dist
        };
        (on_left, is_distant)
    }
}
