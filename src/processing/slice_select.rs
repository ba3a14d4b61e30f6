use std::fmt;
use std::io::{self, Write};

use crate::error::{Result, SliceSelectError};
use crate::io::centerline::Centerline;

/// Outcome of walking down the centerline until a target arc length is covered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcWalk {
    pub start: usize,
    /// First index at which the covered distance reaches the target.
    pub overshoot_index: usize,
    /// Distance from `start` to `overshoot_index`.
    pub dist_upper: f64,
    /// Distance from `start` to the sample one step before `overshoot_index`.
    pub dist_lower: f64,
}

impl ArcWalk {
    /// Sample visited just before the overshoot (the start itself if no step was taken).
    pub fn previous_index(&self) -> usize {
        if self.overshoot_index == self.start {
            self.start
        } else {
            self.overshoot_index + 1
        }
    }

    /// Picks whichever candidate lies closer to `target`. Ties go to the sample
    /// nearer the upper bound.
    pub fn closest(&self, target: f64) -> (usize, f64) {
        if (self.dist_upper - target).abs() < (self.dist_lower - target).abs() {
            (self.overshoot_index, self.dist_upper)
        } else {
            (self.previous_index(), self.dist_lower)
        }
    }
}

/// Walks from `start` toward index 0 until the arc length covered since `start`
/// first reaches `target`.
///
/// Distances are spans of `incremental_length`, the same measure the selector splits,
/// so a target no longer than the span down to some sample always stops at or above
/// it. A target of zero (or less) ends the walk at `start` without moving.
pub fn walk_arc_length(centerline: &Centerline, start: usize, target: f64) -> Result<ArcWalk> {
    centerline.check_index(start)?;
    let incremental = centerline.incremental_length();

    let mut index = start;
    let mut covered = 0.0;
    while covered < target {
        if index == 0 {
            return Err(SliceSelectError::CenterlineExhausted {
                start,
                target,
                covered,
            });
        }
        index -= 1;
        covered = incremental[start] - incremental[index];
    }

    let dist_lower = if index == start {
        covered
    } else {
        incremental[start] - incremental[index + 1]
    };
    Ok(ArcWalk {
        start,
        overshoot_index: index,
        dist_upper: covered,
        dist_lower,
    })
}

/// Sample below `start` whose arc-length distance from it is closest to `target`,
/// together with that distance.
pub fn nearest_sample_at_distance(
    centerline: &Centerline,
    start: usize,
    target: f64,
) -> Result<(usize, f64)> {
    Ok(walk_arc_length(centerline, start, target)?.closest(target))
}

/// One iteration of the equidistant search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectLog {
    pub iteration: usize,
    pub current_index: usize,
    /// Arc length left between the current sample and the lower landmark.
    pub remaining: f64,
    /// Ideal length of the next segment.
    pub target: f64,
    pub chosen_index: usize,
    pub segment_length: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliceSelection {
    /// Sample indices from the upper landmark down to the lower landmark.
    pub indices: Vec<usize>,
    /// Arc length between consecutive entries of `indices`.
    pub interslice_dist: Vec<f64>,
    pub logs: Vec<SelectLog>,
}

/// Chooses `n_slices` samples between the `upper` and `lower` landmark indices that
/// split the arc length between them into segments as equal as the sampling allows.
///
/// The search is greedy: each iteration aims for the arc length still remaining
/// divided by the number of segments left, so the error of one choice is spread over
/// the following segments instead of piling up on the last one. The last slice is
/// always exactly `lower`.
///
/// Indices must decrease from `upper` to `lower`; the order is not inferred.
pub fn select_equidistant_slices(
    centerline: &Centerline,
    upper: usize,
    lower: usize,
    n_slices: usize,
) -> Result<SliceSelection> {
    if n_slices < 2 {
        return Err(SliceSelectError::InvalidSliceCount {
            requested: n_slices,
        });
    }
    centerline.check_index(upper)?;
    centerline.check_index(lower)?;
    if upper == lower {
        return Err(SliceSelectError::DegenerateSpan { index: upper });
    }
    if upper < lower {
        return Err(SliceSelectError::LandmarkOrder { upper, lower });
    }

    let incremental = centerline.incremental_length();
    let mut indices = Vec::with_capacity(n_slices);
    let mut interslice_dist = Vec::with_capacity(n_slices - 1);
    let mut logs = Vec::with_capacity(n_slices - 1);

    let mut current = upper;
    indices.push(current);

    for j in 0..n_slices - 1 {
        let segments_left = n_slices - 1 - j;
        let remaining = incremental[current] - incremental[lower];
        let target = remaining / segments_left as f64;

        log::debug!(
            "iteration {}: current index {}, remaining {:.4}, target {:.4}",
            j,
            current,
            remaining,
            target
        );

        let (next, segment_length) = if segments_left == 1 {
            (lower, remaining)
        } else {
            nearest_sample_at_distance(centerline, current, target)?
        };

        logs.push(SelectLog {
            iteration: j,
            current_index: current,
            remaining,
            target,
            chosen_index: next,
            segment_length,
        });
        indices.push(next);
        interslice_dist.push(segment_length);
        current = next;
    }

    log::info!(
        "selected {} slices between samples {} and {}: {:?}",
        n_slices,
        upper,
        lower,
        indices
    );

    Ok(SliceSelection {
        indices,
        interslice_dist,
        logs,
    })
}

/// Same as [`select_equidistant_slices`] with both bounds given as region numbers
/// (positions in the centerline's `regions_labels`).
pub fn select_between_regions(
    centerline: &Centerline,
    upper_region: usize,
    lower_region: usize,
    n_slices: usize,
) -> Result<SliceSelection> {
    let upper = centerline.region_index(upper_region)?;
    let lower = centerline.region_index(lower_region)?;
    select_equidistant_slices(centerline, upper, lower, n_slices)
}

impl SliceSelection {
    pub fn total_length(&self) -> f64 {
        self.interslice_dist.iter().sum()
    }

    /// Writes the human-readable audit trail of the search to `w`.
    pub fn write_report<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "{}", self)
    }

    pub fn report(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SliceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for log in &self.logs {
            writeln!(f, "Iteration j: {}", log.iteration)?;
            writeln!(f, "Current index: {}", log.current_index)?;
            writeln!(f, "Remaining distance between boundaries: {}", log.remaining)?;
            writeln!(
                f,
                "Ideal distance to next slice ({} segments left): {}",
                self.logs.len() - log.iteration,
                log.target
            )?;
            writeln!(
                f,
                "Chosen index: {} (segment length {})",
                log.chosen_index, log.segment_length
            )?;
            writeln!(f)?;
        }
        writeln!(f, "========== Final lists ==========")?;
        writeln!(f)?;
        writeln!(f, "Slice indices along the centerline: {:?}", self.indices)?;
        writeln!(f)?;
        writeln!(
            f,
            "Interslice distances along the centerline: {:?}",
            self.interslice_dist
        )
    }
}
