use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::calendar::round_to;
use crate::error::{DaylightError, Result};
use crate::types::{Axis, BoundingBox, GridOptions, Point};

pub const SPACING_DECIMALS: u32 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct PointGrid {
    source: Option<PathBuf>,
    points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSummary {
    pub total_points: usize,
    pub extents: Option<BoundingBox>,
    pub unique_counts: [usize; 3],
    pub max_grid_size: usize,
    pub uniform_spacing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativePosition {
    /// 1-based position among the sorted unique coordinates of each axis.
    pub grid: [usize; 3],
    pub scaled: [f64; 3],
}

impl PointGrid {
    pub fn parse(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse_with(path, &GridOptions::default())
    }

    pub fn parse_with(path: impl AsRef<Path>, options: &GridOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DaylightError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path).map_err(|e| DaylightError::io(path, e))?;
        let mut grid = Self::from_lines(text.lines(), options).map_err(|e| match e {
            DaylightError::MalformedPoint { line, content, .. } => DaylightError::MalformedPoint {
                path: path.to_path_buf(),
                line,
                content,
            },
            other => other,
        })?;
        grid.source = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), points = grid.len(), "parsed points file");
        Ok(grid)
    }

    pub fn from_lines<I, S>(lines: I, options: &GridOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut points = Vec::new();
        for (line_idx, line) in lines.into_iter().enumerate() {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            let malformed = || DaylightError::MalformedPoint {
                path: PathBuf::new(),
                line: line_idx + 1,
                content: line.to_string(),
            };
            let numbers = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| malformed())?;
            if numbers.len() < 3 {
                return Err(malformed());
            }
            let normal = if numbers.len() == 6 {
                [numbers[3], numbers[4], numbers[5]]
            } else {
                options.default_normal
            };
            let index = points.len();
            points.push(Point::new(numbers[0], numbers[1], numbers[2], normal, index));
        }
        Ok(Self {
            source: None,
            points,
        })
    }

    pub fn from_points(points: Vec<Point>) -> Self {
        let points = points
            .into_iter()
            .enumerate()
            .map(|(i, p)| Point::new(p.x, p.y, p.z, p.normal, i))
            .collect();
        Self {
            source: None,
            points,
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    pub fn point_by_id(&self, id: &str) -> Option<&Point> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn locate(&self, x: f64, y: f64, z: f64) -> Option<usize> {
        let key = coord_key([x, y, z]);
        self.points.iter().position(|p| coord_key(p.coords()) == key)
    }

    pub fn axis_values(&self, axis: Axis) -> Vec<f64> {
        self.points.iter().map(|p| p.coord(axis)).collect()
    }

    pub fn unique_coords(&self, axis: Axis) -> Vec<f64> {
        let mut values = self.axis_values(axis);
        values.sort_by(f64::total_cmp);
        values.dedup();
        values
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.points.first()?.coords();
        let (min, max) = self
            .points
            .iter()
            .fold((first, first), |(mut min, mut max), p| {
                for (i, v) in p.coords().into_iter().enumerate() {
                    min[i] = min[i].min(v);
                    max[i] = max[i].max(v);
                }
                (min, max)
            });
        Some(BoundingBox { min, max })
    }

    pub fn unique_counts(&self) -> [usize; 3] {
        Axis::ALL.map(|axis| self.unique_coords(axis).len())
    }

    pub fn max_grid_size(&self) -> usize {
        self.unique_counts().iter().product()
    }

    pub fn spacing(&self, axis: Axis) -> Vec<f64> {
        let mut unique: Vec<f64> = self
            .unique_coords(axis)
            .into_iter()
            .map(|v| round_to(v, SPACING_DECIMALS))
            .collect();
        unique.dedup();
        let mut gaps: Vec<f64> = unique
            .windows(2)
            .map(|w| round_to(w[1] - w[0], SPACING_DECIMALS))
            .collect();
        gaps.sort_by(f64::total_cmp);
        gaps.dedup();
        gaps
    }

    pub fn is_uniform(&self) -> bool {
        Axis::ALL.iter().all(|&axis| self.spacing(axis).len() <= 1)
    }

    pub fn full_grid(&self) -> Vec<[f64; 3]> {
        let [xs, ys, zs] = Axis::ALL.map(|axis| self.unique_coords(axis));
        let mut grid = Vec::with_capacity(xs.len() * ys.len() * zs.len());
        for &x in &xs {
            for &y in &ys {
                for &z in &zs {
                    grid.push([x, y, z]);
                }
            }
        }
        grid
    }

    pub fn grid_locations(&self) -> Vec<Option<usize>> {
        let mut lookup: HashMap<[u64; 3], usize> = HashMap::with_capacity(self.points.len());
        for p in &self.points {
            lookup.entry(coord_key(p.coords())).or_insert(p.index);
        }
        self.full_grid()
            .into_iter()
            .map(|cell| lookup.get(&coord_key(cell)).copied())
            .collect()
    }

    pub fn relative_positions(&self) -> Vec<RelativePosition> {
        let unique = Axis::ALL.map(|axis| self.unique_coords(axis));
        let Some(bbox) = self.bounding_box() else {
            return Vec::new();
        };
        self.points
            .iter()
            .map(|p| {
                let mut grid = [0usize; 3];
                let mut scaled = [0.0f64; 3];
                for axis in Axis::ALL {
                    let i = axis.index();
                    let v = p.coord(axis);
                    grid[i] = unique[i]
                        .iter()
                        .position(|&u| u == v)
                        .map_or(0, |pos| pos + 1);
                    let span = bbox.span(axis);
                    if span != 0.0 {
                        scaled[i] = round_to((v - bbox.min[i]) / span, 3);
                    }
                }
                RelativePosition { grid, scaled }
            })
            .collect()
    }

    pub fn summary(&self) -> GridSummary {
        let unique_counts = self.unique_counts();
        GridSummary {
            total_points: self.len(),
            extents: self.bounding_box(),
            unique_counts,
            max_grid_size: unique_counts.iter().product(),
            uniform_spacing: self.is_uniform(),
        }
    }
}

impl fmt::Display for GridSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "The total number of grid points is {}.", self.total_points)?;
        match &self.extents {
            Some(bbox) => writeln!(
                f,
                "Dimension limits: X:{:?}, Y:{:?}, Z:{:?}.",
                bbox.extent(Axis::X),
                bbox.extent(Axis::Y),
                bbox.extent(Axis::Z)
            )?,
            None => writeln!(f, "Dimension limits: none.")?,
        }
        let [ux, uy, uz] = self.unique_counts;
        writeln!(
            f,
            "Unique number of points in each dimension(X,Y,Z):({},{},{}).",
            ux, uy, uz
        )?;
        writeln!(f, "Maximum possible grid size: {}.", self.max_grid_size)?;
        write!(f, "Uniformly spaced grid points:{}", self.uniform_spacing)
    }
}

impl fmt::Display for PointGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

pub fn count_points(path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DaylightError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path).map_err(|e| DaylightError::io(path, e))?;
    let mut count = 0;
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            tracing::warn!(path = %path.display(), line = idx + 1, "blank line in points file");
        } else {
            count += 1;
        }
    }
    Ok(count)
}

// -0.0 and 0.0 must hash alike.
fn coord_key(c: [f64; 3]) -> [u64; 3] {
    c.map(|v| (v + 0.0).to_bits())
}
