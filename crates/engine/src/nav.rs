use thiserror::Error;
use tracing::debug;

use crate::{NavigationService, Vec3};

const BLOCKED_CELL_CHAR: char = '#';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CellCoord {
    x: u32,
    y: u32,
}

#[derive(Debug, Error, PartialEq)]
pub enum NavigationError {
    #[error("grid is {width}x{height} but {actual} cells were supplied")]
    SizeMismatch {
        width: u32,
        height: u32,
        actual: usize,
    },
    #[error("cell size must be finite and positive, got {0}")]
    InvalidCellSize(f32),
    #[error("row {row} has {actual} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridNavigation {
    width: u32,
    height: u32,
    origin: Vec3,
    cell_size: f32,
    walkable: Vec<bool>,
}

impl GridNavigation {
    pub fn new(
        width: u32,
        height: u32,
        origin: Vec3,
        cell_size: f32,
        walkable: Vec<bool>,
    ) -> Result<Self, NavigationError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(NavigationError::InvalidCellSize(cell_size));
        }
        let expected = width as usize * height as usize;
        if walkable.len() != expected {
            return Err(NavigationError::SizeMismatch {
                width,
                height,
                actual: walkable.len(),
            });
        }
        Ok(Self {
            width,
            height,
            origin,
            cell_size,
            walkable,
        })
    }

    /// Builds a grid from text rows, `#` marking blocked cells. The first row
    /// is `y = 0`.
    pub fn from_rows(rows: &[&str], origin: Vec3, cell_size: f32) -> Result<Self, NavigationError> {
        let width = rows.first().map(|row| row.chars().count()).unwrap_or(0);
        let mut walkable = Vec::with_capacity(width * rows.len());
        for (row_index, row) in rows.iter().enumerate() {
            let columns = row.chars().count();
            if columns != width {
                return Err(NavigationError::RaggedRow {
                    row: row_index,
                    expected: width,
                    actual: columns,
                });
            }
            walkable.extend(row.chars().map(|cell| cell != BLOCKED_CELL_CHAR));
        }
        Self::new(width as u32, rows.len() as u32, origin, cell_size, walkable)
    }

    pub fn open(width: u32, height: u32, origin: Vec3, cell_size: f32) -> Result<Self, NavigationError> {
        let count = width as usize * height as usize;
        Self::new(width, height, origin, cell_size, vec![true; count])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn is_walkable_at(&self, world: Vec3) -> bool {
        self.world_to_cell(world)
            .is_some_and(|cell| self.is_walkable(cell))
    }

    fn world_to_cell(&self, world: Vec3) -> Option<CellCoord> {
        if !world.is_finite() {
            return None;
        }
        let cell_x = ((world.x - self.origin.x) / self.cell_size).floor();
        let cell_y = ((world.y - self.origin.y) / self.cell_size).floor();
        if cell_x < 0.0 || cell_y < 0.0 {
            return None;
        }
        let cell_x = cell_x as u32;
        let cell_y = cell_y as u32;
        if cell_x >= self.width || cell_y >= self.height {
            return None;
        }
        Some(CellCoord {
            x: cell_x,
            y: cell_y,
        })
    }

    fn cell_center_world(&self, cell: CellCoord, z: f32) -> Vec3 {
        Vec3::new(
            self.origin.x + (cell.x as f32 + 0.5) * self.cell_size,
            self.origin.y + (cell.y as f32 + 0.5) * self.cell_size,
            z,
        )
    }

    fn is_walkable(&self, cell: CellCoord) -> bool {
        self.index_of(cell)
            .and_then(|index| self.walkable.get(index))
            .copied()
            .unwrap_or(false)
    }

    fn index_of(&self, cell: CellCoord) -> Option<usize> {
        if cell.x >= self.width || cell.y >= self.height {
            return None;
        }
        Some(cell.y as usize * self.width as usize + cell.x as usize)
    }

    fn find_path_cells(&self, start: CellCoord, goal: CellCoord) -> Option<Vec<CellCoord>> {
        let start_index = self.index_of(start)?;
        let goal_index = self.index_of(goal)?;
        if !self.is_walkable(start) || !self.is_walkable(goal) {
            return None;
        }
        if start == goal {
            return Some(vec![start]);
        }

        let node_count = self.width as usize * self.height as usize;
        let mut closed = vec![false; node_count];
        let mut best_g = vec![u32::MAX; node_count];
        let mut parent = vec![None::<usize>; node_count];
        let mut open = Vec::new();
        let mut next_insertion = 0u64;

        let start_h = manhattan_distance(start, goal);
        open.push(OpenNode {
            cell: start,
            h_cost: start_h,
            f_cost: start_h,
            insertion_order: next_insertion,
        });
        next_insertion += 1;
        best_g[start_index] = 0;

        while !open.is_empty() {
            let current = open.swap_remove(pick_best_open_node_index(&open));
            let Some(current_index) = self.index_of(current.cell) else {
                continue;
            };
            if closed[current_index] {
                continue;
            }
            closed[current_index] = true;

            if current.cell == goal {
                return reconstruct_cell_path(&parent, self.width, start_index, goal_index);
            }

            let tentative_g = best_g[current_index].saturating_add(1);
            for neighbor in self.neighbors(current.cell).into_iter().flatten() {
                let Some(neighbor_index) = self.index_of(neighbor) else {
                    continue;
                };
                if closed[neighbor_index] || !self.is_walkable(neighbor) {
                    continue;
                }
                if tentative_g >= best_g[neighbor_index] {
                    continue;
                }

                best_g[neighbor_index] = tentative_g;
                parent[neighbor_index] = Some(current_index);
                let h_cost = manhattan_distance(neighbor, goal);
                open.push(OpenNode {
                    cell: neighbor,
                    h_cost,
                    f_cost: tentative_g.saturating_add(h_cost),
                    insertion_order: next_insertion,
                });
                next_insertion += 1;
            }
        }

        None
    }

    fn neighbors(&self, cell: CellCoord) -> [Option<CellCoord>; 4] {
        let north = (cell.y + 1 < self.height).then(|| CellCoord {
            x: cell.x,
            y: cell.y + 1,
        });
        let east = (cell.x + 1 < self.width).then(|| CellCoord {
            x: cell.x + 1,
            y: cell.y,
        });
        let south = cell.y.checked_sub(1).map(|y| CellCoord { x: cell.x, y });
        let west = cell.x.checked_sub(1).map(|x| CellCoord { x, y: cell.y });
        [north, east, south, west]
    }
}

impl NavigationService for GridNavigation {
    /// Waypoints run from `origin` through the centers of turning cells and end
    /// exactly at `destination`. Straight runs are collapsed.
    fn find_path(&self, origin: Vec3, destination: Vec3) -> Option<Vec<Vec3>> {
        let start = self.world_to_cell(origin)?;
        let goal = self.world_to_cell(destination)?;
        let cells = self.find_path_cells(start, goal)?;

        let mut waypoints = vec![origin];
        for window in cells.windows(3) {
            let incoming = (
                window[1].x as i64 - window[0].x as i64,
                window[1].y as i64 - window[0].y as i64,
            );
            let outgoing = (
                window[2].x as i64 - window[1].x as i64,
                window[2].y as i64 - window[1].y as i64,
            );
            if incoming != outgoing {
                waypoints.push(self.cell_center_world(window[1], destination.z));
            }
        }
        waypoints.push(destination);

        debug!(
            cells = cells.len(),
            waypoints = waypoints.len(),
            "grid_path_found"
        );
        Some(waypoints)
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    cell: CellCoord,
    h_cost: u32,
    f_cost: u32,
    insertion_order: u64,
}

fn pick_best_open_node_index(open: &[OpenNode]) -> usize {
    open.iter()
        .enumerate()
        .min_by_key(|(_, node)| open_node_order_key(**node))
        .map(|(index, _)| index)
        .unwrap_or(0)
}

fn open_node_order_key(node: OpenNode) -> (u32, u32, u32, u32, u64) {
    (
        node.f_cost,
        node.h_cost,
        node.cell.y,
        node.cell.x,
        node.insertion_order,
    )
}

fn reconstruct_cell_path(
    parent: &[Option<usize>],
    width: u32,
    start_index: usize,
    goal_index: usize,
) -> Option<Vec<CellCoord>> {
    let mut cursor = goal_index;
    let mut indices = vec![cursor];
    while cursor != start_index {
        cursor = parent.get(cursor).copied().flatten()?;
        indices.push(cursor);
    }
    indices.reverse();
    Some(
        indices
            .into_iter()
            .map(|index| CellCoord {
                x: index as u32 % width,
                y: index as u32 / width,
            })
            .collect(),
    )
}

fn manhattan_distance(a: CellCoord, b: CellCoord) -> u32 {
    a.x.abs_diff(b.x).saturating_add(a.y.abs_diff(b.y))
}
