//! Rainfall hit points and the grid that holds them.

use skullmap_math::{Point3, Vec3};

/// One accepted rainfall sample.
///
/// `id` is the sample's point index in the extracted quad mesh. `normal`
/// stays zero unless the point anchors a complete 2x2 neighbourhood whose
/// plane fit succeeded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitPoint {
    /// Point index in the output mesh.
    pub id: u32,
    /// Sample position.
    pub position: Point3,
    /// Fitted unit normal, or zero.
    pub normal: Vec3,
}

impl HitPoint {
    /// A hit point with no normal yet.
    pub fn new(id: u32, position: Point3) -> Self {
        Self {
            id,
            position,
            normal: Vec3::zeros(),
        }
    }

    /// Whether a normal has been fitted.
    pub fn has_normal(&self) -> bool {
        self.normal != Vec3::zeros()
    }
}

/// Rows (z samples) by columns (y samples) of optional hit points.
#[derive(Debug, Clone, PartialEq)]
pub struct HitPointMatrix {
    rows: usize,
    columns: usize,
    cells: Vec<Option<HitPoint>>,
}

impl HitPointMatrix {
    /// An all-empty matrix.
    ///
    /// # Panics
    ///
    /// Panics if `rows * columns` overflows `usize`. Grids from
    /// [`RainfallGrid::new`](crate::RainfallGrid::new) never do.
    pub fn new(rows: usize, columns: usize) -> Self {
        let len = rows
            .checked_mul(columns)
            .unwrap_or_else(|| panic!("{rows}x{columns} matrix overflows usize"));
        Self {
            rows,
            columns,
            cells: vec![None; len],
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        self.columns
    }

    fn index(&self, row: usize, column: usize) -> usize {
        assert!(
            row < self.rows && column < self.columns,
            "cell ({row}, {column}) outside {}x{} matrix",
            self.rows,
            self.columns
        );
        row * self.columns + column
    }

    /// The hit point at a cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell is outside the matrix.
    pub fn get(&self, row: usize, column: usize) -> Option<&HitPoint> {
        self.cells[self.index(row, column)].as_ref()
    }

    /// Mutable access to the hit point at a cell.
    pub fn get_mut(&mut self, row: usize, column: usize) -> Option<&mut HitPoint> {
        let i = self.index(row, column);
        self.cells[i].as_mut()
    }

    /// Store a hit point at a cell.
    pub fn set(&mut self, row: usize, column: usize, hit: HitPoint) {
        let i = self.index(row, column);
        self.cells[i] = Some(hit);
    }

    /// Number of occupied cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Every hit point, ordered row by row from row 0.
    pub fn flatten(&self) -> Vec<HitPoint> {
        self.cells.iter().flatten().copied().collect()
    }

    /// Hit point positions indexed by id.
    ///
    /// Ids must be `0..count()`, each used once, as assigned by the rainfall
    /// cast.
    pub fn positions_by_id(&self) -> Vec<Point3> {
        let mut positions = vec![Point3::origin(); self.count()];
        for hit in self.cells.iter().flatten() {
            positions[hit.id as usize] = hit.position;
        }
        positions
    }
}
