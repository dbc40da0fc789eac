/// Columns in an object detection row: `x0, y0, x1, y1, class_id`.
pub const OBJECT_ROW_LEN: usize = 5;
/// Columns in a grasp detection row: four `(x, y)` corners in drawing order.
pub const GRASP_ROW_LEN: usize = 8;
/// Converted coordinates are clamped to `[-COORD_LIMIT, COORD_LIMIT]`.
pub const COORD_LIMIT: i32 = 1 << 20;

/// Axis-aligned box in integer pixel coordinates plus its class id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectDetection {
    pub bbox: [i32; 4],
    pub class_id: i32,
}

impl ObjectDetection {
    /// Convert a raw row. Returns `None` for sentinel rows (first coordinate `<= 0`).
    ///
    /// Coordinates and the class id are truncated toward zero.
    pub fn from_row(row: &[f32; OBJECT_ROW_LEN]) -> Option<Self> {
        if !is_valid_row(row) {
            return None;
        }
        Some(Self {
            bbox: [
                to_pixel(row[0]),
                to_pixel(row[1]),
                to_pixel(row[2]),
                to_pixel(row[3]),
            ],
            class_id: row[4] as i32,
        })
    }
}

/// Oriented grasp rectangle as four corners in integer pixel coordinates.
///
/// Edges `0-1` and `2-3` are the gripper opening sides, `1-2` and `3-0` the
/// gripper width sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraspDetection {
    pub corners: [(i32, i32); 4],
}

impl GraspDetection {
    /// Convert a raw row. Returns `None` for sentinel rows (first coordinate `<= 0`).
    pub fn from_row(row: &[f32; GRASP_ROW_LEN]) -> Option<Self> {
        if !is_valid_row(row) {
            return None;
        }
        let mut corners = [(0, 0); 4];
        for (j, corner) in corners.iter_mut().enumerate() {
            *corner = (to_pixel(row[2 * j]), to_pixel(row[2 * j + 1]));
        }
        Some(Self { corners })
    }

    /// Edge `j` runs from corner `j` to corner `(j + 1) % 4`.
    pub fn edge(&self, j: usize) -> ((i32, i32), (i32, i32)) {
        (self.corners[j % 4], self.corners[(j + 1) % 4])
    }

    /// Midpoint of the diagonal between corners 0 and 2.
    pub fn center(&self) -> (i32, i32) {
        let (x0, y0) = self.corners[0];
        let (x2, y2) = self.corners[2];
        let mid = |a: i32, b: i32| ((i64::from(a) + i64::from(b)) / 2) as i32;
        (mid(x0, x2), mid(y0, y2))
    }
}

fn to_pixel(v: f32) -> i32 {
    (v as i32).clamp(-COORD_LIMIT, COORD_LIMIT)
}

fn is_valid_row(row: &[f32]) -> bool {
    row.first().is_some_and(|v| *v > 0.0) && row.iter().all(|v| v.is_finite())
}

/// Drop sentinel rows and convert the rest, preserving array order.
pub fn compact_objects(rows: &[[f32; OBJECT_ROW_LEN]]) -> Vec<ObjectDetection> {
    rows.iter().filter_map(ObjectDetection::from_row).collect()
}

/// Drop sentinel rows and convert the rest, preserving array order.
pub fn compact_grasps(rows: &[[f32; GRASP_ROW_LEN]]) -> Vec<GraspDetection> {
    rows.iter().filter_map(GraspDetection::from_row).collect()
}
