//! Detection viewer: object boxes and oriented grasp rectangles.

use data_contracts::{
    compact_grasps, compact_objects, GraspDetection, ObjectDetection, GRASP_ROW_LEN,
    OBJECT_ROW_LEN,
};
use image::Rgb;
use tracing::debug;

use crate::canvas::{Canvas, Typeface};
use crate::error::RenderError;
use crate::palette::{
    COLOR_POOL, GRASP_LABEL_BG, GRASP_OPENING_COLOR, GRASP_WIDTH_COLOR, TEXT_COLOR,
};

const LINE_THICKNESS: u32 = 2;
/// Height of a label strip.
const LABEL_HEIGHT: i32 = 25;
/// Distance from a strip's top edge to its text.
const LABEL_TEXT_OFFSET: i32 = 2;
/// Grasp label strips are this wide per character.
const GRASP_LABEL_CHAR_WIDTH: i32 = 17;

/// Draws detections with a deterministic color per class.
#[derive(Debug, Clone)]
pub struct DataViewer {
    classes: Vec<String>,
    colors: Vec<Rgb<u8>>,
    typeface: Typeface,
}

impl DataViewer {
    pub fn new(classes: Vec<String>) -> Result<Self, RenderError> {
        if classes.len() > COLOR_POOL.len() {
            return Err(RenderError::TooManyClasses(classes.len()));
        }
        let colors = COLOR_POOL[..classes.len()].to_vec();
        Ok(Self {
            classes,
            colors,
            typeface: Typeface::default(),
        })
    }

    pub fn with_typeface(mut self, typeface: Typeface) -> Self {
        self.typeface = typeface;
        self
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn class_index(&self, name: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == name)
    }

    pub fn class_color(&self, name: &str) -> Option<Rgb<u8>> {
        self.class_index(name).map(|i| self.colors[i])
    }

    fn class_entry(&self, class_id: i32) -> Result<(&str, Rgb<u8>), RenderError> {
        usize::try_from(class_id)
            .ok()
            .and_then(|i| Some((self.classes.get(i)?.as_str(), self.colors[i])))
            .ok_or(RenderError::UnknownClass {
                class_id,
                num_classes: self.classes.len(),
            })
    }

    /// Box outline plus a filled label strip along its top edge.
    pub fn draw_box<'c, C: Canvas>(
        &self,
        canvas: &'c mut C,
        bbox: [i32; 4],
        color: Rgb<u8>,
        label: &str,
    ) -> &'c mut C {
        let [x0, y0, x1, y1] = bbox;
        canvas.stroke_rect((x0, y0), (x1, y1), color, LINE_THICKNESS);
        canvas.fill_rect((x0, y0), (x1, y0.saturating_add(LABEL_HEIGHT)), color);
        canvas.text(
            (x0, y0.saturating_add(LABEL_TEXT_OFFSET)),
            label,
            TEXT_COLOR,
            &self.typeface,
        );
        canvas
    }

    /// Four edges alternating opening/width colors, with an optional centered label.
    pub fn draw_grasp<'c, C: Canvas>(
        &self,
        canvas: &'c mut C,
        grasp: &GraspDetection,
        label: Option<&str>,
    ) -> &'c mut C {
        for j in 0..4 {
            let color = if j % 2 == 0 {
                GRASP_OPENING_COLOR
            } else {
                GRASP_WIDTH_COLOR
            };
            let (from, to) = grasp.edge(j);
            canvas.line(from, to, color, LINE_THICKNESS);
        }

        if let Some(label) = label {
            let (cx, cy) = grasp.center();
            let chars = i32::try_from(label.chars().count()).unwrap_or(i32::MAX);
            let half = GRASP_LABEL_CHAR_WIDTH.saturating_mul(chars) / 2;
            let left = cx.saturating_sub(half);
            canvas.fill_rect(
                (left, cy),
                (cx.saturating_add(half), cy.saturating_add(LABEL_HEIGHT)),
                GRASP_LABEL_BG,
            );
            canvas.text(
                (left, cy.saturating_add(LABEL_TEXT_OFFSET)),
                label,
                TEXT_COLOR,
                &self.typeface,
            );
        }
        canvas
    }

    /// Draw every non-sentinel `[x0, y0, x1, y1, class_id]` row.
    ///
    /// `owners[i]` labels the `i`-th valid row as `"<class> ind:<owner>"`.
    /// Nothing is drawn if any row or index is invalid.
    pub fn draw_object_detections<'c, C: Canvas>(
        &self,
        canvas: &'c mut C,
        detections: &[[f32; OBJECT_ROW_LEN]],
        owners: Option<&[usize]>,
    ) -> Result<&'c mut C, RenderError> {
        let dets = compact_objects(detections);
        debug!(rows = detections.len(), valid = dets.len(), "drawing object detections");
        self.draw_objects(canvas, &dets, owners)
    }

    fn draw_objects<'c, C: Canvas>(
        &self,
        canvas: &'c mut C,
        dets: &[ObjectDetection],
        owners: Option<&[usize]>,
    ) -> Result<&'c mut C, RenderError> {
        check_indices("owner", owners, dets.len())?;
        let mut labeled = Vec::with_capacity(dets.len());
        for (i, det) in dets.iter().enumerate() {
            let (name, color) = self.class_entry(det.class_id)?;
            let label = match owners {
                Some(owners) => format!("{name} ind:{}", owners[i]),
                None => name.to_string(),
            };
            labeled.push((det.bbox, color, label));
        }
        for (bbox, color, label) in &labeled {
            self.draw_box(canvas, *bbox, *color, label);
        }
        Ok(canvas)
    }

    /// Draw every non-sentinel 8-coordinate grasp row, labeled with `groups[i]` if given.
    pub fn draw_grasp_detections<'c, C: Canvas>(
        &self,
        canvas: &'c mut C,
        detections: &[[f32; GRASP_ROW_LEN]],
        groups: Option<&[usize]>,
    ) -> Result<&'c mut C, RenderError> {
        let grasps = compact_grasps(detections);
        debug!(rows = detections.len(), valid = grasps.len(), "drawing grasp detections");
        check_indices("group", groups, grasps.len())?;
        for (i, grasp) in grasps.iter().enumerate() {
            let label = groups.map(|g| g[i].to_string());
            self.draw_grasp(canvas, grasp, label.as_deref());
        }
        Ok(canvas)
    }

    /// Objects first with owner indices `1..=N` over valid rows, then grasps
    /// labeled with the index of the object that owns them.
    pub fn draw_grasps_with_owners<'c, C: Canvas>(
        &self,
        canvas: &'c mut C,
        objects: &[[f32; OBJECT_ROW_LEN]],
        grasps: &[[f32; GRASP_ROW_LEN]],
        groups: &[usize],
    ) -> Result<&'c mut C, RenderError> {
        let dets = compact_objects(objects);
        check_indices("group", Some(groups), compact_grasps(grasps).len())?;
        for det in &dets {
            self.class_entry(det.class_id)?;
        }
        let owners: Vec<usize> = (1..=dets.len()).collect();
        let canvas = self.draw_objects(canvas, &dets, Some(&owners))?;
        self.draw_grasp_detections(canvas, grasps, Some(groups))
    }

    /// Manipulation relationship tree rendering.
    pub fn draw_mrt<'c, C: Canvas>(&self, _canvas: &'c mut C) -> Result<&'c mut C, RenderError> {
        Err(RenderError::NotImplemented("manipulation relationship tree"))
    }
}

fn check_indices(
    what: &'static str,
    indices: Option<&[usize]>,
    rows: usize,
) -> Result<(), RenderError> {
    match indices {
        Some(indices) if indices.len() < rows => Err(RenderError::MissingIndex {
            what,
            indices: indices.len(),
            rows,
        }),
        _ => Ok(()),
    }
}
