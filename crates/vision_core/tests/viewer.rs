use data_contracts::GraspDetection;
use image::{Rgb, RgbImage};
use vision_core::palette::{COLOR_POOL, GRASP_OPENING_COLOR, GRASP_WIDTH_COLOR};
use vision_core::{Canvas, DataViewer, RenderError, Typeface};

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Stroke((i32, i32), (i32, i32), Rgb<u8>),
    Fill((i32, i32), (i32, i32), Rgb<u8>),
    Line((i32, i32), (i32, i32), Rgb<u8>),
    Text((i32, i32), String),
}

#[derive(Debug, Default)]
struct Recorder {
    shapes: Vec<Shape>,
}

impl Recorder {
    fn strokes(&self) -> Vec<&Shape> {
        self.shapes
            .iter()
            .filter(|s| matches!(s, Shape::Stroke(..)))
            .collect()
    }

    fn lines(&self) -> Vec<&Shape> {
        self.shapes
            .iter()
            .filter(|s| matches!(s, Shape::Line(..)))
            .collect()
    }

    fn texts(&self) -> Vec<String> {
        self.shapes
            .iter()
            .filter_map(|s| match s {
                Shape::Text(_, t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for Recorder {
    fn stroke_rect(&mut self, a: (i32, i32), b: (i32, i32), color: Rgb<u8>, _t: u32) {
        self.shapes.push(Shape::Stroke(a, b, color));
    }

    fn fill_rect(&mut self, a: (i32, i32), b: (i32, i32), color: Rgb<u8>) {
        self.shapes.push(Shape::Fill(a, b, color));
    }

    fn line(&mut self, a: (i32, i32), b: (i32, i32), color: Rgb<u8>, _t: u32) {
        self.shapes.push(Shape::Line(a, b, color));
    }

    fn text(&mut self, origin: (i32, i32), text: &str, _color: Rgb<u8>, _face: &Typeface) {
        self.shapes.push(Shape::Text(origin, text.to_string()));
    }
}

fn viewer() -> DataViewer {
    DataViewer::new(vec![
        "__background__".into(),
        "box".into(),
        "banana".into(),
        "cup".into(),
    ])
    .unwrap()
}

const GRASP_A: [f32; 8] = [20.0, 20.0, 60.0, 20.0, 60.0, 40.0, 20.0, 40.0];
const GRASP_B: [f32; 8] = [70.0, 10.0, 90.0, 30.0, 80.0, 40.0, 60.0, 20.0];

#[test]
fn sentinel_rows_draw_nothing() {
    let mut rec = Recorder::default();
    viewer()
        .draw_object_detections(
            &mut rec,
            &[[0.0, 4.0, 9.0, 9.0, 1.0], [5.5, 6.0, 30.0, 40.0, 2.0]],
            None,
        )
        .unwrap();
    assert_eq!(
        rec.strokes(),
        vec![&Shape::Stroke((5, 6), (30, 40), COLOR_POOL[2])]
    );
    assert_eq!(rec.texts(), vec!["banana".to_string()]);
}

#[test]
fn same_class_same_color_across_calls() {
    let v = viewer();
    let mut first = Recorder::default();
    let mut second = Recorder::default();
    v.draw_object_detections(&mut first, &[[10.0, 10.0, 20.0, 20.0, 3.0]], None)
        .unwrap();
    v.draw_object_detections(&mut second, &[[50.0, 50.0, 80.0, 90.0, 3.0]], None)
        .unwrap();
    let color = |rec: &Recorder| match rec.strokes()[0] {
        Shape::Stroke(_, _, c) => *c,
        _ => unreachable!(),
    };
    assert_eq!(color(&first), color(&second));
    assert_eq!(Some(color(&first)), v.class_color("cup"));

    let other = viewer();
    assert_eq!(other.class_color("cup"), v.class_color("cup"));
}

#[test]
fn owners_are_numbered_over_valid_objects() {
    let mut rec = Recorder::default();
    let objects = [
        [12.0, 15.0, 40.0, 60.0, 1.0],
        [-1.0, 0.0, 0.0, 0.0, 0.0],
        [50.0, 15.0, 90.0, 60.0, 3.0],
    ];
    viewer()
        .draw_grasps_with_owners(&mut rec, &objects, &[GRASP_A, [0.0; 8], GRASP_B], &[2, 7])
        .unwrap();
    assert_eq!(
        rec.texts(),
        vec![
            "box ind:1".to_string(),
            "cup ind:2".to_string(),
            "2".to_string(),
            "7".to_string(),
        ]
    );
    // Objects are drawn before grasps.
    let first_line = rec
        .shapes
        .iter()
        .position(|s| matches!(s, Shape::Line(..)))
        .unwrap();
    let last_stroke = rec
        .shapes
        .iter()
        .rposition(|s| matches!(s, Shape::Stroke(..)))
        .unwrap();
    assert!(last_stroke < first_line);
}

#[test]
fn grasp_edges_alternate_colors() {
    let mut rec = Recorder::default();
    let grasp = GraspDetection::from_row(&GRASP_A).unwrap();
    viewer().draw_grasp(&mut rec, &grasp, None);
    assert_eq!(
        rec.lines(),
        vec![
            &Shape::Line((20, 20), (60, 20), GRASP_OPENING_COLOR),
            &Shape::Line((60, 20), (60, 40), GRASP_WIDTH_COLOR),
            &Shape::Line((60, 40), (20, 40), GRASP_OPENING_COLOR),
            &Shape::Line((20, 40), (20, 20), GRASP_WIDTH_COLOR),
        ]
    );
    assert!(rec.texts().is_empty());
}

#[test]
fn grasp_label_is_centered() {
    let mut rec = Recorder::default();
    let grasp = GraspDetection::from_row(&GRASP_A).unwrap();
    viewer().draw_grasp(&mut rec, &grasp, Some("12"));
    // Center (40, 30), two characters at 17 px each.
    assert!(rec
        .shapes
        .contains(&Shape::Fill((23, 30), (57, 55), Rgb([255, 0, 0]))));
    assert!(rec.shapes.contains(&Shape::Text((23, 32), "12".into())));
}

#[test]
fn all_sentinel_rows_leave_image_untouched() {
    let original = RgbImage::from_fn(64, 48, |x, y| Rgb([x as u8, y as u8, 7]));
    let mut img = original.clone();
    viewer()
        .draw_object_detections(
            &mut img,
            &[[0.0, 10.0, 20.0, 20.0, 1.0], [-3.0, 1.0, 2.0, 3.0, 2.0]],
            None,
        )
        .unwrap();
    assert_eq!(img, original);
}

#[test]
fn box_pixels_land_on_image() {
    let mut img = RgbImage::new(64, 64);
    let color = COLOR_POOL[1];
    viewer()
        .with_typeface(Typeface::blank())
        .draw_box(&mut img, [10, 10, 30, 50], color, "box");
    // Outline below the label strip, both border pixels.
    assert_eq!(img.get_pixel(10, 45), &color);
    assert_eq!(img.get_pixel(11, 45), &color);
    assert_eq!(img.get_pixel(30, 45), &color);
    assert_eq!(img.get_pixel(20, 50), &color);
    // Strip is filled, interior below it is not.
    assert_eq!(img.get_pixel(20, 20), &color);
    assert_eq!(img.get_pixel(20, 45), &Rgb([0, 0, 0]));
}

#[test]
fn grasp_pixels_use_edge_colors() {
    let mut img = RgbImage::new(100, 60);
    viewer()
        .draw_grasp_detections(&mut img, &[GRASP_A], None)
        .unwrap();
    assert_eq!(img.get_pixel(40, 20), &GRASP_OPENING_COLOR);
    assert_eq!(img.get_pixel(60, 30), &GRASP_WIDTH_COLOR);
    assert_eq!(img.get_pixel(40, 30), &Rgb([0, 0, 0]));
}

#[test]
fn unknown_class_draws_nothing() {
    let mut rec = Recorder::default();
    let err = viewer()
        .draw_object_detections(
            &mut rec,
            &[[5.0, 5.0, 9.0, 9.0, 1.0], [5.0, 5.0, 9.0, 9.0, 12.0]],
            None,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RenderError::UnknownClass {
            class_id: 12,
            num_classes: 4
        }
    ));
    assert!(rec.shapes.is_empty());
}

#[test]
fn short_group_indices_rejected() {
    let mut rec = Recorder::default();
    let err = viewer()
        .draw_grasp_detections(&mut rec, &[GRASP_A, GRASP_B], Some(&[1]))
        .unwrap_err();
    assert!(matches!(
        err,
        RenderError::MissingIndex {
            what: "group",
            indices: 1,
            rows: 2
        }
    ));
    assert!(rec.shapes.is_empty());
}

#[test]
fn relationship_tree_is_not_implemented() {
    let mut img = RgbImage::new(4, 4);
    assert!(matches!(
        viewer().draw_mrt(&mut img),
        Err(RenderError::NotImplemented(_))
    ));
}

#[test]
fn palette_bounds_class_count() {
    let classes: Vec<String> = (0..41).map(|i| format!("c{i}")).collect();
    assert!(matches!(
        DataViewer::new(classes),
        Err(RenderError::TooManyClasses(41))
    ));
}

#[test]
fn default_typeface_writes_label_text() {
    let color = COLOR_POOL[2];
    let mut plain = RgbImage::new(120, 80);
    viewer()
        .with_typeface(Typeface::blank())
        .draw_box(&mut plain, [10, 10, 110, 60], color, "banana");
    let mut labeled = RgbImage::new(120, 80);
    viewer().draw_box(&mut labeled, [10, 10, 110, 60], color, "banana");

    let changed: Vec<(u32, u32)> = labeled
        .enumerate_pixels()
        .filter(|(x, y, p)| plain.get_pixel(*x, *y) != *p)
        .map(|(x, y, _)| (x, y))
        .collect();
    assert!(!changed.is_empty());
    assert!(changed.iter().all(|&(x, y)| (10..=110).contains(&x) && (10..=40).contains(&y)));
    // The strip color has no blue; white glyph pixels do.
    assert!(changed.iter().any(|&(x, y)| labeled.get_pixel(x, y)[2] > 200));
}

#[test]
fn far_out_coordinates_are_clipped() {
    let v = viewer();
    let mut img = RgbImage::new(64, 48);
    v.draw_object_detections(&mut img, &[[5.0, 5.0, -3.0e9, 20.0, 0.0]], None)
        .unwrap();
    v.draw_grasp_detections(
        &mut img,
        &[[3.0e9, 1.0, 2.0, 2.0, 3.0e9, 3.0, 1.0, 4.0]],
        Some(&[1]),
    )
    .unwrap();
    v.draw_grasps_with_owners(
        &mut img,
        &[[4.0e10, 4.0e10, 5.0e10, 5.0e10, 1.0]],
        &[[1.0, -2.0e9, 2.0e9, -2.0e9, 2.0e9, 2.0e9, 1.0, 2.0e9]],
        &[1],
    )
    .unwrap();

    // The visible part of the first box still reaches the image.
    assert_eq!(img.get_pixel(0, 20), &COLOR_POOL[0]);
}
