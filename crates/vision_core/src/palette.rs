use image::Rgb;

/// Fixed class palette; class `i` of a viewer's class list draws with entry `i`.
pub const COLOR_POOL: [Rgb<u8>; 40] = [
    Rgb([255, 207, 136]),
    Rgb([68, 187, 92]),
    Rgb([153, 255, 0]),
    Rgb([68, 187, 187]),
    Rgb([0, 153, 255]),
    Rgb([187, 68, 163]),
    Rgb([255, 119, 119]),
    Rgb([116, 68, 187]),
    Rgb([68, 187, 163]),
    Rgb([163, 187, 68]),
    Rgb([0, 204, 255]),
    Rgb([68, 187, 140]),
    Rgb([204, 0, 255]),
    Rgb([255, 204, 0]),
    Rgb([102, 0, 255]),
    Rgb([255, 0, 0]),
    Rgb([68, 140, 187]),
    Rgb([187, 187, 68]),
    Rgb([0, 255, 153]),
    Rgb([119, 255, 146]),
    Rgb([187, 163, 68]),
    Rgb([187, 140, 68]),
    Rgb([255, 153, 0]),
    Rgb([255, 255, 0]),
    Rgb([153, 0, 255]),
    Rgb([0, 255, 204]),
    Rgb([68, 116, 187]),
    Rgb([0, 255, 51]),
    Rgb([187, 68, 68]),
    Rgb([140, 187, 68]),
    Rgb([68, 163, 187]),
    Rgb([187, 116, 68]),
    Rgb([163, 68, 187]),
    Rgb([204, 255, 0]),
    Rgb([255, 0, 204]),
    Rgb([0, 255, 255]),
    Rgb([140, 68, 187]),
    Rgb([0, 102, 255]),
    Rgb([153, 214, 255]),
    Rgb([255, 102, 0]),
];

/// Grasp edges 0-1 and 2-3.
pub const GRASP_OPENING_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
/// Grasp edges 1-2 and 3-0.
pub const GRASP_WIDTH_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const GRASP_LABEL_BG: Rgb<u8> = Rgb([255, 0, 0]);
pub const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
