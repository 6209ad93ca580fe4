//! Geometry properties checked over grids of source sizes and orientations

use duo_stitch::domain::composition::{Canvas, Segment};
use duo_stitch::domain::geometry::{
    crop_rect, oriented_crop_rect, placement_transform, AffineTransform, Rect, Size,
};
use duo_stitch::domain::recording::StreamId;

const TOLERANCE: f64 = 1e-6;

const SOURCE_SIZES: [(f64, f64); 8] = [
    (1920.0, 1080.0),
    (1080.0, 1920.0),
    (1280.0, 720.0),
    (640.0, 480.0),
    (480.0, 640.0),
    (1000.0, 1000.0),
    (3840.0, 2160.0),
    (333.0, 777.0),
];

const CANVASES: [(u32, u32); 4] = [(1080, 1920), (720, 1280), (1920, 1080), (400, 400)];

fn orientations() -> Vec<(&'static str, AffineTransform)> {
    let mirror = AffineTransform::mirror_horizontal();
    vec![
        ("identity", AffineTransform::IDENTITY),
        ("mirror", mirror),
        ("cw90", AffineTransform::quarter_turns_clockwise(1)),
        ("180", AffineTransform::quarter_turns_clockwise(2)),
        ("ccw90", AffineTransform::quarter_turns_clockwise(3)),
        (
            "cw90+mirror",
            AffineTransform::quarter_turns_clockwise(1).then(&mirror),
        ),
        (
            "ccw90+mirror",
            AffineTransform::quarter_turns_clockwise(3).then(&mirror),
        ),
        ("vflip", AffineTransform::scale(1.0, -1.0)),
        // Hardware transforms carry a translation that placement ignores
        (
            "cw90+translation",
            AffineTransform::new(0.0, 1.0, -1.0, 0.0, 1080.0, 0.0),
        ),
    ]
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < TOLERANCE
}

#[test]
fn crop_stays_inside_source_and_trims_one_axis() {
    for (w, h) in SOURCE_SIZES {
        let natural = Size::new(w, h);
        for (cw, ch) in CANVASES {
            let target = Canvas::new(cw, ch, 30).unwrap().segment_size();
            let crop = crop_rect(natural, target);

            assert!(crop.min_x() >= 0.0 && crop.min_y() >= 0.0, "{natural} {target}: {crop:?}");
            assert!(crop.max_x() <= w && crop.max_y() <= h, "{natural} {target}: {crop:?}");
            assert!(
                approx(crop.size.width, w) || approx(crop.size.height, h),
                "at most one dimension is trimmed: {natural} {target}: {crop:?}"
            );
            for v in [crop.origin.x, crop.origin.y, crop.size.width, crop.size.height] {
                assert_eq!(v, v.round(), "whole pixels: {crop:?}");
            }
        }
    }
}

#[test]
fn crop_is_centered_within_a_pixel() {
    for (w, h) in SOURCE_SIZES {
        let natural = Size::new(w, h);
        let crop = crop_rect(natural, Size::new(1080.0, 960.0));
        let left = crop.min_x();
        let right = w - crop.max_x();
        let bottom = crop.min_y();
        let top = h - crop.max_y();
        assert!((left - right).abs() <= 1.0, "{natural}: {crop:?}");
        assert!((bottom - top).abs() <= 1.0, "{natural}: {crop:?}");
    }
}

#[test]
fn crop_matches_target_aspect_within_rounding() {
    for (w, h) in SOURCE_SIZES {
        let natural = Size::new(w, h);
        let target = Size::new(1080.0, 960.0);
        let crop = crop_rect(natural, target);
        let aspect = crop.size.width / crop.size.height;
        // Outward rounding adds at most one pixel per edge
        let slack = 2.0 / crop.size.height.min(crop.size.width);
        assert!(
            (aspect - 1.125).abs() <= slack * 1.125 + TOLERANCE,
            "{natural}: aspect {aspect}"
        );
    }
}

#[test]
fn placed_crop_fills_its_segment_exactly() {
    for (cw, ch) in CANVASES {
        let canvas = Canvas::new(cw, ch, 30).unwrap();
        let target = canvas.segment_size();
        for stream in StreamId::ALL {
            let segment = Segment::for_stream(stream);
            let offset = segment.destination_offset(&canvas);
            let expected = Rect::new(0.0, offset, target.width, target.height);

            for (w, h) in SOURCE_SIZES {
                let natural = Size::new(w, h);
                for (name, orientation) in orientations() {
                    let crop = oriented_crop_rect(natural, &orientation, target);
                    let t = placement_transform(
                        natural,
                        &orientation,
                        crop,
                        target,
                        canvas.size(),
                        offset,
                    );
                    let placed = t.bounding_box(&crop);
                    let ctx = format!("{name} {natural} on {canvas} {stream}: {placed:?}");

                    assert!(approx(placed.min_x(), expected.min_x()), "{ctx}");
                    assert!(approx(placed.max_x(), expected.max_x()), "{ctx}");
                    assert!(approx(placed.min_y(), expected.min_y()), "{ctx}");
                    assert!(approx(placed.max_y(), expected.max_y()), "{ctx}");
                }
            }
        }
    }
}

#[test]
fn segments_split_the_canvas_without_overlap() {
    for (cw, ch) in CANVASES {
        let canvas = Canvas::new(cw, ch, 30).unwrap();
        let half = canvas.segment_size().height;
        assert_eq!(Segment::Bottom.destination_offset(&canvas), 0.0);
        assert_eq!(Segment::Top.destination_offset(&canvas), half);
        assert_eq!(half * 2.0, f64::from(ch));
    }
    assert_eq!(Segment::for_stream(StreamId::Front), Segment::Bottom);
    assert_eq!(Segment::for_stream(StreamId::Back), Segment::Top);
}

#[test]
fn flips_survive_placement() {
    let canvas = Canvas::default();
    let target = canvas.segment_size();
    let natural = Size::new(1920.0, 1080.0);

    for (name, orientation) in orientations() {
        let crop = oriented_crop_rect(natural, &orientation, target);
        let t = placement_transform(natural, &orientation, crop, target, canvas.size(), 0.0);
        let linear = orientation.linear();
        // Scaling is positive, so the orientation's signs carry through
        assert_eq!(
            t.horizontal_sign() < 0.0,
            linear.horizontal_sign() < 0.0,
            "{name}"
        );
        assert_eq!(t.vertical_sign() < 0.0, linear.vertical_sign() < 0.0, "{name}");
    }
}

#[test]
fn degenerate_sources_never_panic() {
    let canvas = Canvas::default();
    let target = canvas.segment_size();
    for natural in [
        Size::ZERO,
        Size::new(0.0, 1080.0),
        Size::new(-5.0, 10.0),
        Size::new(f64::NAN, 100.0),
    ] {
        let crop = crop_rect(natural, target);
        if !natural.width.is_nan() {
            assert_eq!(crop, Rect::from_size(natural));
        }
        let _ = placement_transform(
            natural,
            &AffineTransform::IDENTITY,
            crop,
            target,
            canvas.size(),
            0.0,
        );
    }
}
