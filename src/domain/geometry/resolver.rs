//! Crop and placement geometry for fitting a source frame into a canvas region.
//!
//! Both functions are pure and never fail: degenerate inputs degrade to a
//! full-frame crop or a partially built transform instead of dividing by zero.

use super::affine::{AffineTransform, Rect, Size};

/// Aspect-fill crop of a source frame for a target region.
///
/// Trims the excess dimension symmetrically about the center so the
/// remaining pixels match the target aspect ratio. Only one dimension is
/// ever trimmed. The result is rounded outward to whole pixels and clamped
/// to the source bounds.
///
/// Degenerate operands (zero, negative or NaN dimensions) return the full
/// natural rectangle.
pub fn crop_rect(natural: Size, target: Size) -> Rect {
    let full = Rect::from_size(natural);

    let (Some(source_aspect), Some(target_aspect)) = (natural.aspect_ratio(), target.aspect_ratio())
    else {
        return full;
    };

    let mut crop = full;
    if source_aspect > target_aspect {
        // Wider than the target: trim left/right at full height
        let width = natural.height * target_aspect;
        crop.origin.x = (natural.width - width) / 2.0;
        crop.size.width = width;
    } else if source_aspect < target_aspect {
        // Taller than the target: trim top/bottom at full width
        let height = natural.width / target_aspect;
        crop.origin.y = (natural.height - height) / 2.0;
        crop.size.height = height;
    }

    crop.integral().clamped_to(&full)
}

/// Aspect-fill crop for a source whose orientation may swap its axes.
///
/// The crop stays in natural (sensor) coordinates, sized so that it has the
/// target aspect ratio once the orientation is applied.
pub fn oriented_crop_rect(natural: Size, orientation: &AffineTransform, target: Size) -> Rect {
    if orientation.swaps_axes() {
        crop_rect(natural, Size::new(target.height, target.width))
    } else {
        crop_rect(natural, target)
    }
}

/// Transform mapping the cropped source region into its canvas region.
///
/// Composition order (non-commutative, applied first to last):
///
/// 1. translate so the crop origin becomes the origin
/// 2. apply the rotation/mirroring of the intrinsic orientation
/// 3. measure the cropped-and-oriented extent
/// 4. scale each axis so that extent matches `target`
/// 5. translate into the canvas: horizontally centered (zero for
///    full-width regions), vertically to `destination_offset`
/// 6. when an axis ends up negated by a flip or rotation, shift it by the
///    target extent on that axis so the content lands in `[0, target]`
///
/// The translation part of `orientation` is ignored: step 6 re-anchors the
/// oriented crop relative to the target region instead of the full frame.
pub fn placement_transform(
    natural: Size,
    orientation: &AffineTransform,
    crop: Rect,
    target: Size,
    canvas: Size,
    destination_offset: f64,
) -> AffineTransform {
    let crop = if crop.size.is_degenerate() {
        Rect::from_size(natural)
    } else {
        crop
    };

    let orientation = orientation.linear();
    let mut transform =
        AffineTransform::translation(-crop.origin.x, -crop.origin.y).then(&orientation);

    let effective = orientation.effective_size(crop.size);
    if effective.is_degenerate() || target.is_degenerate() {
        return transform;
    }

    let scale_x = target.width / effective.width;
    let scale_y = target.height / effective.height;
    transform = transform.then(&AffineTransform::scale(scale_x, scale_y));

    let mut final_x = (canvas.width - target.width).max(0.0) / 2.0;
    let mut final_y = destination_offset;

    if transform.horizontal_sign() < 0.0 {
        final_x += target.width;
    }
    if transform.vertical_sign() < 0.0 {
        final_y += target.height;
    }

    transform.then(&AffineTransform::translation(final_x, final_y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::Point;

    const TOLERANCE: f64 = 1e-6;

    fn assert_within(rect: &Rect, bounds: &Rect) {
        assert!(
            rect.min_x() >= bounds.min_x() - TOLERANCE
                && rect.min_y() >= bounds.min_y() - TOLERANCE
                && rect.max_x() <= bounds.max_x() + TOLERANCE
                && rect.max_y() <= bounds.max_y() + TOLERANCE,
            "{:?} not within {:?}",
            rect,
            bounds
        );
    }

    #[test]
    fn wide_source_is_cropped_left_and_right() {
        let crop = crop_rect(Size::new(1920.0, 1080.0), Size::new(1080.0, 960.0));
        assert_eq!(crop.origin.y, 0.0);
        assert_eq!(crop.size.height, 1080.0);
        // 1080 * 1.125 = 1215, centered at 352.5 and rounded outward
        assert_eq!(crop.origin.x, 352.0);
        assert_eq!(crop.size.width, 1216.0);
    }

    #[test]
    fn tall_source_is_cropped_top_and_bottom() {
        let crop = crop_rect(Size::new(1080.0, 1920.0), Size::new(1080.0, 960.0));
        assert_eq!(crop.origin.x, 0.0);
        assert_eq!(crop.size.width, 1080.0);
        assert_eq!(crop.origin.y, 480.0);
        assert_eq!(crop.size.height, 960.0);
    }

    #[test]
    fn equal_aspect_is_not_cropped() {
        let natural = Size::new(1280.0, 720.0);
        assert_eq!(
            crop_rect(natural, Size::new(640.0, 360.0)),
            Rect::from_size(natural)
        );
    }

    #[test]
    fn degenerate_inputs_return_full_frame() {
        let natural = Size::new(1920.0, 1080.0);
        assert_eq!(crop_rect(natural, Size::ZERO), Rect::from_size(natural));
        assert_eq!(
            crop_rect(natural, Size::new(100.0, 0.0)),
            Rect::from_size(natural)
        );
        let empty = Size::new(0.0, 1080.0);
        assert_eq!(
            crop_rect(empty, Size::new(1080.0, 960.0)),
            Rect::from_size(empty)
        );
    }

    #[test]
    fn unflipped_placement_fills_bottom_segment() {
        let natural = Size::new(1920.0, 1080.0);
        let canvas = Size::new(1080.0, 1920.0);
        let target = Size::new(1080.0, 960.0);
        let crop = crop_rect(natural, target);

        let t = placement_transform(
            natural,
            &AffineTransform::IDENTITY,
            crop,
            target,
            canvas,
            0.0,
        );

        let placed = t.bounding_box(&crop);
        assert!((placed.min_x() - 0.0).abs() < TOLERANCE);
        assert!((placed.max_x() - 1080.0).abs() < TOLERANCE);
        assert!((placed.min_y() - 0.0).abs() < TOLERANCE);
        assert!((placed.max_y() - 960.0).abs() < TOLERANCE);
    }

    #[test]
    fn mirrored_placement_is_compensated() {
        let natural = Size::new(1920.0, 1080.0);
        let canvas = Size::new(1080.0, 1920.0);
        let target = Size::new(1080.0, 960.0);
        let crop = crop_rect(natural, target);

        let t = placement_transform(
            natural,
            &AffineTransform::mirror_horizontal(),
            crop,
            target,
            canvas,
            960.0,
        );

        assert!(t.a < 0.0, "mirror should survive composition");
        let placed = t.bounding_box(&crop);
        assert_within(&placed, &Rect::new(0.0, 960.0, 1080.0, 960.0));
        assert!((placed.size.width - 1080.0).abs() < TOLERANCE);
        assert!((placed.size.height - 960.0).abs() < TOLERANCE);
    }

    #[test]
    fn mirror_maps_left_edge_to_right_edge() {
        let natural = Size::new(1080.0, 960.0);
        let crop = Rect::from_size(natural);
        let t = placement_transform(
            natural,
            &AffineTransform::mirror_horizontal(),
            crop,
            natural,
            Size::new(1080.0, 1920.0),
            0.0,
        );
        let left_top = t.apply_point(Point::ZERO);
        assert!((left_top.x - 1080.0).abs() < TOLERANCE);
        assert!(left_top.y.abs() < TOLERANCE);
    }

    #[test]
    fn rotated_placement_stays_in_segment() {
        // Landscape sensor with a portrait orientation, as phones record
        let natural = Size::new(1920.0, 1080.0);
        let canvas = Size::new(1080.0, 1920.0);
        let target = Size::new(1080.0, 960.0);
        // The hardware transform carries a translation that must be ignored
        let orientation = AffineTransform::new(0.0, 1.0, -1.0, 0.0, 1080.0, 0.0);
        let crop = oriented_crop_rect(natural, &orientation, target);

        let t = placement_transform(natural, &orientation, crop, target, canvas, 960.0);
        let placed = t.bounding_box(&crop);
        assert_within(&placed, &Rect::new(0.0, 960.0, 1080.0, 960.0));
        assert!((placed.size.width - 1080.0).abs() < TOLERANCE);
        assert!((placed.size.height - 960.0).abs() < TOLERANCE);
    }

    #[test]
    fn oriented_crop_uses_swapped_target_for_quarter_turns() {
        let natural = Size::new(1920.0, 1080.0);
        let target = Size::new(1080.0, 960.0);
        let crop = oriented_crop_rect(natural, &AffineTransform::quarter_turns_clockwise(1), target);
        // Upright the frame is 1080x1920; trimming its height to 1215
        // trims the sensor width instead
        assert_eq!(crop, crop_rect(natural, Size::new(960.0, 1080.0)));
        let upright = AffineTransform::quarter_turns_clockwise(1).effective_size(crop.size);
        assert!((upright.width / upright.height - 1.125).abs() < 0.01);

        assert_eq!(
            oriented_crop_rect(natural, &AffineTransform::mirror_horizontal(), target),
            crop_rect(natural, target)
        );
    }

    #[test]
    fn degenerate_crop_falls_back_to_natural_frame() {
        let natural = Size::new(100.0, 100.0);
        let t = placement_transform(
            natural,
            &AffineTransform::IDENTITY,
            Rect::default(),
            Size::new(50.0, 50.0),
            Size::new(50.0, 100.0),
            0.0,
        );
        let placed = t.bounding_box(&Rect::from_size(natural));
        assert_within(&placed, &Rect::new(0.0, 0.0, 50.0, 50.0));
    }

    #[test]
    fn degenerate_target_skips_scaling() {
        let natural = Size::new(100.0, 50.0);
        let crop = Rect::new(10.0, 5.0, 20.0, 20.0);
        let t = placement_transform(
            natural,
            &AffineTransform::IDENTITY,
            crop,
            Size::ZERO,
            Size::new(100.0, 100.0),
            0.0,
        );
        assert_eq!(t, AffineTransform::translation(-10.0, -5.0));
    }

    #[test]
    fn narrower_target_is_centered() {
        let natural = Size::new(400.0, 400.0);
        let crop = Rect::from_size(natural);
        let t = placement_transform(
            natural,
            &AffineTransform::IDENTITY,
            crop,
            Size::new(200.0, 200.0),
            Size::new(400.0, 400.0),
            200.0,
        );
        let placed = t.bounding_box(&crop);
        assert_eq!(placed, Rect::new(100.0, 200.0, 200.0, 200.0));
    }
}
