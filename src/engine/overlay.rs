//! Face overlay: fit the source image into the display area, scale face rectangles into it,
//! and rasterize the outlines.

use image::{Rgba, RgbaImage};

use crate::types::{AnalysisResult, DisplaySize, Face, SearchResultItem};
use crate::utils::config::OverlayConsts;

/// A rectangle in overlay canvas coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScaledRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// One face drawn on the overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceMarker {
    pub rect: ScaledRect,
    /// `♀:<age>`, `♂:<age>` or `?:<age>`.
    pub label: String,
    /// Top-left of the label; sits directly above the rectangle.
    pub label_origin: (f64, f64),
    pub font_size: f64,
}

/// Rendered overlay for one entry at one display size.
#[derive(Clone, Debug)]
pub struct Overlay {
    pub width: u32,
    pub height: u32,
    pub faces: Vec<FaceMarker>,
    /// Rectangle outlines (with drop shadow) on a transparent canvas. Labels are left to the
    /// presenter, positioned by [`FaceMarker::label_origin`].
    pub image: RgbaImage,
}

/// Canvas size the source image occupies at `display`, aspect preserved: the larger source
/// dimension decides which display dimension is kept.
pub fn fit_canvas(source: (u32, u32), display: DisplaySize) -> Option<(u32, u32)> {
    let (sw, sh) = source;
    if sw == 0 || sh == 0 || display.is_degenerate() {
        return None;
    }
    let (sw, sh) = (sw as f64, sh as f64);
    let (width, height) = if sw > sh {
        (
            (display.height * sw / sh).trunc(),
            display.height.trunc(),
        )
    } else {
        (
            display.width.trunc(),
            (display.width * sh / sw).trunc(),
        )
    };
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some((width as u32, height as u32))
}

pub fn face_label(face: &Face) -> String {
    let sign = match face.gender.as_str() {
        "Female" => "♀",
        "Male" => "♂",
        _ => "?",
    };
    format!("{}:{}", sign, face.age)
}

/// Lay out the overlay for `item` at `display`. `None` when the item has no usable source
/// dimensions or the display area is degenerate.
pub fn layout_overlay(
    item: &SearchResultItem,
    analysis: &AnalysisResult,
    display: DisplaySize,
) -> Option<(u32, u32, Vec<FaceMarker>)> {
    let (sw, sh) = (item.width?, item.height?);
    let (width, height) = fit_canvas((sw, sh), display)?;
    let x_ratio = width as f64 / sw as f64;
    let y_ratio = height as f64 / sh as f64;
    let font_size = if width < OverlayConsts::SMALL_CANVAS_WIDTH {
        OverlayConsts::SMALL_FONT
    } else {
        OverlayConsts::LARGE_FONT
    };

    let faces = analysis
        .faces
        .iter()
        .map(|face| {
            let r = face.face_rectangle;
            let rect = ScaledRect {
                left: r.left as f64 * x_ratio,
                top: r.top as f64 * y_ratio,
                width: r.width as f64 * x_ratio,
                height: r.height as f64 * y_ratio,
            };
            FaceMarker {
                rect,
                label: face_label(face),
                label_origin: (rect.left, rect.top - font_size),
                font_size,
            }
        })
        .collect();
    Some((width, height, faces))
}

/// Lay out and rasterize the overlay.
pub fn render_overlay(
    item: &SearchResultItem,
    analysis: &AnalysisResult,
    display: DisplaySize,
) -> Option<Overlay> {
    let (width, height, faces) = layout_overlay(item, analysis, display)?;
    let mut image = RgbaImage::new(width, height);
    for face in &faces {
        let shadow = ScaledRect {
            left: face.rect.left + 1.0,
            top: face.rect.top + 1.0,
            ..face.rect
        };
        stroke_rect(&mut image, shadow, Rgba(OverlayConsts::SHADOW_RGBA));
        stroke_rect(&mut image, face.rect, Rgba(OverlayConsts::OUTLINE_RGBA));
    }
    Some(Overlay {
        width,
        height,
        faces,
        image,
    })
}

/// 1-px outline, clipped to the canvas.
fn stroke_rect(img: &mut RgbaImage, rect: ScaledRect, color: Rgba<u8>) {
    let x0 = rect.left.round() as i64;
    let y0 = rect.top.round() as i64;
    let x1 = (rect.left + rect.width).round() as i64;
    let y1 = (rect.top + rect.height).round() as i64;
    let (w, h) = (img.width() as i64, img.height() as i64);
    let mut put = |x: i64, y: i64| {
        if (0..w).contains(&x) && (0..h).contains(&y) {
            img.put_pixel(x as u32, y as u32, color);
        }
    };
    for x in x0..=x1 {
        put(x, y0);
        put(x, y1);
    }
    for y in y0..=y1 {
        put(x0, y);
        put(x1, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FaceRectangle;

    fn item(w: u32, h: u32) -> SearchResultItem {
        SearchResultItem {
            width: Some(w),
            height: Some(h),
            ..Default::default()
        }
    }

    fn face(gender: &str, age: u32, left: i32, top: i32, w: i32, h: i32) -> Face {
        Face {
            age,
            gender: gender.to_string(),
            face_rectangle: FaceRectangle {
                left,
                top,
                width: w,
                height: h,
            },
        }
    }

    #[test]
    fn test_fit_canvas_landscape_keeps_display_height() {
        assert_eq!(
            fit_canvas((1000, 500), DisplaySize::new(300.0, 200.0)),
            Some((400, 200))
        );
    }

    #[test]
    fn test_fit_canvas_portrait_keeps_display_width() {
        assert_eq!(
            fit_canvas((500, 1000), DisplaySize::new(300.0, 200.0)),
            Some((300, 600))
        );
    }

    #[test]
    fn test_fit_canvas_rejects_degenerate_input() {
        assert_eq!(fit_canvas((0, 10), DisplaySize::new(10.0, 10.0)), None);
        assert_eq!(fit_canvas((10, 10), DisplaySize::new(0.0, 10.0)), None);
        assert_eq!(fit_canvas((10, 10), DisplaySize::new(10.0, -5.0)), None);
    }

    #[test]
    fn test_face_labels() {
        assert_eq!(face_label(&face("Female", 30, 0, 0, 1, 1)), "♀:30");
        assert_eq!(face_label(&face("Male", 4, 0, 0, 1, 1)), "♂:4");
        assert_eq!(face_label(&face("", 50, 0, 0, 1, 1)), "?:50");
    }

    #[test]
    fn test_layout_scales_rect_and_places_label_above() {
        let analysis = AnalysisResult {
            faces: vec![face("Male", 40, 100, 50, 200, 100)],
            ..Default::default()
        };
        let (w, h, faces) =
            layout_overlay(&item(1000, 500), &analysis, DisplaySize::new(300.0, 200.0)).unwrap();
        assert_eq!((w, h), (400, 200));
        let m = &faces[0];
        assert_eq!(
            m.rect,
            ScaledRect {
                left: 40.0,
                top: 20.0,
                width: 80.0,
                height: 40.0
            }
        );
        assert_eq!(m.font_size, OverlayConsts::LARGE_FONT);
        assert_eq!(m.label_origin, (40.0, 20.0 - OverlayConsts::LARGE_FONT));
    }

    #[test]
    fn test_small_canvas_uses_small_font() {
        let analysis = AnalysisResult {
            faces: vec![face("Female", 20, 0, 0, 10, 10)],
            ..Default::default()
        };
        let (_, _, faces) =
            layout_overlay(&item(100, 100), &analysis, DisplaySize::new(200.0, 200.0)).unwrap();
        assert_eq!(faces[0].font_size, OverlayConsts::SMALL_FONT);
    }

    #[test]
    fn test_layout_needs_source_dimensions() {
        let no_dims = SearchResultItem::default();
        assert!(
            layout_overlay(
                &no_dims,
                &AnalysisResult::default(),
                DisplaySize::new(10.0, 10.0)
            )
            .is_none()
        );
    }

    #[test]
    fn test_render_draws_outline_and_shadow() {
        let analysis = AnalysisResult {
            faces: vec![face("Male", 40, 10, 10, 20, 20)],
            ..Default::default()
        };
        let overlay =
            render_overlay(&item(100, 100), &analysis, DisplaySize::new(100.0, 100.0)).unwrap();
        assert_eq!((overlay.width, overlay.height), (100, 100));
        assert_eq!(
            overlay.image.get_pixel(10, 10).0,
            OverlayConsts::OUTLINE_RGBA
        );
        assert_eq!(
            overlay.image.get_pixel(31, 31).0,
            OverlayConsts::SHADOW_RGBA
        );
        assert_eq!(overlay.image.get_pixel(50, 50).0, [0, 0, 0, 0]);
    }
}
