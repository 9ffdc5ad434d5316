use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

use super::{LabelFont, PixelBox, RenderError, RenderSpec};

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub stroke_width: u32,
    pub label_offset: i64,
    pub color: Rgba<u8>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            stroke_width: 3,
            label_offset: 18,
            color: Rgba([255, 255, 255, 255]),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    font: Option<Arc<LabelFont>>,
    options: RenderOptions,
}

impl Renderer {
    pub fn new(font: Option<Arc<LabelFont>>, options: RenderOptions) -> Self {
        Renderer { font, options }
    }

    pub fn render_spec_json(&self, image_bytes: &[u8], spec_json: &str) -> Result<Vec<u8>, RenderError> {
        let spec = RenderSpec::from_json(spec_json)?;
        self.render(image_bytes, &spec)
    }

    /// Decodes `image_bytes`, draws every annotation in order and returns the result as PNG.
    pub fn render(&self, image_bytes: &[u8], spec: &RenderSpec) -> Result<Vec<u8>, RenderError> {
        let decoded = image::load_from_memory(image_bytes).map_err(|e| RenderError::Decode(e.to_string()))?;
        let mut canvas = decoded.to_rgba8();
        let (width, height) = canvas.dimensions();
        debug!(width, height, annotations = spec.annotations.len(), "Rendering annotations.");

        for (index, annotation) in spec.annotations.iter().enumerate() {
            let pixel_box = PixelBox::from_annotation(index, annotation, width, height)?;
            self.draw_outline(&mut canvas, &pixel_box);

            if let Some(font) = &self.font {
                if !annotation.text.is_empty() {
                    let (x, y) = pixel_box.label_origin(self.options.label_offset);
                    draw_text_mut(
                        &mut canvas,
                        self.options.color,
                        saturate(x),
                        saturate(y),
                        font.scale(),
                        font.font(),
                        &annotation.text,
                    );
                }
            }
        }

        encode_png(canvas)
    }

    /// Stroke grows inward from the box edges; boxes too small for a hollow centre are filled.
    fn draw_outline(&self, canvas: &mut RgbaImage, b: &PixelBox) {
        let s = i64::from(self.options.stroke_width.max(1));
        let color = self.options.color;

        if b.width() <= 2 * s || b.height() <= 2 * s {
            fill(canvas, b, color);
            return;
        }

        let edges = [
            PixelBox { x0: b.x0, y0: b.y0, x1: b.x1, y1: b.y0 + s - 1 },
            PixelBox { x0: b.x0, y0: b.y1 - s + 1, x1: b.x1, y1: b.y1 },
            PixelBox { x0: b.x0, y0: b.y0 + s, x1: b.x0 + s - 1, y1: b.y1 - s },
            PixelBox { x0: b.x1 - s + 1, y0: b.y0 + s, x1: b.x1, y1: b.y1 - s },
        ];
        for edge in &edges {
            fill(canvas, edge, color);
        }
    }
}

fn fill(canvas: &mut RgbaImage, b: &PixelBox, color: Rgba<u8>) {
    let (width, height) = canvas.dimensions();
    let Some(visible) = b.clip(width, height) else {
        return;
    };
    // Clipped to the canvas, so every value fits in i32/u32.
    let rect = Rect::at(visible.x0 as i32, visible.y0 as i32)
        .of_size(visible.width() as u32, visible.height() as u32);
    draw_filled_rect_mut(canvas, rect, color);
}

fn saturate(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn encode_png(canvas: RgbaImage) -> Result<Vec<u8>, RenderError> {
    let mut out = Vec::new();
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Annotation;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, BLACK);
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn spec(items: &[(f64, f64, f64, f64, &str)]) -> RenderSpec {
        RenderSpec {
            annotations: items
                .iter()
                .map(|&(x, y, w, h, text)| Annotation { x, y, w, h, text: text.to_string() })
                .collect(),
        }
    }

    fn decode(png: &[u8]) -> RgbaImage {
        assert_eq!(image::guess_format(png).unwrap(), ImageFormat::Png);
        image::load_from_memory(png).unwrap().to_rgba8()
    }

    fn renderer_without_font() -> Renderer {
        Renderer::new(None, RenderOptions::default())
    }

    #[test]
    fn test_outline_is_drawn_inward() {
        let out = renderer_without_font()
            .render(&png_bytes(100, 100), &spec(&[(10.0, 10.0, 20.0, 10.0, "")]))
            .unwrap();
        let img = decode(&out);

        // box spans (10,10)..=(30,20)
        assert_eq!(*img.get_pixel(10, 10), WHITE);
        assert_eq!(*img.get_pixel(12, 15), WHITE);
        assert_eq!(*img.get_pixel(30, 20), WHITE);
        assert_eq!(*img.get_pixel(28, 15), WHITE);
        assert_eq!(*img.get_pixel(20, 12), WHITE);
        assert_eq!(*img.get_pixel(15, 15), BLACK);
        assert_eq!(*img.get_pixel(13, 13), BLACK);
        assert_eq!(*img.get_pixel(31, 15), BLACK);
        assert_eq!(*img.get_pixel(9, 10), BLACK);
    }

    #[test]
    fn test_small_box_is_filled() {
        let out = renderer_without_font()
            .render(&png_bytes(100, 100), &spec(&[(50.0, 50.0, 4.0, 4.0, "")]))
            .unwrap();
        let img = decode(&out);
        assert_eq!(*img.get_pixel(52, 52), WHITE);
    }

    #[test]
    fn test_empty_spec_returns_same_dimensions() {
        let out = renderer_without_font().render(&png_bytes(64, 48), &RenderSpec::default()).unwrap();
        let img = decode(&out);
        assert_eq!(img.dimensions(), (64, 48));
        assert!(img.pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn test_off_canvas_boxes_do_not_panic() {
        let out = renderer_without_font()
            .render(
                &png_bytes(50, 50),
                &spec(&[(90.0, 90.0, 50.0, 50.0, "edge"), (150.0, 150.0, 10.0, 10.0, "gone"), (-20.0, -20.0, 10.0, 10.0, "")]),
            )
            .unwrap();
        let img = decode(&out);
        assert_eq!(*img.get_pixel(45, 45), WHITE);
        assert_eq!(*img.get_pixel(49, 49), BLACK);
    }

    #[test]
    fn test_jpeg_input_produces_png() {
        let img = image::RgbImage::from_pixel(32, 32, image::Rgb([10, 20, 30]));
        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();

        let out = renderer_without_font()
            .render(&jpeg, &spec(&[(0.0, 0.0, 50.0, 50.0, "")]))
            .unwrap();
        let decoded = decode(&out);
        assert_eq!(decoded.dimensions(), (32, 32));
        assert_eq!(*decoded.get_pixel(0, 0), WHITE);
    }

    #[test]
    fn test_undecodable_image_is_rejected() {
        let err = renderer_without_font()
            .render(b"not an image", &RenderSpec::default())
            .unwrap_err();
        assert!(matches!(err, RenderError::Decode(_)));

        let err = renderer_without_font().render(&[], &RenderSpec::default()).unwrap_err();
        assert!(matches!(err, RenderError::Decode(_)));
    }

    #[test]
    fn test_inverted_annotation_fails_whole_render() {
        let err = renderer_without_font()
            .render(&png_bytes(10, 10), &spec(&[(0.0, 0.0, 10.0, 10.0, ""), (50.0, 50.0, 10.0, -30.0, "")]))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidAnnotation { index: 1, .. }));
    }

    #[test]
    fn test_huge_finite_coordinates_are_rejected() {
        let err = renderer_without_font()
            .render(&png_bytes(100, 100), &spec(&[(-1e300, 0.0, 1e300, 10.0, "far")]))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidAnnotation { index: 0, .. }));

        let err = renderer_without_font()
            .render(&png_bytes(100, 100), &spec(&[(1e300, 0.0, 1e300, 10.0, "far")]))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidAnnotation { index: 0, .. }));
    }

    #[test]
    fn test_box_spanning_far_beyond_canvas_is_clipped() {
        let out = renderer_without_font()
            .render(&png_bytes(100, 100), &spec(&[(-1e9, -1e9, 2e9, 2e9, "")]))
            .unwrap();
        let img = decode(&out);
        // all four edges lie off-canvas, so nothing visible changes
        assert!(img.pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn test_custom_stroke_and_color() {
        let options = RenderOptions {
            stroke_width: 1,
            label_offset: 18,
            color: Rgba([255, 0, 0, 255]),
        };
        let out = Renderer::new(None, options)
            .render(&png_bytes(100, 100), &spec(&[(10.0, 10.0, 20.0, 10.0, "")]))
            .unwrap();
        let img = decode(&out);
        assert_eq!(*img.get_pixel(10, 15), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(11, 15), BLACK);
    }

    #[test]
    fn test_render_spec_json_reports_bad_json() {
        let err = renderer_without_font()
            .render_spec_json(&png_bytes(10, 10), "{")
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidSpec(_)));
    }

    #[test]
    fn test_label_is_drawn_above_box_when_font_available() {
        let Some(font) = LabelFont::load(&LabelFont::candidate_paths("DejaVuSans.ttf"), 16.0) else {
            eprintln!("DejaVuSans.ttf not installed, skipping label rendering test");
            return;
        };
        let renderer = Renderer::new(Some(Arc::new(font)), RenderOptions::default());
        let out = renderer
            .render(&png_bytes(200, 200), &spec(&[(10.0, 50.0, 40.0, 20.0, "Hello")]))
            .unwrap();
        let img = decode(&out);

        // box top-left at (20,100); label occupies the band above it
        let lit = (20..80)
            .flat_map(|x| (82..100).map(move |y| (x, y)))
            .filter(|&(x, y)| img.get_pixel(x, y)[0] > 128)
            .count();
        assert!(lit > 0, "expected label pixels above the box");
    }
}
