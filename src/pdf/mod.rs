//! # PDF Serializer
//!
//! Writes laid-out grid pages as a PDF 1.7 file.
//!
//! The subset of PDF a grid export needs is small: pages, image XObjects,
//! stroked rectangles and a clipping path. We write the raw bytes ourselves,
//! which keeps the crate self-contained.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog
//! 2 0 obj ... endobj  <- page tree
//! 3 0 obj ... endobj  <- image XObjects, then content stream + page per page
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Layout coordinates are already PDF user space (bottom-left origin), so
//! placements are written without any flipping.

use std::collections::HashMap;
use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use log::debug;
use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::layout::{LayoutPage, Placement, Rect, CELL_INSET};
use crate::model::{LayoutConfig, Metadata};

/// Stroke width of cell outlines, in points.
const OUTLINE_WIDTH: f64 = 0.5;
/// Grey level of cell outlines.
const OUTLINE_GREY: f64 = 0.75;
/// Grey level of the placeholder drawn when an image is missing.
const PLACEHOLDER_GREY: f64 = 0.9;

/// Serializes grid pages to PDF bytes.
#[derive(Debug, Clone)]
pub struct PdfWriter {
    outline: bool,
    clip_overflow: bool,
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Maps an input image's source index to its /ImN number and object id.
    image_objects: HashMap<usize, (usize, usize)>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self {
            outline: true,
            clip_overflow: true,
        }
    }

    /// A writer honouring the drawing options of `config`.
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            outline: config.outline,
            clip_overflow: config.clip_overflow,
        }
    }

    /// Write laid-out pages to a PDF byte vector.
    ///
    /// `images` is indexed by each placement's `source_index`. A placement
    /// whose image is missing is drawn as a grey placeholder.
    pub fn write(
        &self,
        pages: &[LayoutPage],
        images: &[Option<LoadedImage>],
        metadata: &Metadata,
    ) -> Vec<u8> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
            image_objects: HashMap::new(),
        };

        // 0 = placeholder (PDF objects are 1-indexed)
        // 1 = Catalog
        // 2 = Pages (page tree root)
        // 3+ = images, then content stream and page object per page
        for _ in 0..3 {
            builder.objects.push(PdfObject { data: vec![] });
        }

        self.register_images(&mut builder, pages, images);

        let mut page_obj_ids: Vec<usize> = Vec::with_capacity(pages.len());

        for page in pages {
            let content = self.build_content_stream(page, &builder);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

            let content_obj_id = builder.objects.len();
            let mut content_data: Vec<u8> = Vec::new();
            let _ = writeln!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            builder.objects.push(PdfObject { data: content_data });

            let page_obj_id = builder.objects.len();
            let xobjects = Self::build_xobject_resource_dict(page, &builder);
            let resources = if xobjects.is_empty() {
                String::new()
            } else {
                format!("/XObject << {} >>", xobjects)
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width, page.height, content_obj_id, resources
            );
            builder.objects.push(PdfObject {
                data: page_dict.into_bytes(),
            });
            page_obj_ids.push(page_obj_id);
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = if metadata.is_empty() {
            None
        } else {
            let id = builder.objects.len();
            builder.objects.push(PdfObject {
                data: Self::build_info_dict(metadata).into_bytes(),
            });
            Some(id)
        };

        debug!(
            pages = pages.len(),
            images = builder.image_objects.len(),
            objects = builder.objects.len() - 1;
            "Serializing PDF"
        );

        Self::serialize(&builder, info_obj_id)
    }

    /// Create one XObject per placed image, in placement order.
    fn register_images(
        &self,
        builder: &mut PdfBuilder,
        pages: &[LayoutPage],
        images: &[Option<LoadedImage>],
    ) {
        for placement in pages.iter().flat_map(|p| p.placements.iter()) {
            let src = placement.source_index;
            if builder.image_objects.contains_key(&src) {
                continue;
            }
            if let Some(Some(image)) = images.get(src) {
                let img_idx = builder.image_objects.len();
                let obj_id = Self::write_image_xobject(builder, image);
                builder.image_objects.insert(src, (img_idx, obj_id));
            }
        }
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream(&self, page: &LayoutPage, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        for placement in &page.placements {
            if self.outline {
                Self::write_outline(&mut stream, &placement.cell);
            }
            self.write_placement(&mut stream, placement, builder);
        }
        stream
    }

    fn write_outline(stream: &mut String, cell: &Rect) {
        let _ = writeln!(
            stream,
            "q\n{g:.3} {g:.3} {g:.3} RG\n{:.2} w\n{:.2} {:.2} {:.2} {:.2} re\nS\nQ",
            OUTLINE_WIDTH,
            cell.x,
            cell.y,
            cell.width,
            cell.height,
            g = OUTLINE_GREY
        );
    }

    fn write_placement(&self, stream: &mut String, placement: &Placement, builder: &PdfBuilder) {
        let inner = placement.cell.inset(CELL_INSET);
        let img = &placement.image;

        let Some(&(img_idx, _)) = builder.image_objects.get(&placement.source_index) else {
            let _ = writeln!(
                stream,
                "q\n{g:.3} {g:.3} {g:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ",
                inner.x,
                inner.y,
                inner.width,
                inner.height,
                g = PLACEHOLDER_GREY
            );
            return;
        };

        let _ = writeln!(stream, "q");
        if self.clip_overflow && !inner.contains(img) {
            let _ = writeln!(
                stream,
                "{:.2} {:.2} {:.2} {:.2} re\nW\nn",
                inner.x, inner.y, inner.width, inner.height
            );
        }
        let _ = writeln!(
            stream,
            "{:.4} 0 0 {:.4} {:.4} {:.4} cm\n/Im{} Do\nQ",
            img.width, img.height, img.x, img.y, img_idx
        );
    }

    /// Write a single image as one or two XObject PDF objects.
    /// Returns the main XObject ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space_str = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                    // Adobe CMYK JPEGs store inverted components.
                    JpegColorSpace::DeviceCMYK => "/DeviceCMYK /Decode [1 0 1 0 1 0 1 0]",
                };

                let obj_id = builder.objects.len();
                let mut obj_data: Vec<u8> = Vec::new();
                let _ = writeln!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image \
                     /Width {} /Height {} \
                     /ColorSpace {} \
                     /BitsPerComponent 8 \
                     /Filter /DCTDecode \
                     /Length {} >>\nstream",
                    image.width_px,
                    image.height_px,
                    color_space_str,
                    data.len()
                );
                obj_data.extend_from_slice(data);
                obj_data.extend_from_slice(b"\nendstream");
                builder.objects.push(PdfObject { data: obj_data });
                obj_id
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                let smask_id = alpha.as_ref().map(|alpha_data| {
                    Self::push_flate_image(builder, image, alpha_data, "/DeviceGray", "")
                });
                let smask_ref = smask_id
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();
                Self::push_flate_image(builder, image, rgb, "/DeviceRGB", &smask_ref)
            }
        }
    }

    fn push_flate_image(
        builder: &mut PdfBuilder,
        image: &LoadedImage,
        samples: &[u8],
        color_space: &str,
        extra: &str,
    ) -> usize {
        let compressed = compress_to_vec_zlib(samples, 6);
        let obj_id = builder.objects.len();
        let mut obj_data: Vec<u8> = Vec::new();
        let _ = writeln!(
            obj_data,
            "<< /Type /XObject /Subtype /Image \
             /Width {} /Height {} \
             /ColorSpace {} \
             /BitsPerComponent 8 \
             /Filter /FlateDecode \
             /Length {}{} >>\nstream",
            image.width_px,
            image.height_px,
            color_space,
            compressed.len(),
            extra
        );
        obj_data.extend_from_slice(&compressed);
        obj_data.extend_from_slice(b"\nendstream");
        builder.objects.push(PdfObject { data: obj_data });
        obj_id
    }

    /// Build the /XObject resource dict entries for a page.
    fn build_xobject_resource_dict(page: &LayoutPage, builder: &PdfBuilder) -> String {
        let mut entries: Vec<(usize, usize)> = page
            .placements
            .iter()
            .filter_map(|p| builder.image_objects.get(&p.source_index).copied())
            .collect();
        entries.sort_by_key(|(idx, _)| *idx);
        entries.dedup();
        entries
            .iter()
            .map(|(idx, obj_id)| format!("/Im{} {} 0 R", idx, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_info_dict(metadata: &Metadata) -> String {
        let mut info = String::from("<< ");
        if let Some(ref title) = metadata.title {
            let _ = write!(info, "/Title ({}) ", Self::escape_pdf_string(title));
        }
        if let Some(ref author) = metadata.author {
            let _ = write!(info, "/Author ({}) ", Self::escape_pdf_string(author));
        }
        if let Some(ref subject) = metadata.subject {
            let _ = write!(info, "/Subject ({}) ", Self::escape_pdf_string(subject));
        }
        let _ = write!(
            info,
            "/Producer (gridprint {}) /Creator (gridprint) >>",
            env!("CARGO_PKG_VERSION")
        );
        info
    }

    /// Escape special characters in a PDF literal string.
    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
            .replace('\r', "\\r")
            .replace('\n', "\\n")
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(builder: &PdfBuilder, info_obj_id: Option<usize>) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = writeln!(output, "{} 0 obj", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = writeln!(output, "xref\n0 {}", builder.objects.len());
        let _ = writeln!(output, "0000000000 65535 f ");
        for offset in offsets.iter().skip(1) {
            let _ = writeln!(output, "{:010} 00000 n ", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R",
            builder.objects.len()
        );
        if let Some(info_id) = info_obj_id {
            let _ = write!(output, " /Info {} 0 R", info_id);
        }
        let _ = writeln!(output, " >>\nstartxref\n{}\n%%EOF", xref_offset);

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageKind;

    fn rgb_image(w: u32, h: u32, with_alpha: bool) -> LoadedImage {
        let n = (w * h) as usize;
        LoadedImage {
            kind: ImageKind::Png,
            pixel_data: ImagePixelData::Decoded {
                rgb: vec![200; n * 3],
                alpha: with_alpha.then(|| vec![128; n]),
            },
            width_px: w,
            height_px: h,
        }
    }

    fn placement(source_index: usize, cell: Rect, image: Rect) -> Placement {
        Placement {
            page_index: 0,
            slot: 0,
            column: 0,
            row: 0,
            source_index,
            cell,
            image,
            offset_x: image.x - cell.x,
            offset_y: image.y - cell.y,
        }
    }

    fn page(placements: Vec<Placement>) -> LayoutPage {
        LayoutPage {
            index: 0,
            width: 595.28,
            height: 841.89,
            placements,
        }
    }

    fn content_of(writer: &PdfWriter, page: &LayoutPage, images: &[Option<LoadedImage>]) -> String {
        let mut builder = PdfBuilder {
            objects: (0..3).map(|_| PdfObject { data: vec![] }).collect(),
            image_objects: HashMap::new(),
        };
        writer.register_images(&mut builder, std::slice::from_ref(page), images);
        writer.build_content_stream(page, &builder)
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(
            PdfWriter::escape_pdf_string("Hello (World)"),
            "Hello \\(World\\)"
        );
        assert_eq!(PdfWriter::escape_pdf_string("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_empty_document_produces_valid_pdf() {
        let bytes = PdfWriter::new().write(&[], &[], &Metadata::default());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-1.7"));
        assert!(text.contains("/Count 0"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(!text.contains("/Info"));
    }

    #[test]
    fn test_metadata_in_pdf() {
        let metadata = Metadata {
            title: Some("Contact sheet (draft)".to_string()),
            author: Some("Ada".to_string()),
            subject: None,
        };
        let bytes = PdfWriter::new().write(&[], &[], &metadata);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Title (Contact sheet \\(draft\\))"));
        assert!(text.contains("/Author (Ada)"));
        assert!(text.contains("/Info"));
    }

    #[test]
    fn test_image_and_outline_written() {
        let cell = Rect::new(10.0, 20.0, 102.0, 102.0);
        let image = Rect::new(11.0, 46.0, 100.0, 50.0);
        let pg = page(vec![placement(0, cell, image)]);
        let images = vec![Some(rgb_image(2, 1, false))];

        let stream = content_of(&PdfWriter::new(), &pg, &images);
        assert!(stream.contains("10.00 20.00 102.00 102.00 re\nS"));
        assert!(stream.contains("100.0000 0 0 50.0000 11.0000 46.0000 cm\n/Im0 Do"));
        // Contained image needs no clip
        assert!(!stream.contains("W\nn"));
    }

    #[test]
    fn test_overflowing_image_is_clipped_to_inset_cell() {
        let cell = Rect::new(10.0, 20.0, 102.0, 102.0);
        let image = Rect::new(-39.0, 21.0, 200.0, 100.0);
        let pg = page(vec![placement(0, cell, image)]);
        let images = vec![Some(rgb_image(2, 1, false))];

        let stream = content_of(&PdfWriter::new(), &pg, &images);
        assert!(stream.contains("11.00 21.00 100.00 100.00 re\nW\nn"));

        let config = LayoutConfig {
            clip_overflow: false,
            outline: false,
            ..Default::default()
        };
        let stream = content_of(&PdfWriter::from_config(&config), &pg, &images);
        assert!(!stream.contains("W\nn"));
        assert!(!stream.contains(" RG"));
    }

    #[test]
    fn test_missing_image_draws_placeholder() {
        let cell = Rect::new(0.0, 0.0, 52.0, 52.0);
        let pg = page(vec![placement(3, cell, cell.inset(1.0))]);
        let stream = content_of(&PdfWriter::new(), &pg, &[]);
        assert!(stream.contains("0.900 0.900 0.900 rg"));
        assert!(!stream.contains("Do"));
    }

    #[test]
    fn test_png_alpha_becomes_smask() {
        let cell = Rect::new(0.0, 0.0, 52.0, 52.0);
        let pg = page(vec![placement(0, cell, cell.inset(1.0))]);
        let bytes = PdfWriter::new().write(
            &[pg],
            &[Some(rgb_image(1, 1, true))],
            &Metadata::default(),
        );
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/SMask"));
        assert!(text.contains("/ColorSpace /DeviceGray"));
        assert!(text.contains("/XObject << /Im0"));
    }

    #[test]
    fn test_jpeg_passthrough_uses_dctdecode() {
        let jpeg = LoadedImage {
            kind: ImageKind::Jpeg,
            pixel_data: ImagePixelData::Jpeg {
                data: vec![0xFF, 0xD8, 0xFF, 0xD9],
                color_space: JpegColorSpace::DeviceGray,
            },
            width_px: 8,
            height_px: 8,
        };
        let cell = Rect::new(0.0, 0.0, 52.0, 52.0);
        let pg = page(vec![placement(0, cell, cell.inset(1.0))]);
        let bytes = PdfWriter::new().write(&[pg], &[Some(jpeg)], &Metadata::default());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Filter /DCTDecode"));
        assert!(text.contains("/ColorSpace /DeviceGray"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let cell = Rect::new(0.0, 0.0, 52.0, 52.0);
        let pages = vec![
            page(vec![placement(0, cell, cell.inset(1.0))]),
            page(vec![placement(1, cell, cell.inset(1.0))]),
        ];
        let images = vec![Some(rgb_image(1, 1, false)), Some(rgb_image(1, 1, false))];
        let bytes = PdfWriter::new().write(&pages, &images, &Metadata::default());
        let text = String::from_utf8_lossy(&bytes).into_owned();

        let xref_at = text.find("xref\n").unwrap();
        let entries: Vec<usize> = text[xref_at..]
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .map(|l| l[..10].parse().unwrap())
            .collect();
        assert!(!entries.is_empty());
        for (i, offset) in entries.iter().enumerate() {
            let header = format!("{} 0 obj", i + 1);
            assert!(bytes[*offset..].starts_with(header.as_bytes()), "object {}", i + 1);
        }
        assert!(text.contains("/Count 2"));
    }
}
