//! Photographic report document rendering.
//!
//! Layout: cover page, one or more pages per non-empty category with a
//! two-column photo grid, and a closing signature page. Rendering is
//! synchronous and CPU-bound; callers run it on the blocking pool.

use chrono::{Datelike, NaiveDate};
use printpdf::image_crate::{DynamicImage, GenericImageView};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Polygon, Rgb,
};

use crate::core::config::CompanyConfig;
use crate::core::error::{AppError, Result};
use crate::features::reports::services::layout::{
    cell_x, fit_within, plan_rows, wrap_text, CELL_HEIGHT_MM, CELL_WIDTH_MM, FOOTER_TOP_MM,
    HEADING_TOP_MM, MARGIN_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM,
};
use crate::shared::constants::IMAGE_UNAVAILABLE_TEXT;

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

const DESCRIPTION_PREAMBLE: &str = "Por medio del presente se hace constar los trabajos realizados de acuerdo al plan de trabajo del cual consta:";
const EVIDENCE_STATEMENT: &str = "Anexo fotografías como medio de evidencia.";
const SIGNATURE_CAPTION: &str = "Firma de conformidad.";
const DEFAULT_LEFT_SIGNER: &str = "Gerente del Condominio";

const BRAND: (f32, f32, f32) = (0.0, 0.714, 0.478);
const TEXT: (f32, f32, f32) = (0.2, 0.2, 0.2);
const MUTED: (f32, f32, f32) = (0.4, 0.4, 0.4);
const PLACEHOLDER_FILL: (f32, f32, f32) = (0.95, 0.95, 0.95);
const PLACEHOLDER_STROKE: (f32, f32, f32) = (0.8, 0.8, 0.8);
const PLACEHOLDER_TEXT: (f32, f32, f32) = (0.6, 0.6, 0.6);
const WHITE: (f32, f32, f32) = (1.0, 1.0, 1.0);

/// Resolution photos are embedded at before scaling
const IMAGE_DPI: f32 = 300.0;
const MM_PER_PT: f32 = 0.3528;
const LINE_MM: f32 = 5.5;
const WRAP_CHARS: usize = 95;

/// Photos of one category, `None` where the photo could not be loaded
pub struct RenderSection {
    pub heading: String,
    pub images: Vec<Option<DynamicImage>>,
}

/// Everything printed in one report
pub struct ReportDocument {
    pub title: String,
    pub destination: String,
    pub contact_name: Option<String>,
    pub contact_role: String,
    pub description: Option<String>,
    pub as_of: NaiveDate,
    pub sections: Vec<RenderSection>,
}

/// "Acapulco Guerrero a 12 de enero de 2025"
pub fn cover_date_line(city: &str, date: NaiveDate) -> String {
    format!(
        "{} a {} de {} de {}",
        city,
        date.day(),
        MONTHS_ES[date.month0() as usize],
        date.year()
    )
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

struct Canvas<'a> {
    doc: &'a PdfDocumentReference,
    fonts: Fonts,
    company: &'a CompanyConfig,
}

/// Render the document into an in-memory PDF
pub fn render_report(document: &ReportDocument, company: &CompanyConfig) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        document.title.as_str(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Portada",
    );

    let fonts = Fonts {
        regular: builtin_font(&doc, BuiltinFont::Helvetica)?,
        bold: builtin_font(&doc, BuiltinFont::HelveticaBold)?,
    };
    let canvas = Canvas {
        doc: &doc,
        fonts,
        company,
    };

    let cover = doc.get_page(page).get_layer(layer);
    canvas.draw_cover(&cover, document);

    for section in document.sections.iter().filter(|s| !s.images.is_empty()) {
        canvas.draw_section(section);
    }

    canvas.draw_signatures(document);

    doc.save_to_bytes()
        .map_err(|e| AppError::Internal(format!("Failed to serialize report PDF: {:?}", e)))
}

fn builtin_font(doc: &PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef> {
    doc.add_builtin_font(font)
        .map_err(|e| AppError::Internal(format!("Failed to load built-in font: {:?}", e)))
}

impl Canvas<'_> {
    fn new_page(&self, name: &str) -> PdfLayerReference {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), name);
        self.doc.get_page(page).get_layer(layer)
    }

    fn draw_cover(&self, layer: &PdfLayerReference, document: &ReportDocument) {
        // Letterhead
        set_fill(layer, BRAND);
        let circle = printpdf::utils::calculate_points_for_circle(
            Mm(10.6),
            Mm(35.3),
            Mm(PAGE_HEIGHT_MM - 28.2),
        );
        layer.add_polygon(Polygon {
            rings: vec![circle],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });

        let initial: String = self.company.name.chars().take(1).collect();
        set_fill(layer, WHITE);
        text(layer, &self.fonts.bold, 24.0, 31.9, 31.8, &initial.to_uppercase());

        set_fill(layer, TEXT);
        text(
            layer,
            &self.fonts.bold,
            16.0,
            49.4,
            27.5,
            &self.company.name.to_uppercase(),
        );
        text(
            layer,
            &self.fonts.regular,
            8.0,
            49.4,
            33.0,
            &self.company.tagline.to_uppercase(),
        );

        set_fill(layer, BRAND);
        centered_text(layer, &self.fonts.bold, 20.0, 55.0, &document.title);

        set_fill(layer, TEXT);
        let date_line = cover_date_line(&self.company.city, document.as_of);
        right_aligned_text(layer, &self.fonts.regular, 11.0, 66.0, &date_line);

        let mut top = 82.0;
        text(
            layer,
            &self.fonts.bold,
            11.0,
            MARGIN_MM,
            top,
            &document.destination,
        );
        if let Some(contact) = document.contact_name.as_deref().filter(|c| !c.is_empty()) {
            top += LINE_MM;
            let attention = format!("At'n {}", contact);
            text(layer, &self.fonts.regular, 11.0, MARGIN_MM, top, &attention);
            top += LINE_MM;
            text(
                layer,
                &self.fonts.regular,
                11.0,
                MARGIN_MM,
                top,
                &document.contact_role,
            );
        }

        if let Some(description) = document.description.as_deref().filter(|d| !d.is_empty()) {
            top += 2.0 * LINE_MM;
            for line in wrap_text(DESCRIPTION_PREAMBLE, WRAP_CHARS) {
                text(layer, &self.fonts.regular, 10.0, MARGIN_MM, top, &line);
                top += LINE_MM;
            }
            top += LINE_MM / 2.0;
            for line in wrap_text(description, WRAP_CHARS) {
                text(layer, &self.fonts.bold, 10.0, MARGIN_MM, top, &line);
                top += LINE_MM;
            }
        }

        top += 2.0 * LINE_MM;
        text(
            layer,
            &self.fonts.bold,
            10.0,
            MARGIN_MM,
            top,
            EVIDENCE_STATEMENT,
        );
        top += 1.5 * LINE_MM;
        let responsible = format!("Responsable {}.", self.company.signer);
        text(layer, &self.fonts.regular, 10.0, MARGIN_MM, top, &responsible);
    }

    fn draw_section(&self, section: &RenderSection) {
        let mut layer = self.new_page(&section.heading);
        let mut page = 0;

        set_fill(&layer, TEXT);
        text(
            &layer,
            &self.fonts.bold,
            14.0,
            MARGIN_MM,
            HEADING_TOP_MM + 4.9,
            &section.heading,
        );
        self.draw_footer(&layer);

        for row in plan_rows(section.images.len()) {
            if row.page != page {
                layer = self.new_page(&section.heading);
                self.draw_footer(&layer);
                page = row.page;
            }

            for (column, index) in row.images.clone().enumerate() {
                let x = cell_x(column);
                match &section.images[index] {
                    Some(image) => draw_photo(&layer, image, x, row.top_mm),
                    None => self.draw_placeholder(&layer, x, row.top_mm),
                }
            }
        }
    }

    fn draw_placeholder(&self, layer: &PdfLayerReference, x: f32, top: f32) {
        set_fill(layer, PLACEHOLDER_FILL);
        set_outline(layer, PLACEHOLDER_STROKE);
        layer.set_outline_thickness(0.75);
        rect(layer, x, top, CELL_WIDTH_MM, CELL_HEIGHT_MM, PaintMode::FillStroke);

        set_fill(layer, PLACEHOLDER_TEXT);
        let width = approx_text_width_mm(IMAGE_UNAVAILABLE_TEXT, 10.0);
        text(
            layer,
            &self.fonts.regular,
            10.0,
            x + (CELL_WIDTH_MM - width) / 2.0,
            top + CELL_HEIGHT_MM / 2.0,
            IMAGE_UNAVAILABLE_TEXT,
        );
    }

    fn draw_signatures(&self, document: &ReportDocument) {
        let layer = self.new_page("Firmas");
        let left_signer = document
            .contact_name
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_LEFT_SIGNER);

        set_fill(&layer, TEXT);
        set_outline(&layer, TEXT);
        layer.set_outline_thickness(0.75);
        for (x, signer) in [(28.2, left_signer), (116.4, self.company.signer.as_str())] {
            text(&layer, &self.fonts.bold, 10.0, x, 98.8, SIGNATURE_CAPTION);
            text(&layer, &self.fonts.bold, 10.0, x, 104.1, signer);
            hline(&layer, x, x + 70.6, 116.4);
        }

        self.draw_footer(&layer);
    }

    fn draw_footer(&self, layer: &PdfLayerReference) {
        let footer = format!(
            "{}  {}  {}",
            self.company.address, self.company.phone, self.company.email
        );
        set_fill(layer, MUTED);
        centered_text(layer, &self.fonts.regular, 8.0, FOOTER_TOP_MM, &footer);
    }
}

fn draw_photo(layer: &PdfLayerReference, image: &DynamicImage, x: f32, top: f32) {
    let (width_px, height_px) = image.dimensions();
    let (width, height) = fit_within(width_px, height_px, CELL_WIDTH_MM, CELL_HEIGHT_MM);
    if width <= 0.0 || height <= 0.0 {
        return;
    }

    let natural_width = width_px as f32 / IMAGE_DPI * 25.4;
    let scale = width / natural_width;

    let left = x + (CELL_WIDTH_MM - width) / 2.0;
    let image_top = top + (CELL_HEIGHT_MM - height) / 2.0;

    Image::from_dynamic_image(image).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(left)),
            translate_y: Some(Mm(PAGE_HEIGHT_MM - image_top - height)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}

fn set_fill(layer: &PdfLayerReference, (r, g, b): (f32, f32, f32)) {
    layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
}

fn set_outline(layer: &PdfLayerReference, (r, g, b): (f32, f32, f32)) {
    layer.set_outline_color(Color::Rgb(Rgb::new(r, g, b, None)));
}

/// Text with its baseline `top` millimetres below the page's top edge
fn text(layer: &PdfLayerReference, font: &IndirectFontRef, size: f32, x: f32, top: f32, txt: &str) {
    layer.use_text(txt, size, Mm(x), Mm(PAGE_HEIGHT_MM - top), font);
}

fn centered_text(layer: &PdfLayerReference, font: &IndirectFontRef, size: f32, top: f32, txt: &str) {
    let width = approx_text_width_mm(txt, size);
    let x = ((PAGE_WIDTH_MM - width) / 2.0).max(MARGIN_MM);
    text(layer, font, size, x, top, txt);
}

fn right_aligned_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    size: f32,
    top: f32,
    txt: &str,
) {
    let width = approx_text_width_mm(txt, size);
    let x = (PAGE_WIDTH_MM - MARGIN_MM - width).max(MARGIN_MM);
    text(layer, font, size, x, top, txt);
}

// Helvetica averages about half an em per glyph
fn approx_text_width_mm(txt: &str, size: f32) -> f32 {
    txt.chars().count() as f32 * size * 0.5 * MM_PER_PT
}

fn rect(layer: &PdfLayerReference, x: f32, top: f32, w: f32, h: f32, mode: PaintMode) {
    let bottom = PAGE_HEIGHT_MM - top - h;
    let points = vec![
        (Point::new(Mm(x), Mm(bottom)), false),
        (Point::new(Mm(x + w), Mm(bottom)), false),
        (Point::new(Mm(x + w), Mm(bottom + h)), false),
        (Point::new(Mm(x), Mm(bottom + h)), false),
    ];
    layer.add_polygon(Polygon {
        rings: vec![points],
        mode,
        winding_order: WindingOrder::NonZero,
    });
}

fn hline(layer: &PdfLayerReference, x1: f32, x2: f32, top: f32) {
    let y = Mm(PAGE_HEIGHT_MM - top);
    let line = Line::from_iter(vec![
        (Point::new(Mm(x1), y), false),
        (Point::new(Mm(x2), y), false),
    ]);
    layer.add_line(line);
}
