//! One-page PDF rendering of a model card.
//!
//! ## Stages
//!
//! ```text
//! snapshot / presentation JSON
//!   │
//!   ├─ CardPresentation   what the page says
//!   ├─ plan_layout        header, two columns, usage; missing images become blanks
//!   └─ render_pdf         genpdf, one Letter page, atomic write
//! ```
//!
//! The page follows the printed card: logo and title across the top, then
//! summary with the detection example on the left and the performance table
//! with the PR curve on the right, then technical details, the threshold
//! guide and the footer across the full width.
//!
//! [`plan_layout`] is pure apart from checking which asset files exist, so
//! the page structure is testable without any fonts installed. Only
//! [`render_pdf`] needs a TrueType family on disk.

pub mod presentation;
pub mod style;

pub use presentation::{CardPresentation, ConfidenceThreshold, FooterInfo, KeyNumber, ModelDetails};
pub use style::{CardStyle, TextStyle};

use crate::config::{default_images, ImageSpec};
use crate::error::{Degradation, ModelCardError};
use crate::record::ModelCardRecord;
use crate::snapshot;
use genpdf::elements::{
    Break, FrameCellDecorator, Image, LinearLayout, Paragraph, TableLayout, UnorderedList,
};
use genpdf::render::Area;
use genpdf::style::{Color, Style, StyledString};
use genpdf::{
    Alignment, Context, Document, Element, Margins, Mm, PaperSize, Position, RenderResult, Scale,
    Size,
};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Logical name of the header logo.
pub const LOGO_ASSET: &str = "logo";
pub const LOGO_FILE: &str = "NOAA_FISHERIES_logoH_web.png";
/// Logical name of the image shown under the summary.
pub const DETECTION_IMAGE: &str = "detection_example";
/// Logical name of the image shown under the performance table.
pub const PR_CURVE_IMAGE: &str = "pr_curve";

const LOGO_WIDTH_MM: f64 = 45.72;
const LOGO_HEIGHT_MM: f64 = 16.51;
const LETTER_WIDTH_MM: f64 = 215.9;
/// Space between the two columns.
const COLUMN_GAP_MM: f64 = 4.0;
const IMAGE_DPI: f64 = 300.0;
/// Distance between the strokes that fill a blank box.
const FILL_STROKE_MM: f64 = 0.25;
const LINE_SPACING: f64 = 1.1;

const DEFAULT_FONT_FAMILY: &str = "LiberationSans";

// ── Assets ───────────────────────────────────────────────────────────────

/// An image slot on the page and where its file is expected.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetImage {
    pub name: String,
    pub path: PathBuf,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// The image files a card refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct CardAssets {
    pub logo: AssetImage,
    /// In configuration order.
    pub images: Vec<AssetImage>,
}

impl CardAssets {
    /// Locate assets under `dir`.
    ///
    /// A record's `images` entry overrides the configured path. Absolute
    /// paths are used as-is; anything else resolves to its file name inside
    /// `dir`, which is also where downloaded images are saved.
    pub fn resolve(dir: &Path, specs: &[ImageSpec], overrides: &BTreeMap<String, String>) -> Self {
        let locate = |raw: &str| {
            let p = Path::new(raw);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                dir.join(p.file_name().unwrap_or(p.as_os_str()))
            }
        };

        let images = specs
            .iter()
            .map(|spec| {
                let raw = overrides.get(&spec.name).map_or(spec.path.as_str(), String::as_str);
                AssetImage {
                    name: spec.name.clone(),
                    path: locate(raw),
                    width_mm: spec.width_mm,
                    height_mm: spec.height_mm,
                }
            })
            .collect();

        Self {
            logo: AssetImage {
                name: LOGO_ASSET.into(),
                path: dir.join(LOGO_FILE),
                width_mm: LOGO_WIDTH_MM,
                height_mm: LOGO_HEIGHT_MM,
            },
            images,
        }
    }

    fn image(&self, name: &str) -> Option<&AssetImage> {
        self.images.iter().find(|i| i.name == name)
    }
}

// ── Layout ───────────────────────────────────────────────────────────────

/// Which [`CardStyle`] entry a text block uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Title,
    Subtitle,
    Section,
    Body,
    Footer,
}

/// One vertical element of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text {
        role: TextRole,
        text: String,
        centered: bool,
    },
    Bullets(Vec<String>),
    Image {
        name: String,
        path: PathBuf,
        width_mm: f64,
        height_mm: f64,
    },
    /// Placeholder of the image's size when its file is missing.
    Blank {
        name: String,
        width_mm: f64,
        height_mm: f64,
    },
    MetricTable(Vec<KeyNumber>),
    Spacer(f64),
    /// Two side-by-side columns of equal width.
    Columns { left: Vec<Block>, right: Vec<Block> },
}

/// The full page, top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    /// PDF document title.
    pub title: String,
    pub blocks: Vec<Block>,
}

impl CardLayout {
    /// Every block depth-first, column contents after their [`Block::Columns`].
    pub fn walk(&self) -> Vec<&Block> {
        fn visit<'a>(blocks: &'a [Block], out: &mut Vec<&'a Block>) {
            for block in blocks {
                out.push(block);
                if let Block::Columns { left, right } = block {
                    visit(left, out);
                    visit(right, out);
                }
            }
        }
        let mut out = Vec::new();
        visit(&self.blocks, &mut out);
        out
    }
}

/// Lay out the card.
///
/// Image boxes wider than the space they are placed in (a column or the
/// printable width) are scaled down to it. Every missing image file yields a
/// [`Block::Blank`] and a [`Degradation::MissingAsset`].
pub fn plan_layout(
    presentation: &CardPresentation,
    assets: &CardAssets,
    style: &CardStyle,
) -> (CardLayout, Vec<Degradation>) {
    let page_width = LETTER_WIDTH_MM - 2.0 * style.margin_mm;
    let column_width = (page_width - COLUMN_GAP_MM) / 2.0;
    let mut degradations = Vec::new();

    let mut image = |blocks: &mut Vec<Block>, asset: &AssetImage, max_width: f64| -> bool {
        let width_mm = asset.width_mm.min(max_width);
        let height_mm = asset.height_mm * (width_mm / asset.width_mm.max(f64::EPSILON));
        if asset.path.is_file() {
            blocks.push(Block::Image {
                name: asset.name.clone(),
                path: asset.path.clone(),
                width_mm,
                height_mm,
            });
            true
        } else {
            warn!("Image file not found: {}", asset.path.display());
            degradations.push(Degradation::MissingAsset {
                name: asset.name.clone(),
                path: asset.path.display().to_string(),
            });
            blocks.push(Block::Blank {
                name: asset.name.clone(),
                width_mm,
                height_mm,
            });
            false
        }
    };

    let text = |role, text: &str, centered| Block::Text {
        role,
        text: text.to_string(),
        centered,
    };
    let d = &presentation.model_details;
    let mut blocks = Vec::new();

    image(&mut blocks, &assets.logo, page_width);
    blocks.push(Block::Spacer(0.5));
    blocks.push(text(TextRole::Title, &presentation.model_name, true));
    blocks.push(text(
        TextRole::Subtitle,
        &format!("Version {} | {}", d.version, d.release_date),
        true,
    ));

    let mut left = vec![text(TextRole::Section, "Model Summary", false)];
    for paragraph in &presentation.plain_language_summary {
        left.push(text(TextRole::Body, paragraph, false));
    }
    if let Some(detection) = assets.image(DETECTION_IMAGE) {
        left.push(Block::Spacer(0.5));
        let found = image(&mut left, detection, column_width);
        if let (true, Some(caption)) = (found, presentation.detection_caption.as_deref()) {
            left.push(text(TextRole::Footer, caption, true));
        }
    }

    let mut right = vec![
        text(TextRole::Section, "Model Performance", false),
        Block::MetricTable(presentation.key_numbers.clone()),
    ];
    if let Some(pr) = assets.image(PR_CURVE_IMAGE) {
        right.push(Block::Spacer(0.5));
        image(&mut right, pr, column_width);
    }
    blocks.push(Block::Columns { left, right });

    for extra in assets
        .images
        .iter()
        .filter(|i| i.name != DETECTION_IMAGE && i.name != PR_CURVE_IMAGE)
    {
        image(&mut blocks, extra, page_width);
    }

    blocks.push(text(TextRole::Section, "Technical Details", false));
    blocks.push(Block::Bullets(vec![
        format!("Architecture: {}", d.architecture),
        format!("Input Size: {}", d.input_size),
        format!("Training Data: {}", d.training_data),
    ]));

    blocks.push(text(TextRole::Section, "Confidence Threshold Settings", false));
    blocks.push(Block::Bullets(
        presentation
            .confidence_thresholds
            .iter()
            .map(|t| format!("{}: {}", t.threshold, t.description))
            .collect(),
    ));

    if let Some(quote) = presentation.quote.as_deref().filter(|q| !q.trim().is_empty()) {
        blocks.push(Block::Spacer(0.5));
        blocks.push(text(TextRole::Subtitle, quote, true));
    }
    if let Some(disclaimer) = presentation.disclaimer.as_deref().filter(|q| !q.trim().is_empty()) {
        blocks.push(text(TextRole::Body, disclaimer, false));
    }

    let f = &presentation.footer_info;
    blocks.push(Block::Spacer(0.5));
    blocks.push(text(
        TextRole::Footer,
        &format!(
            "{} | Contact: {} | Version {} | {}",
            f.organization, f.contact_email, f.version, f.year
        ),
        true,
    ));

    let layout = CardLayout {
        title: format!("{} Model Card", presentation.model_name),
        blocks,
    };
    (layout, degradations)
}

// ── PDF output ───────────────────────────────────────────────────────────

/// Where to find a TrueType family (`<name>-Regular.ttf`, `-Bold`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct FontSource {
    /// `None` searches the usual system locations.
    pub dir: Option<PathBuf>,
    pub family: String,
}

impl Default for FontSource {
    fn default() -> Self {
        Self {
            dir: None,
            family: DEFAULT_FONT_FAMILY.into(),
        }
    }
}

impl FontSource {
    /// Load the family, trying the system font directories when no explicit
    /// directory is given.
    pub fn load(&self) -> Result<genpdf::fonts::FontFamily<genpdf::fonts::FontData>, ModelCardError> {
        if let Some(ref dir) = self.dir {
            return genpdf::fonts::from_files(dir, &self.family, None).map_err(|e| {
                ModelCardError::RenderFailed(format!(
                    "cannot load font family '{}' from {}: {e}",
                    self.family,
                    dir.display()
                ))
            });
        }

        let candidates: [(&str, &str); 5] = [
            ("", self.family.as_str()),
            ("/usr/share/fonts/truetype/liberation", self.family.as_str()),
            ("/usr/share/fonts/liberation", self.family.as_str()),
            ("/System/Library/Fonts", "Helvetica"),
            ("/Library/Fonts", "Arial"),
        ];
        for (dir, family) in candidates {
            match genpdf::fonts::from_files(dir, family, None) {
                Ok(f) => {
                    debug!("Loaded font family '{family}' from '{dir}'");
                    return Ok(f);
                }
                Err(e) => debug!("Font family '{family}' not in '{dir}': {e}"),
            }
        }
        Err(ModelCardError::RenderFailed(format!(
            "no usable font found for family '{}'; pass --fonts <dir>",
            self.family
        )))
    }
}

/// Render `layout` to `output`.
///
/// The file is written to a temp file next to `output` and renamed into
/// place. Images that exist but cannot be decoded are drawn as blanks and
/// reported.
pub fn render_pdf(
    layout: &CardLayout,
    style: &CardStyle,
    fonts: &FontSource,
    output: &Path,
) -> Result<Vec<Degradation>, ModelCardError> {
    style.validate()?;
    let family = fonts.load()?;
    let mut degradations = Vec::new();

    let mut doc = Document::new(family);
    doc.set_title(layout.title.clone());
    doc.set_paper_size(PaperSize::Letter);
    doc.set_font_size(style.body_style.font_size);
    doc.set_line_spacing(LINE_SPACING);
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(style.margin_mm);
    doc.set_page_decorator(decorator);

    let mut page = LinearLayout::vertical();
    push_blocks(&mut page, &layout.blocks, style, &mut degradations)?;
    doc.push(page);

    write_atomic(doc, output)?;
    Ok(degradations)
}

fn push_blocks(
    target: &mut LinearLayout,
    blocks: &[Block],
    style: &CardStyle,
    degradations: &mut Vec<Degradation>,
) -> Result<(), ModelCardError> {
    for block in blocks {
        match block {
            Block::Text {
                role,
                text,
                centered,
            } => {
                let font = style.font(role_style(style, *role));
                let mut p = Paragraph::new(StyledString::new(text.clone(), font));
                if *centered {
                    p.set_alignment(Alignment::Center);
                }
                if *role == TextRole::Section {
                    target.push(Break::new(0.5));
                }
                target.push(p);
            }
            Block::Bullets(items) => {
                let font = style.font(&style.body_style);
                let mut list = UnorderedList::with_bullet("•");
                for item in items {
                    list.push(Paragraph::new(StyledString::new(item.clone(), font)));
                }
                target.push(list);
            }
            Block::Image {
                name,
                path,
                width_mm,
                height_mm,
            } => match fitted_image(path, *width_mm, *height_mm) {
                Ok(img) => target.push(img),
                Err(detail) => {
                    warn!("Cannot draw image {}: {detail}", path.display());
                    degradations.push(Degradation::MissingAsset {
                        name: name.clone(),
                        path: path.display().to_string(),
                    });
                    target.push(BlankBox::new(*width_mm, *height_mm, style.background()));
                }
            },
            Block::Blank {
                width_mm,
                height_mm,
                ..
            } => target.push(BlankBox::new(*width_mm, *height_mm, style.background())),
            Block::MetricTable(rows) => target.push(metric_table(rows, style)?),
            Block::Spacer(lines) => target.push(Break::new(*lines)),
            Block::Columns { left, right } => {
                let mut left_column = LinearLayout::vertical();
                push_blocks(&mut left_column, left, style, degradations)?;
                let mut right_column = LinearLayout::vertical();
                push_blocks(&mut right_column, right, style, degradations)?;

                let half_gap = COLUMN_GAP_MM / 2.0;
                let mut columns = TableLayout::new(vec![1, 1]);
                columns
                    .row()
                    .element(left_column.padded(Margins::trbl(0, half_gap, 0, 0)))
                    .element(right_column.padded(Margins::trbl(0, 0, 0, half_gap)))
                    .push()
                    .map_err(|e| ModelCardError::RenderFailed(e.to_string()))?;
                target.push(columns);
            }
        }
    }
    Ok(())
}

fn role_style(style: &CardStyle, role: TextRole) -> &TextStyle {
    match role {
        TextRole::Title => &style.title_style,
        TextRole::Subtitle => &style.subtitle_style,
        TextRole::Section => &style.section_style,
        TextRole::Body => &style.body_style,
        TextRole::Footer => &style.footer_style,
    }
}

fn metric_table(rows: &[KeyNumber], style: &CardStyle) -> Result<TableLayout, ModelCardError> {
    let body = style.font(&style.body_style);
    let bold = body.clone().bold();
    let mut table = TableLayout::new(vec![3, 2, 7]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    if rows.is_empty() {
        table
            .row()
            .element(Paragraph::new(StyledString::new("No metrics reported", body.clone())).padded(1))
            .element(Paragraph::new("").padded(1))
            .element(Paragraph::new("").padded(1))
            .push()
            .map_err(|e| ModelCardError::RenderFailed(e.to_string()))?;
        return Ok(table);
    }

    for row in rows {
        table
            .row()
            .element(Paragraph::new(StyledString::new(row.metric.clone(), bold.clone())).padded(1))
            .element(Paragraph::new(StyledString::new(row.value.clone(), bold.clone())).padded(1))
            .element(Paragraph::new(StyledString::new(row.meaning.clone(), body.clone())).padded(1))
            .push()
            .map_err(|e| ModelCardError::RenderFailed(e.to_string()))?;
    }
    Ok(table)
}

/// Load an image and scale it to fit inside the box, keeping aspect ratio.
///
/// genpdf rejects alpha channels, so transparent images are composited onto
/// white first.
fn fitted_image(path: &Path, width_mm: f64, height_mm: f64) -> Result<Image, String> {
    let decoded = image::open(path).map_err(|e| e.to_string())?;
    let (px_w, px_h) = (decoded.width(), decoded.height());
    if px_w == 0 || px_h == 0 {
        return Err("image has no pixels".into());
    }
    let natural_w = f64::from(px_w) * 25.4 / IMAGE_DPI;
    let natural_h = f64::from(px_h) * 25.4 / IMAGE_DPI;
    let scale = (width_mm / natural_w).min(height_mm / natural_h);

    let img = if decoded.color().has_alpha() {
        debug!("Flattening alpha channel of {}", path.display());
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(flatten_onto_white(&decoded.to_rgba8()))
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| e.to_string())?;
        Image::from_reader(Cursor::new(png)).map_err(|e| e.to_string())?
    } else {
        Image::from_path(path).map_err(|e| e.to_string())?
    };
    Ok(img
        .with_dpi(IMAGE_DPI)
        .with_scale(Scale::new(scale, scale))
        .with_alignment(Alignment::Center))
}

fn flatten_onto_white(rgba: &image::RgbaImage) -> image::RgbImage {
    image::RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((u16::from(c) * u16::from(a) + 255 * (255 - u16::from(a))) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

fn write_atomic(doc: Document, output: &Path) -> Result<(), ModelCardError> {
    let write_err = |source: std::io::Error| ModelCardError::OutputWriteFailed {
        path: output.to_path_buf(),
        source,
    };
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    doc.render(tmp.as_file_mut())
        .map_err(|e| ModelCardError::RenderFailed(e.to_string()))?;
    tmp.persist(output).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// A filled rectangle standing in for an image that could not be drawn.
///
/// genpdf strokes lines at a fixed width, so the box is filled with closely
/// spaced horizontal strokes. It is centred like the images it replaces.
struct BlankBox {
    width_mm: f64,
    height_mm: f64,
    fill: Color,
}

impl BlankBox {
    fn new(width_mm: f64, height_mm: f64, fill: Color) -> Self {
        Self {
            width_mm,
            height_mm,
            fill,
        }
    }
}

impl Element for BlankBox {
    fn render(
        &mut self,
        _context: &Context,
        area: Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, genpdf::error::Error> {
        let mut result = RenderResult::default();
        if area.size().height < Mm::from(self.height_mm) {
            result.has_more = true;
            return Ok(result);
        }
        let left = ((f64::from(area.size().width) - self.width_mm) / 2.0).max(0.0);
        let stroke = Style::new().with_color(self.fill);
        let mut y = 0.0;
        while y <= self.height_mm {
            area.draw_line(
                vec![Position::new(left, y), Position::new(left + self.width_mm, y)],
                stroke,
            );
            y += FILL_STROKE_MM;
        }
        result.size = Size::new(self.width_mm, self.height_mm);
        Ok(result)
    }
}

// ── Entry points ─────────────────────────────────────────────────────────

/// What to render from.
#[derive(Debug, Clone)]
pub enum CardSource {
    /// A snapshot written by the fetch step.
    Snapshot(PathBuf),
    /// A hand-authored presentation JSON.
    Presentation(PathBuf),
    /// A record already in memory.
    Record(Box<ModelCardRecord>),
}

/// Renderer settings.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Default `Model_Card.pdf`.
    pub output: PathBuf,
    /// Directory holding the logo and card images. Default `assets`.
    pub assets_dir: PathBuf,
    pub images: Vec<ImageSpec>,
    pub style: CardStyle,
    pub fonts: FontSource,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            output: PathBuf::from("Model_Card.pdf"),
            assets_dir: PathBuf::from("assets"),
            images: default_images(),
            style: CardStyle::default(),
            fonts: FontSource::default(),
        }
    }
}

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub output: PathBuf,
    pub bytes: u64,
    pub degradations: Vec<Degradation>,
}

/// Load, present, plan and render a card.
///
/// Runs on the blocking pool; genpdf layout and image decoding are CPU-bound.
pub async fn build_card(source: CardSource, options: &RenderOptions) -> Result<RenderReport, ModelCardError> {
    let options = options.clone();
    tokio::task::spawn_blocking(move || build_card_blocking(source, &options))
        .await
        .map_err(|e| ModelCardError::Internal(format!("Render task panicked: {e}")))?
}

/// Synchronous wrapper around [`build_card`].
pub fn build_card_sync(source: CardSource, options: &RenderOptions) -> Result<RenderReport, ModelCardError> {
    build_card_blocking(source, options)
}

fn build_card_blocking(source: CardSource, options: &RenderOptions) -> Result<RenderReport, ModelCardError> {
    let (presentation, images) = match source {
        CardSource::Snapshot(path) => {
            let record = snapshot::load_snapshot(&path)?;
            (CardPresentation::from_record(&record), record.images)
        }
        CardSource::Presentation(path) => (CardPresentation::from_json_file(&path)?, BTreeMap::new()),
        CardSource::Record(record) => (CardPresentation::from_record(&record), record.images),
    };

    let assets = CardAssets::resolve(&options.assets_dir, &options.images, &images);
    let (layout, mut degradations) = plan_layout(&presentation, &assets, &options.style);
    degradations.extend(render_pdf(&layout, &options.style, &options.fonts, &options.output)?);

    let bytes = std::fs::metadata(&options.output)
        .map(|m| m.len())
        .map_err(|source| ModelCardError::OutputWriteFailed {
            path: options.output.clone(),
            source,
        })?;
    info!(
        "Model card PDF created at: {} ({} bytes, {} warnings)",
        options.output.display(),
        bytes,
        degradations.len()
    );

    Ok(RenderReport {
        output: options.output.clone(),
        bytes,
        degradations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn presentation() -> CardPresentation {
        let mut r = ModelCardRecord::new("akridge/fish", "akridge", "fish", "2025-01-02".into());
        r.sections.insert("Overview".into(), "Finds fish.".into());
        CardPresentation::from_record(&r)
    }

    fn write_png(path: &Path) {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([0, 92, 185]));
        img.save(path).unwrap();
    }

    #[test]
    fn missing_images_become_blanks() {
        let dir = TempDir::new().unwrap();
        let assets = CardAssets::resolve(dir.path(), &default_images(), &BTreeMap::new());
        let (layout, degradations) = plan_layout(&presentation(), &assets, &CardStyle::default());

        let blanks: Vec<(&str, f64, f64)> = layout
            .walk()
            .into_iter()
            .filter_map(|b| match b {
                Block::Blank {
                    name,
                    width_mm,
                    height_mm,
                } => Some((name.as_str(), *width_mm, *height_mm)),
                _ => None,
            })
            .collect();
        // The detection box is wider than its column and shrinks to fit.
        let page = LETTER_WIDTH_MM - 2.0 * CardStyle::default().margin_mm;
        let column = (page - COLUMN_GAP_MM) / 2.0;
        assert_eq!(
            blanks,
            vec![
                (LOGO_ASSET, LOGO_WIDTH_MM, LOGO_HEIGHT_MM),
                (DETECTION_IMAGE, column, 63.5 * (column / 101.6)),
                (PR_CURVE_IMAGE, 76.2, 50.8),
            ]
        );
        assert_eq!(degradations.len(), 3);
        assert!(degradations
            .iter()
            .all(|d| matches!(d, Degradation::MissingAsset { .. })));
        // No caption under a missing detection image.
        assert!(!layout.walk().iter().any(|b| matches!(
            b,
            Block::Text { text, .. } if text.contains("underwater")
        )));
    }

    #[test]
    fn present_images_are_placed() {
        let dir = TempDir::new().unwrap();
        write_png(&dir.path().join(LOGO_FILE));
        write_png(&dir.path().join("example_detection.png"));
        let assets = CardAssets::resolve(dir.path(), &default_images(), &BTreeMap::new());
        let (layout, degradations) = plan_layout(&presentation(), &assets, &CardStyle::default());

        assert_eq!(degradations.len(), 1);
        let images = layout
            .walk()
            .into_iter()
            .filter(|b| matches!(b, Block::Image { .. }))
            .count();
        assert_eq!(images, 2);
        assert!(layout.walk().iter().any(|b| matches!(
            b,
            Block::Text { text, .. } if text == "Example detection on underwater footage"
        )));
    }

    #[test]
    fn block_order() {
        let dir = TempDir::new().unwrap();
        let assets = CardAssets::resolve(dir.path(), &default_images(), &BTreeMap::new());
        let mut p = presentation();
        p.quote = Some("Know your fish.".into());
        let (layout, _) = plan_layout(&p, &assets, &CardStyle::default());

        let sections: Vec<&str> = layout
            .walk()
            .into_iter()
            .filter_map(|b| match b {
                Block::Text {
                    role: TextRole::Section,
                    text,
                    ..
                } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            sections,
            vec![
                "Model Summary",
                "Model Performance",
                "Technical Details",
                "Confidence Threshold Settings"
            ]
        );
        assert!(matches!(
            layout.blocks.first(),
            Some(Block::Blank { name, .. }) if name == LOGO_ASSET
        ));
        assert_eq!(
            layout
                .blocks
                .iter()
                .filter(|b| matches!(b, Block::Columns { .. }))
                .count(),
            1
        );
        assert!(matches!(
            layout.blocks.last(),
            Some(Block::Text { role: TextRole::Footer, text, .. }) if text.starts_with("NOAA / CIMAR | Contact:")
        ));
        assert!(layout.blocks.iter().any(|b| matches!(
            b,
            Block::Text { role: TextRole::Subtitle, text, .. } if text == "Version latest | 2025-01-02"
        )));
    }

    #[test]
    fn columns_split_summary_and_performance() {
        let dir = TempDir::new().unwrap();
        let assets = CardAssets::resolve(dir.path(), &default_images(), &BTreeMap::new());
        let (layout, _) = plan_layout(&presentation(), &assets, &CardStyle::default());
        let (left, right) = layout
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::Columns { left, right } => Some((left, right)),
                _ => None,
            })
            .unwrap();

        assert!(matches!(&left[0], Block::Text { text, .. } if text == "Model Summary"));
        assert!(left
            .iter()
            .any(|b| matches!(b, Block::Blank { name, .. } if name == DETECTION_IMAGE)));
        assert!(matches!(&right[0], Block::Text { text, .. } if text == "Model Performance"));
        assert!(matches!(right[1], Block::MetricTable(_)));
        assert!(right
            .iter()
            .any(|b| matches!(b, Block::Blank { name, .. } if name == PR_CURVE_IMAGE)));
    }

    #[test]
    fn transparent_pixels_flatten_to_white() {
        let mut rgba = image::RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, image::Rgba([0, 92, 185, 255]));
        let rgb = flatten_onto_white(&rgba);
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(1, 0).0, [0, 92, 185]);
    }

    #[test]
    fn transparent_png_is_drawable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logo.png");
        image::RgbaImage::from_pixel(8, 4, image::Rgba([0, 92, 185, 128]))
            .save(&path)
            .unwrap();
        assert!(fitted_image(&path, 40.0, 20.0).is_ok());
    }

    #[test]
    fn wide_boxes_are_clamped() {
        let dir = TempDir::new().unwrap();
        let specs = vec![ImageSpec {
            name: "banner".into(),
            path: "banner.png".into(),
            width_mm: 400.0,
            height_mm: 100.0,
        }];
        let assets = CardAssets::resolve(dir.path(), &specs, &BTreeMap::new());
        let style = CardStyle::default();
        let (layout, _) = plan_layout(&presentation(), &assets, &style);
        let max = LETTER_WIDTH_MM - 2.0 * style.margin_mm;
        let banner = layout.walk().into_iter().find_map(|b| match b {
            Block::Blank {
                name,
                width_mm,
                height_mm,
            } if name == "banner" => Some((*width_mm, *height_mm)),
            _ => None,
        });
        let (w, h) = banner.unwrap();
        assert!((w - max).abs() < 1e-9);
        assert!((h - 100.0 * max / 400.0).abs() < 1e-9);
    }

    #[test]
    fn record_overrides_and_absolute_paths() {
        let dir = TempDir::new().unwrap();
        let mut overrides = BTreeMap::new();
        overrides.insert(PR_CURVE_IMAGE.to_string(), "runs/val/PR_curve.png".to_string());
        overrides.insert(DETECTION_IMAGE.to_string(), "/abs/det.png".to_string());
        let assets = CardAssets::resolve(dir.path(), &default_images(), &overrides);
        assert_eq!(assets.image(PR_CURVE_IMAGE).unwrap().path, dir.path().join("PR_curve.png"));
        assert_eq!(assets.image(DETECTION_IMAGE).unwrap().path, PathBuf::from("/abs/det.png"));
    }

    #[test]
    fn bad_font_dir_is_render_failure() {
        let dir = TempDir::new().unwrap();
        let fonts = FontSource {
            dir: Some(dir.path().to_path_buf()),
            family: "NoSuchFont".into(),
        };
        let assets = CardAssets::resolve(dir.path(), &default_images(), &BTreeMap::new());
        let style = CardStyle::default();
        let (layout, _) = plan_layout(&presentation(), &assets, &style);
        let err = render_pdf(&layout, &style, &fonts, &dir.path().join("card.pdf")).unwrap_err();
        assert!(matches!(err, ModelCardError::RenderFailed(_)));
        assert!(!dir.path().join("card.pdf").exists());
    }

    #[test]
    fn missing_snapshot_fails_build() {
        let dir = TempDir::new().unwrap();
        let err = build_card_sync(
            CardSource::Snapshot(dir.path().join("model_data.json")),
            &RenderOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ModelCardError::SnapshotNotFound { .. }));
    }
}
