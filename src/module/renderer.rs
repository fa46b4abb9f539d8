///! Summary image renderer
///!
///! Fills the fixed 600x400 SVG template with the aggregate snapshot
///! and rasterizes it to a single well-known PNG, overwriting the
///! previous image on every successful refresh.

use anyhow::{Context, Result};
use resvg::tiny_skia;
use resvg::usvg::{Options, Tree, fontdb};
use std::path::{Path, PathBuf};

use crate::module::country::types::{ImageData, format_utc_seconds};

const SVG_TEMPLATE: &str = include_str!("../../resources/summary_template.svg");
const OUTPUT_FILE: &str = "summary.png";

const ROWS_START_Y: f32 = 150.0;
const ROW_HEIGHT: f32 = 30.0;

/// Summary renderer
pub struct SummaryRenderer {
    output_dir: PathBuf,
}

impl SummaryRenderer {
    /// Create a new renderer writing into `output_dir`.
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// The well-known path of the generated image.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(OUTPUT_FILE)
    }

    /// Render the snapshot and overwrite the cached PNG.
    pub async fn render(&self, data: &ImageData) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .context("Failed to create image output directory")?;

        let svg_content = Self::build_svg(data);
        let output_path = self.output_path();
        render_svg_to_png(&svg_content, &output_path).await?;

        tracing::info!("Generated summary image: {:?}", output_path);
        Ok(output_path)
    }

    fn build_svg(data: &ImageData) -> String {
        let mut rows = String::new();
        for (i, entry) in data.top_countries_by_gdp.iter().take(5).enumerate() {
            let y = ROWS_START_Y + i as f32 * ROW_HEIGHT;
            rows.push_str(&format!(
                "  <text x=\"40\" y=\"{:.0}\" font-size=\"15\" fill=\"#FFFFFF\">{}. {} - {}</text>\n",
                y,
                i + 1,
                Self::escape_xml(&entry.name),
                format_gdp(entry.estimated_gdp),
            ));
        }

        let timestamp = data
            .last_refreshed_at
            .as_ref()
            .map(format_utc_seconds)
            .unwrap_or_else(|| "N/A".to_string());

        SVG_TEMPLATE
            .replace("{{TOTAL_COUNTRIES}}", &data.total_countries.to_string())
            .replace("{{GDP_ROWS}}", &rows)
            .replace("{{LAST_REFRESHED_AT}}", &timestamp)
    }

    fn escape_xml(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;")
    }
}

/// "$1,234,567.8" with a thousands separator, or "N/A" when no GDP
/// could be computed.
fn format_gdp(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("${}", group_thousands(v)),
        None => "N/A".to_string(),
    }
}

fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.1}", value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some(parts) => parts,
        None => (fixed.as_str(), "0"),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

async fn render_svg_to_png(svg_content: &str, output_path: &Path) -> Result<()> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    tracing::debug!("Loaded {} font faces", db.len());

    let mut options = Options::default();
    options.font_family = "DejaVu Sans".to_string();
    options.fontdb = std::sync::Arc::new(db);

    let tree = Tree::from_str(svg_content, &options).context("Failed to parse SVG")?;

    let size = tree.size();
    let width = size.width() as u32;
    let height = size.height() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width, height).context("Failed to create pixmap")?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    pixmap
        .save_png(output_path)
        .context("Failed to save PNG")?;

    Ok(())
}
