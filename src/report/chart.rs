use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use tracing::info;

use crate::error::{EtlError, Result};
use crate::query::QueryResults;

pub const TOP_CHART: &str = "query1_top_banks_market_cap.png";
pub const AVERAGE_CHART: &str = "query2_avg_market_cap.png";
pub const THRESHOLD_CHART: &str = "query3_high_market_cap_banks.png";

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);
const LIGHT_CORAL: RGBColor = RGBColor(240, 128, 128);

const FONT: &str = "sans-serif";
static FONT_BYTES: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

#[derive(Debug, Clone)]
pub struct ChartPaths {
    pub top: PathBuf,
    pub average: PathBuf,
    pub threshold: PathBuf,
}

fn chart_err<E: std::fmt::Display>(e: E) -> EtlError {
    EtlError::Chart(e.to_string())
}

/// Bitmap text needs a registered font; done once per process.
fn ensure_font() -> Result<()> {
    static REGISTERED: OnceLock<std::result::Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| {
            register_font(FONT, FontStyle::Normal, FONT_BYTES)
                .map_err(|_| format!("invalid font data for {FONT}"))
        })
        .clone()
        .map_err(EtlError::Chart)
}

/// Render the three report charts into `dir`, overwriting existing files.
pub fn render_charts(dir: &Path, results: &QueryResults) -> Result<ChartPaths> {
    ensure_font()?;
    std::fs::create_dir_all(dir)?;
    let paths = ChartPaths {
        top: dir.join(TOP_CHART),
        average: dir.join(AVERAGE_CHART),
        threshold: dir.join(THRESHOLD_CHART),
    };

    let top: Vec<(&str, f64)> = results
        .top_by_inr
        .iter()
        .map(|r| (r.name.as_str(), r.market_cap_inr))
        .collect();
    horizontal_bars(
        &paths.top,
        &format!("Top {} Banks by Market Cap in INR", top.len()),
        "Market Cap (INR Billion)",
        top,
        SKY_BLUE,
    )?;

    single_bar(
        &paths.average,
        "Average Market Cap",
        "Average Market Cap (US$ billion)",
        results.average_usd.unwrap_or(0.0),
        LIGHT_GREEN,
    )?;

    let above: Vec<(&str, f64)> = results
        .above_inr_threshold
        .iter()
        .map(|r| (r.name.as_str(), r.market_cap_inr))
        .collect();
    horizontal_bars(
        &paths.threshold,
        &format!("Banks with Market Cap > {} Billion INR", results.threshold),
        "Market Cap (INR Billion)",
        above,
        LIGHT_CORAL,
    )?;

    info!(dir = %dir.display(), "Charts written");
    Ok(paths)
}

/// Horizontal bar chart, largest value on top.
fn horizontal_bars(
    path: &Path,
    title: &str,
    x_desc: &str,
    mut bars: Vec<(&str, f64)>,
    color: RGBColor,
) -> Result<()> {
    bars.sort_by(|a, b| b.1.total_cmp(&a.1));
    let n = bars.len();
    let x_max = axis_max(bars.first().map(|b| b.1).unwrap_or(0.0));
    // Row 0 is the bottom of the plot; bar i sits on row n-1-i.
    let label = |y: &f64| -> String {
        let row = y.round();
        if (y - row).abs() > 1e-6 || row < 0.0 || row as usize >= n {
            return String::new();
        }
        bars[n - 1 - row as usize].0.to_string()
    };

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(320)
        .build_cartesian_2d(0f64..x_max, -0.5f64..(n.max(1) as f64 - 0.5))
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n.max(1))
        .y_label_formatter(&label)
        .x_desc(x_desc)
        .label_style((FONT, 14))
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(bars.iter().enumerate().map(|(i, (_, value))| {
            let row = (n - 1 - i) as f64;
            Rectangle::new([(0.0, row - 0.4), (*value, row + 0.4)], color.filled())
        }))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

fn single_bar(path: &Path, title: &str, y_desc: &str, value: f64, color: RGBColor) -> Result<()> {
    let root = BitMapBackend::new(path, (600, 400)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 20))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..0.5f64, 0f64..axis_max(value))
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(3)
        .x_label_formatter(&|x: &f64| {
            if x.abs() < 1e-6 {
                title.to_string()
            } else {
                String::new()
            }
        })
        .y_desc(y_desc)
        .label_style((FONT, 12))
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(-0.3, 0.0), (0.3, value)],
            color.filled(),
        )))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

/// Upper axis bound with some headroom; never an empty range.
fn axis_max(largest: f64) -> f64 {
    if largest > 0.0 {
        largest * 1.1
    } else {
        1.0
    }
}
