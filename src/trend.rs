//! Stacked-bar trend rendering.
//!
//! The final pipeline stage: load the aggregate CSV back and render a
//! stacked bar chart (one bar per area path, one segment per category)
//! to a PNG file.

use anyhow::{bail, Context, Result};
use plotters::prelude::*;
use std::path::Path;
use tracing::info;

/// Chart dimensions in pixels.
const CHART_SIZE: (u32, u32) = (1000, 600);

/// Chart title.
const CHART_TITLE: &str = "Test Case Automation Status by Area Path";

/// Tabular data loaded for rendering: category names from the header
/// plus one labelled row of counts per area path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendData {
    /// Category column names, in header order.
    pub categories: Vec<String>,
    /// One row per area path: label plus a count per category.
    pub rows: Vec<(String, Vec<u64>)>,
}

impl TrendData {
    /// Load trend data from a CSV file.
    ///
    /// The first column is the area-path label; every remaining column is
    /// a numeric category. A missing category column or a non-numeric
    /// value is fatal.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let headers = reader.headers()?.clone();
        if headers.len() < 2 {
            bail!(
                "{} needs an area-path column and at least one category column",
                path.display()
            );
        }
        let categories: Vec<String> = headers.iter().skip(1).map(String::from).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let label = record
                .get(0)
                .context("row is missing the area-path column")?
                .to_string();

            let mut counts = Vec::with_capacity(categories.len());
            for (index, category) in categories.iter().enumerate() {
                let raw = record
                    .get(index + 1)
                    .with_context(|| format!("row {:?} is missing column {}", label, category))?;
                let count: u64 = raw.parse().with_context(|| {
                    format!("non-numeric {} value {:?} for {}", category, raw, label)
                })?;
                counts.push(count);
            }

            rows.push((label, counts));
        }

        Ok(Self { categories, rows })
    }

    /// Tallest stacked bar, used to size the y axis.
    fn max_stack(&self) -> u64 {
        self.rows
            .iter()
            .map(|(_, counts)| counts.iter().sum())
            .max()
            .unwrap_or(0)
    }
}

/// Render trend data as a stacked bar chart PNG.
///
/// Writes exactly one image file at `output`, overwriting if present.
pub fn render_chart(data: &TrendData, output: &Path) -> Result<()> {
    if data.rows.is_empty() {
        bail!("no rows to plot");
    }

    let root = BitMapBackend::new(output, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    // Headroom above the tallest bar so it does not touch the frame.
    let y_max = data.max_stack().max(1);
    let y_end = y_max + y_max / 10 + 1;

    let mut chart = ChartBuilder::on(&root)
        .caption(CHART_TITLE, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(120)
        .y_label_area_size(60)
        .build_cartesian_2d((0..data.rows.len()).into_segmented(), 0u64..y_end)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Area Path")
        .y_desc("Number of Test Cases")
        .x_labels(data.rows.len())
        .x_label_style(
            ("sans-serif", 12)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .x_label_formatter(&|value| {
            let index = match value {
                SegmentValue::CenterOf(index) | SegmentValue::Exact(index) => *index,
                SegmentValue::Last => return String::new(),
            };
            data.rows
                .get(index)
                .map(|(label, _)| label.clone())
                .unwrap_or_default()
        })
        .draw()?;

    // One series per category; segments stack on the running base.
    for (category_index, category) in data.categories.iter().enumerate() {
        let color = Palette99::pick(category_index);

        chart
            .draw_series(data.rows.iter().enumerate().map(|(row_index, (_, counts))| {
                let base: u64 = counts[..category_index].iter().sum();
                let top = base + counts[category_index];
                let mut bar = Rectangle::new(
                    [
                        (SegmentValue::Exact(row_index), base),
                        (SegmentValue::Exact(row_index + 1), top),
                    ],
                    color.filled(),
                );
                bar.set_margin(0, 0, 8, 8);
                bar
            }))?
            .label(category)
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
            });
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;

    root.present()
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!(
        "Rendered {} area paths to {}",
        data.rows.len(),
        output.display()
    );
    Ok(())
}

/// Load a CSV table and render it in one step.
pub fn plot_trend(input: &Path, output: &Path) -> Result<()> {
    let data = TrendData::from_csv(input)?;
    render_chart(&data, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_trend_data() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_csv(
            dir.path(),
            "input.csv",
            "AreaPath,automated,manual,automatable\n/MSTeams/Foo,25,5,10\n/MSTeams/Bar,0,3,1\n",
        );

        let data = TrendData::from_csv(&input).unwrap();

        assert_eq!(data.categories, vec!["automated", "manual", "automatable"]);
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.rows[0], ("/MSTeams/Foo".to_string(), vec![25, 5, 10]));
        assert_eq!(data.max_stack(), 40);
    }

    #[test]
    fn test_load_rejects_non_numeric_values() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_csv(
            dir.path(),
            "bad.csv",
            "AreaPath,automated\n/MSTeams/Foo,many\n",
        );

        assert!(TrendData::from_csv(&input).is_err());
    }

    #[test]
    fn test_load_rejects_missing_category_columns() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_csv(dir.path(), "narrow.csv", "AreaPath\n/MSTeams/Foo\n");

        assert!(TrendData::from_csv(&input).is_err());
    }

    #[test]
    fn test_render_smoke() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_csv(
            dir.path(),
            "input.csv",
            "AreaPath,automated,manual,automatable\n/MSTeams/Foo,25,5,10\n",
        );
        let output = dir.path().join("trend.png");

        plot_trend(&input, &output).unwrap();

        let metadata = fs::metadata(&output).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn test_render_empty_table_fails() {
        let data = TrendData {
            categories: vec!["automated".to_string()],
            rows: vec![],
        };
        let dir = tempfile::tempdir().unwrap();

        assert!(render_chart(&data, &dir.path().join("empty.png")).is_err());
    }
}
