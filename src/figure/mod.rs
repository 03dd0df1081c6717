//! Figures of aggregated analyses
//!
//! Panels are rendered with plotters to SVG. Saving a figure places it
//! under the configured output prefix and logs the LaTeX snippets that
//! include it.
//!
//! ```no_run
//! use taskseq_analysis::analysis::{AnalysisField, Condition, ConditionAnalyses};
//! use taskseq_analysis::figure::{plot_processed_results_all_dimensions, FigureConfig, PanelStyle};
//! # fn demo(analyses: &ConditionAnalyses<taskseq_analysis::analysis::AnalysisSet>) -> taskseq_analysis::Result<()> {
//! let config = FigureConfig::default();
//! let saved = config.save("baseline/all_dimensions.svg", (2, 4), |root| {
//!     plot_processed_results_all_dimensions(
//!         root,
//!         analyses,
//!         AnalysisField::LogExamples,
//!         &Condition::ALL,
//!         "Baseline",
//!         &PanelStyle::default(),
//!     )
//! })?;
//! println!("{}", saved.latex.figure);
//! # Ok(())
//! # }
//! ```

mod latex;
mod render;
mod series;

use std::fs;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::{DrawingArea, IntoDrawingArea, SVGBackend};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::Result;

pub use latex::{label_name, LatexSnippets, DEFAULT_INCLUDE_PREFIX};
pub use render::{
    combined_comparison_plots, comparison_levels, examples_by_num_tasks_trained,
    examples_by_times_trained_on, plot_processed_results_all_dimensions, raw_accuracies_plot,
    tab10, Dash, FirstTimeHighlight, PanelStyle, Regression, YScale, DEFAULT_Y_LABEL,
    NUM_TIMES_TRAINED_LABEL, ORDINAL_POSITION_LABEL, TAB10,
};
pub use series::{
    default_log_scale_ticks, fit_regression_line, format_significant, generate_custom_ticks,
    raw_accuracy_series, tasks_trained_series, thousands_label, times_trained_series, Comparison,
    LinearFit, Series,
};

/// Default directory figures are written under.
pub const DEFAULT_SAVE_PATH_PREFIX: &str = "meta_learning/figures";

/// Where and how large figures are saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureConfig {
    /// Output directory prefix
    pub save_path_prefix: PathBuf,
    /// Directory used in `\includegraphics`
    pub include_prefix: String,
    /// Pixel size of one panel
    pub panel_size: (u32, u32),
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            save_path_prefix: PathBuf::from(DEFAULT_SAVE_PATH_PREFIX),
            include_prefix: DEFAULT_INCLUDE_PREFIX.to_string(),
            panel_size: (650, 500),
        }
    }
}

/// A figure written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFigure {
    /// File written
    pub path: PathBuf,
    /// Snippets including the figure
    pub latex: LatexSnippets,
}

impl FigureConfig {
    /// Canvas size of a `rows x cols` grid.
    #[must_use]
    pub const fn canvas_size(&self, grid: (usize, usize)) -> (u32, u32) {
        (
            self.panel_size.0 * grid.1 as u32,
            self.panel_size.1 * grid.0 as u32,
        )
    }

    /// Output file of `save_path`: the extension becomes `svg` and the
    /// prefix is added unless already present.
    #[must_use]
    pub fn output_path(&self, save_path: &str) -> PathBuf {
        let path = Path::new(save_path).with_extension("svg");
        if path.starts_with(&self.save_path_prefix) {
            path
        } else {
            self.save_path_prefix.join(path)
        }
    }

    /// Render a `rows x cols` grid figure and write it as SVG.
    ///
    /// # Errors
    ///
    /// Returns the drawing error, or an I/O error if the file or its
    /// directory cannot be written.
    pub fn save(
        &self,
        save_path: &str,
        grid: (usize, usize),
        draw: impl FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<()>,
    ) -> Result<SavedFigure> {
        let svg = render_svg(self.canvas_size(grid), draw)?;

        let include = Path::new(save_path).with_extension("svg");
        let latex = LatexSnippets::new(&include.to_string_lossy(), &self.include_prefix);
        info!("Figure:\n\n{}\n\nWrapfigure:\n\n{}\n", latex.figure, latex.wrapfigure);

        let path = self.output_path(save_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, svg)?;
        info!(path = %path.display(), "saved figure");
        Ok(SavedFigure { path, latex })
    }
}

/// Render into an in-memory SVG document.
///
/// # Errors
///
/// Returns the drawing error.
pub fn render_svg(
    size: (u32, u32),
    draw: impl FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<()>,
) -> Result<String> {
    let mut buffer = String::new();
    {
        let root = SVGBackend::with_string(&mut buffer, size).into_drawing_area();
        draw(&root)?;
        root.present().map_err(render::plot_error)?;
    }
    Ok(buffer)
}
