//! Panel and grid rendering
//!
//! Panels draw on any plotters backend. Log axes are drawn on linear
//! coordinates over `ln` of the data, with tick labels mapped back.

use std::ops::Range;

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use super::series::{
    default_log_scale_ticks, fit_regression_line, format_significant, raw_accuracy_series,
    tasks_trained_series, thousands_label, times_trained_series, Comparison, LinearFit, Series,
};
use crate::analysis::{
    AnalysisField, AnalysisSet, Condition, ConditionAnalyses, LevelAnalyses, ResultSet,
};
use crate::{Error, Result};

/// Colorbar label of the times-trained panels.
pub const ORDINAL_POSITION_LABEL: &str = "Task ordinal position";

/// Colorbar label of the tasks-trained panels.
pub const NUM_TIMES_TRAINED_LABEL: &str = "Number of times trained";

/// Default y label of the grid figures.
pub const DEFAULT_Y_LABEL: &str = "Log(trials to criterion)";

/// Matplotlib's `tab10` palette.
pub const TAB10: [RGBColor; 10] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xbc, 0xbd, 0x22),
    RGBColor(0x17, 0xbe, 0xcf),
];

const HIGHLIGHT_GREY: RGBColor = RGBColor(0xc0, 0xc0, 0xc0);

/// `tab10` color at `fraction` in `[0, 1)`.
#[must_use]
pub fn tab10(fraction: f64) -> RGBColor {
    let index = (fraction * TAB10.len() as f64).floor().clamp(0.0, 9.0) as usize;
    TAB10[index]
}

pub(crate) fn plot_error(e: impl std::fmt::Display) -> Error {
    Error::PlotError(e.to_string())
}

/// Y axis mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YScale {
    /// `LogTicks` for log result sets, `Linear` otherwise
    #[default]
    Auto,
    /// Values as they are
    Linear,
    /// Raw values shown on a log axis
    Log,
    /// Values already in log space; labelled in thousands of examples
    LogTicks,
}

impl YScale {
    fn resolve(self, result: &ResultSet) -> Self {
        match self {
            Self::Auto if result.is_log() => Self::LogTicks,
            Self::Auto => Self::Linear,
            other => other,
        }
    }
}

/// Regression overlay mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Regression {
    /// No fit
    #[default]
    Off,
    /// Fit and log the equation only
    Print,
    /// Fit, log and draw the line
    Plot,
}

/// Line dash pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dash {
    /// Continuous
    #[default]
    Solid,
    /// Long dashes
    Dashed,
    /// Short dashes
    Dotted,
}

impl Dash {
    /// Styles used for the first marked lines.
    pub const MARKED: [Self; 2] = [Self::Dashed, Self::Dotted];

    const fn pieces(self) -> usize {
        match self {
            Self::Solid => 1,
            Self::Dashed => 8,
            Self::Dotted => 20,
        }
    }

    fn segments(self, points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
        if points.len() < 2 {
            return Vec::new();
        }
        if self == Self::Solid {
            return vec![points.to_vec()];
        }
        let n = self.pieces();
        points
            .windows(2)
            .flat_map(|w| {
                let (a, b) = (w[0], w[1]);
                (0..n).step_by(2).map(move |i| {
                    let at = |t: f64| (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t);
                    vec![at(i as f64 / n as f64), at((i + 1) as f64 / n as f64)]
                })
            })
            .collect()
    }
}

/// Emphasis of the first-time line in a tasks-trained panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FirstTimeHighlight {
    /// Draw it dashed
    pub dashed: bool,
    /// Triangle markers instead of dots
    pub star: bool,
    /// Grey instead of the palette color
    pub grey: bool,
    /// Red dotted lines at three deviations
    pub bounds: bool,
}

/// Options shared by all panels.
#[derive(Debug, Clone)]
pub struct PanelStyle {
    /// Panel title; `None` uses the panel default
    pub title: Option<String>,
    /// X label; `None` uses the panel default
    pub x_label: Option<String>,
    /// Y label; `None` uses the result set name
    pub y_label: Option<String>,
    /// Log x axis
    pub log_x: bool,
    /// Y axis mode
    pub y_scale: YScale,
    /// Fixed y range, in the units of the drawn values
    pub ylim: Option<(f64, f64)>,
    /// Shade mean ± error
    pub shade_error: bool,
    /// Sample count for the standard error
    pub sem_n: f64,
    /// Horizontal reference line
    pub hline: Option<f64>,
    /// Regression overlay
    pub regression: Regression,
    /// Draw only the first lines
    pub num_lines: Option<usize>,
    /// Give the first lines distinct dash patterns
    pub num_lines_to_mark: usize,
    /// Tasks-trained first-time emphasis
    pub highlight_first_time: FirstTimeHighlight,
    /// Name each line in a legend
    pub legend: bool,
    /// Title font size; labels are smaller
    pub font_size: f64,
    /// Guide lines for `YScale::LogTicks`, in examples
    pub log_y_ticks: Vec<f64>,
}

impl Default for PanelStyle {
    fn default() -> Self {
        Self {
            title: None,
            x_label: None,
            y_label: None,
            log_x: false,
            y_scale: YScale::Auto,
            ylim: None,
            shade_error: false,
            sem_n: 1.0,
            hline: None,
            regression: Regression::Off,
            num_lines: None,
            num_lines_to_mark: 0,
            highlight_first_time: FirstTimeHighlight::default(),
            legend: false,
            font_size: 20.0,
            log_y_ticks: default_log_scale_ticks(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    None,
    Dot,
    Triangle,
}

struct Line {
    series: Series,
    color: RGBColor,
    dash: Dash,
    marker: Marker,
    label: Option<String>,
    shade: bool,
}

struct Panel<'a> {
    result: &'a ResultSet,
    lines: Vec<Line>,
    default_title: &'static str,
    default_x_label: &'static str,
    regression_digits: usize,
}

fn axis_label(name: &str, log: bool) -> String {
    if log {
        format!("Log({name})")
    } else {
        name.to_string()
    }
}

fn axis_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    let pad = if hi > lo {
        (hi - lo) * 0.05
    } else {
        lo.abs().max(1.0) * 0.05
    };
    (lo - pad)..(hi + pad)
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: Panel<'_>,
    style: &PanelStyle,
) -> Result<Option<LinearFit>> {
    let y_scale = style.y_scale.resolve(panel.result);
    let log_x = style.log_x;
    let to_x = |x: f64| if log_x { x.ln() } else { x };
    let to_y = |y: f64| if y_scale == YScale::Log { y.ln() } else { y };

    let fit = match style.regression {
        Regression::Off => None,
        Regression::Print | Regression::Plot => {
            let (x, y): (Vec<f64>, Vec<f64>) = panel
                .lines
                .iter()
                .filter(|l| l.shade)
                .flat_map(|l| l.series.x.iter().copied().zip(l.series.y.iter().copied()))
                .unzip();
            let fit = fit_regression_line(&x, &y, log_x, false)?;
            info!(
                regression = %fit.label(log_x, y_scale != YScale::Linear, panel.regression_digits),
                "fitted regression line"
            );
            Some(fit)
        }
    };
    let regression_points: Vec<(f64, f64)> = match (style.regression, fit) {
        (Regression::Plot, Some(fit)) => (1..=panel.result.mean.rows())
            .map(|x| {
                let x = x as f64;
                (to_x(x), to_y(fit.predict(x, log_x)))
            })
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect(),
        _ => Vec::new(),
    };

    let lines: Vec<Line> = panel
        .lines
        .into_iter()
        .map(|line| {
            let series = line.series.map_x(to_x);
            let series = if y_scale == YScale::Log {
                series.map_y(f64::ln)
            } else {
                series
            };
            Line { series, ..line }
        })
        .collect();

    let x_range = axis_range(
        lines
            .iter()
            .flat_map(|l| l.series.x.iter().copied())
            .chain(regression_points.iter().map(|p| p.0)),
    );
    let y_range = match style.ylim {
        Some((lo, hi)) => to_y(lo)..to_y(hi),
        None => axis_range(
            lines
                .iter()
                .flat_map(|l| {
                    let band = if style.shade_error && l.shade {
                        l.series.band()
                    } else {
                        Vec::new()
                    };
                    l.series
                        .y
                        .iter()
                        .copied()
                        .chain(band.into_iter().flat_map(|(_, lo, hi)| [lo, hi]))
                        .collect::<Vec<_>>()
                })
                .chain(style.hline.map(to_y))
                .chain(regression_points.iter().map(|p| p.1)),
        ),
    };

    let title = style
        .title
        .clone()
        .unwrap_or_else(|| panel.default_title.to_string());
    let x_label = style
        .x_label
        .clone()
        .unwrap_or_else(|| axis_label(panel.default_x_label, log_x));
    let y_label = style
        .y_label
        .clone()
        .unwrap_or_else(|| panel.result.name.clone());

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", style.font_size).into_font())
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range.clone(), y_range.clone())
        .map_err(plot_error)?;

    let x_format = |v: &f64| {
        if log_x {
            format_significant(v.exp(), 3)
        } else {
            format_significant(*v, 3)
        }
    };
    let y_format = |v: &f64| match y_scale {
        YScale::Log => format_significant(v.exp(), 3),
        YScale::LogTicks => thousands_label(v.exp()),
        YScale::Auto | YScale::Linear => format_significant(*v, 3),
    };
    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .x_label_formatter(&x_format)
        .y_label_formatter(&y_format)
        .axis_desc_style(("sans-serif", style.font_size * 0.75).into_font())
        .draw()
        .map_err(plot_error)?;

    if y_scale == YScale::LogTicks {
        let guide = BLACK.mix(0.1).stroke_width(1);
        for tick in style.log_y_ticks.iter().map(|t| t.ln()) {
            if y_range.contains(&tick) {
                let segments =
                    Dash::Dotted.segments(&[(x_range.start, tick), (x_range.end, tick)]);
                chart
                    .draw_series(segments.into_iter().map(|s| PathElement::new(s, guide)))
                    .map_err(plot_error)?;
            }
        }
    }

    if style.shade_error {
        for line in lines.iter().filter(|l| l.shade) {
            let band = line.series.band();
            if band.len() < 2 {
                continue;
            }
            let mut outline: Vec<(f64, f64)> = band.iter().map(|&(x, _, hi)| (x, hi)).collect();
            outline.extend(band.iter().rev().map(|&(x, lo, _)| (x, lo)));
            chart
                .draw_series(std::iter::once(Polygon::new(
                    outline,
                    line.color.mix(0.25).filled(),
                )))
                .map_err(plot_error)?;
        }
    }

    if let Some(y) = style.hline {
        let y = to_y(y);
        let hline = BLACK.mix(0.25).stroke_width(4);
        let segments = Dash::Dashed.segments(&[(x_range.start, y), (x_range.end, y)]);
        chart
            .draw_series(segments.into_iter().map(|s| PathElement::new(s, hline)))
            .map_err(plot_error)?;
    }

    for line in &lines {
        let points = line.series.points();
        let stroke = line.color.stroke_width(2);
        let anno = chart
            .draw_series(
                line.dash
                    .segments(&points)
                    .into_iter()
                    .map(|s| PathElement::new(s, stroke)),
            )
            .map_err(plot_error)?;
        if let Some(label) = &line.label {
            anno.label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], stroke));
        }

        let fill = line.color.filled();
        match line.marker {
            Marker::None => {}
            Marker::Dot => {
                chart
                    .draw_series(points.iter().map(|&p| Circle::new(p, 4, fill)))
                    .map_err(plot_error)?;
            }
            Marker::Triangle => {
                chart
                    .draw_series(points.iter().map(|&p| TriangleMarker::new(p, 7, fill)))
                    .map_err(plot_error)?;
            }
        }
    }

    if let Some(fit) = fit.filter(|_| !regression_points.is_empty()) {
        let stroke = RED.stroke_width(3);
        let label = fit.label(log_x, y_scale != YScale::Linear, panel.regression_digits);
        chart
            .draw_series(
                Dash::Dashed
                    .segments(&regression_points)
                    .into_iter()
                    .map(|s| PathElement::new(s, stroke)),
            )
            .map_err(plot_error)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], stroke));
    }

    let has_legend = style.legend || !regression_points.is_empty();
    if has_legend {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(plot_error)?;
    }

    Ok(fit)
}

fn line_count(style: &PanelStyle, rows: usize) -> usize {
    style.num_lines.unwrap_or(rows).min(rows)
}

/// Examples to criterion of each ordinal position against the number of
/// times it has been trained.
///
/// # Errors
///
/// Returns `PlotError` if drawing fails, or `InvalidInput` if a
/// requested regression has too few points.
pub fn examples_by_times_trained_on<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    result: &ResultSet,
    style: &PanelStyle,
) -> Result<Option<LinearFit>> {
    let rows = result.mean.rows();
    let lines = (0..line_count(style, rows))
        .map(|task| Line {
            series: times_trained_series(result, task, style.sem_n),
            color: tab10(task as f64 / rows as f64),
            dash: if task < style.num_lines_to_mark {
                Dash::MARKED.get(task).copied().unwrap_or_default()
            } else {
                Dash::Solid
            },
            marker: Marker::Dot,
            label: style.legend.then(|| format!("Task {}", task + 1)),
            shade: true,
        })
        .collect();
    draw_panel(
        area,
        Panel {
            result,
            lines,
            default_title: "Number of times trained on",
            default_x_label: "Number of times trained",
            regression_digits: 4,
        },
        style,
    )
}

/// Examples to criterion of each repetition count against the number of
/// tasks introduced so far.
///
/// # Errors
///
/// Returns `PlotError` if drawing fails, or `InvalidInput` if a
/// requested regression has too few points.
pub fn examples_by_num_tasks_trained<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    result: &ResultSet,
    style: &PanelStyle,
) -> Result<Option<LinearFit>> {
    let rows = result.mean.rows();
    let highlight = style.highlight_first_time;
    let mut lines = Vec::new();
    for times in 0..line_count(style, rows) {
        let series = tasks_trained_series(result, times, style.sem_n);
        let first = times == 0;
        if first && highlight.bounds {
            for sign in [-3.0, 3.0] {
                let bound = Series {
                    x: series.x.clone(),
                    y: series
                        .y
                        .iter()
                        .zip(&series.err)
                        .map(|(y, e)| y + sign * e)
                        .collect(),
                    err: vec![0.0; series.y.len()],
                };
                lines.push(Line {
                    series: bound,
                    color: RED,
                    dash: Dash::Dotted,
                    marker: Marker::None,
                    label: None,
                    shade: false,
                });
            }
        }
        lines.push(Line {
            color: if first && highlight.grey {
                HIGHLIGHT_GREY
            } else {
                tab10(times as f64 / rows as f64)
            },
            dash: if first && highlight.dashed {
                Dash::Dashed
            } else {
                Dash::Solid
            },
            marker: if first && highlight.star {
                Marker::Triangle
            } else {
                Marker::Dot
            },
            label: style.legend.then(|| format!("Trained {}x", times + 1)),
            shade: true,
            series,
        });
    }
    draw_panel(
        area,
        Panel {
            result,
            lines,
            default_title: "Number of tasks trained on",
            default_x_label: "Episode number",
            regression_digits: 3,
        },
        style,
    )
}

/// Raw accuracy curves, one per row, against training examples seen.
///
/// `examples_per_epoch(row)` scales the epochs of `row`; with
/// `consecutive` each curve starts where the previous one ended.
///
/// # Errors
///
/// Returns `PlotError` if drawing fails.
pub fn raw_accuracies_plot<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    result: &ResultSet,
    examples_per_epoch: impl Fn(usize) -> f64,
    consecutive: bool,
    style: &PanelStyle,
) -> Result<()> {
    let rows = result.mean.rows();
    let mut start_x = 0.0;
    let mut lines = Vec::new();
    for row in 0..line_count(style, rows) {
        let offset = if consecutive { start_x } else { 0.0 };
        let series = raw_accuracy_series(result, row, examples_per_epoch(row), style.sem_n, offset);
        if consecutive {
            if let Some(&last) = series.x.last() {
                start_x = last;
            }
        }
        lines.push(Line {
            series,
            color: tab10(row as f64 / rows as f64),
            dash: Dash::Solid,
            marker: Marker::None,
            label: style.legend.then(|| format!("Task {}", row + 1)),
            shade: true,
        });
    }
    let style = PanelStyle {
        y_scale: YScale::Linear,
        regression: Regression::Off,
        ..style.clone()
    };
    draw_panel(
        area,
        Panel {
            result,
            lines,
            default_title: "Accuracy vs. number of training trials",
            default_x_label: "Number of training trials",
            regression_digits: 4,
        },
        &style,
    )
    .map(|_| ())
}

/// Times-trained panels on top, tasks-trained panels below, one column
/// per condition.
///
/// # Errors
///
/// Returns `InvalidInput` without conditions, otherwise the first
/// panel error.
pub fn plot_processed_results_all_dimensions<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    analyses: &ConditionAnalyses<AnalysisSet>,
    field: AnalysisField,
    conditions: &[Condition],
    title: &str,
    style: &PanelStyle,
) -> Result<()> {
    if conditions.is_empty() {
        return Err(Error::InvalidInput("no conditions to plot".to_string()));
    }
    root.fill(&WHITE).map_err(plot_error)?;
    let root = root
        .titled(title, ("sans-serif", style.font_size * 1.5).into_font())
        .map_err(plot_error)?;
    let panels = root.split_evenly((2, conditions.len()));
    let (top, bottom) = panels.split_at(conditions.len());

    for (i, &condition) in conditions.iter().enumerate() {
        let result = analyses.get(condition).result(field);
        let times_style = PanelStyle {
            title: Some(if conditions.len() > 1 {
                condition.title()
            } else {
                String::new()
            }),
            y_label: Some(if i == 0 {
                style.y_label.clone().unwrap_or_else(|| DEFAULT_Y_LABEL.to_string())
            } else {
                String::new()
            }),
            ..style.clone()
        };
        examples_by_times_trained_on(&top[i], result, &times_style)?;

        let tasks_style = PanelStyle {
            title: Some(String::new()),
            y_label: Some(
                style
                    .y_label
                    .clone()
                    .unwrap_or_else(|| DEFAULT_Y_LABEL.to_string()),
            ),
            ..style.clone()
        };
        examples_by_num_tasks_trained(&bottom[i], result, &tasks_style)?;
    }
    Ok(())
}

/// Modulated-minus-baseline (or any other comparison) for every
/// replication level with runs in `condition`, one column per level.
///
/// `style.hline` overrides the comparison's null line.
///
/// # Errors
///
/// Returns `InvalidComparison` for a custom comparison without a null
/// line, `InvalidInput` if no level has runs in `condition`, otherwise
/// the first panel error.
#[allow(clippy::too_many_arguments)]
pub fn combined_comparison_plots<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    baseline: &ConditionAnalyses<AnalysisSet>,
    per_level: &LevelAnalyses,
    condition: Condition,
    field: AnalysisField,
    comparison: Comparison,
    baseline_first: bool,
    title: &str,
    style: &PanelStyle,
) -> Result<()> {
    let null_line = match style.hline {
        Some(y) => y,
        None => comparison.null_line()?,
    };
    let levels = comparison_levels(per_level, condition);
    if levels.is_empty() {
        return Err(Error::InvalidInput(format!(
            "no replication level has {} runs to compare",
            condition.as_str()
        )));
    }

    root.fill(&WHITE).map_err(plot_error)?;
    let root = root
        .titled(title, ("sans-serif", style.font_size * 1.5).into_font())
        .map_err(plot_error)?;
    let panels = root.split_evenly((2, levels.len()));
    let (top, bottom) = panels.split_at(levels.len());

    let base = baseline.get(condition).result(field);
    for (i, (level, analyses)) in levels.iter().enumerate() {
        let diff = comparison.compare(analyses.result(field), base, baseline_first)?;
        let y_label = if i == 0 {
            style.y_label.clone().unwrap_or_default()
        } else {
            String::new()
        };
        let panel_style = PanelStyle {
            hline: Some(null_line),
            y_label: Some(y_label),
            y_scale: match style.y_scale {
                YScale::Auto => YScale::Linear,
                other => other,
            },
            ..style.clone()
        };

        let times_style = PanelStyle {
            title: Some(format!("Conv-{level} modulation")),
            ..panel_style.clone()
        };
        examples_by_times_trained_on(&top[i], &diff, &times_style)?;

        let tasks_style = PanelStyle {
            title: Some(String::new()),
            ..panel_style
        };
        examples_by_num_tasks_trained(&bottom[i], &diff, &tasks_style)?;
    }
    Ok(())
}

/// Levels with an aggregation for `condition`, in level order.
#[must_use]
pub fn comparison_levels(
    per_level: &LevelAnalyses,
    condition: Condition,
) -> Vec<(u32, &AnalysisSet)> {
    per_level
        .iter()
        .filter_map(|(&level, analyses)| analyses.get(condition).as_ref().map(|set| (level, set)))
        .collect()
}
