//! LaTeX snippets for saved figures

use std::path::Path;

/// Default `\includegraphics` directory inside the thesis sources.
pub const DEFAULT_INCLUDE_PREFIX: &str = "ch-results/figures";

/// Label derived from a save path: extension dropped, `/` and `_`
/// replaced with `-`.
#[must_use]
pub fn label_name(save_path: &str) -> String {
    let path = Path::new(save_path);
    let stem = match path.extension() {
        Some(ext) => &save_path[..save_path.len() - ext.len() - 1],
        None => save_path,
    };
    stem.replace(['/', '_'], "-")
}

/// Full-width and wrapped figure environments for one saved figure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatexSnippets {
    /// `figure` environment
    pub figure: String,
    /// `wrapfigure` environment, half the line width
    pub wrapfigure: String,
}

impl LatexSnippets {
    /// Snippets including `<include_prefix>/<save_path>`.
    #[must_use]
    pub fn new(save_path: &str, include_prefix: &str) -> Self {
        let label = label_name(save_path);
        let graphic = format!("{include_prefix}/{save_path}");
        let figure = format!(
            r"\begin{{figure}}[!htb]
% \vspace{{-0.225in}}
\centering
\includegraphics[width=\linewidth]{{{graphic}}}
\caption{{ {{\bf FIGURE TITLE.}} FIGURE DESCRIPTION.}}
\label{{fig:results-{label}}}
% \vspace{{-0.2in}}
\end{{figure}}
"
        );
        let wrapfigure = format!(
            r"\begin{{wrapfigure}}{{r}}{{0.5\linewidth}}
\vspace{{-.3in}}
\begin{{spacing}}{{1.0}}
\centering
\includegraphics[width=0.95\linewidth]{{{graphic}}}
\caption{{ {{\bf FIGURE TITLE.}} FIGURE DESCRIPTION.}}
\label{{fig:results-{label}}}
\end{{spacing}}
% \vspace{{-.25in}}
\end{{wrapfigure}}"
        );
        Self { figure, wrapfigure }
    }
}
