//! Wrapping a NanoPlot output directory as a visualization.
//!
//! The report files are copied under `nanoplot_data/` and an `index.html`
//! is written next to it that embeds NanoPlot's own report page and links
//! every other file it produced.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::artifact::store::list_files;
use crate::formats::ParseError;

/// Directory inside the visualization holding NanoPlot's files
pub const REPORT_DATA_DIR: &str = "nanoplot_data";

/// Main page NanoPlot writes into its output directory
pub const NANOPLOT_REPORT: &str = "NanoPlot-report.html";

const TEMPLATE: &str = include_str!("templates/report.html");
const TITLE: &str = "Nanoplot";

/// Minimal escaping for text placed in HTML attributes or content
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the index page for a list of report files (relative to `nanoplot_data/`)
#[must_use]
pub fn render_index(files: &[String]) -> String {
    let has_report = files.iter().any(|f| f == NANOPLOT_REPORT);
    let tabs = format!(
        "<a href=\"{REPORT_DATA_DIR}/{NANOPLOT_REPORT}\" target=\"_blank\">{TITLE}</a>"
    );

    let links: String = files
        .iter()
        .map(|f| {
            let f = escape_html(f);
            format!("    <li><a href=\"{REPORT_DATA_DIR}/{f}\" target=\"_blank\">{f}</a></li>\n")
        })
        .collect();
    let mut body = String::new();
    if has_report {
        body.push_str(&format!(
            "<iframe src=\"{REPORT_DATA_DIR}/{NANOPLOT_REPORT}\" title=\"{TITLE}\"></iframe>\n"
        ));
    }
    body.push_str(&format!("  <ul>\n{links}  </ul>"));

    TEMPLATE
        .replace("{{title}}", TITLE)
        .replace("{{tabs}}", &tabs)
        .replace("{{body}}", &body)
}

fn copy_tree(src: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Copy a NanoPlot output directory into `visualization_dir` and write its index
///
/// # Errors
///
/// Returns `ParseError::MissingOutput` if `nanoplot_dir` does not exist,
/// `ParseError::EmptyOutput` if it holds no files, and `ParseError::Io`
/// if copying fails.
pub fn build_visualization(nanoplot_dir: &Path, visualization_dir: &Path) -> Result<(), ParseError> {
    if !nanoplot_dir.is_dir() {
        return Err(ParseError::MissingOutput(nanoplot_dir.display().to_string()));
    }
    let files = list_files(nanoplot_dir)?;
    if files.is_empty() {
        return Err(ParseError::EmptyOutput("NanoPlot".to_string()));
    }
    debug!("NanoPlot wrote {} files", files.len());

    copy_tree(nanoplot_dir, &visualization_dir.join(REPORT_DATA_DIR))?;
    fs::write(
        visualization_dir.join(crate::artifact::VISUALIZATION_INDEX),
        render_index(&files),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_index_links_files() {
        let files = vec![NANOPLOT_REPORT.to_string(), "plots/<weird>.png".to_string()];
        let html = render_index(&files);
        assert!(html.contains("<title>Nanoplot</title>"));
        assert!(html.contains("<iframe src=\"nanoplot_data/NanoPlot-report.html\""));
        assert!(html.contains("href=\"nanoplot_data/plots/&lt;weird&gt;.png\" target=\"_blank\""));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_render_index_without_report_page() {
        let html = render_index(&["NanoStats.txt".to_string()]);
        assert!(!html.contains("<iframe"));
        assert!(html.contains("NanoStats.txt"));
    }

    #[test]
    fn test_build_visualization_copies_tree() {
        let dir = TempDir::new().unwrap();
        let report = dir.path().join("nanoplot");
        fs::create_dir_all(report.join("sub")).unwrap();
        fs::write(report.join(NANOPLOT_REPORT), "<html></html>").unwrap();
        fs::write(report.join("sub").join("plot.png"), "png").unwrap();

        let vis = dir.path().join("vis");
        fs::create_dir(&vis).unwrap();
        build_visualization(&report, &vis).unwrap();

        assert!(vis.join("index.html").exists());
        assert_eq!(
            fs::read_to_string(vis.join("nanoplot_data/sub/plot.png")).unwrap(),
            "png"
        );
    }

    #[test]
    fn test_empty_report_is_an_error() {
        let dir = TempDir::new().unwrap();
        let vis = dir.path().join("vis");
        fs::create_dir(&vis).unwrap();

        let err = build_visualization(dir.path().join("missing").as_path(), &vis).unwrap_err();
        assert!(matches!(err, ParseError::MissingOutput(_)));

        let empty = dir.path().join("empty");
        fs::create_dir(&empty).unwrap();
        let err = build_visualization(&empty, &vis).unwrap_err();
        assert!(matches!(err, ParseError::EmptyOutput(_)));
    }
}
