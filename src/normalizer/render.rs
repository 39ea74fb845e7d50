//! HTML and Markdown rendering.
//!
//! Each sheet becomes a `<section>` with a visible table and a hidden text
//! layer (row lines plus a pipe table) for consumers that index text rather
//! than render markup. Sections are joined into one standalone document.

use super::model::{FlatTable, NormalizeOptions, NormalizedSheet};

/// Visible separator placed between sheet sections.
pub const SHEET_SEPARATOR: &str = "\n<hr class=\"sheet-separator\">\n";

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:24px;color:#1f2328}\
table{border-collapse:collapse;margin:12px 0;font-size:13px}\
th,td{border:1px solid #d0d7de;padding:4px 8px;text-align:left;vertical-align:top}\
thead th{background:#f6f8fa;position:sticky;top:0}\
.sheet-summary{color:#57606a}\
.sheet-notice{color:#9a6700}\
.sheet-separator{margin:32px 0;border:0;border-top:2px solid #d0d7de}";

/// Escape text for HTML element and attribute content.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn markdown_cell(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

/// Pipe table of the header and up to `max_rows` data rows.
pub fn markdown_table(table: &FlatTable, max_rows: usize) -> String {
    let mut out = pipe_row(table.headers.iter().map(|h| markdown_cell(h)));
    out.push_str(&pipe_row(table.headers.iter().map(|_| "---".to_string())));
    for row in table.rows.iter().take(max_rows) {
        out.push_str(&pipe_row(row.iter().map(|c| markdown_cell(c))));
    }
    out
}

fn pipe_row(cells: impl Iterator<Item = String>) -> String {
    format!("| {} |\n", cells.collect::<Vec<_>>().join(" | "))
}

/// `<table>` with the flattened header and up to `max_rows` data rows.
pub fn html_table(table: &FlatTable, max_rows: usize) -> String {
    let mut out = String::from("<table>\n<thead><tr>");
    for header in &table.headers {
        out.push_str("<th>");
        out.push_str(&escape_html(header));
        out.push_str("</th>");
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in table.rows.iter().take(max_rows) {
        out.push_str("<tr>");
        for cell in row {
            out.push_str("<td>");
            out.push_str(&escape_html(cell).replace('\n', "<br>"));
            out.push_str("</td>");
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>");
    out
}

/// Render one sheet section.
pub fn sheet_fragment(
    anchor: &str,
    name: &str,
    table: &FlatTable,
    summary: &str,
    row_lines: &[String],
    options: &NormalizeOptions,
) -> String {
    let mut out = format!(
        "<section class=\"sheet-container\" id=\"{}\">\n<h2 class=\"sheet-title\">{}</h2>\n<p class=\"sheet-summary\">{}</p>\n",
        escape_html(anchor),
        escape_html(name),
        escape_html(summary)
    );

    out.push_str("<div class=\"rag-layer\" style=\"display:none\">\n");
    if !row_lines.is_empty() {
        out.push_str("<pre class=\"rag-rows\">");
        out.push_str(&escape_html(&row_lines.join("\n")));
        out.push_str("</pre>\n");
    }
    out.push_str("<pre class=\"rag-markdown\">");
    out.push_str(&escape_html(&markdown_table(table, options.max_markdown_rows)));
    out.push_str("</pre>\n</div>\n");

    out.push_str(&html_table(table, options.max_preview_rows));
    out.push('\n');
    if table.row_count() > options.max_preview_rows {
        out.push_str(&format!(
            "<p class=\"sheet-notice\">Showing the first {} of {} rows.</p>\n",
            options.max_preview_rows,
            table.row_count()
        ));
    }
    out.push_str("</section>");
    out
}

/// Wrap rendered sheets into one UTF-8 HTML document with a table of contents.
pub fn document(filename: &str, sheets: &[NormalizedSheet]) -> String {
    let title = escape_html(filename);
    let mut out = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n<h1 class=\"file-title\">{}</h1>\n",
        title, STYLE, title
    );

    let toc: Vec<String> = sheets.iter().map(|s| format!("- {}", s.name)).collect();
    out.push_str("<div class=\"rag-toc\" style=\"display:none\"><pre>");
    out.push_str(&escape_html(&format!("Sheets in {}:\n{}", filename, toc.join("\n"))));
    out.push_str("</pre></div>\n");

    out.push_str("<nav class=\"file-toc\">\n<ul>\n");
    for sheet in sheets {
        out.push_str(&format!(
            "<li><a href=\"#{}\">{}</a></li>\n",
            escape_html(&sheet.anchor),
            escape_html(&sheet.name)
        ));
    }
    out.push_str("</ul>\n</nav>\n");

    let body: Vec<&str> = sheets.iter().map(|s| s.markup.as_str()).collect();
    out.push_str(&body.join(SHEET_SEPARATOR));
    out.push_str("\n</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FlatTable {
        FlatTable {
            headers: vec!["Region".to_string(), "Sales_Q1".to_string()],
            rows: vec![
                vec!["North".to_string(), "10".to_string()],
                vec!["<South>".to_string(), "a|b".to_string()],
            ],
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
    }

    #[test]
    fn test_markdown_table() {
        let md = markdown_table(&table(), 10);
        assert_eq!(
            md,
            "| Region | Sales_Q1 |\n| --- | --- |\n| North | 10 |\n| <South> | a\\|b |\n"
        );
        assert_eq!(markdown_table(&table(), 1).lines().count(), 3);
    }

    #[test]
    fn test_html_table_escapes_cells() {
        let html = html_table(&table(), 10);
        assert!(html.contains("<thead><tr><th>Region</th><th>Sales_Q1</th></tr></thead>"));
        assert!(html.contains("<td>&lt;South&gt;</td>"));
        assert!(!html.contains("<South>"));
    }

    #[test]
    fn test_fragment_truncation_notice() {
        let options = NormalizeOptions {
            max_preview_rows: 1,
            ..NormalizeOptions::default()
        };
        let fragment = sheet_fragment("sheet-1", "Q3", &table(), "summary", &[], &options);
        assert!(fragment.contains("Showing the first 1 of 2 rows."));
        assert!(fragment.contains("id=\"sheet-1\""));
        assert!(fragment.contains("<td>North</td>"));
        assert!(!fragment.contains("<td>&lt;South&gt;</td>"));
    }

    #[test]
    fn test_document_has_toc_and_separator() {
        let sheet = |name: &str, anchor: &str| NormalizedSheet {
            name: name.to_string(),
            anchor: anchor.to_string(),
            markup: format!("<section id=\"{}\"></section>", anchor),
            summary: String::new(),
            rows: 0,
            columns: 0,
        };
        let doc = document("book.xlsx", &[sheet("One", "sheet-1"), sheet("Two & more", "sheet-2")]);

        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<meta charset=\"utf-8\">"));
        assert!(doc.contains("<a href=\"#sheet-2\">Two &amp; more</a>"));
        assert_eq!(doc.matches("class=\"sheet-separator\"").count(), 1);
        assert!(doc.find("sheet-1\"></section>").unwrap() < doc.find("sheet-2\"></section>").unwrap());
    }
}
