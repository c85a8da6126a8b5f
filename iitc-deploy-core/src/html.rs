//! Line-based HTML document builder for the index pages.

const VIEWPORT: &str = r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#;
const STYLESHEET: &str =
    r#"<link rel="stylesheet" href="http://code.jquery.com/mobile/1.4.4/jquery.mobile-1.4.4.min.css" />"#;
const SCRIPTS: &[&str] = &[
    r#"<script src="http://code.jquery.com/jquery-1.11.1.min.js"></script>"#,
    r#"<script src="http://code.jquery.com/mobile/1.4.4/jquery.mobile-1.4.4.min.js"></script>"#,
];

/// One line of markup and its indentation depth in tabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlLine {
    pub text: String,
    pub indent: usize,
}

impl HtmlLine {
    pub fn new(text: impl Into<String>, indent: usize) -> Self {
        Self {
            text: text.into(),
            indent,
        }
    }

    pub fn indented(&self) -> String {
        format!("{}{}", "\t".repeat(self.indent), self.text)
    }
}

/// Join lines into a single string, one line per `\n`.
pub fn render_lines(lines: &[HtmlLine]) -> String {
    lines
        .iter()
        .map(HtmlLine::indented)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full page skeleton: head with title, viewport and stylesheet; body with a
/// jQuery Mobile page holding `header` and `content` (already indented
/// relative to their container), followed by the script tags.
pub fn document_lines(
    title: &str,
    back_button: bool,
    header: Vec<HtmlLine>,
    content: Vec<HtmlLine>,
) -> Vec<HtmlLine> {
    let mut lines = vec![
        HtmlLine::new("<!DOCTYPE html>", 0),
        HtmlLine::new("<html>", 0),
        HtmlLine::new("<head>", 0),
        HtmlLine::new(format!("<title>{title}</title>"), 1),
        HtmlLine::new(VIEWPORT, 1),
        HtmlLine::new(STYLESHEET, 1),
        HtmlLine::new("</head>", 0),
        HtmlLine::new("<body>", 0),
    ];

    let back = if back_button {
        r#" data-add-back-btn="true""#
    } else {
        ""
    };
    let mut body = vec![
        HtmlLine::new(r#"<div data-role="page">"#, 0),
        HtmlLine::new(format!(r#"<div data-role="header"{back}>"#), 1),
    ];
    body.extend(header);
    body.push(HtmlLine::new("</div>", 1));
    body.push(HtmlLine::new(r#"<div data-role="content">"#, 1));
    body.extend(content);
    body.push(HtmlLine::new("</div>", 1));
    body.push(HtmlLine::new("</div>", 0));
    body.extend(SCRIPTS.iter().map(|s| HtmlLine::new(*s, 0)));

    lines.extend(body.into_iter().map(|mut line| {
        line.indent += 1;
        line
    }));
    lines.push(HtmlLine::new("</body>", 0));
    lines.push(HtmlLine::new("</html>", 0));
    lines
}
