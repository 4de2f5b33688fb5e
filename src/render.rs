//! HTML pages for the landing form and the prediction result

use crate::types::assessment::RiskAssessment;
use std::fmt::Write;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

const RESULT_STYLE: &str = "\
body { font-family: system-ui, sans-serif; background: #f4f6f8; margin: 0; padding: 2rem; }
main { max-width: 720px; margin: 0 auto; background: #fff; padding: 2rem; border-radius: 8px; }
.result { padding: 1rem 1.25rem; border-radius: 6px; font-size: 1.2rem; font-weight: 600; }
.inputs { display: flex; flex-wrap: wrap; gap: 0.5rem; margin: 1.5rem 0; padding: 0; }
.inputs li { list-style: none; padding: 0.4rem 0.7rem; border-radius: 4px; color: #222; }
a { color: #0c5460; }";

/// Escape text for use in HTML content and attribute values
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Landing page with the measurement form
pub fn index_page(title: &str) -> String {
    INDEX_TEMPLATE.replace("{{title}}", &escape_html(title))
}

/// Result page: colored message box and the submitted values
pub fn result_page(title: &str, assessment: &RiskAssessment) -> String {
    let title = escape_html(title);

    let mut inputs = String::new();
    for input in &assessment.inputs {
        // write! into a String cannot fail
        let _ = writeln!(
            inputs,
            "    <li style=\"background: {}\"><strong>{}</strong>: {}</li>",
            input.color, input.name, input.value
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <style>
{style}
  </style>
</head>
<body>
<main>
  <h1>{title}</h1>
  <div class="result result-{result_type}" style="color: {text}; background: {bg}">{message}</div>
  <ul class="inputs">
{inputs}  </ul>
  <p><a href="/">Make another prediction</a></p>
</main>
</body>
</html>
"#,
        title = title,
        style = RESULT_STYLE,
        result_type = assessment.result_type.as_str(),
        text = assessment.colors.text,
        bg = assessment.colors.bg,
        message = escape_html(assessment.message),
        inputs = inputs,
    )
}
