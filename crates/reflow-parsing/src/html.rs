/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// One `<p>` per non-blank paragraph, newline-separated; `<div></div>` when
/// nothing is left to render.
pub fn paragraphs_to_html(paragraphs: &[String]) -> String {
    let blocks: Vec<String> = paragraphs
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", escape_html(p)))
        .collect();
    if blocks.is_empty() {
        return "<div></div>".to_string();
    }
    blocks.join("\n")
}
