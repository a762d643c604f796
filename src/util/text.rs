/// Escape text for inclusion in HTML element content or a quoted attribute.
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

/// First `max` characters of `text`, counted in chars so multi-byte titles never split.
pub fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Format a point total without a trailing `.0` for whole numbers.
pub fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{}", points as i64)
    } else {
        format!("{points:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate("修复登录 bug", 4), "修复登录");
        assert_eq!(truncate("short", 50), "short");
    }

    #[test]
    fn formats_whole_and_fractional_points() {
        assert_eq!(format_points(8.0), "8");
        assert_eq!(format_points(2.5), "2.5");
        assert_eq!(format_points(0.0), "0");
    }
}
