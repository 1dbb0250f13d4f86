//! Plain-text tables and record boxes for console output.

/// Renders rows under `headers` as a `|`-separated table with a `-+-` rule.
pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return "No records to display.".to_string();
    }

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![
        line(headers.to_vec()),
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    ];
    for row in rows {
        out.push(line(
            (0..headers.len())
                .map(|i| row.get(i).map(String::as_str).unwrap_or(""))
                .collect(),
        ));
    }
    out.join("\n")
}

/// Renders `key : value` pairs inside a box at least 40 columns wide.
pub fn boxed(fields: &[(&str, String)]) -> String {
    let key_width = fields.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let value_width = fields.iter().map(|(_, v)| v.chars().count()).max().unwrap_or(0);
    let inner = (key_width + value_width + 5).max(40);

    let mut out = vec![format!("┌{}┐", "─".repeat(inner))];
    for (key, value) in fields {
        let text = format!("{:<kw$} : {}", key, value, kw = key_width);
        let padding = inner.saturating_sub(text.chars().count() + 2);
        out.push(format!("│ {}{} │", text, " ".repeat(padding)));
    }
    out.push(format!("└{}┘", "─".repeat(inner)));
    out.join("\n")
}
