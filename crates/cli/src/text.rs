use clonescan_core::{CodeClone, FormatStatistic, Statistic};

pub(crate) fn format_clones(clones: &[CodeClone]) -> String {
    let mut out = String::new();
    out.push_str(&format!("clones found: {}\n", clones.len()));

    for clone in clones {
        out.push('\n');
        out.push_str(&format!(
            "[{}] {} tokens, lines {}\n",
            clone.format,
            clone.duplication_a.token_count(),
            clone.duplication_a.line_span(),
        ));
        out.push_str(&format!(
            "- A {}:{}-{}\n",
            clone.duplication_a.source_id,
            clone.duplication_a.start.line,
            clone.duplication_a.end.line
        ));
        out.push_str(&format!(
            "- B {}:{}-{}\n",
            clone.duplication_b.source_id,
            clone.duplication_b.start.line,
            clone.duplication_b.end.line
        ));
    }

    out.push('\n');
    out
}

pub(crate) fn format_statistic(statistic: &Statistic) -> String {
    let mut out = String::new();
    out.push_str("== statistic ==\n");
    out.push_str(&format!(
        "{:<12} {:>8} {:>8} {:>8} {:>7} {:>10} {:>11} {:>8} {:>8}\n",
        "format", "sources", "lines", "tokens", "clones", "dup lines", "dup tokens", "lines%", "tokens%"
    ));
    for (format, stat) in &statistic.formats {
        out.push_str(&format_row(format, stat));
    }
    out.push_str(&format_row("total", &statistic.total));
    out.push('\n');
    out
}

fn format_row(name: &str, stat: &FormatStatistic) -> String {
    format!(
        "{name:<12} {:>8} {:>8} {:>8} {:>7} {:>10} {:>11} {:>7.2}% {:>7.2}%\n",
        stat.sources,
        stat.lines,
        stat.tokens,
        stat.clones,
        stat.duplicated_lines,
        stat.duplicated_tokens,
        stat.percentage,
        stat.percentage_tokens,
    )
}
