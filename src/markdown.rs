//! Formatting of Markdown output for the terminal.
//!
//! Pipe tables are re-laid-out with padded, aligned columns. When styling is enabled, inline
//! emphasis is converted to ANSI styles instead of being printed verbatim.

use crate::{
    constants::{STRIKE_MARKER, STRONG_MARKER},
    errors::BranchesResult,
};
use itertools::Itertools;
use nu_ansi_term::Style;
use std::fmt::Write;
use unicode_width::UnicodeWidthStr;

/// The alignment of a table column, from its separator cell.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Alignment {
    /// `---`
    Default,
    /// `:---`
    Left,
    /// `---:`
    Right,
    /// `:---:`
    Center,
}

impl Alignment {
    fn parse(cell: &str) -> Option<Self> {
        let dashes = cell.trim_start_matches(':').trim_end_matches(':');
        if dashes.is_empty() || !dashes.chars().all(|c| c == '-') {
            return None;
        }
        Some(match (cell.starts_with(':'), cell.ends_with(':')) {
            (true, true) => Self::Center,
            (true, false) => Self::Left,
            (false, true) => Self::Right,
            (false, false) => Self::Default,
        })
    }

    /// Renders the separator cell, `width` characters wide.
    fn separator(self, width: usize) -> String {
        let (left, right) = match self {
            Self::Default => (false, false),
            Self::Left => (true, false),
            Self::Right => (false, true),
            Self::Center => (true, true),
        };
        let dashes = width.saturating_sub(left as usize + right as usize);
        format!(
            "{}{}{}",
            if left { ":" } else { "" },
            "-".repeat(dashes),
            if right { ":" } else { "" }
        )
    }

    /// Pads `rendered`, whose visible width is `visible`, to `width`.
    fn pad(self, rendered: &str, visible: usize, width: usize) -> String {
        let fill = width.saturating_sub(visible);
        match self {
            Self::Default | Self::Left => format!("{}{}", rendered, " ".repeat(fill)),
            Self::Right => format!("{}{}", " ".repeat(fill), rendered),
            Self::Center => format!(
                "{}{}{}",
                " ".repeat(fill / 2),
                rendered,
                " ".repeat(fill - fill / 2)
            ),
        }
    }
}

/// A run of inline text.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Span<'a> {
    Plain(&'a str),
    Strong(&'a str),
    Strike(&'a str),
}

/// Splits `text` into plain, `**strong**` and `~~struck~~` runs. Unterminated markers are plain.
fn spans(mut text: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    while !text.is_empty() {
        let next = [STRONG_MARKER, STRIKE_MARKER]
            .into_iter()
            .filter_map(|marker| {
                let start = text.find(marker)?;
                let len = text[start + marker.len()..].find(marker)?;
                Some((start, marker, len))
            })
            .min_by_key(|(start, _, _)| *start);

        let Some((start, marker, len)) = next else {
            spans.push(Span::Plain(text));
            break;
        };
        if start > 0 {
            spans.push(Span::Plain(&text[..start]));
        }
        let inner = &text[start + marker.len()..start + marker.len() + len];
        spans.push(if marker == STRONG_MARKER {
            Span::Strong(inner)
        } else {
            Span::Strike(inner)
        });
        text = &text[start + 2 * marker.len() + len..];
    }
    spans
}

/// A piece of inline text, ready to print.
#[derive(Debug, Clone, Eq, PartialEq)]
struct Rendered {
    text: String,
    width: usize,
}

/// Renders inline markup. Unstyled text is kept verbatim, escapes included.
fn render_inline(text: &str, styled: bool) -> Rendered {
    if !styled {
        return Rendered {
            text: text.to_string(),
            width: text.width(),
        };
    }

    spans(text)
        .into_iter()
        .fold(Rendered { text: String::new(), width: 0 }, |mut acc, span| {
            let (style, inner) = match span {
                Span::Plain(inner) => (None, inner),
                Span::Strong(inner) => (Some(Style::new().bold()), inner),
                Span::Strike(inner) => (Some(Style::new().strikethrough()), inner),
            };
            let inner = inner.replace("\\|", "|");
            acc.width += inner.width();
            match style {
                Some(style) => acc.text.push_str(&style.paint(inner).to_string()),
                None => acc.text.push_str(&inner),
            }
            acc
        })
}

/// Splits a table row into trimmed cells. Leading and trailing pipes are optional and `\|` is a
/// literal pipe within a cell.
fn split_row(line: &str) -> Vec<&str> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = match line.strip_suffix('|') {
        Some(rest) if !rest.ends_with('\\') => rest,
        _ => line,
    };

    let bytes = line.as_bytes();
    let mut cells = Vec::new();
    let (mut start, mut i) = (0, 0);
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'|' => {
                cells.push(line[start..i].trim());
                start = i + 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    cells.push(line[start..].trim());
    cells
}

/// Parses a separator row, e.g. `---|---:|:---`.
fn parse_separator(line: &str) -> Option<Vec<Alignment>> {
    if !line.contains('|') && !line.contains('-') {
        return None;
    }
    split_row(line).into_iter().map(Alignment::parse).collect()
}

/// Writes a table with padded columns.
fn write_table<W: Write>(
    w: &mut W,
    header: &str,
    alignments: &[Alignment],
    rows: &[&str],
    styled: bool,
) -> BranchesResult<()> {
    let columns = alignments.len();
    let render_row = |line: &str| {
        let mut cells = split_row(line)
            .into_iter()
            .map(|cell| render_inline(cell, styled))
            .collect::<Vec<_>>();
        cells.resize(
            columns,
            Rendered {
                text: String::new(),
                width: 0,
            },
        );
        cells
    };

    let header = render_row(header)
        .into_iter()
        .map(|cell| {
            if !styled {
                return cell;
            }
            Rendered {
                text: Style::new().bold().paint(cell.text).to_string(),
                width: cell.width,
            }
        })
        .collect::<Vec<_>>();
    let body = rows.iter().map(|row| render_row(*row)).collect::<Vec<_>>();

    // Separator cells need room for a dash and both colons.
    let widths = (0..columns)
        .map(|i| {
            std::iter::once(&header)
                .chain(body.iter())
                .map(|row| row[i].width)
                .max()
                .unwrap_or_default()
                .max(3)
        })
        .collect::<Vec<_>>();

    let write_cells = |w: &mut W, cells: &[Rendered]| -> BranchesResult<()> {
        let line = cells
            .iter()
            .zip(alignments)
            .zip(&widths)
            .map(|((cell, alignment), width)| alignment.pad(&cell.text, cell.width, *width))
            .join(" | ");
        writeln!(w, "{}", line.trim_end())?;
        Ok(())
    };

    write_cells(w, &header)?;
    let separator = alignments
        .iter()
        .zip(&widths)
        .enumerate()
        .map(|(i, (alignment, width))| {
            let gutters = (i > 0) as usize + (i + 1 < columns) as usize;
            alignment.separator(width + gutters)
        })
        .join("|");
    writeln!(w, "{}", separator)?;
    for row in &body {
        write_cells(w, row)?;
    }

    Ok(())
}

/// Formats `markdown` for printing.
///
/// ## Takes
/// - `markdown` - The Markdown document.
/// - `styled` - Whether to emit ANSI styles, typically when stdout is a terminal.
///
/// ## Returns
/// - `Result<String>` - The formatted document, ending in a single newline.
pub fn format(markdown: &str, styled: bool) -> BranchesResult<String> {
    let lines = markdown.lines().collect::<Vec<_>>();
    let mut out = String::with_capacity(markdown.len());
    let mut after_blank = true;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim_end();

        let alignments = lines
            .get(i + 1)
            .filter(|_| line.contains('|'))
            .and_then(|next| parse_separator(next))
            .filter(|alignments| alignments.len() == split_row(line).len());
        if let Some(alignments) = alignments {
            let rows = lines[i + 2..]
                .iter()
                .take_while(|row| !row.trim().is_empty() && row.contains('|'))
                .copied()
                .collect::<Vec<_>>();
            write_table(&mut out, line, &alignments, &rows, styled)?;
            after_blank = false;
            i += 2 + rows.len();
            continue;
        }

        if line.is_empty() {
            if !after_blank {
                out.push('\n');
            }
            after_blank = true;
        } else {
            writeln!(out, "{}", render_inline(line, styled).text)?;
            after_blank = false;
        }
        i += 1;
    }

    while out.ends_with("\n\n") {
        out.pop();
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::{format, spans, Span};
    use nu_ansi_term::Style;

    const REPORT: &str = "Branch | Behind | Ahead\n\
                          -------|-------:|:-----\n\
                          **master** | 0 | 0\n\
                          feature-x | 2 | 10\n\
                          \n\
                          Branch | Remote | Behind | Ahead\n\
                          -------|--------|-------:|:-----\n\
                          **master** | origin/master | 0 | 1\n\
                          wip |  |  |\n\
                          \n\
                          (1 stale branches not shown.)\n";

    #[test]
    fn aligns_tables() {
        assert_eq!(
            format(REPORT, false).unwrap(),
            "Branch     | Behind | Ahead\n\
             -----------|-------:|:-----\n\
             **master** |      0 | 0\n\
             feature-x  |      2 | 10\n\
             \n\
             Branch     | Remote        | Behind | Ahead\n\
             -----------|---------------|-------:|:-----\n\
             **master** | origin/master |      0 | 1\n\
             wip        |               |        |\n\
             \n\
             (1 stale branches not shown.)\n"
        );
    }

    #[test]
    fn styles_emphasis_for_terminals() {
        let out = format("Branch | Remote\n---|---\n**master** | ~~origin/gone~~\n", true).unwrap();

        assert!(!out.contains("**"));
        assert!(!out.contains("~~"));
        assert!(out.contains(&Style::new().bold().paint("master").to_string()));
        assert!(out.contains(&Style::new().strikethrough().paint("origin/gone").to_string()));
        // Padding is measured on the visible text: "master" is as wide as "Branch".
        assert!(out.contains(&format!(
            "{} | {}\n",
            Style::new().bold().paint("master"),
            Style::new().strikethrough().paint("origin/gone")
        )));
    }

    #[test]
    fn collapses_blank_lines() {
        assert_eq!(
            format("\n\nfirst\n\n\n\nsecond\n\n", false).unwrap(),
            "first\n\nsecond\n"
        );
    }

    #[test]
    fn pads_short_rows() {
        assert_eq!(
            format("a | b | c\n--|--:|--\nx |\n", false).unwrap(),
            "a   |   b | c\n----|----:|----\nx   |     |\n"
        );
    }

    #[test]
    fn escaped_pipes_stay_in_their_cell() {
        let table = "Branch | Behind | Ahead\n-------|-------:|:-----\na\\|b | 2 | 10\n";

        assert_eq!(
            format(table, false).unwrap(),
            "Branch | Behind | Ahead\n\
             -------|-------:|:-----\n\
             a\\|b   |      2 | 10\n"
        );
        assert!(format(table, true).unwrap().contains("a|b    |      2 | 10\n"));
    }

    #[test]
    fn wide_characters_are_measured_by_display_width() {
        assert_eq!(
            format("Branch | Ahead\n---|--:\n機能 | 1\nfeature | 22\n", false).unwrap(),
            "Branch  | Ahead\n\
             --------|-----:\n\
             機能    |     1\n\
             feature |    22\n"
        );
    }

    #[test]
    fn text_without_separator_is_not_a_table() {
        assert_eq!(format("a | b\nc | d\n", false).unwrap(), "a | b\nc | d\n");
    }

    #[test]
    fn splits_spans() {
        assert_eq!(
            spans("a **b** ~~c~~ **d"),
            vec![
                Span::Plain("a "),
                Span::Strong("b"),
                Span::Plain(" "),
                Span::Strike("c"),
                Span::Plain(" **d"),
            ]
        );
    }
}
