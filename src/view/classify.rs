use crate::color;
use crate::color::RenderOptions;
use crate::entry::Entry;
use crate::reader::DirReader;
use crate::text;
use crate::text::Align;
use crate::vfs::Vfs;

use super::GAP;
use super::Tally;
use super::error_lines;

/// One grid cell: styled text plus the display width of its plain
/// form.
struct Cell {
    text: String,
    width: usize,
}

/// Names-only grid per directory in the manner of `ls -F`: `/` tags
/// directories, `->` tags symlinks, `@` tags entries carrying
/// extended attributes. Each directory packs as many columns as the
/// terminal width admits.
pub(crate) fn render(vfs: &Vfs, render: &RenderOptions) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut total = Tally::default();
    for (i, dir) in vfs.visible_dirs().iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        if !dir.relpath.is_empty() {
            lines.push(dir.relpath.clone());
        }
        let mut tally = Tally::default();
        let mut cells: Vec<Cell> = Vec::new();
        let mut reader = DirReader::new(dir, vfs.options());
        for entry in reader.read(None) {
            let suffix = suffix_of(entry);
            cells.push(Cell {
                text: format!(
                    "{}{suffix}",
                    color::paint_name(entry.stat(), entry.name(), render)
                ),
                width: text::display_width(entry.name()) + suffix.len(),
            });
            tally.add(entry);
        }
        lines.extend(grid(&cells, render.width));
        lines.extend(error_lines(dir));
        lines.push(tally.line());
        total.absorb(tally);
    }
    lines.push(String::new());
    lines.push(format!("Total: {}", total.line()));
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn suffix_of(entry: &Entry) -> &'static str {
    if entry.is_dir() {
        "/"
    } else if entry.link_target().is_some() {
        "->"
    } else if entry.stat().xattrs.as_ref().is_some_and(|x| !x.is_empty()) {
        "@"
    } else {
        ""
    }
}

/// Packs `cells` into the widest column count whose per-column
/// maximum widths, gaps included, fit `width`. When even a single
/// column cannot fit, names go out one per line, unwrapped; a single
/// column never pads, so the two cases print identically.
fn grid(cells: &[Cell], width: usize) -> Vec<String> {
    if cells.is_empty() {
        return Vec::new();
    }
    let gap = GAP.len();
    let cap = cells.len().min((width + gap) / (1 + gap)).max(1);
    for cols in (2..=cap).rev() {
        let widths = column_widths(cells, cols);
        let total = widths.iter().sum::<usize>() + gap * (cols - 1);
        if total <= width {
            return layout_rows(cells, &widths);
        }
    }
    cells.iter().map(|c| c.text.clone()).collect()
}

/// Per-column maximum cell widths of a row-major arrangement.
fn column_widths(cells: &[Cell], cols: usize) -> Vec<usize> {
    let mut widths = vec![0usize; cols];
    for (i, cell) in cells.iter().enumerate() {
        let col = i % cols;
        widths[col] = widths[col].max(cell.width);
    }
    widths
}

fn layout_rows(cells: &[Cell], widths: &[usize]) -> Vec<String> {
    cells
        .chunks(widths.len())
        .map(|row| {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate() {
                if i + 1 == row.len() {
                    line.push_str(&cell.text);
                } else {
                    line.push_str(&text::pad(&cell.text, widths[i], Align::Left));
                    line.push_str(GAP);
                }
            }
            line
        })
        .collect()
}
