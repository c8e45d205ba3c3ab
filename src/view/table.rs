use crate::color;
use crate::color::RenderOptions;
use crate::fields::ViewFields;
use crate::reader::DirReader;
use crate::text;
use crate::vfs::Vfs;

use super::Column;
use super::LayoutContext;
use super::Tally;
use super::error_lines;

const TOP: (char, char, char) = ('┌', '┬', '┐');
const MID: (char, char, char) = ('├', '┼', '┤');
const BOTTOM: (char, char, char) = ('└', '┴', '┘');

/// One bordered table per directory. All tables share one column
/// layout, so a value that fits in one directory fits in every
/// directory. Cells wider than their column wrap onto continuation
/// lines; extended attributes get one extra row each beneath their
/// owning entry, marked with a leading `@`.
pub(crate) fn render(vfs: &Vfs, render: &RenderOptions) -> String {
    let layout = LayoutContext::compute(vfs);
    let cols = columns_for(&layout, render);
    let git = vfs.git();
    let force = vfs.options().force_recurse;

    let mut lines: Vec<String> = Vec::new();
    let mut total = Tally::default();
    for (i, dir) in vfs.visible_dirs().iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        if !dir.relpath.is_empty() {
            lines.push(dir.relpath.clone());
        }
        lines.push(banner(&cols, TOP));
        let titles: Vec<String> = cols
            .iter()
            .map(|col| col.field.title().to_string())
            .collect();
        lines.extend(rows_of(&cols, &titles, |_, piece| piece.to_string()));
        lines.push(banner(&cols, MID));
        let mut tally = Tally::default();
        let mut reader = DirReader::new(dir, vfs.options());
        for entry in reader.read(None) {
            let xy = git.xy_for(entry.relpath(), entry.is_dir());
            let cells: Vec<String> = cols
                .iter()
                .map(|col| col.field.cell(entry, git, force))
                .collect();
            lines.extend(rows_of(&cols, &cells, |field, piece| {
                if field == ViewFields::NAME {
                    color::paint_name(entry.stat(), piece, render)
                } else if field == ViewFields::GIT {
                    color::paint_git(piece, &xy, render)
                } else {
                    piece.to_string()
                }
            }));
            if let Some(xattrs) = &entry.stat().xattrs {
                for name in xattrs {
                    let mut extra = vec![String::new(); cols.len()];
                    if let Some(last) = extra.last_mut() {
                        *last = format!("@ {name}");
                    }
                    lines.extend(rows_of(&cols, &extra, |_, piece| piece.to_string()));
                }
            }
            tally.add(entry);
        }
        lines.push(banner(&cols, BOTTOM));
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

/// Metadata columns at their measured widths, then the name column
/// shrunk to whatever the terminal leaves once borders and padding are
/// accounted for. The name column never goes below its own title, so
/// a pathologically narrow terminal overflows instead of collapsing
/// the banner.
fn columns_for(layout: &LayoutContext, render: &RenderOptions) -> Vec<Column> {
    let mut cols: Vec<Column> = layout
        .metadata()
        .iter()
        .map(|col| Column {
            field: col.field,
            width: col.width,
        })
        .collect();
    let chrome = 1 + cols.iter().map(|col| col.width + 3).sum::<usize>() + 3;
    let floor = text::display_width(ViewFields::NAME.title());
    let budget = render.width.saturating_sub(chrome).max(floor);
    cols.push(Column {
        field: ViewFields::NAME,
        width: layout.name_width().min(budget),
    });
    cols
}

fn banner(cols: &[Column], glyphs: (char, char, char)) -> String {
    let (start, sep, end) = glyphs;
    let mut line = String::new();
    line.push(start);
    for (i, col) in cols.iter().enumerate() {
        line.push_str(&"─".repeat(col.width + 2));
        line.push(if i + 1 == cols.len() { end } else { sep });
    }
    line
}

/// One logical row as one or more bordered lines. Cells wider than
/// their column wrap; shorter wrapped cells pad out with blanks so the
/// row stays rectangular. `paint` styles each piece after wrapping,
/// keeping the width arithmetic on plain text.
fn rows_of(
    cols: &[Column],
    cells: &[String],
    paint: impl Fn(ViewFields, &str) -> String,
) -> Vec<String> {
    let wrapped: Vec<Vec<String>> = cells
        .iter()
        .zip(cols)
        .map(|(cell, col)| text::wrap_to_width(cell, col.width))
        .collect();
    let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);
    (0..height)
        .map(|row| {
            let mut line = String::from("│");
            for (i, col) in cols.iter().enumerate() {
                let piece = wrapped[i].get(row).map(String::as_str).unwrap_or("");
                let painted = paint(col.field, piece);
                line.push(' ');
                line.push_str(&text::pad(&painted, col.width, col.field.align()));
                line.push(' ');
                line.push('│');
            }
            line
        })
        .collect()
}
