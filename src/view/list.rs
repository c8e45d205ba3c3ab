use crate::color::RenderOptions;
use crate::reader::DirReader;
use crate::vfs::Vfs;

use super::LayoutContext;
use super::Tally;
use super::entry_rows;
use super::error_lines;
use super::header_row;
use super::rule;

/// Flat per-directory listing: a path header per non-root directory,
/// a field-name row, one aligned row per child, a subtotal, and a
/// rule between consecutive directories.
pub(crate) fn render(vfs: &Vfs, render: &RenderOptions) -> String {
    let layout = LayoutContext::compute(vfs);
    let mut lines: Vec<String> = Vec::new();
    let mut total = Tally::default();
    for (i, dir) in vfs.visible_dirs().iter().enumerate() {
        if i > 0 {
            lines.push(rule(&layout, render, 0));
        }
        if !dir.relpath.is_empty() {
            lines.push(dir.relpath.clone());
        }
        lines.push(header_row(&layout, ""));
        let mut tally = Tally::default();
        let mut reader = DirReader::new(dir, vfs.options());
        for entry in reader.read(None) {
            lines.extend(entry_rows(&layout, entry, vfs, render, "", ""));
            tally.add(entry);
        }
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
