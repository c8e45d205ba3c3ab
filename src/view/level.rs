use crate::color::RenderOptions;
use crate::entry::Entry;
use crate::reader::DirReader;
use crate::text;
use crate::text::Align;
use crate::vfs::Vfs;

use super::GAP;
use super::LayoutContext;
use super::Tally;
use super::entry_rows;
use super::error_lines;
use super::header_row;
use super::rule;

/// List variant whose headers carry the nesting depth (`L<n>:`) and a
/// directory index (`G<n>`), and whose rows are tagged with running
/// directory/file counters (`D<k>`, `F<k>`).
pub(crate) fn render(vfs: &Vfs, render: &RenderOptions) -> String {
    let layout = LayoutContext::compute(vfs);
    let dirs = vfs.visible_dirs();

    let mut total_dirs = 0usize;
    let mut total_files = 0usize;
    for dir in &dirs {
        for entry in dir.children.values() {
            match entry {
                Entry::Dir(_) => total_dirs += 1,
                Entry::File(_) => total_files += 1,
            }
        }
    }
    let tag_width = format!("D{total_dirs}")
        .len()
        .max(format!("F{total_files}").len());
    let blank_lead = format!("{}{}", " ".repeat(tag_width), GAP);

    let mut lines: Vec<String> = Vec::new();
    let mut total = Tally::default();
    let mut dir_counter = 0usize;
    let mut file_counter = 0usize;
    for (i, dir) in dirs.iter().enumerate() {
        if i > 0 {
            lines.push(rule(&layout, render, tag_width + GAP.len()));
        }
        let level = depth_of(&dir.relpath);
        let index = i + 1;
        if dir.relpath.is_empty() {
            lines.push(format!("L{level}:G{index}"));
        } else {
            lines.push(format!("L{level}:G{index} {}", dir.relpath));
        }
        lines.push(header_row(&layout, &blank_lead));
        let mut tally = Tally::default();
        let mut reader = DirReader::new(dir, vfs.options());
        for entry in reader.read(None) {
            let tag = match entry {
                Entry::Dir(_) => {
                    dir_counter += 1;
                    format!("D{dir_counter}")
                }
                Entry::File(_) => {
                    file_counter += 1;
                    format!("F{file_counter}")
                }
            };
            let lead = format!("{}{}", text::pad(&tag, tag_width, Align::Left), GAP);
            lines.extend(entry_rows(&layout, entry, vfs, render, &lead, ""));
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

fn depth_of(relpath: &str) -> usize {
    if relpath.is_empty() {
        0
    } else {
        relpath.split('/').count()
    }
}
