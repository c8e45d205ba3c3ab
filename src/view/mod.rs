//! The renderers and their shared layout machinery.
//!
//! Every view measures text in display columns through [`crate::text`]
//! so wide characters and ANSI styling never skew alignment, and every
//! view threads an explicit [`LayoutContext`] through its render call
//! instead of sharing layout state between renders.

pub(crate) mod classify;
pub(crate) mod level;
pub(crate) mod list;
pub(crate) mod table;
pub(crate) mod tree;

use crate::color;
use crate::color::RenderOptions;
use crate::entry::DirNode;
use crate::entry::Entry;
use crate::fields::ViewFields;
use crate::text;
use crate::utils;
use crate::vfs::Vfs;

/// Gap between adjacent columns in the unbordered views.
pub(crate) const GAP: &str = "  ";

/// One active column and the width of its widest cell.
pub(crate) struct Column {
    pub(crate) field: ViewFields,
    pub(crate) width: usize,
}

/// Column layout of one render: the active metadata fields in
/// canonical order, each as wide as its widest cell anywhere in the
/// display, plus the widest name. Computed once per render; never
/// shared between renders.
pub(crate) struct LayoutContext {
    metadata: Vec<Column>,
    name_width: usize,
}

impl LayoutContext {
    pub(crate) fn compute(vfs: &Vfs) -> Self {
        let force = vfs.options().force_recurse;
        let git = vfs.git();
        let mut metadata = Vec::new();
        let mut name_width = 0;
        for field in vfs.options().fields.columns() {
            if field == ViewFields::NAME {
                name_width = text::display_width(field.title());
            } else {
                metadata.push(Column {
                    field,
                    width: text::display_width(field.title()),
                });
            }
        }
        for dir in vfs.visible_dirs() {
            for entry in dir.children.values() {
                for col in &mut metadata {
                    let w = text::display_width(&col.field.cell(entry, git, force));
                    col.width = col.width.max(w);
                }
                let w = text::display_width(&ViewFields::NAME.cell(entry, git, force));
                name_width = name_width.max(w);
            }
        }
        Self {
            metadata,
            name_width,
        }
    }

    /// Active columns ahead of NAME.
    pub(crate) fn metadata(&self) -> &[Column] {
        &self.metadata
    }

    /// Width of the widest name cell (or the NAME title).
    pub(crate) fn name_width(&self) -> usize {
        self.name_width
    }

    /// Display width of the metadata prefix of a row, gaps included.
    pub(crate) fn prefix_width(&self) -> usize {
        self.metadata
            .iter()
            .map(|c| c.width + GAP.len())
            .sum()
    }
}

/// Field-name header row: padded metadata titles, then NAME.
pub(crate) fn header_row(layout: &LayoutContext, lead: &str) -> String {
    let mut line = String::from(lead);
    for col in layout.metadata() {
        line.push_str(&text::pad(col.field.title(), col.width, col.field.align()));
        line.push_str(GAP);
    }
    line.push_str(ViewFields::NAME.title());
    line
}

/// Formats one entry as one or more lines: padded metadata cells,
/// then the name wrapped into whatever the width budget leaves.
/// Continuation lines blank the whole prefix. `lead` is an extra
/// pre-padded first column (level tags); `name_lead` sits between the
/// metadata and the name (tree edges). Both are empty for List.
pub(crate) fn entry_rows(
    layout: &LayoutContext,
    entry: &Entry,
    vfs: &Vfs,
    render: &RenderOptions,
    lead: &str,
    name_lead: &str,
) -> Vec<String> {
    let force = vfs.options().force_recurse;
    let git = vfs.git();
    let mut prefix = String::from(lead);
    for col in layout.metadata() {
        let plain = col.field.cell(entry, git, force);
        let cell = if col.field == ViewFields::GIT {
            let xy = git.xy_for(entry.relpath(), entry.is_dir());
            color::paint_git(&plain, &xy, render)
        } else {
            plain
        };
        prefix.push_str(&text::pad(&cell, col.width, col.field.align()));
        prefix.push_str(GAP);
    }
    prefix.push_str(name_lead);
    let name = ViewFields::NAME.cell(entry, git, force);
    named_rows(&prefix, entry, &name, render)
}

/// Lays `name` after `prefix`, wrapping it at the column budget. The
/// pathological case where the prefix alone exhausts the budget falls
/// back to a single overflowing line instead of failing.
pub(crate) fn named_rows(
    prefix: &str,
    entry: &Entry,
    name: &str,
    render: &RenderOptions,
) -> Vec<String> {
    let used = text::display_width(prefix);
    let avail = render.width.saturating_sub(used);
    if avail == 0 {
        return vec![format!(
            "{prefix}{}",
            color::paint_name(entry.stat(), name, render)
        )];
    }
    let blank = " ".repeat(used);
    text::wrap_to_width(name, avail)
        .iter()
        .enumerate()
        .map(|(i, piece)| {
            let painted = color::paint_name(entry.stat(), piece, render);
            if i == 0 {
                format!("{prefix}{painted}")
            } else {
                format!("{blank}{painted}")
            }
        })
        .collect()
}

/// Horizontal rule between directory sections. `lead_width` covers
/// any extra leading column the view prints before the metadata.
pub(crate) fn rule(layout: &LayoutContext, render: &RenderOptions, lead_width: usize) -> String {
    let width = (lead_width + layout.prefix_width() + layout.name_width()).min(render.width);
    "-".repeat(width.max(1))
}

/// Listing errors of a directory, one line each.
pub(crate) fn error_lines(dir: &DirNode) -> Vec<String> {
    dir.errors.iter().map(|e| format!("error: {e}")).collect()
}

/// Running entry and size counters behind the per-directory and grand
/// total summary lines.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Tally {
    dirs: u64,
    files: u64,
    bytes: u64,
}

impl Tally {
    pub(crate) fn add(&mut self, entry: &Entry) {
        match entry {
            Entry::Dir(_) => self.dirs += 1,
            Entry::File(f) => {
                self.files += 1;
                self.bytes += f.stat.size;
            }
        }
    }

    pub(crate) fn absorb(&mut self, other: Tally) {
        self.dirs += other.dirs;
        self.files += other.files;
        self.bytes += other.bytes;
    }

    /// `N directories, M files, size X`.
    pub(crate) fn line(&self) -> String {
        format!(
            "{}, {}, size {}",
            plural(self.dirs, "directory", "directories"),
            plural(self.files, "file", "files"),
            utils::humanize_size(self.bytes)
        )
    }
}

fn plural(n: u64, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}
