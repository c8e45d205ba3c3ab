use crate::color;
use crate::color::RenderOptions;
use crate::entry::DirNode;
use crate::entry::Entry;
use crate::fields::ViewFields;
use crate::reader::DirReader;
use crate::vfs::Vfs;

use super::LayoutContext;
use super::Tally;
use super::entry_rows;
use super::header_row;
use super::named_rows;

const EDGE_MID: &str = "├── ";
const EDGE_END: &str = "└── ";
const TRUNK: &str = "│   ";
const BLANK: &str = "    ";

/// Depth-first box-drawing tree. With `with_fields` every row is
/// prefixed by the List metadata columns; without, rows are names
/// only.
pub(crate) fn render(vfs: &Vfs, render: &RenderOptions, with_fields: bool) -> String {
    let layout = LayoutContext::compute(vfs);
    let mut lines: Vec<String> = Vec::new();
    let mut total = Tally::default();
    if with_fields {
        lines.push(header_row(&layout, ""));
    }
    let root = vfs.root();
    lines.push(color::paint_name(&root.stat, &root.name, render));
    let ctx = TreeCtx {
        vfs,
        layout: &layout,
        render,
        with_fields,
    };
    let mut trail: Vec<bool> = Vec::new();
    walk(&ctx, root, 0, &mut trail, &mut lines, &mut total);
    lines.push(String::new());
    lines.push(format!("Total: {}", total.line()));
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

struct TreeCtx<'a> {
    vfs: &'a Vfs,
    layout: &'a LayoutContext,
    render: &'a RenderOptions,
    with_fields: bool,
}

/// Ancestor connectors: a closed branch prints blank indentation, an
/// open one a vertical trunk.
fn indent(trail: &[bool]) -> String {
    trail
        .iter()
        .map(|ended| if *ended { BLANK } else { TRUNK })
        .collect()
}

fn walk(
    ctx: &TreeCtx<'_>,
    dir: &DirNode,
    level: i32,
    trail: &mut Vec<bool>,
    lines: &mut Vec<String>,
    total: &mut Tally,
) {
    let mut reader = DirReader::new(dir, ctx.vfs.options());
    let entries = reader.read(None).to_vec();
    let items = entries.len() + dir.errors.len();
    for (i, entry) in entries.iter().enumerate() {
        let last = i + 1 == items;
        let edge = if last { EDGE_END } else { EDGE_MID };
        let name_lead = format!("{}{}", indent(trail), edge);
        let rows = if ctx.with_fields {
            entry_rows(ctx.layout, entry, ctx.vfs, ctx.render, "", &name_lead)
        } else {
            let name =
                ViewFields::NAME.cell(entry, ctx.vfs.git(), ctx.vfs.options().force_recurse);
            named_rows(&name_lead, entry, &name, ctx.render)
        };
        lines.extend(rows);
        total.add(entry);
        if let Entry::Dir(node) = entry {
            if ctx.vfs.options().display_descend(level + 1) {
                trail.push(last);
                walk(ctx, node, level + 1, trail, lines, total);
                trail.pop();
            }
        }
    }
    for (j, err) in dir.errors.iter().enumerate() {
        let last = entries.len() + j + 1 == items;
        let edge = if last { EDGE_END } else { EDGE_MID };
        lines.push(format!("{}{}error: {err}", indent(trail), edge));
    }
}

#[cfg(test)]
mod tests {
    use crate::Layout;
    use crate::ViewFields;
    use crate::Vfs;
    use crate::VfsOptions;
    use crate::test_utils::TestRoot;

    #[tokio::test]
    async fn names_only_tree() {
        let root = TestRoot::bare().await.unwrap();
        root.create_file("a.txt", "0123456789").unwrap();
        root.create_file("sub/b.txt", "").unwrap();
        let mut opts = VfsOptions::default();
        opts.layout = Layout::Tree;
        let vfs = Vfs::build(root.path(), opts).await.unwrap();
        let want = format!(
            "{}\n├── a.txt\n└── sub\n    └── b.txt\n\nTotal: 1 directory, 2 files, size 10b\n",
            vfs.root().name
        );
        assert_eq!(vfs.render_to_string(), want);
    }

    #[tokio::test]
    async fn closed_branches_print_blank_indentation() {
        let root = TestRoot::bare().await.unwrap();
        root.create_file("x/y/c.txt", "x").unwrap();
        root.create_file("z.txt", "x").unwrap();
        let mut opts = VfsOptions::default();
        opts.layout = Layout::Tree;
        let vfs = Vfs::build(root.path(), opts).await.unwrap();
        let out = vfs.render_to_string();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "├── x");
        assert_eq!(lines[2], "│   └── y");
        assert_eq!(lines[3], "│       └── c.txt");
        assert_eq!(lines[4], "└── z.txt");
    }

    #[tokio::test]
    async fn list_tree_prefixes_metadata_columns() {
        let root = TestRoot::bare().await.unwrap();
        root.create_file("a.txt", "0123456789").unwrap();
        root.create_file("sub/b.txt", "").unwrap();
        let mut opts = VfsOptions::default();
        opts.layout = Layout::ListTree;
        opts.fields = ViewFields::SIZE | ViewFields::NAME;
        let vfs = Vfs::build(root.path(), opts).await.unwrap();
        let want = format!(
            "SIZE  NAME\n{}\n 10b  ├── a.txt\n   -  └── sub\n  0b      └── b.txt\n\n\
             Total: 1 directory, 2 files, size 10b\n",
            vfs.root().name
        );
        assert_eq!(vfs.render_to_string(), want);
    }

    #[tokio::test]
    async fn force_recurse_still_displays_to_depth() {
        let root = TestRoot::bare().await.unwrap();
        root.create_file("sub/deep/c.txt", "x").unwrap();
        let mut opts = VfsOptions::default();
        opts.layout = Layout::Tree;
        opts.depth = 1;
        opts.force_recurse = true;
        let vfs = Vfs::build(root.path(), opts).await.unwrap();
        let out = vfs.render_to_string();
        assert!(out.contains("└── sub"));
        assert!(out.contains("└── deep"));
        assert!(!out.contains("c.txt"));
    }
}
