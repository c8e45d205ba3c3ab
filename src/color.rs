use derivative::Derivative;
use owo_colors::OwoColorize;
use owo_colors::Style;
use serde::Deserialize;
use serde::Serialize;
use terminal_size::Width;

use crate::git::StatusCode;
use crate::git::XY;
use crate::stat::EntryKind;
use crate::stat::EntryStat;

/// Per-render presentation knobs, kept apart from build options so
/// one snapshot can be rendered many ways without rebuilding.
#[derive(Debug, Clone, Serialize, Deserialize, Derivative, PartialEq, Hash, Eq)]
#[derivative(Default)]
pub struct RenderOptions {
    /// Total column budget of the output.
    #[derivative(Default(value = "80"))]
    pub width: usize,
    /// Style names and git cells with ANSI colors.
    pub color: bool,
}

impl RenderOptions {
    /// Queries the terminal: its width when attached to one, colored
    /// output only then. Falls back to 80 plain columns.
    pub fn detect() -> Self {
        match terminal_size::terminal_size() {
            Some((Width(w), _)) => Self {
                width: w as usize,
                color: true,
            },
            None => Self::default(),
        }
    }
}

fn name_style(stat: &EntryStat) -> Option<Style> {
    match stat.kind {
        EntryKind::Dir => Some(Style::new().blue().bold()),
        EntryKind::Symlink => Some(Style::new().cyan()),
        EntryKind::Block | EntryKind::Char | EntryKind::Fifo | EntryKind::Socket => {
            Some(Style::new().yellow())
        }
        EntryKind::File if stat.mode & 0o111 != 0 => Some(Style::new().green()),
        _ => None,
    }
}

fn git_style(xy: &XY) -> Option<Style> {
    if xy.staging == StatusCode::Untracked || xy.worktree == StatusCode::Untracked {
        Some(Style::new().magenta())
    } else if xy.worktree != StatusCode::Unmodified {
        Some(Style::new().red())
    } else if xy.staging != StatusCode::Unmodified {
        Some(Style::new().green())
    } else {
        None
    }
}

/// Styles an entry name by kind. A no-op without color.
pub(crate) fn paint_name(stat: &EntryStat, text: &str, render: &RenderOptions) -> String {
    if !render.color {
        return text.to_string();
    }
    match name_style(stat) {
        Some(style) => text.style(style).to_string(),
        None => text.to_string(),
    }
}

/// Styles a git cell by its staging/worktree state. A no-op without
/// color.
pub(crate) fn paint_git(cell: &str, xy: &XY, render: &RenderOptions) -> String {
    if !render.color {
        return cell.to_string();
    }
    match git_style(xy) {
        Some(style) => cell.style(style).to_string(),
        None => cell.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::dir_fixture;
    use crate::text::display_width;
    use crate::text::strip_ansi;

    #[test]
    fn defaults_are_eighty_plain_columns() {
        let render = RenderOptions::default();
        assert_eq!(render.width, 80);
        assert!(!render.color);
    }

    #[test]
    fn painting_is_a_no_op_without_color() {
        let dir = dir_fixture("sub");
        let render = RenderOptions::default();
        assert_eq!(paint_name(dir.stat(), "sub", &render), "sub");
    }

    #[test]
    fn styled_names_keep_their_display_width() {
        let dir = dir_fixture("sub");
        let render = RenderOptions {
            width: 80,
            color: true,
        };
        let painted = paint_name(dir.stat(), "sub", &render);
        assert_ne!(painted, "sub");
        assert_eq!(strip_ansi(&painted), "sub");
        assert_eq!(display_width(&painted), 3);
    }
}
