//! Responsive shell layout decisions.

/// Viewport widths below this use the single-pane layout
pub const MOBILE_BREAKPOINT_PX: f64 = 600.0;

/// Which panes the shell shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// List and detail side by side, with a persistent "new note" action
    TwoPane,
    /// Single pane showing the list
    List,
    /// Single pane showing the detail view, with a back action
    Detail,
}

impl Layout {
    pub const fn is_single_pane(self) -> bool {
        !matches!(self, Self::TwoPane)
    }
}

/// The shell's only state: whether the detail pane is open on small screens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShellState {
    detail_open: bool,
}

impl ShellState {
    /// A note was selected (or created)
    pub fn open_detail(&mut self) {
        self.detail_open = true;
    }

    /// Return to the list; the selection is left alone
    pub fn back(&mut self) {
        self.detail_open = false;
    }

    pub const fn detail_open(self) -> bool {
        self.detail_open
    }
}

/// Pick the layout for a viewport width in logical pixels
pub fn resolve_layout(width: f64, shell: ShellState) -> Layout {
    if width >= MOBILE_BREAKPOINT_PX {
        Layout::TwoPane
    } else if shell.detail_open {
        Layout::Detail
    } else {
        Layout::List
    }
}
