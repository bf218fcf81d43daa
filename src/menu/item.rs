//! Menu node tree.
//!
//! The application core owns the menu; adapters only borrow a snapshot of it
//! through [`MenuModel`] whenever they need to show it.

use std::fmt;
use std::sync::Arc;

/// Callback run when a menu entry is chosen.
pub type Activation = Arc<dyn Fn() + Send + Sync>;

/// A node of the application menu.
///
/// Texts use `_` to mark the mnemonic character, e.g. `"_Quit"`.
#[derive(Clone)]
pub enum MenuNode {
    /// A menu containing other nodes. The root of a tree is a submenu.
    SubMenu {
        /// Identifier of the node.
        id: String,
        /// Label shown for the nested menu.
        text: String,
        /// Nodes contained in this submenu.
        children: Vec<MenuNode>,
    },
    /// A set of mutually exclusive radio nodes, rendered inline.
    RadioGroup {
        /// Identifier of the group.
        id: String,
        /// The radio nodes of the group.
        children: Vec<MenuNode>,
    },
    /// A plain clickable entry.
    Action {
        /// Identifier of the node.
        id: String,
        /// Label of the entry.
        text: String,
        /// Run when the entry is chosen.
        activate: Activation,
    },
    /// An entry with a check mark.
    Toggle {
        /// Identifier of the node.
        id: String,
        /// Label of the entry.
        text: String,
        /// Whether the check mark is shown.
        checked: bool,
        /// Run when the entry is chosen.
        activate: Activation,
    },
    /// One option of a [`MenuNode::RadioGroup`].
    Radio {
        /// Identifier of the node.
        id: String,
        /// Label of the entry.
        text: String,
        /// Whether this option is the selected one.
        checked: bool,
        /// Run when the entry is chosen.
        activate: Activation,
    },
    /// A separator line.
    Separator {
        /// Identifier of the node.
        id: String,
    },
}

impl MenuNode {
    /// Creates a submenu.
    pub fn submenu(
        id: impl Into<String>,
        text: impl Into<String>,
        children: Vec<MenuNode>,
    ) -> Self {
        Self::SubMenu {
            id: id.into(),
            text: text.into(),
            children,
        }
    }

    /// Creates a radio group.
    pub fn radio_group(id: impl Into<String>, children: Vec<MenuNode>) -> Self {
        Self::RadioGroup {
            id: id.into(),
            children,
        }
    }

    /// Creates an action entry.
    pub fn action(
        id: impl Into<String>,
        text: impl Into<String>,
        activate: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self::Action {
            id: id.into(),
            text: text.into(),
            activate: Arc::new(activate),
        }
    }

    /// Creates a toggle entry.
    pub fn toggle(
        id: impl Into<String>,
        text: impl Into<String>,
        checked: bool,
        activate: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self::Toggle {
            id: id.into(),
            text: text.into(),
            checked,
            activate: Arc::new(activate),
        }
    }

    /// Creates a radio option.
    pub fn radio(
        id: impl Into<String>,
        text: impl Into<String>,
        checked: bool,
        activate: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self::Radio {
            id: id.into(),
            text: text.into(),
            checked,
            activate: Arc::new(activate),
        }
    }

    /// Creates a separator.
    pub fn separator(id: impl Into<String>) -> Self {
        Self::Separator { id: id.into() }
    }

    /// Identifier of the node.
    pub fn id(&self) -> &str {
        match self {
            Self::SubMenu { id, .. }
            | Self::RadioGroup { id, .. }
            | Self::Action { id, .. }
            | Self::Toggle { id, .. }
            | Self::Radio { id, .. }
            | Self::Separator { id } => id,
        }
    }

    /// Display text of the node; empty for groups and separators.
    pub fn text(&self) -> &str {
        match self {
            Self::SubMenu { text, .. }
            | Self::Action { text, .. }
            | Self::Toggle { text, .. }
            | Self::Radio { text, .. } => text,
            Self::RadioGroup { .. } | Self::Separator { .. } => "",
        }
    }

    /// Child nodes of a submenu or radio group.
    pub fn children(&self) -> &[MenuNode] {
        match self {
            Self::SubMenu { children, .. } | Self::RadioGroup { children, .. } => children,
            Self::Action { .. }
            | Self::Toggle { .. }
            | Self::Radio { .. }
            | Self::Separator { .. } => &[],
        }
    }

    /// Runs the node's activation callback.
    ///
    /// Returns `false` for nodes that cannot be activated.
    pub fn activate(&self) -> bool {
        match self {
            Self::Action { activate, .. }
            | Self::Toggle { activate, .. }
            | Self::Radio { activate, .. } => {
                activate();
                true
            }
            Self::SubMenu { .. } | Self::RadioGroup { .. } | Self::Separator { .. } => false,
        }
    }

    /// Recursively searches this node and its descendants for `id`.
    pub fn find(&self, id: &str) -> Option<&MenuNode> {
        if self.id() == id {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }
}

impl fmt::Debug for MenuNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubMenu { id, text, children } => f
                .debug_struct("SubMenu")
                .field("id", id)
                .field("text", text)
                .field("children", children)
                .finish(),
            Self::RadioGroup { id, children } => f
                .debug_struct("RadioGroup")
                .field("id", id)
                .field("children", children)
                .finish(),
            Self::Action { id, text, .. } => f
                .debug_struct("Action")
                .field("id", id)
                .field("text", text)
                .finish_non_exhaustive(),
            Self::Toggle { id, text, checked, .. } => f
                .debug_struct("Toggle")
                .field("id", id)
                .field("text", text)
                .field("checked", checked)
                .finish_non_exhaustive(),
            Self::Radio { id, text, checked, .. } => f
                .debug_struct("Radio")
                .field("id", id)
                .field("text", text)
                .field("checked", checked)
                .finish_non_exhaustive(),
            Self::Separator { id } => f.debug_struct("Separator").field("id", id).finish(),
        }
    }
}

/// Provider of the current menu tree.
///
/// Called every time the menu is about to be shown, so the returned tree can
/// reflect the latest checked states and texts.
pub trait MenuModel {
    /// Returns the root submenu.
    fn root(&self) -> MenuNode;
}

impl MenuModel for MenuNode {
    fn root(&self) -> MenuNode {
        self.clone()
    }
}
