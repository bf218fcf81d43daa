//! Native menu mirror.
//!
//! A menu invocation renders the node tree into a [`NativeMenu`], which the
//! platform bridge turns into real popup menus, and a [`CommandTable`] that
//! maps the command returned by the popup back to the chosen node.

use crate::menu::item::MenuNode;

/// One entry of a native popup menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NativeEntry {
    /// A nested popup menu.
    Popup {
        /// Label with `&` mnemonics.
        text: String,
        /// Entries of the nested menu.
        menu: NativeMenu,
    },
    /// A string entry.
    Item {
        /// Command reported when the entry is chosen.
        command: u32,
        /// Label with `&` mnemonics.
        text: String,
        /// Whether a check mark is drawn.
        checked: bool,
    },
    /// A separator line.
    Separator {
        /// Command allocated to the separator node.
        command: u32,
    },
}

/// A native popup menu, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NativeMenu {
    /// Entries of the menu.
    pub entries: Vec<NativeEntry>,
}

/// Command ids allocated for one menu invocation.
///
/// Commands start at 1; 0 is what a dismissed popup reports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandTable {
    node_ids: Vec<String>,
}

impl CommandTable {
    /// Allocates the next command for the node `id`.
    pub fn allocate(&mut self, id: &str) -> u32 {
        self.node_ids.push(id.to_string());
        u32::try_from(self.node_ids.len()).unwrap_or(u32::MAX)
    }

    /// The node id behind `command`, if it was allocated.
    pub fn node_id(&self, command: u32) -> Option<&str> {
        let index = usize::try_from(command.checked_sub(1)?).ok()?;
        self.node_ids.get(index).map(String::as_str)
    }

    /// Number of allocated commands.
    pub fn len(&self) -> usize {
        self.node_ids.len()
    }

    /// Whether no command has been allocated.
    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }
}

/// Result of rendering a menu tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedMenu {
    /// The top-level popup.
    pub menu: NativeMenu,
    /// Commands allocated while rendering.
    pub commands: CommandTable,
}

/// Renders `root` into a native menu.
///
/// The root submenu's children form the top-level popup; deeper submenus
/// become nested popups and radio groups are rendered inline.
pub fn render(root: &MenuNode) -> RenderedMenu {
    let mut rendered = RenderedMenu::default();
    render_node(&mut rendered.menu, &mut rendered.commands, 0, root);
    rendered
}

fn render_node(menu: &mut NativeMenu, commands: &mut CommandTable, level: usize, node: &MenuNode) {
    let command = commands.allocate(node.id());

    match node {
        MenuNode::SubMenu { text, children, .. } => {
            if level > 0 {
                let mut popup = NativeMenu::default();
                for child in children {
                    render_node(&mut popup, commands, level + 1, child);
                }
                menu.entries.push(NativeEntry::Popup {
                    text: mnemonic_text(text),
                    menu: popup,
                });
            } else {
                for child in children {
                    render_node(menu, commands, level + 1, child);
                }
            }
        }
        MenuNode::RadioGroup { children, .. } => {
            for child in children {
                render_node(menu, commands, level + 1, child);
            }
        }
        MenuNode::Action { text, .. } => menu.entries.push(NativeEntry::Item {
            command,
            text: mnemonic_text(text),
            checked: false,
        }),
        MenuNode::Toggle { text, checked, .. } | MenuNode::Radio { text, checked, .. } => {
            menu.entries.push(NativeEntry::Item {
                command,
                text: mnemonic_text(text),
                checked: *checked,
            });
        }
        MenuNode::Separator { .. } => menu.entries.push(NativeEntry::Separator { command }),
    }
}

/// Converts `_` mnemonic markers to the `&` markers native menus use.
///
/// Literal ampersands are doubled so they are not taken for mnemonics.
pub fn mnemonic_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&&"),
            '_' => out.push('&'),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_menu() -> MenuNode {
        MenuNode::submenu(
            "root",
            "Root",
            vec![
                MenuNode::action("open", "_Open", || {}),
                MenuNode::separator("sep"),
                MenuNode::submenu(
                    "mode",
                    "_Mode",
                    vec![MenuNode::radio_group(
                        "modes",
                        vec![
                            MenuNode::radio("normal", "_Normal", false, || {}),
                            MenuNode::radio("quiet", "Q_uiet", true, || {}),
                        ],
                    )],
                ),
                MenuNode::toggle("reading", "_Reading mode", true, || {}),
                MenuNode::action("quit", "_Quit", || {}),
            ],
        )
    }

    #[test]
    fn root_is_flattened_and_submenus_nest() {
        let rendered = render(&sample_menu());

        let expected = NativeMenu {
            entries: vec![
                NativeEntry::Item {
                    command: 2,
                    text: "&Open".to_string(),
                    checked: false,
                },
                NativeEntry::Separator { command: 3 },
                NativeEntry::Popup {
                    text: "&Mode".to_string(),
                    menu: NativeMenu {
                        entries: vec![
                            NativeEntry::Item {
                                command: 6,
                                text: "&Normal".to_string(),
                                checked: false,
                            },
                            NativeEntry::Item {
                                command: 7,
                                text: "Q&uiet".to_string(),
                                checked: true,
                            },
                        ],
                    },
                },
                NativeEntry::Item {
                    command: 8,
                    text: "&Reading mode".to_string(),
                    checked: true,
                },
                NativeEntry::Item {
                    command: 9,
                    text: "&Quit".to_string(),
                    checked: false,
                },
            ],
        };

        assert_eq!(rendered.menu, expected);
    }

    #[test]
    fn every_node_gets_a_command() {
        let rendered = render(&sample_menu());

        assert_eq!(rendered.commands.len(), 9);
        assert_eq!(rendered.commands.node_id(1), Some("root"));
        assert_eq!(rendered.commands.node_id(4), Some("mode"));
        assert_eq!(rendered.commands.node_id(5), Some("modes"));
        assert_eq!(rendered.commands.node_id(7), Some("quiet"));
        assert_eq!(rendered.commands.node_id(0), None);
        assert_eq!(rendered.commands.node_id(10), None);
    }

    #[test]
    fn empty_root_renders_empty_menu() {
        let rendered = render(&MenuNode::submenu("root", "", Vec::new()));
        assert!(rendered.menu.entries.is_empty());
        assert_eq!(rendered.commands.len(), 1);
    }

    #[test]
    fn mnemonics_use_ampersands() {
        assert_eq!(mnemonic_text("_Preferences"), "&Preferences");
        assert_eq!(mnemonic_text("Tea & _Biscuits"), "Tea && &Biscuits");
        assert_eq!(mnemonic_text("Plain"), "Plain");
    }
}
