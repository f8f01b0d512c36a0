//! ASCII rendering of a family tree.

use super::{ExpansionState, TreeNode, TreeView, ViewStatus};

const EXPANDED: char = '▼';
const COLLAPSED: char = '▶';
const DECEASED: char = '†';

/// Render a tree, honoring expansion overrides.
///
/// Example output:
/// ```text
/// ▼ John Doe (1920–1990) †
/// ├── Mary Doe (1950–)
/// └── ▶ Tom Doe (1952–)
/// ```
pub fn render_tree(root: &TreeNode, expansion: &ExpansionState) -> String {
    let mut output = String::new();
    render_node(&mut output, root, expansion, "", true, true);
    output
}

/// Render whatever state the view is in.
pub fn render_view(view: &TreeView) -> String {
    match (view.status(), view.root()) {
        (_, Some(root)) => render_tree(root, view.expansion()),
        (ViewStatus::Loading, None) => "Loading family tree...\n".to_string(),
        (ViewStatus::Failed(msg), None) => format!("Failed to load family tree: {}\n", msg),
        _ => "No family data available\n".to_string(),
    }
}

fn label(node: &TreeNode, expansion: &ExpansionState) -> String {
    let mut label = String::new();
    if !node.children.is_empty() {
        label.push(if expansion.is_expanded(node) {
            EXPANDED
        } else {
            COLLAPSED
        });
        label.push(' ');
    }

    label.push_str(&node.individual.full_name());
    if let Some(span) = node.individual.life_span() {
        label.push_str(&format!(" ({})", span));
    }
    if !node.individual.is_alive {
        label.push(' ');
        label.push(DECEASED);
    }
    label
}

fn render_node(
    output: &mut String,
    node: &TreeNode,
    expansion: &ExpansionState,
    prefix: &str,
    is_last: bool,
    is_root: bool,
) {
    if !is_root {
        output.push_str(prefix);
        output.push_str(if is_last { "└── " } else { "├── " });
    }
    output.push_str(&label(node, expansion));
    output.push('\n');

    if !expansion.is_expanded(node) {
        return;
    }

    let child_prefix = if is_root {
        String::new()
    } else {
        format!("{}{}", prefix, if is_last { "    " } else { "│   " })
    };

    for (i, child) in node.children.iter().enumerate() {
        let child_is_last = i == node.children.len() - 1;
        render_node(output, child, expansion, &child_prefix, child_is_last, false);
    }
}
