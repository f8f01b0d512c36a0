use std::sync::Arc;

use crate::models::Individual;

use super::{BuiltTree, ExpansionState, TreeNode, TreeSnapshot, TreeSource, TracingLogger, TreeLogger};

/// Called when the user asks to add a child under an individual. The handler
/// owns the profile-creation flow; the view only forwards the request.
pub type AddChildHandler = Box<dyn Fn(&Individual) + Send + Sync>;

/// What a view currently has to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    /// Nothing fetched yet.
    Loading,
    /// A tree is available.
    Ready,
    /// The dataset has no individuals.
    Empty,
    /// The last fetch failed; nothing is rendered.
    Failed(String),
}

/// An interactive tree session.
///
/// The tree is rebuilt from scratch on every refresh. Expansion overrides and
/// the selection carry over between rebuilds.
pub struct TreeView {
    tree: Option<BuiltTree>,
    status: ViewStatus,
    expansion: ExpansionState,
    selected: Option<Individual>,
    logger: Arc<dyn TreeLogger>,
    add_child: Option<AddChildHandler>,
}

impl TreeView {
    pub fn new(logger: Arc<dyn TreeLogger>) -> Self {
        Self {
            tree: None,
            status: ViewStatus::Loading,
            expansion: ExpansionState::new(),
            selected: None,
            logger,
            add_child: None,
        }
    }

    pub fn with_add_child_handler(
        mut self,
        handler: impl Fn(&Individual) + Send + Sync + 'static,
    ) -> Self {
        self.add_child = Some(Box::new(handler));
        self
    }

    pub fn with_expansion(mut self, expansion: ExpansionState) -> Self {
        self.expansion = expansion;
        self
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn tree(&self) -> Option<&BuiltTree> {
        self.tree.as_ref()
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.tree.as_ref().map(|t| &t.root)
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    pub fn selected(&self) -> Option<&Individual> {
        self.selected.as_ref()
    }

    /// Fetch fresh data and rebuild. A fetch failure clears the tree.
    pub fn refresh(&mut self, source: &dyn TreeSource) -> &ViewStatus {
        match source.fetch_snapshot() {
            Ok(snapshot) => self.rebuild(&snapshot),
            Err(e) => {
                self.logger
                    .error(&format!("Error loading tree data: {:#}", e));
                self.tree = None;
                self.status = ViewStatus::Failed(e.to_string());
            }
        }
        &self.status
    }

    /// Refresh, turning a failed fetch into an error. An empty dataset is
    /// not an error.
    pub fn load(&mut self, source: &dyn TreeSource) -> anyhow::Result<()> {
        match self.refresh(source) {
            ViewStatus::Failed(msg) => anyhow::bail!("Failed to load family tree: {}", msg),
            _ => Ok(()),
        }
    }

    /// Rebuild from an already fetched snapshot.
    pub fn rebuild(&mut self, snapshot: &TreeSnapshot) {
        self.tree = snapshot.build(self.logger.as_ref());
        self.status = if self.tree.is_some() {
            ViewStatus::Ready
        } else {
            ViewStatus::Empty
        };

        if let Some(selected) = self.selected.take() {
            self.selected = snapshot
                .individuals
                .iter()
                .find(|i| i.id == selected.id)
                .cloned();
            if self.selected.is_none() {
                self.logger.info(&format!(
                    "Selected individual {} no longer present, clearing selection",
                    selected.id
                ));
            }
        }

        if let Some(tree) = &self.tree {
            self.logger.info(&format!(
                "Tree ready: root {} ({} nodes, {} cycle edges and {} edges past the depth limit skipped)",
                tree.root.id(),
                tree.root.size(),
                tree.cycles.len(),
                tree.truncated.len()
            ));
        }
    }

    pub fn is_expanded(&self, node: &TreeNode) -> bool {
        self.expansion.is_expanded(node)
    }

    /// Flip one individual's expansion. Descendants keep their own state.
    pub fn toggle(&mut self, individual_id: i64) -> bool {
        let expanded = self.expansion.toggle(individual_id);
        self.logger.debug(&format!(
            "Toggled {} to {}",
            individual_id,
            if expanded { "expanded" } else { "collapsed" }
        ));
        expanded
    }

    pub fn set_selected(&mut self, individual: Option<Individual>) {
        self.selected = individual;
    }

    pub fn on_add_child(&self, parent: &Individual) {
        match &self.add_child {
            Some(handler) => handler(parent),
            None => self.logger.warn(&format!(
                "No add-child handler registered, ignoring request for {}",
                parent.id
            )),
        }
    }
}

impl Default for TreeView {
    fn default() -> Self {
        Self::new(Arc::new(TracingLogger))
    }
}
