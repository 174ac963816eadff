use canvaslink_core::ids::{EdgeId, NodeId};

use crate::model::{Edge, GraphModel, Node};

/// The pair of "from"/"to" picks driving a connect action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub from: Option<NodeId>,
    pub to: Option<NodeId>,
}

impl Selection {
    pub fn is_complete(&self) -> bool {
        let filled = |s: &Option<NodeId>| s.as_ref().is_some_and(|id| !id.is_empty());
        filled(&self.from) && filled(&self.to)
    }

    pub fn clear(&mut self) {
        self.from = None;
        self.to = None;
    }
}

/// Interactive editing surface over a [`GraphModel`].
///
/// Selections are reset after a successful connect and kept after a
/// rejected one.
#[derive(Debug, Default)]
pub struct GraphEditor {
    model: GraphModel,
    selection: Selection,
}

impl GraphEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self) -> NodeId {
        self.model.add_node()
    }

    pub fn select_from(&mut self, id: impl Into<NodeId>) {
        self.selection.from = Some(id.into());
    }

    pub fn select_to(&mut self, id: impl Into<NodeId>) {
        self.selection.to = Some(id.into());
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Whether the connect trigger is enabled.
    pub fn can_connect(&self) -> bool {
        self.selection.is_complete()
    }

    pub fn connect_selected(&mut self) -> Option<EdgeId> {
        let (Some(from), Some(to)) = (&self.selection.from, &self.selection.to) else {
            return None;
        };
        let edge = self.model.connect(from, to)?;
        self.selection.clear();
        Some(edge)
    }

    pub fn nodes(&self) -> &[Node] {
        self.model.nodes()
    }

    pub fn edges(&self) -> &[Edge] {
        self.model.edges()
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut GraphModel {
        &mut self.model
    }
}
