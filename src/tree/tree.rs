use crate::Action;
use crate::Obs;
use crate::tree::edge::Edge;
use crate::tree::qnode::Qnode;
use crate::tree::vnode::Vnode;
use petgraph::Direction::Incoming;
use petgraph::Direction::Outgoing;
use petgraph::graph::DiGraph;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

/// A node is either a belief layer or an action layer; the two strictly
/// alternate along every path.
#[derive(Debug)]
pub enum Data<S> {
    Belief(Vnode<S>),
    Action(Qnode),
}

/// The per-decision search tree: an arena owned by the current decision,
/// nodes addressed by index, parent links implied by the graph. Grows
/// monotonically while the decision runs and is dropped with it.
pub struct Tree<S> {
    graph: DiGraph<Data<S>, Edge>,
    root: NodeIndex,
}

impl<S> Tree<S> {
    pub fn new(root: Vnode<S>) -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(Data::Belief(root));
        Self { graph, root }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn data(&self, index: NodeIndex) -> &Data<S> {
        self.graph
            .node_weight(index)
            .expect("index minted by this tree")
    }

    pub fn vnode(&self, index: NodeIndex) -> &Vnode<S> {
        match self.data(index) {
            Data::Belief(vnode) => vnode,
            Data::Action(_) => unreachable!("belief index routed to action layer"),
        }
    }

    pub fn vnode_mut(&mut self, index: NodeIndex) -> &mut Vnode<S> {
        match self
            .graph
            .node_weight_mut(index)
            .expect("index minted by this tree")
        {
            Data::Belief(vnode) => vnode,
            Data::Action(_) => unreachable!("belief index routed to action layer"),
        }
    }

    pub fn qnode(&self, index: NodeIndex) -> &Qnode {
        match self.data(index) {
            Data::Action(qnode) => qnode,
            Data::Belief(_) => unreachable!("action index routed to belief layer"),
        }
    }

    pub fn qnode_mut(&mut self, index: NodeIndex) -> &mut Qnode {
        match self
            .graph
            .node_weight_mut(index)
            .expect("index minted by this tree")
        {
            Data::Action(qnode) => qnode,
            Data::Belief(_) => unreachable!("action index routed to belief layer"),
        }
    }

    pub fn attach_action(&mut self, parent: NodeIndex, qnode: Qnode) -> NodeIndex {
        let action = qnode.action();
        let index = self.graph.add_node(Data::Action(qnode));
        self.graph.add_edge(parent, index, Edge::Act(action));
        index
    }

    pub fn attach_belief(&mut self, parent: NodeIndex, obs: Obs, vnode: Vnode<S>) -> NodeIndex {
        let index = self.graph.add_node(Data::Belief(vnode));
        self.graph.add_edge(parent, index, Edge::See(obs));
        index
    }

    /// a belief node's q-children, ascending by action
    pub fn actions(&self, parent: NodeIndex) -> Vec<(Action, NodeIndex)> {
        let mut children = self
            .graph
            .edges_directed(parent, Outgoing)
            .map(|edge| match edge.weight() {
                Edge::Act(action) => (*action, edge.target()),
                Edge::See(_) => unreachable!("belief layer fans out over actions"),
            })
            .collect::<Vec<(Action, NodeIndex)>>();
        children.sort_unstable_by_key(|(action, _)| *action);
        children
    }

    /// a q-node's belief children, ascending by observation
    pub fn beliefs(&self, parent: NodeIndex) -> Vec<(Obs, NodeIndex)> {
        let mut children = self
            .graph
            .edges_directed(parent, Outgoing)
            .map(|edge| match edge.weight() {
                Edge::See(obs) => (*obs, edge.target()),
                Edge::Act(_) => unreachable!("action layer fans out over observations"),
            })
            .collect::<Vec<(Obs, NodeIndex)>>();
        children.sort_unstable_by_key(|(obs, _)| *obs);
        children
    }

    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.graph.neighbors_directed(index, Incoming).next()
    }
}
