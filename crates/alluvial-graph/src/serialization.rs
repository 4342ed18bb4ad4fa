use alluvial_core::errors::AlluvialError;
use alluvial_core::{NodeId, Side};
use serde::{Deserialize, Serialize};

use crate::node::NodeKind;
use crate::tree::Diagram;

const LARGEST_LEAF_NAMES: usize = 5;

/// One leaf of a network as delivered by the partitioning step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafInput {
    /// Identity shared by the same item across networks; falls back to `name`.
    #[serde(default)]
    pub identifier: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Flow carried by the leaf.
    pub flow: f64,
    /// Tree path such as `1:3:2`.
    #[serde(alias = "treePath")]
    pub path: String,
    /// Highlight category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_index: Option<i32>,
    /// Initial module level, 1 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_level: Option<usize>,
    /// Numeric id carried through to the leaf's render object.
    #[serde(default, alias = "id", skip_serializing_if = "Option::is_none")]
    pub node_id: Option<u64>,
}

impl LeafInput {
    /// Leaf named after its identifier.
    pub fn new(identifier: impl Into<String>, path: impl Into<String>, flow: f64) -> Self {
        let identifier = identifier.into();
        Self {
            name: identifier.clone(),
            identifier,
            flow,
            path: path.into(),
            highlight_index: None,
            module_level: None,
            node_id: None,
        }
    }

    /// Sets the highlight category.
    pub fn with_highlight(mut self, highlight_index: i32) -> Self {
        self.highlight_index = Some(highlight_index);
        self
    }

    /// Sets the initial module level.
    pub fn with_module_level(mut self, module_level: usize) -> Self {
        self.module_level = Some(module_level);
        self
    }
}

/// One partitioned network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInput {
    /// Unique network id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Codelength of the partition.
    #[serde(default)]
    pub codelength: f64,
    /// Leaves in input order.
    #[serde(default)]
    pub nodes: Vec<LeafInput>,
    /// Custom `(module path, name)` pairs.
    #[serde(default)]
    pub module_names: Vec<(String, String)>,
}

impl NetworkInput {
    /// Network named after its id.
    pub fn new(id: impl Into<String>, nodes: Vec<LeafInput>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            codelength: 0.0,
            nodes,
            module_names: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(NetworkInput),
    Many(Vec<NetworkInput>),
}

/// Parses one network object or an array of them.
pub fn networks_from_json(json: &str) -> Result<Vec<NetworkInput>, AlluvialError> {
    let parsed: OneOrMany = serde_json::from_str(json)
        .map_err(|err| AlluvialError::serde("deserialize-json", err.to_string()))?;
    Ok(match parsed {
        OneOrMany::One(network) => vec![network],
        OneOrMany::Many(networks) => networks,
    })
}

/// Serializes the render tree to pretty JSON.
pub fn diagram_to_json(diagram: &Diagram) -> Result<String, AlluvialError> {
    let object = diagram.as_object()?;
    serde_json::to_string_pretty(&object)
        .map_err(|err| AlluvialError::serde("serialize-json", err.to_string()))
}

/// Plain node of the render tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeObject {
    /// Node id.
    pub id: String,
    /// Owning network id.
    pub network_id: String,
    /// Aggregated flow.
    pub flow: f64,
    /// Numeric depth.
    pub depth: u8,
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
    /// Network specific fields.
    #[serde(flatten)]
    pub network: Option<NetworkDetail>,
    /// Module specific fields.
    #[serde(flatten)]
    pub module: Option<ModuleDetail>,
    /// Highlight group specific fields.
    #[serde(flatten)]
    pub group: Option<GroupDetail>,
    /// Branch and streamline specific fields.
    #[serde(flatten)]
    pub streamline: Option<StreamlineDetail>,
    /// Leaf specific fields.
    #[serde(flatten)]
    pub leaf: Option<LeafDetail>,
    /// Child nodes.
    pub children: Vec<NodeObject>,
}

/// Extra fields of a network node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDetail {
    /// Display name.
    pub name: String,
    /// Codelength of the partition.
    pub codelength: f64,
}

/// Extra fields of a module node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDetail {
    /// Module path.
    pub module_id: String,
    /// Resolved level.
    pub module_level: usize,
    /// Displayed name, if any.
    pub name: Option<Vec<String>>,
    /// Names of the largest leaves.
    pub largest_leaf_node_names: Vec<String>,
    /// Gap below the next module.
    pub margin: f64,
}

/// Extra fields of a highlight group node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetail {
    /// Highlight category.
    pub highlight_index: i32,
    /// Whether the group holds insignificant leaves.
    pub insignificant: bool,
}

/// Extra fields of branch and streamline nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamlineDetail {
    /// Branch side.
    pub side: Side,
    /// Encoded streamline identity; absent for branches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streamline_id: Option<String>,
    /// Id of the linked partner streamline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opposite_id: Option<String>,
}

/// Extra fields of a leaf node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafDetail {
    /// Display name.
    pub name: String,
    /// Cross-network identity.
    pub identifier: String,
    /// Highlight category.
    pub highlight_index: i32,
    /// Current module level.
    pub module_level: usize,
    /// Numeric id from the input, 0 when absent.
    pub node_id: u64,
}

impl Diagram {
    /// Builds the render tree rooted at the diagram root.
    pub fn as_object(&self) -> Result<NodeObject, AlluvialError> {
        self.node_object(self.root())
    }

    /// Builds the render tree below one node.
    pub fn node_object(&self, node: NodeId) -> Result<NodeObject, AlluvialError> {
        let record = self.record(node)?;
        let mut object = NodeObject {
            id: record.id.clone(),
            network_id: record.network_id.clone(),
            flow: record.flow,
            depth: record.kind.depth().as_u8(),
            x: record.layout.x,
            y: record.layout.y,
            width: record.layout.width,
            height: record.layout.height,
            network: None,
            module: None,
            group: None,
            streamline: None,
            leaf: None,
            children: Vec::with_capacity(record.children.len()),
        };
        match &record.kind {
            NodeKind::Root => {}
            NodeKind::Network(data) => {
                object.network = Some(NetworkDetail {
                    name: data.name.clone(),
                    codelength: data.codelength,
                });
            }
            NodeKind::Module(data) => {
                object.module = Some(ModuleDetail {
                    module_id: data.path.path_string(),
                    module_level: data.module_level,
                    name: self.module_name(node)?,
                    largest_leaf_node_names: self.largest_leaf_names(node, LARGEST_LEAF_NAMES)?,
                    margin: data.margin,
                });
            }
            NodeKind::HighlightGroup(data) => {
                object.group = Some(GroupDetail {
                    highlight_index: data.highlight_index,
                    insignificant: data.insignificant,
                });
            }
            NodeKind::Branch(data) => {
                object.streamline = Some(StreamlineDetail {
                    side: data.side,
                    streamline_id: None,
                    opposite_id: None,
                });
            }
            NodeKind::Streamline(data) => {
                let opposite_id = match data.link {
                    Some(link) => Some(self.id_of(link.other(node))?.to_string()),
                    None => None,
                };
                object.streamline = Some(StreamlineDetail {
                    side: data.side,
                    streamline_id: Some(data.streamline_id.encode()),
                    opposite_id,
                });
            }
            NodeKind::Leaf(data) => {
                object.leaf = Some(LeafDetail {
                    name: data.name.clone(),
                    identifier: data.identifier.clone(),
                    highlight_index: data.highlight_index,
                    module_level: data.module_level,
                    node_id: data.node_id,
                });
            }
        }
        for child in &record.children {
            object.children.push(self.node_object(*child)?);
        }
        Ok(object)
    }
}
