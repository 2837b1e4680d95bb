//! Reliability block diagram - construction from a topology and bottom-up evaluation
//!
//! Blocks live in an arena ([`BlockDiagram`]) and refer to their children by
//! [`BlockId`]. Leaves point at a component slot; the per-slot failure rate
//! is supplied at evaluation time so that Monte Carlo trials and sensitivity
//! sweeps never mutate the diagram.
//!
//! Absent an explicit topology every component under the selected prefix is
//! composed in series. Components a topology leaves out are composed in
//! series with its root, so no part of the slice drops out of R(t).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

use crate::core::error::{ReliabilityError, Result};
use crate::core::math;
use crate::core::path::ArchPath;
use crate::entities::component::Component;

/// Index of a block in its diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(usize);

/// How an internal block combines its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Composition {
    Series,
    Parallel,
    KOutOfN { k: usize },
}

impl std::fmt::Display for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Composition::Series => write!(f, "series"),
            Composition::Parallel => write!(f, "parallel"),
            Composition::KOutOfN { k } => write!(f, "{}-out-of-n", k),
        }
    }
}

/// A node of the diagram
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Reference to the component in the given slot
    Leaf { slot: usize },
    Internal {
        name: String,
        composition: Composition,
        children: Vec<BlockId>,
    },
}

/// An evaluable block diagram together with its leaf components
#[derive(Debug, Clone)]
pub struct BlockDiagram {
    blocks: Vec<Block>,
    components: Vec<Component>,
    root: BlockId,
}

/// Assembles a diagram node by node
///
/// The builder performs no structural checks so that malformed diagrams can
/// be expressed; [`BlockDiagram::evaluate`] rejects them.
#[derive(Debug, Default)]
pub struct DiagramBuilder {
    blocks: Vec<Block>,
    components: Vec<Component>,
}

impl DiagramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leaf(&mut self, component: Component) -> BlockId {
        self.components.push(component);
        self.push(Block::Leaf {
            slot: self.components.len() - 1,
        })
    }

    pub fn block(
        &mut self,
        name: impl Into<String>,
        composition: Composition,
        children: Vec<BlockId>,
    ) -> BlockId {
        self.push(Block::Internal {
            name: name.into(),
            composition,
            children,
        })
    }

    /// Append a child to an existing internal block
    pub fn attach(&mut self, parent: BlockId, child: BlockId) {
        if let Some(Block::Internal { children, .. }) = self.blocks.get_mut(parent.0) {
            children.push(child);
        }
    }

    pub fn finish(self, root: BlockId) -> Result<BlockDiagram> {
        let count = self.blocks.len();
        let out_of_range = |id: &BlockId| id.0 >= count;
        if out_of_range(&root)
            || self.blocks.iter().any(|b| match b {
                Block::Internal { children, .. } => children.iter().any(out_of_range),
                Block::Leaf { .. } => false,
            })
        {
            return Err(ReliabilityError::topology("block reference out of range"));
        }
        Ok(BlockDiagram {
            blocks: self.blocks,
            components: self.components,
            root,
        })
    }

    fn push(&mut self, block: Block) -> BlockId {
        self.blocks.push(block);
        BlockId(self.blocks.len() - 1)
    }
}

/// Declarative topology, usually read from YAML
///
/// ```yaml
/// root: system
/// blocks:
///   system:
///     kind: series
///     children:
///       - block: power
///       - component: /Sat/Control/U1
///   power:
///     kind: k_out_of_n
///     k: 2
///     prefix: /Sat/Power
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub root: String,
    pub blocks: BTreeMap<String, BlockSpec>,
}

/// Composition kind as written in a topology file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionKind {
    Series,
    Parallel,
    KOutOfN,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockSpec {
    pub kind: CompositionKind,

    /// Required for `k_out_of_n`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,

    #[serde(default)]
    pub children: Vec<ChildSpec>,

    /// Shorthand for a trailing `prefix` child
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<ArchPath>,
}

/// One child entry; exactly one field must be set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChildSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ArchPath>,

    /// Expands to every component under the path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<ArchPath>,
}

impl Topology {
    pub fn from_yaml(text: &str) -> std::result::Result<Self, serde_yml::Error> {
        serde_yml::from_str(text)
    }
}

/// Result of evaluating one sub-tree independently of its siblings
#[derive(Debug, Clone, PartialEq)]
pub struct SubtreeResult {
    pub name: String,
    pub reliability: Result<f64>,
}

/// Point result for one component, keyed by path for downstream annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentReliability {
    pub path: ArchPath,
    /// Effective failure rate of one unit
    pub lambda: f64,
    pub quantity: u32,
    /// Reliability of the leaf, redundancy included
    pub reliability: f64,
    /// MTBF of one unit; `None` when the rate is zero
    pub mtbf: Option<f64>,
}

impl BlockDiagram {
    /// Default policy: all components in series under one block
    pub fn series_of(name: impl Into<String>, components: &[Component]) -> Self {
        let mut builder = DiagramBuilder::new();
        let leaves = components
            .iter()
            .cloned()
            .map(|c| builder.leaf(c))
            .collect();
        let root = builder.block(name, Composition::Series, leaves);
        BlockDiagram {
            blocks: builder.blocks,
            components: builder.components,
            root,
        }
    }

    /// Build a diagram over `components` from an optional topology
    ///
    /// Without a topology the default series policy applies and `name`
    /// labels the root block.
    pub fn build(
        name: impl Into<String>,
        components: &[Component],
        topology: Option<&Topology>,
    ) -> Result<Self> {
        match topology {
            None => Ok(Self::series_of(name, components)),
            Some(topology) => TopologyBuilder::new(name.into(), components, topology).build(),
        }
    }

    pub fn root(&self) -> BlockId {
        self.root
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    /// Leaf components, indexed by slot
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Nominal effective failure rate of every slot
    pub fn nominal_rates(&self) -> Vec<f64> {
        self.components.iter().map(Component::effective_lambda).collect()
    }

    /// Display name of a block
    pub fn name(&self, id: BlockId) -> String {
        match self.blocks.get(id.0) {
            Some(Block::Internal { name, .. }) => name.clone(),
            Some(Block::Leaf { slot }) => self
                .components
                .get(*slot)
                .map(|c| c.path.to_string())
                .unwrap_or_else(|| format!("#{}", slot)),
            None => format!("#{}", id.0),
        }
    }

    /// System reliability at `t` with nominal rates
    pub fn evaluate(&self, t: f64) -> Result<f64> {
        self.evaluate_with(t, &self.nominal_rates())
    }

    /// System reliability at `t` with an explicit rate per component slot
    pub fn evaluate_with(&self, t: f64, rates: &[f64]) -> Result<f64> {
        self.evaluate_block(self.root, t, rates)
    }

    /// Reliability of one block with an explicit rate per component slot
    pub fn evaluate_block(&self, id: BlockId, t: f64, rates: &[f64]) -> Result<f64> {
        if rates.len() != self.components.len() {
            return Err(ReliabilityError::invalid(
                "rates",
                format!(
                    "expected {} rate(s), got {}",
                    self.components.len(),
                    rates.len()
                ),
            ));
        }
        let mut eval = Evaluation {
            diagram: self,
            t,
            rates,
            memo: vec![None; self.blocks.len()],
            on_stack: vec![false; self.blocks.len()],
        };
        eval.visit(id)
    }

    /// Evaluate each child of the root on its own
    ///
    /// A failing sub-tree reports its error without affecting its siblings.
    pub fn evaluate_subtrees(&self, t: f64) -> Vec<SubtreeResult> {
        let rates = self.nominal_rates();
        match self.blocks.get(self.root.0) {
            Some(Block::Internal { children, .. }) => children
                .iter()
                .map(|&child| SubtreeResult {
                    name: self.name(child),
                    reliability: self.evaluate_block(child, t, &rates),
                })
                .collect(),
            _ => vec![SubtreeResult {
                name: self.name(self.root),
                reliability: self.evaluate_block(self.root, t, &rates),
            }],
        }
    }

    /// Per-component point results at `t`
    pub fn component_results(&self, t: f64) -> Result<Vec<ComponentReliability>> {
        self.components
            .iter()
            .map(|c| {
                let lambda = c.effective_lambda();
                let unit = math::survival(lambda, t)?;
                let mtbf = match math::mtbf(lambda) {
                    Ok(value) => Some(value),
                    Err(ReliabilityError::DivisionByZero) => None,
                    Err(e) => return Err(e),
                };
                Ok(ComponentReliability {
                    path: c.path.clone(),
                    lambda,
                    quantity: c.quantity,
                    reliability: math::redundant(unit, c.quantity)?,
                    mtbf,
                })
            })
            .collect()
    }
}

/// State of one evaluation call; memoisation never outlives it
struct Evaluation<'a> {
    diagram: &'a BlockDiagram,
    t: f64,
    rates: &'a [f64],
    memo: Vec<Option<f64>>,
    on_stack: Vec<bool>,
}

impl Evaluation<'_> {
    fn visit(&mut self, id: BlockId) -> Result<f64> {
        if let Some(value) = self.memo[id.0] {
            return Ok(value);
        }
        if self.on_stack[id.0] {
            return Err(ReliabilityError::CycleDetected {
                block: self.diagram.name(id),
            });
        }
        self.on_stack[id.0] = true;

        let value = match &self.diagram.blocks[id.0] {
            Block::Leaf { slot } => {
                let quantity = self.diagram.components[*slot].quantity;
                let unit = math::survival(self.rates[*slot], self.t)?;
                if quantity > 1 {
                    math::redundant(unit, quantity)?
                } else {
                    unit
                }
            }
            Block::Internal {
                name,
                composition,
                children,
            } => {
                if children.is_empty() {
                    return Err(ReliabilityError::EmptyBlock {
                        block: name.clone(),
                    });
                }
                let values = children
                    .iter()
                    .map(|&child| self.visit(child))
                    .collect::<Result<Vec<f64>>>()?;
                match composition {
                    Composition::Series => math::series(&values)?,
                    Composition::Parallel => math::parallel(&values)?,
                    Composition::KOutOfN { k } => math::k_out_of_n(&values, *k)?,
                }
            }
        };

        self.on_stack[id.0] = false;
        self.memo[id.0] = Some(value);
        Ok(value)
    }
}

/// Turns a [`Topology`] into a diagram over a component slice
struct TopologyBuilder<'a> {
    name: String,
    components: &'a [Component],
    topology: &'a Topology,
    builder: DiagramBuilder,
    by_path: HashMap<&'a ArchPath, &'a Component>,
    used_components: HashSet<ArchPath>,
    owned_blocks: HashSet<String>,
    on_stack: Vec<String>,
}

impl<'a> TopologyBuilder<'a> {
    fn new(name: String, components: &'a [Component], topology: &'a Topology) -> Self {
        Self {
            name,
            components,
            topology,
            builder: DiagramBuilder::new(),
            by_path: components.iter().map(|c| (&c.path, c)).collect(),
            used_components: HashSet::new(),
            owned_blocks: HashSet::new(),
            on_stack: Vec::new(),
        }
    }

    fn build(mut self) -> Result<BlockDiagram> {
        let root_name = self.topology.root.clone();
        if !self.topology.blocks.contains_key(&root_name) {
            return Err(ReliabilityError::topology(format!(
                "root block '{}' is not defined",
                root_name
            )));
        }
        self.owned_blocks.insert(root_name.clone());
        let root = self.visit(&root_name)?;

        for name in self.topology.blocks.keys() {
            if !self.owned_blocks.contains(name) {
                warn!(block = %name, "block is not reachable from the root");
            }
        }
        let components = self.components;
        let unplaced: Vec<&Component> = components
            .iter()
            .filter(|c| !self.used_components.contains(&c.path))
            .collect();
        if unplaced.is_empty() {
            return self.builder.finish(root);
        }

        warn!(
            unplaced = unplaced.len(),
            root = %root_name,
            "components not referenced by the topology are composed in series with its root"
        );
        let name = std::mem::take(&mut self.name);
        let wrapper = self.builder.block(name, Composition::Series, vec![root]);
        for component in unplaced {
            let leaf = self.place(component)?;
            self.builder.attach(wrapper, leaf);
        }
        self.builder.finish(wrapper)
    }

    fn visit(&mut self, name: &str) -> Result<BlockId> {
        if self.on_stack.iter().any(|n| n == name) {
            return Err(ReliabilityError::CycleDetected {
                block: name.to_string(),
            });
        }
        let topology = self.topology;
        let spec = topology.blocks.get(name).ok_or_else(|| {
            ReliabilityError::topology(format!("block '{}' is not defined", name))
        })?;

        let composition = match (spec.kind, spec.k) {
            (CompositionKind::Series, _) => Composition::Series,
            (CompositionKind::Parallel, _) => Composition::Parallel,
            (CompositionKind::KOutOfN, Some(k)) => Composition::KOutOfN { k },
            (CompositionKind::KOutOfN, None) => {
                return Err(ReliabilityError::topology(format!(
                    "block '{}' is k_out_of_n but declares no k",
                    name
                )))
            }
        };

        self.on_stack.push(name.to_string());
        let mut children = Vec::new();
        for child in &spec.children {
            self.expand_child(name, child, &mut children)?;
        }
        if let Some(prefix) = &spec.prefix {
            self.expand_prefix(prefix, &mut children)?;
        }
        self.on_stack.pop();

        if let Composition::KOutOfN { k } = composition {
            if !children.is_empty() && (k < 1 || k > children.len()) {
                return Err(ReliabilityError::invalid(
                    "k",
                    format!(
                        "block '{}' needs 1 <= k <= {}, got {}",
                        name,
                        children.len(),
                        k
                    ),
                ));
            }
        }

        debug!(block = %name, %composition, children = children.len(), "built block");
        Ok(self.builder.block(name, composition, children))
    }

    fn expand_child(
        &mut self,
        parent: &str,
        child: &ChildSpec,
        out: &mut Vec<BlockId>,
    ) -> Result<()> {
        match (&child.block, &child.component, &child.prefix) {
            (Some(block), None, None) => {
                if self.on_stack.iter().any(|n| n == block) {
                    return Err(ReliabilityError::CycleDetected {
                        block: block.clone(),
                    });
                }
                if !self.owned_blocks.insert(block.clone()) {
                    return Err(ReliabilityError::topology(format!(
                        "block '{}' has more than one parent",
                        block
                    )));
                }
                out.push(self.visit(block)?);
            }
            (None, Some(path), None) => {
                let component = self.by_path.get(path).copied().ok_or_else(|| {
                    ReliabilityError::topology(format!(
                        "component '{}' (in block '{}') is not in the selected slice",
                        path, parent
                    ))
                })?;
                out.push(self.place(component)?);
            }
            (None, None, Some(prefix)) => self.expand_prefix(prefix, out)?,
            _ => {
                return Err(ReliabilityError::topology(format!(
                    "child of block '{}' must set exactly one of block, component or prefix",
                    parent
                )))
            }
        }
        Ok(())
    }

    fn expand_prefix(&mut self, prefix: &ArchPath, out: &mut Vec<BlockId>) -> Result<()> {
        let components = self.components;
        let matches: Vec<&'a Component> = components
            .iter()
            .filter(|c| c.path.starts_with(prefix))
            .collect();
        for component in matches {
            out.push(self.place(component)?);
        }
        Ok(())
    }

    fn place(&mut self, component: &Component) -> Result<BlockId> {
        if !self.used_components.insert(component.path.clone()) {
            return Err(ReliabilityError::topology(format!(
                "component '{}' is placed more than once",
                component.path
            )));
        }
        Ok(self.builder.leaf(component.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn power_slice() -> Vec<Component> {
        vec![
            Component::new("/Sat/Power/A", 0.001),
            Component::new("/Sat/Power/B", 0.002),
            Component::new("/Sat/Control/C", 0.001),
        ]
    }

    #[test]
    fn test_default_series_scenario() {
        let components = vec![
            Component::new("/S/One", 0.001),
            Component::new("/S/Two", 0.002),
        ];
        let diagram = BlockDiagram::build("/S", &components, None).unwrap();
        let r = diagram.evaluate(100.0).unwrap();
        assert!((r - (-0.3_f64).exp()).abs() < EPS);
    }

    #[test]
    fn test_parallel_scenario() {
        let mut b = DiagramBuilder::new();
        let x = b.leaf(Component::new("/P/X", 0.001));
        let y = b.leaf(Component::new("/P/Y", 0.001));
        let root = b.block("pair", Composition::Parallel, vec![x, y]);
        let diagram = b.finish(root).unwrap();
        let r = diagram.evaluate(100.0).unwrap();
        let unit = (-0.1_f64).exp();
        assert!((r - (1.0 - (1.0 - unit).powi(2))).abs() < EPS);
        assert!((r - 0.9909).abs() < 1e-4);
    }

    #[test]
    fn test_quantity_is_implicit_parallel() {
        let single = BlockDiagram::series_of("q", &[Component::new("/Q/U", 0.001).with_quantity(2)]);
        let mut b = DiagramBuilder::new();
        let x = b.leaf(Component::new("/Q/U1", 0.001));
        let y = b.leaf(Component::new("/Q/U2", 0.001));
        let root = b.block("pair", Composition::Parallel, vec![x, y]);
        let explicit = b.finish(root).unwrap();
        assert!((single.evaluate(100.0).unwrap() - explicit.evaluate(100.0).unwrap()).abs() < EPS);
    }

    #[test]
    fn test_empty_slice_yields_empty_block() {
        let diagram = BlockDiagram::build("/Nothing", &[], None).unwrap();
        assert!(matches!(
            diagram.evaluate(10.0),
            Err(ReliabilityError::EmptyBlock { .. })
        ));
    }

    #[test]
    fn test_cycle_detected_in_malformed_diagram() {
        let mut b = DiagramBuilder::new();
        let leaf = b.leaf(Component::new("/A", 0.001));
        let outer = b.block("outer", Composition::Series, vec![leaf]);
        let inner = b.block("inner", Composition::Series, vec![outer]);
        b.attach(outer, inner);
        let diagram = b.finish(outer).unwrap();
        assert!(matches!(
            diagram.evaluate(10.0),
            Err(ReliabilityError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_shared_leaf_is_memoised_not_cycle() {
        let mut b = DiagramBuilder::new();
        let leaf = b.leaf(Component::new("/A", 0.001));
        let left = b.block("left", Composition::Series, vec![leaf]);
        let right = b.block("right", Composition::Series, vec![leaf]);
        let root = b.block("root", Composition::Series, vec![left, right]);
        let diagram = b.finish(root).unwrap();
        let r = diagram.evaluate(100.0).unwrap();
        assert!((r - (-0.2_f64).exp()).abs() < EPS);
    }

    #[test]
    fn test_out_of_range_reference_rejected() {
        let mut b = DiagramBuilder::new();
        let root = b.block("root", Composition::Series, vec![BlockId(7)]);
        assert!(b.finish(root).is_err());
    }

    #[test]
    fn test_rates_length_mismatch() {
        let diagram = BlockDiagram::series_of("s", &power_slice());
        assert!(matches!(
            diagram.evaluate_with(1.0, &[0.1]),
            Err(ReliabilityError::InvalidParameter { name: "rates", .. })
        ));
    }

    #[test]
    fn test_topology_from_yaml() {
        let yaml = r#"
root: system
blocks:
  system:
    kind: series
    children:
      - block: power
      - component: /Sat/Control/C
  power:
    kind: parallel
    prefix: /Sat/Power
"#;
        let topology = Topology::from_yaml(yaml).unwrap();
        let diagram = BlockDiagram::build("/Sat", &power_slice(), Some(&topology)).unwrap();
        let t = 100.0;
        let a = (-0.1_f64).exp();
        let b = (-0.2_f64).exp();
        let c = (-0.1_f64).exp();
        let expected = (1.0 - (1.0 - a) * (1.0 - b)) * c;
        assert!((diagram.evaluate(t).unwrap() - expected).abs() < EPS);
    }

    #[test]
    fn test_topology_k_out_of_n() {
        let yaml = r#"
root: voter
blocks:
  voter:
    kind: k_out_of_n
    k: 2
    prefix: /Sat
"#;
        let topology = Topology::from_yaml(yaml).unwrap();
        let diagram = BlockDiagram::build("/Sat", &power_slice(), Some(&topology)).unwrap();
        let rates = diagram.nominal_rates();
        let rs: Vec<f64> = rates.iter().map(|l| (-l * 50.0).exp()).collect();
        let expected = math::k_out_of_n(&rs, 2).unwrap();
        assert!((diagram.evaluate(50.0).unwrap() - expected).abs() < EPS);
    }

    #[test]
    fn test_topology_k_out_of_range() {
        let yaml = "root: v\nblocks:\n  v:\n    kind: k_out_of_n\n    k: 4\n    prefix: /Sat\n";
        let topology = Topology::from_yaml(yaml).unwrap();
        assert!(matches!(
            BlockDiagram::build("/Sat", &power_slice(), Some(&topology)),
            Err(ReliabilityError::InvalidParameter { name: "k", .. })
        ));
    }

    #[test]
    fn test_topology_cycle() {
        let yaml = r#"
root: a
blocks:
  a:
    kind: series
    children:
      - block: b
  b:
    kind: series
    children:
      - block: a
"#;
        let topology = Topology::from_yaml(yaml).unwrap();
        assert!(matches!(
            BlockDiagram::build("/", &power_slice(), Some(&topology)),
            Err(ReliabilityError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_topology_shared_block_rejected() {
        let yaml = r#"
root: a
blocks:
  a:
    kind: series
    children:
      - block: b
      - block: b
  b:
    kind: series
    prefix: /Sat/Control
"#;
        let topology = Topology::from_yaml(yaml).unwrap();
        assert!(matches!(
            BlockDiagram::build("/", &power_slice(), Some(&topology)),
            Err(ReliabilityError::InvalidTopology { .. })
        ));
    }

    #[test]
    fn test_topology_unknown_component() {
        let yaml = "root: a\nblocks:\n  a:\n    kind: series\n    children:\n      - component: /Nope\n";
        let topology = Topology::from_yaml(yaml).unwrap();
        assert!(matches!(
            BlockDiagram::build("/", &power_slice(), Some(&topology)),
            Err(ReliabilityError::InvalidTopology { .. })
        ));
    }

    #[test]
    fn test_subtrees_isolate_empty_block() {
        let yaml = r#"
root: system
blocks:
  system:
    kind: series
    children:
      - block: power
      - block: thermal
  power:
    kind: series
    prefix: /Sat/Power
  thermal:
    kind: series
    prefix: /Sat/Thermal
"#;
        let topology = Topology::from_yaml(yaml).unwrap();
        let diagram = BlockDiagram::build("/Sat", &power_slice()[..2], Some(&topology)).unwrap();
        assert!(diagram.evaluate(10.0).is_err());

        let results = diagram.evaluate_subtrees(10.0);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "power");
        assert!(results[0].reliability.is_ok());
        assert!(matches!(
            results[1].reliability,
            Err(ReliabilityError::EmptyBlock { .. })
        ));
    }

    #[test]
    fn test_unreferenced_components_compose_in_series() {
        let components = vec![
            Component::new("/Sat/Power/A", 0.001),
            Component::new("/Sat/Powertrain/M", 0.5),
        ];
        let topology =
            Topology::from_yaml("root: sys\nblocks:\n  sys:\n    kind: parallel\n    prefix: /Sat/Power\n")
                .unwrap();
        let diagram = BlockDiagram::build("/Sat", &components, Some(&topology)).unwrap();
        assert_eq!(diagram.components().len(), 2);
        assert_eq!(diagram.name(diagram.root()), "/Sat");

        let t = 10.0;
        let expected = (-0.01_f64).exp() * (-5.0_f64).exp();
        assert!((diagram.evaluate(t).unwrap() - expected).abs() < EPS);

        let names: Vec<String> = diagram.evaluate_subtrees(t).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["sys", "/Sat/Powertrain/M"]);
    }

    #[test]
    fn test_fully_placed_topology_keeps_its_root() {
        let topology =
            Topology::from_yaml("root: sys\nblocks:\n  sys:\n    kind: parallel\n    prefix: /Sat\n").unwrap();
        let diagram = BlockDiagram::build("/Sat", &power_slice(), Some(&topology)).unwrap();
        assert_eq!(diagram.name(diagram.root()), "sys");
    }

    #[test]
    fn test_component_results() {
        let components = vec![
            Component::new("/A", 0.0),
            Component::new("/B", 0.01).with_quantity(2),
        ];
        let diagram = BlockDiagram::series_of("s", &components);
        let results = diagram.component_results(10.0).unwrap();
        assert_eq!(results[0].reliability, 1.0);
        assert_eq!(results[0].mtbf, None);
        assert!((results[1].mtbf.unwrap() - 100.0).abs() < 1e-9);
        let unit = (-0.1_f64).exp();
        assert!((results[1].reliability - (1.0 - (1.0 - unit).powi(2))).abs() < EPS);
    }
}
