//! Entity to node mapping.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::types::{EntityId, NodeId};

/// Bidirectional table between simulation entities and topology nodes.
///
/// Each entity maps to at most one node; any number of entities may share a
/// node. Mapping never checks that the node exists in a graph, so mappings
/// can be declared before the topology is built.
#[derive(Debug, Clone, Default)]
pub struct EntityNodeMapper {
    forward: HashMap<EntityId, NodeId>,
    reverse: BTreeMap<NodeId, BTreeSet<EntityId>>,
}

impl EntityNodeMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `entity` to `node`, returning the node it was previously mapped to.
    pub fn map(&mut self, entity: EntityId, node: NodeId) -> Option<NodeId> {
        let previous = self.forward.insert(entity, node);
        if let Some(old) = previous {
            self.detach(entity, old);
        }
        self.reverse.entry(node).or_default().insert(entity);
        previous
    }

    /// Remove the mapping for `entity`, if any.
    pub fn unmap(&mut self, entity: EntityId) -> Option<NodeId> {
        let removed = self.forward.remove(&entity)?;
        self.detach(entity, removed);
        Some(removed)
    }

    pub fn node_id_for(&self, entity: EntityId) -> Option<NodeId> {
        self.forward.get(&entity).copied()
    }

    /// Entities mapped onto `node`, in ascending order.
    pub fn entities_on(&self, node: NodeId) -> Vec<EntityId> {
        self.reverse
            .get(&node)
            .map(|entities| entities.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, NodeId)> + '_ {
        self.forward.iter().map(|(entity, node)| (*entity, *node))
    }

    fn detach(&mut self, entity: EntityId, node: NodeId) {
        if let Some(entities) = self.reverse.get_mut(&node) {
            entities.remove(&entity);
            if entities.is_empty() {
                self.reverse.remove(&node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_and_lookup() {
        let mut mapper = EntityNodeMapper::new();
        assert_eq!(mapper.map(EntityId(100), NodeId(0)), None);

        assert_eq!(mapper.node_id_for(EntityId(100)), Some(NodeId(0)));
        assert_eq!(mapper.node_id_for(EntityId(200)), None);
        assert_eq!(mapper.len(), 1);
    }

    #[test]
    fn test_remap_overwrites() {
        let mut mapper = EntityNodeMapper::new();
        mapper.map(EntityId(1), NodeId(4));
        assert_eq!(mapper.map(EntityId(1), NodeId(9)), Some(NodeId(4)));

        assert_eq!(mapper.node_id_for(EntityId(1)), Some(NodeId(9)));
        assert!(mapper.entities_on(NodeId(4)).is_empty());
        assert_eq!(mapper.entities_on(NodeId(9)), vec![EntityId(1)]);
        assert_eq!(mapper.len(), 1);
    }

    #[test]
    fn test_unmap() {
        let mut mapper = EntityNodeMapper::new();
        mapper.map(EntityId(7), NodeId(0));

        assert_eq!(mapper.unmap(EntityId(7)), Some(NodeId(0)));
        assert_eq!(mapper.node_id_for(EntityId(7)), None);
        assert!(mapper.is_empty());

        // Unmapping twice is a no-op
        assert_eq!(mapper.unmap(EntityId(7)), None);
    }

    #[test]
    fn test_node_zero_is_not_unmapped() {
        let mut mapper = EntityNodeMapper::new();
        mapper.map(EntityId(0), NodeId(0));
        assert_eq!(mapper.node_id_for(EntityId(0)), Some(NodeId(0)));
    }

    #[test]
    fn test_entities_share_node() {
        let mut mapper = EntityNodeMapper::new();
        mapper.map(EntityId(3), NodeId(1));
        mapper.map(EntityId(2), NodeId(1));
        mapper.map(EntityId(8), NodeId(2));

        assert_eq!(mapper.entities_on(NodeId(1)), vec![EntityId(2), EntityId(3)]);
        mapper.unmap(EntityId(3));
        assert_eq!(mapper.entities_on(NodeId(1)), vec![EntityId(2)]);

        let mut pairs: Vec<_> = mapper.iter().collect();
        pairs.sort();
        assert_eq!(pairs, vec![(EntityId(2), NodeId(1)), (EntityId(8), NodeId(2))]);
    }
}
