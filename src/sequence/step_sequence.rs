use std::collections::{HashMap, HashSet};

use crate::sequence::error::SequenceError;
use crate::sequence::operation::{Operation, StepId};

/// Ordered operations. `order` decides display order; `steps` is keyed
/// storage. Both always hold the same set of ids.
#[derive(Debug, Clone, Default)]
pub struct StepSequence {
    steps: HashMap<StepId, Operation>,
    order: Vec<StepId>,
    /// Last id handed out
    counter: u32,
}

impl StepSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: StepId) -> Option<&Operation> {
        self.steps.get(&id)
    }

    pub fn get_mut(&mut self, id: StepId) -> Option<&mut Operation> {
        self.steps.get_mut(&id)
    }

    pub fn ids(&self) -> &[StepId] {
        &self.order
    }

    /// Operations in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Operation> + '_ {
        self.order.iter().filter_map(|id| self.steps.get(id))
    }

    pub fn last_id(&self) -> Option<StepId> {
        self.order.last().copied()
    }

    /// The id displayed immediately before `id`.
    pub fn predecessor(&self, id: StepId) -> Option<StepId> {
        let pos = self.order.iter().position(|i| *i == id)?;
        pos.checked_sub(1).map(|p| self.order[p])
    }

    fn next_id(&mut self) -> Result<StepId, SequenceError> {
        let next = self.counter.checked_add(1).ok_or(SequenceError::IdsExhausted)?;
        self.counter = next;
        Ok(StepId(next))
    }

    pub fn push(&mut self, mut op: Operation) -> Result<StepId, SequenceError> {
        let id = self.next_id()?;
        op.id = id;
        self.steps.insert(id, op);
        self.order.push(id);
        Ok(id)
    }

    /// Insert right after `after`, or at the end when `after` is `None`.
    pub fn insert_after(&mut self, after: Option<StepId>, mut op: Operation) -> Result<StepId, SequenceError> {
        let pos = match after {
            Some(after) => {
                self.order
                    .iter()
                    .position(|i| *i == after)
                    .ok_or(SequenceError::StepNotFound(after))?
                    + 1
            }
            None => self.order.len(),
        };
        let id = self.next_id()?;
        op.id = id;
        self.steps.insert(id, op);
        self.order.insert(pos, id);
        Ok(id)
    }

    pub fn remove(&mut self, id: StepId) -> Option<Operation> {
        let op = self.steps.remove(&id)?;
        self.order.retain(|i| *i != id);
        Some(op)
    }

    /// Renumber to 1..N in display order. Returns whether any id changed.
    pub fn compact(&mut self) -> bool {
        let mut changed = false;
        let mut steps = HashMap::with_capacity(self.order.len());
        let mut order = Vec::with_capacity(self.order.len());
        for (i, old) in self.order.iter().enumerate() {
            let Some(mut op) = self.steps.remove(old) else {
                continue;
            };
            let new = StepId(i as u32 + 1);
            changed |= new != *old;
            op.id = new;
            steps.insert(new, op);
            order.push(new);
        }
        self.counter = order.len() as u32;
        self.steps = steps;
        self.order = order;
        changed
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.order.clear();
        self.counter = 0;
    }

    /// `(id, operation)` pairs in display order.
    pub fn to_pairs(&self) -> Vec<(StepId, Operation)> {
        self.iter().map(|op| (op.id, op.clone())).collect()
    }

    /// Rebuild from persisted pairs, rejecting duplicate or zero ids.
    pub fn from_pairs(pairs: Vec<(StepId, Operation)>) -> Result<Self, SequenceError> {
        let mut seen = HashSet::new();
        let mut seq = StepSequence::new();
        for (id, mut op) in pairs {
            if id.0 == 0 {
                return Err(SequenceError::Corrupt("step id 0 is reserved".into()));
            }
            if !seen.insert(id) {
                return Err(SequenceError::Corrupt(format!("duplicate step id {}", id)));
            }
            op.id = id;
            seq.steps.insert(id, op);
            seq.order.push(id);
        }
        // Never hand out an id that is already taken.
        let max = seq.order.iter().map(|i| i.0).max().unwrap_or(0);
        seq.counter = max.max(seq.order.len() as u32);
        Ok(seq)
    }

    /// Checks the order/storage invariant.
    pub fn is_consistent(&self) -> bool {
        let ids: HashSet<_> = self.order.iter().copied().collect();
        ids.len() == self.order.len()
            && ids.len() == self.steps.len()
            && ids.iter().all(|id| id.0 > 0 && self.steps.get(id).is_some_and(|op| op.id == *id))
    }
}
