//! Context branches and the per-part context tree
//!
//! A branch is the chain of scopes an expression is evaluated against,
//! root first. Repeating directives register one branch per item, always as
//! `[root, item]`, and tag the copied content with the new branch key.

use crate::{ContextError, Value};
use doc_model::ROOT_CONTEXT_KEY;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Shared handle to one scope value.
///
/// Writes through a handle are visible to every branch holding it.
pub type Scope = Rc<RefCell<Value>>;

/// Immutable chain of scopes, root first
#[derive(Debug, Clone)]
pub struct ContextBranch {
    scopes: Vec<Scope>,
}

impl ContextBranch {
    pub fn new(root: Value) -> Self {
        Self {
            scopes: vec![Rc::new(RefCell::new(root))],
        }
    }

    /// New branch with one more scope; `self` is left untouched
    pub fn extend(&self, sub: Value) -> Self {
        let mut scopes = self.scopes.clone();
        scopes.push(Rc::new(RefCell::new(sub)));
        Self { scopes }
    }

    pub fn root(&self) -> &Scope {
        &self.scopes[0]
    }

    /// Innermost scope
    pub fn leaf(&self) -> &Scope {
        &self.scopes[self.scopes.len() - 1]
    }

    /// Scopes in resolution order, innermost first
    pub fn innermost_first(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// Registry of the branches active while stamping one document part
#[derive(Debug)]
pub struct ContextTree {
    root: ContextBranch,
    branches: BTreeMap<String, ContextBranch>,
    next_key: u64,
}

impl ContextTree {
    pub fn new(root: Value) -> Self {
        let root = ContextBranch::new(root);
        let mut branches = BTreeMap::new();
        branches.insert(ROOT_CONTEXT_KEY.to_string(), root.clone());
        Self {
            root,
            branches,
            next_key: 1,
        }
    }

    /// Register `[root, sub]` and return its fresh key
    pub fn add_branch(&mut self, sub: Value) -> String {
        let key = self.next_key.to_string();
        self.next_key += 1;
        self.branches.insert(key.clone(), self.root.extend(sub));
        key
    }

    pub fn find(&self, key: &str) -> Result<&ContextBranch, ContextError> {
        self.branches
            .get(key)
            .ok_or_else(|| ContextError::NotFound(key.to_string()))
    }

    pub fn root_branch(&self) -> &ContextBranch {
        &self.root
    }

    /// Number of branches, the root branch included
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}
