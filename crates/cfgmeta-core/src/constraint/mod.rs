//! Constraints checked before changes to managed objects are committed.
//!
//! A `Constraint` bundles client-side handlers (run by management tools
//! before a change is sent) and server-side handlers (run by the server
//! before it accepts an object and after it commits a change). Handlers
//! append human-readable reasons; an empty reason list means acceptable.

mod aggregation;
mod engine;
mod generic;

pub use aggregation::{
    AggregationSourceClientHandler, AggregationSourceServerHandler, AggregationTargetClientHandler,
    AggregationTargetServerHandler,
};
pub use engine::{ConstraintEngine, ConstraintOutcome};
pub use generic::GenericConstraint;
pub(crate) use aggregation::aggregation_constraints;

use crate::context::AdminContext;
use crate::definition::DefinitionTree;
use crate::errors::Result;
use crate::management::{CandidateObject, ManagementContext};
use cfgmeta_core_types::Message;
use std::fmt;
use std::sync::Arc;

/// Everything a handler may consult.
#[derive(Clone, Copy)]
pub struct ConstraintEnv<'a> {
    pub tree: &'a DefinitionTree,
    pub context: &'a dyn ManagementContext,
    pub admin: &'a AdminContext,
}

impl fmt::Debug for ConstraintEnv<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintEnv")
            .field("locale", &self.admin.locale())
            .finish_non_exhaustive()
    }
}

pub trait ClientConstraintHandler: Send + Sync + fmt::Debug {
    /// Called once the definition tree is assembled.
    ///
    /// # Errors
    /// Schema error when the handler refers to something the tree lacks.
    fn initialize(&self, _tree: &DefinitionTree, _cx: &AdminContext) -> Result<()> {
        Ok(())
    }

    /// # Errors
    /// Fails when the management context cannot be consulted.
    fn is_add_acceptable(
        &self,
        _env: &ConstraintEnv<'_>,
        _candidate: &CandidateObject,
        _reasons: &mut Vec<Message>,
    ) -> Result<bool> {
        Ok(true)
    }

    /// # Errors
    /// Fails when the management context cannot be consulted.
    fn is_modify_acceptable(
        &self,
        _env: &ConstraintEnv<'_>,
        _candidate: &CandidateObject,
        _reasons: &mut Vec<Message>,
    ) -> Result<bool> {
        Ok(true)
    }

    /// # Errors
    /// Fails when the management context cannot be consulted.
    fn is_delete_acceptable(
        &self,
        _env: &ConstraintEnv<'_>,
        _candidate: &CandidateObject,
        _reasons: &mut Vec<Message>,
    ) -> Result<bool> {
        Ok(true)
    }
}

pub trait ServerConstraintHandler: Send + Sync + fmt::Debug {
    /// # Errors
    /// Schema error when the handler refers to something the tree lacks.
    fn initialize(&self, _tree: &DefinitionTree, _cx: &AdminContext) -> Result<()> {
        Ok(())
    }

    /// Whether the server may use the object as configured.
    ///
    /// # Errors
    /// Fails when the management context cannot be consulted.
    fn is_usable(
        &self,
        _env: &ConstraintEnv<'_>,
        _candidate: &CandidateObject,
        _reasons: &mut Vec<Message>,
    ) -> Result<bool> {
        Ok(true)
    }

    /// # Errors
    /// Fails when the management context cannot be consulted.
    fn is_delete_allowed(
        &self,
        _env: &ConstraintEnv<'_>,
        _candidate: &CandidateObject,
        _reasons: &mut Vec<Message>,
    ) -> Result<bool> {
        Ok(true)
    }

    /// # Errors
    /// Fails when follow-up work cannot be done.
    fn perform_post_add(&self, _env: &ConstraintEnv<'_>, _candidate: &CandidateObject) -> Result<()> {
        Ok(())
    }

    /// # Errors
    /// Fails when follow-up work cannot be done.
    fn perform_post_modify(&self, _env: &ConstraintEnv<'_>, _candidate: &CandidateObject) -> Result<()> {
        Ok(())
    }

    /// # Errors
    /// Fails when follow-up work cannot be done.
    fn perform_post_delete(&self, _env: &ConstraintEnv<'_>, _candidate: &CandidateObject) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Constraint {
    owner: Option<String>,
    name: String,
    client_handlers: Vec<Arc<dyn ClientConstraintHandler>>,
    server_handlers: Vec<Arc<dyn ServerConstraintHandler>>,
}

impl Constraint {
    pub fn new(name: &str) -> Self {
        Self {
            owner: None,
            name: name.to_string(),
            client_handlers: Vec::new(),
            server_handlers: Vec::new(),
        }
    }

    pub fn with_client_handler(mut self, handler: impl ClientConstraintHandler + 'static) -> Self {
        self.client_handlers.push(Arc::new(handler));
        self
    }

    pub fn with_server_handler(mut self, handler: impl ServerConstraintHandler + 'static) -> Self {
        self.server_handlers.push(Arc::new(handler));
        self
    }

    /// Definition the constraint is registered with.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub(crate) fn set_owner(&mut self, owner: &str) {
        self.owner = Some(owner.to_string());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client_handlers(&self) -> &[Arc<dyn ClientConstraintHandler>] {
        &self.client_handlers
    }

    pub fn server_handlers(&self) -> &[Arc<dyn ServerConstraintHandler>] {
        &self.server_handlers
    }

    pub(crate) fn initialize(&self, tree: &DefinitionTree, cx: &AdminContext) -> Result<()> {
        for handler in &self.client_handlers {
            handler.initialize(tree, cx)?;
        }
        for handler in &self.server_handlers {
            handler.initialize(tree, cx)?;
        }
        Ok(())
    }
}
