use super::{Constraint, ConstraintEnv};
use crate::context::AdminContext;
use crate::definition::DefinitionTree;
use crate::errors::{ExError, ExErrorKind, Result};
use crate::management::{CandidateObject, ManagementContext};
use cfgmeta_core_types::Message;
use cfgmeta_core_types::schema::{
    OP_CONSTRAINT_ADD, OP_CONSTRAINT_DELETE, OP_CONSTRAINT_DELETE_ALLOWED, OP_CONSTRAINT_MODIFY,
    OP_CONSTRAINT_USABLE,
};
use serde::Serialize;
use std::time::Instant;

/// Verdict of one constraint check over every applicable handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintOutcome {
    pub acceptable: bool,
    pub reasons: Vec<Message>,
}

impl ConstraintOutcome {
    fn accept() -> Self {
        Self {
            acceptable: true,
            reasons: Vec::new(),
        }
    }

    /// # Errors
    /// `ConstraintViolation` listing every reason when not acceptable.
    pub fn into_result(self) -> std::result::Result<(), ExError> {
        if self.acceptable {
            return Ok(());
        }
        let text = self
            .reasons
            .iter()
            .map(Message::text)
            .collect::<Vec<_>>()
            .join("; ");
        Err(ExError::new(ExErrorKind::ConstraintViolation).with_message(text))
    }
}

/// Runs the constraints applicable to an object: those registered on its
/// definition and on every ancestor.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintEngine<'a> {
    env: ConstraintEnv<'a>,
}

impl<'a> ConstraintEngine<'a> {
    pub fn new(tree: &'a DefinitionTree, context: &'a dyn ManagementContext, admin: &'a AdminContext) -> Self {
        Self {
            env: ConstraintEnv { tree, context, admin },
        }
    }

    /// # Errors
    /// Fails when the definition is unknown or the context cannot be read.
    pub fn is_add_acceptable(&self, candidate: &CandidateObject) -> Result<ConstraintOutcome> {
        self.check(OP_CONSTRAINT_ADD, candidate, |c, env, reasons| {
            let mut ok = true;
            for handler in c.client_handlers() {
                ok &= handler.is_add_acceptable(env, candidate, reasons)?;
            }
            Ok(ok)
        })
    }

    /// # Errors
    /// Fails when the definition is unknown or the context cannot be read.
    pub fn is_modify_acceptable(&self, candidate: &CandidateObject) -> Result<ConstraintOutcome> {
        self.check(OP_CONSTRAINT_MODIFY, candidate, |c, env, reasons| {
            let mut ok = true;
            for handler in c.client_handlers() {
                ok &= handler.is_modify_acceptable(env, candidate, reasons)?;
            }
            Ok(ok)
        })
    }

    /// # Errors
    /// Fails when the definition is unknown or the context cannot be read.
    pub fn is_delete_acceptable(&self, candidate: &CandidateObject) -> Result<ConstraintOutcome> {
        self.check(OP_CONSTRAINT_DELETE, candidate, |c, env, reasons| {
            let mut ok = true;
            for handler in c.client_handlers() {
                ok &= handler.is_delete_acceptable(env, candidate, reasons)?;
            }
            Ok(ok)
        })
    }

    /// # Errors
    /// Fails when the definition is unknown or the context cannot be read.
    pub fn is_usable(&self, candidate: &CandidateObject) -> Result<ConstraintOutcome> {
        self.check(OP_CONSTRAINT_USABLE, candidate, |c, env, reasons| {
            let mut ok = true;
            for handler in c.server_handlers() {
                ok &= handler.is_usable(env, candidate, reasons)?;
            }
            Ok(ok)
        })
    }

    /// # Errors
    /// Fails when the definition is unknown or the context cannot be read.
    pub fn is_delete_allowed(&self, candidate: &CandidateObject) -> Result<ConstraintOutcome> {
        self.check(OP_CONSTRAINT_DELETE_ALLOWED, candidate, |c, env, reasons| {
            let mut ok = true;
            for handler in c.server_handlers() {
                ok &= handler.is_delete_allowed(env, candidate, reasons)?;
            }
            Ok(ok)
        })
    }

    /// # Errors
    /// The first handler failure.
    pub fn perform_post_add(&self, candidate: &CandidateObject) -> Result<()> {
        for constraint in self.env.tree.all_constraints(candidate.definition())? {
            for handler in constraint.server_handlers() {
                handler.perform_post_add(&self.env, candidate)?;
            }
        }
        Ok(())
    }

    /// # Errors
    /// The first handler failure.
    pub fn perform_post_modify(&self, candidate: &CandidateObject) -> Result<()> {
        for constraint in self.env.tree.all_constraints(candidate.definition())? {
            for handler in constraint.server_handlers() {
                handler.perform_post_modify(&self.env, candidate)?;
            }
        }
        Ok(())
    }

    /// # Errors
    /// The first handler failure.
    pub fn perform_post_delete(&self, candidate: &CandidateObject) -> Result<()> {
        for constraint in self.env.tree.all_constraints(candidate.definition())? {
            for handler in constraint.server_handlers() {
                handler.perform_post_delete(&self.env, candidate)?;
            }
        }
        Ok(())
    }

    fn check<F>(&self, op: &str, candidate: &CandidateObject, run: F) -> Result<ConstraintOutcome>
    where
        F: Fn(&Constraint, &ConstraintEnv<'_>, &mut Vec<Message>) -> Result<bool>,
    {
        let start = Instant::now();
        let path = candidate.path().to_string();
        crate::log_op_start!(op, definition = candidate.definition(), path = %path);

        let result = self.run_all(candidate, &run);

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(outcome) => {
                crate::log_op_end!(
                    op,
                    duration_ms = duration_ms,
                    definition = candidate.definition(),
                    reason_count = outcome.reasons.len()
                );
            }
            Err(err) => {
                crate::log_op_error!(op, err.clone(), duration_ms = duration_ms);
            }
        }
        result
    }

    fn run_all<F>(&self, candidate: &CandidateObject, run: &F) -> Result<ConstraintOutcome>
    where
        F: Fn(&Constraint, &ConstraintEnv<'_>, &mut Vec<Message>) -> Result<bool>,
    {
        let mut outcome = ConstraintOutcome::accept();
        for constraint in self.env.tree.all_constraints(candidate.definition())? {
            let ok = run(constraint, &self.env, &mut outcome.reasons)?;
            outcome.acceptable &= ok;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_into_result_joins_reasons() {
        let outcome = ConstraintOutcome {
            acceptable: false,
            reasons: vec![Message::new("A", "first"), Message::new("B", "second")],
        };
        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
        assert_eq!(err.message(), "first; second");
        assert!(ConstraintOutcome::accept().into_result().is_ok());
    }
}
