//! `do .. while` and `do .. until` loops
//!
//! Both loops run their body at least once. One body scope is created per
//! evaluation of the loop and shared by all of its iterations, so a
//! variable introduced by the body in one iteration is visible in the next
//! and gone once the loop returns. The condition is evaluated against the
//! caller's scope, never the body scope.

use core_types::{EvalError, EvalResult, SourceRange, Value, ValueType};
use std::sync::Arc;

use crate::parser_context::{ExpressionCompiler, ParserContext};
use crate::scope::{MapScope, VariableScope};
use crate::statement::ExecutableStatement;

/// Fails unless `statement` can produce a value of type `expected`
///
/// Statements whose type is statically unknown are accepted.
pub fn expect_type(statement: &dyn ExecutableStatement, expected: ValueType) -> EvalResult<()> {
    let found = statement.known_egress_type();
    if expected.is_assignable_from(found) || matches!(found, ValueType::Unknown | ValueType::Object) {
        Ok(())
    } else {
        Err(EvalError::compile(format!(
            "was expecting type: {}; but found type: {}",
            expected, found
        )))
    }
}

struct LoopParts {
    condition: Arc<dyn ExecutableStatement>,
    block: Arc<dyn ExecutableStatement>,
}

impl LoopParts {
    fn compile(
        expr: &str,
        condition_range: SourceRange,
        block_range: SourceRange,
        ctx: &mut ParserContext,
        compiler: &dyn ExpressionCompiler,
    ) -> EvalResult<Self> {
        let condition = compiler
            .compile(expr, condition_range, ctx)
            .and_then(|condition| {
                expect_type(condition.as_ref(), ValueType::Boolean)?;
                Ok(condition)
            })
            .map_err(|err| err.with_range(condition_range))?;

        ctx.push_variable_scope();
        let block = compiler.compile(expr, block_range, ctx);
        ctx.pop_variable_scope();

        Ok(Self {
            condition,
            block: block.map_err(|err| err.with_range(block_range))?,
        })
    }

    fn test(&self, ctx: &Value, this: &Value, scope: &dyn VariableScope) -> EvalResult<bool> {
        let value = self.condition.get_value(ctx, this, scope)?;
        value.as_bool().ok_or_else(|| {
            EvalError::context_shape(format!(
                "loop condition {} must be Boolean, found {}",
                self.condition.node_expr(),
                value.type_name()
            ))
        })
    }

    /// Run the body, then keep going while the condition equals
    /// `continue_while`
    fn run(
        &self,
        continue_while: bool,
        ctx: &Value,
        this: &Value,
        scope: &dyn VariableScope,
    ) -> EvalResult<Value> {
        let body_scope = MapScope::with_parent(scope);
        loop {
            self.block.get_value(ctx, this, &body_scope)?;
            if self.test(ctx, this, scope)? != continue_while {
                return Ok(Value::Null);
            }
        }
    }
}

/// `do { block } while (condition)`
pub struct DoNode {
    parts: LoopParts,
}

impl DoNode {
    /// Loop over already compiled statements
    pub fn new(condition: Arc<dyn ExecutableStatement>, block: Arc<dyn ExecutableStatement>) -> Self {
        Self {
            parts: LoopParts { condition, block },
        }
    }

    /// Compile the condition and the body from ranges of `expr`
    ///
    /// The body is compiled under a pushed variable scope of `ctx`, popped
    /// again before returning. The condition must be Boolean.
    pub fn compile(
        expr: &str,
        condition: SourceRange,
        block: SourceRange,
        ctx: &mut ParserContext,
        compiler: &dyn ExpressionCompiler,
    ) -> EvalResult<Self> {
        Ok(Self {
            parts: LoopParts::compile(expr, condition, block, ctx, compiler)?,
        })
    }

    /// Loop condition
    pub fn condition(&self) -> &Arc<dyn ExecutableStatement> {
        &self.parts.condition
    }

    /// Loop body
    pub fn block(&self) -> &Arc<dyn ExecutableStatement> {
        &self.parts.block
    }

    /// Run the loop; always yields `Null`
    pub fn reduce(&self, ctx: &Value, this: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        self.parts.run(true, ctx, this, scope)
    }
}

/// `do { block } until (condition)`
pub struct DoUntilNode {
    parts: LoopParts,
}

impl DoUntilNode {
    /// Loop over already compiled statements
    pub fn new(condition: Arc<dyn ExecutableStatement>, block: Arc<dyn ExecutableStatement>) -> Self {
        Self {
            parts: LoopParts { condition, block },
        }
    }

    /// Compile the condition and the body from ranges of `expr`; see
    /// [`DoNode::compile`]
    pub fn compile(
        expr: &str,
        condition: SourceRange,
        block: SourceRange,
        ctx: &mut ParserContext,
        compiler: &dyn ExpressionCompiler,
    ) -> EvalResult<Self> {
        Ok(Self {
            parts: LoopParts::compile(expr, condition, block, ctx, compiler)?,
        })
    }

    /// Loop condition
    pub fn condition(&self) -> &Arc<dyn ExecutableStatement> {
        &self.parts.condition
    }

    /// Loop body
    pub fn block(&self) -> &Arc<dyn ExecutableStatement> {
        &self.parts.block
    }

    /// Run the loop; always yields `Null`
    pub fn reduce(&self, ctx: &Value, this: &Value, scope: &dyn VariableScope) -> EvalResult<Value> {
        self.parts.run(false, ctx, this, scope)
    }
}
