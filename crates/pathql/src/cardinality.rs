//! Deferred cardinality inference
//!
//! The compiler posts `(target, field, sub-expression)` entries while it
//! walks the tree; [`resolve`] fills the fields in once the whole query has
//! been compiled.

use serde::Serialize;
use std::fmt;

use crate::context::{ContextLevel, Env};
use crate::error::{CompileError, Result};
use crate::ir::{Expr, Set, SetId};
use crate::schema::{PointerCardinality, TypeModifier};
use crate::scope::ScopeId;

/// How many values an expression yields per input row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Cardinality {
    One,
    AtMostOne,
    AtLeastOne,
    Many,
}

impl Cardinality {
    fn from_bounds(can_be_empty: bool, can_be_many: bool) -> Self {
        match (can_be_empty, can_be_many) {
            (false, false) => Cardinality::One,
            (true, false) => Cardinality::AtMostOne,
            (false, true) => Cardinality::AtLeastOne,
            (true, true) => Cardinality::Many,
        }
    }

    pub fn can_be_empty(self) -> bool {
        matches!(self, Cardinality::AtMostOne | Cardinality::Many)
    }

    pub fn is_single(self) -> bool {
        matches!(self, Cardinality::One | Cardinality::AtMostOne)
    }

    /// Cross product of two inputs
    pub fn mul(self, other: Self) -> Self {
        Self::from_bounds(
            self.can_be_empty() || other.can_be_empty(),
            !self.is_single() || !other.is_single(),
        )
    }

    /// Concatenation of two inputs
    pub fn union(self, other: Self) -> Self {
        Self::from_bounds(self.can_be_empty() && other.can_be_empty(), true)
    }

    /// One of two inputs, chosen at run time
    pub fn either(self, other: Self) -> Self {
        Self::from_bounds(
            self.can_be_empty() || other.can_be_empty(),
            !self.is_single() || !other.is_single(),
        )
    }

    /// `a ?? b`: empty only when both are
    pub fn coalesce(self, other: Self) -> Self {
        Self::from_bounds(
            self.can_be_empty() && other.can_be_empty(),
            !self.is_single() || !other.is_single(),
        )
    }

    fn non_empty(self) -> Self {
        Self::from_bounds(false, !self.is_single())
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Cardinality::One => "ONE",
            Cardinality::AtMostOne => "AT_MOST_ONE",
            Cardinality::AtLeastOne => "AT_LEAST_ONE",
            Cardinality::Many => "MANY",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CardinalityField {
    IfExprCard,
    ElseExprCard,
}

impl CardinalityField {
    pub fn name(self) -> &'static str {
        match self {
            CardinalityField::IfExprCard => "if_expr_card",
            CardinalityField::ElseExprCard => "else_expr_card",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeferredCardinality {
    pub target: SetId,
    pub field: CardinalityField,
    pub sub: SetId,
    pub scope: ScopeId,
}

/// Write-only during compilation; drained by [`resolve`]
#[derive(Debug, Clone, Default)]
pub struct CardinalityQueue {
    entries: Vec<DeferredCardinality>,
}

impl CardinalityQueue {
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Post a cardinality to be computed after the whole query is compiled
pub fn defer_cardinality(
    target: SetId,
    field: CardinalityField,
    sub: SetId,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) {
    env.deferred.entries.push(DeferredCardinality {
        target,
        field,
        sub,
        scope: ctx.scope,
    });
}

/// Fill every deferred field under `root`
///
/// Entries whose target was discarded by a rewrite are skipped.
pub fn resolve(root: &mut Set, queue: CardinalityQueue) -> Result<()> {
    for entry in queue.entries {
        let Some(sub) = root.find(entry.sub) else {
            log::debug!("{} no longer in tree, skipping", entry.sub);
            continue;
        };
        let card = infer_cardinality(sub);
        log::trace!(
            "{} of {} = {} (scope {:?})",
            entry.field.name(),
            entry.target,
            card,
            entry.scope
        );

        let Some(target) = root.find_mut(entry.target) else {
            log::debug!("{} no longer in tree, skipping", entry.target);
            continue;
        };
        match (&mut target.expr, entry.field) {
            (Expr::IfElse { if_expr_card, .. }, CardinalityField::IfExprCard) => {
                *if_expr_card = Some(card);
            }
            (Expr::IfElse { else_expr_card, .. }, CardinalityField::ElseExprCard) => {
                *else_expr_card = Some(card);
            }
            _ => {
                return Err(CompileError::internal(format!(
                    "{} has no field {}",
                    entry.target,
                    entry.field.name()
                )));
            }
        }
    }
    Ok(())
}

pub fn infer_cardinality(set: &Set) -> Cardinality {
    match &set.expr {
        Expr::Constant(_)
        | Expr::EmptyArray
        | Expr::Parameter { .. }
        | Expr::TypeIntrospection { .. }
        | Expr::Array { .. } => Cardinality::One,
        Expr::EmptySet => Cardinality::AtMostOne,
        Expr::ObjectRoot => Cardinality::Many,
        Expr::PointerStep {
            source,
            cardinality,
            required,
            ..
        } => {
            let ptr = Cardinality::from_bounds(
                !required,
                *cardinality == PointerCardinality::Many,
            );
            infer_cardinality(source).mul(ptr)
        }
        Expr::TypeIntersection { source } => {
            infer_cardinality(source).mul(Cardinality::AtMostOne)
        }
        Expr::TypeCast { expr, .. } | Expr::TypeCheck { left: expr, .. } => {
            infer_cardinality(expr)
        }
        Expr::Tuple { elements, .. } => elements
            .iter()
            .map(|e| infer_cardinality(&e.val))
            .fold(Cardinality::One, Cardinality::mul),
        Expr::IfElse {
            condition,
            if_expr,
            else_expr,
            if_expr_card,
            else_expr_card,
        } => {
            let if_card = if_expr_card.unwrap_or_else(|| infer_cardinality(if_expr));
            let else_card = else_expr_card.unwrap_or_else(|| infer_cardinality(else_expr));
            infer_cardinality(condition).mul(if_card.either(else_card))
        }
        Expr::IndexIndirection { expr, index } => {
            infer_cardinality(expr).mul(infer_cardinality(index))
        }
        Expr::SliceIndirection { .. } => set
            .children()
            .into_iter()
            .map(infer_cardinality)
            .fold(Cardinality::One, Cardinality::mul),
        Expr::OperatorCall(call) => {
            let cards: Vec<_> = call.args.iter().map(|a| infer_cardinality(&a.expr)).collect();
            if call.return_typemod == TypeModifier::SetOf {
                return match (call.func_shortname.as_str(), cards.as_slice()) {
                    ("std::UNION", [l, r]) => l.union(*r),
                    ("std::??", [l, r]) => l.coalesce(*r),
                    ("std::DISTINCT", [operand]) => *operand,
                    _ => Cardinality::Many,
                };
            }
            cards
                .iter()
                .zip(&call.params_typemods)
                .map(|(card, typemod)| match typemod {
                    TypeModifier::Singleton => *card,
                    TypeModifier::Optional => card.non_empty(),
                    TypeModifier::SetOf => Cardinality::One,
                })
                .fold(Cardinality::One, Cardinality::mul)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_rules() {
        use Cardinality::*;
        assert_eq!(One.mul(One), One);
        assert_eq!(One.mul(AtMostOne), AtMostOne);
        assert_eq!(AtLeastOne.mul(AtMostOne), Many);
        assert_eq!(One.union(One), AtLeastOne);
        assert_eq!(AtMostOne.union(AtMostOne), Many);
        assert_eq!(One.either(AtMostOne), AtMostOne);
        assert_eq!(AtMostOne.coalesce(One), One);
    }

    #[test]
    fn field_names() {
        assert_eq!(CardinalityField::IfExprCard.name(), "if_expr_card");
        assert_eq!(CardinalityField::ElseExprCard.name(), "else_expr_card");
    }
}
