//! Selector AST
//!
//! These types represent a parsed selection expression. They are pure data:
//! no graph references, no evaluation logic.

use std::fmt;

use serde::Serialize;

use crate::model::Materialization;

/// A complete selection expression: clauses applied left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectorExpr {
    pub clauses: Vec<Clause>,
}

impl SelectorExpr {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// True if the first clause is an exclusion.
    pub fn starts_with_exclusion(&self) -> bool {
        self.clauses.first().is_some_and(|c| c.negated)
    }
}

/// One comma-separated unit: `[!][+[N]][@[N]]method`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clause {
    pub method: SelectorMethod,
    /// `+`: include descendants up to this depth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<ExpandDepth>,
    /// `@`: include ancestors up to this depth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parents: Option<ExpandDepth>,
    /// `!`: subtract the (expanded) matches instead of adding them.
    pub negated: bool,
    /// Set when depth digits were written flush against a bare name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush: Option<FlushDepth>,
}

/// Which graph operator a depth belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// `+`
    Children,
    /// `@`
    Parents,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Children => "+",
            Operator::Parents => "@",
        }
    }
}

/// A depth written with no space before the name, as in `+2model`.
///
/// The digits may just as well begin the model's name (`+2020_orders`), so
/// the evaluator keeps both readings and picks the one the graph knows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlushDepth {
    pub operator: Operator,
    /// The digits exactly as written, leading zeros included.
    pub digits: String,
}

impl Clause {
    pub fn new(method: SelectorMethod) -> Self {
        Self { method, children: None, parents: None, negated: false, flush: None }
    }

    pub fn with_children(mut self, depth: ExpandDepth) -> Self {
        self.children = Some(depth);
        self
    }

    pub fn with_parents(mut self, depth: ExpandDepth) -> Self {
        self.parents = Some(depth);
        self
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn expands(&self) -> bool {
        self.children.is_some() || self.parents.is_some()
    }

    pub fn depth(&self, operator: Operator) -> Option<ExpandDepth> {
        match operator {
            Operator::Children => self.children,
            Operator::Parents => self.parents,
        }
    }

    /// The flush depth, if it still sits between its operator and a bare name.
    fn written_flush(&self) -> Option<&FlushDepth> {
        let flush = self.flush.as_ref()?;
        let bounded = matches!(self.depth(flush.operator), Some(ExpandDepth::Max(_)));
        (bounded && matches!(self.method, SelectorMethod::Name(_))).then_some(flush)
    }

    /// The clause read with the flush digits as the start of the name and the
    /// operator unbounded: `+2020_orders` as `+` over `2020_orders`.
    pub fn flush_name_reading(&self) -> Option<Clause> {
        let flush = self.written_flush()?;
        let SelectorMethod::Name(name) = &self.method else {
            return None;
        };

        let mut reading = Clause::new(SelectorMethod::Name(format!("{}{name}", flush.digits)));
        reading.negated = self.negated;
        reading.children = self.children;
        reading.parents = self.parents;
        match flush.operator {
            Operator::Children => reading.children = Some(ExpandDepth::Unbounded),
            Operator::Parents => reading.parents = Some(ExpandDepth::Unbounded),
        }
        Some(reading)
    }
}

/// What a clause matches before any graph expansion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "method", content = "value", rename_all = "snake_case")]
pub enum SelectorMethod {
    /// `*`
    All,
    /// Bare identifier, exact match.
    Name(String),
    /// `tag:<tag>`
    Tag(String),
    /// `config.materialized:<kind>`
    ConfigMaterialized(Materialization),
    /// `path:<prefix>` or any atom containing `/`. Stored normalized.
    Path(String),
}

/// How far a `+` / `@` expansion walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpandDepth {
    /// Until no new nodes are discovered.
    #[default]
    Unbounded,
    /// At most this many hops from the seed nodes.
    Max(usize),
}

impl ExpandDepth {
    /// Whether another hop is allowed after `hops` hops.
    pub fn allows(self, hops: usize) -> bool {
        match self {
            ExpandDepth::Unbounded => true,
            ExpandDepth::Max(max) => hops < max,
        }
    }
}

// ============================================================================
// Canonical rendering
// ============================================================================

impl fmt::Display for SelectorExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("!")?;
        }

        // A flush depth goes last so it stays against the name.
        let flush = self.written_flush();
        let order = match flush.map(|d| d.operator) {
            Some(Operator::Children) => [Operator::Parents, Operator::Children],
            _ => [Operator::Children, Operator::Parents],
        };

        let mut last = None;
        for operator in order {
            let Some(depth) = self.depth(operator) else { continue };
            f.write_str(operator.symbol())?;
            match flush {
                Some(d) if d.operator == operator => f.write_str(&d.digits)?,
                _ => write!(f, "{depth}")?,
            }
            last = Some(depth);
        }

        // `+2 model` and `+ 2b`: a space keeps the name from fusing with the
        // operator's depth.
        if let (Some(depth), None, SelectorMethod::Name(name)) = (last, flush, &self.method) {
            let bounded = matches!(depth, ExpandDepth::Max(_));
            if bounded || name.starts_with(|c: char| c.is_ascii_digit()) {
                f.write_str(" ")?;
            }
        }

        write!(f, "{}", self.method)
    }
}

impl fmt::Display for SelectorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorMethod::All => f.write_str("*"),
            SelectorMethod::Name(name) => f.write_str(name),
            SelectorMethod::Tag(tag) => write!(f, "tag:{tag}"),
            SelectorMethod::ConfigMaterialized(kind) => write!(f, "config.materialized:{kind}"),
            SelectorMethod::Path(prefix) => write!(f, "path:{prefix}"),
        }
    }
}

impl fmt::Display for ExpandDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpandDepth::Unbounded => Ok(()),
            ExpandDepth::Max(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_canonical_form() {
        let expr = SelectorExpr {
            clauses: vec![
                Clause::new(SelectorMethod::Tag("staging".into())),
                Clause::new(SelectorMethod::Name("stg_orders".into())).with_children(ExpandDepth::Unbounded),
                Clause::new(SelectorMethod::ConfigMaterialized(Materialization::Table)).negate(),
                Clause::new(SelectorMethod::Path("models/marts".into()))
                    .with_children(ExpandDepth::Max(2))
                    .with_parents(ExpandDepth::Unbounded),
            ],
        };
        assert_eq!(
            expr.to_string(),
            "tag:staging,+stg_orders,!config.materialized:table,+2@path:models/marts"
        );
    }

    #[test]
    fn test_display_keeps_names_apart_from_depths() {
        let name = |n: &str| Clause::new(SelectorMethod::Name(n.into()));
        assert_eq!(name("2b").with_children(ExpandDepth::Unbounded).to_string(), "+ 2b");
        assert_eq!(name("7").with_children(ExpandDepth::Max(3)).to_string(), "+3 7");
        assert_eq!(name("model").with_parents(ExpandDepth::Max(2)).to_string(), "@2 model");
        assert_eq!(
            Clause::new(SelectorMethod::All).with_children(ExpandDepth::Max(2)).to_string(),
            "+2*"
        );
    }

    #[test]
    fn test_flush_depth_renders_last() {
        let mut clause = Clause::new(SelectorMethod::Name("model".into()))
            .with_children(ExpandDepth::Max(3))
            .with_parents(ExpandDepth::Max(2));
        clause.flush = Some(FlushDepth { operator: Operator::Children, digits: "3".into() });
        assert_eq!(clause.to_string(), "@2+3model");
    }

    #[test]
    fn test_flush_name_reading() {
        let mut clause = Clause::new(SelectorMethod::Name("_orders".into()))
            .with_children(ExpandDepth::Max(2020))
            .negate();
        clause.flush = Some(FlushDepth { operator: Operator::Children, digits: "2020".into() });

        let reading = clause.flush_name_reading().unwrap();
        assert_eq!(reading.method, SelectorMethod::Name("2020_orders".into()));
        assert_eq!(reading.children, Some(ExpandDepth::Unbounded));
        assert!(reading.negated);
        assert_eq!(reading.flush, None);
        assert_eq!(reading.to_string(), "!+ 2020_orders");

        assert!(Clause::new(SelectorMethod::All).flush_name_reading().is_none());
    }

    #[test]
    fn test_depth_allows() {
        assert!(ExpandDepth::Unbounded.allows(10_000));
        assert!(ExpandDepth::Max(2).allows(1));
        assert!(!ExpandDepth::Max(2).allows(2));
        assert!(!ExpandDepth::Max(0).allows(0));
    }

    #[test]
    fn test_starts_with_exclusion() {
        let expr = SelectorExpr {
            clauses: vec![Clause::new(SelectorMethod::All).negate()],
        };
        assert!(expr.starts_with_exclusion());
        assert!(!SelectorExpr::default().starts_with_exclusion());
    }
}
