//! # Join Trees
//!
//! Recorded plans arrive as fully parenthesized bushy-tree expressions:
//!
//! ```text
//! Expr := Leaf | "(" Expr "|" Expr ")"
//! Leaf := RelationName            (optionally wrapped in parentheses)
//! ```
//!
//! `|` is the only operator and has no precedence; parentheses alone decide the
//! nesting. Within the inner content of a join node, exactly one `|` sits at
//! depth 0 and it separates the two inputs.
//!
//! Parsing never fails as a whole. A fragment that does not fit the grammar is
//! kept in the tree as `JoinTree::Malformed` so the evaluator can substitute a
//! fallback result for that subtree alone and still cost the rest of the plan.
//! The same applies to joins nested deeper than `MAX_JOIN_DEPTH`.

use std::fmt;

const JOIN: char = '|';

/// Deepest join nesting the parser expands. A plan over the at most 64
/// relations of a `RelationSet` needs at most 63 levels.
pub const MAX_JOIN_DEPTH: usize = 64;

/// A parsed join tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinTree {
    /// A base relation.
    Leaf { name: String },
    /// A binary join of two subtrees.
    Join {
        left: Box<JoinTree>,
        right: Box<JoinTree>,
    },
    /// A fragment that could not be parsed, kept verbatim (trimmed).
    Malformed { text: String },
}

impl JoinTree {
    pub fn leaf(name: impl Into<String>) -> Self {
        JoinTree::Leaf { name: name.into() }
    }

    pub fn join(left: JoinTree, right: JoinTree) -> Self {
        JoinTree::Join {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Parse a join-tree expression.
    pub fn parse(expr: &str) -> JoinTree {
        parse_at(expr, 0)
    }

    /// Relation names in left-to-right order, including repeats.
    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            JoinTree::Leaf { name } => out.push(name),
            JoinTree::Join { left, right } => {
                left.collect_leaves(out);
                right.collect_leaves(out);
            }
            JoinTree::Malformed { .. } => {}
        }
    }

    /// Number of join levels; a single leaf has depth 0.
    pub fn depth(&self) -> usize {
        match self {
            JoinTree::Join { left, right } => 1 + left.depth().max(right.depth()),
            _ => 0,
        }
    }

    pub fn num_joins(&self) -> usize {
        match self {
            JoinTree::Join { left, right } => 1 + left.num_joins() + right.num_joins(),
            _ => 0,
        }
    }

    pub fn malformed_count(&self) -> usize {
        match self {
            JoinTree::Join { left, right } => left.malformed_count() + right.malformed_count(),
            JoinTree::Malformed { .. } => 1,
            JoinTree::Leaf { .. } => 0,
        }
    }
}

/// Parse `expr` as a subtree nested under `depth` joins.
fn parse_at(expr: &str, depth: usize) -> JoinTree {
    let text = expr.trim();

    if !text.contains(JOIN) {
        return parse_leaf(text);
    }
    if depth >= MAX_JOIN_DEPTH {
        return malformed(text);
    }

    let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) else {
        return malformed(text);
    };

    match split_point(inner) {
        Some(at) => JoinTree::join(
            parse_at(&inner[..at], depth + 1),
            parse_at(&inner[at + JOIN.len_utf8()..], depth + 1),
        ),
        None => malformed(text),
    }
}

fn malformed(text: &str) -> JoinTree {
    JoinTree::Malformed {
        text: text.to_string(),
    }
}

/// A leaf may carry redundant parentheses such as `((title))`; they are dropped.
/// Unbalanced parentheses or an empty name make the leaf malformed.
fn parse_leaf(text: &str) -> JoinTree {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return malformed(text);
        }
    }
    if depth != 0 {
        return malformed(text);
    }

    let name: String = text.chars().filter(|c| *c != '(' && *c != ')').collect();
    let name = name.trim();
    if name.is_empty() {
        return malformed(text);
    }
    JoinTree::leaf(name)
}

/// Byte offset of the first `|` at paren depth 0.
fn split_point(inner: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            JOIN if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

impl fmt::Display for JoinTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinTree::Leaf { name } => write!(f, "{}", name),
            JoinTree::Join { left, right } => write!(f, "({}|{})", left, right),
            JoinTree::Malformed { text } => write!(f, "{}", text),
        }
    }
}
