//! AST module for the Monkey language
//!
//! This module provides the syntax tree the parser produces, the macro system
//! rewrites and the evaluator walks. Every statement and expression carries the
//! span of the source it came from.

// ============================================================================
// IMPORTS
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Represents a span in the source code as byte offsets.
///
/// # Examples
///
/// ```rust
/// use monkey::ast::Span;
/// let span = Span { start: 0, end: 5 };
/// assert_eq!(span.len(), 5);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Wrapper for carrying source span information with any value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }
}

pub type Expression = Spanned<Expr>;
pub type Statement = Spanned<Stmt>;

/// A whole source file: the ordered top-level statements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// A braced statement sequence, as found in `if`, `fn` and `macro` bodies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Let { name: String, value: Expression },
    Return(Expression),
    Expression(Expression),
}

/// The core AST node for Monkey expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Identifier(String),
    Integer(i64),
    Boolean(bool),
    Str(String),
    Prefix {
        operator: PrefixOp,
        right: Box<Expression>,
    },
    Infix {
        left: Box<Expression>,
        operator: InfixOp,
        right: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        consequence: Block,
        alternative: Option<Block>,
    },
    Function {
        parameters: Vec<String>,
        body: Block,
    },
    /// `macro(params) { body }`; only meaningful as the value of a top-level `let`.
    Macro {
        parameters: Vec<String>,
        body: Block,
    },
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Array(Vec<Expression>),
    Index {
        left: Box<Expression>,
        index: Box<Expression>,
    },
    /// Key/value pairs in source order.
    Hash(Vec<(Expression, Expression)>),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefixOp {
    Not,
    Negate,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Eq,
    NotEq,
}

/// Any node the tree rewriter can visit.
///
/// The family is closed: adding a variant forces every `match` in the rewriter,
/// the unquote resolver and the evaluator to handle it.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Program(Program),
    Block(Block),
    Statement(Statement),
    Expression(Expression),
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Expr {
    /// Returns the callee name if this is a call through a plain identifier.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monkey::ast::{Expr, Span, Spanned};
    /// let callee = Spanned::new(Expr::Identifier("unquote".into()), Span::default());
    /// let call = Expr::Call { function: Box::new(callee), arguments: vec![] };
    /// assert_eq!(call.callee_name(), Some("unquote"));
    /// assert_eq!(Expr::Integer(1).callee_name(), None);
    /// ```
    pub fn callee_name(&self) -> Option<&str> {
        let Expr::Call { function, .. } = self else {
            return None;
        };
        match &function.value {
            Expr::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Identifier(_) => "identifier",
            Expr::Integer(_) => "integer literal",
            Expr::Boolean(_) => "boolean literal",
            Expr::Str(_) => "string literal",
            Expr::Prefix { .. } => "prefix expression",
            Expr::Infix { .. } => "infix expression",
            Expr::If { .. } => "if expression",
            Expr::Function { .. } => "function literal",
            Expr::Macro { .. } => "macro literal",
            Expr::Call { .. } => "call expression",
            Expr::Array(_) => "array literal",
            Expr::Index { .. } => "index expression",
            Expr::Hash(_) => "hash literal",
        }
    }
}

impl Node {
    /// Short name of the node family, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Program(_) => "program",
            Node::Block(_) => "block",
            Node::Statement(_) => "statement",
            Node::Expression(_) => "expression",
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Node::Program(program) => program.span,
            Node::Block(block) => block.span,
            Node::Statement(stmt) => stmt.span,
            Node::Expression(expr) => expr.span,
        }
    }
}

impl PrefixOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            PrefixOp::Not => "!",
            PrefixOp::Negate => "-",
        }
    }
}

impl InfixOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::Lt => "<",
            InfixOp::Gt => ">",
            InfixOp::Eq => "==",
            InfixOp::NotEq => "!=",
        }
    }
}

// ============================================================================
// DISPLAY
// ============================================================================
//
// Rendering is canonical and re-parseable: infix and prefix expressions are
// fully parenthesised, statements end in `;`. Two trees are structurally equal
// (ignoring spans) iff their renderings are equal.

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stmt) in self.statements.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", stmt.value)?;
        }
        Ok(())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.statements.is_empty() {
            return write!(f, "{{ }}");
        }
        write!(f, "{{ ")?;
        for stmt in &self.statements {
            write!(f, "{} ", stmt.value)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let { name, value } => write!(f, "let {} = {};", name, value.value),
            Stmt::Return(value) => write!(f, "return {};", value.value),
            Stmt::Expression(expr) => write!(f, "{};", expr.value),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier(name) => write!(f, "{}", name),
            Expr::Integer(n) => write!(f, "{}", n),
            Expr::Boolean(b) => write!(f, "{}", b),
            Expr::Str(s) => write!(f, "\"{}\"", escape_string(s)),
            Expr::Prefix { operator, right } => {
                write!(f, "({}{})", operator.symbol(), right.value)
            }
            Expr::Infix {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left.value, operator.symbol(), right.value),
            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if ({}) {}", condition.value, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Expr::Function { parameters, body } => {
                write!(f, "fn({}) {}", parameters.join(", "), body)
            }
            Expr::Macro { parameters, body } => {
                write!(f, "macro({}) {}", parameters.join(", "), body)
            }
            Expr::Call {
                function,
                arguments,
            } => {
                write!(f, "{}(", function.value)?;
                write_comma_separated(f, arguments)?;
                write!(f, ")")
            }
            Expr::Array(items) => {
                write!(f, "[")?;
                write_comma_separated(f, items)?;
                write!(f, "]")
            }
            Expr::Index { left, index } => write!(f, "({}[{}])", left.value, index.value),
            Expr::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key.value, value.value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Program(program) => write!(f, "{}", program),
            Node::Block(block) => write!(f, "{}", block),
            Node::Statement(stmt) => write!(f, "{}", stmt.value),
            Node::Expression(expr) => write!(f, "{}", expr.value),
        }
    }
}

// ------------------------------------------------------------------------
// Display helpers
// ------------------------------------------------------------------------

fn write_comma_separated(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item.value)?;
    }
    Ok(())
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(value: Expr) -> Expression {
        Spanned::new(value, Span::default())
    }

    #[test]
    fn display_parenthesises_operators() {
        let sum = expr(Expr::Infix {
            left: Box::new(expr(Expr::Integer(1))),
            operator: InfixOp::Add,
            right: Box::new(expr(Expr::Integer(2))),
        });
        let negated = Expr::Prefix {
            operator: PrefixOp::Not,
            right: Box::new(sum),
        };
        assert_eq!(negated.to_string(), "(!(1 + 2))");
    }

    #[test]
    fn display_escapes_strings() {
        assert_eq!(Expr::Str("say \"hi\"\n".into()).to_string(), "\"say \\\"hi\\\"\\n\"");
    }

    #[test]
    fn span_to_covers_both() {
        assert_eq!(Span::new(4, 6).to(Span::new(1, 3)), Span::new(1, 6));
    }
}
