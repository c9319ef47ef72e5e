//! Generic post-order tree rewriting.
//!
//! [`rewrite`] rebuilds every node of a tree bottom-up: each child is rewritten
//! first, the parent is reconstructed from the rewritten children, and only then
//! is the caller's transform applied to the parent. The transform therefore
//! always sees fully processed children.
//!
//! Transforms may replace a node with any node of the same family. Returning a
//! node of another family into a slot that cannot hold it (a statement where an
//! expression belongs, say) is reported as `UnknownNodeVariant`.

use crate::ast::{Block, Expr, Expression, Node, Program, Statement, Stmt};
use crate::{err_ctx, MonkeyError};

/// Rewrites `root` bottom-up, applying `transform` to every node.
pub fn rewrite<F>(root: Node, transform: &mut F) -> Result<Node, MonkeyError>
where
    F: FnMut(Node) -> Result<Node, MonkeyError>,
{
    let rebuilt = match root {
        Node::Program(program) => Node::Program(Program {
            statements: rewrite_statements(program.statements, transform)?,
            span: program.span,
        }),
        Node::Block(block) => Node::Block(rewrite_block_children(block, transform)?),
        Node::Statement(stmt) => Node::Statement(rewrite_statement_children(stmt, transform)?),
        Node::Expression(expr) => Node::Expression(rewrite_expression_children(expr, transform)?),
    };
    transform(rebuilt)
}

/// Rewrites a program, requiring a program back.
pub fn rewrite_program<F>(program: Program, transform: &mut F) -> Result<Program, MonkeyError>
where
    F: FnMut(Node) -> Result<Node, MonkeyError>,
{
    let span = program.span;
    match rewrite(Node::Program(program), transform)? {
        Node::Program(program) => Ok(program),
        other => Err(shape_error("program", &other).at(span)),
    }
}

/// Rewrites an expression, requiring an expression back.
pub fn rewrite_expression<F>(expr: Expression, transform: &mut F) -> Result<Expression, MonkeyError>
where
    F: FnMut(Node) -> Result<Node, MonkeyError>,
{
    match rewrite(Node::Expression(expr), transform)? {
        Node::Expression(expr) => Ok(expr),
        other => Err(shape_error("expression", &other)),
    }
}

fn rewrite_statement<F>(stmt: Statement, transform: &mut F) -> Result<Statement, MonkeyError>
where
    F: FnMut(Node) -> Result<Node, MonkeyError>,
{
    match rewrite(Node::Statement(stmt), transform)? {
        Node::Statement(stmt) => Ok(stmt),
        other => Err(shape_error("statement", &other)),
    }
}

fn rewrite_block<F>(block: Block, transform: &mut F) -> Result<Block, MonkeyError>
where
    F: FnMut(Node) -> Result<Node, MonkeyError>,
{
    match rewrite(Node::Block(block), transform)? {
        Node::Block(block) => Ok(block),
        other => Err(shape_error("block", &other)),
    }
}

// ============================================================================
// CHILD RECONSTRUCTION
// ============================================================================

fn rewrite_statements<F>(statements: Vec<Statement>, transform: &mut F) -> Result<Vec<Statement>, MonkeyError>
where
    F: FnMut(Node) -> Result<Node, MonkeyError>,
{
    statements
        .into_iter()
        .map(|stmt| rewrite_statement(stmt, transform))
        .collect()
}

fn rewrite_expressions<F>(exprs: Vec<Expression>, transform: &mut F) -> Result<Vec<Expression>, MonkeyError>
where
    F: FnMut(Node) -> Result<Node, MonkeyError>,
{
    exprs
        .into_iter()
        .map(|expr| rewrite_expression(expr, transform))
        .collect()
}

fn rewrite_boxed<F>(expr: Box<Expression>, transform: &mut F) -> Result<Box<Expression>, MonkeyError>
where
    F: FnMut(Node) -> Result<Node, MonkeyError>,
{
    rewrite_expression(*expr, transform).map(Box::new)
}

fn rewrite_block_children<F>(block: Block, transform: &mut F) -> Result<Block, MonkeyError>
where
    F: FnMut(Node) -> Result<Node, MonkeyError>,
{
    Ok(Block {
        statements: rewrite_statements(block.statements, transform)?,
        span: block.span,
    })
}

fn rewrite_statement_children<F>(stmt: Statement, transform: &mut F) -> Result<Statement, MonkeyError>
where
    F: FnMut(Node) -> Result<Node, MonkeyError>,
{
    let value = match stmt.value {
        Stmt::Let { name, value } => Stmt::Let {
            name,
            value: rewrite_expression(value, transform)?,
        },
        Stmt::Return(value) => Stmt::Return(rewrite_expression(value, transform)?),
        Stmt::Expression(expr) => Stmt::Expression(rewrite_expression(expr, transform)?),
    };
    Ok(Statement::new(value, stmt.span))
}

fn rewrite_expression_children<F>(expr: Expression, transform: &mut F) -> Result<Expression, MonkeyError>
where
    F: FnMut(Node) -> Result<Node, MonkeyError>,
{
    let value = match expr.value {
        leaf @ (Expr::Identifier(_) | Expr::Integer(_) | Expr::Boolean(_) | Expr::Str(_)) => leaf,
        Expr::Prefix { operator, right } => Expr::Prefix {
            operator,
            right: rewrite_boxed(right, transform)?,
        },
        Expr::Infix { left, operator, right } => Expr::Infix {
            left: rewrite_boxed(left, transform)?,
            operator,
            right: rewrite_boxed(right, transform)?,
        },
        Expr::If {
            condition,
            consequence,
            alternative,
        } => Expr::If {
            condition: rewrite_boxed(condition, transform)?,
            consequence: rewrite_block(consequence, transform)?,
            alternative: alternative
                .map(|alt| rewrite_block(alt, transform))
                .transpose()?,
        },
        // Parameter lists are binding sites, not expressions.
        Expr::Function { parameters, body } => Expr::Function {
            parameters,
            body: rewrite_block(body, transform)?,
        },
        Expr::Macro { parameters, body } => Expr::Macro {
            parameters,
            body: rewrite_block(body, transform)?,
        },
        Expr::Call { function, arguments } => Expr::Call {
            function: rewrite_boxed(function, transform)?,
            arguments: rewrite_expressions(arguments, transform)?,
        },
        Expr::Array(items) => Expr::Array(rewrite_expressions(items, transform)?),
        Expr::Index { left, index } => Expr::Index {
            left: rewrite_boxed(left, transform)?,
            index: rewrite_boxed(index, transform)?,
        },
        Expr::Hash(pairs) => Expr::Hash(
            pairs
                .into_iter()
                .map(|(key, value)| {
                    Ok((
                        rewrite_expression(key, transform)?,
                        rewrite_expression(value, transform)?,
                    ))
                })
                .collect::<Result<Vec<_>, MonkeyError>>()?,
        ),
    };
    Ok(Expression::new(value, expr.span))
}

fn shape_error(expected: &str, found: &Node) -> MonkeyError {
    err_ctx!(
        UnknownNodeVariant,
        found.span(),
        "expected a {} node, transform produced a {}",
        expected,
        found.kind()
    )
    .with_help("this is an interpreter defect: a rewrite transform must preserve the node family")
}
