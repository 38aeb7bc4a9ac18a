use super::span::{SourcePos, StmtId};
use crate::bytecode::Opcode;

/// Reserved variable name for the top of the primary stack. Assigning to it
/// leaves the value in place; reading it duplicates the top item.
pub const TOP_OF_STACK: &str = "tos";

/// A literal value in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Decimal integer, pushed as a minimal script number.
    Integer(i64),
    /// `0x..` literal, pushed as raw bytes.
    Hex(Vec<u8>),
}

/// Binary operators of the expression and logical grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Less,
    LessEq,
    Equal,
    NotEqual,
    GreaterEq,
    Greater,
    /// `||`, byte-string concatenation.
    Concat,
    And,
    Or,
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        use BinaryOperator::*;
        Some(match symbol {
            "+" => Add,
            "-" => Sub,
            "*" => Mul,
            "/" => Div,
            "%" => Mod,
            "<" => Less,
            "<=" => LessEq,
            "==" => Equal,
            "!=" => NotEqual,
            ">=" => GreaterEq,
            ">" => Greater,
            "||" => Concat,
            "and" => And,
            "or" => Or,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        use BinaryOperator::*;
        match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Less => "<",
            LessEq => "<=",
            Equal => "==",
            NotEqual => "!=",
            GreaterEq => ">=",
            Greater => ">",
            Concat => "||",
            And => "and",
            Or => "or",
        }
    }

    pub fn opcode(self) -> Opcode {
        use BinaryOperator::*;
        match self {
            Add => Opcode::Add,
            Sub => Opcode::Sub,
            Mul => Opcode::Mul,
            Div => Opcode::Div,
            Mod => Opcode::Mod,
            Less => Opcode::LessThan,
            LessEq => Opcode::LessThanOrEqual,
            Equal => Opcode::Equal,
            NotEqual => Opcode::NumNotEqual,
            GreaterEq => Opcode::GreaterThanOrEqual,
            Greater => Opcode::GreaterThan,
            Concat => Opcode::Cat,
            And => Opcode::BoolAnd,
            Or => Opcode::BoolOr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Arithmetic `-x`.
    Negate,
    /// Logical `!x`.
    Not,
}

impl UnaryOperator {
    pub fn opcode(self) -> Opcode {
        match self {
            UnaryOperator::Negate => Opcode::Negate,
            UnaryOperator::Not => Opcode::Not,
        }
    }
}

/// Statement list built by [`Sequence::append`].
///
/// `append` fills `first`, then `rest`; after that the old tail and the new
/// node are wrapped into a nested sequence stored in `rest`. Lists of any
/// length therefore never need pre-sized storage.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    pub first: Option<Box<Node>>,
    pub rest: Option<Box<Node>>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, node: Node) {
        if self.first.is_none() {
            self.first = Some(Box::new(node));
        } else if let Some(rest) = self.rest.take() {
            self.rest = Some(Box::new(Node::Sequence(Sequence {
                first: Some(rest),
                rest: Some(Box::new(node)),
            })));
        } else {
            self.rest = Some(Box::new(node));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    /// Number of leaf nodes, flattening nested sequences.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Leaf nodes in generation order.
    pub fn iter(&self) -> SequenceIter<'_> {
        let mut pending = Vec::new();
        if let Some(rest) = &self.rest {
            pending.push(rest.as_ref());
        }
        if let Some(first) = &self.first {
            pending.push(first.as_ref());
        }
        SequenceIter { pending }
    }

    /// Collapse into the smallest equivalent node: `None` when empty, the
    /// single child when only one statement was appended.
    pub fn into_node(mut self) -> Option<Node> {
        let first = self.first.take()?;
        match self.rest.take() {
            None => Some(*first),
            rest => Some(Node::Sequence(Sequence {
                first: Some(first),
                rest,
            })),
        }
    }
}

// Blocks nest one level per statement; unlink them onto a worklist instead
// of recursing.
impl Drop for Sequence {
    fn drop(&mut self) {
        let mut pending: Vec<Box<Node>> =
            self.first.take().into_iter().chain(self.rest.take()).collect();
        while let Some(mut node) = pending.pop() {
            if let Node::Sequence(seq) = node.as_mut() {
                pending.extend(seq.first.take());
                pending.extend(seq.rest.take());
            }
        }
    }
}

pub struct SequenceIter<'a> {
    pending: Vec<&'a Node>,
}

impl<'a> Iterator for SequenceIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = self.pending.pop()?;
            match node {
                Node::Sequence(seq) => {
                    if let Some(rest) = &seq.rest {
                        self.pending.push(rest);
                    }
                    if let Some(first) = &seq.first {
                        self.pending.push(first);
                    }
                }
                other => return Some(other),
            }
        }
    }
}

/// Abstract syntax tree of the Hello language.
///
/// Every node owns its children. Statement nodes carry the [`StmtId`] of the
/// source span they were parsed from.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Constant(Constant),

    /// Read of a named variable, the special name `tos`, or an external
    /// `$name` value.
    VariableRead {
        name: String,
        external: bool,
        pos: SourcePos,
    },

    /// `name = value;`. Assigning to `tos` leaves the value on the stack.
    Assignment {
        name: String,
        value: Box<Node>,
        stmt: StmtId,
    },

    BinaryOp {
        op: BinaryOperator,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },

    UnaryOp {
        op: UnaryOperator,
        operand: Box<Node>,
    },

    /// `if (cond) { .. } else { .. }`.
    ///
    /// `header` spans `if (cond)`, `whole` spans the complete construct.
    Conditional {
        cond: Box<Node>,
        then_branch: Option<Box<Node>>,
        else_branch: Option<Box<Node>>,
        header: StmtId,
        whole: StmtId,
    },

    /// `for var in [first..last] { .. }`, unrolled at generation time.
    BoundedLoop {
        var: String,
        first: i64,
        last: i64,
        body: Option<Box<Node>>,
        stmt: StmtId,
    },

    Sequence(Sequence),

    /// Builtin call. Void builtins used as statements carry a span.
    NativeCall {
        name: String,
        opcode: Opcode,
        args: Sequence,
        stmt: Option<StmtId>,
    },

    /// `Assert(cond);`
    Assertion { cond: Box<Node>, stmt: StmtId },
}

impl Node {
    pub fn integer(value: i64) -> Node {
        Node::Constant(Constant::Integer(value))
    }

    /// Span covering the whole statement, for statement nodes.
    pub fn stmt(&self) -> Option<StmtId> {
        match self {
            Node::Assignment { stmt, .. }
            | Node::BoundedLoop { stmt, .. }
            | Node::Assertion { stmt, .. } => Some(*stmt),
            Node::Conditional { whole, .. } => Some(*whole),
            Node::NativeCall { stmt, .. } => *stmt,
            _ => None,
        }
    }

    /// Names assigned anywhere below this node, in the order code generation
    /// first assigns them. `tos` is never included.
    pub fn assigned_names(&self, out: &mut Vec<String>) {
        fn record(name: &str, out: &mut Vec<String>) {
            if name != TOP_OF_STACK && !out.iter().any(|n| n == name) {
                out.push(name.to_string());
            }
        }
        match self {
            Node::Assignment { name, .. } => record(name, out),
            Node::BoundedLoop { var, body, .. } => {
                record(var, out);
                if let Some(body) = body {
                    body.assigned_names(out);
                }
            }
            Node::Conditional {
                then_branch,
                else_branch,
                ..
            } => {
                for branch in [then_branch, else_branch].into_iter().flatten() {
                    branch.assigned_names(out);
                }
            }
            Node::Sequence(seq) => {
                for node in seq.iter() {
                    node.assigned_names(out);
                }
            }
            Node::Constant(_)
            | Node::VariableRead { .. }
            | Node::BinaryOp { .. }
            | Node::UnaryOp { .. }
            | Node::NativeCall { .. }
            | Node::Assertion { .. } => {}
        }
    }
}

/// Values a bounded loop binds its variable to, in order.
///
/// Ascending and inclusive when `first <= last`, otherwise descending from
/// `first` down to `last`.
pub fn loop_values(first: i64, last: i64) -> Box<dyn Iterator<Item = i64>> {
    if first <= last {
        Box::new(first..=last)
    } else {
        Box::new((last..=first).rev())
    }
}
