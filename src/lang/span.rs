use serde::{Deserialize, Serialize};

/// A point in the source text.
///
/// `offset` is the absolute character offset into the source, `line` and
/// `col` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourcePos {
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl SourcePos {
    pub fn new(offset: usize, line: usize, col: usize) -> Self {
        SourcePos { offset, line, col }
    }

    /// Position of the first character of a source text.
    pub fn start() -> Self {
        SourcePos::new(0, 1, 1)
    }
}

impl std::fmt::Display for SourcePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// The source interval backing one statement.
///
/// `end` points one past the last character of the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stmt {
    pub start: SourcePos,
    pub end: SourcePos,
}

impl Stmt {
    pub fn new(start: SourcePos, end: SourcePos) -> Self {
        Stmt { start, end }
    }

    /// Slice the statement's text out of the source it was parsed from.
    ///
    /// Returns an empty string if the span does not fit the given source.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        let mut indices = source
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(source.len()));
        let from = indices.nth(self.start.offset);
        let to = match self.end.offset.checked_sub(self.start.offset) {
            Some(0) => from,
            Some(n) => indices.nth(n - 1),
            None => None,
        };
        match (from, to) {
            (Some(a), Some(b)) => &source[a..b],
            _ => "",
        }
    }
}

/// Index of a statement in a [`StmtTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StmtId(pub usize);

/// Append-only table of statement spans.
///
/// The parser records spans here; AST nodes and instructions refer to them
/// by [`StmtId`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StmtTable {
    stmts: Vec<Stmt>,
}

impl StmtTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, stmt: Stmt) -> StmtId {
        self.stmts.push(stmt);
        StmtId(self.stmts.len() - 1)
    }

    pub fn get(&self, id: StmtId) -> Option<&Stmt> {
        self.stmts.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn clear(&mut self) {
        self.stmts.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stmt> {
        self.stmts.iter()
    }
}
