use crate::frontend::builtins::{self, Arity, Builtin};
use crate::frontend::lexer::{Lexer, hex_bytes};
use crate::frontend::parser_error::ParseError;
use crate::frontend::token::{Token, TokenKind};
use crate::lang::node::{BinaryOperator, Constant, Node, Sequence, UnaryOperator};
use crate::lang::span::{SourcePos, Stmt, StmtId, StmtTable};

/// Operators the lexer recognizes but the grammar has no use for.
const RESERVED_OPERATORS: [&str; 4] = ["&&", "&", "|", "~"];

const RELATIONAL_OPERATORS: [&str; 6] = ["<", "<=", "==", "!=", ">=", ">"];

/// Recursive-descent parser for Hello.
///
/// The parser pulls tokens from a [`Lexer`] with one token of lookahead and
/// produces one top-level statement per call to [`Parser::parse_statement`].
/// Statement spans are recorded in the parser's [`StmtTable`]; AST nodes refer
/// to them by [`StmtId`].
///
/// Notes:
/// - The grammar is LL(1). Nothing is ever backtracked.
/// - A parenthesis at the start of a logical value always opens a nested
///   logical expression, so `(a + 1) < 2` is not valid; write `a + 1 < 2`.
pub struct Parser {
    lexer: Lexer,
    stmts: StmtTable,

    /// Blocks opened and not yet closed
    depth: usize,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Parser {
            lexer: Lexer::new(source),
            stmts: StmtTable::new(),
            depth: 0,
        }
    }

    pub fn stmts(&self) -> &StmtTable {
        &self.stmts
    }

    pub fn into_stmts(self) -> StmtTable {
        self.stmts
    }

    /// True when only whitespace and comments remain.
    pub fn at_end(&mut self) -> bool {
        self.lexer.at_end()
    }

    /// Parses a whole program, collecting one error per failed statement.
    ///
    /// Returns the top-level statements in source order, or every error
    /// encountered if any statement failed.
    pub fn parse_program(&mut self) -> Result<Vec<Node>, Vec<ParseError>> {
        let mut nodes = Vec::new();
        let mut errors = Vec::new();
        while !self.at_end() {
            match self.parse_statement() {
                Ok(node) => nodes.push(node),
                Err(err) => {
                    errors.push(err);
                    self.synchronize();
                }
            }
        }
        if errors.is_empty() {
            Ok(nodes)
        } else {
            Err(errors)
        }
    }

    /// Skips input to the next top-level statement boundary.
    ///
    /// Used after an error so that parsing can resume at a statement boundary.
    /// An error inside a block skips past the `}` that closes the enclosing
    /// top-level statement, along with any `else` block that follows it.
    /// Lexical errors met on the way are dropped.
    pub fn synchronize(&mut self) {
        let mut depth = std::mem::take(&mut self.depth);
        loop {
            match self.lexer.next_token() {
                Ok(token) if token.is_eof() => break,
                Ok(token) if token.is(";") && depth == 0 => break,
                Ok(token) if token.is("{") => depth += 1,
                Ok(token) if token.is("}") => {
                    depth = depth.saturating_sub(1);
                    if depth > 0 {
                        continue;
                    }
                    if !matches!(self.lexer.peek(), Ok(next) if next.is("else")) {
                        break;
                    }
                    let _ = self.lexer.next_token();
                }
                Ok(_) | Err(_) => {}
            }
        }
    }

    fn peek(&mut self) -> Result<&Token, ParseError> {
        Ok(self.lexer.peek()?)
    }

    fn peek_is(&mut self, text: &str) -> Result<bool, ParseError> {
        Ok(self.peek()?.is(text))
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        Ok(self.lexer.next_token()?)
    }

    /// Start position of the next token.
    fn start_position(&mut self) -> Result<SourcePos, ParseError> {
        Ok(self.peek()?.pos)
    }

    /// Records a statement spanning from `start` to the end of the last
    /// consumed token.
    fn declare_stmt(&mut self, start: SourcePos) -> StmtId {
        let end = self.lexer.end_position();
        self.stmts.declare(Stmt::new(start, end))
    }

    fn unexpected(token: &Token, expected: &str) -> ParseError {
        if token.kind == TokenKind::Operator && RESERVED_OPERATORS.contains(&token.text.as_str()) {
            return ParseError::UnsupportedOperator {
                symbol: token.text.clone(),
                pos: token.pos,
            };
        }
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: token.to_string(),
            pos: token.pos,
        }
    }

    /// Consumes the operator or keyword `text`.
    ///
    /// # Errors
    /// - If the next token is anything else.
    fn expect(&mut self, text: &str) -> Result<Token, ParseError> {
        let token = self.peek()?;
        if token.is(text) {
            self.advance()
        } else {
            Err(Self::unexpected(token, &format!("'{}'", text)))
        }
    }

    fn expect_kind(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        let token = self.peek()?;
        if token.kind == kind {
            self.advance()
        } else {
            Err(Self::unexpected(token, expected))
        }
    }

    fn expect_integer(&mut self) -> Result<i64, ParseError> {
        let token = self.expect_kind(TokenKind::Integer, "integer")?;
        token
            .text
            .parse()
            .map_err(|_| Self::unexpected(&token, "integer"))
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Parses one statement:
    ///
    /// ```text
    /// statement := assertStmt | nativeVoidCall | conditional | loop | assignment
    /// ```
    pub fn parse_statement(&mut self) -> Result<Node, ParseError> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Keyword if token.text == "Assert" => self.parse_assert(),
            TokenKind::Keyword if token.text == "if" => self.parse_conditional(),
            TokenKind::Keyword if token.text == "for" => self.parse_loop(),
            TokenKind::Name => match builtins::special_function(&token.text) {
                Some(builtin) => self.parse_void_call(builtin),
                None => self.parse_assignment(),
            },
            _ => Err(Self::unexpected(&token, "statement")),
        }
    }

    /// ```text
    /// assignment := name '=' expression ';'
    /// ```
    fn parse_assignment(&mut self) -> Result<Node, ParseError> {
        let start = self.start_position()?;
        let name = self.expect_kind(TokenKind::Name, "name")?.text;
        self.expect("=")?;
        let value = self.parse_expression()?;
        self.expect(";")?;
        let stmt = self.declare_stmt(start);
        Ok(Node::Assignment {
            name,
            value: Box::new(value),
            stmt,
        })
    }

    /// ```text
    /// assertStmt := 'Assert' '(' logicalExpr ')' ';'
    /// ```
    fn parse_assert(&mut self) -> Result<Node, ParseError> {
        let start = self.start_position()?;
        self.expect("Assert")?;
        self.expect("(")?;
        let cond = self.parse_logical_expression()?;
        self.expect(")")?;
        self.expect(";")?;
        let stmt = self.declare_stmt(start);
        Ok(Node::Assertion {
            cond: Box::new(cond),
            stmt,
        })
    }

    /// A statement-level builtin such as `Verify(x)`. The trailing `;` is
    /// optional.
    fn parse_void_call(&mut self, builtin: &'static Builtin) -> Result<Node, ParseError> {
        let start = self.start_position()?;
        let args = self.parse_call(builtin)?;
        if self.peek_is(";")? {
            self.advance()?;
        }
        let stmt = self.declare_stmt(start);
        Ok(Node::NativeCall {
            name: builtin.name.to_string(),
            opcode: builtin.opcode,
            args,
            stmt: Some(stmt),
        })
    }

    /// Parses an if statement:
    ///
    /// ```text
    /// conditional := 'if' '(' logicalExpr ')' block ('else' block)?
    /// ```
    ///
    /// Two spans are recorded: the header from `if` through the closing `)`,
    /// and the whole construct.
    fn parse_conditional(&mut self) -> Result<Node, ParseError> {
        let start = self.start_position()?;
        self.expect("if")?;
        self.expect("(")?;
        let cond = self.parse_logical_expression()?;
        self.expect(")")?;
        let header = self.declare_stmt(start);

        let then_branch = self.parse_block()?;
        // A lexical error after the block belongs to the next statement.
        let has_else = matches!(self.lexer.peek(), Ok(token) if token.is("else"));
        let else_branch = if has_else {
            self.advance()?;
            self.parse_block()?
        } else {
            None
        };
        let whole = self.declare_stmt(start);

        Ok(Node::Conditional {
            cond: Box::new(cond),
            then_branch: then_branch.map(Box::new),
            else_branch: else_branch.map(Box::new),
            header,
            whole,
        })
    }

    /// Parses a bounded loop:
    ///
    /// ```text
    /// loop := 'for' name 'in' '[' integer '..' integer ']' block
    /// ```
    ///
    /// # Errors
    /// - If either bound is not an integer literal.
    fn parse_loop(&mut self) -> Result<Node, ParseError> {
        let start = self.start_position()?;
        self.expect("for")?;
        let var = self.expect_kind(TokenKind::Name, "loop variable")?.text;
        self.expect("in")?;
        self.expect("[")?;
        let first = self.expect_integer()?;
        self.expect("..")?;
        let last = self.expect_integer()?;
        self.expect("]")?;
        let stmt = self.declare_stmt(start);
        let body = self.parse_block()?;
        Ok(Node::BoundedLoop {
            var,
            first,
            last,
            body: body.map(Box::new),
            stmt,
        })
    }

    /// Parses `'{' statement* '}'`.
    ///
    /// Returns `None` for an empty block, the statement itself for a single
    /// statement and a [`Node::Sequence`] otherwise.
    fn parse_block(&mut self) -> Result<Option<Node>, ParseError> {
        self.expect("{")?;
        self.depth += 1;
        let mut stmts = Sequence::new();
        loop {
            let token = self.peek()?;
            if token.is("}") {
                break;
            }
            if token.is_eof() {
                return Err(Self::unexpected(token, "'}'"));
            }
            stmts.append(self.parse_statement()?);
        }
        self.expect("}")?;
        self.depth -= 1;
        Ok(stmts.into_node())
    }

    // ------------------------------------------------------------------
    // Builtin calls
    // ------------------------------------------------------------------

    /// Parses `name '(' args ')'` for a builtin, honouring its arity.
    fn parse_call(&mut self, builtin: &'static Builtin) -> Result<Sequence, ParseError> {
        self.expect_kind(TokenKind::Name, builtin.name)?;
        self.expect("(")?;
        let mut args = Sequence::new();
        match builtin.arity {
            Arity::Fixed(count) => {
                for i in 0..count {
                    if i != 0 {
                        self.expect(",")?;
                    }
                    args.append(self.parse_argument()?);
                }
            }
            Arity::Variable => {
                let mut first = true;
                while !self.peek_is(")")? {
                    if !first {
                        self.expect(",")?;
                    }
                    args.append(self.parse_argument()?);
                    first = false;
                }
            }
        }
        self.expect(")")?;
        Ok(args)
    }

    /// ```text
    /// argument := expression (relOp expression)?
    /// ```
    fn parse_argument(&mut self) -> Result<Node, ParseError> {
        let lhs = self.parse_expression()?;
        match self.peek_binary_operator(&RELATIONAL_OPERATORS)? {
            Some(op) => {
                self.advance()?;
                let rhs = self.parse_expression()?;
                Ok(Node::BinaryOp {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                })
            }
            None => Ok(lhs),
        }
    }

    // ------------------------------------------------------------------
    // Numeric expressions
    // ------------------------------------------------------------------

    /// ```text
    /// expression := term (('+'|'-') term)*
    /// ```
    pub fn parse_expression(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_term()?;
        while let Some(op) = self.peek_binary_operator(&["+", "-"])? {
            self.advance()?;
            let rhs = self.parse_term()?;
            node = Node::BinaryOp {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }
        Ok(node)
    }

    /// ```text
    /// term := factor (('*'|'/'|'%'|'||') factor)*
    /// ```
    fn parse_term(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_factor()?;
        while let Some(op) = self.peek_binary_operator(&["*", "/", "%", "||"])? {
            self.advance()?;
            let rhs = self.parse_factor()?;
            node = Node::BinaryOp {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }
        Ok(node)
    }

    /// Returns the operator if the next token is one of `accepted`.
    fn peek_binary_operator(
        &mut self,
        accepted: &[&str],
    ) -> Result<Option<BinaryOperator>, ParseError> {
        let token = self.peek()?;
        if !matches!(token.kind, TokenKind::Operator | TokenKind::Keyword)
            || !accepted.contains(&token.text.as_str())
        {
            return Ok(None);
        }
        match BinaryOperator::from_symbol(&token.text) {
            Some(op) => Ok(Some(op)),
            None => Err(ParseError::UnsupportedOperator {
                symbol: token.text.clone(),
                pos: token.pos,
            }),
        }
    }

    /// ```text
    /// factor := '(' expression ')' | '-' factor | nativeCall | name | externName | literal
    /// ```
    fn parse_factor(&mut self) -> Result<Node, ParseError> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Operator if token.text == "(" => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(")")?;
                Ok(expr)
            }
            TokenKind::Operator if token.text == "-" => {
                self.advance()?;
                let operand = self.parse_factor()?;
                Ok(Node::UnaryOp {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Name => match builtins::native_function(&token.text) {
                Some(builtin) => {
                    let args = self.parse_call(builtin)?;
                    Ok(Node::NativeCall {
                        name: builtin.name.to_string(),
                        opcode: builtin.opcode,
                        args,
                        stmt: None,
                    })
                }
                None => {
                    self.advance()?;
                    Ok(Node::VariableRead {
                        name: token.text,
                        external: false,
                        pos: token.pos,
                    })
                }
            },
            TokenKind::ExternName => {
                self.advance()?;
                Ok(Node::VariableRead {
                    name: token.text,
                    external: true,
                    pos: token.pos,
                })
            }
            TokenKind::Integer => {
                let value = self.expect_integer()?;
                Ok(Node::integer(value))
            }
            TokenKind::Hex => {
                self.advance()?;
                Ok(Node::Constant(Constant::Hex(hex_bytes(&token.text))))
            }
            TokenKind::Keyword if token.text == "true" || token.text == "false" => {
                self.advance()?;
                Ok(Node::integer(i64::from(token.text == "true")))
            }
            _ => Err(Self::unexpected(&token, "expression")),
        }
    }

    // ------------------------------------------------------------------
    // Logical expressions
    // ------------------------------------------------------------------

    /// ```text
    /// logicalExpr := logicalValue (('and'|'or') logicalValue)*
    /// ```
    pub fn parse_logical_expression(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_logical_value()?;
        while let Some(op) = self.peek_binary_operator(&["and", "or"])? {
            self.advance()?;
            let rhs = self.parse_logical_value()?;
            node = Node::BinaryOp {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }
        Ok(node)
    }

    /// ```text
    /// logicalValue := '(' logicalExpr ')' | '!' logicalValue | comparison
    /// ```
    fn parse_logical_value(&mut self) -> Result<Node, ParseError> {
        if self.peek_is("(")? {
            self.advance()?;
            let node = self.parse_logical_expression()?;
            self.expect(")")?;
            Ok(node)
        } else if self.peek_is("!")? {
            self.advance()?;
            let operand = self.parse_logical_value()?;
            Ok(Node::UnaryOp {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
            })
        } else {
            self.parse_comparison()
        }
    }

    /// ```text
    /// comparison := expression relOp expression
    /// ```
    ///
    /// # Errors
    /// - If no relational operator follows the left expression.
    fn parse_comparison(&mut self) -> Result<Node, ParseError> {
        let lhs = self.parse_expression()?;
        let op = match self.peek_binary_operator(&RELATIONAL_OPERATORS)? {
            Some(op) => op,
            None => {
                let token = self.peek()?;
                return Err(Self::unexpected(token, "comparison operator"));
            }
        };
        self.advance()?;
        let rhs = self.parse_expression()?;
        Ok(Node::BinaryOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }
}
