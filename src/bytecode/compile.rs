use crate::{
    bytecode::{
        Opcode, disasm,
        compile_error::{CompileError, CompileFailure, Diagnostic},
        ir::CompiledScript,
        op::OpcodeNames,
        pipeline::InstructionPipeline,
        stack_check::{self, StackHeights, StackKind},
        symbols::SymbolTable,
    },
    config::{CompilerOptions, VerifyFlags},
    frontend::parser::Parser,
    lang::{
        node::{Constant, Node, TOP_OF_STACK, loop_values},
        span::StmtId,
    },
    runtime::{EnvExterns, Evaluation, ExecutionStacks, ExternValues, ScriptEvaluator, ScriptVm},
};

/// Per-compilation state. Rebuilt from scratch at the start of every
/// compile, so nothing leaks from one unit into the next.
#[derive(Debug, Default)]
struct CompileState {
    symbols: SymbolTable,
    pipe: InstructionPipeline,

    /// Stream length and stack heights at checked statement boundaries
    checkpoints: Vec<(usize, StackHeights)>,

    /// The stack check met an instruction it cannot follow
    unchecked: bool,
}

impl CompileState {
    fn new(options: CompilerOptions) -> Self {
        CompileState {
            symbols: SymbolTable::new(),
            pipe: InstructionPipeline::new(options.optimizer_enabled()),
            checkpoints: Vec::new(),
            unchecked: false,
        }
    }
}

/// Compiles Hello source into an instruction stream, and optionally runs
/// the result through a [`ScriptEvaluator`].
pub struct Compiler {
    options: CompilerOptions,
    flags: VerifyFlags,

    /// Where `$name` values come from
    externs: Box<dyn ExternValues>,

    evaluator: Box<dyn ScriptEvaluator>,
    names: OpcodeNames,
    state: CompileState,

    /// Stacks left behind by the last run
    stacks: ExecutionStacks,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            options: CompilerOptions::default(),
            flags: VerifyFlags::default(),
            externs: Box::new(EnvExterns),
            evaluator: Box::new(ScriptVm::new()),
            names: OpcodeNames::new(),
            state: CompileState::default(),
            stacks: ExecutionStacks::new(),
        }
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_externs(mut self, externs: impl ExternValues + 'static) -> Self {
        self.externs = Box::new(externs);
        self
    }

    pub fn with_evaluator(mut self, evaluator: impl ScriptEvaluator + 'static) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    pub fn with_verify_flags(mut self, flags: VerifyFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn set_options(&mut self, options: CompilerOptions) {
        self.options = options;
    }

    pub fn options(&self) -> CompilerOptions {
        self.options
    }

    /// Symbol table of the last compilation.
    pub fn symbols(&self) -> &SymbolTable {
        &self.state.symbols
    }

    /// Stacks left by the last run.
    pub fn stacks(&self) -> &ExecutionStacks {
        &self.stacks
    }

    pub fn opcode_names(&self) -> &OpcodeNames {
        &self.names
    }

    /// Forget the symbol table, pending output and execution stacks.
    pub fn reset(&mut self) {
        self.state = CompileState::new(self.options);
        self.stacks.clear();
    }

    /// Compile a whole program.
    ///
    /// Statements are parsed and generated one at a time. After the first
    /// error no more code is generated, but parsing carries on from the next
    /// statement boundary so that later syntax errors are reported too.
    pub fn compile(&mut self, source: &str) -> Result<CompiledScript, CompileFailure> {
        self.reset();
        let mut parser = Parser::new(source);
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let mut index = 0usize;

        while !parser.at_end() {
            let node = match parser.parse_statement() {
                Ok(node) => node,
                Err(err) => {
                    tracing::debug!(line = err.line(), error = %err, "parse error");
                    diagnostics.push(Diagnostic::from(&err));
                    parser.synchronize();
                    continue;
                }
            };
            if !diagnostics.is_empty() {
                continue;
            }

            let before = self.state.pipe.len();
            if let Err(err) = self.generate(&node) {
                diagnostics.push(Diagnostic::from(&err));
                continue;
            }

            let lines = node
                .stmt()
                .and_then(|id| parser.stmts().get(id))
                .map(|stmt| (stmt.start.line, stmt.end.line));
            tracing::debug!(
                statement = index,
                ?lines,
                emitted = self.state.pipe.len() as i64 - before as i64,
                variables = self.state.symbols.len(),
                "compiled statement"
            );
            self.check_alt_stack();
            index += 1;
        }

        if !diagnostics.is_empty() {
            return Err(CompileFailure { diagnostics });
        }

        let stmts = parser.into_stmts();
        let pipe = std::mem::take(&mut self.state.pipe);
        tracing::debug!(
            instructions = pipe.len(),
            elided = pipe.elided(),
            variables = self.state.symbols.len(),
            "compilation finished"
        );
        let instructions = pipe.into_instructions();
        let annotated = self
            .options
            .annotate()
            .then(|| disasm::annotate(&instructions, &stmts, source, &self.names));

        Ok(CompiledScript {
            instructions,
            stmts,
            options: self.options,
            annotated,
        })
    }

    /// Evaluate a compiled script on fresh stacks.
    pub fn run(&mut self, script: &CompiledScript) -> Evaluation {
        self.stacks.clear();
        match self
            .evaluator
            .evaluate(&script.instructions, self.flags, &mut self.stacks)
        {
            Ok(()) => Evaluation::succeeded(),
            Err(err) => Evaluation::failed(format!("Script evaluation failed: {}", err)),
        }
    }

    /// Compile and immediately evaluate.
    pub fn execute(&mut self, source: &str) -> Evaluation {
        match self.compile(source) {
            Ok(script) => self.run(&script),
            Err(failure) => Evaluation::failed(failure.to_string()),
        }
    }

    // =========================================================================
    // Code generation
    // =========================================================================

    fn generate(&mut self, node: &Node) -> Result<(), CompileError> {
        match node {
            Node::Constant(Constant::Integer(value)) => self.state.pipe.push_int(*value),
            Node::Constant(Constant::Hex(bytes)) => self.state.pipe.push_data(bytes.clone()),

            Node::VariableRead {
                name,
                external,
                pos,
            } => {
                if *external {
                    let value = self.extern_value(name);
                    self.state.pipe.push_data(value);
                } else if name == TOP_OF_STACK {
                    self.state.pipe.push_op(Opcode::Dup);
                } else {
                    let CompileState { symbols, pipe, .. } = &mut self.state;
                    symbols.copy_to_top_of_stack(name, pos.line, pipe)?;
                }
            }

            Node::Assignment { name, value, stmt } => {
                self.state.pipe.declare_stmt(*stmt);
                self.generate(value)?;
                if name != TOP_OF_STACK {
                    let CompileState { symbols, pipe, .. } = &mut self.state;
                    symbols.assign_from_top_of_stack(name, pipe);
                }
            }

            Node::BinaryOp { op, lhs, rhs } => {
                self.generate(lhs)?;
                self.generate(rhs)?;
                self.state.pipe.push_op(op.opcode());
            }

            Node::UnaryOp { op, operand } => {
                self.generate(operand)?;
                self.state.pipe.push_op(op.opcode());
            }

            Node::Conditional {
                cond,
                then_branch,
                else_branch,
                header,
                ..
            } => self.generate_conditional(
                cond,
                then_branch.as_deref(),
                else_branch.as_deref(),
                *header,
            )?,

            Node::BoundedLoop {
                var,
                first,
                last,
                body,
                stmt,
            } => {
                for value in loop_values(*first, *last) {
                    self.state.pipe.declare_stmt(*stmt);
                    if var == TOP_OF_STACK {
                        self.state.pipe.push_int(value);
                    } else {
                        let CompileState { symbols, pipe, .. } = &mut self.state;
                        symbols.assign_value_to_variable(var, value, pipe);
                    }
                    if let Some(body) = body {
                        self.generate(body)?;
                    }
                }
            }

            Node::Sequence(seq) => {
                for node in seq.iter() {
                    self.generate(node)?;
                }
            }

            Node::NativeCall {
                opcode, args, stmt, ..
            } => {
                if let Some(stmt) = stmt {
                    self.state.pipe.declare_stmt(*stmt);
                }
                // RETURN goes first: it ends the script, the arguments are only data after it
                if *opcode == Opcode::Return {
                    self.state.pipe.push_op(Opcode::Return);
                    for arg in args.iter() {
                        self.generate(arg)?;
                    }
                } else {
                    for arg in args.iter() {
                        self.generate(arg)?;
                    }
                    self.state.pipe.push_op(*opcode);
                }
            }

            Node::Assertion { cond, stmt } => {
                if self.options.asserts_enabled() {
                    self.state.pipe.declare_stmt(*stmt);
                    self.generate(cond)?;
                    // NOP4 is rejected under DISCOURAGE_UPGRADABLE_NOPS
                    self.state.pipe.push_op(Opcode::NotIf);
                    self.state.pipe.push_op(Opcode::Nop4);
                    self.state.pipe.push_op(Opcode::EndIf);
                }
            }
        }
        Ok(())
    }

    /// `IF .. ELSE .. ENDIF` with both paths leaving the same variables on
    /// the alt-stack.
    ///
    /// A variable first assigned in only one branch is set to 0 on the other
    /// path. New variables of the then-branch get their slots first, then
    /// those only the else-branch assigns.
    fn generate_conditional(
        &mut self,
        cond: &Node,
        then_branch: Option<&Node>,
        else_branch: Option<&Node>,
        header: StmtId,
    ) -> Result<(), CompileError> {
        self.state.pipe.declare_stmt(header);
        self.generate(cond)?;
        self.state.pipe.push_op(Opcode::If);

        let before = self.state.symbols.len();
        let then_new = self.new_names(then_branch);
        let else_new = self.new_names(else_branch);
        let else_only: Vec<String> = else_new
            .iter()
            .filter(|name| !then_new.contains(name))
            .cloned()
            .collect();

        if let Some(branch) = then_branch {
            self.generate(branch)?;
        }
        self.state.pipe.declare_stmt(header);
        self.declare_defaults(&else_only);

        if else_branch.is_some() || self.state.symbols.len() > before {
            self.state.pipe.push_op(Opcode::Else);
            let merged = self.state.symbols.clone();
            self.state.symbols.truncate(before);

            if !else_new.starts_with(&then_new) {
                self.declare_defaults(&then_new);
            }
            if let Some(branch) = else_branch {
                self.generate(branch)?;
            }
            self.state.pipe.declare_stmt(header);
            debug_assert_eq!(
                self.state.symbols, merged,
                "branches of a conditional disagree on variable slots"
            );
        }
        self.state.pipe.push_op(Opcode::EndIf);
        Ok(())
    }

    /// Names `branch` assigns that do not have a slot yet.
    fn new_names(&self, branch: Option<&Node>) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(branch) = branch {
            branch.assigned_names(&mut names);
        }
        names.retain(|name| !self.state.symbols.contains(name));
        names
    }

    fn declare_defaults(&mut self, names: &[String]) {
        let CompileState { symbols, pipe, .. } = &mut self.state;
        for name in names {
            if !symbols.contains(name) {
                symbols.assign_value_to_variable(name, 0, pipe);
            }
        }
    }

    fn extern_value(&self, name: &str) -> Vec<u8> {
        match self.externs.get(name) {
            Some(value) => value,
            None => {
                tracing::warn!(name, "external value not set, using the default");
                self.externs.default_value()
            }
        }
    }

    /// Between statements the alt-stack holds one value per variable.
    ///
    /// Only checked in debug builds. Each check resumes from the last
    /// boundary whose instructions the optimizer has not touched since; a
    /// transfer pair cancelled across a boundary drops that checkpoint.
    /// Primary-stack underflow is the program's own business and is not
    /// checked here.
    fn check_alt_stack(&mut self) {
        if !cfg!(debug_assertions) || self.state.unchecked {
            return;
        }
        let CompileState {
            symbols,
            pipe,
            checkpoints,
            unchecked,
        } = &mut self.state;

        let untouched = pipe.take_low_water();
        while checkpoints.last().is_some_and(|(len, _)| *len > untouched) {
            checkpoints.pop();
        }
        let (start, initial) = checkpoints
            .last()
            .copied()
            .unwrap_or((0, StackHeights::default()));

        match stack_check::check_with_initial(&pipe.instructions()[start..], initial) {
            Ok(Some(heights)) => {
                assert_eq!(
                    heights.alt as usize,
                    symbols.len(),
                    "alt-stack height out of step with the symbol table"
                );
                checkpoints.push((pipe.len(), heights));
            }
            Err(mut err) if err.stack == StackKind::Alt => {
                err.ip += start;
                panic!("{}", err);
            }
            // nothing after RETURN or a dynamic stack effect can be followed
            Ok(None) | Err(_) => *unchecked = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::disasm::render_instruction;
    use crate::bytecode::ir::InstructionKind;
    use std::collections::HashMap;

    fn compiler(options: CompilerOptions) -> Compiler {
        Compiler::new()
            .with_options(options)
            .with_externs(HashMap::<String, Vec<u8>>::new())
    }

    fn rendered(compiler: &Compiler, script: &CompiledScript) -> Vec<String> {
        script
            .instructions
            .iter()
            .map(|i| render_instruction(i, compiler.opcode_names()))
            .collect()
    }

    const EXAMPLE: &str = "x = 1 + 2;\nif (x == 3) { y = 10; } else { y = 20; }";

    // =========================================================================
    // Instruction shape
    // =========================================================================

    #[test]
    fn test_example_unoptimized() {
        let mut c = compiler(CompilerOptions::empty());
        let script = c.compile(EXAMPLE).unwrap();
        assert_eq!(
            rendered(&c, &script),
            vec![
                "L1 0x01",
                "L1 0x02",
                "OP_ADD",
                "OP_TOALTSTACK",
                "OP_FROMALTSTACK",
                "OP_DUP",
                "OP_TOALTSTACK",
                "L1 0x03",
                "OP_EQUAL",
                "OP_IF",
                "L1 0x0a",
                "OP_TOALTSTACK",
                "OP_ELSE",
                "L1 0x14",
                "OP_TOALTSTACK",
                "OP_ENDIF",
            ]
        );
        assert_eq!(c.symbols().names(), ["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_example_optimized_drops_one_pair() {
        let mut plain = compiler(CompilerOptions::empty());
        let unoptimized = plain.compile(EXAMPLE).unwrap();

        let mut c = compiler(CompilerOptions::OPTIMIZER_ENABLED);
        let optimized = c.compile(EXAMPLE).unwrap();

        assert_eq!(optimized.len() + 2, unoptimized.len());
        assert_eq!(
            rendered(&c, &optimized)[..5],
            ["L1 0x01", "L1 0x02", "OP_ADD", "OP_DUP", "OP_TOALTSTACK"]
        );
    }

    #[test]
    fn test_example_evaluates() {
        for options in [CompilerOptions::empty(), CompilerOptions::OPTIMIZER_ENABLED] {
            let mut c = compiler(options);
            let result = c.execute(EXAMPLE);
            assert!(result.success, "{}", result.description);
            assert_eq!(result.description, "No error");
            assert!(c.stacks().main.is_empty());
            assert_eq!(c.stacks().alt, vec![vec![3], vec![10]]);
        }
    }

    #[test]
    fn test_zero_literal_is_op0() {
        let mut c = compiler(CompilerOptions::empty());
        let script = c.compile("x = 0;").unwrap();
        assert!(script.instructions[0].is(Opcode::Op0));
        assert_eq!(script.len(), 2);
    }

    #[test]
    fn test_hex_literal_is_raw_data() {
        let mut c = compiler(CompilerOptions::empty());
        let script = c.compile("h = 0x00ff;").unwrap();
        assert_eq!(rendered(&c, &script), vec!["L2 0x00ff", "OP_TOALTSTACK"]);
    }

    #[test]
    fn test_tos_assignment_leaves_value() {
        let mut c = compiler(CompilerOptions::empty());
        let script = c.compile("tos = 5;\nVerify(tos == 5);").unwrap();
        assert_eq!(
            rendered(&c, &script),
            vec!["L1 0x05", "OP_DUP", "L1 0x05", "OP_EQUAL", "OP_VERIFY"]
        );
        assert!(c.symbols().is_empty());

        let result = c.run(&script);
        assert!(result.success, "{}", result.description);
        assert_eq!(c.stacks().main, vec![vec![5]]);
    }

    #[test]
    fn test_return_emitted_before_arguments() {
        let mut c = compiler(CompilerOptions::empty());
        let script = c.compile("Return(1);").unwrap();
        assert_eq!(rendered(&c, &script), vec!["OP_RETURN", "L1 0x01"]);

        let result = c.run(&script);
        assert!(!result.success);
        assert!(result.description.starts_with("Script evaluation failed"));
    }

    #[test]
    fn test_extern_values() {
        let mut values = HashMap::new();
        values.insert("KEY".to_string(), vec![0xab, 0xcd]);
        let mut c = Compiler::new().with_externs(values);

        let script = c.compile("k = $KEY;\nm = $MISSING;").unwrap();
        assert_eq!(
            rendered(&c, &script),
            vec!["L2 0xabcd", "OP_TOALTSTACK", "L1 0x00", "OP_TOALTSTACK"]
        );
        assert!(script.instructions[2].is(Opcode::Op0));
    }

    // =========================================================================
    // Loops
    // =========================================================================

    #[test]
    fn test_loop_accumulates() {
        let mut c = compiler(CompilerOptions::OPTIMIZER_ENABLED);
        let result = c.execute("s = 0;\nfor i in [1..4] { s = s + i; }");
        assert!(result.success, "{}", result.description);
        assert_eq!(c.stacks().alt, vec![vec![10], vec![4]]);
    }

    #[test]
    fn test_loop_descending() {
        let mut c = compiler(CompilerOptions::empty());
        let result = c.execute("for i in [3..1] { x = i; }");
        assert!(result.success, "{}", result.description);
        assert_eq!(c.stacks().alt, vec![vec![1], vec![1]]);
    }

    #[test]
    fn test_loop_binds_its_own_variable() {
        let mut c = compiler(CompilerOptions::empty());
        c.compile("for k in [2..2] { }").unwrap();
        assert_eq!(c.symbols().names(), ["k".to_string()]);
    }

    #[test]
    fn test_loop_unrolls_body() {
        let mut c = compiler(CompilerOptions::empty());
        let once = c.compile("for i in [1..1] { x = 7; }").unwrap();
        let thrice = c.compile("for i in [1..3] { x = 7; }").unwrap();
        assert_eq!(once.count(Opcode::Roll), 0);
        // x = 7 is pushed once per iteration
        let sevens = thrice
            .instructions
            .iter()
            .filter(|i| matches!(&i.kind, InstructionKind::Data(d) if d == &vec![7]))
            .count();
        assert_eq!(sevens, 3);
    }

    // =========================================================================
    // Conditionals
    // =========================================================================

    #[test]
    fn test_then_only_variable_gets_default_on_else_path() {
        let mut c = compiler(CompilerOptions::empty());
        let script = c.compile("c = 0;\nif (c == 1) { a = 5; }").unwrap();
        assert_eq!(script.count(Opcode::Else), 1);
        assert_eq!(c.symbols().names(), ["c".to_string(), "a".to_string()]);

        let result = c.run(&script);
        assert!(result.success, "{}", result.description);
        assert_eq!(c.stacks().alt, vec![Vec::<u8>::new(), Vec::new()]);

        let result = c.execute("c = 1;\nif (c == 1) { a = 5; }\nb = a + 1;");
        assert!(result.success, "{}", result.description);
        assert_eq!(c.stacks().alt, vec![vec![1], vec![5], vec![6]]);
    }

    #[test]
    fn test_no_else_without_new_variables() {
        let mut c = compiler(CompilerOptions::empty());
        let script = c.compile("a = 1;\nif (a == 1) { a = 2; }").unwrap();
        assert_eq!(script.count(Opcode::Else), 0);
        assert_eq!(script.count(Opcode::EndIf), 1);
    }

    #[test]
    fn test_else_only_variable() {
        let mut c = compiler(CompilerOptions::empty());
        let result = c.execute("c = 0;\nif (c == 1) { } else { b = 7; }");
        assert!(result.success, "{}", result.description);
        assert_eq!(c.stacks().alt, vec![Vec::new(), vec![7]]);
    }

    #[test]
    fn test_branches_assign_in_different_order() {
        let source = "c = 0;\nif (c == 1) { a = 1; b = 2; } else { b = 3; a = 4; }";
        let mut c = compiler(CompilerOptions::empty());
        let result = c.execute(source);
        assert!(result.success, "{}", result.description);
        assert_eq!(c.stacks().alt, vec![Vec::new(), vec![4], vec![3]]);
        assert_eq!(
            c.symbols().names(),
            ["c".to_string(), "a".to_string(), "b".to_string()]
        );
    }

    // =========================================================================
    // Assertions
    // =========================================================================

    #[test]
    fn test_assertions_gated_by_option() {
        let source = "x = 1;\nAssert(x == 1);";

        let mut off = compiler(CompilerOptions::empty());
        let script = off.compile(source).unwrap();
        assert_eq!(script.count(Opcode::Nop4), 0);
        assert_eq!(script.count(Opcode::NotIf), 0);

        let mut on = compiler(CompilerOptions::ASSERTS_ENABLED);
        let script = on.compile(source).unwrap();
        assert_eq!(script.count(Opcode::NotIf), 1);
        assert_eq!(script.count(Opcode::Nop4), 1);
        assert!(on.run(&script).success);
    }

    #[test]
    fn test_failed_assertion_fails_evaluation() {
        let mut c = compiler(CompilerOptions::ASSERTS_ENABLED);
        let result = c.execute("x = 2;\nAssert(x == 1);");
        assert!(!result.success);
        assert!(result.description.starts_with("Script evaluation failed: "));
    }

    #[test]
    fn test_failed_assertion_allowed_without_nop_policy() {
        let mut c = compiler(CompilerOptions::ASSERTS_ENABLED)
            .with_verify_flags(VerifyFlags::empty());
        let result = c.execute("x = 2;\nAssert(x == 1);");
        assert!(result.success, "{}", result.description);
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn test_uninitialized_variable() {
        let mut c = compiler(CompilerOptions::empty());
        let failure = c.compile("a = 1;\ny = x + 1;").unwrap_err();
        assert_eq!(failure.diagnostics.len(), 1);
        assert_eq!(failure.first_line(), Some(2));
        assert!(
            failure
                .to_string()
                .contains("Uninitialized variable: 'x'")
        );
        assert!(!c.symbols().contains("x"));
    }

    #[test]
    fn test_parse_error_line() {
        let source = "a = 1;\nb = 2;\nc = 3;\nd = 4;\ne = = 5;";
        let mut c = compiler(CompilerOptions::empty());
        let failure = c.compile(source).unwrap_err();
        assert_eq!(failure.first_line(), Some(5));
        assert!(failure.to_string().starts_with("Parsing error. "));
    }

    #[test]
    fn test_later_parse_errors_still_reported() {
        let source = "a = ;\nb = 2;\nc = 3 +;\nd = 4;";
        let mut c = compiler(CompilerOptions::empty());
        let failure = c.compile(source).unwrap_err();
        assert_eq!(failure.lines(), vec![1, 3]);
    }

    #[test]
    fn test_execute_reports_compile_failure() {
        let mut c = compiler(CompilerOptions::empty());
        let result = c.execute("y = x;");
        assert!(!result.success);
        assert!(result.description.contains("Uninitialized variable"));
    }

    // =========================================================================
    // State handling
    // =========================================================================

    #[test]
    fn test_compile_starts_from_clean_state() {
        let mut c = compiler(CompilerOptions::empty());
        c.compile("a = 1;\nb = 2;").unwrap();
        let script = c.compile("z = 3;").unwrap();
        assert_eq!(c.symbols().names(), ["z".to_string()]);
        assert_eq!(script.len(), 2);
        assert_eq!(script.stmts.len(), 1);
    }

    #[test]
    fn test_reset_clears_stacks() {
        let mut c = compiler(CompilerOptions::empty());
        assert!(c.execute("a = 1;").success);
        assert!(!c.stacks().is_empty());
        c.reset();
        assert!(c.stacks().is_empty());
        assert!(c.symbols().is_empty());
    }

    #[test]
    fn test_annotated_output_requested() {
        let mut c = compiler(CompilerOptions::OUTPUT_ANNOTATED_SCRIPT);
        let script = c.compile("x = 1;").unwrap();
        let text = script.annotated.as_deref().unwrap();
        assert!(text.starts_with("### Autogenerated Hello script.\n"));
        assert!(text.contains("### x = 1;\nL1 0x01\nOP_TOALTSTACK\n"));

        let mut plain = compiler(CompilerOptions::empty());
        assert!(plain.compile("x = 1;").unwrap().annotated.is_none());
    }

    #[test]
    fn test_alt_stack_check_resumes_from_checkpoints() {
        if !cfg!(debug_assertions) {
            return;
        }
        let mut plain = compiler(CompilerOptions::empty());
        plain.compile(EXAMPLE).unwrap();
        assert_eq!(
            plain.state.checkpoints,
            vec![(4, StackHeights::new(0, 1)), (16, StackHeights::new(0, 2))]
        );

        // the second statement cancels the first one's final TOALTSTACK
        let mut c = compiler(CompilerOptions::OPTIMIZER_ENABLED);
        c.compile(EXAMPLE).unwrap();
        assert_eq!(c.state.checkpoints, vec![(14, StackHeights::new(0, 2))]);
    }

    #[test]
    fn test_alt_stack_check_stops_after_return() {
        let mut c = compiler(CompilerOptions::empty());
        c.compile("a = 1;\nReturn(a);\nb = 2;").unwrap();
        assert!(c.state.unchecked || !cfg!(debug_assertions));
    }
}
