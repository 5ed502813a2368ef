//! Compiler for Betsy.
//!
//! This module emits a C program which is observationally equivalent to
//! simulating the same source: the abstract value stack becomes a set
//! of numbered `uint64_t` slot variables, and every statement maps onto
//! its structured C counterpart. You should only feed it the type
//! correct ASTs produced by the parser.
mod error;
mod scope;

pub use error::*;

use std::{fs::File, io::prelude::*, path::Path};

use log::info;

use crate::ast::{Ast, Expression, IntrinsicKind, OperationKind, Statement, TypeInfo};

use self::scope::Scope;

/// Write one indented line into the output, 4 spaces per nesting level.
macro_rules! emit {
    ($output:expr, $indent:expr, $($arg:tt)*) => {{
        write!($output, "{:width$}", "", width = $indent * 4)?;
        writeln!($output, $($arg)*)?;
    }};
}

pub struct Compiler {
    ast: Ast,
}

impl Compiler {
    pub fn from_ast(ast: Ast) -> Self {
        Self { ast }
    }

    /// Compile the program into a C source file at `target`,
    /// overwriting whatever is there.
    pub fn compile_program(&self, target: &Path) -> CompileResult<()> {
        info!("Generating code...");

        let mut output = File::create(target)?;
        self.write_program(&mut output)?;

        Ok(())
    }

    /// Write the emitted program. Even an empty source yields a valid
    /// `main` returning 0.
    pub fn write_program(&self, output: &mut impl Write) -> CompileResult<()> {
        writeln!(output, "#include <stdio.h>")?;
        writeln!(output, "#include <stdint.h>")?;
        writeln!(output, "#include <inttypes.h>")?;
        writeln!(output)?;
        writeln!(output, "int main(int argc, char *argv[])")?;
        writeln!(output, "{{")?;

        let mut max_stack_size = 0;
        let mut identifiers = Scope::default();
        for statement in self.ast.nodes() {
            Self::write_statement(output, 1, statement, &mut max_stack_size, &mut identifiers)?;
        }

        writeln!(output, "    return 0;")?;
        writeln!(output, "}}")?;

        Ok(())
    }

    fn write_statement(
        output: &mut impl Write,
        indent: usize,
        statement: &Statement,
        max_stack_size: &mut usize,
        identifiers: &mut Scope,
    ) -> CompileResult<()> {
        match statement {
            Statement::Expression(expression) => {
                Self::write_expression(output, indent, expression, max_stack_size, identifiers)?;
            }
            Statement::If { condition, action } => {
                Self::write_expression(output, indent, condition, max_stack_size, identifiers)?;
                emit!(output, indent, "if (stack_000 != 0)");
                Self::write_statement(output, indent, action, max_stack_size, identifiers)?;
            }
            Statement::While { condition, action } => {
                let outer_stack_size = *max_stack_size;
                emit!(output, indent, "while (1)");
                emit!(output, indent, "{{");
                Self::write_expression(
                    output,
                    indent + 1,
                    condition,
                    max_stack_size,
                    identifiers,
                )?;
                emit!(output, indent + 1, "if (stack_000 == 0)");
                emit!(output, indent + 2, "break;");
                Self::write_statement(output, indent + 1, action, max_stack_size, identifiers)?;
                emit!(output, indent, "}}");
                // slots first declared inside the loop go out of scope
                // with its braces, so later statements must redeclare
                *max_stack_size = outer_stack_size;
            }
            Statement::Var {
                identifier,
                type_info,
                assignment,
            } => {
                Self::write_expression(output, indent, assignment, max_stack_size, identifiers)?;
                identifiers.add(identifier.clone(), *type_info);
                match type_info {
                    TypeInfo::Int => {
                        emit!(
                            output,
                            indent,
                            "int32_t {} = (int32_t)stack_000;",
                            identifier.token
                        );
                    }
                    TypeInfo::Bool => {
                        emit!(
                            output,
                            indent,
                            "uint8_t {} = (uint8_t)stack_000;",
                            identifier.token
                        );
                    }
                }
            }
            Statement::Set {
                identifier,
                assignment,
            } => {
                Self::write_expression(output, indent, assignment, max_stack_size, identifiers)?;
                let Some(variable) = identifiers.find(&identifier.token) else {
                    return Err(CompileError::Diagnostic {
                        message: format!("Undefined variable '{}'.", identifier.token),
                        position: identifier.position.clone(),
                    });
                };
                match variable.type_info {
                    TypeInfo::Int => {
                        emit!(output, indent, "{} = (int32_t)stack_000;", identifier.token);
                    }
                    TypeInfo::Bool => {
                        emit!(output, indent, "{} = (uint8_t)stack_000;", identifier.token);
                    }
                }
            }
            Statement::Block { statements } => {
                emit!(output, indent, "{{");
                let outer_stack_size = *max_stack_size;
                let mark = identifiers.mark();
                for statement in statements {
                    Self::write_statement(
                        output,
                        indent + 1,
                        statement,
                        max_stack_size,
                        identifiers,
                    )?;
                }
                emit!(output, indent, "}}");
                *max_stack_size = outer_stack_size;
                identifiers.reset(mark);
            }
        }

        Ok(())
    }

    /// Emit an expression as straight line slot assignments. The type
    /// stack mirrors what the simulator's value stack will hold; a slot
    /// variable is declared exactly once, namely on the push that first
    /// reaches its depth.
    fn write_expression(
        output: &mut impl Write,
        indent: usize,
        expression: &Expression,
        max_stack_size: &mut usize,
        identifiers: &Scope,
    ) -> CompileResult<()> {
        let mut type_stack: Vec<TypeInfo> = vec![];

        for op in &expression.operations {
            match op.kind {
                OperationKind::Literal { type_info, value } => {
                    let declaration = Self::declaration(&type_stack, *max_stack_size);
                    emit!(
                        output,
                        indent,
                        "{declaration}stack_{:03} = {};",
                        type_stack.len(),
                        value as i32
                    );
                    type_stack.push(type_info);
                }
                OperationKind::Identifier => {
                    // a variable is visible to the parser while its own
                    // initializer is parsed, but it only joins this
                    // scope after the initializer has been emitted
                    let Some(variable) = identifiers.find(&op.token) else {
                        return Err(CompileError::Diagnostic {
                            message: format!("Unknown identifier '{}'.", op.token),
                            position: op.position.clone(),
                        });
                    };
                    let declaration = Self::declaration(&type_stack, *max_stack_size);
                    emit!(
                        output,
                        indent,
                        "{declaration}stack_{:03} = {};",
                        type_stack.len(),
                        op.token
                    );
                    type_stack.push(variable.type_info);
                }
                OperationKind::Intrinsic(intrinsic) => {
                    Self::write_intrinsic(output, indent, intrinsic, &mut type_stack)?;
                }
                OperationKind::Keyword(_) => {
                    unreachable!("keywords never appear inside a parsed expression")
                }
            }

            if type_stack.len() > *max_stack_size {
                *max_stack_size = type_stack.len();
            }
        }

        Ok(())
    }

    fn write_intrinsic(
        output: &mut impl Write,
        indent: usize,
        intrinsic: IntrinsicKind,
        type_stack: &mut Vec<TypeInfo>,
    ) -> CompileResult<()> {
        if let IntrinsicKind::Print = intrinsic {
            match Self::pop_type(type_stack) {
                TypeInfo::Int => {
                    emit!(
                        output,
                        indent,
                        "printf(\"%d\\n\", (int32_t)stack_{:03});",
                        type_stack.len()
                    );
                }
                TypeInfo::Bool => {
                    emit!(
                        output,
                        indent,
                        "printf(\"%d\\n\", (int32_t)(stack_{:03} != 0));",
                        type_stack.len()
                    );
                }
            }

            return Ok(());
        }

        let (operator, result) = match intrinsic {
            IntrinsicKind::Plus => ("+", TypeInfo::Int),
            IntrinsicKind::Minus => ("-", TypeInfo::Int),
            IntrinsicKind::Modulo => ("%", TypeInfo::Int),
            IntrinsicKind::GreaterThan => (">", TypeInfo::Bool),
            IntrinsicKind::Equal => ("==", TypeInfo::Bool),
            IntrinsicKind::Or => ("||", TypeInfo::Bool),
            IntrinsicKind::Print => unreachable!("handled above"),
        };

        Self::pop_type(type_stack);
        Self::pop_type(type_stack);
        type_stack.push(result);

        // the left slot is overwritten with the result in place
        emit!(
            output,
            indent,
            "stack_{left:03} = stack_{left:03} {operator} stack_{right:03};",
            left = type_stack.len() - 1,
            right = type_stack.len()
        );

        Ok(())
    }

    fn declaration(type_stack: &[TypeInfo], max_stack_size: usize) -> &'static str {
        if type_stack.len() == max_stack_size {
            "uint64_t "
        } else {
            ""
        }
    }

    fn pop_type(type_stack: &mut Vec<TypeInfo>) -> TypeInfo {
        let Some(type_info) = type_stack.pop() else {
            unreachable!("the parser already balanced the expression");
        };

        type_info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Operation;
    use crate::lexer::Lexer;

    fn compile(input: &str) -> String {
        let tokens = Lexer::new(input, "test").lex();
        let ast = Ast::from_operations(tokens.into_iter().map(Operation::from).collect())
            .expect("test programs are expected to parse");

        let mut output = vec![];
        Compiler::from_ast(ast)
            .write_program(&mut output)
            .expect("writing into a vector cannot fail");

        String::from_utf8(output).expect("the emitted program is ASCII")
    }

    #[test]
    fn test_compile_empty_program() {
        assert_eq!(
            compile(""),
            "#include <stdio.h>\n\
             #include <stdint.h>\n\
             #include <inttypes.h>\n\
             \n\
             int main(int argc, char *argv[])\n\
             {\n\
            \x20   return 0;\n\
             }\n"
        );
    }

    #[test]
    fn test_compile_print_expression() {
        assert_eq!(
            compile("print + 34 35"),
            "#include <stdio.h>\n\
             #include <stdint.h>\n\
             #include <inttypes.h>\n\
             \n\
             int main(int argc, char *argv[])\n\
             {\n\
            \x20   uint64_t stack_000 = 34;\n\
            \x20   uint64_t stack_001 = 35;\n\
            \x20   stack_000 = stack_000 + stack_001;\n\
            \x20   printf(\"%d\\n\", (int32_t)stack_000);\n\
            \x20   return 0;\n\
             }\n"
        );
    }

    #[test]
    fn test_self_reference_is_caught_when_compiling() {
        // parses fine, but 'x' only joins the compiler's scope after
        // its initializer has been emitted
        let tokens = Lexer::new("var x int x", "test").lex();
        let ast =
            Ast::from_operations(tokens.into_iter().map(Operation::from).collect()).unwrap();

        let mut output = vec![];
        let error = Compiler::from_ast(ast)
            .write_program(&mut output)
            .unwrap_err();

        assert_eq!(error.to_string(), "test:1:11 ERROR: Unknown identifier 'x'.");
    }

    #[test]
    fn test_compile_declares_each_slot_once() {
        let emitted = compile("print + 1 2\nprint + 3 4");

        assert_eq!(emitted.matches("uint64_t stack_000").count(), 1);
        assert_eq!(emitted.matches("uint64_t stack_001").count(), 1);
    }

    #[test]
    fn test_compile_var_and_set() {
        let emitted = compile("var x int 10\nset x + x 1");

        assert!(emitted.contains("int32_t x = (int32_t)stack_000;"));
        assert!(emitted.contains("stack_001 = x;") || emitted.contains("stack_000 = x;"));
        assert!(emitted.contains("x = (int32_t)stack_000;"));
    }

    #[test]
    fn test_compile_bool_var() {
        let emitted = compile("var b bool > 2 1\nprint b");

        assert!(emitted.contains("uint8_t b = (uint8_t)stack_000;"));
        assert!(emitted.contains("printf(\"%d\\n\", (int32_t)(stack_000 != 0));"));
    }

    #[test]
    fn test_compile_if_statement() {
        let emitted = compile("if > 5 3 do print 1 end");

        assert!(emitted.contains(
            "    stack_000 = stack_000 > stack_001;\n\
            \x20   if (stack_000 != 0)\n\
            \x20   {\n\
            \x20       stack_000 = 1;\n\
            \x20       printf(\"%d\\n\", (int32_t)stack_000);\n\
            \x20   }\n"
        ));
    }

    #[test]
    fn test_compile_while_statement() {
        let emitted = compile("var i int 0\nwhile > 10 i do set i + i 1 end");

        assert!(emitted.contains(
            "    while (1)\n\
            \x20   {\n\
            \x20       stack_000 = 10;\n\
            \x20       uint64_t stack_001 = i;\n\
            \x20       stack_000 = stack_000 > stack_001;\n\
            \x20       if (stack_000 == 0)\n\
            \x20           break;\n"
        ));
    }

    #[test]
    fn test_slots_are_redeclared_after_a_loop() {
        // stack_001 is first declared inside the while braces and goes
        // out of scope with them, so the final print must declare it
        // again at the top level
        let emitted = compile("var i int 0\nwhile > 1 i do set i + i 1 end\nprint + 1 2");

        // once inside the loop, once after it
        assert_eq!(emitted.matches("uint64_t stack_001").count(), 2);

        let after_loop = emitted.rsplit("    }\n").next().unwrap_or_default();
        assert!(after_loop.contains("uint64_t stack_001 = 2;"));
    }

    #[test]
    fn test_block_restores_slot_declarations() {
        let emitted = compile("do print + 1 2 end\nprint + 3 4");

        let Some(after_block) = emitted.split("    }\n").nth(1) else {
            panic!("expected output after the block");
        };
        assert!(after_block.contains("uint64_t stack_000 = 3;"));
        assert!(after_block.contains("uint64_t stack_001 = 4;"));
    }
}
