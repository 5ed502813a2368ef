//! Tree walking simulator for Betsy.
//!
//! The simulator executes the type checked AST directly: every
//! expression is evaluated on a transient value stack, and variables
//! live in a scoped store parallel to (but separate from) the parser's
//! identifier table. Arithmetic works on the raw 64 bit slot contents,
//! which is exactly what the compiled program does as well.
mod error;
mod scope;

pub use error::*;
pub use scope::*;

use crate::ast::{Ast, Expression, IntrinsicKind, OperationKind, Statement, TypeInfo};

pub struct Simulator {
    ast: Ast,
}

impl Simulator {
    pub fn from_ast(ast: Ast) -> Self {
        Self { ast }
    }

    /// Run the program, writing `print` output to stdout.
    pub fn run(&self) -> SimResult<()> {
        let mut scope = Scope::default();

        for statement in self.ast.nodes() {
            Self::run_statement(statement, &mut scope)?;
        }

        Ok(())
    }

    fn run_statement(statement: &Statement, scope: &mut Scope) -> SimResult<()> {
        let mut outputs = vec![];

        match statement {
            Statement::Expression(expression) => {
                Self::run_expression(expression, &mut outputs, scope)?;
            }
            Statement::If { condition, action } => {
                if Self::run_condition("If", condition, &mut outputs, scope)? != 0 {
                    Self::run_statement(action, scope)?;
                }
            }
            Statement::While { condition, action } => loop {
                if Self::run_condition("While", condition, &mut outputs, scope)? == 0 {
                    break;
                }
                Self::run_statement(action, scope)?;
            },
            Statement::Var {
                identifier,
                assignment,
                ..
            } => {
                if let Some(previous) = scope.find(&identifier.token) {
                    let (file, line, col) = &previous.identifier.position;
                    return Err(SimulationError {
                        message: format!(
                            "Variable '{}' was already defined here: {file}:{line}:{col}.",
                            identifier.token
                        ),
                        position: identifier.position.clone(),
                    });
                }

                let value = Self::run_single_output(
                    "Variable declaration",
                    assignment,
                    &mut outputs,
                    scope,
                )?;
                scope.add(identifier.clone(), Self::store(value));
            }
            Statement::Set {
                identifier,
                assignment,
            } => {
                let value = Self::run_single_output(
                    "Variable assignment",
                    assignment,
                    &mut outputs,
                    scope,
                )?;

                let Some(variable) = scope.find_mut(&identifier.token) else {
                    return Err(SimulationError {
                        message: format!("Undefined variable '{}'.", identifier.token),
                        position: identifier.position.clone(),
                    });
                };
                variable.value = Self::store(value);
            }
            Statement::Block { statements } => {
                let mark = scope.mark();
                for statement in statements {
                    Self::run_statement(statement, scope)?;
                }
                scope.reset(mark);
            }
        }

        Ok(())
    }

    /// Evaluate an `if`/`while` condition down to its single value.
    fn run_condition(
        keyword: &str,
        condition: &Expression,
        outputs: &mut Vec<Value>,
        scope: &Scope,
    ) -> SimResult<u64> {
        Self::run_expression(condition, outputs, scope)?;

        if outputs.len() != 1 {
            return Err(Self::output_count_error(
                format!("{keyword} condition must produce exactly one output."),
                condition,
            ));
        }

        Ok(outputs[0].data)
    }

    /// Evaluate a `var`/`set` right hand side down to its single value.
    fn run_single_output(
        what: &str,
        expression: &Expression,
        outputs: &mut Vec<Value>,
        scope: &Scope,
    ) -> SimResult<Value> {
        Self::run_expression(expression, outputs, scope)?;

        if outputs.len() != 1 {
            return Err(Self::output_count_error(
                format!("{what} must produce exactly one output."),
                expression,
            ));
        }

        Ok(outputs[0])
    }

    fn output_count_error(message: String, expression: &Expression) -> SimulationError {
        let Some(op) = expression.operations.last() else {
            unreachable!("a parsed expression holds at least one operation");
        };

        SimulationError {
            message,
            position: op.position.clone(),
        }
    }

    fn run_expression(
        expression: &Expression,
        outputs: &mut Vec<Value>,
        scope: &Scope,
    ) -> SimResult<()> {
        outputs.clear();

        for op in &expression.operations {
            match op.kind {
                OperationKind::Literal { type_info, value } => {
                    outputs.push(Value {
                        data: value as u64,
                        type_info,
                    });
                }
                OperationKind::Identifier => {
                    let Some(variable) = scope.find(&op.token) else {
                        return Err(SimulationError {
                            message: format!("Unknown identifier '{}'.", op.token),
                            position: op.position.clone(),
                        });
                    };
                    outputs.push(variable.value);
                }
                OperationKind::Intrinsic(intrinsic) => {
                    if outputs.len() < intrinsic.arity_in() {
                        return Err(SimulationError {
                            message: format!(
                                "Not enough values for the '{}' intrinsic.",
                                intrinsic.name()
                            ),
                            position: op.position.clone(),
                        });
                    }

                    match intrinsic {
                        IntrinsicKind::Print => {
                            let value = Self::pop_value(outputs);
                            match value.type_info {
                                TypeInfo::Int => println!("{}", value.data as i32),
                                TypeInfo::Bool => println!("{}", u8::from(value.data != 0)),
                            }
                        }
                        IntrinsicKind::Modulo => {
                            let right = Self::pop_value(outputs);
                            let left = Self::pop_value(outputs);
                            if right.data == 0 {
                                return Err(SimulationError {
                                    message: "Modulo by zero.".to_owned(),
                                    position: op.position.clone(),
                                });
                            }
                            outputs.push(Value {
                                data: left.data % right.data,
                                type_info: TypeInfo::Int,
                            });
                        }
                        _ => {
                            let right = Self::pop_value(outputs);
                            let left = Self::pop_value(outputs);
                            outputs.push(Self::combine(intrinsic, left, right));
                        }
                    }
                }
                OperationKind::Keyword(_) => {
                    unreachable!("keywords never appear inside a parsed expression")
                }
            }
        }

        Ok(())
    }

    fn combine(intrinsic: IntrinsicKind, left: Value, right: Value) -> Value {
        match intrinsic {
            IntrinsicKind::Plus => Value {
                data: left.data.wrapping_add(right.data),
                type_info: TypeInfo::Int,
            },
            IntrinsicKind::Minus => Value {
                data: left.data.wrapping_sub(right.data),
                type_info: TypeInfo::Int,
            },
            IntrinsicKind::GreaterThan => Value {
                data: u64::from(left.data > right.data),
                type_info: TypeInfo::Bool,
            },
            IntrinsicKind::Equal => Value {
                data: u64::from(left.data == right.data),
                type_info: TypeInfo::Bool,
            },
            IntrinsicKind::Or => Value {
                data: u64::from(left.data != 0 || right.data != 0),
                type_info: TypeInfo::Bool,
            },
            IntrinsicKind::Print | IntrinsicKind::Modulo => {
                unreachable!("handled before the operands are combined")
            }
        }
    }

    /// Narrow a value to its variable storage, exactly like the
    /// compiled program does: `int` variables hold 32 bits (reads sign
    /// extend), `bool` variables hold 0 or 1.
    fn store(value: Value) -> Value {
        let data = match value.type_info {
            TypeInfo::Int => value.data as i32 as i64 as u64,
            TypeInfo::Bool => u64::from(value.data != 0),
        };

        Value {
            data,
            type_info: value.type_info,
        }
    }

    fn pop_value(outputs: &mut Vec<Value>) -> Value {
        let Some(value) = outputs.pop() else {
            unreachable!("the stack depth was checked before popping");
        };

        value
    }
}
