use super::{
    IdentifierTable, IntrinsicKind, Operation, OperationKind, ParseError, ParseResult, ParseState,
    TypeInfo,
};

/// A type checked expression: the post-order operation sequence of a
/// prefix sub-program, together with the types it leaves on the value
/// stack.
///
/// Executing `operations` on an empty value stack yields exactly one
/// value per entry of `output_types`, in order.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub operations: Vec<Operation>,
    pub output_types: Vec<TypeInfo>,
}

impl Expression {
    /// Parse one complete prefix expression from the operation stream.
    pub fn parse(
        state: &mut ParseState<Operation>,
        identifiers: &IdentifierTable,
    ) -> ParseResult<Expression> {
        let mut expression = Expression::default();
        expression.parse_operand(state, identifiers)?;

        Ok(expression)
    }

    /// Consume one sub-expression, appending its operations in
    /// post-order and pushing its output types.
    fn parse_operand(
        &mut self,
        state: &mut ParseState<Operation>,
        identifiers: &IdentifierTable,
    ) -> ParseResult<()> {
        let Some(op) = state.next() else {
            let Some(previous) = state.peek_reverse() else {
                unreachable!("expressions are only parsed after at least one operation");
            };
            return Err(ParseError::new(
                "Expected an expression but got nothing.".to_owned(),
                previous.position,
            ));
        };

        match op.kind {
            OperationKind::Literal { type_info, .. } => {
                self.output_types.push(type_info);
                self.operations.push(op);
            }
            OperationKind::Identifier => {
                let Some(identifier) = identifiers.find(&op.token) else {
                    return Err(ParseError::new(
                        format!("Unknown identifier '{}'.", op.token),
                        op.position,
                    ));
                };
                self.output_types.push(identifier.type_info);
                self.operations.push(op);
            }
            OperationKind::Intrinsic(intrinsic) => {
                self.parse_intrinsic(op, intrinsic, state, identifiers)?;
            }
            OperationKind::Keyword(_) => {
                return Err(ParseError::new(
                    format!("Unexpected keyword '{}' in an expression.", op.token),
                    op.position,
                ));
            }
        }

        Ok(())
    }

    /// Fold an intrinsic over its operands: parse `arity_in`
    /// sub-expressions, reconcile the produced output count, and type
    /// check the operand types against the intrinsic's signature.
    fn parse_intrinsic(
        &mut self,
        op: Operation,
        intrinsic: IntrinsicKind,
        state: &mut ParseState<Operation>,
        identifiers: &IdentifierTable,
    ) -> ParseResult<()> {
        let base = self.output_types.len();

        for _ in 0..intrinsic.arity_in() {
            self.parse_operand(state, identifiers)?;
        }

        let provided = self.output_types.len() - base;
        if provided != intrinsic.arity_in() {
            let inputs = if intrinsic.arity_in() == 1 {
                "input"
            } else {
                "inputs"
            };
            return Err(ParseError::new(
                format!(
                    "The '{}' intrinsic takes {} {inputs} but {provided} were provided.",
                    intrinsic.name(),
                    intrinsic.arity_in(),
                ),
                op.position,
            ));
        }

        let result = match intrinsic {
            IntrinsicKind::Print => {
                // every Betsy type is printable; the match keeps this
                // decision explicit should the type set ever grow
                match self.pop_output() {
                    TypeInfo::Int | TypeInfo::Bool => {}
                }
                None
            }
            IntrinsicKind::Plus => {
                self.check_operands(&op, TypeInfo::Int, "add")?;
                Some(TypeInfo::Int)
            }
            IntrinsicKind::Minus => {
                self.check_operands(&op, TypeInfo::Int, "subtract")?;
                Some(TypeInfo::Int)
            }
            IntrinsicKind::Modulo => {
                self.check_operands(&op, TypeInfo::Int, "'modulo' combine")?;
                Some(TypeInfo::Int)
            }
            IntrinsicKind::GreaterThan | IntrinsicKind::Equal => {
                self.check_operands(&op, TypeInfo::Int, "compare")?;
                Some(TypeInfo::Bool)
            }
            IntrinsicKind::Or => {
                self.check_operands(&op, TypeInfo::Bool, "'or' combine")?;
                Some(TypeInfo::Bool)
            }
        };

        self.operations.push(op);
        if let Some(result) = result {
            self.output_types.push(result);
        }

        Ok(())
    }

    /// Pop both operand types of a binary intrinsic and require them to
    /// equal `expected`.
    fn check_operands(
        &mut self,
        op: &Operation,
        expected: TypeInfo,
        verb: &str,
    ) -> ParseResult<()> {
        let right = self.pop_output();
        let left = self.pop_output();

        if left != expected || right != expected {
            return Err(ParseError::new(
                format!("Cannot {verb} values of type '{left}' and '{right}'."),
                op.position.clone(),
            ));
        }

        Ok(())
    }

    fn pop_output(&mut self) -> TypeInfo {
        let Some(type_info) = self.output_types.pop() else {
            unreachable!("operand types are pushed before their operator is folded");
        };

        type_info
    }
}
