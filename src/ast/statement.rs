use super::{
    Expression, IdentifierTable, KeywordKind, Operation, OperationKind, ParseError, ParseResult,
    ParseState, TypeInfo,
};

/// A single statement of a Betsy program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// A naked expression; its outputs are discarded.
    Expression(Expression),
    If {
        condition: Expression,
        action: Box<Statement>,
    },
    While {
        condition: Expression,
        action: Box<Statement>,
    },
    Var {
        identifier: Operation,
        type_info: TypeInfo,
        assignment: Expression,
    },
    Set {
        identifier: Operation,
        assignment: Expression,
    },
    Block {
        statements: Vec<Statement>,
    },
}

impl Statement {
    /// Parse a single statement, dispatching on the head operation.
    pub fn parse(
        state: &mut ParseState<Operation>,
        identifiers: &mut IdentifierTable,
    ) -> ParseResult<Statement> {
        let Some(op) = state.peek() else {
            unreachable!("a statement is only requested while operations remain");
        };

        let OperationKind::Keyword(keyword) = op.kind else {
            // naked expression as statement
            return Ok(Statement::Expression(Expression::parse(
                state,
                identifiers,
            )?));
        };

        match keyword {
            KeywordKind::If => {
                state.next();
                let (condition, action) = Self::parse_condition_and_action(&op, state, identifiers)?;
                Ok(Statement::If { condition, action })
            }
            KeywordKind::While => {
                state.next();
                let (condition, action) = Self::parse_condition_and_action(&op, state, identifiers)?;
                Ok(Statement::While { condition, action })
            }
            KeywordKind::Var => {
                state.next();
                Self::parse_var(op, state, identifiers)
            }
            KeywordKind::Set => {
                state.next();
                Self::parse_set(op, state, identifiers)
            }
            KeywordKind::Do => {
                state.next();
                Self::parse_block(op, state, identifiers)
            }
            KeywordKind::End => Err(ParseError::new(
                "Encountered 'end' without a matching 'do'.".to_owned(),
                op.position,
            )),
        }
    }

    /// Shared tail of `if` and `while`: a condition producing exactly
    /// one `bool`, followed by a `do` block.
    fn parse_condition_and_action(
        keyword: &Operation,
        state: &mut ParseState<Operation>,
        identifiers: &mut IdentifierTable,
    ) -> ParseResult<(Expression, Box<Statement>)> {
        let condition = Expression::parse(state, identifiers)?;

        if condition.output_types.len() != 1 {
            return Err(ParseError::new(
                format!(
                    "The '{}' condition must produce exactly one output.",
                    keyword.token
                ),
                keyword.position.clone(),
            ));
        }
        if condition.output_types[0] != TypeInfo::Bool {
            return Err(ParseError::new(
                format!(
                    "The '{}' condition must be of type 'bool' but is of type '{}'.",
                    keyword.token, condition.output_types[0]
                ),
                keyword.position.clone(),
            ));
        }

        let Some(next) = state.peek() else {
            return Err(ParseError::new(
                "Unexpected end of file.".to_owned(),
                keyword.position.clone(),
            ));
        };
        if next.kind != OperationKind::Keyword(KeywordKind::Do) {
            return Err(ParseError::new(
                format!(
                    "Unexpected word '{}' after {} condition. Expected the start of a block.",
                    next.token, keyword.token
                ),
                next.position,
            ));
        }

        let action = Self::parse(state, identifiers)?;

        Ok((condition, Box::new(action)))
    }

    fn parse_var(
        var: Operation,
        state: &mut ParseState<Operation>,
        identifiers: &mut IdentifierTable,
    ) -> ParseResult<Statement> {
        let Some(identifier) = state.next() else {
            return Err(ParseError::new(
                "Unexpected end of file.".to_owned(),
                var.position,
            ));
        };
        if identifier.kind != OperationKind::Identifier {
            return Err(ParseError::new(
                format!("'{}' cannot be used as a variable name.", identifier.token),
                identifier.position,
            ));
        }

        if let Some(previous) = identifiers.find(&identifier.token) {
            return Err(ParseError::new(
                format!("Redefinition of variable '{}'.", identifier.token),
                identifier.position,
            )
            .with_note(
                format!("'{}' was first defined here.", identifier.token),
                previous.operation.position.clone(),
            ));
        }

        let Some(type_op) = state.next() else {
            return Err(ParseError::new(
                "Unexpected end of file.".to_owned(),
                var.position,
            ));
        };
        let Ok(type_info) = type_op.token.parse::<TypeInfo>() else {
            return Err(ParseError::new(
                format!("'{}' is not a valid type declaration.", type_op.token),
                type_op.position,
            ));
        };

        // The identifier is registered before its initializer is
        // parsed; an actual self reference is caught by the simulator.
        identifiers.add(identifier.clone(), type_info);

        let assignment = Expression::parse(state, identifiers)?;
        if assignment.output_types.len() != 1 {
            return Err(ParseError::new(
                "Variable declaration must produce exactly one output.".to_owned(),
                identifier.position,
            ));
        }
        let assigned = assignment.output_types[0];
        if assigned != type_info {
            return Err(ParseError::new(
                format!(
                    "Variable '{}' is of type '{type_info}' but the assignment is of type '{assigned}'.",
                    identifier.token
                ),
                identifier.position,
            ));
        }

        Ok(Statement::Var {
            identifier,
            type_info,
            assignment,
        })
    }

    fn parse_set(
        set: Operation,
        state: &mut ParseState<Operation>,
        identifiers: &mut IdentifierTable,
    ) -> ParseResult<Statement> {
        let Some(identifier) = state.next() else {
            return Err(ParseError::new(
                "Unexpected end of file.".to_owned(),
                set.position,
            ));
        };

        let Some(declared) = identifiers.find(&identifier.token) else {
            return Err(ParseError::new(
                format!("Undefined variable '{}'.", identifier.token),
                identifier.position,
            ));
        };
        let type_info = declared.type_info;

        let assignment = Expression::parse(state, identifiers)?;
        if assignment.output_types.len() != 1 {
            return Err(ParseError::new(
                "Variable assignment must produce exactly one output.".to_owned(),
                identifier.position,
            ));
        }
        let assigned = assignment.output_types[0];
        if assigned != type_info {
            return Err(ParseError::new(
                format!(
                    "Variable '{}' is of type '{type_info}' but the assignment is of type '{assigned}'.",
                    identifier.token
                ),
                identifier.position,
            ));
        }

        Ok(Statement::Set {
            identifier,
            assignment,
        })
    }

    fn parse_block(
        doo: Operation,
        state: &mut ParseState<Operation>,
        identifiers: &mut IdentifierTable,
    ) -> ParseResult<Statement> {
        let mark = identifiers.mark();
        let mut statements = vec![];

        loop {
            let Some(next) = state.peek() else {
                let Some(last) = state.peek_reverse() else {
                    unreachable!("the 'do' itself has been consumed already");
                };
                return Err(ParseError::new(
                    "Missing 'end' for 'do'.".to_owned(),
                    last.position,
                )
                .with_note("The block starts here.".to_owned(), doo.position));
            };

            if next.kind == OperationKind::Keyword(KeywordKind::End) {
                state.next();
                break;
            }

            statements.push(Self::parse(state, identifiers)?);
        }

        identifiers.reset(mark);

        Ok(Statement::Block { statements })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ast;
    use crate::lexer::Lexer;

    fn parse_program(input: &str) -> ParseResult<Ast> {
        let tokens = Lexer::new(input, "test").lex();
        Ast::from_operations(tokens.into_iter().map(Operation::from).collect())
    }

    fn parse_single(input: &str) -> Statement {
        let nodes = parse_program(input).unwrap().nodes().to_vec();
        assert_eq!(nodes.len(), 1, "expected exactly one statement");
        nodes.into_iter().next().unwrap()
    }

    #[test]
    fn test_parse_var_statement() {
        let Statement::Var {
            identifier,
            type_info,
            assignment,
        } = parse_single("var x int 10")
        else {
            panic!("expected a var statement");
        };

        assert_eq!(identifier.token, "x");
        assert_eq!(type_info, TypeInfo::Int);
        assert_eq!(assignment.output_types, vec![TypeInfo::Int]);
    }

    #[test]
    fn test_parse_if_statement() {
        let Statement::If { condition, action } = parse_single("if > 5 3 do print 1 end") else {
            panic!("expected an if statement");
        };

        assert_eq!(condition.output_types, vec![TypeInfo::Bool]);
        let Statement::Block { statements } = *action else {
            panic!("expected the action to be a block");
        };
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_parse_while_statement() {
        let program = "var i int 0\nwhile > 10 i do set i + i 1 end";
        let nodes = parse_program(program).unwrap().nodes().to_vec();

        assert_eq!(nodes.len(), 2);
        assert!(matches!(nodes[1], Statement::While { .. }));
    }

    #[test]
    fn test_if_requires_do() {
        let error = parse_program("if > 5 3 print 1").unwrap_err();

        assert_eq!(
            error.message,
            "Unexpected word 'print' after if condition. Expected the start of a block."
        );
    }

    #[test]
    fn test_if_condition_must_be_bool() {
        let error = parse_program("if 1 do print 1 end").unwrap_err();

        assert_eq!(
            error.message,
            "The 'if' condition must be of type 'bool' but is of type 'int'."
        );
    }

    #[test]
    fn test_if_condition_must_produce_an_output() {
        let error = parse_program("while print 1 do end").unwrap_err();

        assert_eq!(
            error.message,
            "The 'while' condition must produce exactly one output."
        );
    }

    #[test]
    fn test_var_type_mismatch() {
        let error = parse_program("var x int > 1 2").unwrap_err();

        assert_eq!(
            error.message,
            "Variable 'x' is of type 'int' but the assignment is of type 'bool'."
        );
    }

    #[test]
    fn test_var_invalid_type_name() {
        let error = parse_program("var x float 1").unwrap_err();

        assert_eq!(error.message, "'float' is not a valid type declaration.");
    }

    #[test]
    fn test_var_name_must_be_an_identifier() {
        let error = parse_program("var print int 1").unwrap_err();

        assert_eq!(error.message, "'print' cannot be used as a variable name.");
    }

    #[test]
    fn test_redefinition_gets_a_note() {
        let error = parse_program("var x int 1\nvar x int 2").unwrap_err();

        assert_eq!(error.message, "Redefinition of variable 'x'.");
        assert_eq!(error.position, ("test".to_owned(), 2, 5));

        let note = error.note.expect("expected a note");
        assert_eq!(note.message, "'x' was first defined here.");
        assert_eq!(note.position, ("test".to_owned(), 1, 5));
    }

    #[test]
    fn test_set_undefined_variable() {
        let error = parse_program("set x 1").unwrap_err();

        assert_eq!(error.message, "Undefined variable 'x'.");
    }

    #[test]
    fn test_set_type_mismatch() {
        let error = parse_program("var b bool > 2 1\nset b 0").unwrap_err();

        assert_eq!(
            error.message,
            "Variable 'b' is of type 'bool' but the assignment is of type 'int'."
        );
    }

    #[test]
    fn test_block_scopes_identifiers() {
        // x goes out of scope with the block
        let error = parse_program("do var x int 1 end print x").unwrap_err();

        assert_eq!(error.message, "Unknown identifier 'x'.");
    }

    #[test]
    fn test_block_allows_redeclaration_after_end() {
        let program = parse_program("do var x int 1 end var x bool > 1 0");

        assert!(program.is_ok());
    }

    #[test]
    fn test_stray_end() {
        let error = parse_program("print 1 end").unwrap_err();

        assert_eq!(error.message, "Encountered 'end' without a matching 'do'.");
        assert_eq!(error.position, ("test".to_owned(), 1, 9));
    }

    #[test]
    fn test_unterminated_block() {
        let error = parse_program("do\nprint 1").unwrap_err();

        assert_eq!(error.message, "Missing 'end' for 'do'.");

        let note = error.note.expect("expected a note");
        assert_eq!(note.message, "The block starts here.");
        assert_eq!(note.position, ("test".to_owned(), 1, 1));
    }

    #[test]
    fn test_empty_program() {
        let program = parse_program("# only a comment\n").unwrap();

        assert!(program.nodes().is_empty());
    }

    #[test]
    fn test_self_reference_parses() {
        // registration happens before the initializer is parsed
        let program = parse_program("var x int x");

        assert!(program.is_ok());
    }
}
