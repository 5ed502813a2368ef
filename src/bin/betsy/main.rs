//! # Betsy
//!
//! This binary is the toolchain entry point of Betsy. It combines the
//! parser with the simulator and the C emitting compiler behind a small
//! set of subcommands.
mod cli;

use cli::*;

use std::{fs, path::Path, process::exit};

use log::info;

use betsy::{
    ast::{Ast, Operation},
    compiler::Compiler,
    lexer::Lexer,
    simulator::Simulator,
};

fn main() {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into()).unwrap();

    let (Commands::Sim(run) | Commands::Com(run)) = &args.command;

    let Ok(source) = fs::read_to_string(&run.file) else {
        eprintln!(
            "ERROR: File '{}' cannot be opened.",
            run.file.to_string_lossy()
        );
        exit(1);
    };

    let filename = run.file.to_string_lossy();
    let tokens = Lexer::new(&source, &filename).lex();
    let operations = tokens.into_iter().map(Operation::from).collect();

    let ast = match Ast::from_operations(operations) {
        Ok(ast) => ast,
        Err(parse_error) => {
            eprintln!("{parse_error}");
            exit(1);
        }
    };

    if run.dump_parsed {
        info!("Parsed program:\n{ast:#?}");
    }

    match &args.command {
        Commands::Sim(_) => {
            if let Err(sim_error) = Simulator::from_ast(ast).run() {
                eprintln!("{sim_error}");
                exit(1);
            }
        }
        Commands::Com(_) => {
            if let Err(compile_error) = Compiler::from_ast(ast).compile_program(Path::new("out.c"))
            {
                eprintln!("{compile_error}");
                exit(1);
            }
        }
    }
}
