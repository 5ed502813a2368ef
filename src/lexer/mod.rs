//! Lexer for Betsy programs.
//!
//! Betsy sources are word oriented: a word is a maximal run of graphic
//! bytes, words are separated by whitespace, and `#` starts a comment
//! which reaches to the end of the line. The lexer is total; deciding
//! what a word *means* is left to the classifier.
mod token;

pub use token::*;

use std::{iter::Peekable, str::Bytes};

pub struct Lexer<'a> {
    tokens: Vec<Token>,
    iterator: Peekable<Bytes<'a>>,
    filename: &'a str,
    line: usize,
    col: usize,
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_graphic() && byte != b'#'
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, filename: &'a str) -> Self {
        Self {
            tokens: vec![],
            iterator: input.bytes().peekable(),
            filename,
            line: 1,
            col: 1,
        }
    }

    fn next_if(&mut self, func: impl FnOnce(&u8) -> bool) -> Option<u8> {
        self.iterator.next_if(func)
    }

    fn advance(&mut self, byte: u8) {
        if byte == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
    }

    /// Skip everything which does not belong to a word: whitespace,
    /// control bytes, and `#` comments.
    fn eat_separators(&mut self) {
        loop {
            if let Some(next) = self.next_if(|byte| !byte.is_ascii_graphic()) {
                self.advance(next);
            } else if self.next_if(|byte| *byte == b'#').is_some() {
                self.col += 1;
                while let Some(next) = self.next_if(|byte| *byte != b'\n') {
                    self.advance(next);
                }
            } else {
                return;
            }
        }
    }

    pub fn lex(mut self) -> Vec<Token> {
        loop {
            self.eat_separators();

            let position = (self.filename.to_owned(), self.line, self.col);

            let mut lexeme = String::new();
            while let Some(next) = self.next_if(|byte| is_word_byte(*byte)) {
                self.col += 1;
                lexeme.push(next as char);
            }

            if lexeme.is_empty() {
                return self.tokens;
            }

            self.tokens.push(Token { lexeme, position });
        }
    }
}
