// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Lexical analysis for While programs
//!
//! Tokenizes the keyword/operator surface syntax, including `??` holes
//! and signed integer literals

use crate::error::{LexerError, SourceLocation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

/// Keywords of the While language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyword {
    If,
    Then,
    Else,
    While,
    Do,
    Skip,
    Assert,
    Not,
    And,
    Or,
    Mod,
    True,
    False,
}

/// Token types for While programs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenType {
    // Literals and names
    Identifier(String),
    Number(i64),
    Hole,
    Keyword(Keyword),

    // Operators
    Assign, // :=
    Plus,
    Minus,
    Star,
    Slash,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Semicolon,

    // End of input
    Eof,
}

/// A token with its type and location information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub token_type: TokenType,
    pub location: SourceLocation,
    pub lexeme: String,
}

impl Token {
    pub fn new(token_type: TokenType, location: SourceLocation, lexeme: String) -> Self {
        Self {
            token_type,
            location,
            lexeme,
        }
    }
}

/// Lexer for While source text
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
    line: usize,
    column: usize,
    file_name: String,
    keywords: HashMap<&'static str, Keyword>,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str, file_name: String) -> Self {
        let chars: Vec<char> = input.graphemes(true).flat_map(|g| g.chars()).collect();
        let current_char = chars.first().copied();

        Self {
            input: chars,
            position: 0,
            current_char,
            line: 1,
            column: 1,
            file_name,
            keywords: HashMap::from([
                ("if", Keyword::If),
                ("then", Keyword::Then),
                ("else", Keyword::Else),
                ("while", Keyword::While),
                ("do", Keyword::Do),
                ("skip", Keyword::Skip),
                ("assert", Keyword::Assert),
                ("not", Keyword::Not),
                ("and", Keyword::And),
                ("or", Keyword::Or),
                ("mod", Keyword::Mod),
                ("true", Keyword::True),
                ("false", Keyword::False),
            ]),
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.token_type == TokenType::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.file_name.clone(), self.line, self.column, self.position)
    }

    fn advance(&mut self) {
        if self.current_char == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current_char, Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn next_token(&mut self) -> Result<Token, LexerError> {
        self.skip_whitespace();

        let location = self.current_location();
        let c = match self.current_char {
            Some(c) => c,
            None => return Ok(Token::new(TokenType::Eof, location, String::new())),
        };

        if c.is_alphabetic() {
            return Ok(self.read_word(location));
        }
        if c.is_ascii_digit() {
            return self.read_number(location, false);
        }

        // A sign directly followed by a digit is part of the literal, so
        // pretty-printed negative constants round-trip.
        if (c == '-' || c == '+') && matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
            let negative = c == '-';
            self.advance();
            return self.read_number(location, negative);
        }

        let single = |lexer: &mut Self, token_type: TokenType| {
            lexer.advance();
            Token::new(token_type, location.clone(), c.to_string())
        };

        match c {
            '(' => Ok(single(self, TokenType::LeftParen)),
            ')' => Ok(single(self, TokenType::RightParen)),
            '[' => Ok(single(self, TokenType::LeftBracket)),
            ']' => Ok(single(self, TokenType::RightBracket)),
            ';' => Ok(single(self, TokenType::Semicolon)),
            '+' => Ok(single(self, TokenType::Plus)),
            '-' => Ok(single(self, TokenType::Minus)),
            '*' => Ok(single(self, TokenType::Star)),
            '/' => Ok(single(self, TokenType::Slash)),
            '=' => Ok(single(self, TokenType::Eq)),
            '<' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Ok(Token::new(TokenType::Le, location, "<=".to_string()))
                } else {
                    Ok(Token::new(TokenType::Lt, location, "<".to_string()))
                }
            }
            '>' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Ok(Token::new(TokenType::Ge, location, ">=".to_string()))
                } else {
                    Ok(Token::new(TokenType::Gt, location, ">".to_string()))
                }
            }
            '!' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Ok(Token::new(TokenType::Ne, location, "!=".to_string()))
                } else {
                    Err(LexerError::UnexpectedCharacter {
                        character: '!',
                        location,
                    })
                }
            }
            ':' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Ok(Token::new(TokenType::Assign, location, ":=".to_string()))
                } else {
                    Err(LexerError::UnexpectedCharacter {
                        character: ':',
                        location,
                    })
                }
            }
            '?' => {
                self.advance();
                if self.current_char == Some('?') {
                    self.advance();
                    Ok(Token::new(TokenType::Hole, location, "??".to_string()))
                } else {
                    Err(LexerError::UnexpectedCharacter {
                        character: '?',
                        location,
                    })
                }
            }
            _ => Err(LexerError::UnexpectedCharacter {
                character: c,
                location,
            }),
        }
    }

    fn read_word(&mut self, location: SourceLocation) -> Token {
        let mut word = String::new();
        while matches!(self.current_char, Some(c) if c.is_alphanumeric() || c == '_') {
            word.push(self.current_char.unwrap_or_default());
            self.advance();
        }

        match self.keywords.get(word.as_str()) {
            Some(&keyword) => Token::new(TokenType::Keyword(keyword), location, word),
            None => Token::new(TokenType::Identifier(word.clone()), location, word),
        }
    }

    fn read_number(
        &mut self,
        location: SourceLocation,
        negative: bool,
    ) -> Result<Token, LexerError> {
        let mut digits = String::new();
        if negative {
            digits.push('-');
        }
        while matches!(self.current_char, Some(c) if c.is_ascii_digit()) {
            digits.push(self.current_char.unwrap_or_default());
            self.advance();
        }

        match digits.parse::<i64>() {
            Ok(value) => Ok(Token::new(TokenType::Number(value), location, digits)),
            Err(_) => Err(LexerError::InvalidNumber {
                value: digits,
                location,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_types(input: &str) -> Vec<TokenType> {
        let mut lexer = Lexer::new(input, "test.while".to_string());
        lexer
            .tokenize()
            .expect("tokenize failed")
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn test_assignment_tokens() {
        assert_eq!(
            token_types("x := 5"),
            vec![
                TokenType::Identifier("x".to_string()),
                TokenType::Assign,
                TokenType::Number(5),
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_and_holes() {
        assert_eq!(
            token_types("if ?? then skip else skip"),
            vec![
                TokenType::Keyword(Keyword::If),
                TokenType::Hole,
                TokenType::Keyword(Keyword::Then),
                TokenType::Keyword(Keyword::Skip),
                TokenType::Keyword(Keyword::Else),
                TokenType::Keyword(Keyword::Skip),
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_signed_literal_vs_subtraction() {
        // A spaced minus is an operator
        assert_eq!(
            token_types("x - 1"),
            vec![
                TokenType::Identifier("x".to_string()),
                TokenType::Minus,
                TokenType::Number(1),
                TokenType::Eof,
            ]
        );
        // A minus glued to digits is a literal
        assert_eq!(
            token_types("-4"),
            vec![TokenType::Number(-4), TokenType::Eof]
        );
    }

    #[test]
    fn test_compound_operators() {
        assert_eq!(
            token_types("a != b <= c"),
            vec![
                TokenType::Identifier("a".to_string()),
                TokenType::Ne,
                TokenType::Identifier("b".to_string()),
                TokenType::Le,
                TokenType::Identifier("c".to_string()),
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_array_brackets() {
        assert_eq!(
            token_types("a[0] := 1"),
            vec![
                TokenType::Identifier("a".to_string()),
                TokenType::LeftBracket,
                TokenType::Number(0),
                TokenType::RightBracket,
                TokenType::Assign,
                TokenType::Number(1),
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_unexpected_character() {
        let mut lexer = Lexer::new("x # y", "test.while".to_string());
        assert!(matches!(
            lexer.tokenize(),
            Err(LexerError::UnexpectedCharacter { character: '#', .. })
        ));
    }

    #[test]
    fn test_locations_track_lines() {
        let mut lexer = Lexer::new("x := 1;\ny := 2", "test.while".to_string());
        let tokens = lexer.tokenize().expect("tokenize failed");
        let y = tokens
            .iter()
            .find(|t| t.token_type == TokenType::Identifier("y".to_string()))
            .expect("missing token");
        assert_eq!(y.location.line, 2);
        assert_eq!(y.location.column, 1);
    }
}
