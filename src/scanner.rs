use std::iter::FusedIterator;

use log::{debug, info};
use phf::phf_map;

use crate::error::LoxError;
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and" => TokenType::AND,
    b"class" => TokenType::CLASS,
    b"else" => TokenType::ELSE,
    b"false" => TokenType::FALSE,
    b"fun" => TokenType::FUN,
    b"for" => TokenType::FOR,
    b"if" => TokenType::IF,
    b"nil" => TokenType::NIL,
    b"or" => TokenType::OR,
    b"print" => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super" => TokenType::SUPER,
    b"this" => TokenType::THIS,
    b"true" => TokenType::TRUE,
    b"var" => TokenType::VAR,
    b"while" => TokenType::WHILE,
};

/// Byte-cursor scanner over a source string.
///
/// Implemented as an iterator: each `next()` yields the next token or a
/// lexical error. Errors do not stop the stream, and it always ends with
/// exactly one `EOF` token carrying the final line number.
///
/// Lexeme boundaries only ever fall on ASCII bytes (every token-starting and
/// token-ending byte is ASCII), so slicing the source `String` by byte index
/// stays on UTF-8 character boundaries.
#[derive(Debug, Clone)]
pub struct Scanner {
    source: String,
    start: usize,
    current: usize,
    line: usize,
    eof_emitted: bool,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        info!("Initializing Scanner with {} bytes", source.len());
        Self {
            source: source.to_string(),
            start: 0,
            current: 0,
            line: 1,
            eof_emitted: false,
        }
    }

    /// Scans one lexeme starting at `self.start`. Returns the token kind,
    /// `None` for trivia (whitespace, newlines, comments), or a lexical
    /// error.
    fn scan_token(&mut self) -> Result<Option<TokenType>, LoxError> {
        let byte: u8 = self.bump();
        debug!("Scanning '{}' at line {}", byte as char, self.line);

        let kind: TokenType = match byte {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,

            b'!' => self.pick(b'=', TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.pick(b'=', TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.pick(b'=', TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.pick(b'=', TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'/' => {
                if self.take(b'/') {
                    // A comment claims the rest of the line.
                    while !self.at_end() && self.peek() != b'\n' {
                        self.bump();
                    }

                    return Ok(None);
                }

                TokenType::SLASH
            }

            b' ' | b'\r' | b'\t' => return Ok(None),

            b'\n' => {
                self.line += 1;
                return Ok(None);
            }

            b'"' => return self.string().map(Some),

            b'0'..=b'9' => self.number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", byte as char),
                ));
            }
        };

        Ok(Some(kind))
    }

    fn string(&mut self) -> Result<TokenType, LoxError> {
        while !self.at_end() && self.peek() != b'"' {
            if self.peek() == b'\n' {
                self.line += 1;
            }

            self.bump();
        }

        if self.at_end() {
            debug!("Unterminated string at line {}", self.line);

            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        // Closing quote.
        self.bump();

        // No escape sequences: the enclosed text is the value.
        let value: &str = &self.source[self.start + 1..self.current - 1];

        info!("Scanned string literal: {}", value);

        Ok(TokenType::STRING(value.to_string()))
    }

    fn number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.bump();
        }

        // A trailing '.' without fractional digits is not consumed.
        if self.peek() == b'.' && self.peek_ahead().is_ascii_digit() {
            self.bump();

            while self.peek().is_ascii_digit() {
                self.bump();
            }
        }

        let value: f64 = self.lexeme().parse().unwrap_or(0.0);

        info!("Scanned number: {}", value);

        TokenType::NUMBER(value)
    }

    fn identifier(&mut self) -> TokenType {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.bump();
        }

        match KEYWORDS.get(self.lexeme().as_bytes()) {
            Some(keyword) => keyword.clone(),

            None => TokenType::IDENTIFIER,
        }
    }

    /// The source text of the lexeme being scanned.
    #[inline]
    fn lexeme(&self) -> &str {
        &self.source[self.start..self.current]
    }

    /// Consumes the current byte.
    #[inline]
    fn bump(&mut self) -> u8 {
        let byte = self.source.as_bytes()[self.current];

        self.current += 1;

        byte
    }

    /// Consumes the current byte only if it is `expected`.
    #[inline]
    fn take(&mut self, expected: u8) -> bool {
        if self.at_end() || self.source.as_bytes()[self.current] != expected {
            false
        } else {
            self.current += 1;

            true
        }
    }

    /// Picks between a two-character operator and its one-character prefix.
    #[inline]
    fn pick(&mut self, second: u8, matched: TokenType, lone: TokenType) -> TokenType {
        if self.take(second) {
            matched
        } else {
            lone
        }
    }

    #[inline]
    fn peek(&self) -> u8 {
        if self.at_end() {
            0
        } else {
            self.source.as_bytes()[self.current]
        }
    }

    #[inline]
    fn peek_ahead(&self) -> u8 {
        if self.current + 1 >= self.source.len() {
            0
        } else {
            self.source.as_bytes()[self.current + 1]
        }
    }

    #[inline]
    fn at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

impl Iterator for Scanner {
    type Item = Result<Token, LoxError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.at_end() {
                if self.eof_emitted {
                    return None;
                }

                self.eof_emitted = true;

                info!("Reached EOF at line {}", self.line);

                return Some(Ok(Token::new(TokenType::EOF, String::new(), self.line)));
            }

            self.start = self.current;

            match self.scan_token() {
                Err(e) => return Some(Err(e)),

                Ok(Some(kind)) => {
                    info!(
                        "Emitting token: type={:?}, lexeme={}, line={}",
                        kind,
                        self.lexeme(),
                        self.line
                    );

                    return Some(Ok(Token::new(
                        kind,
                        self.lexeme().to_string(),
                        self.line,
                    )));
                }

                // Trivia; keep scanning for a real token.
                Ok(None) => {}
            }
        }
    }
}

impl FusedIterator for Scanner {}
