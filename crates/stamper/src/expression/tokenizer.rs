//! Expression tokenizer

use crate::EvaluationError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Str(String),
    Identifier(String),
    /// `#this`, `#root`
    Variable(String),
    Dot,
    /// `?.`
    SafeDot,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Comma,
    Question,
    Colon,
    /// `?:`
    Elvis,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    AndAnd,
    OrOr,
    Assign,
    Eof,
}

/// A token and the char offset it starts at
pub(crate) type Spanned = (Token, usize);

pub(crate) struct Tokenizer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    /// Tokenize the whole input, ending with `Eof`
    pub(crate) fn tokenize(mut self) -> Result<Vec<Spanned>, EvaluationError> {
        let mut tokens = Vec::new();
        loop {
            let (token, start) = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push((token, start));
            if done {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Spanned, EvaluationError> {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.advance();
        }

        let start = self.position;
        let Some(&c) = self.chars.peek() else {
            return Ok((Token::Eof, start));
        };

        let token = match c {
            '0'..='9' => self.read_number()?,
            '\'' | '"' => self.read_string(c)?,
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                Token::Identifier(self.read_word())
            }
            '#' => {
                self.advance();
                let name = self.read_word();
                if name.is_empty() {
                    return Err(self.error(start, "expected variable name after '#'"));
                }
                Token::Variable(name)
            }
            '?' => {
                self.advance();
                match self.chars.peek() {
                    Some('.') => {
                        self.advance();
                        Token::SafeDot
                    }
                    Some(':') => {
                        self.advance();
                        Token::Elvis
                    }
                    _ => Token::Question,
                }
            }
            '=' => {
                self.advance();
                if self.eat('=') {
                    Token::EqEq
                } else {
                    Token::Assign
                }
            }
            '!' => {
                self.advance();
                if self.eat('=') {
                    Token::NotEq
                } else {
                    Token::Bang
                }
            }
            '<' => {
                self.advance();
                if self.eat('=') {
                    Token::LessEq
                } else {
                    Token::Less
                }
            }
            '>' => {
                self.advance();
                if self.eat('=') {
                    Token::GreaterEq
                } else {
                    Token::Greater
                }
            }
            '&' => {
                self.advance();
                if !self.eat('&') {
                    return Err(self.error(start, "expected '&&'"));
                }
                Token::AndAnd
            }
            '|' => {
                self.advance();
                if !self.eat('|') {
                    return Err(self.error(start, "expected '||'"));
                }
                Token::OrOr
            }
            _ => {
                self.advance();
                match c {
                    '.' => Token::Dot,
                    '(' => Token::OpenParen,
                    ')' => Token::CloseParen,
                    '[' => Token::OpenBracket,
                    ']' => Token::CloseBracket,
                    '{' => Token::OpenBrace,
                    '}' => Token::CloseBrace,
                    ',' => Token::Comma,
                    ':' => Token::Colon,
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    other => {
                        return Err(self.error(start, &format!("unexpected character '{other}'")))
                    }
                }
            }
        };
        Ok((token, start))
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.chars.peek() == Some(&expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, position: usize, message: &str) -> EvaluationError {
        EvaluationError::Parse {
            position,
            message: message.to_string(),
        }
    }

    fn read_number(&mut self) -> Result<Token, EvaluationError> {
        let start = self.position;
        let mut num = String::new();
        let mut has_dot = false;

        while let Some(&c) = self.chars.peek() {
            match c {
                '0'..='9' => {
                    num.push(c);
                    self.advance();
                }
                // A dot only belongs to the number if a digit follows,
                // so `list.size` style access on literals still works.
                '.' if !has_dot => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if !lookahead.peek().is_some_and(|d| d.is_ascii_digit()) {
                        break;
                    }
                    has_dot = true;
                    num.push(c);
                    self.advance();
                }
                _ => break,
            }
        }

        num.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| self.error(start, &format!("invalid number '{num}'")))
    }

    fn read_string(&mut self, quote: char) -> Result<Token, EvaluationError> {
        let start = self.position;
        self.advance();
        let mut text = String::new();
        loop {
            match self.advance() {
                // A doubled quote is an escaped quote
                Some(c) if c == quote => {
                    if self.eat(quote) {
                        text.push(quote);
                    } else {
                        return Ok(Token::Str(text));
                    }
                }
                Some(c) => text.push(c),
                None => return Err(self.error(start, "unterminated string literal")),
            }
        }
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                word.push(c);
                self.advance();
            } else {
                break;
            }
        }
        word
    }
}
