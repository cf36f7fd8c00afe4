use crate::ast::Token;
use crate::error::{LexError, LexErrorKind, Position};

/// Characters that end a bare text token.
const SEPARATORS: &[char] = &[
    ' ', '\t', '\n', '\r', ',', '(', ')', '<', '>', '#', '@', '$', ':', '%', '"', '\'',
];

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    last: Position,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            last: Position::new(0, 1, 1),
        }
    }

    /// Position where the most recently returned token began.
    pub fn last_position(&self) -> Position {
        self.last
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    fn here(&self) -> Position {
        Position::new(self.position, self.line, self.column)
    }

    fn error(&self, kind: LexErrorKind) -> LexError {
        LexError {
            kind,
            position: self.last,
        }
    }

    /// Skips blanks and `#` comment lines.
    fn skip_whitespace(&mut self) {
        loop {
            while matches!(self.current_char(), Some(' ' | '\t' | '\n' | '\r')) {
                self.advance();
            }
            if self.current_char() != Some('#') {
                break;
            }
            while let Some(ch) = self.current_char() {
                if ch == '\n' {
                    break;
                }
                self.advance();
            }
        }
    }

    fn read_literal(&mut self, quote: char) -> Result<Token, LexError> {
        let mut result = String::new();
        self.advance();

        loop {
            match self.current_char() {
                None => return Err(self.error(LexErrorKind::UnterminatedLiteral)),
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(Token::Literal(result));
                }
                Some('\\') => {
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        // \\, \', \" and unknown escapes all keep the next character
                        Some(c) => result.push(c),
                        None => return Err(self.error(LexErrorKind::DanglingEscape)),
                    }
                    self.advance();
                }
                Some(c) => {
                    result.push(c);
                    self.advance();
                }
            }
        }
    }

    fn read_regex(&mut self) -> Result<Token, LexError> {
        let mut pattern = String::new();
        self.advance();

        loop {
            match self.current_char() {
                None => return Err(self.error(LexErrorKind::UnterminatedRegex)),
                Some('/') => {
                    self.advance();
                    break;
                }
                Some('\\') => match self.peek_char(1) {
                    Some('/') => {
                        pattern.push('/');
                        self.advance();
                        self.advance();
                    }
                    Some(c) => {
                        pattern.push('\\');
                        pattern.push(c);
                        self.advance();
                        self.advance();
                    }
                    None => return Err(self.error(LexErrorKind::UnterminatedRegex)),
                },
                Some(c) => {
                    pattern.push(c);
                    self.advance();
                }
            }
        }

        let mut flags = String::new();
        while let Some(c) = self.current_char() {
            if !c.is_ascii_lowercase() {
                break;
            }
            flags.push(c);
            self.advance();
        }

        Ok(Token::Regex { pattern, flags })
    }

    /// Reads up to the end of the current line. The newline is consumed but
    /// not included; the flag tells whether one was present.
    fn read_line(&mut self) -> (String, bool) {
        let mut line = String::new();
        while let Some(c) = self.current_char() {
            self.advance();
            if c == '\n' {
                return (line, true);
            }
            line.push(c);
        }
        (line, false)
    }

    fn read_heredoc(&mut self) -> Result<Token, LexError> {
        self.advance();
        self.advance();
        while matches!(self.current_char(), Some(' ' | '\t')) {
            self.advance();
        }

        let (tag, terminated) = self.read_line();
        let tag = tag.trim_end_matches('\r').to_string();
        if tag.is_empty() {
            return Err(self.error(LexErrorKind::EmptyHeredocTag));
        }
        if !terminated {
            return Err(self.error(LexErrorKind::UnterminatedHeredoc));
        }

        let mut content = String::new();
        loop {
            if self.current_char().is_none() {
                return Err(self.error(LexErrorKind::UnterminatedHeredoc));
            }
            let (line, terminated) = self.read_line();
            if line.trim_end_matches('\r') == tag {
                return Ok(Token::Literal(content));
            }
            if !terminated {
                return Err(self.error(LexErrorKind::UnterminatedHeredoc));
            }
            content.push_str(&line);
            content.push('\n');
        }
    }

    fn read_text(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        while let Some(c) = self.current_char() {
            if SEPARATORS.contains(&c) {
                break;
            }
            self.advance();
        }

        if self.position == start {
            return Err(self.error(LexErrorKind::EmptyToken));
        }
        Ok(Token::Text(self.input[start..self.position].iter().collect()))
    }

    fn single(&mut self, token: Token) -> Result<Token, LexError> {
        self.advance();
        Ok(token)
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        self.last = self.here();

        match self.current_char() {
            None => Ok(Token::Eof),
            Some(q @ ('"' | '\'')) => self.read_literal(q),
            Some('/') => self.read_regex(),
            Some('<') if self.peek_char(1) == Some('<') => self.read_heredoc(),
            Some('@') => self.single(Token::At),
            Some('$') => self.single(Token::Dollar),
            Some(':') => self.single(Token::Colon),
            Some('%') => self.single(Token::Percent),
            Some('(') => self.single(Token::LParen),
            Some(')') => self.single(Token::RParen),
            Some(',') => self.single(Token::Comma),
            Some(_) => self.read_text(),
        }
    }
}

#[test]
fn test_function_call_tokens() {
    let mut lexer = Lexer::new("@Contain(%Subject, $1)");
    assert_eq!(lexer.next_token(), Ok(Token::At));
    assert_eq!(lexer.next_token(), Ok(Token::Text("Contain".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::LParen));
    assert_eq!(lexer.next_token(), Ok(Token::Percent));
    assert_eq!(lexer.next_token(), Ok(Token::Text("Subject".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Comma));
    assert_eq!(lexer.next_token(), Ok(Token::Dollar));
    assert_eq!(lexer.next_token(), Ok(Token::Text("1".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::RParen));
    assert_eq!(lexer.next_token(), Ok(Token::Eof));
}

#[test]
fn test_last_position_tracks_lines() {
    let mut lexer = Lexer::new("@If(\n  Subject");
    for _ in 0..3 {
        lexer.next_token().unwrap();
    }
    assert_eq!(lexer.next_token(), Ok(Token::Text("Subject".to_string())));
    assert_eq!(lexer.last_position(), Position::new(7, 2, 3));
}
