/// Lexical token produced by the [`Lexer`](crate::lexer::Lexer).
///
/// Tokens are transient: the parser consumes them one at a time and never
/// keeps them around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Run of non-separator characters
    ///
    /// Becomes a number, a header field reference, or the name following
    /// `@`, `$`, `:` or `%`.
    ///
    /// # Examples
    /// ```text
    /// Subject
    /// 42
    /// X-Mailer
    /// ```
    Text(String),

    /// Quoted string or here-document, with escapes already resolved
    ///
    /// # Examples
    /// ```text
    /// "hello\n"
    /// 'it\'s'
    /// <<EOS
    /// line one
    /// EOS
    /// ```
    Literal(String),

    /// Regular expression literal with its trailing mode letters
    ///
    /// # Examples
    /// ```text
    /// /^Re:/i
    /// /a\/b/
    /// ```
    Regex { pattern: String, flags: String },

    /// Function call prefix (`@Name(`)
    At,

    /// Variable prefix (`$name`, `$1`)
    Dollar,

    /// Named constant prefix (`:MF_SEEN`)
    Colon,

    /// Cached field prefix (`%Subject`)
    Percent,

    LParen,
    RParen,
    Comma,

    /// End of input
    Eof,
}

impl Token {
    /// Whether this token begins an expression on its own.
    pub fn starts_expression(&self) -> bool {
        matches!(
            self,
            Token::Text(_)
                | Token::Literal(_)
                | Token::Regex { .. }
                | Token::At
                | Token::Dollar
                | Token::Colon
                | Token::Percent
        )
    }
}
