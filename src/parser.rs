use bitflags::bitflags;

use crate::ast::{Expr, FieldCacheKind, FunctionCall, Macro, RegexLiteral, Token, VariableRef};
use crate::constants;
use crate::error::{ErrorHandler, ParseError, ParseErrorCode, Position};
use crate::functions::{self, FunctionDef, Lookup};
use crate::lexer::Lexer;
use crate::value::is_number;

bitflags! {
    /// Where a macro is used. Some built-ins are only available in some
    /// kinds of macro.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MacroKind: u32 {
        const COLOR = 0x001;
        const COLUMN = 0x002;
        const FILTER = 0x004;
        const HEADER = 0x008;
        const MESSAGE = 0x010;
        const RULE = 0x020;
        const SYNCFILTER = 0x040;
        const TEMPLATE = 0x080;
        const SEARCH = 0x100;
    }
}

impl MacroKind {
    /// Like the generated `from_name`, but ignores case.
    pub fn from_name_ignore_case(name: &str) -> Option<Self> {
        Self::from_name(&name.to_ascii_uppercase())
    }
}

/// A call whose closing parenthesis has not been seen yet.
struct PartialCall {
    name: String,
    definition: Option<&'static FunctionDef>,
    args: Vec<Expr>,
}

impl PartialCall {
    fn finish(self) -> Expr {
        match self.definition {
            Some(def) => Expr::Function(FunctionCall::builtin(def, self.args)),
            None => Expr::Function(FunctionCall::user(self.name, self.args)),
        }
    }
}

/// What may come next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// Start of input or after a comma
    Expression,
    /// Right after `@Name(`
    ArgumentOrClose,
    /// After a complete expression
    Separator,
}

/// Turns macro text into a [`Macro`].
///
/// Parsing is a single pass over the token stream with an explicit stack
/// of open function calls. A macro holds exactly one top-level expression;
/// empty input parses to an empty literal.
///
/// # Examples
///
/// ```
/// use qmacro::{MacroKind, Parser};
///
/// let parsed = Parser::new(MacroKind::FILTER)
///     .parse("@and(@Seen(), @Contain(%Subject, 'report'))")
///     .unwrap();
/// assert_eq!(parsed.to_source(), "@And(@Seen(),@Contain(%Subject,'report'))");
/// ```
pub struct Parser<'h> {
    kind: MacroKind,
    error_handler: Option<&'h dyn ErrorHandler>,
}

impl<'h> Parser<'h> {
    pub fn new(kind: MacroKind) -> Self {
        Parser {
            kind,
            error_handler: None,
        }
    }

    pub fn with_error_handler(mut self, handler: &'h dyn ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    pub fn kind(&self) -> MacroKind {
        self.kind
    }

    pub fn parse(&self, source: &str) -> Result<Macro, ParseError> {
        let result = self.parse_tokens(&mut Lexer::new(source));
        if let Err(e) = &result {
            tracing::debug!(code = %e.code, position = %e.position, "macro parse failed");
            if let Some(handler) = self.error_handler {
                handler.parse_error(e.code, e.position);
            }
        }
        result
    }

    fn parse_tokens(&self, lexer: &mut Lexer) -> Result<Macro, ParseError> {
        let mut frames: Vec<PartialCall> = Vec::new();
        let mut root: Option<Expr> = None;
        let mut expect = Expect::Expression;

        loop {
            let token = lexer.next_token()?;
            let position = lexer.last_position();
            let syntax_error = ParseError::new(ParseErrorCode::SyntaxError, position);

            if token.starts_expression() {
                if root.is_some() {
                    return Err(ParseError::new(
                        ParseErrorCode::MacroContainsMoreThanOneExpr,
                        position,
                    ));
                }
                if expect == Expect::Separator {
                    return Err(syntax_error);
                }
            }

            let expr = match token {
                Token::Text(text) => Some(self.text_expr(text, position)?),
                Token::Literal(value) => Some(Expr::Literal(value)),
                Token::Regex { pattern, flags } => match RegexLiteral::new(&pattern, &flags) {
                    Some(regex) => Some(Expr::Regex(regex)),
                    None => {
                        return Err(ParseError::new(ParseErrorCode::InvalidRegex, position));
                    }
                },
                Token::At => {
                    frames.push(self.open_call(lexer, position)?);
                    expect = Expect::ArgumentOrClose;
                    None
                }
                Token::Dollar => {
                    let code = ParseErrorCode::InvalidVariableName;
                    let name = expect_name(lexer, code, position)?;
                    match VariableRef::parse(&name) {
                        Some(variable) => Some(Expr::Variable(variable)),
                        None => return Err(ParseError::new(code, position)),
                    }
                }
                Token::Colon => {
                    let code = ParseErrorCode::InvalidConstantName;
                    let name = expect_name(lexer, code, position)?;
                    match constants::lookup(&name) {
                        Some(constant) => Some(constant.to_expr()),
                        None => return Err(ParseError::new(code, position)),
                    }
                }
                Token::Percent => {
                    let code = ParseErrorCode::InvalidFieldName;
                    let name = expect_name(lexer, code, position)?;
                    match FieldCacheKind::from_name(&name) {
                        Some(kind) => Some(Expr::FieldCache(kind)),
                        None => return Err(ParseError::new(code, position)),
                    }
                }
                Token::LParen => return Err(syntax_error),
                Token::RParen => {
                    if expect == Expect::Expression {
                        return Err(syntax_error);
                    }
                    match frames.pop() {
                        Some(call) => Some(call.finish()),
                        None => return Err(syntax_error),
                    }
                }
                Token::Comma => {
                    if frames.is_empty() || expect != Expect::Separator {
                        return Err(syntax_error);
                    }
                    expect = Expect::Expression;
                    None
                }
                Token::Eof => {
                    if !frames.is_empty() {
                        return Err(syntax_error);
                    }
                    break;
                }
            };

            if let Some(expr) = expr {
                expect = Expect::Separator;
                match frames.last_mut() {
                    Some(call) => call.args.push(expr),
                    None => root = Some(expr),
                }
            }
        }

        let root = root.unwrap_or_else(|| Expr::Literal(String::new()));
        Ok(Macro::new(root, self.kind))
    }

    /// Bare text is a number if it looks like one, a header name otherwise.
    fn text_expr(&self, text: String, position: Position) -> Result<Expr, ParseError> {
        if !is_number(&text) {
            return Ok(Expr::Field(text));
        }
        text.parse::<i64>()
            .map(Expr::Number)
            .map_err(|_| ParseError::new(ParseErrorCode::SyntaxError, position))
    }

    /// Reads `Name(` after `@` and resolves the name.
    fn open_call(&self, lexer: &mut Lexer, at: Position) -> Result<PartialCall, ParseError> {
        let name = expect_name(lexer, ParseErrorCode::InvalidFunctionName, at)?;
        if lexer.next_token()? != Token::LParen {
            return Err(ParseError::new(
                ParseErrorCode::FunctionWithoutParenthesis,
                at,
            ));
        }

        let definition = match functions::lookup(&name, self.kind) {
            Lookup::Builtin(def) => Some(def),
            Lookup::Restricted(def) => {
                tracing::debug!(function = def.name, kind = ?self.kind, "function not allowed here");
                return Err(ParseError::new(ParseErrorCode::InvalidFunctionName, at));
            }
            Lookup::Unknown => None,
        };

        Ok(PartialCall {
            name,
            definition,
            args: Vec::new(),
        })
    }
}

fn expect_name(
    lexer: &mut Lexer,
    code: ParseErrorCode,
    at: Position,
) -> Result<String, ParseError> {
    match lexer.next_token()? {
        Token::Text(name) => Ok(name),
        _ => Err(ParseError::new(code, at)),
    }
}
