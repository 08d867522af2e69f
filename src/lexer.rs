use crate::diagnostics::{Diagnostic, DiagnosticKind, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Blueprint,
    Field,
    Law,
    Forge,
    Reply,
    Show,
    When,
    Finfr,
    Let,
    Const,
    If,
    Else,
    While,
    Loop,
    Break,
    Continue,
    True,
    False,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    String,
    Keyword(Keyword),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semicolon,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    DoubleAmpersand,
    DoublePipe,
    Bang,
    BangEqual,
    EqualEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub pos: Position,
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>,
    current: usize,
    peeked: Option<(usize, char)>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices(),
            current: 0,
            peeked: None,
            line: 1,
            column: 1,
        }
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = if let Some((idx, ch)) = self.peeked.take() {
            Some((idx, ch))
        } else {
            self.chars.next()
        };
        if let Some((idx, ch)) = next {
            self.current = idx + ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some((idx, ch))
        } else {
            None
        }
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        if self.peeked.is_none() {
            self.peeked = self.chars.next();
        }
        self.peeked
    }

    fn match_next(&mut self, expected: char) -> bool {
        if let Some((idx, ch)) = self.peek() {
            if ch == expected {
                self.peeked = None;
                self.current = idx + ch.len_utf8();
                self.column += 1;
                true
            } else {
                false
            }
        } else {
            false
        }
    }

    fn collect_while<F>(&mut self, start: usize, mut predicate: F) -> String
    where
        F: FnMut(char) -> bool,
    {
        let mut end = self.current;
        while let Some((idx, ch)) = self.peek() {
            if predicate(ch) {
                self.bump();
                end = idx + ch.len_utf8();
            } else {
                break;
            }
        }
        self.source[start..end].to_string()
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), Diagnostic> {
        loop {
            let mut progressed = false;

            while let Some((_, ch)) = self.peek() {
                if ch.is_whitespace() {
                    self.bump();
                    progressed = true;
                } else {
                    break;
                }
            }

            let mut handled_comment = false;
            if let Some((start, '/')) = self.peek() {
                let comment_pos = self.pos();
                if let Some((_, next)) = self.chars.clone().next() {
                    if next == '/' {
                        self.bump();
                        self.bump();
                        while let Some((_, ch)) = self.peek() {
                            if ch == '\n' {
                                break;
                            }
                            self.bump();
                        }
                        handled_comment = true;
                    } else if next == '*' {
                        self.bump();
                        self.bump();
                        let mut depth = 1;
                        loop {
                            match self.bump() {
                                Some((_, '/')) => {
                                    if let Some((_, '*')) = self.peek() {
                                        self.bump();
                                        depth += 1;
                                    }
                                }
                                Some((_, '*')) => {
                                    if let Some((_, '/')) = self.peek() {
                                        self.bump();
                                        depth -= 1;
                                        if depth == 0 {
                                            break;
                                        }
                                    }
                                }
                                Some(_) => {}
                                None => {
                                    return Err(Diagnostic::new(
                                        DiagnosticKind::Lex,
                                        "unterminated block comment",
                                    )
                                    .at(comment_pos));
                                }
                            }
                        }
                        handled_comment = true;
                    }
                }
                if !handled_comment {
                    self.peeked = Some((start, '/'));
                }
            }

            if handled_comment {
                progressed = true;
            }

            if !progressed {
                return Ok(());
            }
        }
    }

    fn identifier_or_keyword(&mut self, start: usize, pos: Position) -> Token {
        self.collect_while(start, |ch| ch.is_alphanumeric() || ch == '_');
        let end = self.current;
        let lexeme = self.source[start..end].to_string();
        let kind = keyword_for(&lexeme).unwrap_or(TokenKind::Identifier);
        Token { kind, lexeme, pos }
    }

    fn number_literal(&mut self, start: usize, pos: Position) -> Token {
        let mut end = self.current;
        let mut seen_dot = false;
        while let Some((idx, ch)) = self.peek() {
            match ch {
                '0'..='9' | '_' => {
                    self.bump();
                    end = idx + ch.len_utf8();
                }
                '.' if !seen_dot => {
                    seen_dot = true;
                    self.bump();
                    end = idx + 1;
                }
                'e' | 'E' => {
                    // Only an exponent when digits follow; otherwise the
                    // marker starts the next token.
                    let mut ahead = self.chars.clone();
                    let exponent = match ahead.next() {
                        Some((_, '+' | '-')) => {
                            matches!(ahead.next(), Some((_, '0'..='9')))
                        }
                        Some((_, '0'..='9')) => true,
                        _ => false,
                    };
                    if !exponent {
                        break;
                    }
                    self.bump();
                    end = idx + 1;
                    if let Some((_, sign @ ('+' | '-'))) = self.peek() {
                        self.bump();
                        end += sign.len_utf8();
                    }
                }
                _ => break,
            }
        }
        let lexeme = self.source[start..end].to_string();
        Token {
            kind: TokenKind::Number,
            lexeme,
            pos,
        }
    }

    fn string_literal(&mut self, pos: Position) -> Result<Token, Diagnostic> {
        let mut value = String::new();
        while let Some((_, ch)) = self.bump() {
            match ch {
                '"' => {
                    return Ok(Token {
                        kind: TokenKind::String,
                        lexeme: value,
                        pos,
                    });
                }
                '\\' => {
                    if let Some((_, esc)) = self.bump() {
                        match esc {
                            'n' => value.push('\n'),
                            'r' => value.push('\r'),
                            't' => value.push('\t'),
                            '"' => value.push('"'),
                            '\\' => value.push('\\'),
                            other => value.push(other),
                        }
                    } else {
                        break;
                    }
                }
                _ => value.push(ch),
            }
        }
        Err(Diagnostic::new(DiagnosticKind::Lex, "unterminated string literal").at(pos))
    }

    fn simple_token(&mut self, start: usize, pos: Position, kind: TokenKind) -> Token {
        let end = self.current;
        Token {
            kind,
            lexeme: self.source[start..end].to_string(),
            pos,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments()?;
            let pos = self.pos();
            let (start, ch) = match self.bump() {
                Some(pair) => pair,
                None => {
                    tokens.push(Token {
                        kind: TokenKind::Eof,
                        lexeme: String::new(),
                        pos,
                    });
                    break;
                }
            };

            let token = match ch {
                'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(start, pos),
                '0'..='9' => self.number_literal(start, pos),
                '"' => self.string_literal(pos)?,
                '(' => self.simple_token(start, pos, TokenKind::LParen),
                ')' => self.simple_token(start, pos, TokenKind::RParen),
                '{' => self.simple_token(start, pos, TokenKind::LBrace),
                '}' => self.simple_token(start, pos, TokenKind::RBrace),
                ',' => self.simple_token(start, pos, TokenKind::Comma),
                '.' => self.simple_token(start, pos, TokenKind::Dot),
                ';' => self.simple_token(start, pos, TokenKind::Semicolon),
                '+' => self.simple_token(start, pos, TokenKind::Plus),
                '-' => self.simple_token(start, pos, TokenKind::Minus),
                '*' => self.simple_token(start, pos, TokenKind::Star),
                '/' => self.simple_token(start, pos, TokenKind::Slash),
                '%' => self.simple_token(start, pos, TokenKind::Percent),
                '=' => {
                    if self.match_next('=') {
                        self.simple_token(start, pos, TokenKind::EqualEqual)
                    } else {
                        self.simple_token(start, pos, TokenKind::Assign)
                    }
                }
                '!' => {
                    if self.match_next('=') {
                        self.simple_token(start, pos, TokenKind::BangEqual)
                    } else {
                        self.simple_token(start, pos, TokenKind::Bang)
                    }
                }
                '&' => {
                    if self.match_next('&') {
                        self.simple_token(start, pos, TokenKind::DoubleAmpersand)
                    } else {
                        return Err(Diagnostic::new(
                            DiagnosticKind::Lex,
                            "unrecognized character `&`",
                        )
                        .at(pos));
                    }
                }
                '|' => {
                    if self.match_next('|') {
                        self.simple_token(start, pos, TokenKind::DoublePipe)
                    } else {
                        return Err(Diagnostic::new(
                            DiagnosticKind::Lex,
                            "unrecognized character `|`",
                        )
                        .at(pos));
                    }
                }
                '<' => {
                    if self.match_next('=') {
                        self.simple_token(start, pos, TokenKind::LessEqual)
                    } else {
                        self.simple_token(start, pos, TokenKind::Less)
                    }
                }
                '>' => {
                    if self.match_next('=') {
                        self.simple_token(start, pos, TokenKind::GreaterEqual)
                    } else {
                        self.simple_token(start, pos, TokenKind::Greater)
                    }
                }
                other => {
                    return Err(Diagnostic::new(
                        DiagnosticKind::Lex,
                        format!("unrecognized character `{other}`"),
                    )
                    .at(pos));
                }
            };
            tokens.push(token);
        }
        Ok(tokens)
    }
}

fn keyword_for(ident: &str) -> Option<TokenKind> {
    use self::Keyword as Kw;
    let keyword = match ident {
        "blueprint" => Kw::Blueprint,
        "field" => Kw::Field,
        "law" => Kw::Law,
        "forge" => Kw::Forge,
        "reply" => Kw::Reply,
        "show" => Kw::Show,
        "when" => Kw::When,
        "finfr" => Kw::Finfr,
        "let" => Kw::Let,
        "const" => Kw::Const,
        "if" => Kw::If,
        "else" => Kw::Else,
        "while" => Kw::While,
        "loop" => Kw::Loop,
        "break" => Kw::Break,
        "continue" => Kw::Continue,
        "true" => Kw::True,
        "false" => Kw::False,
        "none" => Kw::None,
        _ => return None,
    };
    Some(TokenKind::Keyword(keyword))
}
