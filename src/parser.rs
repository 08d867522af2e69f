use crate::{
    ast::{
        BinaryOp, BlueprintDecl, Expr, ExprKind, FieldDecl, ForgeDecl, LawDecl, Literal, Program,
        Stmt, StmtKind, UnaryOp,
    },
    diagnostics::{Diagnostic, DiagnosticKind},
    lexer::{Keyword, Lexer, Token, TokenKind},
};

pub fn parse_program(source: &str) -> Result<Program, Diagnostic> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    fn parse_program(&mut self) -> Result<Program, Diagnostic> {
        let mut items = Vec::new();
        while !self.check(TokenKind::Eof) {
            items.push(self.parse_statement()?);
        }
        Ok(Program { items })
    }

    fn parse_statement(&mut self) -> Result<Stmt, Diagnostic> {
        if let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Keyword(Keyword::Let) => return self.parse_let(true),
                TokenKind::Keyword(Keyword::Const) => return self.parse_let(false),
                TokenKind::Keyword(Keyword::Blueprint) => return self.parse_blueprint(),
                TokenKind::Keyword(Keyword::If) => return self.parse_if(),
                TokenKind::Keyword(Keyword::While) => return self.parse_while(),
                TokenKind::Keyword(Keyword::Loop) => return self.parse_loop(),
                TokenKind::Keyword(Keyword::Reply) => return self.parse_reply(),
                TokenKind::Keyword(Keyword::Show) => return self.parse_show(),
                TokenKind::Keyword(Keyword::Break) => return self.parse_break(),
                TokenKind::Keyword(Keyword::Continue) => return self.parse_continue(),
                TokenKind::LBrace => {
                    let pos = token.pos;
                    let body = self.parse_block()?;
                    return Ok(Stmt {
                        kind: StmtKind::Block(body),
                        pos,
                    });
                }
                _ => {}
            }
        }
        self.parse_expression_statement()
    }

    fn parse_let(&mut self, mutable: bool) -> Result<Stmt, Diagnostic> {
        let keyword = if mutable { Keyword::Let } else { Keyword::Const };
        let pos = self.consume_keyword(keyword)?.pos;
        let name_token = self.consume_identifier("expected variable name")?;
        let initializer = if self.matches(TokenKind::Assign) {
            Some(self.parse_expression()?)
        } else if mutable {
            None
        } else {
            return Err(self
                .peek()
                .map(|tok| self.error(tok, "expected `=` in constant declaration"))
                .unwrap_or_else(|| self.error_eof("expected `=` in constant declaration")));
        };
        self.consume_optional_semicolon();
        Ok(Stmt {
            kind: StmtKind::Let {
                name: name_token.lexeme.clone(),
                mutable,
                initializer,
            },
            pos,
        })
    }

    fn parse_blueprint(&mut self) -> Result<Stmt, Diagnostic> {
        let pos = self.consume_keyword(Keyword::Blueprint)?.pos;
        let name_token = self.consume_identifier("expected blueprint name")?;
        let name = name_token.lexeme.clone();
        self.consume(TokenKind::LBrace, "expected `{` after blueprint name")?;

        let mut fields: Vec<FieldDecl> = Vec::new();
        let mut laws: Vec<LawDecl> = Vec::new();
        let mut forges: Vec<ForgeDecl> = Vec::new();
        let mut seen: Vec<String> = Vec::new();

        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            if self.matches_keyword(Keyword::Field) {
                let field_token = self.consume_identifier("expected field name")?;
                self.consume(TokenKind::Assign, "expected `=` after field name")?;
                let default = self.parse_expression()?;
                self.consume_optional_semicolon();
                self.check_member_unique(&mut seen, &field_token, &name)?;
                fields.push(FieldDecl {
                    name: field_token.lexeme.clone(),
                    default,
                    pos: field_token.pos,
                });
            } else if self.matches_keyword(Keyword::Law) {
                let law_token = self.consume_identifier("expected law name")?;
                let body = self.parse_block()?;
                self.check_member_unique(&mut seen, &law_token, &name)?;
                laws.push(LawDecl {
                    name: law_token.lexeme.clone(),
                    body,
                    pos: law_token.pos,
                });
            } else if self.matches_keyword(Keyword::Forge) {
                let forge_token = self.consume_identifier("expected forge name")?;
                self.consume(TokenKind::LParen, "expected `(` after forge name")?;
                let mut params = Vec::new();
                if !self.check(TokenKind::RParen) {
                    loop {
                        let param = self.consume_identifier("expected parameter name")?;
                        params.push(param.lexeme.clone());
                        if !self.matches(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::RParen, "expected `)` after parameters")?;
                let body = self.parse_block()?;
                self.check_member_unique(&mut seen, &forge_token, &name)?;
                forges.push(ForgeDecl {
                    name: forge_token.lexeme.clone(),
                    params,
                    body,
                    pos: forge_token.pos,
                });
            } else {
                return Err(self
                    .peek()
                    .map(|tok| {
                        self.error(tok, "expected `field`, `law`, or `forge` in blueprint body")
                    })
                    .unwrap_or_else(|| self.error_eof("unexpected end of blueprint body")));
            }
        }
        self.consume(TokenKind::RBrace, "expected `}` to close blueprint")?;

        Ok(Stmt {
            kind: StmtKind::Blueprint(BlueprintDecl {
                name,
                fields,
                laws,
                forges,
                pos,
            }),
            pos,
        })
    }

    fn check_member_unique(
        &self,
        seen: &mut Vec<String>,
        token: &Token,
        blueprint: &str,
    ) -> Result<(), Diagnostic> {
        if seen.iter().any(|name| name == &token.lexeme) {
            return Err(Diagnostic::new(
                DiagnosticKind::Parse,
                format!(
                    "duplicate member `{}` in blueprint `{blueprint}`",
                    token.lexeme
                ),
            )
            .at(token.pos));
        }
        seen.push(token.lexeme.clone());
        Ok(())
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, Diagnostic> {
        self.consume(TokenKind::LBrace, "expected `{` to start block")?;
        let mut items = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            items.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RBrace, "expected `}` to close block")?;
        Ok(items)
    }

    fn parse_if(&mut self) -> Result<Stmt, Diagnostic> {
        let pos = self.consume_keyword(Keyword::If)?.pos;
        let condition = self.parse_expression()?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.matches_keyword(Keyword::Else) {
            if self.check(TokenKind::Keyword(Keyword::If)) {
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt {
            kind: StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            pos,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, Diagnostic> {
        let pos = self.consume_keyword(Keyword::While)?.pos;
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Stmt {
            kind: StmtKind::While { condition, body },
            pos,
        })
    }

    fn parse_loop(&mut self) -> Result<Stmt, Diagnostic> {
        let pos = self.consume_keyword(Keyword::Loop)?.pos;
        let body = self.parse_block()?;
        Ok(Stmt {
            kind: StmtKind::Loop { body },
            pos,
        })
    }

    fn parse_reply(&mut self) -> Result<Stmt, Diagnostic> {
        let token = self.consume_keyword(Keyword::Reply)?;
        let expr = if self.check(TokenKind::Semicolon)
            || self.check(TokenKind::RBrace)
            || self.check(TokenKind::Eof)
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_optional_semicolon();
        Ok(Stmt {
            kind: StmtKind::Reply(expr),
            pos: token.pos,
        })
    }

    fn parse_show(&mut self) -> Result<Stmt, Diagnostic> {
        let token = self.consume_keyword(Keyword::Show)?;
        let expr = self.parse_expression()?;
        self.consume_optional_semicolon();
        Ok(Stmt {
            kind: StmtKind::Show(expr),
            pos: token.pos,
        })
    }

    fn parse_break(&mut self) -> Result<Stmt, Diagnostic> {
        let token = self.consume_keyword(Keyword::Break)?;
        let expr = if self.check(TokenKind::Semicolon)
            || self.check(TokenKind::RBrace)
            || self.check(TokenKind::Eof)
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_optional_semicolon();
        Ok(Stmt {
            kind: StmtKind::Break(expr),
            pos: token.pos,
        })
    }

    fn parse_continue(&mut self) -> Result<Stmt, Diagnostic> {
        let token = self.consume_keyword(Keyword::Continue)?;
        self.consume_optional_semicolon();
        Ok(Stmt {
            kind: StmtKind::Continue,
            pos: token.pos,
        })
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let expr = self.parse_expression()?;
        self.consume_optional_semicolon();
        Ok(Stmt {
            pos: expr.pos,
            kind: StmtKind::Expr(expr),
        })
    }

    fn parse_expression(&mut self) -> Result<Expr, Diagnostic> {
        if self.matches_keyword(Keyword::When) {
            let pos = self.previous().pos;
            let condition = self.parse_expression()?;
            return Ok(Expr {
                kind: ExprKind::Guard(Box::new(condition)),
                pos,
            });
        }
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, Diagnostic> {
        let expr = self.parse_or()?;
        if self.matches(TokenKind::Assign) {
            let equals = self.previous().pos;
            let value = self.parse_assignment()?;
            match expr.kind {
                ExprKind::Variable(_) | ExprKind::Member { .. } => Ok(Expr {
                    pos: expr.pos,
                    kind: ExprKind::Assign {
                        target: Box::new(expr),
                        value: Box::new(value),
                    },
                }),
                _ => Err(
                    Diagnostic::new(DiagnosticKind::Parse, "invalid assignment target").at(equals)
                ),
            }
        } else {
            Ok(expr)
        }
    }

    fn parse_or(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_and()?;
        while self.matches(TokenKind::DoublePipe) {
            let right = self.parse_and()?;
            expr = binary(BinaryOp::Or, expr, right);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_equality()?;
        while self.matches(TokenKind::DoubleAmpersand) {
            let right = self.parse_equality()?;
            expr = binary(BinaryOp::And, expr, right);
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_comparison()?;
        loop {
            if self.matches(TokenKind::EqualEqual) {
                let right = self.parse_comparison()?;
                expr = binary(BinaryOp::Equal, expr, right);
            } else if self.matches(TokenKind::BangEqual) {
                let right = self.parse_comparison()?;
                expr = binary(BinaryOp::NotEqual, expr, right);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_term()?;
        while let Some(op) = if self.matches(TokenKind::LessEqual) {
            Some(BinaryOp::LessEqual)
        } else if self.matches(TokenKind::GreaterEqual) {
            Some(BinaryOp::GreaterEqual)
        } else if self.matches(TokenKind::Less) {
            Some(BinaryOp::Less)
        } else if self.matches(TokenKind::Greater) {
            Some(BinaryOp::Greater)
        } else {
            None
        } {
            let right = self.parse_term()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_factor()?;
        loop {
            if self.matches(TokenKind::Plus) {
                let right = self.parse_factor()?;
                expr = binary(BinaryOp::Add, expr, right);
            } else if self.matches(TokenKind::Minus) {
                let right = self.parse_factor()?;
                expr = binary(BinaryOp::Sub, expr, right);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_unary()?;
        loop {
            if self.matches(TokenKind::Star) {
                let right = self.parse_unary()?;
                expr = binary(BinaryOp::Mul, expr, right);
            } else if self.matches(TokenKind::Slash) {
                let right = self.parse_unary()?;
                expr = binary(BinaryOp::Div, expr, right);
            } else if self.matches(TokenKind::Percent) {
                let right = self.parse_unary()?;
                expr = binary(BinaryOp::Mod, expr, right);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, Diagnostic> {
        if self.matches(TokenKind::Minus) {
            let pos = self.previous().pos;
            let right = self.parse_unary()?;
            Ok(Expr {
                pos,
                kind: ExprKind::Unary {
                    op: UnaryOp::Negate,
                    expr: Box::new(right),
                },
            })
        } else if self.matches(TokenKind::Bang) {
            let pos = self.previous().pos;
            let right = self.parse_unary()?;
            Ok(Expr {
                pos,
                kind: ExprKind::Unary {
                    op: UnaryOp::Not,
                    expr: Box::new(right),
                },
            })
        } else {
            self.parse_call()
        }
    }

    fn parse_call(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.matches(TokenKind::LParen) {
                let mut args = Vec::new();
                if !self.check(TokenKind::RParen) {
                    loop {
                        args.push(self.parse_expression()?);
                        if !self.matches(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::RParen, "expected `)` after arguments")?;
                expr = Expr {
                    pos: expr.pos,
                    kind: ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                };
            } else if self.matches(TokenKind::Dot) {
                let ident = self.consume_identifier("expected member name after `.`")?;
                expr = Expr {
                    pos: expr.pos,
                    kind: ExprKind::Member {
                        target: Box::new(expr),
                        name: ident.lexeme.clone(),
                    },
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        if let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Keyword(Keyword::True) => {
                    let tok = self.advance();
                    Ok(Expr {
                        pos: tok.pos,
                        kind: ExprKind::Literal(Literal::Bool(true)),
                    })
                }
                TokenKind::Keyword(Keyword::False) => {
                    let tok = self.advance();
                    Ok(Expr {
                        pos: tok.pos,
                        kind: ExprKind::Literal(Literal::Bool(false)),
                    })
                }
                TokenKind::Keyword(Keyword::None) => {
                    let tok = self.advance();
                    Ok(Expr {
                        pos: tok.pos,
                        kind: ExprKind::Literal(Literal::None),
                    })
                }
                TokenKind::Keyword(Keyword::Finfr) => {
                    let tok = self.advance();
                    Ok(Expr {
                        pos: tok.pos,
                        kind: ExprKind::Literal(Literal::Finfr),
                    })
                }
                TokenKind::Number => {
                    let tok = self.advance();
                    let digits = tok.lexeme.replace('_', "");
                    let literal = if tok.lexeme.contains(['.', 'e', 'E']) {
                        digits.parse().ok().map(Literal::Float)
                    } else {
                        digits.parse().ok().map(Literal::Int)
                    };
                    let literal = literal.ok_or_else(|| {
                        Diagnostic::new(
                            DiagnosticKind::Parse,
                            format!("numeric literal `{}` is out of range", tok.lexeme),
                        )
                        .at(tok.pos)
                    })?;
                    Ok(Expr {
                        pos: tok.pos,
                        kind: ExprKind::Literal(literal),
                    })
                }
                TokenKind::String => {
                    let tok = self.advance();
                    Ok(Expr {
                        pos: tok.pos,
                        kind: ExprKind::Literal(Literal::String(tok.lexeme.clone())),
                    })
                }
                TokenKind::Identifier => {
                    let tok = self.advance();
                    Ok(Expr {
                        pos: tok.pos,
                        kind: ExprKind::Variable(tok.lexeme.clone()),
                    })
                }
                TokenKind::LParen => {
                    let lparen = self.advance();
                    let inner = self.parse_expression()?;
                    self.consume(TokenKind::RParen, "expected `)` after expression")?;
                    Ok(Expr {
                        pos: lparen.pos,
                        kind: ExprKind::Group(Box::new(inner)),
                    })
                }
                _ => Err(self.error(token, "unexpected token in expression")),
            }
        } else {
            Err(self.error_eof("unexpected end of expression"))
        }
    }

    fn consume_optional_semicolon(&mut self) {
        let _ = self.matches(TokenKind::Semicolon);
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn matches_keyword(&mut self, keyword: Keyword) -> bool {
        if let Some(Token {
            kind: TokenKind::Keyword(k),
            ..
        }) = self.peek()
        {
            if *k == keyword {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, Diagnostic> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self
                .peek()
                .map(|tok| self.error(tok, message))
                .unwrap_or_else(|| self.error_eof(message)))
        }
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> Result<Token, Diagnostic> {
        if let Some(token) = self.peek() {
            if token.kind == TokenKind::Keyword(keyword) {
                Ok(self.advance())
            } else {
                Err(self.error(token, &format!("expected keyword `{keyword:?}`")))
            }
        } else {
            Err(self.error_eof("unexpected end of input"))
        }
    }

    fn consume_identifier(&mut self, message: &str) -> Result<Token, Diagnostic> {
        if self.check(TokenKind::Identifier) {
            Ok(self.advance())
        } else {
            Err(self
                .peek()
                .map(|tok| self.error(tok, message))
                .unwrap_or_else(|| self.error_eof(message)))
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        if let Some(token) = self.peek() {
            token.kind == kind
        } else {
            false
        }
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Eof) | None)
    }

    fn error(&self, token: &Token, message: &str) -> Diagnostic {
        let found = match &token.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("`{}`", token.lexeme),
        };
        Diagnostic::new(DiagnosticKind::Parse, format!("{message}, found {found}")).at(token.pos)
    }

    fn error_eof(&self, message: &str) -> Diagnostic {
        let diag = Diagnostic::new(DiagnosticKind::Parse, message.to_string());
        match self.tokens.last() {
            Some(token) => diag.at(token.pos),
            None => diag,
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr {
        pos: left.pos,
        kind: ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
    }
}
