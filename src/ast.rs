use crate::diagnostics::Position;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    None,
    /// The forbidden-state sentinel. An invariant whose body produces it is
    /// violated.
    Finfr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Position,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Variable(String),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        target: Box<Expr>,
        name: String,
    },
    Group(Box<Expr>),
    /// `when <condition>`: produces the sentinel when the condition is
    /// truthy, `none` otherwise.
    Guard(Box<Expr>),
}

/// A defaulted, mutable attribute of a blueprint.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub default: Expr,
    pub pos: Position,
}

/// An invariant checked after every forge call on an instance.
#[derive(Debug, Clone)]
pub struct LawDecl {
    pub name: String,
    pub body: Vec<Stmt>,
    pub pos: Position,
}

/// A mutating operation whose field writes commit only if every law holds
/// afterwards.
#[derive(Debug, Clone)]
pub struct ForgeDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub pos: Position,
}

#[derive(Debug, Clone)]
pub struct BlueprintDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub laws: Vec<LawDecl>,
    pub forges: Vec<ForgeDecl>,
    pub pos: Position,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Let {
        name: String,
        mutable: bool,
        initializer: Option<Expr>,
    },
    Blueprint(BlueprintDecl),
    Expr(Expr),
    Block(Vec<Stmt>),
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    Loop {
        body: Vec<Stmt>,
    },
    Reply(Option<Expr>),
    Show(Expr),
    Break(Option<Expr>),
    Continue,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Position,
}

#[derive(Debug, Clone)]
pub struct Program {
    pub items: Vec<Stmt>,
}
