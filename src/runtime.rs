use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    ast::{BinaryOp, Expr, ExprKind, ForgeDecl, LawDecl, Literal, Program, Stmt, StmtKind, UnaryOp},
    diagnostics::{Diagnostic, DiagnosticKind, Position, Result, TinyTalkError},
    environment::{Environment, EnvironmentRef},
    parser,
    value::{Blueprint, BoundMember, BoundOp, Instance, InstanceRef, MemberKind, Value, ValueKind},
};

/// Host-imposed evaluation bounds. Exhausting a bound aborts the run with
/// an error outside the language's own diagnostic taxonomy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionLimits {
    pub max_steps: Option<u64>,
}

/// Result of a complete run: buffered `show` output in call order, the
/// terminal value when the run succeeded, and the error when it did not.
pub struct RunOutcome {
    pub output: Vec<String>,
    pub terminal: Option<Value>,
    pub error: Option<TinyTalkError>,
}

pub fn run(source: &str) -> RunOutcome {
    run_with_limits(source, ExecutionLimits::default())
}

pub fn run_with_limits(source: &str, limits: ExecutionLimits) -> RunOutcome {
    let program = match parser::parse_program(source) {
        Ok(program) => program,
        Err(diag) => {
            return RunOutcome {
                output: Vec::new(),
                terminal: None,
                error: Some(diag.into()),
            };
        }
    };
    let mut interpreter = Interpreter::with_limits(limits);
    match interpreter.eval_program(&program) {
        Ok(value) => RunOutcome {
            output: interpreter.drain_output(),
            terminal: Some(value),
            error: None,
        },
        Err(err) => RunOutcome {
            output: interpreter.drain_output(),
            terminal: None,
            error: Some(err),
        },
    }
}

pub struct Interpreter {
    env: EnvironmentRef,
    output: Vec<String>,
    /// Receivers of forge calls currently in their apply phase, innermost
    /// last. Field writes are only legal on the innermost entry.
    receivers: Vec<InstanceRef>,
    limits: ExecutionLimits,
    steps: u64,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_limits(ExecutionLimits::default())
    }

    pub fn with_limits(limits: ExecutionLimits) -> Self {
        Self {
            env: Environment::new(),
            output: Vec::new(),
            receivers: Vec::new(),
            limits,
            steps: 0,
        }
    }

    pub fn eval_source(&mut self, source: &str) -> Result<Value> {
        let program = parser::parse_program(source).map_err(TinyTalkError::from)?;
        self.eval_program(&program)
    }

    pub fn eval_program(&mut self, program: &Program) -> Result<Value> {
        let mut last_value: Option<Value> = None;
        for stmt in &program.items {
            match self.execute_statement(stmt)? {
                FlowControl::Next => {}
                FlowControl::NextValue(value) => {
                    last_value = Some(value);
                }
                FlowControl::Reply(value) => return Ok(value),
                FlowControl::Break(_) => {
                    return Err(TinyTalkError::from(
                        Diagnostic::new(DiagnosticKind::Type, "`break` outside loop").at(stmt.pos),
                    ));
                }
                FlowControl::Continue => {
                    return Err(TinyTalkError::from(
                        Diagnostic::new(DiagnosticKind::Type, "`continue` outside loop")
                            .at(stmt.pos),
                    ));
                }
            }
        }
        Ok(last_value.unwrap_or_else(Value::none))
    }

    /// Takes the `show` output buffered since the last drain.
    pub fn drain_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    fn tick(&mut self) -> Result<()> {
        self.steps += 1;
        if let Some(max) = self.limits.max_steps {
            if self.steps > max {
                return Err(TinyTalkError::Budget { steps: max });
            }
        }
        Ok(())
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> Result<FlowControl> {
        self.tick()?;
        match &stmt.kind {
            StmtKind::Let {
                name,
                mutable,
                initializer,
            } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::none(),
                };
                self.env.borrow_mut().define(name.clone(), value, *mutable);
                Ok(FlowControl::Next)
            }
            StmtKind::Blueprint(decl) => {
                let blueprint = Blueprint::new(Rc::new(decl.clone()), Rc::clone(&self.env));
                self.env.borrow_mut().define(
                    decl.name.clone(),
                    Value::new(ValueKind::Blueprint(blueprint)),
                    false,
                );
                Ok(FlowControl::Next)
            }
            StmtKind::Expr(expr) => {
                let value = self.evaluate(expr)?;
                Ok(FlowControl::NextValue(value))
            }
            StmtKind::Block(statements) => self.execute_block(statements),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute_block(then_branch)
                } else if let Some(branch) = else_branch {
                    self.execute_block(branch)
                } else {
                    Ok(FlowControl::Next)
                }
            }
            StmtKind::While { condition, body } => {
                loop {
                    if !self.evaluate(condition)?.is_truthy() {
                        break;
                    }
                    match self.execute_block(body)? {
                        FlowControl::Next | FlowControl::NextValue(_) => {}
                        FlowControl::Continue => continue,
                        FlowControl::Break(None) => break,
                        FlowControl::Break(Some(value)) => {
                            return Ok(FlowControl::NextValue(value));
                        }
                        FlowControl::Reply(value) => return Ok(FlowControl::Reply(value)),
                    }
                }
                Ok(FlowControl::Next)
            }
            StmtKind::Loop { body } => {
                loop {
                    match self.execute_block(body)? {
                        FlowControl::Next | FlowControl::NextValue(_) => {}
                        FlowControl::Continue => continue,
                        FlowControl::Break(None) => break,
                        FlowControl::Break(Some(value)) => {
                            return Ok(FlowControl::NextValue(value));
                        }
                        FlowControl::Reply(value) => return Ok(FlowControl::Reply(value)),
                    }
                }
                Ok(FlowControl::Next)
            }
            StmtKind::Reply(expr) => {
                let value = match expr {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::none(),
                };
                Ok(FlowControl::Reply(value))
            }
            StmtKind::Show(expr) => {
                let value = self.evaluate(expr)?;
                self.output.push(value.to_string());
                Ok(FlowControl::Next)
            }
            StmtKind::Break(expr) => {
                let value = match expr {
                    Some(expr) => Some(self.evaluate(expr)?),
                    None => None,
                };
                Ok(FlowControl::Break(value))
            }
            StmtKind::Continue => Ok(FlowControl::Continue),
        }
    }

    fn execute_block(&mut self, statements: &[Stmt]) -> Result<FlowControl> {
        self.tick()?;
        let child = Environment::with_parent(Rc::clone(&self.env));
        let prev = std::mem::replace(&mut self.env, child);
        let mut last_value: Option<Value> = None;
        for stmt in statements {
            let flow = match self.execute_statement(stmt) {
                Ok(flow) => flow,
                Err(err) => {
                    self.env = prev;
                    return Err(err);
                }
            };
            match flow {
                FlowControl::Next => {}
                FlowControl::NextValue(value) => {
                    last_value = Some(value);
                }
                other => {
                    self.env = prev;
                    return Ok(other);
                }
            }
        }
        self.env = prev;
        if let Some(value) = last_value {
            Ok(FlowControl::NextValue(value))
        } else {
            Ok(FlowControl::Next)
        }
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        self.tick()?;
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(self.literal(lit)),
            ExprKind::Variable(name) => Environment::get(&self.env, name, expr.pos),
            ExprKind::Binary { op, left, right } => {
                let left_value = self.evaluate(left)?;
                match op {
                    BinaryOp::And if !left_value.is_truthy() => Ok(Value::bool(false)),
                    BinaryOp::Or if left_value.is_truthy() => Ok(Value::bool(true)),
                    _ => {
                        let right_value = self.evaluate(right)?;
                        self.binary(*op, left_value, right_value, expr.pos)
                    }
                }
            }
            ExprKind::Unary { op, expr: right } => {
                let value = self.evaluate(right)?;
                self.unary(*op, value, expr.pos)
            }
            ExprKind::Assign { target, value } => {
                let value = self.evaluate(value)?;
                match &target.kind {
                    ExprKind::Variable(name) => {
                        Environment::assign(&self.env, name, value.clone(), target.pos)?;
                        Ok(value)
                    }
                    ExprKind::Member {
                        target: owner,
                        name,
                    } => {
                        self.assign_field(owner, name, value.clone(), target.pos)?;
                        Ok(value)
                    }
                    _ => Err(TinyTalkError::from(
                        Diagnostic::new(DiagnosticKind::Type, "invalid assignment target")
                            .at(target.pos),
                    )),
                }
            }
            ExprKind::Call { callee, args } => {
                let callee_value = self.evaluate(callee)?;
                let mut eval_args = Vec::new();
                for arg in args {
                    eval_args.push(self.evaluate(arg)?);
                }
                self.call(callee_value, eval_args, expr.pos)
            }
            ExprKind::Member { target, name } => {
                let target_value = self.evaluate(target)?;
                self.member(target_value, name, expr.pos)
            }
            ExprKind::Group(inner) => self.evaluate(inner),
            ExprKind::Guard(condition) => {
                let value = self.evaluate(condition)?;
                if value.is_truthy() {
                    Ok(Value::finfr())
                } else {
                    Ok(Value::none())
                }
            }
        }
    }

    fn literal(&self, literal: &Literal) -> Value {
        match literal {
            Literal::Int(n) => Value::int(*n),
            Literal::Float(n) => Value::float(*n),
            Literal::Bool(b) => Value::bool(*b),
            Literal::String(s) => Value::string(s.clone()),
            Literal::None => Value::none(),
            Literal::Finfr => Value::finfr(),
        }
    }

    fn binary(&self, op: BinaryOp, left: Value, right: Value, pos: Position) -> Result<Value> {
        use BinaryOp::*;
        match op {
            Add => {
                if matches!(&*left.0, ValueKind::String(_))
                    || matches!(&*right.0, ValueKind::String(_))
                {
                    Ok(Value::string(format!("{left}{right}")))
                } else {
                    self.numeric(left, right, pos, |a, b| a + b)
                }
            }
            Sub => self.numeric(left, right, pos, |a, b| a - b),
            Mul => self.numeric(left, right, pos, |a, b| a * b),
            Div => {
                self.check_zero_divisor(&right, pos)?;
                self.numeric(left, right, pos, |a, b| a / b)
            }
            Mod => {
                self.check_zero_divisor(&right, pos)?;
                self.numeric(left, right, pos, |a, b| a % b)
            }
            Equal => Ok(Value::bool(self.equal(&left, &right))),
            NotEqual => Ok(Value::bool(!self.equal(&left, &right))),
            Less => self.comparison(left, right, pos, |a, b| a < b),
            LessEqual => self.comparison(left, right, pos, |a, b| a <= b),
            Greater => self.comparison(left, right, pos, |a, b| a > b),
            GreaterEqual => self.comparison(left, right, pos, |a, b| a >= b),
            // The caller short-circuits on the left operand; `&&`/`||` only
            // reach here when the right side decides the result.
            And | Or => Ok(Value::bool(right.is_truthy())),
        }
    }

    fn unary(&self, op: UnaryOp, value: Value, pos: Position) -> Result<Value> {
        match op {
            UnaryOp::Negate => match &*value.0 {
                ValueKind::Int(n) => Ok(Value::int(-n)),
                ValueKind::Float(n) => Ok(Value::float(-n)),
                _ => Err(TinyTalkError::from(
                    Diagnostic::new(DiagnosticKind::Type, "unary `-` expects a numeric value")
                        .at(pos),
                )),
            },
            UnaryOp::Not => Ok(Value::bool(!value.is_truthy())),
        }
    }

    fn member(&mut self, target: Value, name: &str, pos: Position) -> Result<Value> {
        match &*target.0 {
            ValueKind::Instance(instance) => match instance.blueprint.member(name) {
                Some(MemberKind::Field(_)) => {
                    instance.field(name).ok_or_else(|| {
                        TinyTalkError::from(
                            Diagnostic::new(
                                DiagnosticKind::Name,
                                format!(
                                    "no field `{name}` on `{}`",
                                    instance.blueprint.name
                                ),
                            )
                            .at(pos),
                        )
                    })
                }
                Some(MemberKind::Law(idx)) => {
                    Ok(Value::new(ValueKind::BoundOp(BoundOp {
                        receiver: Rc::clone(instance),
                        member: BoundMember::Law(idx),
                    })))
                }
                Some(MemberKind::Forge(idx)) => {
                    Ok(Value::new(ValueKind::BoundOp(BoundOp {
                        receiver: Rc::clone(instance),
                        member: BoundMember::Forge(idx),
                    })))
                }
                None => Err(TinyTalkError::from(
                    Diagnostic::new(
                        DiagnosticKind::Name,
                        format!("no member `{name}` on `{}`", instance.blueprint.name),
                    )
                    .at(pos),
                )),
            },
            _ => Err(TinyTalkError::from(
                Diagnostic::new(
                    DiagnosticKind::Type,
                    format!(
                        "member access expects an instance, found {}",
                        target.type_name()
                    ),
                )
                .at(pos),
            )),
        }
    }

    fn assign_field(
        &mut self,
        owner: &Expr,
        name: &str,
        value: Value,
        pos: Position,
    ) -> Result<()> {
        let owner_value = self.evaluate(owner)?;
        let instance = match &*owner_value.0 {
            ValueKind::Instance(instance) => Rc::clone(instance),
            _ => {
                return Err(TinyTalkError::from(
                    Diagnostic::new(
                        DiagnosticKind::Type,
                        format!(
                            "field assignment expects an instance, found {}",
                            owner_value.type_name()
                        ),
                    )
                    .at(pos),
                ));
            }
        };
        match instance.blueprint.member(name) {
            Some(MemberKind::Field(_)) => {}
            Some(_) => {
                return Err(TinyTalkError::from(
                    Diagnostic::new(
                        DiagnosticKind::Type,
                        format!("`{name}` on `{}` is not a field", instance.blueprint.name),
                    )
                    .at(pos),
                ));
            }
            None => {
                return Err(TinyTalkError::from(
                    Diagnostic::new(
                        DiagnosticKind::Name,
                        format!("no field `{name}` on `{}`", instance.blueprint.name),
                    )
                    .at(pos),
                ));
            }
        }
        if value.is_finfr() {
            return Err(TinyTalkError::from(
                Diagnostic::new(
                    DiagnosticKind::Type,
                    "the forbidden-state sentinel cannot be stored in a field",
                )
                .at(pos),
            ));
        }
        let writable = self
            .receivers
            .last()
            .map(|receiver| Rc::ptr_eq(receiver, &instance))
            .unwrap_or(false);
        if !writable {
            return Err(TinyTalkError::from(
                Diagnostic::new(
                    DiagnosticKind::Type,
                    "fields may only be written by a forge acting on its own receiver",
                )
                .at(pos),
            ));
        }
        instance
            .fields
            .borrow_mut()
            .insert(name.to_string(), value);
        Ok(())
    }

    fn call(&mut self, callee: Value, args: Vec<Value>, pos: Position) -> Result<Value> {
        match &*callee.0 {
            ValueKind::Blueprint(blueprint) => self.construct(Rc::clone(blueprint), args, pos),
            ValueKind::BoundOp(bound) => match bound.member {
                BoundMember::Forge(idx) => {
                    self.call_forge(Rc::clone(&bound.receiver), idx, args, pos)
                }
                BoundMember::Law(idx) => {
                    if !args.is_empty() {
                        let law = &bound.receiver.blueprint.decl.laws[idx];
                        return Err(TinyTalkError::from(
                            Diagnostic::new(
                                DiagnosticKind::Type,
                                format!("law `{}` takes no arguments", law.name),
                            )
                            .at(pos),
                        ));
                    }
                    self.call_law(Rc::clone(&bound.receiver), idx)
                }
            },
            _ => Err(TinyTalkError::from(
                Diagnostic::new(
                    DiagnosticKind::Type,
                    format!("value of type {} is not callable", callee.type_name()),
                )
                .at(pos),
            )),
        }
    }

    /// Builds an instance, taking positional arguments over the field
    /// defaults in declaration order.
    fn construct(
        &mut self,
        blueprint: Rc<Blueprint>,
        args: Vec<Value>,
        pos: Position,
    ) -> Result<Value> {
        let decl = Rc::clone(&blueprint.decl);
        if args.len() > decl.fields.len() {
            return Err(TinyTalkError::from(
                Diagnostic::new(
                    DiagnosticKind::Type,
                    format!(
                        "blueprint `{}` has {} fields but received {} arguments",
                        decl.name,
                        decl.fields.len(),
                        args.len()
                    ),
                )
                .at(pos),
            ));
        }
        let defaults_env = Environment::with_parent(Rc::clone(&blueprint.env));
        let prev = std::mem::replace(&mut self.env, defaults_env);
        let mut fields = IndexMap::new();
        let mut failure = None;
        for (idx, field) in decl.fields.iter().enumerate() {
            let value = if idx < args.len() {
                args[idx].clone()
            } else {
                match self.evaluate(&field.default) {
                    Ok(value) => value,
                    Err(err) => {
                        failure = Some(err);
                        break;
                    }
                }
            };
            if value.is_finfr() {
                failure = Some(TinyTalkError::from(
                    Diagnostic::new(
                        DiagnosticKind::Type,
                        "the forbidden-state sentinel cannot be stored in a field",
                    )
                    .at(pos),
                ));
                break;
            }
            fields.insert(field.name.clone(), value);
        }
        self.env = prev;
        if let Some(err) = failure {
            return Err(err);
        }
        let instance = Instance::new(blueprint, fields);
        Ok(Value::new(ValueKind::Instance(instance)))
    }

    /// Evaluates a law body against an instance. Reading a law never
    /// snapshots; its result is the body's reply or trailing value.
    fn call_law(&mut self, receiver: InstanceRef, idx: usize) -> Result<Value> {
        let decl = Rc::clone(&receiver.blueprint.decl);
        let law: &LawDecl = &decl.laws[idx];
        let body_env = Environment::with_parent(Rc::clone(&receiver.blueprint.env));
        body_env.borrow_mut().define(
            "self".to_string(),
            Value::new(ValueKind::Instance(Rc::clone(&receiver))),
            false,
        );
        let prev = std::mem::replace(&mut self.env, body_env);
        let result = self.run_call_body(&law.body);
        self.env = prev;
        result
    }

    /// The transactional protocol for every forge call: snapshot the
    /// receiver's fields, apply the body optimistically, check each law in
    /// declaration order, then commit or roll back. Rollback also discards
    /// `show` output produced during the body, so a rejected call has no
    /// observable side effect.
    fn call_forge(
        &mut self,
        receiver: InstanceRef,
        idx: usize,
        args: Vec<Value>,
        pos: Position,
    ) -> Result<Value> {
        let decl = Rc::clone(&receiver.blueprint.decl);
        let forge: &ForgeDecl = &decl.forges[idx];
        if args.len() != forge.params.len() {
            return Err(TinyTalkError::from(
                Diagnostic::new(
                    DiagnosticKind::Type,
                    format!(
                        "forge `{}` expected {} arguments but received {}",
                        forge.name,
                        forge.params.len(),
                        args.len()
                    ),
                )
                .at(pos),
            ));
        }

        let snapshot = receiver.snapshot();
        let output_mark = self.output.len();

        let body_env = Environment::with_parent(Rc::clone(&receiver.blueprint.env));
        {
            let mut scope = body_env.borrow_mut();
            scope.define(
                "self".to_string(),
                Value::new(ValueKind::Instance(Rc::clone(&receiver))),
                false,
            );
            for (name, value) in forge.params.iter().zip(args) {
                scope.define(name.clone(), value, true);
            }
        }

        self.receivers.push(Rc::clone(&receiver));
        let prev = std::mem::replace(&mut self.env, body_env);
        let applied = self.run_call_body(&forge.body);
        self.env = prev;
        self.receivers.pop();

        // Any fault during apply rolls this receiver back, except a nested
        // call's own violation: that call already restored its receiver, and
        // re-restoring here would undo writes the nested protocol never
        // touched.
        let result = match applied {
            Ok(value) => value,
            Err(err) => {
                if !err.is_invariant_violation() {
                    receiver.restore(snapshot);
                    self.output.truncate(output_mark);
                }
                return Err(err);
            }
        };

        for (law_idx, law) in decl.laws.iter().enumerate() {
            let verdict = match self.call_law(Rc::clone(&receiver), law_idx) {
                Ok(verdict) => verdict,
                Err(err) => {
                    if !err.is_invariant_violation() {
                        receiver.restore(snapshot);
                        self.output.truncate(output_mark);
                    }
                    return Err(err);
                }
            };
            if verdict.is_finfr() {
                receiver.restore(snapshot);
                self.output.truncate(output_mark);
                return Err(TinyTalkError::from(
                    Diagnostic::new(
                        DiagnosticKind::InvariantViolation,
                        format!(
                            "forge `{}` violated law `{}` on `{}`",
                            forge.name, law.name, decl.name
                        ),
                    )
                    .at(pos),
                ));
            }
        }

        Ok(result)
    }

    /// Runs a law/forge body to completion. `reply` converts into the
    /// call's result here and never escapes further.
    fn run_call_body(&mut self, body: &[Stmt]) -> Result<Value> {
        let mut result = Value::none();
        for stmt in body {
            match self.execute_statement(stmt)? {
                FlowControl::Next => {}
                FlowControl::NextValue(value) => {
                    result = value;
                }
                FlowControl::Reply(value) => return Ok(value),
                FlowControl::Break(_) | FlowControl::Continue => {
                    return Err(TinyTalkError::from(
                        Diagnostic::new(
                            DiagnosticKind::Type,
                            "loop control flow cannot escape a call",
                        )
                        .at(stmt.pos),
                    ));
                }
            }
        }
        Ok(result)
    }

    fn numeric<F>(&self, left: Value, right: Value, pos: Position, func: F) -> Result<Value>
    where
        F: Fn(f64, f64) -> f64,
    {
        let left_num = self.number(&left, pos)?;
        let right_num = self.number(&right, pos)?;
        let result = func(left_num, right_num);
        if left.is_int() && right.is_int() && result.fract() == 0.0 {
            Ok(Value::int(result as i64))
        } else {
            Ok(Value::float(result))
        }
    }

    fn check_zero_divisor(&self, right: &Value, pos: Position) -> Result<()> {
        if matches!(&*right.0, ValueKind::Int(0)) {
            return Err(TinyTalkError::from(
                Diagnostic::new(DiagnosticKind::Type, "division by zero").at(pos),
            ));
        }
        Ok(())
    }

    fn comparison<F>(&self, left: Value, right: Value, pos: Position, cmp: F) -> Result<Value>
    where
        F: Fn(f64, f64) -> bool,
    {
        let left_num = self.number(&left, pos)?;
        let right_num = self.number(&right, pos)?;
        Ok(Value::bool(cmp(left_num, right_num)))
    }

    fn number(&self, value: &Value, pos: Position) -> Result<f64> {
        match &*value.0 {
            ValueKind::Int(n) => Ok(*n as f64),
            ValueKind::Float(n) => Ok(*n),
            _ => Err(TinyTalkError::from(
                Diagnostic::new(
                    DiagnosticKind::Type,
                    format!("expected a numeric value, found {}", value.type_name()),
                )
                .at(pos),
            )),
        }
    }

    /// Primitives compare by value (ints and floats interchangeably),
    /// instances by identity.
    fn equal(&self, left: &Value, right: &Value) -> bool {
        match (&*left.0, &*right.0) {
            (ValueKind::None, ValueKind::None) => true,
            (ValueKind::Finfr, ValueKind::Finfr) => true,
            (ValueKind::Bool(a), ValueKind::Bool(b)) => a == b,
            (ValueKind::Int(a), ValueKind::Int(b)) => a == b,
            (ValueKind::Float(a), ValueKind::Float(b)) => a == b,
            (ValueKind::Int(a), ValueKind::Float(b)) => *a as f64 == *b,
            (ValueKind::Float(a), ValueKind::Int(b)) => *a == *b as f64,
            (ValueKind::String(a), ValueKind::String(b)) => a == b,
            (ValueKind::Instance(a), ValueKind::Instance(b)) => Rc::ptr_eq(a, b),
            (ValueKind::Blueprint(a), ValueKind::Blueprint(b)) => Rc::ptr_eq(a, b),
            (ValueKind::BoundOp(a), ValueKind::BoundOp(b)) => {
                Rc::ptr_eq(&a.receiver, &b.receiver) && a.member == b.member
            }
            _ => false,
        }
    }
}

enum FlowControl {
    Next,
    NextValue(Value),
    Reply(Value),
    Break(Option<Value>),
    Continue,
}
