use std::{cell::RefCell, fmt, rc::Rc};

use indexmap::IndexMap;

use crate::{ast::BlueprintDecl, environment::EnvironmentRef};

#[derive(Clone)]
pub struct Value(pub Rc<ValueKind>);

impl Value {
    pub fn new(kind: ValueKind) -> Self {
        Self(Rc::new(kind))
    }

    pub fn none() -> Self {
        Self::new(ValueKind::None)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ValueKind::Bool(value))
    }

    pub fn int(value: i64) -> Self {
        Self::new(ValueKind::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Self::new(ValueKind::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ValueKind::String(value.into()))
    }

    pub fn finfr() -> Self {
        Self::new(ValueKind::Finfr)
    }

    pub fn is_truthy(&self) -> bool {
        match &*self.0 {
            ValueKind::None | ValueKind::Finfr => false,
            ValueKind::Bool(b) => *b,
            ValueKind::Int(n) => *n != 0,
            ValueKind::Float(f) => *f != 0.0,
            ValueKind::String(s) => !s.is_empty(),
            ValueKind::Blueprint(_) | ValueKind::Instance(_) | ValueKind::BoundOp(_) => true,
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(&*self.0, ValueKind::Int(_))
    }

    pub fn is_finfr(&self) -> bool {
        matches!(&*self.0, ValueKind::Finfr)
    }

    pub fn type_name(&self) -> &'static str {
        match &*self.0 {
            ValueKind::None => "None",
            ValueKind::Bool(_) => "Bool",
            ValueKind::Int(_) => "Int",
            ValueKind::Float(_) => "Float",
            ValueKind::String(_) => "String",
            ValueKind::Finfr => "Finfr",
            ValueKind::Blueprint(_) => "Blueprint",
            ValueKind::Instance(_) => "Instance",
            ValueKind::BoundOp(_) => "BoundOp",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            ValueKind::String(s) => write!(f, "\"{s}\""),
            _ => write!(f, "{self}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            ValueKind::None => write!(f, "none"),
            ValueKind::Bool(b) => write!(f, "{b}"),
            ValueKind::Int(n) => write!(f, "{n}"),
            ValueKind::Float(n) => write!(f, "{n}"),
            ValueKind::String(s) => write!(f, "{s}"),
            ValueKind::Finfr => write!(f, "finfr"),
            ValueKind::Blueprint(blueprint) => write!(f, "<blueprint {}>", blueprint.name),
            ValueKind::Instance(instance) => {
                write!(f, "<{} instance>", instance.blueprint.name)
            }
            ValueKind::BoundOp(bound) => write!(
                f,
                "<bound {}.{}>",
                bound.receiver.blueprint.name,
                bound.member_name()
            ),
        }
    }
}

pub enum ValueKind {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Finfr,
    Blueprint(Rc<Blueprint>),
    Instance(InstanceRef),
    BoundOp(BoundOp),
}

/// Which kind of member a blueprint name resolves to. Resolved once at
/// declaration time; member access is a table lookup afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field(usize),
    Law(usize),
    Forge(usize),
}

/// A fully resolved object type: the declaration plus a member table and
/// the environment its bodies close over.
pub struct Blueprint {
    pub name: String,
    pub decl: Rc<BlueprintDecl>,
    pub members: IndexMap<String, MemberKind>,
    pub env: EnvironmentRef,
}

impl Blueprint {
    pub fn new(decl: Rc<BlueprintDecl>, env: EnvironmentRef) -> Rc<Self> {
        let mut members = IndexMap::new();
        for (idx, field) in decl.fields.iter().enumerate() {
            members.insert(field.name.clone(), MemberKind::Field(idx));
        }
        for (idx, law) in decl.laws.iter().enumerate() {
            members.insert(law.name.clone(), MemberKind::Law(idx));
        }
        for (idx, forge) in decl.forges.iter().enumerate() {
            members.insert(forge.name.clone(), MemberKind::Forge(idx));
        }
        Rc::new(Self {
            name: decl.name.clone(),
            decl,
            members,
            env,
        })
    }

    pub fn member(&self, name: &str) -> Option<MemberKind> {
        self.members.get(name).copied()
    }
}

pub type InstanceRef = Rc<Instance>;

/// A blueprint instance: shared identity, interior-mutable fields. Fields
/// are only ever written through the forge commit protocol.
pub struct Instance {
    pub blueprint: Rc<Blueprint>,
    pub fields: RefCell<IndexMap<String, Value>>,
}

impl Instance {
    pub fn new(blueprint: Rc<Blueprint>, fields: IndexMap<String, Value>) -> InstanceRef {
        Rc::new(Self {
            blueprint,
            fields: RefCell::new(fields),
        })
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    /// Copies every current field value into a pre-state record.
    pub fn snapshot(&self) -> IndexMap<String, Value> {
        self.fields.borrow().clone()
    }

    /// Overwrites every field with the snapshot's value.
    pub fn restore(&self, snapshot: IndexMap<String, Value>) {
        *self.fields.borrow_mut() = snapshot;
    }
}

/// Which callable member a bound operation wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundMember {
    Law(usize),
    Forge(usize),
}

/// A callable permanently targeting the instance it was read from. The
/// captured reference never changes, regardless of later rebinding of the
/// variable the instance came from.
#[derive(Clone)]
pub struct BoundOp {
    pub receiver: InstanceRef,
    pub member: BoundMember,
}

impl BoundOp {
    pub fn member_name(&self) -> &str {
        match self.member {
            BoundMember::Law(idx) => &self.receiver.blueprint.decl.laws[idx].name,
            BoundMember::Forge(idx) => &self.receiver.blueprint.decl.forges[idx].name,
        }
    }
}
