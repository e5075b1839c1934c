use crate::gc::gc;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Number(f64),
    String(gc::HeapId),
}

impl Value {
    pub fn is_falsey(&self) -> bool {
        matches!(self, Value::Nil | Value::Bool(false))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Value::Nil => write!(fmt, "nil"),
            Value::Bool(v) => write!(fmt, "{}", v),
            Value::Number(v) => write!(fmt, "{}", v),
            Value::String(id) => write!(fmt, "<string {}>", id),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Type {
    Nil,
    Bool,
    Number,
    String,
}

pub fn type_of(value: &Value) -> Type {
    match value {
        Value::Nil => Type::Nil,
        Value::Bool(_) => Type::Bool,
        Value::Number(_) => Type::Number,
        Value::String(_) => Type::String,
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Type::Nil => write!(fmt, "Nil"),
            Type::Bool => write!(fmt, "Bool"),
            Type::Number => write!(fmt, "Number"),
            Type::String => write!(fmt, "String"),
        }
    }
}
