//! Declared types a context value must satisfy

use std::fmt;

use crate::value::Value;

/// Variable name checked when a contract omits `as NAME`
pub const DEFAULT_ALIAS: &str = "MODEL";

/// Built-in scalar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    String,
    Boolean,
    Integer,
    Float,
}

impl PrimitiveKind {
    /// Resolve one of the reserved type names (`string`, `bool`, `int`, `float`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(PrimitiveKind::String),
            "bool" => Some(PrimitiveKind::Boolean),
            "int" => Some(PrimitiveKind::Integer),
            "float" => Some(PrimitiveKind::Float),
            _ => None,
        }
    }

    /// Exact match on the dynamic type, no coercion
    pub fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (PrimitiveKind::String, Value::String(_))
                | (PrimitiveKind::Boolean, Value::Bool(_))
                | (PrimitiveKind::Integer, Value::Int(_))
                | (PrimitiveKind::Float, Value::Float(_))
        )
    }

    fn article_name(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "a string",
            PrimitiveKind::Boolean => "a boolean",
            PrimitiveKind::Integer => "an integer",
            PrimitiveKind::Float => "a float",
        }
    }
}

/// The type of a single value: a primitive or a named object type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    Primitive(PrimitiveKind),
    Object(String),
}

impl ElementType {
    /// Primitive for a reserved name, object type otherwise
    pub fn from_name(name: &str) -> Self {
        match PrimitiveKind::from_name(name) {
            Some(kind) => ElementType::Primitive(kind),
            None => ElementType::Object(name.to_string()),
        }
    }

    /// Diagnostic description, with the ` or NULL` suffix when nullable
    pub fn describe(&self, nullable: bool) -> String {
        let base = match self {
            ElementType::Primitive(kind) => kind.article_name().to_string(),
            ElementType::Object(name) => format!("\"{}\"", name),
        };
        with_null_suffix(base, nullable)
    }
}

/// Shape of a declared type
///
/// Arrays nest exactly one level: the element is always an [`ElementType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    Single(ElementType),
    ArrayOf {
        element: ElementType,
        element_nullable: bool,
    },
}

/// A declared type plus its nullability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub shape: TypeShape,
    pub nullable: bool,
}

impl TypeSpec {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self {
            shape: TypeShape::Single(ElementType::Primitive(kind)),
            nullable: false,
        }
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self {
            shape: TypeShape::Single(ElementType::Object(name.into())),
            nullable: false,
        }
    }

    pub fn array_of(element: ElementType, element_nullable: bool) -> Self {
        Self {
            shape: TypeShape::ArrayOf {
                element,
                element_nullable,
            },
            nullable: false,
        }
    }

    /// Mark the whole value as accepting null
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Diagnostic description of the expected shape
    pub fn describe(&self) -> String {
        match &self.shape {
            TypeShape::Single(element) => element.describe(self.nullable),
            TypeShape::ArrayOf {
                element,
                element_nullable,
            } => with_null_suffix(
                format!("an array of {}", element.describe(*element_nullable)),
                self.nullable,
            ),
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

fn with_null_suffix(base: String, nullable: bool) -> String {
    if nullable {
        format!("{} or NULL", base)
    } else {
        base
    }
}

/// A declared variable name paired with the type it must satisfy
///
/// Built once when a template compiles and evaluated on every render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBinding {
    pub name: String,
    pub spec: TypeSpec,
}

impl ContextBinding {
    pub fn new(name: impl Into<String>, spec: TypeSpec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }
}
