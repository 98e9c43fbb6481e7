//! Syntax tree for compiled templates

use crate::contract::ContextBinding;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Valid identifier (alphanumeric + underscore, starts with letter/_)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Root AST node - a parsed template
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub nodes: Vec<Spanned<Node>>,
}

impl Document {
    /// Contract bindings declared at the top level, in order
    pub fn bindings(&self) -> impl Iterator<Item = &ContextBinding> {
        self.nodes.iter().filter_map(|n| match &n.node {
            Node::Contract(binding) => Some(binding),
            _ => None,
        })
    }
}

/// A unit of template content
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Raw text copied to the output
    Text(String),
    /// `{{ expr }}`
    Output(Spanned<Expr>),
    /// `{% require ... %}` / `{% expect ... %}`
    Contract(ContextBinding),
    /// `{% register ... %}`, inline or block
    Register(RegisterDirective),
}

/// A registration into a named registry
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterDirective {
    /// Target registry, explicit or inferred from the literal's extension
    pub registry: String,
    /// `once`: dedup by content
    pub unique: bool,
    pub priority: Option<i64>,
    pub content: RegisterContent,
}

/// What a registration captures
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterContent {
    /// The literal from `{% register '...' %}`
    Inline(String),
    /// The rendered body of `{% register in '...' %}...{% endregister %}`
    Block(Vec<Spanned<Node>>),
}

/// Host functions callable from expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// `registry(name)`
    Registry,
    /// `new(type, args...)`
    New,
    /// `instanceof(value, type)`
    InstanceOf,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "registry" => Some(Function::Registry),
            "new" => Some(Function::New),
            "instanceof" => Some(Function::InstanceOf),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Registry => "registry",
            Function::New => "new",
            Function::InstanceOf => "instanceof",
        }
    }
}

/// Filters applicable with `expr | filter`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    JsonDecode,
    Join,
}

impl Filter {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "json_decode" => Some(Filter::JsonDecode),
            "join" => Some(Filter::Join),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Filter::JsonDecode => "json_decode",
            Filter::Join => "join",
        }
    }
}

/// Output expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
    /// Variable lookup, optionally walking object fields: `page.author.name`
    Path(Vec<Identifier>),
    Call {
        function: Function,
        args: Vec<Spanned<Expr>>,
    },
    Filter {
        input: Box<Spanned<Expr>>,
        filter: Filter,
        args: Vec<Spanned<Expr>>,
    },
}
