//! TypeScript AST for code generation.
//!
//! - TsType: types (primitives, arrays, unions, generics, ...)
//! - TsExpr / TsStmt: expressions and statements of member bodies
//! - TsDecl: top-level declarations (type definitions, classes, consts)

/// TypeScript type representation
#[derive(Debug, Clone, PartialEq)]
pub enum TsType {
    /// Primitive types: string, number, boolean, null, void
    Primitive(TsPrimitive),
    /// Array type: Array<T>
    Array(Box<TsType>),
    /// Union type: A | B | C
    Union(Vec<TsType>),
    /// Object type: { foo: string; bar?: number }
    Object(Vec<TsProp>),
    /// Named type reference
    Ref(String),
    /// Generic instantiation: Name<A, B>
    Generic { name: String, args: Vec<TsType> },
}

impl TsType {
    pub fn reference(name: impl Into<String>) -> Self {
        TsType::Ref(name.into())
    }

    pub fn generic(name: impl Into<String>, args: Vec<TsType>) -> Self {
        TsType::Generic {
            name: name.into(),
            args,
        }
    }

    /// `T | null`
    pub fn nullable(self) -> Self {
        TsType::Union(vec![self, TsType::Primitive(TsPrimitive::Null)])
    }
}

/// TypeScript primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsPrimitive {
    String,
    Number,
    Boolean,
    Null,
    Void,
}

/// Object or interface property
#[derive(Debug, Clone, PartialEq)]
pub struct TsProp {
    pub name: String,
    pub ty: TsType,
    pub optional: bool,
}

/// TypeScript literal values
#[derive(Debug, Clone, PartialEq)]
pub enum TsLiteral {
    String(String),
    Bool(bool),
}

/// TypeScript expression
#[derive(Debug, Clone, PartialEq)]
pub enum TsExpr {
    /// Identifier: foo, this
    Ident(String),
    /// Literal value: "bar", true
    Literal(TsLiteral),
    /// Function call: foo(a, b)
    Call { callee: Box<TsExpr>, args: Vec<TsExpr> },
    /// Arrow function without parameters: () => QPerson
    Thunk(Box<TsExpr>),
    /// Object literal: { a: 1, b: 2 }
    Object(Vec<(String, TsExpr)>),
    /// Member access: foo.bar
    Member { object: Box<TsExpr>, prop: String },
    /// Constructor call: new Foo(a)
    New { callee: String, args: Vec<TsExpr> },
    /// Array literal: [a, b, c]
    Array(Vec<TsExpr>),
    /// Negation: !expr
    Not(Box<TsExpr>),
    /// Assignment: target = value
    Assign { target: Box<TsExpr>, value: Box<TsExpr> },
}

impl TsExpr {
    pub fn ident(name: impl Into<String>) -> Self {
        TsExpr::Ident(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        TsExpr::Literal(TsLiteral::String(value.into()))
    }

    /// `this.<prop>`
    pub fn this_member(prop: impl Into<String>) -> Self {
        TsExpr::ident("this").member(prop)
    }

    pub fn member(self, prop: impl Into<String>) -> Self {
        TsExpr::Member {
            object: Box::new(self),
            prop: prop.into(),
        }
    }

    pub fn call(self, args: Vec<TsExpr>) -> Self {
        TsExpr::Call {
            callee: Box::new(self),
            args,
        }
    }

    pub fn new_instance(callee: impl Into<String>, args: Vec<TsExpr>) -> Self {
        TsExpr::New {
            callee: callee.into(),
            args,
        }
    }
}

/// Function or method parameter
#[derive(Debug, Clone, PartialEq)]
pub struct TsParam {
    pub name: String,
    pub ty: Option<TsType>,
    pub optional: bool,
    pub default: Option<TsExpr>,
}

impl TsParam {
    pub fn new(name: impl Into<String>, ty: TsType) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            optional: false,
            default: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Statement in a member body
#[derive(Debug, Clone, PartialEq)]
pub enum TsStmt {
    /// const declaration
    Const { name: String, init: TsExpr },
    /// Expression statement
    Expr(TsExpr),
    /// Return statement
    Return(Option<TsExpr>),
    /// If statement
    If {
        cond: TsExpr,
        then_body: Vec<TsStmt>,
    },
}

// =============================================================================
// Module-Level IR (for printer)
// =============================================================================

/// Import statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsImport {
    /// Imported names
    pub items: Vec<String>,
    /// Module path
    pub from: String,
    /// Whether this is a type-only import
    pub type_only: bool,
}

impl TsImport {
    pub fn new(from: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            items,
            from: from.into(),
            type_only: false,
        }
    }

    pub fn types(from: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            items,
            from: from.into(),
            type_only: true,
        }
    }
}

/// Type definition kind
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefKind {
    /// interface Foo extends Bar { ... }
    Interface {
        extends: Vec<TsType>,
        properties: Vec<TsProp>,
    },
    /// type Foo = ...
    TypeAlias { ty: TsType },
    /// enum Foo { A = "A" }
    Enum { members: Vec<(String, TsLiteral)> },
}

/// Type definition
#[derive(Debug, Clone, PartialEq)]
pub struct TsTypeDef {
    pub name: String,
    pub kind: TypeDefKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsField {
    pub visibility: Visibility,
    pub readonly: bool,
    pub name: String,
    pub optional: bool,
    pub ty: Option<TsType>,
    pub init: Option<TsExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsMethod {
    pub visibility: Visibility,
    pub name: String,
    pub params: Vec<TsParam>,
    pub return_type: Option<TsType>,
    pub body: Vec<TsStmt>,
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TsClassMember {
    Field(TsField),
    Constructor { params: Vec<TsParam>, body: Vec<TsStmt> },
    Method(TsMethod),
    Getter(TsMethod),
}

/// Generic type parameter: `ClientType extends ODataHttpClient`
#[derive(Debug, Clone, PartialEq)]
pub struct TsTypeParam {
    pub name: String,
    pub constraint: Option<TsType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsClass {
    pub name: String,
    pub type_params: Vec<TsTypeParam>,
    pub extends: Option<TsType>,
    pub members: Vec<TsClassMember>,
}

/// Exported constant
#[derive(Debug, Clone, PartialEq)]
pub struct TsConst {
    pub name: String,
    pub init: TsExpr,
}

/// Top-level declaration; all declarations are exported.
#[derive(Debug, Clone, PartialEq)]
pub enum TsDecl {
    TypeDef(TsTypeDef),
    Class(TsClass),
    Const(TsConst),
}

/// Complete TypeScript module
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TsModule {
    pub imports: Vec<TsImport>,
    pub decls: Vec<TsDecl>,
}
