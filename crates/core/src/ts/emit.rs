//! TypeScript code emission via the Emit trait.
//!
//! Each AST type implements `Emit`; nested bodies are indented by two
//! spaces per level.

use super::types::{
    TsClass, TsClassMember, TsConst, TsDecl, TsExpr, TsField, TsImport, TsLiteral, TsMethod,
    TsModule, TsParam, TsPrimitive, TsProp, TsStmt, TsType, TsTypeDef, TsTypeParam, TypeDefKind,
    Visibility,
};
use super::utils::{escape_js_string, quote_if_needed};

/// Trait for emitting TypeScript code from AST nodes.
pub trait Emit {
    /// Convert the AST node to its TypeScript string representation.
    fn emit(&self) -> String;
}

fn join<T: Emit>(items: &[T], sep: &str) -> String {
    items.iter().map(Emit::emit).collect::<Vec<_>>().join(sep)
}

// =============================================================================
// Types
// =============================================================================

impl Emit for TsPrimitive {
    fn emit(&self) -> String {
        match self {
            TsPrimitive::String => "string".to_string(),
            TsPrimitive::Number => "number".to_string(),
            TsPrimitive::Boolean => "boolean".to_string(),
            TsPrimitive::Null => "null".to_string(),
            TsPrimitive::Void => "void".to_string(),
        }
    }
}

impl Emit for TsLiteral {
    fn emit(&self) -> String {
        match self {
            TsLiteral::String(s) => format!("\"{}\"", escape_js_string(s)),
            TsLiteral::Bool(b) => b.to_string(),
        }
    }
}

impl Emit for TsType {
    fn emit(&self) -> String {
        match self {
            TsType::Primitive(p) => p.emit(),
            TsType::Array(inner) => format!("Array<{}>", inner.emit()),
            TsType::Union(types) => join(types, " | "),
            TsType::Object(props) => {
                if props.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{ {} }}", join(props, "; "))
                }
            }
            TsType::Ref(name) => name.clone(),
            TsType::Generic { name, args } => format!("{}<{}>", name, join(args, ", ")),
        }
    }
}

impl Emit for TsProp {
    fn emit(&self) -> String {
        let opt = if self.optional { "?" } else { "" };
        format!("{}{}: {}", quote_if_needed(&self.name), opt, self.ty.emit())
    }
}

impl Emit for TsTypeParam {
    fn emit(&self) -> String {
        match &self.constraint {
            Some(constraint) => format!("{} extends {}", self.name, constraint.emit()),
            None => self.name.clone(),
        }
    }
}

// =============================================================================
// Type Definitions
// =============================================================================

impl Emit for TsTypeDef {
    fn emit(&self) -> String {
        match &self.kind {
            TypeDefKind::Interface {
                extends,
                properties,
            } => {
                let extends_str = if extends.is_empty() {
                    String::new()
                } else {
                    format!(" extends {}", join(extends, ", "))
                };
                if properties.is_empty() {
                    return format!("export interface {}{} {{}}\n", self.name, extends_str);
                }
                let mut output = format!("export interface {}{} {{\n", self.name, extends_str);
                for prop in properties {
                    output.push_str(&format!("  {};\n", prop.emit()));
                }
                output.push_str("}\n");
                output
            }
            TypeDefKind::TypeAlias { ty } => {
                format!("export type {} = {};\n", self.name, ty.emit())
            }
            TypeDefKind::Enum { members } => {
                let mut output = format!("export enum {} {{\n", self.name);
                for (key, value) in members {
                    output.push_str(&format!("  {} = {},\n", quote_if_needed(key), value.emit()));
                }
                output.push_str("}\n");
                output
            }
        }
    }
}

// =============================================================================
// Expressions
// =============================================================================

impl Emit for TsExpr {
    fn emit(&self) -> String {
        match self {
            TsExpr::Ident(name) => name.clone(),
            TsExpr::Literal(lit) => lit.emit(),
            TsExpr::Call { callee, args } => format!("{}({})", callee.emit(), join(args, ", ")),
            TsExpr::Thunk(body) => format!("() => {}", body.emit()),
            TsExpr::Object(props) => {
                if props.is_empty() {
                    "{}".to_string()
                } else {
                    let parts: Vec<_> = props
                        .iter()
                        .map(|(k, v)| format!("{}: {}", quote_if_needed(k), v.emit()))
                        .collect();
                    format!("{{ {} }}", parts.join(", "))
                }
            }
            TsExpr::Member { object, prop } => format!("{}.{}", object.emit(), prop),
            TsExpr::New { callee, args } => format!("new {}({})", callee, join(args, ", ")),
            TsExpr::Array(items) => format!("[{}]", join(items, ", ")),
            TsExpr::Not(expr) => format!("!{}", expr.emit()),
            TsExpr::Assign { target, value } => format!("{} = {}", target.emit(), value.emit()),
        }
    }
}

impl Emit for TsParam {
    fn emit(&self) -> String {
        let opt = if self.optional && self.default.is_none() {
            "?"
        } else {
            ""
        };
        let ty = self
            .ty
            .as_ref()
            .map(|t| format!(": {}", t.emit()))
            .unwrap_or_default();
        let default = self
            .default
            .as_ref()
            .map(|d| format!(" = {}", d.emit()))
            .unwrap_or_default();
        format!("{}{}{}{}", self.name, opt, ty, default)
    }
}

// =============================================================================
// Statements
// =============================================================================

impl Emit for TsStmt {
    fn emit(&self) -> String {
        self.emit_indented(1)
    }
}

impl TsStmt {
    /// Emit with specified indentation level (2 spaces per level)
    pub fn emit_indented(&self, indent: usize) -> String {
        let prefix = "  ".repeat(indent);
        match self {
            TsStmt::Const { name, init } => format!("{prefix}const {name} = {};\n", init.emit()),
            TsStmt::Expr(expr) => format!("{prefix}{};\n", expr.emit()),
            TsStmt::Return(expr) => match expr {
                Some(e) => format!("{prefix}return {};\n", e.emit()),
                None => format!("{prefix}return;\n"),
            },
            TsStmt::If { cond, then_body } => {
                let mut output = format!("{prefix}if ({}) {{\n", cond.emit());
                for stmt in then_body {
                    output.push_str(&stmt.emit_indented(indent + 1));
                }
                output.push_str(&format!("{prefix}}}\n"));
                output
            }
        }
    }
}

// =============================================================================
// Classes
// =============================================================================

fn visibility(v: Visibility) -> &'static str {
    match v {
        Visibility::Public => "public",
        Visibility::Private => "private",
    }
}

fn emit_body(body: &[TsStmt], indent: usize) -> String {
    body.iter().map(|stmt| stmt.emit_indented(indent)).collect()
}

impl Emit for TsField {
    fn emit(&self) -> String {
        let readonly = if self.readonly { " readonly" } else { "" };
        let opt = if self.optional { "?" } else { "" };
        let ty = self
            .ty
            .as_ref()
            .map(|t| format!(": {}", t.emit()))
            .unwrap_or_default();
        let init = self
            .init
            .as_ref()
            .map(|i| format!(" = {}", i.emit()))
            .unwrap_or_default();
        format!(
            "  {}{} {}{}{}{};\n",
            visibility(self.visibility),
            readonly,
            self.name,
            opt,
            ty,
            init
        )
    }
}

fn emit_method(method: &TsMethod, getter: bool) -> String {
    let async_str = if method.is_async { "async " } else { "" };
    let get_str = if getter { "get " } else { "" };
    let return_type = method
        .return_type
        .as_ref()
        .map(|t| format!(": {}", t.emit()))
        .unwrap_or_default();
    format!(
        "  {} {}{}{}({}){} {{\n{}  }}\n",
        visibility(method.visibility),
        async_str,
        get_str,
        method.name,
        join(&method.params, ", "),
        return_type,
        emit_body(&method.body, 2)
    )
}

impl Emit for TsClassMember {
    fn emit(&self) -> String {
        match self {
            TsClassMember::Field(field) => field.emit(),
            TsClassMember::Constructor { params, body } => format!(
                "  constructor({}) {{\n{}  }}\n",
                join(params, ", "),
                emit_body(body, 2)
            ),
            TsClassMember::Method(method) => emit_method(method, false),
            TsClassMember::Getter(method) => emit_method(method, true),
        }
    }
}

impl Emit for TsClass {
    fn emit(&self) -> String {
        let type_params = if self.type_params.is_empty() {
            String::new()
        } else {
            format!("<{}>", join(&self.type_params, ", "))
        };
        let extends = self
            .extends
            .as_ref()
            .map(|t| format!(" extends {}", t.emit()))
            .unwrap_or_default();
        let header = format!("export class {}{}{}", self.name, type_params, extends);

        if self.members.is_empty() {
            return format!("{header} {{}}\n");
        }

        let mut output = format!("{header} {{\n");
        let mut previous_was_field = None;
        for member in &self.members {
            let is_field = matches!(member, TsClassMember::Field(_));
            // fields are grouped; everything else is separated by a blank line
            if previous_was_field.is_some_and(|prev| !(prev && is_field)) {
                output.push('\n');
            }
            output.push_str(&member.emit());
            previous_was_field = Some(is_field);
        }
        output.push_str("}\n");
        output
    }
}

// =============================================================================
// Module
// =============================================================================

impl Emit for TsConst {
    fn emit(&self) -> String {
        format!("export const {} = {};\n", self.name, self.init.emit())
    }
}

impl Emit for TsDecl {
    fn emit(&self) -> String {
        match self {
            TsDecl::TypeDef(def) => def.emit(),
            TsDecl::Class(class) => class.emit(),
            TsDecl::Const(constant) => constant.emit(),
        }
    }
}

impl Emit for TsImport {
    fn emit(&self) -> String {
        let type_keyword = if self.type_only { "type " } else { "" };
        format!(
            "import {}{{ {} }} from \"{}\";\n",
            type_keyword,
            self.items.join(", "),
            self.from
        )
    }
}

impl Emit for TsModule {
    fn emit(&self) -> String {
        let mut output = String::new();

        for import in &self.imports {
            output.push_str(&import.emit());
        }

        for (i, decl) in self.decls.iter().enumerate() {
            if i > 0 || !self.imports.is_empty() {
                output.push('\n');
            }
            output.push_str(&decl.emit());
        }

        output
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_types() {
        let ty = TsType::Array(Box::new(TsType::Primitive(TsPrimitive::String)));
        assert_eq!(ty.emit(), "Array<string>");

        let nullable = TsType::reference("Location").nullable();
        assert_eq!(nullable.emit(), "Location | null");

        let generic = TsType::generic(
            "PersonService",
            vec![TsType::reference("ClientType")],
        );
        assert_eq!(generic.emit(), "PersonService<ClientType>");
    }

    #[test]
    fn test_emit_id_type_alias() {
        let def = TsTypeDef {
            name: "PersonId".into(),
            kind: TypeDefKind::TypeAlias {
                ty: TsType::Union(vec![
                    TsType::Primitive(TsPrimitive::String),
                    TsType::Object(vec![TsProp {
                        name: "userName".into(),
                        ty: TsType::Primitive(TsPrimitive::String),
                        optional: false,
                    }]),
                ]),
            },
        };
        assert_eq!(
            def.emit(),
            "export type PersonId = string | { userName: string };\n"
        );
    }

    #[test]
    fn test_emit_interface_with_extends() {
        let def = TsTypeDef {
            name: "Employee".into(),
            kind: TypeDefKind::Interface {
                extends: vec![TsType::reference("Person")],
                properties: vec![TsProp {
                    name: "cost".into(),
                    ty: TsType::Primitive(TsPrimitive::Number),
                    optional: false,
                }],
            },
        };
        assert_eq!(
            def.emit(),
            "export interface Employee extends Person {\n  cost: number;\n}\n"
        );
    }

    #[test]
    fn test_emit_enum() {
        let def = TsTypeDef {
            name: "Feature".into(),
            kind: TypeDefKind::Enum {
                members: vec![
                    ("Feature1".into(), TsLiteral::String("Feature1".into())),
                    ("Feature2".into(), TsLiteral::String("Feature2".into())),
                ],
            },
        };
        assert_eq!(
            def.emit(),
            "export enum Feature {\n  Feature1 = \"Feature1\",\n  Feature2 = \"Feature2\",\n}\n"
        );
    }

    #[test]
    fn test_emit_class_groups_fields() {
        let class = TsClass {
            name: "QPerson".into(),
            type_params: vec![],
            extends: Some(TsType::reference("QueryObject")),
            members: vec![
                TsClassMember::Field(TsField {
                    visibility: Visibility::Public,
                    readonly: true,
                    name: "userName".into(),
                    optional: false,
                    ty: None,
                    init: Some(TsExpr::new_instance(
                        "QStringPath",
                        vec![TsExpr::this_member("withPrefix").call(vec![TsExpr::string("UserName")])],
                    )),
                }),
                TsClassMember::Field(TsField {
                    visibility: Visibility::Private,
                    readonly: false,
                    name: "_x".into(),
                    optional: true,
                    ty: Some(TsType::Primitive(TsPrimitive::String)),
                    init: None,
                }),
                TsClassMember::Getter(TsMethod {
                    visibility: Visibility::Public,
                    name: "x".into(),
                    params: vec![],
                    return_type: Some(TsType::Primitive(TsPrimitive::String)),
                    body: vec![TsStmt::Return(Some(TsExpr::string("x")))],
                    is_async: false,
                }),
            ],
        };
        let expected = "export class QPerson extends QueryObject {\n  public readonly userName = new QStringPath(this.withPrefix(\"UserName\"));\n  private _x?: string;\n\n  public get x(): string {\n    return \"x\";\n  }\n}\n";
        assert_eq!(class.emit(), expected);
    }

    #[test]
    fn test_emit_if_statement() {
        let stmt = TsStmt::If {
            cond: TsExpr::Not(Box::new(TsExpr::this_member("_people"))),
            then_body: vec![TsStmt::Expr(TsExpr::Assign {
                target: Box::new(TsExpr::this_member("_people")),
                value: Box::new(TsExpr::new_instance("PeopleService", vec![])),
            })],
        };
        assert_eq!(
            stmt.emit_indented(2),
            "    if (!this._people) {\n      this._people = new PeopleService();\n    }\n"
        );
    }

    #[test]
    fn test_emit_param_with_default() {
        let param = TsParam {
            name: "name".into(),
            ty: Some(TsType::Primitive(TsPrimitive::String)),
            optional: true,
            default: Some(TsExpr::string("GetNearestAirport")),
        };
        assert_eq!(param.emit(), "name: string = \"GetNearestAirport\"");
        assert_eq!(
            TsParam::new("requestConfig", TsType::reference("Config")).optional().emit(),
            "requestConfig?: Config"
        );
    }

    #[test]
    fn test_emit_import() {
        let import = TsImport::types("./TrippinModel", vec!["Person".into(), "EditablePerson".into()]);
        assert_eq!(
            import.emit(),
            "import type { Person, EditablePerson } from \"./TrippinModel\";\n"
        );
    }

    #[test]
    fn test_emit_module_separates_decls() {
        let module = TsModule {
            imports: vec![TsImport::new("lib", vec!["QueryObject".into()])],
            decls: vec![TsDecl::Const(TsConst {
                name: "qPerson".into(),
                init: TsExpr::new_instance("QPerson", vec![]),
            })],
        };
        assert_eq!(
            module.emit(),
            "import { QueryObject } from \"lib\";\n\nexport const qPerson = new QPerson();\n"
        );
    }
}
