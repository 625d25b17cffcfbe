//! TypeScript declaration AST and printer.

pub mod emit;
pub mod types;
pub mod utils;

pub use emit::Emit;
pub use types::{
    TsClass, TsClassMember, TsConst, TsDecl, TsExpr, TsField, TsImport, TsLiteral, TsMethod,
    TsModule, TsParam, TsPrimitive, TsProp, TsStmt, TsType, TsTypeDef, TsTypeParam, TypeDefKind,
    Visibility,
};
