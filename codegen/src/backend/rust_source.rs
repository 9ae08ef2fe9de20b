use std::collections::HashMap;

use error_stack::Report;
use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote};

use super::{Backend, check_call_targets};
use crate::config::DateFormat;
use crate::error::{Error, Result};
use crate::ir::{LocalId, ScalarKind, Stmt, ValueExpr};
use crate::type_descriptor::ClassName;
use crate::unit_builder::SerializerUnit;

/// Rust module text for one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RustSource {
    /// File name within the output directory
    pub file_name: String,
    /// Module text behind an `@generated` header line
    pub code:      String,
}

/// Emits Rust source written against the `jsonb_codegen` runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct RustSourceBackend;

impl Backend for RustSourceBackend {
    type Output = RustSource;

    fn lower(&self, unit: &SerializerUnit) -> Result<RustSource> {
        check_call_targets(unit)?;

        let names: HashMap<&ClassName, Ident> = unit
            .ir
            .functions
            .iter()
            .enumerate()
            .map(|(position, function)| {
                let simple = sanitize(function.class.simple_name()).to_lowercase();
                (&function.class, format_ident!("write_{}_{}", position, simple))
            })
            .collect();
        let emitter = Emitter { names: &names };

        let struct_name = Ident::new(&sanitize(unit.id.simple_name()), Span::call_site());
        let root_type = unit.root_type.to_string();
        let needs_reflection = unit.needs_reflection();
        let entry = emitter.block(&unit.ir.entry)?;
        let mismatch = format!("unit {} received a value that is not a host value", unit.id);

        let mut functions = Vec::with_capacity(unit.ir.functions.len());
        for function in &unit.ir.functions {
            let name = emitter.function_name(&function.class)?;
            let body = emitter.block(&function.body)?;
            functions.push(quote! {
                fn #name(
                    value: &::serde_json::Value,
                    ctx: &mut ::jsonb_codegen::runtime::SerializationContext<'_>,
                ) -> ::jsonb_codegen::error::Result<()> {
                    #body
                    Ok(())
                }
            });
        }

        let struct_doc = format!(" Generated serializer for `{root_type}`");
        let tokens = quote! {
            #[doc = #struct_doc]
            pub struct #struct_name;

            impl #struct_name {
                /// Root type written by this unit
                pub const ROOT_TYPE: &'static str = #root_type;
                /// Whether some leaf is written reflectively
                pub const NEEDS_REFLECTION: bool = #needs_reflection;

                /// Write a non-null value of the root type
                pub fn serialize(
                    value: &::serde_json::Value,
                    ctx: &mut ::jsonb_codegen::runtime::SerializationContext<'_>,
                ) -> ::jsonb_codegen::error::Result<()> {
                    #entry
                    Ok(())
                }

                /// Type-erased bridge; the value must be a host value
                pub fn serialize_erased(
                    value: &dyn ::std::any::Any,
                    ctx: &mut ::jsonb_codegen::runtime::SerializationContext<'_>,
                ) -> ::jsonb_codegen::error::Result<()> {
                    let value = value
                        .downcast_ref::<::serde_json::Value>()
                        .ok_or_else(|| {
                            ::error_stack::Report::new(
                                ::jsonb_codegen::error::Error::Serialization(#mismatch.to_string()),
                            )
                        })?;
                    Self::serialize(value, ctx)
                }
            }

            #(#functions)*
        };

        let code = format!(
            "// @generated by jsonb-codegen for {root_type}\n\n{}\n",
            tokens
        );
        let file_name = format!("{}.rs", unit.id.file_stem());
        tracing::debug!(unit = %unit.id, file = %file_name, "Emitted Rust source");
        Ok(RustSource { file_name, code })
    }
}

/// Keep identifier characters, replace the rest
fn sanitize(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.chars().next().is_none_or(|c| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

fn local(id: LocalId) -> Ident { format_ident!("v{}", id.0) }

struct Emitter<'a> {
    names: &'a HashMap<&'a ClassName, Ident>,
}

impl Emitter<'_> {
    fn function_name(&self, class: &ClassName) -> Result<&Ident> {
        self.names.get(class).ok_or_else(|| {
            Report::new(Error::Lowering(format!("no function emitted for {class}")))
        })
    }

    fn block(&self, statements: &[Stmt]) -> Result<TokenStream> {
        let mut tokens = TokenStream::new();
        for stmt in statements {
            tokens.extend(self.stmt(stmt)?);
        }
        Ok(tokens)
    }

    fn stmt(&self, stmt: &Stmt) -> Result<TokenStream> {
        let generator = quote! { ctx.generator() };
        let host = quote! { ::jsonb_codegen::runtime::host };
        Ok(match stmt {
            Stmt::BeginObject => quote! { #generator.write_start_object()?; },
            Stmt::EndObject => quote! { #generator.write_end_object()?; },
            Stmt::BeginArray => quote! { #generator.write_start_array()?; },
            Stmt::EndArray => quote! { #generator.write_end_array()?; },
            Stmt::WriteKey(key) => quote! { #generator.write_key(#key)?; },
            Stmt::WriteDynamicKey(ValueExpr::Local(id)) => {
                let key = local(*id);
                quote! { #generator.write_key(#key)?; }
            }
            Stmt::WriteDynamicKey(other) => {
                return Err(Report::new(Error::Lowering(format!(
                    "dynamic key `{other}` is not a map key local"
                ))));
            }
            Stmt::WriteNull => quote! { #generator.write_null()?; },
            Stmt::WriteScalar { value, kind } => {
                let value = expr(value);
                let kind = scalar_kind(*kind);
                quote! { #host::write_scalar(#generator, #value, #kind)?; }
            }
            Stmt::WriteDate { value, format } => {
                let value = expr(value);
                let format = date_format(format);
                quote! { #host::write_date(#generator, #value, &#format)?; }
            }
            Stmt::Let { local: id, value } => {
                let name = local(*id);
                let value = expr(value);
                quote! { let #name = #value; }
            }
            Stmt::IfNotNull {
                value,
                then,
                otherwise,
            } => {
                let value = expr(value);
                let then = self.block(then)?;
                if otherwise.is_empty() {
                    quote! { if !#value.is_null() { #then } }
                } else {
                    let otherwise = self.block(otherwise)?;
                    quote! { if #value.is_null() { #otherwise } else { #then } }
                }
            }
            Stmt::IfPresent {
                optional,
                inner,
                then,
                otherwise,
            } => {
                let optional = expr(optional);
                let inner = local(*inner);
                let then = self.block(then)?;
                let otherwise = self.block(otherwise)?;
                quote! {
                    if let Some(#inner) = #host::optional_content(#optional)? { #then } else { #otherwise }
                }
            }
            Stmt::ForEachElement {
                iterable,
                element,
                body,
            } => {
                let iterable = expr(iterable);
                let element = local(*element);
                let body = self.block(body)?;
                quote! { for #element in #host::elements(#iterable)? { #body } }
            }
            Stmt::ForEachEntry {
                map,
                key,
                value,
                body,
            } => {
                let map = expr(map);
                let key = local(*key);
                let value = local(*value);
                let body = self.block(body)?;
                quote! { for (#key, #value) in #host::entries(#map)? { #body } }
            }
            Stmt::CallObject { class, value } => {
                let function = self.function_name(class)?;
                let value = expr(value);
                quote! { #function(#value, ctx)?; }
            }
            Stmt::WriteUnhandled {
                value,
                declared_type,
            } => {
                let value = expr(value);
                let signature = declared_type.to_string();
                quote! { ctx.write_unhandled_signature(#value, #signature)?; }
            }
        })
    }
}

fn expr(value: &ValueExpr) -> TokenStream {
    let host = quote! { ::jsonb_codegen::runtime::host };
    match value {
        ValueExpr::Root => quote! { value },
        ValueExpr::Local(id) => {
            let name = local(*id);
            quote! { #name }
        }
        ValueExpr::Getter { target, method } => {
            let target = expr(target);
            quote! { #host::invoke_getter(#target, #method)? }
        }
        ValueExpr::Field { target, name } => {
            let target = expr(target);
            quote! { #host::read_field(#target, #name)? }
        }
        ValueExpr::Cast { target, class } => {
            let target = expr(target);
            let class = class.as_str();
            quote! {
                #host::checked_cast(#target, &::jsonb_codegen::type_descriptor::ClassName::from(#class))?
            }
        }
    }
}

fn scalar_kind(kind: ScalarKind) -> TokenStream {
    let variant = match kind {
        ScalarKind::Boolean => quote! { Boolean },
        ScalarKind::Number => quote! { Number },
        ScalarKind::Text => quote! { Text },
        ScalarKind::EnumConstant => quote! { EnumConstant },
    };
    quote! { ::jsonb_codegen::ir::ScalarKind::#variant }
}

fn date_format(format: &DateFormat) -> TokenStream {
    match format {
        DateFormat::Iso => quote! { ::jsonb_codegen::config::DateFormat::Iso },
        DateFormat::Pattern(pattern) => {
            quote! { ::jsonb_codegen::config::DateFormat::Pattern(#pattern.to_string()) }
        }
    }
}
