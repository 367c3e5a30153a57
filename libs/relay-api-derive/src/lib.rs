use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Type};

/// Derive macro for connector property declarations.
///
/// Generates two methods on the annotated struct:
///
/// - `config_params() -> Vec<ConfigParam>`: property declarations.
/// - `from_config(&ConfigValues) -> Result<Self, RelayError>`: reads typed values.
///
/// The struct must implement `Default` (defaults are used for non-required params).
///
/// # Example
///
/// ```ignore
/// #[derive(ConfigParams, Default)]
/// pub struct MyProps {
///     #[param(name = "host-endpoint-uri", importance = "high", required, description = "Host")]
///     pub host_endpoint_uri: String,
///
///     #[param(importance = "low", description = "Verbose")]
///     pub verbose: bool,
/// }
/// ```
///
/// `name` defaults to the field name. Supported field types: `bool` and
/// `String`.
#[proc_macro_derive(ConfigParams, attributes(param))]
pub fn derive_config_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens,
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "ConfigParams only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "ConfigParams only supports structs",
            ))
        }
    };

    let mut config_param_tokens = Vec::new();
    let mut from_config_tokens = Vec::new();

    for field in fields {
        let field_name = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "expected named field")
        })?;
        let field_ty = &field.ty;

        // Parse #[param(...)] attribute.
        let mut param_name: Option<String> = None;
        let mut importance_str: Option<String> = None;
        let mut description_str: Option<String> = None;
        let mut required = false;

        for attr in &field.attrs {
            if !attr.path().is_ident("param") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    param_name = Some(value.value());
                } else if meta.path.is_ident("importance") {
                    let value: LitStr = meta.value()?.parse()?;
                    importance_str = Some(value.value());
                } else if meta.path.is_ident("description") {
                    let value: LitStr = meta.value()?.parse()?;
                    description_str = Some(value.value());
                } else if meta.path.is_ident("required") {
                    required = true;
                } else {
                    return Err(meta.error("unknown param attribute"));
                }
                Ok(())
            })?;
        }

        let param_name = param_name.unwrap_or_else(|| field_name.to_string());
        let importance_str = importance_str.ok_or_else(|| {
            syn::Error::new_spanned(field_name, "missing #[param(importance = \"...\")]")
        })?;
        let description_str = description_str.ok_or_else(|| {
            syn::Error::new_spanned(field_name, "missing #[param(description = \"...\")]")
        })?;

        let importance_expr = match importance_str.as_str() {
            "high" => quote! { relay_api::config::Importance::High },
            "medium" => quote! { relay_api::config::Importance::Medium },
            "low" => quote! { relay_api::config::Importance::Low },
            _ => {
                return Err(syn::Error::new_spanned(
                    field_name,
                    format!(
                        "unknown importance '{importance_str}' (expected 'high', 'medium' or 'low')"
                    ),
                ))
            }
        };

        let ty_name = type_ident_name(field_ty).ok_or_else(|| {
            syn::Error::new_spanned(field_ty, "unsupported type for ConfigParams")
        })?;

        // (ParamType, default ParamValue, ConfigValues getter, value conversion)
        let (param_type_expr, default_expr, getter, convert) = match ty_name.as_str() {
            "bool" => (
                quote! { relay_api::config::ParamType::Bool },
                quote! { relay_api::config::ParamValue::Bool(__defaults.#field_name) },
                quote! { get_bool },
                quote! { v },
            ),
            "String" => (
                quote! { relay_api::config::ParamType::Str },
                quote! { relay_api::config::ParamValue::Str(__defaults.#field_name.clone()) },
                quote! { get_str },
                quote! { v.to_string() },
            ),
            _ => {
                return Err(syn::Error::new_spanned(
                    field_ty,
                    format!(
                        "unsupported type '{ty_name}' (expected bool or String)"
                    ),
                ))
            }
        };

        let getter_expr = if required {
            quote! {
                let v = __config.#getter(#param_name).ok_or_else(|| {
                    relay_api::error::RelayError::config(
                        format!("missing required property '{}'", #param_name)
                    )
                })?;
                result.#field_name = #convert;
            }
        } else {
            quote! {
                if let Some(v) = __config.#getter(#param_name) {
                    result.#field_name = #convert;
                }
            }
        };

        let default_value = if required {
            quote! { None }
        } else {
            quote! { Some(#default_expr) }
        };

        config_param_tokens.push(quote! {
            relay_api::config::ConfigParam {
                name: #param_name.to_string(),
                param_type: #param_type_expr,
                importance: #importance_expr,
                required: #required,
                default: #default_value,
                description: #description_str.to_string(),
            }
        });

        from_config_tokens.push(getter_expr);
    }

    let expanded = quote! {
        impl #name {
            pub fn config_params() -> Vec<relay_api::config::ConfigParam> {
                let __defaults = Self::default();
                vec![
                    #(#config_param_tokens),*
                ]
            }

            pub fn from_config(
                __config: &relay_api::config::ConfigValues,
            ) -> Result<Self, relay_api::error::RelayError> {
                let mut result = Self::default();
                #({ #from_config_tokens })*
                Ok(result)
            }
        }
    };

    Ok(TokenStream::from(expanded))
}

/// Extract the last path segment ident name from a type (e.g. `bool`, `String`).
fn type_ident_name(ty: &Type) -> Option<String> {
    if let Type::Path(type_path) = ty {
        type_path
            .path
            .segments
            .last()
            .map(|seg| seg.ident.to_string())
    } else {
        None
    }
}
