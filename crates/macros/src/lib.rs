// Path: crates/macros/src/lib.rs
//! Procedural macros for xcall services.
//!
//! `#[service_interface]` turns an inherent `impl` block into a full
//! `BlockchainService` implementation: metadata, capability downcasters and a
//! `handle_service_call` dispatcher over every `#[method]` in the block.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse::Parse, parse::ParseStream, parse_macro_input, punctuated::Punctuated, FnArg, ImplItem,
    ItemImpl, Lit, LitInt, LitStr, Meta, Token,
};

/// Where the service id comes from.
enum ServiceId {
    /// A fixed id, for singleton services.
    Literal(LitStr),
    /// A `String` field on the service, for services deployed in several instances.
    Field(syn::Ident),
}

struct ServiceAttributes {
    id: ServiceId,
    abi_version: LitInt,
    state_schema: LitStr,
    capabilities: Option<LitStr>,
}

impl Parse for ServiceAttributes {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut id = None;
        let mut id_field = None;
        let mut abi_version = None;
        let mut state_schema = None;
        let mut capabilities = None;

        let vars = Punctuated::<Meta, Token![,]>::parse_terminated(input)?;

        for var in vars {
            let Meta::NameValue(nv) = var else { continue };
            let syn::Expr::Lit(expr_lit) = nv.value else {
                continue;
            };
            let key = nv
                .path
                .get_ident()
                .map(|i| i.to_string())
                .unwrap_or_default();
            match (key.as_str(), expr_lit.lit) {
                ("id", Lit::Str(lit)) => id = Some(lit),
                ("id_field", Lit::Str(lit)) => id_field = Some(format_ident!("{}", lit.value())),
                ("abi_version", Lit::Int(lit)) => abi_version = Some(lit),
                ("state_schema", Lit::Str(lit)) => state_schema = Some(lit),
                ("capabilities", Lit::Str(lit)) => capabilities = Some(lit),
                _ => return Err(input.error(format!("Unknown attribute `{}`", key))),
            }
        }

        let id = match (id, id_field) {
            (Some(lit), None) => ServiceId::Literal(lit),
            (None, Some(field)) => ServiceId::Field(field),
            (Some(_), Some(_)) => {
                return Err(input.error("`id` and `id_field` are mutually exclusive"))
            }
            (None, None) => return Err(input.error("Missing `id` or `id_field` attribute")),
        };

        Ok(ServiceAttributes {
            id,
            abi_version: abi_version
                .ok_or_else(|| input.error("Missing `abi_version` attribute"))?,
            state_schema: state_schema
                .ok_or_else(|| input.error("Missing `state_schema` attribute"))?,
            capabilities,
        })
    }
}

/// Generates the `as_*` override for a capability the service declares.
fn downcaster(caps: &[String], cap: &str, body: TokenStream2) -> TokenStream2 {
    if caps.iter().any(|c| c == cap) {
        body
    } else {
        quote! {}
    }
}

/// Implements `BlockchainService` for the annotated `impl` block.
///
/// Attributes:
/// - `id = "..."` or `id_field = "field"`: the service id, fixed or read from a `String` field.
/// - `abi_version`, `state_schema`: service metadata.
/// - `capabilities = "CALL_RECEIVER, CONNECTION"`: capability flags; each one also
///   generates the matching downcaster, so the trait impl must exist.
///
/// Every function tagged `#[method]` becomes callable as `name@v1`. Its third
/// argument is the SCALE-decoded parameter type; a method without one takes
/// `(&self, state, ctx)`. Errors convert into `TransactionError`.
#[proc_macro_attribute]
pub fn service_interface(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args as ServiceAttributes);
    let mut item_impl = parse_macro_input!(input as ItemImpl);

    let struct_name = &item_impl.self_ty;
    let abi_version = args.abi_version;
    let state_schema = args.state_schema;
    let id_body = match &args.id {
        ServiceId::Literal(lit) => quote! { #lit },
        ServiceId::Field(field) => quote! { &self.#field },
    };

    let caps: Vec<String> = args
        .capabilities
        .as_ref()
        .map(|l| l.value())
        .unwrap_or_default()
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    let mut cap_flags = quote! { xcall_types::service_configs::Capabilities::empty() };
    for cap in &caps {
        let cap_ident = format_ident!("{}", cap);
        cap_flags = quote! { #cap_flags | xcall_types::service_configs::Capabilities::#cap_ident };
    }

    let as_call_receiver = downcaster(
        &caps,
        "CALL_RECEIVER",
        quote! {
            fn as_call_receiver(&self) -> Option<&dyn xcall_api::services::CallServiceReceiver> {
                Some(self)
            }
        },
    );
    let as_connection = downcaster(
        &caps,
        "CONNECTION",
        quote! {
            fn as_connection(&self) -> Option<&dyn xcall_api::services::CrossChainConnection> {
                Some(self)
            }
        },
    );

    let mut match_arms = Vec::new();

    for item in &mut item_impl.items {
        let ImplItem::Fn(method) = item else { continue };
        let mut is_service_method = false;
        method.attrs.retain(|attr| {
            if attr.path().is_ident("method") {
                is_service_method = true;
                false
            } else {
                true
            }
        });
        if !is_service_method {
            continue;
        }

        let method_name = &method.sig.ident;
        let method_str = format!("{}@v1", method_name);
        // Expected: fn name(&self, state: &mut dyn StateAccess, params: P, ctx: &mut TxContext)
        let param_type = match method.sig.inputs.len() {
            4 => method.sig.inputs.iter().nth(2).and_then(|arg| match arg {
                FnArg::Typed(pat_type) => Some(*pat_type.ty.clone()),
                FnArg::Receiver(_) => None,
            }),
            _ => None,
        };

        match param_type {
            Some(p_type) => match_arms.push(quote! {
                #method_str => {
                    let p: #p_type = xcall_types::codec::from_bytes_canonical(params)
                        .map_err(xcall_types::error::TransactionError::Deserialization)?;
                    self.#method_name(state, p, ctx)
                        .map_err(xcall_types::error::TransactionError::from)?;
                    Ok(())
                }
            }),
            None => match_arms.push(quote! {
                #method_str => {
                    self.#method_name(state, ctx)
                        .map_err(xcall_types::error::TransactionError::from)?;
                    Ok(())
                }
            }),
        }
    }

    let dispatch_impl = quote! {
        #[async_trait::async_trait]
        impl xcall_api::services::BlockchainService for #struct_name {
            fn id(&self) -> &str {
                #id_body
            }

            fn abi_version(&self) -> u32 {
                #abi_version
            }

            fn state_schema(&self) -> &str {
                #state_schema
            }

            fn capabilities(&self) -> xcall_types::service_configs::Capabilities {
                #cap_flags
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            #as_call_receiver
            #as_connection

            async fn handle_service_call(
                &self,
                state: &mut dyn xcall_api::state::StateAccess,
                method: &str,
                params: &[u8],
                ctx: &mut xcall_api::transaction::context::TxContext<'_>,
            ) -> Result<(), xcall_types::error::TransactionError> {
                match method {
                    #(#match_arms)*
                    _ => Err(xcall_types::error::TransactionError::Unsupported(format!(
                        "Service '{}' does not support method '{}'",
                        xcall_api::services::BlockchainService::id(self),
                        method
                    ))),
                }
            }
        }
    };

    TokenStream::from(quote! {
        #item_impl
        #dispatch_impl
    })
}
