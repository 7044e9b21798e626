use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, ItemFn, Pat, Type};

/// Turn an `async fn (Client, Database)` into a database-backed test.
///
/// The generated test builds the server, runs the function body against a
/// fresh database, and drops that database afterwards WHETHER OR NOT the body
/// completed by passing, failing or otherwise panicking. A panic is rethrown
/// once cleanup is done.
///
/// Note: this attribute requires that `client_and_db` is in scope, and that
/// the `futures` crate is available as a test dependency so the body can be
/// driven to completion inside [`std::panic::catch_unwind`].
#[proc_macro_attribute]
pub fn db_test(_: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);
    let name = item_fn.sig.ident.clone();
    if let Err(err) = check_signature(&item_fn) {
        return err.into_compile_error().into();
    }
    let inner_name = format_ident!("{}_inner", name);
    item_fn.sig.ident = inner_name.clone();
    quote! {
        #[rocket::async_test]
        async fn #name() {
            let (client, db) = client_and_db().await;

            #item_fn

            // Futures are not unwind-safe; smuggle them across the boundary.
            // See https://stackoverflow.com/a/66529014/13112498
            let client_mutex = std::sync::Mutex::new(client);
            let db_mutex = std::sync::Mutex::new(db.clone());

            let result = std::panic::catch_unwind(|| {
                let client = client_mutex.into_inner().unwrap();
                let db = db_mutex.into_inner().unwrap();

                let handle = rocket::tokio::runtime::Handle::current();
                let _guard = handle.enter();

                futures::executor::block_on(#inner_name(client, db));
            });

            // Clean up the per-test database even after a failure.
            db.drop(None).await.unwrap();

            if let Err(cause) = result {
                std::panic::panic_any(cause);
            }
        }
    }
    .into()
}

fn check_signature(item_fn: &ItemFn) -> Result<(), syn::Error> {
    let inputs = &item_fn.sig.inputs;
    let mut arg_types = Vec::new();

    for input in inputs {
        match input {
            FnArg::Typed(pat_type) => {
                if !matches!(*pat_type.pat, Pat::Ident(_)) {
                    return Err(syn::Error::new(
                        pat_type.pat.span(),
                        "Argument pattern must be an identifier",
                    ));
                }
                if let Type::Path(type_path) = &*pat_type.ty {
                    if let Some(ident) = type_path.path.get_ident() {
                        arg_types.push(ident.to_string());
                        continue;
                    }
                }
                return Err(syn::Error::new(
                    pat_type.ty.span(),
                    "Argument type must be a standalone type identifier",
                ));
            }
            FnArg::Receiver(_) => {
                return Err(syn::Error::new(
                    input.span(),
                    "The tagged function must not take `self`",
                ));
            }
        }
    }

    if arg_types == ["Client", "Database"] {
        Ok(())
    } else {
        Err(syn::Error::new(
            inputs.span(),
            "The tagged function must accept a `rocket::local::asynchronous::Client` \
             and a `mongodb::Database`, in that order",
        ))
    }
}
