use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, spanned::Spanned, FnArg, GenericArgument, Ident, ItemFn, Pat, PathArguments,
    Type, TypePath,
};

/// Turn an async test into a synchronous one that runs against a fresh database.
///
/// The test may take any of `client: Client` (a tracked local Rocket client),
/// `db: Database`, and any number of `name: Coll<T>`, in any order.
/// `#[backend_test(admin)]` logs the client in as the default admin first;
/// `#[backend_test(student)]` creates and logs in the example student.
///
/// The database is dropped however the test ends. The tests need a live MongoDB
/// and are ignored unless the `mongodb-tests` feature is enabled.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);
    let login = parse_macro_input!(args as Option<Ident>);

    if item_fn.sig.asyncness.is_none() {
        return syn::Error::new(item_fn.sig.span(), "Test must be marked `async`")
            .into_compile_error()
            .into();
    }

    let injected = match item_fn
        .sig
        .inputs
        .iter()
        .map(Injected::from_arg)
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(injected) => injected,
        Err(err) => return err.into_compile_error().into(),
    };
    for kind in ["Client", "Database"] {
        if injected.iter().filter(|i| i.kind() == kind).count() > 1 {
            return syn::Error::new(
                item_fn.sig.inputs.span(),
                format!("Test cannot take more than one `{kind}`"),
            )
            .into_compile_error()
            .into();
        }
    }
    let bindings = injected.iter().map(Injected::binding);
    let call_args = injected.iter().map(Injected::value);

    let login = match login {
        None => quote! {},
        Some(role) if role == "admin" => login_admin(),
        Some(role) if role == "student" => login_student(),
        Some(role) => {
            return syn::Error::new(role.span(), "Expected `admin` or `student`")
                .into_compile_error()
                .into();
        }
    };

    // The test keeps its name; the async body moves to `<name>_body`.
    let name = item_fn.sig.ident.clone();
    let body_name = format_ident!("{}_body", name);
    item_fn.sig.ident = body_name.clone();

    quote! {
        #[test]
        #[cfg_attr(not(feature = "mongodb-tests"), ignore = "requires a running MongoDB instance")]
        fn #name() {
            async fn __backend_test_setup() -> (rocket::local::asynchronous::Client, mongodb::Database) {
                log4rs_test_utils::test_logging::init_logging_once_for(
                    ["clubvote_backend"],
                    None,
                    None,
                );

                let db_client = crate::db_client().await;
                let db_name = crate::database();
                let server = crate::rocket_for_db(db_client.clone(), &db_name);
                let client = rocket::local::asynchronous::Client::tracked(server)
                    .await
                    .expect("test server failed to ignite");
                let db = db_client.database(&db_name);

                // Scoped so the login response's borrow of `client` ends here.
                {
                    #login
                }

                (client, db)
            }

            #item_fn

            // Setup and cleanup get their own runtime so that cleanup still
            // works if the test panics mid-poll.
            let housekeeping = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("test-housekeeping")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();
            let runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            let (client, db) = housekeeping.block_on(__backend_test_setup());

            // `catch_unwind` needs `UnwindSafe`; a mutex hands the values over.
            let moved = std::sync::Mutex::new((client, db.clone(), runtime));
            let outcome = std::panic::catch_unwind(|| {
                #[allow(unused_variables)]
                let (client, db, runtime) = moved.into_inner().unwrap();
                #(#bindings)*
                runtime.block_on(#body_name(#(#call_args),*));
            });

            housekeeping.block_on(async move {
                db.drop(None).await.expect("failed to drop test database");
            });

            if let Err(cause) = outcome {
                std::panic::resume_unwind(cause);
            }
        }
    }
    .into()
}

/// Log in as the admin account created at ignition.
fn login_admin() -> TokenStream2 {
    quote! {
        let password = client
            .rocket()
            .state::<crate::Config>()
            .unwrap()
            .default_admin_password()
            .to_string();
        let response = client
            .post("/auth/login")
            .header(rocket::http::ContentType::JSON)
            .body(rocket::serde::json::json!({
                "username": crate::model::db::user::DEFAULT_ADMIN_USERNAME,
                "password": password,
            }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), rocket::http::Status::Ok, "admin login failed");
    }
}

/// Insert the example student and log in as them.
fn login_student() -> TokenStream2 {
    quote! {
        crate::model::mongodb::Coll::<crate::model::db::user::NewUser>::from_db(&db)
            .insert_one(crate::model::db::user::NewUser::example_student(), None)
            .await
            .unwrap();
        let credentials = crate::model::api::auth::Credentials::example_student();
        let response = client
            .post("/auth/login")
            .header(rocket::http::ContentType::JSON)
            .body(rocket::serde::json::json!(credentials).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), rocket::http::Status::Ok, "student login failed");
    }
}

/// A test parameter the harness knows how to supply.
enum Injected {
    Client,
    Database,
    Collection { ident: Ident, item: TypePath },
}

impl Injected {
    fn from_arg(arg: &FnArg) -> syn::Result<Self> {
        let unexpected = || {
            syn::Error::new(
                arg.span(),
                "Expected `_: Client`, `_: Database` or `_: Coll<T>`",
            )
        };
        let FnArg::Typed(typed) = arg else {
            return Err(unexpected());
        };
        let (Pat::Ident(pat), Type::Path(ty)) = (&*typed.pat, &*typed.ty) else {
            return Err(unexpected());
        };

        if ty.path.is_ident("Client") {
            return Ok(Self::Client);
        }
        if ty.path.is_ident("Database") {
            return Ok(Self::Database);
        }
        let last = ty.path.segments.last().ok_or_else(unexpected)?;
        if last.ident == "Coll" {
            if let PathArguments::AngleBracketed(generics) = &last.arguments {
                if let Some(GenericArgument::Type(Type::Path(item))) = generics.args.first() {
                    return Ok(Self::Collection {
                        ident: pat.ident.clone(),
                        item: item.clone(),
                    });
                }
            }
        }
        Err(unexpected())
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Client => "Client",
            Self::Database => "Database",
            Self::Collection { .. } => "Coll",
        }
    }

    /// Statements run before the test body, inside the test runtime.
    fn binding(&self) -> TokenStream2 {
        match self {
            Self::Collection { ident, item } => quote! {
                let #ident = crate::model::mongodb::Coll::<#item>::from_db(&db);
            },
            _ => quote! {},
        }
    }

    /// The expression passed to the test body.
    fn value(&self) -> TokenStream2 {
        match self {
            Self::Client => quote! { client },
            Self::Database => quote! { db.clone() },
            Self::Collection { ident, .. } => quote! { #ident },
        }
    }
}
