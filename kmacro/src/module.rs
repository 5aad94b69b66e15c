use proc_macro::{token_stream, TokenStream, TokenTree};

fn expect_ident(it: &mut token_stream::IntoIter) -> String {
    if let Some(TokenTree::Ident(ident)) = it.next() {
        ident.to_string()
    } else {
        panic!("Expected Ident");
    }
}

fn expect_punct(it: &mut token_stream::IntoIter, expected: char) {
    if let Some(TokenTree::Punct(punct)) = it.next() {
        assert_eq!(punct.as_char(), expected);
    } else {
        panic!("Expected Punct");
    }
}

fn expect_string(it: &mut token_stream::IntoIter) -> String {
    if let Some(TokenTree::Literal(literal)) = it.next() {
        let string = literal.to_string();
        assert!(
            string.starts_with('"') && string.ends_with('"'),
            "Expected string literal"
        );
        string[1..string.len() - 1].to_string()
    } else {
        panic!("Expected string literal");
    }
}

#[derive(Default)]
struct ModuleInfo {
    type_: String,
    name: String,
    author: String,
    description: String,
    license: String,
}

impl ModuleInfo {
    fn parse(it: &mut token_stream::IntoIter) -> ModuleInfo {
        let mut info = ModuleInfo::default();
        let mut seen = Vec::new();

        loop {
            let key = match it.next() {
                Some(TokenTree::Ident(ident)) => ident.to_string(),
                Some(_) => panic!("Expected Ident or end"),
                None => break,
            };
            assert!(!seen.contains(&key), "duplicate `{}` field", key);
            expect_punct(it, ':');
            match key.as_str() {
                "type" => info.type_ = expect_ident(it),
                "name" => info.name = expect_string(it),
                "author" => info.author = expect_string(it),
                "description" => info.description = expect_string(it),
                "license" => info.license = expect_string(it),
                _ => panic!("unknown `{}` field", key),
            }
            expect_punct(it, ',');
            seen.push(key);
        }

        assert!(!info.type_.is_empty(), "missing `type` field");
        assert!(!info.name.is_empty(), "missing `name` field");
        assert!(!info.license.is_empty(), "missing `license` field");
        info
    }
}

fn modinfo_entry(module: &str, field: &str, content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    // modinfo records are NUL-terminated "field=content" strings placed in
    // the `.modinfo` section, only meaningful when built as a real module.
    format!(
        "#[cfg(MODULE)]
        #[doc(hidden)]
        #[link_section = \".modinfo\"]
        #[used]
        pub static __{module}_{field}: [u8; {len}] = *b\"{field}={content}\\0\";
        ",
        module = module,
        field = field,
        content = content,
        len = field.len() + content.len() + 2,
    )
}

pub(crate) fn module(ts: TokenStream) -> TokenStream {
    let mut it = ts.into_iter();
    let info = ModuleInfo::parse(&mut it);

    // The module name may contain characters that are invalid in idents.
    let ident = info.name.replace('-', "_");

    let mut modinfo = String::new();
    modinfo.push_str(&modinfo_entry(&ident, "license", &info.license));
    modinfo.push_str(&modinfo_entry(&ident, "author", &info.author));
    modinfo.push_str(&modinfo_entry(&ident, "description", &info.description));

    format!(
        "
        /// The module instance, set on a successful load and dropped again
        /// by the unload hook.
        static mut __MOD: Option<{type_}> = None;

        #[cfg(MODULE)]
        extern \"C\" {{
            static __this_module: kernel::bindings::module;
        }}

        #[cfg(MODULE)]
        static THIS_MODULE: kernel::ThisModule = unsafe {{
            kernel::ThisModule::from_ptr(core::ptr::addr_of!(__this_module) as *mut _)
        }};

        #[cfg(not(MODULE))]
        static THIS_MODULE: kernel::ThisModule = unsafe {{
            kernel::ThisModule::from_ptr(core::ptr::null_mut())
        }};

        #[cfg(MODULE)]
        #[no_mangle]
        pub extern \"C\" fn init_module() -> core::ffi::c_int {{
            __init()
        }}

        #[cfg(MODULE)]
        #[no_mangle]
        pub extern \"C\" fn cleanup_module() {{
            __exit()
        }}

        #[cfg(not(MODULE))]
        #[no_mangle]
        pub extern \"C\" fn __{ident}_init() -> core::ffi::c_int {{
            __init()
        }}

        #[cfg(not(MODULE))]
        #[no_mangle]
        pub extern \"C\" fn __{ident}_exit() {{
            __exit()
        }}

        fn __init() -> core::ffi::c_int {{
            match <{type_} as kernel::Module>::init(&THIS_MODULE) {{
                Ok(m) => {{
                    unsafe {{
                        __MOD = Some(m);
                    }}
                    0
                }}
                Err(e) => e.to_errno(),
            }}
        }}

        fn __exit() {{
            unsafe {{
                // Invokes `drop()` on `__MOD`, which should be used for
                // cleanup.
                __MOD = None;
            }}
        }}

        {modinfo}
        ",
        type_ = info.type_,
        ident = ident,
        modinfo = modinfo,
    )
    .parse()
    .expect("Error parsing formatted string into token stream.")
}
