use proc_macro::TokenStream;

mod module;

/// Declares a kernel module.
///
/// The `type` argument should be a type which implements the [`Module`]
/// trait. Also accepts various forms of kernel metadata, emitted into the
/// `.modinfo` section of the object.
///
/// [`Module`]: ../kernel/trait.Module.html
///
/// # Examples
///
/// ```ignore
/// use kernel::{module, Module, ThisModule};
///
/// module! {
///     type: MyModule,
///     name: "my_kernel_module",
///     author: "Rust for Linux Contributors",
///     description: "My very own kernel module!",
///     license: "GPL",
/// }
///
/// struct MyModule;
///
/// impl Module for MyModule {
///     fn init(_module: &'static ThisModule) -> kernel::error::KernelResult<Self> {
///         Ok(MyModule)
///     }
/// }
/// ```
#[proc_macro]
pub fn module(ts: TokenStream) -> TokenStream {
    module::module(ts)
}
