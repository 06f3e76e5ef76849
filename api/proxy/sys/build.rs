use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=TENGINE_DYLIB_SEARCH_PATH");
    println!("cargo:rerun-if-env-changed=TENGINE_INCLUDE_DIR");
    println!("cargo:rerun-if-changed=wrapper.h");
    if let Ok(path) = std::env::var("TENGINE_DYLIB_SEARCH_PATH") {
        println!("cargo:rustc-link-search={path}");
    }
    println!("cargo:rustc-link-lib=tengine");

    let mut builder = bindgen::Builder::default().header("wrapper.h");
    if let Ok(include) = std::env::var("TENGINE_INCLUDE_DIR") {
        builder = builder.clang_arg(format!("-I{include}"));
    }
    let bindings = builder
        .allowlist_function("init_tengine")
        .allowlist_function("release_tengine")
        .allowlist_function("get_tengine_version")
        .allowlist_function("get_tengine_errno")
        .allowlist_function("create_graph")
        .allowlist_function("set_graph_attr")
        .allowlist_function("prerun_graph")
        .allowlist_function("save_graph")
        .allowlist_function("destroy_graph")
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
        .generate()
        .expect("Unable to generate bindings");

    let out_path = PathBuf::from(env::var("OUT_DIR").unwrap());
    bindings.write_to_file(out_path.join("bindings.rs")).expect("Couldn't write bindings!");
}
