use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src");

    let (Ok(crate_dir), Ok(out_dir)) = (std::env::var("CARGO_MANIFEST_DIR"), std::env::var("OUT_DIR")) else {
        println!("cargo:warning=CARGO_MANIFEST_DIR or OUT_DIR unset; header not generated");
        return;
    };
    let header = PathBuf::from(out_dir).join("todo_ffi.h");

    match cbindgen::Builder::new()
        .with_crate(crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("TODO_FFI_H")
        .with_cpp_compat(true)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(&header);
        }
        Err(err) => println!("cargo:warning=header not generated: {err}"),
    }
}
