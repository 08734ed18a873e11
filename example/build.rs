use std::{env, path::PathBuf};

use brine_colf_compiler::{compile_with, gen::rust::RustBackend, CompileConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=schema");
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    compile_with(
        &["schema/demo.colf", "schema/ext.colf"],
        &CompileConfig::default(),
        &RustBackend,
        &out_dir,
    )?;

    let tight = CompileConfig::default().with_size_max("64")?.with_list_max("4")?;
    compile_with(&["schema/tight.colf"], &tight, &RustBackend, &out_dir)?;
    Ok(())
}
