use anyhow::Result;
use fs_extra::{copy_items, dir::CopyOptions};
use std::{env, path::PathBuf};

// Copies `assets/` into OUT_DIR, where the native loader looks when the
// binary isn't started from the crate root.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets = manifest_dir.join("assets");
    if !assets.exists() {
        println!("cargo:warning=No assets/ directory; place DamagedHelmet.gltf and its files there");
        return Ok(());
    }

    let mut options = CopyOptions::new();
    options.overwrite = true;
    copy_items(&[assets], env::var("OUT_DIR")?, &options)?;
    Ok(())
}
